//! Generators for the text files handed to the external tools.

mod mlx;
mod mtl;

pub use mlx::reduction_script;
pub use mtl::{comment_out_directive, serialize_mtl};
