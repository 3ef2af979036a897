//! Parsers for the text formats produced or consumed by the converters.

mod companion;
mod info;
mod mtl;

pub use companion::{gltf_buffer_uris, obj_mtllib};
pub use info::{parse_external_texture_refs, parse_face_count, parse_texture_refs};
pub use mtl::{parse_mtl, parse_mtl_file, DIFFUSE_COLOR, DIFFUSE_TEXTURE, NEW_MATERIAL};
