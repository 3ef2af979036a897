//! meshport-core - Core library for converting 3D/CAD models into COLLADA documents.
//!
//! This library chains external command-line converters (the Open Asset Import
//! Library CLI, Mayo and MeshLab) into a single conversion: it stages the source
//! next to itself, repairs the intermediate OBJ/MTL pair, resolves embedded and
//! external textures, optionally reduces polygons and patches the final COLLADA
//! document so the host application imports it correctly.
//!
//! # Example
//!
//! ```no_run
//! use meshport_core::{ConvertOptions, FixedPrompter, MemoryCounter, Pipeline, ToolPaths, Toolchain};
//! use std::path::Path;
//!
//! let toolchain = Toolchain::new(&ToolPaths::from_env());
//! let options = ConvertOptions::default();
//! let mut prompter = FixedPrompter::new(Some(10_000));
//! let mut counter = MemoryCounter::default();
//!
//! let outcome = Pipeline::new(&toolchain, &options).convert(
//!     Some(Path::new("models/chair.fbx")),
//!     &mut prompter,
//!     &mut counter,
//! );
//! if let Some(conversion) = outcome.conversion() {
//!     println!("{}", conversion.final_path.display());
//! }
//! ```

pub mod config;
pub mod counter;
pub mod error;
pub mod export;
pub mod generator;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod postprocess;
pub mod prompt;
pub mod reduction;
pub mod resolve;
pub mod session;
pub mod tools;
pub mod units;

// Re-exports for convenience
pub use config::{ConvertOptions, Platform, Settings, ToolPaths};
pub use counter::{ConversionCounter, FileCounter, MemoryCounter};
pub use error::{ConvertError, ErrorCode, Result};
pub use export::{default_output_path, Exported};
pub use model::{
    restore_material_names, HostMaterial, Material, MaterialIdentity, MaterialLibrary,
    MaterialNameIndex, Rgb, TextureReference,
};
pub use parser::{parse_mtl, parse_mtl_file};
pub use generator::serialize_mtl;
pub use pipeline::{Conversion, FailureReport, Outcome, Pipeline, Stage};
pub use prompt::{FixedPrompter, Prompter};
pub use reduction::PolygonReductionRequest;
pub use session::{ConversionSession, SourceDescriptor};
pub use tools::{Assimp, ExternalConverter, Mayo, MeshLab, Toolchain};
pub use units::{change_units, Scalable, Units};

/// Convert `source` with tools found through `MESHPORT_*` variables or `PATH`,
/// reducing to `target_face_count` faces when the mesh has more.
pub fn convert_model(source: &std::path::Path, target_face_count: Option<u32>) -> Outcome {
    let toolchain = Toolchain::new(&ToolPaths::from_env());
    let options = ConvertOptions {
        propose_reduction: target_face_count.is_some(),
        target_face_count,
        ..ConvertOptions::default()
    };
    let mut prompter = FixedPrompter::new(target_face_count);
    let mut counter = MemoryCounter::default();
    Pipeline::new(&toolchain, &options).convert(Some(source), &mut prompter, &mut counter)
}
