//! Polygon reduction of the intermediate mesh.

use crate::config::{INTER_OBJ, MESHLAB_LOG, REDUCED_MTL};
use crate::error::{ConvertError, Result};
use crate::generator::{comment_out_directive, reduction_script};
use crate::tools::{ExternalConverter, MeshLab};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Transparency directive written by the simplifier.
pub const TRANSPARENCY: &str = "Tr";

/// Parameters of one simplification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PolygonReductionRequest {
    pub target_face_count: u32,
    /// Selects the texture-aware decimation filter.
    pub with_texture: bool,
}

impl PolygonReductionRequest {
    pub fn new(target_face_count: u32, with_texture: bool) -> Result<Self> {
        if target_face_count == 0 {
            return Err(ConvertError::invalid_input("target face count must be positive"));
        }
        Ok(Self {
            target_face_count,
            with_texture,
        })
    }
}

/// Simplify [`INTER_OBJ`] in place.
///
/// The simplifier writes its own material library ([`REDUCED_MTL`]); its
/// transparency lines are commented out and its path returned. `None` means the
/// simplifier wrote no material library.
pub fn reduce_polygons(
    work_dir: &Path,
    meshlab: &MeshLab,
    request: PolygonReductionRequest,
) -> Result<Option<PathBuf>> {
    info!(
        "Reducing polygons to {} faces{}",
        request.target_face_count,
        if request.with_texture { " (textured)" } else { "" }
    );

    let script = reduction_script(request.with_texture, request.target_face_count);
    fs::write(work_dir.join(meshlab.script_file()), script)?;

    meshlab.run(work_dir, INTER_OBJ, INTER_OBJ, MESHLAB_LOG)?;

    let mtl_path = work_dir.join(REDUCED_MTL);
    if !mtl_path.exists() {
        warn!("Simplifier wrote no material library");
        return Ok(None);
    }
    let content = fs::read_to_string(&mtl_path)?;
    fs::write(&mtl_path, comment_out_directive(&content, TRANSPARENCY))?;

    Ok(Some(mtl_path))
}
