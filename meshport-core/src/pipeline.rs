//! End-to-end conversion of a source model into the final COLLADA document.
//!
//! Stages run in a fixed order, each blocking on the previous one:
//!
//! 1. Check the platform, describe the source and its companion files
//! 2. Open the session in the source directory and stage the source
//! 3. Convert to the intermediate OBJ/MTL pair (CAD or general route)
//! 4. Resolve embedded and external textures, claim missing ones
//! 5. Snapshot the material name index
//! 6. Optionally reduce polygons
//! 7. Convert to COLLADA and post-process the document
//!
//! Any failure stops the run, purges the session and yields a
//! [`FailureReport`]. A completed [`Conversion`] keeps its session files until
//! [`Conversion::release`] is called, once the caller has imported the result.

use crate::config::{
    is_cad_extension, ConvertOptions, Platform, ASSIMP_LOG, ASSIMP_NFO, FINAL_DAE, INTER_MTL,
    INTER_OBJ, MAYO_LOG, RESERVED_PREFIX, SOURCE_LINK_STEM,
};
use crate::counter::ConversionCounter;
use crate::error::{ConvertError, ErrorCode, Result};
use crate::export::{export_document, Exported};
use crate::generator::{comment_out_directive, serialize_mtl};
use crate::model::{MaterialLibrary, MaterialNameIndex, TextureReference};
use crate::parser::{gltf_buffer_uris, obj_mtllib, parse_mtl_file};
use crate::postprocess::process_final_document;
use crate::prompt::Prompter;
use crate::reduction::{reduce_polygons, PolygonReductionRequest};
use crate::resolve::{
    claim_missing_textures, resolve_embedded_textures, resolve_external_textures,
    EmbeddedResolution, ExternalResolution,
};
use crate::session::{ConversionSession, SourceDescriptor};
use crate::tools::{ExternalConverter, Toolchain};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Transparency directive written by the general converter.
const DISSOLVE: &str = "d";

/// Pipeline stage, reported as the failure location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Platform,
    Source,
    Session,
    Conversion,
    Textures,
    Reduction,
    Finalization,
    PostProcessing,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Platform => "platform check",
            Stage::Source => "source validation",
            Stage::Session => "session setup",
            Stage::Conversion => "intermediate conversion",
            Stage::Textures => "texture resolution",
            Stage::Reduction => "polygon reduction",
            Stage::Finalization => "final conversion",
            Stage::PostProcessing => "post-processing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error presented to the user when a conversion fails.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureReport {
    pub message: String,
    /// Stage that failed.
    pub location: String,
    /// Version of this library.
    pub version: String,
    pub code: ErrorCode,
}

impl FailureReport {
    pub fn new(error: &ConvertError, stage: Stage) -> Self {
        Self {
            message: error.to_string(),
            location: stage.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            code: error.code(),
        }
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n\nLocation: {}\nVersion: {}",
            self.message, self.location, self.version
        )
    }
}

/// A completed conversion, owning its session files until released.
#[derive(Debug, Serialize)]
pub struct Conversion {
    /// The final COLLADA document, inside the session directory.
    pub final_path: PathBuf,
    /// Original material names, for restoring after import.
    pub materials_names: MaterialNameIndex,
    pub source: SourceDescriptor,
    /// Material library the final document was converted with, if any.
    pub material_library: Option<PathBuf>,
    pub embedded_textures: EmbeddedResolution,
    pub external_textures: ExternalResolution,
    /// Materials that received a substitute texture.
    pub claimed_textures: Vec<String>,
    /// Working texture files the final document references.
    pub textures: Vec<String>,
    /// Face counts around polygon reduction, when it ran and counts were readable.
    pub faces_before: Option<u64>,
    pub faces_after: Option<u64>,
    /// Completed conversions so far, when the counter could be updated.
    pub conversions_count: Option<u64>,
    #[serde(skip)]
    session: ConversionSession,
}

impl Conversion {
    /// Write the final document and its textures to `output`, outside the
    /// session, so they survive [`Conversion::release`].
    pub fn export(&self, output: &Path) -> Result<Exported> {
        export_document(
            &self.final_path,
            self.session.work_dir(),
            &self.textures,
            self.source.path(),
            output,
        )
    }

    /// Delete the session files, the final document included.
    pub fn release(self) -> Result<usize> {
        self.session.purge()
    }
}

/// Result of [`Pipeline::convert`].
#[derive(Debug)]
pub enum Outcome {
    /// No source was supplied; nothing was touched.
    Cancelled,
    Completed(Box<Conversion>),
    Failed(FailureReport),
}

impl Outcome {
    pub fn completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    /// Get the conversion, if completed.
    pub fn conversion(&self) -> Option<&Conversion> {
        match self {
            Outcome::Completed(conversion) => Some(&**conversion),
            _ => None,
        }
    }

    /// Get the failure report, if failed.
    pub fn failure(&self) -> Option<&FailureReport> {
        match self {
            Outcome::Failed(report) => Some(report),
            _ => None,
        }
    }
}

/// Warn when an OBJ material library is missing; fail when glTF buffers are.
pub fn check_companion_files(source: &SourceDescriptor) -> Result<()> {
    let dir = source.directory();
    match source.extension() {
        "obj" => {
            let content = fs::read(source.path())?;
            if let Some(mtllib) = obj_mtllib(&String::from_utf8_lossy(&content)) {
                if !dir.join(&mtllib).exists() {
                    warn!("Material library {} not found, materials will be lost", mtllib);
                }
            }
        }
        "gltf" => {
            let content = fs::read_to_string(source.path())?;
            for uri in gltf_buffer_uris(&content, source.path())? {
                let path = dir.join(&uri);
                if !path.exists() {
                    return Err(ConvertError::MissingArtifact { path });
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Conversion pipeline bound to a toolchain and options.
pub struct Pipeline<'a> {
    toolchain: &'a Toolchain,
    options: &'a ConvertOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(toolchain: &'a Toolchain, options: &'a ConvertOptions) -> Self {
        Self { toolchain, options }
    }

    /// Convert `source`. `None` cancels without side effects.
    pub fn convert(
        &self,
        source: Option<&Path>,
        prompter: &mut dyn Prompter,
        counter: &mut dyn ConversionCounter,
    ) -> Outcome {
        let Some(source) = source else {
            info!("No source selected, conversion cancelled");
            return Outcome::Cancelled;
        };

        let mut stage = Stage::Platform;
        let mut session = None;

        match self.run(source, prompter, &mut stage, &mut session) {
            Ok(mut conversion) => {
                conversion.conversions_count = match counter.increment() {
                    Ok(count) => Some(count),
                    Err(e) => {
                        warn!("Could not update the conversion counter: {}", e);
                        None
                    }
                };
                info!("Converted {}", conversion.source.filename());
                Outcome::Completed(Box::new(conversion))
            }
            Err(e) => {
                error!("Conversion failed during {}: {}", stage, e);
                if let Some(session) = session {
                    if let Err(purge_error) = session.purge() {
                        warn!("Could not purge session files: {}", purge_error);
                    }
                }
                Outcome::Failed(FailureReport::new(&e, stage))
            }
        }
    }

    fn run(
        &self,
        source: &Path,
        prompter: &mut dyn Prompter,
        stage: &mut Stage,
        session_slot: &mut Option<ConversionSession>,
    ) -> Result<Conversion> {
        Platform::current()?;

        *stage = Stage::Source;
        let source = SourceDescriptor::new(source, self.options.units)?;
        check_companion_files(&source)?;
        info!("Converting {} ({})", source.path().display(), source.units());

        *stage = Stage::Session;
        let session = session_slot.insert(ConversionSession::open(source.directory())?);
        let link = session.stage_source(&source)?.to_string();
        let work_dir = session.work_dir().to_path_buf();
        let from_cad = is_cad_extension(source.extension());

        *stage = Stage::Conversion;
        let mut mtl_path = Some(work_dir.join(INTER_MTL));
        if from_cad {
            self.toolchain.mayo.run(&work_dir, &link, INTER_OBJ, MAYO_LOG)?;
            if !work_dir.join(INTER_MTL).exists() {
                warn!("CAD converter wrote no material library");
                mtl_path = None;
            }
        } else {
            self.toolchain.assimp.run(&work_dir, &link, INTER_OBJ, ASSIMP_LOG)?;
        }
        require(&work_dir.join(INTER_OBJ))?;

        let mut library = match &mtl_path {
            Some(path) => {
                require(path)?;
                if !from_cad {
                    let content = fs::read_to_string(path)?;
                    fs::write(path, comment_out_directive(&content, DISSOLVE))?;
                }
                parse_mtl_file(path)?
            }
            None => MaterialLibrary::new(),
        };
        debug!("Intermediate library has {} material(s)", library.len());

        *stage = Stage::Textures;
        let mut embedded_textures = EmbeddedResolution::default();
        let mut external_textures = ExternalResolution::default();
        if !from_cad {
            let assimp = &self.toolchain.assimp;
            embedded_textures =
                resolve_embedded_textures(&mut library, &work_dir, SOURCE_LINK_STEM, || {
                    assimp.extract_embedded_textures(&work_dir, &link, ASSIMP_LOG)
                })?;

            let has_paths = library.iter().any(|m| {
                matches!(&m.diffuse_texture, Some(TextureReference::Path(p)) if !p.starts_with(SOURCE_LINK_STEM))
            });
            if has_paths {
                let references =
                    assimp.get_external_texture_references(&work_dir, &link, ASSIMP_NFO, ASSIMP_LOG)?;
                external_textures =
                    resolve_external_textures(&mut library, &references, source.directory(), session)?;
            }
        }

        let mut claimed_textures = Vec::new();
        if self.options.claim_missing_textures {
            claimed_textures = claim_missing_textures(
                &mut library,
                &external_textures.unresolved,
                session,
                prompter,
            )?;
        }

        let changed = !embedded_textures.resolved.is_empty()
            || !external_textures.resolved.is_empty()
            || !claimed_textures.is_empty();
        if changed {
            if let Some(path) = &mtl_path {
                fs::write(path, serialize_mtl(&library))?;
            }
        }

        let mut textures: Vec<String> = Vec::new();
        for material in library.iter() {
            let Some(path) = material.diffuse_texture.as_ref().and_then(TextureReference::as_path) else {
                continue;
            };
            if path.starts_with(RESERVED_PREFIX) && !textures.iter().any(|t| t == path) {
                textures.push(path.to_string());
            }
        }

        // Names must be captured before the simplifier renames materials.
        let materials_names = MaterialNameIndex::from_library(&library, &work_dir);

        *stage = Stage::Reduction;
        let mut faces_before = None;
        let mut faces_after = None;
        if self.options.propose_reduction {
            faces_before = self.face_count(&work_dir);
            if let Some(target) = prompter.reduction_target(faces_before) {
                let request = PolygonReductionRequest::new(target, library.has_diffuse_texture())?;
                let reduced_mtl = reduce_polygons(&work_dir, &self.toolchain.meshlab, request)?;
                if reduced_mtl.is_some() {
                    mtl_path = reduced_mtl;
                }
                faces_after = self.face_count(&work_dir);
                info!(
                    "Faces: {} -> {}",
                    display_count(faces_before),
                    display_count(faces_after)
                );
            }
        }

        *stage = Stage::Finalization;
        self.toolchain.assimp.run(&work_dir, INTER_OBJ, FINAL_DAE, ASSIMP_LOG)?;
        let final_path = work_dir.join(FINAL_DAE);
        require(&final_path)?;

        *stage = Stage::PostProcessing;
        process_final_document(&final_path, self.options, from_cad)?;

        let session = session_slot.take().ok_or_else(|| {
            ConvertError::invalid_input("conversion session closed before completion")
        })?;

        Ok(Conversion {
            final_path,
            materials_names,
            source,
            material_library: mtl_path,
            embedded_textures,
            external_textures,
            claimed_textures,
            textures,
            faces_before,
            faces_after,
            conversions_count: None,
            session,
        })
    }

    /// Face count of the intermediate mesh; best effort.
    fn face_count(&self, work_dir: &Path) -> Option<u64> {
        let assimp = &self.toolchain.assimp;
        let count = assimp
            .info(work_dir, INTER_OBJ, ASSIMP_NFO, ASSIMP_LOG)
            .and_then(|_| assimp.get_face_count(work_dir, ASSIMP_NFO));
        match count {
            Ok(count) => count,
            Err(e) => {
                warn!("Could not count faces: {}", e);
                None
            }
        }
    }
}

fn require(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ConvertError::MissingArtifact {
            path: path.to_path_buf(),
        })
    }
}

fn display_count(count: Option<u64>) -> String {
    count.map_or_else(|| "?".to_string(), |c| c.to_string())
}
