//! Configuration constants and settings for the converter.

use crate::error::{ConvertError, Result};
use crate::units::Units;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix shared by every file a session creates in its working directory.
pub const RESERVED_PREFIX: &str = "meshport-";

/// Basename (without extension) of the staged source link.
pub const SOURCE_LINK_STEM: &str = "meshport-source";

/// Intermediate mesh produced by the first conversion stage.
pub const INTER_OBJ: &str = "meshport-inter.obj";

/// Material library companion of [`INTER_OBJ`].
pub const INTER_MTL: &str = "meshport-inter.mtl";

/// Material library written by the simplifier next to [`INTER_OBJ`].
pub const REDUCED_MTL: &str = "meshport-inter.obj.mtl";

/// Final interchange document.
pub const FINAL_DAE: &str = "meshport-final.dae";

/// General converter log.
pub const ASSIMP_LOG: &str = "meshport-assimp.log";

/// General converter info output.
pub const ASSIMP_NFO: &str = "meshport-assimp.nfo";

/// CAD converter log.
pub const MAYO_LOG: &str = "meshport-mayo.log";

/// Simplifier log.
pub const MESHLAB_LOG: &str = "meshport-meshlab.log";

/// Simplification script.
pub const REDUCTION_SCRIPT: &str = "meshport-reduction.mlx";

/// Number of embedded texture indices probed after extraction.
pub const EMBEDDED_TEXTURE_PROBE_LIMIT: u32 = 1000;

/// Image extensions probed for extracted embedded textures, in order.
pub const TEXTURE_EXTENSIONS: [&str; 5] = ["jpg", "png", "bmp", "tga", "tif"];

/// Source extensions routed through the CAD converter.
pub const CAD_EXTENSIONS: [&str; 6] = ["brep", "iges", "igs", "step", "stp", "stl"];

/// Default face count proposed to the user for reduction.
pub const DEFAULT_TARGET_FACE_COUNT: u32 = 40_000;

/// Reserved name for a texture linked into the working directory.
pub fn reserved_name(basename: &str) -> String {
    format!("{RESERVED_PREFIX}{basename}")
}

/// Check whether a lower-cased extension goes through the CAD route.
pub fn is_cad_extension(extension: &str) -> bool {
    CAD_EXTENSIONS.contains(&extension)
}

/// Supported host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// Detect the running platform.
    pub fn current() -> Result<Self> {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an OS identifier (as in `std::env::consts::OS`) to a platform.
    pub fn from_os(os: &str) -> Result<Self> {
        match os {
            "windows" => Ok(Platform::Windows),
            "macos" => Ok(Platform::MacOs),
            "linux" => Ok(Platform::Linux),
            other => Err(ConvertError::UnsupportedPlatform {
                platform: other.to_string(),
            }),
        }
    }

    fn executable(&self, name: &str) -> PathBuf {
        match self {
            Platform::Windows => PathBuf::from(format!("{name}.exe")),
            Platform::MacOs | Platform::Linux => PathBuf::from(name),
        }
    }
}

/// Locations of the external tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    /// General-purpose mesh/scene converter.
    pub assimp: PathBuf,
    /// CAD converter.
    pub mayo: PathBuf,
    /// Mesh simplifier.
    pub meshlab: PathBuf,
    /// Directory the simplifier must run from to find its plugins.
    pub meshlab_plugins: Option<PathBuf>,
}

impl Default for ToolPaths {
    fn default() -> Self {
        let platform = Platform::current().unwrap_or(Platform::Linux);
        Self::for_platform(platform)
    }
}

impl ToolPaths {
    /// Executable names expected on `PATH` for a platform.
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            assimp: platform.executable("assimp"),
            mayo: platform.executable("mayo-conv"),
            meshlab: platform.executable("meshlabserver"),
            meshlab_plugins: None,
        }
    }

    /// Defaults overridden by `MESHPORT_*` environment variables.
    pub fn from_env() -> Self {
        let mut paths = Self::default();
        if let Some(path) = std::env::var_os("MESHPORT_ASSIMP") {
            paths.assimp = path.into();
        }
        if let Some(path) = std::env::var_os("MESHPORT_MAYO") {
            paths.mayo = path.into();
        }
        if let Some(path) = std::env::var_os("MESHPORT_MESHLAB") {
            paths.meshlab = path.into();
        }
        if let Some(path) = std::env::var_os("MESHPORT_MESHLAB_PLUGINS") {
            paths.meshlab_plugins = Some(path.into());
        }
        paths
    }

    /// Copy with relative program paths made absolute.
    ///
    /// Tools run from the working directory, so `./bin/assimp` must be
    /// anchored to the current directory first. Bare names stay as they are
    /// for `PATH` lookup.
    pub fn resolved(&self) -> Self {
        Self {
            assimp: absolute_program(&self.assimp),
            mayo: absolute_program(&self.mayo),
            meshlab: absolute_program(&self.meshlab),
            meshlab_plugins: self.meshlab_plugins.clone(),
        }
    }
}

fn absolute_program(program: &Path) -> PathBuf {
    if program.is_absolute() || program.components().count() < 2 {
        return program.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(dir) => dir.join(program),
        Err(e) => {
            tracing::warn!("Cannot resolve {}: {}", program.display(), e);
            program.to_path_buf()
        }
    }
}

/// Options for a single conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Offer polygon reduction after the first conversion stage.
    pub propose_reduction: bool,
    /// Ask for a substitute texture for each material without one.
    pub claim_missing_textures: bool,
    /// Face count to reduce to when reduction is proposed.
    pub target_face_count: Option<u32>,
    /// Units of the source; guessed from the extension when absent.
    pub units: Option<Units>,
    /// Apply the legacy `meter="1"` scale correction to the final document.
    pub legacy_unit_fix: bool,
    /// Inject the double-sided rendering technique into the final document.
    pub double_sided_faces: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            propose_reduction: true,
            claim_missing_textures: false,
            target_face_count: Some(DEFAULT_TARGET_FACE_COUNT),
            units: None,
            legacy_unit_fix: false,
            double_sided_faces: true,
        }
    }
}

/// Settings file contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tools: ToolPaths,
    pub options: ConvertOptions,
    /// File holding the completed-conversions count.
    pub counter_file: Option<PathBuf>,
}

impl Settings {
    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConvertError::MissingArtifact {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| ConvertError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}
