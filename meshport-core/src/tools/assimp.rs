//! General-purpose mesh/scene converter (Open Asset Import Library CLI).

use super::{Arg, ExternalConverter, ToolCommand};
use crate::error::{ConvertError, Result};
use crate::parser::{parse_external_texture_refs, parse_face_count};
use std::path::{Path, PathBuf};
use tracing::info;

/// Adapter for the `assimp` command-line tool.
#[derive(Debug, Clone)]
pub struct Assimp {
    exe: PathBuf,
}

impl Assimp {
    pub fn new(exe: impl Into<PathBuf>) -> Self {
        Self { exe: exe.into() }
    }

    fn command(&self, working_dir: &Path) -> ToolCommand {
        ToolCommand::new(&self.exe, working_dir)
    }

    /// Extract images packed in `in_file` next to it, as `<stem>_img<N>.<ext>`.
    pub fn extract_embedded_textures(
        &self,
        working_dir: &Path,
        in_file: &str,
        log_file: &str,
    ) -> Result<()> {
        info!("Extracting embedded textures from {}", in_file);
        self.command(working_dir)
            .arg(Arg::flag("extract"))
            .arg(Arg::path(in_file))
            .run(log_file)
    }

    /// Write the info report of `in_file` to `nfo_file` and return it.
    pub fn info(
        &self,
        working_dir: &Path,
        in_file: &str,
        nfo_file: &str,
        log_file: &str,
    ) -> Result<String> {
        self.command(working_dir)
            .arg(Arg::flag("info"))
            .arg(Arg::path(in_file))
            .run_to_file(nfo_file, log_file)?;
        Ok(std::fs::read_to_string(working_dir.join(nfo_file))?)
    }

    /// External texture paths referenced by `in_file`, as listed in its info report.
    pub fn get_external_texture_references(
        &self,
        working_dir: &Path,
        in_file: &str,
        nfo_file: &str,
        log_file: &str,
    ) -> Result<Vec<String>> {
        let report = self.info(working_dir, in_file, nfo_file, log_file)?;
        Ok(parse_external_texture_refs(&report))
    }

    /// Face count from an info report previously written to `nfo_file`.
    pub fn get_face_count(&self, working_dir: &Path, nfo_file: &str) -> Result<Option<u64>> {
        let path = working_dir.join(nfo_file);
        if !path.exists() {
            return Err(ConvertError::MissingArtifact { path });
        }
        let report = std::fs::read_to_string(&path)?;
        Ok(parse_face_count(&report))
    }
}

impl ExternalConverter for Assimp {
    fn run(&self, working_dir: &Path, in_file: &str, out_file: &str, log_file: &str) -> Result<()> {
        info!("Converting {} to {}", in_file, out_file);
        self.command(working_dir)
            .arg(Arg::flag("export"))
            .arg(Arg::path(in_file))
            .arg(Arg::path(out_file))
            .arg(Arg::flag("-tri"))
            .run(log_file)
    }
}
