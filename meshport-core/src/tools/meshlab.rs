//! Mesh simplifier (MeshLab `meshlabserver`).

use super::{Arg, ExternalConverter, ToolCommand};
use crate::config::REDUCTION_SCRIPT;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::info;

/// Adapter for the `meshlabserver` command-line tool.
#[derive(Debug, Clone)]
pub struct MeshLab {
    exe: PathBuf,
    /// When set, the tool runs from here to load its plugins and files are
    /// passed as absolute paths.
    plugin_dir: Option<PathBuf>,
    script_file: String,
}

impl MeshLab {
    pub fn new(exe: impl Into<PathBuf>, plugin_dir: Option<PathBuf>) -> Self {
        Self {
            exe: exe.into(),
            plugin_dir,
            script_file: REDUCTION_SCRIPT.to_string(),
        }
    }

    /// Use another filter script file (relative to the working directory).
    pub fn with_script(mut self, script_file: impl Into<String>) -> Self {
        self.script_file = script_file.into();
        self
    }

    pub fn script_file(&self) -> &str {
        &self.script_file
    }

    pub(crate) fn command(
        &self,
        working_dir: &Path,
        in_file: &str,
        out_file: &str,
    ) -> ToolCommand {
        let run_dir = self
            .plugin_dir
            .clone()
            .unwrap_or_else(|| working_dir.to_path_buf());
        let file = |name: &str| match &self.plugin_dir {
            Some(_) => working_dir.join(name),
            None => PathBuf::from(name),
        };

        ToolCommand::new(&self.exe, run_dir)
            .arg(Arg::flag("-i"))
            .arg(Arg::Path(file(in_file)))
            .arg(Arg::flag("-o"))
            .arg(Arg::Path(file(out_file)))
            .arg(Arg::flag("-m"))
            .arg(Arg::flag("wt"))
            .arg(Arg::flag("-s"))
            .arg(Arg::Path(file(&self.script_file)))
    }
}

impl ExternalConverter for MeshLab {
    fn run(&self, working_dir: &Path, in_file: &str, out_file: &str, log_file: &str) -> Result<()> {
        info!("Applying {} to {}", self.script_file, in_file);
        let log_path = match &self.plugin_dir {
            Some(_) => working_dir.join(log_file).to_string_lossy().into_owned(),
            None => log_file.to_string(),
        };
        self.command(working_dir, in_file, out_file).run(&log_path)
    }
}
