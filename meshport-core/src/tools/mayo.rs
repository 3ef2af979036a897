//! CAD converter (Mayo `mayo-conv`).

use super::{Arg, ExternalConverter, ToolCommand};
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::info;

/// Adapter for the `mayo-conv` command-line tool.
#[derive(Debug, Clone)]
pub struct Mayo {
    exe: PathBuf,
}

impl Mayo {
    pub fn new(exe: impl Into<PathBuf>) -> Self {
        Self { exe: exe.into() }
    }
}

impl ExternalConverter for Mayo {
    fn run(&self, working_dir: &Path, in_file: &str, out_file: &str, log_file: &str) -> Result<()> {
        info!("Converting CAD model {} to {}", in_file, out_file);
        ToolCommand::new(&self.exe, working_dir)
            .arg(Arg::flag("--export"))
            .arg(Arg::path(out_file))
            .arg(Arg::path(in_file))
            .run(log_file)
    }
}
