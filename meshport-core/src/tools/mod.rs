//! Adapters for the external command-line tools.
//!
//! Every tool runs from the session working directory and receives bare
//! filenames: the general converter cannot open absolute paths containing
//! non-ASCII characters.

mod assimp;
mod mayo;
mod meshlab;

pub use assimp::Assimp;
pub use mayo::Mayo;
pub use meshlab::MeshLab;

use crate::config::ToolPaths;
use crate::error::{ConvertError, Result};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

/// Placeholder surfaced when a failed tool left no log behind.
pub const NO_LOG: &str = "No log available.";

/// Uniform contract of the converter adapters.
pub trait ExternalConverter {
    /// Convert `in_file` into `out_file`, both relative to `working_dir`.
    fn run(&self, working_dir: &Path, in_file: &str, out_file: &str, log_file: &str) -> Result<()>;
}

/// One argument of a tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Literal flag or sub-command.
    Flag(String),
    /// File path, quoted when displayed.
    Path(PathBuf),
}

impl Arg {
    pub fn flag(flag: impl Into<String>) -> Self {
        Arg::Flag(flag.into())
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        Arg::Path(path.into())
    }
}

/// A single blocking invocation of an external tool.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<Arg>,
    working_dir: PathBuf,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
        }
    }

    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Reject empty program or path arguments before anything is spawned.
    fn validate(&self) -> Result<()> {
        if self.program.as_os_str().is_empty() {
            return Err(ConvertError::invalid_input("tool executable path is empty"));
        }
        if self
            .args
            .iter()
            .any(|a| matches!(a, Arg::Path(p) if p.as_os_str().is_empty()))
        {
            return Err(ConvertError::invalid_input(format!(
                "empty path argument in: {}",
                self
            )));
        }
        if !self.working_dir.is_dir() {
            return Err(ConvertError::invalid_input(format!(
                "working directory does not exist: {}",
                self.working_dir.display()
            )));
        }
        Ok(())
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.current_dir(&self.working_dir);
        for arg in &self.args {
            match arg {
                Arg::Flag(flag) => command.arg(flag),
                Arg::Path(path) => command.arg(path),
            };
        }
        command
    }

    fn failure(&self, log: String) -> ConvertError {
        ConvertError::ToolFailed {
            command: self.to_string(),
            log,
        }
    }

    fn status(&self, stdout: Stdio, stderr: Stdio) -> Result<ExitStatus> {
        self.command()
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .status()
            .map_err(|e| self.failure(format!("Failed to start {}: {}", self.program.display(), e)))
    }

    /// Run the command; on failure re-run it with output captured to `log_file`.
    pub fn run(&self, log_file: &str) -> Result<()> {
        self.validate()?;
        debug!("Running: {}", self);

        let status = self.status(Stdio::null(), Stdio::null())?;
        if status.success() {
            return Ok(());
        }

        debug!("{} exited with {}, capturing log", self.program.display(), status);
        Err(self.failure(self.capture_log(log_file)))
    }

    /// Run the command with stdout written to `output_file`.
    pub fn run_to_file(&self, output_file: &str, log_file: &str) -> Result<()> {
        self.validate()?;
        debug!("Running: {} > {}", self, output_file);

        let output = File::create(self.working_dir.join(output_file))?;
        let status = self.status(Stdio::from(output), Stdio::null())?;
        if status.success() {
            return Ok(());
        }

        Err(self.failure(self.capture_log(log_file)))
    }

    /// Second, logged invocation of a failed command. Returns the log contents.
    fn capture_log(&self, log_file: &str) -> String {
        let log_path = self.working_dir.join(log_file);
        let redirected = File::create(&log_path).and_then(|stdout| {
            let stderr = stdout.try_clone()?;
            Ok((stdout, stderr))
        });
        match redirected {
            Ok((stdout, stderr)) => {
                let rerun = self
                    .command()
                    .stdin(Stdio::null())
                    .stdout(stdout)
                    .stderr(stderr)
                    .status();
                if let Err(e) = rerun {
                    debug!("Logged re-run of {} failed: {}", self.program.display(), e);
                }
            }
            Err(e) => debug!("Cannot create {}: {}", log_path.display(), e),
        }

        match std::fs::read_to_string(&log_path) {
            Ok(log) if !log.trim().is_empty() => log,
            _ => NO_LOG.to_string(),
        }
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.program.display())?;
        for arg in &self.args {
            match arg {
                Arg::Flag(flag) => write!(f, " {}", flag)?,
                Arg::Path(path) => write!(f, " \"{}\"", path.display())?,
            }
        }
        Ok(())
    }
}

/// The three external tools used by the pipeline.
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub assimp: Assimp,
    pub mayo: Mayo,
    pub meshlab: MeshLab,
}

impl Toolchain {
    pub fn new(paths: &ToolPaths) -> Self {
        let paths = paths.resolved();
        Self {
            assimp: Assimp::new(&paths.assimp),
            mayo: Mayo::new(&paths.mayo),
            meshlab: MeshLab::new(&paths.meshlab, paths.meshlab_plugins.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_paths_only() {
        let command = ToolCommand::new("/opt/my tools/assimp", "/tmp")
            .arg(Arg::flag("export"))
            .arg(Arg::path("meshport-source.obj"))
            .arg(Arg::path("out dir/meshport-inter.obj"))
            .arg(Arg::flag("-tri"));
        assert_eq!(
            command.to_string(),
            r#""/opt/my tools/assimp" export "meshport-source.obj" "out dir/meshport-inter.obj" -tri"#
        );
    }

    #[test]
    fn test_empty_path_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let command = ToolCommand::new("assimp", dir.path()).arg(Arg::path(""));
        let err = command.run("meshport-assimp.log").unwrap_err();
        assert!(matches!(err, ConvertError::InvalidInput { .. }));
    }

    #[test]
    fn test_missing_working_dir_is_invalid_input() {
        let command = ToolCommand::new("assimp", "/nonexistent/meshport/dir");
        let err = command.run("meshport-assimp.log").unwrap_err();
        assert!(matches!(err, ConvertError::InvalidInput { .. }));
    }

    #[test]
    fn test_unknown_program_is_tool_failure() {
        let dir = tempfile::tempdir().unwrap();
        let command = ToolCommand::new("meshport-no-such-tool", dir.path()).arg(Arg::flag("x"));
        match command.run("meshport-test.log").unwrap_err() {
            ConvertError::ToolFailed { command, log } => {
                assert_eq!(command, r#""meshport-no-such-tool" x"#);
                assert!(log.starts_with("Failed to start"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_captures_log() {
        let dir = tempfile::tempdir().unwrap();
        let command = ToolCommand::new("/bin/sh", dir.path())
            .arg(Arg::flag("-c"))
            .arg(Arg::flag("echo 'Unable to open file'; exit 3"));
        match command.run("meshport-test.log").unwrap_err() {
            ConvertError::ToolFailed { log, .. } => assert_eq!(log.trim(), "Unable to open file"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(dir.path().join("meshport-test.log").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_silent_failure_has_no_log() {
        let dir = tempfile::tempdir().unwrap();
        let command = ToolCommand::new("/bin/sh", dir.path())
            .arg(Arg::flag("-c"))
            .arg(Arg::flag("exit 1"));
        match command.run("meshport-test.log").unwrap_err() {
            ConvertError::ToolFailed { log, .. } => assert_eq!(log, NO_LOG),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let command = ToolCommand::new("/bin/sh", dir.path())
            .arg(Arg::flag("-c"))
            .arg(Arg::flag("touch here.txt"));
        command.run("meshport-test.log").unwrap();
        assert!(dir.path().join("here.txt").exists());
    }
}
