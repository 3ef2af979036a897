//! Conversion session: the scratch files of one conversion attempt.
//!
//! Every file a session creates in its working directory carries
//! [`RESERVED_PREFIX`], so leftovers of an aborted run can always be globbed
//! and deleted before the directory is reused.

use crate::config::{RESERVED_PREFIX, SOURCE_LINK_STEM};
use crate::error::{ConvertError, Result};
use crate::units::Units;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The model being converted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceDescriptor {
    path: PathBuf,
    extension: String,
    units: Units,
}

impl SourceDescriptor {
    /// Describe a source file. Units are guessed from the extension when absent.
    pub fn new(path: &Path, units: Option<Units>) -> Result<Self> {
        if !path.is_file() {
            return Err(ConvertError::MissingArtifact {
                path: path.to_path_buf(),
            });
        }
        let reserved = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(RESERVED_PREFIX));
        if reserved {
            return Err(ConvertError::invalid_input(format!(
                "source names starting with {} are reserved for working files: {}",
                RESERVED_PREFIX,
                path.display()
            )));
        }
        let path = fs::canonicalize(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| {
                ConvertError::invalid_input(format!(
                    "source has no usable extension: {}",
                    path.display()
                ))
            })?;
        let units = units.unwrap_or_else(|| Units::guess(&extension));
        Ok(Self {
            path,
            extension,
            units,
        })
    }

    /// Absolute path of the source file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lower-cased extension, without dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn units(&self) -> Units {
        self.units
    }

    /// Directory holding the source file.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("/"))
    }

    /// Original filename, for naming the imported object.
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// How a file was brought into the working directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staged {
    HardLink,
    Copy,
}

/// Hard-link `original` as `link`, falling back on a copy (e.g. across devices).
pub fn link_or_copy(original: &Path, link: &Path) -> Result<Staged> {
    if link.exists() {
        fs::remove_file(link)?;
    }
    match fs::hard_link(original, link) {
        Ok(()) => Ok(Staged::HardLink),
        Err(e) => {
            debug!(
                "Hard link {} -> {} failed ({}), copying",
                link.display(),
                original.display(),
                e
            );
            fs::copy(original, link)?;
            Ok(Staged::Copy)
        }
    }
}

/// True when both files hold the same bytes.
fn same_content(a: &Path, b: &Path) -> Result<bool> {
    if fs::metadata(a)?.len() != fs::metadata(b)?.len() {
        return Ok(false);
    }
    Ok(fs::read(a)? == fs::read(b)?)
}

/// `name` with `-<n>` appended to its stem.
fn numbered_name(name: &str, n: u32) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}-{}.{}", stem, n, ext),
        _ => format!("{}-{}", name, n),
    }
}

/// Place `original` in `dir` as `name`, or as `name` numbered when another
/// file already holds that name. A file with identical content is reused.
/// Returns the name used.
pub fn place_file(original: &Path, dir: &Path, name: &str) -> Result<String> {
    let mut candidate = name.to_string();
    let mut n = 0;
    loop {
        let target = dir.join(&candidate);
        if !target.exists() {
            let staged = link_or_copy(original, &target)?;
            debug!("Placed {} as {} ({:?})", original.display(), candidate, staged);
            return Ok(candidate);
        }
        if same_content(original, &target)? {
            return Ok(candidate);
        }
        n += 1;
        candidate = numbered_name(name, n);
    }
}

/// Delete every reserved-prefix file in `dir`. Returns the number removed.
pub fn purge_reserved_files(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let reserved = name.to_str().is_some_and(|n| n.starts_with(RESERVED_PREFIX));
        if reserved && entry.file_type()?.is_file() {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }

    Ok(removed)
}

/// Scratch state of one conversion.
#[derive(Debug)]
pub struct ConversionSession {
    work_dir: PathBuf,
    source_link: Option<String>,
}

impl ConversionSession {
    /// Open a session in `work_dir`, purging leftovers of a previous run.
    pub fn open(work_dir: &Path) -> Result<Self> {
        if !work_dir.is_dir() {
            return Err(ConvertError::invalid_input(format!(
                "working directory does not exist: {}",
                work_dir.display()
            )));
        }
        let stale = purge_reserved_files(work_dir)?;
        if stale > 0 {
            warn!("Removed {} file(s) left by a previous run", stale);
        }
        Ok(Self {
            work_dir: work_dir.to_path_buf(),
            source_link: None,
        })
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Absolute path of a file in the working directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.work_dir.join(name)
    }

    /// Link the source into the working directory under an ASCII reserved name.
    pub fn stage_source(&mut self, source: &SourceDescriptor) -> Result<&str> {
        let name = format!("{}.{}", SOURCE_LINK_STEM, source.extension());
        let staged = link_or_copy(source.path(), &self.path(&name))?;
        debug!("Staged {} as {} ({:?})", source.path().display(), name, staged);
        Ok(self.source_link.insert(name).as_str())
    }

    /// Filename of the staged source.
    pub fn source_link(&self) -> Option<&str> {
        self.source_link.as_deref()
    }

    /// Bring an external file in as `<prefix><basename>`; returns the new name.
    ///
    /// A different file adopted under the same basename gets a numbered name.
    pub fn adopt(&self, original: &Path) -> Result<String> {
        let basename = original
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ConvertError::invalid_input(format!("not a file path: {}", original.display()))
            })?;
        place_file(original, &self.work_dir, &crate::config::reserved_name(&basename))
    }

    /// Delete every file this session created.
    pub fn purge(self) -> Result<usize> {
        let removed = purge_reserved_files(&self.work_dir)?;
        debug!("Purged {} session file(s) from {}", removed, self.work_dir.display());
        Ok(removed)
    }
}
