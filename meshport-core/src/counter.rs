//! Completed-conversions counter.

use crate::error::{ConvertError, Result};
use std::fs;
use std::path::PathBuf;

/// Store incremented once per completed conversion.
pub trait ConversionCounter {
    /// Increment the count and return the new value.
    fn increment(&mut self) -> Result<u64>;
}

/// Count kept in a plain text file holding one integer.
#[derive(Debug, Clone)]
pub struct FileCounter {
    path: PathBuf,
}

impl FileCounter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Current count; 0 when the file does not exist yet.
    pub fn count(&self) -> Result<u64> {
        if !self.path.exists() {
            return Ok(0);
        }
        let content = fs::read_to_string(&self.path)?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(0);
        }
        trimmed.parse().map_err(|_| ConvertError::Parse {
            path: self.path.clone(),
            line: 1,
            message: format!("invalid count: {}", trimmed),
        })
    }
}

impl ConversionCounter for FileCounter {
    fn increment(&mut self) -> Result<u64> {
        let count = self.count()? + 1;
        fs::write(&self.path, count.to_string())?;
        Ok(count)
    }
}

/// In-memory count.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryCounter {
    pub count: u64,
}

impl ConversionCounter for MemoryCounter {
    fn increment(&mut self) -> Result<u64> {
        self.count += 1;
        Ok(self.count)
    }
}
