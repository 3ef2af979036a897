//! Interactive choices the pipeline delegates to its caller.

use std::collections::HashMap;
use std::path::PathBuf;

/// Answers the questions asked during a conversion.
pub trait Prompter {
    /// Substitute texture for a material without one, or `None` to skip it.
    fn claim_texture(&mut self, material: &str) -> Option<PathBuf>;

    /// Target face count for polygon reduction, or `None` to keep the mesh.
    ///
    /// `face_count` is the current count when it could be determined.
    fn reduction_target(&mut self, face_count: Option<u64>) -> Option<u32>;
}

/// Prompter answering from values fixed up front.
#[derive(Debug, Clone, Default)]
pub struct FixedPrompter {
    /// Texture per material name.
    pub textures: HashMap<String, PathBuf>,
    /// Target face count; reduction is skipped when absent.
    pub target_face_count: Option<u32>,
}

impl FixedPrompter {
    pub fn new(target_face_count: Option<u32>) -> Self {
        Self {
            textures: HashMap::new(),
            target_face_count,
        }
    }

    pub fn with_texture(mut self, material: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.textures.insert(material.into(), path.into());
        self
    }
}

impl Prompter for FixedPrompter {
    fn claim_texture(&mut self, material: &str) -> Option<PathBuf> {
        self.textures.get(material).cloned()
    }

    fn reduction_target(&mut self, face_count: Option<u64>) -> Option<u32> {
        let target = self.target_face_count?;
        match face_count {
            // Nothing to reduce.
            Some(count) if count <= u64::from(target) => None,
            _ => Some(target),
        }
    }
}
