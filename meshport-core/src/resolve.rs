//! Texture reference resolution.
//!
//! Converters emit texture references that the next tool cannot follow:
//! placeholders for images packed in the source (`*N`), or paths that were
//! valid on the author's machine. Both are rewritten in the material library
//! to point at files in the session working directory.

use crate::config::{EMBEDDED_TEXTURE_PROBE_LIMIT, TEXTURE_EXTENSIONS};
use crate::error::Result;
use crate::model::{MaterialLibrary, TextureReference};
use crate::prompt::Prompter;
use crate::session::ConversionSession;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of embedded texture resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmbeddedResolution {
    /// Placeholder index and the extracted file it now points at.
    pub resolved: Vec<(u32, String)>,
    /// Placeholder indices with no extracted image.
    pub unresolved: Vec<u32>,
}

/// Outcome of external texture resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExternalResolution {
    /// Original reference and the reserved name it was rewritten to.
    pub resolved: Vec<(String, String)>,
    /// References that could not be found anywhere.
    pub unresolved: Vec<String>,
    /// References with several filename matches, with every candidate.
    pub ambiguous: Vec<(String, Vec<PathBuf>)>,
}

/// Name the general converter gives to extracted image `index`.
pub fn embedded_texture_name(link_stem: &str, index: u32, extension: &str) -> String {
    format!("{}_img{}.{}", link_stem, index, extension)
}

/// Point embedded placeholders at the images extracted into `work_dir`.
///
/// `extract` runs once, and only when at least one placeholder exists.
/// Indices are probed from high to low; each placeholder is matched as a whole
/// number so `*1` never rewrites part of `*12`.
pub fn resolve_embedded_textures<F>(
    library: &mut MaterialLibrary,
    work_dir: &Path,
    link_stem: &str,
    extract: F,
) -> Result<EmbeddedResolution>
where
    F: FnOnce() -> Result<()>,
{
    let referenced: BTreeSet<u32> = library
        .iter()
        .filter_map(|m| m.diffuse_texture.as_ref()?.embedded_index())
        .collect();

    let mut report = EmbeddedResolution::default();
    if referenced.is_empty() {
        return Ok(report);
    }

    extract()?;

    for index in (0..EMBEDDED_TEXTURE_PROBE_LIMIT).rev() {
        if !referenced.contains(&index) {
            continue;
        }
        let found = TEXTURE_EXTENSIONS
            .iter()
            .map(|ext| embedded_texture_name(link_stem, index, ext))
            .find(|name| work_dir.join(name).is_file());

        match found {
            Some(name) => {
                for material in library.iter_mut() {
                    if material.diffuse_texture == Some(TextureReference::Embedded(index)) {
                        material.diffuse_texture = Some(TextureReference::Path(name.clone()));
                    }
                }
                debug!("Embedded texture *{} -> {}", index, name);
                report.resolved.push((index, name));
            }
            None => report.unresolved.push(index),
        }
    }

    for index in referenced.range(EMBEDDED_TEXTURE_PROBE_LIMIT..) {
        report.unresolved.push(*index);
    }
    if !report.unresolved.is_empty() {
        warn!("Embedded textures not extracted: {:?}", report.unresolved);
    }

    Ok(report)
}

/// Use the platform directory separator throughout a reference.
pub fn normalize_separator(path: &str) -> String {
    if cfg!(windows) {
        path.replace('/', "\\")
    } else {
        path.replace('\\', "/")
    }
}

/// Filename part of a reference, whatever separator it uses.
fn reference_basename(reference: &str) -> Option<&str> {
    reference
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
}

/// Every file named `filename` under `root`, sorted. Symlinked directories are
/// not followed.
pub fn find_by_filename(root: &Path, filename: &str) -> Vec<PathBuf> {
    let mut matches = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if entry.file_name().to_str() == Some(filename) {
                matches.push(entry.path());
            }
        }
    }

    matches.sort();
    matches
}

/// Locate an external texture: first relative to the source directory, then by
/// filename anywhere under the source's parent directory.
fn locate_texture(reference: &str, source_dir: &Path) -> (Option<PathBuf>, Vec<PathBuf>) {
    let direct = source_dir.join(normalize_separator(reference));
    if direct.is_file() {
        return (Some(direct), Vec::new());
    }

    let Some(basename) = reference_basename(reference) else {
        return (None, Vec::new());
    };
    let root = source_dir.parent().unwrap_or(source_dir);
    let matches = find_by_filename(root, basename);
    (matches.first().cloned(), matches)
}

/// Rewrite diffuse textures listed in `references` to local reserved copies.
///
/// References that are not a material's diffuse texture (normal maps, etc.)
/// are ignored. Unresolved textures are left untouched.
pub fn resolve_external_textures(
    library: &mut MaterialLibrary,
    references: &[String],
    source_dir: &Path,
    session: &ConversionSession,
) -> Result<ExternalResolution> {
    let mut report = ExternalResolution::default();

    for reference in references {
        let used = library
            .iter()
            .any(|m| m.diffuse_texture.as_ref().and_then(TextureReference::as_path) == Some(reference));
        if !used {
            continue;
        }

        let (found, candidates) = locate_texture(reference, source_dir);
        if candidates.len() > 1 {
            warn!(
                "Texture {} matches {} files, using {}",
                reference,
                candidates.len(),
                candidates[0].display()
            );
            report.ambiguous.push((reference.clone(), candidates));
        }

        let Some(found) = found else {
            warn!("Texture not found: {}", reference);
            report.unresolved.push(reference.clone());
            continue;
        };

        let local = session.adopt(&found)?;
        for material in library.iter_mut() {
            if material.diffuse_texture.as_ref().and_then(TextureReference::as_path) == Some(reference) {
                material.diffuse_texture = Some(TextureReference::Path(local.clone()));
            }
        }
        info!("Texture {} -> {}", reference, local);
        report.resolved.push((reference.clone(), local));
    }

    Ok(report)
}

/// Ask for a substitute texture for every material without a usable one.
///
/// A texture is unusable when the material has none, when it still points at
/// an embedded placeholder, or when it is one of the `unresolved` references.
/// Returns the names of materials that received a texture.
pub fn claim_missing_textures(
    library: &mut MaterialLibrary,
    unresolved: &[String],
    session: &ConversionSession,
    prompter: &mut dyn Prompter,
) -> Result<Vec<String>> {
    let candidates: Vec<String> = library
        .iter()
        .filter(|material| match &material.diffuse_texture {
            None => true,
            Some(TextureReference::Embedded(_)) => true,
            Some(TextureReference::Path(path)) => unresolved.contains(path),
        })
        .map(|material| material.name.clone())
        .collect();

    let mut claimed = Vec::new();
    for name in candidates {
        let Some(path) = prompter.claim_texture(&name) else {
            continue;
        };
        let local = session.adopt(&path)?;
        library.set_texture(&name, local);
        claimed.push(name);
    }
    Ok(claimed)
}
