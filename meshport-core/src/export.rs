//! Copying a finished document out of the working directory.
//!
//! Session files are purged on release, so the exported document and its
//! textures must not carry [`RESERVED_PREFIX`]: textures are placed next to
//! the output under their plain names and the document is rewritten to match.

use crate::config::RESERVED_PREFIX;
use crate::error::{ConvertError, Result};
use crate::postprocess::rewrite_image_references;
use crate::session::place_file;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Suffix appended to the source stem for the default output name.
pub const OUTPUT_SUFFIX: &str = "-converted";

/// What [`export_document`] wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exported {
    pub path: PathBuf,
    /// Working texture name and the name it was exported as.
    pub textures: Vec<(String, String)>,
}

/// Default output for `source`: `<stem>-converted.dae` in the same directory.
pub fn default_output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("{}{}.dae", stem, OUTPUT_SUFFIX))
}

/// Absolute form of `output`, resolving its directory.
fn resolve_output(output: &Path) -> Result<PathBuf> {
    let name = output.file_name().ok_or_else(|| {
        ConvertError::invalid_input(format!("output is not a file path: {}", output.display()))
    })?;
    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok(fs::canonicalize(dir)?.join(name))
}

/// Write `document` to `output` along with the working `textures` it uses.
///
/// Refuses to overwrite `source` or to produce a reserved file name.
pub fn export_document(
    document: &Path,
    work_dir: &Path,
    textures: &[String],
    source: &Path,
    output: &Path,
) -> Result<Exported> {
    let output = resolve_output(output)?;
    let reserved = output
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(RESERVED_PREFIX));
    if reserved {
        return Err(ConvertError::invalid_input(format!(
            "output names starting with {} are reserved for working files: {}",
            RESERVED_PREFIX,
            output.display()
        )));
    }
    if output == source {
        return Err(ConvertError::invalid_input(format!(
            "output would overwrite the source: {}",
            output.display()
        )));
    }
    let output_dir = output.parent().unwrap_or_else(|| Path::new("/"));

    let mut renames = Vec::new();
    for name in textures {
        let original = work_dir.join(name);
        if !original.exists() {
            warn!("Texture {} is missing", original.display());
            continue;
        }
        let plain = name.strip_prefix(RESERVED_PREFIX).unwrap_or(name);
        let exported = place_file(&original, output_dir, plain)?;
        renames.push((name.clone(), exported));
    }

    let content = fs::read_to_string(document)?;
    fs::write(&output, rewrite_image_references(&content, &renames))?;
    info!("Exported {} with {} texture(s)", output.display(), renames.len());

    Ok(Exported {
        path: output,
        textures: renames,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOCUMENT: &str = r#"<?xml version="1.0"?>
<COLLADA><library_images><image id="wood"><init_from>meshport-wood.png</init_from></image></library_images></COLLADA>"#;

    fn work_dir_with_texture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("meshport-final.dae"), DOCUMENT).unwrap();
        fs::write(dir.path().join("meshport-wood.png"), "WOOD").unwrap();
        dir
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/models/chair.dae")),
            PathBuf::from("/models/chair-converted.dae")
        );
        assert_eq!(
            default_output_path(Path::new("/models/chair.fbx")),
            PathBuf::from("/models/chair-converted.dae")
        );
    }

    #[test]
    fn test_export_next_to_source() {
        let dir = work_dir_with_texture();
        let work_dir = fs::canonicalize(dir.path()).unwrap();
        let source = work_dir.join("chair.dae");
        fs::write(&source, "original").unwrap();
        fs::write(work_dir.join("wood.png"), "OTHER").unwrap();

        let exported = export_document(
            &work_dir.join("meshport-final.dae"),
            &work_dir,
            &["meshport-wood.png".to_string(), "meshport-gone.png".to_string()],
            &source,
            &default_output_path(&source),
        )
        .unwrap();

        assert_eq!(exported.path, work_dir.join("chair-converted.dae"));
        assert_eq!(
            exported.textures,
            vec![("meshport-wood.png".to_string(), "wood-1.png".to_string())]
        );
        assert_eq!(fs::read_to_string(work_dir.join("wood.png")).unwrap(), "OTHER");
        assert_eq!(fs::read_to_string(work_dir.join("wood-1.png")).unwrap(), "WOOD");
        let document = fs::read_to_string(&exported.path).unwrap();
        assert!(document.contains("<init_from>wood-1.png</init_from>"));
        assert!(!document.contains("meshport-"));
        assert_eq!(fs::read_to_string(&source).unwrap(), "original");
    }

    #[test]
    fn test_export_reuses_identical_texture() {
        let dir = work_dir_with_texture();
        let out = tempfile::tempdir().unwrap();
        fs::write(out.path().join("wood.png"), "WOOD").unwrap();

        let exported = export_document(
            &dir.path().join("meshport-final.dae"),
            dir.path(),
            &["meshport-wood.png".to_string()],
            &dir.path().join("chair.fbx"),
            &out.path().join("chair.dae"),
        )
        .unwrap();

        assert_eq!(
            exported.textures,
            vec![("meshport-wood.png".to_string(), "wood.png".to_string())]
        );
        assert!(!out.path().join("wood-1.png").exists());
    }

    #[test]
    fn test_export_refuses_source_and_reserved_names() {
        let dir = work_dir_with_texture();
        let work_dir = fs::canonicalize(dir.path()).unwrap();
        let source = work_dir.join("chair.dae");
        fs::write(&source, "original").unwrap();
        let document = work_dir.join("meshport-final.dae");

        assert!(matches!(
            export_document(&document, &work_dir, &[], &source, &source),
            Err(ConvertError::InvalidInput { .. })
        ));
        assert!(matches!(
            export_document(&document, &work_dir, &[], &source, &work_dir.join("meshport-out.dae")),
            Err(ConvertError::InvalidInput { .. })
        ));
        assert_eq!(fs::read_to_string(&source).unwrap(), "original");
    }
}
