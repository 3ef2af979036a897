//! Text fix-ups applied to the final COLLADA document.
//!
//! Each transform is a plain `&str -> String` function so it can be tested on
//! its own; [`process_final_document`] chains the ones a conversion needs.

use crate::config::ConvertOptions;
use crate::error::{ConvertError, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Closing tag of the common effect profile, the injection anchor.
pub const COMMON_PROFILE_CLOSE: &str = "</profile_COMMON>";

/// Vendor technique making faces render from both sides.
pub const DOUBLE_SIDED_TECHNIQUE: &str =
    r#"<extra><technique profile="GOOGLEEARTH"><double_sided>1</double_sided></technique></extra>"#;

/// Axis declaration emitted by the CAD route.
pub const CAD_UP_AXIS: &str = "<up_axis>Y_UP</up_axis>";

/// Axis declaration the host expects.
pub const HOST_UP_AXIS: &str = "<up_axis>Z_UP</up_axis>";

/// Unit attribute written by the buggy converter release.
pub const LEGACY_UNIT: &str = r#"meter="1""#;

/// Corrected unit attribute.
pub const CORRECTED_UNIT: &str = r#"meter="0.01""#;

/// Comment prepended to every processed document.
pub fn generator_stamp() -> String {
    format!(
        "<!-- File modified by {} {}. -->",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )
}

/// Inject the double-sided technique before every common profile closing tag.
///
/// A document already carrying the technique is returned unchanged.
pub fn inject_double_sided(document: &str) -> String {
    if document.contains(DOUBLE_SIDED_TECHNIQUE) {
        debug!("Double-sided technique already present");
        return document.to_string();
    }
    document.replace(
        COMMON_PROFILE_CLOSE,
        &format!("{}\n{}", DOUBLE_SIDED_TECHNIQUE, COMMON_PROFILE_CLOSE),
    )
}

/// Swap the CAD route's up axis for the host's.
pub fn remap_up_axis(document: &str) -> String {
    document.replace(CAD_UP_AXIS, HOST_UP_AXIS)
}

/// Rewrite the first unit attribute to compensate the legacy scale bug.
pub fn correct_unit_scale(document: &str) -> String {
    document.replacen(LEGACY_UNIT, CORRECTED_UNIT, 1)
}

/// Add the generator stamp, unless already there.
///
/// The stamp goes right after the XML declaration, which must stay first.
pub fn stamp_generator(document: &str) -> String {
    let stamp = generator_stamp();
    if document.contains(&stamp) {
        return document.to_string();
    }
    if document.starts_with("<?xml") {
        if let Some(end) = document.find("?>") {
            let (declaration, rest) = document.split_at(end + 2);
            let rest = rest.trim_start_matches(['\r', '\n']);
            return format!("{}\n{}\n{}", declaration, stamp, rest);
        }
    }
    format!("{}\n{}", stamp, document)
}

/// Opening tag of an image file reference.
const IMAGE_REFERENCE_OPEN: &str = "<init_from>";
const IMAGE_REFERENCE_CLOSE: &str = "</init_from>";

/// Point image references whose file name is a key of `renames` at the
/// new name. Directory parts and `file://` schemes are dropped with it.
pub fn rewrite_image_references(document: &str, renames: &[(String, String)]) -> String {
    let mut output = String::with_capacity(document.len());
    let mut rest = document;
    while let Some(start) = rest.find(IMAGE_REFERENCE_OPEN) {
        let content_start = start + IMAGE_REFERENCE_OPEN.len();
        let Some(length) = rest[content_start..].find(IMAGE_REFERENCE_CLOSE) else {
            break;
        };
        output.push_str(&rest[..content_start]);
        let reference = &rest[content_start..content_start + length];
        let file_name = reference
            .trim()
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default();
        match renames.iter().find(|(from, _)| from == file_name) {
            Some((_, to)) => output.push_str(to),
            None => output.push_str(reference),
        }
        rest = &rest[content_start + length..];
    }
    output.push_str(rest);
    output
}

/// Apply the fix-ups selected by `options` to the document at `path`.
///
/// `from_cad` enables the axis remap.
pub fn process_final_document(path: &Path, options: &ConvertOptions, from_cad: bool) -> Result<()> {
    if !path.exists() {
        return Err(ConvertError::MissingArtifact {
            path: path.to_path_buf(),
        });
    }
    let mut document = fs::read_to_string(path)?;

    if options.double_sided_faces {
        if !document.contains(COMMON_PROFILE_CLOSE) {
            warn!("No common profile in {}, faces stay single-sided", path.display());
        }
        document = inject_double_sided(&document);
    }
    if from_cad {
        document = remap_up_axis(&document);
    }
    if options.legacy_unit_fix {
        document = correct_unit_scale(&document);
    }
    document = stamp_generator(&document);

    fs::write(path, document)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EFFECT: &str = r#"<effect id="mat-fx">
<profile_COMMON>
<technique sid="common"/>
</profile_COMMON>
</effect>"#;

    #[test]
    fn test_double_sided_injected_before_anchor() {
        insta::assert_snapshot!(inject_double_sided(EFFECT), @r###"
        <effect id="mat-fx">
        <profile_COMMON>
        <technique sid="common"/>
        <extra><technique profile="GOOGLEEARTH"><double_sided>1</double_sided></technique></extra>
        </profile_COMMON>
        </effect>
        "###);
    }

    #[test]
    fn test_double_sided_applied_once() {
        let once = inject_double_sided(EFFECT);
        let twice = inject_double_sided(&once);
        assert_eq!(once, twice);
        assert_eq!(twice.matches(DOUBLE_SIDED_TECHNIQUE).count(), 1);
    }

    #[test]
    fn test_axis_and_unit() {
        let asset = r#"<asset><unit name="meter" meter="1"/><up_axis>Y_UP</up_axis></asset>"#;
        assert_eq!(
            correct_unit_scale(&remap_up_axis(asset)),
            r#"<asset><unit name="meter" meter="0.01"/><up_axis>Z_UP</up_axis></asset>"#
        );
    }

    #[test]
    fn test_process_final_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meshport-final.dae");
        fs::write(&path, format!("<up_axis>Y_UP</up_axis>\n{}", EFFECT)).unwrap();

        process_final_document(&path, &ConvertOptions::default(), false).unwrap();
        let document = fs::read_to_string(&path).unwrap();

        assert!(document.starts_with(&generator_stamp()));
        assert!(document.contains(DOUBLE_SIDED_TECHNIQUE));
        assert!(document.contains(CAD_UP_AXIS));

        process_final_document(&path, &ConvertOptions::default(), true).unwrap();
        let document = fs::read_to_string(&path).unwrap();
        assert_eq!(document.matches(DOUBLE_SIDED_TECHNIQUE).count(), 1);
        assert_eq!(document.matches("<!--").count(), 1);
        assert!(document.contains(HOST_UP_AXIS));
    }

    #[test]
    fn test_missing_document() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            process_final_document(&dir.path().join("absent.dae"), &ConvertOptions::default(), false),
            Err(ConvertError::MissingArtifact { .. })
        ));
    }

    #[test]
    fn test_stamp_follows_xml_declaration() {
        let document = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<COLLADA version=\"1.4.1\">\n</COLLADA>";

        let stamped = stamp_generator(document);
        assert!(stamped.starts_with("<?xml"));
        assert_eq!(
            stamped.lines().nth(1).unwrap(),
            generator_stamp()
        );
        assert_eq!(stamp_generator(&stamped), stamped);
    }

    #[test]
    fn test_rewrite_image_references() {
        let document = r#"<library_images>
<image id="a"><init_from>meshport-wood.png</init_from></image>
<image id="b"><init_from>file:///tmp/models/meshport-source_img1.png</init_from></image>
<image id="c"><init_from>meshport-wood.png.bak</init_from></image>
</library_images>"#;
        let renames = vec![
            ("meshport-wood.png".to_string(), "wood.png".to_string()),
            ("meshport-source_img1.png".to_string(), "source_img1.png".to_string()),
        ];

        insta::assert_snapshot!(rewrite_image_references(document, &renames), @r###"
        <library_images>
        <image id="a"><init_from>wood.png</init_from></image>
        <image id="b"><init_from>source_img1.png</init_from></image>
        <image id="c"><init_from>meshport-wood.png.bak</init_from></image>
        </library_images>
        "###);
    }
}
