//! Parser for the general converter's `info` report.
//!
//! The report is free-form text meant for humans, e.g.
//!
//! ```text
//! Faces:                       12
//! ...
//! Texture Refs:
//!     'textures/wood.png'
//!     '*0'
//!
//! Node hierarchy:
//! ```

use crate::model::TextureReference;

/// Label of the face count line.
pub const FACES_LABEL: &str = "Faces:";

/// Header opening the texture reference list.
pub const TEXTURE_REFS_HEADER: &str = "Texture Refs:";

/// Section headers that may follow the texture reference list.
const SECTION_HEADERS: [&str; 4] = [
    "Named Materials:",
    "Named Animations:",
    "Node hierarchy:",
    TEXTURE_REFS_HEADER,
];

fn is_section_header(line: &str) -> bool {
    let trimmed = line.trim();
    if SECTION_HEADERS.contains(&trimmed) {
        return true;
    }
    !line.starts_with(char::is_whitespace) && trimmed.ends_with(':')
}

/// Extract the texture references listed in an info report, in order.
pub fn parse_texture_refs(report: &str) -> Vec<String> {
    let mut refs = Vec::new();
    let mut lines = report.lines();

    if !lines.any(|l| l.trim() == TEXTURE_REFS_HEADER) {
        return refs;
    }

    for line in lines {
        if is_section_header(line) {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let unquoted = trimmed
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .unwrap_or(trimmed);
        if !unquoted.is_empty() {
            refs.push(unquoted.to_string());
        }
    }

    refs
}

/// Texture references that point at files rather than embedded images.
pub fn parse_external_texture_refs(report: &str) -> Vec<String> {
    parse_texture_refs(report)
        .into_iter()
        .filter(|r| TextureReference::parse(r).embedded_index().is_none())
        .collect()
}

/// Face count from the first line starting with [`FACES_LABEL`].
pub fn parse_face_count(report: &str) -> Option<u64> {
    let line = report
        .lines()
        .map(str::trim_start)
        .find(|l| l.starts_with(FACES_LABEL))?;
    let digits: String = line[FACES_LABEL.len()..]
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const REPORT: &str = r"Launching asset import ...           OK
Validating postprocessing flags ...  OK
Importing file ...                   OK
   import took approx. 0.00213 seconds

Memory consumption: 14072 B
Nodes:                       2
Maximum depth                2
Meshes:                      1
Textures (embed.):           1
Materials:                   2
Vertices:                    24
Faces:                       12
Average faces/mesh           12

Named Materials:
    'DefaultMaterial'
    'Oak Wood'

Texture Refs:
    'textures/oak wood.jpg'
    '*0'
    'C:\maps\metal.png'

Node hierarchy:
'box'
";

    #[test]
    fn test_texture_refs_stop_at_next_section() {
        assert_eq!(
            parse_texture_refs(REPORT),
            vec!["textures/oak wood.jpg", "*0", "C:\\maps\\metal.png"]
        );
    }

    #[test]
    fn test_external_refs_skip_placeholders() {
        assert_eq!(
            parse_external_texture_refs(REPORT),
            vec!["textures/oak wood.jpg", "C:\\maps\\metal.png"]
        );
    }

    #[test]
    fn test_texture_refs_at_end_of_text() {
        let report = "Faces: 3\nTexture Refs:\n    'a.png'\n    'b.png'";
        assert_eq!(parse_texture_refs(report), vec!["a.png", "b.png"]);
    }

    #[test]
    fn test_no_texture_refs_section() {
        assert!(parse_texture_refs("Faces: 3\n").is_empty());
        assert!(parse_texture_refs("").is_empty());
    }

    #[test]
    fn test_face_count() {
        assert_eq!(parse_face_count(REPORT), Some(12));
        assert_eq!(parse_face_count("Faces:    1,204\n"), Some(1204));
        assert_eq!(parse_face_count("Vertices: 8\n"), None);
        assert_eq!(parse_face_count("Faces:\n"), None);
    }
}
