//! Material library (MTL) parser.
//!
//! Only the structure needed downstream is kept: material names, diffuse colors
//! and diffuse textures. Other directives are dropped.

use crate::error::{ConvertError, Result};
use crate::model::{Material, MaterialLibrary, Rgb, TextureReference};
use std::path::Path;

/// Directive opening a new material.
pub const NEW_MATERIAL: &str = "newmtl";
/// Diffuse color directive.
pub const DIFFUSE_COLOR: &str = "Kd";
/// Diffuse texture directive.
pub const DIFFUSE_TEXTURE: &str = "map_Kd";

/// Split a directive line into its keyword and the rest of the line.
fn split_directive(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.find(char::is_whitespace) {
        Some(pos) => (&line[..pos], line[pos..].trim()),
        None => (line, ""),
    }
}

/// Parse MTL text.
pub fn parse_mtl(content: &str, path: &Path) -> Result<MaterialLibrary> {
    let mut library = MaterialLibrary::new();
    let mut current: Option<Material> = None;

    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('#') {
            if library.generator.is_none() {
                library.generator = Some(trimmed.to_string());
            }
            continue;
        }

        let (keyword, rest) = split_directive(trimmed);
        match keyword {
            NEW_MATERIAL => {
                if let Some(material) = current.take() {
                    library.insert(material);
                }
                current = Some(Material::new(rest));
            }
            DIFFUSE_COLOR => {
                if let Some(material) = current.as_mut() {
                    material.diffuse_color = Some(parse_color(rest, idx + 1, path)?);
                }
            }
            DIFFUSE_TEXTURE => {
                if let Some(material) = current.as_mut() {
                    if !rest.is_empty() {
                        material.diffuse_texture = Some(TextureReference::parse(rest));
                    }
                }
            }
            _ => {}
        }
    }

    if let Some(material) = current.take() {
        library.insert(material);
    }

    Ok(library)
}

fn parse_color(value: &str, line: usize, path: &Path) -> Result<Rgb> {
    let channels: Vec<f64> = value
        .split_whitespace()
        .map(|v| v.parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| ConvertError::Parse {
            path: path.to_path_buf(),
            line,
            message: format!("invalid diffuse color '{}'", value),
        })?;

    match channels.as_slice() {
        [r, g, b] => Ok(Rgb([*r, *g, *b])),
        _ => Err(ConvertError::Parse {
            path: path.to_path_buf(),
            line,
            message: format!("expected 3 diffuse color channels, got {}", channels.len()),
        }),
    }
}

/// Parse an MTL file.
pub fn parse_mtl_file(path: &Path) -> Result<MaterialLibrary> {
    if !path.exists() {
        return Err(ConvertError::MissingArtifact {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    parse_mtl(&content, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ASSIMP_MTL: &str = "# File produced by Open Asset Import Library (http://www.assimp.sf.net)\n\
# (assimp v5.2.5)\n\
\n\
newmtl DefaultMaterial\n\
Kd 0.6 0.6 0.6\n\
Ka 0 0 0\n\
Ks 0 0 0\n\
Ni 1\n\
d 1\n\
illum 2\n\
\n\
newmtl Oak Wood\n\
Kd 0.8 0.7 0.5\n\
map_Kd textures/oak wood.jpg\n\
map_bump textures/oak_n.jpg\n\
\n\
newmtl Packed\n\
  map_Kd *12\n";

    fn parse(content: &str) -> Result<MaterialLibrary> {
        parse_mtl(content, Path::new("test.mtl"))
    }

    #[test]
    fn test_parse_generator_and_materials() {
        let library = parse(ASSIMP_MTL).unwrap();

        assert_eq!(
            library.generator.as_deref(),
            Some("# File produced by Open Asset Import Library (http://www.assimp.sf.net)")
        );
        let names: Vec<_> = library.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["DefaultMaterial", "Oak Wood", "Packed"]);

        let default = library.get("DefaultMaterial").unwrap();
        assert_eq!(default.diffuse_color, Some(Rgb([0.6, 0.6, 0.6])));
        assert_eq!(default.diffuse_texture, None);

        let oak = library.get("Oak Wood").unwrap();
        assert_eq!(
            oak.diffuse_texture,
            Some(TextureReference::Path("textures/oak wood.jpg".to_string()))
        );

        let packed = library.get("Packed").unwrap();
        assert_eq!(packed.diffuse_texture, Some(TextureReference::Embedded(12)));
    }

    #[test]
    fn test_properties_before_first_material_are_dropped() {
        let library = parse("Kd 1 1 1\nmap_Kd stray.png\nnewmtl a\n").unwrap();
        assert_eq!(library.len(), 1);
        assert_eq!(library.get("a").unwrap().diffuse_color, None);
        assert_eq!(library.generator, None);
    }

    #[test]
    fn test_invalid_color_reports_line() {
        let err = parse("newmtl a\nKd 1 x 1\n").unwrap_err();
        match err {
            ConvertError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
        assert!(parse("newmtl a\nKd 1 1\n").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = parse_mtl_file(Path::new("/nonexistent/meshport-inter.mtl")).unwrap_err();
        assert!(matches!(err, ConvertError::MissingArtifact { .. }));
    }

    #[test]
    fn test_commented_transparency_is_ignored() {
        let library = parse("newmtl glass\n# d 0.2\nKd 0 0 1\n").unwrap();
        assert_eq!(library.generator.as_deref(), Some("# d 0.2"));
        assert_eq!(library.get("glass").unwrap().diffuse_color, Some(Rgb([0.0, 0.0, 1.0])));
    }
}
