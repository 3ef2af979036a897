//! Material library model.

use serde::Serialize;
use std::fmt;

/// A texture reference as emitted by a converter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TextureReference {
    /// Placeholder `*N` pointing at an image packed inside the source file.
    Embedded(u32),
    /// Relative or absolute file path.
    Path(String),
}

impl TextureReference {
    /// Classify a raw reference string.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some(index) = raw.strip_prefix('*') {
            if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(index) = index.parse() {
                    return TextureReference::Embedded(index);
                }
            }
        }
        TextureReference::Path(raw.to_string())
    }

    /// Embedded index, if this is a placeholder.
    pub fn embedded_index(&self) -> Option<u32> {
        match self {
            TextureReference::Embedded(index) => Some(*index),
            TextureReference::Path(_) => None,
        }
    }

    /// File path, if this is not a placeholder.
    pub fn as_path(&self) -> Option<&str> {
        match self {
            TextureReference::Embedded(_) => None,
            TextureReference::Path(path) => Some(path),
        }
    }
}

impl fmt::Display for TextureReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureReference::Embedded(index) => write!(f, "*{}", index),
            TextureReference::Path(path) => write!(f, "{}", path),
        }
    }
}

/// Diffuse color with channels in the 0-1 range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgb(pub [f64; 3]);

impl Rgb {
    /// Integer RGBA form (0-255 per channel, opaque alpha).
    pub fn to_rgba8(&self) -> [u8; 4] {
        let channel = |value: f64| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
        [channel(self.0[0]), channel(self.0[1]), channel(self.0[2]), 255]
    }
}

/// One entry of a material library.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub name: String,
    pub diffuse_color: Option<Rgb>,
    pub diffuse_texture: Option<TextureReference>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            diffuse_color: None,
            diffuse_texture: None,
        }
    }
}

/// Ordered set of materials keyed by unique name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MaterialLibrary {
    /// First comment line of the source text, kept verbatim.
    pub generator: Option<String>,
    materials: Vec<Material>,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a material, replacing an existing one with the same name in place.
    pub fn insert(&mut self, material: Material) {
        match self.get_mut(&material.name) {
            Some(existing) => *existing = material,
            None => self.materials.push(material),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Material> {
        self.materials.iter_mut().find(|m| m.name == name)
    }

    /// Materials in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Material> {
        self.materials.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Whether any material has a diffuse texture.
    pub fn has_diffuse_texture(&self) -> bool {
        self.materials.iter().any(|m| m.diffuse_texture.is_some())
    }

    /// Names of materials without a diffuse texture.
    pub fn materials_without_texture(&self) -> Vec<String> {
        self.materials
            .iter()
            .filter(|m| m.diffuse_texture.is_none())
            .map(|m| m.name.clone())
            .collect()
    }

    /// Assign a diffuse texture path to a material. Returns false if unknown.
    pub fn set_texture(&mut self, name: &str, texture_path: impl Into<String>) -> bool {
        match self.get_mut(name) {
            Some(material) => {
                material.diffuse_texture = Some(TextureReference::Path(texture_path.into()));
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_embedded_reference() {
        assert_eq!(TextureReference::parse("*12"), TextureReference::Embedded(12));
        assert_eq!(TextureReference::parse(" *0 "), TextureReference::Embedded(0));
        assert_eq!(
            TextureReference::parse("*wood.png"),
            TextureReference::Path("*wood.png".to_string())
        );
        assert_eq!(
            TextureReference::parse("tex/wood.png"),
            TextureReference::Path("tex/wood.png".to_string())
        );
    }

    #[test]
    fn test_reference_display() {
        assert_eq!(TextureReference::Embedded(7).to_string(), "*7");
        assert_eq!(TextureReference::Path("a b.png".into()).to_string(), "a b.png");
    }

    #[test]
    fn test_rgba8_rounding() {
        assert_eq!(Rgb([1.0, 0.5, 0.0]).to_rgba8(), [255, 128, 0, 255]);
        assert_eq!(Rgb([0.2, 0.4, 1.3]).to_rgba8(), [51, 102, 255, 255]);
    }

    #[test]
    fn test_insert_keeps_order_and_unique_names() {
        let mut library = MaterialLibrary::new();
        library.insert(Material::new("b"));
        library.insert(Material::new("a"));
        let mut replacement = Material::new("b");
        replacement.diffuse_color = Some(Rgb([1.0, 1.0, 1.0]));
        library.insert(replacement);

        let names: Vec<_> = library.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(library.get("b").unwrap().diffuse_color.is_some());
    }

    #[test]
    fn test_materials_without_texture() {
        let mut library = MaterialLibrary::new();
        library.insert(Material::new("plain"));
        library.insert(Material::new("wood"));
        assert!(library.set_texture("wood", "wood.png"));
        assert!(!library.set_texture("missing", "x.png"));

        assert_eq!(library.materials_without_texture(), vec!["plain".to_string()]);
        assert!(library.has_diffuse_texture());
    }
}
