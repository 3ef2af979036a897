//! Material names indexed by texture path or color.
//!
//! The simplifier and the final importer both discard material names. The index
//! is captured before any renaming step and applied to host materials after
//! import, matched the way the host identifies a material: the absolute path of
//! its diffuse texture, or its opaque RGBA color.

use super::material::{MaterialLibrary, TextureReference};
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Prefix the host importer gives to materials it names itself.
pub const GENERIC_MATERIAL_PREFIX: &str = "<auto>";

/// Identity of a material as seen by the host.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MaterialIdentity {
    /// Absolute texture path, extension included.
    Texture(PathBuf),
    /// RGBA color, 0-255 per channel, alpha always 255.
    Color([u8; 4]),
}

/// Mapping from material identity to original material name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialNameIndex {
    names: BTreeMap<MaterialIdentity, String>,
}

impl MaterialNameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every material of a library whose textures are relative to `work_dir`.
    ///
    /// Materials with a texture are keyed by texture path, others by color.
    /// Unresolved embedded placeholders and materials with neither are skipped.
    pub fn from_library(library: &MaterialLibrary, work_dir: &Path) -> Self {
        let mut index = Self::new();
        for material in library.iter() {
            match (&material.diffuse_texture, &material.diffuse_color) {
                (Some(TextureReference::Path(path)), _) => {
                    index.insert(
                        MaterialIdentity::Texture(work_dir.join(path)),
                        material.name.clone(),
                    );
                }
                (Some(TextureReference::Embedded(n)), _) => {
                    tracing::debug!(
                        "Material {} still references embedded texture *{}",
                        material.name,
                        n
                    );
                }
                (None, Some(color)) => {
                    index.insert(MaterialIdentity::Color(color.to_rgba8()), material.name.clone());
                }
                (None, None) => {}
            }
        }
        index
    }

    pub fn insert(&mut self, identity: MaterialIdentity, name: String) {
        self.names.insert(identity, name);
    }

    pub fn by_texture(&self, path: &Path) -> Option<&str> {
        self.names
            .get(&MaterialIdentity::Texture(path.to_path_buf()))
            .map(String::as_str)
    }

    pub fn by_color(&self, rgba: [u8; 4]) -> Option<&str> {
        self.names
            .get(&MaterialIdentity::Color(rgba))
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MaterialIdentity, &str)> {
        self.names.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Serialize)]
struct Entry<'a> {
    identity: &'a MaterialIdentity,
    name: &'a str,
}

impl Serialize for MaterialNameIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.names.len()))?;
        for (identity, name) in &self.names {
            seq.serialize_element(&Entry { identity, name })?;
        }
        seq.end()
    }
}

/// A material living in the host application after import.
pub trait HostMaterial {
    fn name(&self) -> &str;
    fn set_name(&mut self, name: &str);
    /// Absolute path of the diffuse texture, if textured.
    fn texture_path(&self) -> Option<PathBuf>;
    /// Diffuse color as RGBA, if colored.
    fn color(&self) -> Option<[u8; 4]>;
}

/// Rename host materials that received a generic name during import.
///
/// Returns the number of materials renamed.
pub fn restore_material_names<M: HostMaterial>(index: &MaterialNameIndex, materials: &mut [M]) -> usize {
    let mut renamed = 0;
    for material in materials.iter_mut() {
        if !material.name().starts_with(GENERIC_MATERIAL_PREFIX) {
            continue;
        }
        let original = match (material.texture_path(), material.color()) {
            (Some(path), _) => index.by_texture(&path),
            (None, Some(rgba)) => index.by_color(rgba),
            (None, None) => None,
        };
        if let Some(original) = original.map(str::to_string) {
            tracing::debug!("Restoring material {} as {}", material.name(), original);
            material.set_name(&original);
            renamed += 1;
        }
    }
    renamed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::material::{Material, Rgb};
    use pretty_assertions::assert_eq;

    struct Imported {
        name: String,
        texture: Option<PathBuf>,
        color: Option<[u8; 4]>,
    }

    impl HostMaterial for Imported {
        fn name(&self) -> &str {
            &self.name
        }
        fn set_name(&mut self, name: &str) {
            self.name = name.to_string();
        }
        fn texture_path(&self) -> Option<PathBuf> {
            self.texture.clone()
        }
        fn color(&self) -> Option<[u8; 4]> {
            self.color
        }
    }

    fn library() -> MaterialLibrary {
        let mut library = MaterialLibrary::new();
        let mut wood = Material::new("Oak Wood");
        wood.diffuse_texture = Some(TextureReference::Path("meshport-wood.png".into()));
        wood.diffuse_color = Some(Rgb([0.8, 0.8, 0.8]));
        library.insert(wood);
        let mut red = Material::new("Red Paint");
        red.diffuse_color = Some(Rgb([1.0, 0.0, 0.0]));
        library.insert(red);
        let mut packed = Material::new("Packed");
        packed.diffuse_texture = Some(TextureReference::Embedded(3));
        library.insert(packed);
        library.insert(Material::new("Bare"));
        library
    }

    #[test]
    fn test_index_keys_use_host_identity_form() {
        let index = MaterialNameIndex::from_library(&library(), Path::new("/models/chair"));

        assert_eq!(index.len(), 2);
        assert_eq!(
            index.by_texture(Path::new("/models/chair/meshport-wood.png")),
            Some("Oak Wood")
        );
        assert_eq!(index.by_color([255, 0, 0, 255]), Some("Red Paint"));
        assert_eq!(index.by_color([255, 0, 0, 0]), None);
    }

    #[test]
    fn test_restore_only_generic_names() {
        let index = MaterialNameIndex::from_library(&library(), Path::new("/models/chair"));
        let mut materials = vec![
            Imported {
                name: "<auto>1".into(),
                texture: Some(PathBuf::from("/models/chair/meshport-wood.png")),
                color: None,
            },
            Imported {
                name: "<auto>2".into(),
                texture: None,
                color: Some([255, 0, 0, 255]),
            },
            Imported {
                name: "Custom".into(),
                texture: None,
                color: Some([255, 0, 0, 255]),
            },
            Imported {
                name: "<auto>3".into(),
                texture: None,
                color: Some([1, 2, 3, 255]),
            },
        ];

        assert_eq!(restore_material_names(&index, &mut materials), 2);
        let names: Vec<_> = materials.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Oak Wood", "Red Paint", "Custom", "<auto>3"]);
    }

    #[test]
    fn test_serializes_as_entry_list() {
        let mut index = MaterialNameIndex::new();
        index.insert(MaterialIdentity::Color([0, 0, 255, 255]), "Blue".into());
        let json = serde_json::to_value(&index).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "identity": { "Color": [0, 0, 255, 255] }, "name": "Blue" }])
        );
    }
}
