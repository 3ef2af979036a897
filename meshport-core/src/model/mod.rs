//! Data model for material libraries and material identities.

mod material;
mod name_index;

pub use material::{Material, MaterialLibrary, Rgb, TextureReference};
pub use name_index::{
    restore_material_names, HostMaterial, MaterialIdentity, MaterialNameIndex,
    GENERIC_MATERIAL_PREFIX,
};
