//! Material library (MTL) writer.

use crate::model::MaterialLibrary;
use crate::parser::{DIFFUSE_COLOR, DIFFUSE_TEXTURE, NEW_MATERIAL};
use std::fmt::Write;

/// Serialize a material library.
///
/// Output is deterministic: materials are written in insertion order and
/// parsing it back yields the same names, colors and textures.
pub fn serialize_mtl(library: &MaterialLibrary) -> String {
    let mut output = String::new();

    if let Some(generator) = &library.generator {
        writeln!(output, "{}", generator).unwrap();
        writeln!(output).unwrap();
    }

    for material in library.iter() {
        writeln!(output, "{} {}", NEW_MATERIAL, material.name).unwrap();
        if let Some(color) = &material.diffuse_color {
            let [r, g, b] = color.0;
            writeln!(output, "{} {} {} {}", DIFFUSE_COLOR, r, g, b).unwrap();
        }
        if let Some(texture) = &material.diffuse_texture {
            writeln!(output, "{} {}", DIFFUSE_TEXTURE, texture).unwrap();
        }
        writeln!(output).unwrap();
    }

    output
}

/// Comment out every line starting with `directive` followed by a space.
///
/// Used to neutralize transparency (`d`, `Tr`) that the host renders badly.
pub fn comment_out_directive(content: &str, directive: &str) -> String {
    let prefix = format!("{} ", directive);
    let mut output = String::with_capacity(content.len() + 16);
    for line in content.split_inclusive('\n') {
        if line.starts_with(&prefix) {
            output.push_str("# ");
        }
        output.push_str(line);
    }
    output
}
