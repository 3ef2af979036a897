//! Companion files referenced by a source model.
//!
//! Only OBJ material libraries and glTF external buffers are looked at; they
//! must sit next to the source for the converter to find them.

use crate::error::{ConvertError, Result};
use serde::Deserialize;
use std::path::Path;

/// Material library named by the first `mtllib` line of an OBJ file.
pub fn obj_mtllib(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let rest = line.trim_start().strip_prefix("mtllib")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let name = rest.trim();
        let name = name.strip_prefix("./").unwrap_or(name);
        (!name.is_empty()).then(|| name.to_string())
    })
}

#[derive(Debug, Deserialize)]
struct GltfDocument {
    #[serde(default)]
    buffers: Vec<GltfBuffer>,
}

#[derive(Debug, Deserialize)]
struct GltfBuffer {
    uri: Option<String>,
}

/// Decode `%XX` escapes of a relative URI. Malformed escapes are kept as is.
pub fn percent_decode(uri: &str) -> String {
    let bytes = uri.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = uri
                .get(i + 1..i + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(byte) = byte {
                decoded.push(byte);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

/// External (non `data:`) buffer URIs of a glTF JSON document, decoded to
/// file names.
pub fn gltf_buffer_uris(content: &str, path: &Path) -> Result<Vec<String>> {
    let document: GltfDocument =
        serde_json::from_str(content).map_err(|source| ConvertError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(document
        .buffers
        .into_iter()
        .filter_map(|b| b.uri)
        .filter(|uri| !uri.starts_with("data:"))
        .map(|uri| percent_decode(&uri))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_obj_mtllib() {
        let obj = "# Blender\nmtllib ./chair.mtl\no Chair\nv 0 0 0\n";
        assert_eq!(obj_mtllib(obj), Some("chair.mtl".to_string()));
        assert_eq!(obj_mtllib("mtllib my chair.mtl\n"), Some("my chair.mtl".to_string()));
        assert_eq!(obj_mtllib("v 0 0 0\nf 1 2 3\n"), None);
        assert_eq!(obj_mtllib("mtllibx foo\n"), None);
    }

    #[test]
    fn test_gltf_buffer_uris() {
        let gltf = r#"{
            "asset": { "version": "2.0" },
            "buffers": [
                { "uri": "scene.bin", "byteLength": 1024 },
                { "uri": "data:application/octet-stream;base64,AAAA", "byteLength": 3 },
                { "byteLength": 12 }
            ]
        }"#;
        assert_eq!(
            gltf_buffer_uris(gltf, Path::new("scene.gltf")).unwrap(),
            vec!["scene.bin".to_string()]
        );
        assert!(gltf_buffer_uris(r#"{"asset":{}}"#, Path::new("a.gltf"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_gltf_buffer_uris_are_decoded() {
        let gltf = r#"{"buffers": [{ "uri": "my%20scene.bin" }, { "uri": "caf%C3%A9.bin" }]}"#;
        assert_eq!(
            gltf_buffer_uris(gltf, Path::new("scene.gltf")).unwrap(),
            vec!["my scene.bin".to_string(), "café.bin".to_string()]
        );
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("a%zzb"), "a%zzb");
    }

    #[test]
    fn test_gltf_invalid_json() {
        let err = gltf_buffer_uris("not json", Path::new("broken.gltf")).unwrap_err();
        assert!(matches!(err, ConvertError::Json { .. }));
    }
}
