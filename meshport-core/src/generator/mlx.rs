//! Simplification filter script (MLX) generator.

use std::fmt::Write;

/// Cleanup filters run ahead of decimation.
const CLEANUP_FILTERS: [&str; 3] = [
    "Remove Unreferenced Vertices",
    "Remove Duplicate Vertices",
    "Remove Duplicate Faces",
];

/// Decimation filter name.
const DECIMATION_FILTER: &str = "Simplification: Quadric Edge Collapse Decimation";

/// Typed filter parameter.
enum Param {
    Int(&'static str, u64),
    Float(&'static str, f64),
    Bool(&'static str, bool),
}

impl Param {
    fn write(&self, output: &mut String) {
        let (kind, name, value) = match self {
            Param::Int(name, value) => ("RichInt", name, value.to_string()),
            Param::Float(name, value) => ("RichFloat", name, value.to_string()),
            Param::Bool(name, value) => ("RichBool", name, value.to_string()),
        };
        writeln!(
            output,
            r#"  <Param type="{}" value="{}" name="{}"/>"#,
            kind, value, name
        )
        .unwrap();
    }
}

/// Build the polygon reduction script.
///
/// `with_texture` selects the texture-aware decimation variant.
pub fn reduction_script(with_texture: bool, target_face_count: u32) -> String {
    let mut output = String::new();
    writeln!(output, "<!DOCTYPE FilterScript>").unwrap();
    writeln!(output, "<FilterScript>").unwrap();

    for filter in CLEANUP_FILTERS {
        writeln!(output, r#" <filter name="{}"/>"#, filter).unwrap();
    }

    let name = if with_texture {
        format!("{} (with texture)", DECIMATION_FILTER)
    } else {
        DECIMATION_FILTER.to_string()
    };
    writeln!(output, r#" <filter name="{}">"#, name).unwrap();

    let params = [
        Param::Int("TargetFaceNum", u64::from(target_face_count)),
        Param::Float("TargetPerc", 0.0),
        Param::Float("QualityThr", 1.0),
        Param::Int("TextureWeight", 1),
        Param::Bool("PreserveBoundary", true),
        Param::Float("BoundaryWeight", 1.0),
        Param::Bool("OptimalPlacement", true),
        Param::Bool("PreserveNormal", true),
        Param::Bool("PlanarSimplification", true),
    ];
    for param in &params {
        param.write(&mut output);
    }

    writeln!(output, " </filter>").unwrap();
    write!(output, "</FilterScript>").unwrap();
    output
}
