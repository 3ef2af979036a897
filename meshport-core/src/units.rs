//! Length units of source models.

use serde::{Deserialize, Serialize};

/// Unit of length a source model is authored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Units {
    Millimeters,
    Centimeters,
    #[default]
    Meters,
    Inches,
    Feet,
    Yards,
}

impl Units {
    /// Every supported unit.
    pub const ALL: [Units; 6] = [
        Units::Millimeters,
        Units::Centimeters,
        Units::Meters,
        Units::Inches,
        Units::Feet,
        Units::Yards,
    ];

    /// Most probable units for a lower-cased file extension (without dot).
    pub fn guess(extension: &str) -> Self {
        match extension {
            "3mf" | "brep" | "dxf" | "iges" | "igs" | "step" | "stp" | "stl" => {
                Units::Millimeters
            }
            "fbx" => Units::Centimeters,
            "3ds" => Units::Inches,
            // gltf, blend, lwo, wrl, dae, obj...
            _ => Units::Meters,
        }
    }

    /// Parse a units symbol such as `mm` or `in`.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol.trim().to_lowercase().as_str() {
            "mm" => Some(Units::Millimeters),
            "cm" => Some(Units::Centimeters),
            "m" => Some(Units::Meters),
            "in" | "inch" => Some(Units::Inches),
            "ft" => Some(Units::Feet),
            "yd" => Some(Units::Yards),
            _ => None,
        }
    }

    /// Short symbol of this unit.
    pub fn symbol(&self) -> &'static str {
        match self {
            Units::Millimeters => "mm",
            Units::Centimeters => "cm",
            Units::Meters => "m",
            Units::Inches => "in",
            Units::Feet => "ft",
            Units::Yards => "yd",
        }
    }

    /// Meters per unit.
    pub fn scale_factor(&self) -> f64 {
        match self {
            Units::Millimeters => 0.001,
            Units::Centimeters => 0.01,
            Units::Meters => 1.0,
            Units::Inches => 0.0254,
            Units::Feet => 0.3048,
            Units::Yards => 0.9144,
        }
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl std::str::FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Units::from_symbol(s).ok_or_else(|| {
            let known: Vec<_> = Units::ALL.iter().map(Units::symbol).collect();
            format!("unknown units '{}', expected one of {}", s, known.join(", "))
        })
    }
}

/// An imported object that can be uniformly scaled.
pub trait Scalable {
    /// Human-readable name used in logs.
    fn name(&self) -> String;

    /// Apply a uniform scale on all three axes.
    fn scale_uniform(&mut self, factor: f64) -> Result<(), String>;
}

/// Resize an object assumed to be in meters so it is expressed in `units`.
///
/// Failures are logged and swallowed: a model left unscaled is still usable.
/// Returns whether the scale was applied.
pub fn change_units<S: Scalable + ?Sized>(object: &mut S, units: Units) -> bool {
    let factor = units.scale_factor();
    match object.scale_uniform(factor) {
        Ok(()) => {
            tracing::debug!("Scaled {} by {} ({})", object.name(), factor, units);
            true
        }
        Err(message) => {
            tracing::warn!("Error scaling {}: {}", object.name(), message);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Component {
        scale: [f64; 3],
        locked: bool,
    }

    impl Scalable for Component {
        fn name(&self) -> String {
            "component".to_string()
        }

        fn scale_uniform(&mut self, factor: f64) -> Result<(), String> {
            if self.locked {
                return Err("component is locked".to_string());
            }
            for axis in &mut self.scale {
                *axis *= factor;
            }
            Ok(())
        }
    }

    #[test]
    fn test_guess_by_extension() {
        assert_eq!(Units::guess("stp"), Units::Millimeters);
        assert_eq!(Units::guess("step"), Units::Millimeters);
        assert_eq!(Units::guess("fbx"), Units::Centimeters);
        assert_eq!(Units::guess("obj"), Units::Meters);
        assert_eq!(Units::guess("3ds"), Units::Inches);
        assert_eq!(Units::guess("gltf"), Units::Meters);
    }

    #[test]
    fn test_scale_factors() {
        assert_eq!(Units::Meters.scale_factor(), 1.0);
        assert!((Units::Inches.scale_factor() - 0.0254).abs() < 1e-12);
        assert!((Units::Yards.scale_factor() - 0.9144).abs() < 1e-12);
    }

    #[test]
    fn test_symbols_round_trip() {
        for units in Units::ALL {
            assert_eq!(units.symbol().parse::<Units>().unwrap(), units);
        }
        assert!("furlong".parse::<Units>().is_err());
    }

    #[test]
    fn test_change_units_scales_all_axes() {
        let mut component = Component {
            scale: [1.0; 3],
            locked: false,
        };
        assert!(change_units(&mut component, Units::Millimeters));
        assert_eq!(component.scale, [0.001; 3]);
    }

    #[test]
    fn test_change_units_failure_is_swallowed() {
        let mut component = Component {
            scale: [1.0; 3],
            locked: true,
        };
        assert!(!change_units(&mut component, Units::Feet));
        assert_eq!(component.scale, [1.0; 3]);
    }
}
