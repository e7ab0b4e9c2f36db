//! Editor defaults and limits.
//!
//! Loaded from JSON with `serde`, persisted by the host through eframe
//! storage. Missing fields fall back to the defaults below.

use egui::{Color32, Pos2, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest canvas edge, in pixels. The stage is rasterized at full size.
pub const MAX_CANVAS_EDGE: f32 = 16_384.0;

/// Whether both edges are within `1..=MAX_CANVAS_EDGE`.
pub(crate) fn canvas_size_in_range(size: Vec2) -> bool {
    let edge = 1.0..=MAX_CANVAS_EDGE;
    edge.contains(&size.x) && edge.contains(&size.y)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub canvas_size: Vec2,

    pub brush_size: f32,
    pub brush_opacity: f32,
    #[serde(with = "hex_color")]
    pub color: Color32,
    #[serde(with = "hex_color::list")]
    pub palette: Vec<Color32>,

    pub stamp_size: f32,
    pub min_stamp_size: f32,
    pub stamp_size_step: f32,

    /// Erase strength of the wax (resist) tool.
    pub wax_opacity: f32,

    pub guide_step: f32,

    pub zoom_in_factor: f32,
    pub zoom_out_factor: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,

    /// Quality factor for JPEG export, 1..=100.
    pub jpeg_quality: u8,

    /// Where uploaded images land (top-left corner).
    pub upload_position: Pos2,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_size: Vec2::new(800.0, 600.0),
            brush_size: 12.0,
            brush_opacity: 1.0,
            color: Color32::from_rgb(0x8b, 0x45, 0x13),
            palette: vec![
                Color32::from_rgb(0x8b, 0x45, 0x13), // soga brown
                Color32::from_rgb(0x5c, 0x33, 0x17),
                Color32::from_rgb(0x1f, 0x2a, 0x44), // indigo
                Color32::from_rgb(0x2e, 0x4a, 0x7d),
                Color32::from_rgb(0xb2, 0x22, 0x22),
                Color32::from_rgb(0xd4, 0xa0, 0x17),
                Color32::from_rgb(0xf5, 0xe6, 0xc8),
                Color32::from_rgb(0x1a, 0x1a, 0x1a),
            ],
            stamp_size: 150.0,
            min_stamp_size: 50.0,
            stamp_size_step: 20.0,
            wax_opacity: 0.6,
            guide_step: 50.0,
            zoom_in_factor: 1.2,
            zoom_out_factor: 0.8,
            min_zoom: 0.5,
            max_zoom: 2.0,
            jpeg_quality: 90,
            upload_position: Pos2::new(50.0, 50.0),
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn check(ok: bool, field: &'static str, reason: impl FnOnce() -> String) -> Result<(), ConfigError> {
            if ok {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: reason(),
                })
            }
        }

        check(canvas_size_in_range(self.canvas_size), "canvas_size", || {
            format!("{:?} is outside 1..={MAX_CANVAS_EDGE} pixels", self.canvas_size)
        })?;
        check(self.brush_size > 0.0, "brush_size", || format!("{} must be positive", self.brush_size))?;
        check((0.0..=1.0).contains(&self.brush_opacity), "brush_opacity", || {
            format!("{} is outside 0..=1", self.brush_opacity)
        })?;
        check(self.min_stamp_size > 0.0, "min_stamp_size", || {
            format!("{} must be positive", self.min_stamp_size)
        })?;
        check(self.stamp_size >= self.min_stamp_size, "stamp_size", || {
            format!("{} is below the minimum {}", self.stamp_size, self.min_stamp_size)
        })?;
        check((0.0..=1.0).contains(&self.wax_opacity), "wax_opacity", || {
            format!("{} is outside 0..=1", self.wax_opacity)
        })?;
        check(self.guide_step > 0.0, "guide_step", || format!("{} must be positive", self.guide_step))?;
        check(
            self.zoom_in_factor > 0.0 && self.zoom_out_factor > 0.0,
            "zoom factors",
            || "zoom factors must be positive".to_owned(),
        )?;
        check(
            self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom,
            "min_zoom",
            || format!("{}..={} is not a valid range", self.min_zoom, self.max_zoom),
        )?;
        check((1..=100).contains(&self.jpeg_quality), "jpeg_quality", || {
            format!("{} is outside 1..=100", self.jpeg_quality)
        })?;
        Ok(())
    }
}

/// `Color32` as `"#rrggbb"` / `"#rrggbbaa"` strings.
pub(crate) mod hex_color {
    use egui::Color32;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn to_hex(color: Color32) -> String {
        let [r, g, b, a] = color.to_srgba_unmultiplied();
        if a == u8::MAX {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }

    pub fn parse(hex: &str) -> Option<Color32> {
        Color32::from_hex(hex).ok()
    }

    pub fn serialize<S: Serializer>(color: &Color32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_hex(*color))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color32, D::Error> {
        let hex = String::deserialize(deserializer)?;
        parse(&hex).ok_or_else(|| serde::de::Error::custom(format!("invalid hex color {hex:?}")))
    }

    pub mod list {
        use super::*;
        use serde::ser::SerializeSeq;

        pub fn serialize<S: Serializer>(colors: &[Color32], serializer: S) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(colors.len()))?;
            for color in colors {
                seq.serialize_element(&to_hex(*color))?;
            }
            seq.end()
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Color32>, D::Error> {
            Vec::<String>::deserialize(deserializer)?
                .iter()
                .map(|hex| parse(hex).ok_or_else(|| serde::de::Error::custom(format!("invalid hex color {hex:?}"))))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        EditorConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = EditorConfig::from_json(r##"{ "brush_size": 20, "color": "#ff0000" }"##).unwrap();
        assert_eq!(config.brush_size, 20.0);
        assert_eq!(config.color, Color32::from_rgb(255, 0, 0));
        assert_eq!(config.stamp_size, 150.0);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = EditorConfig::from_json(r#"{ "stamp_size": 10 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "stamp_size", .. }));
    }

    #[test]
    fn canvas_size_is_bounded_both_ways() {
        let huge = EditorConfig::from_json(r#"{ "canvas_size": { "x": 1000000.0, "y": 600.0 } }"#).unwrap_err();
        assert!(matches!(huge, ConfigError::Invalid { field: "canvas_size", .. }));
        let empty = EditorConfig::from_json(r#"{ "canvas_size": { "x": 800.0, "y": 0.0 } }"#).unwrap_err();
        assert!(matches!(empty, ConfigError::Invalid { field: "canvas_size", .. }));
        EditorConfig::from_json(r#"{ "canvas_size": { "x": 16384.0, "y": 1.0 } }"#).unwrap();
    }

    #[test]
    fn bad_hex_is_a_parse_error() {
        assert!(matches!(
            EditorConfig::from_json(r#"{ "color": "brown" }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn hex_round_trip() {
        let json = serde_json::to_string(&EditorConfig::default()).unwrap();
        assert!(json.contains("\"#8b4513\""));
        assert_eq!(EditorConfig::from_json(&json).unwrap(), EditorConfig::default());
    }
}
