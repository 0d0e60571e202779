//! Editor configuration.
//!
//! Every field has a default; hosts override a subset through JSON.

use fp_core::snap::SnapOptions;
use fp_core::validate::ValidationConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Grid spacing in grid units; drag deltas and door slides are multiples of it.
    pub grid_size: f64,
    /// Screen pixels per grid unit at zoom 1.
    pub pixels_per_unit: f64,
    /// Real-world length of one grid unit, for measurements.
    pub meters_per_unit: f64,

    // ── Hit testing (screen pixels) ──
    pub vertex_hit_px: f64,
    pub segment_hit_px: f64,
    pub corner_hit_px: f64,
    pub element_hit_px: f64,

    // ── Creation tools ──
    /// Clicking this close (pixels) to the first vertex closes a polygon.
    pub closing_threshold_px: f64,
    /// Shape drags shorter than this (grid units) are discarded.
    pub min_drag_distance: f64,
    pub circle_segments: usize,
    pub arc_segments: usize,
    pub default_wall_thickness: f64,
    pub default_door_width: f64,
    pub default_artwork_size: f64,

    // ── History ──
    pub history_limit: usize,
    pub merge_window_ms: u64,

    // ── View ──
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Multiplicative zoom factor per wheel notch.
    pub zoom_step: f64,

    // ── Clipboard ──
    /// Offset (grid units) applied to each successive paste.
    pub paste_offset: f64,

    pub snap: SnapOptions,
    pub validation: ValidationConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_size: 1.0,
            pixels_per_unit: 20.0,
            meters_per_unit: 0.5,
            vertex_hit_px: 8.0,
            segment_hit_px: 6.0,
            corner_hit_px: 8.0,
            element_hit_px: 6.0,
            closing_threshold_px: 10.0,
            min_drag_distance: 0.5,
            circle_segments: 32,
            arc_segments: 16,
            default_wall_thickness: 0.2,
            default_door_width: 1.0,
            default_artwork_size: 1.0,
            history_limit: 50,
            merge_window_ms: 500,
            min_zoom: 0.1,
            max_zoom: 10.0,
            zoom_step: 1.1,
            paste_offset: 1.0,
            snap: SnapOptions::default(),
            validation: ValidationConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Parse a partial JSON override; missing keys keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Convert a screen-pixel tolerance to grid units at `zoom`.
    pub fn px_to_world(&self, px: f64, zoom: f64) -> f64 {
        px / (zoom * self.pixels_per_unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_override_keeps_defaults() {
        let cfg = EditorConfig::from_json(
            r#"{ "pixels_per_unit": 1.0, "validation": { "min_room_area": 2.0 } }"#,
        )
        .expect("parse");
        assert_eq!(cfg.pixels_per_unit, 1.0);
        assert_eq!(cfg.history_limit, 50);
        assert_eq!(cfg.validation.min_room_area, 2.0);
        assert_eq!(cfg.validation.max_door_width, 4.0);
    }

    #[test]
    fn pixel_tolerance_shrinks_with_zoom() {
        let cfg = EditorConfig::default();
        assert_eq!(cfg.px_to_world(20.0, 1.0), 1.0);
        assert_eq!(cfg.px_to_world(20.0, 2.0), 0.5);
    }
}
