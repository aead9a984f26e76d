//! Designer configuration.
//!
//! Every field has a default, and the struct deserializes from a partial
//! camelCase JSON object so a host page only has to send what it overrides.

use crate::error::DocumentError;
use crate::geometry::NodeMetrics;
use crate::layout::LayoutConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DesignerConfig {
    /// Node positions are rounded to multiples of this. `0` disables snapping.
    pub grid_size: f32,
    /// Max distance from an input anchor for a dragged connection to lock on.
    pub snap_radius: f32,
    /// Extra slack around a port glyph when hit testing a pointer-down.
    pub port_hit_slop: f32,
    /// Distance from a curve that still counts as clicking the connection.
    pub connection_hit_tolerance: f32,
    /// Zoom multiplier for one wheel notch or zoom shortcut.
    pub zoom_step: f32,
    /// Maximum undo depth.
    pub undo_depth: usize,
    pub metrics: NodeMetrics,
    pub layout: LayoutConfig,
}

impl Default for DesignerConfig {
    fn default() -> Self {
        Self {
            grid_size: 20.0,
            snap_radius: 30.0,
            port_hit_slop: 4.0,
            connection_hit_tolerance: 6.0,
            zoom_step: 1.1,
            undo_depth: 100,
            metrics: NodeMetrics::default(),
            layout: LayoutConfig::default(),
        }
    }
}

impl DesignerConfig {
    /// Parse a (possibly partial) JSON override. Blank input means defaults.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_override_keeps_other_defaults() {
        let cfg = DesignerConfig::from_json(r#"{"gridSize": 10, "layout": {"horizontalGap": 120}}"#)
            .unwrap();
        assert_eq!(cfg.grid_size, 10.0);
        assert_eq!(cfg.snap_radius, 30.0);
        assert_eq!(cfg.layout.horizontal_gap, 120.0);
        assert_eq!(cfg.layout.node_width, 200.0);
        assert_eq!(cfg.metrics, NodeMetrics::default());
    }

    #[test]
    fn blank_is_default() {
        assert_eq!(DesignerConfig::from_json("  ").unwrap(), DesignerConfig::default());
    }
}
