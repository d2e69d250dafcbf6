//! Serializable snapshot of a composition for cross-process communication.
//!
//! A [`PatternProfile`] captures everything needed to reproduce a pattern:
//! both colors, the tiling kind and the recorded strokes. It round-trips
//! through JSON so a front end can hand its state to the renderer.
//!
//! # Example
//!
//! ```
//! use pattern_gallery::{ColorValue, PatternKind, PatternProfile, Stroke};
//!
//! let profile = PatternProfile::new(PatternKind::Checkerboard)
//!     .with_primary(ColorValue::hex("#ffffff"))
//!     .with_secondary(ColorValue::hex("#000000"))
//!     .with_stroke(Stroke::from_points([(10.0, 10.0), (50.0, 80.0)]));
//!
//! let json = profile.to_json().unwrap();
//! let restored = PatternProfile::from_json(&json).unwrap();
//! assert_eq!(restored, profile);
//! ```

use serde::{Deserialize, Serialize};

use crate::color::ColorValue;
use crate::pattern::{PatternKind, PatternSpec, Stroke};

/// A serializable description of a composition.
///
/// # JSON Format
///
/// ```json
/// {
///   "primaryColor": "#ff0000",
///   "secondaryColor": [0, 0, 255, 255],
///   "kind": "Polka Dots",
///   "strokes": [{ "points": [{ "x": 10.0, "y": 10.0 }, { "x": 40.0, "y": 60.0 }] }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternProfile {
    #[serde(default)]
    pub primary_color: ColorValue,

    #[serde(default)]
    pub secondary_color: ColorValue,

    pub kind: PatternKind,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strokes: Vec<Stroke>,
}

impl PatternProfile {
    /// Creates a profile with unset colors and no strokes.
    pub fn new(kind: PatternKind) -> Self {
        Self {
            primary_color: ColorValue::Unset,
            secondary_color: ColorValue::Unset,
            kind,
            strokes: Vec::new(),
        }
    }

    pub fn with_primary(mut self, color: ColorValue) -> Self {
        self.primary_color = color;
        self
    }

    pub fn with_secondary(mut self, color: ColorValue) -> Self {
        self.secondary_color = color;
        self
    }

    pub fn with_stroke(mut self, stroke: Stroke) -> Self {
        self.strokes.push(stroke);
        self
    }

    /// Builds a fresh [`PatternSpec`] (with a new id) from this profile.
    pub fn to_spec(&self) -> PatternSpec {
        PatternSpec::new(
            self.primary_color.clone(),
            self.secondary_color.clone(),
            self.kind,
        )
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ============================================================================
// Tests
// ============================================================================
