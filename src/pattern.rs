//! Pattern descriptions: the tiling kind, its two colors, and freehand strokes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::color::ColorValue;
use crate::error::PatternError;

/// Width and height of the square drawing canvas, in pixels.
pub const CANVAS_SIZE: u32 = 200;

// ============================================================================
// PatternKind
// ============================================================================

/// One of the three built-in tiling rules.
///
/// Serialized as its display name (`"Stripes"`, `"Polka Dots"`,
/// `"Checkerboard"`). Parsing is lenient about case and separators but
/// rejects anything that is not one of the three kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PatternKind {
    Stripes,
    PolkaDots,
    Checkerboard,
}

impl PatternKind {
    pub const ALL: [PatternKind; 3] = [Self::Stripes, Self::PolkaDots, Self::Checkerboard];

    /// Human-readable name, as shown in the kind picker.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Stripes => "Stripes",
            Self::PolkaDots => "Polka Dots",
            Self::Checkerboard => "Checkerboard",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for PatternKind {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "stripes" => Ok(Self::Stripes),
            "polkadots" => Ok(Self::PolkaDots),
            "checkerboard" => Ok(Self::Checkerboard),
            _ => Err(PatternError::InvalidPatternKind(s.to_string())),
        }
    }
}

impl TryFrom<String> for PatternKind {
    type Error = PatternError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PatternKind> for String {
    fn from(kind: PatternKind) -> Self {
        kind.display_name().to_string()
    }
}

// ============================================================================
// PatternId
// ============================================================================

/// Opaque identifier assigned when a pattern is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternId(Uuid);

impl PatternId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PatternId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// PatternSpec
// ============================================================================

/// Immutable description of one pattern.
///
/// Fields are private so that a spec, once built, cannot change. A spec with
/// an unknown kind cannot be constructed: [`PatternSpec::from_parts`] and
/// deserialization both reject it with [`PatternError::InvalidPatternKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternSpec {
    #[serde(default)]
    id: PatternId,
    primary_color: ColorValue,
    secondary_color: ColorValue,
    kind: PatternKind,
}

impl PatternSpec {
    pub fn new(primary_color: ColorValue, secondary_color: ColorValue, kind: PatternKind) -> Self {
        Self {
            id: PatternId::new(),
            primary_color,
            secondary_color,
            kind,
        }
    }

    /// Builds a spec from a kind name as produced by a picker.
    pub fn from_parts(
        primary_color: ColorValue,
        secondary_color: ColorValue,
        kind: &str,
    ) -> Result<Self, PatternError> {
        Ok(Self::new(primary_color, secondary_color, kind.parse()?))
    }

    pub fn from_json(json: &str) -> Result<Self, PatternError> {
        serde_json::from_str(json).map_err(|e| PatternError::Serde(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, PatternError> {
        serde_json::to_string(self).map_err(|e| PatternError::Serde(e.to_string()))
    }

    pub fn id(&self) -> PatternId {
        self.id
    }

    pub fn primary_color(&self) -> &ColorValue {
        &self.primary_color
    }

    pub fn secondary_color(&self) -> &ColorValue {
        &self.secondary_color
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }
}

// ============================================================================
// Strokes
// ============================================================================

/// A point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// One continuous freehand line.
///
/// An empty stroke is legal and renders as nothing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Stroke {
    pub points: Vec<Point>,
}

impl Stroke {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: impl IntoIterator<Item = (f32, f32)>) -> Self {
        Self {
            points: points.into_iter().map(Point::from).collect(),
        }
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
