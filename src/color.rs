//! Color values supplied by the composer and their resolution to pixels.
//!
//! A [`ColorValue`] is whatever the picker handed us. It may fail to
//! resolve (malformed hex, out-of-range components, or nothing chosen at
//! all). Resolution is an explicit [`ColorResolution`] rather than an
//! implicit default, and the fallback substitution lives in
//! [`resolve_or_fallback`] so it can be tested and is always logged.

use std::fmt;
use std::str::FromStr;

use image::Rgba;
use palette::{Srgb, Srgba};
use serde::{Deserialize, Serialize};

/// Color painted when a value cannot be resolved: opaque pure red.
pub const FALLBACK_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Opaque black, used for freehand strokes.
pub const STROKE_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

// ============================================================================
// ColorValue
// ============================================================================

/// A color as chosen by the user, before resolution.
///
/// Serializes untagged, so all of these are accepted:
///
/// ```json
/// "#3366ff"
/// [51, 102, 255, 255]
/// { "red": 0.2, "green": 0.4, "blue": 1.0, "alpha": 1.0 }
/// null
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum ColorValue {
    /// No color chosen.
    #[default]
    Unset,

    /// Hex string such as `#rrggbb` or `#rgb`.
    Hex(String),

    /// 8-bit RGBA channels.
    Rgba8([u8; 4]),

    /// Floating point RGBA channels, each expected in `[0, 1]`.
    Components {
        red: f32,
        green: f32,
        blue: f32,
        #[serde(default = "opaque")]
        alpha: f32,
    },
}

fn opaque() -> f32 {
    1.0
}

impl ColorValue {
    /// Opaque 8-bit color.
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::Rgba8([r, g, b, 255])
    }

    /// 8-bit color with alpha.
    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::Rgba8([r, g, b, a])
    }

    /// Floating point color; channels outside `[0, 1]` will not resolve.
    pub fn components(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self::Components {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Hex string color; parsed lazily on resolution.
    pub fn hex(hex: impl Into<String>) -> Self {
        Self::Hex(hex.into())
    }

    /// Resolves this value to a paintable 8-bit RGBA color.
    pub fn resolve(&self) -> ColorResolution {
        match self {
            Self::Unset => ColorResolution::Unresolved(UnresolvedReason::Unset),
            Self::Rgba8(channels) => ColorResolution::Resolved(Rgba(*channels)),
            Self::Hex(hex) => match Srgb::<u8>::from_str(hex.trim()) {
                Ok(rgb) => ColorResolution::Resolved(Rgba([rgb.red, rgb.green, rgb.blue, 255])),
                Err(_) => ColorResolution::Unresolved(UnresolvedReason::MalformedHex(hex.clone())),
            },
            Self::Components {
                red,
                green,
                blue,
                alpha,
            } => {
                let channels = [*red, *green, *blue, *alpha];
                if channels.iter().all(|c| c.is_finite() && (0.0..=1.0).contains(c)) {
                    let color: Srgba<u8> = Srgba::new(*red, *green, *blue, *alpha).into_format();
                    let (r, g, b, a) = color.into_components();
                    ColorResolution::Resolved(Rgba([r, g, b, a]))
                } else {
                    ColorResolution::Unresolved(UnresolvedReason::OutOfRange)
                }
            }
        }
    }
}

impl From<Rgba<u8>> for ColorValue {
    fn from(color: Rgba<u8>) -> Self {
        Self::Rgba8(color.0)
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Why a [`ColorValue`] could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    Unset,
    MalformedHex(String),
    OutOfRange,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => write!(f, "no color set"),
            Self::MalformedHex(hex) => write!(f, "malformed hex color {hex:?}"),
            Self::OutOfRange => write!(f, "color component outside [0, 1]"),
        }
    }
}

/// Outcome of resolving a [`ColorValue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorResolution {
    Resolved(Rgba<u8>),
    Unresolved(UnresolvedReason),
}

impl ColorResolution {
    /// Returns the resolved color, if any.
    pub fn color(&self) -> Option<Rgba<u8>> {
        match self {
            Self::Resolved(color) => Some(*color),
            Self::Unresolved(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// Resolves `value`, substituting [`FALLBACK_COLOR`] when it cannot be resolved.
///
/// The substitution is logged at `warn` level under the `fallback_color`
/// target so that a picker producing bad values shows up separately from
/// normal rendering.
pub fn resolve_or_fallback(value: &ColorValue, role: &str) -> Rgba<u8> {
    match value.resolve() {
        ColorResolution::Resolved(color) => color,
        ColorResolution::Unresolved(reason) => {
            tracing::warn!(
                target: "fallback_color",
                role,
                %reason,
                "unresolved color, painting fallback red"
            );
            FALLBACK_COLOR
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
