//! pattern-gallery: Two-color pattern rendering with a persistent gallery
//!
//! This crate renders 200x200 RGBA images from a pattern specification
//! (stripes, polka dots or a checkerboard over two colors) with optional
//! freehand strokes on top, encodes them losslessly as PNG, and keeps an
//! ordered gallery of saved images in a key/value store.
//!
//! # Example
//!
//! ```
//! use pattern_gallery::{
//!     ColorValue, GalleryStore, MemoryStore, PatternKind, PatternSpec, Stroke, rasterize,
//! };
//!
//! let spec = PatternSpec::new(
//!     ColorValue::hex("#ff0000"),
//!     ColorValue::hex("#0000ff"),
//!     PatternKind::Stripes,
//! );
//! let strokes = [Stroke::from_points([(20.0, 20.0), (180.0, 120.0)])];
//! let image = rasterize(&spec, &strokes);
//!
//! let gallery = GalleryStore::new(MemoryStore::new());
//! gallery.append(&image).unwrap();
//!
//! let loaded = gallery.load();
//! assert_eq!(loaded.len(), 1);
//! assert_eq!(loaded.get(0).unwrap().decode().unwrap(), image);
//! ```
//!
//! # Interactive Composition
//!
//! [`PatternComposer`] tracks the current choices and pointer input, and
//! caches its preview between changes:
//!
//! ```
//! use pattern_gallery::{Configurable, PatternComposer, PatternKind, Point, PointerEvent};
//!
//! let mut composer = PatternComposer::new();
//! composer.set_kind(PatternKind::Checkerboard);
//! composer.pointer(PointerEvent::Start(Point::new(0.0, 0.0)));
//! composer.pointer(PointerEvent::Move(Point::new(100.0, 100.0)));
//! composer.pointer(PointerEvent::End);
//!
//! let preview = composer.preview().clone();
//! assert_eq!(preview.width(), 200);
//!
//! // Settings round-trip through JSON.
//! let json = composer.export_profile().to_json().unwrap();
//! assert!(json.contains("Checkerboard"));
//! ```

pub mod codec;
mod color;
mod composer;
mod error;
mod gallery;
mod pattern;
mod profile;
mod raster;
mod session;
mod store;

pub use color::{
    ColorResolution, ColorValue, FALLBACK_COLOR, STROKE_COLOR, UnresolvedReason,
    resolve_or_fallback,
};
pub use composer::{Configurable, PatternComposer};
pub use error::{
    DecodeError, EncodeError, GalleryError, GalleryResult, PatternError, StoreError,
};
pub use gallery::{DEFAULT_GALLERY_KEY, Gallery, GalleryConfig, GalleryEntry, GalleryStore};
pub use pattern::{CANVAS_SIZE, PatternId, PatternKind, PatternSpec, Point, Stroke};
pub use profile::PatternProfile;
pub use raster::{RasterImage, STROKE_WIDTH, rasterize, rasterize_pattern};
pub use session::{DrawingSession, PointerEvent};
pub use store::{FileStore, KeyValueStore, MemoryStore};
