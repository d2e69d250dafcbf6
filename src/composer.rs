//! Interactive composition: current choices, freehand strokes, cached preview.

use crate::color::ColorValue;
use crate::error::GalleryResult;
use crate::gallery::{Gallery, GalleryStore};
use crate::pattern::{PatternKind, PatternSpec};
use crate::profile::PatternProfile;
use crate::raster::{RasterImage, rasterize};
use crate::session::{DrawingSession, PointerEvent};
use crate::store::KeyValueStore;

// ============================================================================
// Configurable Trait
// ============================================================================

/// Trait for types that can be configured from a [`PatternProfile`].
pub trait Configurable {
    /// Applies a profile's settings to this instance.
    fn apply_profile(&mut self, profile: &PatternProfile);

    /// Exports the current settings as a profile.
    fn export_profile(&self) -> PatternProfile;
}

// ============================================================================
// PatternComposer
// ============================================================================

/// Key identifying the state a cached preview was rendered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PreviewKey {
    settings: u64,
    strokes: u64,
}

/// Holds the pattern being composed and renders it on demand.
///
/// Every setter that changes the output bumps a version number; the preview
/// is re-rasterized only when the settings or strokes have changed since the
/// last call.
///
/// # Example
///
/// ```
/// use pattern_gallery::{
///     ColorValue, GalleryStore, MemoryStore, PatternComposer, PatternKind, Point, PointerEvent,
/// };
///
/// let mut composer = PatternComposer::new();
/// composer.set_kind(PatternKind::PolkaDots);
/// composer.set_secondary(ColorValue::hex("#ffcc00"));
///
/// composer.pointer(PointerEvent::Start(Point::new(10.0, 10.0)));
/// composer.pointer(PointerEvent::Move(Point::new(90.0, 40.0)));
/// composer.pointer(PointerEvent::End);
///
/// let gallery = GalleryStore::new(MemoryStore::new());
/// let saved = composer.save(&gallery).unwrap();
/// assert_eq!(saved.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct PatternComposer {
    primary: ColorValue,
    secondary: ColorValue,
    kind: PatternKind,
    session: DrawingSession,
    version: u64,
    preview: Option<(PreviewKey, RasterImage)>,
}

impl Default for PatternComposer {
    /// Red on blue stripes, no strokes.
    fn default() -> Self {
        Self {
            primary: ColorValue::rgb(255, 0, 0),
            secondary: ColorValue::rgb(0, 0, 255),
            kind: PatternKind::Stripes,
            session: DrawingSession::new(),
            version: 0,
            preview: None,
        }
    }
}

impl PatternComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primary(&self) -> &ColorValue {
        &self.primary
    }

    pub fn secondary(&self) -> &ColorValue {
        &self.secondary
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    pub fn session(&self) -> &DrawingSession {
        &self.session
    }

    /// Current settings version; changes whenever a setter changes a value.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Sets the primary color. Returns true if it changed.
    pub fn set_primary(&mut self, color: ColorValue) -> bool {
        if self.primary == color {
            return false;
        }
        self.primary = color;
        self.bump();
        true
    }

    /// Sets the secondary color. Returns true if it changed.
    pub fn set_secondary(&mut self, color: ColorValue) -> bool {
        if self.secondary == color {
            return false;
        }
        self.secondary = color;
        self.bump();
        true
    }

    /// Sets the tiling kind. Returns true if it changed.
    pub fn set_kind(&mut self, kind: PatternKind) -> bool {
        if self.kind == kind {
            return false;
        }
        self.kind = kind;
        self.bump();
        true
    }

    /// Feeds a pointer event into the drawing session.
    pub fn pointer(&mut self, event: PointerEvent) {
        self.session.apply(event);
    }

    /// Discards all strokes.
    pub fn clear_strokes(&mut self) {
        self.session.clear();
    }

    fn bump(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    fn preview_key(&self) -> PreviewKey {
        PreviewKey {
            settings: self.version,
            strokes: self.session.version(),
        }
    }

    /// Builds a spec for the current choices. Each call assigns a new id.
    pub fn spec(&self) -> PatternSpec {
        PatternSpec::new(self.primary.clone(), self.secondary.clone(), self.kind)
    }

    /// Live preview, including a stroke still being drawn.
    ///
    /// Served from cache while nothing has changed.
    pub fn preview(&mut self) -> &RasterImage {
        let key = self.preview_key();
        let image = match self.preview.take() {
            Some((cached, image)) if cached == key => image,
            _ => {
                tracing::trace!(settings = key.settings, strokes = key.strokes, "preview miss");
                rasterize(&self.spec(), &self.session.snapshot())
            }
        };
        &self.preview.insert((key, image)).1
    }

    /// Final render with closed strokes only.
    pub fn render(&self) -> RasterImage {
        rasterize(&self.spec(), self.session.strokes())
    }

    /// Renders the composition and appends it to `gallery`.
    pub fn save<S: KeyValueStore>(&self, gallery: &GalleryStore<S>) -> GalleryResult<Gallery> {
        let image = self.render();
        gallery.append(&image)
    }

    /// Drops the cached preview.
    pub fn clear_cache(&mut self) {
        self.preview = None;
    }
}

impl Configurable for PatternComposer {
    /// Replaces colors, kind and strokes with the profile's.
    fn apply_profile(&mut self, profile: &PatternProfile) {
        self.set_primary(profile.primary_color.clone());
        self.set_secondary(profile.secondary_color.clone());
        self.set_kind(profile.kind);
        self.session = DrawingSession::from_strokes(profile.strokes.clone());
        self.bump();
    }

    /// Exports the current settings and closed strokes.
    fn export_profile(&self) -> PatternProfile {
        PatternProfile {
            primary_color: self.primary.clone(),
            secondary_color: self.secondary.clone(),
            kind: self.kind,
            strokes: self.session.strokes().to_vec(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{Point, Stroke};
    use crate::store::MemoryStore;
    use image::Rgba;

    fn draw_line(composer: &mut PatternComposer, from: (f32, f32), to: (f32, f32)) {
        composer.pointer(PointerEvent::Start(Point::new(from.0, from.1)));
        composer.pointer(PointerEvent::Move(Point::new(to.0, to.1)));
        composer.pointer(PointerEvent::End);
    }

    #[test]
    fn composer_defaults() {
        let composer = PatternComposer::new();
        assert_eq!(composer.kind(), PatternKind::Stripes);
        assert_eq!(composer.primary(), &ColorValue::rgb(255, 0, 0));
        assert_eq!(composer.secondary(), &ColorValue::rgb(0, 0, 255));
        assert!(composer.session().strokes().is_empty());
    }

    #[test]
    fn setters_bump_version_only_on_change() {
        let mut composer = PatternComposer::new();
        let v0 = composer.version();

        assert!(!composer.set_kind(PatternKind::Stripes));
        assert_eq!(composer.version(), v0);

        assert!(composer.set_kind(PatternKind::Checkerboard));
        assert_ne!(composer.version(), v0);

        let v1 = composer.version();
        assert!(!composer.set_primary(ColorValue::rgb(255, 0, 0)));
        assert_eq!(composer.version(), v1);
        assert!(composer.set_primary(ColorValue::hex("#000000")));
        assert_ne!(composer.version(), v1);
    }

    #[test]
    fn preview_reflects_setting_changes() {
        let mut composer = PatternComposer::new();
        let first = composer.preview().clone();
        assert_eq!(first.pixel(5, 100), Rgba([0, 0, 255, 255]));

        composer.set_secondary(ColorValue::rgb(0, 255, 0));
        let second = composer.preview().clone();
        assert_eq!(second.pixel(5, 100), Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn preview_cache_reuse_same_state() {
        let mut composer = PatternComposer::new();
        let first = composer.preview().clone();
        let second = composer.preview().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn preview_includes_open_stroke_but_render_does_not() {
        let mut composer = PatternComposer::new();
        let plain = composer.render();

        composer.pointer(PointerEvent::Start(Point::new(20.0, 50.0)));
        composer.pointer(PointerEvent::Move(Point::new(180.0, 50.0)));

        assert_ne!(composer.preview(), &plain);
        assert_eq!(composer.render(), plain);

        composer.pointer(PointerEvent::End);
        let finished = composer.render();
        assert_ne!(finished, plain);
        assert_eq!(composer.preview(), &finished);
    }

    #[test]
    fn clear_strokes_restores_plain_pattern() {
        let mut composer = PatternComposer::new();
        let plain = composer.preview().clone();

        draw_line(&mut composer, (10.0, 10.0), (190.0, 190.0));
        assert_ne!(composer.preview(), &plain);

        composer.clear_strokes();
        assert_eq!(composer.preview(), &plain);
    }

    #[test]
    fn save_appends_render_to_gallery() {
        let mut composer = PatternComposer::new();
        composer.set_kind(PatternKind::PolkaDots);
        draw_line(&mut composer, (0.0, 100.0), (200.0, 100.0));

        let store = GalleryStore::new(MemoryStore::new());
        store.append(&RasterImage::filled(Rgba([1, 1, 1, 255]))).unwrap();

        let gallery = composer.save(&store).unwrap();
        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery.get(1).unwrap().decode().unwrap(), composer.render());
    }

    #[test]
    fn profile_apply_to_composer() {
        let profile = PatternProfile::new(PatternKind::Checkerboard)
            .with_primary(ColorValue::hex("#ffffff"))
            .with_secondary(ColorValue::hex("#000000"))
            .with_stroke(Stroke::from_points([(1.0, 1.0), (2.0, 2.0)]));

        let mut composer = PatternComposer::new();
        composer.apply_profile(&profile);

        assert_eq!(composer.kind(), PatternKind::Checkerboard);
        assert_eq!(composer.primary(), &ColorValue::hex("#ffffff"));
        assert_eq!(composer.session().strokes().len(), 1);
    }

    #[test]
    fn profile_export_from_composer() {
        let mut composer = PatternComposer::new();
        composer.set_kind(PatternKind::PolkaDots);
        draw_line(&mut composer, (5.0, 5.0), (6.0, 6.0));
        // An unfinished stroke is not exported.
        composer.pointer(PointerEvent::Start(Point::new(9.0, 9.0)));

        let profile = composer.export_profile();
        assert_eq!(profile.kind, PatternKind::PolkaDots);
        assert_eq!(profile.strokes, vec![Stroke::from_points([(5.0, 5.0), (6.0, 6.0)])]);
    }

    #[test]
    fn applying_profile_invalidates_preview() {
        let mut composer = PatternComposer::new();
        let before = composer.preview().clone();

        // Same settings, but strokes arrive through the profile.
        let profile = composer
            .export_profile()
            .with_stroke(Stroke::from_points([(20.0, 50.0), (180.0, 50.0)]));
        composer.apply_profile(&profile);

        assert_ne!(composer.preview(), &before);
    }

    #[test]
    fn exported_profile_reproduces_render() {
        let mut composer = PatternComposer::new();
        composer.set_kind(PatternKind::Checkerboard);
        draw_line(&mut composer, (0.0, 0.0), (120.0, 80.0));

        let mut copy = PatternComposer::new();
        copy.apply_profile(&composer.export_profile());
        assert_eq!(copy.render(), composer.render());
    }
}
