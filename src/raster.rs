//! Pattern rasterization into a fixed 200x200 RGBA buffer.
//!
//! The canvas starts as the primary color in straight alpha. The tiling rule
//! for the pattern kind and the strokes (2px opaque black) are drawn with
//! `tiny_skia` (re-exported by `resvg`) into transparent layers, which are
//! then composited source-over onto the canvas. Pixels no layer touches keep
//! the primary color exactly. The output is a function of the inputs only.

use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{
    self, FillRule, Paint, PathBuilder, Pixmap, Rect, Transform,
};

use crate::codec;
use crate::color::{STROKE_COLOR, resolve_or_fallback};
use crate::error::{DecodeError, EncodeError};
use crate::pattern::{CANVAS_SIZE, PatternKind, PatternSpec, Stroke};

/// Width of freehand strokes, in pixels.
pub const STROKE_WIDTH: f32 = 2.0;

const STRIPE_STEP: u32 = 20;
const STRIPE_WIDTH: u32 = 10;
const DOT_ORIGIN: u32 = 20;
const DOT_STEP: u32 = 40;
const DOT_SIZE: u32 = 20;
const CHECKER_STEP: u32 = 40;

// ============================================================================
// RasterImage
// ============================================================================

/// A finished 200x200 RGBA8 raster.
///
/// Immutable once produced. Equality is exact, byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    data: RgbaImage,
}

impl RasterImage {
    /// Wraps an RGBA buffer, checking it has the canvas dimensions.
    pub fn from_rgba(data: RgbaImage) -> Result<Self, DecodeError> {
        if data.width() != CANVAS_SIZE || data.height() != CANVAS_SIZE {
            return Err(DecodeError::DimensionMismatch {
                width: data.width(),
                height: data.height(),
            });
        }
        Ok(Self { data })
    }

    /// A canvas filled with a single color.
    pub fn filled(color: Rgba<u8>) -> Self {
        Self {
            data: RgbaImage::from_pixel(CANVAS_SIZE, CANVAS_SIZE, color),
        }
    }

    pub fn width(&self) -> u32 {
        self.data.width()
    }

    pub fn height(&self) -> u32 {
        self.data.height()
    }

    /// Returns the pixel at `(x, y)`. Panics if out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.data.get_pixel(x, y)
    }

    /// Row-major RGBA bytes.
    pub fn as_raw(&self) -> &[u8] {
        self.data.as_raw()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.data
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.data
    }

    /// Encodes to PNG, e.g. for copy, share or export.
    pub fn to_png(&self) -> Result<Vec<u8>, EncodeError> {
        codec::encode(self)
    }
}

// ============================================================================
// Rasterization
// ============================================================================

/// Renders a pattern and its strokes.
///
/// Strokes with fewer than two points draw nothing. An unresolvable primary
/// or secondary color is painted as the fallback red.
pub fn rasterize(spec: &PatternSpec, strokes: &[Stroke]) -> RasterImage {
    let primary = resolve_or_fallback(spec.primary_color(), "primary");
    let mut data = RgbaImage::from_pixel(CANVAS_SIZE, CANVAS_SIZE, primary);

    let secondary = resolve_or_fallback(spec.secondary_color(), "secondary");
    let mut paint = Paint::default();
    paint.set_color_rgba8(secondary[0], secondary[1], secondary[2], secondary[3]);

    let mut pattern = transparent_layer();
    match spec.kind() {
        PatternKind::Stripes => paint_stripes(&mut pattern, &mut paint),
        PatternKind::PolkaDots => paint_polka_dots(&mut pattern, &mut paint),
        PatternKind::Checkerboard => paint_checkerboard(&mut pattern, &mut paint),
    }
    composite_over(&mut data, &pattern);

    if !strokes.is_empty() {
        let mut ink = transparent_layer();
        paint_strokes(&mut ink, strokes);
        composite_over(&mut data, &ink);
    }

    tracing::debug!(
        id = %spec.id(),
        kind = %spec.kind(),
        strokes = strokes.len(),
        "rasterized pattern"
    );

    RasterImage { data }
}

/// Renders a pattern without any strokes, as used for the live preview.
pub fn rasterize_pattern(spec: &PatternSpec) -> RasterImage {
    rasterize(spec, &[])
}

/// Vertical bands `x in [i, i + 10)` for every `i` stepping by 20.
fn paint_stripes(pixmap: &mut Pixmap, paint: &mut Paint) {
    paint.anti_alias = false;
    for x in (0..CANVAS_SIZE).step_by(STRIPE_STEP as usize) {
        fill_cell(pixmap, paint, x, 0, STRIPE_WIDTH, CANVAS_SIZE);
    }
}

/// Ellipses inscribed in 20x20 boxes on a 40px grid starting at (20, 20).
fn paint_polka_dots(pixmap: &mut Pixmap, paint: &mut Paint) {
    paint.anti_alias = true;
    for x in (DOT_ORIGIN..CANVAS_SIZE).step_by(DOT_STEP as usize) {
        for y in (DOT_ORIGIN..CANVAS_SIZE).step_by(DOT_STEP as usize) {
            let oval = Rect::from_xywh(x as f32, y as f32, DOT_SIZE as f32, DOT_SIZE as f32)
                .and_then(PathBuilder::from_oval);
            if let Some(path) = oval {
                pixmap.fill_path(&path, paint, FillRule::Winding, Transform::identity(), None);
            }
        }
    }
}

/// 40x40 cells on a 40px grid, painted where `(x + y) % 80 == 0`.
fn paint_checkerboard(pixmap: &mut Pixmap, paint: &mut Paint) {
    paint.anti_alias = false;
    for x in (0..CANVAS_SIZE).step_by(CHECKER_STEP as usize) {
        for y in (0..CANVAS_SIZE).step_by(CHECKER_STEP as usize) {
            if checker_cell_painted(x, y) {
                fill_cell(pixmap, paint, x, y, CHECKER_STEP, CHECKER_STEP);
            }
        }
    }
}

/// Whether the checkerboard cell anchored at `(x, y)` takes the secondary color.
fn checker_cell_painted(x: u32, y: u32) -> bool {
    (x + y) % (CHECKER_STEP * 2) == 0
}

fn fill_cell(pixmap: &mut Pixmap, paint: &Paint, x: u32, y: u32, width: u32, height: u32) {
    if let Some(rect) = Rect::from_xywh(x as f32, y as f32, width as f32, height as f32) {
        pixmap.fill_rect(rect, paint, Transform::identity(), None);
    }
}

/// Strokes each polyline in recording order.
fn paint_strokes(pixmap: &mut Pixmap, strokes: &[Stroke]) {
    let mut paint = Paint::default();
    paint.set_color_rgba8(STROKE_COLOR[0], STROKE_COLOR[1], STROKE_COLOR[2], STROKE_COLOR[3]);
    paint.anti_alias = true;

    let line = tiny_skia::Stroke {
        width: STROKE_WIDTH,
        ..tiny_skia::Stroke::default()
    };

    for stroke in strokes {
        let Some((first, rest)) = stroke.points.split_first() else {
            continue;
        };

        let mut builder = PathBuilder::new();
        builder.move_to(first.x, first.y);
        for point in rest {
            builder.line_to(point.x, point.y);
        }

        // A lone move-to has no segments and yields no path.
        if let Some(path) = builder.finish() {
            pixmap.stroke_path(&path, &paint, &line, Transform::identity(), None);
        }
    }
}

fn transparent_layer() -> Pixmap {
    Pixmap::new(CANVAS_SIZE, CANVAS_SIZE).expect("200x200 is a valid pixmap size")
}

// ============================================================================
// Compositing
// ============================================================================

/// Blends a premultiplied `tiny_skia` layer source-over onto a straight-alpha
/// image of the same size. Fully transparent layer pixels are skipped.
fn composite_over(dest: &mut RgbaImage, layer: &Pixmap) {
    for (dst, src) in dest.pixels_mut().zip(layer.pixels()) {
        if src.alpha() == 0 {
            continue;
        }
        let c = src.demultiply();
        *dst = alpha_blend(Rgba([c.red(), c.green(), c.blue(), c.alpha()]), *dst);
    }
}

/// Source-over blend of two straight-alpha pixels.
fn alpha_blend(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    if src[3] == u8::MAX {
        return src;
    }

    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |s: u8, d: u8| -> u8 {
        let out = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        out.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorValue, FALLBACK_COLOR};

    const PRIMARY: Rgba<u8> = Rgba([240, 240, 240, 255]);
    const SECONDARY: Rgba<u8> = Rgba([20, 60, 200, 255]);

    fn is_black(p: Rgba<u8>) -> bool {
        p[0] <= 8 && p[1] <= 8 && p[2] <= 8 && p[3] == 255
    }

    fn spec(kind: PatternKind) -> PatternSpec {
        PatternSpec::new(PRIMARY.into(), SECONDARY.into(), kind)
    }

    #[test]
    fn output_is_canvas_sized() {
        for kind in PatternKind::ALL {
            let img = rasterize_pattern(&spec(kind));
            assert_eq!((img.width(), img.height()), (CANVAS_SIZE, CANVAS_SIZE));
            assert_eq!(img.as_raw().len(), (CANVAS_SIZE * CANVAS_SIZE * 4) as usize);
        }
    }

    #[test]
    fn stripes_alternate_every_ten_pixels() {
        let img = rasterize_pattern(&spec(PatternKind::Stripes));
        for x in 0..CANVAS_SIZE {
            let expected = if x % 20 < 10 { SECONDARY } else { PRIMARY };
            assert_eq!(img.pixel(x, 100), expected, "x = {x}");
        }
        // Bands run the full height.
        assert_eq!(img.pixel(5, 0), SECONDARY);
        assert_eq!(img.pixel(5, 199), SECONDARY);
        assert_eq!(img.pixel(15, 199), PRIMARY);
    }

    #[test]
    fn checkerboard_paints_every_other_cell() {
        let img = rasterize_pattern(&spec(PatternKind::Checkerboard));
        for cx in (0..CANVAS_SIZE).step_by(40) {
            for cy in (0..CANVAS_SIZE).step_by(40) {
                let expected = if (cx + cy) % 80 == 0 { SECONDARY } else { PRIMARY };
                for (dx, dy) in [(0, 0), (39, 0), (0, 39), (39, 39), (20, 20)] {
                    assert_eq!(img.pixel(cx + dx, cy + dy), expected, "cell ({cx}, {cy})");
                }
            }
        }
    }

    #[test]
    fn checkerboard_known_cells() {
        assert!(checker_cell_painted(0, 0));
        assert!(!checker_cell_painted(40, 0));
        assert!(checker_cell_painted(40, 40));
        assert!(!checker_cell_painted(0, 120));
    }

    #[test]
    fn polka_dots_fill_centers_and_leave_gaps() {
        let img = rasterize_pattern(&spec(PatternKind::PolkaDots));
        assert_eq!(img.pixel(30, 30), SECONDARY);
        assert_eq!(img.pixel(10, 10), PRIMARY);

        // Every dot center on the grid is painted.
        for x in (20..CANVAS_SIZE).step_by(40) {
            for y in (20..CANVAS_SIZE).step_by(40) {
                assert_eq!(img.pixel(x + 10, y + 10), SECONDARY, "dot at ({x}, {y})");
            }
        }

        // Box corners and the gaps between dots keep the primary color.
        assert_eq!(img.pixel(20, 20), PRIMARY);
        assert_eq!(img.pixel(50, 50), PRIMARY);
        assert_eq!(img.pixel(199, 0), PRIMARY);
    }

    #[test]
    fn rasterization_is_deterministic() {
        let spec = spec(PatternKind::PolkaDots);
        let strokes = vec![Stroke::from_points([(10.0, 10.0), (190.0, 120.0), (40.0, 180.0)])];
        assert_eq!(rasterize(&spec, &strokes), rasterize(&spec, &strokes));
    }

    #[test]
    fn empty_stroke_changes_nothing() {
        let spec = spec(PatternKind::Stripes);
        let plain = rasterize(&spec, &[]);
        assert_eq!(rasterize(&spec, &[Stroke::new()]), plain);
        assert_eq!(rasterize(&spec, &[Stroke::new(), Stroke::new()]), plain);
    }

    #[test]
    fn single_point_stroke_changes_nothing() {
        let spec = spec(PatternKind::Checkerboard);
        let plain = rasterize(&spec, &[]);
        assert_eq!(rasterize(&spec, &[Stroke::from_points([(100.0, 100.0)])]), plain);
    }

    #[test]
    fn strokes_are_drawn_black_on_top() {
        let spec = spec(PatternKind::Checkerboard);
        let line = Stroke::from_points([(20.0, 50.0), (180.0, 50.0)]);
        let img = rasterize(&spec, &[line]);

        // A 2px line centered on y = 50 covers rows 49 and 50 fully.
        assert!(is_black(img.pixel(100, 49)));
        assert!(is_black(img.pixel(100, 50)));
        // Painted cell and unpainted cell both get covered.
        assert!(is_black(img.pixel(30, 50)));
        assert!(is_black(img.pixel(60, 50)));
        // Away from the line the pattern is intact.
        assert_eq!(img.pixel(100, 60), PRIMARY);
    }

    #[test]
    fn strokes_follow_every_segment() {
        let spec = spec(PatternKind::Stripes);
        let corner = Stroke::from_points([(100.0, 20.0), (100.0, 100.0), (180.0, 100.0)]);
        let img = rasterize(&spec, &[corner]);

        assert!(is_black(img.pixel(100, 60)));
        assert!(is_black(img.pixel(140, 100)));
    }

    #[test]
    fn unresolved_secondary_paints_fallback_red() {
        let spec = PatternSpec::new(PRIMARY.into(), ColorValue::hex("not-a-color"), PatternKind::Stripes);
        let img = rasterize_pattern(&spec);
        assert_eq!(img.pixel(5, 100), FALLBACK_COLOR);
        assert_eq!(img.pixel(15, 100), PRIMARY);
    }

    #[test]
    fn unresolved_primary_paints_fallback_red() {
        let spec = PatternSpec::new(ColorValue::Unset, SECONDARY.into(), PatternKind::Stripes);
        let img = rasterize_pattern(&spec);
        assert_eq!(img.pixel(15, 100), FALLBACK_COLOR);
        assert_eq!(img.pixel(5, 100), SECONDARY);
    }

    #[test]
    fn translucent_primary_is_kept_exactly() {
        for primary in [Rgba([200, 100, 50, 128]), Rgba([10, 20, 30, 0])] {
            let spec = PatternSpec::new(primary.into(), ColorValue::rgb(0, 0, 255), PatternKind::Stripes);
            let img = rasterize_pattern(&spec);
            assert_eq!(img.pixel(15, 100), primary, "primary {primary:?}");
            assert_eq!(img.pixel(5, 100), Rgba([0, 0, 255, 255]), "primary {primary:?}");
        }
    }

    #[test]
    fn translucent_secondary_blends_over_primary() {
        let spec = PatternSpec::new(
            ColorValue::rgb(255, 255, 255),
            ColorValue::rgba(0, 0, 0, 128),
            PatternKind::Checkerboard,
        );
        let img = rasterize_pattern(&spec);

        let painted = img.pixel(20, 20);
        assert_eq!(painted[3], 255);
        for channel in &painted.0[..3] {
            assert!((126..=128).contains(channel), "painted {painted:?}");
        }
        assert_eq!(img.pixel(60, 20), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn strokes_over_transparent_primary() {
        let clear = Rgba([10, 20, 30, 0]);
        let spec = PatternSpec::new(clear.into(), SECONDARY.into(), PatternKind::Stripes);
        let img = rasterize(&spec, &[Stroke::from_points([(0.0, 50.0), (200.0, 50.0)])]);

        assert!(is_black(img.pixel(15, 50)));
        assert_eq!(img.pixel(15, 100), clear);
    }

    #[test]
    fn alpha_blend_source_over() {
        let opaque = Rgba([1, 2, 3, 255]);
        assert_eq!(alpha_blend(opaque, Rgba([9, 9, 9, 40])), opaque);
        assert_eq!(alpha_blend(Rgba([0, 0, 0, 0]), Rgba([0, 0, 0, 0])), Rgba([0, 0, 0, 0]));
        // Half-transparent red over transparent keeps its own color.
        assert_eq!(alpha_blend(Rgba([255, 0, 0, 128]), Rgba([0, 0, 255, 0])), Rgba([255, 0, 0, 128]));
    }

    #[test]
    fn rasterizes_on_worker_thread() {
        let spec = spec(PatternKind::PolkaDots);
        let expected = rasterize_pattern(&spec);
        let worker = std::thread::spawn(move || rasterize_pattern(&spec));
        assert_eq!(worker.join().unwrap(), expected);
    }

    #[test]
    fn from_rgba_rejects_wrong_size() {
        let err = RasterImage::from_rgba(RgbaImage::new(10, 200)).unwrap_err();
        assert_eq!(err, DecodeError::DimensionMismatch { width: 10, height: 200 });
        assert!(RasterImage::from_rgba(RgbaImage::new(200, 200)).is_ok());
    }
}
