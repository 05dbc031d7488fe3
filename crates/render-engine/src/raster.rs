//! Snapshot rasterizer.
//!
//! Paints a snapshot's background and strokes into a fixed-size RGBA
//! buffer. Strokes are drawn with round joins and caps: a disc at every
//! vertex plus a filled quad along every segment. Coordinates are used as
//! captured; nothing is rescaled to the output size.

use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut, Canvas,
};
use imageproc::point::Point;

use flipbook_common::config::ExportSettings;
use flipbook_common::error::{FlipbookError, FlipbookResult};
use flipbook_frame_model::snapshot::{Snapshot, SnapshotDocument, Stroke, StrokePoint};

use crate::color::{color_or, BLACK, WHITE};

/// Renders snapshots at a fixed canvas size.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    width: u32,
    height: u32,
    default_background: Rgba<u8>,
}

impl Rasterizer {
    /// A rasterizer for a `width` x `height` canvas on a white background.
    pub fn new(width: u32, height: u32) -> FlipbookResult<Self> {
        if width == 0 || height == 0 {
            return Err(FlipbookError::render(format!(
                "Canvas must not be empty ({width}x{height})"
            )));
        }
        Ok(Self {
            width,
            height,
            default_background: WHITE,
        })
    }

    /// A rasterizer sized for export.
    pub fn from_settings(settings: &ExportSettings) -> FlipbookResult<Self> {
        Self::new(settings.width, settings.height())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Render a snapshot. Blank or unparseable snapshots produce an empty
    /// canvas filled with the default background; parse failures are logged.
    pub fn rasterize(&self, snapshot: &Snapshot) -> RgbaImage {
        if snapshot.is_blank() {
            return self.blank_canvas();
        }
        match snapshot.parse() {
            Ok(doc) => self.render_document(&doc),
            Err(e) => {
                tracing::warn!(error = %e, "Could not parse snapshot, rendering blank frame");
                self.blank_canvas()
            }
        }
    }

    /// Render an already-parsed document.
    pub fn render_document(&self, doc: &SnapshotDocument) -> RgbaImage {
        let background = color_or(doc.background_color.as_deref(), self.default_background);
        let mut canvas = RgbaImage::from_pixel(self.width, self.height, background);

        for stroke in &doc.lines {
            let color = color_or(Some(&stroke.color), BLACK);
            paint_stroke(&mut canvas, stroke, color);
        }

        canvas
    }

    fn blank_canvas(&self) -> RgbaImage {
        RgbaImage::from_pixel(self.width, self.height, self.default_background)
    }
}

fn paint_stroke(canvas: &mut RgbaImage, stroke: &Stroke, color: Rgba<u8>) {
    if stroke.points.is_empty() || color[3] == 0 {
        return;
    }
    let (width, height) = canvas.dimensions();
    // Anything wider than the diagonal already covers the whole canvas.
    let diagonal = (width as f64).hypot(height as f64);
    let half_width = (stroke.width() / 2.0).max(0.5).min(diagonal);

    if color[3] == u8::MAX {
        trace_stroke(canvas, stroke, half_width, color);
        return;
    }

    // Translucent strokes are traced into a coverage mask first so
    // overlapping caps and quads blend once, not once per primitive.
    let mut mask = GrayImage::new(width, height);
    trace_stroke(&mut mask, stroke, half_width, Luma([u8::MAX]));

    let Some((x0, y0, x1, y1)) = stroke_bounds(stroke, half_width, width, height) else {
        return;
    };
    for y in y0..=y1 {
        for x in x0..=x1 {
            if mask.get_pixel(x, y)[0] != 0 {
                let dst = canvas.get_pixel_mut(x, y);
                *dst = blend_over(*dst, color);
            }
        }
    }
}

/// The canvas grown by a stroke's reach on every side. Geometry outside it
/// cannot touch a pixel, and geometry inside it fits comfortably in `i32`.
#[derive(Debug, Clone, Copy)]
struct Reach {
    min: f64,
    max_x: f64,
    max_y: f64,
}

impl Reach {
    fn new(width: u32, height: u32, half_width: f64) -> Self {
        let pad = half_width.ceil() + 2.0;
        Self {
            min: -pad,
            max_x: width as f64 - 1.0 + pad,
            max_y: height as f64 - 1.0 + pad,
        }
    }

    fn contains(&self, p: StrokePoint) -> bool {
        (self.min..=self.max_x).contains(&p.x) && (self.min..=self.max_y).contains(&p.y)
    }

    /// Liang-Barsky clip of the segment `a`-`b`. The clipped segment keeps
    /// the original direction.
    fn clip(&self, a: StrokePoint, b: StrokePoint) -> Option<(StrokePoint, StrokePoint)> {
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
        let edges = [
            (-dx, a.x - self.min),
            (dx, self.max_x - a.x),
            (-dy, a.y - self.min),
            (dy, self.max_y - a.y),
        ];
        for (p, q) in edges {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
            } else if p < 0.0 {
                t0 = t0.max(q / p);
            } else {
                t1 = t1.min(q / p);
            }
        }
        if t0 > t1 {
            return None;
        }

        let at = |t: f64| StrokePoint {
            x: a.x + t * dx,
            y: a.y + t * dy,
        };
        let (start, end) = (at(t0), at(t1));
        [start.x, start.y, end.x, end.y]
            .iter()
            .all(|v| v.is_finite())
            .then_some((start, end))
    }
}

fn trace_stroke<C: Canvas>(canvas: &mut C, stroke: &Stroke, half_width: f64, color: C::Pixel) {
    let (width, height) = canvas.dimensions();
    let reach = Reach::new(width, height, half_width);
    let radius = half_width.round() as i32;

    for &p in stroke.points.iter().filter(|&&p| reach.contains(p)) {
        draw_filled_circle_mut(canvas, (p.x.round() as i32, p.y.round() as i32), radius, color);
    }

    for pair in stroke.points.windows(2) {
        let Some((a, b)) = reach.clip(pair[0], pair[1]) else {
            continue;
        };
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let len = (dx * dx + dy * dy).sqrt();
        if len < f64::EPSILON {
            continue;
        }

        if half_width < 1.0 {
            draw_line_segment_mut(
                canvas,
                (a.x as f32, a.y as f32),
                (b.x as f32, b.y as f32),
                color,
            );
            continue;
        }

        // Offsets of at least one pixel keep the quad's first and last
        // vertices distinct after rounding.
        let nx = -dy / len * half_width;
        let ny = dx / len * half_width;
        let quad = [
            Point::new((a.x + nx).round() as i32, (a.y + ny).round() as i32),
            Point::new((b.x + nx).round() as i32, (b.y + ny).round() as i32),
            Point::new((b.x - nx).round() as i32, (b.y - ny).round() as i32),
            Point::new((a.x - nx).round() as i32, (a.y - ny).round() as i32),
        ];
        draw_polygon_mut(canvas, &quad, color);
    }
}

fn stroke_bounds(
    stroke: &Stroke,
    half_width: f64,
    width: u32,
    height: u32,
) -> Option<(u32, u32, u32, u32)> {
    let pad = half_width.ceil() + 1.0;
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in &stroke.points {
        min_x = min_x.min(p.x - pad);
        min_y = min_y.min(p.y - pad);
        max_x = max_x.max(p.x + pad);
        max_y = max_y.max(p.y + pad);
    }

    if max_x < 0.0 || max_y < 0.0 || min_x >= width as f64 || min_y >= height as f64 {
        return None;
    }

    let clamp_x = |v: f64| v.clamp(0.0, (width - 1) as f64) as u32;
    let clamp_y = |v: f64| v.clamp(0.0, (height - 1) as f64) as u32;
    Some((clamp_x(min_x), clamp_y(min_y), clamp_x(max_x), clamp_y(max_y)))
}

/// Source-over compositing of `src` onto `dst`.
fn blend_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |i: usize| {
        let s = src[i] as f32 * sa;
        let d = dst[i] as f32 * da * (1.0 - sa);
        ((s + d) / out_a).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_a * 255.0).round() as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(strokes: Vec<Stroke>, background: Option<&str>) -> SnapshotDocument {
        let mut doc = SnapshotDocument::empty(200.0, 100.0);
        doc.lines = strokes;
        doc.background_color = background.map(str::to_string);
        doc
    }

    #[test]
    fn test_empty_canvas_is_rejected() {
        assert!(Rasterizer::new(0, 10).is_err());
        assert!(Rasterizer::new(10, 0).is_err());
    }

    #[test]
    fn test_export_settings_size() {
        let r = Rasterizer::from_settings(&ExportSettings::default()).unwrap();
        assert_eq!((r.width(), r.height()), (1000, 563));
    }

    #[test]
    fn test_blank_and_malformed_snapshots_render_background() {
        let r = Rasterizer::new(20, 10).unwrap();
        for snapshot in [Snapshot::blank(), Snapshot::new("{broken")] {
            let img = r.rasterize(&snapshot);
            assert_eq!(img.dimensions(), (20, 10));
            assert!(img.pixels().all(|p| *p == WHITE));
        }
    }

    #[test]
    fn test_background_color_is_applied() {
        let r = Rasterizer::new(20, 10).unwrap();
        let img = r.render_document(&doc_with(vec![], Some("#000000")));
        assert_eq!(*img.get_pixel(5, 5), BLACK);
    }

    #[test]
    fn test_stroke_covers_its_path() {
        let r = Rasterizer::new(200, 100).unwrap();
        let stroke = Stroke::new("#ff0000", 3.0, &[(20.0, 50.0), (180.0, 50.0)]);
        let img = r.render_document(&doc_with(vec![stroke], None));

        let red = Rgba([255, 0, 0, 255]);
        assert_eq!(*img.get_pixel(20, 50), red);
        assert_eq!(*img.get_pixel(100, 50), red);
        assert_eq!(*img.get_pixel(100, 52), red);
        assert_eq!(*img.get_pixel(180, 50), red);
        assert_eq!(*img.get_pixel(100, 60), WHITE);
        assert_eq!(*img.get_pixel(5, 50), WHITE);
    }

    #[test]
    fn test_thin_stroke_draws_line() {
        let r = Rasterizer::new(50, 50).unwrap();
        let stroke = Stroke::new("black", 0.25, &[(5.0, 10.0), (45.0, 10.0)]);
        let img = r.render_document(&doc_with(vec![stroke], None));
        assert_eq!(*img.get_pixel(25, 10), BLACK);
    }

    #[test]
    fn test_translucent_stroke_blends_once() {
        let r = Rasterizer::new(100, 40).unwrap();
        let stroke = Stroke::new(
            "rgba(0,0,0,0.5)",
            4.0,
            &[(10.0, 20.0), (50.0, 20.0), (90.0, 20.0)],
        );
        let img = r.render_document(&doc_with(vec![stroke], None));

        // The joint at x=50 is covered by a disc and two quads.
        let joint = img.get_pixel(50, 20);
        let mid = img.get_pixel(30, 20);
        assert_eq!(joint, mid);
        assert!((120..=135).contains(&joint[0]));
        assert_eq!(joint[3], 255);
    }

    #[test]
    fn test_offscreen_stroke_is_ignored() {
        let r = Rasterizer::new(30, 30).unwrap();
        let stroke = Stroke::new("rgba(0,0,0,0.5)", 2.0, &[(-500.0, -500.0), (-400.0, -450.0)]);
        let img = r.render_document(&doc_with(vec![stroke], None));
        assert!(img.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn test_far_offscreen_vertices_are_skipped() {
        let r = Rasterizer::new(100, 60).unwrap();
        for x in ["3e9", "1e12", "-1e300"] {
            let snapshot = Snapshot::new(format!(
                r##"{{"lines":[{{"points":[{{"x":{x},"y":10}},{{"x":{x},"y":50}}],"brushColor":"#000","brushRadius":2}}]}}"##
            ));
            let img = r.rasterize(&snapshot);
            assert!(img.pixels().all(|p| *p == WHITE), "x={x}");
        }
    }

    #[test]
    fn test_huge_brush_radius_covers_canvas() {
        let r = Rasterizer::new(100, 60).unwrap();
        for color in ["#000", "rgba(0,0,0,0.5)"] {
            let snapshot = Snapshot::new(format!(
                r##"{{"lines":[{{"points":[{{"x":50,"y":30}},{{"x":60,"y":30}}],"brushColor":"{color}","brushRadius":1e12}}]}}"##
            ));
            let img = r.rasterize(&snapshot);
            let corner = *img.get_pixel(0, 0);
            assert_ne!(corner, WHITE, "color={color}");
            assert!(img.pixels().all(|p| *p == corner), "color={color}");
        }
    }

    #[test]
    fn test_segment_from_far_away_is_clipped_in_place() {
        let r = Rasterizer::new(100, 60).unwrap();
        let stroke = Stroke::new("#000", 2.0, &[(-1e9, 30.0), (1e9, 30.0)]);
        let img = r.render_document(&doc_with(vec![stroke], None));
        assert_eq!(*img.get_pixel(0, 30), BLACK);
        assert_eq!(*img.get_pixel(50, 30), BLACK);
        assert_eq!(*img.get_pixel(99, 31), BLACK);
        assert_eq!(*img.get_pixel(50, 10), WHITE);
    }

    #[test]
    fn test_clip_keeps_direction() {
        let reach = Reach::new(10, 10, 1.0);
        let (a, b) = reach
            .clip(StrokePoint { x: -100.0, y: 5.0 }, StrokePoint { x: 100.0, y: 5.0 })
            .unwrap();
        assert!((a.x + 3.0).abs() < 1e-9 && a.y == 5.0);
        assert!((b.x - 12.0).abs() < 1e-9 && b.y == 5.0);
        assert!(reach
            .clip(StrokePoint { x: -100.0, y: 50.0 }, StrokePoint { x: 100.0, y: 50.0 })
            .is_none());
    }

    #[test]
    fn test_blend_over_opaque_destination() {
        let out = blend_over(WHITE, Rgba([0, 0, 0, 128]));
        assert_eq!(out[3], 255);
        assert!((126..=128).contains(&out[0]));
    }
}
