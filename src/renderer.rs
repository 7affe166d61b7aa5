use egui::{Color32, ColorImage, Pos2};
use tiny_skia::{
    BlendMode, FilterQuality, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint,
    Stroke as SkiaStroke, Transform,
};

use crate::error::{CanvasError, CanvasResult};
use crate::stroke::{Stroke, StrokeRef};
use crate::tool::{ToolState, CANVAS_CLEAR_COLOR};

pub const CANVAS_WIDTH: u32 = 1200;
pub const CANVAS_HEIGHT: u32 = 800;

pub const GRID_SPACING: f32 = 50.0;
pub const GRID_COLOR: Color32 = Color32::from_rgb(0x2a, 0x35, 0x47);
pub const GRID_OPACITY: f32 = 0.3;
pub const BACKGROUND_OPACITY: f32 = 0.3;

/// Layers painted beneath the committed strokes on a full repaint
#[derive(Default, Clone, Copy)]
pub struct Underlay<'a> {
    /// User supplied image, stretched to the canvas at reduced opacity
    pub background: Option<&'a Pixmap>,
    /// Drawing restored from storage, painted unscaled as the base layer
    pub prior_snapshot: Option<&'a Pixmap>,
}

/// Owns the canvas raster and paints the annotation layers into it
pub struct Renderer {
    surface: Pixmap,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("width", &self.surface.width())
            .field("height", &self.surface.height())
            .finish()
    }
}

impl Renderer {
    /// Creates a renderer with a surface of the given size, already cleared
    pub fn new(width: u32, height: u32) -> CanvasResult<Self> {
        let surface = Pixmap::new(width, height).ok_or(CanvasError::InvalidSize { width, height })?;
        let mut renderer = Self { surface };
        renderer.repaint(Underlay::default(), &[]);
        Ok(renderer)
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.surface
    }

    /// Repaints the whole surface from scratch.
    ///
    /// Layer order is fixed: clear colour with the prior snapshot over it,
    /// background image, grid, then the strokes in list order. Erasers cut
    /// through everything painted before them in this pass.
    pub fn repaint(&mut self, underlay: Underlay<'_>, strokes: &[StrokeRef]) {
        self.fill_background();

        // The snapshot already holds its own clear fill and grid
        if let Some(snapshot) = underlay.prior_snapshot {
            self.draw_prior_snapshot(snapshot);
        }

        if let Some(image) = underlay.background {
            self.draw_background_image(image);
        }

        self.draw_grid();

        for stroke in strokes {
            self.draw_stroke(stroke);
        }
    }

    /// Paints only the newest segment of a gesture in progress.
    ///
    /// The next full repaint replaces it with the committed stroke.
    pub fn draw_segment(&mut self, from: Pos2, to: Pos2, tool: &ToolState) {
        self.stroke_polyline(&[from, to], tool.ink_color(), tool.ink_width(), tool.is_eraser());
    }

    fn fill_background(&mut self) {
        let [r, g, b, _] = CANVAS_CLEAR_COLOR.to_array();
        self.surface.fill(tiny_skia::Color::from_rgba8(r, g, b, 255));
    }

    fn draw_background_image(&mut self, image: &Pixmap) {
        let scale_x = self.surface.width() as f32 / image.width() as f32;
        let scale_y = self.surface.height() as f32 / image.height() as f32;
        let paint = PixmapPaint {
            opacity: BACKGROUND_OPACITY,
            blend_mode: BlendMode::SourceOver,
            quality: FilterQuality::Bilinear,
        };
        self.surface.draw_pixmap(
            0,
            0,
            image.as_ref(),
            &paint,
            Transform::from_scale(scale_x, scale_y),
            None,
        );
    }

    fn draw_grid(&mut self) {
        let width = self.surface.width() as f32;
        let height = self.surface.height() as f32;

        let mut paint = Paint::default();
        let [r, g, b, _] = GRID_COLOR.to_array();
        paint.set_color_rgba8(r, g, b, (255.0 * GRID_OPACITY).round() as u8);
        paint.anti_alias = true;
        let stroke = SkiaStroke {
            width: 1.0,
            ..SkiaStroke::default()
        };

        // Each line is stroked on its own so crossings blend twice
        let mut x = 0.0;
        while x < width {
            self.stroke_line(Pos2::new(x, 0.0), Pos2::new(x, height), &paint, &stroke);
            x += GRID_SPACING;
        }
        let mut y = 0.0;
        while y < height {
            self.stroke_line(Pos2::new(0.0, y), Pos2::new(width, y), &paint, &stroke);
            y += GRID_SPACING;
        }
    }

    fn stroke_line(&mut self, from: Pos2, to: Pos2, paint: &Paint<'_>, stroke: &SkiaStroke) {
        let mut builder = PathBuilder::new();
        builder.move_to(from.x, from.y);
        builder.line_to(to.x, to.y);
        if let Some(path) = builder.finish() {
            self.surface.stroke_path(&path, paint, stroke, Transform::identity(), None);
        }
    }

    fn draw_prior_snapshot(&mut self, snapshot: &Pixmap) {
        self.surface.draw_pixmap(
            0,
            0,
            snapshot.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    fn draw_stroke(&mut self, stroke: &Stroke) {
        if !stroke.is_renderable() {
            return;
        }
        self.stroke_polyline(stroke.points(), stroke.color(), stroke.width(), stroke.is_eraser());
    }

    fn stroke_polyline(&mut self, points: &[Pos2], color: Color32, width: u32, erase: bool) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        if rest.is_empty() {
            return;
        }

        let mut builder = PathBuilder::new();
        builder.move_to(first.x, first.y);
        for point in rest {
            builder.line_to(point.x, point.y);
        }
        // Degenerate paths (all points identical) have no outline
        let Some(path) = builder.finish() else {
            return;
        };

        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r(), color.g(), color.b(), 255);
        paint.anti_alias = true;
        // Blend mode lives on the paint, so the next stroke starts from source-over again
        paint.blend_mode = if erase {
            BlendMode::DestinationOut
        } else {
            BlendMode::SourceOver
        };

        let stroke = SkiaStroke {
            width: width as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..SkiaStroke::default()
        };
        self.surface.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    /// The surface as a premultiplied texture image
    pub fn to_color_image(&self) -> ColorImage {
        ColorImage::from_rgba_premultiplied(
            [self.surface.width() as usize, self.surface.height() as usize],
            self.surface.data(),
        )
    }

    /// Colour of a pixel as shown to the user, over the clear colour.
    pub fn display_color_at(&self, x: u32, y: u32) -> Option<Color32> {
        let pixel = self.surface.pixel(x, y)?;
        let [cr, cg, cb, _] = CANVAS_CLEAR_COLOR.to_array();
        let under = 255 - pixel.alpha() as u32;
        let over = |src: u8, dst: u8| (src as u32 + (dst as u32 * under + 127) / 255).min(255) as u8;
        Some(Color32::from_rgb(
            over(pixel.red(), cr),
            over(pixel.green(), cg),
            over(pixel.blue(), cb),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::Tool;
    use egui::pos2;

    fn renderer() -> Renderer {
        Renderer::new(200, 100).unwrap()
    }

    #[test]
    fn test_renderer_creation() {
        let renderer = renderer();
        assert_eq!(renderer.width(), 200);
        assert_eq!(renderer.height(), 100);
        // Away from the grid the surface is the opaque clear colour
        assert_eq!(renderer.display_color_at(25, 25), Some(CANVAS_CLEAR_COLOR));
        assert_eq!(renderer.pixmap().pixel(25, 25).unwrap().alpha(), 255);
    }

    #[test]
    fn test_zero_size_surface_is_rejected() {
        assert!(matches!(
            Renderer::new(0, 10),
            Err(CanvasError::InvalidSize { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_grid_is_painted() {
        let renderer = renderer();
        let on_grid = renderer.display_color_at(50, 25).unwrap();
        assert_ne!(on_grid, CANVAS_CLEAR_COLOR);
    }

    #[test]
    fn test_single_point_stroke_is_skipped() {
        let mut renderer = renderer();
        let before = renderer.pixmap().clone();
        let dot = Stroke::new_ref(vec![pos2(25.0, 25.0)], Color32::RED, 3, false);
        renderer.repaint(Underlay::default(), &[dot]);
        assert_eq!(renderer.pixmap().data(), before.data());
    }

    #[test]
    fn test_pen_stroke_paints_color() {
        let mut renderer = renderer();
        let line = Stroke::new_ref(vec![pos2(10.0, 25.5), pos2(40.0, 25.5)], Color32::RED, 3, false);
        renderer.repaint(Underlay::default(), &[line]);
        assert_eq!(renderer.display_color_at(25, 25), Some(Color32::RED));
    }

    #[test]
    fn test_eraser_cuts_to_transparent() {
        let mut renderer = renderer();
        let line = Stroke::new_ref(vec![pos2(10.0, 25.5), pos2(90.0, 25.5)], Color32::RED, 3, false);
        let eraser = Stroke::new_ref(
            vec![pos2(60.0, 25.5), pos2(70.0, 25.5)],
            CANVAS_CLEAR_COLOR,
            20,
            true,
        );
        renderer.repaint(Underlay::default(), &[line, eraser]);
        assert_eq!(renderer.pixmap().pixel(65, 25).unwrap().alpha(), 0);
        assert_eq!(renderer.display_color_at(65, 25), Some(CANVAS_CLEAR_COLOR));
        // The untouched end of the pen stroke survives
        assert_eq!(renderer.display_color_at(20, 25), Some(Color32::RED));
    }

    #[test]
    fn test_live_segment_uses_tool_ink() {
        let mut renderer = renderer();
        let tool = ToolState::default();
        renderer.draw_segment(pos2(10.0, 60.5), pos2(40.0, 60.5), &tool);
        assert_eq!(renderer.display_color_at(25, 60), Some(tool.color()));
    }

    #[test]
    fn test_live_eraser_segment_cuts_to_transparent() {
        let mut renderer = renderer();
        let line = Stroke::new_ref(vec![pos2(10.0, 25.5), pos2(90.0, 25.5)], Color32::RED, 3, false);
        renderer.repaint(Underlay::default(), &[line]);

        let mut tool = ToolState::default();
        tool.set_tool(Tool::Eraser);
        renderer.draw_segment(pos2(60.0, 25.5), pos2(70.0, 25.5), &tool);
        assert_eq!(renderer.pixmap().pixel(65, 25).unwrap().alpha(), 0);
        assert_eq!(renderer.display_color_at(20, 25), Some(Color32::RED));

        // A pen segment afterwards composites normally again
        tool.set_tool(Tool::Pen);
        renderer.draw_segment(pos2(60.0, 75.5), pos2(90.0, 75.5), &tool);
        assert_eq!(renderer.display_color_at(75, 75), Some(tool.color()));
    }
}
