use egui::{Color32, Rect, Sense, Stroke, TextureOptions, pos2, vec2};

use crate::ScoutApp;
use crate::input::CanvasMapping;
use crate::tool::CANVAS_CLEAR_COLOR;

pub fn central_panel(app: &mut ScoutApp, ctx: &egui::Context) {
    let now = app.clock();

    egui::CentralPanel::default().show(ctx, |ui| {
        let Some(view) = &mut app.view else {
            return;
        };

        ui.heading("Autonomous Route Planning");
        ui.weak("Draw paths and strategies for this team");

        // Fit the canvas into the panel, keeping its aspect ratio
        let width = view.session.renderer().width();
        let height = view.session.renderer().height();
        let available = ui.available_size();
        let scale = (available.x / width as f32).min(available.y / height as f32).max(0.1);
        let (response, painter) = ui.allocate_painter(vec2(width as f32, height as f32) * scale, Sense::drag());
        let canvas_rect = response.rect;

        // Handle input
        let mapping = CanvasMapping::new(canvas_rect, width, height);
        for event in view.input.process_input(&response, &mapping) {
            view.session.handle_event(event, now);
        }

        if view.session.take_dirty() || view.texture.is_none() {
            let image = view.session.renderer().to_color_image();
            match &mut view.texture {
                Some(texture) => texture.set(image, TextureOptions::LINEAR),
                None => {
                    let name = format!("canvas-{}", view.session.id());
                    view.texture = Some(ctx.load_texture(name, image, TextureOptions::LINEAR));
                }
            }
        }

        // Erased pixels are transparent; the clear colour shows through
        painter.rect_filled(canvas_rect, 0.0, CANVAS_CLEAR_COLOR);
        if let Some(texture) = &view.texture {
            let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
            painter.image(texture.id(), canvas_rect, uv, Color32::WHITE);
        }

        if let Some(pointer) = response.hover_pos() {
            let tool = view.session.tool();
            let radius = (tool.ink_width() as f32 * scale / 2.0).max(1.0);
            painter.circle_stroke(pointer, radius, Stroke::new(1.0, Color32::from_white_alpha(160)));
        }
    });
}
