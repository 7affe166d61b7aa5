use egui::{Color32, Key, Modifiers, Sense, Stroke, Vec2};

use crate::ScoutApp;
use crate::persistence::SaveStatus;
use crate::tool::{MAX_PEN_WIDTH, MIN_PEN_WIDTH, PALETTE, Tool};

const SWATCH_SIZE: f32 = 24.0;

fn color_swatch(ui: &mut egui::Ui, color: Color32, selected: bool, name: &str) -> egui::Response {
    let (rect, response) = ui.allocate_exact_size(Vec2::splat(SWATCH_SIZE), Sense::click());
    let outline = if selected {
        Stroke::new(2.0, ui.visuals().strong_text_color())
    } else {
        Stroke::new(1.0, ui.visuals().weak_text_color())
    };
    ui.painter().rect(rect.shrink(2.0), 4.0, color, outline);
    response.on_hover_text(name)
}

fn save_status_label(ui: &mut egui::Ui, status: &SaveStatus) {
    match status {
        SaveStatus::Idle => ui.weak("Not saved yet"),
        SaveStatus::Pending => ui.weak("Saving..."),
        SaveStatus::Saved { at } => ui.weak(format!("Saved {}", at.with_timezone(&chrono::Local).format("%H:%M:%S"))),
        SaveStatus::Failed { message } => ui.colored_label(Color32::LIGHT_RED, format!("Save failed: {}", message)),
    };
}

pub fn tools_panel(app: &mut ScoutApp, ctx: &egui::Context) {
    let mut export_clicked = false;
    let mut import_clicked = false;
    let now = app.clock();

    egui::SidePanel::left("tools_panel")
        .resizable(true)
        .default_width(200.0)
        .show(ctx, |ui| {
            let Some(view) = &mut app.view else {
                return;
            };
            let session = &mut view.session;

            ui.heading("Tools");
            let active = session.tool().tool();
            for tool in [Tool::Pen, Tool::Eraser] {
                if ui.selectable_label(active == tool, tool.name()).clicked() {
                    log::info!("Tool selected from UI: {}", tool.name());
                    session.set_tool(tool);
                }
            }
            ui.separator();

            if !session.tool().is_eraser() {
                ui.label("Colour");
                ui.horizontal_wrapped(|ui| {
                    for (name, color) in PALETTE {
                        let selected = session.tool().color() == color;
                        if color_swatch(ui, color, selected, name).clicked() {
                            session.set_color(color);
                        }
                    }
                });

                let mut width = session.tool().stroke_width();
                if ui
                    .add(egui::Slider::new(&mut width, MIN_PEN_WIDTH..=MAX_PEN_WIDTH).text("Width"))
                    .changed()
                {
                    session.set_stroke_width(width);
                }
                ui.separator();
            }

            // Undo/Redo section. Redo first: Cmd+Z would also match Cmd+Shift+Z.
            let redo_shortcut = ui.input_mut(|i| {
                i.consume_key(Modifiers::COMMAND | Modifiers::SHIFT, Key::Z) || i.consume_key(Modifiers::COMMAND, Key::Y)
            });
            let undo_shortcut = ui.input_mut(|i| i.consume_key(Modifiers::COMMAND, Key::Z));
            ui.horizontal(|ui| {
                let can_undo = session.history().can_undo();
                let can_redo = session.history().can_redo();

                if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() || undo_shortcut {
                    session.undo();
                }
                if ui.add_enabled(can_redo, egui::Button::new("Redo")).clicked() || redo_shortcut {
                    session.redo();
                }
            });
            ui.weak(format!(
                "History: {} of {}",
                session.history().cursor(),
                session.history().len() - 1
            ));

            if ui.button("🗑 Clear").clicked() {
                view.confirm_clear = true;
            }
            if view.confirm_clear {
                ui.colored_label(Color32::LIGHT_RED, "Clear the whole drawing? This cannot be undone.");
                ui.horizontal(|ui| {
                    if ui.button("Clear").clicked() {
                        view.session.clear(now);
                        view.confirm_clear = false;
                    }
                    if ui.button("Cancel").clicked() {
                        view.confirm_clear = false;
                    }
                });
            }
            ui.separator();

            ui.heading("Image");
            if ui.button("🖼 Import background").on_hover_text("Or drop an image onto the window").clicked() {
                import_clicked = true;
            }
            if ui.button("⬇ Export PNG").clicked() {
                export_clicked = true;
            }
            ui.separator();

            save_status_label(ui, view.session.save_status());
        });

    if import_clicked {
        app.files.pick_background(ctx);
    }
    if export_clicked {
        app.export_drawing(ctx);
    }
}
