use crate::ScoutApp;

pub fn top_bar(app: &mut ScoutApp, ctx: &egui::Context) {
    egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if app.view.is_some() && ui.button("⬅ Back to Teams").clicked() {
                app.close_team();
            }

            ui.heading("FTC Scout");
            ui.label(format!("{} · {}", app.config().event_code, app.config().season));

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("⚙ Admin").clicked() {
                    let stored = app.credentials.clone();
                    app.admin.open(&stored);
                }

                let mut dismiss = false;
                if let Some(message) = &app.status_message {
                    if ui.small_button("✖").clicked() {
                        dismiss = true;
                    }
                    ui.label(message);
                }
                if dismiss {
                    app.status_message = None;
                }
            });
        });
    });
}
