use crate::ScoutApp;
use crate::ftc_api::{ApiClient, Credentials};
use crate::task::{BackgroundTask, TaskPoll};

/// Edit state of the admin window
#[derive(Debug, Default)]
pub struct AdminState {
    open: bool,
    username: String,
    auth_key: String,
    show_auth_key: bool,
    confirm_clear_all: bool,
    validating: Option<(Credentials, BackgroundTask<bool>)>,
    message: Option<(bool, String)>,
}

impl AdminState {
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open the window, prefilled with the stored credentials
    pub fn open(&mut self, stored: &Credentials) {
        self.open = true;
        self.username = stored.username.clone();
        self.auth_key = stored.auth_key.clone();
        self.message = None;
    }

    pub fn is_validating(&self) -> bool {
        self.validating.is_some()
    }

    fn start_validation(&mut self, ctx: &egui::Context, client: ApiClient, event_code: String) {
        let credentials = Credentials::new(self.username.trim(), self.auth_key.trim());
        if !credentials.is_complete() {
            self.message = Some((false, "Please enter both username and auth key".to_owned()));
            return;
        }

        self.message = Some((true, "Validating credentials...".to_owned()));
        let candidate = credentials.clone();
        let task = BackgroundTask::spawn("validate credentials", ctx, move || {
            client.validate_credentials(&candidate, &event_code)
        });
        self.validating = Some((credentials, task));
    }

    /// Credentials the API just accepted, once
    pub fn poll_validation(&mut self) -> Option<Credentials> {
        let (_, task) = self.validating.as_mut()?;
        let valid = match task.poll() {
            TaskPoll::Pending => return None,
            TaskPoll::Ready(valid) => valid,
            TaskPoll::Lost => false,
        };
        let (credentials, _) = self.validating.take()?;

        if valid {
            log::info!("Saved API credentials for {}", credentials.username);
            self.message = Some((true, "Credentials saved successfully!".to_owned()));
            self.open = false;
            Some(credentials)
        } else {
            self.message = Some((false, "Invalid credentials. Please check and try again.".to_owned()));
            None
        }
    }
}

pub fn admin_window(app: &mut ScoutApp, ctx: &egui::Context) {
    if !app.admin.is_open() {
        return;
    }

    let mut open = true;
    let mut save_clicked = false;
    let mut clear_clicked = false;
    let mut reload_clicked = false;

    egui::Window::new("Admin Settings")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            ui.strong("FTC API credentials");
            egui::Grid::new("credentials_grid")
                .num_columns(2)
                .spacing([12.0, 6.0])
                .show(ui, |ui| {
                    ui.label("Username");
                    ui.add(egui::TextEdit::singleline(&mut app.admin.username).hint_text("FTC API username"));
                    ui.end_row();

                    ui.label("Auth key");
                    ui.horizontal(|ui| {
                        ui.add(
                            egui::TextEdit::singleline(&mut app.admin.auth_key)
                                .password(!app.admin.show_auth_key)
                                .hint_text("Auth key"),
                        );
                        ui.checkbox(&mut app.admin.show_auth_key, "Show");
                    });
                    ui.end_row();
                });

            ui.horizontal(|ui| {
                let busy = app.admin.is_validating();
                if ui.add_enabled(!busy, egui::Button::new("Save")).clicked() {
                    save_clicked = true;
                }
                if ui.add_enabled(!busy, egui::Button::new("Clear")).clicked() {
                    clear_clicked = true;
                }
                if busy {
                    ui.spinner();
                }
            });

            if let Some((ok, message)) = &app.admin.message {
                let color = if *ok { egui::Color32::LIGHT_GREEN } else { egui::Color32::LIGHT_RED };
                ui.colored_label(color, message);
            }

            ui.separator();
            ui.strong("Event");
            egui::Grid::new("event_grid")
                .num_columns(2)
                .spacing([12.0, 6.0])
                .show(ui, |ui| {
                    ui.label("API base URL");
                    ui.text_edit_singleline(&mut app.config.api_base_url);
                    ui.end_row();

                    ui.label("Season");
                    ui.add(egui::DragValue::new(&mut app.config.season).range(2019..=2100));
                    ui.end_row();

                    ui.label("Event code");
                    ui.text_edit_singleline(&mut app.config.event_code);
                    ui.end_row();
                });
            if ui.button("Reload teams").clicked() {
                reload_clicked = true;
            }

            ui.separator();
            ui.strong("Scouting data");
            ui.label(format!("{} teams with saved data", app.store().len()));
            ui.horizontal(|ui| {
                if ui.button("Export JSON").clicked() {
                    app.export_scouting_data(ctx);
                }
                if ui.button("Import JSON").clicked() {
                    app.files.import_scouting_data(ctx);
                }
                if ui.button("Clear all").clicked() {
                    app.admin.confirm_clear_all = true;
                }
            });

            if app.admin.confirm_clear_all {
                ui.colored_label(egui::Color32::LIGHT_RED, "Delete every drawing and note?");
                ui.horizontal(|ui| {
                    if ui.button("Delete everything").clicked() {
                        app.clear_all_data();
                        app.admin.confirm_clear_all = false;
                    }
                    if ui.button("Cancel").clicked() {
                        app.admin.confirm_clear_all = false;
                    }
                });
            }
        });

    if save_clicked {
        let client = ApiClient::from_config(app.config());
        let event_code = app.config().event_code.clone();
        app.admin.start_validation(ctx, client, event_code);
    }

    if clear_clicked {
        log::info!("Cleared API credentials");
        app.credentials = Credentials::default();
        app.admin.username.clear();
        app.admin.auth_key.clear();
        app.admin.message = Some((true, "Credentials cleared".to_owned()));
    }

    if reload_clicked {
        app.config.event_code = app.config.event_code.trim().to_uppercase();
        app.teams.teams.clear();
        app.refresh_teams(ctx);
    }

    if !open {
        app.admin.open = false;
        app.admin.confirm_clear_all = false;
    }
}
