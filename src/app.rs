use crate::config::ScoutConfig;
use crate::file_handler::{FileEvent, FileHandler};
use crate::ftc_api::{self, ApiClient, ApiResult, Credentials, TeamWithRanking};
use crate::input::InputHandler;
use crate::panels;
use crate::session::CanvasSession;
use crate::storage::{ScoutingStore, TeamNumber};
use crate::task::{BackgroundTask, TaskPoll};

/// Event team list and the fetch that refreshes it
#[derive(Debug, Default)]
pub struct TeamsState {
    pub teams: Vec<TeamWithRanking>,
    pub search: String,
    pub error: Option<String>,
    loading: Option<BackgroundTask<ApiResult<Vec<TeamWithRanking>>>>,
}

impl TeamsState {
    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub fn find(&self, team: TeamNumber) -> Option<&TeamWithRanking> {
        self.teams.iter().find(|entry| entry.team.team_number == team)
    }
}

/// The open team page: its canvas session and the notes being edited
pub struct TeamView {
    pub session: CanvasSession,
    pub notes: String,
    pub texture: Option<egui::TextureHandle>,
    pub input: InputHandler,
    pub confirm_clear: bool,
}

impl std::fmt::Debug for TeamView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeamView")
            .field("session", &self.session)
            .field("notes", &self.notes)
            .field("has_texture", &self.texture.is_some())
            .field("input", &self.input)
            .field("confirm_clear", &self.confirm_clear)
            .finish()
    }
}

/// We derive Deserialize/Serialize so we can persist app state on shutdown.
#[derive(serde::Deserialize, serde::Serialize, Debug)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
pub struct ScoutApp {
    pub(crate) config: ScoutConfig,
    pub(crate) credentials: Credentials,
    pub(crate) store: ScoutingStore,

    #[serde(skip)]
    pub(crate) teams: TeamsState,
    #[serde(skip)]
    pub(crate) view: Option<TeamView>,
    #[serde(skip)]
    pub(crate) admin: panels::AdminState,
    #[serde(skip)]
    pub(crate) files: FileHandler,
    #[serde(skip)]
    pub(crate) status_message: Option<String>,
    /// UI clock of the latest frame, in seconds
    #[serde(skip)]
    clock: f64,
    /// Set when the store changed and has not been written to disk yet
    #[serde(skip)]
    unsaved_store: bool,
}

impl Default for ScoutApp {
    fn default() -> Self {
        Self {
            config: ScoutConfig::default(),
            credentials: Credentials::default(),
            store: ScoutingStore::default(),
            teams: TeamsState::default(),
            view: None,
            admin: panels::AdminState::default(),
            files: FileHandler::new(),
            status_message: None,
            clock: 0.0,
            unsaved_store: false,
        }
    }
}

impl ScoutApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut app: Self = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();

        app.config.apply_env_overrides();
        app.store.set_quota(app.config.canvas.storage_quota_bytes);
        log::info!(
            "Loaded {} scouting records; event {} season {}",
            app.store.len(),
            app.config.event_code,
            app.config.season
        );

        if app.credentials.is_complete() {
            app.refresh_teams(&cc.egui_ctx);
        }
        app
    }

    pub fn config(&self) -> &ScoutConfig {
        &self.config
    }

    pub fn store(&self) -> &ScoutingStore {
        &self.store
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn refresh_teams(&mut self, ctx: &egui::Context) {
        if self.teams.is_loading() {
            return;
        }
        let client = ApiClient::from_config(&self.config);
        let credentials = self.credentials.clone();
        let event_code = self.config.event_code.clone();
        log::info!("Fetching teams for {}", event_code);

        self.teams.error = None;
        self.teams.loading = Some(BackgroundTask::spawn("fetch teams", ctx, move || {
            client.fetch_teams_with_rankings(&credentials, &event_code)
        }));
    }

    /// Open the team page, flushing any save the previous page still owes
    pub fn open_team(&mut self, team: TeamNumber) {
        self.close_team();
        match CanvasSession::open(team, &self.config.canvas, &self.store) {
            Ok((session, notes)) => {
                log::info!("Opened team {}", team);
                self.view = Some(TeamView {
                    session,
                    notes,
                    texture: None,
                    input: InputHandler::new(),
                    confirm_clear: false,
                });
            }
            Err(err) => {
                log::error!("Could not open canvas for team {}: {}", team, err);
                self.set_status(format!("Could not open canvas: {}", err));
            }
        }
    }

    pub fn close_team(&mut self) {
        let Some(mut view) = self.view.take() else {
            return;
        };
        match view.session.flush_saves(self.clock, &mut self.store, &view.notes) {
            Some(Ok(_)) => self.unsaved_store = true,
            Some(Err(err)) => {
                self.status_message = Some(format!("Drawing for team {} was not saved: {}", view.session.team(), err));
            }
            None => {}
        }
    }

    /// Store the open team's notes without touching its drawing
    pub fn save_notes(&mut self) {
        let Some(view) = &self.view else {
            return;
        };
        let team = view.session.team();
        match self.store.save_notes(team, &view.notes, chrono::Utc::now()) {
            Ok(()) => {
                log::info!("Saved notes for team {}", team);
                self.unsaved_store = true;
                self.set_status(format!("Notes saved for team {}", team));
            }
            Err(err) => {
                log::error!("Failed to save notes for team {}: {}", team, err);
                self.set_status(format!("Notes not saved: {}", err));
            }
        }
    }

    pub fn import_background(&mut self, name: &str, bytes: &[u8]) {
        let Some(view) = &mut self.view else {
            log::warn!("Ignoring image {}: no team page is open", name);
            return;
        };
        if let Err(err) = view.session.import_background(bytes) {
            log::error!("Failed to import background {}: {}", name, err);
            self.set_status(format!("Could not load {}: {}", name, err));
        }
    }

    pub fn export_drawing(&mut self, ctx: &egui::Context) {
        let Some(view) = &self.view else {
            return;
        };
        match view.session.export() {
            Ok(image) => self.files.save_export(ctx, image),
            Err(err) => {
                log::error!("Export failed: {}", err);
                self.set_status(format!("Export failed: {}", err));
            }
        }
    }

    pub fn export_scouting_data(&mut self, ctx: &egui::Context) {
        match self.store.export_json() {
            Ok(json) => self.files.export_scouting_data(ctx, json),
            Err(err) => self.set_status(format!("Export failed: {}", err)),
        }
    }

    fn import_scouting_data(&mut self, bytes: &[u8]) {
        let result = std::str::from_utf8(bytes)
            .map_err(|err| err.to_string())
            .and_then(|json| self.store.import_json(json).map_err(|err| err.to_string()));
        match result {
            Ok(count) => {
                log::info!("Imported {} scouting records", count);
                self.unsaved_store = true;
                self.set_status(format!("Imported {} scouting records", count));
                // Reload the open page from the imported records
                if let Some(team) = self.view.as_ref().map(|view| view.session.team()) {
                    self.view = None;
                    self.open_team(team);
                }
            }
            Err(err) => {
                log::error!("Scouting data import rejected: {}", err);
                self.set_status(format!("Import failed: {}", err));
            }
        }
    }

    /// Drop every stored record and the open page's unsaved work
    pub fn clear_all_data(&mut self) {
        log::warn!("Clearing all {} scouting records", self.store.len());
        let team = self.view.take().map(|view| view.session.team());
        self.store.clear_all();
        self.unsaved_store = true;
        if let Some(team) = team {
            self.open_team(team);
        }
    }

    fn poll_tasks(&mut self, ctx: &egui::Context) {
        if let Some(task) = &mut self.teams.loading {
            match task.poll() {
                TaskPoll::Pending => {}
                TaskPoll::Ready(Ok(mut teams)) => {
                    ftc_api::sort_by_rank(&mut teams);
                    log::info!("Loaded {} teams", teams.len());
                    self.teams.teams = teams;
                    self.teams.loading = None;
                }
                TaskPoll::Ready(Err(err)) => {
                    log::error!("Failed to load teams: {}", err);
                    self.teams.error = Some(err.to_string());
                    self.teams.loading = None;
                }
                TaskPoll::Lost => {
                    self.teams.error = Some("Team fetch stopped unexpectedly".to_owned());
                    self.teams.loading = None;
                }
            }
        }

        if let Some(credentials) = self.admin.poll_validation() {
            self.credentials = credentials;
            self.teams.teams.clear();
            self.refresh_teams(ctx);
        }

        for event in self.files.poll() {
            match event {
                FileEvent::BackgroundChosen(file) => self.import_background(&file.name, &file.bytes),
                FileEvent::ScoutingDataChosen(file) => self.import_scouting_data(&file.bytes),
                FileEvent::Written(path) => self.set_status(format!("Saved {}", path.display())),
                FileEvent::Failed(message) => self.set_status(message),
            }
        }
    }

    fn poll_saves(&mut self, ctx: &egui::Context) {
        let Some(view) = &mut self.view else {
            return;
        };
        match view.session.poll_saves(self.clock, &mut self.store, &view.notes) {
            Some(Ok(_)) => self.unsaved_store = true,
            Some(Err(err)) => log::warn!("Auto-save for team {} failed: {}", view.session.team(), err),
            None => {}
        }
        if let Some(due) = view.session.next_save_due() {
            let wait = (due - self.clock).max(0.0);
            ctx.request_repaint_after(std::time::Duration::from_secs_f64(wait));
        }
    }

    /// Write the app state to disk if the store changed since the last write.
    ///
    /// Runs every frame, so a drawing reported as saved is already on disk.
    fn persist_store(&mut self, storage: &mut dyn eframe::Storage) -> bool {
        if !std::mem::take(&mut self.unsaved_store) {
            return false;
        }
        eframe::set_value(storage, eframe::APP_KEY, self);
        storage.flush();
        log::debug!("Wrote {} scouting records to disk", self.store.len());
        true
    }
}

impl eframe::App for ScoutApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        if let Some(view) = &mut self.view {
            if let Some(Err(err)) = view.session.flush_saves(self.clock, &mut self.store, &view.notes) {
                log::error!("Drawing for team {} was not saved: {}", view.session.team(), err);
            }
        }
        self.unsaved_store = false;
        eframe::set_value(storage, eframe::APP_KEY, self);
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        self.clock = ctx.input(|i| i.time);

        self.poll_tasks(ctx);
        for file in self.files.check_for_dropped_files(ctx) {
            self.import_background(&file.name, &file.bytes);
        }

        panels::top_bar(self, ctx);
        panels::admin_window(self, ctx);

        if self.view.is_some() {
            panels::tools_panel(self, ctx);
            panels::notes_panel(self, ctx);
            panels::central_panel(self, ctx);
        } else {
            panels::team_list(self, ctx);
        }

        self.poll_saves(ctx);
        if let Some(storage) = frame.storage_mut() {
            self.persist_store(storage);
        }
    }
}
