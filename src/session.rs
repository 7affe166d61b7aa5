use chrono::{DateTime, Utc};
use std::sync::Arc;
use tiny_skia::Pixmap;
use uuid::Uuid;

use crate::config::CanvasConfig;
use crate::error::CanvasResult;
use crate::history::{StrokeHistory, StrokeList};
use crate::input::InputEvent;
use crate::persistence::{self, EncodeQuality, ExportedImage, SaveQueue, SaveStatus};
use crate::renderer::{Renderer, Underlay};
use crate::state::InputSession;
use crate::storage::{SnapshotRecord, SnapshotStore, StorageError, TeamNumber};
use crate::tool::{Tool, ToolState};
use egui::{Color32, Pos2};

pub type SessionId = Uuid;

/// Everything one team's annotation canvas owns.
///
/// Sessions never share state, so several can be open side by side. Dropping
/// a session discards its strokes and history; the stored snapshot is what
/// the next session for the team starts from.
#[derive(Debug)]
pub struct CanvasSession {
    id: SessionId,
    team: TeamNumber,
    tool: ToolState,
    strokes: StrokeList,
    history: StrokeHistory,
    input: InputSession,
    background: Option<Pixmap>,
    prior_snapshot: Option<Pixmap>,
    renderer: Renderer,
    saves: SaveQueue,
    auto_save_delay: f64,
    dirty: bool,
}

impl CanvasSession {
    pub fn new(team: TeamNumber, config: &CanvasConfig) -> CanvasResult<Self> {
        let session = Self {
            id: Uuid::new_v4(),
            team,
            tool: ToolState::default(),
            strokes: StrokeList::new(),
            history: StrokeHistory::new(),
            input: InputSession::default(),
            background: None,
            prior_snapshot: None,
            renderer: Renderer::new(config.width, config.height)?,
            saves: SaveQueue::new(),
            auto_save_delay: config.auto_save_delay_secs.max(0.0),
            dirty: true,
        };
        log::debug!("Opened canvas session {} for team {}", session.id, team);
        Ok(session)
    }

    /// Open a session for `team`, starting from whatever the store holds.
    ///
    /// Storage and decode problems are logged and the canvas starts blank.
    pub fn open(
        team: TeamNumber,
        config: &CanvasConfig,
        store: &dyn SnapshotStore,
    ) -> CanvasResult<(Self, String)> {
        let mut session = Self::new(team, config)?;
        let notes = match store.load_snapshot(team) {
            Ok(Some(record)) => {
                session.restore(&record);
                record.notes
            }
            Ok(None) => String::new(),
            Err(err) => {
                log::error!("Failed to load scouting data for team {}: {}", team, err);
                String::new()
            }
        };
        Ok((session, notes))
    }

    /// Paint a stored snapshot beneath any new strokes
    pub fn restore(&mut self, record: &SnapshotRecord) {
        self.saves.resume_after(record.last_modified);
        if let Some(raster) = &record.raster {
            self.load_initial(raster);
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn team(&self) -> TeamNumber {
        self.team
    }

    pub fn tool(&self) -> &ToolState {
        &self.tool
    }

    /// Tool changes apply from the next gesture on
    pub fn set_tool(&mut self, tool: Tool) {
        self.tool.set_tool(tool);
    }

    pub fn set_color(&mut self, color: Color32) {
        self.tool.set_color(color);
    }

    pub fn set_stroke_width(&mut self, width: u32) {
        self.tool.set_stroke_width(width);
    }

    pub fn strokes(&self) -> &StrokeList {
        &self.strokes
    }

    pub fn history(&self) -> &StrokeHistory {
        &self.history
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn is_drawing(&self) -> bool {
        self.input.is_drawing()
    }

    pub fn has_background(&self) -> bool {
        self.background.is_some()
    }

    pub fn has_prior_snapshot(&self) -> bool {
        self.prior_snapshot.is_some()
    }

    pub fn save_status(&self) -> &SaveStatus {
        self.saves.status()
    }

    /// When the next auto-save wants to run, for scheduling a repaint
    pub fn next_save_due(&self) -> Option<f64> {
        self.saves.next_due()
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.saves.last_saved_at()
    }

    /// True once after every change to the surface
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Feed one input event. `now` is in seconds on the UI clock.
    pub fn handle_event(&mut self, event: InputEvent, now: f64) {
        match event {
            InputEvent::PointerDown { position } => self.pointer_down(position),
            InputEvent::PointerMove { position } => self.pointer_move(position),
            InputEvent::PointerUp | InputEvent::PointerLeave => {
                self.pointer_up(now);
            }
        }
    }

    pub fn pointer_down(&mut self, position: Pos2) {
        self.input.pointer_down(position);
    }

    pub fn pointer_move(&mut self, position: Pos2) {
        if let Some((from, to)) = self.input.pointer_move(position) {
            self.renderer.draw_segment(from, to, &self.tool);
            self.dirty = true;
        }
    }

    /// Finish the gesture. Returns true when a stroke was committed.
    pub fn pointer_up(&mut self, now: f64) -> bool {
        let Some(stroke) = self.input.pointer_up(&self.tool) else {
            return false;
        };
        log::debug!(
            "Committed {} stroke with {} points on team {}",
            if stroke.is_eraser() { "eraser" } else { "pen" },
            stroke.points().len(),
            self.team
        );

        self.strokes.push(Arc::new(stroke));
        self.history.push(self.strokes.clone());
        self.repaint();
        self.schedule_save(now + self.auto_save_delay);
        true
    }

    /// Returns false when there was nothing to undo
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        self.strokes = snapshot.clone();
        self.repaint();
        true
    }

    /// Returns false when there was nothing to redo
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        self.strokes = snapshot.clone();
        self.repaint();
        true
    }

    /// Wipe the drawing, including a restored snapshot, and save right away.
    ///
    /// Cannot be undone; callers confirm with the user first.
    pub fn clear(&mut self, now: f64) {
        log::info!("Clearing drawing for team {}", self.team);
        self.input = InputSession::Idle;
        self.strokes.clear();
        self.history.clear();
        self.prior_snapshot = None;
        self.repaint();
        self.schedule_save(now);
    }

    /// Paint a previously saved raster as the static base of the drawing.
    ///
    /// It is not part of the stroke list, so undo cannot remove it. Returns
    /// false (and leaves the canvas blank) if the bytes do not decode.
    pub fn load_initial(&mut self, raster: &[u8]) -> bool {
        match persistence::decode_raster(raster) {
            Ok(snapshot) => {
                self.prior_snapshot = Some(snapshot);
                self.repaint();
                true
            }
            Err(err) => {
                log::warn!(
                    "Stored drawing for team {} could not be decoded, starting blank: {}",
                    self.team,
                    err
                );
                false
            }
        }
    }

    /// Install a user supplied image beneath the grid and strokes.
    ///
    /// On failure the previous background stays in place.
    pub fn import_background(&mut self, bytes: &[u8]) -> CanvasResult<()> {
        let image = persistence::decode_raster(bytes)?;
        log::info!(
            "Installed {}x{} background on team {}",
            image.width(),
            image.height(),
            self.team
        );
        self.background = Some(image);
        self.repaint();
        Ok(())
    }

    /// Encode the canvas at full quality for download
    pub fn export(&self) -> CanvasResult<ExportedImage> {
        Ok(ExportedImage {
            file_name: persistence::export_file_name(self.team),
            bytes: persistence::encode_png(self.renderer.pixmap(), EncodeQuality::Best)?,
        })
    }

    /// Deliver the pending auto-save if it is due
    pub fn poll_saves(
        &mut self,
        now: f64,
        store: &mut dyn SnapshotStore,
        notes: &str,
    ) -> Option<Result<DateTime<Utc>, StorageError>> {
        self.saves.poll(now, store, notes)
    }

    /// Deliver the pending auto-save immediately, e.g. before closing the session
    pub fn flush_saves(
        &mut self,
        now: f64,
        store: &mut dyn SnapshotStore,
        notes: &str,
    ) -> Option<Result<DateTime<Utc>, StorageError>> {
        self.saves.flush(now, store, notes)
    }

    fn schedule_save(&mut self, due_at: f64) {
        match persistence::encode_png(self.renderer.pixmap(), EncodeQuality::Fast) {
            Ok(raster) => self.saves.schedule(self.team, raster, due_at),
            Err(err) => log::error!("Failed to encode drawing for team {}: {}", self.team, err),
        }
    }

    fn repaint(&mut self) {
        let underlay = Underlay {
            background: self.background.as_ref(),
            prior_snapshot: self.prior_snapshot.as_ref(),
        };
        self.renderer.repaint(underlay, &self.strokes);
        self.dirty = true;
    }
}
