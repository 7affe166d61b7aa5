use chrono::{DateTime, Duration, Utc};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use tiny_skia::{ColorU8, IntSize, Pixmap};

use crate::error::{CanvasError, CanvasResult};
use crate::storage::{SnapshotStore, StorageError, TeamNumber};

/// Attempts made to deliver one save before giving up on it
pub const MAX_SAVE_ATTEMPTS: u32 = 3;
/// Delay before retry `n` is `n` times this many seconds
pub const RETRY_BACKOFF_SECS: f64 = 0.5;

/// PNG compression effort
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeQuality {
    /// Used for the frequent auto-saves
    Fast,
    /// Used for user exports
    Best,
}

/// An encoded drawing ready to be written to a user-chosen file
#[derive(Debug, Clone)]
pub struct ExportedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub fn export_file_name(team: TeamNumber) -> String {
    format!("team-{}-scouting.png", team)
}

/// Decode any supported raster format into a premultiplied surface
pub fn decode_raster(bytes: &[u8]) -> CanvasResult<Pixmap> {
    let image = image::load_from_memory(bytes).map_err(CanvasError::Decode)?;
    log::debug!("Decoded image: {}x{}", image.width(), image.height());
    pixmap_from_image(&image)
}

pub fn pixmap_from_image(image: &image::DynamicImage) -> CanvasResult<Pixmap> {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let size = IntSize::from_wh(width, height).ok_or(CanvasError::InvalidSize { width, height })?;

    let data: Vec<u8> = rgba
        .pixels()
        .flat_map(|pixel| {
            let [r, g, b, a] = pixel.0;
            let premultiplied = ColorU8::from_rgba(r, g, b, a).premultiply();
            [
                premultiplied.red(),
                premultiplied.green(),
                premultiplied.blue(),
                premultiplied.alpha(),
            ]
        })
        .collect();

    Pixmap::from_vec(data, size).ok_or(CanvasError::InvalidSize { width, height })
}

/// Encode a surface as PNG with straight (non-premultiplied) alpha
pub fn encode_png(pixmap: &Pixmap, quality: EncodeQuality) -> CanvasResult<Vec<u8>> {
    let rgba: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|pixel| {
            let color = pixel.demultiply();
            [color.red(), color.green(), color.blue(), color.alpha()]
        })
        .collect();

    let (compression, filter) = match quality {
        EncodeQuality::Fast => (CompressionType::Fast, FilterType::Sub),
        EncodeQuality::Best => (CompressionType::Best, FilterType::Adaptive),
    };

    let mut bytes = Vec::new();
    PngEncoder::new_with_quality(&mut bytes, compression, filter)
        .write_image(&rgba, pixmap.width(), pixmap.height(), ExtendedColorType::Rgba8)
        .map_err(CanvasError::Encode)?;
    Ok(bytes)
}

/// Progress of a session's auto-save, shown next to the canvas
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    Pending,
    Saved { at: DateTime<Utc> },
    Failed { message: String },
}

#[derive(Debug, Clone)]
struct SaveRequest {
    team: TeamNumber,
    raster: Vec<u8>,
    due_at: f64,
    attempts: u32,
}

/// Single-slot queue of the latest surface waiting to be stored.
///
/// Scheduling replaces whatever was pending, so only the most recent
/// surface is ever written, and deliveries can never overtake each other.
#[derive(Debug, Default)]
pub struct SaveQueue {
    pending: Option<SaveRequest>,
    last_saved_at: Option<DateTime<Utc>>,
    status: SaveStatus,
}

impl SaveQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `raster` for delivery at `due_at` (seconds, same clock as `poll`)
    pub fn schedule(&mut self, team: TeamNumber, raster: Vec<u8>, due_at: f64) {
        if self.pending.is_some() {
            log::debug!("Replacing pending save for team {}", team);
        }
        self.pending = Some(SaveRequest {
            team,
            raster,
            due_at,
            attempts: 0,
        });
        self.status = SaveStatus::Pending;
    }

    /// Continue the timestamp sequence of a drawing saved by an earlier session
    pub fn resume_after(&mut self, last_saved_at: DateTime<Utc>) {
        self.last_saved_at = Some(last_saved_at);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending save wants to be delivered
    pub fn next_due(&self) -> Option<f64> {
        self.pending.as_ref().map(|request| request.due_at)
    }

    pub fn status(&self) -> &SaveStatus {
        &self.status
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    /// Deliver the pending save if it is due.
    ///
    /// Returns `None` when nothing was attempted.
    pub fn poll(
        &mut self,
        now: f64,
        store: &mut dyn SnapshotStore,
        notes: &str,
    ) -> Option<Result<DateTime<Utc>, StorageError>> {
        if self.next_due()? > now {
            return None;
        }
        let request = self.pending.take()?;
        Some(self.deliver(request, now, store, notes))
    }

    /// Deliver the pending save right away, ignoring its due time
    pub fn flush(
        &mut self,
        now: f64,
        store: &mut dyn SnapshotStore,
        notes: &str,
    ) -> Option<Result<DateTime<Utc>, StorageError>> {
        let request = self.pending.take()?;
        Some(self.deliver(request, now, store, notes))
    }

    fn deliver(
        &mut self,
        mut request: SaveRequest,
        now: f64,
        store: &mut dyn SnapshotStore,
        notes: &str,
    ) -> Result<DateTime<Utc>, StorageError> {
        let timestamp = self.next_timestamp();
        match store.save_snapshot(request.team, &request.raster, notes, timestamp) {
            Ok(()) => {
                log::debug!(
                    "Saved drawing for team {} ({} bytes)",
                    request.team,
                    request.raster.len()
                );
                self.last_saved_at = Some(timestamp);
                self.status = SaveStatus::Saved { at: timestamp };
                Ok(timestamp)
            }
            Err(err) => {
                request.attempts += 1;
                if request.attempts < MAX_SAVE_ATTEMPTS {
                    log::error!(
                        "Saving drawing for team {} failed (attempt {}/{}): {}",
                        request.team,
                        request.attempts,
                        MAX_SAVE_ATTEMPTS,
                        err
                    );
                    request.due_at = now + RETRY_BACKOFF_SECS * request.attempts as f64;
                    self.pending = Some(request);
                    self.status = SaveStatus::Pending;
                } else {
                    log::error!(
                        "Giving up on saving drawing for team {}: {}",
                        request.team,
                        err
                    );
                    self.status = SaveStatus::Failed {
                        message: err.to_string(),
                    };
                }
                Err(err)
            }
        }
    }

    /// Wall-clock time, bumped so that it is strictly after the previous save
    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.last_saved_at {
            Some(last) if now <= last => last + Duration::milliseconds(1),
            _ => now,
        }
    }
}
