use std::path::{Path, PathBuf};

use crate::persistence::ExportedImage;
use crate::task::{BackgroundTask, TaskPoll};

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];
pub const SCOUTING_DATA_FILE_NAME: &str = "ftc-scouting-data.json";

/// A file the user handed us, already read into memory
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Outcome of a file dialog
#[derive(Debug)]
pub enum FileEvent {
    BackgroundChosen(LoadedFile),
    ScoutingDataChosen(LoadedFile),
    Written(PathBuf),
    Failed(String),
}

/// Drag-and-drop and native file dialogs.
///
/// Dialogs run on worker threads; `poll` collects whatever has finished.
#[derive(Debug, Default)]
pub struct FileHandler {
    pending: Vec<BackgroundTask<Option<FileEvent>>>,
}

impl FileHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a dialog is open
    pub fn is_busy(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Images dropped onto the window this frame
    pub fn check_for_dropped_files(&self, ctx: &egui::Context) -> Vec<LoadedFile> {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());

        dropped
            .iter()
            .filter_map(|file| {
                let file_name = display_name(file);
                if !is_image_file(file) {
                    log::warn!("Dropped file is not a supported type: {}", file_name);
                    return None;
                }
                read_dropped_file(file, file_name)
            })
            .collect()
    }

    /// Ask the user for a background image
    pub fn pick_background(&mut self, ctx: &egui::Context) {
        self.pending.push(BackgroundTask::spawn("pick background", ctx, || {
            let handle = futures::executor::block_on(
                rfd::AsyncFileDialog::new()
                    .set_title("Import background image")
                    .add_filter("Images", IMAGE_EXTENSIONS)
                    .pick_file(),
            )?;
            Some(read_picked(handle).map_or_else(FileEvent::Failed, FileEvent::BackgroundChosen))
        }));
    }

    /// Ask where to write an exported drawing
    pub fn save_export(&mut self, ctx: &egui::Context, image: ExportedImage) {
        self.pending.push(BackgroundTask::spawn("save export", ctx, move || {
            let handle = futures::executor::block_on(
                rfd::AsyncFileDialog::new()
                    .set_title("Export drawing")
                    .set_file_name(image.file_name.as_str())
                    .add_filter("PNG image", &["png"])
                    .save_file(),
            )?;
            Some(write_file(handle.path(), &image.bytes))
        }));
    }

    /// Ask where to write a backup of all scouting records
    pub fn export_scouting_data(&mut self, ctx: &egui::Context, json: String) {
        self.pending.push(BackgroundTask::spawn("export scouting data", ctx, move || {
            let handle = futures::executor::block_on(
                rfd::AsyncFileDialog::new()
                    .set_title("Export scouting data")
                    .set_file_name(SCOUTING_DATA_FILE_NAME)
                    .add_filter("JSON", &["json"])
                    .save_file(),
            )?;
            Some(write_file(handle.path(), json.as_bytes()))
        }));
    }

    /// Ask for a scouting data backup to restore
    pub fn import_scouting_data(&mut self, ctx: &egui::Context) {
        self.pending.push(BackgroundTask::spawn("import scouting data", ctx, || {
            let handle = futures::executor::block_on(
                rfd::AsyncFileDialog::new()
                    .set_title("Import scouting data")
                    .add_filter("JSON", &["json"])
                    .pick_file(),
            )?;
            Some(read_picked(handle).map_or_else(FileEvent::Failed, FileEvent::ScoutingDataChosen))
        }));
    }

    /// Finished dialogs, in no particular order. Cancelled dialogs yield nothing.
    pub fn poll(&mut self) -> Vec<FileEvent> {
        let mut events = Vec::new();
        self.pending.retain_mut(|task| match task.poll() {
            TaskPoll::Pending => true,
            TaskPoll::Ready(event) => {
                if event.is_none() {
                    log::debug!("Dialog cancelled: {}", task.label());
                }
                events.extend(event);
                false
            }
            TaskPoll::Lost => {
                events.push(FileEvent::Failed(format!("{} did not finish", task.label())));
                false
            }
        });
        events
    }
}

/// Check if a file is an image based on MIME type or extension
pub fn is_image_file(file: &egui::DroppedFile) -> bool {
    if !file.mime.is_empty() {
        file.mime.starts_with("image/")
    } else if let Some(path) = &file.path {
        has_image_extension(path)
    } else {
        has_image_extension(Path::new(&file.name))
    }
}

pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

fn display_name(file: &egui::DroppedFile) -> String {
    if let Some(path) = &file.path {
        path.display().to_string()
    } else if !file.name.is_empty() {
        file.name.clone()
    } else {
        "unknown".to_owned()
    }
}

fn read_dropped_file(file: &egui::DroppedFile, name: String) -> Option<LoadedFile> {
    if let Some(bytes) = &file.bytes {
        log::info!("Processing image from memory: {} ({} bytes)", name, bytes.len());
        return Some(LoadedFile {
            name,
            bytes: bytes.to_vec(),
        });
    }

    let path = file.path.as_ref()?;
    log::info!("Processing image from path: {}", path.display());
    match std::fs::read(path) {
        Ok(bytes) => Some(LoadedFile { name, bytes }),
        Err(err) => {
            log::error!("Failed to read image file: {}: {}", path.display(), err);
            None
        }
    }
}

fn read_picked(handle: rfd::FileHandle) -> Result<LoadedFile, String> {
    let path = handle.path();
    std::fs::read(path)
        .map(|bytes| LoadedFile {
            name: handle.file_name(),
            bytes,
        })
        .map_err(|err| {
            log::error!("Failed to read {}: {}", path.display(), err);
            format!("Could not read {}: {}", path.display(), err)
        })
}

fn write_file(path: &Path, bytes: &[u8]) -> FileEvent {
    match std::fs::write(path, bytes) {
        Ok(()) => {
            log::info!("Wrote {} bytes to {}", bytes.len(), path.display());
            FileEvent::Written(path.to_path_buf())
        }
        Err(err) => {
            log::error!("Failed to write {}: {}", path.display(), err);
            FileEvent::Failed(format!("Could not write {}: {}", path.display(), err))
        }
    }
}
