#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod config;
pub mod error;
pub mod file_handler;
pub mod ftc_api;
pub mod history;
pub mod input;
pub mod panels;
pub mod persistence;
pub mod renderer;
pub mod session;
pub mod state;
pub mod storage;
pub mod stroke;
pub mod task;
pub mod tool;

pub use app::ScoutApp;
pub use config::{CanvasConfig, ScoutConfig};
pub use error::{CanvasError, CanvasResult};
pub use history::{StrokeHistory, StrokeList};
pub use input::{CanvasMapping, InputEvent, InputHandler};
pub use persistence::{SaveQueue, SaveStatus};
pub use renderer::Renderer;
pub use session::{CanvasSession, SessionId};
pub use state::InputSession;
pub use storage::{ScoutingStore, SnapshotRecord, SnapshotStore, StorageError, TeamNumber};
pub use stroke::{Stroke, StrokeBuilder, StrokeRef};
pub use tool::{Tool, ToolState};
