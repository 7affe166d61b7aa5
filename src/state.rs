use egui::Pos2;

use crate::stroke::{Stroke, StrokeBuilder};
use crate::tool::ToolState;

/// Gesture state of one canvas.
///
/// ```text
///            pointer-down
///   ┌──────┐ ───────────► ┌─────────┐ ──┐
///   │ Idle │              │ Drawing │   │ pointer-move
///   └──────┘ ◄─────────── └─────────┘ ◄─┘
///         pointer-up / pointer-leave
/// ```
#[derive(Debug, Default)]
pub enum InputSession {
    #[default]
    Idle,
    Drawing {
        stroke: StrokeBuilder,
    },
}

impl InputSession {
    pub fn is_drawing(&self) -> bool {
        matches!(self, Self::Drawing { .. })
    }

    /// Points recorded so far in the active gesture
    pub fn points(&self) -> &[Pos2] {
        match self {
            Self::Drawing { stroke } => stroke.points(),
            Self::Idle => &[],
        }
    }

    /// Start a gesture. An unfinished gesture is dropped.
    pub fn pointer_down(&mut self, position: Pos2) {
        if self.is_drawing() {
            log::debug!("Pointer down during a gesture; discarding unfinished stroke");
        }
        *self = Self::Drawing {
            stroke: StrokeBuilder::new(position),
        };
    }

    /// Record a point. Returns the segment to paint as live feedback.
    pub fn pointer_move(&mut self, position: Pos2) -> Option<(Pos2, Pos2)> {
        let Self::Drawing { stroke } = self else {
            return None;
        };
        let previous = stroke.last_point();
        stroke.add_point(position);
        previous.map(|from| (from, position))
    }

    /// End the gesture, finalizing the stroke with the current tool.
    ///
    /// Returns `None` (and changes nothing) when no gesture was active.
    pub fn pointer_up(&mut self, tool: &ToolState) -> Option<Stroke> {
        match std::mem::take(self) {
            Self::Drawing { stroke } => stroke.finish(tool),
            Self::Idle => None,
        }
    }
}
