use egui::{Color32, Pos2};
use std::sync::Arc;

use crate::tool::ToolState;

// Immutable stroke for sharing
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    points: Vec<Pos2>,
    color: Color32,
    width: u32,
    is_eraser: bool,
}

// Accumulator for the stroke being drawn
#[derive(Clone, Debug, Default)]
pub struct StrokeBuilder {
    points: Vec<Pos2>,
}

// Committed strokes are shared between the live list and history snapshots
pub type StrokeRef = Arc<Stroke>;

impl Stroke {
    pub fn new(points: Vec<Pos2>, color: Color32, width: u32, is_eraser: bool) -> Self {
        Self {
            points,
            color,
            width: width.max(1),
            is_eraser,
        }
    }

    /// Create a stroke carrying a copy of the tool state.
    ///
    /// Eraser strokes always use the eraser ink and width, whatever pen
    /// colour and width are selected.
    pub fn from_tool(points: Vec<Pos2>, tool: &ToolState) -> Self {
        Self::new(points, tool.ink_color(), tool.ink_width(), tool.is_eraser())
    }

    pub fn new_ref(points: Vec<Pos2>, color: Color32, width: u32, is_eraser: bool) -> StrokeRef {
        Arc::new(Self::new(points, color, width, is_eraser))
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn is_eraser(&self) -> bool {
        self.is_eraser
    }

    /// Strokes need at least two points to produce a visible line.
    pub fn is_renderable(&self) -> bool {
        self.points.len() >= 2
    }
}

impl StrokeBuilder {
    pub fn new(first: Pos2) -> Self {
        Self {
            points: vec![first],
        }
    }

    pub fn add_point(&mut self, point: Pos2) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn last_point(&self) -> Option<Pos2> {
        self.points.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Finalize into an immutable stroke. Returns `None` when no point was recorded.
    pub fn finish(self, tool: &ToolState) -> Option<Stroke> {
        if self.points.is_empty() {
            return None;
        }
        Some(Stroke::from_tool(self.points, tool))
    }
}
