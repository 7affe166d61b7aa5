use egui::Color32;
use serde::{Deserialize, Serialize};

/// Colour the canvas is cleared to. Eraser strokes carry it as their ink.
pub const CANVAS_CLEAR_COLOR: Color32 = Color32::from_rgb(0x0a, 0x0e, 0x17);

pub const DEFAULT_PEN_WIDTH: u32 = 3;
pub const MIN_PEN_WIDTH: u32 = 1;
pub const MAX_PEN_WIDTH: u32 = 10;
pub const ERASER_WIDTH: u32 = 20;

/// Pen colours offered in the toolbar.
pub const PALETTE: [(&str, Color32); 6] = [
    ("Red Alliance", Color32::from_rgb(0xef, 0x44, 0x44)),
    ("Blue Alliance", Color32::from_rgb(0x3b, 0x82, 0xf6)),
    ("Yellow", Color32::from_rgb(0xea, 0xb3, 0x08)),
    ("Green", Color32::from_rgb(0x22, 0xc5, 0x5e)),
    ("Purple", Color32::from_rgb(0xa8, 0x55, 0xf7)),
    ("White", Color32::from_rgb(0xff, 0xff, 0xff)),
];

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
pub enum Tool {
    #[default]
    Pen,
    Eraser,
}

impl Tool {
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Pen => "Pen",
            Tool::Eraser => "Eraser",
        }
    }
}

/// The tool selection of one canvas session.
///
/// Only changed by explicit user selection; read when a gesture is finalized
/// and when live feedback is painted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolState {
    tool: Tool,
    color: Color32,
    stroke_width: u32,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            tool: Tool::Pen,
            color: PALETTE[0].1,
            stroke_width: DEFAULT_PEN_WIDTH,
        }
    }
}

impl ToolState {
    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn is_eraser(&self) -> bool {
        self.tool == Tool::Eraser
    }

    /// The selected pen colour, regardless of the active tool
    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn set_color(&mut self, color: Color32) {
        self.color = color;
    }

    /// The selected pen width, regardless of the active tool
    pub fn stroke_width(&self) -> u32 {
        self.stroke_width
    }

    /// Width is clamped to the range offered by the toolbar.
    pub fn set_stroke_width(&mut self, width: u32) {
        self.stroke_width = width.clamp(MIN_PEN_WIDTH, MAX_PEN_WIDTH);
    }

    /// Colour a stroke drawn right now would carry.
    pub fn ink_color(&self) -> Color32 {
        match self.tool {
            Tool::Pen => self.color,
            Tool::Eraser => CANVAS_CLEAR_COLOR,
        }
    }

    /// Width a stroke drawn right now would carry.
    pub fn ink_width(&self) -> u32 {
        match self.tool {
            Tool::Pen => self.stroke_width,
            Tool::Eraser => ERASER_WIDTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eraser_ignores_pen_settings() {
        let mut tool = ToolState::default();
        tool.set_color(PALETTE[1].1);
        tool.set_stroke_width(7);
        assert_eq!(tool.ink_color(), PALETTE[1].1);
        assert_eq!(tool.ink_width(), 7);

        tool.set_tool(Tool::Eraser);
        assert_eq!(tool.ink_color(), CANVAS_CLEAR_COLOR);
        assert_eq!(tool.ink_width(), ERASER_WIDTH);
        // The pen settings survive a trip through the eraser
        assert_eq!(tool.color(), PALETTE[1].1);
        assert_eq!(tool.stroke_width(), 7);
    }

    #[test]
    fn test_stroke_width_is_clamped() {
        let mut tool = ToolState::default();
        tool.set_stroke_width(0);
        assert_eq!(tool.stroke_width(), MIN_PEN_WIDTH);
        tool.set_stroke_width(99);
        assert_eq!(tool.stroke_width(), MAX_PEN_WIDTH);
    }
}
