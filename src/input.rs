use egui::{PointerButton, Pos2, Rect, Response, Vec2};

/// Pointer input already translated into canvas pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Primary button (or a touch) went down on the canvas
    PointerDown { position: Pos2 },
    /// Pointer moved while the button is held
    PointerMove { position: Pos2 },
    /// Button released
    PointerUp,
    /// Pointer left the canvas while the button was held
    PointerLeave,
}

/// Maps screen positions onto the fixed-resolution canvas raster.
///
/// The canvas may be shown scaled; points are always stored in raster pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasMapping {
    screen_rect: Rect,
    canvas_size: Vec2,
}

impl CanvasMapping {
    pub fn new(screen_rect: Rect, canvas_width: u32, canvas_height: u32) -> Self {
        Self {
            screen_rect,
            canvas_size: Vec2::new(canvas_width as f32, canvas_height as f32),
        }
    }

    pub fn screen_rect(&self) -> Rect {
        self.screen_rect
    }

    pub fn contains(&self, screen_pos: Pos2) -> bool {
        self.screen_rect.contains(screen_pos)
    }

    pub fn to_canvas(&self, screen_pos: Pos2) -> Pos2 {
        let offset = screen_pos - self.screen_rect.min;
        let size = self.screen_rect.size();
        let scale_x = if size.x > 0.0 { self.canvas_size.x / size.x } else { 1.0 };
        let scale_y = if size.y > 0.0 { self.canvas_size.y / size.y } else { 1.0 };
        Pos2::new(offset.x * scale_x, offset.y * scale_y)
    }
}

/// Turns egui pointer state for the canvas widget into `InputEvent`s
#[derive(Debug, Default)]
pub struct InputHandler {
    last_position: Option<Pos2>,
    pressed: bool,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Process the canvas response for this frame
    pub fn process_input(&mut self, response: &Response, mapping: &CanvasMapping) -> Vec<InputEvent> {
        let mut events = Vec::new();

        if response.drag_started_by(PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                if mapping.contains(pos) {
                    let position = mapping.to_canvas(pos);
                    events.push(InputEvent::PointerDown { position });
                    self.last_position = Some(position);
                    self.pressed = true;
                }
            }
        } else if self.pressed && response.dragged_by(PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                if !mapping.contains(pos) {
                    events.push(InputEvent::PointerLeave);
                    self.reset();
                } else {
                    let position = mapping.to_canvas(pos);
                    if self.last_position != Some(position) {
                        events.push(InputEvent::PointerMove { position });
                        self.last_position = Some(position);
                    }
                }
            }
        }

        if self.pressed && response.drag_stopped_by(PointerButton::Primary) {
            events.push(InputEvent::PointerUp);
            self.reset();
        }

        events
    }

    fn reset(&mut self) {
        self.pressed = false;
        self.last_position = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn test_mapping_translates_origin() {
        let mapping = CanvasMapping::new(Rect::from_min_size(pos2(100.0, 50.0), Vec2::new(1200.0, 800.0)), 1200, 800);
        assert_eq!(mapping.to_canvas(pos2(100.0, 50.0)), pos2(0.0, 0.0));
        assert_eq!(mapping.to_canvas(pos2(110.0, 70.0)), pos2(10.0, 20.0));
    }

    #[test]
    fn test_mapping_scales_to_canvas_resolution() {
        // Canvas shown at half size
        let mapping = CanvasMapping::new(Rect::from_min_size(pos2(0.0, 0.0), Vec2::new(600.0, 400.0)), 1200, 800);
        assert_eq!(mapping.to_canvas(pos2(300.0, 200.0)), pos2(600.0, 400.0));
        assert!(mapping.contains(pos2(599.0, 399.0)));
        assert!(!mapping.contains(pos2(700.0, 10.0)));
    }

    #[test]
    fn test_degenerate_rect_does_not_divide_by_zero() {
        let mapping = CanvasMapping::new(Rect::from_min_size(pos2(10.0, 10.0), Vec2::ZERO), 1200, 800);
        assert_eq!(mapping.to_canvas(pos2(15.0, 12.0)), pos2(5.0, 2.0));
    }
}
