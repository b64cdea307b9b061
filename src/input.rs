use std::collections::HashSet;

use glam::Vec2;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::camera::{OrbitControls, PerspectiveCamera};

/// Pointer buttons the orbit controls react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Camera manipulation derived from pointer input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrbitGesture {
    Rotate { dx: f32, dy: f32 },
    Pan { dx: f32, dy: f32 },
    /// Positive values zoom out.
    Dolly(f32),
}

impl OrbitGesture {
    pub fn apply(
        self,
        controls: &mut OrbitControls,
        camera: &PerspectiveCamera,
        viewport_height: f32,
    ) {
        match self {
            OrbitGesture::Rotate { dx, dy } => controls.drag_rotate(dx, dy, viewport_height),
            OrbitGesture::Pan { dx, dy } => controls.drag_pan(dx, dy, viewport_height, camera),
            OrbitGesture::Dolly(delta) => controls.wheel(delta),
        }
    }
}

/// Pointer snapshot turning raw button/cursor events into orbit gestures.
#[derive(Debug, Default)]
pub struct PointerState {
    buttons: RwLock<HashSet<PointerButton>>,
    position: RwLock<Option<Vec2>>,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, button: PointerButton) {
        self.buttons.write().insert(button);
    }

    pub fn release(&self, button: PointerButton) {
        self.buttons.write().remove(&button);
    }

    pub fn is_pressed(&self, button: PointerButton) -> bool {
        self.buttons.read().contains(&button)
    }

    pub fn position(&self) -> Option<Vec2> {
        *self.position.read()
    }

    /// Records the cursor position and returns the drag gesture, if any.
    ///
    /// Primary drags orbit; secondary or middle drags pan.
    pub fn move_to(&self, position: Vec2) -> Option<OrbitGesture> {
        let previous = self.position.write().replace(position)?;
        let delta = position - previous;
        if delta == Vec2::ZERO {
            return None;
        }
        if self.is_pressed(PointerButton::Primary) {
            Some(OrbitGesture::Rotate {
                dx: delta.x,
                dy: delta.y,
            })
        } else if self.is_pressed(PointerButton::Secondary) || self.is_pressed(PointerButton::Middle)
        {
            Some(OrbitGesture::Pan {
                dx: delta.x,
                dy: delta.y,
            })
        } else {
            None
        }
    }

    /// Wheel lines scrolled; scrolling up (positive) zooms in.
    pub fn scroll(&self, lines: f32) -> Option<OrbitGesture> {
        (lines != 0.0).then_some(OrbitGesture::Dolly(-lines))
    }

    pub fn leave(&self) {
        *self.position.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_move_only_records_position() {
        let pointer = PointerState::new();
        pointer.press(PointerButton::Primary);
        assert_eq!(pointer.move_to(Vec2::new(10.0, 10.0)), None);
        assert_eq!(pointer.position(), Some(Vec2::new(10.0, 10.0)));
    }

    #[test]
    fn drags_map_to_rotate_and_pan() {
        let pointer = PointerState::new();
        pointer.move_to(Vec2::ZERO);
        assert_eq!(pointer.move_to(Vec2::new(1.0, 0.0)), None);

        pointer.press(PointerButton::Primary);
        assert_eq!(
            pointer.move_to(Vec2::new(4.0, 2.0)),
            Some(OrbitGesture::Rotate { dx: 3.0, dy: 2.0 })
        );

        pointer.release(PointerButton::Primary);
        pointer.press(PointerButton::Secondary);
        assert_eq!(
            pointer.move_to(Vec2::new(4.0, 7.0)),
            Some(OrbitGesture::Pan { dx: 0.0, dy: 5.0 })
        );
    }

    #[test]
    fn leaving_resets_the_drag_origin() {
        let pointer = PointerState::new();
        pointer.press(PointerButton::Primary);
        pointer.move_to(Vec2::ZERO);
        pointer.leave();
        assert_eq!(pointer.move_to(Vec2::new(50.0, 50.0)), None);
    }

    #[test]
    fn scroll_up_zooms_in() {
        let pointer = PointerState::new();
        assert_eq!(pointer.scroll(1.0), Some(OrbitGesture::Dolly(-1.0)));
        assert_eq!(pointer.scroll(0.0), None);
    }

    #[test]
    fn gestures_feed_orbit_controls() {
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0);
        camera.position = glam::Vec3::new(0.0, 0.0, 10.0);
        let mut controls = OrbitControls::new(glam::Vec3::ZERO);
        OrbitGesture::Dolly(1.0).apply(&mut controls, &camera, 720.0);
        controls.update(&mut camera);
        assert!(camera.position.length() > 10.0);
    }
}
