use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::camera::PerspectiveCamera;

/// Upper bound on the device pixel ratio used for the drawing buffer.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Anything whose output size follows the viewport.
pub trait RenderTarget {
    /// Output size in logical (CSS-style) pixels.
    fn set_size(&mut self, width: u32, height: u32);
    fn set_pixel_ratio(&mut self, ratio: f32);
}

/// Viewport dimensions plus the effective pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
}

impl ViewportState {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f64) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            pixel_ratio: capped_pixel_ratio(device_pixel_ratio),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Size of the backing buffer in physical pixels.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        (
            ((self.width as f32 * self.pixel_ratio).round() as u32).max(1),
            ((self.height as f32 * self.pixel_ratio).round() as u32).max(1),
        )
    }
}

pub fn capped_pixel_ratio(device_pixel_ratio: f64) -> f32 {
    let ratio = device_pixel_ratio as f32;
    if ratio.is_finite() && ratio > 0.0 {
        ratio.min(MAX_PIXEL_RATIO)
    } else {
        1.0
    }
}

/// Keeps camera aspect and render target size in step with the window.
///
/// The state is replaced in one assignment, so a frame never observes a
/// half-applied resize.
#[derive(Debug)]
pub struct ViewportManager {
    state: RwLock<ViewportState>,
}

impl ViewportManager {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f64) -> Self {
        Self {
            state: RwLock::new(ViewportState::new(width, height, device_pixel_ratio)),
        }
    }

    pub fn state(&self) -> ViewportState {
        *self.state.read()
    }

    /// Pushes the current state to a freshly created camera and target.
    pub fn apply(&self, camera: &mut PerspectiveCamera, target: &mut dyn RenderTarget) {
        let state = self.state();
        camera.aspect = state.aspect();
        target.set_size(state.width, state.height);
        target.set_pixel_ratio(state.pixel_ratio);
    }

    /// Handles a resize to `width`×`height` logical pixels.
    pub fn resize(
        &self,
        width: u32,
        height: u32,
        device_pixel_ratio: f64,
        camera: &mut PerspectiveCamera,
        target: &mut dyn RenderTarget,
    ) -> ViewportState {
        let next = ViewportState::new(width, height, device_pixel_ratio);
        *self.state.write() = next;
        self.apply(camera, target);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct FakeTarget {
        size: (u32, u32),
        ratio: f32,
        calls: usize,
    }

    impl RenderTarget for FakeTarget {
        fn set_size(&mut self, width: u32, height: u32) {
            self.size = (width, height);
            self.calls += 1;
        }

        fn set_pixel_ratio(&mut self, ratio: f32) {
            self.ratio = ratio;
        }
    }

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0)
    }

    #[test]
    fn resize_updates_aspect_and_size() {
        let manager = ViewportManager::new(800, 600, 1.0);
        let mut camera = camera();
        let mut target = FakeTarget::default();
        manager.resize(1920, 1080, 1.0, &mut camera, &mut target);
        assert_eq!(camera.aspect, 1920.0 / 1080.0);
        assert_eq!(target.size, (1920, 1080));
        assert_eq!(manager.state().drawing_buffer_size(), (1920, 1080));
    }

    #[test]
    fn pixel_ratio_is_capped_at_two() {
        let manager = ViewportManager::new(100, 100, 3.0);
        assert_eq!(manager.state().pixel_ratio, 2.0);
        assert_eq!(manager.state().drawing_buffer_size(), (200, 200));
        assert_eq!(capped_pixel_ratio(1.5), 1.5);
        assert_eq!(capped_pixel_ratio(f64::NAN), 1.0);
    }

    #[test]
    fn repeated_resize_is_idempotent() {
        let manager = ViewportManager::new(800, 600, 1.0);
        let mut once_camera = camera();
        let mut once_target = FakeTarget::default();
        manager.resize(1024, 768, 2.5, &mut once_camera, &mut once_target);
        let once = manager.state();

        let mut twice_camera = camera();
        let mut twice_target = FakeTarget::default();
        manager.resize(1024, 768, 2.5, &mut twice_camera, &mut twice_target);
        manager.resize(1024, 768, 2.5, &mut twice_camera, &mut twice_target);

        assert_eq!(manager.state(), once);
        assert_eq!(once_camera, twice_camera);
        assert_eq!(once_target.size, twice_target.size);
        assert_eq!(once_target.ratio, twice_target.ratio);
    }

    #[test]
    fn zero_sizes_are_clamped() {
        let manager = ViewportManager::new(800, 600, 1.0);
        let mut camera = camera();
        let mut target = FakeTarget::default();
        manager.resize(0, 0, 1.0, &mut camera, &mut target);
        assert_eq!(target.size, (1, 1));
        assert_eq!(camera.aspect, 1.0);
    }
}
