use std::f32::consts::{PI, TAU};

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Perspective camera looking at a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov,
            aspect,
            near,
            far,
            position: Vec3::Z,
            target: Vec3::ZERO,
            up: Vec3::Y,
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov.to_radians(),
            self.aspect.max(0.01),
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Camera-to-world matrix.
    pub fn world(&self) -> Mat4 {
        self.view().inverse()
    }
}

/// Spherical offset of the camera around the orbit target.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Spherical {
    pub radius: f32,
    /// Polar angle from +Y.
    pub phi: f32,
    /// Azimuth around +Y, measured from +Z.
    pub theta: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(self) -> Vec3 {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

/// Damped orbit/pan/dolly controller for a [`PerspectiveCamera`].
///
/// Pointer input accumulates into pending deltas; each [`update`](Self::update)
/// applies a `damping_factor` share of them and decays the remainder, so the
/// camera eases out after the pointer is released.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    spherical_delta: Spherical,
    pan_offset: Vec3,
    scale: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            spherical_delta: Spherical::default(),
            pan_offset: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

/// Keeps the camera off the poles; `cos` of much smaller angles rounds to 1.0 in f32.
const MIN_POLAR: f32 = 1e-3;

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    pub fn damped(mut self) -> Self {
        self.enable_damping = true;
        self
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.phi -= angle;
    }

    /// Pointer drag of `(dx, dy)` pixels on a viewport `height` pixels tall.
    pub fn drag_rotate(&mut self, dx: f32, dy: f32, height: f32) {
        let height = height.max(1.0);
        self.rotate_left(TAU * dx / height * self.rotate_speed);
        self.rotate_up(TAU * dy / height * self.rotate_speed);
    }

    /// Screen-space pan; one viewport height of drag moves the target by the
    /// visible height at the target's depth.
    pub fn drag_pan(&mut self, dx: f32, dy: f32, height: f32, camera: &PerspectiveCamera) {
        let height = height.max(1.0);
        let distance = (camera.position - self.target).length()
            * (camera.fov.to_radians() / 2.0).tan();
        let world = camera.world();
        let right = world.x_axis.truncate();
        let up = world.y_axis.truncate();
        self.pan_offset += right * (-2.0 * dx * distance / height * self.pan_speed);
        self.pan_offset += up * (2.0 * dy * distance / height * self.pan_speed);
    }

    /// Mouse wheel; positive `delta` zooms out.
    pub fn wheel(&mut self, delta: f32) {
        let step = 0.95_f32.powf(self.zoom_speed);
        if delta > 0.0 {
            self.scale /= step;
        } else if delta < 0.0 {
            self.scale *= step;
        }
    }

    /// Moves `camera` by the pending input and decays it.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) {
        let mut spherical = Spherical::from_offset(camera.position - self.target);
        let share = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };

        spherical.theta += self.spherical_delta.theta * share;
        spherical.phi += self.spherical_delta.phi * share;
        spherical.phi = spherical.phi.clamp(MIN_POLAR, PI - MIN_POLAR);
        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pan_offset * share;

        camera.target = self.target;
        camera.position = self.target + spherical.to_offset();

        if self.enable_damping {
            self.spherical_delta.theta *= 1.0 - self.damping_factor;
            self.spherical_delta.phi *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.spherical_delta = Spherical::default();
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(75.0, 16.0 / 9.0, 0.1, 100.0);
        camera.position = Vec3::new(12.0, 8.0, 12.0);
        camera
    }

    #[test]
    fn spherical_round_trips_offsets() {
        let offset = Vec3::new(12.0, 8.0, 12.0);
        let back = Spherical::from_offset(offset).to_offset();
        assert_relative_eq!(back.x, offset.x, epsilon = 1e-4);
        assert_relative_eq!(back.y, offset.y, epsilon = 1e-4);
        assert_relative_eq!(back.z, offset.z, epsilon = 1e-4);
    }

    #[test]
    fn idle_update_keeps_camera_still() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(Vec3::ZERO).damped();
        controls.update(&mut camera);
        assert!((camera.position - Vec3::new(12.0, 8.0, 12.0)).length() < 1e-4);
    }

    #[test]
    fn damped_rotation_eases_out_and_converges() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(Vec3::ZERO).damped();
        let start = Spherical::from_offset(camera.position);
        controls.drag_rotate(100.0, 0.0, 720.0);

        controls.update(&mut camera);
        let first_step = Spherical::from_offset(camera.position).theta - start.theta;
        controls.update(&mut camera);
        let second_step =
            Spherical::from_offset(camera.position).theta - start.theta - first_step;
        assert!(second_step.abs() < first_step.abs());

        for _ in 0..2_000 {
            controls.update(&mut camera);
        }
        assert!(controls.spherical_delta.theta.abs() < 1e-6);
        let settled = camera.position;
        controls.update(&mut camera);
        assert!((camera.position - settled).length() < 1e-4);

        let total = Spherical::from_offset(camera.position).theta - start.theta;
        assert_relative_eq!(total, -TAU * 100.0 / 720.0, epsilon = 1e-3);
        let distance = camera.position.length();
        assert_relative_eq!(distance, Vec3::new(12.0, 8.0, 12.0).length(), epsilon = 1e-3);
    }

    #[test]
    fn undamped_input_applies_at_once() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(Vec3::ZERO);
        let before = camera.position.length();
        controls.wheel(1.0);
        controls.update(&mut camera);
        assert_relative_eq!(camera.position.length(), before / 0.95, epsilon = 1e-3);
        let settled = camera.position;
        controls.update(&mut camera);
        assert!((camera.position - settled).length() < 1e-5);
    }

    #[test]
    fn polar_angle_is_clamped() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(Vec3::ZERO);
        controls.rotate_up(10.0);
        controls.update(&mut camera);
        let spherical = Spherical::from_offset(camera.position);
        assert!(spherical.phi > 0.0 && spherical.phi < PI);
    }

    #[test]
    fn camera_held_at_either_pole_keeps_its_azimuth() {
        let mut camera = camera();
        let start = Spherical::from_offset(camera.position);
        let mut controls = OrbitControls::new(Vec3::ZERO);

        controls.rotate_up(10.0);
        controls.update(&mut camera);
        let top = Spherical::from_offset(camera.position);
        assert!(top.phi >= MIN_POLAR * 0.5);
        assert!(camera.position.x.hypot(camera.position.z) > 1e-3);
        assert_relative_eq!(top.theta, start.theta, epsilon = 1e-2);

        controls.rotate_up(-20.0);
        controls.update(&mut camera);
        let bottom = Spherical::from_offset(camera.position);
        assert!(bottom.phi <= PI - MIN_POLAR * 0.5);
        assert_relative_eq!(bottom.theta, start.theta, epsilon = 1e-2);
        assert_relative_eq!(bottom.radius, start.radius, epsilon = 1e-3);
    }

    #[test]
    fn pan_moves_target_and_camera_together() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(Vec3::ZERO);
        let offset = camera.position - controls.target;
        controls.drag_pan(50.0, 0.0, 720.0, &camera);
        controls.update(&mut camera);
        assert!(controls.target.length() > 0.0);
        assert!((camera.position - controls.target - offset).length() < 1e-3);
    }
}
