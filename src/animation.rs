//! Per-frame update of the rotating beam and the loop that drives it.

use std::time::Instant;

use anyhow::{Context, Result};
use glam::{Quat, Vec3};
use log::{debug, info};

use crate::app::SceneContext;
use crate::builder::SceneHandles;
use crate::camera::PerspectiveCamera;
use crate::light::Fog;
use crate::material::Color;
use crate::scene::{SceneError, SceneGraph};

/// Radius of the circle the light target travels on.
pub const ORBIT_RADIUS: f32 = 10.0;
/// Beam sweep rate in radians per second.
pub const ANGULAR_SPEED: f32 = 0.5;

pub fn beam_angle(elapsed: f32) -> f32 {
    elapsed * ANGULAR_SPEED
}

/// Point on the horizontal orbit for `angle`.
pub fn target_position(angle: f32) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    Vec3::new(sin * ORBIT_RADIUS, 0.0, cos * ORBIT_RADIUS)
}

/// Light/beam state produced by one update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamPose {
    pub elapsed: f32,
    pub angle: f32,
    pub target: Vec3,
}

/// Moves the light target, turns the pivot and aims the beam for time `elapsed`.
pub fn animate_beam(
    graph: &mut SceneGraph,
    handles: &SceneHandles,
    elapsed: f32,
) -> Result<BeamPose, SceneError> {
    let angle = beam_angle(elapsed);
    let target = target_position(angle);

    graph.set_position(handles.light_target, target)?;
    graph.update_world(handles.light_target)?;

    graph.set_rotation(handles.beam_pivot, Quat::from_rotation_y(angle))?;
    graph.update_world(handles.beam_pivot)?;

    let aim = graph.world_position(handles.light_target)?;
    graph.look_at(handles.beam, aim)?;

    Ok(BeamPose {
        elapsed,
        angle,
        target,
    })
}

/// Source of elapsed seconds for the render loop.
pub trait FrameClock {
    /// Seconds since the clock started; never decreases.
    fn elapsed(&mut self) -> f32;
}

/// Wall clock that starts on its first reading.
#[derive(Debug, Default)]
pub struct SystemClock {
    start: Option<Instant>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameClock for SystemClock {
    fn elapsed(&mut self) -> f32 {
        self.start.get_or_insert_with(Instant::now).elapsed().as_secs_f32()
    }
}

/// Clock advanced by hand, for tests and headless runs.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ManualClock {
    elapsed: f32,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jumps to `elapsed`; earlier times are ignored to keep time monotonic.
    pub fn set(&mut self, elapsed: f32) {
        self.elapsed = self.elapsed.max(elapsed);
    }

    pub fn advance(&mut self, seconds: f32) {
        self.elapsed += seconds.max(0.0);
    }
}

impl FrameClock for ManualClock {
    fn elapsed(&mut self) -> f32 {
        self.elapsed
    }
}

/// Everything a sink needs to draw one frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub index: u64,
    pub pose: BeamPose,
    pub graph: &'a SceneGraph,
    pub camera: &'a PerspectiveCamera,
    pub fog: &'a Fog,
    pub clear_color: Color,
}

/// Consumer of rendered frames (the GPU renderer, or a headless recorder).
pub trait FrameSink {
    fn draw(&mut self, frame: &Frame<'_>) -> Result<()>;
}

/// Result of a call to [`RenderLoop::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// A frame was drawn; the caller should request the next one.
    Rendered(BeamPose),
    /// The loop is stopped and nothing was drawn.
    Stopped,
}

/// Owns the frame cadence: each tick reads the clock, animates the beam,
/// eases the orbit controls and hands the frame to a sink.
#[derive(Debug)]
pub struct RenderLoop<C> {
    clock: C,
    running: bool,
    frames: u64,
}

impl<C: FrameClock> RenderLoop<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            running: false,
            frames: 0,
        }
    }

    pub fn start(&mut self) {
        if !self.running {
            info!("render loop started");
        }
        self.running = true;
    }

    pub fn stop(&mut self) {
        if self.running {
            info!("render loop stopped after {} frame(s)", self.frames);
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn tick(
        &mut self,
        context: &mut SceneContext,
        sink: &mut dyn FrameSink,
    ) -> Result<FrameOutcome> {
        if !self.running {
            return Ok(FrameOutcome::Stopped);
        }
        let elapsed = self.clock.elapsed();
        let pose = animate_beam(&mut context.graph, &context.handles, elapsed)
            .context("failed to animate the beam")?;
        context.controls.update(&mut context.camera);

        let frame = Frame {
            index: self.frames,
            pose,
            graph: &context.graph,
            camera: &context.camera,
            fog: &context.fog,
            clear_color: context.clear_color,
        };
        sink.draw(&frame)
            .with_context(|| format!("failed to draw frame {}", self.frames))?;
        debug!(
            "frame {} t={:.3}s angle={:.3}",
            self.frames, pose.elapsed, pose.angle
        );
        self.frames += 1;
        Ok(FrameOutcome::Rendered(pose))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::SceneContext;
    use crate::texture::{SandTextures, TextureLoader};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f32::consts::{PI, TAU};

    fn context() -> SceneContext {
        let dir = tempfile::TempDir::new().unwrap();
        let textures = SandTextures::load(&TextureLoader::new(dir.path()));
        SceneContext::build(textures, &mut StdRng::seed_from_u64(1)).unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        frames: Vec<(u64, BeamPose)>,
    }

    impl FrameSink for Recorder {
        fn draw(&mut self, frame: &Frame<'_>) -> Result<()> {
            self.frames.push((frame.index, frame.pose));
            Ok(())
        }
    }

    #[test]
    fn target_stays_on_the_orbit_circle() {
        for step in 0..500 {
            let t = step as f32 * 0.173;
            let p = target_position(beam_angle(t));
            assert_relative_eq!(p.x * p.x + p.z * p.z, 100.0, epsilon = 1e-3);
            assert_eq!(p.y, 0.0);
        }
    }

    #[test]
    fn start_and_full_orbit_positions() {
        let start = target_position(beam_angle(0.0));
        assert_relative_eq!(start.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(start.z, 10.0, epsilon = 1e-6);

        let lap = target_position(beam_angle(4.0 * PI));
        assert_relative_eq!(lap.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(lap.z, 10.0, epsilon = 1e-4);
    }

    #[test]
    fn pivot_rotation_tracks_half_elapsed_time() {
        let mut context = context();
        for t in [0.0_f32, 0.5, 3.0, 12.6, 40.0] {
            let pose = animate_beam(&mut context.graph, &context.handles, t).unwrap();
            let pivot = context.graph.get(context.handles.beam_pivot).unwrap();
            let expected = Quat::from_rotation_y((0.5 * t) % TAU);
            assert!(pivot.transform.rotation.angle_between(expected) < 1e-3);
            assert_eq!(
                context.graph.world_position(context.handles.light_target).unwrap(),
                pose.target
            );
        }
    }

    #[test]
    fn beam_points_at_target_every_frame() {
        let mut context = context();
        let origin = crate::builder::LIGHT_POSITION;
        for t in [0.0_f32, 1.0, 2.5, 7.0] {
            let pose = animate_beam(&mut context.graph, &context.handles, t).unwrap();
            let world = context.graph.get(context.handles.beam).unwrap().world_matrix();
            let forward = world.transform_vector3(Vec3::Z).normalize();
            let expected = (pose.target - origin).normalize();
            assert!((forward - expected).length() < 1e-4, "t={t}");
        }
    }

    #[test]
    fn identical_time_gives_identical_transforms() {
        let mut a = context();
        let mut b = context();
        animate_beam(&mut a.graph, &a.handles, 5.0).unwrap();
        animate_beam(&mut b.graph, &b.handles, 1.0).unwrap();
        animate_beam(&mut b.graph, &b.handles, 5.0).unwrap();
        let beam_a = a.graph.get(a.handles.beam).unwrap().world_matrix();
        let beam_b = b.graph.get(b.handles.beam).unwrap().world_matrix();
        assert!(beam_a.abs_diff_eq(beam_b, 1e-5));
    }

    #[test]
    fn loop_only_renders_while_running() {
        let mut context = context();
        let mut sink = Recorder::default();
        let mut render_loop = RenderLoop::new(ManualClock::new());

        assert_eq!(
            render_loop.tick(&mut context, &mut sink).unwrap(),
            FrameOutcome::Stopped
        );
        render_loop.start();
        for _ in 0..3 {
            render_loop.clock_mut().advance(0.5);
            render_loop.tick(&mut context, &mut sink).unwrap();
        }
        render_loop.stop();
        assert_eq!(
            render_loop.tick(&mut context, &mut sink).unwrap(),
            FrameOutcome::Stopped
        );

        assert_eq!(render_loop.frames(), 3);
        let indices: Vec<u64> = sink.frames.iter().map(|(index, _)| *index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_relative_eq!(sink.frames[2].1.angle, 0.75, epsilon = 1e-6);
    }

    #[test]
    fn manual_clock_never_goes_backwards() {
        let mut clock = ManualClock::new();
        clock.set(2.0);
        clock.set(1.0);
        clock.advance(-3.0);
        assert_eq!(clock.elapsed(), 2.0);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let mut clock = SystemClock::new();
        let first = clock.elapsed();
        let second = clock.elapsed();
        assert!(second >= first);
    }
}
