use std::f32::consts::PI;

use approx::assert_relative_eq;
use glam::Vec3;
use lighthouse_beach::animation::{Frame, FrameOutcome};
use lighthouse_beach::{
    AppConfig, FrameSink, ManualClock, PropKind, RenderLoop, RenderTarget, SceneContext,
};
use tempfile::TempDir;

#[derive(Default)]
struct Recorder {
    targets: Vec<Vec3>,
    meshes: usize,
}

impl FrameSink for Recorder {
    fn draw(&mut self, frame: &Frame<'_>) -> anyhow::Result<()> {
        self.targets.push(frame.pose.target);
        self.meshes = frame.graph.drawables().len();
        Ok(())
    }
}

#[derive(Default)]
struct Surface {
    size: (u32, u32),
    ratio: f32,
}

impl RenderTarget for Surface {
    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.ratio = ratio;
    }
}

fn context(seed: u64) -> (TempDir, SceneContext) {
    let assets = TempDir::new().expect("temp assets");
    let config = AppConfig {
        assets: assets.path().to_path_buf(),
        seed: Some(seed),
        ..AppConfig::default()
    };
    let context = SceneContext::load(&config).expect("scene builds without textures");
    (assets, context)
}

#[test]
fn scene_renders_frames_without_any_texture() {
    let (_assets, mut context) = context(3);
    assert!(!context.textures.wait_all().is_empty());

    let mut recorder = Recorder::default();
    let mut render_loop = RenderLoop::new(ManualClock::new());
    render_loop.start();
    for step in 0..5 {
        render_loop.clock_mut().set(step as f32 * PI);
        let outcome = render_loop.tick(&mut context, &mut recorder).unwrap();
        assert!(matches!(outcome, FrameOutcome::Rendered(_)));
    }

    assert_eq!(recorder.targets.len(), 5);
    assert!(recorder.meshes > 50);
    assert_relative_eq!(recorder.targets[0].z, 10.0, epsilon = 1e-5);
    // t = 4π completes a full lap.
    assert_relative_eq!(recorder.targets[4].x, 0.0, epsilon = 1e-4);
    assert_relative_eq!(recorder.targets[4].z, 10.0, epsilon = 1e-4);
    // t = 2π is half way round.
    assert_relative_eq!(recorder.targets[2].z, -10.0, epsilon = 1e-4);
}

#[test]
fn props_stay_inside_their_regions() {
    for seed in [1, 2, 3, 99] {
        let (_assets, context) = context(seed);
        for kind in PropKind::ALL {
            let nodes = &context.handles.props[&kind];
            assert_eq!(nodes.len(), kind.count());
            for node in nodes {
                let position = context.graph.world_position(*node).unwrap();
                assert!(kind.region().contains(position), "{kind:?} at {position}");
            }
        }
    }
}

#[test]
fn resize_tracks_window_dimensions() {
    let (_assets, mut context) = context(5);
    let mut surface = Surface::default();
    context
        .viewport
        .resize(1600, 900, 3.0, &mut context.camera, &mut surface);

    assert_relative_eq!(context.camera.aspect, 1600.0 / 900.0);
    assert_eq!(surface.size, (1600, 900));
    assert_eq!(surface.ratio, 2.0);
}
