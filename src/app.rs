use anyhow::{Context, Result};
use glam::{EulerRot, Vec3};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::animation::{Frame, FrameSink, ManualClock, RenderLoop};
use crate::builder::{build_scene, SceneHandles};
use crate::camera::{OrbitControls, PerspectiveCamera};
use crate::config::AppConfig;
use crate::light::Fog;
use crate::material::Color;
use crate::props::PropKind;
use crate::scene::SceneGraph;
use crate::texture::{SandTextures, TextureLoader, TextureState};
use crate::viewport::ViewportManager;

pub const WINDOW_TITLE: &str = "Lighthouse Beach";
pub const WINDOW_WIDTH: u32 = 1280;
pub const WINDOW_HEIGHT: u32 = 720;

pub const CAMERA_FOV: f32 = 75.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 100.0;
pub const CAMERA_POSITION: Vec3 = Vec3::new(12.0, 8.0, 12.0);

/// Everything the render loop reads and mutates, owned in one place.
#[derive(Debug)]
pub struct SceneContext {
    pub graph: SceneGraph,
    pub handles: SceneHandles,
    pub fog: Fog,
    pub clear_color: Color,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    pub viewport: ViewportManager,
    pub textures: SandTextures,
}

impl SceneContext {
    /// Builds the scene around already requested textures.
    pub fn build<R: Rng + ?Sized>(textures: SandTextures, rng: &mut R) -> Result<Self> {
        let built = build_scene(&textures, rng).context("failed to build the beach scene")?;
        let viewport = ViewportManager::new(WINDOW_WIDTH, WINDOW_HEIGHT, 1.0);

        let mut camera = PerspectiveCamera::new(
            CAMERA_FOV,
            viewport.state().aspect(),
            CAMERA_NEAR,
            CAMERA_FAR,
        );
        camera.position = CAMERA_POSITION;
        let mut controls = OrbitControls::new(Vec3::ZERO).damped();
        controls.update(&mut camera);

        Ok(Self {
            graph: built.graph,
            handles: built.handles,
            fog: built.fog,
            clear_color: built.clear_color,
            camera,
            controls,
            viewport,
            textures,
        })
    }

    /// Starts texture loads under `config.assets` and builds the scene.
    pub fn load(config: &AppConfig) -> Result<Self> {
        let loader = TextureLoader::new(&config.assets);
        let textures = SandTextures::load(&loader);
        let mut rng = match config.seed {
            Some(seed) => {
                info!("scattering props with seed {seed}");
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };
        Self::build(textures, &mut rng)
    }
}

/// Draw statistics collected when no GPU is attached.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrawCounter {
    pub frames: u64,
    pub opaque: usize,
    pub transparent: usize,
}

impl FrameSink for DrawCounter {
    fn draw(&mut self, frame: &Frame<'_>) -> Result<()> {
        let drawables = frame.graph.drawables();
        self.transparent = drawables
            .iter()
            .filter(|(_, mesh)| mesh.material.is_transparent())
            .count();
        self.opaque = drawables.len() - self.transparent;
        self.frames += 1;
        Ok(())
    }
}

/// Steps the animation `config.frames` times at `config.time_step` intervals.
pub fn run_headless(context: &mut SceneContext, config: &AppConfig) -> Result<DrawCounter> {
    let mut sink = DrawCounter::default();
    let mut render_loop = RenderLoop::new(ManualClock::new());
    render_loop.start();
    for index in 0..config.frames {
        render_loop.clock_mut().set(index as f32 * config.time_step);
        render_loop.tick(context, &mut sink)?;
    }
    render_loop.stop();
    Ok(sink)
}

pub fn print_summary(context: &SceneContext) {
    println!(
        "Built scene with {} nodes ({} meshes)",
        context.graph.len(),
        context.graph.drawables().len()
    );
    for kind in PropKind::ALL {
        let placed = context.handles.props.get(&kind).map_or(0, Vec::len);
        println!(" - {}: {placed}", kind.label());
    }
}

/// Waits for the sand textures and reports which channels loaded.
pub fn print_texture_status(textures: &SandTextures) {
    println!("Textures:");
    for ((_, handle), (_, file)) in textures.handles().into_iter().zip(SandTextures::FILES) {
        let status = match handle.wait() {
            TextureState::Ready(image) => format!("{}x{}", image.width, image.height),
            TextureState::Failed(_) => "missing".to_string(),
            TextureState::Pending => "pending".to_string(),
        };
        println!(" - {file}: {status}");
    }
}

pub fn print_final_state(context: &SceneContext, draws: &DrawCounter) -> Result<()> {
    let target = context.graph.world_position(context.handles.light_target)?;
    let pivot = context
        .graph
        .get(context.handles.beam_pivot)
        .context("beam pivot is missing from the scene")?;
    let (yaw, _, _) = pivot.transform.rotation.to_euler(EulerRot::YXZ);
    let camera = context.camera.position;

    println!("Final state after {} frame(s):", draws.frames);
    println!(
        " - light target pos=({:.2}, {:.2}, {:.2})",
        target.x, target.y, target.z
    );
    println!(" - beam pivot yaw={yaw:.2}");
    println!(
        " - camera pos=({:.2}, {:.2}, {:.2})",
        camera.x, camera.y, camera.z
    );
    println!(
        " - draws per frame: {} opaque, {} transparent",
        draws.opaque, draws.transparent
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn context(seed: u64) -> SceneContext {
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            assets: dir.path().to_path_buf(),
            seed: Some(seed),
            ..AppConfig::default()
        };
        SceneContext::load(&config).unwrap()
    }

    #[test]
    fn camera_starts_at_its_vantage_point() {
        let context = context(7);
        assert!((context.camera.position - CAMERA_POSITION).length() < 1e-4);
        assert_eq!(context.camera.target, Vec3::ZERO);
        assert_eq!(context.camera.fov, 75.0);
        assert!((context.camera.aspect - 1280.0 / 720.0).abs() < 1e-6);
        assert!(context.controls.enable_damping);
        assert_eq!(context.controls.damping_factor, 0.05);
    }

    #[test]
    fn headless_run_counts_draws() {
        let mut context = context(7);
        let config = AppConfig {
            frames: 3,
            ..AppConfig::default()
        };
        let draws = run_headless(&mut context, &config).unwrap();
        assert_eq!(draws.frames, 3);
        assert_eq!(draws.transparent, 1);
        assert_eq!(draws.opaque + draws.transparent, context.graph.drawables().len());
    }

    #[test]
    fn single_headless_frame_leaves_target_at_start() {
        let mut context = context(9);
        run_headless(&mut context, &AppConfig::default()).unwrap();
        let target = context
            .graph
            .world_position(context.handles.light_target)
            .unwrap();
        assert!((target - Vec3::new(0.0, 0.0, 10.0)).length() < 1e-5);
    }

    #[test]
    fn same_seed_gives_same_layout() {
        let a = context(42);
        let b = context(42);
        for kind in PropKind::ALL {
            let positions = |context: &SceneContext| -> Vec<Vec3> {
                context.handles.props[&kind]
                    .iter()
                    .map(|id| context.graph.world_position(*id).unwrap())
                    .collect()
            };
            assert_eq!(positions(&a), positions(&b));
        }
    }
}
