//! Procedurally assembled lighthouse beach scene.
//!
//! The scene graph, prop scattering, beam animation and viewport handling are
//! plain data and run without a GPU; [`render::Renderer`] draws the result into
//! a winit window through wgpu.

pub mod animation;
pub mod app;
pub mod builder;
pub mod camera;
pub mod config;
pub mod geometry;
pub mod input;
pub mod light;
pub mod material;
pub mod props;
pub mod render;
pub mod scene;
pub mod texture;
pub mod viewport;

pub use animation::{
    animate_beam, BeamPose, Frame, FrameClock, FrameOutcome, FrameSink, ManualClock, RenderLoop,
    SystemClock,
};
pub use app::SceneContext;
pub use builder::{build_scene, BuiltScene, SceneHandles};
pub use camera::{OrbitControls, PerspectiveCamera};
pub use config::AppConfig;
pub use input::{OrbitGesture, PointerButton, PointerState};
pub use props::PropKind;
pub use render::Renderer;
pub use scene::{NodeId, SceneError, SceneGraph};
pub use texture::{SandTextures, TextureLoader};
pub use viewport::{RenderTarget, ViewportManager, ViewportState};
