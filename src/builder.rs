//! One-shot construction of the beach scene.

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::Vec3;
use log::info;
use rand::Rng;

use crate::geometry::Geometry;
use crate::light::{AmbientLight, Fog, ShadowConfig, SpotLight};
use crate::material::{BasicMaterial, Color, Material, StandardMaterial};
use crate::props::{sample_layout, scatter_props, PropIndex};
use crate::scene::{MeshInstance, NodeContent, NodeId, SceneError, SceneGraph, Transform};
use crate::texture::SandTextures;

pub const GROUND_SIZE: f32 = 50.0;
pub const GROUND_SEGMENTS: u32 = 50;
pub const GROUND_DISPLACEMENT_SCALE: f32 = 0.02;

pub const LIGHT_POSITION: Vec3 = Vec3::new(0.0, 7.0, 0.0);
pub const BEAM_ANGLE_DEGREES: f32 = 15.0;
pub const BEAM_LENGTH: f32 = 20.0;

pub const WINDOW_COUNT: usize = 4;
pub const RING_COUNT: usize = 3;

/// Clear colour, also used for the fog.
pub fn background() -> Color {
    Color::from_packed(0x262837)
}

/// Nodes the animation loop and the summary output refer to.
#[derive(Debug, Clone)]
pub struct SceneHandles {
    pub ground: NodeId,
    pub lighthouse: NodeId,
    pub tower: NodeId,
    pub roof: NodeId,
    pub windows: Vec<NodeId>,
    pub rings: Vec<NodeId>,
    pub spotlight: NodeId,
    pub light_target: NodeId,
    pub beam_pivot: NodeId,
    pub beam: NodeId,
    pub ambient: NodeId,
    pub props: PropIndex,
}

/// Fully populated scene ready for its first frame.
#[derive(Debug, Clone)]
pub struct BuiltScene {
    pub graph: SceneGraph,
    pub handles: SceneHandles,
    pub fog: Fog,
    pub clear_color: Color,
}

/// Builds ground, lighthouse, lights, beam and props.
pub fn build_scene<R: Rng + ?Sized>(
    textures: &SandTextures,
    rng: &mut R,
) -> Result<BuiltScene, SceneError> {
    let mut graph = SceneGraph::new();
    let root = graph.root();

    let ground = add_ground(&mut graph, root, textures)?;
    let (lighthouse, tower, roof, windows, rings) = add_lighthouse(&mut graph, root)?;
    let (spotlight, light_target) = add_spotlight(&mut graph, root)?;
    let (beam_pivot, beam) = add_beam(&mut graph, root)?;
    let ambient = graph.add(
        root,
        "ambient",
        Transform::default(),
        NodeContent::AmbientLight(AmbientLight {
            color: Color::WHITE,
            intensity: 0.2,
        }),
    )?;

    let layout = sample_layout(rng);
    let props = scatter_props(&mut graph, root, &layout)?;
    graph.update_all();

    info!(
        "built scene: {} nodes, {} props",
        graph.len(),
        layout.len()
    );

    Ok(BuiltScene {
        graph,
        handles: SceneHandles {
            ground,
            lighthouse,
            tower,
            roof,
            windows,
            rings,
            spotlight,
            light_target,
            beam_pivot,
            beam,
            ambient,
            props,
        },
        fog: Fog {
            color: background(),
            near: 1.0,
            far: 40.0,
        },
        clear_color: background(),
    })
}

fn add_ground(
    graph: &mut SceneGraph,
    root: NodeId,
    textures: &SandTextures,
) -> Result<NodeId, SceneError> {
    let mut geometry = Geometry::plane(GROUND_SIZE, GROUND_SIZE, GROUND_SEGMENTS, GROUND_SEGMENTS);
    geometry.duplicate_uv_channel();

    let mut material = StandardMaterial::new(Color::WHITE, 1.0);
    for (channel, handle) in textures.handles() {
        material.textures = material.textures.with(channel, handle.clone());
    }
    material.ao_intensity = 1.0;
    material.displacement_scale = GROUND_DISPLACEMENT_SCALE;

    graph.add_mesh(
        root,
        "ground",
        Transform::default().with_euler(-FRAC_PI_2, 0.0, 0.0),
        MeshInstance::new(Arc::new(geometry), Arc::new(Material::standard(material)))
            .with_shadows(false, true),
    )
}

type LighthouseNodes = (NodeId, NodeId, NodeId, Vec<NodeId>, Vec<NodeId>);

fn add_lighthouse(graph: &mut SceneGraph, root: NodeId) -> Result<LighthouseNodes, SceneError> {
    let standard = |packed: u32, roughness: f32| {
        Arc::new(Material::standard(StandardMaterial::new(
            Color::from_packed(packed),
            roughness,
        )))
    };

    let lighthouse = graph.add_group(root, "lighthouse", Transform::default())?;
    let tower = graph.add_mesh(
        lighthouse,
        "tower",
        Transform::from_position(Vec3::new(0.0, 3.0, 0.0)),
        MeshInstance::new(
            Arc::new(Geometry::cylinder(1.0, 1.0, 6.0, 32, 1, false)),
            standard(0xffffff, 0.6),
        ),
    )?;
    let roof = graph.add_mesh(
        lighthouse,
        "roof",
        Transform::from_position(Vec3::new(0.0, 6.75, 0.0)),
        MeshInstance::new(Arc::new(Geometry::cone(1.2, 1.5, 32)), standard(0xff0000, 0.6)),
    )?;

    let mut windows = Vec::with_capacity(WINDOW_COUNT);
    for i in 0..WINDOW_COUNT {
        let window = graph.add_mesh(
            tower,
            format!("window-{i}"),
            Transform::from_position(Vec3::new(0.0, -2.0 + i as f32 * 1.3, 1.05)),
            MeshInstance::new(
                Arc::new(Geometry::cuboid(0.3, 0.5, 0.1)),
                standard(0x222222, 0.7),
            ),
        )?;
        windows.push(window);
    }

    let mut rings = Vec::with_capacity(RING_COUNT);
    for i in 0..RING_COUNT {
        let ring = graph.add_mesh(
            tower,
            format!("ring-{i}"),
            Transform::from_position(Vec3::new(0.0, -1.0 + i as f32 * 2.0, 0.0))
                .with_euler(FRAC_PI_2, 0.0, 0.0),
            MeshInstance::new(
                Arc::new(Geometry::torus(1.05, 0.02, 8, 32)),
                standard(0xaaaaaa, 0.5),
            ),
        )?;
        rings.push(ring);
    }

    Ok((lighthouse, tower, roof, windows, rings))
}

fn add_spotlight(graph: &mut SceneGraph, root: NodeId) -> Result<(NodeId, NodeId), SceneError> {
    let target = graph.add_group(root, "light-target", Transform::default())?;
    let mut light = SpotLight::new(
        Color::from_packed(0xffffaa),
        3.0,
        30.0,
        BEAM_ANGLE_DEGREES.to_radians(),
        0.2,
        target,
    );
    light.cast_shadow = true;
    light.shadow = ShadowConfig {
        map_size: 1024,
        near: 0.5,
        far: 50.0,
    };
    let spotlight = graph.add(
        root,
        "spotlight",
        Transform::from_position(LIGHT_POSITION),
        NodeContent::SpotLight(light),
    )?;
    Ok((spotlight, target))
}

/// Open cone whose apex sits at the origin and which opens along +Z.
pub fn beam_geometry() -> Geometry {
    let radius = BEAM_ANGLE_DEGREES.to_radians().tan() * BEAM_LENGTH;
    let mut geometry = Geometry::cylinder(0.0, radius, BEAM_LENGTH, 32, 1, true);
    geometry.translate(Vec3::new(0.0, -BEAM_LENGTH / 2.0, 0.0));
    geometry.rotate_x(-FRAC_PI_2);
    geometry
}

fn add_beam(graph: &mut SceneGraph, root: NodeId) -> Result<(NodeId, NodeId), SceneError> {
    let mut material = BasicMaterial::new(Color::from_packed(0xffffaa));
    material.transparent = true;
    material.opacity = 0.05;
    material.double_sided = true;
    material.depth_write = false;

    let pivot = graph.add_group(root, "beam-pivot", Transform::from_position(LIGHT_POSITION))?;
    let beam = graph.add_mesh(
        pivot,
        "beam",
        Transform::default(),
        MeshInstance::new(Arc::new(beam_geometry()), Arc::new(Material::basic(material))),
    )?;
    Ok((pivot, beam))
}
