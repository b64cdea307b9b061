//! Randomly scattered beach decorations.
//!
//! Placement is split in two steps: [`sample_layout`] draws every random value
//! from the injected generator, and [`scatter_props`] turns the resulting
//! placements into scene nodes. Props may overlap each other and the
//! lighthouse.

use std::collections::BTreeMap;
use std::f32::consts::PI;
use std::sync::Arc;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::geometry::Geometry;
use crate::material::{Color, Material, StandardMaterial};
use crate::scene::{MeshInstance, NodeId, SceneError, SceneGraph, Transform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PropKind {
    Rock,
    Log,
    Boulder,
    Palm,
    Shell,
    Bush,
}

impl PropKind {
    pub const ALL: [PropKind; 6] = [
        PropKind::Rock,
        PropKind::Log,
        PropKind::Boulder,
        PropKind::Palm,
        PropKind::Shell,
        PropKind::Bush,
    ];

    pub fn count(self) -> usize {
        match self {
            PropKind::Rock => 20,
            PropKind::Log => 5,
            PropKind::Boulder => 2,
            PropKind::Palm => 5,
            PropKind::Shell => 10,
            PropKind::Bush => 8,
        }
    }

    /// Horizontal area instances are scattered over.
    pub fn region(self) -> Region {
        match self {
            PropKind::Rock => Region::centered(10.0),
            PropKind::Log => Region::centered(7.5),
            PropKind::Boulder => Region {
                x: (10.0, 20.0),
                z: (-20.0, -10.0),
            },
            PropKind::Palm | PropKind::Bush => Region::centered(12.5),
            PropKind::Shell => Region::centered(15.0),
        }
    }

    /// Resting height of every instance.
    pub fn height(self) -> f32 {
        match self {
            PropKind::Rock => 0.2,
            PropKind::Log => 0.1,
            PropKind::Boulder => 0.3,
            PropKind::Palm => 0.0,
            PropKind::Shell => 0.05,
            PropKind::Bush => 0.15,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PropKind::Rock => "rocks",
            PropKind::Log => "logs",
            PropKind::Boulder => "boulders",
            PropKind::Palm => "palms",
            PropKind::Shell => "shells",
            PropKind::Bush => "bushes",
        }
    }
}

/// Closed rectangle on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: (f32, f32),
    pub z: (f32, f32),
}

impl Region {
    pub fn centered(half_extent: f32) -> Self {
        Self {
            x: (-half_extent, half_extent),
            z: (-half_extent, half_extent),
        }
    }

    pub fn contains(&self, position: Vec3) -> bool {
        (self.x.0..=self.x.1).contains(&position.x) && (self.z.0..=self.z.1).contains(&position.z)
    }
}

/// Randomly sampled values for one prop instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropPlacement {
    pub kind: PropKind,
    pub position: Vec3,
    /// XYZ Euler angles in radians.
    pub rotation: Vec3,
    /// Radius of per-instance geometry; zero for kinds with shared geometry.
    pub size: f32,
}

/// Draws the placement of every prop, grouped by kind in [`PropKind::ALL`] order.
pub fn sample_layout<R: Rng + ?Sized>(rng: &mut R) -> Vec<PropPlacement> {
    PropKind::ALL
        .into_iter()
        .flat_map(|kind| (0..kind.count()).map(move |_| kind))
        .map(|kind| sample_one(kind, rng))
        .collect()
}

fn sample_one<R: Rng + ?Sized>(kind: PropKind, rng: &mut R) -> PropPlacement {
    let mut unit = || rng.gen::<f32>();
    let (size, position, rotation) = match kind {
        PropKind::Rock => {
            let size = unit() * 0.5 + 0.2;
            let position = centered_offset(&mut unit, 20.0, kind.height());
            (size, position, Vec3::new(unit() * PI, unit() * PI, unit() * PI))
        }
        PropKind::Log => {
            let position = centered_offset(&mut unit, 15.0, kind.height());
            (0.0, position, Vec3::new(0.0, unit() * PI, unit() * PI))
        }
        PropKind::Boulder => {
            let size = unit() * 1.5 + 1.0;
            let position = Vec3::new(unit() * 10.0 + 10.0, kind.height(), unit() * -10.0 - 10.0);
            (size, position, Vec3::new(unit() * PI, unit() * PI, unit() * PI))
        }
        PropKind::Palm => {
            let position = centered_offset(&mut unit, 25.0, kind.height());
            (0.0, position, Vec3::new(0.0, unit() * PI, 0.0))
        }
        PropKind::Shell => {
            let position = centered_offset(&mut unit, 30.0, kind.height());
            (0.0, position, Vec3::new(unit() * PI, unit() * PI, unit() * PI))
        }
        PropKind::Bush => {
            let size = unit() * 0.5 + 0.3;
            let position = centered_offset(&mut unit, 25.0, kind.height());
            (size, position, Vec3::ZERO)
        }
    };
    PropPlacement {
        kind,
        position,
        rotation,
        size,
    }
}

fn centered_offset(unit: &mut impl FnMut() -> f32, span: f32, y: f32) -> Vec3 {
    let x = (unit() - 0.5) * span;
    let z = (unit() - 0.5) * span;
    Vec3::new(x, y, z)
}

/// Geometry and materials shared between instances of a kind.
struct PropLibrary {
    rock: Arc<Material>,
    log_geometry: Arc<Geometry>,
    log: Arc<Material>,
    trunk_geometry: Arc<Geometry>,
    trunk: Arc<Material>,
    leaf_geometry: Arc<Geometry>,
    leaf: Arc<Material>,
    shell_geometry: Arc<Geometry>,
    shell: Arc<Material>,
    bush: Arc<Material>,
}

impl PropLibrary {
    fn new() -> Self {
        let standard = |packed: u32, roughness: f32| {
            Arc::new(Material::standard(StandardMaterial::new(
                Color::from_packed(packed),
                roughness,
            )))
        };
        Self {
            rock: Arc::new(Material::standard(
                StandardMaterial::new(Color::from_packed(0x888888), 0.9).with_metalness(0.1),
            )),
            log_geometry: Arc::new(Geometry::cylinder(0.1, 0.2, 2.0, 8, 1, false)),
            log: standard(0x654321, 0.8),
            trunk_geometry: Arc::new(Geometry::cylinder(0.15, 0.25, 4.0, 6, 1, false)),
            trunk: standard(0x8b5a2b, 0.9),
            leaf_geometry: Arc::new(Geometry::cone(1.0, 2.0, 5)),
            leaf: standard(0x228b22, 0.8),
            shell_geometry: Arc::new(Geometry::sphere(0.1, 6, 6)),
            shell: standard(0xffffff, 0.7),
            bush: standard(0x006400, 0.9),
        }
    }

    fn boulder_material() -> Arc<Material> {
        Arc::new(Material::standard(
            StandardMaterial::new(Color::from_packed(0x555555), 0.95).with_metalness(0.05),
        ))
    }
}

/// Node ids of the scattered props, per kind.
pub type PropIndex = BTreeMap<PropKind, Vec<NodeId>>;

/// Attaches one node per placement under `parent`.
pub fn scatter_props(
    graph: &mut SceneGraph,
    parent: NodeId,
    layout: &[PropPlacement],
) -> Result<PropIndex, SceneError> {
    let library = PropLibrary::new();
    let mut index = PropIndex::new();
    for (ordinal, placement) in layout.iter().enumerate() {
        let transform = Transform::from_position(placement.position).with_euler(
            placement.rotation.x,
            placement.rotation.y,
            placement.rotation.z,
        );
        let name = format!("{}-{ordinal}", placement.kind.label());
        let mesh = match placement.kind {
            PropKind::Rock => MeshInstance::new(
                Arc::new(Geometry::dodecahedron(placement.size)),
                Arc::clone(&library.rock),
            )
            .with_shadows(true, true),
            PropKind::Log => MeshInstance::new(
                Arc::clone(&library.log_geometry),
                Arc::clone(&library.log),
            )
            .with_shadows(true, true),
            PropKind::Boulder => MeshInstance::new(
                Arc::new(Geometry::dodecahedron(placement.size)),
                PropLibrary::boulder_material(),
            )
            .with_shadows(true, true),
            PropKind::Palm => MeshInstance::new(
                Arc::clone(&library.trunk_geometry),
                Arc::clone(&library.trunk),
            )
            .with_shadows(true, false),
            PropKind::Shell => MeshInstance::new(
                Arc::clone(&library.shell_geometry),
                Arc::clone(&library.shell),
            ),
            PropKind::Bush => MeshInstance::new(
                Arc::new(Geometry::icosahedron(placement.size)),
                Arc::clone(&library.bush),
            )
            .with_shadows(true, true),
        };
        let id = graph.add_mesh(parent, name, transform, mesh)?;
        if placement.kind == PropKind::Palm {
            graph.add_mesh(
                id,
                format!("palm-leaf-{ordinal}"),
                Transform::from_position(Vec3::new(0.0, 3.0, 0.0)),
                MeshInstance::new(
                    Arc::clone(&library.leaf_geometry),
                    Arc::clone(&library.leaf),
                ),
            )?;
        }
        index.entry(placement.kind).or_default().push(id);
    }
    Ok(index)
}
