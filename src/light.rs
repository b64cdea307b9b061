use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::material::Color;
use crate::scene::{NodeContent, NodeId, SceneGraph};

/// Shadow map settings carried by shadow-casting lights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowConfig {
    pub map_size: u32,
    pub near: f32,
    pub far: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            map_size: 512,
            near: 0.5,
            far: 500.0,
        }
    }
}

/// Cone light aimed at a target node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    pub color: Color,
    pub intensity: f32,
    /// Cut-off range; zero means unbounded.
    pub distance: f32,
    /// Half-angle of the cone in radians.
    pub angle: f32,
    /// Fraction of the cone over which the edge fades out.
    pub penumbra: f32,
    pub decay: f32,
    pub target: NodeId,
    pub cast_shadow: bool,
    pub shadow: ShadowConfig,
}

impl SpotLight {
    pub fn new(
        color: Color,
        intensity: f32,
        distance: f32,
        angle: f32,
        penumbra: f32,
        target: NodeId,
    ) -> Self {
        Self {
            color,
            intensity,
            distance,
            angle,
            penumbra,
            decay: 2.0,
            target,
            cast_shadow: false,
            shadow: ShadowConfig::default(),
        }
    }

    pub fn cos_outer(&self) -> f32 {
        self.angle.cos()
    }

    pub fn cos_inner(&self) -> f32 {
        (self.angle * (1.0 - self.penumbra)).cos()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

/// Distance fog that fades in between `near` and `far`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fog {
    pub color: Color,
    pub near: f32,
    pub far: f32,
}

/// Light state extracted from the graph for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLightState {
    pub position: Vec3,
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub distance: f32,
    pub decay: f32,
    pub cos_outer: f32,
    pub cos_inner: f32,
}

impl SpotLightState {
    /// Reads the first spot light reachable from the root, aimed at the
    /// current world position of its target node.
    pub fn from_graph(graph: &SceneGraph) -> Option<Self> {
        graph.traverse().into_iter().find_map(|id| {
            let node = graph.get(id)?;
            let NodeContent::SpotLight(light) = &node.content else {
                return None;
            };
            let position = node.world_matrix().w_axis.truncate();
            let target = graph.world_position(light.target).ok()?;
            Some(Self {
                position,
                direction: (target - position).try_normalize().unwrap_or(Vec3::NEG_Y),
                color: light.color.to_linear(),
                intensity: light.intensity,
                distance: light.distance,
                decay: light.decay,
                cos_outer: light.cos_outer(),
                cos_inner: light.cos_inner(),
            })
        })
    }
}

/// Sum of every ambient light in the graph, in linear space.
pub fn ambient_radiance(graph: &SceneGraph) -> Vec3 {
    graph
        .traverse()
        .into_iter()
        .filter_map(|id| match &graph.get(id)?.content {
            NodeContent::AmbientLight(light) => Some(light.color.to_linear() * light.intensity),
            _ => None,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Transform;

    fn beacon() -> SpotLight {
        let target = SceneGraph::new().root();
        SpotLight::new(Color::WHITE, 3.0, 30.0, 15f32.to_radians(), 0.2, target)
    }

    #[test]
    fn inner_cone_is_narrower_than_outer() {
        let light = beacon();
        assert!(light.cos_inner() > light.cos_outer());
    }

    #[test]
    fn light_state_follows_target_node() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let target = graph
            .add_group(root, "target", Transform::from_position(Vec3::new(0.0, 0.0, 10.0)))
            .unwrap();
        let light = SpotLight::new(Color::WHITE, 3.0, 30.0, 15f32.to_radians(), 0.2, target);
        graph
            .add(
                root,
                "spot",
                Transform::from_position(Vec3::new(0.0, 7.0, 0.0)),
                NodeContent::SpotLight(light),
            )
            .unwrap();
        graph.update_all();

        let state = SpotLightState::from_graph(&graph).unwrap();
        assert_eq!(state.position, Vec3::new(0.0, 7.0, 0.0));
        let expected = Vec3::new(0.0, -7.0, 10.0).normalize();
        assert!((state.direction - expected).length() < 1e-5);
        assert_eq!(state.decay, 2.0);
    }

    #[test]
    fn ambient_lights_add_up() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        assert_eq!(ambient_radiance(&graph), Vec3::ZERO);
        for _ in 0..2 {
            graph
                .add(
                    root,
                    "ambient",
                    Transform::default(),
                    NodeContent::AmbientLight(AmbientLight {
                        color: Color::WHITE,
                        intensity: 0.2,
                    }),
                )
                .unwrap();
        }
        assert!((ambient_radiance(&graph) - Vec3::splat(0.4)).length() < 1e-5);
    }
}
