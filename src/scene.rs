use std::sync::Arc;

use glam::{Mat3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Geometry;
use crate::light::{AmbientLight, SpotLight};
use crate::material::Material;

/// Index of a node inside a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("node {0:?} does not exist")]
    MissingNode(NodeId),
    #[error("the root node cannot be removed or reparented")]
    RootIsFixed,
}

/// Local transform of a node relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Rotation given as XYZ Euler angles in radians.
    pub fn with_euler(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = euler_xyz(x, y, z);
        self
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Intrinsic XYZ Euler rotation (`Rx * Ry * Rz`).
pub fn euler_xyz(x: f32, y: f32, z: f32) -> Quat {
    Quat::from_rotation_x(x) * Quat::from_rotation_y(y) * Quat::from_rotation_z(z)
}

/// Mesh content: shared geometry and material plus shadow flags.
#[derive(Debug, Clone)]
pub struct MeshInstance {
    pub geometry: Arc<Geometry>,
    pub material: Arc<Material>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl MeshInstance {
    pub fn new(geometry: Arc<Geometry>, material: Arc<Material>) -> Self {
        Self {
            geometry,
            material,
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    pub fn with_shadows(mut self, cast: bool, receive: bool) -> Self {
        self.cast_shadow = cast;
        self.receive_shadow = receive;
        self
    }
}

/// What a node carries besides its transform.
#[derive(Debug, Clone, Default)]
pub enum NodeContent {
    /// Groups and pivots.
    #[default]
    Empty,
    Mesh(MeshInstance),
    SpotLight(SpotLight),
    AmbientLight(AmbientLight),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub content: NodeContent,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    world: Mat4,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// World matrix as of the last [`SceneGraph::update_world`] touching it.
    pub fn world_matrix(&self) -> Mat4 {
        self.world
    }

    pub fn mesh(&self) -> Option<&MeshInstance> {
        match &self.content {
            NodeContent::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }
}

/// Tree of nodes with a single root. Each node is owned by exactly one parent;
/// removing a node drops its whole subtree.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<Option<Node>>,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        let root = Node {
            name: "scene".to_string(),
            transform: Transform::default(),
            content: NodeContent::Empty,
            parent: None,
            children: Vec::new(),
            world: Mat4::IDENTITY,
        };
        Self {
            nodes: vec![Some(root)],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    fn node(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.get(id).ok_or(SceneError::MissingNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.get_mut(id).ok_or(SceneError::MissingNode(id))
    }

    /// Attaches a new node under `parent` and returns its id.
    pub fn add(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: Transform,
        content: NodeContent,
    ) -> Result<NodeId, SceneError> {
        let parent_world = self.node(parent)?.world;
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node {
            name: name.into(),
            transform,
            content,
            parent: Some(parent),
            children: Vec::new(),
            world: parent_world * transform.matrix(),
        }));
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Adds an empty group or pivot node.
    pub fn add_group(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: Transform,
    ) -> Result<NodeId, SceneError> {
        self.add(parent, name, transform, NodeContent::Empty)
    }

    pub fn add_mesh(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: Transform,
        mesh: MeshInstance,
    ) -> Result<NodeId, SceneError> {
        self.add(parent, name, transform, NodeContent::Mesh(mesh))
    }

    /// Detaches `id` and frees every node below it.
    pub fn remove(&mut self, id: NodeId) -> Result<usize, SceneError> {
        if id == self.root {
            return Err(SceneError::RootIsFixed);
        }
        let parent = self.node(id)?.parent;
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.retain(|child| *child != id);
        }
        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(next.0).and_then(Option::take) {
                stack.extend(node.children);
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub fn set_position(&mut self, id: NodeId, position: Vec3) -> Result<(), SceneError> {
        self.node_mut(id)?.transform.position = position;
        Ok(())
    }

    pub fn set_rotation(&mut self, id: NodeId, rotation: Quat) -> Result<(), SceneError> {
        self.node_mut(id)?.transform.rotation = rotation;
        Ok(())
    }

    /// Recomputes world matrices for `id` and its descendants from the
    /// parent's current world matrix.
    pub fn update_world(&mut self, id: NodeId) -> Result<(), SceneError> {
        let parent_world = match self.node(id)?.parent {
            Some(parent) => self.node(parent)?.world,
            None => Mat4::IDENTITY,
        };
        let mut stack = vec![(id, parent_world)];
        while let Some((next, parent_world)) = stack.pop() {
            let node = self.node_mut(next)?;
            node.world = parent_world * node.transform.matrix();
            let world = node.world;
            stack.extend(node.children.iter().map(|child| (*child, world)));
        }
        Ok(())
    }

    pub fn update_all(&mut self) {
        // The root always exists.
        let _ = self.update_world(self.root);
    }

    pub fn world_position(&self, id: NodeId) -> Result<Vec3, SceneError> {
        Ok(self.node(id)?.world.w_axis.truncate())
    }

    /// Rotates `id` so its local +Z axis points at `target` (world space),
    /// taking the parent's world rotation into account.
    pub fn look_at(&mut self, id: NodeId, target: Vec3) -> Result<(), SceneError> {
        self.update_world(id)?;
        let node = self.node(id)?;
        let eye = node.world.w_axis.truncate();
        let parent_rotation = match node.parent {
            Some(parent) => {
                let (_, rotation, _) = self.node(parent)?.world.to_scale_rotation_translation();
                rotation
            }
            None => Quat::IDENTITY,
        };
        let world_rotation = look_rotation(target - eye, Vec3::Y);
        let local = (parent_rotation.inverse() * world_rotation).normalize();
        self.node_mut(id)?.transform.rotation = local;
        self.update_world(id)
    }

    /// Depth-first traversal from the root, children in insertion order.
    pub fn traverse(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            order.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every reachable mesh together with its world matrix.
    pub fn drawables(&self) -> Vec<(Mat4, &MeshInstance)> {
        self.traverse()
            .into_iter()
            .filter_map(|id| self.get(id))
            .filter_map(|node| node.mesh().map(|mesh| (node.world, mesh)))
            .collect()
    }
}

/// Rotation whose +Z axis points along `direction`.
pub fn look_rotation(direction: Vec3, up: Vec3) -> Quat {
    let forward = direction.normalize_or_zero();
    if forward == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let mut right = up.cross(forward);
    if right.length_squared() < 1e-8 {
        // Looking straight up or down; nudge the up vector.
        right = (up + Vec3::new(0.0, 0.0, 1e-4)).cross(forward);
        if right.length_squared() < 1e-8 {
            right = Vec3::X;
        }
    }
    let right = right.normalize();
    let up = forward.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, up, forward))
}
