//! Scene graph and hierarchical scene organization.
//!
//! The scene is a tree of tagged nodes: meshes (geometry and material),
//! bones (joint transforms), lights, and plain groups. Node kinds are
//! resolved once at parse time so nothing downstream ever has to probe a
//! node for what it is. Named nodes are indexed once after attachment and
//! looked up by path afterwards.

pub mod camera;
pub mod lighting;

use std::collections::HashMap;
use std::sync::Arc;

use cgmath::One;

/// Index path from a scene root down to a node. The first element selects
/// the root, the rest select children.
pub type NodePath = Vec<usize>;

/// Local transform of a node: position, rotation, scale.
#[derive(Clone, Debug)]
pub struct Transform {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Transform {
    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Compose a parent world transform with this local transform.
    pub fn combine(&self, child: &Transform) -> Transform {
        let scaled = cgmath::Vector3::new(
            self.scale.x * child.position.x,
            self.scale.y * child.position.y,
            self.scale.z * child.position.z,
        );
        Transform {
            position: self.position + (self.rotation * scaled),
            rotation: self.rotation * child.rotation,
            scale: cgmath::Vector3::new(
                self.scale.x * child.scale.x,
                self.scale.y * child.scale.y,
                self.scale.z * child.scale.z,
            ),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

/// Vertex layout shared between the CPU-side geometry and the GPU pipeline.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

/// Mesh geometry. Disposal drops the vertex data and flags the geometry so
/// the GPU cache can evict its buffers.
#[derive(Clone, Debug)]
pub struct Geometry {
    /// Stable id used as the GPU buffer cache key.
    pub id: u32,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    disposed: bool,
}

impl Geometry {
    pub fn new(id: u32, vertices: Vec<ModelVertex>, indices: Vec<u32>) -> Self {
        Self {
            id,
            vertices,
            indices,
            disposed: false,
        }
    }

    pub fn dispose(&mut self) {
        self.vertices = Vec::new();
        self.indices = Vec::new();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Decoded base-color texture pixels, shared between primitives that
/// reference the same source image.
#[derive(Debug)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Material parameters for one primitive.
#[derive(Clone, Debug)]
pub struct Material {
    pub base_color_factor: [f32; 4],
    pub base_color_texture: Option<Arc<TextureImage>>,
    disposed: bool,
}

impl Material {
    pub fn new(base_color_factor: [f32; 4], base_color_texture: Option<Arc<TextureImage>>) -> Self {
        Self {
            base_color_factor,
            base_color_texture,
            disposed: false,
        }
    }

    pub fn dispose(&mut self) {
        self.base_color_texture = None;
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new([1.0, 1.0, 1.0, 1.0], None)
    }
}

/// One renderable primitive: geometry plus the material bound to it.
#[derive(Clone, Debug)]
pub struct Primitive {
    pub geometry: Geometry,
    pub material: Material,
}

/// Mesh payload of a node.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub primitives: Vec<Primitive>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub frustum_culled: bool,
}

/// Light payload of a node. `intensity` is mutated at runtime, e.g. the
/// screen-emissive light coupled to head orientation.
#[derive(Clone, Debug)]
pub struct LightData {
    pub color: [f32; 3],
    pub intensity: f32,
}

/// What a node is, resolved once at parse time.
#[derive(Clone, Debug)]
pub enum NodeKind {
    Group,
    Mesh(MeshData),
    Bone,
    Light(LightData),
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: Option<String>,
    pub transform: Transform,
    pub kind: NodeKind,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn group(name: Option<String>) -> Self {
        Self {
            name,
            transform: Transform::default(),
            kind: NodeKind::Group,
            children: Vec::new(),
        }
    }
}

/// The live scene: a forest of node trees plus a name index rebuilt on
/// every structural change.
#[derive(Default)]
pub struct SceneGraph {
    roots: Vec<SceneNode>,
    names: HashMap<String, NodePath>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a subtree and rebuild the name index. This is the only way
    /// loaded content enters the live scene.
    pub fn attach(&mut self, root: SceneNode) -> usize {
        self.roots.push(root);
        self.reindex();
        self.roots.len() - 1
    }

    /// Resolve a named node to its path. Absence is not an error; callers
    /// silently disable the dependent behavior.
    pub fn find(&self, name: &str) -> Option<&NodePath> {
        self.names.get(name)
    }

    pub fn node(&self, path: &NodePath) -> Option<&SceneNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.roots.get(*first)?;
        for idx in rest {
            node = node.children.get(*idx)?;
        }
        Some(node)
    }

    pub fn node_mut(&mut self, path: &NodePath) -> Option<&mut SceneNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.roots.get_mut(*first)?;
        for idx in rest {
            node = node.children.get_mut(*idx)?;
        }
        Some(node)
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Visit every node together with its accumulated world transform.
    pub fn visit(&self, f: &mut dyn FnMut(&SceneNode, &Transform)) {
        fn walk(node: &SceneNode, parent: &Transform, f: &mut dyn FnMut(&SceneNode, &Transform)) {
            let world = parent.combine(&node.transform);
            f(node, &world);
            for child in &node.children {
                walk(child, &world, f);
            }
        }
        let identity = Transform::default();
        for root in &self.roots {
            walk(root, &identity, f);
        }
    }

    /// Dispose every mesh's geometry and material. Returns the number of
    /// dispose calls issued, for teardown accounting.
    pub fn dispose_meshes(&mut self) -> usize {
        fn walk(node: &mut SceneNode, count: &mut usize) {
            if let NodeKind::Mesh(mesh) = &mut node.kind {
                for primitive in &mut mesh.primitives {
                    if !primitive.geometry.is_disposed() {
                        primitive.geometry.dispose();
                        *count += 1;
                    }
                    if !primitive.material.is_disposed() {
                        primitive.material.dispose();
                        *count += 1;
                    }
                }
            }
            for child in &mut node.children {
                walk(child, count);
            }
        }
        let mut count = 0;
        for root in &mut self.roots {
            walk(root, &mut count);
        }
        count
    }

    /// Remove every node. The name index is cleared with them.
    pub fn clear(&mut self) {
        self.roots.clear();
        self.names.clear();
    }

    fn reindex(&mut self) {
        fn walk(node: &SceneNode, path: &mut NodePath, names: &mut HashMap<String, NodePath>) {
            if let Some(name) = &node.name {
                names.entry(name.clone()).or_insert_with(|| path.clone());
            }
            for (idx, child) in node.children.iter().enumerate() {
                path.push(idx);
                walk(child, path, names);
                path.pop();
            }
        }
        self.names.clear();
        let mut path = NodePath::new();
        for (idx, root) in self.roots.iter().enumerate() {
            path.push(idx);
            walk(root, &mut path, &mut self.names);
            path.pop();
        }
    }
}
