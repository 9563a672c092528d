//! Turns decrypted bytes into a renderable character fragment.
//!
//! The plaintext is one self-contained binary glTF container: buffers and
//! images embedded, no side-band fetches during parse. Parsing resolves
//! every node into its tagged kind up front, reads the animation channels
//! into named clips, flags every mesh for shadows and frustum culling, and
//! applies the foot-bone ground correction. The caller attaches the
//! resolved fragment to the live scene graph; nothing here mutates shared
//! state, so a failed load can never leave partially-attached nodes behind.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cgmath::Quaternion;

use crate::animation::{Clip, Track, TrackValues};
use crate::crypto::{AssetDecryptor, EncryptedAsset};
use crate::error::{PipelineError, Result};
use crate::scene::{
    Geometry, Material, MeshData, ModelVertex, NodeKind, NodePath, Primitive, SceneNode,
    TextureImage, Transform,
};
use crate::services::ProgressReporter;

/// Loader knobs with the character's stock values.
#[derive(Clone, Debug)]
pub struct LoadOptions {
    /// Bones snapped to the ground plane after parse; missing bones are
    /// skipped without failing the load.
    pub foot_bones: Vec<String>,
    pub foot_y: f32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            foot_bones: vec!["footR".into(), "footL".into()],
            foot_y: 3.36,
        }
    }
}

/// A parsed character, not yet part of any scene: the node tree, its
/// animation clips (track paths relative to the fragment root), and the
/// name index resolved at parse time.
#[derive(Debug)]
pub struct CharacterFragment {
    pub root: SceneNode,
    pub clips: Vec<Clip>,
    pub names: HashMap<String, NodePath>,
}

pub struct ModelLoader {
    asset: EncryptedAsset,
    options: LoadOptions,
}

impl ModelLoader {
    pub fn new(asset: EncryptedAsset, options: LoadOptions) -> Self {
        Self { asset, options }
    }

    /// Fetch, decrypt, and parse the character. Decryption failures
    /// propagate unchanged; anything the parser rejects becomes
    /// [`PipelineError::ParseFailed`].
    pub async fn load(&self, progress: &mut dyn ProgressReporter) -> Result<CharacterFragment> {
        progress.report(5.0);
        let plaintext = AssetDecryptor::decrypt(&self.asset).await?;
        progress.report(55.0);
        let mut fragment = parse_fragment(&plaintext)?;
        progress.report(90.0);
        self.correct_feet(&mut fragment);
        progress.report(100.0);
        Ok(fragment)
    }

    fn correct_feet(&self, fragment: &mut CharacterFragment) {
        for name in &self.options.foot_bones {
            let Some(path) = fragment.names.get(name).cloned() else {
                log::debug!("foot bone {name} not present, skipping ground correction");
                continue;
            };
            if let Some(node) = node_mut(&mut fragment.root, &path) {
                node.transform.position.y = self.options.foot_y;
            }
        }
    }
}

fn node_mut<'a>(root: &'a mut SceneNode, path: &NodePath) -> Option<&'a mut SceneNode> {
    let mut node = root;
    for idx in path {
        node = node.children.get_mut(*idx)?;
    }
    Some(node)
}

/// Parse plaintext bytes into a [`CharacterFragment`].
pub fn parse_fragment(bytes: &[u8]) -> Result<CharacterFragment> {
    let gltf = gltf::Gltf::from_slice(bytes)?;

    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => match gltf.blob.as_deref() {
                Some(blob) => buffer_data.push(blob.to_vec()),
                None => {
                    return Err(PipelineError::ParseFailed(
                        "container references a binary chunk it does not carry".into(),
                    ));
                }
            },
            gltf::buffer::Source::Uri(uri) => {
                return Err(PipelineError::ParseFailed(format!(
                    "external buffer reference `{uri}` in a sealed container"
                )));
            }
        }
    }

    let joints: HashSet<usize> = gltf
        .skins()
        .flat_map(|skin| skin.joints().map(|joint| joint.index()))
        .collect();

    let materials = read_materials(&gltf, &buffer_data);

    let mut ctx = ParseCtx {
        buffers: &buffer_data,
        joints: &joints,
        materials: &materials,
        next_geometry: 0,
        names: HashMap::new(),
        node_paths: HashMap::new(),
    };

    // A synthetic group root keeps fragment paths uniform no matter how
    // many roots the exported scene has.
    let mut root = SceneNode::group(None);
    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| PipelineError::ParseFailed("container holds no scene".into()))?;
    for (idx, node) in scene.nodes().enumerate() {
        let mut path = vec![idx];
        let child = build_node(node, &mut path, &mut ctx)?;
        root.children.push(child);
    }

    let clips = read_clips(&gltf, &buffer_data, &ctx.node_paths);

    Ok(CharacterFragment {
        root,
        clips,
        names: ctx.names,
    })
}

struct ParseCtx<'a> {
    buffers: &'a [Vec<u8>],
    joints: &'a HashSet<usize>,
    materials: &'a [Material],
    next_geometry: u32,
    names: HashMap<String, NodePath>,
    node_paths: HashMap<usize, NodePath>,
}

fn build_node(
    node: gltf::Node<'_>,
    path: &mut NodePath,
    ctx: &mut ParseCtx<'_>,
) -> Result<SceneNode> {
    ctx.node_paths.insert(node.index(), path.clone());
    if let Some(name) = node.name() {
        ctx.names
            .entry(name.to_string())
            .or_insert_with(|| path.clone());
    }

    let kind = if let Some(mesh) = node.mesh() {
        NodeKind::Mesh(read_mesh(mesh, ctx)?)
    } else if let Some(light) = node.light() {
        NodeKind::Light(crate::scene::LightData {
            color: light.color(),
            intensity: light.intensity(),
        })
    } else if ctx.joints.contains(&node.index()) {
        NodeKind::Bone
    } else {
        NodeKind::Group
    };

    let (position, rotation, scale) = node.transform().decomposed();
    let transform = Transform {
        position: position.into(),
        rotation: Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
        scale: scale.into(),
    };

    let mut children = Vec::new();
    for (idx, child) in node.children().enumerate() {
        path.push(idx);
        children.push(build_node(child, path, ctx)?);
        path.pop();
    }

    Ok(SceneNode {
        name: node.name().map(str::to_string),
        transform,
        kind,
        children,
    })
}

fn read_mesh(mesh: gltf::Mesh<'_>, ctx: &mut ParseCtx<'_>) -> Result<MeshData> {
    let mut primitives = Vec::new();
    for primitive in mesh.primitives() {
        let reader = primitive.reader(|buffer| ctx.buffers.get(buffer.index()).map(Vec::as_slice));

        let mut vertices = Vec::new();
        if let Some(positions) = reader.read_positions() {
            for position in positions {
                vertices.push(ModelVertex {
                    position,
                    tex_coords: Default::default(),
                    normal: Default::default(),
                });
            }
        }
        if let Some(normals) = reader.read_normals() {
            for (idx, normal) in normals.enumerate() {
                if let Some(vertex) = vertices.get_mut(idx) {
                    vertex.normal = normal;
                }
            }
        }
        if let Some(tex_coords) = reader.read_tex_coords(0).map(|tc| tc.into_f32()) {
            for (idx, uv) in tex_coords.enumerate() {
                if let Some(vertex) = vertices.get_mut(idx) {
                    vertex.tex_coords = uv;
                }
            }
        }

        let indices = match reader.read_indices() {
            Some(raw) => raw.into_u32().collect(),
            None => (0..vertices.len() as u32).collect(),
        };

        let material = primitive
            .material()
            .index()
            .and_then(|idx| ctx.materials.get(idx).cloned())
            .unwrap_or_default();

        let geometry = Geometry::new(ctx.next_geometry, vertices, indices);
        ctx.next_geometry += 1;
        primitives.push(Primitive { geometry, material });
    }

    // Every character mesh participates in shadows and gets culled against
    // the view frustum.
    Ok(MeshData {
        primitives,
        cast_shadow: true,
        receive_shadow: true,
        frustum_culled: true,
    })
}

fn read_materials(gltf: &gltf::Gltf, buffers: &[Vec<u8>]) -> Vec<Material> {
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let pbr = material.pbr_metallic_roughness();
        let texture = pbr.base_color_texture().and_then(|info| {
            match info.texture().source().source() {
                gltf::image::Source::View { view, .. } => {
                    let buffer = buffers.get(view.buffer().index())?;
                    let bytes = buffer.get(view.offset()..view.offset() + view.length())?;
                    decode_texture(bytes)
                }
                gltf::image::Source::Uri { uri, .. } => {
                    log::warn!("skipping external image `{uri}` in a sealed container");
                    None
                }
            }
        });
        materials.push(Material::new(pbr.base_color_factor(), texture));
    }
    materials
}

fn decode_texture(bytes: &[u8]) -> Option<Arc<TextureImage>> {
    match image::load_from_memory(bytes) {
        Ok(decoded) => {
            let rgba = decoded.to_rgba8();
            Some(Arc::new(TextureImage {
                width: rgba.width(),
                height: rgba.height(),
                rgba: rgba.into_raw(),
            }))
        }
        Err(e) => {
            log::warn!("could not decode embedded texture: {e}");
            None
        }
    }
}

fn read_clips(
    gltf: &gltf::Gltf,
    buffers: &[Vec<u8>],
    node_paths: &HashMap<usize, NodePath>,
) -> Vec<Clip> {
    let mut clips = Vec::new();
    for animation in gltf.animations() {
        let name = animation.name().unwrap_or("Default").to_string();
        let mut tracks = Vec::new();
        for channel in animation.channels() {
            let Some(target) = node_paths.get(&channel.target().node().index()).cloned() else {
                continue;
            };
            let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
            let times: Vec<f32> = match reader.read_inputs() {
                Some(gltf::accessor::Iter::Standard(times)) => times.collect(),
                _ => {
                    log::debug!("channel {} has no standard timestamps", channel.index());
                    continue;
                }
            };
            let values = match reader.read_outputs() {
                Some(gltf::animation::util::ReadOutputs::Translations(translations)) => {
                    TrackValues::Translation(translations.map(Into::into).collect())
                }
                Some(gltf::animation::util::ReadOutputs::Rotations(rotations)) => {
                    TrackValues::Rotation(
                        rotations
                            .into_f32()
                            .map(|q| Quaternion::new(q[3], q[0], q[1], q[2]))
                            .collect(),
                    )
                }
                Some(gltf::animation::util::ReadOutputs::Scales(scales)) => {
                    TrackValues::Scale(scales.map(Into::into).collect())
                }
                _ => {
                    log::debug!("skipping unsupported channel {} outputs", channel.index());
                    continue;
                }
            };
            tracks.push(Track {
                target,
                times,
                values,
            });
        }
        if !tracks.is_empty() {
            clips.push(Clip { name, tracks });
        }
    }
    clips
}
