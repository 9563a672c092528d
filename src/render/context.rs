//! wgpu-backed draw target: surface, device, pipeline, and the per-mesh
//! GPU buffer cache.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use cgmath::SquareMatrix;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::loader::CharacterFragment;
use crate::render::texture::Texture;
use crate::render::DrawTarget;
use crate::scene::camera::{Camera, CameraUniform};
use crate::scene::lighting::LightRig;
use crate::scene::{NodeKind, Primitive, SceneGraph, SceneNode, Transform};

/// Per-draw transform data as stored in the instance vertex buffer slot.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
    handedness: f32,
}

impl InstanceRaw {
    fn from_transform(world: &Transform) -> Self {
        let model = world.to_matrix();
        Self {
            model: model.into(),
            normal: cgmath::Matrix3::from(world.rotation).into(),
            handedness: model.determinant().signum(),
        }
    }

    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 25]>() as wgpu::BufferAddress,
                    shader_location: 12,
                    format: wgpu::VertexFormat::Float32,
                },
            ],
        }
    }
}

fn vertex_desc() -> wgpu::VertexBufferLayout<'static> {
    use std::mem;
    wgpu::VertexBufferLayout {
        array_stride: mem::size_of::<crate::scene::ModelVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
            wgpu::VertexAttribute {
                offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    }
}

/// Uploaded GPU state for one primitive.
struct GpuPrimitive {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
    instance_buffer: wgpu::Buffer,
    material_group: wgpu::BindGroup,
}

pub struct GpuContext {
    #[allow(unused)]
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_texture: Texture,
    material_layout: wgpu::BindGroupLayout,
    camera_layout: wgpu::BindGroupLayout,
    light_layout: wgpu::BindGroupLayout,
    pipeline: Option<wgpu::RenderPipeline>,
    camera_buffer: wgpu::Buffer,
    camera_group: wgpu::BindGroup,
    light_buffer: wgpu::Buffer,
    light_group: wgpu::BindGroup,
    meshes: HashMap<u32, GpuPrimitive>,
    disposed: bool,
}

impl GpuContext {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| anyhow!("no suitable GPU adapter: {e}"))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");

        let uniform_layout_entry = wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[uniform_layout_entry],
            label: Some("camera_bind_group_layout"),
        });
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[CameraUniform {
                view_pos: [0.0; 4],
                view_proj: cgmath::Matrix4::identity().into(),
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let light_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[uniform_layout_entry],
            label: Some("light_bind_group_layout"),
        });
        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Buffer"),
            contents: bytemuck::cast_slice(&[LightRig::new().uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let light_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &light_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: light_buffer.as_entire_binding(),
            }],
            label: Some("light_bind_group"),
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
            label: Some("material_bind_group_layout"),
        });

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            depth_texture,
            material_layout,
            camera_layout,
            light_layout,
            pipeline: None,
            camera_buffer,
            camera_group,
            light_buffer,
            light_group,
            meshes: HashMap::new(),
            disposed: false,
        })
    }

    fn ensure_pipeline(&mut self) {
        if self.pipeline.is_some() {
            return;
        }
        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Character Pipeline Layout"),
                bind_group_layouts: &[&self.material_layout, &self.camera_layout, &self.light_layout],
                push_constant_ranges: &[],
            });
        let shader = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("Character Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("character.wgsl").into()),
            });
        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                cache: None,
                label: Some("Character Pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[vertex_desc(), InstanceRaw::desc()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.config.format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: Texture::DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
            });
        self.pipeline = Some(pipeline);
    }

    fn upload_primitive(&mut self, primitive: &Primitive) {
        if self.meshes.contains_key(&primitive.geometry.id) || primitive.geometry.is_disposed() {
            return;
        }
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Character Vertex Buffer"),
                contents: bytemuck::cast_slice(&primitive.geometry.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Character Index Buffer"),
                contents: bytemuck::cast_slice(&primitive.geometry.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        let instance_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Character Instance Buffer"),
                contents: bytemuck::cast_slice(&[InstanceRaw::from_transform(
                    &Transform::default(),
                )]),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });

        let texture = match &primitive.material.base_color_texture {
            Some(image) => Texture::from_image(&self.device, &self.queue, image),
            None => Texture::default_white(&self.device, &self.queue),
        };
        let color_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Material Color Buffer"),
                contents: bytemuck::cast_slice(&primitive.material.base_color_factor),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let material_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: color_buffer.as_entire_binding(),
                },
            ],
            label: Some("material_bind_group"),
        });

        self.meshes.insert(
            primitive.geometry.id,
            GpuPrimitive {
                vertex_buffer,
                index_buffer,
                num_indices: primitive.geometry.indices.len() as u32,
                instance_buffer,
                material_group,
            },
        );
    }
}

fn collect_fragment_primitives<'a>(node: &'a SceneNode, out: &mut Vec<&'a Primitive>) {
    if let NodeKind::Mesh(mesh) = &node.kind {
        out.extend(mesh.primitives.iter());
    }
    for child in &node.children {
        collect_fragment_primitives(child, out);
    }
}

impl DrawTarget for GpuContext {
    fn resize(&mut self, width: u32, height: u32) {
        if self.disposed || width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            Texture::create_depth_texture(&self.device, [width, height], "depth_texture");
    }

    fn warm_up(&mut self, fragment: &CharacterFragment, _camera: &Camera) -> anyhow::Result<()> {
        if self.disposed {
            return Err(anyhow!("draw target already disposed"));
        }
        self.ensure_pipeline();
        let mut primitives = Vec::new();
        collect_fragment_primitives(&fragment.root, &mut primitives);
        for primitive in primitives {
            self.upload_primitive(primitive);
        }
        Ok(())
    }

    fn draw(&mut self, scene: &SceneGraph, camera: &Camera, rig: &LightRig) -> anyhow::Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.ensure_pipeline();

        self.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[CameraUniform::from_camera(camera)]),
        );
        self.queue
            .write_buffer(&self.light_buffer, 0, bytemuck::cast_slice(&[rig.uniform()]));

        // Gather visible primitives and lazily upload anything the warm-up
        // has not seen.
        let mut draws: Vec<(u32, InstanceRaw)> = Vec::new();
        let mut pending: Vec<Primitive> = Vec::new();
        scene.visit(&mut |node, world| {
            if let NodeKind::Mesh(mesh) = &node.kind {
                for primitive in &mesh.primitives {
                    if primitive.geometry.is_disposed() {
                        continue;
                    }
                    if !self.meshes.contains_key(&primitive.geometry.id) {
                        pending.push(primitive.clone());
                    }
                    draws.push((primitive.geometry.id, InstanceRaw::from_transform(world)));
                }
            }
        });
        for primitive in &pending {
            self.upload_primitive(primitive);
        }
        for (id, raw) in &draws {
            if let Some(gpu) = self.meshes.get(id) {
                self.queue
                    .write_buffer(&gpu.instance_buffer, 0, bytemuck::cast_slice(&[*raw]));
            }
        }

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(e) => return Err(anyhow!("surface unavailable: {e}")),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(pipeline) = &self.pipeline {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(1, &self.camera_group, &[]);
                render_pass.set_bind_group(2, &self.light_group, &[]);
                for (id, _) in &draws {
                    let Some(gpu) = self.meshes.get(id) else {
                        continue;
                    };
                    render_pass.set_bind_group(0, &gpu.material_group, &[]);
                    render_pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                    render_pass.set_vertex_buffer(1, gpu.instance_buffer.slice(..));
                    render_pass
                        .set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..gpu.num_indices, 0, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.meshes.clear();
        self.pipeline = None;
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}
