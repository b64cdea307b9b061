use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use bytemuck::bytes_of;
use log::{debug, error, info, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use super::shared::{neutral_texel, GlobalUniform, ObjectUniform, SHADER};
use crate::animation::{Frame, FrameSink};
use crate::geometry::{Geometry, VERTEX_STRIDE};
use crate::light::{ambient_radiance, SpotLightState};
use crate::material::{Color, Material, MaterialKind, RenderState, TextureChannel};
use crate::texture::TextureImage;
use crate::viewport::{capped_pixel_ratio, RenderTarget, ViewportState};

/// GPU renderer backed by wgpu that draws the scene graph into a window.
pub struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    viewport: ViewportState,
    depth: DepthBuffer,
    /// The shader writes sRGB itself because the surface format is linear.
    encode_srgb: bool,
    shader: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    global_buffer: wgpu::Buffer,
    global_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    neutral_textures: Vec<GpuTexture>,
    neutral_bind_group: wgpu::BindGroup,
    mesh_cache: HashMap<u64, MeshBuffers>,
    material_cache: HashMap<u64, MaterialBindings>,
    texture_cache: HashMap<usize, GpuTexture>,
}

impl Renderer {
    /// Initializes the GPU renderer for the provided window.
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(anyhow!("window has zero area"));
        }

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance.create_surface(Arc::clone(&window))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("renderer-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let (surface_format, encode_srgb) = choose_surface_format(&surface_caps.formats)
            .context("surface reports no supported formats")?;
        if encode_srgb {
            warn!("surface offers no sRGB format; encoding {surface_format:?} output in the shader");
        }

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let depth = DepthBuffer::create(&device, config.width, config.height);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("renderer-shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let global_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("global-bind-layout"),
            entries: &[uniform_entry(0, std::mem::size_of::<GlobalUniform>())],
        });
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object-bind-layout"),
            entries: &[uniform_entry(0, std::mem::size_of::<ObjectUniform>())],
        });

        // Five texture channels followed by the shared sampler.
        let mut material_entries: Vec<wgpu::BindGroupLayoutEntry> = TextureChannel::ALL
            .iter()
            .map(|channel| wgpu::BindGroupLayoutEntry {
                binding: channel.index() as u32,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            })
            .collect();
        material_entries.push(wgpu::BindGroupLayoutEntry {
            binding: SAMPLER_BINDING,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material-bind-layout"),
            entries: &material_entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("renderer-pipeline-layout"),
            bind_group_layouts: &[&global_layout, &object_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let global_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("global-uniform"),
            size: std::mem::size_of::<GlobalUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let global_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("global-bind-group"),
            layout: &global_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: global_buffer.as_entire_binding(),
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("material-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let neutral_textures: Vec<GpuTexture> = TextureChannel::ALL
            .iter()
            .map(|channel| {
                GpuTexture::upload(
                    &device,
                    &queue,
                    &TextureImage::solid(neutral_texel(*channel)),
                    channel.is_color(),
                    &format!("neutral-{channel:?}"),
                )
            })
            .collect();
        let neutral_views: Vec<&wgpu::TextureView> =
            neutral_textures.iter().map(|texture| &texture.view).collect();
        let neutral_bind_group = create_material_bind_group(
            &device,
            &material_layout,
            &neutral_views,
            &sampler,
            "neutral-material",
        );

        let scale_factor = window.scale_factor();
        let logical = size.to_logical::<u32>(scale_factor);
        let viewport = ViewportState {
            width: logical.width.max(1),
            height: logical.height.max(1),
            pixel_ratio: capped_pixel_ratio(scale_factor),
        };

        info!(
            "renderer ready: {:?} on {}",
            surface_format,
            adapter.get_info().name
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            viewport,
            depth,
            encode_srgb,
            shader,
            pipeline_layout,
            pipelines: HashMap::new(),
            global_buffer,
            global_bind_group,
            object_layout,
            material_layout,
            sampler,
            neutral_textures,
            neutral_bind_group,
            mesh_cache: HashMap::new(),
            material_cache: HashMap::new(),
            texture_cache: HashMap::new(),
        })
    }

    /// Returns the identifier of the window owned by the renderer.
    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    /// Exposes the inner window for event handling.
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Resizes the swap chain to match the new dimensions.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        if new_size.width == self.config.width && new_size.height == self.config.height {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthBuffer::create(&self.device, new_size.width, new_size.height);
        debug!("surface resized to {}x{}", new_size.width, new_size.height);
    }

    fn apply_viewport(&mut self) {
        let (width, height) = self.viewport.drawing_buffer_size();
        self.resize(PhysicalSize::new(width, height));
    }

    /// Draws every mesh reachable from the graph root; opaque materials first,
    /// then the blended ones, each through the pipeline its material asks for.
    pub fn render(&mut self, frame: &Frame<'_>) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("renderer-encoder"),
            });

        let spot = SpotLightState::from_graph(frame.graph);
        let globals = GlobalUniform::new(
            frame.camera,
            spot.as_ref(),
            ambient_radiance(frame.graph),
            frame.fog,
            self.encode_srgb,
        );
        self.queue
            .write_buffer(&self.global_buffer, 0, bytes_of(&globals));

        let mut draw_list = Vec::new();
        for (model, mesh) in frame.graph.drawables() {
            self.ensure_mesh_loaded(&mesh.geometry);
            let pipeline = PipelineKey::for_material(&mesh.material);
            self.ensure_pipeline(pipeline);
            let ready = self.ensure_material(&mesh.material);
            let constants = ObjectUniform::new(model, &mesh.material, ready);

            let object_buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("object-uniform"),
                    contents: bytes_of(&constants),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
            let object_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &self.object_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: object_buffer.as_entire_binding(),
                }],
                label: Some("object-bind-group"),
            });

            draw_list.push(DrawCall {
                geometry: mesh.geometry.id(),
                material: mesh.material.id(),
                pipeline,
                object_bind_group,
            });
        }
        draw_list.sort_by_key(|draw| draw.pipeline.state.blended);

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("main-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color(frame.clear_color, self.encode_srgb)),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_bind_group(0, &self.global_bind_group, &[]);

        for draw in &draw_list {
            let Some(mesh) = self.mesh_cache.get(&draw.geometry) else {
                continue;
            };
            let Some(pipeline) = self.pipelines.get(&draw.pipeline) else {
                continue;
            };
            let material_group = if draw.pipeline.shading == Shading::Unlit {
                &self.neutral_bind_group
            } else {
                self.material_cache
                    .get(&draw.material)
                    .map(|bindings| &bindings.bind_group)
                    .unwrap_or(&self.neutral_bind_group)
            };
            pass.set_pipeline(pipeline);
            pass.set_vertex_buffer(0, mesh.vertex.slice(..));
            pass.set_index_buffer(mesh.index.slice(..), wgpu::IndexFormat::Uint32);
            pass.set_bind_group(1, &draw.object_bind_group, &[]);
            pass.set_bind_group(2, material_group, &[]);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }

        drop(pass);
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn ensure_mesh_loaded(&mut self, geometry: &Geometry) {
        if self.mesh_cache.contains_key(&geometry.id()) {
            return;
        }
        let mesh = MeshBuffers::from_geometry(&self.device, geometry);
        self.mesh_cache.insert(geometry.id(), mesh);
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let pipeline = create_pipeline(
            &self.device,
            &self.pipeline_layout,
            &self.shader,
            self.config.format,
            key,
        );
        debug!("created {key:?} pipeline");
        self.pipelines.insert(key, pipeline);
    }

    /// Uploads newly decoded maps and rebuilds the material's bind group when
    /// the set of ready channels changed. Returns the ready channels.
    fn ensure_material(&mut self, material: &Material) -> [bool; 5] {
        let mut ready = [false; 5];
        let Some(textures) = material.textures() else {
            return ready;
        };

        for channel in TextureChannel::ALL {
            let Some(handle) = textures.get(channel) else {
                continue;
            };
            if self.texture_cache.contains_key(&handle.key()) {
                ready[channel.index()] = true;
                continue;
            }
            let Some(image) = handle.image() else {
                continue;
            };
            let max = self.device.limits().max_texture_dimension_2d;
            if image.width > max || image.height > max {
                error!(
                    "texture {} is {}x{}, larger than the GPU limit of {max}",
                    handle.path().display(),
                    image.width,
                    image.height
                );
                continue;
            }
            let texture = GpuTexture::upload(
                &self.device,
                &self.queue,
                &image,
                channel.is_color(),
                &handle.path().display().to_string(),
            );
            debug!("uploaded {:?} map {}", channel, handle.path().display());
            self.texture_cache.insert(handle.key(), texture);
            ready[channel.index()] = true;
        }

        if let Some(bindings) = self.material_cache.get(&material.id()) {
            if bindings.ready == ready {
                return ready;
            }
        }

        let views: Vec<&wgpu::TextureView> = TextureChannel::ALL
            .iter()
            .map(|channel| {
                textures
                    .get(*channel)
                    .filter(|_| ready[channel.index()])
                    .and_then(|handle| self.texture_cache.get(&handle.key()))
                    .map(|texture| &texture.view)
                    .unwrap_or(&self.neutral_textures[channel.index()].view)
            })
            .collect();
        let bind_group = create_material_bind_group(
            &self.device,
            &self.material_layout,
            &views,
            &self.sampler,
            &format!("material-{}", material.id()),
        );
        self.material_cache
            .insert(material.id(), MaterialBindings { bind_group, ready });
        ready
    }
}

impl RenderTarget for Renderer {
    fn set_size(&mut self, width: u32, height: u32) {
        self.viewport.width = width.max(1);
        self.viewport.height = height.max(1);
        self.apply_viewport();
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.viewport.pixel_ratio = ratio;
        self.apply_viewport();
    }
}

impl FrameSink for Renderer {
    fn draw(&mut self, frame: &Frame<'_>) -> Result<()> {
        match self.render(frame) {
            Ok(()) => Ok(()),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                Ok(())
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(anyhow!("GPU is out of memory")),
            Err(other) => {
                info!("surface error {other:?}; retrying next frame");
                Ok(())
            }
        }
    }
}

const SAMPLER_BINDING: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Shading {
    /// Standard materials lit by the ambient and spot lights.
    Lit,
    /// Basic materials drawn in their flat colour.
    Unlit,
}

/// Shader entry point plus fixed-function state; one pipeline per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    shading: Shading,
    state: RenderState,
}

impl PipelineKey {
    fn for_material(material: &Material) -> Self {
        let shading = match material.kind {
            MaterialKind::Standard(_) => Shading::Lit,
            MaterialKind::Basic(_) => Shading::Unlit,
        };
        Self {
            shading,
            state: material.render_state(),
        }
    }

    fn fragment_entry(&self) -> &'static str {
        match self.shading {
            Shading::Lit => "fs_standard",
            Shading::Unlit => "fs_basic",
        }
    }

    fn cull_mode(&self) -> Option<wgpu::Face> {
        (!self.state.double_sided).then_some(wgpu::Face::Back)
    }

    fn blend(&self) -> wgpu::BlendState {
        if self.state.blended {
            wgpu::BlendState::ALPHA_BLENDING
        } else {
            wgpu::BlendState::REPLACE
        }
    }
}

/// Prefers an sRGB format; otherwise takes the first one and reports that
/// the shader must encode.
fn choose_surface_format(formats: &[wgpu::TextureFormat]) -> Option<(wgpu::TextureFormat, bool)> {
    formats
        .iter()
        .find(|format| format.is_srgb())
        .map(|format| (*format, false))
        .or_else(|| formats.first().map(|format| (*format, true)))
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    key: PipelineKey,
) -> wgpu::RenderPipeline {
    let label = format!("{:?}-pipeline", key.shading).to_lowercase();
    let float_size = std::mem::size_of::<f32>() as u64;
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: VERTEX_STRIDE as u64 * float_size,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: 0,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 3 * float_size,
                        shader_location: 1,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x2,
                        offset: 6 * float_size,
                        shader_location: 2,
                    },
                    wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x2,
                        offset: 8 * float_size,
                        shader_location: 3,
                    },
                ],
            }],
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: key.cull_mode(),
            polygon_mode: wgpu::PolygonMode::Fill,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DepthBuffer::FORMAT,
            depth_write_enabled: key.state.depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: key.fragment_entry(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(key.blend()),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        multiview: None,
    })
}

fn uniform_entry(binding: u32, size: usize) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(size as u64),
        },
        count: None,
    }
}

fn create_material_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    views: &[&wgpu::TextureView],
    sampler: &wgpu::Sampler,
    label: &str,
) -> wgpu::BindGroup {
    let mut entries: Vec<wgpu::BindGroupEntry> = views
        .iter()
        .enumerate()
        .map(|(binding, view)| wgpu::BindGroupEntry {
            binding: binding as u32,
            resource: wgpu::BindingResource::TextureView(view),
        })
        .collect();
    entries.push(wgpu::BindGroupEntry {
        binding: SAMPLER_BINDING,
        resource: wgpu::BindingResource::Sampler(sampler),
    });
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &entries,
    })
}

/// Clear colours bypass the shader, so linear targets get the sRGB value.
fn clear_color(color: Color, encode_srgb: bool) -> wgpu::Color {
    let value = if encode_srgb {
        glam::Vec3::new(color.r, color.g, color.b)
    } else {
        color.to_linear()
    };
    wgpu::Color {
        r: value.x as f64,
        g: value.y as f64,
        b: value.z as f64,
        a: 1.0,
    }
}

struct DrawCall {
    geometry: u64,
    material: u64,
    pipeline: PipelineKey,
    object_bind_group: wgpu::BindGroup,
}

struct MaterialBindings {
    bind_group: wgpu::BindGroup,
    ready: [bool; 5],
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    fn from_geometry(device: &wgpu::Device, geometry: &Geometry) -> Self {
        let label = format!("geometry-{}", geometry.id());
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&geometry.interleaved()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: geometry.indices.len() as u32,
        }
    }
}

struct GpuTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl GpuTexture {
    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &TextureImage,
        srgb: bool,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: if srgb {
                wgpu::TextureFormat::Rgba8UnormSrgb
            } else {
                wgpu::TextureFormat::Rgba8Unorm
            },
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width),
                rows_per_image: Some(image.height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}
