use std::sync::Arc;

use glam::DMat4;
use image::RgbaImage;
use thiserror::Error;
use wgpu::util::DeviceExt;

use crate::background::surface_texture;
use crate::math::mesh::{BACKGROUND_QUAD, StripMesh, build_sphere};
use crate::renderer::frame::{ColorMask, FramePlan, PassDesc, PassDraw};
use crate::renderer::stereo::{Eye, EyeView};
use crate::renderer::textures::{DynamicTexture, linear_sampler};
use crate::scene::SceneState;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const SURFACE_TEXTURE_SIZE: u32 = 256;
const MARKER_RADIUS: f32 = 0.4;
const SURFACE_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const MARKER_COLOR: [f32; 4] = [1.0, 0.85, 0.3, 1.0];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create window surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    Adapter,
    #[error("failed to open GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("window surface reports no texture formats")]
    SurfaceFormat,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniforms {
    pub projection: [[f32; 4]; 4],
    pub model_view: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub light_position: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub base_color: [f32; 4],
    pub material: [f32; 4],
    pub user_point: [f32; 4],
}

impl DrawUniforms {
    /// `model` is applied before the eye's model-view.
    pub fn new(view: &EyeView, model: DMat4, scene: &SceneState, base_color: [f32; 4], texture_weight: f32) -> Self {
        let model_view = view.model_view * model;
        let normal_matrix = model_view.inverse().transpose();
        let light = &scene.lighting;
        let anchor = scene.texture_anchor();
        let rgb = |c: [f32; 3]| [c[0], c[1], c[2], 1.0];

        Self {
            projection: view.projection.as_mat4().to_cols_array_2d(),
            model_view: model_view.as_mat4().to_cols_array_2d(),
            normal_matrix: normal_matrix.as_mat4().to_cols_array_2d(),
            light_position: rgb(light.light_position),
            ambient: rgb(light.ambient),
            diffuse: rgb(light.diffuse),
            specular: rgb(light.specular),
            base_color,
            material: [light.shininess, scene.texture_angle(), texture_weight, 0.0],
            user_point: [anchor[0], anchor[1], 0.0, 0.0],
        }
    }
}

static POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
static NORMAL_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];
static TEXCOORD_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x2];
static QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

/// Positions, normals and texcoords live in separate buffers.
fn lit_vertex_layouts() -> [wgpu::VertexBufferLayout<'static>; 3] {
    let layout = |stride: u64, attributes: &'static [wgpu::VertexAttribute]| wgpu::VertexBufferLayout {
        array_stride: stride,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    };
    [
        layout(12, &POSITION_ATTRIBUTES),
        layout(12, &NORMAL_ATTRIBUTES),
        layout(8, &TEXCOORD_ATTRIBUTES),
    ]
}

fn quad_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 20,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &QUAD_ATTRIBUTES,
    }
}

/// Strip buffers for the surface, reallocated only when a mesh outgrows them.
pub struct SurfaceBuffers {
    pub position: wgpu::Buffer,
    pub normal: wgpu::Buffer,
    pub texcoord: wgpu::Buffer,
    capacity: usize,
    pub vertex_count: u32,
}

impl SurfaceBuffers {
    fn allocate(device: &wgpu::Device, capacity: usize) -> Self {
        let buffer = |label: &str, components: usize| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: (capacity.max(1) * components * 4) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };

        Self {
            position: buffer("Surface Position Buffer", 3),
            normal: buffer("Surface Normal Buffer", 3),
            texcoord: buffer("Surface Texcoord Buffer", 2),
            capacity,
            vertex_count: 0,
        }
    }

    /// Keeps the previous mesh when the new one would not fit in a single
    /// buffer on this device.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, mesh: &StripMesh) {
        let count = mesh.vertex_count();
        let bytes = count as u64 * 12;
        if bytes > device.limits().max_buffer_size {
            log::warn!(
                "mesh of {} vertices needs {} byte buffers, device limit is {}",
                count,
                bytes,
                device.limits().max_buffer_size
            );
            return;
        }
        if count > self.capacity {
            log::debug!("growing surface buffers {} -> {} vertices", self.capacity, count);
            *self = Self::allocate(device, count);
        }

        queue.write_buffer(&self.position, 0, bytemuck::cast_slice(&mesh.positions));
        queue.write_buffer(&self.normal, 0, bytemuck::cast_slice(&mesh.normals));
        queue.write_buffer(&self.texcoord, 0, bytemuck::cast_slice(&mesh.texcoords));
        self.vertex_count = count as u32;
    }
}

pub struct MarkerBuffers {
    pub position: wgpu::Buffer,
    pub normal: wgpu::Buffer,
    pub texcoord: wgpu::Buffer,
    pub index: wgpu::Buffer,
    pub index_count: u32,
}

impl MarkerBuffers {
    fn new(device: &wgpu::Device) -> Self {
        let sphere = build_sphere(MARKER_RADIUS, 16, 24);
        let vertex = |label: &str, data: &[f32]| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            })
        };

        Self {
            position: vertex("Marker Position Buffer", &sphere.vertices),
            normal: vertex("Marker Normal Buffer", &sphere.normals),
            texcoord: vertex("Marker Texcoord Buffer", &sphere.texcoords),
            index: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Marker Index Buffer"),
                contents: bytemuck::cast_slice(&sphere.indices),
                usage: wgpu::BufferUsages::INDEX,
            }),
            index_count: sphere.indices.len() as u32,
        }
    }
}

/// One uniform buffer and bind group per eye, so both eyes can be written
/// before the frame is submitted.
struct EyeBindings {
    uniforms: [wgpu::Buffer; 2],
    bind_groups: [wgpu::BindGroup; 2],
}

impl EyeBindings {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        texture: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> Self {
        let make = |eye: &str| {
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("{label} Uniforms ({eye})")),
                size: std::mem::size_of::<DrawUniforms>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{label} Bind Group ({eye})")),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(texture),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            });
            (buffer, bind_group)
        };

        let (left_buffer, left_group) = make("left");
        let (right_buffer, right_group) = make("right");
        Self {
            uniforms: [left_buffer, right_buffer],
            bind_groups: [left_group, right_group],
        }
    }

    fn write(&self, queue: &wgpu::Queue, eye: Eye, uniforms: &DrawUniforms) {
        queue.write_buffer(&self.uniforms[eye_index(eye)], 0, bytemuck::cast_slice(&[*uniforms]));
    }

    fn bind_group(&self, eye: Eye) -> &wgpu::BindGroup {
        &self.bind_groups[eye_index(eye)]
    }
}

fn eye_index(eye: Eye) -> usize {
    match eye {
        Eye::Left => 0,
        Eye::Right => 1,
    }
}

/// Pipelines differing only in their color write mask.
struct MaskedPipelines {
    variants: Vec<(ColorMask, wgpu::RenderPipeline)>,
}

impl MaskedPipelines {
    fn get(&self, mask: ColorMask) -> Option<&wgpu::RenderPipeline> {
        self.variants
            .iter()
            .find(|(m, _)| *m == mask)
            .map(|(_, pipeline)| pipeline)
    }
}

pub struct GpuState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,

    surface_pipelines: MaskedPipelines,
    marker_pipelines: MaskedPipelines,
    background_pipeline: wgpu::RenderPipeline,

    background_layout: wgpu::BindGroupLayout,
    background_bind_group: wgpu::BindGroup,
    background_texture: DynamicTexture,
    background_sampler: wgpu::Sampler,
    quad_buffer: wgpu::Buffer,

    surface_bindings: EyeBindings,
    marker_bindings: EyeBindings,

    pub surface_buffers: SurfaceBuffers,
    pub marker_buffers: MarkerBuffers,

    pub depth_texture: wgpu::TextureView,
}

impl GpuState {
    pub async fn new(window: Arc<winit::window::Window>, vsync: bool) -> Result<Self, RenderError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::Adapter)?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::SurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: present_mode(vsync),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let lit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Lit Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders.wgsl").into()),
        });
        let background_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Background Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("background.wgsl").into()),
        });

        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let sampler_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };

        let lit_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Lit Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                texture_entry(1),
                sampler_entry(2),
            ],
        });

        let background_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Background Bind Group Layout"),
            entries: &[texture_entry(0), sampler_entry(1)],
        });

        let lit_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Lit Pipeline Layout"),
            bind_group_layouts: &[&lit_layout],
            push_constant_ranges: &[],
        });
        let background_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Background Pipeline Layout"),
                bind_group_layouts: &[&background_layout],
                push_constant_ranges: &[],
            });

        let masks = [
            ColorMask::for_eye(Eye::Left),
            ColorMask::for_eye(Eye::Right),
            ColorMask::ALL,
        ];
        let masked = |label: &str, topology: wgpu::PrimitiveTopology| MaskedPipelines {
            variants: masks
                .iter()
                .map(|&mask| {
                    let pipeline = lit_pipeline(
                        &device,
                        &lit_pipeline_layout,
                        &lit_shader,
                        config.format,
                        topology,
                        mask,
                        label,
                    );
                    (mask, pipeline)
                })
                .collect(),
        };
        let surface_pipelines = masked("Surface Pipeline", wgpu::PrimitiveTopology::TriangleStrip);
        let marker_pipelines = masked("Marker Pipeline", wgpu::PrimitiveTopology::TriangleList);

        let background_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Background Pipeline"),
            layout: Some(&background_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &background_shader,
                entry_point: Some("vs_background"),
                buffers: &[quad_vertex_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &background_shader,
                entry_point: Some("fs_background"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let surface_tex = DynamicTexture::from_image(
            &device,
            &queue,
            "Surface Texture",
            &surface_texture(SURFACE_TEXTURE_SIZE),
        );
        let repeat_sampler = linear_sampler(&device, "Surface Sampler", wgpu::AddressMode::Repeat);
        let surface_bindings =
            EyeBindings::new(&device, &lit_layout, "Surface", &surface_tex.view, &repeat_sampler);
        let marker_bindings =
            EyeBindings::new(&device, &lit_layout, "Marker", &surface_tex.view, &repeat_sampler);

        let background_texture = DynamicTexture::new(&device, "Background Texture", 1, 1);
        let background_sampler =
            linear_sampler(&device, "Background Sampler", wgpu::AddressMode::ClampToEdge);
        let background_bind_group = background_bind_group(
            &device,
            &background_layout,
            &background_texture,
            &background_sampler,
        );

        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Background Quad Buffer"),
            contents: bytemuck::cast_slice(&BACKGROUND_QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let surface_buffers = SurfaceBuffers::allocate(&device, 0);
        let marker_buffers = MarkerBuffers::new(&device);

        let depth_texture = Self::create_depth_texture(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            surface_pipelines,
            marker_pipelines,
            background_pipeline,
            background_layout,
            background_bind_group,
            background_texture,
            background_sampler,
            quad_buffer,
            surface_bindings,
            marker_bindings,
            surface_buffers,
            marker_buffers,
            depth_texture,
        })
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
    ) -> wgpu::TextureView {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            log::debug!("resize to {}x{}", new_size.width, new_size.height);
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = Self::create_depth_texture(&self.device, &self.config);
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.config.width.max(1) as f64 / self.config.height.max(1) as f64
    }

    pub fn set_vsync(&mut self, enabled: bool) {
        self.config.present_mode = present_mode(enabled);
        self.surface.configure(&self.device, &self.config);
    }

    pub fn upload_mesh(&mut self, mesh: &StripMesh) {
        self.surface_buffers.upload(&self.device, &self.queue, mesh);
    }

    pub fn upload_background(&mut self, frame: &RgbaImage) {
        if self.background_texture.upload(&self.device, &self.queue, frame) {
            self.background_bind_group = background_bind_group(
                &self.device,
                &self.background_layout,
                &self.background_texture,
                &self.background_sampler,
            );
        }
    }

    /// Writes both eyes' uniforms for the surface and, when `marker` is set,
    /// for the sphere translated to it.
    pub fn update_draw_uniforms(
        &self,
        scene: &SceneState,
        left: &EyeView,
        right: &EyeView,
        marker: Option<DMat4>,
    ) {
        for view in [left, right] {
            let uniforms =
                DrawUniforms::new(view, DMat4::IDENTITY, scene, SURFACE_COLOR, scene.texture_weight);
            self.surface_bindings.write(&self.queue, view.eye, &uniforms);

            if let Some(model) = marker {
                let uniforms = DrawUniforms::new(view, model, scene, MARKER_COLOR, 0.0);
                self.marker_bindings.write(&self.queue, view.eye, &uniforms);
            }
        }
    }

    pub fn render_frame(
        &self,
        view: &wgpu::TextureView,
        encoder: &mut wgpu::CommandEncoder,
        plan: &FramePlan,
    ) {
        for pass in plan.passes() {
            self.encode_pass(view, encoder, &pass);
        }
    }

    fn encode_pass(&self, view: &wgpu::TextureView, encoder: &mut wgpu::CommandEncoder, pass: &PassDesc) {
        let color_load = if pass.clear_color {
            wgpu::LoadOp::Clear(wgpu::Color::BLACK)
        } else {
            wgpu::LoadOp::Load
        };
        let depth_load = if pass.clear_depth {
            wgpu::LoadOp::Clear(1.0)
        } else {
            wgpu::LoadOp::Load
        };
        let uses_depth = pass.draw != PassDraw::Background;

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(pass_label(pass.draw)),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: uses_depth.then(|| wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        match pass.draw {
            PassDraw::Background => {
                render_pass.set_pipeline(&self.background_pipeline);
                render_pass.set_bind_group(0, &self.background_bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
                render_pass.draw(0..BACKGROUND_QUAD.len() as u32, 0..1);
            }
            PassDraw::Surface(eye) => {
                let buffers = &self.surface_buffers;
                let Some(pipeline) = self.surface_pipelines.get(pass.mask) else {
                    return;
                };
                if buffers.vertex_count == 0 {
                    return;
                }
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, self.surface_bindings.bind_group(eye), &[]);
                render_pass.set_vertex_buffer(0, buffers.position.slice(..));
                render_pass.set_vertex_buffer(1, buffers.normal.slice(..));
                render_pass.set_vertex_buffer(2, buffers.texcoord.slice(..));
                render_pass.draw(0..buffers.vertex_count, 0..1);
            }
            PassDraw::Marker(eye) => {
                let buffers = &self.marker_buffers;
                let Some(pipeline) = self.marker_pipelines.get(pass.mask) else {
                    return;
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, self.marker_bindings.bind_group(eye), &[]);
                render_pass.set_vertex_buffer(0, buffers.position.slice(..));
                render_pass.set_vertex_buffer(1, buffers.normal.slice(..));
                render_pass.set_vertex_buffer(2, buffers.texcoord.slice(..));
                render_pass.set_index_buffer(buffers.index.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..buffers.index_count, 0, 0..1);
            }
        }
    }
}

fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

fn pass_label(draw: PassDraw) -> &'static str {
    match draw {
        PassDraw::Background => "Background Pass",
        PassDraw::Surface(Eye::Left) => "Surface Pass (left)",
        PassDraw::Surface(Eye::Right) => "Surface Pass (right)",
        PassDraw::Marker(_) => "Marker Pass",
    }
}

fn background_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &DynamicTexture,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Background Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn lit_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    topology: wgpu::PrimitiveTopology,
    mask: ColorMask,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_lit"),
            buffers: &lit_vertex_layouts(),
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_lit"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: mask.write_mask(),
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::stereo::{StereoParams, stereo_pair};

    #[test]
    fn uniform_block_matches_shader_layout() {
        assert_eq!(std::mem::size_of::<DrawUniforms>(), 3 * 64 + 7 * 16);
    }

    #[test]
    fn uniforms_carry_eye_matrices_and_lighting() {
        let scene = SceneState::default();
        let pair = stereo_pair(&StereoParams::default(), DMat4::IDENTITY);
        let u = DrawUniforms::new(&pair.left, DMat4::IDENTITY, &scene, SURFACE_COLOR, 0.5);

        assert_eq!(u.projection, pair.left.projection.as_mat4().to_cols_array_2d());
        assert_eq!(u.model_view, pair.left.model_view.as_mat4().to_cols_array_2d());
        // rigid model-view: the normal matrix keeps its rotation part
        for col in 0..3 {
            for row in 0..3 {
                assert!((u.normal_matrix[col][row] - u.model_view[col][row]).abs() < 1e-5);
            }
        }
        assert_eq!(u.ambient, [0.2, 0.1, 0.0, 1.0]);
        assert_eq!(u.material[0], 1.0);
        assert_eq!(u.material[2], 0.5);
    }
}
