use std::borrow::Cow;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use image::RgbaImage;
use log::{debug, info};
use wgpu;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::engine::graphics::draw::{batch, BlendMode, FramePlan, MeshId, ScenePass, TextureId};
use crate::engine::graphics::mesh::{Mesh, MeshData};
use crate::engine::graphics::texture::Texture;
use crate::engine::graphics::vertex::{DrawInstance, Vertex};
use crate::error::{GameError, Result};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    light_dir: [f32; 4],
}

impl CameraUniform {
    fn new(view_proj: Mat4, light_direction: Vec3) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            light_dir: light_direction.extend(0.0).to_array(),
        }
    }
}

struct CameraBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl CameraBinding {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&[CameraUniform::new(Mat4::IDENTITY, Vec3::NEG_Y)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }
}

pub struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    opaque_pipeline: wgpu::RenderPipeline,
    cutout_pipeline: wgpu::RenderPipeline,
    translucent_pipeline: wgpu::RenderPipeline,
    world_camera: CameraBinding,
    overlay_camera: CameraBinding,
    texture_layout: wgpu::BindGroupLayout,
    depth_view: wgpu::TextureView,
    meshes: Vec<Mesh>,
    textures: Vec<Texture>,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| GameError::Graphics(format!("failed to create surface: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| GameError::Graphics("no suitable adapter".to_string()))?;

        log_device_info(&adapter);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .map_err(|e| GameError::Graphics(format!("failed to request device: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| GameError::Graphics("surface reports no formats".to_string()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        info!(
            "Surface configured: {}x{} {:?}",
            config.width, config.height, config.format
        );

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("../shaders/scene.wgsl"))),
        });

        let camera_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<CameraUniform>() as u64),
                },
                count: None,
            }],
        });
        let texture_layout = Texture::bind_group_layout(&device);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let opaque_pipeline = create_pipeline(&device, &pipeline_layout, &shader, config.format, BlendMode::Opaque);
        let cutout_pipeline = create_pipeline(&device, &pipeline_layout, &shader, config.format, BlendMode::Cutout);
        let translucent_pipeline =
            create_pipeline(&device, &pipeline_layout, &shader, config.format, BlendMode::Translucent);

        let world_camera = CameraBinding::new(&device, &camera_bind_group_layout, "World Camera");
        let overlay_camera = CameraBinding::new(&device, &camera_bind_group_layout, "Overlay Camera");
        let depth_view = create_depth_view(&device, config.width, config.height);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            opaque_pipeline,
            cutout_pipeline,
            translucent_pipeline,
            world_camera,
            overlay_camera,
            texture_layout,
            depth_view,
            meshes: Vec::new(),
            textures: Vec::new(),
        })
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }

    pub fn add_mesh(&mut self, data: &MeshData, label: &str) -> MeshId {
        self.meshes.push(Mesh::upload(&self.device, data, label));
        MeshId(self.meshes.len() - 1)
    }

    pub fn add_texture(&mut self, rgba: &RgbaImage, label: &str) -> TextureId {
        self.textures.push(Texture::from_image(
            &self.device,
            &self.queue,
            &self.texture_layout,
            rgba,
            label,
        ));
        TextureId(self.textures.len() - 1)
    }

    pub fn add_default_texture(&mut self) -> TextureId {
        self.textures.push(Texture::create_default(
            &self.device,
            &self.queue,
            &self.texture_layout,
        ));
        TextureId(self.textures.len() - 1)
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, new_size.width, new_size.height);
            debug!("Resized surface to {}x{}", new_size.width, new_size.height);
        }
    }

    /// Reconfigures the surface at the current window size after it was lost or outdated.
    pub fn reconfigure(&mut self) {
        let size = self.window.inner_size();
        self.resize(size);
    }

    pub fn render(&self, plan: &FramePlan) -> std::result::Result<(), wgpu::SurfaceError> {
        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        let mut clear_color = true;
        if let Some(world) = &plan.world {
            self.queue.write_buffer(
                &self.world_camera.buffer,
                0,
                bytemuck::cast_slice(&[CameraUniform::new(world.view_proj, plan.light_direction)]),
            );
            self.encode_pass(&mut encoder, &view, world, &self.world_camera, clear_color, "World Pass");
            clear_color = false;
        }

        self.queue.write_buffer(
            &self.overlay_camera.buffer,
            0,
            bytemuck::cast_slice(&[CameraUniform::new(plan.overlay.view_proj, plan.light_direction)]),
        );
        self.encode_pass(
            &mut encoder,
            &view,
            &plan.overlay,
            &self.overlay_camera,
            clear_color,
            "Overlay Pass",
        );

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        pass: &ScenePass,
        camera: &CameraBinding,
        clear_color: bool,
        label: &str,
    ) {
        let batches = batch(&pass.draws);
        let instances: Vec<DrawInstance> = batches.iter().flat_map(|b| b.instances.iter().copied()).collect();
        let instance_buffer = (!instances.is_empty()).then(|| {
            self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Instance Buffer"),
                contents: bytemuck::cast_slice(&instances),
                usage: wgpu::BufferUsages::VERTEX,
            })
        });

        let load = if clear_color {
            wgpu::LoadOp::Clear(wgpu::Color::BLACK)
        } else {
            wgpu::LoadOp::Load
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let Some(instance_buffer) = &instance_buffer else {
            return;
        };

        render_pass.set_bind_group(0, &camera.bind_group, &[]);
        render_pass.set_vertex_buffer(1, instance_buffer.slice(..));

        let mut first_instance = 0u32;
        for b in &batches {
            let count = b.instances.len() as u32;
            let range = first_instance..first_instance + count;
            first_instance += count;

            let (Some(mesh), Some(texture)) = (self.meshes.get(b.mesh.0), self.textures.get(b.texture.0)) else {
                continue;
            };
            let pipeline = match b.blend {
                BlendMode::Opaque => &self.opaque_pipeline,
                BlendMode::Cutout => &self.cutout_pipeline,
                BlendMode::Translucent => &self.translucent_pipeline,
            };
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(1, &texture.bind_group, &[]);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.num_indices, 0, range);
        }
    }
}

fn log_device_info(adapter: &wgpu::Adapter) {
    let adapter_info = adapter.get_info();
    let limits = adapter.limits();
    info!("---------- Device Info ----------");
    info!("name: {}", adapter_info.name);
    info!("backend: {:?}", adapter_info.backend);
    info!("device type: {:?}", adapter_info.device_type);
    info!("driver: {} {}", adapter_info.driver, adapter_info.driver_info);
    info!("max texture size: {}", limits.max_texture_dimension_2d);
    info!("max bind groups: {}", limits.max_bind_groups);
    info!("---------------------------------");
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    blend: BlendMode,
) -> wgpu::RenderPipeline {
    let (label, color_blend, depth_write_enabled) = match blend {
        BlendMode::Opaque => ("Opaque Pipeline", wgpu::BlendState::REPLACE, true),
        BlendMode::Cutout => ("Cutout Pipeline", wgpu::BlendState::ALPHA_BLENDING, true),
        BlendMode::Translucent => ("Translucent Pipeline", wgpu::BlendState::ALPHA_BLENDING, false),
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            buffers: &[Vertex::desc(), DrawInstance::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(color_blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        label: Some("Depth Texture"),
        view_formats: &[],
    });
    depth_texture.create_view(&wgpu::TextureViewDescriptor::default())
}
