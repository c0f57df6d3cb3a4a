//! wgpu Backend
//!
//! Draws [`FramePacket`]s to a window surface.
//!
//! Bind group layout:
//!
//! | Group | Binding | Content |
//! |-------|---------|---------|
//! | 0 | 0 | `Globals` (camera, lights, shadow matrix) |
//! | 0 | 1, 2 | shadow depth map + comparison sampler |
//! | 1 | 0 | `ModelUniforms` of one node |
//! | 1 | 1 | that node's material uniforms (`custom`) |
//!
//! GPU objects are cached per geometry id and per scene node, and dropped
//! once a frame no longer references them.

use std::borrow::Cow;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use super::backend::{BackgroundPass, DrawItem, FramePacket, GlobalUniforms, ModelUniforms, RenderBackend};
use super::program::{ProgramDesc, ProgramId};
use super::settings::RendererSettings;
use super::shader_gen;
use crate::errors::{Error, Result};
use crate::resources::geometry::Vertex;
use crate::scene::NodeKey;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const CUSTOM_MIN_SIZE: u64 = 16;

struct GpuGeometry {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    last_used: u64,
}

struct GpuObject {
    model_buffer: wgpu::Buffer,
    custom_buffer: wgpu::Buffer,
    custom_size: u64,
    bind_group: wgpu::BindGroup,
    last_used: u64,
}

struct ShadowTarget {
    size: u32,
    view: wgpu::TextureView,
}

struct GpuBackground {
    map_id: u64,
    bind_group: wgpu::BindGroup,
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    depth_texture_view: wgpu::TextureView,

    globals_buffer: wgpu::Buffer,
    globals_layout: wgpu::BindGroupLayout,
    globals_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,

    shadow_buffer: wgpu::Buffer,
    shadow_bind_group: wgpu::BindGroup,
    shadow_sampler: wgpu::Sampler,
    shadow_target: ShadowTarget,
    shadow_pipeline: wgpu::RenderPipeline,

    background_layout: wgpu::BindGroupLayout,
    background_buffer: wgpu::Buffer,
    background_sampler: wgpu::Sampler,
    background_pipeline: wgpu::RenderPipeline,
    background: Option<GpuBackground>,

    pipelines: FxHashMap<ProgramId, wgpu::RenderPipeline>,
    geometries: FxHashMap<u64, GpuGeometry>,
    objects: FxHashMap<NodeKey, GpuObject>,
}

impl WgpuBackend {
    pub async fn new<W>(window: W, width: u32, height: u32, settings: &RendererSettings) -> Result<Self>
    where
        W: HasWindowHandle + HasDisplayHandle + Send + Sync + 'static,
    {
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: settings.power_preference(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| Error::AdapterRequestFailed(e.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                ..Default::default()
            })
            .await?;

        let mut config = surface
            .get_default_config(&adapter, width.max(1), height.max(1))
            .ok_or_else(|| Error::AdapterRequestFailed("Surface not supported by adapter".to_string()))?;
        config.present_mode = settings.present_mode();
        surface.configure(&device, &config);

        let depth_texture_view = create_depth_texture(&device, config.width, config.height, "Depth Texture");

        // Group 0: globals + shadow map
        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });
        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Global Uniforms"),
            contents: bytemuck::bytes_of(&GlobalUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });
        let shadow_target = ShadowTarget {
            size: 1,
            view: create_depth_texture(&device, 1, 1, "Shadow Map"),
        };
        let globals_bind_group = create_globals_bind_group(
            &device,
            &globals_layout,
            &globals_buffer,
            &shadow_target.view,
            &shadow_sampler,
        );

        // Group 1: per-object
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Object Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT),
                uniform_entry(1, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT),
            ],
        });

        // Shadow depth pass
        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
        });
        let shadow_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Shadow Uniforms"),
            contents: bytemuck::bytes_of(&glam::Mat4::IDENTITY),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow BindGroup"),
            layout: &shadow_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: shadow_buffer.as_entire_binding(),
            }],
        });
        let shadow_pipeline = create_shadow_pipeline(&device, &shadow_layout, &object_layout)?;

        // Background
        let background_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Background Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let background_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Background Uniforms"),
            size: 80,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let background_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Background Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let background_pipeline = create_background_pipeline(&device, &background_layout, config.format)?;

        log::info!(
            "wgpu backend ready: {} ({:?}), surface {:?} {}x{}",
            adapter.get_info().name,
            adapter.get_info().backend,
            config.format,
            config.width,
            config.height
        );

        Ok(Self {
            device,
            queue,
            surface,
            config,
            depth_texture_view,
            globals_buffer,
            globals_layout,
            globals_bind_group,
            object_layout,
            shadow_buffer,
            shadow_bind_group,
            shadow_sampler,
            shadow_target,
            shadow_pipeline,
            background_layout,
            background_buffer,
            background_sampler,
            background_pipeline,
            background: None,
            pipelines: FxHashMap::default(),
            geometries: FxHashMap::default(),
            objects: FxHashMap::default(),
        })
    }

    // ========================================================================
    // Resource sync
    // ========================================================================

    fn prepare_geometry(&mut self, draw: &DrawItem, frame: u64) {
        let geometry = &draw.geometry;
        let entry = self.geometries.entry(geometry.id()).or_insert_with(|| GpuGeometry {
            vertex_buffer: self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&geometry.label),
                contents: bytemuck::cast_slice(geometry.vertices()),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            index_buffer: self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&geometry.label),
                contents: bytemuck::cast_slice(geometry.indices()),
                usage: wgpu::BufferUsages::INDEX,
            }),
            index_count: geometry.indices().len() as u32,
            last_used: frame,
        });
        entry.last_used = frame;
    }

    fn prepare_object(&mut self, draw: &DrawItem, frame: u64) {
        let custom = draw.uniforms.pack();
        let custom_size = (custom.len() as u64 * 4).max(CUSTOM_MIN_SIZE);

        let stale = self
            .objects
            .get(&draw.node)
            .is_none_or(|o| o.custom_size != custom_size);
        if stale {
            let object = self.create_object(custom_size, frame);
            self.objects.insert(draw.node, object);
        }

        if let Some(object) = self.objects.get_mut(&draw.node) {
            object.last_used = frame;
            self.queue
                .write_buffer(&object.model_buffer, 0, bytemuck::bytes_of(&draw.model));
            if !custom.is_empty() {
                self.queue
                    .write_buffer(&object.custom_buffer, 0, bytemuck::cast_slice(&custom));
            }
        }
    }

    fn create_object(&self, custom_size: u64, frame: u64) -> GpuObject {
        let model_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Model Uniforms"),
            size: std::mem::size_of::<ModelUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let custom_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Material Uniforms"),
            size: custom_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Object BindGroup"),
            layout: &self.object_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: model_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: custom_buffer.as_entire_binding(),
                },
            ],
        });
        GpuObject {
            model_buffer,
            custom_buffer,
            custom_size,
            bind_group,
            last_used: frame,
        }
    }

    fn prepare_shadow_target(&mut self, size: u32) {
        if self.shadow_target.size == size {
            return;
        }
        log::debug!("Allocating {size}x{size} shadow map");
        self.shadow_target = ShadowTarget {
            size,
            view: create_depth_texture(&self.device, size, size, "Shadow Map"),
        };
        self.globals_bind_group = create_globals_bind_group(
            &self.device,
            &self.globals_layout,
            &self.globals_buffer,
            &self.shadow_target.view,
            &self.shadow_sampler,
        );
    }

    fn prepare_background(&mut self, pass: &BackgroundPass) {
        let mut params = [0.0_f32; 20];
        params[..16].copy_from_slice(&pass.inv_view_proj.to_cols_array());
        params[16] = pass.intensity;
        self.queue
            .write_buffer(&self.background_buffer, 0, bytemuck::cast_slice(&params));

        if self.background.as_ref().is_some_and(|b| b.map_id == pass.map.id()) {
            return;
        }

        let map = &pass.map;
        let size = wgpu::Extent3d {
            width: map.width,
            height: map.height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&map.label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba16Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            map.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(map.width * 8),
                rows_per_image: Some(map.height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Background BindGroup"),
            layout: &self.background_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.background_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.background_sampler),
                },
            ],
        });
        self.background = Some(GpuBackground {
            map_id: map.id(),
            bind_group,
        });
    }

    fn prune(&mut self, frame: u64) {
        self.objects.retain(|_, o| o.last_used == frame);
        self.geometries.retain(|_, g| g.last_used == frame);
    }
}

impl RenderBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture_view = create_depth_texture(&self.device, width, height, "Depth Texture");
        }
    }

    fn create_program(&mut self, id: ProgramId, desc: &ProgramDesc) -> Result<()> {
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&desc.label),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(&desc.source)),
        });

        let layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&desc.label),
            bind_group_layouts: &[Some(&self.globals_layout), Some(&self.object_layout)],
            immediate_size: 0,
        });

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&desc.label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[vertex_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: Some(true),
                depth_compare: Some(wgpu::CompareFunction::Less),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview_mask: None,
            cache: None,
        });

        log::debug!("Created pipeline '{}'", desc.label);
        self.pipelines.insert(id, pipeline);
        Ok(())
    }

    fn render(&mut self, frame: &FramePacket<'_>) -> Result<()> {
        let index = frame.frame_index;

        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(frame.globals));
        for draw in frame.draws {
            self.prepare_geometry(draw, index);
            self.prepare_object(draw, index);
        }
        if let Some(shadow) = &frame.shadow {
            self.prepare_shadow_target(shadow.map_size);
            self.queue
                .write_buffer(&self.shadow_buffer, 0, bytemuck::bytes_of(&shadow.light_view_proj));
        }
        if let Some(background) = &frame.background {
            self.prepare_background(background);
        }

        let output = match self.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(output)
            | wgpu::CurrentSurfaceTexture::Suboptimal(output) => output,
            wgpu::CurrentSurfaceTexture::Lost => {
                self.resize(self.config.width, self.config.height);
                return Ok(());
            }
            e => return Err(Error::Gpu(format!("{e:?}"))),
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });

        if frame.shadow.is_some() {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_target.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_pipeline(&self.shadow_pipeline);
            pass.set_bind_group(0, &self.shadow_bind_group, &[]);
            for draw in frame.draws.iter().filter(|d| d.cast_shadows) {
                let (Some(geometry), Some(object)) =
                    (self.geometries.get(&draw.geometry.id()), self.objects.get(&draw.node))
                else {
                    continue;
                };
                pass.set_bind_group(1, &object.bind_group, &[]);
                pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
                pass.set_index_buffer(geometry.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..geometry.index_count, 0, 0..1);
            }
        }

        {
            let c = frame.clear_color;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(c.x),
                            g: f64::from(c.y),
                            b: f64::from(c.z),
                            a: f64::from(c.w),
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if frame.background.is_some()
                && let Some(background) = &self.background
            {
                pass.set_pipeline(&self.background_pipeline);
                pass.set_bind_group(0, &background.bind_group, &[]);
                pass.draw(0..3, 0..1);
            }

            pass.set_bind_group(0, &self.globals_bind_group, &[]);
            for draw in frame.draws {
                let (Some(pipeline), Some(geometry), Some(object)) = (
                    self.pipelines.get(&draw.program),
                    self.geometries.get(&draw.geometry.id()),
                    self.objects.get(&draw.node),
                ) else {
                    continue;
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(1, &object.bind_group, &[]);
                pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
                pass.set_index_buffer(geometry.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..geometry.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        self.prune(index);
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32, label: &str) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_globals_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
    shadow_view: &wgpu::TextureView,
    shadow_sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Globals BindGroup"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(shadow_view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(shadow_sampler),
            },
        ],
    })
}

fn create_shadow_pipeline(
    device: &wgpu::Device,
    shadow_layout: &wgpu::BindGroupLayout,
    object_layout: &wgpu::BindGroupLayout,
) -> Result<wgpu::RenderPipeline> {
    let source = shader_gen::shadow_source()?;
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Shadow Depth Shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Owned(source)),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Shadow Pipeline Layout"),
        bind_group_layouts: &[Some(shadow_layout), Some(object_layout)],
        immediate_size: 0,
    });

    Ok(device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Shadow Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_main"),
            buffers: &[vertex_layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: None,
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: Some(true),
            depth_compare: Some(wgpu::CompareFunction::Less),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState {
                constant: 2,
                slope_scale: 2.0,
                clamp: 0.0,
            },
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview_mask: None,
        cache: None,
    }))
}

fn create_background_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> Result<wgpu::RenderPipeline> {
    let source = shader_gen::background_source()?;
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Background Shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Owned(source)),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Background Pipeline Layout"),
        bind_group_layouts: &[Some(layout)],
        immediate_size: 0,
    });

    Ok(device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Background Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            ..Default::default()
        },
        // Drawn first and never writes depth, so geometry always covers it
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: Some(false),
            depth_compare: Some(wgpu::CompareFunction::Always),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview_mask: None,
        cache: None,
    }))
}
