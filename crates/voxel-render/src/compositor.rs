//! The two-pass GPU ray compositor.

use pollster::FutureExt;
use voxel_core::{
    BoundingGeometry, CullFace, DepthTest, FrameGraph, FrameStage, FrameTransforms, FrontFace,
    MarchConfig, PassKind, PassTarget, RenderOptions, RenderPassConfig, ResourceKind, StepMode,
    Tracked, TransferFunction, VolumeDataset, VoxelError,
};

use crate::buffer::{create_uniform_buffer, update_buffer};
use crate::engine::GpuContext;
use crate::error::{RenderError, RenderResult};
use crate::geometry_render::GeometryBuffers;
use crate::shader::ShaderBuilder;
use crate::surface::{wgpu_format, OffscreenSurface};
use crate::transfer_texture::TransferTexture;
use crate::volume_texture::VolumeTexture;

/// Per-frame uniforms shared by both passes.
/// Layout must match WGSL `FrameUniforms` exactly.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub model_view_projection: [[f32; 4]; 4],
    pub sample_count: u32,
    pub termination_threshold: f32,
    pub step_mode: u32, // 0 = ray length, 1 = fixed
    pub opacity_reference: f32, // 0 = no opacity correction
    pub background: [f32; 4],
}

impl FrameUniforms {
    /// Packs the transforms and march parameters of a frame.
    #[allow(clippy::cast_precision_loss)]
    pub fn new(transforms: &FrameTransforms, march: &MarchConfig) -> Self {
        Self {
            model_view_projection: transforms.model_view_projection().to_cols_array_2d(),
            sample_count: march.sample_count.max(1),
            termination_threshold: march.termination_threshold,
            step_mode: match march.step_mode {
                StepMode::RayLength => 0,
                StepMode::Fixed => 1,
            },
            opacity_reference: march.opacity_reference.map_or(0.0, |r| r as f32),
            background: march.background.extend(1.0).to_array(),
        }
    }
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self::new(&FrameTransforms::default(), &MarchConfig::default())
    }
}

fn cull_mode(cull: CullFace) -> wgpu::Face {
    match cull {
        CullFace::Front => wgpu::Face::Front,
        CullFace::Back => wgpu::Face::Back,
    }
}

fn front_face(face: FrontFace) -> wgpu::FrontFace {
    match face {
        FrontFace::Ccw => wgpu::FrontFace::Ccw,
        FrontFace::Cw => wgpu::FrontFace::Cw,
    }
}

/// GPU ray-caster: owns the pipelines of both passes, the volume and
/// transfer function textures, the cube buffers and the offscreen surface.
pub struct RayCompositor {
    ctx: GpuContext,
    march: MarchConfig,
    order: Vec<PassKind>,
    stage: FrameStage,
    target_format: wgpu::TextureFormat,
    entry_exit_pipeline: Tracked<wgpu::RenderPipeline>,
    raycast_pipeline: Tracked<wgpu::RenderPipeline>,
    frame_bind_group: Tracked<wgpu::BindGroup>,
    raycast_bind_group: Tracked<wgpu::BindGroup>,
    raycast_layout: Tracked<wgpu::BindGroupLayout>,
    frame_layout: Tracked<wgpu::BindGroupLayout>,
    uniform_buffer: Tracked<wgpu::Buffer>,
    geometry: GeometryBuffers,
    volume: VolumeTexture,
    transfer: TransferTexture,
    surface: OffscreenSurface,
}

impl RayCompositor {
    /// Builds every resource the two passes need.
    ///
    /// Fails without rendering anything if a texture, the offscreen surface,
    /// a shader or a pipeline cannot be created. Whatever was created before
    /// the failure is released on return.
    pub fn new(
        ctx: &GpuContext,
        volume: &VolumeDataset,
        transfer: &TransferFunction,
        options: &RenderOptions,
        target_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> RenderResult<Self> {
        let order = FrameGraph::new().schedule().map_err(VoxelError::from)?;
        let march = MarchConfig::from(options);

        let volume = VolumeTexture::new(ctx, volume)?;
        let transfer = TransferTexture::new(ctx, transfer);
        let geometry = GeometryBuffers::new(ctx, &BoundingGeometry::build());
        let surface = OffscreenSurface::create(ctx, width, height)?;

        let uniform_buffer = create_uniform_buffer(
            ctx,
            &FrameUniforms::new(&FrameTransforms::default(), &march),
            "frame uniforms",
        );

        let frame_layout = Self::create_frame_layout(ctx);
        let raycast_layout = Self::create_raycast_layout(ctx);

        let entry_exit_pipeline = Self::create_pipeline(
            ctx,
            PassKind::EntryExit,
            &PassKind::EntryExit.config(),
            &[&*frame_layout],
            wgpu_format(voxel_core::surface::EXIT_POSITION_FORMAT),
        )?;
        let raycast_pipeline = Self::create_pipeline(
            ctx,
            PassKind::Compositing,
            &PassKind::Compositing.config(),
            &[&*frame_layout, &*raycast_layout],
            target_format,
        )?;

        let frame_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame bind group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        let frame_bind_group = ctx
            .ledger
            .track(ResourceKind::BindGroup, "frame bind group", frame_bind_group);
        let raycast_bind_group =
            Self::create_raycast_bind_group(ctx, &raycast_layout, &surface, &volume, &transfer);

        log::info!("ray compositor ready ({width}x{height}, {target_format:?})");
        Ok(Self {
            ctx: ctx.clone(),
            march,
            order,
            stage: FrameStage::Idle,
            target_format,
            entry_exit_pipeline,
            raycast_pipeline,
            frame_bind_group,
            raycast_bind_group,
            raycast_layout,
            frame_layout,
            uniform_buffer,
            geometry,
            volume,
            transfer,
            surface,
        })
    }

    fn create_frame_layout(ctx: &GpuContext) -> Tracked<wgpu::BindGroupLayout> {
        let layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<FrameUniforms>() as u64),
                },
                count: None,
            }],
        });
        ctx.ledger
            .track(ResourceKind::BindGroup, "frame bind group layout", layout)
    }

    fn create_raycast_layout(ctx: &GpuContext) -> Tracked<wgpu::BindGroupLayout> {
        let texture = |binding, view_dimension, filterable| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable },
                view_dimension,
                multisampled: false,
            },
            count: None,
        };
        let layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("raycast bind group layout"),
            entries: &[
                // Exit positions (Rgba16Float, loaded per pixel)
                texture(0, wgpu::TextureViewDimension::D2, false),
                // Density volume
                texture(1, wgpu::TextureViewDimension::D3, true),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                // Transfer function
                texture(3, wgpu::TextureViewDimension::D2, false),
            ],
        });
        ctx.ledger
            .track(ResourceKind::BindGroup, "raycast bind group layout", layout)
    }

    fn create_raycast_bind_group(
        ctx: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        surface: &OffscreenSurface,
        volume: &VolumeTexture,
        transfer: &TransferTexture,
    ) -> Tracked<wgpu::BindGroup> {
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("raycast bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&surface.color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&volume.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&volume.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&transfer.view),
                },
            ],
        });
        ctx.ledger
            .track(ResourceKind::BindGroup, "raycast bind group", bind_group)
    }

    fn create_pipeline(
        ctx: &GpuContext,
        pass: PassKind,
        config: &RenderPassConfig,
        bind_group_layouts: &[&wgpu::BindGroupLayout],
        format: wgpu::TextureFormat,
    ) -> RenderResult<Tracked<wgpu::RenderPipeline>> {
        let program = ShaderBuilder::for_pass(pass).build(ctx)?;

        let pipeline = ctx.validated(RenderError::PipelineCreationFailed, |device| {
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(pass.label()),
                bind_group_layouts,
                push_constant_ranges: &[],
            });

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(pass.label()),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &program.module,
                    entry_point: Some(program.vertex_entry.as_str()),
                    buffers: &[GeometryBuffers::vertex_layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &program.module,
                    entry_point: Some(program.fragment_entry.as_str()),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: config.blend.then_some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: front_face(config.front_face),
                    cull_mode: Some(cull_mode(config.cull)),
                    ..Default::default()
                },
                depth_stencil: match config.depth {
                    DepthTest::Disabled => None,
                    DepthTest::Less => Some(wgpu::DepthStencilState {
                        format: wgpu_format(voxel_core::surface::DEPTH_FORMAT),
                        depth_write_enabled: true,
                        depth_compare: wgpu::CompareFunction::Less,
                        stencil: wgpu::StencilState::default(),
                        bias: wgpu::DepthBiasState::default(),
                    }),
                },
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })?;

        Ok(ctx.ledger.track(ResourceKind::Pipeline, pass.label(), pipeline))
    }

    /// Recreates the offscreen surface for a new viewport size. Nothing else
    /// is rebuilt.
    pub fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        if self.surface.size() == (width, height) {
            return Ok(());
        }
        let surface = OffscreenSurface::create(&self.ctx, width, height)?;
        self.raycast_bind_group = Self::create_raycast_bind_group(
            &self.ctx,
            &self.raycast_layout,
            &surface,
            &self.volume,
            &self.transfer,
        );
        self.surface = surface;
        log::debug!("offscreen surface resized to {width}x{height}");
        Ok(())
    }

    /// Replaces the transfer function without rebuilding anything.
    pub fn set_transfer_function(&self, transfer: &TransferFunction) {
        self.transfer.update(&self.ctx.queue, transfer);
    }

    /// Renders one frame into `target`, which must have the format given at
    /// construction and the current viewport size.
    ///
    /// Validation errors raised while recording or submitting are logged;
    /// the frame still completes.
    pub fn render(&mut self, target: &wgpu::TextureView, transforms: &FrameTransforms) {
        let uniforms = FrameUniforms::new(transforms, &self.march);
        update_buffer(&self.ctx.queue, &self.uniform_buffer, &uniforms);

        self.ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("ray compositor encoder"),
            });

        for pass in self.order.clone() {
            self.stage = self.stage.next();
            debug_assert_eq!(self.stage, FrameStage::of(pass));
            let config = match pass {
                PassKind::EntryExit => pass.config(),
                PassKind::Compositing => pass.config().with_clear_color(self.march.background.extend(1.0)),
            };
            self.submit_pass(&mut encoder, pass, &config, target);
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        self.stage = self.stage.next();

        if let Some(error) = self.ctx.device.pop_error_scope().block_on() {
            log::error!("frame failed validation: {error}");
        }
    }

    fn submit_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pass: PassKind,
        config: &RenderPassConfig,
        target: &wgpu::TextureView,
    ) {
        log::trace!("recording {pass}");
        let [r, g, b, a] = config.clear_color.map(f64::from);
        let view: &wgpu::TextureView = match config.target {
            PassTarget::Offscreen => &self.surface.color_view,
            PassTarget::Visible => target,
        };
        let depth_stencil_attachment = match config.depth {
            DepthTest::Disabled => None,
            DepthTest::Less => Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.surface.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(0),
                    store: wgpu::StoreOp::Discard,
                }),
            }),
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(pass.label()),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment,
            ..Default::default()
        });

        render_pass.set_bind_group(0, &*self.frame_bind_group, &[]);
        match pass {
            PassKind::EntryExit => render_pass.set_pipeline(&self.entry_exit_pipeline),
            PassKind::Compositing => {
                render_pass.set_pipeline(&self.raycast_pipeline);
                render_pass.set_bind_group(1, &*self.raycast_bind_group, &[]);
            }
        }
        self.geometry.draw(&mut render_pass);
    }

    /// Current frame stage; `Idle` between frames.
    pub fn stage(&self) -> FrameStage {
        self.stage
    }

    /// Current viewport size.
    pub fn size(&self) -> (u32, u32) {
        self.surface.size()
    }

    /// Format of the visible target.
    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.target_format
    }

    /// March parameters in effect.
    pub fn march_config(&self) -> &MarchConfig {
        &self.march
    }

    /// The GPU context the compositor renders with.
    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    /// The frame bind group layout, shared by both pipelines.
    pub fn frame_layout(&self) -> &wgpu::BindGroupLayout {
        &self.frame_layout
    }
}
