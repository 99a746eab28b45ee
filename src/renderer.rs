//! Offscreen rendering of a [`Routine`].
//!
//! [`RoutineRenderer`] wires a routine's program, mesh and uniforms together
//! and draws into its own colour and depth textures, so the demo runs on a
//! headless device.

use wgpu::util::DeviceExt;

use crate::config::DemoConfig;
use crate::gpu::GpuContext;
use crate::gpu_mesh::GpuMesh;
use crate::matrix::Matrix;
use crate::routine::{Routine, RoutineError, Transforms};
use crate::shader::{ProgramId, ShaderPipeline, WgpuBackend};

/// RGBA8 checkerboard used in place of a loaded image.
pub fn checkerboard(size: u32, cell: u32) -> Vec<u8> {
    let cell = cell.max(1);
    (0..size * size)
        .flat_map(|i| {
            let (x, y) = (i % size, i / size);
            if (x / cell + y / cell) % 2 == 0 {
                [255, 200, 40, 255]
            } else {
                [20, 60, 160, 255]
            }
        })
        .collect()
}

struct Target {
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
}

impl Target {
    fn new(gpu: &GpuContext, width: u32, height: u32) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let color = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Routine Color Target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: gpu.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Routine Depth Target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        Self {
            color_view: color.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            color,
        }
    }
}

fn create_texture_view(gpu: &GpuContext, size: u32, rgba: &[u8]) -> wgpu::TextureView {
    let extent = wgpu::Extent3d {
        width: size,
        height: size,
        depth_or_array_layers: 1,
    };
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Routine Texture"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    gpu.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * size),
            rows_per_image: Some(size),
        },
        extent,
    );

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Everything needed to draw one routine offscreen.
pub struct RoutineRenderer {
    routine: Routine,
    pipeline: ShaderPipeline<WgpuBackend>,
    program: ProgramId,
    mesh: GpuMesh,
    uniforms: Option<(wgpu::Buffer, wgpu::BindGroup)>,
    target: Target,
}

impl RoutineRenderer {
    /// Side of the generated checkerboard texture.
    pub const TEXTURE_SIZE: u32 = 64;

    pub fn new(
        gpu: &GpuContext,
        config: &DemoConfig,
        width: u32,
        height: u32,
    ) -> Result<Self, RoutineError> {
        let routine = config.routine;
        let mut pipeline = ShaderPipeline::new(WgpuBackend::new(gpu));
        let (vs, fs) = routine.shaders();
        let program = pipeline.link(vs, fs)?;

        let mesh = routine.build_mesh(config, &mut rand::rng())?;
        let mesh = GpuMesh::upload(gpu, &mesh);
        mesh.check_slots(routine.vertex_inputs())?;

        let uniforms = if routine.animated() {
            let buffer = gpu
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("MVP Uniform"),
                    contents: bytemuck::bytes_of(&Matrix::IDENTITY),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
            let layout = pipeline.program(program)?.bind_group_layout(0);

            let texture_view;
            let sampler;
            let mut entries = vec![wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }];
            if routine == Routine::TexturedCube {
                texture_view = create_texture_view(
                    gpu,
                    Self::TEXTURE_SIZE,
                    &checkerboard(Self::TEXTURE_SIZE, Self::TEXTURE_SIZE / 8),
                );
                sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
                    label: Some("Routine Sampler"),
                    mag_filter: wgpu::FilterMode::Nearest,
                    min_filter: wgpu::FilterMode::Nearest,
                    ..Default::default()
                });
                entries.push(wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture_view),
                });
                entries.push(wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                });
            }

            let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Routine Bind Group"),
                layout: &layout,
                entries: &entries,
            });
            Some((buffer, bind_group))
        } else {
            None
        };

        log::info!("routine {routine} ready: {} indices", mesh.index_count());

        Ok(Self {
            routine,
            pipeline,
            program,
            mesh,
            uniforms,
            target: Target::new(gpu, width, height),
        })
    }

    pub fn routine(&self) -> Routine {
        self.routine
    }

    /// The texture each [`render`](Self::render) draws into.
    pub fn color_target(&self) -> &wgpu::Texture {
        &self.target.color
    }

    /// Uploads the MVP and draws one frame.
    pub fn render(&self, gpu: &GpuContext, transforms: &Transforms) -> Result<(), RoutineError> {
        let program = self.pipeline.program(self.program)?;

        if let Some((buffer, _)) = &self.uniforms {
            gpu.queue.write_buffer(buffer, 0, transforms.mvp_bytes());
        }

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Routine Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Routine Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(program.pipeline());
            if let Some((_, bind_group)) = &self.uniforms {
                render_pass.set_bind_group(0, bind_group, &[]);
            }
            self.mesh.draw(&mut render_pass, self.routine.vertex_inputs())?;
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkerboard_alternates() {
        let pixels = checkerboard(4, 2);
        assert_eq!(pixels.len(), 4 * 4 * 4);
        let pixel = |x: usize, y: usize| &pixels[(y * 4 + x) * 4..(y * 4 + x) * 4 + 4];
        assert_eq!(pixel(0, 0), pixel(1, 1));
        assert_ne!(pixel(0, 0), pixel(2, 0));
        assert_eq!(pixel(0, 0), pixel(2, 2));
    }

    #[test]
    fn renders_every_routine() {
        let gpu = crate::gpu::test_context();

        let mut transforms = Transforms::default();
        for routine in Routine::ALL {
            let config = DemoConfig::new().routine(routine).sphere_slices(32);
            let renderer = RoutineRenderer::new(&gpu, &config, 64, 64).unwrap();
            transforms.update(&config, 15.0, 0.0, 1.0).unwrap();
            renderer.render(&gpu, &transforms).unwrap();
            assert_eq!(renderer.color_target().width(), 64);
        }
    }
}
