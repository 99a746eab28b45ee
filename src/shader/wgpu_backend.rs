use super::naga_backend::{NagaBackend, NagaProgram, NagaShader};
use super::{ShaderBackend, ShaderStage, UniformLocation};
use crate::gpu::GpuContext;

/// A compiled shader: the validated module plus the driver's shader module.
#[derive(Debug)]
pub struct WgpuShader {
    reflection: NagaShader,
    module: wgpu::ShaderModule,
}

impl WgpuShader {
    pub fn module(&self) -> &wgpu::ShaderModule {
        &self.module
    }

    pub fn reflection(&self) -> &NagaShader {
        &self.reflection
    }
}

/// A linked program: a render pipeline and its interface tables.
#[derive(Debug)]
pub struct WgpuProgram {
    reflection: NagaProgram,
    pipeline: wgpu::RenderPipeline,
}

impl WgpuProgram {
    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    pub fn reflection(&self) -> &NagaProgram {
        &self.reflection
    }

    /// Bind group layout for `group`, derived from the shaders.
    pub fn bind_group_layout(&self, group: u32) -> wgpu::BindGroupLayout {
        self.pipeline.get_bind_group_layout(group)
    }
}

/// Shader backend that builds real `wgpu` render pipelines.
///
/// Sources are checked with [`NagaBackend`] first so diagnostics read the
/// same on both backends. Whatever the driver still rejects is captured
/// through a validation error scope and returned as the log.
///
/// Every vertex attribute is read from its own tightly packed buffer, in
/// location order, matching what [`GpuMesh`](crate::GpuMesh) uploads.
pub struct WgpuBackend {
    device: wgpu::Device,
    color_format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
    naga: NagaBackend,
}

impl WgpuBackend {
    pub fn new(gpu: &GpuContext) -> Self {
        Self {
            device: gpu.device.clone(),
            color_format: gpu.format,
            depth_format: Some(wgpu::TextureFormat::Depth32Float),
            naga: NagaBackend::new(),
        }
    }

    /// Builds pipelines without a depth attachment.
    pub fn without_depth(mut self) -> Self {
        self.depth_format = None;
        self
    }

    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.color_format
    }

    pub fn depth_format(&self) -> Option<wgpu::TextureFormat> {
        self.depth_format
    }

    /// Runs `f` inside a validation error scope.
    fn scoped<T>(&self, f: impl FnOnce(&wgpu::Device) -> T) -> Result<T, String> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f(&self.device);
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(err.to_string()),
            None => Ok(value),
        }
    }
}

impl ShaderBackend for WgpuBackend {
    type Shader = WgpuShader;
    type Program = WgpuProgram;

    fn compile(&mut self, stage: ShaderStage, source: &str) -> Result<WgpuShader, String> {
        let reflection = self.naga.compile(stage, source)?;
        let module = self.scoped(|device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(reflection.entry_point()),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        })?;
        Ok(WgpuShader { reflection, module })
    }

    fn link(&mut self, vertex: &WgpuShader, fragment: &WgpuShader) -> Result<WgpuProgram, String> {
        let reflection = self.naga.link(&vertex.reflection, &fragment.reflection)?;

        let attributes: Vec<[wgpu::VertexAttribute; 1]> = reflection
            .attributes()
            .iter()
            .map(|a| {
                [wgpu::VertexAttribute {
                    format: a.format,
                    offset: 0,
                    shader_location: a.location,
                }]
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout> = attributes
            .iter()
            .map(|attribute| wgpu::VertexBufferLayout {
                array_stride: attribute[0].format.size(),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attribute,
            })
            .collect();

        let pipeline = self.scoped(|device| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Tessera Program"),
                layout: None,
                vertex: wgpu::VertexState {
                    module: &vertex.module,
                    entry_point: Some(reflection.vertex_entry()),
                    buffers: &buffers,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment.module,
                    entry_point: Some(reflection.fragment_entry()),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.color_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: Some(wgpu::Face::Back),
                    front_face: wgpu::FrontFace::Ccw,
                    ..Default::default()
                },
                depth_stencil: self.depth_format.map(|format| wgpu::DepthStencilState {
                    format,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })?;

        Ok(WgpuProgram {
            reflection,
            pipeline,
        })
    }

    fn attribute_location(&self, program: &WgpuProgram, name: &str) -> Option<u32> {
        self.naga.attribute_location(&program.reflection, name)
    }

    fn uniform_location(&self, program: &WgpuProgram, name: &str) -> Option<UniformLocation> {
        self.naga.uniform_location(&program.reflection, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::test_context;
    use crate::routine::Routine;
    use crate::shader::{ShaderError, ShaderPipeline};

    #[test]
    fn routine_programs_build_pipelines() {
        let gpu = test_context();
        let mut pipeline = ShaderPipeline::new(WgpuBackend::new(&gpu));

        for routine in Routine::ALL {
            let (vs, fs) = routine.shaders();
            let id = pipeline.link(vs, fs).unwrap();
            let program = pipeline.program(id).unwrap();
            assert_eq!(
                program.reflection().attributes().len(),
                routine.vertex_inputs().len()
            );
            assert_eq!(
                pipeline.uniform_location(id, "mvp").unwrap().is_some(),
                routine.animated()
            );
        }
        assert_eq!(pipeline.shader_count(), 0);
    }

    #[test]
    fn driver_diagnostics_surface_as_errors() {
        let gpu = test_context();
        let mut pipeline = ShaderPipeline::new(WgpuBackend::new(&gpu));
        let err = pipeline
            .compile(ShaderStage::Fragment, "@fragment fn fs_main() -> @location(0) vec4f { return 1; }")
            .unwrap_err();
        assert!(matches!(err, ShaderError::Compile { .. }));
    }
}
