//! Shader compilation and linking.
//!
//! [`ShaderPipeline`] turns a vertex/fragment source pair into a linked
//! program handle. The actual compiler lives behind the [`ShaderBackend`]
//! trait so the same handle bookkeeping drives both the headless
//! [`NagaBackend`] and the GPU-backed [`WgpuBackend`].
//!
//! # Example
//!
//! ```
//! use tessera::shader::{NagaBackend, ShaderPipeline};
//!
//! const VS: &str = r#"
//! @group(0) @binding(0) var<uniform> mvp: mat4x4f;
//!
//! @vertex
//! fn vs_main(@location(0) position: vec3f) -> @builtin(position) vec4f {
//!     return mvp * vec4f(position, 1.0);
//! }
//! "#;
//!
//! const FS: &str = r#"
//! @fragment
//! fn fs_main() -> @location(0) vec4f {
//!     return vec4f(1.0, 0.0, 0.0, 1.0);
//! }
//! "#;
//!
//! let mut pipeline = ShaderPipeline::new(NagaBackend::new());
//! let program = pipeline.link(VS, FS)?;
//!
//! assert_eq!(pipeline.attribute_location(program, "position")?, Some(0));
//! assert!(pipeline.uniform_location(program, "mvp")?.is_some());
//! assert_eq!(pipeline.shader_count(), 0);
//! # Ok::<(), tessera::ShaderError>(())
//! ```

mod naga_backend;
mod wgpu_backend;

pub use naga_backend::{NagaBackend, NagaProgram, NagaShader, VertexAttribute};
pub use wgpu_backend::{WgpuBackend, WgpuProgram, WgpuShader};

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU32;

/// The programmable stages a shader object can belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Handle to a compiled, not yet linked, shader object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderId(NonZeroU32);

impl ShaderId {
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// Handle to a linked program. Never zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(NonZeroU32);

impl ProgramId {
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// Where a uniform (or texture/sampler) is bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UniformLocation {
    pub group: u32,
    pub binding: u32,
}

/// Outcome of the most recent build on a [`ShaderPipeline`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing has been built yet.
    #[default]
    Uncompiled,
    /// A shader object compiled and is waiting to be linked.
    Compiled,
    /// A program linked while other compiled shader objects still wait for
    /// [`link_shaders`](ShaderPipeline::link_shaders).
    Linked,
    /// A program linked and no shader objects are left pending.
    Ready,
    /// The last compile or link failed.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShaderError {
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("program failed to link:\n{log}")]
    Link { log: String },

    #[error("no shader object with id {0}")]
    UnknownShader(u32),

    #[error("no program with id {0}")]
    UnknownProgram(u32),

    #[error("expected a {expected} shader, got a {actual} shader")]
    StageMismatch {
        expected: ShaderStage,
        actual: ShaderStage,
    },
}

/// The compiler/linker driving a [`ShaderPipeline`].
///
/// Errors are plain diagnostic strings, the pipeline wraps them in
/// [`ShaderError`] together with the stage that produced them.
pub trait ShaderBackend {
    type Shader;
    type Program;

    fn compile(&mut self, stage: ShaderStage, source: &str) -> Result<Self::Shader, String>;

    fn link(
        &mut self,
        vertex: &Self::Shader,
        fragment: &Self::Shader,
    ) -> Result<Self::Program, String>;

    fn attribute_location(&self, program: &Self::Program, name: &str) -> Option<u32>;

    fn uniform_location(&self, program: &Self::Program, name: &str) -> Option<UniformLocation>;
}

struct ShaderEntry<S> {
    stage: ShaderStage,
    shader: S,
}

/// Handle bookkeeping over a [`ShaderBackend`].
///
/// Shader objects and programs live in tables keyed by nonzero ids. Shader
/// objects are consumed by linking; programs live until
/// [`delete_program`](Self::delete_program) or until the pipeline is dropped.
pub struct ShaderPipeline<B: ShaderBackend> {
    backend: B,
    shaders: HashMap<ShaderId, ShaderEntry<B::Shader>>,
    programs: HashMap<ProgramId, B::Program>,
    next_id: NonZeroU32,
    state: PipelineState,
}

impl<B: ShaderBackend> ShaderPipeline<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            next_id: NonZeroU32::MIN,
            state: PipelineState::Uncompiled,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Number of compiled shader objects not yet consumed by a link.
    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    /// Next id not held by a live shader object or program.
    ///
    /// Wrapping past `u32::MAX` restarts at 1. Shader and program ids share
    /// one counter, so both tables are checked.
    fn allocate_id(&mut self) -> NonZeroU32 {
        loop {
            let id = self.next_id;
            self.next_id = id.checked_add(1).unwrap_or(NonZeroU32::MIN);
            if !self.shaders.contains_key(&ShaderId(id)) && !self.programs.contains_key(&ProgramId(id)) {
                return id;
            }
        }
    }

    /// Compiles a single shader object.
    ///
    /// On failure nothing is stored and the compiler log is returned in
    /// [`ShaderError::Compile`].
    pub fn compile(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, ShaderError> {
        match self.backend.compile(stage, source) {
            Ok(shader) => {
                let id = ShaderId(self.allocate_id());
                self.shaders.insert(id, ShaderEntry { stage, shader });
                self.state = PipelineState::Compiled;
                log::debug!("compiled {} shader {}", stage, id.get());
                Ok(id)
            }
            Err(log) => Err(self.fail(ShaderError::Compile {
                stage,
                log: non_empty(log),
            })),
        }
    }

    /// Compiles a vertex/fragment pair and links them into a program.
    ///
    /// The intermediate shader objects are released whether or not the
    /// build succeeds.
    pub fn link(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramId, ShaderError> {
        let vertex = self.compile(ShaderStage::Vertex, vertex_source)?;
        let fragment = match self.compile(ShaderStage::Fragment, fragment_source) {
            Ok(id) => id,
            Err(err) => {
                self.shaders.remove(&vertex);
                return Err(err);
            }
        };
        self.link_shaders(vertex, fragment)
    }

    /// Links two previously compiled shader objects.
    ///
    /// Both ids are consumed on every path once they have been looked up,
    /// including when the stages are swapped or the link fails.
    pub fn link_shaders(
        &mut self,
        vertex: ShaderId,
        fragment: ShaderId,
    ) -> Result<ProgramId, ShaderError> {
        for id in [vertex, fragment] {
            if !self.shaders.contains_key(&id) {
                return Err(self.fail(ShaderError::UnknownShader(id.get())));
            }
        }
        let (Some(vs), Some(fs)) = (self.shaders.remove(&vertex), self.shaders.remove(&fragment))
        else {
            // Same id passed twice.
            return Err(self.fail(ShaderError::UnknownShader(fragment.get())));
        };

        for (entry, expected) in [(&vs, ShaderStage::Vertex), (&fs, ShaderStage::Fragment)] {
            if entry.stage != expected {
                return Err(self.fail(ShaderError::StageMismatch {
                    expected,
                    actual: entry.stage,
                }));
            }
        }

        let program = self
            .backend
            .link(&vs.shader, &fs.shader)
            .map_err(|log| ShaderError::Link {
                log: non_empty(log),
            });
        let program = match program {
            Ok(program) => program,
            Err(err) => return Err(self.fail(err)),
        };
        let id = ProgramId(self.allocate_id());
        self.programs.insert(id, program);
        self.state = if self.shaders.is_empty() {
            PipelineState::Ready
        } else {
            PipelineState::Linked
        };
        log::debug!(
            "linked program {} from shaders {} and {}",
            id.get(),
            vertex.get(),
            fragment.get()
        );
        Ok(id)
    }

    fn fail(&mut self, err: ShaderError) -> ShaderError {
        self.state = PipelineState::Failed;
        log::error!("{err}");
        err
    }

    /// Releases a compiled shader object that will not be linked.
    pub fn delete_shader(&mut self, id: ShaderId) -> Result<(), ShaderError> {
        self.shaders
            .remove(&id)
            .map(drop)
            .ok_or(ShaderError::UnknownShader(id.get()))
    }

    pub fn delete_program(&mut self, id: ProgramId) -> Result<(), ShaderError> {
        self.programs
            .remove(&id)
            .map(drop)
            .ok_or(ShaderError::UnknownProgram(id.get()))
    }

    /// The backend's program object behind a handle.
    pub fn program(&self, id: ProgramId) -> Result<&B::Program, ShaderError> {
        self.programs
            .get(&id)
            .ok_or(ShaderError::UnknownProgram(id.get()))
    }

    /// Location of a named vertex attribute, `None` if the program has no such
    /// input.
    pub fn attribute_location(&self, id: ProgramId, name: &str) -> Result<Option<u32>, ShaderError> {
        let program = self.program(id)?;
        Ok(self.backend.attribute_location(program, name))
    }

    /// Binding of a named uniform, texture or sampler, `None` if the program
    /// declares no such resource.
    pub fn uniform_location(
        &self,
        id: ProgramId,
        name: &str,
    ) -> Result<Option<UniformLocation>, ShaderError> {
        let program = self.program(id)?;
        Ok(self.backend.uniform_location(program, name))
    }
}

fn non_empty(log: String) -> String {
    if log.trim().is_empty() {
        "no diagnostic available".to_string()
    } else {
        log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A backend that accepts anything not containing "error".
    #[derive(Default)]
    struct StubBackend {
        links: usize,
    }

    impl ShaderBackend for StubBackend {
        type Shader = String;
        type Program = (String, String);

        fn compile(&mut self, _stage: ShaderStage, source: &str) -> Result<String, String> {
            if source.contains("error") {
                Err(String::new())
            } else {
                Ok(source.to_string())
            }
        }

        fn link(&mut self, vertex: &String, fragment: &String) -> Result<Self::Program, String> {
            self.links += 1;
            if vertex.contains("unlinkable") {
                Err("unresolved varying".into())
            } else {
                Ok((vertex.clone(), fragment.clone()))
            }
        }

        fn attribute_location(&self, program: &Self::Program, name: &str) -> Option<u32> {
            program.0.find(name).map(|i| i as u32)
        }

        fn uniform_location(&self, program: &Self::Program, name: &str) -> Option<UniformLocation> {
            program.1.contains(name).then_some(UniformLocation {
                group: 0,
                binding: 0,
            })
        }
    }

    #[test]
    fn link_returns_nonzero_program() {
        let mut pipeline = ShaderPipeline::new(StubBackend::default());
        assert_eq!(pipeline.state(), PipelineState::Uncompiled);

        let id = pipeline.link("vs pos", "fs mvp").unwrap();
        assert!(id.get() > 0);
        assert_eq!(pipeline.state(), PipelineState::Ready);
        assert_eq!(pipeline.shader_count(), 0);
        assert_eq!(pipeline.program_count(), 1);
        assert_eq!(pipeline.attribute_location(id, "pos").unwrap(), Some(3));
        assert_eq!(pipeline.attribute_location(id, "normal").unwrap(), None);
        assert!(pipeline.uniform_location(id, "mvp").unwrap().is_some());
    }

    #[test]
    fn compile_failure_has_a_log() {
        let mut pipeline = ShaderPipeline::new(StubBackend::default());
        let err = pipeline.compile(ShaderStage::Fragment, "error").unwrap_err();
        let ShaderError::Compile { stage, log } = err else {
            panic!("expected a compile error");
        };
        assert_eq!(stage, ShaderStage::Fragment);
        assert!(!log.is_empty());
        assert_eq!(pipeline.state(), PipelineState::Failed);
        assert_eq!(pipeline.shader_count(), 0);
    }

    #[test]
    fn failed_fragment_compile_releases_vertex_shader() {
        let mut pipeline = ShaderPipeline::new(StubBackend::default());
        assert!(matches!(
            pipeline.link("vs", "error"),
            Err(ShaderError::Compile {
                stage: ShaderStage::Fragment,
                ..
            })
        ));
        assert_eq!(pipeline.shader_count(), 0);
        assert_eq!(pipeline.backend().links, 0);
    }

    #[test]
    fn link_failure_releases_shaders() {
        let mut pipeline = ShaderPipeline::new(StubBackend::default());
        let err = pipeline.link("unlinkable", "fs").unwrap_err();
        assert_eq!(
            err,
            ShaderError::Link {
                log: "unresolved varying".into()
            }
        );
        assert_eq!(pipeline.shader_count(), 0);
        assert_eq!(pipeline.program_count(), 0);
        assert_eq!(pipeline.state(), PipelineState::Failed);
    }

    #[test]
    fn link_shaders_checks_stages() {
        let mut pipeline = ShaderPipeline::new(StubBackend::default());
        let vs = pipeline.compile(ShaderStage::Vertex, "vs").unwrap();
        let fs = pipeline.compile(ShaderStage::Fragment, "fs").unwrap();
        assert_eq!(pipeline.state(), PipelineState::Compiled);
        assert_ne!(vs, fs);

        let err = pipeline.link_shaders(fs, vs).unwrap_err();
        assert_eq!(
            err,
            ShaderError::StageMismatch {
                expected: ShaderStage::Vertex,
                actual: ShaderStage::Fragment
            }
        );
        assert_eq!(pipeline.shader_count(), 0);
        assert_eq!(
            pipeline.link_shaders(vs, fs).unwrap_err(),
            ShaderError::UnknownShader(vs.get())
        );
    }

    #[test]
    fn same_shader_twice_is_rejected() {
        let mut pipeline = ShaderPipeline::new(StubBackend::default());
        let vs = pipeline.compile(ShaderStage::Vertex, "vs").unwrap();
        assert!(pipeline.link_shaders(vs, vs).is_err());
        assert_eq!(pipeline.shader_count(), 0);
    }

    #[test]
    fn deleted_handles_are_unknown() {
        let mut pipeline = ShaderPipeline::new(StubBackend::default());
        let id = pipeline.link("vs", "fs").unwrap();
        pipeline.delete_program(id).unwrap();
        assert_eq!(
            pipeline.delete_program(id),
            Err(ShaderError::UnknownProgram(id.get()))
        );
        assert!(pipeline.attribute_location(id, "vs").is_err());

        let shader = pipeline.compile(ShaderStage::Vertex, "vs").unwrap();
        pipeline.delete_shader(shader).unwrap();
        assert_eq!(pipeline.shader_count(), 0);
        assert!(pipeline.delete_shader(shader).is_err());
    }

    #[test]
    fn handles_are_unique() {
        let mut pipeline = ShaderPipeline::new(StubBackend::default());
        let a = pipeline.link("a", "b").unwrap();
        let b = pipeline.link("a", "b").unwrap();
        assert_ne!(a, b);
        assert_eq!(pipeline.program_count(), 2);
    }

    #[test]
    fn wrapped_ids_skip_live_handles() {
        let mut pipeline = ShaderPipeline::new(StubBackend::default());
        let first = pipeline.link("vs first", "fs").unwrap();
        assert_eq!(first.get(), 3);
        let pending = pipeline.compile(ShaderStage::Vertex, "vs pending").unwrap();
        assert_eq!(pending.get(), 4);

        pipeline.next_id = NonZeroU32::MAX;
        let vs = pipeline.compile(ShaderStage::Vertex, "vs").unwrap();
        assert_eq!(vs.get(), u32::MAX);
        let fs = pipeline.compile(ShaderStage::Fragment, "fs").unwrap();
        assert_eq!(fs.get(), 1);
        let second = pipeline.compile(ShaderStage::Fragment, "fs").unwrap();
        assert_eq!(second.get(), 2);
        let program = pipeline.link_shaders(vs, fs).unwrap();
        assert_eq!(program.get(), 5);

        assert_eq!(pipeline.attribute_location(first, "first").unwrap(), Some(3));
        assert_eq!(pipeline.program_count(), 2);
        assert_eq!(pipeline.shader_count(), 2);
        pipeline.delete_shader(pending).unwrap();
        pipeline.delete_shader(second).unwrap();
    }

    #[test]
    fn linked_until_pending_shaders_are_consumed() {
        let mut pipeline = ShaderPipeline::new(StubBackend::default());
        let vs_a = pipeline.compile(ShaderStage::Vertex, "vs a").unwrap();
        let fs_a = pipeline.compile(ShaderStage::Fragment, "fs a").unwrap();
        let vs_b = pipeline.compile(ShaderStage::Vertex, "vs b").unwrap();
        let fs_b = pipeline.compile(ShaderStage::Fragment, "fs b").unwrap();
        assert_eq!(pipeline.state(), PipelineState::Compiled);

        pipeline.link_shaders(vs_a, fs_a).unwrap();
        assert_eq!(pipeline.state(), PipelineState::Linked);
        assert_eq!(pipeline.shader_count(), 2);

        pipeline.link_shaders(vs_b, fs_b).unwrap();
        assert_eq!(pipeline.state(), PipelineState::Ready);
        assert_eq!(pipeline.shader_count(), 0);
    }
}
