//! # Tessera
//!
//! **Transforms, procedural meshes and shader programs for small GPUs.**
//!
//! Tessera covers the three pieces a minimal 3D demo needs before it can put
//! anything on screen:
//!
//! - [`Matrix`]: a 4×4 transform stack (translate, scale, rotate, frustum,
//!   perspective, ortho) that composes the way fixed-function GL did.
//! - [`Mesh`]: exact vertex, normal, texture coordinate and index arrays for
//!   a cube and a UV sphere, kept inside the 16-bit index range.
//! - [`ShaderPipeline`]: compile and link of WGSL vertex/fragment pairs with
//!   readable diagnostics, headless through `naga` or on a real device
//!   through `wgpu`.
//!
//! ## Quick Start
//!
//! ```
//! use tessera::{Attributes, Matrix, Mesh, ShaderPipeline, NagaBackend, Routine};
//!
//! let mut mvp = Matrix::identity();
//! mvp.perspective(45.0, 4.0 / 3.0, 0.1, 100.0)?
//!     .translate(0.0, 0.0, -5.0)
//!     .rotate(30.0, 1.0, 1.0, 0.0)?;
//!
//! let sphere = Mesh::sphere(350, 1.0, Attributes::all())?;
//! assert_eq!(sphere.vertex_count(), 61_776);
//!
//! let mut shaders = ShaderPipeline::new(NagaBackend::new());
//! let (vs, fs) = Routine::ColouredSphere.shaders();
//! let program = shaders.link(vs, fs)?;
//! assert_eq!(shaders.attribute_location(program, "position")?, Some(0));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The demo routines of the `tessera` binary live in [`Routine`]; they run on
//! a headless device through [`RoutineRenderer`] and [`Harness`].

mod config;
mod gpu;
mod gpu_mesh;
mod harness;
mod logging;
mod matrix;
mod mesh;
mod renderer;
mod routine;
pub mod shader;

pub use config::DemoConfig;
pub use gpu::{GpuContext, GpuError};
pub use gpu_mesh::{BufferSlot, GpuMesh, MissingBuffer};
pub use harness::{Context, Harness, RunStats};
pub use logging::{LoggingConfig, init_logging};
pub use matrix::{Matrix, MatrixError};
pub use mesh::{Attributes, MAX_VERTICES, MIN_SPHERE_SLICES, Mesh, MeshError, SphereLayout};
pub use renderer::{RoutineRenderer, checkerboard};
pub use routine::{Routine, RoutineError, Transforms};
pub use shader::{
    NagaBackend, PipelineState, ProgramId, ShaderBackend, ShaderError, ShaderId, ShaderPipeline,
    ShaderStage, UniformLocation, WgpuBackend,
};
