//! The demo routines.
//!
//! Each [`Routine`] bundles a WGSL shader pair, the mesh it draws and the
//! order in which mesh buffers feed the vertex shader. [`Transforms`]
//! recomputes the model-view-projection matrix the 3D routines upload every
//! frame.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::config::DemoConfig;
use crate::gpu::GpuError;
use crate::gpu_mesh::{BufferSlot, MissingBuffer};
use crate::matrix::{Matrix, MatrixError};
use crate::mesh::{Attributes, Mesh, MeshError};
use crate::shader::ShaderError;

#[derive(Debug, thiserror::Error)]
pub enum RoutineError {
    #[error("unknown routine {0:?}, expected 1 to 4")]
    Unknown(String),

    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error(transparent)]
    Draw(#[from] MissingBuffer),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Routine {
    /// Static red triangle.
    #[default]
    Triangle,
    /// Rotating cube with random vertex colours.
    ColouredCube,
    /// Rotating textured cube.
    TexturedCube,
    /// Rotating sphere with random vertex colours.
    ColouredSphere,
}

const TRIANGLE_VS: &str = r#"
@vertex
fn vs_main(@location(0) position: vec3f) -> @builtin(position) vec4f {
    return vec4f(position, 1.0);
}
"#;

const TRIANGLE_FS: &str = r#"
@fragment
fn fs_main() -> @location(0) vec4f {
    return vec4f(1.0, 0.0, 0.0, 1.0);
}
"#;

const COLOURED_VS: &str = r#"
@group(0) @binding(0) var<uniform> mvp: mat4x4f;

struct VertexOut {
    @builtin(position) clip_position: vec4f,
    @location(0) color: vec3f,
}

@vertex
fn vs_main(@location(0) position: vec3f, @location(1) color: vec3f) -> VertexOut {
    var out: VertexOut;
    out.clip_position = mvp * vec4f(position, 1.0);
    out.color = color;
    return out;
}
"#;

const COLOURED_FS: &str = r#"
@fragment
fn fs_main(@location(0) color: vec3f) -> @location(0) vec4f {
    return vec4f(color, 1.0);
}
"#;

const TEXTURED_VS: &str = r#"
@group(0) @binding(0) var<uniform> mvp: mat4x4f;

struct VertexOut {
    @builtin(position) clip_position: vec4f,
    @location(0) tex_coord: vec2f,
}

@vertex
fn vs_main(@location(0) position: vec3f, @location(1) tex_coord: vec2f) -> VertexOut {
    var out: VertexOut;
    out.clip_position = mvp * vec4f(position, 1.0);
    out.tex_coord = tex_coord;
    return out;
}
"#;

const TEXTURED_FS: &str = r#"
@group(0) @binding(1) var s_texture: texture_2d<f32>;
@group(0) @binding(2) var s_sampler: sampler;

@fragment
fn fs_main(@location(0) tex_coord: vec2f) -> @location(0) vec4f {
    return textureSample(s_texture, s_sampler, tex_coord);
}
"#;

impl Routine {
    pub const ALL: [Routine; 4] = [
        Routine::Triangle,
        Routine::ColouredCube,
        Routine::TexturedCube,
        Routine::ColouredSphere,
    ];

    /// The numeric selector, 1 to 4.
    pub fn number(self) -> u8 {
        match self {
            Self::Triangle => 1,
            Self::ColouredCube => 2,
            Self::TexturedCube => 3,
            Self::ColouredSphere => 4,
        }
    }

    /// Vertex and fragment WGSL sources.
    pub fn shaders(self) -> (&'static str, &'static str) {
        match self {
            Self::Triangle => (TRIANGLE_VS, TRIANGLE_FS),
            Self::ColouredCube | Self::ColouredSphere => (COLOURED_VS, COLOURED_FS),
            Self::TexturedCube => (TEXTURED_VS, TEXTURED_FS),
        }
    }

    /// Mesh buffers in vertex shader location order.
    pub fn vertex_inputs(self) -> &'static [BufferSlot] {
        match self {
            Self::Triangle => &[BufferSlot::Positions],
            Self::ColouredCube | Self::ColouredSphere => &[BufferSlot::Positions, BufferSlot::Colors],
            Self::TexturedCube => &[BufferSlot::Positions, BufferSlot::TexCoords],
        }
    }

    /// Arrays the routine's mesh has to be generated with.
    pub fn attributes(self) -> Attributes {
        match self {
            Self::TexturedCube => Attributes::POSITIONS | Attributes::TEX_COORDS | Attributes::INDICES,
            _ => Attributes::POSITIONS | Attributes::INDICES,
        }
    }

    /// Whether the routine moves its object every frame.
    pub fn animated(self) -> bool {
        self != Self::Triangle
    }

    /// Generates the routine's mesh, with random vertex colours for the
    /// coloured routines.
    pub fn build_mesh<R: Rng + ?Sized>(
        self,
        config: &DemoConfig,
        rng: &mut R,
    ) -> Result<Mesh, RoutineError> {
        let attributes = self.attributes();
        let mesh = match self {
            Self::Triangle => Mesh::triangle(attributes),
            Self::ColouredCube => Mesh::cube(config.cube_scale, attributes).with_random_colors(rng),
            Self::TexturedCube => Mesh::cube(config.cube_scale, attributes),
            Self::ColouredSphere => {
                Mesh::sphere(config.sphere_slices, config.sphere_radius, attributes)?
                    .with_random_colors(rng)
            }
        };
        Ok(mesh)
    }
}

impl fmt::Display for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Triangle => "red triangle",
            Self::ColouredCube => "vertex-coloured cube",
            Self::TexturedCube => "textured cube",
            Self::ColouredSphere => "vertex-coloured sphere",
        };
        write!(f, "{} ({name})", self.number())
    }
}

impl TryFrom<u8> for Routine {
    type Error = RoutineError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|r| r.number() == value)
            .ok_or_else(|| RoutineError::Unknown(value.to_string()))
    }
}

impl FromStr for Routine {
    type Err = RoutineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .map_err(|_| RoutineError::Unknown(s.to_string()))
            .and_then(Routine::try_from)
    }
}

/// The matrices of the animated routines.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Transforms {
    pub model: Matrix,
    pub view: Matrix,
    pub projection: Matrix,
    /// `projection * view * model`
    pub mvp: Matrix,
}

impl Transforms {
    /// Recomputes every matrix for an object rotated `angle` degrees about
    /// `(1, 1, 0)` and lifted by `y`, seen from `config.camera_distance`
    /// away through a perspective of the given aspect ratio.
    ///
    /// On error the previous matrices are kept.
    pub fn update(
        &mut self,
        config: &DemoConfig,
        angle: f32,
        y: f32,
        aspect: f32,
    ) -> Result<&Matrix, MatrixError> {
        let mut model = Matrix::identity();
        model.rotate(angle, 1.0, 1.0, 0.0)?.translate(0.0, y, 0.0);

        let mut view = Matrix::identity();
        view.rotate(180.0, 0.0, 1.0, 0.0)?
            .translate(0.0, 0.0, config.camera_distance);

        let mut projection = Matrix::identity();
        projection.perspective(config.fov, aspect, config.near, config.far)?;

        let mvp = Matrix::multiply(&Matrix::multiply(&projection, &view), &model);
        *self = Self {
            model,
            view,
            projection,
            mvp,
        };
        Ok(&self.mvp)
    }

    /// The MVP matrix as uniform buffer bytes.
    pub fn mvp_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.mvp)
    }
}
