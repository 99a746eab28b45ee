use std::collections::HashMap;

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, Binding, BuiltIn, Handle, Module, ScalarKind, Type, TypeInner, VectorSize};

use super::{ShaderBackend, ShaderStage, UniformLocation};

/// A parsed and validated WGSL module with the entry point for its stage.
#[derive(Debug, Clone)]
pub struct NagaShader {
    stage: ShaderStage,
    entry_point: String,
    module: Module,
}

impl NagaShader {
    /// Stage the shader was compiled for.
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Name of the module's entry point for [`stage`](Self::stage).
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// The validated IR.
    pub fn module(&self) -> &Module {
        &self.module
    }
}

/// A vertex input of a linked program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexAttribute {
    pub name: String,
    pub location: u32,
    pub format: wgpu::VertexFormat,
}

/// Interface tables of a linked vertex/fragment pair.
#[derive(Debug, Clone, Default)]
pub struct NagaProgram {
    vertex_entry: String,
    fragment_entry: String,
    attributes: Vec<VertexAttribute>,
    uniforms: HashMap<String, UniformLocation>,
}

impl NagaProgram {
    /// Entry point of the vertex stage.
    pub fn vertex_entry(&self) -> &str {
        &self.vertex_entry
    }

    /// Entry point of the fragment stage.
    pub fn fragment_entry(&self) -> &str {
        &self.fragment_entry
    }

    /// Vertex inputs ordered by location.
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Uniform bindings of both stages, keyed by global variable name.
    pub fn uniforms(&self) -> &HashMap<String, UniformLocation> {
        &self.uniforms
    }
}

/// Headless WGSL compiler built on `naga`.
///
/// Compiling parses and validates a module. Linking checks that the vertex
/// stage feeds every input the fragment stage reads and collects the
/// attribute and uniform tables.
#[derive(Debug, Default)]
pub struct NagaBackend;

impl NagaBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ShaderBackend for NagaBackend {
    type Shader = NagaShader;
    type Program = NagaProgram;

    fn compile(&mut self, stage: ShaderStage, source: &str) -> Result<NagaShader, String> {
        let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

        let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
        validator
            .validate(&module)
            .map_err(|e| format!("validation error: {}", error_chain(&e)))?;

        let wanted = match stage {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        };
        let entry_point = module
            .entry_points
            .iter()
            .find(|ep| ep.stage == wanted)
            .map(|ep| ep.name.clone())
            .ok_or_else(|| format!("no @{stage} entry point in module"))?;

        Ok(NagaShader {
            stage,
            entry_point,
            module,
        })
    }

    fn link(&mut self, vertex: &NagaShader, fragment: &NagaShader) -> Result<NagaProgram, String> {
        let vs_entry = entry_point(vertex)?;
        let fs_entry = entry_point(fragment)?;

        // Vertex outputs, keyed by location.
        let mut outputs = HashMap::new();
        let mut writes_position = false;
        if let Some(result) = &vs_entry.function.result {
            for io in flatten(&vertex.module, None, result.ty, result.binding.as_ref()) {
                match io.binding {
                    IoBinding::Location(location) => {
                        outputs.insert(location, io.ty);
                    }
                    IoBinding::Position => writes_position = true,
                    IoBinding::Other => {}
                }
            }
        }
        if !writes_position {
            return Err(format!(
                "vertex entry point `{}` does not write @builtin(position)",
                vertex.entry_point
            ));
        }

        let mut errors = Vec::new();
        for arg in &fs_entry.function.arguments {
            for io in flatten(&fragment.module, arg.name.as_deref(), arg.ty, arg.binding.as_ref()) {
                let IoBinding::Location(location) = io.binding else {
                    continue;
                };
                match outputs.get(&location) {
                    None => errors.push(format!(
                        "fragment input `{}` at @location({location}) is not written by the vertex stage",
                        io.name
                    )),
                    Some(written) if *written != io.ty => errors.push(format!(
                        "fragment input `{}` at @location({location}) is {:?} but the vertex stage writes {:?}",
                        io.name, io.ty, written
                    )),
                    Some(_) => {}
                }
            }
        }
        if !errors.is_empty() {
            return Err(errors.join("\n"));
        }

        let mut attributes = Vec::new();
        for arg in &vs_entry.function.arguments {
            for io in flatten(&vertex.module, arg.name.as_deref(), arg.ty, arg.binding.as_ref()) {
                let IoBinding::Location(location) = io.binding else {
                    continue;
                };
                let format = vertex_format(&io.ty).ok_or_else(|| {
                    format!(
                        "vertex input `{}` at @location({location}) has unsupported type {:?}",
                        io.name, io.ty
                    )
                })?;
                attributes.push(VertexAttribute {
                    name: io.name,
                    location,
                    format,
                });
            }
        }
        attributes.sort_by_key(|a| a.location);

        let mut uniforms = HashMap::new();
        for module in [&vertex.module, &fragment.module] {
            for (_, var) in module.global_variables.iter() {
                if !matches!(var.space, AddressSpace::Uniform | AddressSpace::Handle) {
                    continue;
                }
                if let (Some(name), Some(binding)) = (&var.name, &var.binding) {
                    uniforms.insert(
                        name.clone(),
                        UniformLocation {
                            group: binding.group,
                            binding: binding.binding,
                        },
                    );
                }
            }
        }

        Ok(NagaProgram {
            vertex_entry: vertex.entry_point.clone(),
            fragment_entry: fragment.entry_point.clone(),
            attributes,
            uniforms,
        })
    }

    fn attribute_location(&self, program: &NagaProgram, name: &str) -> Option<u32> {
        program
            .attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.location)
    }

    fn uniform_location(&self, program: &NagaProgram, name: &str) -> Option<UniformLocation> {
        program.uniforms.get(name).copied()
    }
}

fn entry_point(shader: &NagaShader) -> Result<&naga::EntryPoint, String> {
    shader
        .module
        .entry_points
        .iter()
        .find(|ep| ep.name == shader.entry_point)
        .ok_or_else(|| format!("entry point `{}` disappeared", shader.entry_point))
}

enum IoBinding {
    Location(u32),
    Position,
    Other,
}

struct Io {
    name: String,
    binding: IoBinding,
    ty: TypeInner,
}

/// Expands an entry point argument or result into its bound values, looking
/// through structs.
fn flatten(module: &Module, name: Option<&str>, ty: Handle<Type>, binding: Option<&Binding>) -> Vec<Io> {
    let inner = &module.types[ty].inner;
    match (binding, inner) {
        (Some(binding), _) => vec![Io {
            name: name.unwrap_or("<result>").to_string(),
            binding: classify(binding),
            ty: inner.clone(),
        }],
        (None, TypeInner::Struct { members, .. }) => members
            .iter()
            .filter_map(|member| {
                let binding = member.binding.as_ref()?;
                Some(Io {
                    name: member.name.clone().unwrap_or_default(),
                    binding: classify(binding),
                    ty: module.types[member.ty].inner.clone(),
                })
            })
            .collect(),
        (None, _) => Vec::new(),
    }
}

fn classify(binding: &Binding) -> IoBinding {
    match binding {
        Binding::Location { location, .. } => IoBinding::Location(*location),
        Binding::BuiltIn(BuiltIn::Position { .. }) => IoBinding::Position,
        _ => IoBinding::Other,
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut log = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        log.push_str(": ");
        log.push_str(&cause.to_string());
        source = cause.source();
    }
    log
}

fn vertex_format(ty: &TypeInner) -> Option<wgpu::VertexFormat> {
    use wgpu::VertexFormat as F;
    match *ty {
        TypeInner::Scalar(scalar) if scalar.kind == ScalarKind::Float && scalar.width == 4 => {
            Some(F::Float32)
        }
        TypeInner::Vector { size, scalar } if scalar.kind == ScalarKind::Float && scalar.width == 4 => {
            Some(match size {
                VectorSize::Bi => F::Float32x2,
                VectorSize::Tri => F::Float32x3,
                VectorSize::Quad => F::Float32x4,
            })
        }
        _ => None,
    }
}
