//! Check a shader module against the host layout.
//!
//! Parses nothing itself: it walks a [`naga::Module`] and compares what the
//! shader declares with [`BufferIndex`], [`VertexAttribute`], [`TextureIndex`]
//! and [`Uniforms`](crate::Uniforms). Every disagreement is collected so one
//! run reports all of them.
//!
//! Checked:
//! - contract constants (`BUFFER_INDEX_*`, `VERTEX_ATTRIBUTE_*`, `TEXTURE_INDEX_*`)
//!   carry the host values;
//! - `struct Uniforms` and every `var<uniform>` in the uniform group have the
//!   192-byte, three-matrix layout, bound at [`BufferIndex::Uniforms`];
//! - textures and samplers in the texture group sit on [`TextureIndex`]
//!   bindings with the right texture class;
//! - vertex entry point inputs use known [`VertexAttribute`] locations with the
//!   format of [`VertexDescriptor::standard`].

use std::collections::HashSet;
use std::fmt;

use naga::{
    AddressSpace, Binding, Expression, Handle, ImageClass, ImageDimension, Literal, Module,
    Scalar, ScalarKind, ShaderStage, Type, TypeInner,
};

use crate::error::{Result, ShaderTypesError};
use crate::mesh::VertexDescriptor;
use crate::shader::{ShaderComposer, parse_and_validate};
use crate::types::{BufferIndex, TextureIndex, UNIFORMS_SIZE, VertexAttribute};

/// Name of the uniform struct on the shader side.
pub const UNIFORMS_STRUCT_NAME: &str = "Uniforms";

/// Member names and byte offsets of `struct Uniforms`, in declaration order.
pub const UNIFORMS_MEMBERS: [(&str, u32); 3] = [
    ("projection_matrix", 0),
    ("model_view_matrix", 64),
    ("shadow_view_matrix", 128),
];

const MATRIX_TYPE: &str = "mat4x4<f32>";

/// Which bind groups carry the two slot families.
///
/// WGSL has no separate buffer and texture tables; both live in
/// numbered bind groups, so the uniform block and the textures each get a
/// group of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingScheme {
    /// Group holding the `Uniforms` block at [`BufferIndex::Uniforms`].
    pub uniform_group: u32,
    /// Group holding textures at [`TextureIndex`] and their samplers.
    pub texture_group: u32,
}

impl Default for BindingScheme {
    fn default() -> Self {
        Self {
            uniform_group: 0,
            texture_group: 1,
        }
    }
}

/// One disagreement between a shader and the host layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    /// A contract constant has a different value (or is not an integer).
    ConstantMismatch {
        name: String,
        expected: u32,
        found: Option<i64>,
    },
    /// A `Uniforms` layout has the wrong total size.
    UniformsSize { expected: u32, found: u32 },
    /// A `Uniforms` member has the wrong name, offset or type.
    UniformsMember {
        index: usize,
        expected: String,
        found: String,
    },
    /// A uniform buffer in the uniform group is bound at the wrong slot.
    UniformBinding {
        name: String,
        expected: u32,
        found: u32,
    },
    /// A uniform buffer in the uniform group is not a struct.
    UniformType { name: String, found: String },
    /// A texture in the texture group sits on an unknown binding.
    UnknownTextureBinding { name: String, binding: u32 },
    /// A texture sits on a known binding but has the wrong type.
    TextureType {
        name: String,
        slot: TextureIndex,
        expected: &'static str,
        found: String,
    },
    /// A sampler in the texture group sits on an unknown binding.
    UnknownSamplerBinding { name: String, binding: u32 },
    /// A vertex input uses a location that is not a [`VertexAttribute`].
    UnknownVertexLocation { entry_point: String, location: u32 },
    /// A vertex input has a type that does not match the vertex descriptor.
    VertexAttributeType {
        entry_point: String,
        attribute: VertexAttribute,
        expected: &'static str,
        found: String,
    },
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConstantMismatch {
                name,
                expected,
                found: Some(found),
            } => write!(f, "constant {name} is {found}, host uses {expected}"),
            Self::ConstantMismatch {
                name,
                expected,
                found: None,
            } => write!(f, "constant {name} is not an integer literal, host uses {expected}"),
            Self::UniformsSize { expected, found } => {
                write!(f, "uniform block is {found} bytes, host uses {expected}")
            }
            Self::UniformsMember {
                index,
                expected,
                found,
            } => write!(f, "uniform member {index}: expected {expected}, found {found}"),
            Self::UniformBinding {
                name,
                expected,
                found,
            } => write!(f, "uniform `{name}` bound at {found}, host binds {expected}"),
            Self::UniformType { name, found } => {
                write!(f, "uniform `{name}` has type {found}, expected struct Uniforms")
            }
            Self::UnknownTextureBinding { name, binding } => {
                write!(f, "texture `{name}` at unknown binding {binding}")
            }
            Self::TextureType {
                name,
                slot,
                expected,
                found,
            } => write!(f, "texture `{name}` at {slot} is {found}, expected {expected}"),
            Self::UnknownSamplerBinding { name, binding } => {
                write!(f, "sampler `{name}` at unknown binding {binding}")
            }
            Self::UnknownVertexLocation {
                entry_point,
                location,
            } => write!(f, "`{entry_point}` reads unknown vertex location {location}"),
            Self::VertexAttributeType {
                entry_point,
                attribute,
                expected,
                found,
            } => write!(
                f,
                "`{entry_point}` reads {attribute} as {found}, vertex layout provides {expected}"
            ),
        }
    }
}

/// Vertex attributes consumed by one vertex entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexInputs {
    pub entry_point: String,
    pub attributes: Vec<VertexAttribute>,
}

/// What a successful check found in the module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractReport {
    /// Number of contract constants found and checked.
    pub constants_checked: usize,
    /// Whether a `struct Uniforms` was declared.
    pub uniforms_struct: bool,
    /// Binding of the uniform block in the uniform group, if bound.
    pub uniform_binding: Option<u32>,
    /// Texture slots bound in the texture group.
    pub textures: Vec<TextureIndex>,
    /// Texture slots whose sampler is bound in the texture group.
    pub samplers: Vec<TextureIndex>,
    /// Inputs of every vertex entry point.
    pub vertex_inputs: Vec<VertexInputs>,
}

/// Names and values of the WGSL constants mirroring the slot enumerations.
pub fn contract_constants() -> Vec<(String, u32)> {
    let buffers = BufferIndex::ALL
        .iter()
        .map(|s| (constant_name("BUFFER_INDEX", s.name()), s.index()));
    let attributes = VertexAttribute::ALL
        .iter()
        .map(|s| (constant_name("VERTEX_ATTRIBUTE", s.name()), s.index()));
    let textures = TextureIndex::ALL
        .iter()
        .map(|s| (constant_name("TEXTURE_INDEX", s.name()), s.index()));
    buffers.chain(attributes).chain(textures).collect()
}

fn constant_name(prefix: &str, label: &str) -> String {
    format!("{prefix}_{}", label.to_uppercase().replace(' ', "_"))
}

/// Compose `source` (resolving `#include "shader_types.wgsl"`), parse it and
/// check it against the host layout.
pub fn verify_wgsl(source: &str, scheme: &BindingScheme) -> Result<ContractReport> {
    let composed = ShaderComposer::with_shader_types().compose(source)?;
    let module = parse_and_validate(&composed)?;
    verify_module(&module, scheme)
}

/// Check a parsed module against the host layout.
pub fn verify_module(module: &Module, scheme: &BindingScheme) -> Result<ContractReport> {
    let mut checker = Checker {
        module,
        scheme,
        vertex_layout: VertexDescriptor::standard(),
        report: ContractReport::default(),
        violations: Vec::new(),
        checked_uniform_types: HashSet::new(),
    };

    checker.check_constants();
    checker.check_uniforms_struct();
    checker.check_globals();
    checker.check_vertex_inputs();

    if checker.violations.is_empty() {
        log::debug!("shader matches host layout: {:?}", checker.report);
        Ok(checker.report)
    } else {
        for violation in &checker.violations {
            log::warn!("shader layout mismatch: {violation}");
        }
        Err(ShaderTypesError::ContractViolations(checker.violations))
    }
}

struct Checker<'a> {
    module: &'a Module,
    scheme: &'a BindingScheme,
    vertex_layout: VertexDescriptor,
    report: ContractReport,
    violations: Vec<ContractViolation>,
    checked_uniform_types: HashSet<Handle<Type>>,
}

impl Checker<'_> {
    fn check_constants(&mut self) {
        let module = self.module;
        let expected = contract_constants();

        for (_, constant) in module.constants.iter() {
            let Some(name) = constant.name.as_deref() else {
                continue;
            };
            let Some(&(_, value)) = expected.iter().find(|(n, _)| n == name) else {
                continue;
            };

            self.report.constants_checked += 1;
            let found = literal_value(&module.global_expressions[constant.init]);
            if found != Some(i64::from(value)) {
                self.violations.push(ContractViolation::ConstantMismatch {
                    name: name.to_string(),
                    expected: value,
                    found,
                });
            }
        }
    }

    fn check_uniforms_struct(&mut self) {
        let module = self.module;
        let declared = module
            .types
            .iter()
            .find(|(_, ty)| {
                ty.name.as_deref() == Some(UNIFORMS_STRUCT_NAME)
                    && matches!(ty.inner, TypeInner::Struct { .. })
            })
            .map(|(handle, _)| handle);

        if let Some(handle) = declared {
            self.report.uniforms_struct = true;
            self.check_uniforms_layout(handle);
        }
    }

    fn check_uniforms_layout(&mut self, handle: Handle<Type>) {
        let module = self.module;
        if !self.checked_uniform_types.insert(handle) {
            return;
        }

        let TypeInner::Struct { ref members, span } = module.types[handle].inner else {
            return;
        };

        if span != UNIFORMS_SIZE as u32 {
            self.violations.push(ContractViolation::UniformsSize {
                expected: UNIFORMS_SIZE as u32,
                found: span,
            });
        }

        for (index, &(name, offset)) in UNIFORMS_MEMBERS.iter().enumerate() {
            let expected = format!("{name}: {MATRIX_TYPE} @ {offset}");
            let Some(member) = members.get(index) else {
                self.violations.push(ContractViolation::UniformsMember {
                    index,
                    expected,
                    found: "nothing".to_string(),
                });
                continue;
            };

            let member_name = member.name.as_deref().unwrap_or("<unnamed>");
            let member_type = describe_type(module, member.ty);
            if member_name != name || member.offset != offset || member_type != MATRIX_TYPE {
                self.violations.push(ContractViolation::UniformsMember {
                    index,
                    expected,
                    found: format!("{member_name}: {member_type} @ {}", member.offset),
                });
            }
        }

        for (index, member) in members.iter().enumerate().skip(UNIFORMS_MEMBERS.len()) {
            self.violations.push(ContractViolation::UniformsMember {
                index,
                expected: "nothing".to_string(),
                found: format!(
                    "{}: {} @ {}",
                    member.name.as_deref().unwrap_or("<unnamed>"),
                    describe_type(module, member.ty),
                    member.offset
                ),
            });
        }
    }

    fn check_globals(&mut self) {
        let module = self.module;
        for (_, global) in module.global_variables.iter() {
            let Some(binding) = global.binding.as_ref() else {
                continue;
            };
            let name = global.name.clone().unwrap_or_else(|| "<unnamed>".to_string());
            let inner = &module.types[global.ty].inner;

            if global.space == AddressSpace::Uniform && binding.group == self.scheme.uniform_group
            {
                self.check_uniform_global(name, binding.binding, global.ty);
                continue;
            }

            if binding.group != self.scheme.texture_group {
                continue;
            }

            match *inner {
                TypeInner::Image { .. } => {
                    self.check_texture_global(name, binding.binding, global.ty);
                }
                TypeInner::Sampler { .. } => {
                    match TextureIndex::ALL
                        .iter()
                        .find(|slot| slot.sampler_binding() == binding.binding)
                    {
                        Some(&slot) => self.report.samplers.push(slot),
                        None => self.violations.push(ContractViolation::UnknownSamplerBinding {
                            name,
                            binding: binding.binding,
                        }),
                    }
                }
                _ => {}
            }
        }
    }

    fn check_uniform_global(&mut self, name: String, binding: u32, ty: Handle<Type>) {
        let module = self.module;
        let expected = BufferIndex::Uniforms.index();
        if binding != expected {
            self.violations.push(ContractViolation::UniformBinding {
                name: name.clone(),
                expected,
                found: binding,
            });
        }

        if matches!(module.types[ty].inner, TypeInner::Struct { .. }) {
            self.report.uniform_binding = Some(binding);
            self.check_uniforms_layout(ty);
        } else {
            self.violations.push(ContractViolation::UniformType {
                name,
                found: describe_type(module, ty),
            });
        }
    }

    fn check_texture_global(&mut self, name: String, binding: u32, ty: Handle<Type>) {
        let module = self.module;
        let Ok(slot) = TextureIndex::try_from(binding) else {
            self.violations
                .push(ContractViolation::UnknownTextureBinding { name, binding });
            return;
        };

        let expected = expected_texture_type(slot);
        let found = describe_type(module, ty);
        if found == expected {
            self.report.textures.push(slot);
        } else {
            self.violations.push(ContractViolation::TextureType {
                name,
                slot,
                expected,
                found,
            });
        }
    }

    fn check_vertex_inputs(&mut self) {
        let module = self.module;
        for entry in &module.entry_points {
            if entry.stage != ShaderStage::Vertex {
                continue;
            }

            let mut inputs = Vec::new();
            for argument in &entry.function.arguments {
                match argument.binding {
                    Some(Binding::Location { location, .. }) => {
                        inputs.push((location, argument.ty));
                    }
                    Some(Binding::BuiltIn(_)) => {}
                    None => {
                        if let TypeInner::Struct { ref members, .. } =
                            module.types[argument.ty].inner
                        {
                            for member in members {
                                if let Some(Binding::Location { location, .. }) = member.binding {
                                    inputs.push((location, member.ty));
                                }
                            }
                        }
                    }
                }
            }

            let mut attributes = Vec::with_capacity(inputs.len());
            for (location, ty) in inputs {
                if let Some(attribute) = self.check_vertex_input(&entry.name, location, ty) {
                    attributes.push(attribute);
                }
            }
            attributes.sort();

            self.report.vertex_inputs.push(VertexInputs {
                entry_point: entry.name.clone(),
                attributes,
            });
        }
    }

    fn check_vertex_input(
        &mut self,
        entry_point: &str,
        location: u32,
        ty: Handle<Type>,
    ) -> Option<VertexAttribute> {
        let module = self.module;
        let described = VertexAttribute::try_from(location)
            .ok()
            .and_then(|attribute| {
                self.vertex_layout
                    .attribute(attribute)
                    .map(|(_, desc)| (attribute, desc.format.wgsl_type()))
            });

        let Some((attribute, expected)) = described else {
            self.violations.push(ContractViolation::UnknownVertexLocation {
                entry_point: entry_point.to_string(),
                location,
            });
            return None;
        };

        let found = describe_type(module, ty);
        if found != expected {
            self.violations.push(ContractViolation::VertexAttributeType {
                entry_point: entry_point.to_string(),
                attribute,
                expected,
                found,
            });
        }
        Some(attribute)
    }
}

fn expected_texture_type(slot: TextureIndex) -> &'static str {
    match slot {
        TextureIndex::Color => "texture_2d<f32>",
        TextureIndex::Shadow => "texture_depth_2d",
    }
}

fn literal_value(expression: &Expression) -> Option<i64> {
    match *expression {
        Expression::Literal(Literal::U32(v)) => Some(i64::from(v)),
        Expression::Literal(Literal::I32(v)) => Some(i64::from(v)),
        Expression::Literal(Literal::AbstractInt(v)) => Some(v),
        _ => None,
    }
}

/// WGSL-like spelling of a type, used for comparisons and messages.
fn describe_type(module: &Module, handle: Handle<Type>) -> String {
    let ty = &module.types[handle];
    match ty.inner {
        TypeInner::Scalar(scalar) => scalar_name(scalar),
        TypeInner::Vector { size, scalar } => {
            format!("vec{}<{}>", size as u8, scalar_name(scalar))
        }
        TypeInner::Matrix {
            columns,
            rows,
            scalar,
        } => format!(
            "mat{}x{}<{}>",
            columns as u8,
            rows as u8,
            scalar_name(scalar)
        ),
        TypeInner::Struct { .. } => {
            format!("struct {}", ty.name.as_deref().unwrap_or("<anonymous>"))
        }
        TypeInner::Image {
            dim,
            arrayed,
            class,
        } => {
            let dim = match dim {
                ImageDimension::D1 => "1d",
                ImageDimension::D2 => "2d",
                ImageDimension::D3 => "3d",
                ImageDimension::Cube => "cube",
            };
            let array = if arrayed { "_array" } else { "" };
            match class {
                ImageClass::Sampled { kind, multi } => {
                    let ms = if multi { "multisampled_" } else { "" };
                    let kind = scalar_name(Scalar { kind, width: 4 });
                    format!("texture_{ms}{dim}{array}<{kind}>")
                }
                ImageClass::Depth { multi } => {
                    let ms = if multi { "multisampled_" } else { "" };
                    format!("texture_depth_{ms}{dim}{array}")
                }
                ImageClass::Storage { .. } => format!("texture_storage_{dim}{array}"),
            }
        }
        TypeInner::Sampler { comparison: true } => "sampler_comparison".to_string(),
        TypeInner::Sampler { comparison: false } => "sampler".to_string(),
        _ => "unsupported type".to_string(),
    }
}

fn scalar_name(scalar: Scalar) -> String {
    match (scalar.kind, scalar.width) {
        (ScalarKind::Float, 2) => "f16".to_string(),
        (ScalarKind::Float, 4) => "f32".to_string(),
        (ScalarKind::Float, 8) => "f64".to_string(),
        (ScalarKind::Sint, 4) => "i32".to_string(),
        (ScalarKind::Uint, 4) => "u32".to_string(),
        (ScalarKind::Bool, _) => "bool".to_string(),
        (kind, width) => format!("{kind:?}{}", u32::from(width) * 8),
    }
}
