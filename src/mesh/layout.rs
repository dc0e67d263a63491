//! Vertex input layout keyed by the shared slot numbers.
//!
//! Meshes are split across two vertex buffers:
//!
//! - [`BufferIndex::MeshPositions`]: position and normal, interleaved (stride 24).
//! - [`BufferIndex::MeshGenerics`]: texture coordinates (stride 8).
//!
//! Keeping texcoords apart lets the shadow pass bind only the positions
//! buffer. Attribute locations are the [`VertexAttribute`] values, which the
//! vertex shader declares as `@location(n)`.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use static_assertions::const_assert_eq;

use crate::error::{Result, ShaderTypesError};
use crate::types::{BufferIndex, VertexAttribute};

/// Format of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    Float32x2,
    Float32x3,
    Float32x4,
}

impl VertexFormat {
    /// Size in bytes.
    pub const fn size(self) -> u32 {
        self.components() * 4
    }

    /// Number of `f32` components.
    pub const fn components(self) -> u32 {
        match self {
            Self::Float32x2 => 2,
            Self::Float32x3 => 3,
            Self::Float32x4 => 4,
        }
    }

    /// WGSL type spelling, e.g. `vec3<f32>`.
    pub const fn wgsl_type(self) -> &'static str {
        match self {
            Self::Float32x2 => "vec2<f32>",
            Self::Float32x3 => "vec3<f32>",
            Self::Float32x4 => "vec4<f32>",
        }
    }
}

/// How a vertex buffer advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexStepMode {
    #[default]
    Vertex,
    Instance,
}

/// One attribute inside a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttributeDescriptor {
    pub attribute: VertexAttribute,
    pub format: VertexFormat,
    /// Byte offset within one element of the buffer.
    pub offset: u32,
}

impl VertexAttributeDescriptor {
    pub const fn new(attribute: VertexAttribute, format: VertexFormat, offset: u32) -> Self {
        Self {
            attribute,
            format,
            offset,
        }
    }

    /// End offset (offset + size). Widened so offsets near `u32::MAX` do not wrap.
    pub fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.format.size())
    }
}

/// One vertex buffer binding and the attributes read from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexBufferDescriptor {
    pub slot: BufferIndex,
    pub stride: u32,
    pub step_mode: VertexStepMode,
    pub attributes: Vec<VertexAttributeDescriptor>,
}

impl VertexBufferDescriptor {
    /// Create a per-vertex buffer layout with the given stride.
    pub fn new(slot: BufferIndex, stride: u32) -> Self {
        Self {
            slot,
            stride,
            step_mode: VertexStepMode::Vertex,
            attributes: Vec::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attribute(
        mut self,
        attribute: VertexAttribute,
        format: VertexFormat,
        offset: u32,
    ) -> Self {
        self.attributes
            .push(VertexAttributeDescriptor::new(attribute, format, offset));
        self
    }

    /// Set the step mode to per-instance.
    pub fn with_instance_step(mut self) -> Self {
        self.step_mode = VertexStepMode::Instance;
        self
    }
}

/// Stride of the [`BufferIndex::MeshPositions`] stream.
pub const MESH_POSITIONS_STRIDE: u32 = std::mem::size_of::<PositionNormal>() as u32;

/// Stride of the [`BufferIndex::MeshGenerics`] stream.
pub const MESH_GENERICS_STRIDE: u32 = std::mem::size_of::<Texcoord>() as u32;

/// Attributes read from the [`BufferIndex::MeshPositions`] stream.
pub const MESH_POSITIONS_ATTRIBUTES: [VertexAttributeDescriptor; 2] = [
    VertexAttributeDescriptor::new(VertexAttribute::Position, VertexFormat::Float32x3, 0),
    VertexAttributeDescriptor::new(VertexAttribute::Normal, VertexFormat::Float32x3, 12),
];

/// Attributes read from the [`BufferIndex::MeshGenerics`] stream.
pub const MESH_GENERICS_ATTRIBUTES: [VertexAttributeDescriptor; 1] = [
    VertexAttributeDescriptor::new(VertexAttribute::Texcoord, VertexFormat::Float32x2, 0),
];

/// Complete vertex input description for a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VertexDescriptor {
    buffers: Vec<VertexBufferDescriptor>,
}

impl VertexDescriptor {
    /// Create an empty descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// The descriptor every mesh in the shadow pipeline uses.
    pub fn standard() -> Self {
        let stream = |slot, stride, attributes: &[VertexAttributeDescriptor]| {
            VertexBufferDescriptor {
                attributes: attributes.to_vec(),
                ..VertexBufferDescriptor::new(slot, stride)
            }
        };
        Self::new()
            .with_buffer(stream(
                BufferIndex::MeshPositions,
                MESH_POSITIONS_STRIDE,
                &MESH_POSITIONS_ATTRIBUTES,
            ))
            .with_buffer(stream(
                BufferIndex::MeshGenerics,
                MESH_GENERICS_STRIDE,
                &MESH_GENERICS_ATTRIBUTES,
            ))
    }

    /// Add a vertex buffer.
    pub fn with_buffer(mut self, buffer: VertexBufferDescriptor) -> Self {
        self.buffers.push(buffer);
        self
    }

    /// All buffers in declaration order.
    pub fn buffers(&self) -> &[VertexBufferDescriptor] {
        &self.buffers
    }

    /// Look up the buffer bound at `slot`.
    pub fn buffer(&self, slot: BufferIndex) -> Option<&VertexBufferDescriptor> {
        self.buffers.iter().find(|b| b.slot == slot)
    }

    /// Look up an attribute and the buffer it is read from.
    pub fn attribute(
        &self,
        attribute: VertexAttribute,
    ) -> Option<(&VertexBufferDescriptor, &VertexAttributeDescriptor)> {
        self.buffers.iter().find_map(|buffer| {
            buffer
                .attributes
                .iter()
                .find(|a| a.attribute == attribute)
                .map(|a| (buffer, a))
        })
    }

    /// Check the descriptor against the layout rules.
    pub fn validate(&self) -> Result<()> {
        let mut seen_slots = Vec::with_capacity(self.buffers.len());
        let mut seen_attributes = Vec::new();

        for buffer in &self.buffers {
            if !buffer.slot.is_vertex_buffer() {
                return Err(invalid(format!(
                    "slot {} is not a vertex buffer slot",
                    buffer.slot
                )));
            }
            if seen_slots.contains(&buffer.slot) {
                return Err(invalid(format!("slot {} declared twice", buffer.slot)));
            }
            seen_slots.push(buffer.slot);

            if buffer.stride == 0 {
                return Err(invalid(format!("slot {} has zero stride", buffer.slot)));
            }

            for (i, attr) in buffer.attributes.iter().enumerate() {
                if seen_attributes.contains(&attr.attribute) {
                    return Err(invalid(format!(
                        "attribute {} declared twice",
                        attr.attribute
                    )));
                }
                seen_attributes.push(attr.attribute);

                if attr.end() > u64::from(buffer.stride) {
                    return Err(invalid(format!(
                        "attribute {} ends at byte {} past stride {} of slot {}",
                        attr.attribute,
                        attr.end(),
                        buffer.stride,
                        buffer.slot
                    )));
                }

                for other in &buffer.attributes[..i] {
                    let overlaps = u64::from(attr.offset) < other.end()
                        && u64::from(other.offset) < attr.end();
                    if overlaps {
                        return Err(invalid(format!(
                            "attributes {} and {} overlap in slot {}",
                            other.attribute, attr.attribute, buffer.slot
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

fn invalid(msg: String) -> ShaderTypesError {
    ShaderTypesError::InvalidVertexLayout(msg)
}

/// Element of the [`BufferIndex::MeshPositions`] stream.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PositionNormal {
    pub position: Vec3,
    pub normal: Vec3,
}

/// Element of the [`BufferIndex::MeshGenerics`] stream.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Texcoord {
    pub texcoord: Vec2,
}

const_assert_eq!(std::mem::size_of::<PositionNormal>(), 24);
const_assert_eq!(std::mem::size_of::<Texcoord>(), 8);

impl PositionNormal {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self { position, normal }
    }
}

impl Texcoord {
    pub fn new(u: f32, v: f32) -> Self {
        Self {
            texcoord: Vec2::new(u, v),
        }
    }
}
