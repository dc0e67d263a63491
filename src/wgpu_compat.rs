//! The shared layout as wgpu descriptor values.
//!
//! These are plain values for building pipelines and bind group layouts; no
//! device is touched here.

use crate::mesh::{
    MESH_GENERICS_ATTRIBUTES, MESH_GENERICS_STRIDE, MESH_POSITIONS_ATTRIBUTES,
    MESH_POSITIONS_STRIDE, VertexAttributeDescriptor, VertexBufferDescriptor, VertexFormat,
    VertexStepMode,
};
use crate::types::{BufferIndex, TextureIndex, UNIFORMS_SIZE};

static POSITION_NORMAL_ATTRIBUTES: [wgpu::VertexAttribute; 2] = [
    to_wgpu_attribute(MESH_POSITIONS_ATTRIBUTES[0]),
    to_wgpu_attribute(MESH_POSITIONS_ATTRIBUTES[1]),
];

static TEXCOORD_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    [to_wgpu_attribute(MESH_GENERICS_ATTRIBUTES[0])];

/// Vertex buffer layouts indexed by [`BufferIndex`]: element 0 goes to
/// `set_vertex_buffer(0, ..)` with the positions buffer, element 1 with the
/// texcoord buffer.
pub fn vertex_buffer_layouts() -> [wgpu::VertexBufferLayout<'static>; 2] {
    [
        wgpu::VertexBufferLayout {
            array_stride: MESH_POSITIONS_STRIDE as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &POSITION_NORMAL_ATTRIBUTES,
        },
        wgpu::VertexBufferLayout {
            array_stride: MESH_GENERICS_STRIDE as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &TEXCOORD_ATTRIBUTES,
        },
    ]
}

const fn to_wgpu_attribute(attr: VertexAttributeDescriptor) -> wgpu::VertexAttribute {
    wgpu::VertexAttribute {
        format: to_wgpu_format(attr.format),
        offset: attr.offset as u64,
        shader_location: attr.attribute.index(),
    }
}

const fn to_wgpu_format(format: VertexFormat) -> wgpu::VertexFormat {
    match format {
        VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        VertexFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
        VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
    }
}

/// Convert one buffer of a custom [`VertexDescriptor`](crate::mesh::VertexDescriptor).
///
/// The returned attributes must outlive the `wgpu::VertexBufferLayout` that
/// borrows them.
pub fn vertex_attributes(buffer: &VertexBufferDescriptor) -> Vec<wgpu::VertexAttribute> {
    buffer
        .attributes
        .iter()
        .map(|&a| to_wgpu_attribute(a))
        .collect()
}

impl From<VertexFormat> for wgpu::VertexFormat {
    fn from(format: VertexFormat) -> Self {
        to_wgpu_format(format)
    }
}

impl From<VertexStepMode> for wgpu::VertexStepMode {
    fn from(mode: VertexStepMode) -> Self {
        match mode {
            VertexStepMode::Vertex => wgpu::VertexStepMode::Vertex,
            VertexStepMode::Instance => wgpu::VertexStepMode::Instance,
        }
    }
}

/// Uniform-group entry for the per-draw block.
///
/// Uses a dynamic offset so one buffer holds every draw's block at
/// [`ALIGNED_UNIFORMS_SIZE`](crate::ALIGNED_UNIFORMS_SIZE) strides.
pub fn uniform_layout_entry(visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: BufferIndex::Uniforms.index(),
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: true,
            min_binding_size: wgpu::BufferSize::new(UNIFORMS_SIZE as u64),
        },
        count: None,
    }
}

/// Texture-group entries: both textures and their samplers.
///
/// Goes into the bind group at [`BindingScheme::texture_group`](crate::shader::BindingScheme).
pub fn texture_layout_entries() -> Vec<wgpu::BindGroupLayoutEntry> {
    TextureIndex::ALL
        .iter()
        .flat_map(|&slot| {
            let (sample_type, sampler) = match slot {
                TextureIndex::Color => (
                    wgpu::TextureSampleType::Float { filterable: true },
                    wgpu::SamplerBindingType::Filtering,
                ),
                TextureIndex::Shadow => (
                    wgpu::TextureSampleType::Depth,
                    wgpu::SamplerBindingType::Comparison,
                ),
            };
            [
                wgpu::BindGroupLayoutEntry {
                    binding: slot.index(),
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: slot.sampler_binding(),
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(sampler),
                    count: None,
                },
            ]
        })
        .collect()
}
