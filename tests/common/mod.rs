//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use shader_types::shader::parse_and_validate;
use shader_types::shader::reflect::UNIFORMS_STRUCT_NAME;

/// Minimal shadow-mapping shader written against `shader_types.wgsl`.
///
/// Two vertex entry points mirror the two passes: the depth-only pass reads
/// positions alone, the main pass reads every attribute.
pub const SHADOW_SHADER: &str = r#"
#include "shader_types.wgsl"

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) texcoord: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) texcoord: vec2<f32>,
    @location(1) shadow_position: vec4<f32>,
    @location(2) shade: f32,
}

@group(0) @binding(2) var<uniform> uniforms: Uniforms;

@group(1) @binding(0) var color_map: texture_2d<f32>;
@group(1) @binding(1) var shadow_map: texture_depth_2d;
@group(1) @binding(2) var color_sampler: sampler;
@group(1) @binding(3) var shadow_sampler: sampler_comparison;

@vertex
fn vertex_main(input: VertexInput) -> VertexOutput {
    var output: VertexOutput;
    let position = vec4<f32>(input.position, 1.0);
    output.clip_position = uniforms.projection_matrix * uniforms.model_view_matrix * position;
    output.shadow_position = uniforms.projection_matrix * uniforms.shadow_view_matrix * position;
    output.texcoord = input.texcoord;
    let normal = normalize((uniforms.model_view_matrix * vec4<f32>(input.normal, 0.0)).xyz);
    output.shade = max(normal.z, 0.0);
    return output;
}

@vertex
fn vertex_depth_only(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return uniforms.projection_matrix * uniforms.shadow_view_matrix * vec4<f32>(position, 1.0);
}

@fragment
fn fragment_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(color_map, color_sampler, input.texcoord);
    let ndc = input.shadow_position.xyz / input.shadow_position.w;
    let uv = ndc.xy * vec2<f32>(0.5, -0.5) + vec2<f32>(0.5, 0.5);
    let lit = textureSampleCompare(shadow_map, shadow_sampler, uv, ndc.z);
    return vec4<f32>(color.rgb * (0.3 + 0.7 * lit * input.shade), color.a);
}
"#;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Member names and offsets of `struct Uniforms` as naga lays it out, plus
/// the struct's total span.
pub fn shader_uniform_layout(source: &str) -> (Vec<(String, u32)>, u32) {
    let module = parse_and_validate(source).expect("shader parses");
    let (_, ty) = module
        .types
        .iter()
        .find(|(_, ty)| ty.name.as_deref() == Some(UNIFORMS_STRUCT_NAME))
        .expect("shader declares struct Uniforms");

    match ty.inner {
        naga::TypeInner::Struct { ref members, span } => (
            members
                .iter()
                .map(|m| (m.name.clone().unwrap_or_default(), m.offset))
                .collect(),
            span,
        ),
        ref other => panic!("Uniforms is not a struct: {other:?}"),
    }
}

/// Read a column-major `mat4x4<f32>` the way the shader sees it.
pub fn read_shader_matrix(bytes: &[u8], offset: usize) -> [[f32; 4]; 4] {
    let mut columns = [[0.0f32; 4]; 4];
    for (c, column) in columns.iter_mut().enumerate() {
        for (r, value) in column.iter_mut().enumerate() {
            let start = offset + (c * 4 + r) * 4;
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&bytes[start..start + 4]);
            *value = f32::from_ne_bytes(raw);
        }
    }
    columns
}
