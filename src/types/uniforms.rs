//! Per-draw uniform block.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use static_assertions::const_assert_eq;

use crate::error::{Result, ShaderTypesError};

/// Size in bytes of one [`Uniforms`] block.
pub const UNIFORMS_SIZE: usize = std::mem::size_of::<Uniforms>();

/// Dynamic uniform offsets must be multiples of this many bytes.
pub const UNIFORMS_ALIGNMENT: usize = 256;

/// [`UNIFORMS_SIZE`] rounded up to [`UNIFORMS_ALIGNMENT`]; the stride between
/// per-draw blocks in a shared uniform buffer.
pub const ALIGNED_UNIFORMS_SIZE: usize = align_up(UNIFORMS_SIZE, UNIFORMS_ALIGNMENT);

/// Transform state for one draw, uploaded as a raw memory block.
///
/// Matrices are column-major `mat4x4<f32>` on the shader side. Field order and
/// offsets (0, 64, 128) must match `struct Uniforms` in `shader_types.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Uniforms {
    pub projection_matrix: Mat4,
    pub model_view_matrix: Mat4,
    pub shadow_view_matrix: Mat4,
}

const_assert_eq!(std::mem::size_of::<Mat4>(), 64);
const_assert_eq!(std::mem::size_of::<Uniforms>(), 3 * 64);
const_assert_eq!(std::mem::offset_of!(Uniforms, projection_matrix), 0);
const_assert_eq!(std::mem::offset_of!(Uniforms, model_view_matrix), 64);
const_assert_eq!(std::mem::offset_of!(Uniforms, shadow_view_matrix), 128);
const_assert_eq!(ALIGNED_UNIFORMS_SIZE, 256);

impl Default for Uniforms {
    fn default() -> Self {
        Self {
            projection_matrix: Mat4::IDENTITY,
            model_view_matrix: Mat4::IDENTITY,
            shadow_view_matrix: Mat4::IDENTITY,
        }
    }
}

impl Uniforms {
    pub fn new(projection_matrix: Mat4, model_view_matrix: Mat4, shadow_view_matrix: Mat4) -> Self {
        Self {
            projection_matrix,
            model_view_matrix,
            shadow_view_matrix,
        }
    }

    /// Build the block for one object.
    ///
    /// `camera_view` and `light_view` are world-to-view transforms; both are
    /// combined with the same `model` transform so the shadow lookup sees the
    /// object where the camera does.
    pub fn for_model(projection: Mat4, camera_view: Mat4, light_view: Mat4, model: Mat4) -> Self {
        Self {
            projection_matrix: projection,
            model_view_matrix: camera_view * model,
            shadow_view_matrix: light_view * model,
        }
    }

    /// Raw bytes as uploaded to the GPU.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Decode a block read back from GPU memory.
    ///
    /// Accepts any slice holding at least [`UNIFORMS_SIZE`] bytes, so a whole
    /// aligned slot can be passed directly. No alignment is required.
    pub fn from_gpu_bytes(bytes: &[u8]) -> Result<Self> {
        let block = bytes
            .get(..UNIFORMS_SIZE)
            .ok_or(ShaderTypesError::UniformSize {
                expected: UNIFORMS_SIZE,
                actual: bytes.len(),
            })?;
        Ok(bytemuck::pod_read_unaligned(block))
    }
}

/// Round `value` up to the next multiple of `alignment` (a power of two).
pub const fn align_up(value: usize, alignment: usize) -> usize {
    (value + alignment - 1) & !(alignment - 1)
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn sample() -> Uniforms {
        Uniforms::new(
            Mat4::perspective_rh(1.2, 1.5, 0.1, 100.0),
            Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
            Mat4::from_scale(Vec3::splat(0.5)),
        )
    }

    #[test]
    fn test_uniforms_size() {
        assert_eq!(UNIFORMS_SIZE, 192);
        assert_eq!(ALIGNED_UNIFORMS_SIZE, 256);
        assert_eq!(sample().as_bytes().len(), UNIFORMS_SIZE);
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 256), 0);
        assert_eq!(align_up(1, 256), 256);
        assert_eq!(align_up(192, 256), 256);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(257, 256), 512);
    }

    #[test]
    fn test_bytes_are_column_major() {
        let uniforms = sample();
        let floats: &[f32] = bytemuck::cast_slice(uniforms.as_bytes());
        // Translation lives in the fourth column of model_view_matrix.
        assert_eq!(&floats[16 + 12..16 + 15], &[1.0, 2.0, 3.0]);
        assert_eq!(floats[16 + 15], 1.0);
    }

    #[test]
    fn test_gpu_bytes_roundtrip_from_aligned_slot() {
        let uniforms = sample();
        let mut slot = vec![0u8; ALIGNED_UNIFORMS_SIZE + 1];
        // Odd offset to exercise unaligned reads.
        slot[1..1 + UNIFORMS_SIZE].copy_from_slice(uniforms.as_bytes());
        let decoded = Uniforms::from_gpu_bytes(&slot[1..]).unwrap();
        assert_eq!(decoded, uniforms);
    }

    #[test]
    fn test_gpu_bytes_too_short() {
        let err = Uniforms::from_gpu_bytes(&[0u8; 100]).unwrap_err();
        assert!(matches!(
            err,
            ShaderTypesError::UniformSize {
                expected: 192,
                actual: 100
            }
        ));
    }

    #[test]
    fn test_for_model() {
        let projection = Mat4::perspective_rh(1.0, 1.0, 0.1, 10.0);
        let camera = Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0));
        let light = Mat4::from_translation(Vec3::new(0.0, -10.0, 0.0));
        let model = Mat4::from_translation(Vec3::X);

        let uniforms = Uniforms::for_model(projection, camera, light, model);
        assert_eq!(uniforms.projection_matrix, projection);
        assert_eq!(
            uniforms.model_view_matrix.transform_point3(Vec3::ZERO),
            Vec3::new(1.0, 0.0, -5.0)
        );
        assert_eq!(
            uniforms.shadow_view_matrix.transform_point3(Vec3::ZERO),
            Vec3::new(1.0, -10.0, 0.0)
        );
    }

    #[test]
    fn test_default_is_identity() {
        let uniforms = Uniforms::default();
        assert_eq!(uniforms.projection_matrix, Mat4::IDENTITY);
        assert_eq!(uniforms.shadow_view_matrix, Mat4::IDENTITY);
    }
}
