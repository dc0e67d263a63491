//! Host-side staging for per-draw uniform blocks.
//!
//! The GPU may still be reading frame N while the CPU fills frame N+1, so
//! uniform data is kept in `frames_in_flight` separate regions and the frame
//! cursor rotates through them. Inside a frame every draw owns one slot of
//! `alignment` bytes; the slot's byte offset is the dynamic offset passed when
//! binding [`BufferIndex::Uniforms`](crate::BufferIndex::Uniforms).
//!
//! # Example
//!
//! ```ignore
//! let mut ring = UniformRing::new(UniformRingConfig::default())?;
//!
//! let frame = ring.begin_frame();
//! for (slot, object) in objects.iter().enumerate() {
//!     let alloc = ring.write(slot, &object.uniforms)?;
//!     // upload ring.frame_bytes(frame), bind with dynamic offset alloc.offset
//! }
//! ```

use crate::error::{Result, ShaderTypesError};
use crate::types::{UNIFORMS_ALIGNMENT, UNIFORMS_SIZE, Uniforms, align_up};

/// Configuration for a [`UniformRing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformRingConfig {
    /// Number of frames the CPU may run ahead of the GPU.
    pub frames_in_flight: usize,
    /// Uniform blocks written per frame (one per draw).
    pub slots_per_frame: usize,
    /// Byte alignment of each slot; a power of two no smaller than the block.
    pub alignment: usize,
}

impl Default for UniformRingConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: 3,
            // 30 objects plus the floor.
            slots_per_frame: 31,
            alignment: UNIFORMS_ALIGNMENT,
        }
    }
}

impl UniformRingConfig {
    /// Byte distance between consecutive slots.
    pub fn stride(&self) -> usize {
        align_up(UNIFORMS_SIZE, self.alignment)
    }

    /// Size in bytes of one frame region.
    pub fn frame_size(&self) -> usize {
        self.stride() * self.slots_per_frame
    }

    pub fn validate(&self) -> Result<()> {
        if !self.alignment.is_power_of_two() {
            return Err(ShaderTypesError::InvalidParameter(format!(
                "alignment must be a power of 2, got {}",
                self.alignment
            )));
        }
        if self.alignment < UNIFORMS_SIZE {
            return Err(ShaderTypesError::InvalidParameter(format!(
                "alignment must be at least {UNIFORMS_SIZE}, got {}",
                self.alignment
            )));
        }
        if self.frames_in_flight == 0 {
            return Err(ShaderTypesError::InvalidParameter(
                "frames_in_flight cannot be zero".to_string(),
            ));
        }
        if self.slots_per_frame == 0 {
            return Err(ShaderTypesError::InvalidParameter(
                "slots_per_frame cannot be zero".to_string(),
            ));
        }

        // Every region must be addressable, or new() would overflow.
        let total = UNIFORMS_SIZE
            .checked_add(self.alignment - 1)
            .map(|padded| padded & !(self.alignment - 1))
            .and_then(|stride| stride.checked_mul(self.slots_per_frame))
            .and_then(|frame| frame.checked_mul(self.frames_in_flight));
        if total.is_none() {
            return Err(ShaderTypesError::InvalidParameter(format!(
                "{} frame(s) x {} slot(s) at alignment {} overflow the address space",
                self.frames_in_flight, self.slots_per_frame, self.alignment
            )));
        }
        Ok(())
    }
}

/// A uniform block written into the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformAllocation {
    /// Frame region the block was written to.
    pub frame: usize,
    /// Byte offset inside the frame region; use as the dynamic offset.
    pub offset: u64,
    /// Size of the block in bytes.
    pub size: u64,
}

/// Triple-buffered (by default) staging area for [`Uniforms`].
///
/// NOT thread-safe for writes; the per-frame loop owns it.
#[derive(Debug, Clone)]
pub struct UniformRing {
    config: UniformRingConfig,
    frames: Vec<Vec<u8>>,
    current_frame: usize,
    frame_counter: u64,
}

static_assertions::assert_impl_all!(UniformRing: Send, Sync);

impl UniformRing {
    pub fn new(config: UniformRingConfig) -> Result<Self> {
        config.validate()?;

        let frames = vec![vec![0u8; config.frame_size()]; config.frames_in_flight];
        // The first begin_frame() lands on region 0.
        let current_frame = config.frames_in_flight - 1;
        log::debug!(
            "uniform ring: {} frame(s) x {} slot(s), stride {} bytes",
            config.frames_in_flight,
            config.slots_per_frame,
            config.stride()
        );

        Ok(Self {
            config,
            frames,
            current_frame,
            frame_counter: 0,
        })
    }

    pub fn config(&self) -> &UniformRingConfig {
        &self.config
    }

    /// Frame region that writes currently go to.
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Number of frames started so far.
    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    /// Advance to the next frame region and return its index.
    pub fn begin_frame(&mut self) -> usize {
        self.current_frame = (self.current_frame + 1) % self.config.frames_in_flight;
        self.frame_counter += 1;
        self.current_frame
    }

    /// Byte offset of `slot` inside a frame region.
    pub fn slot_offset(&self, slot: usize) -> Result<u64> {
        self.check_slot(slot)?;
        Ok((slot * self.config.stride()) as u64)
    }

    /// Write `uniforms` into `slot` of the current frame.
    pub fn write(&mut self, slot: usize, uniforms: &Uniforms) -> Result<UniformAllocation> {
        let offset = self.slot_offset(slot)? as usize;
        let frame = self.current_frame;

        self.frames[frame][offset..offset + UNIFORMS_SIZE].copy_from_slice(uniforms.as_bytes());
        log::trace!("uniform ring: frame {frame} slot {slot} at offset {offset}");

        Ok(UniformAllocation {
            frame,
            offset: offset as u64,
            size: UNIFORMS_SIZE as u64,
        })
    }

    /// Read back the block stored in `slot` of `frame`.
    pub fn read(&self, frame: usize, slot: usize) -> Result<Uniforms> {
        let offset = self.slot_offset(slot)? as usize;
        let bytes = self.frame_bytes(frame)?;
        Uniforms::from_gpu_bytes(&bytes[offset..])
    }

    /// Whole region of `frame`, ready to upload.
    pub fn frame_bytes(&self, frame: usize) -> Result<&[u8]> {
        self.frames
            .get(frame)
            .map(Vec::as_slice)
            .ok_or(ShaderTypesError::SlotOutOfRange {
                what: "frame",
                index: frame,
                count: self.config.frames_in_flight,
            })
    }

    fn check_slot(&self, slot: usize) -> Result<()> {
        if slot >= self.config.slots_per_frame {
            return Err(ShaderTypesError::SlotOutOfRange {
                what: "slot",
                index: slot,
                count: self.config.slots_per_frame,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};

    use super::*;

    fn uniforms_at(x: f32) -> Uniforms {
        Uniforms::new(
            Mat4::IDENTITY,
            Mat4::from_translation(Vec3::new(x, 0.0, 0.0)),
            Mat4::from_translation(Vec3::new(0.0, x, 0.0)),
        )
    }

    #[test]
    fn test_default_config() {
        let config = UniformRingConfig::default();
        assert_eq!(config.frames_in_flight, 3);
        assert_eq!(config.stride(), 256);
        assert_eq!(config.frame_size(), 256 * 31);
        config.validate().unwrap();
    }

    #[test]
    fn test_invalid_config() {
        let bad_alignment = UniformRingConfig {
            alignment: 100,
            ..Default::default()
        };
        assert!(matches!(
            UniformRing::new(bad_alignment),
            Err(ShaderTypesError::InvalidParameter(_))
        ));

        let no_frames = UniformRingConfig {
            frames_in_flight: 0,
            ..Default::default()
        };
        assert!(UniformRing::new(no_frames).is_err());

        let no_slots = UniformRingConfig {
            slots_per_frame: 0,
            ..Default::default()
        };
        assert!(UniformRing::new(no_slots).is_err());
    }

    #[test]
    fn test_alignment_below_block_size_rejected() {
        let config = UniformRingConfig {
            alignment: 64,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ShaderTypesError::InvalidParameter(_))
        ));
        assert!(UniformRing::new(config).is_err());
    }

    #[test]
    fn test_oversized_region_rejected() {
        let huge_alignment = UniformRingConfig {
            alignment: 1 << (usize::BITS - 2),
            ..Default::default()
        };
        assert!(matches!(
            UniformRing::new(huge_alignment),
            Err(ShaderTypesError::InvalidParameter(_))
        ));

        let huge_slots = UniformRingConfig {
            slots_per_frame: usize::MAX / 2,
            ..Default::default()
        };
        assert!(matches!(
            huge_slots.validate(),
            Err(ShaderTypesError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_frames_rotate() {
        let mut ring = UniformRing::new(UniformRingConfig::default()).unwrap();
        assert_eq!(ring.begin_frame(), 0);
        assert_eq!(ring.begin_frame(), 1);
        assert_eq!(ring.begin_frame(), 2);
        assert_eq!(ring.begin_frame(), 0);
        assert_eq!(ring.frame_counter(), 4);
    }

    #[test]
    fn test_write_offsets_are_aligned() {
        let mut ring = UniformRing::new(UniformRingConfig::default()).unwrap();
        ring.begin_frame();

        for slot in 0..ring.config().slots_per_frame {
            let alloc = ring.write(slot, &uniforms_at(slot as f32)).unwrap();
            assert_eq!(alloc.offset % UNIFORMS_ALIGNMENT as u64, 0);
            assert_eq!(alloc.offset, slot as u64 * 256);
            assert_eq!(alloc.size, 192);
            assert_eq!(alloc.frame, 0);
        }
    }

    #[test]
    fn test_write_read_roundtrip() {
        let mut ring = UniformRing::new(UniformRingConfig::default()).unwrap();
        let frame = ring.begin_frame();
        ring.write(4, &uniforms_at(4.0)).unwrap();
        ring.write(30, &uniforms_at(30.0)).unwrap();

        assert_eq!(ring.read(frame, 4).unwrap(), uniforms_at(4.0));
        assert_eq!(ring.read(frame, 30).unwrap(), uniforms_at(30.0));
    }

    #[test]
    fn test_frames_do_not_alias() {
        let mut ring = UniformRing::new(UniformRingConfig::default()).unwrap();
        let first = ring.begin_frame();
        ring.write(0, &uniforms_at(1.0)).unwrap();
        let second = ring.begin_frame();
        ring.write(0, &uniforms_at(2.0)).unwrap();

        assert_eq!(ring.read(first, 0).unwrap(), uniforms_at(1.0));
        assert_eq!(ring.read(second, 0).unwrap(), uniforms_at(2.0));
    }

    #[test]
    fn test_out_of_range() {
        let mut ring = UniformRing::new(UniformRingConfig::default()).unwrap();
        ring.begin_frame();
        assert!(matches!(
            ring.write(31, &Uniforms::default()),
            Err(ShaderTypesError::SlotOutOfRange {
                what: "slot",
                index: 31,
                count: 31
            })
        ));
        assert!(matches!(
            ring.frame_bytes(3),
            Err(ShaderTypesError::SlotOutOfRange { what: "frame", .. })
        ));
    }
}
