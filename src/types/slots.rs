//! Binding slot enumerations shared with the shaders.
//!
//! Every value here is part of the host/shader contract. The WGSL side
//! declares the same numbers as `const` values in `shader_types.wgsl`; renumber
//! both sides together or not at all.

use std::fmt;

use crate::error::ShaderTypesError;

macro_rules! slot_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $value:literal => $label:literal,
            )+
        }
    ) => {
        $(#[$meta])*
        #[repr(u32)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant = $value,
            )+
        }

        impl $name {
            /// Every slot, in index order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Number of slots in this enumeration.
            pub const COUNT: usize = Self::ALL.len();

            /// The integer slot number.
            pub const fn index(self) -> u32 {
                self as u32
            }

            /// Human-readable slot name.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl TryFrom<u32> for $name {
            type Error = ShaderTypesError;

            fn try_from(value: u32) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    _ => Err(ShaderTypesError::UnknownSlot {
                        kind: stringify!($name),
                        value,
                    }),
                }
            }
        }

        impl From<$name> for u32 {
            fn from(slot: $name) -> u32 {
                slot.index()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} ({})", self.name(), self.index())
            }
        }
    };
}

slot_enum! {
    /// GPU buffer binding slots.
    ///
    /// `MeshPositions` and `MeshGenerics` are vertex buffer slots; `Uniforms`
    /// is the binding number of the per-draw uniform block.
    pub enum BufferIndex {
        /// Interleaved position + normal stream.
        MeshPositions = 0 => "mesh positions",
        /// Texture coordinate stream.
        MeshGenerics = 1 => "mesh generics",
        /// Per-draw [`Uniforms`](crate::Uniforms) block.
        Uniforms = 2 => "uniforms",
    }
}

impl BufferIndex {
    /// Whether this slot carries vertex data rather than uniforms.
    pub const fn is_vertex_buffer(self) -> bool {
        matches!(self, Self::MeshPositions | Self::MeshGenerics)
    }
}

slot_enum! {
    /// Vertex attribute locations (`@location(n)` in WGSL).
    pub enum VertexAttribute {
        Position = 0 => "position",
        Normal = 1 => "normal",
        Texcoord = 2 => "texcoord",
    }
}

slot_enum! {
    /// Texture bindings read by the fragment stage.
    pub enum TextureIndex {
        /// Base color map.
        Color = 0 => "color",
        /// Depth map rendered from the light.
        Shadow = 1 => "shadow",
    }
}

impl TextureIndex {
    /// Binding of the sampler paired with this texture.
    ///
    /// Samplers follow the textures in the same bind group, so the color
    /// sampler sits at 2 and the shadow comparison sampler at 3.
    pub const fn sampler_binding(self) -> u32 {
        self.index() + Self::COUNT as u32
    }
}
