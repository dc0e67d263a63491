//! Error types for the shared layout helpers.

use thiserror::Error;

use crate::shader::reflect::ContractViolation;

/// Errors returned by the layout, staging and shader-checking helpers.
///
/// The slot enumerations and [`Uniforms`](crate::Uniforms) themselves never
/// fail; these errors come from converting raw values, staging uniform data
/// and checking shaders against the host layout.
#[derive(Debug, Error)]
pub enum ShaderTypesError {
    /// A raw integer does not name any slot of the given enumeration.
    #[error("unknown {kind} value {value}")]
    UnknownSlot { kind: &'static str, value: u32 },

    /// A byte block is too small to hold a `Uniforms` value.
    #[error("uniform data is {actual} bytes, expected at least {expected}")]
    UniformSize { expected: usize, actual: usize },

    /// A vertex descriptor breaks one of its layout rules.
    #[error("invalid vertex layout: {0}")]
    InvalidVertexLayout(String),

    /// An invalid parameter was provided.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A frame or slot index lies outside the staging area.
    #[error("{what} {index} out of range (count {count})")]
    SlotOutOfRange {
        what: &'static str,
        index: usize,
        count: usize,
    },

    /// An `#include` directive named a source that was never registered.
    #[error("include not found: \"{0}\"")]
    IncludeNotFound(String),

    /// The WGSL source (or one of its include directives) could not be parsed.
    #[error("shader parse error: {0}")]
    ShaderParse(String),

    /// naga rejected the parsed module.
    #[error("shader validation error: {0}")]
    ShaderValidation(String),

    /// The shader disagrees with the host layout.
    #[error("shader does not match host layout ({} violation(s)): {}", .0.len(), join_violations(.0))]
    ContractViolations(Vec<ContractViolation>),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ShaderTypesError>;

fn join_violations(violations: &[ContractViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
