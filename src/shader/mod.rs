//! The shader half of the shared layout.
//!
//! WGSL has no preprocessor, so the contract lives in one WGSL file,
//! [`SHADER_TYPES_WGSL`], and shader sources pull it in with an include line:
//!
//! ```wgsl
//! #include "shader_types.wgsl"
//!
//! @group(0) @binding(2) var<uniform> uniforms: Uniforms;
//! ```
//!
//! [`ShaderComposer`] expands those lines before the source reaches naga or
//! wgpu. [`reflect`] then checks the composed module against the host types.
//!
//! # Example
//!
//! ```ignore
//! use shader_types::shader::{ShaderComposer, reflect};
//!
//! let composer = ShaderComposer::with_shader_types();
//! let module = composer.compose_to_naga(include_str!("shadow.wgsl"))?;
//! reflect::verify_module(&module, &BindingScheme::default())?;
//! ```

pub mod reflect;

use std::collections::{HashMap, HashSet};

use crate::error::{Result, ShaderTypesError};

pub use reflect::{BindingScheme, ContractReport, ContractViolation};

/// Include path under which [`SHADER_TYPES_WGSL`] is registered.
pub const SHADER_TYPES_PATH: &str = "shader_types.wgsl";

/// WGSL declaration of the slot numbers and the `Uniforms` struct.
pub const SHADER_TYPES_WGSL: &str = include_str!("../../shaders/shader_types.wgsl");

/// Resolves `#include` lines in WGSL sources.
///
/// Each path is expanded at most once per composition; later includes of
/// the same path are dropped, which keeps the shared struct from being
/// declared twice.
pub struct ShaderComposer {
    /// Registered include sources: path -> source text.
    includes: HashMap<String, String>,
}

impl Default for ShaderComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderComposer {
    /// Create a new empty shader composer.
    pub fn new() -> Self {
        Self {
            includes: HashMap::new(),
        }
    }

    /// Create a composer with `shader_types.wgsl` registered.
    pub fn with_shader_types() -> Self {
        let mut composer = Self::new();
        composer.register_include(SHADER_TYPES_PATH, SHADER_TYPES_WGSL);
        composer
    }

    /// Register a single include source.
    ///
    /// The path is what appears in `#include "path"` directives.
    pub fn register_include(&mut self, path: &str, source: &str) {
        self.includes.insert(path.to_string(), source.to_string());
    }

    /// Whether `path` can be included.
    pub fn has_include(&self, path: &str) -> bool {
        self.includes.contains_key(path)
    }

    /// Expand every `#include` directive in `source`.
    ///
    /// A line starting with `#include` that names no path is rejected here
    /// rather than left for naga to trip over.
    pub fn compose(&self, source: &str) -> Result<String> {
        let mut expanded = HashSet::new();
        let mut composed = String::with_capacity(source.len() + SHADER_TYPES_WGSL.len());
        self.append_expanded(source, &mut expanded, &mut composed)?;
        log::debug!(
            "composed shader: {} include(s), {} bytes",
            expanded.len(),
            composed.len()
        );
        Ok(composed)
    }

    /// Compose, parse and validate `source`.
    pub fn compose_to_naga(&self, source: &str) -> Result<naga::Module> {
        let composed = self.compose(source)?;
        parse_and_validate(&composed)
    }

    fn append_expanded<'s>(
        &'s self,
        source: &'s str,
        expanded: &mut HashSet<&'s str>,
        out: &mut String,
    ) -> Result<()> {
        for line in source.lines() {
            let directive = line.trim_start();
            if !directive.starts_with(INCLUDE_KEYWORD) {
                out.push_str(line);
                out.push('\n');
                continue;
            }

            let path = include_path(directive.trim_end()).ok_or_else(|| {
                ShaderTypesError::ShaderParse(format!("malformed include directive: {line}"))
            })?;
            let (path, included) = self
                .includes
                .get_key_value(path)
                .ok_or_else(|| ShaderTypesError::IncludeNotFound(path.to_string()))?;

            // Second and later includes of a path expand to nothing.
            if expanded.insert(path.as_str()) {
                log::trace!("expanding include \"{path}\"");
                self.append_expanded(included, expanded, out)?;
            }
        }
        Ok(())
    }
}

const INCLUDE_KEYWORD: &str = "#include";

/// Path named by `#include "path"` or `#include <path>`.
fn include_path(directive: &str) -> Option<&str> {
    let quoted = directive.strip_prefix(INCLUDE_KEYWORD)?.trim();
    let (open, close) = match quoted.chars().next()? {
        '"' => ('"', '"'),
        '<' => ('<', '>'),
        _ => return None,
    };
    quoted
        .strip_prefix(open)?
        .strip_suffix(close)
        .filter(|path| !path.is_empty())
}

/// Parse WGSL with naga and run the validator over it.
pub fn parse_and_validate(source: &str) -> Result<naga::Module> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| ShaderTypesError::ShaderParse(e.emit_to_string(source)))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| ShaderTypesError::ShaderValidation(e.to_string()))?;

    Ok(module)
}
