//! Error types for the Stellar3D engine
//!
//! This module defines the error types used throughout the engine:
//! GPU resource creation, shader compilation/linking, framebuffer setup
//! and resource validation.

use std::fmt;

/// Result type for Stellar3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stellar3D engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error reported by the graphics provider
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (unknown key, malformed bone data, destroyed node, etc.)
    InvalidResource(String),

    /// Initialization failed (renderer, framebuffers, subsystems)
    InitializationFailed(String),

    /// A shader stage failed to compile (carries the compiler log)
    ShaderCompilationFailed(String),

    /// A shader program failed to link (carries the linker log)
    ShaderLinkFailed(String),

    /// A framebuffer was not complete after attaching its targets
    FramebufferIncomplete(String),

    /// Shader variables expected by the caller are not declared by the program
    MissingShaderVariables(Vec<String>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::ShaderCompilationFailed(log) => write!(f, "Shader compilation failed: {}", log),
            Error::ShaderLinkFailed(log) => write!(f, "Shader link failed: {}", log),
            Error::FramebufferIncomplete(msg) => write!(f, "Framebuffer incomplete: {}", msg),
            Error::MissingShaderVariables(names) => {
                write!(f, "Missing shader variables: {}", names.join(", "))
            }
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
