//! Shader module
//!
//! Compiled programs with lazily cached variable locations, and the set of
//! well-known uniform/attribute names the binding protocol understands.

mod render_shader;
pub mod names;

pub use render_shader::{RenderShader, load_shader_program};
