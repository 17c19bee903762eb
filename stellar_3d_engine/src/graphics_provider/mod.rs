/// Graphics provider module - the GPU capability interface consumed by the core

pub mod graphics_provider;
pub mod debug;

pub use graphics_provider::*;
pub use debug::drain_errors;

// Recording graphics provider for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_provider;
