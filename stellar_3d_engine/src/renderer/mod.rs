/// Renderer module - binding protocol, lights and the two pipelines

// Module declarations
pub mod renderer;
pub mod light;
pub mod binding;
pub mod forward_renderer;
pub mod deferred_renderer;
pub mod frame_loop;

// Re-export everything from renderer.rs
pub use renderer::*;

// Re-export from other modules
pub use light::*;
pub use binding::{bind_and_draw, draw_with_core_shaders, RenderBinder};
pub use forward_renderer::ForwardRenderer;
pub use deferred_renderer::{DeferredRenderer, GBuffer};
pub use frame_loop::{run_frame_loop, FrameDriver};
