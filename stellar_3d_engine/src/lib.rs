/*!
# Stellar 3D Engine

Core of the Stellar 3D real-time rendering engine.

The engine never talks to a graphics API directly: every GPU operation goes
through the [`GraphicsProvider`](graphics_provider::GraphicsProvider)
capability trait, passed explicitly to each call. Backends (GL, Vulkan shims)
live outside this crate.

## Architecture

- **RenderableGraph**: arena transform graph; nodes share GPU resource bundles (cores)
- **Skeleton**: bone hierarchy and pose evaluation for GPU skinning
- **RenderShader**: linked program with cached uniform/attribute locations
- **bind_and_draw**: generic binding protocol coupling any mesh to any shader
- **Renderer**: contract implemented by `ForwardRenderer` and `DeferredRenderer`
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod graphics_provider;
pub mod shader;
pub mod animation;
pub mod scene;
pub mod renderer;

// Main stellar3d namespace module
pub mod stellar3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine-wide services (logger registry)
    pub use crate::engine::Engine;

    // Renderer contract
    pub use crate::renderer::Renderer;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are NOT re-exported here - they are internal only
    }

    // GPU capability interface
    pub mod gfx {
        pub use crate::graphics_provider::*;
    }

    // Shader sub-module
    pub mod shader {
        pub use crate::shader::*;
    }

    // Animation sub-module
    pub mod animation {
        pub use crate::animation::*;
    }

    // Render sub-module with pipelines, lights and the binding protocol
    pub mod render {
        pub use crate::renderer::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }
}

// Re-export math library at crate root
pub use glam;
