/// Renderer trait - the contract shared by the forward and deferred pipelines

use glam::{Mat4, Vec4};
use winit::dpi::PhysicalSize;
use crate::error::Result;
use crate::graphics_provider::{GraphicsProvider, PrimitiveMode};
use crate::scene::{RenderableGraph, RenderableKey};
use crate::shader::RenderShader;
use super::binding::RenderBinder;
use super::light::LightProvider;

// ============================================================================
// Configuration
// ============================================================================

/// Renderer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Initial framebuffer width in pixels
    pub width: u32,
    /// Initial framebuffer height in pixels
    pub height: u32,
    /// Color the frame is cleared to
    pub clear_color: Vec4,
    /// Drain and log GPU errors after every frame
    pub debug_errors: bool,
}

impl RendererConfig {
    pub fn resolution(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.width, self.height)
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            debug_errors: cfg!(debug_assertions),
        }
    }
}

/// Camera matrices and primitive mode for one draw submission
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawParams {
    pub projection: Mat4,
    pub view: Mat4,
    /// Brings light positions and directions into eye space
    pub light_view: Mat4,
    pub mode: PrimitiveMode,
}

impl DrawParams {
    /// Triangle draw with the given camera
    pub fn new(projection: Mat4, view: Mat4) -> Self {
        Self { projection, view, light_view: view, mode: PrimitiveMode::Triangles }
    }

    /// Upload lights in the eye space of `view` instead of the draw's own view
    ///
    /// Screen-space passes draw with identity matrices but still light
    /// against the scene camera.
    pub fn with_light_view(mut self, view: Mat4) -> Self {
        self.light_view = view;
        self
    }

    pub fn with_mode(mut self, mode: PrimitiveMode) -> Self {
        self.mode = mode;
        self
    }
}

// ============================================================================
// Renderer trait
// ============================================================================

/// Draw submission contract
///
/// Calling code only talks to this trait, so forward and deferred
/// pipelines are interchangeable.
pub trait Renderer {
    /// Create the pipeline's GPU objects
    ///
    /// # Errors
    ///
    /// `Error::FramebufferIncomplete` or provider errors. The renderer stays
    /// unusable after a failure.
    fn init(&mut self, gfx: &mut dyn GraphicsProvider) -> Result<()>;

    /// Release every GPU object the renderer created
    fn destroy(&mut self, gfx: &mut dyn GraphicsProvider);

    /// Apply a new framebuffer size
    fn change_resolution(&mut self, gfx: &mut dyn GraphicsProvider, size: PhysicalSize<u32>) -> Result<()>;

    fn resolution(&self) -> PhysicalSize<u32>;

    /// Bind targets and clear before any draw of the frame
    fn begin_render_frame(&mut self, gfx: &mut dyn GraphicsProvider) -> Result<()>;

    /// Draw a subtree, each node with its core's shader
    fn draw_renderable(
        &mut self,
        gfx: &mut dyn GraphicsProvider,
        graph: &RenderableGraph,
        key: RenderableKey,
        params: &DrawParams,
    ) -> Result<()>;

    /// Draw a subtree with one shader, an optional custom binder and `params.mode`
    fn draw_renderable_with_shader(
        &mut self,
        gfx: &mut dyn GraphicsProvider,
        graph: &RenderableGraph,
        key: RenderableKey,
        shader: &RenderShader,
        binder: Option<&mut dyn RenderBinder>,
        params: &DrawParams,
    ) -> Result<()>;

    /// Finish the frame (composite, unbind, debug checks)
    fn end_render_frame(&mut self, gfx: &mut dyn GraphicsProvider) -> Result<()>;

    /// Lights this renderer feeds to the binding protocol, if it supports any
    fn light_provider(&self) -> Option<&dyn LightProvider> {
        None
    }
}
