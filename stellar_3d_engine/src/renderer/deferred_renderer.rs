/// DeferredRenderer - geometry pass into a G-buffer, then a lighting composite
///
/// Frame flow: `begin_render_frame` (resize check + geometry pass setup),
/// any number of `draw_renderable*` calls writing diffuse, view-space
/// position and view-space normal, then `end_render_frame`, which composites
/// one full-screen quad per light into the default framebuffer.
///
/// A resolution change tears down and recreates every attachment at the
/// start of the next frame.

use std::rc::Rc;
use glam::{Mat4, Vec4};
use winit::dpi::PhysicalSize;
use crate::error::{Error, Result};
use crate::graphics_provider::{
    drain_errors, Attachment, BlendMode, ClearFlags, FramebufferHandle, FramebufferStatus,
    GraphicsProvider, ProgramHandle, RenderbufferHandle, TextureDesc, TextureFormat, TextureHandle,
};
use crate::scene::{Renderable, RenderableGraph, RenderableKey};
use crate::shader::{names, RenderShader};
use crate::{engine_bail, engine_err, engine_error, engine_info};
use super::binding::{bind_and_draw, draw_with_core_shaders, RenderBinder};
use super::light::{Light, LightProvider, LightSlots, SingleLight};
use super::renderer::{DrawParams, Renderer, RendererConfig};

const SOURCE: &str = "stellar3d::DeferredRenderer";

// ============================================================================
// G-buffer
// ============================================================================

/// Offscreen targets written by the geometry pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GBuffer {
    pub framebuffer: FramebufferHandle,
    /// RGBA8 albedo
    pub diffuse: TextureHandle,
    /// RGB32F view-space position
    pub position: TextureHandle,
    /// RGB32F view-space normal
    pub normal: TextureHandle,
    pub depth: RenderbufferHandle,
    pub size: PhysicalSize<u32>,
}

impl GBuffer {
    /// Allocate and attach every target
    ///
    /// Whatever was created is released again on failure.
    ///
    /// # Errors
    ///
    /// `Error::FramebufferIncomplete` or the provider's allocation error.
    pub fn create(gfx: &mut dyn GraphicsProvider, size: PhysicalSize<u32>) -> Result<Self> {
        let mut gbuffer = Self {
            framebuffer: FramebufferHandle::NONE,
            diffuse: TextureHandle::NONE,
            position: TextureHandle::NONE,
            normal: TextureHandle::NONE,
            depth: RenderbufferHandle::NONE,
            size,
        };
        if let Err(e) = gbuffer.allocate(gfx) {
            gfx.bind_framebuffer(FramebufferHandle::NONE);
            gbuffer.destroy(gfx);
            return Err(e);
        }
        Ok(gbuffer)
    }

    fn allocate(&mut self, gfx: &mut dyn GraphicsProvider) -> Result<()> {
        let (width, height) = (self.size.width, self.size.height);
        let target = |format| TextureDesc { width, height, format, data: None };

        self.framebuffer = gfx.create_framebuffer()?;
        gfx.bind_framebuffer(self.framebuffer);

        self.diffuse = gfx.create_texture_2d(&target(TextureFormat::Rgba8))?;
        gfx.framebuffer_texture_2d(Attachment::Color(0), self.diffuse);
        self.position = gfx.create_texture_2d(&target(TextureFormat::Rgb32F))?;
        gfx.framebuffer_texture_2d(Attachment::Color(1), self.position);
        self.normal = gfx.create_texture_2d(&target(TextureFormat::Rgb32F))?;
        gfx.framebuffer_texture_2d(Attachment::Color(2), self.normal);

        self.depth = gfx.create_renderbuffer(TextureFormat::Depth24, width, height)?;
        gfx.framebuffer_renderbuffer(Attachment::Depth, self.depth);

        gfx.draw_buffers(3);
        let status = gfx.framebuffer_status();
        gfx.bind_framebuffer(FramebufferHandle::NONE);
        if status != FramebufferStatus::Complete {
            engine_bail!(SOURCE, FramebufferIncomplete => "G-buffer {}x{}: {:?}", width, height, status);
        }
        Ok(())
    }

    /// Delete every allocated target
    pub fn destroy(&mut self, gfx: &mut dyn GraphicsProvider) {
        for texture in [&mut self.diffuse, &mut self.position, &mut self.normal] {
            if !texture.is_none() {
                gfx.delete_texture(*texture);
                *texture = TextureHandle::NONE;
            }
        }
        if !self.depth.is_none() {
            gfx.delete_renderbuffer(self.depth);
            self.depth = RenderbufferHandle::NONE;
        }
        if !self.framebuffer.is_none() {
            gfx.delete_framebuffer(self.framebuffer);
            self.framebuffer = FramebufferHandle::NONE;
        }
    }
}

/// Binds the G-buffer textures for the composite shader
struct GBufferBinder<'a> {
    gbuffer: &'a GBuffer,
}

impl RenderBinder for GBufferBinder<'_> {
    fn bind(
        &mut self,
        gfx: &mut dyn GraphicsProvider,
        shader: &RenderShader,
        _node: &Renderable,
        next_texture_unit: &mut u32,
    ) {
        let targets = [
            (names::G_DIFFUSE_TEX, self.gbuffer.diffuse),
            (names::G_POSITION_TEX, self.gbuffer.position),
            (names::G_NORMAL_TEX, self.gbuffer.normal),
        ];
        for (name, texture) in targets {
            let location = shader.uniform_location(gfx, name);
            if location < 0 {
                continue;
            }
            gfx.active_texture(*next_texture_unit);
            gfx.bind_texture_2d(texture);
            gfx.set_uniform_i32(location, *next_texture_unit as i32);
            *next_texture_unit += 1;
        }
    }
}

// ============================================================================
// Renderer
// ============================================================================

/// Deferred lighting pipeline
#[derive(Debug)]
pub struct DeferredRenderer {
    config: RendererConfig,
    size: PhysicalSize<u32>,
    gbuffer: Option<GBuffer>,
    /// Owns the full-screen quad used by the composite pass
    quad_graph: RenderableGraph,
    quad: Option<RenderableKey>,
    composite_shader: Option<Rc<RenderShader>>,
    lights: LightSlots,
    /// View of the last geometry draw, reused for the composite
    view: Mat4,
    in_geometry_pass: bool,
}

impl DeferredRenderer {
    pub fn new(config: RendererConfig) -> Self {
        Self {
            size: config.resolution(),
            config,
            gbuffer: None,
            quad_graph: RenderableGraph::new(),
            quad: None,
            composite_shader: None,
            lights: LightSlots::new(),
            view: Mat4::IDENTITY,
            in_geometry_pass: false,
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.gbuffer.is_some()
    }

    pub fn gbuffer(&self) -> Option<&GBuffer> {
        self.gbuffer.as_ref()
    }

    /// Shader `end_render_frame` composites with
    pub fn set_composite_shader(&mut self, shader: Option<Rc<RenderShader>>) {
        self.composite_shader = shader;
    }

    /// Lights consumed by the composite pass (never by the geometry pass)
    pub fn set_light(&mut self, index: usize, light: Option<Light>) -> bool {
        self.lights.set(index, light)
    }

    pub fn light(&self, index: usize) -> Option<&Light> {
        self.lights.get(index)
    }

    // ===== PASSES =====

    /// Recreate the G-buffer when `width`/`height` differ from the current size
    ///
    /// Returns whether the attachments were recreated.
    pub fn ensure_resolution(&mut self, gfx: &mut dyn GraphicsProvider, width: u32, height: u32) -> Result<bool> {
        let size = PhysicalSize::new(width, height);
        let current = self.gbuffer.as_ref().map(|gbuffer| gbuffer.size);
        if current == Some(size) {
            return Ok(false);
        }

        if let Some(mut old) = self.gbuffer.take() {
            old.destroy(gfx);
        }
        self.size = size;
        self.gbuffer = Some(GBuffer::create(gfx, size)?);
        engine_info!(SOURCE, "G-buffer recreated at {}x{}", width, height);
        Ok(true)
    }

    /// Bind the G-buffer and clear it for the geometry pass
    pub fn prepare_geometry_pass(&mut self, gfx: &mut dyn GraphicsProvider) -> Result<()> {
        let gbuffer = self.gbuffer.as_ref().ok_or_else(not_initialized)?;

        gfx.bind_framebuffer(gbuffer.framebuffer);
        gfx.set_viewport(0, 0, gbuffer.size.width, gbuffer.size.height);
        gfx.set_clear_color(Vec4::ZERO);
        gfx.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
        gfx.set_depth_test(true);
        gfx.set_blend(None);
        self.in_geometry_pass = true;
        Ok(())
    }

    /// Unbind the G-buffer
    pub fn end_geometry_pass(&mut self, gfx: &mut dyn GraphicsProvider) {
        if self.in_geometry_pass {
            gfx.bind_framebuffer(FramebufferHandle::NONE);
            self.in_geometry_pass = false;
        }
    }

    /// Light the G-buffer into the default framebuffer
    ///
    /// The quad is drawn once per light: the first with blending off, the
    /// others accumulated additively. Each draw exposes its light as light 0.
    /// With no light the quad is drawn once, unlit.
    ///
    /// # Arguments
    ///
    /// * `shader` - Composite program (expects clip-space `VERTEX_POSITION`)
    /// * `lights` - Lights to accumulate
    /// * `view` - Camera view matrix of the geometry pass
    pub fn composite_pass(
        &self,
        gfx: &mut dyn GraphicsProvider,
        shader: &RenderShader,
        lights: &dyn LightProvider,
        view: &Mat4,
    ) -> Result<()> {
        let gbuffer = self.gbuffer.as_ref().ok_or_else(not_initialized)?;
        let quad = self.quad.ok_or_else(not_initialized)?;

        gfx.bind_framebuffer(FramebufferHandle::NONE);
        gfx.set_viewport(0, 0, self.size.width, self.size.height);
        gfx.set_clear_color(self.config.clear_color);
        gfx.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
        gfx.set_depth_test(false);

        // Clip-space quad, lights still in the camera's eye space
        let params = DrawParams::new(Mat4::IDENTITY, Mat4::IDENTITY).with_light_view(*view);
        let mut binder = GBufferBinder { gbuffer };
        let count = lights.active_light_count();

        if count == 0 {
            gfx.set_blend(None);
            bind_and_draw(gfx, &self.quad_graph, quad, shader, Some(&mut binder), None, &params);
        }
        for index in 0..count {
            let light = match lights.light(index) {
                Some(light) => light,
                None => break,
            };
            gfx.set_blend(if index == 0 { None } else { Some(BlendMode::Additive) });
            let single = SingleLight(light);
            bind_and_draw(gfx, &self.quad_graph, quad, shader, Some(&mut binder), Some(&single), &params);
        }

        gfx.set_blend(None);
        gfx.set_depth_test(true);
        Ok(())
    }

    fn check_initialized(&self) -> Result<()> {
        if self.gbuffer.is_some() {
            Ok(())
        } else {
            Err(not_initialized())
        }
    }

    fn release(&mut self, gfx: &mut dyn GraphicsProvider) {
        if let Some(mut gbuffer) = self.gbuffer.take() {
            gbuffer.destroy(gfx);
        }
        if let Some(quad) = self.quad.take() {
            self.quad_graph.destroy(gfx, quad);
        }
        self.in_geometry_pass = false;
    }
}

fn not_initialized() -> Error {
    engine_err!(SOURCE, InitializationFailed => "Deferred renderer is not initialized")
}

impl Renderer for DeferredRenderer {
    fn init(&mut self, gfx: &mut dyn GraphicsProvider) -> Result<()> {
        self.release(gfx);

        let quad = self.quad_graph.create_plane_xy(gfx, -1.0, -1.0, 1.0, 1.0)?;
        self.quad = Some(quad);
        match GBuffer::create(gfx, self.size) {
            Ok(gbuffer) => self.gbuffer = Some(gbuffer),
            Err(e) => {
                engine_error!(SOURCE, "Deferred renderer initialization failed: {}", e);
                self.release(gfx);
                return Err(e);
            }
        }
        engine_info!(SOURCE, "Deferred renderer initialized ({}x{})", self.size.width, self.size.height);
        Ok(())
    }

    fn destroy(&mut self, gfx: &mut dyn GraphicsProvider) {
        self.release(gfx);
    }

    fn change_resolution(&mut self, _gfx: &mut dyn GraphicsProvider, size: PhysicalSize<u32>) -> Result<()> {
        // Attachments follow on the next begin_render_frame
        self.size = size;
        Ok(())
    }

    fn resolution(&self) -> PhysicalSize<u32> {
        self.size
    }

    fn begin_render_frame(&mut self, gfx: &mut dyn GraphicsProvider) -> Result<()> {
        self.check_initialized()?;
        self.ensure_resolution(gfx, self.size.width, self.size.height)?;
        self.prepare_geometry_pass(gfx)
    }

    fn draw_renderable(
        &mut self,
        gfx: &mut dyn GraphicsProvider,
        graph: &RenderableGraph,
        key: RenderableKey,
        params: &DrawParams,
    ) -> Result<()> {
        self.check_initialized()?;
        self.view = params.view;
        draw_with_core_shaders(gfx, graph, key, None, params);
        Ok(())
    }

    fn draw_renderable_with_shader(
        &mut self,
        gfx: &mut dyn GraphicsProvider,
        graph: &RenderableGraph,
        key: RenderableKey,
        shader: &RenderShader,
        binder: Option<&mut dyn RenderBinder>,
        params: &DrawParams,
    ) -> Result<()> {
        self.check_initialized()?;
        self.view = params.view;
        bind_and_draw(gfx, graph, key, shader, binder, None, params);
        Ok(())
    }

    fn end_render_frame(&mut self, gfx: &mut dyn GraphicsProvider) -> Result<()> {
        self.check_initialized()?;
        self.end_geometry_pass(gfx);
        if let Some(shader) = self.composite_shader.clone() {
            self.composite_pass(gfx, &shader, &self.lights, &self.view)?;
        }
        gfx.use_program(ProgramHandle::NONE);
        if self.config.debug_errors {
            drain_errors(gfx, SOURCE);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "deferred_renderer_tests.rs"]
mod tests;
