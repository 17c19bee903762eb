/// ForwardRenderer - single pass lighting with up to `MAX_LIGHTS` lights
///
/// No offscreen targets for the main pass: every node is shaded directly
/// into the default framebuffer, with the lights bound by `bind_and_draw`.
/// Optional per-light shadow maps are rendered in separate depth passes.

use glam::Mat4;
use winit::dpi::PhysicalSize;
use crate::error::Result;
use crate::graphics_provider::{
    drain_errors, Attachment, ClearFlags, FramebufferHandle, FramebufferStatus, GraphicsProvider,
    ProgramHandle, TextureDesc, TextureFormat,
};
use crate::scene::{RenderableGraph, RenderableKey};
use crate::shader::RenderShader;
use crate::{engine_bail, engine_debug, engine_err, engine_info};
use super::binding::{bind_and_draw, draw_with_core_shaders, RenderBinder};
use super::light::{Light, LightProvider, LightSlots, ShadowMap, ShadowMapConfig, MAX_LIGHTS};
use super::renderer::{DrawParams, Renderer, RendererConfig};

const SOURCE: &str = "stellar3d::ForwardRenderer";

/// Forward lighting pipeline
#[derive(Debug)]
pub struct ForwardRenderer {
    config: RendererConfig,
    size: PhysicalSize<u32>,
    lights: LightSlots,
    initialized: bool,
    /// Light index whose shadow pass is open
    shadow_pass: Option<usize>,
}

impl ForwardRenderer {
    pub fn new(config: RendererConfig) -> Self {
        Self {
            size: config.resolution(),
            config,
            lights: LightSlots::new(),
            initialized: false,
            shadow_pass: None,
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    // ===== LIGHTS =====

    /// Store or clear light slot `index`
    ///
    /// Lights are packed: the first empty slot ends the active range.
    /// A shadow map owned by the previous light is deleted unless the new
    /// light carries the same one. Returns `false` if `index` is out of range.
    pub fn set_light(&mut self, gfx: &mut dyn GraphicsProvider, index: usize, light: Option<Light>) -> bool {
        if index >= MAX_LIGHTS {
            return false;
        }
        let kept = light.as_ref().and_then(|light| light.shadow_map);
        let previous = self.lights.get(index).and_then(|old| old.shadow_map);
        if previous.is_some() && previous != kept {
            if self.shadow_pass == Some(index) {
                self.end_shadow_pass(gfx);
            }
            self.release_shadow_map(gfx, index);
        }
        self.lights.set(index, light)
    }

    pub fn light(&self, index: usize) -> Option<&Light> {
        self.lights.get(index)
    }

    pub fn light_mut(&mut self, index: usize) -> Option<&mut Light> {
        self.lights.get_mut(index)
    }

    pub fn active_light_count(&self) -> usize {
        self.lights.active_light_count()
    }

    pub fn active_lights(&self) -> impl Iterator<Item = &Light> {
        self.lights.active()
    }

    // ===== SHADOW MAPS =====

    /// Allocate a depth texture and framebuffer for light `index`
    ///
    /// An existing shadow map of that light is released first.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidResource` if the slot holds no light
    /// * `Error::FramebufferIncomplete` if the depth target is rejected
    pub fn create_shadow_map(
        &mut self,
        gfx: &mut dyn GraphicsProvider,
        index: usize,
        config: ShadowMapConfig,
    ) -> Result<()> {
        if self.lights.get(index).is_none() {
            engine_bail!(SOURCE, InvalidResource => "No light in slot {}", index);
        }
        self.release_shadow_map(gfx, index);

        let texture = gfx.create_texture_2d(&TextureDesc {
            width: config.size,
            height: config.size,
            format: TextureFormat::Depth32F,
            data: None,
        })?;
        let framebuffer = match gfx.create_framebuffer() {
            Ok(framebuffer) => framebuffer,
            Err(e) => {
                gfx.delete_texture(texture);
                return Err(e);
            }
        };

        gfx.bind_framebuffer(framebuffer);
        gfx.framebuffer_texture_2d(Attachment::Depth, texture);
        // Depth only
        gfx.draw_buffers(0);
        let status = gfx.framebuffer_status();
        gfx.bind_framebuffer(FramebufferHandle::NONE);

        if status != FramebufferStatus::Complete {
            gfx.delete_framebuffer(framebuffer);
            gfx.delete_texture(texture);
            engine_bail!(SOURCE, FramebufferIncomplete => "Shadow map of light {}: {:?}", index, status);
        }

        if let Some(light) = self.lights.get_mut(index) {
            light.shadow_map = Some(ShadowMap {
                texture,
                framebuffer,
                size: config.size,
                bias_matrix: config.bias_matrix,
                projection: Mat4::IDENTITY,
                view: Mat4::IDENTITY,
            });
        }
        engine_debug!(SOURCE, "Shadow map {}x{} created for light {}", config.size, config.size, index);
        Ok(())
    }

    /// Delete the shadow map of light `index`, if any
    pub fn release_shadow_map(&mut self, gfx: &mut dyn GraphicsProvider, index: usize) {
        if let Some(shadow) = self.lights.get_mut(index).and_then(|light| light.shadow_map.take()) {
            gfx.delete_framebuffer(shadow.framebuffer);
            gfx.delete_texture(shadow.texture);
        }
    }

    /// Start rendering depth from the point of view of light `index`
    ///
    /// `projection` and `view` are kept in the shadow map and make up its
    /// `SHADOW_MATRIX` during the main pass.
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if the light has no shadow map.
    pub fn begin_shadow_pass(
        &mut self,
        gfx: &mut dyn GraphicsProvider,
        index: usize,
        projection: Mat4,
        view: Mat4,
    ) -> Result<()> {
        let shadow = self.lights.get_mut(index)
            .and_then(|light| light.shadow_map.as_mut())
            .ok_or_else(|| engine_err!(SOURCE, InvalidResource => "Light {} has no shadow map", index))?;
        shadow.projection = projection;
        shadow.view = view;

        gfx.bind_framebuffer(shadow.framebuffer);
        gfx.set_viewport(0, 0, shadow.size, shadow.size);
        gfx.clear(ClearFlags::DEPTH);
        gfx.set_depth_test(true);
        self.shadow_pass = Some(index);
        Ok(())
    }

    /// Draw a subtree into the open shadow pass with a depth-only shader
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` outside `begin_shadow_pass`/`end_shadow_pass`.
    pub fn draw_shadow_caster(
        &mut self,
        gfx: &mut dyn GraphicsProvider,
        graph: &RenderableGraph,
        key: RenderableKey,
        shader: &RenderShader,
    ) -> Result<()> {
        let shadow = self.shadow_pass
            .and_then(|index| self.lights.get(index))
            .and_then(|light| light.shadow_map)
            .ok_or_else(|| engine_err!(SOURCE, InvalidResource => "No shadow pass in progress"))?;

        let params = DrawParams::new(shadow.projection, shadow.view);
        bind_and_draw(gfx, graph, key, shader, None, None, &params);
        Ok(())
    }

    /// Close the shadow pass and restore the default framebuffer
    pub fn end_shadow_pass(&mut self, gfx: &mut dyn GraphicsProvider) {
        if self.shadow_pass.take().is_some() {
            gfx.bind_framebuffer(FramebufferHandle::NONE);
            gfx.set_viewport(0, 0, self.size.width, self.size.height);
        }
    }

    fn check_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(engine_err!(SOURCE, InitializationFailed => "Forward renderer is not initialized"))
        }
    }
}

impl Renderer for ForwardRenderer {
    fn init(&mut self, gfx: &mut dyn GraphicsProvider) -> Result<()> {
        gfx.set_viewport(0, 0, self.size.width, self.size.height);
        gfx.set_depth_test(true);
        gfx.set_blend(None);
        self.initialized = true;
        engine_info!(SOURCE, "Forward renderer initialized ({}x{})", self.size.width, self.size.height);
        Ok(())
    }

    fn destroy(&mut self, gfx: &mut dyn GraphicsProvider) {
        self.end_shadow_pass(gfx);
        for light in self.lights.iter_mut() {
            if let Some(shadow) = light.shadow_map.take() {
                gfx.delete_framebuffer(shadow.framebuffer);
                gfx.delete_texture(shadow.texture);
            }
        }
        self.initialized = false;
    }

    fn change_resolution(&mut self, _gfx: &mut dyn GraphicsProvider, size: PhysicalSize<u32>) -> Result<()> {
        // Viewport is set at the start of every frame
        self.size = size;
        Ok(())
    }

    fn resolution(&self) -> PhysicalSize<u32> {
        self.size
    }

    fn begin_render_frame(&mut self, gfx: &mut dyn GraphicsProvider) -> Result<()> {
        self.check_initialized()?;
        gfx.bind_framebuffer(FramebufferHandle::NONE);
        gfx.set_viewport(0, 0, self.size.width, self.size.height);
        gfx.set_clear_color(self.config.clear_color);
        gfx.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
        gfx.set_depth_test(true);
        Ok(())
    }

    fn draw_renderable(
        &mut self,
        gfx: &mut dyn GraphicsProvider,
        graph: &RenderableGraph,
        key: RenderableKey,
        params: &DrawParams,
    ) -> Result<()> {
        self.check_initialized()?;
        draw_with_core_shaders(gfx, graph, key, Some(&self.lights), params);
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
        bind_and_draw(gfx, graph, key, shader, binder, Some(&self.lights), params);
        Ok(())
    }

    fn end_render_frame(&mut self, gfx: &mut dyn GraphicsProvider) -> Result<()> {
        self.check_initialized()?;
        gfx.use_program(ProgramHandle::NONE);
        if self.config.debug_errors {
            drain_errors(gfx, SOURCE);
        }
        Ok(())
    }

    fn light_provider(&self) -> Option<&dyn LightProvider> {
        Some(&self.lights)
    }
}

#[cfg(test)]
#[path = "forward_renderer_tests.rs"]
mod tests;
