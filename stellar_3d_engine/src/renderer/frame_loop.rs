/// Frame loop - poll, draw and present until the window asks to close
///
/// The windowing layer is not part of the engine; it plugs in through
/// `FrameDriver`. One iteration:
///
/// poll events (apply resize) -> before_draw -> begin_render_frame -> draw
/// -> end_render_frame -> swap_buffers -> after_draw

use std::time::Instant;
use winit::dpi::PhysicalSize;
use crate::error::Result;
use crate::graphics_provider::GraphicsProvider;
use crate::engine_debug;
use super::renderer::Renderer;

/// Hooks the frame loop calls on the windowing layer
pub trait FrameDriver {
    /// Whether the window requested to close
    fn should_close(&self) -> bool;

    /// Process pending window events
    ///
    /// Returns the new framebuffer size if the window was resized.
    fn poll_events(&mut self) -> Option<PhysicalSize<u32>>;

    /// Called before the renderer starts the frame (input handling, animation)
    fn before_draw(&mut self, _delta: f32) {}

    /// Submit the frame's draws
    fn draw(&mut self, gfx: &mut dyn GraphicsProvider, renderer: &mut dyn Renderer, delta: f32) -> Result<()>;

    /// Present the finished frame
    fn swap_buffers(&mut self);

    /// Called once the frame is presented
    fn after_draw(&mut self, _delta: f32) {}
}

/// Run frames until `driver.should_close()`
///
/// `delta` is the time in seconds since the previous iteration (0 on the
/// first one). A zero-sized resize (minimized window) is ignored.
///
/// # Errors
///
/// The first error returned by the renderer or the driver ends the loop.
///
/// # Returns
///
/// Number of frames presented.
pub fn run_frame_loop(
    gfx: &mut dyn GraphicsProvider,
    renderer: &mut dyn Renderer,
    driver: &mut dyn FrameDriver,
) -> Result<u64> {
    let mut frames = 0u64;
    let mut last_frame: Option<Instant> = None;

    while !driver.should_close() {
        let now = Instant::now();
        let delta = last_frame.map_or(0.0, |last| now.duration_since(last).as_secs_f32());
        last_frame = Some(now);

        if let Some(size) = driver.poll_events() {
            if size.width > 0 && size.height > 0 && size != renderer.resolution() {
                engine_debug!("stellar3d::FrameLoop", "Resize to {}x{}", size.width, size.height);
                renderer.change_resolution(gfx, size)?;
            }
        }

        driver.before_draw(delta);
        renderer.begin_render_frame(gfx)?;
        driver.draw(gfx, renderer, delta)?;
        renderer.end_render_frame(gfx)?;
        driver.swap_buffers();
        driver.after_draw(delta);
        frames += 1;
    }

    Ok(frames)
}

#[cfg(test)]
#[path = "frame_loop_tests.rs"]
mod tests;
