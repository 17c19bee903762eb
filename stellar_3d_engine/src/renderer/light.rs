/// Lights, shadow maps and the light capability queried at bind time.

use glam::{Mat4, Vec3, Vec4};
use crate::graphics_provider::{FramebufferHandle, TextureHandle};

/// Maximum number of simultaneously active lights
pub const MAX_LIGHTS: usize = 4;

// ===== SHADOW MAPS =====

/// Shadow map allocation settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowMapConfig {
    /// Width and height of the depth texture
    pub size: u32,
    /// Maps clip space [-1, 1] to texture space [0, 1]
    pub bias_matrix: Mat4,
}

impl Default for ShadowMapConfig {
    fn default() -> Self {
        Self {
            size: 2048,
            bias_matrix: Mat4::from_cols(
                Vec4::new(0.5, 0.0, 0.0, 0.0),
                Vec4::new(0.0, 0.5, 0.0, 0.0),
                Vec4::new(0.0, 0.0, 0.5, 0.0),
                Vec4::new(0.5, 0.5, 0.5, 1.0),
            ),
        }
    }
}

/// Depth render target of one light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowMap {
    pub texture: TextureHandle,
    pub framebuffer: FramebufferHandle,
    pub size: u32,
    pub bias_matrix: Mat4,
    /// Light projection of the last shadow pass
    pub projection: Mat4,
    /// Light view of the last shadow pass
    pub view: Mat4,
}

impl ShadowMap {
    /// `bias * projection * view`, uploaded as `SHADOW_MATRIX[i]`
    pub fn shadow_matrix(&self) -> Mat4 {
        self.bias_matrix * self.projection * self.view
    }
}

// ===== LIGHT =====

/// A light consulted by the forward pipeline and the deferred composite pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    /// World-space position (uploaded in view space)
    pub position: Vec3,
    /// World-space direction (uploaded in view space)
    pub direction: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub diffuse_intensity: f32,
    pub ambient_intensity: f32,
    pub attenuation: f32,
    pub shadow_map: Option<ShadowMap>,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::NEG_Y,
            diffuse: Vec3::ONE,
            specular: Vec3::ONE,
            diffuse_intensity: 1.0,
            ambient_intensity: 0.1,
            attenuation: 0.0,
            shadow_map: None,
        }
    }
}

// ===== CAPABILITY =====

/// Implemented by anything that supplies lights to the binding protocol
///
/// Active lights are packed: indices `0..active_light_count()` are all present.
pub trait LightProvider {
    fn active_light_count(&self) -> usize;

    fn light(&self, index: usize) -> Option<&Light>;
}

/// Fixed array of light slots
///
/// The first empty slot ends the active range; lights stored after a gap
/// are kept but ignored until the gap is filled.
#[derive(Debug, Clone, Default)]
pub struct LightSlots {
    slots: [Option<Light>; MAX_LIGHTS],
}

impl LightSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or clear a slot. Returns false if `index >= MAX_LIGHTS`.
    pub fn set(&mut self, index: usize, light: Option<Light>) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = light;
                true
            }
            None => false,
        }
    }

    /// Slot content, active or not
    pub fn get(&self, index: usize) -> Option<&Light> {
        self.slots.get(index).and_then(|slot| slot.as_ref())
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Light> {
        self.slots.get_mut(index).and_then(|slot| slot.as_mut())
    }

    /// Lights before the first empty slot
    pub fn active(&self) -> impl Iterator<Item = &Light> {
        self.slots.iter().map_while(|slot| slot.as_ref())
    }

    /// Every stored light, including those after a gap
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Light> {
        self.slots.iter_mut().flatten()
    }
}

impl LightProvider for LightSlots {
    fn active_light_count(&self) -> usize {
        self.active().count()
    }

    fn light(&self, index: usize) -> Option<&Light> {
        if index < self.active_light_count() {
            self.get(index)
        } else {
            None
        }
    }
}

/// One borrowed light exposed as light index 0
#[derive(Debug, Clone, Copy)]
pub struct SingleLight<'a>(pub &'a Light);

impl LightProvider for SingleLight<'_> {
    fn active_light_count(&self) -> usize {
        1
    }

    fn light(&self, index: usize) -> Option<&Light> {
        if index == 0 { Some(self.0) } else { None }
    }
}

#[cfg(test)]
#[path = "light_tests.rs"]
mod tests;
