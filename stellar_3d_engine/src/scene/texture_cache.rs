/// Name -> texture handle cache shared by every mesh referencing a texture

use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::graphics_provider::{GraphicsProvider, TextureDesc, TextureHandle};

/// Texture cache keyed by name (usually the source file path)
#[derive(Debug, Default)]
pub struct TextureCache {
    textures: FxHashMap<String, TextureHandle>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already created texture, returning the handle it replaces
    pub fn insert(&mut self, name: impl Into<String>, texture: TextureHandle) -> Option<TextureHandle> {
        self.textures.insert(name.into(), texture)
    }

    pub fn get(&self, name: &str) -> Option<TextureHandle> {
        self.textures.get(name).copied()
    }

    /// Cached texture, or a new one created from `desc` and cached under `name`
    pub fn get_or_create(
        &mut self,
        gfx: &mut dyn GraphicsProvider,
        name: &str,
        desc: &TextureDesc,
    ) -> Result<TextureHandle> {
        if let Some(texture) = self.get(name) {
            return Ok(texture);
        }
        let texture = gfx.create_texture_2d(desc)?;
        self.textures.insert(name.to_string(), texture);
        Ok(texture)
    }

    /// Forget a texture without deleting it
    pub fn remove(&mut self, name: &str) -> Option<TextureHandle> {
        self.textures.remove(name)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Delete every cached texture
    pub fn destroy(&mut self, gfx: &mut dyn GraphicsProvider) {
        for (_, texture) in self.textures.drain() {
            gfx.delete_texture(texture);
        }
    }
}

#[cfg(test)]
#[path = "texture_cache_tests.rs"]
mod tests;
