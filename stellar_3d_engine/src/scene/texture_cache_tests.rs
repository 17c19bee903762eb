use crate::graphics_provider::mock_graphics_provider::{MockCall, MockGraphicsProvider};
use crate::graphics_provider::{TextureDesc, TextureFormat};
use super::*;

static PIXELS: [u8; 16] = [0; 16];

fn desc() -> TextureDesc<'static> {
    TextureDesc { width: 2, height: 2, format: TextureFormat::Rgba8, data: Some(PIXELS.as_slice()) }
}

#[test]
fn test_get_or_create_creates_once() {
    let mut gfx = MockGraphicsProvider::new();
    let mut cache = TextureCache::new();

    let first = cache.get_or_create(&mut gfx, "grass.png", &desc()).unwrap();
    let second = cache.get_or_create(&mut gfx, "grass.png", &desc()).unwrap();

    assert_eq!(first, second);
    assert_eq!(cache.len(), 1);
    assert_eq!(gfx.count_calls(|c| matches!(c, MockCall::CreateTexture { .. })), 1);
}

#[test]
fn test_insert_replaces_and_remove_forgets() {
    let mut cache = TextureCache::new();

    assert_eq!(cache.insert("a", TextureHandle(1)), None);
    assert_eq!(cache.insert("a", TextureHandle(2)), Some(TextureHandle(1)));
    assert_eq!(cache.get("a"), Some(TextureHandle(2)));
    assert_eq!(cache.remove("a"), Some(TextureHandle(2)));
    assert!(cache.is_empty());
}

#[test]
fn test_destroy_deletes_every_texture() {
    let mut gfx = MockGraphicsProvider::new();
    let mut cache = TextureCache::new();
    cache.insert("a", TextureHandle(1));
    cache.insert("b", TextureHandle(2));

    cache.destroy(&mut gfx);

    assert!(cache.is_empty());
    assert_eq!(gfx.count_calls(|c| matches!(c, MockCall::DeleteTexture(_))), 2);
}
