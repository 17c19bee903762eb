//! Scene module
//!
//! The renderable transform graph (an arena of nodes sharing GPU resource
//! cores), bounding boxes, texture cache and geometry builders.

mod aabb;
mod renderable;
mod renderable_graph;
mod mesh_builder;
mod texture_cache;

pub use aabb::AABB;
pub use renderable::{
    Renderable, RenderableKey, RenderableCore, RenderableCoreKey, RenderableFlags,
    Material, MaterialTextures, AttributeSource, VertexBuffers,
};
pub use renderable_graph::RenderableGraph;
pub use mesh_builder::MeshData;
pub use texture_cache::TextureCache;
