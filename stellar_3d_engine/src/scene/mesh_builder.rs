/// Geometry upload: decoded meshes and built-in primitives.
///
/// Decoded meshes use one buffer per attribute (stride 0). The cube
/// primitive uses a single interleaved buffer to exercise the shared-stride
/// layout. Every constructor allocates a fresh vertex array and returns the
/// key of a node owning the new core.

use bytemuck::Pod;
use glam::{Vec2, Vec3};
use crate::animation::{Animation, Bone, Skeleton};
use crate::engine_warn;
use crate::error::Result;
use crate::graphics_provider::{
    BufferHandle, BufferTarget, BufferUsage, GraphicsProvider, TextureHandle,
};
use super::aabb::AABB;
use super::renderable::{AttributeSource, Material, MaterialTextures, RenderableCore, RenderableKey};
use super::renderable_graph::RenderableGraph;
use super::texture_cache::TextureCache;

/// Mesh as produced by an external decoder
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec3>,
    /// UV channels; channel 0 feeds `VERTEX_UV_0`
    pub uv_channels: Vec<Vec<Vec2>>,
    /// Triangle index triples
    pub faces: Vec<[u32; 3]>,
    /// Up to 4 bone influences per vertex
    pub bone_ids: Vec<[u32; 4]>,
    pub bone_weights: Vec<[f32; 4]>,
    pub bones: Vec<Bone>,
    pub animations: Vec<Animation>,
    /// Texture names resolved through a `TextureCache`
    pub diffuse_texture: Option<String>,
    pub normals_texture: Option<String>,
    pub specular_texture: Option<String>,
    pub material: Material,
}

/// Interleaved cube vertex: position (3), normal (3), uv (2)
type CubeVertex = [f32; 8];
const CUBE_STRIDE: u32 = std::mem::size_of::<CubeVertex>() as u32;

fn upload<T: Pod>(gfx: &mut dyn GraphicsProvider, target: BufferTarget, data: &[T]) -> Result<BufferHandle> {
    if data.is_empty() {
        return Ok(BufferHandle::NONE);
    }
    gfx.create_buffer(target, bytemuck::cast_slice(data), BufferUsage::Static)
}

fn resolve_texture(textures: &TextureCache, name: Option<&str>) -> TextureHandle {
    match name {
        None => TextureHandle::NONE,
        Some(name) => textures.get(name).unwrap_or_else(|| {
            engine_warn!("stellar3d::MeshBuilder", "Texture '{}' is not loaded, slot left unbound", name);
            TextureHandle::NONE
        }),
    }
}

/// Run `fill` on a core around a fresh vertex array; release it on failure
fn build_core<F>(gfx: &mut dyn GraphicsProvider, fill: F) -> Result<RenderableCore>
where
    F: FnOnce(&mut dyn GraphicsProvider, &mut RenderableCore) -> Result<()>,
{
    let vao = gfx.create_vertex_array()?;
    let mut core = RenderableCore::new(vao);
    if let Err(err) = fill(gfx, &mut core) {
        core.release(gfx);
        return Err(err);
    }
    Ok(core)
}

impl RenderableGraph {
    /// Upload a decoded mesh and insert a node owning it
    ///
    /// # Arguments
    ///
    /// * `gfx` - Provider creating the vertex array and buffers
    /// * `textures` - Cache resolving the mesh's texture names
    /// * `mesh` - Decoded mesh data
    ///
    /// # Errors
    ///
    /// Buffer creation errors, or `Error::InvalidResource` for an invalid
    /// bone hierarchy (checked before any GPU object is created).
    pub fn create_from_mesh(
        &mut self,
        gfx: &mut dyn GraphicsProvider,
        textures: &TextureCache,
        mesh: &MeshData,
    ) -> Result<RenderableKey> {
        let skeleton = if mesh.bones.is_empty() {
            None
        } else {
            Some(Skeleton::new(mesh.bones.clone(), mesh.animations.clone())?)
        };

        let mut core = build_core(gfx, |gfx, core| {
            let buffers = &mut core.buffers;
            buffers.position.buffer = upload(gfx, BufferTarget::Array, &mesh.positions)?;
            buffers.normal.buffer = upload(gfx, BufferTarget::Array, &mesh.normals)?;
            buffers.tangent.buffer = upload(gfx, BufferTarget::Array, &mesh.tangents)?;
            if let Some(uvs) = mesh.uv_channels.first() {
                buffers.uv.buffer = upload(gfx, BufferTarget::Array, uvs)?;
            }
            buffers.bone_ids.buffer = upload(gfx, BufferTarget::Array, &mesh.bone_ids)?;
            buffers.bone_weights.buffer = upload(gfx, BufferTarget::Array, &mesh.bone_weights)?;
            buffers.elements = upload(gfx, BufferTarget::ElementArray, &mesh.faces)?;
            Ok(())
        })?;

        core.face_count = mesh.faces.len() as u32;
        core.material = mesh.material;
        core.textures = MaterialTextures {
            diffuse: resolve_texture(textures, mesh.diffuse_texture.as_deref()),
            normals: resolve_texture(textures, mesh.normals_texture.as_deref()),
            specular: resolve_texture(textures, mesh.specular_texture.as_deref()),
        };
        core.skeleton = skeleton;

        let key = self.create_renderable(core);
        if let Some(node) = self.get_mut(key) {
            node.bounding_box = AABB::from_points(&mesh.positions);
        }
        Ok(key)
    }

    /// Quad in the XY plane from `(x0, y0)` to `(x1, y1)`, facing +Z
    pub fn create_plane_xy(
        &mut self,
        gfx: &mut dyn GraphicsProvider,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
    ) -> Result<RenderableKey> {
        let mesh = MeshData {
            positions: vec![
                Vec3::new(x0, y0, 0.0),
                Vec3::new(x1, y0, 0.0),
                Vec3::new(x1, y1, 0.0),
                Vec3::new(x0, y1, 0.0),
            ],
            normals: vec![Vec3::Z; 4],
            tangents: vec![Vec3::X; 4],
            uv_channels: vec![vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 1.0),
            ]],
            faces: vec![[0, 1, 2], [0, 2, 3]],
            ..Default::default()
        };
        self.create_from_mesh(gfx, &TextureCache::new(), &mesh)
    }

    /// Solid box between `min` and `max`, 24 vertices in one interleaved buffer
    pub fn create_cube(&mut self, gfx: &mut dyn GraphicsProvider, min: Vec3, max: Vec3) -> Result<RenderableKey> {
        let (x0, y0, z0) = (min.x, min.y, min.z);
        let (x1, y1, z1) = (max.x, max.y, max.z);

        // Per face: normal, then corners bottom-left, bottom-right, top-right, top-left
        let sides: [(Vec3, [Vec3; 4]); 6] = [
            (Vec3::X, [Vec3::new(x1, y0, z1), Vec3::new(x1, y0, z0), Vec3::new(x1, y1, z0), Vec3::new(x1, y1, z1)]),
            (Vec3::NEG_X, [Vec3::new(x0, y0, z0), Vec3::new(x0, y0, z1), Vec3::new(x0, y1, z1), Vec3::new(x0, y1, z0)]),
            (Vec3::Y, [Vec3::new(x0, y1, z1), Vec3::new(x1, y1, z1), Vec3::new(x1, y1, z0), Vec3::new(x0, y1, z0)]),
            (Vec3::NEG_Y, [Vec3::new(x0, y0, z0), Vec3::new(x1, y0, z0), Vec3::new(x1, y0, z1), Vec3::new(x0, y0, z1)]),
            (Vec3::Z, [Vec3::new(x0, y0, z1), Vec3::new(x1, y0, z1), Vec3::new(x1, y1, z1), Vec3::new(x0, y1, z1)]),
            (Vec3::NEG_Z, [Vec3::new(x1, y0, z0), Vec3::new(x0, y0, z0), Vec3::new(x0, y1, z0), Vec3::new(x1, y1, z0)]),
        ];
        let corner_uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

        let mut vertices: Vec<CubeVertex> = Vec::with_capacity(24);
        let mut faces: Vec<[u32; 3]> = Vec::with_capacity(12);
        for (normal, corners) in sides.iter() {
            let base = vertices.len() as u32;
            for (corner, uv) in corners.iter().zip(corner_uvs.iter()) {
                vertices.push([
                    corner.x, corner.y, corner.z,
                    normal.x, normal.y, normal.z,
                    uv[0], uv[1],
                ]);
            }
            faces.push([base, base + 1, base + 2]);
            faces.push([base, base + 2, base + 3]);
        }

        let mut core = build_core(gfx, |gfx, core| {
            let combo = upload(gfx, BufferTarget::Array, &vertices)?;
            let buffers = &mut core.buffers;
            buffers.combo_vbo1 = combo;
            buffers.position = AttributeSource::new(combo, 0);
            buffers.normal = AttributeSource::new(combo, 12);
            buffers.uv = AttributeSource::new(combo, 24);
            buffers.stride = CUBE_STRIDE;
            buffers.elements = upload(gfx, BufferTarget::ElementArray, &faces)?;
            Ok(())
        })?;
        core.face_count = faces.len() as u32;

        let key = self.create_renderable(core);
        if let Some(node) = self.get_mut(key) {
            node.bounding_box = AABB::new(min.min(max), min.max(max));
        }
        Ok(key)
    }

    /// The 12 edges of the box between `min` and `max`, drawn as lines
    pub fn create_wireframe_cube(&mut self, gfx: &mut dyn GraphicsProvider, min: Vec3, max: Vec3) -> Result<RenderableKey> {
        // Corner i takes max on x/y/z when bit 0/1/2 of i is set
        let corners: Vec<Vec3> = (0..8u32)
            .map(|i| Vec3::new(
                if i & 1 != 0 { max.x } else { min.x },
                if i & 2 != 0 { max.y } else { min.y },
                if i & 4 != 0 { max.z } else { min.z },
            ))
            .collect();

        let mut edges: Vec<[u32; 2]> = Vec::with_capacity(12);
        for corner in 0..8u32 {
            for bit in [1, 2, 4] {
                if corner & bit == 0 {
                    edges.push([corner, corner | bit]);
                }
            }
        }
        self.create_line_geometry(gfx, &corners, &edges)
    }

    /// Single segment from `from` to `to`
    pub fn create_line(&mut self, gfx: &mut dyn GraphicsProvider, from: Vec3, to: Vec3) -> Result<RenderableKey> {
        self.create_line_geometry(gfx, &[from, to], &[[0, 1]])
    }

    /// Position-only geometry drawn with `PrimitiveMode::Lines`
    ///
    /// `face_count` holds the segment count.
    fn create_line_geometry(
        &mut self,
        gfx: &mut dyn GraphicsProvider,
        positions: &[Vec3],
        segments: &[[u32; 2]],
    ) -> Result<RenderableKey> {
        let mut core = build_core(gfx, |gfx, core| {
            core.buffers.position.buffer = upload(gfx, BufferTarget::Array, positions)?;
            core.buffers.elements = upload(gfx, BufferTarget::ElementArray, segments)?;
            Ok(())
        })?;
        core.face_count = segments.len() as u32;

        let key = self.create_renderable(core);
        if let Some(node) = self.get_mut(key) {
            node.bounding_box = AABB::from_points(positions);
        }
        Ok(key)
    }
}

#[cfg(test)]
#[path = "mesh_builder_tests.rs"]
mod tests;
