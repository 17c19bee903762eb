/// Renderable node and its shareable GPU resource bundle.
///
/// A `Renderable` is per-instance transform state. Everything that lives on
/// the GPU (buffers, vertex array, textures, shader, skeleton) sits in a
/// `RenderableCore` that clones share through the graph's core arena.

use std::rc::Rc;
use bitflags::bitflags;
use glam::{Mat4, Quat, Vec3, Vec4};
use slotmap::new_key_type;
use crate::animation::Skeleton;
use crate::graphics_provider::{
    BufferHandle, GraphicsProvider, PrimitiveMode, TextureHandle, VertexArrayHandle,
};
use crate::shader::RenderShader;
use super::aabb::AABB;

// ===== SLOT MAP KEYS =====

new_key_type! {
    /// Stable key of a node in a `RenderableGraph`
    pub struct RenderableKey;

    /// Stable key of a shared core in a `RenderableGraph`
    pub struct RenderableCoreKey;
}

// ===== FLAGS =====

bitflags! {
    /// Per-node state flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RenderableFlags: u32 {
        /// Node and its subtree are drawn
        const VISIBLE = 1 << 0;
        /// Node draws its children only, never itself
        const GROUP   = 1 << 1;
    }
}

impl Default for RenderableFlags {
    fn default() -> Self {
        RenderableFlags::VISIBLE
    }
}

// ===== MATERIAL =====

/// Material scalars uploaded as `MATERIAL_*` uniforms
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: Vec4::ONE,
            specular: Vec4::ONE,
            shininess: 32.0,
        }
    }
}

/// Texture slots of a core (`NONE` = unbound)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaterialTextures {
    pub diffuse: TextureHandle,
    pub normals: TextureHandle,
    pub specular: TextureHandle,
}

// ===== VERTEX SOURCES =====

/// Where one vertex attribute reads its data
///
/// Several attributes may point into the same buffer at different offsets
/// (interleaved layout); they then share the core's `stride`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttributeSource {
    pub buffer: BufferHandle,
    /// Byte offset inside one vertex record
    pub offset: u32,
}

impl AttributeSource {
    pub fn new(buffer: BufferHandle, offset: u32) -> Self {
        Self { buffer, offset }
    }

    /// Whether a buffer backs this attribute
    pub fn is_bound(&self) -> bool {
        !self.buffer.is_none()
    }
}

/// Vertex and index buffers of a core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VertexBuffers {
    pub position: AttributeSource,
    pub uv: AttributeSource,
    pub normal: AttributeSource,
    pub tangent: AttributeSource,
    pub bone_ids: AttributeSource,
    pub bone_weights: AttributeSource,
    /// 32-bit index data
    pub elements: BufferHandle,
    /// General purpose buffers, typically holding interleaved vertices
    pub combo_vbo1: BufferHandle,
    pub combo_vbo2: BufferHandle,
    /// Byte stride shared by every attribute (0 = tightly packed)
    pub stride: u32,
}

impl VertexBuffers {
    /// Every distinct buffer handle, without duplicates or `NONE`
    pub fn distinct_buffers(&self) -> Vec<BufferHandle> {
        let mut buffers = vec![
            self.position.buffer,
            self.uv.buffer,
            self.normal.buffer,
            self.tangent.buffer,
            self.bone_ids.buffer,
            self.bone_weights.buffer,
            self.elements,
            self.combo_vbo1,
            self.combo_vbo2,
        ];
        buffers.retain(|buffer| !buffer.is_none());
        buffers.sort();
        buffers.dedup();
        buffers
    }
}

// ===== CORE =====

/// GPU resource bundle shared by a renderable and all of its clones
#[derive(Debug, Default)]
pub struct RenderableCore {
    /// Shader used by `Renderer::draw_renderable`
    pub shader: Option<Rc<RenderShader>>,
    pub skeleton: Option<Skeleton>,
    pub textures: MaterialTextures,
    pub material: Material,
    pub vao: VertexArrayHandle,
    pub buffers: VertexBuffers,
    /// Triangles (or line segments) in the element buffer
    pub face_count: u32,
    /// Nodes currently referencing this core
    pub(crate) users: usize,
    pub(crate) destroyed: bool,
}

impl RenderableCore {
    /// Empty core around an existing vertex array
    pub fn new(vao: VertexArrayHandle) -> Self {
        Self { vao, ..Default::default() }
    }

    /// Number of indices an indexed draw consumes for `mode`
    pub fn index_count(&self, mode: PrimitiveMode) -> u32 {
        match mode {
            PrimitiveMode::Triangles => self.face_count * 3,
            PrimitiveMode::Lines => self.face_count * 2,
        }
    }

    /// Whether the GPU resources were released
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Delete the vertex array and every owned buffer
    ///
    /// Textures and the shader are shared through caches and stay alive.
    pub(crate) fn release(&mut self, gfx: &mut dyn GraphicsProvider) {
        if self.destroyed {
            return;
        }
        for buffer in self.buffers.distinct_buffers() {
            gfx.delete_buffer(buffer);
        }
        if !self.vao.is_none() {
            gfx.delete_vertex_array(self.vao);
        }
        self.buffers = VertexBuffers::default();
        self.vao = VertexArrayHandle::NONE;
        self.destroyed = true;
    }
}

// ===== NODE =====

/// A node of the transform graph
///
/// Transform state is per instance and never shared between clones.
#[derive(Debug, Clone)]
pub struct Renderable {
    pub scale: Vec3,
    pub location: Vec3,
    /// World rotation, applied after translation (orbits the parent origin)
    pub rotation: Quat,
    /// Pivot rotation around the model's own origin
    pub local_rotation: Quat,
    /// Animation clock, wrapped into the clip duration
    pub anim_time: f32,
    /// Local-space bounds (unscaled, unrotated)
    pub bounding_box: AABB,
    pub flags: RenderableFlags,
    pub(crate) parent: Option<RenderableKey>,
    pub(crate) children: Vec<RenderableKey>,
    pub(crate) core: RenderableCoreKey,
    pub(crate) owns_core: bool,
}

impl Renderable {
    pub(crate) fn new(core: RenderableCoreKey, owns_core: bool) -> Self {
        Self {
            scale: Vec3::ONE,
            location: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            local_rotation: Quat::IDENTITY,
            anim_time: 0.0,
            bounding_box: AABB::default(),
            flags: RenderableFlags::default(),
            parent: None,
            children: Vec::new(),
            core,
            owns_core,
        }
    }

    /// `rotation * translate(location) * local_rotation * scale`
    pub fn local_transform(&self) -> Mat4 {
        Mat4::from_quat(self.rotation)
            * Mat4::from_translation(self.location)
            * Mat4::from_quat(self.local_rotation)
            * Mat4::from_scale(self.scale)
    }

    pub fn is_visible(&self) -> bool {
        self.flags.contains(RenderableFlags::VISIBLE)
    }

    pub fn is_group(&self) -> bool {
        self.flags.contains(RenderableFlags::GROUP)
    }

    pub fn parent(&self) -> Option<RenderableKey> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> &[RenderableKey] {
        &self.children
    }

    pub fn core_key(&self) -> RenderableCoreKey {
        self.core
    }

    /// Whether this node releases the core's GPU resources on destroy
    pub fn owns_core(&self) -> bool {
        self.owns_core
    }
}
