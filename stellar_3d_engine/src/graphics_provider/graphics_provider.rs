/// GraphicsProvider trait - the GPU capability set consumed by the engine core
///
/// The core never talks to a graphics API directly. Everything it needs
/// (buffers, textures, programs, framebuffers, draw calls, render state) goes
/// through this trait, which a backend shim implements on top of a real API.
/// The provider is always passed explicitly as `&mut dyn GraphicsProvider`.

use bitflags::bitflags;
use glam::{Mat4, Vec3, Vec4};
use crate::error::Result;

// ============================================================================
// Handles
// ============================================================================

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            /// The null object (unbinds when passed to a bind call)
            pub const NONE: Self = Self(0);

            /// Whether this is the null object
            pub fn is_none(&self) -> bool {
                self.0 == 0
            }
        }
    };
}

define_handle!(
    /// GPU buffer object
    BufferHandle
);
define_handle!(
    /// GPU texture object
    TextureHandle
);
define_handle!(
    /// Vertex array object (attribute bindings container)
    VertexArrayHandle
);
define_handle!(
    /// Compiled shader stage object
    ShaderHandle
);
define_handle!(
    /// Linked shader program object
    ProgramHandle
);
define_handle!(
    /// Framebuffer object (`NONE` is the default/window framebuffer)
    FramebufferHandle
);
define_handle!(
    /// Renderbuffer object
    RenderbufferHandle
);

// ============================================================================
// State enums
// ============================================================================

/// Buffer binding target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data
    Array,
    /// Index data
    ElementArray,
}

/// Expected update frequency of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Written once, drawn many times
    Static,
    /// Rewritten frequently
    Dynamic,
}

/// Shader pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Geometry,
    Fragment,
}

/// Primitive assembly mode for draw calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveMode {
    Triangles,
    Lines,
}

/// Component type of a vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    /// 32-bit float, passed to the shader as float
    Float,
    /// 32-bit unsigned integer, passed to the shader as an integer (no conversion)
    UnsignedInt,
}

/// Description of one vertex attribute inside a bound array buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeLayout {
    /// Number of components (1-4)
    pub components: u32,
    /// Component type
    pub attribute_type: AttributeType,
    /// Byte distance between two consecutive vertices (0 = tightly packed)
    pub stride: u32,
    /// Byte offset of the attribute inside one vertex record
    pub offset: u32,
}

/// Pixel format of a texture or renderbuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// 8-bit RGBA, normalized
    Rgba8,
    /// 32-bit float RGB (view-space positions/normals)
    Rgb32F,
    /// 24-bit depth
    Depth24,
    /// 32-bit float depth
    Depth32F,
}

/// Descriptor for creating a 2D texture
#[derive(Debug, Clone)]
pub struct TextureDesc<'a> {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// Initial pixel data (None = uninitialized, e.g. render targets)
    pub data: Option<&'a [u8]>,
}

/// Framebuffer attachment point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    /// Color attachment N
    Color(u32),
    /// Depth attachment
    Depth,
}

/// Result of a framebuffer completeness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferStatus {
    Complete,
    IncompleteAttachment,
    MissingAttachment,
    Unsupported,
    /// Backend-specific status code
    Other(u32),
}

/// Blend equation presets used by the renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// src_alpha, one_minus_src_alpha
    Alpha,
    /// one, one (light accumulation)
    Additive,
}

bitflags! {
    /// Buffers cleared by `GraphicsProvider::clear`
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        const COLOR   = 1 << 0;
        const DEPTH   = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

// ============================================================================
// GraphicsProvider trait
// ============================================================================

/// GPU capability interface
///
/// Uniform and attribute locations follow the usual convention: `-1` means
/// the program does not declare the variable. Callers never write to `-1`.
pub trait GraphicsProvider {
    // ===== BUFFERS =====

    /// Create a buffer bound to `target` and upload `data` into it
    fn create_buffer(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) -> Result<BufferHandle>;

    /// Bind a buffer to a target (`BufferHandle::NONE` unbinds)
    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferHandle);

    /// Delete a buffer
    fn delete_buffer(&mut self, buffer: BufferHandle);

    // ===== VERTEX ARRAYS =====

    /// Create a vertex array object
    fn create_vertex_array(&mut self) -> Result<VertexArrayHandle>;

    /// Bind a vertex array object (`VertexArrayHandle::NONE` unbinds)
    fn bind_vertex_array(&mut self, vao: VertexArrayHandle);

    /// Delete a vertex array object
    fn delete_vertex_array(&mut self, vao: VertexArrayHandle);

    /// Enable the attribute at `location` for the bound vertex array
    fn enable_vertex_attribute(&mut self, location: u32);

    /// Disable the attribute at `location` for the bound vertex array
    fn disable_vertex_attribute(&mut self, location: u32);

    /// Point the attribute at `location` into the currently bound array buffer
    fn vertex_attribute_pointer(&mut self, location: u32, layout: &AttributeLayout);

    // ===== TEXTURES =====

    /// Create a 2D texture
    fn create_texture_2d(&mut self, desc: &TextureDesc) -> Result<TextureHandle>;

    /// Delete a texture
    fn delete_texture(&mut self, texture: TextureHandle);

    /// Select the active texture unit
    fn active_texture(&mut self, unit: u32);

    /// Bind a 2D texture to the active unit (`TextureHandle::NONE` unbinds)
    fn bind_texture_2d(&mut self, texture: TextureHandle);

    // ===== SHADERS =====

    /// Compile one shader stage
    ///
    /// # Errors
    ///
    /// `Error::ShaderCompilationFailed` carrying the compiler log
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderHandle>;

    /// Delete a shader stage object
    fn delete_shader(&mut self, shader: ShaderHandle);

    /// Link compiled stages into a program
    ///
    /// # Errors
    ///
    /// `Error::ShaderLinkFailed` carrying the linker log
    fn link_program(&mut self, shaders: &[ShaderHandle]) -> Result<ProgramHandle>;

    /// Make a program current (`ProgramHandle::NONE` unbinds)
    fn use_program(&mut self, program: ProgramHandle);

    /// Delete a program
    fn delete_program(&mut self, program: ProgramHandle);

    /// Location of a uniform, or -1 when the program does not declare it
    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> i32;

    /// Location of a vertex attribute, or -1 when the program does not declare it
    fn attribute_location(&mut self, program: ProgramHandle, name: &str) -> i32;

    // ===== UNIFORMS (current program) =====

    fn set_uniform_i32(&mut self, location: i32, value: i32);
    fn set_uniform_f32(&mut self, location: i32, value: f32);
    fn set_uniform_vec3(&mut self, location: i32, value: Vec3);
    fn set_uniform_vec4(&mut self, location: i32, value: Vec4);
    fn set_uniform_mat4(&mut self, location: i32, value: &Mat4);
    fn set_uniform_mat4_array(&mut self, location: i32, values: &[Mat4]);

    // ===== DRAW CALLS =====

    /// Indexed draw with 32-bit indices from the bound element buffer
    fn draw_elements(&mut self, mode: PrimitiveMode, index_count: u32);

    /// Non-indexed draw
    fn draw_arrays(&mut self, mode: PrimitiveMode, first: u32, vertex_count: u32);

    // ===== FRAMEBUFFERS =====

    /// Create a framebuffer object
    fn create_framebuffer(&mut self) -> Result<FramebufferHandle>;

    /// Bind a framebuffer (`FramebufferHandle::NONE` is the window)
    fn bind_framebuffer(&mut self, framebuffer: FramebufferHandle);

    /// Delete a framebuffer
    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle);

    /// Attach a texture to the bound framebuffer
    fn framebuffer_texture_2d(&mut self, attachment: Attachment, texture: TextureHandle);

    /// Create a renderbuffer with storage
    fn create_renderbuffer(&mut self, format: TextureFormat, width: u32, height: u32) -> Result<RenderbufferHandle>;

    /// Attach a renderbuffer to the bound framebuffer
    fn framebuffer_renderbuffer(&mut self, attachment: Attachment, renderbuffer: RenderbufferHandle);

    /// Delete a renderbuffer
    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferHandle);

    /// Route fragment outputs 0..count to color attachments 0..count (0 = depth only)
    fn draw_buffers(&mut self, count: u32);

    /// Completeness of the bound framebuffer
    fn framebuffer_status(&mut self) -> FramebufferStatus;

    // ===== RENDER STATE =====

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32);
    fn set_clear_color(&mut self, color: Vec4);
    fn clear(&mut self, flags: ClearFlags);
    fn set_depth_test(&mut self, enabled: bool);

    /// Enable blending with the given preset, or disable it with `None`
    fn set_blend(&mut self, mode: Option<BlendMode>);

    // ===== DEBUG =====

    /// Pop the oldest pending driver error code, if any
    fn next_error(&mut self) -> Option<u32>;
}
