/// Mock GraphicsProvider for unit tests (no GPU required)
///
/// Records every call as a `MockCall`, hands out sequential handles and
/// resolves uniform/attribute locations from per-program name tables, so
/// tests can assert exactly what the binding protocol and renderers issued.

use glam::{Mat4, Vec3, Vec4};
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::graphics_provider::{
    GraphicsProvider, Attachment, AttributeLayout, BlendMode, BufferHandle, BufferTarget,
    BufferUsage, ClearFlags, FramebufferHandle, FramebufferStatus, PrimitiveMode,
    ProgramHandle, RenderbufferHandle, ShaderHandle, ShaderStage, TextureDesc,
    TextureFormat, TextureHandle, VertexArrayHandle,
};

// ============================================================================
// Recorded calls
// ============================================================================

/// Value written to a uniform
#[derive(Debug, Clone, PartialEq)]
pub enum MockUniform {
    I32(i32),
    F32(f32),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    Mat4Array(Vec<Mat4>),
}

/// One recorded provider call
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    CreateBuffer { handle: BufferHandle, target: BufferTarget, size: usize },
    BindBuffer { target: BufferTarget, handle: BufferHandle },
    DeleteBuffer(BufferHandle),
    CreateVertexArray(VertexArrayHandle),
    BindVertexArray(VertexArrayHandle),
    DeleteVertexArray(VertexArrayHandle),
    EnableAttribute(String),
    DisableAttribute(String),
    AttributePointer { name: String, layout: AttributeLayout },
    CreateTexture { handle: TextureHandle, width: u32, height: u32, format: TextureFormat },
    DeleteTexture(TextureHandle),
    ActiveTexture(u32),
    BindTexture(TextureHandle),
    CompileShader(ShaderStage),
    DeleteShader(ShaderHandle),
    LinkProgram(ProgramHandle),
    UseProgram(ProgramHandle),
    DeleteProgram(ProgramHandle),
    QueryUniform(String),
    QueryAttribute(String),
    SetUniform { name: String, value: MockUniform },
    DrawElements { mode: PrimitiveMode, count: u32 },
    DrawArrays { mode: PrimitiveMode, first: u32, count: u32 },
    CreateFramebuffer(FramebufferHandle),
    BindFramebuffer(FramebufferHandle),
    DeleteFramebuffer(FramebufferHandle),
    FramebufferTexture { attachment: Attachment, texture: TextureHandle },
    CreateRenderbuffer(RenderbufferHandle),
    FramebufferRenderbuffer { attachment: Attachment, renderbuffer: RenderbufferHandle },
    DeleteRenderbuffer(RenderbufferHandle),
    DrawBuffers(u32),
    Viewport { x: i32, y: i32, width: u32, height: u32 },
    ClearColor(Vec4),
    Clear(ClearFlags),
    DepthTest(bool),
    Blend(Option<BlendMode>),
}

/// Variables declared by a mock program
#[derive(Debug, Clone, Default)]
pub struct MockProgram {
    pub uniforms: Vec<String>,
    pub attributes: Vec<String>,
}

impl MockProgram {
    fn location_of(names: &[String], name: &str) -> i32 {
        names.iter().position(|n| n == name).map(|i| i as i32).unwrap_or(-1)
    }
}

// ============================================================================
// Mock provider
// ============================================================================

/// Recording graphics provider
#[derive(Debug, Default)]
pub struct MockGraphicsProvider {
    /// Every call in issue order
    pub calls: Vec<MockCall>,
    /// Declared variables per linked program
    pub programs: FxHashMap<ProgramHandle, MockProgram>,
    /// Variables the next linked program will declare
    pub next_program: MockProgram,
    /// When set, the next `compile_shader` fails with this log
    pub fail_compile: Option<String>,
    /// Restricts `fail_compile` to one stage (None = any stage)
    pub fail_compile_stage: Option<ShaderStage>,
    /// When set, the next `link_program` fails with this log
    pub fail_link: Option<String>,
    /// Status returned by `framebuffer_status`
    pub framebuffer_status: Option<FramebufferStatus>,
    /// Pending driver errors returned by `next_error`
    pub pending_errors: Vec<u32>,
    next_handle: u32,
    current_program: ProgramHandle,
}

impl MockGraphicsProvider {
    /// Create a new mock provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a program declaring the given uniforms and attributes
    ///
    /// Bypasses compile/link and records nothing.
    pub fn declare_program(&mut self, uniforms: &[&str], attributes: &[&str]) -> ProgramHandle {
        let handle = ProgramHandle(self.alloc());
        self.programs.insert(handle, MockProgram {
            uniforms: uniforms.iter().map(|s| s.to_string()).collect(),
            attributes: attributes.iter().map(|s| s.to_string()).collect(),
        });
        handle
    }

    /// Forget every recorded call
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// All indexed and non-indexed draw calls
    pub fn draw_calls(&self) -> Vec<&MockCall> {
        self.calls.iter()
            .filter(|c| matches!(c, MockCall::DrawElements { .. } | MockCall::DrawArrays { .. }))
            .collect()
    }

    /// Values written to the named uniform, in order
    pub fn uniform_writes(&self, name: &str) -> Vec<&MockUniform> {
        self.calls.iter()
            .filter_map(|c| match c {
                MockCall::SetUniform { name: n, value } if n == name => Some(value),
                _ => None,
            })
            .collect()
    }

    /// Whether any call matches the predicate
    pub fn has_call(&self, predicate: impl Fn(&MockCall) -> bool) -> bool {
        self.calls.iter().any(predicate)
    }

    /// Number of calls matching the predicate
    pub fn count_calls(&self, predicate: impl Fn(&MockCall) -> bool) -> usize {
        self.calls.iter().filter(|c| predicate(c)).count()
    }

    fn alloc(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn uniform_name(&self, location: i32) -> String {
        self.programs.get(&self.current_program)
            .and_then(|p| p.uniforms.get(location as usize))
            .cloned()
            .unwrap_or_else(|| format!("<location {}>", location))
    }

    fn attribute_name(&self, location: u32) -> String {
        self.programs.get(&self.current_program)
            .and_then(|p| p.attributes.get(location as usize))
            .cloned()
            .unwrap_or_else(|| format!("<attribute {}>", location))
    }

    fn record_uniform(&mut self, location: i32, value: MockUniform) {
        let name = self.uniform_name(location);
        self.calls.push(MockCall::SetUniform { name, value });
    }
}

impl GraphicsProvider for MockGraphicsProvider {
    fn create_buffer(&mut self, target: BufferTarget, data: &[u8], _usage: BufferUsage) -> Result<BufferHandle> {
        let handle = BufferHandle(self.alloc());
        self.calls.push(MockCall::CreateBuffer { handle, target, size: data.len() });
        Ok(handle)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: BufferHandle) {
        self.calls.push(MockCall::BindBuffer { target, handle: buffer });
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.calls.push(MockCall::DeleteBuffer(buffer));
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayHandle> {
        let handle = VertexArrayHandle(self.alloc());
        self.calls.push(MockCall::CreateVertexArray(handle));
        Ok(handle)
    }

    fn bind_vertex_array(&mut self, vao: VertexArrayHandle) {
        self.calls.push(MockCall::BindVertexArray(vao));
    }

    fn delete_vertex_array(&mut self, vao: VertexArrayHandle) {
        self.calls.push(MockCall::DeleteVertexArray(vao));
    }

    fn enable_vertex_attribute(&mut self, location: u32) {
        let name = self.attribute_name(location);
        self.calls.push(MockCall::EnableAttribute(name));
    }

    fn disable_vertex_attribute(&mut self, location: u32) {
        let name = self.attribute_name(location);
        self.calls.push(MockCall::DisableAttribute(name));
    }

    fn vertex_attribute_pointer(&mut self, location: u32, layout: &AttributeLayout) {
        let name = self.attribute_name(location);
        self.calls.push(MockCall::AttributePointer { name, layout: *layout });
    }

    fn create_texture_2d(&mut self, desc: &TextureDesc) -> Result<TextureHandle> {
        let handle = TextureHandle(self.alloc());
        self.calls.push(MockCall::CreateTexture {
            handle,
            width: desc.width,
            height: desc.height,
            format: desc.format,
        });
        Ok(handle)
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        self.calls.push(MockCall::DeleteTexture(texture));
    }

    fn active_texture(&mut self, unit: u32) {
        self.calls.push(MockCall::ActiveTexture(unit));
    }

    fn bind_texture_2d(&mut self, texture: TextureHandle) {
        self.calls.push(MockCall::BindTexture(texture));
    }

    fn compile_shader(&mut self, stage: ShaderStage, _source: &str) -> Result<ShaderHandle> {
        self.calls.push(MockCall::CompileShader(stage));
        let stage_matches = self.fail_compile_stage.map_or(true, |s| s == stage);
        if stage_matches {
            if let Some(log) = self.fail_compile.take() {
                return Err(Error::ShaderCompilationFailed(log));
            }
        }
        Ok(ShaderHandle(self.alloc()))
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        self.calls.push(MockCall::DeleteShader(shader));
    }

    fn link_program(&mut self, _shaders: &[ShaderHandle]) -> Result<ProgramHandle> {
        if let Some(log) = self.fail_link.take() {
            return Err(Error::ShaderLinkFailed(log));
        }
        let handle = ProgramHandle(self.alloc());
        let declared = std::mem::take(&mut self.next_program);
        self.programs.insert(handle, declared);
        self.calls.push(MockCall::LinkProgram(handle));
        Ok(handle)
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.current_program = program;
        self.calls.push(MockCall::UseProgram(program));
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
        self.calls.push(MockCall::DeleteProgram(program));
    }

    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> i32 {
        self.calls.push(MockCall::QueryUniform(name.to_string()));
        self.programs.get(&program)
            .map(|p| MockProgram::location_of(&p.uniforms, name))
            .unwrap_or(-1)
    }

    fn attribute_location(&mut self, program: ProgramHandle, name: &str) -> i32 {
        self.calls.push(MockCall::QueryAttribute(name.to_string()));
        self.programs.get(&program)
            .map(|p| MockProgram::location_of(&p.attributes, name))
            .unwrap_or(-1)
    }

    fn set_uniform_i32(&mut self, location: i32, value: i32) {
        self.record_uniform(location, MockUniform::I32(value));
    }

    fn set_uniform_f32(&mut self, location: i32, value: f32) {
        self.record_uniform(location, MockUniform::F32(value));
    }

    fn set_uniform_vec3(&mut self, location: i32, value: Vec3) {
        self.record_uniform(location, MockUniform::Vec3(value));
    }

    fn set_uniform_vec4(&mut self, location: i32, value: Vec4) {
        self.record_uniform(location, MockUniform::Vec4(value));
    }

    fn set_uniform_mat4(&mut self, location: i32, value: &Mat4) {
        self.record_uniform(location, MockUniform::Mat4(*value));
    }

    fn set_uniform_mat4_array(&mut self, location: i32, values: &[Mat4]) {
        self.record_uniform(location, MockUniform::Mat4Array(values.to_vec()));
    }

    fn draw_elements(&mut self, mode: PrimitiveMode, index_count: u32) {
        self.calls.push(MockCall::DrawElements { mode, count: index_count });
    }

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: u32, vertex_count: u32) {
        self.calls.push(MockCall::DrawArrays { mode, first, count: vertex_count });
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferHandle> {
        let handle = FramebufferHandle(self.alloc());
        self.calls.push(MockCall::CreateFramebuffer(handle));
        Ok(handle)
    }

    fn bind_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        self.calls.push(MockCall::BindFramebuffer(framebuffer));
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        self.calls.push(MockCall::DeleteFramebuffer(framebuffer));
    }

    fn framebuffer_texture_2d(&mut self, attachment: Attachment, texture: TextureHandle) {
        self.calls.push(MockCall::FramebufferTexture { attachment, texture });
    }

    fn create_renderbuffer(&mut self, _format: TextureFormat, _width: u32, _height: u32) -> Result<RenderbufferHandle> {
        let handle = RenderbufferHandle(self.alloc());
        self.calls.push(MockCall::CreateRenderbuffer(handle));
        Ok(handle)
    }

    fn framebuffer_renderbuffer(&mut self, attachment: Attachment, renderbuffer: RenderbufferHandle) {
        self.calls.push(MockCall::FramebufferRenderbuffer { attachment, renderbuffer });
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferHandle) {
        self.calls.push(MockCall::DeleteRenderbuffer(renderbuffer));
    }

    fn draw_buffers(&mut self, count: u32) {
        self.calls.push(MockCall::DrawBuffers(count));
    }

    fn framebuffer_status(&mut self) -> FramebufferStatus {
        self.framebuffer_status.unwrap_or(FramebufferStatus::Complete)
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.calls.push(MockCall::Viewport { x, y, width, height });
    }

    fn set_clear_color(&mut self, color: Vec4) {
        self.calls.push(MockCall::ClearColor(color));
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.calls.push(MockCall::Clear(flags));
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.calls.push(MockCall::DepthTest(enabled));
    }

    fn set_blend(&mut self, mode: Option<BlendMode>) {
        self.calls.push(MockCall::Blend(mode));
    }

    fn next_error(&mut self) -> Option<u32> {
        if self.pending_errors.is_empty() {
            None
        } else {
            Some(self.pending_errors.remove(0))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "mock_graphics_provider_tests.rs"]
mod tests;
