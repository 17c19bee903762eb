/// RenderShader - a linked program with lazily cached variable locations
///
/// Locations are queried from the provider on first use and cached per name,
/// including the `-1` "not declared" answer, so a shader that lacks a
/// variable costs one query for the lifetime of the program.

use std::cell::RefCell;
use std::rc::Rc;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::graphics_provider::{GraphicsProvider, ProgramHandle, ShaderHandle, ShaderStage};

/// A linked shader program
#[derive(Debug)]
pub struct RenderShader {
    /// Provider program object
    program: ProgramHandle,
    /// Uniform name -> location (-1 = not declared)
    uniforms: RefCell<FxHashMap<String, i32>>,
    /// Attribute name -> location (-1 = not declared)
    attributes: RefCell<FxHashMap<String, i32>>,
}

impl RenderShader {
    /// Wrap an already linked program
    pub fn new(program: ProgramHandle) -> Self {
        Self {
            program,
            uniforms: RefCell::new(FxHashMap::default()),
            attributes: RefCell::new(FxHashMap::default()),
        }
    }

    /// Provider program object
    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    /// Location of a uniform, or -1 when the program does not declare it
    pub fn uniform_location(&self, gfx: &mut dyn GraphicsProvider, name: &str) -> i32 {
        if let Some(&location) = self.uniforms.borrow().get(name) {
            return location;
        }
        let location = gfx.uniform_location(self.program, name);
        self.uniforms.borrow_mut().insert(name.to_string(), location);
        location
    }

    /// Location of a vertex attribute, or -1 when the program does not declare it
    pub fn attribute_location(&self, gfx: &mut dyn GraphicsProvider, name: &str) -> i32 {
        if let Some(&location) = self.attributes.borrow().get(name) {
            return location;
        }
        let location = gfx.attribute_location(self.program, name);
        self.attributes.borrow_mut().insert(name.to_string(), location);
        location
    }

    /// Whether a uniform location (present or not) is already cached
    pub fn is_uniform_cached(&self, name: &str) -> bool {
        self.uniforms.borrow().contains_key(name)
    }

    /// Fail fast if any of `names` is not a declared uniform
    ///
    /// # Errors
    ///
    /// `Error::MissingShaderVariables` listing every missing name
    pub fn assert_uniforms_exist(&self, gfx: &mut dyn GraphicsProvider, names: &[&str]) -> Result<()> {
        let missing: Vec<String> = names.iter()
            .filter(|name| self.uniform_location(gfx, name) < 0)
            .map(|name| name.to_string())
            .collect();
        Self::check_missing(missing)
    }

    /// Fail fast if any of `names` is not a declared vertex attribute
    ///
    /// # Errors
    ///
    /// `Error::MissingShaderVariables` listing every missing name
    pub fn assert_attributes_exist(&self, gfx: &mut dyn GraphicsProvider, names: &[&str]) -> Result<()> {
        let missing: Vec<String> = names.iter()
            .filter(|name| self.attribute_location(gfx, name) < 0)
            .map(|name| name.to_string())
            .collect();
        Self::check_missing(missing)
    }

    fn check_missing(missing: Vec<String>) -> Result<()> {
        if missing.is_empty() {
            return Ok(());
        }
        crate::engine_error!("stellar3d::RenderShader",
            "Shader is missing variables: {}", missing.join(", "));
        Err(Error::MissingShaderVariables(missing))
    }

    /// Delete the program and forget cached locations
    pub fn destroy(&self, gfx: &mut dyn GraphicsProvider) {
        gfx.delete_program(self.program);
        self.uniforms.borrow_mut().clear();
        self.attributes.borrow_mut().clear();
    }
}

/// Compile and link a shader program from source
///
/// Stage objects are deleted once the program is linked, and on any failure
/// every stage compiled so far is released before the error is returned.
///
/// # Errors
///
/// `Error::ShaderCompilationFailed` or `Error::ShaderLinkFailed`
pub fn load_shader_program(
    gfx: &mut dyn GraphicsProvider,
    vertex_source: &str,
    fragment_source: &str,
    geometry_source: Option<&str>,
) -> Result<Rc<RenderShader>> {
    let mut stages: Vec<(ShaderStage, &str)> = vec![(ShaderStage::Vertex, vertex_source)];
    if let Some(source) = geometry_source {
        stages.push((ShaderStage::Geometry, source));
    }
    stages.push((ShaderStage::Fragment, fragment_source));

    let mut compiled: Vec<ShaderHandle> = Vec::with_capacity(stages.len());
    for (stage, source) in stages {
        match gfx.compile_shader(stage, source) {
            Ok(handle) => compiled.push(handle),
            Err(err) => {
                crate::engine_error!("stellar3d::RenderShader",
                    "Failed to compile {:?} shader: {}", stage, err);
                for handle in compiled {
                    gfx.delete_shader(handle);
                }
                return Err(err);
            }
        }
    }

    let linked = gfx.link_program(&compiled);
    for handle in compiled {
        gfx.delete_shader(handle);
    }

    match linked {
        Ok(program) => {
            crate::engine_debug!("stellar3d::RenderShader", "Linked program {}", program.0);
            Ok(Rc::new(RenderShader::new(program)))
        }
        Err(err) => {
            crate::engine_error!("stellar3d::RenderShader", "Failed to link program: {}", err);
            Err(err)
        }
    }
}

#[cfg(test)]
#[path = "render_shader_tests.rs"]
mod tests;
