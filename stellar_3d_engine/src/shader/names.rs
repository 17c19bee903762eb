/// Well-known shader variable names
///
/// A program opts into a value simply by declaring the matching variable.
/// Anything it does not declare is skipped at bind time.

// ===== MATRICES =====

/// Projection * view * model
pub const MVP_MATRIX: &str = "MVP_MATRIX";
pub const MV_MATRIX: &str = "MV_MATRIX";
pub const M_MATRIX: &str = "M_MATRIX";
pub const V_MATRIX: &str = "V_MATRIX";
/// Final skinning matrices (array of `MAX_BONES` mat4)
pub const BONES: &str = "BONES";
pub const CAMERA_WORLD_POSITION: &str = "CAMERA_WORLD_POSITION";

// ===== MATERIAL =====

pub const MATERIAL_DIFFUSE: &str = "MATERIAL_DIFFUSE";
pub const MATERIAL_SPECULAR: &str = "MATERIAL_SPECULAR";
pub const MATERIAL_SHININESS: &str = "MATERIAL_SHININESS";
pub const DIFFUSE_TEX: &str = "DIFFUSE_TEX";
pub const NORMALS_TEX: &str = "NORMALS_TEX";
pub const SPECULAR_TEX: &str = "SPECULAR_TEX";

// ===== LIGHTS =====

pub const LIGHT_COUNT: &str = "LIGHT_COUNT";
pub const LIGHT_POSITION: &str = "LIGHT_POSITION";
pub const LIGHT_DIRECTION: &str = "LIGHT_DIRECTION";
pub const LIGHT_DIFFUSE: &str = "LIGHT_DIFFUSE";
pub const LIGHT_SPECULAR: &str = "LIGHT_SPECULAR";
pub const LIGHT_DIFFUSE_INTENSITY: &str = "LIGHT_DIFFUSE_INTENSITY";
pub const LIGHT_AMBIENT_INTENSITY: &str = "LIGHT_AMBIENT_INTENSITY";
pub const LIGHT_ATTENUATION: &str = "LIGHT_ATTENUATION";
pub const SHADOW_MAPS: &str = "SHADOW_MAPS";
pub const SHADOW_MATRIX: &str = "SHADOW_MATRIX";

// ===== DEFERRED COMPOSITE =====

pub const G_DIFFUSE_TEX: &str = "G_DIFFUSE_TEX";
pub const G_POSITION_TEX: &str = "G_POSITION_TEX";
pub const G_NORMAL_TEX: &str = "G_NORMAL_TEX";

// ===== ATTRIBUTES =====

pub const VERTEX_POSITION: &str = "VERTEX_POSITION";
pub const VERTEX_UV_0: &str = "VERTEX_UV_0";
pub const VERTEX_NORMAL: &str = "VERTEX_NORMAL";
pub const VERTEX_TANGENT: &str = "VERTEX_TANGENT";
pub const VERTEX_BONE_IDS: &str = "VERTEX_BONE_IDS";
pub const VERTEX_BONE_WEIGHTS: &str = "VERTEX_BONE_WEIGHTS";

/// Name of element `index` of a uniform array, e.g. `LIGHT_POSITION[2]`
pub fn indexed(base: &str, index: usize) -> String {
    format!("{}[{}]", base, index)
}
