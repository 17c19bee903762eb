/// Shader binding protocol: one node + one shader -> one indexed draw.
///
/// Every value the engine knows about is offered to the shader by name. A
/// variable the program does not declare resolves to location -1 and is
/// skipped, so shaders with different feature sets share this one routine.
///
/// Texture units are handed out from 0 in a fixed order, only to sampler
/// uniforms the shader declares: DIFFUSE_TEX, NORMALS_TEX, SPECULAR_TEX,
/// one SHADOW_MAPS[i] per active light, then whatever the custom binder takes.

use glam::Mat4;
use crate::animation::MAX_BONES;
use crate::engine_warn;
use crate::graphics_provider::{
    AttributeLayout, AttributeType, BufferTarget, GraphicsProvider, TextureHandle, VertexArrayHandle,
};
use crate::scene::{AttributeSource, Renderable, RenderableGraph, RenderableKey, VertexBuffers};
use crate::shader::{names, RenderShader};
use super::light::{LightProvider, MAX_LIGHTS};
use super::renderer::DrawParams;

// ===== CUSTOM BINDER =====

/// Caller hook run after the standard bindings, before the index buffer bind
///
/// `next_texture_unit` is the first unit not used by the standard bindings;
/// a binder taking units must advance it.
pub trait RenderBinder {
    fn bind(
        &mut self,
        gfx: &mut dyn GraphicsProvider,
        shader: &RenderShader,
        node: &Renderable,
        next_texture_unit: &mut u32,
    );
}

impl<F> RenderBinder for F
where
    F: FnMut(&mut dyn GraphicsProvider, &RenderShader, &Renderable, &mut u32),
{
    fn bind(
        &mut self,
        gfx: &mut dyn GraphicsProvider,
        shader: &RenderShader,
        node: &Renderable,
        next_texture_unit: &mut u32,
    ) {
        self(gfx, shader, node, next_texture_unit)
    }
}

// ===== TRAVERSAL =====

/// Draw the subtree rooted at `key` with `shader`
///
/// Invisible nodes are skipped with their whole subtree. Group nodes issue
/// no draw of their own. Every other node is drawn, then its children.
///
/// # Arguments
///
/// * `gfx` - Provider receiving the commands
/// * `graph` - Graph holding the nodes and their cores
/// * `key` - Subtree root
/// * `shader` - Linked program used for every node of the subtree
/// * `binder` - Optional per-draw hook
/// * `lights` - Light source, when the active renderer supports lighting
/// * `params` - Camera matrices and primitive mode
pub fn bind_and_draw<'b>(
    gfx: &mut dyn GraphicsProvider,
    graph: &RenderableGraph,
    key: RenderableKey,
    shader: &RenderShader,
    mut binder: Option<&mut (dyn RenderBinder + 'b)>,
    lights: Option<&dyn LightProvider>,
    params: &DrawParams,
) {
    let node = match graph.get(key) {
        Some(node) if node.is_visible() => node,
        _ => return,
    };
    if !node.is_group() {
        draw_node(gfx, graph, key, shader, binder.as_deref_mut(), lights, params);
    }
    for &child in node.children() {
        bind_and_draw(gfx, graph, child, shader, binder.as_deref_mut(), lights, params);
    }
}

/// Draw the subtree rooted at `key`, each node with its core's own shader
///
/// Nodes whose core has no shader are not drawn; their children still are.
pub fn draw_with_core_shaders(
    gfx: &mut dyn GraphicsProvider,
    graph: &RenderableGraph,
    key: RenderableKey,
    lights: Option<&dyn LightProvider>,
    params: &DrawParams,
) {
    let node = match graph.get(key) {
        Some(node) if node.is_visible() => node,
        _ => return,
    };
    if !node.is_group() {
        if let Some(shader) = graph.core(key).and_then(|core| core.shader.as_deref()) {
            draw_node(gfx, graph, key, shader, None, lights, params);
        }
    }
    for &child in node.children() {
        draw_with_core_shaders(gfx, graph, child, lights, params);
    }
}

// ===== SINGLE NODE =====

fn draw_node(
    gfx: &mut dyn GraphicsProvider,
    graph: &RenderableGraph,
    key: RenderableKey,
    shader: &RenderShader,
    binder: Option<&mut (dyn RenderBinder + '_)>,
    lights: Option<&dyn LightProvider>,
    params: &DrawParams,
) {
    let (node, core) = match (graph.get(key), graph.core(key)) {
        (Some(node), Some(core)) => (node, core),
        _ => return,
    };
    if core.is_destroyed() {
        engine_warn!("stellar3d::bind_and_draw", "Skipping a renderable whose core was destroyed");
        return;
    }
    if core.face_count == 0 {
        return;
    }

    gfx.use_program(shader.program());
    gfx.bind_vertex_array(core.vao);

    // Matrices
    let model = graph.world_transform(key).unwrap_or(Mat4::IDENTITY);
    let model_view = params.view * model;
    let model_view_projection = params.projection * model_view;
    set_mat4(gfx, shader, names::MVP_MATRIX, &model_view_projection);
    set_mat4(gfx, shader, names::MV_MATRIX, &model_view);
    set_mat4(gfx, shader, names::M_MATRIX, &model);
    set_mat4(gfx, shader, names::V_MATRIX, &params.view);

    // Material
    if let Some(location) = uniform(gfx, shader, names::MATERIAL_DIFFUSE) {
        gfx.set_uniform_vec4(location, core.material.diffuse);
    }
    if let Some(location) = uniform(gfx, shader, names::MATERIAL_SPECULAR) {
        gfx.set_uniform_vec4(location, core.material.specular);
    }
    if let Some(location) = uniform(gfx, shader, names::MATERIAL_SHININESS) {
        gfx.set_uniform_f32(location, core.material.shininess);
    }

    let mut texture_unit = 0;
    bind_sampler(gfx, shader, names::DIFFUSE_TEX, core.textures.diffuse, &mut texture_unit);
    bind_sampler(gfx, shader, names::NORMALS_TEX, core.textures.normals, &mut texture_unit);
    bind_sampler(gfx, shader, names::SPECULAR_TEX, core.textures.specular, &mut texture_unit);

    // Skinning
    if let Some(skeleton) = &core.skeleton {
        if let Some(location) = uniform(gfx, shader, names::BONES) {
            let poses = skeleton.pose_transforms();
            gfx.set_uniform_mat4_array(location, &poses[..poses.len().min(MAX_BONES)]);
        }
    }

    if let Some(location) = uniform(gfx, shader, names::CAMERA_WORLD_POSITION) {
        gfx.set_uniform_vec3(location, params.view.inverse().w_axis.truncate());
    }

    if let Some(lights) = lights {
        bind_lights(gfx, shader, lights, &params.light_view, &mut texture_unit);
    }

    bind_attributes(gfx, shader, &core.buffers);

    if let Some(binder) = binder {
        binder.bind(gfx, shader, node, &mut texture_unit);
    }

    gfx.bind_buffer(BufferTarget::ElementArray, core.buffers.elements);
    gfx.draw_elements(params.mode, core.index_count(params.mode));
    gfx.bind_vertex_array(VertexArrayHandle::NONE);
}

// ===== HELPERS =====

/// Location of a declared uniform, `None` when the shader lacks it
fn uniform(gfx: &mut dyn GraphicsProvider, shader: &RenderShader, name: &str) -> Option<i32> {
    let location = shader.uniform_location(gfx, name);
    (location >= 0).then_some(location)
}

fn set_mat4(gfx: &mut dyn GraphicsProvider, shader: &RenderShader, name: &str, value: &Mat4) {
    if let Some(location) = uniform(gfx, shader, name) {
        gfx.set_uniform_mat4(location, value);
    }
}

/// Bind `texture` to the next unit if the shader declares the sampler
fn bind_sampler(
    gfx: &mut dyn GraphicsProvider,
    shader: &RenderShader,
    name: &str,
    texture: TextureHandle,
    texture_unit: &mut u32,
) {
    if let Some(location) = uniform(gfx, shader, name) {
        gfx.active_texture(*texture_unit);
        gfx.bind_texture_2d(texture);
        gfx.set_uniform_i32(location, *texture_unit as i32);
        *texture_unit += 1;
    }
}

fn bind_lights(
    gfx: &mut dyn GraphicsProvider,
    shader: &RenderShader,
    lights: &dyn LightProvider,
    view: &Mat4,
    texture_unit: &mut u32,
) {
    let count = lights.active_light_count().min(MAX_LIGHTS);
    if let Some(location) = uniform(gfx, shader, names::LIGHT_COUNT) {
        gfx.set_uniform_i32(location, count as i32);
    }

    for index in 0..count {
        let light = match lights.light(index) {
            Some(light) => light,
            None => break,
        };

        // Eye-space lighting
        if let Some(location) = uniform(gfx, shader, &names::indexed(names::LIGHT_POSITION, index)) {
            gfx.set_uniform_vec3(location, view.transform_point3(light.position));
        }
        if let Some(location) = uniform(gfx, shader, &names::indexed(names::LIGHT_DIRECTION, index)) {
            gfx.set_uniform_vec3(location, view.transform_vector3(light.direction).normalize_or_zero());
        }
        if let Some(location) = uniform(gfx, shader, &names::indexed(names::LIGHT_DIFFUSE, index)) {
            gfx.set_uniform_vec3(location, light.diffuse);
        }
        if let Some(location) = uniform(gfx, shader, &names::indexed(names::LIGHT_SPECULAR, index)) {
            gfx.set_uniform_vec3(location, light.specular);
        }
        if let Some(location) = uniform(gfx, shader, &names::indexed(names::LIGHT_DIFFUSE_INTENSITY, index)) {
            gfx.set_uniform_f32(location, light.diffuse_intensity);
        }
        if let Some(location) = uniform(gfx, shader, &names::indexed(names::LIGHT_AMBIENT_INTENSITY, index)) {
            gfx.set_uniform_f32(location, light.ambient_intensity);
        }
        if let Some(location) = uniform(gfx, shader, &names::indexed(names::LIGHT_ATTENUATION, index)) {
            gfx.set_uniform_f32(location, light.attenuation);
        }

        // Some drivers fault on a declared sampler left without a texture: bind 0 instead
        let shadow_texture = light.shadow_map.map_or(TextureHandle::NONE, |shadow| shadow.texture);
        bind_sampler(gfx, shader, &names::indexed(names::SHADOW_MAPS, index), shadow_texture, texture_unit);

        if let Some(shadow) = &light.shadow_map {
            set_mat4(gfx, shader, &names::indexed(names::SHADOW_MATRIX, index), &shadow.shadow_matrix());
        }
    }
}

fn bind_attributes(gfx: &mut dyn GraphicsProvider, shader: &RenderShader, buffers: &VertexBuffers) {
    let attributes: [(&str, AttributeSource, u32, AttributeType); 6] = [
        (names::VERTEX_POSITION, buffers.position, 3, AttributeType::Float),
        (names::VERTEX_UV_0, buffers.uv, 2, AttributeType::Float),
        (names::VERTEX_NORMAL, buffers.normal, 3, AttributeType::Float),
        (names::VERTEX_TANGENT, buffers.tangent, 3, AttributeType::Float),
        (names::VERTEX_BONE_IDS, buffers.bone_ids, 4, AttributeType::UnsignedInt),
        (names::VERTEX_BONE_WEIGHTS, buffers.bone_weights, 4, AttributeType::Float),
    ];

    for (name, source, components, attribute_type) in attributes {
        let location = shader.attribute_location(gfx, name);
        if location < 0 {
            continue;
        }
        let location = location as u32;
        if !source.is_bound() {
            gfx.disable_vertex_attribute(location);
            continue;
        }
        gfx.bind_buffer(BufferTarget::Array, source.buffer);
        gfx.enable_vertex_attribute(location);
        gfx.vertex_attribute_pointer(location, &AttributeLayout {
            components,
            attribute_type,
            stride: buffers.stride,
            offset: source.offset,
        });
    }
}

#[cfg(test)]
#[path = "binding_tests.rs"]
mod tests;
