/// RenderableGraph - arena of transform nodes and the cores they share.
///
/// Nodes and cores live in two `SlotMap`s; parent/child links and core
/// references are keys. Cloning a node allocates new nodes but reuses the
/// core key, so GPU buffers are never duplicated and core edits are seen by
/// every clone.
///
/// Exactly one node owns each core's GPU resources (the node created by a
/// constructor). Destroying a clone only frees its arena slot; destroying
/// the owner releases the buffers and marks the core destroyed.

use glam::Mat4;
use slotmap::SlotMap;
use crate::engine_err;
use crate::error::Result;
use crate::graphics_provider::GraphicsProvider;
use super::aabb::AABB;
use super::renderable::{
    Renderable, RenderableCore, RenderableCoreKey, RenderableFlags, RenderableKey,
};

const SOURCE: &str = "stellar3d::RenderableGraph";

/// Transform graph
#[derive(Debug, Default)]
pub struct RenderableGraph {
    nodes: SlotMap<RenderableKey, Renderable>,
    cores: SlotMap<RenderableCoreKey, RenderableCore>,
}

impl RenderableGraph {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            cores: SlotMap::with_key(),
        }
    }

    // ===== CONSTRUCTION =====

    /// Insert a drawable node owning `core`
    pub fn create_renderable(&mut self, mut core: RenderableCore) -> RenderableKey {
        core.users = 1;
        let core_key = self.cores.insert(core);
        self.nodes.insert(Renderable::new(core_key, true))
    }

    /// Insert a group node: it has no geometry and only draws its children
    pub fn create_group(&mut self) -> RenderableKey {
        let key = self.create_renderable(RenderableCore::default());
        if let Some(node) = self.nodes.get_mut(key) {
            node.flags.insert(RenderableFlags::GROUP);
        }
        key
    }

    /// Copy a subtree: transforms and flags are duplicated, cores are shared
    ///
    /// The copy has no parent. Returns `None` if `key` is invalid.
    pub fn clone_renderable(&mut self, key: RenderableKey) -> Option<RenderableKey> {
        let source = self.nodes.get(key)?;
        let mut copy = source.clone();
        let children = std::mem::take(&mut copy.children);
        copy.parent = None;
        copy.owns_core = false;

        if let Some(core) = self.cores.get_mut(copy.core) {
            core.users += 1;
        }
        let copy_key = self.nodes.insert(copy);

        for child in children {
            if let Some(child_copy) = self.clone_renderable(child) {
                self.link(copy_key, child_copy);
            }
        }
        Some(copy_key)
    }

    // ===== HIERARCHY =====

    /// Append `child` to `parent`'s children
    ///
    /// A child already attached elsewhere is detached first. The caller
    /// guarantees the graph stays acyclic; debug builds assert it.
    /// Returns false if either key is invalid.
    pub fn add_child(&mut self, parent: RenderableKey, child: RenderableKey) -> bool {
        if parent == child || !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return false;
        }
        debug_assert!(
            !self.is_ancestor(child, parent),
            "add_child would make a node its own ancestor"
        );

        if let Some(old_parent) = self.nodes[child].parent {
            self.unlink(old_parent, child);
        }
        self.link(parent, child);
        true
    }

    /// Detach `child` from `parent`; the child becomes a root
    ///
    /// Returns false if `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: RenderableKey, child: RenderableKey) -> bool {
        match self.nodes.get(child) {
            Some(node) if node.parent == Some(parent) => {
                self.unlink(parent, child);
                true
            }
            _ => false,
        }
    }

    /// Whether `ancestor` is `node` or lies on its parent chain
    pub fn is_ancestor(&self, ancestor: RenderableKey, node: RenderableKey) -> bool {
        let mut current = Some(node);
        let mut steps = 0;
        while let Some(key) = current {
            if key == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                break;
            }
            current = self.nodes.get(key).and_then(|n| n.parent);
        }
        false
    }

    fn link(&mut self, parent: RenderableKey, child: RenderableKey) {
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
    }

    fn unlink(&mut self, parent: RenderableKey, child: RenderableKey) {
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.retain(|&k| k != child);
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = None;
        }
    }

    // ===== ACCESS =====

    pub fn get(&self, key: RenderableKey) -> Option<&Renderable> {
        self.nodes.get(key)
    }

    pub fn get_mut(&mut self, key: RenderableKey) -> Option<&mut Renderable> {
        self.nodes.get_mut(key)
    }

    /// Core shared by `key` and its clones
    pub fn core(&self, key: RenderableKey) -> Option<&RenderableCore> {
        self.nodes.get(key).and_then(|node| self.cores.get(node.core))
    }

    /// Mutable core; edits are visible through every clone
    pub fn core_mut(&mut self, key: RenderableKey) -> Option<&mut RenderableCore> {
        let core_key = self.nodes.get(key)?.core;
        self.cores.get_mut(core_key)
    }

    pub fn contains(&self, key: RenderableKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of live cores
    pub fn core_count(&self) -> usize {
        self.cores.len()
    }

    /// Nodes without a parent
    pub fn roots(&self) -> impl Iterator<Item = RenderableKey> + '_ {
        self.nodes.iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(key, _)| key)
    }

    pub fn parent(&self, key: RenderableKey) -> Option<RenderableKey> {
        self.nodes.get(key).and_then(|node| node.parent)
    }

    pub fn children(&self, key: RenderableKey) -> &[RenderableKey] {
        self.nodes.get(key).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    pub fn is_visible(&self, key: RenderableKey) -> bool {
        self.nodes.get(key).is_some_and(|node| node.is_visible())
    }

    pub fn set_visible(&mut self, key: RenderableKey, visible: bool) -> bool {
        match self.nodes.get_mut(key) {
            Some(node) => {
                node.flags.set(RenderableFlags::VISIBLE, visible);
                true
            }
            None => false,
        }
    }

    pub fn is_group(&self, key: RenderableKey) -> bool {
        self.nodes.get(key).is_some_and(|node| node.is_group())
    }

    // ===== TRANSFORMS =====

    /// Transform of the node relative to its parent
    pub fn local_transform(&self, key: RenderableKey) -> Option<Mat4> {
        self.nodes.get(key).map(|node| node.local_transform())
    }

    /// Parent world transform composed with the node's local transform
    pub fn world_transform(&self, key: RenderableKey) -> Option<Mat4> {
        let node = self.nodes.get(key)?;
        let mut world = node.local_transform();
        let mut parent = node.parent;
        while let Some(parent_key) = parent {
            let parent_node = match self.nodes.get(parent_key) {
                Some(parent_node) => parent_node,
                None => break,
            };
            world = parent_node.local_transform() * world;
            parent = parent_node.parent;
        }
        Some(world)
    }

    /// World-space box enclosing every drawable node of the subtree
    ///
    /// Follows the draw traversal: hidden subtrees, groups, destroyed cores
    /// and cores without faces contribute nothing. `None` when nothing is left.
    pub fn world_bounds(&self, key: RenderableKey) -> Option<AABB> {
        let parent_world = match self.nodes.get(key)?.parent {
            Some(parent) => self.world_transform(parent).unwrap_or(Mat4::IDENTITY),
            None => Mat4::IDENTITY,
        };

        let mut bounds: Option<AABB> = None;
        let mut stack = vec![(key, parent_world)];
        while let Some((current, parent_world)) = stack.pop() {
            let node = match self.nodes.get(current) {
                Some(node) if node.is_visible() => node,
                _ => continue,
            };
            let world = parent_world * node.local_transform();
            let drawable = !node.is_group()
                && self.cores.get(node.core)
                    .is_some_and(|core| !core.is_destroyed() && core.face_count > 0);
            if drawable {
                let moved = node.bounding_box.transformed(&world);
                bounds = Some(bounds.map_or(moved, |acc| acc.union(&moved)));
            }
            stack.extend(node.children.iter().map(|child| (*child, world)));
        }
        bounds
    }

    // ===== TRAVERSAL =====

    /// Keys of the subtree rooted at `key`, pre-order, siblings in insertion order
    pub fn subtree(&self, key: RenderableKey) -> Vec<RenderableKey> {
        let mut keys = Vec::new();
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(current) {
                keys.push(current);
                stack.extend(node.children.iter().rev());
            }
        }
        keys
    }

    /// Apply `f` to `key` then to its descendants, pre-order
    pub fn map<F>(&mut self, key: RenderableKey, mut f: F)
    where
        F: FnMut(RenderableKey, &mut Renderable),
    {
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current) {
                f(current, node);
                stack.extend(node.children.iter().rev());
            }
        }
    }

    /// Whether the node's own core carries a skeleton
    pub fn has_skeleton(&self, key: RenderableKey) -> bool {
        self.core(key).is_some_and(|core| core.skeleton.is_some())
    }

    /// Whether any node of the subtree carries a skeleton
    pub fn has_skeleton_deep(&self, key: RenderableKey) -> bool {
        self.subtree(key).into_iter().any(|k| self.has_skeleton(k))
    }

    // ===== ANIMATION =====

    /// Advance the node's animation clock and re-evaluate its skeleton pose
    ///
    /// The clock loops over the clip duration. Nodes without a skeleton are
    /// left untouched. Clones share the core, hence the pose: give a clone
    /// its own `Skeleton::clone_pose_instance` to animate it independently.
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if the key or the clip index is invalid
    pub fn update_animation(&mut self, key: RenderableKey, animation_index: usize, delta: f32) -> Result<()> {
        let node = self.nodes.get_mut(key)
            .ok_or_else(|| engine_err!(SOURCE, InvalidResource => "Unknown renderable {:?}", key))?;
        let skeleton = match self.cores.get_mut(node.core).and_then(|core| core.skeleton.as_mut()) {
            Some(skeleton) => skeleton,
            None => return Ok(()),
        };
        let animation = skeleton.animations().get(animation_index).ok_or_else(|| {
            engine_err!(SOURCE, InvalidResource => "animation index {} out of range", animation_index)
        })?;

        node.anim_time = animation.wrap_time(node.anim_time + delta);
        skeleton.evaluate_animation(animation_index, node.anim_time)?;
        Ok(())
    }

    // ===== DESTRUCTION =====

    /// Remove the subtree rooted at `key`
    ///
    /// Owning nodes release their core's vertex array and buffers. Cores are
    /// dropped from the arena once no node references them. Returns false if
    /// the key is invalid.
    pub fn destroy(&mut self, gfx: &mut dyn GraphicsProvider, key: RenderableKey) -> bool {
        let parent = match self.nodes.get(key) {
            Some(node) => node.parent,
            None => return false,
        };
        if let Some(parent) = parent {
            self.unlink(parent, key);
        }

        for current in self.subtree(key) {
            let node = match self.nodes.remove(current) {
                Some(node) => node,
                None => continue,
            };
            let remove_core = match self.cores.get_mut(node.core) {
                Some(core) => {
                    if node.owns_core {
                        core.release(gfx);
                    }
                    core.users = core.users.saturating_sub(1);
                    core.users == 0
                }
                None => false,
            };
            if remove_core {
                self.cores.remove(node.core);
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "renderable_graph_tests.rs"]
mod tests;
