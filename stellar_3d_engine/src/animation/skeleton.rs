/// Skeleton - shared bone hierarchy plus per-instance pose buffers.
///
/// The bone list and the animation clips are immutable and shared (`Rc`)
/// between every instance cloned from the same skeleton. The three pose
/// arrays are owned by the instance and rewritten by each evaluation.
///
/// Pose evaluation, in order:
/// 1. local transforms from the clip channels (bind transform when a bone has no channel)
/// 2. global transforms by walking parent links up to a root
/// 3. pose transforms depth-first from the roots:
///    `pose = clip.root_transform * global * bone.offset`
///
/// Bone data is not guaranteed acyclic. A bone parented to itself (or any
/// longer cycle) ends the parent walk and is never reached from a root;
/// its pose stays identity.

use std::rc::Rc;
use glam::Mat4;
use crate::error::Result;
use super::animation::Animation;

const SOURCE: &str = "stellar3d::Skeleton";

/// Parent id of a root bone
pub const NO_PARENT: i32 = -1;

/// Size of the bone matrix array uploaded to shaders
pub const MAX_BONES: usize = 64;

/// One bone of the hierarchy
#[derive(Debug, Clone)]
pub struct Bone {
    /// Must equal the bone's index in the skeleton
    pub id: i32,
    pub name: String,
    /// Parent bone id, or `NO_PARENT`
    pub parent: i32,
    /// Bind offset: model space -> bone space at rest
    pub offset: Mat4,
    /// Static local transform used when a clip has no channel for this bone
    pub transform: Mat4,
}

impl Bone {
    /// Create a bone with identity offset and bind transform
    pub fn new(id: i32, name: impl Into<String>, parent: i32) -> Self {
        Self {
            id,
            name: name.into(),
            parent,
            offset: Mat4::IDENTITY,
            transform: Mat4::IDENTITY,
        }
    }

    /// Whether the bone is a root
    pub fn is_root(&self) -> bool {
        self.parent == NO_PARENT
    }

    fn parent_index(&self) -> Option<usize> {
        if self.parent < 0 {
            None
        } else {
            Some(self.parent as usize)
        }
    }
}

/// Bone hierarchy and current animation pose
#[derive(Debug, Clone)]
pub struct Skeleton {
    bones: Rc<[Bone]>,
    animations: Rc<[Animation]>,
    local_transforms: Vec<Mat4>,
    global_transforms: Vec<Mat4>,
    pose_transforms: Vec<Mat4>,
}

impl Skeleton {
    /// Build a skeleton from decoded bones and clips
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if a bone id does not match its index or a
    /// parent id is neither `NO_PARENT` nor a valid bone index.
    pub fn new(bones: Vec<Bone>, animations: Vec<Animation>) -> Result<Self> {
        let count = bones.len();
        for (index, bone) in bones.iter().enumerate() {
            if bone.id != index as i32 {
                crate::engine_bail!(SOURCE, InvalidResource =>
                    "bone '{}' has id {} but sits at index {}", bone.name, bone.id, index);
            }
            if bone.parent != NO_PARENT && (bone.parent < 0 || bone.parent as usize >= count) {
                crate::engine_bail!(SOURCE, InvalidResource =>
                    "bone '{}' has invalid parent id {}", bone.name, bone.parent);
            }
            if bone.parent == bone.id {
                crate::engine_warn!(SOURCE,
                    "Bone '{}' ({}) is parented to itself", bone.name, bone.id);
            }
        }

        Ok(Self {
            bones: bones.into(),
            animations: animations.into(),
            local_transforms: vec![Mat4::IDENTITY; count],
            global_transforms: vec![Mat4::IDENTITY; count],
            pose_transforms: vec![Mat4::IDENTITY; count],
        })
    }

    /// New instance sharing bones and clips but owning fresh pose buffers
    pub fn clone_pose_instance(&self) -> Self {
        let count = self.bones.len();
        Self {
            bones: Rc::clone(&self.bones),
            animations: Rc::clone(&self.animations),
            local_transforms: vec![Mat4::IDENTITY; count],
            global_transforms: vec![Mat4::IDENTITY; count],
            pose_transforms: vec![Mat4::IDENTITY; count],
        }
    }

    // ===== ACCESSORS =====

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    /// Whether two skeletons share the same bone list allocation
    pub fn shares_bones_with(&self, other: &Skeleton) -> bool {
        Rc::ptr_eq(&self.bones, &other.bones)
    }

    /// Bone by name
    pub fn find_bone(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|bone| bone.name == name)
    }

    /// Index of the clip with the given name
    pub fn find_animation(&self, name: &str) -> Option<usize> {
        self.animations.iter().position(|anim| anim.name == name)
    }

    pub fn local_transforms(&self) -> &[Mat4] {
        &self.local_transforms
    }

    pub fn global_transforms(&self) -> &[Mat4] {
        &self.global_transforms
    }

    /// Final skinning matrices from the last evaluation
    pub fn pose_transforms(&self) -> &[Mat4] {
        &self.pose_transforms
    }

    // ===== EVALUATION =====

    /// Evaluate the clip at `animation_index` at `time`
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if the index is out of range
    pub fn evaluate_animation(&mut self, animation_index: usize, time: f32) -> Result<&[Mat4]> {
        let animations = Rc::clone(&self.animations);
        let animation = animations.get(animation_index).ok_or_else(|| {
            crate::engine_err!(SOURCE, InvalidResource =>
                "animation index {} out of range ({} clips)", animation_index, animations.len())
        })?;
        Ok(self.evaluate_pose(animation, time))
    }

    /// Evaluate `animation` at `time` and return the pose transforms
    pub fn evaluate_pose(&mut self, animation: &Animation, time: f32) -> &[Mat4] {
        self.compute_local_transforms(animation, time);
        self.compute_global_transforms();
        self.compute_pose_transforms(animation);
        &self.pose_transforms
    }

    fn compute_local_transforms(&mut self, animation: &Animation, time: f32) {
        for (index, bone) in self.bones.iter().enumerate() {
            self.local_transforms[index] = match animation.channel_for_bone(bone.id) {
                Some(channel) => channel.local_transform(time),
                None => bone.transform,
            };
        }
    }

    fn compute_global_transforms(&mut self) {
        let count = self.bones.len();
        for index in 0..count {
            let mut accumulated = self.local_transforms[index];
            let mut current = index;
            // A valid chain has fewer than `count` links; anything longer is a cycle
            for _ in 0..count {
                let parent = match self.bones[current].parent_index() {
                    Some(parent) if parent != current => parent,
                    _ => break,
                };
                accumulated = self.local_transforms[parent] * accumulated;
                current = parent;
            }
            self.global_transforms[index] = accumulated;
        }
    }

    fn compute_pose_transforms(&mut self, animation: &Animation) {
        self.pose_transforms.fill(Mat4::IDENTITY);

        let mut stack: Vec<usize> = self.bones.iter()
            .filter(|bone| bone.is_root())
            .map(|bone| bone.id as usize)
            .collect();
        stack.reverse();

        while let Some(index) = stack.pop() {
            let bone = &self.bones[index];
            self.pose_transforms[index] =
                animation.root_transform * self.global_transforms[index] * bone.offset;

            // Push children in reverse so they pop in declaration order
            let children_start = stack.len();
            for child in self.bones.iter() {
                if child.parent == bone.id && child.id != bone.id {
                    stack.push(child.id as usize);
                }
            }
            stack[children_start..].reverse();
        }
    }
}

#[cfg(test)]
#[path = "skeleton_tests.rs"]
mod tests;
