//! Skeletal animation module
//!
//! Keyframed animation clips and the skeleton pose evaluator that turns a
//! clip + time into the per-bone matrices uploaded for GPU skinning.

mod animation;
mod skeleton;

pub use animation::{
    Animation, AnimationChannel, Keyframe, VecKey, QuatKey,
    sample_keys,
};
pub use skeleton::{Bone, Skeleton, NO_PARENT, MAX_BONES};
