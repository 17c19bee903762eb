/// Animation clips, per-bone channels and keyframe sampling.
///
/// Sampling never extrapolates and never loops: a query past the last key
/// returns the last key, a query before the first key returns the first.
/// Looping is the caller's business (see `RenderableGraph::update_animation`).

use glam::{Mat4, Quat, Vec3};

// ===== KEYFRAMES =====

/// A timestamped keyframe that can be blended with its successor
pub trait Keyframe {
    type Value: Copy;

    /// Timestamp of the key, in animation time units
    fn time(&self) -> f32;

    /// Value stored in the key
    fn value(&self) -> Self::Value;

    /// Blend two key values, `factor` in [0, 1]
    fn blend(from: Self::Value, to: Self::Value, factor: f32) -> Self::Value;
}

/// Vector keyframe (scale or position), linearly interpolated
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VecKey {
    pub time: f32,
    pub value: Vec3,
}

impl Keyframe for VecKey {
    type Value = Vec3;

    fn time(&self) -> f32 {
        self.time
    }

    fn value(&self) -> Vec3 {
        self.value
    }

    fn blend(from: Vec3, to: Vec3, factor: f32) -> Vec3 {
        from.lerp(to, factor)
    }
}

/// Rotation keyframe, spherically interpolated along the shortest path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuatKey {
    pub time: f32,
    pub value: Quat,
}

impl Keyframe for QuatKey {
    type Value = Quat;

    fn time(&self) -> f32 {
        self.time
    }

    fn value(&self) -> Quat {
        self.value
    }

    fn blend(from: Quat, to: Quat, factor: f32) -> Quat {
        // glam's slerp flips `to` when the dot product is negative
        from.slerp(to, factor).normalize()
    }
}

/// Sample a time-ordered key list at `time`
///
/// Returns `None` for an empty list. A single key is returned unmodified
/// without touching the interpolation arithmetic.
pub fn sample_keys<K: Keyframe>(keys: &[K], time: f32) -> Option<K::Value> {
    match keys {
        [] => None,
        [only] => Some(only.value()),
        _ => {
            // First i such that time < keys[i + 1].time
            let index = match keys.windows(2).position(|pair| time < pair[1].time()) {
                Some(index) => index,
                None => return keys.last().map(|k| k.value()),
            };
            let from = &keys[index];
            let to = &keys[index + 1];
            let delta = to.time() - from.time();
            if delta <= 0.0 {
                return Some(from.value());
            }
            let factor = ((time - from.time()) / delta).clamp(0.0, 1.0);
            Some(K::blend(from.value(), to.value(), factor))
        }
    }
}

// ===== CHANNEL =====

/// Keyframes driving one bone for the duration of a clip
#[derive(Debug, Clone, Default)]
pub struct AnimationChannel {
    /// Id (index) of the animated bone
    pub bone_id: i32,
    pub scale_keys: Vec<VecKey>,
    pub position_keys: Vec<VecKey>,
    pub rotation_keys: Vec<QuatKey>,
}

impl AnimationChannel {
    /// Bone-local transform at `time`: `Translate · Rotate · Scale`
    ///
    /// A missing key list falls back to the identity component.
    pub fn local_transform(&self, time: f32) -> Mat4 {
        let scale = sample_keys(&self.scale_keys, time).unwrap_or(Vec3::ONE);
        let position = sample_keys(&self.position_keys, time).unwrap_or(Vec3::ZERO);
        let rotation = sample_keys(&self.rotation_keys, time).unwrap_or(Quat::IDENTITY);
        Mat4::from_scale_rotation_translation(scale, rotation, position)
    }
}

// ===== CLIP =====

/// A named animation clip
///
/// Clips are immutable after load and shared between skeleton instances.
#[derive(Debug, Clone)]
pub struct Animation {
    pub name: String,
    /// Length of the clip in animation time units
    pub duration: f32,
    /// Transform applied on top of every bone's global transform
    pub root_transform: Mat4,
    /// At most one channel per bone; bones without a channel keep their bind transform
    pub channels: Vec<AnimationChannel>,
}

impl Animation {
    /// Create an empty clip
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration,
            root_transform: Mat4::IDENTITY,
            channels: Vec::new(),
        }
    }

    /// Channel animating `bone_id`, if any (linear scan, bone counts are small)
    pub fn channel_for_bone(&self, bone_id: i32) -> Option<&AnimationChannel> {
        self.channels.iter().find(|channel| channel.bone_id == bone_id)
    }

    /// Wrap a running clock into `[0, duration)`
    ///
    /// Clips with a non-positive duration always sample at 0.
    pub fn wrap_time(&self, time: f32) -> f32 {
        if self.duration > 0.0 {
            time.rem_euclid(self.duration)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
#[path = "animation_tests.rs"]
mod tests;
