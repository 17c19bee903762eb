/// Axis-aligned bounding box
///
/// Renderables store their box in local space (unscaled, unrotated);
/// `RenderableGraph::world_bounds` moves it into world space on demand.

use glam::{Mat4, Vec3};

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AABB {
    pub min: Vec3,
    pub max: Vec3,
}

impl AABB {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing every point
    ///
    /// Returns a zero-sized box at the origin when `points` is empty.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut iter = points.into_iter();
        let first = match iter.next() {
            Some(point) => *point,
            None => return Self::default(),
        };
        iter.fold(Self { min: first, max: first }, |bbox, point| Self {
            min: bbox.min.min(*point),
            max: bbox.max.max(*point),
        })
    }

    /// Box enclosing both boxes
    pub fn union(&self, other: &AABB) -> AABB {
        AABB {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Box enclosing the eight corners once moved by `matrix`
    pub fn transformed(&self, matrix: &Mat4) -> AABB {
        let corners: [Vec3; 8] = std::array::from_fn(|i| {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            matrix.transform_point3(corner)
        });
        AABB::from_points(&corners)
    }
}

#[cfg(test)]
#[path = "aabb_tests.rs"]
mod tests;
