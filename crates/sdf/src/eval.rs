//! Signed distance evaluation over a [`NodeStore`].

use glam::Vec3;

use crate::store::NodeStore;
use crate::types::{MaterialHandle, SdfHandle, Shape};

/// Distance from `p` to a sphere of radius `r` centred on the origin.
#[inline]
#[must_use]
pub fn sphere(p: Vec3, r: f32) -> f32 {
    p.length() - r
}

/// Distance from `p` to an origin centred box with half extents `b`.
#[inline]
#[must_use]
pub fn cuboid(p: Vec3, b: Vec3) -> f32 {
    let q = p.abs() - b;
    q.max(Vec3::ZERO).length() + q.x.max(q.y.max(q.z)).min(0.0)
}

impl NodeStore {
    /// Signed distance at `p` for the subtree rooted at `handle`, and the
    /// material of the surface that distance belongs to.
    ///
    /// A node's own material replaces the one its children report. Unions
    /// keep the closer side and prefer `a` on exact ties. Handles outside the
    /// store evaluate to `+inf` with no material.
    #[must_use]
    pub fn evaluate(&self, p: Vec3, handle: SdfHandle) -> (f32, Option<MaterialHandle>) {
        let Some(node) = self.get(handle) else {
            return (f32::INFINITY, None);
        };
        let (distance, material) = match node.shape {
            Shape::Sphere { radius } => (sphere(p, radius), None),
            Shape::Box { half_extents } => (cuboid(p, half_extents), None),
            Shape::Translate { offset, child } => self.evaluate(p - offset, child),
            Shape::Union { a, b } => {
                let (da, ma) = self.evaluate(p, a);
                let (db, mb) = self.evaluate(p, b);
                if db < da {
                    (db, mb)
                } else {
                    (da, ma)
                }
            }
        };
        (distance, node.material.or(material))
    }
}
