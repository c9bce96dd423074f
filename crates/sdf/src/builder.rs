//! # Scene Builder
//!
//! Convenience methods for assembling a [`TpmSpec`] in code. Every operator
//! takes handles returned by earlier calls, so scenes built this way always
//! satisfy the children-before-parents rule.

use glam::Vec3;

use crate::spec::{ImageSpec, RendererSpec, TpmSpec};
use crate::types::{Material, MaterialHandle, MaterialKind, SdfHandle, SdfNode, Shape};

#[derive(Debug, Clone, Default)]
pub struct SceneBuilder {
    spec: TpmSpec,
}

impl SceneBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn image(mut self, image: ImageSpec) -> Self {
        self.spec.image = image;
        self
    }

    #[must_use]
    pub fn renderer(mut self, renderer: RendererSpec) -> Self {
        self.spec.renderer = renderer;
        self
    }

    pub fn material(
        &mut self,
        kind: MaterialKind,
        color: Vec3,
        params: [f32; 2],
    ) -> MaterialHandle {
        self.spec.materials.push(Material::new(kind, color, params))
    }

    pub fn sphere(&mut self, radius: f32) -> SdfHandle {
        self.spec.nodes.push(SdfNode::new(Shape::Sphere { radius }))
    }

    pub fn cuboid(&mut self, half_extents: Vec3) -> SdfHandle {
        self.spec.nodes.push(SdfNode::new(Shape::Box { half_extents }))
    }

    pub fn translate(&mut self, offset: Vec3, child: SdfHandle) -> SdfHandle {
        self.spec.nodes.push(SdfNode::new(Shape::Translate { offset, child }))
    }

    pub fn union(&mut self, a: SdfHandle, b: SdfHandle) -> SdfHandle {
        self.spec.nodes.push(SdfNode::new(Shape::Union { a, b }))
    }

    /// Assigns `material` to `node` and returns the same handle.
    pub fn with_material(&mut self, node: SdfHandle, material: MaterialHandle) -> SdfHandle {
        self.spec.nodes.set_material(node, Some(material));
        node
    }

    #[must_use]
    pub fn build(mut self, root: SdfHandle) -> TpmSpec {
        self.spec.root = Some(root);
        self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::SceneLimits;

    #[test]
    fn built_scene_validates() {
        let mut b = SceneBuilder::new();
        let glow = b.material(MaterialKind::Emission, Vec3::ONE, [1.0, 0.0]);
        let s = b.sphere(1.0);
        let c = b.cuboid(Vec3::splat(0.5));
        let s = b.with_material(s, glow);
        let t = b.translate(Vec3::new(0.0, 0.0, 5.0), c);
        let u = b.union(s, t);
        let spec = b.build(u);

        assert_eq!(spec.root(), Ok(u));
        let stats = spec.validate(&SceneLimits::default()).unwrap();
        assert_eq!(stats.nodes, 4);
        assert_eq!(stats.materials, 1);
        assert_eq!(stats.depth, 3);
        assert_eq!(spec.nodes.get(s).and_then(|n| n.material), Some(glow));
    }
}
