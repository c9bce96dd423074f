//! Device buffer layouts for `tpm.wgsl`.
//!
//! Every type is `Pod` and laid out in 16 byte groups so the same bytes are
//! valid for both WGSL storage and uniform address spaces.

use bytemuck::{Pod, Zeroable};
use sdf::{Material, SdfNode, TpmSpec};

use crate::camera::CameraInstance;

/// Marks an absent handle in [`NodeGpu`].
pub const NO_HANDLE: u32 = u32::MAX;

/// One scene node.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct NodeGpu {
    pub params: [f32; 4],
    /// [`sdf::NodeKind`] discriminant.
    pub kind: u32,
    pub material: u32,
    pub child_a: u32,
    pub child_b: u32,
}

impl From<&SdfNode> for NodeGpu {
    fn from(node: &SdfNode) -> Self {
        let (a, b) = node.children();
        Self {
            params: node.params(),
            kind: node.kind() as u32,
            material: node.material.map_or(NO_HANDLE, |m| m.0),
            child_a: a.map_or(NO_HANDLE, |h| h.0),
            child_b: b.map_or(NO_HANDLE, |h| h.0),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialGpu {
    pub color: [f32; 4],
    pub kind: u32,
    pub _pad: u32,
    pub params: [f32; 2],
}

impl From<&Material> for MaterialGpu {
    fn from(material: &Material) -> Self {
        Self {
            color: material.color.extend(0.0).to_array(),
            kind: material.kind.code(),
            _pad: 0,
            params: material.params,
        }
    }
}

/// Per-dispatch constants.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct FrameUniform {
    /// Camera basis; `right.w` holds the film scale.
    pub right: [f32; 4],
    pub up: [f32; 4],
    pub forward: [f32; 4],
    pub eye: [f32; 4],
    pub background: [f32; 4],
    /// `(width, height, samples_per_pixel, frame_seed)`.
    pub dims: [u32; 4],
    /// `(root, node_count, first_row, row_count)`.
    pub range: [u32; 4],
    /// `(max_t, epsilon, 0, 0)`.
    pub march: [f32; 4],
}

impl FrameUniform {
    #[must_use]
    pub fn new(
        camera: &CameraInstance,
        dims: [u32; 4],
        range: [u32; 4],
        march: &sdf::MarchConfig,
    ) -> Self {
        Self {
            right: camera.right.extend(camera.scale).to_array(),
            up: camera.up.extend(0.0).to_array(),
            forward: camera.forward.extend(0.0).to_array(),
            eye: camera.eye.extend(0.0).to_array(),
            background: march.background.extend(0.0).to_array(),
            dims,
            range,
            march: [march.max_t, march.epsilon, 0.0, 0.0],
        }
    }
}

/// Flattens the node and material stores.
///
/// Empty stores get one zeroed element so every binding stays non-empty.
#[must_use]
pub fn pack_scene(spec: &TpmSpec) -> (Vec<NodeGpu>, Vec<MaterialGpu>) {
    let mut nodes: Vec<NodeGpu> = spec.nodes.as_slice().iter().map(NodeGpu::from).collect();
    let mut materials: Vec<MaterialGpu> =
        spec.materials.as_slice().iter().map(MaterialGpu::from).collect();
    if nodes.is_empty() {
        nodes.push(NodeGpu::zeroed());
    }
    if materials.is_empty() {
        materials.push(MaterialGpu::zeroed());
    }
    (nodes, materials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use sdf::{MaterialKind, SceneBuilder};

    #[test]
    fn layouts_match_wgsl_sizes() {
        assert_eq!(std::mem::size_of::<NodeGpu>(), 32);
        assert_eq!(std::mem::size_of::<MaterialGpu>(), 32);
        assert_eq!(std::mem::size_of::<FrameUniform>(), 128);
    }

    #[test]
    fn packing_keeps_handles_and_tags() {
        let mut b = SceneBuilder::new();
        let glow = b.material(MaterialKind::Emission, Vec3::new(0.5, 0.25, 1.0), [2.0, 0.0]);
        let s = b.sphere(1.5);
        let c = b.cuboid(Vec3::ONE);
        let u = b.union(s, c);
        let u = b.with_material(u, glow);
        let spec = b.build(u);

        let (nodes, materials) = pack_scene(&spec);
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].params[0], 1.5);
        assert_eq!(nodes[0].child_a, NO_HANDLE);
        assert_eq!(nodes[2].kind, sdf::NodeKind::Union as u32);
        assert_eq!((nodes[2].child_a, nodes[2].child_b), (0, 1));
        assert_eq!(nodes[2].material, 0);
        assert_eq!(materials[0].kind, 1);
        assert_eq!(materials[0].color, [0.5, 0.25, 1.0, 0.0]);
    }

    #[test]
    fn empty_scene_packs_placeholders() {
        let (nodes, materials) = pack_scene(&TpmSpec::default());
        assert_eq!((nodes.len(), materials.len()), (1, 1));
    }
}
