//! Append-only arenas for nodes and materials.
//!
//! Nothing is ever removed, so a handle stays valid for the lifetime of the
//! store it came from.

use crate::types::{Material, MaterialHandle, SdfHandle, SdfNode};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeStore {
    nodes: Vec<SdfNode>,
}

impl NodeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn push(&mut self, node: SdfNode) -> SdfHandle {
        self.nodes.push(node);
        SdfHandle((self.nodes.len() - 1) as u32)
    }

    #[must_use]
    pub fn get(&self, handle: SdfHandle) -> Option<&SdfNode> {
        self.nodes.get(handle.index())
    }

    /// Replaces the material of an existing node.
    pub fn set_material(&mut self, handle: SdfHandle, material: Option<MaterialHandle>) -> bool {
        match self.nodes.get_mut(handle.index()) {
            Some(node) => {
                node.material = material;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<SdfHandle> {
        self.nodes.len().checked_sub(1).and_then(|i| u32::try_from(i).ok()).map(SdfHandle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SdfHandle, &SdfNode)> {
        #[allow(clippy::cast_possible_truncation)]
        self.nodes.iter().enumerate().map(|(i, n)| (SdfHandle(i as u32), n))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[SdfNode] {
        &self.nodes
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialStore {
    materials: Vec<Material>,
}

impl MaterialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn push(&mut self, material: Material) -> MaterialHandle {
        self.materials.push(material);
        MaterialHandle((self.materials.len() - 1) as u32)
    }

    #[must_use]
    pub fn get(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(handle.index())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Material] {
        &self.materials
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Shape;

    #[test]
    fn handles_are_sequential_and_stable() {
        let mut store = NodeStore::new();
        let a = store.push(SdfNode::new(Shape::Sphere { radius: 1.0 }));
        let b = store.push(SdfNode::new(Shape::Sphere { radius: 2.0 }));
        assert_eq!((a, b), (SdfHandle(0), SdfHandle(1)));
        assert_eq!(store.last(), Some(b));
        assert_eq!(store.get(a).map(|n| n.shape), Some(Shape::Sphere { radius: 1.0 }));
        assert!(store.get(SdfHandle(2)).is_none());
    }

    #[test]
    fn empty_store_has_no_last() {
        assert_eq!(NodeStore::new().last(), None);
        assert!(MaterialStore::new().is_empty());
    }

    #[test]
    fn set_material_rejects_unknown_handle() {
        let mut store = NodeStore::new();
        let a = store.push(SdfNode::new(Shape::Sphere { radius: 1.0 }));
        assert!(store.set_material(a, Some(MaterialHandle(0))));
        assert!(!store.set_material(SdfHandle(9), None));
        assert_eq!(store.get(a).and_then(|n| n.material), Some(MaterialHandle(0)));
    }
}
