//! The scene build artifact consumed by every renderer.

use std::path::PathBuf;

use tracing::debug;

use crate::error::SceneError;
use crate::store::{MaterialStore, NodeStore};
use crate::types::SdfHandle;

pub const DEFAULT_MAX_DEPTH: usize = 512;

#[derive(Debug, Clone, PartialEq)]
pub struct ImageSpec {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Edge length of the square tiles the frame is split into.
    pub tile_size: u32,
}

impl Default for ImageSpec {
    fn default() -> Self {
        Self { path: PathBuf::from("output.png"), width: 1920, height: 1080, tile_size: 32 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererSpec {
    pub samples_per_pixel: u32,
}

impl Default for RendererSpec {
    fn default() -> Self {
        Self { samples_per_pixel: 2 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneLimits {
    /// Longest root-to-leaf chain accepted. `None` disables the check.
    pub max_depth: Option<usize>,
}

impl Default for SceneLimits {
    fn default() -> Self {
        Self { max_depth: Some(DEFAULT_MAX_DEPTH) }
    }
}

impl SceneLimits {
    #[must_use]
    pub const fn unbounded() -> Self {
        Self { max_depth: None }
    }

    #[must_use]
    pub const fn with_max_depth(depth: usize) -> Self {
        Self { max_depth: Some(depth) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneStats {
    pub nodes: usize,
    pub materials: usize,
    /// Nodes on the longest path from the root to a leaf.
    pub depth: usize,
}

/// Read-only scene handed to the renderers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TpmSpec {
    pub image: ImageSpec,
    pub renderer: RendererSpec,
    pub nodes: NodeStore,
    pub materials: MaterialStore,
    /// Entry node; the last node is used when unset.
    pub root: Option<SdfHandle>,
}

impl TpmSpec {
    pub fn root(&self) -> Result<SdfHandle, SceneError> {
        let root = self.root.or_else(|| self.nodes.last()).ok_or(SceneError::MissingRoot)?;
        if self.nodes.get(root).is_none() {
            return Err(SceneError::MissingRoot);
        }
        Ok(root)
    }

    /// Checks references and depth.
    ///
    /// Every child must exist and precede its parent, and every material must
    /// exist. The depth is measured from the root only.
    pub fn validate(&self, limits: &SceneLimits) -> Result<SceneStats, SceneError> {
        let mut depths = vec![0usize; self.nodes.len()];
        for (handle, node) in self.nodes.iter() {
            if let Some(material) = node.material {
                if self.materials.get(material).is_none() {
                    return Err(SceneError::DanglingMaterial { node: handle, material });
                }
            }
            let (a, b) = node.children();
            let mut depth = 1;
            for child in [a, b].into_iter().flatten() {
                if child.index() >= self.nodes.len() {
                    return Err(SceneError::DanglingNode { node: handle, child });
                }
                if child >= handle {
                    return Err(SceneError::ForwardReference { node: handle, child });
                }
                depth = depth.max(depths[child.index()] + 1);
            }
            depths[handle.index()] = depth;
        }

        let root = self.root()?;
        let depth = depths[root.index()];
        if let Some(limit) = limits.max_depth {
            if depth > limit {
                return Err(SceneError::TooDeep { depth, limit });
            }
        }

        let stats = SceneStats { nodes: self.nodes.len(), materials: self.materials.len(), depth };
        debug!(
            target: "tpm::scene",
            "Validated scene: {} nodes, {} materials, depth {}",
            stats.nodes,
            stats.materials,
            stats.depth
        );
        Ok(stats)
    }
}
