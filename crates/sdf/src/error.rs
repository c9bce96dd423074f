use std::path::PathBuf;

use thiserror::Error;

use crate::types::{MaterialHandle, SdfHandle};

/// Everything that can be wrong with a scene before it is rendered.
///
/// Evaluation itself never fails; these are raised while loading or
/// validating a scene.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("node {node} references missing node {child}")]
    DanglingNode { node: SdfHandle, child: SdfHandle },
    #[error("node {node} references missing material {material}")]
    DanglingMaterial { node: SdfHandle, material: MaterialHandle },
    #[error("node {node} references node {child}, which is not defined before it")]
    ForwardReference { node: SdfHandle, child: SdfHandle },
    #[error("scene has no root node")]
    MissingRoot,
    #[error("scene is {depth} nodes deep, the limit is {limit}")]
    TooDeep { depth: usize, limit: usize },
    #[error("unknown node type `{0}`")]
    UnknownNodeType(String),
    #[error("unknown material type `{0}`")]
    UnknownMaterialType(String),
    #[error("invalid color `{0}`, expected #rrggbb")]
    InvalidColor(String),
    #[error("scene file {0} not found")]
    SceneNotFound(PathBuf),
    #[error("failed to parse scene: {0}")]
    Parse(String),
    #[error("scene description has no `scene` element")]
    SceneMissing,
    #[error("invalid animation: {0}")]
    InvalidAnimation(String),
}
