//! Scene node and material definitions.

use std::fmt;

use glam::Vec3;

/// Index of a node in a [`crate::NodeStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SdfHandle(pub u32);

/// Index of a material in a [`crate::MaterialStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaterialHandle(pub u32);

impl SdfHandle {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl MaterialHandle {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SdfHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for MaterialHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// Geometry of a node. Leaves carry no children; operators reference earlier nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Sphere { radius: f32 },
    /// Axis aligned box centred on the origin.
    Box { half_extents: Vec3 },
    Translate { offset: Vec3, child: SdfHandle },
    Union { a: SdfHandle, b: SdfHandle },
}

/// Type tag of a [`Shape`], stable across the host and device representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum NodeKind {
    Sphere = 0,
    Box = 1,
    Translate = 2,
    Union = 3,
}

impl NodeKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            NodeKind::Sphere => "sphere",
            NodeKind::Box => "box",
            NodeKind::Translate => "translate",
            NodeKind::Union => "union",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SdfNode {
    pub shape: Shape,
    /// Overrides whatever material the children report.
    pub material: Option<MaterialHandle>,
}

impl SdfNode {
    #[must_use]
    pub const fn new(shape: Shape) -> Self {
        Self { shape, material: None }
    }

    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self.shape {
            Shape::Sphere { .. } => NodeKind::Sphere,
            Shape::Box { .. } => NodeKind::Box,
            Shape::Translate { .. } => NodeKind::Translate,
            Shape::Union { .. } => NodeKind::Union,
        }
    }

    /// The numeric parameters in their fixed four-slot layout.
    #[must_use]
    pub fn params(&self) -> [f32; 4] {
        match self.shape {
            Shape::Sphere { radius } => [radius, 0.0, 0.0, 0.0],
            Shape::Box { half_extents: b } => [b.x, b.y, b.z, 0.0],
            Shape::Translate { offset: t, .. } => [t.x, t.y, t.z, 0.0],
            Shape::Union { .. } => [0.0; 4],
        }
    }

    /// `(childA, childB)` slots.
    #[must_use]
    pub const fn children(&self) -> (Option<SdfHandle>, Option<SdfHandle>) {
        match self.shape {
            Shape::Sphere { .. } | Shape::Box { .. } => (None, None),
            Shape::Translate { child, .. } => (Some(child), None),
            Shape::Union { a, b } => (Some(a), Some(b)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaterialKind {
    #[default]
    None,
    Emission,
    Diffuse,
    Glass,
    Glossy,
}

impl MaterialKind {
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            MaterialKind::None => 0,
            MaterialKind::Emission => 1,
            MaterialKind::Diffuse => 2,
            MaterialKind::Glass => 3,
            MaterialKind::Glossy => 4,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            MaterialKind::None => "none",
            MaterialKind::Emission => "emission",
            MaterialKind::Diffuse => "diffuse",
            MaterialKind::Glass => "glass",
            MaterialKind::Glossy => "glossy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Material {
    pub kind: MaterialKind,
    /// Linear RGB.
    pub color: Vec3,
    /// Strength (emission) or roughness (glossy) in slot 0.
    pub params: [f32; 2],
}

impl Material {
    #[must_use]
    pub const fn new(kind: MaterialKind, color: Vec3, params: [f32; 2]) -> Self {
        Self { kind, color, params }
    }

    /// Color seen by a primary ray hitting this material, or `None` for the
    /// background to show through.
    #[must_use]
    pub fn shade(&self) -> Option<Vec3> {
        match self.kind {
            MaterialKind::Emission
            | MaterialKind::Diffuse
            | MaterialKind::Glass
            | MaterialKind::Glossy => Some(self.color),
            MaterialKind::None => None,
        }
    }
}
