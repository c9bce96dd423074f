//! Turning a [`SceneDocument`] into a validated [`TpmSpec`] and its [`Sequence`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use glam::Vec3;
use render::{Animation, Camera, Keyframe, Sequence, Spline, PINHOLE_FOV};
use sdf::{
    ImageSpec, Material, MaterialHandle, MaterialKind, RendererSpec, SceneError, SceneLimits,
    SdfHandle, SdfNode, Shape, TpmSpec,
};
use tracing::{debug, info};

use crate::document::{CameraDef, MaterialDef, NodeDef, SceneDocument, Track};

/// A scene ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedScene {
    pub spec: TpmSpec,
    pub sequence: Sequence,
}

impl LoadedScene {
    /// Wraps an existing spec as a single still frame.
    #[must_use]
    pub fn still(spec: TpmSpec) -> Self {
        let sequence = Sequence::still(&spec);
        Self { spec, sequence }
    }
}

/// Reads and validates the scene file at `path`.
pub fn load_scene(path: &Path) -> Result<LoadedScene, SceneError> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => SceneError::SceneNotFound(path.to_path_buf()),
        _ => SceneError::Parse(format!("{}: {e}", path.display())),
    })?;
    let scene = from_str(&text)?;
    info!(
        target: "tpm::scene",
        "Loaded {}: {} nodes, {} materials, {} frame(s)",
        path.display(),
        scene.spec.nodes.len(),
        scene.spec.materials.len(),
        scene.sequence.frame_count()
    );
    Ok(scene)
}

/// Parses and validates a scene description.
pub fn from_str(json: &str) -> Result<LoadedScene, SceneError> {
    let document: SceneDocument =
        serde_json::from_str(json).map_err(|e| SceneError::Parse(e.to_string()))?;
    from_document(document, &SceneLimits::default())
}

pub fn from_document(
    document: SceneDocument,
    limits: &SceneLimits,
) -> Result<LoadedScene, SceneError> {
    let mut spec = TpmSpec::default();
    if let Some(image) = &document.image {
        spec.image = ImageSpec {
            path: PathBuf::from(&image.path),
            width: image.width,
            height: image.height,
            tile_size: image.tile_size,
        };
    }
    if let Some(renderer) = &document.renderer {
        spec.renderer = RendererSpec { samples_per_pixel: renderer.spp };
    }

    let root = document.scene.as_ref().ok_or(SceneError::SceneMissing)?;
    let root = push_node(root, &mut spec)?;
    spec.root = Some(root);
    let stats = spec.validate(limits)?;
    debug!(target: "tpm::scene", "Scene root {} at depth {}", root, stats.depth);

    let mut sequence = Sequence::still(&spec);
    if let Some(camera) = &document.camera {
        sequence.camera = camera_from(camera)?;
    }
    if let Some(animation) = &document.animation {
        sequence.animation =
            Animation { start: animation.start, end: animation.end, fps: animation.fps };
        sequence.animation.validate()?;
    }
    Ok(LoadedScene { spec, sequence })
}

/// Pushes `node` and its subtree, children first, and returns its handle.
fn push_node(node: &NodeDef, spec: &mut TpmSpec) -> Result<SdfHandle, SceneError> {
    let shape = match node.kind.as_str() {
        "sphere" => Shape::Sphere { radius: node.r },
        "box" => Shape::Box { half_extents: Vec3::new(node.x, node.y, node.z) },
        "translate" => {
            let child = required(node.child.as_deref(), "translate", "child")?;
            Shape::Translate {
                offset: Vec3::new(node.x, node.y, node.z),
                child: push_node(child, spec)?,
            }
        }
        "union" => {
            let a = push_node(required(node.a.as_deref(), "union", "a")?, spec)?;
            let b = push_node(required(node.b.as_deref(), "union", "b")?, spec)?;
            Shape::Union { a, b }
        }
        other => return Err(SceneError::UnknownNodeType(other.to_string())),
    };
    let material = node.material.as_ref().map(|m| push_material(m, spec)).transpose()?;
    Ok(spec.nodes.push(SdfNode { shape, material }))
}

fn required<'a>(
    child: Option<&'a NodeDef>,
    kind: &str,
    field: &str,
) -> Result<&'a NodeDef, SceneError> {
    child.ok_or_else(|| SceneError::Parse(format!("`{kind}` node is missing `{field}`")))
}

fn push_material(def: &MaterialDef, spec: &mut TpmSpec) -> Result<MaterialHandle, SceneError> {
    let kind = match def.kind.as_str() {
        "none" => MaterialKind::None,
        "emission" => MaterialKind::Emission,
        "diffuse" => MaterialKind::Diffuse,
        "glass" => MaterialKind::Glass,
        "glossy" => MaterialKind::Glossy,
        other => return Err(SceneError::UnknownMaterialType(other.to_string())),
    };
    let color = parse_hex(&def.color)?;
    Ok(spec.materials.push(Material::new(kind, color, [def.s, 0.0])))
}

/// Parses `#rrggbb` into linear channel values in `[0, 1]`.
pub fn parse_hex(hex: &str) -> Result<Vec3, SceneError> {
    let invalid = || SceneError::InvalidColor(hex.to_string());
    let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map(|v| f32::from(v) / 255.0)
            .map_err(|_| invalid())
    };
    Ok(Vec3::new(channel(0)?, channel(2)?, channel(4)?))
}

fn spline<T: Keyframe>(
    track: Option<&Track<T>>,
    fallback: T,
    name: &str,
) -> Result<Spline<T>, SceneError> {
    match track {
        None => Ok(Spline::constant(fallback)),
        Some(Track::Constant(value)) => Ok(Spline::constant(*value)),
        Some(Track::Keys(keys)) => Spline::from_keys(keys.iter().copied())
            .ok_or_else(|| SceneError::Parse(format!("camera `{name}` has no keyframes"))),
    }
}

fn vec_track(track: Option<&Track<[f32; 3]>>) -> Option<Track<Vec3>> {
    track.map(|t| match t {
        Track::Constant(v) => Track::Constant(Vec3::from_array(*v)),
        Track::Keys(keys) => {
            Track::Keys(keys.iter().map(|&(time, v)| (time, Vec3::from_array(v))).collect())
        }
    })
}

fn camera_from(def: &CameraDef) -> Result<Camera, SceneError> {
    let fallback = Camera::default();
    let vec_spline = |track: Option<&Track<[f32; 3]>>, fallback: &Spline<Vec3>, name: &str| {
        spline(vec_track(track).as_ref(), fallback.sample(0.0), name)
    };
    Ok(Camera {
        fov: spline(def.fov.as_ref(), PINHOLE_FOV, "fov")?,
        eye: vec_spline(def.eye.as_ref(), &fallback.eye, "eye")?,
        center: vec_spline(def.center.as_ref(), &fallback.center, "center")?,
        up: vec_spline(def.up.as_ref(), &fallback.up, "up")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex("#ff0000").unwrap(), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(parse_hex("#FFffFF").unwrap(), Vec3::ONE);
        assert_eq!(parse_hex("#000000").unwrap(), Vec3::ZERO);
        for bad in ["ff0000", "#ff00", "#gg0000", "#ff00001", "#ff00é"] {
            assert_eq!(parse_hex(bad), Err(SceneError::InvalidColor(bad.to_string())), "{bad}");
        }
    }

    #[test]
    fn children_are_stored_before_parents() {
        let scene = from_str(
            r#"{"scene": {"type": "union",
                "a": {"type": "sphere", "r": 1},
                "b": {"type": "translate", "x": 2,
                      "child": {"type": "box", "x": 1, "y": 1, "z": 1}}}}"#,
        )
        .unwrap();
        let spec = &scene.spec;
        assert_eq!(spec.nodes.len(), 4);
        assert_eq!(spec.root, Some(SdfHandle(3)));
        for (handle, node) in spec.nodes.iter() {
            let (a, b) = node.children();
            for child in [a, b].into_iter().flatten() {
                assert!(child < handle, "{child} must precede {handle}");
            }
        }
    }

    #[test]
    fn missing_operator_child_is_a_parse_error() {
        let err = from_str(r#"{"scene": {"type": "translate", "x": 1}}"#).unwrap_err();
        assert!(matches!(err, SceneError::Parse(ref m) if m.contains("child")), "{err:?}");
    }

    #[test]
    fn keyed_camera_tracks() {
        let scene = from_str(
            r#"{"camera": {"fov": 90,
                           "eye": [[0, [0, 0, -5]], [1, [0, 0, -3]]],
                           "center": [0, 0, 0]},
                "animation": {"start": 0, "end": 1, "fps": 2},
                "scene": {"type": "sphere", "r": 1}}"#,
        )
        .unwrap();
        let camera = &scene.sequence.camera;
        assert_eq!(camera.fov.sample(0.3), 90.0);
        assert_eq!(camera.eye.len(), 2);
        assert_eq!(camera.eye.sample(1.0), Vec3::new(0.0, 0.0, -3.0));
        assert_eq!(scene.sequence.frame_count(), 3);
    }

    #[test]
    fn absurd_animation_ranges_are_rejected() {
        let err = from_str(
            r#"{"animation": {"start": 0, "end": 1e30, "fps": 24},
                "scene": {"type": "sphere", "r": 1}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SceneError::InvalidAnimation(_)), "{err:?}");

        let scene = from_str(
            r#"{"animation": {"end": 2, "fps": 30}, "scene": {"type": "sphere", "r": 1}}"#,
        )
        .unwrap();
        assert_eq!(scene.sequence.frame_count(), 61);
    }

    #[test]
    fn empty_keyframes_are_rejected() {
        let json = r#"{"camera": {"eye": []}, "scene": {"type": "sphere", "r": 1}}"#;
        let err = from_str(json).unwrap_err();
        assert!(matches!(err, SceneError::Parse(_)), "{err:?}");
    }
}
