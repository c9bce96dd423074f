//! Serde model of a scene file.
//!
//! Node and material `type` tags are kept as strings so unknown tags surface
//! as [`sdf::SceneError`] values rather than generic parse failures.

use serde::Deserialize;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct SceneDocument {
    #[serde(default)]
    pub image: Option<ImageDef>,
    #[serde(default)]
    pub renderer: Option<RendererDef>,
    #[serde(default)]
    pub camera: Option<CameraDef>,
    #[serde(default)]
    pub animation: Option<AnimationDef>,
    #[serde(default)]
    pub scene: Option<NodeDef>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ImageDef {
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
}

#[derive(Deserialize, Debug)]
pub struct RendererDef {
    #[serde(default = "default_spp")]
    pub spp: u32,
}

/// A value that is either constant or keyed as `[[time, value], ...]`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Track<T> {
    Constant(T),
    Keys(Vec<(f32, T)>),
}

#[derive(Deserialize, Debug, Default)]
pub struct CameraDef {
    pub fov: Option<Track<f32>>,
    pub eye: Option<Track<[f32; 3]>>,
    pub center: Option<Track<[f32; 3]>>,
    pub up: Option<Track<[f32; 3]>>,
}

#[derive(Deserialize, Debug)]
pub struct AnimationDef {
    #[serde(default)]
    pub start: f32,
    #[serde(default)]
    pub end: f32,
    #[serde(default = "default_fps")]
    pub fps: f32,
}

/// One node of the SDF tree; which fields matter depends on `type`.
#[derive(Deserialize, Debug, Default)]
pub struct NodeDef {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub r: f32,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    pub child: Option<Box<NodeDef>>,
    pub a: Option<Box<NodeDef>>,
    pub b: Option<Box<NodeDef>>,
    pub material: Option<MaterialDef>,
}

#[derive(Deserialize, Debug, Default)]
pub struct MaterialDef {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_color")]
    pub color: String,
    /// Strength for emission, roughness for glossy.
    #[serde(default)]
    pub s: f32,
}

fn default_path() -> String {
    "output.png".to_string()
}

const fn default_width() -> u32 {
    1920
}

const fn default_height() -> u32 {
    1080
}

const fn default_tile_size() -> u32 {
    32
}

const fn default_spp() -> u32 {
    2
}

const fn default_fps() -> f32 {
    24.0
}

fn default_color() -> String {
    "#000000".to_string()
}
