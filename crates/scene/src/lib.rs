#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! # TPM Scene
//!
//! Loads JSON scene descriptions into a validated [`sdf::TpmSpec`] plus the
//! [`render::Sequence`] (camera, film and time range) to render it over.
//!
//! ```json
//! {
//!   "image": { "path": "out/{frame:05}.png", "width": 640, "height": 360, "tileSize": 32 },
//!   "renderer": { "spp": 4 },
//!   "camera": { "eye": [[0, [0, 0, -4]], [2, [0, 1, -3]]], "center": [0, 0, 0] },
//!   "animation": { "start": 0, "end": 2, "fps": 24 },
//!   "scene": {
//!     "type": "union",
//!     "a": {
//!       "type": "sphere", "r": 1,
//!       "material": { "type": "emission", "color": "#ff8000", "s": 1 }
//!     },
//!     "b": { "type": "translate", "y": -101, "child": { "type": "sphere", "r": 100 } }
//!   }
//! }
//! ```
//!
//! Every node is stored after its children, so handles in the resulting
//! spec always point backwards.

pub mod document;
pub mod loader;

use glam::Vec3;
use sdf::{ImageSpec, MaterialKind, RendererSpec, SceneBuilder};

pub use document::{MaterialDef, NodeDef, SceneDocument, Track};
pub use loader::{from_document, from_str, load_scene, parse_hex, LoadedScene};

/// Two lit spheres over a floor box, used when no scene file is given.
#[must_use]
pub fn demo_scene() -> LoadedScene {
    let mut b = SceneBuilder::new()
        .image(ImageSpec { width: 640, height: 360, ..ImageSpec::default() })
        .renderer(RendererSpec::default());
    let warm = b.material(MaterialKind::Emission, Vec3::new(1.0, 0.5, 0.1), [1.0, 0.0]);
    let cool = b.material(MaterialKind::Diffuse, Vec3::new(0.2, 0.4, 1.0), [0.0; 2]);
    let floor = b.material(MaterialKind::Diffuse, Vec3::splat(0.6), [0.0; 2]);

    let left = b.sphere(1.0);
    let left = b.with_material(left, warm);
    let left = b.translate(Vec3::new(-1.2, 0.0, 5.0), left);
    let right = b.sphere(0.8);
    let right = b.with_material(right, cool);
    let right = b.translate(Vec3::new(1.3, -0.2, 6.0), right);
    let ground = b.cuboid(Vec3::new(10.0, 0.1, 10.0));
    let ground = b.with_material(ground, floor);
    let ground = b.translate(Vec3::new(0.0, -1.1, 6.0), ground);

    let pair = b.union(left, right);
    let root = b.union(pair, ground);
    LoadedScene::still(b.build(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdf::{Marcher, SceneLimits};

    #[test]
    fn demo_scene_is_valid_and_visible() {
        let scene = demo_scene();
        let stats = scene.spec.validate(&SceneLimits::default()).unwrap();
        assert_eq!(stats.nodes, 8);
        let marcher = Marcher::new(&scene.spec).unwrap();
        let (origin, dir) = (Vec3::ZERO, Vec3::new(-1.2, 0.0, 5.0).normalize());
        assert_eq!(marcher.march(origin, dir), Vec3::new(1.0, 0.5, 0.1));
    }
}
