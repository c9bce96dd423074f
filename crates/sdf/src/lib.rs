#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! # TPM SDF
//!
//! The scene model and rendering core of the tiny path marcher.
//!
//! A scene is a flat arena of signed distance nodes plus a flat list of
//! materials. Nodes reference each other and their material by integer handle,
//! and children are always stored before their parents, so a scene is a DAG
//! that can be shared read-only between any number of render workers.
//!
//! ## Key Components
//!
//! -   **Stores:** [`NodeStore`] and [`MaterialStore`] are append-only arenas
//!     addressed by [`SdfHandle`] and [`MaterialHandle`].
//! -   **Scene spec:** [`TpmSpec`] bundles the stores with the image and
//!     renderer settings. [`SceneBuilder`] is the usual way to create one.
//! -   **Evaluator:** [`NodeStore::evaluate`] returns the signed distance and
//!     the material of the closest surface at a point.
//! -   **Marcher:** [`Marcher`] sphere traces a ray through the scene.
//!
//! ## Usage
//!
//! ```rust
//! use glam::Vec3;
//! use sdf::{Marcher, MaterialKind, SceneBuilder};
//!
//! let mut builder = SceneBuilder::new();
//! let red = builder.material(MaterialKind::Emission, Vec3::new(1.0, 0.0, 0.0), [0.0; 2]);
//! let ball = builder.sphere(1.0);
//! let ball = builder.with_material(ball, red);
//! let root = builder.translate(Vec3::new(0.0, 0.0, 5.0), ball);
//! let spec = builder.build(root);
//!
//! let marcher = Marcher::new(&spec).unwrap();
//! assert_eq!(marcher.march(Vec3::ZERO, Vec3::Z), Vec3::new(1.0, 0.0, 0.0));
//! ```

pub mod builder;
pub mod error;
pub mod eval;
pub mod march;
pub mod spec;
pub mod store;
pub mod types;

pub use builder::SceneBuilder;
pub use error::SceneError;
pub use march::{MarchConfig, MarchResult, Marcher, EPSILON, MAX_T};
pub use spec::{ImageSpec, RendererSpec, SceneLimits, SceneStats, TpmSpec, DEFAULT_MAX_DEPTH};
pub use store::{MaterialStore, NodeStore};
pub use types::{Material, MaterialHandle, MaterialKind, NodeKind, SdfHandle, SdfNode, Shape};
