#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! # TPM: Tiny Path Marcher
//!
//! TPM renders scenes described as trees of signed distance functions by
//! sphere tracing them, and can spread that work across every compute
//! platform it discovers at startup.
//!
//! ## The Crates
//!
//! -   **`tpm`:** The crate you are currently viewing. It parses the command
//!     line, installs the logger and drives a render, optionally re-running
//!     it whenever the scene file changes.
//! -   **[`sdf`]:** Node and material stores, the distance evaluator and the
//!     ray marcher.
//! -   **[`scene`]:** Loads JSON scene descriptions into a validated
//!     [`sdf::TpmSpec`].
//! -   **[`render`]:** Pixel sampling, the frame driver, image output and the
//!     WGSL kernel used on compute devices.
//! -   **[`compute`]:** Platform and device discovery, per-platform contexts,
//!     kernel builds and dispatch.
//!
//! ## Usage
//!
//! ```text
//! tpm scene.json -o frames/{frame:04}.png --spp 8 --frames-in-flight 4
//! tpm --info
//! tpm scene.json --watch -v
//! ```

pub mod app;
pub mod cli;
pub mod watcher;

pub use compute;
pub use render;
pub use scene;
pub use sdf;
