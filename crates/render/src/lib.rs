#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! # TPM Render
//!
//! Turns a [`sdf::TpmSpec`] into image files.
//!
//! The [`FrameDriver`] walks a [`Sequence`] in time order. Each frame is
//! either dispatched to the compiled compute platforms through a
//! [`DeviceRenderer`] or rendered natively: the image is split into tiles,
//! tiles are rendered in parallel, and every pixel averages a handful of
//! jittered rays drawn from its own [`TausRng`] stream. Finished frames are
//! encoded by file extension with [`write_image`].

pub mod animation;
pub mod camera;
pub mod device;
pub mod driver;
pub mod frame;
pub mod gpu_types;
pub mod output;
pub mod rng;
pub mod sampler;
pub mod spline;

pub use animation::{Animation, FrameInstance, Sequence, MAX_FRAMES};
pub use camera::{expand_path, Camera, CameraInstance, Film, FilmInstance, PINHOLE_FOV};
pub use device::{DeviceError, DeviceMode, DeviceRenderer, KERNEL_SOURCE};
pub use driver::{CancelToken, FrameDriver, RenderSettings, RenderSummary};
pub use frame::{quantize, Image, Tile, TileRect};
pub use gpu_types::{pack_scene, FrameUniform, MaterialGpu, NodeGpu};
pub use output::{write_image, ImageFormat, OutputError};
pub use rng::TausRng;
pub use sampler::PixelSampler;
pub use spline::{Keyframe, Spline};
