//! Rendering through compiled compute platforms.
//!
//! The frame is split into horizontal bands, one per platform that can run
//! kernels. Bands are dispatched concurrently and joined before the frame is
//! assembled.

use std::str::FromStr;

use compute::{BindingKind, BufferView, ComputeError, Dispatcher, Orchestrator};
use glam::Vec3;
use rayon::prelude::*;
use sdf::{MarchConfig, TpmSpec};
use thiserror::Error;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::camera::CameraInstance;
use crate::frame::Image;
use crate::gpu_types::{pack_scene, FrameUniform};

/// WGSL source of the device renderer; its entry point is `tpm`.
pub const KERNEL_SOURCE: &str = include_str!("tpm.wgsl");

const WORKGROUP: u32 = 8;

/// Where frames are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceMode {
    /// Use compute platforms when any can dispatch, the native path otherwise.
    #[default]
    Auto,
    Cpu,
    Gpu,
}

impl FromStr for DeviceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "gpu" => Ok(Self::Gpu),
            other => Err(format!("unknown device mode `{other}`, expected auto, cpu or gpu")),
        }
    }
}

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("no compiled platform can dispatch kernels")]
    NoDispatchPlatforms,
    #[error(transparent)]
    Compute(#[from] ComputeError),
    #[error("device returned {actual} bytes for a band of {expected}")]
    OutputSize { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Band {
    platform: Uuid,
    first_row: u32,
    rows: u32,
}

/// Renders frames with the `tpm` kernel on every dispatch platform.
#[derive(Clone)]
pub struct DeviceRenderer<'a> {
    dispatcher: Dispatcher<'a>,
    platforms: Vec<Uuid>,
}

impl<'a> DeviceRenderer<'a> {
    /// Fails when no platform has a compiled kernel it can execute.
    pub fn new(orchestrator: &'a Orchestrator) -> Result<Self, DeviceError> {
        let platforms = orchestrator.dispatch_platforms();
        if platforms.is_empty() {
            return Err(DeviceError::NoDispatchPlatforms);
        }
        Ok(Self { dispatcher: orchestrator.dispatcher(), platforms })
    }

    #[must_use]
    pub fn platforms(&self) -> &[Uuid] {
        &self.platforms
    }

    fn bands(&self, height: u32) -> Vec<Band> {
        let count = u32::try_from(self.platforms.len()).unwrap_or(u32::MAX).max(1);
        let per_band = height.div_ceil(count).max(1);
        self.platforms
            .iter()
            .zip((0..height).step_by(per_band as usize))
            .map(|(&platform, first_row)| Band {
                platform,
                first_row,
                rows: per_band.min(height - first_row),
            })
            .collect()
    }

    /// Renders one frame of `width` x `height` pixels.
    pub fn render(
        &self,
        spec: &TpmSpec,
        march: &MarchConfig,
        camera: &CameraInstance,
        size: (u32, u32),
        frame_seed: u32,
    ) -> Result<Image, DeviceError> {
        let (width, height) = size;
        let root = spec.root().map_or(u32::MAX, |h| h.0);
        let node_count = u32::try_from(spec.nodes.len()).unwrap_or(u32::MAX);
        let (nodes, materials) = pack_scene(spec);
        let nodes = BufferView::from_slice(&nodes, BindingKind::StorageRead);
        let materials = BufferView::from_slice(&materials, BindingKind::StorageRead);
        let dims = [width, height, spec.renderer.samples_per_pixel, frame_seed];

        let bands = self.bands(height);
        let results: Vec<Result<Vec<Vec3>, DeviceError>> = bands
            .par_iter()
            .map(|band| {
                let range = [root, node_count, band.first_row, band.rows];
                let uniform = FrameUniform::new(camera, dims, range, march);
                let pixels = width as usize * band.rows as usize;
                let binds = [
                    BufferView::from_slice(
                        &vec![[0.0f32; 4]; pixels],
                        BindingKind::StorageReadWrite,
                    ),
                    BufferView::from_slice(&[uniform], BindingKind::Uniform),
                    nodes.clone(),
                    materials.clone(),
                ];
                let workgroups = [width.div_ceil(WORKGROUP), band.rows.div_ceil(WORKGROUP), 1];
                trace!(
                    target: "tpm::render",
                    "Dispatching rows {}..{} to {}",
                    band.first_row,
                    band.first_row + band.rows,
                    band.platform
                );
                let mut outputs = self.dispatcher.dispatch(band.platform, &binds, workgroups)?;
                let bytes = outputs.pop().unwrap_or_default();
                let expected = pixels * std::mem::size_of::<[f32; 4]>();
                if bytes.len() != expected {
                    return Err(DeviceError::OutputSize { expected, actual: bytes.len() });
                }
                Ok(bytes
                    .chunks_exact(std::mem::size_of::<[f32; 4]>())
                    .map(|texel| {
                        let [r, g, b, _]: [f32; 4] = bytemuck::pod_read_unaligned(texel);
                        Vec3::new(r, g, b)
                    })
                    .collect())
            })
            .collect();

        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for band in results {
            pixels.extend(band?);
        }
        debug!(
            target: "tpm::render",
            "Device frame {}x{} from {} band(s)",
            width,
            height,
            bands.len()
        );
        let mut image = Image::new(width, height, spec.image.tile_size);
        image.pixels_mut().copy_from_slice(&pixels);
        Ok(image)
    }
}
