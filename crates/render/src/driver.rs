//! The frame loop: walk the sequence in time order, render, hand off to the encoder.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use sdf::{MarchConfig, Marcher, SceneError, TpmSpec};
use tracing::{debug, info, warn};

use crate::animation::{FrameInstance, Sequence};
use crate::device::DeviceRenderer;
use crate::frame::{Image, Tile};
use crate::output::{write_image, OutputError};
use crate::rng::{hash_u32, TausRng};
use crate::sampler::PixelSampler;

/// Shared flag checked between frames.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub seed: u32,
    /// Frames rendered concurrently before being written in order.
    pub frames_in_flight: usize,
    pub march: MarchConfig,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self { seed: 0, frames_in_flight: 1, march: MarchConfig::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderSummary {
    pub frames_written: usize,
    pub frames_failed: usize,
    pub cancelled: bool,
}

pub struct FrameDriver<'a> {
    spec: &'a TpmSpec,
    sequence: &'a Sequence,
    settings: RenderSettings,
    device: Option<DeviceRenderer<'a>>,
    cancel: CancelToken,
}

impl<'a> FrameDriver<'a> {
    /// Fails when the scene has no root to march.
    pub fn new(
        spec: &'a TpmSpec,
        sequence: &'a Sequence,
        settings: RenderSettings,
    ) -> Result<Self, SceneError> {
        spec.root()?;
        Ok(Self { spec, sequence, settings, device: None, cancel: CancelToken::new() })
    }

    /// Renders on `device` first and falls back to the native path per frame.
    #[must_use]
    pub fn with_device(mut self, device: DeviceRenderer<'a>) -> Self {
        self.device = Some(device);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn frame_seed(&self, frame: usize) -> u32 {
        hash_u32(self.settings.seed ^ hash_u32(frame as u32))
    }

    /// Renders a frame, preferring the device renderer when one is attached.
    #[must_use]
    pub fn render_frame(&self, frame: &FrameInstance) -> Image {
        if let Some(device) = &self.device {
            let size = (frame.film.width, frame.film.height);
            let seed = self.frame_seed(frame.index);
            match device.render(self.spec, &self.settings.march, &frame.camera, size, seed) {
                Ok(image) => return image,
                Err(e) => warn!(
                    target: "tpm::render",
                    "Device render of frame {} failed, using the native path: {e}",
                    frame.index
                ),
            }
        }
        self.render_native(frame)
    }

    /// Renders a frame on the host, tiles in parallel.
    #[must_use]
    pub fn render_native(&self, frame: &FrameInstance) -> Image {
        let mut image = Image::new(frame.film.width, frame.film.height, self.spec.image.tile_size);
        let Ok(marcher) = Marcher::new(self.spec) else {
            return image;
        };
        let marcher = marcher.with_config(self.settings.march);
        let sampler = PixelSampler::new(
            frame.film.width,
            frame.film.height,
            self.spec.renderer.samples_per_pixel,
        );
        let seed = self.frame_seed(frame.index);

        let rects: Vec<_> = image.tiles().collect();
        let tiles: Vec<Tile> = rects
            .into_par_iter()
            .map(|rect| {
                let mut tile = Tile::new(rect);
                for y in rect.y0..rect.y1 {
                    for x in rect.x0..rect.x1 {
                        let mut rng = TausRng::seed_for_pixel(seed, x, y);
                        let color = sampler.render_pixel(x, y, &mut rng, &marcher, &frame.camera);
                        tile.set(x, y, color);
                    }
                }
                tile
            })
            .collect();
        for tile in &tiles {
            image.merge_tile(tile);
        }
        image
    }

    /// Renders every frame and encodes it to its film path.
    pub fn run(&self) -> RenderSummary {
        self.run_with(|frame, image| write_image(&frame.film.path, image))
    }

    /// Renders every frame and hands each one to `sink`, strictly in frame order.
    ///
    /// Up to `frames_in_flight` frames are computed concurrently. Cancellation
    /// is checked before each batch and before each hand-off; a frame that is
    /// not handed off is not counted.
    pub fn run_with<F>(&self, mut sink: F) -> RenderSummary
    where
        F: FnMut(&FrameInstance, &Image) -> Result<(), OutputError>,
    {
        let total = self.sequence.frame_count();
        let in_flight = self.settings.frames_in_flight.max(1);
        let mut summary = RenderSummary::default();
        let started = Instant::now();
        info!(target: "tpm::render", "Rendering {} frame(s), {} in flight", total, in_flight);

        let mut next = 0;
        while next < total {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            let batch: Vec<FrameInstance> = (next..total.min(next + in_flight))
                .map(|i| self.sequence.instance(i))
                .collect();
            next += batch.len();

            let images: Vec<Image> = if batch.len() == 1 {
                batch.iter().map(|f| self.render_frame(f)).collect()
            } else {
                batch.par_iter().map(|f| self.render_frame(f)).collect()
            };

            for (frame, image) in batch.iter().zip(&images) {
                if self.cancel.is_cancelled() {
                    summary.cancelled = true;
                    break;
                }
                match sink(frame, image) {
                    Ok(()) => {
                        summary.frames_written += 1;
                        info!(
                            target: "tpm::render",
                            "Frame {} (t = {:.3}) -> {}",
                            frame.index,
                            frame.time,
                            frame.film.path.display()
                        );
                    }
                    Err(e) => {
                        summary.frames_failed += 1;
                        warn!(target: "tpm::render", "Frame {} not written: {e}", frame.index);
                    }
                }
            }
            if summary.cancelled {
                break;
            }
        }

        if summary.cancelled {
            info!(
                target: "tpm::render",
                "Render cancelled after {} frame(s)",
                summary.frames_written
            );
        }
        debug!(target: "tpm::render", "Render finished in {:.2?}", started.elapsed());
        summary
    }
}
