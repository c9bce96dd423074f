//! Time range of a render and the per-frame instances derived from it.

use sdf::{SceneError, TpmSpec};

use crate::camera::{Camera, CameraInstance, Film, FilmInstance};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animation {
    pub start: f32,
    pub end: f32,
    pub fps: f32,
}

impl Default for Animation {
    fn default() -> Self {
        Self { start: 0.0, end: 0.0, fps: 24.0 }
    }
}

/// Upper bound on the frames of one sequence.
pub const MAX_FRAMES: usize = 1_000_000;

impl Animation {
    /// Number of frames in `[start, end]`; always at least one and at most [`MAX_FRAMES`].
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn frame_count(&self) -> usize {
        if !(self.fps > 0.0) || !(self.end > self.start) {
            return 1;
        }
        let span = ((self.end - self.start) * self.fps).floor();
        if !span.is_finite() || span >= (MAX_FRAMES - 1) as f32 {
            return MAX_FRAMES;
        }
        (span as usize).saturating_add(1)
    }

    /// Rejects non-finite values and ranges longer than [`MAX_FRAMES`].
    #[allow(clippy::cast_precision_loss)]
    pub fn validate(&self) -> Result<(), SceneError> {
        let invalid = |what: String| Err(SceneError::InvalidAnimation(what));
        if !(self.start.is_finite() && self.end.is_finite() && self.fps.is_finite()) {
            return invalid(format!(
                "start {}, end {} and fps {} must be finite",
                self.start, self.end, self.fps
            ));
        }
        let span = (f64::from(self.end) - f64::from(self.start)) * f64::from(self.fps);
        if span.floor() >= (MAX_FRAMES - 1) as f64 {
            return invalid(format!("{span} frames requested, the limit is {MAX_FRAMES}"));
        }
        Ok(())
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn time(&self, frame: usize) -> f32 {
        if self.fps > 0.0 {
            self.start + frame as f32 / self.fps
        } else {
            self.start
        }
    }
}

/// Everything that varies over time: camera, film and the time range.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub camera: Camera,
    pub film: Film,
    pub animation: Animation,
}

impl Sequence {
    /// A single still frame with the pinhole camera and the scene's image settings.
    #[must_use]
    pub fn still(spec: &TpmSpec) -> Self {
        Self {
            camera: Camera::default(),
            film: Film {
                path: spec.image.path.to_string_lossy().into_owned(),
                width: spec.image.width,
                height: spec.image.height,
            },
            animation: Animation::default(),
        }
    }

    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.animation.frame_count()
    }

    #[must_use]
    pub fn instance(&self, frame: usize) -> FrameInstance {
        let time = self.animation.time(frame);
        FrameInstance {
            index: frame,
            time,
            camera: self.camera.instance(time),
            film: self.film.instance(frame, time),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameInstance {
    pub index: usize,
    pub time: f32,
    pub camera: CameraInstance,
    pub film: FilmInstance,
}
