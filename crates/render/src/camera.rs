//! Animated camera and film descriptions, and their per-frame instances.

use std::path::PathBuf;

use glam::Vec3;

use crate::spline::Spline;

/// Field of view, in degrees, under which the film plane at `z = 1` spans `[-0.5, 0.5]`.
pub const PINHOLE_FOV: f32 = 53.130_102;

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Vertical field of view in degrees.
    pub fov: Spline<f32>,
    pub eye: Spline<Vec3>,
    pub center: Spline<Vec3>,
    pub up: Spline<Vec3>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov: Spline::constant(PINHOLE_FOV),
            eye: Spline::constant(Vec3::ZERO),
            center: Spline::constant(Vec3::Z),
            up: Spline::constant(Vec3::Y),
        }
    }
}

impl Camera {
    #[must_use]
    pub fn instance(&self, time: f32) -> CameraInstance {
        CameraInstance::look_at(
            self.fov.sample(time),
            self.eye.sample(time),
            self.center.sample(time),
            self.up.sample(time),
        )
    }
}

/// A camera frozen at one point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraInstance {
    pub eye: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub forward: Vec3,
    /// Film plane half-size multiplier, `2 * tan(fov / 2)`.
    pub scale: f32,
}

impl Default for CameraInstance {
    fn default() -> Self {
        Self::pinhole()
    }
}

impl CameraInstance {
    /// Camera at the origin looking down `+z` with the film plane at `z = 1`.
    #[must_use]
    pub const fn pinhole() -> Self {
        Self { eye: Vec3::ZERO, right: Vec3::X, up: Vec3::Y, forward: Vec3::Z, scale: 1.0 }
    }

    /// Degenerate inputs (eye on center, up parallel to the view) fall back to
    /// the pinhole orientation.
    #[must_use]
    pub fn look_at(fov_degrees: f32, eye: Vec3, center: Vec3, up: Vec3) -> Self {
        let forward = (center - eye).normalize_or_zero();
        let right = up.cross(forward).normalize_or_zero();
        if forward == Vec3::ZERO || right == Vec3::ZERO {
            return Self { eye, ..Self::pinhole() };
        }
        Self {
            eye,
            right,
            up: forward.cross(right),
            forward,
            scale: 2.0 * (fov_degrees.to_radians() * 0.5).tan(),
        }
    }

    /// Maps a camera space film direction (`z = 1` plane) to a world ray.
    #[must_use]
    pub fn ray(&self, film: Vec3) -> (Vec3, Vec3) {
        let d = self.right * (film.x * self.scale)
            + self.up * (film.y * self.scale)
            + self.forward * film.z;
        (self.eye, d)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Film {
    /// Output path template. `{frame}`, `{frame:0N}` and `{time}` are substituted per frame.
    pub path: String,
    pub width: u32,
    pub height: u32,
}

impl Film {
    #[must_use]
    pub fn instance(&self, frame: usize, time: f32) -> FilmInstance {
        FilmInstance {
            path: expand_path(&self.path, frame, time),
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilmInstance {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Substitutes frame placeholders in `template`. Unknown `{...}` groups are kept verbatim.
#[must_use]
pub fn expand_path(template: &str, frame: usize, time: f32) -> PathBuf {
    let mut out = String::with_capacity(template.len() + 8);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            rest = "";
            break;
        };
        let key = &after[..close];
        match key {
            "frame" => out.push_str(&frame.to_string()),
            "time" => out.push_str(&format!("{time:.3}")),
            _ => match key.strip_prefix("frame:0").and_then(|w| w.parse::<usize>().ok()) {
                Some(width) => out.push_str(&format!("{frame:0width$}")),
                None => {
                    out.push('{');
                    out.push_str(key);
                    out.push('}');
                }
            },
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    PathBuf::from(out)
}
