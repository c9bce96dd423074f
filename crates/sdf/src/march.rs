//! Sphere tracing through a [`TpmSpec`].

use glam::Vec3;

use crate::error::SceneError;
use crate::spec::TpmSpec;
use crate::types::{MaterialHandle, SdfHandle};

/// Distance after which a ray is considered to have escaped.
pub const MAX_T: f32 = 100.0;
/// Convergence threshold for a surface hit.
pub const EPSILON: f32 = 10.0 * f32::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarchConfig {
    pub max_t: f32,
    pub epsilon: f32,
    pub background: Vec3,
}

impl Default for MarchConfig {
    fn default() -> Self {
        Self { max_t: MAX_T, epsilon: EPSILON, background: Vec3::ZERO }
    }
}

/// Where and how a ray terminated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarchResult {
    /// Distance travelled along the ray.
    pub t: f32,
    pub steps: u32,
    /// The last step fell below epsilon.
    pub hit: bool,
    /// Material reported by the final evaluation.
    pub material: Option<MaterialHandle>,
}

#[derive(Debug, Clone, Copy)]
pub struct Marcher<'a> {
    spec: &'a TpmSpec,
    root: SdfHandle,
    config: MarchConfig,
}

impl<'a> Marcher<'a> {
    pub fn new(spec: &'a TpmSpec) -> Result<Self, SceneError> {
        Ok(Self { spec, root: spec.root()?, config: MarchConfig::default() })
    }

    #[must_use]
    pub fn with_config(mut self, config: MarchConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &MarchConfig {
        &self.config
    }

    #[must_use]
    pub fn spec(&self) -> &'a TpmSpec {
        self.spec
    }

    /// Steps along `origin + t * direction` by the distance bound until the
    /// bound drops to epsilon or `t` passes `max_t`.
    ///
    /// A NaN distance stops the walk and counts as a miss.
    #[must_use]
    pub fn trace(&self, origin: Vec3, direction: Vec3) -> MarchResult {
        let mut t = 0.0f32;
        let mut delta = f32::INFINITY;
        let mut material = None;
        let mut steps = 0u32;
        while t < self.config.max_t && delta > self.config.epsilon {
            (delta, material) = self.spec.nodes.evaluate(origin + t * direction, self.root);
            t += delta;
            steps += 1;
        }
        MarchResult { t, steps, hit: delta <= self.config.epsilon, material }
    }

    /// Color seen along the ray: the hit material's color, or the background.
    #[must_use]
    pub fn march(&self, origin: Vec3, direction: Vec3) -> Vec3 {
        let result = self.trace(origin, direction);
        if !result.hit {
            return self.config.background;
        }
        result
            .material
            .and_then(|m| self.spec.materials.get(m))
            .and_then(crate::types::Material::shade)
            .unwrap_or(self.config.background)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SceneBuilder;
    use crate::types::MaterialKind;

    fn red_ball() -> TpmSpec {
        let mut b = SceneBuilder::new();
        let red = b.material(MaterialKind::Diffuse, Vec3::new(1.0, 0.0, 0.0), [0.0; 2]);
        let s = b.sphere(1.0);
        let s = b.with_material(s, red);
        let root = b.translate(Vec3::new(0.0, 0.0, 5.0), s);
        b.build(root)
    }

    #[test]
    fn hits_sphere_in_front() {
        let spec = red_ball();
        let marcher = Marcher::new(&spec).unwrap();
        let result = marcher.trace(Vec3::ZERO, Vec3::Z);
        assert!(result.hit);
        assert!((result.t - 4.0).abs() <= EPSILON, "t = {}", result.t);
        assert_eq!(marcher.march(Vec3::ZERO, Vec3::Z), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn ray_away_from_geometry_misses() {
        let spec = red_ball();
        let marcher = Marcher::new(&spec).unwrap();
        let result = marcher.trace(Vec3::ZERO, -Vec3::Z);
        assert!(!result.hit);
        assert!(result.t >= MAX_T);
        assert_eq!(marcher.march(Vec3::ZERO, -Vec3::Z), Vec3::ZERO);
    }

    #[test]
    fn none_material_shows_background() {
        let mut b = SceneBuilder::new();
        let none = b.material(MaterialKind::None, Vec3::ONE, [0.0; 2]);
        let s = b.sphere(1.0);
        let s = b.with_material(s, none);
        let root = b.translate(Vec3::new(0.0, 0.0, 5.0), s);
        let spec = b.build(root);
        let background = Vec3::new(0.1, 0.2, 0.3);
        let config = MarchConfig { background, ..MarchConfig::default() };
        let marcher = Marcher::new(&spec).unwrap().with_config(config);
        assert!(marcher.trace(Vec3::ZERO, Vec3::Z).hit);
        assert_eq!(marcher.march(Vec3::ZERO, Vec3::Z), background);
    }

    #[test]
    fn hit_without_material_shows_background() {
        let mut b = SceneBuilder::new();
        let s = b.sphere(1.0);
        let root = b.translate(Vec3::new(0.0, 0.0, 5.0), s);
        let spec = b.build(root);
        let marcher = Marcher::new(&spec).unwrap();
        assert_eq!(marcher.march(Vec3::ZERO, Vec3::Z), Vec3::ZERO);
    }

    #[test]
    fn nan_distance_is_a_miss() {
        let mut b = SceneBuilder::new();
        let glow = b.material(MaterialKind::Emission, Vec3::ONE, [1.0, 0.0]);
        let s = b.sphere(f32::NAN);
        let root = b.with_material(s, glow);
        let spec = b.build(root);
        let marcher = Marcher::new(&spec).unwrap();
        let result = marcher.trace(Vec3::ZERO, Vec3::Z);
        assert!(!result.hit);
        assert_eq!(result.steps, 1);
        assert_eq!(marcher.march(Vec3::ZERO, Vec3::Z), Vec3::ZERO);
    }

    #[test]
    fn default_epsilon_is_ten_machine_epsilons() {
        assert_eq!(MarchConfig::default().epsilon, 10.0 * f32::EPSILON);
        assert_eq!(MarchConfig::default().max_t, 100.0);
    }

    #[test]
    fn empty_scene_cannot_be_marched() {
        assert_eq!(Marcher::new(&TpmSpec::default()).err(), Some(SceneError::MissingRoot));
    }
}
