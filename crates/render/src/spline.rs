//! Keyframed cubic Hermite curves for animated scene parameters.

use std::ops::{Add, Div, Mul, Sub};

use glam::Vec3;

const KEY_EPSILON: f32 = 10.0 * f32::EPSILON;

/// Values a [`Spline`] can interpolate.
pub trait Keyframe:
    Copy
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<f32, Output = Self>
    + Div<f32, Output = Self>
{
}

impl Keyframe for f32 {}
impl Keyframe for Vec3 {}

/// Sorted `(time, value)` keys with Catmull-Rom style tangents.
///
/// Outside the keyed range the nearest key is held.
#[derive(Debug, Clone, PartialEq)]
pub struct Spline<T> {
    keys: Vec<(f32, T)>,
}

impl<T: Keyframe> Spline<T> {
    /// A spline holding `value` at all times.
    #[must_use]
    pub fn constant(value: T) -> Self {
        Self { keys: vec![(0.0, value)] }
    }

    /// Builds a spline from unordered keys; later duplicates replace earlier ones.
    /// Returns `None` when `keys` is empty.
    pub fn from_keys(keys: impl IntoIterator<Item = (f32, T)>) -> Option<Self> {
        let mut iter = keys.into_iter();
        let (t, v) = iter.next()?;
        let mut spline = Self { keys: vec![(t, v)] };
        for (t, v) in iter {
            spline.insert(t, v);
        }
        Some(spline)
    }

    pub fn insert(&mut self, time: f32, value: T) {
        let at = self.keys.partition_point(|(t, _)| *t < time);
        match self.keys.get_mut(at) {
            Some(key) if key.0 == time => key.1 = value,
            _ => self.keys.insert(at, (time, value)),
        }
    }

    #[must_use]
    pub fn begin(&self) -> f32 {
        self.keys[0].0
    }

    #[must_use]
    pub fn end(&self) -> f32 {
        self.keys[self.keys.len() - 1].0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[must_use]
    pub fn sample(&self, time: f32) -> T {
        let i2 = self.keys.partition_point(|(t, _)| *t < time);
        if i2 == 0 {
            return self.keys[0].1;
        }
        if i2 == self.keys.len() {
            return self.keys[i2 - 1].1;
        }
        let (t2, v2) = self.keys[i2];
        if (time - t2).abs() <= KEY_EPSILON {
            return v2;
        }
        let (t1, v1) = self.keys[i2 - 1];
        let span = t2 - t1;
        let secant = (v2 - v1) / span;

        let m1 = if i2 == 1 {
            secant
        } else {
            let (t0, v0) = self.keys[i2 - 2];
            (secant + (v1 - v0) / (t1 - t0)) * 0.5
        };
        let m2 = match self.keys.get(i2 + 1) {
            Some(&(t3, v3)) => ((v3 - v2) / (t3 - t2) + secant) * 0.5,
            None => secant,
        };

        let u = (time - t1) / span;
        let h00 = (1.0 + 2.0 * u) * (1.0 - u) * (1.0 - u);
        let h10 = u * (1.0 - u) * (1.0 - u);
        let h01 = u * u * (3.0 - 2.0 * u);
        let h11 = u * u * (u - 1.0);
        v1 * h00 + m1 * (h10 * span) + v2 * h01 + m2 * (h11 * span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_holds_everywhere() {
        let s = Spline::constant(3.0f32);
        assert_eq!(s.sample(-10.0), 3.0);
        assert_eq!(s.sample(0.0), 3.0);
        assert_eq!(s.sample(10.0), 3.0);
    }

    #[test]
    fn passes_through_keys_and_clamps_outside() {
        let s = Spline::from_keys([(0.0, 0.0f32), (1.0, 10.0), (2.0, 0.0)]).unwrap();
        assert_eq!(s.sample(0.0), 0.0);
        assert_eq!(s.sample(1.0), 10.0);
        assert_eq!(s.sample(2.0), 0.0);
        assert_eq!(s.sample(-1.0), 0.0);
        assert_eq!(s.sample(5.0), 0.0);
        assert_eq!((s.begin(), s.end()), (0.0, 2.0));
    }

    #[test]
    fn two_keys_interpolate_linearly() {
        let s = Spline::from_keys([(0.0, Vec3::ZERO), (2.0, Vec3::new(2.0, 4.0, -2.0))]).unwrap();
        let mid = s.sample(1.0);
        assert!((mid - Vec3::new(1.0, 2.0, -1.0)).length() < 1e-5, "{mid}");
    }

    #[test]
    fn insert_keeps_order_and_replaces_duplicates() {
        let mut s = Spline::constant(1.0f32);
        s.insert(2.0, 3.0);
        s.insert(1.0, 2.0);
        s.insert(2.0, 4.0);
        assert_eq!(s.len(), 3);
        assert_eq!(s.sample(1.0), 2.0);
        assert_eq!(s.sample(2.0), 4.0);
    }

    #[test]
    fn empty_keys_build_nothing() {
        assert!(Spline::<f32>::from_keys(Vec::new()).is_none());
    }
}
