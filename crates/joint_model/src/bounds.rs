//! Per-variable limits supplied by the caller at every bounds-sensitive call.
//!
//! A joint model never reads bounds from internal state while sampling or
//! enforcing limits: the intrinsic bounds it exposes are only a starting
//! point that callers may tighten (see
//! [`JointModel::variable_bounds_with`](crate::JointModel::variable_bounds_with))
//! and hand back in.

use rand::{Rng, RngCore};

use crate::{Error, Result};

/// Closed position interval plus optional velocity, acceleration and effort limits
/// for a single variable.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VariableBounds {
    pub min_position: f64,
    pub max_position: f64,
    pub position_bounded: bool,

    pub max_velocity: f64,
    pub velocity_bounded: bool,

    pub max_acceleration: f64,
    pub acceleration_bounded: bool,

    pub max_effort: f64,
    pub effort_bounded: bool,
}

impl VariableBounds {
    /// Create bounds on position only.
    ///
    /// # Panics
    /// Panics if `min > max` or either end is NaN. Use [`VariableBounds::try_new`]
    /// for untrusted input.
    pub fn new(min: f64, max: f64) -> Self {
        assert!(min <= max, "inverted bounds [{}, {}]", min, max);
        Self {
            min_position: min,
            max_position: max,
            position_bounded: true,
            ..Self::unbounded()
        }
    }

    /// Fallible counterpart of [`VariableBounds::new`].
    pub fn try_new(min: f64, max: f64) -> Result<Self> {
        if min <= max {
            Ok(Self::new(min, max))
        } else {
            Err(Error::InvalidBounds { min, max })
        }
    }

    /// The whole real line, no velocity/acceleration/effort limits.
    pub fn unbounded() -> Self {
        Self {
            min_position: f64::NEG_INFINITY,
            max_position: f64::INFINITY,
            position_bounded: false,
            max_velocity: 0.0,
            velocity_bounded: false,
            max_acceleration: 0.0,
            acceleration_bounded: false,
            max_effort: 0.0,
            effort_bounded: false,
        }
    }

    pub fn with_velocity(mut self, max_velocity: f64) -> Self {
        self.max_velocity = max_velocity.abs();
        self.velocity_bounded = true;
        self
    }

    pub fn with_acceleration(mut self, max_acceleration: f64) -> Self {
        self.max_acceleration = max_acceleration.abs();
        self.acceleration_bounded = true;
        self
    }

    pub fn with_effort(mut self, max_effort: f64) -> Self {
        self.max_effort = max_effort.abs();
        self.effort_bounded = true;
        self
    }

    /// Both ends of the position interval are finite.
    pub fn is_finite(&self) -> bool {
        self.min_position.is_finite() && self.max_position.is_finite()
    }

    /// Length of the position interval (infinite when unbounded).
    pub fn extent(&self) -> f64 {
        self.max_position - self.min_position
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min_position, self.max_position)
    }

    /// Whether `value` lies inside the interval shrunk by `margin` on both sides.
    pub fn contains(&self, value: f64, margin: f64) -> bool {
        value >= self.min_position + margin && value <= self.max_position - margin
    }

    /// Zero when zero is admissible, otherwise the nearest endpoint.
    pub fn default_position(&self) -> f64 {
        self.clamp(0.0)
    }

    /// Uniform draw over the closed interval.
    ///
    /// An interval of infinite width (an infinite end, or ends so far apart
    /// that their difference overflows) has no uniform distribution; the
    /// default position is returned instead.
    pub fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        if self.extent().is_finite() {
            rng.random_range(self.min_position..=self.max_position)
        } else {
            self.default_position()
        }
    }

    /// Uniform draw over `[near - |distance|, near + |distance|]` intersected
    /// with the interval.
    ///
    /// Falls back to [`VariableBounds::sample`] when that window is not of
    /// finite width.
    pub fn sample_near(&self, rng: &mut dyn RngCore, near: f64, distance: f64) -> f64 {
        let distance = distance.abs();
        let low = self.clamp(near - distance);
        let high = self.clamp(near + distance);
        if !(high - low).is_finite() {
            self.sample(rng)
        } else if low < high {
            rng.random_range(low..=high)
        } else {
            low
        }
    }

    /// Tighten these bounds by `other`, keeping the stricter of each limit.
    pub fn intersect(&self, other: &VariableBounds) -> Result<Self> {
        let min = self.min_position.max(other.min_position);
        let max = self.max_position.min(other.max_position);
        if min > max {
            return Err(Error::InvalidBounds { min, max });
        }

        let stricter = |a_set: bool, a: f64, b_set: bool, b: f64| match (a_set, b_set) {
            (true, true) => (true, a.min(b)),
            (true, false) => (true, a),
            (false, true) => (true, b),
            (false, false) => (false, 0.0),
        };
        let (velocity_bounded, max_velocity) = stricter(
            self.velocity_bounded,
            self.max_velocity,
            other.velocity_bounded,
            other.max_velocity,
        );
        let (acceleration_bounded, max_acceleration) = stricter(
            self.acceleration_bounded,
            self.max_acceleration,
            other.acceleration_bounded,
            other.max_acceleration,
        );
        let (effort_bounded, max_effort) = stricter(
            self.effort_bounded,
            self.max_effort,
            other.effort_bounded,
            other.max_effort,
        );

        Ok(Self {
            min_position: min,
            max_position: max,
            position_bounded: self.position_bounded || other.position_bounded,
            max_velocity,
            velocity_bounded,
            max_acceleration,
            acceleration_bounded,
            max_effort,
            effort_bounded,
        })
    }
}

impl Default for VariableBounds {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Assert that a bounds set matches the joint arity and is not inverted.
pub(crate) fn check_bounds(bounds: &[VariableBounds], expected: usize) {
    assert_eq!(
        bounds.len(),
        expected,
        "expected {} variable bounds, got {}",
        expected,
        bounds.len()
    );
    for b in bounds {
        assert!(
            b.min_position <= b.max_position,
            "inverted bounds [{}, {}]",
            b.min_position,
            b.max_position
        );
    }
}

/// Assert that a value slice matches the joint arity.
pub(crate) fn check_values(values: &[f64], expected: usize) {
    assert_eq!(
        values.len(),
        expected,
        "expected {} variable values, got {}",
        expected,
        values.len()
    );
}

/// Exported limits of one variable, for introspection by planners and
/// trajectory tools.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointLimits {
    /// Full variable name, e.g. `base/x`
    pub joint_name: String,
    pub has_position_limits: bool,
    pub min_position: f64,
    pub max_position: f64,
    pub has_velocity_limits: bool,
    pub max_velocity: f64,
    pub has_acceleration_limits: bool,
    pub max_acceleration: f64,
    pub has_effort_limits: bool,
    pub max_effort: f64,
}

impl JointLimits {
    pub fn from_bounds(name: impl Into<String>, bounds: &VariableBounds) -> Self {
        Self {
            joint_name: name.into(),
            has_position_limits: bounds.position_bounded,
            min_position: bounds.min_position,
            max_position: bounds.max_position,
            has_velocity_limits: bounds.velocity_bounded,
            max_velocity: bounds.max_velocity,
            has_acceleration_limits: bounds.acceleration_bounded,
            max_acceleration: bounds.max_acceleration,
            has_effort_limits: bounds.effort_bounded,
            max_effort: bounds.max_effort,
        }
    }
}
