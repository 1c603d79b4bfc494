//! Single-axis rotational joint, either bounded or continuous.

use std::f64::consts::PI;
use std::fmt;

use nalgebra::{Isometry3, Translation3, Unit, UnitQuaternion, Vector3};
use rand::{Rng, RngCore};

use crate::angles::{angular_distance, interpolate_angle, normalize_angle};
use crate::bounds::{VariableBounds, check_bounds, check_values};
use crate::joint::{JointModel, JointProperties, JointType};
use crate::{Error, Result};

/// A joint rotating about a fixed axis
///
/// Continuous joints wrap around at ±π and have no position limits of their
/// own; bounded joints clamp.
#[derive(Clone, Debug)]
pub struct RevoluteJointModel {
    properties: JointProperties,
    axis: Unit<Vector3<f64>>,
    continuous: bool,
}

impl RevoluteJointModel {
    /// Create a bounded joint about +Z with limits `[-π, π]`
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            properties: JointProperties::new(
                name.clone(),
                vec![name],
                vec![VariableBounds::new(-PI, PI)],
            ),
            axis: Vector3::z_axis(),
            continuous: false,
        }
    }

    /// Create a joint that wraps around instead of stopping at ±π
    pub fn continuous(name: impl Into<String>) -> Self {
        let mut joint = Self::new(name);
        joint.continuous = true;
        joint
    }

    /// Rotate about `axis` instead of +Z
    pub fn with_axis(mut self, axis: Vector3<f64>) -> Result<Self> {
        self.axis = Unit::try_new(axis, f64::EPSILON).ok_or(Error::InvalidAxis {
            joint: self.properties.name().to_string(),
        })?;
        Ok(self)
    }

    /// Place the joint in a chain
    pub fn with_indices(mut self, index: usize, first_variable_index: usize) -> Self {
        self.properties = self.properties.with_indices(index, first_variable_index);
        self
    }

    /// Replace the intrinsic bounds
    pub fn with_variable_bounds(mut self, bounds: Vec<VariableBounds>) -> Result<Self> {
        self.properties = self.properties.with_variable_bounds(bounds)?;
        Ok(self)
    }

    pub fn axis(&self) -> &Unit<Vector3<f64>> {
        &self.axis
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous
    }
}

impl JointModel for RevoluteJointModel {
    fn properties(&self) -> &JointProperties {
        &self.properties
    }

    fn joint_type(&self) -> JointType {
        JointType::Revolute
    }

    fn default_values(&self, values: &mut [f64], bounds: &[VariableBounds]) {
        check_values(values, 1);
        check_bounds(bounds, 1);
        values[0] = bounds[0].default_position();
    }

    fn random_values(
        &self,
        rng: &mut dyn RngCore,
        values: &mut [f64],
        bounds: &[VariableBounds],
    ) {
        check_values(values, 1);
        check_bounds(bounds, 1);
        values[0] = bounds[0].sample(rng);
    }

    fn random_values_near_by(
        &self,
        rng: &mut dyn RngCore,
        values: &mut [f64],
        bounds: &[VariableBounds],
        near: &[f64],
        distance: f64,
    ) {
        check_values(values, 1);
        check_values(near, 1);
        check_bounds(bounds, 1);
        values[0] = if self.continuous {
            let arc = distance.abs().min(PI);
            let offset = if arc > 0.0 {
                rng.random_range(-arc..=arc)
            } else {
                0.0
            };
            normalize_angle(near[0] + offset)
        } else {
            bounds[0].sample_near(rng, near[0], distance)
        };
    }

    fn enforce_bounds(&self, values: &mut [f64], bounds: &[VariableBounds]) -> bool {
        check_values(values, 1);
        check_bounds(bounds, 1);
        let enforced = if self.continuous {
            normalize_angle(values[0])
        } else {
            bounds[0].clamp(values[0])
        };
        let changed = enforced != values[0];
        values[0] = enforced;
        changed
    }

    fn satisfies_bounds(&self, values: &[f64], bounds: &[VariableBounds], margin: f64) -> bool {
        check_values(values, 1);
        check_bounds(bounds, 1);
        self.continuous || bounds[0].contains(values[0], margin)
    }

    fn maximum_extent(&self, bounds: &[VariableBounds]) -> f64 {
        check_bounds(bounds, 1);
        if self.continuous {
            PI
        } else {
            bounds[0].extent()
        }
    }

    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        check_values(a, 1);
        check_values(b, 1);
        if self.continuous {
            angular_distance(a[0], b[0])
        } else {
            (a[0] - b[0]).abs()
        }
    }

    fn interpolate(&self, from: &[f64], to: &[f64], t: f64, state: &mut [f64]) {
        check_values(from, 1);
        check_values(to, 1);
        check_values(state, 1);
        state[0] = if self.continuous {
            interpolate_angle(from[0], to[0], t)
        } else {
            from[0] + (to[0] - from[0]) * t
        };
    }

    fn compute_transform(&self, values: &[f64]) -> Isometry3<f64> {
        check_values(values, 1);
        Isometry3::from_parts(
            Translation3::identity(),
            UnitQuaternion::from_axis_angle(&self.axis, values[0]),
        )
    }

    fn compute_joint_state_values(&self, transform: &Isometry3<f64>, values: &mut [f64]) {
        check_values(values, 1);
        values[0] = self.axis.dot(&transform.rotation.scaled_axis());
    }
}

impl fmt::Display for RevoluteJointModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", JointType::Revolute, self.properties)
    }
}
