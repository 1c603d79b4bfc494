//! Single-axis translational joint.

use std::fmt;

use nalgebra::{Isometry3, Translation3, Unit, UnitQuaternion, Vector3};
use rand::RngCore;

use crate::bounds::{VariableBounds, check_bounds, check_values};
use crate::joint::{JointModel, JointProperties, JointType};
use crate::{Error, Result};

/// A joint sliding along a fixed axis
#[derive(Clone, Debug)]
pub struct PrismaticJointModel {
    properties: JointProperties,
    axis: Unit<Vector3<f64>>,
}

impl PrismaticJointModel {
    /// Create an unbounded joint along +X
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            properties: JointProperties::new(
                name.clone(),
                vec![name],
                vec![VariableBounds::unbounded()],
            ),
            axis: Vector3::x_axis(),
        }
    }

    /// Slide along `axis` instead of +X
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
}

impl JointModel for PrismaticJointModel {
    fn properties(&self) -> &JointProperties {
        &self.properties
    }

    fn joint_type(&self) -> JointType {
        JointType::Prismatic
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
        values[0] = bounds[0].sample_near(rng, near[0], distance);
    }

    fn enforce_bounds(&self, values: &mut [f64], bounds: &[VariableBounds]) -> bool {
        check_values(values, 1);
        check_bounds(bounds, 1);
        let clamped = bounds[0].clamp(values[0]);
        let changed = clamped != values[0];
        values[0] = clamped;
        changed
    }

    fn satisfies_bounds(&self, values: &[f64], bounds: &[VariableBounds], margin: f64) -> bool {
        check_values(values, 1);
        check_bounds(bounds, 1);
        bounds[0].contains(values[0], margin)
    }

    fn maximum_extent(&self, bounds: &[VariableBounds]) -> f64 {
        check_bounds(bounds, 1);
        bounds[0].extent()
    }

    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        check_values(a, 1);
        check_values(b, 1);
        (a[0] - b[0]).abs()
    }

    fn interpolate(&self, from: &[f64], to: &[f64], t: f64, state: &mut [f64]) {
        check_values(from, 1);
        check_values(to, 1);
        check_values(state, 1);
        state[0] = from[0] + (to[0] - from[0]) * t;
    }

    fn compute_transform(&self, values: &[f64]) -> Isometry3<f64> {
        check_values(values, 1);
        Isometry3::from_parts(
            Translation3::from(self.axis.into_inner() * values[0]),
            UnitQuaternion::identity(),
        )
    }

    fn compute_joint_state_values(&self, transform: &Isometry3<f64>, values: &mut [f64]) {
        check_values(values, 1);
        values[0] = self.axis.dot(&transform.translation.vector);
    }
}

impl fmt::Display for PrismaticJointModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", JointType::Prismatic, self.properties)
    }
}
