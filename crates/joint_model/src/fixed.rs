//! A joint with no degrees of freedom.

use std::fmt;

use nalgebra::Isometry3;
use rand::RngCore;

use crate::bounds::{VariableBounds, check_bounds, check_values};
use crate::joint::{JointModel, JointProperties, JointType};

/// Rigidly connects two links
#[derive(Clone, Debug)]
pub struct FixedJointModel {
    properties: JointProperties,
}

impl FixedJointModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            properties: JointProperties::new(name.into(), Vec::new(), Vec::new()),
        }
    }

    /// Place the joint in a chain
    pub fn with_indices(mut self, index: usize, first_variable_index: usize) -> Self {
        self.properties = self.properties.with_indices(index, first_variable_index);
        self
    }
}

impl JointModel for FixedJointModel {
    fn properties(&self) -> &JointProperties {
        &self.properties
    }

    fn joint_type(&self) -> JointType {
        JointType::Fixed
    }

    fn default_values(&self, values: &mut [f64], bounds: &[VariableBounds]) {
        check_values(values, 0);
        check_bounds(bounds, 0);
    }

    fn random_values(
        &self,
        _rng: &mut dyn RngCore,
        values: &mut [f64],
        bounds: &[VariableBounds],
    ) {
        check_values(values, 0);
        check_bounds(bounds, 0);
    }

    fn random_values_near_by(
        &self,
        _rng: &mut dyn RngCore,
        values: &mut [f64],
        bounds: &[VariableBounds],
        near: &[f64],
        _distance: f64,
    ) {
        check_values(values, 0);
        check_values(near, 0);
        check_bounds(bounds, 0);
    }

    fn enforce_bounds(&self, values: &mut [f64], bounds: &[VariableBounds]) -> bool {
        check_values(values, 0);
        check_bounds(bounds, 0);
        false
    }

    fn satisfies_bounds(&self, values: &[f64], bounds: &[VariableBounds], _margin: f64) -> bool {
        check_values(values, 0);
        check_bounds(bounds, 0);
        true
    }

    fn maximum_extent(&self, bounds: &[VariableBounds]) -> f64 {
        check_bounds(bounds, 0);
        0.0
    }

    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        check_values(a, 0);
        check_values(b, 0);
        0.0
    }

    fn interpolate(&self, from: &[f64], to: &[f64], _t: f64, state: &mut [f64]) {
        check_values(from, 0);
        check_values(to, 0);
        check_values(state, 0);
    }

    fn compute_transform(&self, values: &[f64]) -> Isometry3<f64> {
        check_values(values, 0);
        Isometry3::identity()
    }

    fn compute_joint_state_values(&self, _transform: &Isometry3<f64>, values: &mut [f64]) {
        check_values(values, 0);
    }
}

impl fmt::Display for FixedJointModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", JointType::Fixed, self.properties)
    }
}
