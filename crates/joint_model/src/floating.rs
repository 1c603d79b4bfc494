//! Free 3D motion: translation plus a unit quaternion.
//!
//! Variables, in order: `trans_x`, `trans_y`, `trans_z`, `rot_x`, `rot_y`,
//! `rot_z`, `rot_w`, each prefixed with `<name>/`. The bounds of the rotation
//! variables are informational; only the translation is clamped.

use std::f64::consts::{PI, TAU};
use std::fmt;

use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};
use rand::{Rng, RngCore};
use tracing::debug;

use crate::Result;
use crate::bounds::{VariableBounds, check_bounds, check_values};
use crate::joint::{AngularDistanceWeight, JointModel, JointProperties, JointType};

const COUNT: usize = 7;
const ROT: usize = 3;

/// Tolerance on the squared quaternion norm accepted as unit length
const NORM_TOLERANCE: f64 = f32::EPSILON as f64 * 10.0;

/// A joint with six degrees of freedom
#[derive(Clone, Debug)]
pub struct FloatingJointModel {
    properties: JointProperties,
    angular_distance_weight: AngularDistanceWeight,
}

impl FloatingJointModel {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let variable_names = [
            "trans_x", "trans_y", "trans_z", "rot_x", "rot_y", "rot_z", "rot_w",
        ]
        .iter()
        .map(|local| format!("{}/{}", name, local))
        .collect();
        let mut variable_bounds = vec![VariableBounds::unbounded(); 3];
        variable_bounds.extend(std::iter::repeat_n(VariableBounds::new(-1.0, 1.0), 4));
        Self {
            properties: JointProperties::new(name, variable_names, variable_bounds),
            angular_distance_weight: AngularDistanceWeight::default(),
        }
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

    pub fn angular_distance_weight(&self) -> f64 {
        self.angular_distance_weight.get()
    }

    pub fn set_angular_distance_weight(&self, weight: f64) -> Result<()> {
        self.angular_distance_weight.set(weight)?;
        debug!(joint = self.name(), weight, "angular distance weight updated");
        Ok(())
    }

    /// Rescale the quaternion to unit length; returns whether it changed.
    ///
    /// A zero quaternion becomes the identity rotation.
    pub fn normalize_rotation(&self, values: &mut [f64]) -> bool {
        check_values(values, COUNT);
        let quaternion = &mut values[ROT..];
        let norm_squared: f64 = quaternion.iter().map(|v| v * v).sum();
        if (norm_squared - 1.0).abs() <= f64::EPSILON * 4.0 {
            return false;
        }
        if norm_squared <= f64::EPSILON {
            quaternion.copy_from_slice(&[0.0, 0.0, 0.0, 1.0]);
        } else {
            let norm = norm_squared.sqrt();
            quaternion.iter_mut().for_each(|v| *v /= norm);
        }
        true
    }
}

fn translation(values: &[f64]) -> Vector3<f64> {
    Vector3::new(values[0], values[1], values[2])
}

fn rotation(values: &[f64]) -> UnitQuaternion<f64> {
    let q = Quaternion::new(values[6], values[3], values[4], values[5]);
    UnitQuaternion::try_new(q, f64::EPSILON).unwrap_or_else(UnitQuaternion::identity)
}

fn write_rotation(values: &mut [f64], rotation: &UnitQuaternion<f64>) {
    values[3] = rotation.i;
    values[4] = rotation.j;
    values[5] = rotation.k;
    values[6] = rotation.w;
}

/// Uniformly distributed rotation (Shoemake's method)
fn random_rotation(rng: &mut dyn RngCore) -> UnitQuaternion<f64> {
    let u1: f64 = rng.random();
    let u2: f64 = rng.random();
    let u3: f64 = rng.random();
    let a = (1.0 - u1).sqrt();
    let b = u1.sqrt();
    UnitQuaternion::new_normalize(Quaternion::new(
        b * (TAU * u3).cos(),
        a * (TAU * u2).sin(),
        a * (TAU * u2).cos(),
        b * (TAU * u3).sin(),
    ))
}

impl JointModel for FloatingJointModel {
    fn properties(&self) -> &JointProperties {
        &self.properties
    }

    fn joint_type(&self) -> JointType {
        JointType::Floating
    }

    fn default_values(&self, values: &mut [f64], bounds: &[VariableBounds]) {
        check_values(values, COUNT);
        check_bounds(bounds, COUNT);
        for (value, bound) in values[..ROT].iter_mut().zip(&bounds[..ROT]) {
            *value = bound.default_position();
        }
        write_rotation(values, &UnitQuaternion::identity());
    }

    fn random_values(
        &self,
        rng: &mut dyn RngCore,
        values: &mut [f64],
        bounds: &[VariableBounds],
    ) {
        check_values(values, COUNT);
        check_bounds(bounds, COUNT);
        for (value, bound) in values[..ROT].iter_mut().zip(&bounds[..ROT]) {
            *value = bound.sample(rng);
        }
        write_rotation(values, &random_rotation(rng));
    }

    fn random_values_near_by(
        &self,
        rng: &mut dyn RngCore,
        values: &mut [f64],
        bounds: &[VariableBounds],
        near: &[f64],
        distance: f64,
    ) {
        check_values(values, COUNT);
        check_values(near, COUNT);
        check_bounds(bounds, COUNT);
        for ((value, bound), center) in values[..ROT].iter_mut().zip(&bounds[..ROT]).zip(near) {
            *value = bound.sample_near(rng, *center, distance);
        }

        let angle_limit = distance.abs();
        let sampled = if angle_limit >= PI {
            random_rotation(rng)
        } else {
            let axis = random_rotation(rng).axis().unwrap_or_else(Vector3::x_axis);
            let angle = if angle_limit > 0.0 {
                rng.random_range(0.0..=angle_limit)
            } else {
                0.0
            };
            rotation(near) * UnitQuaternion::from_axis_angle(&axis, angle)
        };
        write_rotation(values, &sampled);
    }

    fn enforce_bounds(&self, values: &mut [f64], bounds: &[VariableBounds]) -> bool {
        check_bounds(bounds, COUNT);
        let mut changed = self.normalize_rotation(values);
        for (value, bound) in values[..ROT].iter_mut().zip(&bounds[..ROT]) {
            let clamped = bound.clamp(*value);
            if clamped != *value {
                *value = clamped;
                changed = true;
            }
        }
        changed
    }

    fn satisfies_bounds(&self, values: &[f64], bounds: &[VariableBounds], margin: f64) -> bool {
        check_values(values, COUNT);
        check_bounds(bounds, COUNT);
        let translation_ok = values[..ROT]
            .iter()
            .zip(bounds)
            .all(|(value, bound)| bound.contains(*value, margin));
        let norm_squared: f64 = values[ROT..].iter().map(|v| v * v).sum();
        translation_ok && (norm_squared - 1.0).abs() <= NORM_TOLERANCE
    }

    fn maximum_extent(&self, bounds: &[VariableBounds]) -> f64 {
        check_bounds(bounds, COUNT);
        let diagonal = Vector3::new(bounds[0].extent(), bounds[1].extent(), bounds[2].extent());
        diagonal.norm() + self.angular_distance_weight() * PI
    }

    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        check_values(a, COUNT);
        check_values(b, COUNT);
        let linear = (translation(a) - translation(b)).norm();
        linear + self.angular_distance_weight() * rotation(a).angle_to(&rotation(b))
    }

    fn interpolate(&self, from: &[f64], to: &[f64], t: f64, state: &mut [f64]) {
        check_values(from, COUNT);
        check_values(to, COUNT);
        check_values(state, COUNT);
        for ((value, a), b) in state[..ROT].iter_mut().zip(from).zip(to) {
            *value = a + (b - a) * t;
        }
        let start = rotation(from);
        let end = rotation(to);
        let blended = start
            .try_slerp(&end, t, f64::EPSILON)
            .unwrap_or(if t < 0.5 { start } else { end });
        write_rotation(state, &blended);
    }

    fn compute_transform(&self, values: &[f64]) -> Isometry3<f64> {
        check_values(values, COUNT);
        Isometry3::from_parts(Translation3::from(translation(values)), rotation(values))
    }

    fn compute_joint_state_values(&self, transform: &Isometry3<f64>, values: &mut [f64]) {
        check_values(values, COUNT);
        let t = &transform.translation.vector;
        values[0] = t.x;
        values[1] = t.y;
        values[2] = t.z;
        write_rotation(values, &transform.rotation);
    }
}

impl fmt::Display for FloatingJointModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", JointType::Floating, self.properties)
    }
}
