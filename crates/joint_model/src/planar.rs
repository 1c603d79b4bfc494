//! Planar joint: translation in the x-y plane plus rotation about z (SE(2)).
//!
//! Variables, in order: `<name>/x`, `<name>/y`, `<name>/theta`. The canonical
//! range of `theta` is `[-π, π]`.

use std::f64::consts::PI;
use std::fmt;

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use rand::{Rng, RngCore};
use tracing::debug;

use crate::Result;
use crate::angles::{angular_distance, interpolate_angle, normalize_angle};
use crate::bounds::{VariableBounds, check_bounds, check_values};
use crate::joint::{AngularDistanceWeight, JointModel, JointProperties, JointType};

const X: usize = 0;
const Y: usize = 1;
const THETA: usize = 2;

/// A joint moving freely in a plane
#[derive(Clone, Debug)]
pub struct PlanarJointModel {
    properties: JointProperties,
    angular_distance_weight: AngularDistanceWeight,
}

impl PlanarJointModel {
    /// Create a planar joint with unbounded x/y and theta in `[-π, π]`
    ///
    /// # Example
    /// ```rust
    /// use joint_model::{JointModel, PlanarJointModel};
    ///
    /// let joint = PlanarJointModel::new("base");
    /// assert_eq!(joint.variable_names()[2], "base/theta");
    /// assert_eq!(joint.state_space_dimension(), 3);
    /// ```
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let variable_names = ["x", "y", "theta"]
            .iter()
            .map(|local| format!("{}/{}", name, local))
            .collect();
        let variable_bounds = vec![
            VariableBounds::unbounded(),
            VariableBounds::unbounded(),
            VariableBounds::new(-PI, PI),
        ];
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

    /// Replace the intrinsic bounds of x, y and theta
    pub fn with_variable_bounds(mut self, bounds: Vec<VariableBounds>) -> Result<Self> {
        self.properties = self.properties.with_variable_bounds(bounds)?;
        Ok(self)
    }

    pub fn angular_distance_weight(&self) -> f64 {
        self.angular_distance_weight.get()
    }

    /// Change how much rotation counts against translation in [`JointModel::distance`].
    ///
    /// Safe to call while other threads read the joint; they observe either
    /// the old or the new weight.
    pub fn set_angular_distance_weight(&self, weight: f64) -> Result<()> {
        self.angular_distance_weight.set(weight)?;
        debug!(joint = self.name(), weight, "angular distance weight updated");
        Ok(())
    }

    /// Bring theta into `[-π, π]`; returns whether it changed.
    pub fn normalize_rotation(&self, values: &mut [f64]) -> bool {
        check_values(values, 3);
        let normalized = normalize_angle(values[THETA]);
        if normalized == values[THETA] {
            return false;
        }
        values[THETA] = normalized;
        true
    }
}

impl JointModel for PlanarJointModel {
    fn properties(&self) -> &JointProperties {
        &self.properties
    }

    fn joint_type(&self) -> JointType {
        JointType::Planar
    }

    fn default_values(&self, values: &mut [f64], bounds: &[VariableBounds]) {
        check_values(values, 3);
        check_bounds(bounds, 3);
        for (value, bound) in values.iter_mut().zip(bounds) {
            *value = bound.default_position();
        }
    }

    fn random_values(
        &self,
        rng: &mut dyn RngCore,
        values: &mut [f64],
        bounds: &[VariableBounds],
    ) {
        check_values(values, 3);
        check_bounds(bounds, 3);
        values[X] = bounds[X].sample(rng);
        values[Y] = bounds[Y].sample(rng);

        let low = bounds[THETA].min_position.max(-PI);
        let high = bounds[THETA].max_position.min(PI);
        values[THETA] = if low <= high {
            rng.random_range(low..=high)
        } else {
            bounds[THETA].sample(rng)
        };
    }

    fn random_values_near_by(
        &self,
        rng: &mut dyn RngCore,
        values: &mut [f64],
        bounds: &[VariableBounds],
        near: &[f64],
        distance: f64,
    ) {
        check_values(values, 3);
        check_values(near, 3);
        check_bounds(bounds, 3);
        values[X] = bounds[X].sample_near(rng, near[X], distance);
        values[Y] = bounds[Y].sample_near(rng, near[Y], distance);

        // Past π the neighbourhood already covers the whole circle.
        let arc = distance.abs().min(PI);
        let offset = if arc > 0.0 {
            rng.random_range(-arc..=arc)
        } else {
            0.0
        };
        values[THETA] = bounds[THETA].clamp(normalize_angle(near[THETA] + offset));
    }

    fn enforce_bounds(&self, values: &mut [f64], bounds: &[VariableBounds]) -> bool {
        check_bounds(bounds, 3);
        // Normalize before clamping so theta cannot be left outside [-π, π].
        let mut changed = self.normalize_rotation(values);
        for (value, bound) in values.iter_mut().zip(bounds) {
            let clamped = bound.clamp(*value);
            if clamped != *value {
                *value = clamped;
                changed = true;
            }
        }
        changed
    }

    fn satisfies_bounds(&self, values: &[f64], bounds: &[VariableBounds], margin: f64) -> bool {
        check_values(values, 3);
        check_bounds(bounds, 3);
        values
            .iter()
            .zip(bounds)
            .all(|(value, bound)| bound.contains(*value, margin))
    }

    fn maximum_extent(&self, bounds: &[VariableBounds]) -> f64 {
        check_bounds(bounds, 3);
        let dx = bounds[X].extent();
        let dy = bounds[Y].extent();
        let dtheta = bounds[THETA].extent().min(PI);
        dx.hypot(dy) + self.angular_distance_weight() * dtheta
    }

    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        check_values(a, 3);
        check_values(b, 3);
        let dx = a[X] - b[X];
        let dy = a[Y] - b[Y];
        dx.hypot(dy) + self.angular_distance_weight() * angular_distance(a[THETA], b[THETA])
    }

    fn interpolate(&self, from: &[f64], to: &[f64], t: f64, state: &mut [f64]) {
        check_values(from, 3);
        check_values(to, 3);
        check_values(state, 3);
        state[X] = from[X] + (to[X] - from[X]) * t;
        state[Y] = from[Y] + (to[Y] - from[Y]) * t;
        state[THETA] = interpolate_angle(from[THETA], to[THETA], t);
    }

    fn compute_transform(&self, values: &[f64]) -> Isometry3<f64> {
        check_values(values, 3);
        Isometry3::from_parts(
            Translation3::new(values[X], values[Y], 0.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), values[THETA]),
        )
    }

    /// Out-of-plane translation and rotation are discarded, not rejected.
    fn compute_joint_state_values(&self, transform: &Isometry3<f64>, values: &mut [f64]) {
        check_values(values, 3);
        let translation = &transform.translation.vector;
        let heading = transform.rotation * Vector3::x();
        values[X] = translation.x;
        values[Y] = translation.y;
        values[THETA] = heading.y.atan2(heading.x);
    }

    fn update_transform(&self, values: &[f64], transform: &mut Isometry3<f64>) {
        check_values(values, 3);
        transform.translation.vector = Vector3::new(values[X], values[Y], 0.0);
        transform.rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), values[THETA]);
    }
}

impl fmt::Display for PlanarJointModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", JointType::Planar, self.properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::f64::consts::TAU;
    use test_log::test;

    fn bounded() -> Vec<VariableBounds> {
        vec![
            VariableBounds::new(-2.0, 3.0),
            VariableBounds::new(-1.0, 1.0),
            VariableBounds::new(-PI, PI),
        ]
    }

    #[test]
    fn test_planar_creation() {
        let joint = PlanarJointModel::new("base");
        assert_eq!(joint.name(), "base");
        assert_eq!(joint.joint_type(), JointType::Planar);
        assert_eq!(
            joint.variable_names(),
            &["base/x".to_string(), "base/y".to_string(), "base/theta".to_string()]
        );
        assert_eq!(joint.state_space_dimension(), 3);
        assert_eq!(joint.angular_distance_weight(), 1.0);
        assert!(!joint.variable_bounds()[X].position_bounded);
        assert_eq!(joint.variable_bounds()[THETA].max_position, PI);
    }

    #[test]
    fn test_default_values_clip_to_bounds() {
        let joint = PlanarJointModel::new("base");
        let mut values = [9.0; 3];
        joint.default_values(&mut values, joint.variable_bounds());
        assert_eq!(values, [0.0, 0.0, 0.0]);

        let shifted = vec![
            VariableBounds::new(1.0, 2.0),
            VariableBounds::new(-3.0, -1.5),
            VariableBounds::new(0.5, 1.0),
        ];
        joint.default_values(&mut values, &shifted);
        assert_eq!(values, [1.0, -1.5, 0.5]);
        assert!(joint.satisfies_bounds(&values, &shifted, 0.0));
    }

    #[test]
    fn test_normalize_rotation_reports_change() {
        let joint = PlanarJointModel::new("base");
        let mut values = [0.0, 0.0, 3.0 * PI / 2.0];
        assert!(joint.normalize_rotation(&mut values));
        assert!((values[THETA] + PI / 2.0).abs() < 1e-12);
        assert!(!joint.normalize_rotation(&mut values));

        let mut inside = [1.0, 2.0, -1.0];
        assert!(!joint.normalize_rotation(&mut inside));
        assert_eq!(inside, [1.0, 2.0, -1.0]);
    }

    #[test]
    fn test_enforce_bounds_normalizes_then_clamps() {
        let joint = PlanarJointModel::new("base");
        let bounds = bounded();
        let mut values = [10.0, -4.0, TAU + 0.5];
        assert!(joint.enforce_bounds(&mut values, &bounds));
        assert_eq!(values[X], 3.0);
        assert_eq!(values[Y], -1.0);
        assert!((values[THETA] - 0.5).abs() < 1e-12);
        assert!(joint.satisfies_bounds(&values, &bounds, 0.0));

        let snapshot = values;
        assert!(!joint.enforce_bounds(&mut values, &bounds));
        assert_eq!(values, snapshot);
    }

    #[test]
    fn test_satisfies_bounds_margin() {
        let joint = PlanarJointModel::new("base");
        let bounds = bounded();
        let values = [3.0, 0.0, 0.0];
        assert!(joint.satisfies_bounds(&values, &bounds, 0.0));
        assert!(!joint.satisfies_bounds(&values, &bounds, 0.01));
        assert!(!joint.satisfies_bounds(&[0.0, 0.0, 3.5], &bounds, 0.0));
    }

    #[test]
    fn test_distance_uses_shortest_arc() {
        let joint = PlanarJointModel::new("base");
        let d = joint.distance(&[0.0, 0.0, 3.0], &[0.0, 0.0, -3.0]);
        assert!((d - (TAU - 6.0)).abs() < 1e-9, "distance was {}", d);

        let d = joint.distance(&[0.0, 0.0, 0.0], &[3.0, 4.0, 0.0]);
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_distance_weight_scales_rotation() -> Result<()> {
        let joint = PlanarJointModel::new("base");
        joint.set_angular_distance_weight(0.5)?;
        let d = joint.distance(&[3.0, 4.0, 1.0], &[0.0, 0.0, 0.0]);
        assert!((d - 5.5).abs() < 1e-12);

        assert!(joint.set_angular_distance_weight(-0.1).is_err());
        assert_eq!(joint.angular_distance_weight(), 0.5);
        Ok(())
    }

    #[test]
    fn test_interpolate_endpoints_and_wrap() {
        let joint = PlanarJointModel::new("base");
        let from = [0.0, 1.0, 3.0];
        let to = [2.0, -1.0, -3.0];
        let mut state = [0.0; 3];

        joint.interpolate(&from, &to, 0.0, &mut state);
        assert_eq!(state, from);

        joint.interpolate(&from, &to, 1.0, &mut state);
        assert!((state[X] - 2.0).abs() < 1e-12);
        assert!((state[Y] + 1.0).abs() < 1e-12);
        assert!(angular_distance(state[THETA], -3.0) < 1e-12);

        joint.interpolate(&from, &to, 0.5, &mut state);
        assert!((state[X] - 1.0).abs() < 1e-12);
        assert!(PI - state[THETA].abs() < 1e-9, "theta was {}", state[THETA]);
    }

    #[test]
    fn test_maximum_extent() -> Result<()> {
        let joint = PlanarJointModel::new("base");
        let bounds = vec![
            VariableBounds::new(0.0, 3.0),
            VariableBounds::new(0.0, 4.0),
            VariableBounds::new(-PI, PI),
        ];
        assert!((joint.maximum_extent(&bounds) - (5.0 + PI)).abs() < 1e-12);

        joint.set_angular_distance_weight(2.0)?;
        assert!((joint.maximum_extent(&bounds) - (5.0 + TAU)).abs() < 1e-12);

        let narrow = vec![
            VariableBounds::new(0.0, 3.0),
            VariableBounds::new(0.0, 4.0),
            VariableBounds::new(0.0, 0.5),
        ];
        assert!((joint.maximum_extent(&narrow) - 6.0).abs() < 1e-12);

        assert_eq!(joint.maximum_extent(joint.variable_bounds()), f64::INFINITY);
        Ok(())
    }

    #[test]
    fn test_random_values_within_bounds() {
        let joint = PlanarJointModel::new("base");
        let bounds = bounded();
        let mut rng = StdRng::seed_from_u64(42);
        let mut values = [0.0; 3];
        let (mut min_x, mut max_x) = (f64::MAX, f64::MIN);
        let (mut min_theta, mut max_theta) = (f64::MAX, f64::MIN);
        for _ in 0..2000 {
            joint.random_values(&mut rng, &mut values, &bounds);
            assert!(joint.satisfies_bounds(&values, &bounds, 0.0));
            min_x = min_x.min(values[X]);
            max_x = max_x.max(values[X]);
            min_theta = min_theta.min(values[THETA]);
            max_theta = max_theta.max(values[THETA]);
        }
        assert!(min_x < -1.9 && max_x > 2.9);
        assert!(min_theta < -3.0 && max_theta > 3.0);
    }

    #[test]
    fn test_random_values_are_reproducible() {
        let joint = PlanarJointModel::new("base");
        let bounds = bounded();
        let mut a = [0.0; 3];
        let mut b = [0.0; 3];
        joint.random_values(&mut StdRng::seed_from_u64(5), &mut a, &bounds);
        joint.random_values(&mut StdRng::seed_from_u64(5), &mut b, &bounds);
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_values_near_by() {
        let joint = PlanarJointModel::new("base");
        let bounds = bounded();
        let mut rng = StdRng::seed_from_u64(3);
        let near = [2.9, 0.0, 3.0];
        let mut values = [0.0; 3];
        for _ in 0..500 {
            joint.random_values_near_by(&mut rng, &mut values, &bounds, &near, 0.3);
            assert!(joint.satisfies_bounds(&values, &bounds, 0.0));
            assert!((values[X] - near[X]).abs() <= 0.3 + 1e-12);
            assert!((values[Y] - near[Y]).abs() <= 0.3 + 1e-12);
            assert!(angular_distance(values[THETA], near[THETA]) <= 0.3 + 1e-9);
        }
    }

    #[test]
    fn test_transform_round_trip() {
        let joint = PlanarJointModel::new("base");
        for v in [[1.5, -2.0, 2.9], [0.0, 0.0, -3.1]] {
            let transform = joint.compute_transform(&v);
            let mut recovered = [0.0; 3];
            joint.compute_joint_state_values(&transform, &mut recovered);
            assert!((recovered[X] - v[X]).abs() < 1e-12);
            assert!((recovered[Y] - v[Y]).abs() < 1e-12);
            assert!(angular_distance(recovered[THETA], v[THETA]) < 1e-9);
        }
    }

    #[test]
    fn test_transform_is_planar() {
        let joint = PlanarJointModel::new("base");
        let transform = joint.compute_transform(&[1.0, 2.0, PI / 2.0]);
        assert_eq!(transform.translation.vector.z, 0.0);
        let axis = transform.rotation.axis().unwrap();
        assert!((axis.into_inner() - Vector3::z()).norm() < 1e-12);
        assert!((transform.rotation.angle() - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_plane_input_is_truncated() {
        let joint = PlanarJointModel::new("base");
        let transform = Isometry3::from_parts(
            Translation3::new(1.0, -1.0, 5.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.7)
                * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.3),
        );
        let mut values = [0.0; 3];
        joint.compute_joint_state_values(&transform, &mut values);
        assert_eq!(values[X], 1.0);
        assert_eq!(values[Y], -1.0);
        assert!((values[THETA] - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_update_transform_matches_compute() {
        let joint = PlanarJointModel::new("base");
        let mut transform = Isometry3::translation(4.0, 5.0, 6.0);
        for v in [[1.0, 2.0, 0.3], [-1.0, 0.5, -2.8]] {
            joint.update_transform(&v, &mut transform);
            let fresh = joint.compute_transform(&v);
            assert!((transform.to_matrix() - fresh.to_matrix()).norm() < 1e-15);
        }
    }

    #[test]
    #[should_panic(expected = "expected 3 variable values")]
    fn test_wrong_arity_panics() {
        let joint = PlanarJointModel::new("base");
        joint.distance(&[0.0, 0.0], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_display() {
        let joint = PlanarJointModel::new("base").with_indices(1, 4);
        let display_str = joint.to_string();
        assert!(display_str.starts_with("planar joint 'base'"));
        assert!(display_str.contains("variables: 4..7"));
    }
}
