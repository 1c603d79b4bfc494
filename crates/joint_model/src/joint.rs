use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use nalgebra::Isometry3;
use rand::RngCore;

use crate::bounds::{JointLimits, VariableBounds};
use crate::{Error, Result};

/// The joint families provided by this crate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum JointType {
    Fixed,
    Revolute,
    Prismatic,
    Planar,
    Floating,
}

impl fmt::Display for JointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JointType::Fixed => "fixed",
            JointType::Revolute => "revolute",
            JointType::Prismatic => "prismatic",
            JointType::Planar => "planar",
            JointType::Floating => "floating",
        };
        f.write_str(name)
    }
}

/// Identity and layout data common to every joint family
#[derive(Clone, Debug)]
pub struct JointProperties {
    /// Name of the joint
    name: String,

    /// Index of this joint in the kinematic chain
    index: usize,

    /// Index of this joint's first variable in the configuration vector
    first_variable_index: usize,

    /// Index of the parent link
    parent_link_index: usize,

    /// Index of the child link
    child_link_index: usize,

    /// Full variable names, in configuration-vector order
    variable_names: Vec<String>,

    /// Intrinsic bounds, one per variable
    variable_bounds: Vec<VariableBounds>,
}

impl JointProperties {
    /// Create properties for a joint with the given variables
    ///
    /// # Panics
    /// Panics if the number of names and bounds differ.
    pub fn new(
        name: String,
        variable_names: Vec<String>,
        variable_bounds: Vec<VariableBounds>,
    ) -> Self {
        assert_eq!(
            variable_names.len(),
            variable_bounds.len(),
            "every variable needs bounds"
        );
        Self {
            name,
            index: 0,
            first_variable_index: 0,
            parent_link_index: 0,
            child_link_index: 1,
            variable_names,
            variable_bounds,
        }
    }

    /// Place the joint in a chain
    pub fn with_indices(mut self, index: usize, first_variable_index: usize) -> Self {
        self.index = index;
        self.first_variable_index = first_variable_index;
        self
    }

    /// Attach the joint between two links
    pub fn with_links(mut self, parent_link_index: usize, child_link_index: usize) -> Self {
        self.parent_link_index = parent_link_index;
        self.child_link_index = child_link_index;
        self
    }

    /// Replace the intrinsic bounds
    pub fn with_variable_bounds(mut self, bounds: Vec<VariableBounds>) -> Result<Self> {
        if bounds.len() != self.variable_names.len() {
            return Err(Error::InvalidVariableCount {
                expected: self.variable_names.len(),
                actual: bounds.len(),
            });
        }
        if let Some(b) = bounds.iter().find(|b| !(b.min_position <= b.max_position)) {
            return Err(Error::InvalidBounds {
                min: b.min_position,
                max: b.max_position,
            });
        }
        self.variable_bounds = bounds;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn first_variable_index(&self) -> usize {
        self.first_variable_index
    }

    pub fn parent_link_index(&self) -> usize {
        self.parent_link_index
    }

    pub fn child_link_index(&self) -> usize {
        self.child_link_index
    }

    pub fn variable_names(&self) -> &[String] {
        &self.variable_names
    }

    pub fn variable_bounds(&self) -> &[VariableBounds] {
        &self.variable_bounds
    }
}

impl fmt::Display for JointProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "joint '{}' (index: {}, variables: {}..{}, parent: {} -> child: {})",
            self.name,
            self.index,
            self.first_variable_index,
            self.first_variable_index + self.variable_names.len(),
            self.parent_link_index,
            self.child_link_index
        )
    }
}

/// Weight of rotational against translational distance.
///
/// Stored as the bits of an `f64` in an atomic so a joint model shared
/// between threads can be retuned without a lock. Readers see either the
/// old or the new weight.
pub struct AngularDistanceWeight(AtomicU64);

impl AngularDistanceWeight {
    pub fn new(weight: f64) -> Result<Self> {
        validate_weight(weight)?;
        Ok(Self(AtomicU64::new(weight.to_bits())))
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, weight: f64) -> Result<()> {
        validate_weight(weight)?;
        self.0.store(weight.to_bits(), Ordering::Relaxed);
        Ok(())
    }
}

fn validate_weight(weight: f64) -> Result<()> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidWeight { weight })
    }
}

impl Default for AngularDistanceWeight {
    fn default() -> Self {
        Self(AtomicU64::new(1.0f64.to_bits()))
    }
}

impl Clone for AngularDistanceWeight {
    fn clone(&self) -> Self {
        Self(AtomicU64::new(self.0.load(Ordering::Relaxed)))
    }
}

impl fmt::Debug for AngularDistanceWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AngularDistanceWeight")
            .field(&self.get())
            .finish()
    }
}

/// The configuration space of one joint.
///
/// Implementations hold no per-query state: every operation reads and writes
/// only the buffers passed in, and every bounds-sensitive operation uses the
/// `bounds` argument rather than the intrinsic bounds. One instance can
/// therefore be shared by reference across threads and across callers that
/// impose different limits.
///
/// Value and bounds slices must have exactly [`JointModel::variable_count`]
/// entries; a mismatch is a caller bug and panics.
pub trait JointModel: Send + Sync + fmt::Debug {
    fn properties(&self) -> &JointProperties;

    fn joint_type(&self) -> JointType;

    fn name(&self) -> &str {
        self.properties().name()
    }

    fn variable_names(&self) -> &[String] {
        self.properties().variable_names()
    }

    /// Bounds the joint was described with, before any caller override
    fn variable_bounds(&self) -> &[VariableBounds] {
        self.properties().variable_bounds()
    }

    fn variable_count(&self) -> usize {
        self.properties().variable_names().len()
    }

    /// Dimension of the configuration space
    fn state_space_dimension(&self) -> usize {
        self.variable_count()
    }

    fn first_variable_index(&self) -> usize {
        self.properties().first_variable_index()
    }

    /// Position of a variable within this joint's slice
    fn variable_index(&self, name: &str) -> Option<usize> {
        self.variable_names().iter().position(|n| n == name)
    }

    /// This joint's values within a whole configuration vector
    fn variable_slice<'a>(&self, configuration: &'a [f64]) -> &'a [f64] {
        let start = self.first_variable_index();
        &configuration[start..start + self.variable_count()]
    }

    fn variable_slice_mut<'a>(&self, configuration: &'a mut [f64]) -> &'a mut [f64] {
        let start = self.first_variable_index();
        &mut configuration[start..start + self.variable_count()]
    }

    /// Intrinsic limits of every variable, in variable order
    fn variable_limits(&self) -> Vec<JointLimits> {
        self.variable_names()
            .iter()
            .zip(self.variable_bounds())
            .map(|(name, bounds)| JointLimits::from_bounds(name.clone(), bounds))
            .collect()
    }

    /// Intrinsic bounds tightened by named overrides.
    ///
    /// The returned set is owned by the caller and is what gets passed to the
    /// bounds-sensitive operations.
    fn variable_bounds_with(
        &self,
        overrides: &[(&str, VariableBounds)],
    ) -> Result<Vec<VariableBounds>> {
        let mut bounds = self.variable_bounds().to_vec();
        for (name, bound) in overrides {
            let index = self
                .variable_index(name)
                .ok_or_else(|| Error::UnknownVariable {
                    joint: self.name().to_string(),
                    variable: name.to_string(),
                })?;
            bounds[index] = bounds[index].intersect(bound)?;
        }
        Ok(bounds)
    }

    /// Fill `values` with a deterministic configuration inside `bounds`
    fn default_values(&self, values: &mut [f64], bounds: &[VariableBounds]);

    /// Fill `values` with a uniform sample inside `bounds`
    fn random_values(
        &self,
        rng: &mut dyn RngCore,
        values: &mut [f64],
        bounds: &[VariableBounds],
    );

    /// Fill `values` with a sample within `distance` of `near`, inside `bounds`
    fn random_values_near_by(
        &self,
        rng: &mut dyn RngCore,
        values: &mut [f64],
        bounds: &[VariableBounds],
        near: &[f64],
        distance: f64,
    );

    /// Bring `values` inside `bounds`; returns whether anything changed
    fn enforce_bounds(&self, values: &mut [f64], bounds: &[VariableBounds]) -> bool;

    /// Whether `values` lie inside `bounds` shrunk by `margin`
    fn satisfies_bounds(&self, values: &[f64], bounds: &[VariableBounds], margin: f64) -> bool;

    /// Largest [`JointModel::distance`] between two configurations inside `bounds`
    fn maximum_extent(&self, bounds: &[VariableBounds]) -> f64;

    fn distance(&self, a: &[f64], b: &[f64]) -> f64;

    /// Write the configuration at fraction `t` along the geodesic from `from` to `to`
    fn interpolate(&self, from: &[f64], to: &[f64], t: f64, state: &mut [f64]);

    /// The joint's rigid motion for the given values
    fn compute_transform(&self, values: &[f64]) -> Isometry3<f64>;

    /// Recover joint values from a rigid motion
    fn compute_joint_state_values(&self, transform: &Isometry3<f64>, values: &mut [f64]);

    /// Same result as [`JointModel::compute_transform`], written into an existing buffer
    fn update_transform(&self, values: &[f64], transform: &mut Isometry3<f64>) {
        *transform = self.compute_transform(values);
    }
}
