//! # Joint Model Library
//!
//! Configuration spaces of robot joints, as used by sampling-based motion
//! planners and kinematics solvers. Each joint model can sample, bound,
//! measure and interpolate its variable values, and map them to and from a
//! rigid transform.
//!
//! ## Features
//!
//! - One [`JointModel`] trait shared by fixed, revolute, prismatic, planar
//!   and floating joints
//! - Bounds are passed in on every call, so one shared model serves callers
//!   with different limits
//! - Stateless operations: models are `Send + Sync` and need no locking
//! - Transforms are nalgebra [`Isometry3`] values
//!
//! ## Example
//!
//! ```rust
//! use joint_model::{JointModel, PlanarJointModel};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let joint = PlanarJointModel::new("base");
//! let bounds = joint.variable_bounds_with(&[
//!     ("base/x", joint_model::VariableBounds::new(-1.0, 1.0)),
//!     ("base/y", joint_model::VariableBounds::new(-1.0, 1.0)),
//! ])?;
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let mut values = [0.0; 3];
//! joint.random_values(&mut rng, &mut values, &bounds);
//! assert!(joint.satisfies_bounds(&values, &bounds, 0.0));
//!
//! let transform = joint.compute_transform(&values);
//! let mut recovered = [0.0; 3];
//! joint.compute_joint_state_values(&transform, &mut recovered);
//! assert!(joint.distance(&values, &recovered) < 1e-9);
//! # Ok::<(), joint_model::Error>(())
//! ```

pub mod angles;
pub mod bounds;
pub mod config;
pub mod fixed;
pub mod floating;
pub mod joint;
pub mod planar;
pub mod prismatic;
pub mod revolute;

pub use bounds::{JointLimits, VariableBounds};
pub use config::{JointConfig, build_chain};
pub use fixed::FixedJointModel;
pub use floating::FloatingJointModel;
pub use joint::{AngularDistanceWeight, JointModel, JointProperties, JointType};
pub use nalgebra::{Isometry3, Vector3};
pub use planar::PlanarJointModel;
pub use prismatic::PrismaticJointModel;
pub use revolute::RevoluteJointModel;

/// Common result type for this library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or reconfiguring joint models.
///
/// Sampling, bounds and metric operations never fail; passing them slices of
/// the wrong length is a programming error and panics.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Lower bound above upper bound, or NaN
    #[error("Invalid bounds [{min}, {max}]")]
    InvalidBounds { min: f64, max: f64 },

    /// Angular distance weight that is negative or not finite
    #[error("Invalid angular distance weight {weight}: must be finite and non-negative")]
    InvalidWeight { weight: f64 },

    /// Joint axis of zero length
    #[error("Joint '{joint}' has a zero-length axis")]
    InvalidAxis { joint: String },

    /// Invalid variable count
    #[error("Expected {expected} variables, got {actual}")]
    InvalidVariableCount { expected: usize, actual: usize },

    /// Variable name not owned by the joint
    #[error("Joint '{joint}' has no variable '{variable}'")]
    UnknownVariable { joint: String, variable: String },

    /// Invalid joint configuration
    #[error("Invalid joint configuration: {message}")]
    InvalidConfiguration { message: String },
}
