//! Declarative joint descriptions and the builders that turn them into shared
//! joint models.
//!
//! With the `serde` feature enabled, [`JointConfig`] deserializes from any
//! self-describing format, tagged by `type`:
//!
//! ```json
//! { "type": "planar", "name": "base", "angular_distance_weight": 0.5 }
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use nalgebra::Vector3;
use tracing::{debug, warn};

use crate::bounds::VariableBounds;
use crate::fixed::FixedJointModel;
use crate::floating::FloatingJointModel;
use crate::joint::{JointModel, JointType};
use crate::planar::PlanarJointModel;
use crate::prismatic::PrismaticJointModel;
use crate::revolute::RevoluteJointModel;
use crate::{Error, Result};

/// Description of one joint, as read from a robot configuration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum JointConfig {
    Fixed {
        name: String,
    },
    Revolute {
        name: String,
        axis: Option<[f64; 3]>,
        #[cfg_attr(feature = "serde", serde(default))]
        continuous: bool,
        bounds: Option<Vec<VariableBounds>>,
    },
    Prismatic {
        name: String,
        axis: Option<[f64; 3]>,
        bounds: Option<Vec<VariableBounds>>,
    },
    Planar {
        name: String,
        angular_distance_weight: Option<f64>,
        bounds: Option<Vec<VariableBounds>>,
    },
    Floating {
        name: String,
        angular_distance_weight: Option<f64>,
        bounds: Option<Vec<VariableBounds>>,
    },
}

impl JointConfig {
    pub fn name(&self) -> &str {
        match self {
            JointConfig::Fixed { name }
            | JointConfig::Revolute { name, .. }
            | JointConfig::Prismatic { name, .. }
            | JointConfig::Planar { name, .. }
            | JointConfig::Floating { name, .. } => name,
        }
    }

    pub fn joint_type(&self) -> JointType {
        match self {
            JointConfig::Fixed { .. } => JointType::Fixed,
            JointConfig::Revolute { .. } => JointType::Revolute,
            JointConfig::Prismatic { .. } => JointType::Prismatic,
            JointConfig::Planar { .. } => JointType::Planar,
            JointConfig::Floating { .. } => JointType::Floating,
        }
    }

    /// Build the joint model, placed at `joint_index` with its first variable
    /// at `first_variable_index` of the configuration vector
    pub fn build(
        &self,
        joint_index: usize,
        first_variable_index: usize,
    ) -> Result<Arc<dyn JointModel>> {
        if self.name().is_empty() {
            return Err(Error::InvalidConfiguration {
                message: format!("{} joint without a name", self.joint_type()),
            });
        }

        let joint: Arc<dyn JointModel> = match self {
            JointConfig::Fixed { name } => {
                Arc::new(FixedJointModel::new(name).with_indices(joint_index, first_variable_index))
            }
            JointConfig::Revolute {
                name,
                axis,
                continuous,
                bounds,
            } => {
                let mut joint = if *continuous {
                    RevoluteJointModel::continuous(name)
                } else {
                    RevoluteJointModel::new(name)
                };
                if let Some(axis) = axis {
                    joint = joint.with_axis(Vector3::from(*axis))?;
                }
                match bounds {
                    Some(_) if *continuous => {
                        warn!(joint = %name, "ignoring position bounds of continuous joint");
                    }
                    Some(bounds) => joint = joint.with_variable_bounds(marked(bounds))?,
                    None => {}
                }
                Arc::new(joint.with_indices(joint_index, first_variable_index))
            }
            JointConfig::Prismatic { name, axis, bounds } => {
                let mut joint = PrismaticJointModel::new(name);
                if let Some(axis) = axis {
                    joint = joint.with_axis(Vector3::from(*axis))?;
                }
                if let Some(bounds) = bounds {
                    joint = joint.with_variable_bounds(marked(bounds))?;
                }
                Arc::new(joint.with_indices(joint_index, first_variable_index))
            }
            JointConfig::Planar {
                name,
                angular_distance_weight,
                bounds,
            } => {
                let mut joint = PlanarJointModel::new(name);
                if let Some(bounds) = bounds {
                    joint = joint.with_variable_bounds(marked(bounds))?;
                }
                if let Some(weight) = angular_distance_weight {
                    joint.set_angular_distance_weight(*weight)?;
                }
                Arc::new(joint.with_indices(joint_index, first_variable_index))
            }
            JointConfig::Floating {
                name,
                angular_distance_weight,
                bounds,
            } => {
                let mut joint = FloatingJointModel::new(name);
                if let Some(bounds) = bounds {
                    joint = joint.with_variable_bounds(marked(bounds))?;
                }
                if let Some(weight) = angular_distance_weight {
                    joint.set_angular_distance_weight(*weight)?;
                }
                Arc::new(joint.with_indices(joint_index, first_variable_index))
            }
        };

        debug!(
            joint = joint.name(),
            joint_type = %joint.joint_type(),
            variables = joint.variable_count(),
            "built joint model"
        );
        Ok(joint)
    }
}

/// Bounds read from a description count as position limits wherever both
/// ends are finite.
fn marked(bounds: &[VariableBounds]) -> Vec<VariableBounds> {
    bounds
        .iter()
        .map(|b| VariableBounds {
            position_bounded: b.position_bounded || b.is_finite(),
            ..*b
        })
        .collect()
}

/// Build every joint of a kinematic chain, laying their variables out
/// consecutively in one configuration vector.
///
/// # Example
/// ```rust
/// use joint_model::config::{JointConfig, build_chain};
///
/// let chain = build_chain(&[
///     JointConfig::Planar { name: "base".into(), angular_distance_weight: None, bounds: None },
///     JointConfig::Revolute { name: "arm".into(), axis: None, continuous: false, bounds: None },
/// ])?;
/// assert_eq!(chain[1].first_variable_index(), 3);
/// # Ok::<(), joint_model::Error>(())
/// ```
pub fn build_chain(configs: &[JointConfig]) -> Result<Vec<Arc<dyn JointModel>>> {
    let mut names = HashSet::new();
    let mut joints = Vec::with_capacity(configs.len());
    let mut next_variable = 0;

    for (index, config) in configs.iter().enumerate() {
        if !names.insert(config.name()) {
            return Err(Error::InvalidConfiguration {
                message: format!("duplicate joint name '{}'", config.name()),
            });
        }
        let joint = config.build(index, next_variable)?;
        next_variable += joint.variable_count();
        joints.push(joint);
    }

    debug!(
        joints = joints.len(),
        variables = next_variable,
        "built kinematic chain"
    );
    Ok(joints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    use test_log::test;

    fn planar(name: &str) -> JointConfig {
        JointConfig::Planar {
            name: name.to_string(),
            angular_distance_weight: Some(0.25),
            bounds: None,
        }
    }

    #[test]
    fn test_build_planar() -> Result<()> {
        let joint = planar("base").build(0, 0)?;
        assert_eq!(joint.joint_type(), JointType::Planar);
        let d = joint.distance(&[0.0, 0.0, 0.0], &[0.0, 0.0, 2.0]);
        assert!((d - 0.5).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_build_applies_bounds() -> Result<()> {
        let mut x = VariableBounds::unbounded();
        x.min_position = -1.0;
        x.max_position = 1.0;
        let config = JointConfig::Prismatic {
            name: "slider".to_string(),
            axis: Some([0.0, 1.0, 0.0]),
            bounds: Some(vec![x]),
        };
        let joint = config.build(0, 0)?;
        let limits = joint.variable_limits();
        assert!(limits[0].has_position_limits);
        assert_eq!(limits[0].max_position, 1.0);
        Ok(())
    }

    #[test]
    fn test_build_rejects_bad_input() {
        let bad_weight = JointConfig::Floating {
            name: "body".to_string(),
            angular_distance_weight: Some(-1.0),
            bounds: None,
        };
        assert!(matches!(
            bad_weight.build(0, 0),
            Err(Error::InvalidWeight { .. })
        ));

        let bad_axis = JointConfig::Revolute {
            name: "elbow".to_string(),
            axis: Some([0.0, 0.0, 0.0]),
            continuous: false,
            bounds: None,
        };
        assert!(matches!(bad_axis.build(0, 0), Err(Error::InvalidAxis { .. })));

        let bad_arity = JointConfig::Planar {
            name: "base".to_string(),
            angular_distance_weight: None,
            bounds: Some(vec![VariableBounds::new(-1.0, 1.0)]),
        };
        assert!(matches!(
            bad_arity.build(0, 0),
            Err(Error::InvalidVariableCount {
                expected: 3,
                actual: 1
            })
        ));

        let unnamed = JointConfig::Fixed {
            name: String::new(),
        };
        assert!(unnamed.build(0, 0).is_err());
    }

    #[test]
    fn test_continuous_ignores_bounds() -> Result<()> {
        let config = JointConfig::Revolute {
            name: "wheel".to_string(),
            axis: None,
            continuous: true,
            bounds: Some(vec![VariableBounds::new(0.0, 0.1)]),
        };
        let joint = config.build(0, 0)?;
        assert_eq!(joint.variable_bounds()[0].max_position, PI);
        Ok(())
    }

    #[test]
    fn test_build_chain_layout() -> Result<()> {
        let chain = build_chain(&[
            planar("base"),
            JointConfig::Fixed {
                name: "mount".to_string(),
            },
            JointConfig::Revolute {
                name: "arm".to_string(),
                axis: None,
                continuous: false,
                bounds: None,
            },
            JointConfig::Floating {
                name: "tool".to_string(),
                angular_distance_weight: None,
                bounds: None,
            },
        ])?;

        let offsets: Vec<usize> = chain.iter().map(|j| j.first_variable_index()).collect();
        assert_eq!(offsets, vec![0, 3, 3, 4]);
        assert_eq!(chain[3].properties().index(), 3);

        let total: usize = chain.iter().map(|j| j.variable_count()).sum();
        let mut configuration = vec![0.0; total];
        chain[2].variable_slice_mut(&mut configuration)[0] = 0.5;
        assert_eq!(configuration[3], 0.5);
        Ok(())
    }

    #[test]
    fn test_build_chain_rejects_duplicates() {
        let result = build_chain(&[planar("base"), planar("base")]);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("duplicate joint name 'base'"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_chain() -> Result<()> {
        let json = r#"[
            { "type": "planar", "name": "base", "angular_distance_weight": 0.5 },
            { "type": "revolute", "name": "arm", "axis": [0.0, 1.0, 0.0],
              "bounds": [{ "min_position": -1.0, "max_position": 1.0 }] },
            { "type": "revolute", "name": "wheel", "continuous": true }
        ]"#;
        let configs: Vec<JointConfig> =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfiguration {
                message: e.to_string(),
            })?;
        assert_eq!(configs[0].joint_type(), JointType::Planar);

        let chain = build_chain(&configs)?;
        assert_eq!(chain[1].variable_bounds()[0].min_position, -1.0);
        assert!(chain[1].variable_limits()[0].has_position_limits);
        assert_eq!(chain[2].first_variable_index(), 4);
        Ok(())
    }
}
