use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Options for a [`ForceSimulation`](super::ForceSimulation).
///
/// Deserializes from a partial camelCase JSON object; missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForceConfig {
    /// Magnitude of the many-body charge. Nodes always push each other apart; `0` disables
    /// repulsion.
    pub repulsion_strength: f64,
    /// Rest length for links that do not carry their own.
    pub link_distance: f64,
    /// Spring stiffness in `0..=1`, further divided by the smaller endpoint degree.
    pub link_strength: f64,
    pub center_x: f64,
    pub center_y: f64,
    /// Fraction of the centroid offset applied per tick.
    pub center_strength: f64,
    /// Velocity multiplier applied every tick (`1` is frictionless).
    pub velocity_decay: f64,
    pub alpha_decay: f64,
    /// Once alpha drops below this the simulation settles.
    pub alpha_min: f64,
    /// Resting energy floor when no interaction is active.
    pub alpha_target: f64,
    pub initial_alpha: f64,
    /// Energy floor held while at least one node is pinned.
    pub interaction_alpha_target: f64,
    /// Separation clamp for repulsion, avoiding blow-ups for near-coincident nodes.
    pub min_distance: f64,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            repulsion_strength: 200.0,
            link_distance: 50.0,
            link_strength: 1.0,
            center_x: 0.0,
            center_y: 0.0,
            center_strength: 0.1,
            velocity_decay: 0.6,
            // 1 - 0.001^(1/300): cools from 1 to `alpha_min` in ~300 ticks.
            alpha_decay: 0.022_763_019_946_717_86,
            alpha_min: 0.001,
            alpha_target: 0.0,
            initial_alpha: 1.0,
            interaction_alpha_target: 0.3,
            min_distance: 1.0,
        }
    }
}

impl ForceConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        non_negative("repulsionStrength", self.repulsion_strength)?;
        positive("linkDistance", self.link_distance)?;
        unit("linkStrength", self.link_strength)?;
        finite("centerX", self.center_x)?;
        finite("centerY", self.center_y)?;
        unit("centerStrength", self.center_strength)?;
        unit("velocityDecay", self.velocity_decay)?;
        unit("alphaDecay", self.alpha_decay)?;
        if self.alpha_decay == 0.0 {
            return Err(Error::InvalidConfig {
                option: "alphaDecay",
                reason: "must be greater than 0 or the simulation never settles".to_string(),
            });
        }
        unit("alphaMin", self.alpha_min)?;
        positive("alphaMin", self.alpha_min)?;
        unit("alphaTarget", self.alpha_target)?;
        unit("initialAlpha", self.initial_alpha)?;
        unit("interactionAlphaTarget", self.interaction_alpha_target)?;
        if self.interaction_alpha_target <= self.alpha_min {
            return Err(Error::InvalidConfig {
                option: "interactionAlphaTarget",
                reason: format!(
                    "must exceed alphaMin ({}) or a pinned node cannot restart motion, got {}",
                    self.alpha_min, self.interaction_alpha_target
                ),
            });
        }
        positive("minDistance", self.min_distance)?;
        Ok(())
    }
}

fn finite(option: &'static str, v: f64) -> Result<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidConfig {
            option,
            reason: format!("expected a finite number, got {v}"),
        })
    }
}

fn non_negative(option: &'static str, v: f64) -> Result<()> {
    finite(option, v)?;
    if v < 0.0 {
        return Err(Error::InvalidConfig {
            option,
            reason: format!("expected a non-negative number, got {v}"),
        });
    }
    Ok(())
}

fn positive(option: &'static str, v: f64) -> Result<()> {
    finite(option, v)?;
    if v <= 0.0 {
        return Err(Error::InvalidConfig {
            option,
            reason: format!("expected a positive number, got {v}"),
        });
    }
    Ok(())
}

fn unit(option: &'static str, v: f64) -> Result<()> {
    finite(option, v)?;
    if !(0.0..=1.0).contains(&v) {
        return Err(Error::InvalidConfig {
            option,
            reason: format!("expected a value in 0..=1, got {v}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ForceConfig::from_json(r#"{"linkDistance": 80, "repulsionStrength": 30}"#)
            .expect("config");
        assert_eq!(config.link_distance, 80.0);
        assert_eq!(config.repulsion_strength, 30.0);
        assert_eq!(config.velocity_decay, ForceConfig::default().velocity_decay);
    }

    #[test]
    fn out_of_range_options_are_rejected() {
        let err = ForceConfig::from_json(r#"{"velocityDecay": 1.5}"#).unwrap_err();
        assert!(
            matches!(err, Error::InvalidConfig { option: "velocityDecay", .. }),
            "{err}"
        );

        let config = ForceConfig {
            alpha_decay: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn interaction_target_must_exceed_alpha_min() {
        for target in [0.0, 0.001] {
            let config = ForceConfig {
                interaction_alpha_target: target,
                ..Default::default()
            };
            let err = config.validate().unwrap_err();
            assert!(
                matches!(err, Error::InvalidConfig { option: "interactionAlphaTarget", .. }),
                "{err}"
            );
        }

        let config = ForceConfig {
            alpha_min: 0.01,
            interaction_alpha_target: 0.02,
            ..Default::default()
        };
        config.validate().expect("config");
    }

    #[test]
    fn malformed_json_surfaces_as_json_error() {
        let err = ForceConfig::from_json("{").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
