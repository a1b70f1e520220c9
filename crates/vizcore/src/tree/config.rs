use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which screen axis depth runs along.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Orientation {
    /// Root on the left, depth grows along x.
    #[default]
    Horizontal,
    /// Root on top, depth grows along y.
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 50.0,
            right: 120.0,
            bottom: 50.0,
            left: 120.0,
        }
    }
}

impl Margin {
    pub const ZERO: Margin = Margin {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreeConfig {
    pub orientation: Orientation,
    /// Spacing between adjacent leaves along the breadth axis.
    pub node_spacing: f64,
    /// Subtracted from the viewport before the depth/breadth extents are computed.
    pub margin: Margin,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::Horizontal,
            node_spacing: 25.0,
            margin: Margin::default(),
        }
    }
}

impl TreeConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_spacing(self.node_spacing)?;
        let m = self.margin;
        for (option, v) in [
            ("margin.top", m.top),
            ("margin.right", m.right),
            ("margin.bottom", m.bottom),
            ("margin.left", m.left),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(Error::InvalidConfig {
                    option,
                    reason: format!("expected a non-negative number, got {v}"),
                });
            }
        }
        Ok(())
    }
}

pub(crate) fn validate_spacing(node_spacing: f64) -> Result<()> {
    if !node_spacing.is_finite() || node_spacing <= 0.0 {
        return Err(Error::InvalidConfig {
            option: "nodeSpacing",
            reason: format!("expected a positive number, got {node_spacing}"),
        });
    }
    Ok(())
}
