//! Prior distributions of the model parameters.
//!
//! Priors map the unit interval onto the parameter space through their
//! percent point function, which is how unit-cube samplers explore them.
use crate::errors::{InferenceError, Result};
use ndarray_rand::rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A prior distribution over one scalar parameter
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Prior {
    /// Parameter held at the given value
    Fixed(f64),
    /// Uniform in [lower, upper]
    Uniform {
        /// lower bound
        lower: f64,
        /// upper bound
        upper: f64,
    },
    /// Uniform in log space in [lower, upper], 0 < lower
    LogUniform {
        /// lower bound
        lower: f64,
        /// upper bound
        upper: f64,
    },
}

impl Prior {
    /// Check bounds are finite and ordered
    pub fn check(&self) -> Result<()> {
        match *self {
            Prior::Fixed(v) if !v.is_finite() => Err(InferenceError::InvalidValueError(format!(
                "Fixed value should be finite, got {v}"
            ))),
            Prior::Uniform { lower, upper }
                if !(lower.is_finite() && upper.is_finite() && lower < upper) =>
            {
                Err(InferenceError::InvalidValueError(format!(
                    "Uniform bounds should be finite with lower < upper, got [{lower}, {upper}]"
                )))
            }
            Prior::LogUniform { lower, upper }
                if !(lower > 0. && upper.is_finite() && lower < upper) =>
            {
                Err(InferenceError::InvalidValueError(format!(
                    "LogUniform bounds should be finite with 0 < lower < upper, got [{lower}, {upper}]"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Whether the parameter is held constant
    pub fn is_fixed(&self) -> bool {
        matches!(self, Prior::Fixed(_))
    }

    /// Percent point function: maps `u` in [0, 1] to the parameter space
    pub fn ppf(&self, u: f64) -> f64 {
        match *self {
            Prior::Fixed(v) => v,
            Prior::Uniform { lower, upper } => (lower + u * (upper - lower)).clamp(lower, upper),
            Prior::LogUniform { lower, upper } => {
                (lower.ln() + u * (upper / lower).ln()).exp().clamp(lower, upper)
            }
        }
    }

    /// Cumulative distribution function, inverse of [Prior::ppf] inside the support
    pub fn cdf(&self, x: f64) -> f64 {
        match *self {
            Prior::Fixed(v) => {
                if x < v {
                    0.
                } else {
                    1.
                }
            }
            Prior::Uniform { lower, upper } => ((x - lower) / (upper - lower)).clamp(0., 1.),
            Prior::LogUniform { lower, upper } => {
                if x <= lower {
                    0.
                } else {
                    ((x / lower).ln() / (upper / lower).ln()).clamp(0., 1.)
                }
            }
        }
    }

    /// Log probability density at `x`, -inf outside the support
    pub fn log_density(&self, x: f64) -> f64 {
        match *self {
            Prior::Fixed(v) => {
                if x == v {
                    0.
                } else {
                    f64::NEG_INFINITY
                }
            }
            Prior::Uniform { lower, upper } => {
                if (lower..=upper).contains(&x) {
                    -(upper - lower).ln()
                } else {
                    f64::NEG_INFINITY
                }
            }
            Prior::LogUniform { lower, upper } => {
                if (lower..=upper).contains(&x) {
                    -x.ln() - (upper / lower).ln().ln()
                } else {
                    f64::NEG_INFINITY
                }
            }
        }
    }

    /// Draw a value
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        self.ppf(rng.gen::<f64>())
    }
}

impl fmt::Display for Prior {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Prior::Fixed(v) => write!(f, "Fixed({v})"),
            Prior::Uniform { lower, upper } => write!(f, "Uniform({lower}, {upper})"),
            Prior::LogUniform { lower, upper } => write!(f, "LogUniform({lower}, {upper})"),
        }
    }
}
