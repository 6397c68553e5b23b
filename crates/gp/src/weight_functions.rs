//! Weight functions: the processes modulating the contribution of a node to an output.
//!
//! A weight function is a correlation shape scaled by `weight²`.

use crate::correlation_models::{Correlation, CorrelationKind, KernelFunction};
use crate::errors::{GpError, Result};
use linfa::Float;
use std::fmt;

/// A weight function `w(t)` with covariance `weight² * corr(r)`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightFunction<F: Float> {
    weight: F,
    corr: Correlation<F>,
}

impl<F: Float> WeightFunction<F> {
    /// Weight of amplitude `weight` and shape of the given `kind`,
    /// shape parameters given in [CorrelationKind::param_names] order
    pub fn new(weight: F, kind: CorrelationKind, params: &[F]) -> Result<Self> {
        let wf = WeightFunction {
            weight,
            corr: Correlation::from_params(kind, params)?,
        };
        wf.check()?;
        Ok(wf)
    }

    /// Constant weight: `weight²` for every pair of times
    pub fn constant(weight: F) -> Self {
        WeightFunction {
            weight,
            corr: Correlation::Constant,
        }
    }

    /// Weight amplitude
    pub fn weight(&self) -> F {
        self.weight
    }

    /// Same shape with the given amplitude
    pub fn with_weight(&self, weight: F) -> Self {
        WeightFunction {
            weight,
            corr: self.corr,
        }
    }

    /// Underlying correlation shape
    pub fn correlation(&self) -> &Correlation<F> {
        &self.corr
    }

    /// Kind of the weight shape
    pub fn kind(&self) -> CorrelationKind {
        self.corr.kind()
    }

    /// Shape parameters (the amplitude excluded)
    pub fn params(&self) -> Vec<F> {
        self.corr.params()
    }

    /// Check the amplitude is finite and the shape parameters valid
    pub fn check(&self) -> Result<()> {
        if !self.weight.is_finite() {
            return Err(GpError::InvalidValueError(format!(
                "weight should be finite, got {}",
                self.weight
            )));
        }
        self.corr.check()
    }
}

impl<F: Float> KernelFunction<F> for WeightFunction<F> {
    fn value(&self, r: F) -> F {
        self.weight * self.weight * self.corr.value(r)
    }
}

impl<F: Float> fmt::Display for WeightFunction<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Weight {} x {}", self.weight, self.corr)
    }
}
