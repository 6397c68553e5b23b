//! Node functions: the latent processes shared by all the outputs of a network.
//!
//! A node is a zero-mean, unit-amplitude Gaussian process; its amplitude in each output
//! is carried by the weights.

use crate::correlation_models::{Correlation, CorrelationKind, KernelFunction};
use crate::errors::Result;
use linfa::Float;
use std::fmt;

/// A latent node function `f(t)` with a unit-amplitude covariance
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeFunction<F: Float> {
    corr: Correlation<F>,
}

impl<F: Float> NodeFunction<F> {
    /// Node of the given `kind`, parameters given in
    /// [CorrelationKind::param_names] order
    pub fn new(kind: CorrelationKind, params: &[F]) -> Result<Self> {
        Ok(NodeFunction {
            corr: Correlation::from_params(kind, params)?,
        })
    }

    /// Underlying correlation shape
    pub fn correlation(&self) -> &Correlation<F> {
        &self.corr
    }

    /// Kind of the node covariance
    pub fn kind(&self) -> CorrelationKind {
        self.corr.kind()
    }

    /// Node parameters
    pub fn params(&self) -> Vec<F> {
        self.corr.params()
    }

    /// Check node parameters, see [Correlation::check]
    pub fn check(&self) -> Result<()> {
        self.corr.check()
    }
}

impl<F: Float> From<Correlation<F>> for NodeFunction<F> {
    fn from(corr: Correlation<F>) -> Self {
        NodeFunction { corr }
    }
}

impl<F: Float> KernelFunction<F> for NodeFunction<F> {
    fn value(&self, r: F) -> F {
        self.corr.value(r)
    }
}

impl<F: Float> fmt::Display for NodeFunction<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Node {}", self.corr)
    }
}
