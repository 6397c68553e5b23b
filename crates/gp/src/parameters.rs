use crate::errors::{GpError, Result};
use crate::mean_models::MeanFunction;
use crate::node_functions::NodeFunction;
use crate::utils::{MAX_NUGGET_TRIES, NUGGET_RATIO};
use crate::weight_functions::WeightFunction;
use linfa::{Float, ParamGuard};

use ndarray::{Array1, Array2};

/// A set of validated GPRN parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct GprnValidParams<F: Float> {
    /// Latent node functions (q)
    pub(crate) nodes: Vec<NodeFunction<F>>,
    /// Weight function shape shared by every (output, node) link
    pub(crate) weight: WeightFunction<F>,
    /// Weight values as a (p, q) matrix
    pub(crate) weight_values: Array2<F>,
    /// Optional mean function of each output (p)
    pub(crate) means: Vec<Option<MeanFunction<F>>>,
    /// Jitter added in quadrature to the errors of each output (p)
    pub(crate) jitters: Array1<F>,
    /// Ratio of the mean diagonal used as first nugget
    pub(crate) nugget: F,
    /// Max number of nugget retries
    pub(crate) max_nugget_tries: usize,
}

impl<F: Float> GprnValidParams<F> {
    /// Number of outputs
    pub fn n_outputs(&self) -> usize {
        self.weight_values.nrows()
    }

    /// Number of nodes
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Node functions
    pub fn nodes(&self) -> &[NodeFunction<F>] {
        &self.nodes
    }

    /// Weight function shape
    pub fn weight(&self) -> &WeightFunction<F> {
        &self.weight
    }

    /// Weight function linking output `i` to node `q`
    pub fn weight_of(&self, i: usize, q: usize) -> WeightFunction<F> {
        self.weight.with_weight(self.weight_values[[i, q]])
    }

    /// Weight values (p, q)
    pub fn weight_values(&self) -> &Array2<F> {
        &self.weight_values
    }

    /// Mean functions
    pub fn means(&self) -> &[Option<MeanFunction<F>>] {
        &self.means
    }

    /// Jitters
    pub fn jitters(&self) -> &Array1<F> {
        &self.jitters
    }

    /// Nugget ratio
    pub fn nugget(&self) -> F {
        self.nugget
    }

    /// Max number of nugget retries
    pub fn max_nugget_tries(&self) -> usize {
        self.max_nugget_tries
    }
}

#[derive(Clone, Debug)]
/// The set of parameters that can be specified to build a [Gprn](crate::Gprn).
pub struct GprnParams<F: Float>(GprnValidParams<F>);

impl<F: Float> GprnParams<F> {
    /// A constructor given node functions, a weight shape and the (p, q) weight values.
    ///
    /// Means default to none and jitters to zero.
    pub fn new(
        nodes: Vec<NodeFunction<F>>,
        weight: WeightFunction<F>,
        weight_values: Array2<F>,
    ) -> GprnParams<F> {
        let p = weight_values.nrows();
        Self(GprnValidParams {
            nodes,
            weight,
            weight_values,
            means: vec![None; p],
            jitters: Array1::zeros(p),
            nugget: F::cast(NUGGET_RATIO),
            max_nugget_tries: MAX_NUGGET_TRIES,
        })
    }

    /// A constructor from validated parameters
    pub fn new_from_valid(params: &GprnValidParams<F>) -> Self {
        Self(params.clone())
    }

    /// Set node functions
    pub fn nodes(mut self, nodes: Vec<NodeFunction<F>>) -> Self {
        self.0.nodes = nodes;
        self
    }

    /// Set weight function shape
    pub fn weight(mut self, weight: WeightFunction<F>) -> Self {
        self.0.weight = weight;
        self
    }

    /// Set the (p, q) weight values
    pub fn weight_values(mut self, weight_values: Array2<F>) -> Self {
        self.0.weight_values = weight_values;
        self
    }

    /// Set mean functions, one per output
    pub fn means(mut self, means: Vec<Option<MeanFunction<F>>>) -> Self {
        self.0.means = means;
        self
    }

    /// Set jitters, one per output
    pub fn jitters(mut self, jitters: Array1<F>) -> Self {
        self.0.jitters = jitters;
        self
    }

    /// Set nugget ratio.
    ///
    /// Nugget is used to improve numerical stability
    pub fn nugget(mut self, nugget: F) -> Self {
        self.0.nugget = nugget;
        self
    }

    /// Set the max number of nugget retries
    pub fn max_nugget_tries(mut self, max_nugget_tries: usize) -> Self {
        self.0.max_nugget_tries = max_nugget_tries;
        self
    }
}

impl<F: Float> From<GprnValidParams<F>> for GprnParams<F> {
    fn from(valid: GprnValidParams<F>) -> Self {
        GprnParams(valid)
    }
}

impl<F: Float> ParamGuard for GprnParams<F> {
    type Checked = GprnValidParams<F>;
    type Error = GpError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let params = &self.0;
        if params.nodes.is_empty() {
            return Err(GpError::InvalidValueError(
                "At least one node is required".to_string(),
            ));
        }
        let (p, q) = params.weight_values.dim();
        if p == 0 {
            return Err(GpError::InvalidValueError(
                "At least one output is required".to_string(),
            ));
        }
        if q != params.nodes.len() {
            return Err(GpError::InvalidValueError(format!(
                "Weight values should have one column per node ({}), got {q}",
                params.nodes.len()
            )));
        }
        if params.means.len() != p || params.jitters.len() != p {
            return Err(GpError::InvalidValueError(format!(
                "Expected {p} means and jitters, got {} and {}",
                params.means.len(),
                params.jitters.len()
            )));
        }
        if params.jitters.iter().any(|j| !j.is_finite() || *j < F::zero()) {
            return Err(GpError::InvalidValueError(format!(
                "Jitters should be finite and non-negative, got {}",
                params.jitters
            )));
        }
        if !params.nugget.is_finite() || params.nugget < F::zero() {
            return Err(GpError::InvalidValueError(format!(
                "Nugget should be finite and non-negative, got {}",
                params.nugget
            )));
        }
        for node in params.nodes.iter() {
            node.check()?;
        }
        for w in params.weight_values.iter() {
            params.weight.with_weight(*w).check()?;
        }
        for mean in params.means.iter().flatten() {
            mean.check()?;
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
