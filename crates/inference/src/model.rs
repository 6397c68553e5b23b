//! The model driven by unit-cube samplers such as nested sampling.
//!
//! The state of a [GprnModel] lives in the unit hypercube and is mapped onto the
//! network parameters through the prior percent point functions. Parameters are laid out as
//! `[node params, weight shape params, weight values (row major p x q), mean params, jitters]`.
use crate::config::GprnConfig;
use crate::errors::{InferenceError, Result};
use crate::priors::Prior;
use gprn_data::{Data, OUTPUT_NAMES};
use gprn_gp::correlation_models::CorrelationKind;
use gprn_gp::mean_models::MeanKind;
use gprn_gp::{
    Gprn, GprnValidParams, MeanFunction, NodeFunction, Observations, WeightFunction,
};
use linfa::ParamGuard;
use log::debug;
use ndarray::{Array1, Array2, ArrayView1};
use ndarray_rand::rand::Rng;
use ndarray_rand::rand_distr::{StandardNormal, Uniform};
use ndarray_rand::RandomExt;
use std::sync::Arc;

/// The interface a sampler needs from a model.
///
/// Models are cloned once per particle, evaluation state is kept in the model.
pub trait SamplerModel: Clone {
    /// Number of parameters
    fn dimension(&self) -> usize;

    /// Draw a new state from the prior
    fn draw_from_prior<R: Rng>(&mut self, rng: &mut R);

    /// Move the state, returns the log of the Hastings ratio
    fn perturb<R: Rng>(&mut self, rng: &mut R) -> f64;

    /// Log-likelihood of the current state, -inf when it cannot be evaluated
    fn log_likelihood(&self) -> f64;

    /// Parameter values of the current state
    fn parameters(&self) -> Vec<f64>;

    /// Names of the parameters, space separated
    fn description(&self) -> String;
}

/// Heavy-tailed step used by the perturbations: `10^(1.5 - 3|t|) * n`
/// with `t` Student-t distributed and `n` standard normal
pub fn randh<R: Rng>(rng: &mut R) -> f64 {
    let t: f64 = rng.sample::<f64, _>(StandardNormal) / (-rng.gen::<f64>().ln()).sqrt();
    10f64.powf(1.5 - 3. * t.abs()) * rng.sample::<f64, _>(StandardNormal)
}

/// Wrap a value into [0, 1)
pub fn wrap_unit(u: f64) -> f64 {
    let w = u - u.floor();
    if w >= 1. {
        0.
    } else {
        w
    }
}

#[derive(Clone, Debug)]
enum Block {
    Node(CorrelationKind),
    Weight(CorrelationKind),
    WeightValues,
    Mean(usize, MeanKind),
    Jitters,
}

/// Parameter layout derived from a configuration
#[derive(Clone, Debug)]
struct Layout {
    blocks: Vec<(Block, usize)>,
    priors: Vec<Prior>,
    names: Vec<String>,
    n_outputs: usize,
    n_nodes: usize,
    nugget: f64,
}

impl Layout {
    fn new(config: &GprnConfig) -> Result<Self> {
        config.check()?;
        let mut layout = Layout {
            blocks: vec![],
            priors: vec![],
            names: vec![],
            n_outputs: config.n_outputs(),
            n_nodes: config.nodes.len(),
            nugget: config.nugget,
        };
        for (q, node) in config.nodes.iter().enumerate() {
            let names = node.kind.param_names().iter().map(|n| format!("node{q}.{n}"));
            layout.push(Block::Node(node.kind), &node.priors, names);
        }
        let names = config.weight.kind.param_names().iter().map(|n| format!("weight.{n}"));
        layout.push(Block::Weight(config.weight.kind), &config.weight.priors, names);

        let (p, q) = (layout.n_outputs, layout.n_nodes);
        let priors = vec![config.weight_prior; p * q];
        let names = (0..p).flat_map(|i| (0..q).map(move |j| format!("w{i}{j}")));
        layout.push(Block::WeightValues, &priors, names);

        let outputs = &config.data.outputs;
        for (i, mean) in config.output_means().into_iter().enumerate() {
            if let Some(mean) = mean {
                let names = mean.kind.param_names().iter().map(|n| format!("{}.{n}", outputs[i]));
                layout.push(Block::Mean(i, mean.kind), &mean.priors, names);
            }
        }
        let priors = vec![config.jitter_prior; p];
        let names = outputs.iter().map(|o| format!("{o}.jitter"));
        layout.push(Block::Jitters, &priors, names);
        Ok(layout)
    }

    fn push(&mut self, block: Block, priors: &[Prior], names: impl Iterator<Item = String>) {
        self.blocks.push((block, priors.len()));
        self.priors.extend_from_slice(priors);
        self.names.extend(names);
    }

    fn dimension(&self) -> usize {
        self.priors.len()
    }

    fn params(&self, values: &[f64]) -> Result<GprnValidParams<f64>> {
        if values.len() != self.dimension() {
            return Err(InferenceError::InvalidValueError(format!(
                "Expected {} parameters, got {}",
                self.dimension(),
                values.len()
            )));
        }
        let mut nodes = vec![];
        let mut weight = WeightFunction::constant(1.);
        let mut weight_values = Array2::zeros((self.n_outputs, self.n_nodes));
        let mut means = vec![None; self.n_outputs];
        let mut jitters = Array1::zeros(self.n_outputs);

        let mut offset = 0;
        for (block, len) in self.blocks.iter() {
            let chunk = &values[offset..offset + len];
            match block {
                Block::Node(kind) => nodes.push(NodeFunction::new(*kind, chunk)?),
                Block::Weight(kind) => weight = WeightFunction::new(1., *kind, chunk)?,
                Block::WeightValues => {
                    weight_values = Array2::from_shape_vec(weight_values.dim(), chunk.to_vec())
                        .map_err(|e| InferenceError::InvalidValueError(e.to_string()))?
                }
                Block::Mean(i, kind) => means[*i] = Some(MeanFunction::from_params(*kind, chunk)?),
                Block::Jitters => jitters = Array1::from_vec(chunk.to_vec()),
            }
            offset += len;
        }
        Ok(Gprn::params(nodes, weight, weight_values)
            .means(means)
            .jitters(jitters)
            .nugget(self.nugget)
            .check()?)
    }
}

/// Build the observations of the configured outputs
pub fn observations(data: &Data, config: &GprnConfig) -> Result<Observations<f64>> {
    let indices = config.output_indices()?;
    let n = data.n();
    let series = data.outputs();
    let mut y = Array2::zeros((indices.len(), n));
    let mut yerr = Array2::zeros((indices.len(), n));
    for (row, &k) in indices.iter().enumerate() {
        y.row_mut(row).assign(series[k].0);
        yerr.row_mut(row).assign(series[k].1);
    }
    debug!(
        "Observations of {:?} over {n} times",
        indices.iter().map(|&k| OUTPUT_NAMES[k]).collect::<Vec<_>>()
    );
    Ok(Observations::new(data.get_t().to_owned(), y, yerr)?)
}

/// A GPRN whose parameters follow the priors of a [GprnConfig]
#[derive(Clone, Debug)]
pub struct GprnModel {
    gprn: Arc<Gprn<f64>>,
    layout: Arc<Layout>,
    unit: Array1<f64>,
}

impl GprnModel {
    /// Model of the given data, state at the center of the unit hypercube
    pub fn new(config: &GprnConfig, data: &Data) -> Result<Self> {
        let layout = Layout::new(config)?;
        let gprn = Gprn::new(observations(data, config)?);
        let unit = Array1::from_elem(layout.dimension(), 0.5);
        Ok(GprnModel {
            gprn: Arc::new(gprn),
            layout: Arc::new(layout),
            unit,
        })
    }

    /// Model of the loaded data instance
    pub fn from_instance(config: &GprnConfig) -> Result<Self> {
        Self::new(config, Data::get_instance()?)
    }

    /// Underlying network
    pub fn gprn(&self) -> &Gprn<f64> {
        &self.gprn
    }

    /// Current state in the unit hypercube
    pub fn unit(&self) -> &Array1<f64> {
        &self.unit
    }

    /// Set the state in the unit hypercube
    pub fn set_unit(&mut self, unit: Array1<f64>) -> Result<()> {
        check_unit(unit.view(), self.dimension())?;
        self.unit = unit;
        Ok(())
    }

    /// Priors in parameter order
    pub fn priors(&self) -> &[Prior] {
        &self.layout.priors
    }

    /// Parameter names in parameter order
    pub fn names(&self) -> &[String] {
        &self.layout.names
    }

    /// Map a point of the unit hypercube onto the parameter space
    pub fn prior_transform(&self, u: &[f64]) -> Result<Vec<f64>> {
        check_unit(ArrayView1::from(u), self.dimension())?;
        Ok(self
            .layout
            .priors
            .iter()
            .zip(u)
            .map(|(prior, &v)| prior.ppf(v))
            .collect())
    }

    /// Log prior density of the given parameters
    pub fn log_prior(&self, values: &[f64]) -> f64 {
        if values.len() != self.dimension() {
            return f64::NEG_INFINITY;
        }
        self.layout
            .priors
            .iter()
            .zip(values)
            .map(|(prior, &v)| prior.log_density(v))
            .sum()
    }

    /// Network parameters from parameter values
    pub fn network_params(&self, values: &[f64]) -> Result<GprnValidParams<f64>> {
        self.layout.params(values)
    }

    /// Log-likelihood of the given parameter values, -inf when they cannot be evaluated
    pub fn log_likelihood_of(&self, values: &[f64]) -> f64 {
        match self
            .layout
            .params(values)
            .and_then(|params| Ok(self.gprn.log_likelihood(&params)?))
        {
            Ok(loglike) => loglike,
            Err(err) => {
                debug!("Rejected parameters {values:?}: {err}");
                f64::NEG_INFINITY
            }
        }
    }
}

fn check_unit(u: ArrayView1<f64>, dim: usize) -> Result<()> {
    if u.len() != dim {
        return Err(InferenceError::InvalidValueError(format!(
            "Expected a point of dimension {dim}, got {}",
            u.len()
        )));
    }
    if u.iter().any(|v| !(0. ..=1.).contains(v)) {
        return Err(InferenceError::InvalidValueError(format!(
            "Point should lie in the unit hypercube, got {u:?}"
        )));
    }
    Ok(())
}

impl SamplerModel for GprnModel {
    fn dimension(&self) -> usize {
        self.layout.dimension()
    }

    fn draw_from_prior<R: Rng>(&mut self, rng: &mut R) {
        self.unit = Array1::random_using(self.dimension(), Uniform::new(0., 1.), rng);
    }

    fn perturb<R: Rng>(&mut self, rng: &mut R) -> f64 {
        let free: Vec<usize> = (0..self.dimension())
            .filter(|&i| !self.layout.priors[i].is_fixed())
            .collect();
        if free.is_empty() {
            return 0.;
        }
        let which = free[rng.gen_range(0..free.len())];
        self.unit[which] = wrap_unit(self.unit[which] + randh(rng));
        0.
    }

    fn log_likelihood(&self) -> f64 {
        self.log_likelihood_of(&self.parameters())
    }

    fn parameters(&self) -> Vec<f64> {
        self.layout
            .priors
            .iter()
            .zip(self.unit.iter())
            .map(|(prior, &u)| prior.ppf(u))
            .collect()
    }

    fn description(&self) -> String {
        self.layout.names.join(" ")
    }
}
