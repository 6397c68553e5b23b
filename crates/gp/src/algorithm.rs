use crate::correlation_models::{CorrelationKind, KernelFunction};
use crate::errors::{GpError, Result};
use crate::node_functions::NodeFunction;
use crate::parameters::{GprnParams, GprnValidParams};
use crate::utils::{cho_solve, cholesky_with_nugget, gaussian_log_density};
use crate::weight_functions::WeightFunction;

use linfa::{Float, ParamGuard};
use linfa_linalg::triangular::*;
use log::debug;
use ndarray::{s, Array1, Array2, Array3, ArrayBase, Axis, Data, Ix1, Ix2, Zip};
use ndarray_rand::rand::Rng;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_rand::RandomExt;
use rand_xoshiro::Xoshiro256Plus;
use std::fmt;

/// Covariance of the branch linking a node to an output through a weight:
/// the elementwise product of the weight and node kernel matrices.
pub fn branch<F: Float>(
    weight: &WeightFunction<F>,
    node: &NodeFunction<F>,
    t1: &ArrayBase<impl Data<Elem = F>, Ix1>,
    t2: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> Array2<F> {
    weight.matrix(t1, t2) * node.matrix(t1, t2)
}

/// Observed time series of the outputs of a GPRN.
///
/// Values and errors are stored as (p, N) matrices, one row per output,
/// sharing the same N observation times.
#[derive(Clone, Debug, PartialEq)]
pub struct Observations<F: Float> {
    time: Array1<F>,
    y: Array2<F>,
    yerr: Array2<F>,
}

impl<F: Float> Observations<F> {
    /// Constructor checking shapes, finiteness and error signs
    pub fn new(time: Array1<F>, y: Array2<F>, yerr: Array2<F>) -> Result<Self> {
        if time.is_empty() || y.nrows() == 0 {
            return Err(GpError::InvalidValueError(
                "Observations should not be empty".to_string(),
            ));
        }
        if y.ncols() != time.len() || y.dim() != yerr.dim() {
            return Err(GpError::InvalidValueError(format!(
                "Bad observations shapes: time {}, values {:?}, errors {:?}",
                time.len(),
                y.dim(),
                yerr.dim()
            )));
        }
        if time.iter().chain(y.iter()).any(|v| !v.is_finite())
            || yerr.iter().any(|e| !e.is_finite() || *e < F::zero())
        {
            return Err(GpError::InvalidValueError(
                "Observations should be finite with non-negative errors".to_string(),
            ));
        }
        Ok(Observations { time, y, yerr })
    }

    /// Number of outputs (p)
    pub fn n_outputs(&self) -> usize {
        self.y.nrows()
    }

    /// Number of observation times (N)
    pub fn n_obs(&self) -> usize {
        self.time.len()
    }

    /// Observation times
    pub fn time(&self) -> &Array1<F> {
        &self.time
    }

    /// Observed values (p, N)
    pub fn y(&self) -> &Array2<F> {
        &self.y
    }

    /// Observation errors (p, N)
    pub fn yerr(&self) -> &Array2<F> {
        &self.yerr
    }

    /// Values of every output concatenated in output order
    pub fn flat_y(&self) -> Array1<F> {
        self.y.iter().copied().collect()
    }
}

/// Posterior prediction of one output
#[derive(Clone, Debug)]
pub struct GprnPrediction<F: Float> {
    /// Posterior mean
    pub mean: Array1<F>,
    /// Posterior standard deviation
    pub std: Array1<F>,
    /// Posterior covariance
    pub cov: Array2<F>,
}

/// A draw from the GPRN prior
#[derive(Clone, Debug)]
pub struct NetworkSample<F: Float> {
    /// Node draws (q, m)
    pub nodes: Array2<F>,
    /// Weight draws (p, q, m)
    pub weights: Array3<F>,
    /// Composed outputs (p, m)
    pub outputs: Array2<F>,
}

/// Gaussian process regression network over a set of observations.
///
/// Output `i` is modelled as `y_i(t) = Σ_q w_iq(t) f_q(t) + m_i(t)` where
/// `f_q` are the node GPs and `w_iq` the weight GPs.
#[derive(Clone, Debug)]
pub struct Gprn<F: Float> {
    obs: Observations<F>,
}

impl<F: Float> Gprn<F> {
    /// Network parameters builder
    pub fn params(
        nodes: Vec<NodeFunction<F>>,
        weight: WeightFunction<F>,
        weight_values: Array2<F>,
    ) -> GprnParams<F> {
        GprnParams::new(nodes, weight, weight_values)
    }

    /// Constructor
    pub fn new(obs: Observations<F>) -> Self {
        Gprn { obs }
    }

    /// Observations
    pub fn observations(&self) -> &Observations<F> {
        &self.obs
    }

    /// Branch covariance over the observation times
    pub fn branch(&self, weight: &WeightFunction<F>, node: &NodeFunction<F>) -> Array2<F> {
        branch(weight, node, &self.obs.time, &self.obs.time)
    }

    fn check_outputs(&self, params: &GprnValidParams<F>) -> Result<()> {
        if params.n_outputs() != self.obs.n_outputs() {
            return Err(GpError::InvalidValueError(format!(
                "Parameters describe {} outputs, observations have {}",
                params.n_outputs(),
                self.obs.n_outputs()
            )));
        }
        Ok(())
    }

    /// Joint covariance (pN, pN) of the observed outputs, errors and jitters included
    pub fn covariance(&self, params: &GprnValidParams<F>) -> Result<Array2<F>> {
        self.check_outputs(params)?;
        let t = &self.obs.time;
        let (p, n) = (params.n_outputs(), t.len());
        let branches = unit_branches(params, t, t);

        let mut k = Array2::zeros((p * n, p * n));
        for i in 0..p {
            for j in i..p {
                let block = combine_branches(params, &branches, i, j);
                k.slice_mut(s![i * n..(i + 1) * n, j * n..(j + 1) * n])
                    .assign(&block);
                if i != j {
                    k.slice_mut(s![j * n..(j + 1) * n, i * n..(i + 1) * n])
                        .assign(&block.t());
                }
            }
            let jitter2 = params.jitters[i] * params.jitters[i];
            let mut diag = k.slice_mut(s![i * n..(i + 1) * n, i * n..(i + 1) * n]);
            Zip::from(diag.diag_mut())
                .and(self.obs.yerr.row(i))
                .for_each(|d, &e| *d += e * e + jitter2);
        }
        Ok(k)
    }

    /// Mean functions of every output evaluated on the observation times (zero when absent)
    pub fn mean_vector(&self, params: &GprnValidParams<F>) -> Result<Array1<F>> {
        self.check_outputs(params)?;
        Ok(mean_values(params, &self.obs.time).iter().copied().collect())
    }

    /// Gaussian log-likelihood of the observations
    pub fn log_likelihood(&self, params: &GprnValidParams<F>) -> Result<F> {
        let k = self.covariance(params)?;
        let r = self.obs.flat_y() - self.mean_vector(params)?;
        let (chol, nugget) = cholesky_with_nugget(&k, params.nugget, params.max_nugget_tries)?;
        let loglike = gaussian_log_density(&chol, &r)?;
        debug!("log-likelihood = {loglike} (nugget {nugget})");
        if !loglike.is_finite() {
            return Err(GpError::LikelihoodComputationError(format!(
                "Non finite log-likelihood {loglike}"
            )));
        }
        Ok(loglike)
    }

    /// Posterior prediction of output `output` at the given times, mean function included
    pub fn predict(
        &self,
        params: &GprnValidParams<F>,
        output: usize,
        times: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Result<GprnPrediction<F>> {
        if output >= self.obs.n_outputs() {
            return Err(GpError::InvalidValueError(format!(
                "Output {output} out of range, {} outputs available",
                self.obs.n_outputs()
            )));
        }
        let k = self.covariance(params)?;
        let r = self.obs.flat_y() - self.mean_vector(params)?;
        let (chol, _) = cholesky_with_nugget(&k, params.nugget, params.max_nugget_tries)?;

        let t = &self.obs.time;
        let (p, n, m) = (params.n_outputs(), t.len(), times.len());
        let cross_branches = unit_branches(params, times, t);
        let mut ks = Array2::zeros((m, p * n));
        for j in 0..p {
            ks.slice_mut(s![.., j * n..(j + 1) * n])
                .assign(&combine_branches(params, &cross_branches, output, j));
        }
        let kss = combine_branches(
            params,
            &unit_branches(params, times, times),
            output,
            output,
        );

        let alpha = cho_solve(&chol, &r)?;
        let mut mean = ks.dot(&alpha);
        if let Some(mean_fn) = &params.means[output] {
            mean += &mean_fn.value(times);
        }
        let v = chol.solve_triangular(&ks.t().to_owned(), UPLO::Lower)?;
        let cov = kss - v.t().dot(&v);
        // Variances might be slightly negative depending on machine precision
        let std = cov
            .diag()
            .mapv(|var| if var < F::zero() { F::zero() } else { var.sqrt() });
        Ok(GprnPrediction { mean, std, cov })
    }
}

impl<F: Float> fmt::Display for Gprn<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "GPRN({} outputs x {} observations)",
            self.obs.n_outputs(),
            self.obs.n_obs()
        )
    }
}

/// Branch matrices of every node with the unit-amplitude weight shape
fn unit_branches<F: Float>(
    params: &GprnValidParams<F>,
    t1: &ArrayBase<impl Data<Elem = F>, Ix1>,
    t2: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> Vec<Array2<F>> {
    let shape = params.weight.with_weight(F::one());
    params
        .nodes
        .iter()
        .map(|node| branch(&shape, node, t1, t2))
        .collect()
}

/// Covariance block between outputs i and j: Σ_q w_iq w_jq branch_q
fn combine_branches<F: Float>(
    params: &GprnValidParams<F>,
    branches: &[Array2<F>],
    i: usize,
    j: usize,
) -> Array2<F> {
    let mut block = Array2::zeros(branches[0].dim());
    for (q, b) in branches.iter().enumerate() {
        let c = params.weight_values[[i, q]] * params.weight_values[[j, q]];
        block.scaled_add(c, b);
    }
    block
}

/// Mean functions (p, m), zero rows when absent
fn mean_values<F: Float>(
    params: &GprnValidParams<F>,
    times: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> Array2<F> {
    let mut means = Array2::zeros((params.n_outputs(), times.len()));
    for (mut row, mean_fn) in means.rows_mut().into_iter().zip(params.means.iter()) {
        if let Some(mean_fn) = mean_fn {
            row.assign(&mean_fn.value(times));
        }
    }
    means
}

/// Zero-mean GP draw with the given covariance
fn draw<F: Float, R: Rng>(
    cov: &ArrayBase<impl Data<Elem = F>, Ix2>,
    params: &GprnValidParams<F>,
    rng: &mut R,
) -> Result<Array1<F>> {
    let (chol, _) = cholesky_with_nugget(cov, params.nugget, params.max_nugget_tries)?;
    let z = Array1::<f64>::random_using(cov.nrows(), StandardNormal, rng).mapv(F::cast);
    Ok(chol.dot(&z))
}

/// Draw nodes, weights and outputs from the GPRN prior at the given times
pub fn sample_prior<F: Float>(
    params: &GprnValidParams<F>,
    times: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> Result<NetworkSample<F>> {
    let mut rng = Xoshiro256Plus::from_entropy();
    sample_prior_with_rng(params, times, &mut rng)
}

/// Same as [sample_prior] with a given random generator
pub fn sample_prior_with_rng<F: Float, R: Rng>(
    params: &GprnValidParams<F>,
    times: &ArrayBase<impl Data<Elem = F>, Ix1>,
    rng: &mut R,
) -> Result<NetworkSample<F>> {
    let (p, q, m) = (params.n_outputs(), params.n_nodes(), times.len());

    let mut nodes = Array2::zeros((q, m));
    for (mut row, node) in nodes.rows_mut().into_iter().zip(params.nodes.iter()) {
        row.assign(&draw(&node.matrix(times, times), params, rng)?);
    }

    let shape = params.weight.with_weight(F::one());
    let shape_cov = shape.matrix(times, times);
    let mut weights = Array3::zeros((p, q, m));
    for i in 0..p {
        for j in 0..q {
            let unit = if shape.kind() == CorrelationKind::Constant {
                let z: f64 = rng.sample(StandardNormal);
                Array1::from_elem(m, F::cast(z))
            } else {
                draw(&shape_cov, params, rng)?
            };
            weights
                .slice_mut(s![i, j, ..])
                .assign(&unit.mapv(|v| v * params.weight_values[[i, j]]));
        }
    }

    let mut outputs = mean_values(params, times);
    for (i, mut row) in outputs.outer_iter_mut().enumerate() {
        let contributions = &weights.index_axis(Axis(0), i) * &nodes;
        row += &contributions.sum_axis(Axis(0));
    }
    Ok(NetworkSample {
        nodes,
        weights,
        outputs,
    })
}

impl<F: Float> GprnParams<F> {
    /// Check parameters and evaluate the log-likelihood of the given network
    pub fn log_likelihood(&self, gprn: &Gprn<F>) -> Result<F> {
        gprn.log_likelihood(self.check_ref()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation_models::Correlation;
    use crate::mean_models::MeanFunction;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use std::f64::consts::PI;

    fn se_node(ell: f64) -> NodeFunction<f64> {
        NodeFunction::new(CorrelationKind::SquaredExponential, &[ell]).unwrap()
    }

    fn two_outputs() -> Gprn<f64> {
        let t = array![0., 0.7, 1.5, 2.2, 3.1];
        let y = array![
            [0.1, 0.5, 0.9, 0.4, -0.3],
            [0.2, 1.1, 1.7, 0.9, -0.5]
        ];
        let yerr = Array2::from_elem((2, 5), 0.1);
        Gprn::new(Observations::new(t, y, yerr).unwrap())
    }

    #[test]
    fn test_branch_is_pointwise_product() {
        let weight = WeightFunction::new(1.5, CorrelationKind::Periodic, &[1., 2.]).unwrap();
        let node = NodeFunction::new(CorrelationKind::QuasiPeriodic, &[3., 2., 0.8]).unwrap();
        let t1 = array![0., 0.3, 1.9];
        let t2 = array![0.1, 2.5];
        let b = branch(&weight, &node, &t1, &t2);
        assert_eq!(&[3, 2], b.shape());
        let expected = weight.matrix(&t1, &t2) * node.matrix(&t1, &t2);
        assert_abs_diff_eq!(expected, b, epsilon = 1e-14);
    }

    #[test]
    fn test_constant_weights_covariance() {
        let gprn = two_outputs();
        let weights = array![[2.], [-0.5]];
        let params = Gprn::params(vec![se_node(1.)], WeightFunction::constant(1.), weights)
            .jitters(array![0.2, 0.])
            .check()
            .unwrap();
        let k = gprn.covariance(&params).unwrap();
        assert_eq!(&[10, 10], k.shape());
        assert_abs_diff_eq!(k, k.t(), epsilon = 1e-14);

        let t = gprn.observations().time();
        let knode = se_node(1.).matrix(t, t);
        assert_abs_diff_eq!(k.slice(s![0..5, 5..10]), knode.mapv(|v| -v), epsilon = 1e-12);
        let noise = Array2::from_diag(&Array1::from_elem(5, 0.01 + 0.04));
        let expected = knode.mapv(|v| 4. * v) + noise;
        assert_abs_diff_eq!(k.slice(s![0..5, 0..5]), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_white_noise_likelihood() {
        let t = array![0., 1., 2.];
        let y = array![[0.5, -1.0, 2.0]];
        let yerr = Array2::from_elem((1, 3), 0.5);
        let gprn = Gprn::new(Observations::new(t, y.clone(), yerr).unwrap());
        let node = NodeFunction::new(CorrelationKind::WhiteNoise, &[]).unwrap();
        let params = Gprn::params(vec![node], WeightFunction::constant(2.), array![[2.]])
            .check()
            .unwrap();
        // weight value 2 sets the amplitude, the weight shape amplitude is not used
        let var: f64 = 4. + 0.25;
        let expected: f64 = y
            .iter()
            .map(|v| -0.5 * v * v / var - 0.5 * (2. * PI * var).ln())
            .sum();
        assert_abs_diff_eq!(expected, gprn.log_likelihood(&params).unwrap(), epsilon = 1e-10);
    }

    #[test]
    fn test_mean_shifts_likelihood() {
        let t = array![0., 1., 2.];
        let yerr = Array2::from_elem((1, 3), 0.5);
        let node = NodeFunction::new(CorrelationKind::WhiteNoise, &[]).unwrap();
        let centered = Observations::new(t.clone(), array![[0.1, -0.2, 0.3]], yerr.clone());
        let centered = Gprn::new(centered.unwrap());
        let shifted = Gprn::new(Observations::new(t, array![[10.1, 9.8, 10.3]], yerr).unwrap());
        let base = Gprn::params(vec![node], WeightFunction::constant(1.), array![[1.]]);
        let no_mean = base.clone().check().unwrap();
        let with_mean = base
            .means(vec![Some(MeanFunction::Constant { c: 10. })])
            .check()
            .unwrap();
        assert_eq!(array![10., 10., 10.], shifted.mean_vector(&with_mean).unwrap());
        assert_abs_diff_eq!(
            centered.log_likelihood(&no_mean).unwrap(),
            shifted.log_likelihood(&with_mean).unwrap(),
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_prediction_interpolates() {
        let t = array![0., 1., 2., 3.];
        let y = t.mapv(f64::sin).insert_axis(Axis(0));
        let yerr = Array2::from_elem((1, 4), 1e-4);
        let gprn = Gprn::new(Observations::new(t.clone(), y.clone(), yerr).unwrap());
        let params = Gprn::params(vec![se_node(1.)], WeightFunction::constant(1.), array![[1.]])
            .check()
            .unwrap();
        let pred = gprn.predict(&params, 0, &t).unwrap();
        assert_abs_diff_eq!(y.row(0), pred.mean, epsilon = 1e-3);
        assert!(pred.std.iter().all(|s| *s < 1e-3));
        assert_eq!(&[4, 4], pred.cov.shape());

        let far = gprn.predict(&params, 0, &array![50.]).unwrap();
        assert_abs_diff_eq!(0., far.mean[0], epsilon = 1e-6);
        assert_abs_diff_eq!(1., far.std[0], epsilon = 1e-6);
    }

    #[test]
    fn test_prediction_other_output() {
        let gprn = two_outputs();
        let weights = array![[1.], [2.]];
        let params = Gprn::params(vec![se_node(1.)], WeightFunction::constant(1.), weights)
            .check()
            .unwrap();
        let pred = gprn.predict(&params, 1, &array![0.7, 1.0]).unwrap();
        assert_eq!(2, pred.mean.len());
        assert!(gprn.predict(&params, 2, &array![0.7]).is_err());
    }

    #[test]
    fn test_mismatched_outputs() {
        let gprn = two_outputs();
        let params = Gprn::params(vec![se_node(1.)], WeightFunction::constant(1.), array![[1.]])
            .check()
            .unwrap();
        assert!(gprn.log_likelihood(&params).is_err());
    }

    #[test]
    fn test_observations_errors() {
        let t = array![0., 1.];
        let yerr = array![[0.1, 0.1, 0.1]];
        assert!(Observations::new(t.clone(), array![[1., 2., 3.]], yerr).is_err());
        assert!(Observations::new(t.clone(), array![[1., 2.]], array![[0.1, -0.1]]).is_err());
        assert!(Observations::new(t, array![[1., f64::NAN]], array![[0.1, 0.1]]).is_err());
    }

    #[test]
    fn test_sample_prior() {
        let params = Gprn::params(
            vec![se_node(1.), Correlation::Periodic { ell: 1., period: 2. }.into()],
            WeightFunction::constant(1.),
            array![[1., 0.5], [0., 2.], [-1., 1.]],
        )
        .means(vec![None, Some(MeanFunction::Constant { c: 3. }), None])
        .jitters(array![0., 0., 0.])
        .check()
        .unwrap();
        let times = Array1::linspace(0., 5., 20);
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let sample = sample_prior_with_rng(&params, &times, &mut rng).unwrap();
        assert_eq!(&[2, 20], sample.nodes.shape());
        assert_eq!(&[3, 2, 20], sample.weights.shape());
        assert_eq!(&[3, 20], sample.outputs.shape());

        // constant weight shape gives time independent weights
        let w0 = sample.weights[[2, 1, 0]];
        let w = sample.weights.slice(s![2, 1, ..]);
        assert!(w.iter().all(|v| (v - w0).abs() < 1e-12));
        // output composition
        let expected = &sample.weights.slice(s![1, 0, ..]) * &sample.nodes.row(0)
            + &sample.weights.slice(s![1, 1, ..]) * &sample.nodes.row(1)
            + 3.;
        assert_abs_diff_eq!(expected, sample.outputs.row(1), epsilon = 1e-12);

        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let again = sample_prior_with_rng(&params, &times, &mut rng).unwrap();
        assert_eq!(sample.outputs, again.outputs);
    }

    #[test]
    fn test_params_log_likelihood() {
        let gprn = two_outputs();
        let weights = array![[1.], [2.]];
        let params = Gprn::params(vec![se_node(1.)], WeightFunction::constant(1.), weights);
        assert!(params.log_likelihood(&gprn).unwrap().is_finite());
        let bad = params.jitters(array![-1., 0.]);
        assert!(bad.log_likelihood(&gprn).is_err());
    }
}
