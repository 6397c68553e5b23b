//! This library implements [Gaussian Process Regression Networks](https://arxiv.org/abs/1110.4411)
//! (GPRN) for jointly modelling several time series, typically the radial velocity
//! and activity indicators of a star.
//!
//! Each output is a sum of latent node GPs ([NodeFunction]) scaled by weight GPs
//! ([WeightFunction]) plus an optional mean function ([MeanFunction]):
//!
//! `y_i(t) = Σ_q w_iq(t) f_q(t) + m_i(t)`
//!
//! The covariance of a node/weight pair, the elementwise product of their kernel matrices,
//! is given by [branch]. The network itself is implemented by [Gprn] parameterized by [GprnParams].
//!
//! ```
//! use gprn_gp::{correlation_models::*, Gprn, NodeFunction, Observations, WeightFunction};
//! use linfa::ParamGuard;
//! use ndarray::{array, Array2};
//!
//! let t = array![0., 1., 2., 3.];
//! let y = array![[0.1, 0.8, 0.9, 0.2], [1.2, 2.1, 2.0, 1.1]];
//! let obs = Observations::new(t, y, Array2::from_elem((2, 4), 0.1)).unwrap();
//! let gprn = Gprn::new(obs);
//!
//! let node = NodeFunction::new(CorrelationKind::QuasiPeriodic, &[10., 2.5, 1.]).unwrap();
//! let params = Gprn::params(vec![node], WeightFunction::constant(1.), array![[1.], [0.5]])
//!     .check()
//!     .unwrap();
//! let loglike: f64 = gprn.log_likelihood(&params).unwrap();
//! assert!(loglike.is_finite());
//! ```
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod algorithm;
pub mod correlation_models;
mod errors;
pub mod mean_models;
mod node_functions;
mod parameters;
mod utils;
mod weight_functions;

pub use algorithm::*;
pub use errors::*;
pub use mean_models::MeanFunction;
pub use node_functions::NodeFunction;
pub use parameters::*;
pub use utils::{cholesky_with_nugget, MAX_NUGGET_TRIES, NUGGET_RATIO};
pub use weight_functions::WeightFunction;
