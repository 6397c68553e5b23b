//! Bayesian inference plumbing for Gaussian process regression networks.
//!
//! A [GprnConfig], usually read from a JSON file, names the data file, the node and weight
//! shapes, the mean functions and a [Prior] for every free parameter. A [GprnModel] built from
//! it exposes the [SamplerModel] interface used by unit-cube samplers such as nested sampling:
//! its state lives in the unit hypercube and its log-likelihood is the one of the network
//! evaluated on the loaded data.
//!
//! ```no_run
//! use gprn_data::{Data, Units};
//! use gprn_inference::{GprnConfig, GprnModel, SamplerModel};
//! use ndarray_rand::rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256Plus;
//!
//! let config = GprnConfig::from_json_file("corot7.json").unwrap();
//! Data::load_instance(&config.data.path, config.data.units, config.data.skip).unwrap();
//!
//! let mut model = GprnModel::from_instance(&config).unwrap();
//! let mut rng = Xoshiro256Plus::seed_from_u64(42);
//! model.draw_from_prior(&mut rng);
//! println!("{} -> {}", model.description(), model.log_likelihood());
//! ```
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod config;
mod errors;
mod model;
mod priors;

pub use config::*;
pub use errors::*;
pub use model::*;
pub use priors::*;
