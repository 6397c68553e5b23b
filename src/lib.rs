//! Gaussian process regression networks (GPRN) for radial-velocity time series.
//!
//! This crate gathers the GPRN libraries:
//! * [data]: loading of the observed series (time, radial velocity, FWHM, BIS span, log R'hk),
//! * [gp]: node, weight and mean functions, network covariance, likelihood and prediction,
//! * [inference]: priors, JSON configuration and the model driven by unit-cube samplers.
//!
//! The `gprn` binary reads a JSON configuration, loads the data file it names,
//! evaluates the network likelihood over draws from the prior and optionally saves them
//! as a `.npy` file:
//!
//! ```text
//! GPRN_LOG=debug gprn corot7.json 1000 draws.npy
//! ```
pub use gprn_data as data;
pub use gprn_gp as gp;
pub use gprn_inference as inference;

/// Environment variable controlling the log level of the binary
pub const GPRN_LOG: &str = "GPRN_LOG";
