//! This library holds the observed time series used to model stellar activity
//! and planetary signals with Gaussian Process Regression Networks (GPRN):
//! observation times, radial velocities (RV), full width at half maximum (FWHM)
//! of the cross-correlation function, bisector span (BIS) and activity index
//! (log R'hk), each with its measurement uncertainties.
//!
//! Data are read from whitespace separated `.rdb` files with [Data::load]
//! or registered once as a process-wide read-only instance with [Data::load_instance].
//!
//! ```no_run
//! use gprn_data::{Data, Units, DEFAULT_SKIP};
//!
//! let data = Data::load_instance("corot7.rdb", Units::KilometersPerSecond, DEFAULT_SKIP)
//!     .expect("data loading");
//! println!("{} points, rv std = {}", data.n(), data.get_rv_std());
//! ```
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod data;
mod errors;
mod instance;
mod utils;

pub use data::*;
pub use errors::*;
pub use utils::phase_folding;
