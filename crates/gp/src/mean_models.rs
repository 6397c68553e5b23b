//! A module for mean functions of the outputs of a GPRN.
//!
//! The following models are implemented:
//! * constant,
//! * linear,
//! * parabola,
//! * cubic,
//! * sine,
//! * keplerian (radial velocity of a planet on an eccentric orbit).

use crate::errors::{GpError, Result};
use linfa::Float;
use ndarray::{Array1, ArrayBase, Data, Ix1};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Max number of Newton iterations when solving Kepler's equation
const KEPLER_MAX_ITER: usize = 100;
/// Tolerance on the eccentric anomaly when solving Kepler's equation
const KEPLER_TOL: f64 = 1e-12;

/// The available mean functions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum MeanKind {
    /// c
    Constant,
    /// slope * t + intercept
    Linear,
    /// a t² + b t + c
    Parabola,
    /// a t³ + b t² + c t + d
    Cubic,
    /// amplitude * sin(2πt/P + phase) + offset
    Sine,
    /// K (e cos w + cos(w + ν(t)))
    Keplerian,
}

impl MeanKind {
    /// All the kinds, in declaration order
    pub const ALL: [MeanKind; 6] = [
        MeanKind::Constant,
        MeanKind::Linear,
        MeanKind::Parabola,
        MeanKind::Cubic,
        MeanKind::Sine,
        MeanKind::Keplerian,
    ];

    /// Names of the parameters, in the order expected by [MeanFunction::from_params]
    pub fn param_names(&self) -> &'static [&'static str] {
        match self {
            MeanKind::Constant => &["c"],
            MeanKind::Linear => &["slope", "intercept"],
            MeanKind::Parabola => &["a", "b", "c"],
            MeanKind::Cubic => &["a", "b", "c", "d"],
            MeanKind::Sine => &["amplitude", "period", "phase", "offset"],
            MeanKind::Keplerian => &["period", "k", "ecc", "w", "t0"],
        }
    }

    /// Number of parameters
    pub fn n_params(&self) -> usize {
        self.param_names().len()
    }
}

impl fmt::Display for MeanKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl FromStr for MeanKind {
    type Err = GpError;

    fn from_str(s: &str) -> Result<Self> {
        MeanKind::ALL
            .into_iter()
            .find(|kind| kind.to_string() == s)
            .ok_or_else(|| GpError::InvalidValueError(format!("Unknown mean kind {s:?}")))
    }
}

/// A mean function of time with its parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MeanFunction<F: Float> {
    /// See [MeanKind::Constant]
    Constant {
        /// offset
        c: F,
    },
    /// See [MeanKind::Linear]
    Linear {
        /// slope
        slope: F,
        /// value at t = 0
        intercept: F,
    },
    /// See [MeanKind::Parabola]
    Parabola {
        /// quadratic coefficient
        a: F,
        /// linear coefficient
        b: F,
        /// constant coefficient
        c: F,
    },
    /// See [MeanKind::Cubic]
    Cubic {
        /// cubic coefficient
        a: F,
        /// quadratic coefficient
        b: F,
        /// linear coefficient
        c: F,
        /// constant coefficient
        d: F,
    },
    /// See [MeanKind::Sine]
    Sine {
        /// amplitude
        amplitude: F,
        /// period
        period: F,
        /// phase (radians)
        phase: F,
        /// offset
        offset: F,
    },
    /// See [MeanKind::Keplerian]
    Keplerian {
        /// orbital period
        period: F,
        /// semi-amplitude
        k: F,
        /// eccentricity in [0, 1)
        ecc: F,
        /// argument of the periastron (radians)
        w: F,
        /// time of periastron passage
        t0: F,
    },
}

impl<F: Float> MeanFunction<F> {
    /// Build a mean function of the given `kind` from its parameters
    /// given in [MeanKind::param_names] order.
    pub fn from_params(kind: MeanKind, params: &[F]) -> Result<Self> {
        if params.len() != kind.n_params() {
            return Err(GpError::InvalidValueError(format!(
                "{kind} expects {} parameters, got {}",
                kind.n_params(),
                params.len()
            )));
        }
        let mean = match kind {
            MeanKind::Constant => MeanFunction::Constant { c: params[0] },
            MeanKind::Linear => MeanFunction::Linear {
                slope: params[0],
                intercept: params[1],
            },
            MeanKind::Parabola => MeanFunction::Parabola {
                a: params[0],
                b: params[1],
                c: params[2],
            },
            MeanKind::Cubic => MeanFunction::Cubic {
                a: params[0],
                b: params[1],
                c: params[2],
                d: params[3],
            },
            MeanKind::Sine => MeanFunction::Sine {
                amplitude: params[0],
                period: params[1],
                phase: params[2],
                offset: params[3],
            },
            MeanKind::Keplerian => MeanFunction::Keplerian {
                period: params[0],
                k: params[1],
                ecc: params[2],
                w: params[3],
                t0: params[4],
            },
        };
        mean.check()?;
        Ok(mean)
    }

    /// Kind of this mean function
    pub fn kind(&self) -> MeanKind {
        match self {
            MeanFunction::Constant { .. } => MeanKind::Constant,
            MeanFunction::Linear { .. } => MeanKind::Linear,
            MeanFunction::Parabola { .. } => MeanKind::Parabola,
            MeanFunction::Cubic { .. } => MeanKind::Cubic,
            MeanFunction::Sine { .. } => MeanKind::Sine,
            MeanFunction::Keplerian { .. } => MeanKind::Keplerian,
        }
    }

    /// Parameters in [MeanKind::param_names] order
    pub fn params(&self) -> Vec<F> {
        match *self {
            MeanFunction::Constant { c } => vec![c],
            MeanFunction::Linear { slope, intercept } => vec![slope, intercept],
            MeanFunction::Parabola { a, b, c } => vec![a, b, c],
            MeanFunction::Cubic { a, b, c, d } => vec![a, b, c, d],
            MeanFunction::Sine {
                amplitude,
                period,
                phase,
                offset,
            } => vec![amplitude, period, phase, offset],
            MeanFunction::Keplerian {
                period,
                k,
                ecc,
                w,
                t0,
            } => vec![period, k, ecc, w, t0],
        }
    }

    /// Check parameters are finite, periods strictly positive and
    /// eccentricity in [0, 1)
    pub fn check(&self) -> Result<()> {
        let kind = self.kind();
        if let Some((name, value)) = kind
            .param_names()
            .iter()
            .zip(self.params())
            .find(|(_, v)| !v.is_finite())
        {
            return Err(GpError::InvalidValueError(format!(
                "{kind} parameter {name} should be finite, got {value}"
            )));
        }
        match *self {
            MeanFunction::Sine { period, .. } | MeanFunction::Keplerian { period, .. }
                if period <= F::zero() =>
            {
                Err(GpError::InvalidValueError(format!(
                    "{kind} period should be strictly positive, got {period}"
                )))
            }
            MeanFunction::Keplerian { ecc, .. } if ecc < F::zero() || ecc >= F::one() => {
                Err(GpError::InvalidValueError(format!(
                    "{kind} eccentricity should be in [0, 1), got {ecc}"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Evaluate the mean function at the given times
    pub fn value(&self, t: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Array1<F> {
        let two_pi = F::cast(2. * std::f64::consts::PI);
        match *self {
            MeanFunction::Constant { c } => Array1::from_elem(t.len(), c),
            MeanFunction::Linear { slope, intercept } => t.mapv(|v| slope * v + intercept),
            MeanFunction::Parabola { a, b, c } => t.mapv(|v| (a * v + b) * v + c),
            MeanFunction::Cubic { a, b, c, d } => t.mapv(|v| ((a * v + b) * v + c) * v + d),
            MeanFunction::Sine {
                amplitude,
                period,
                phase,
                offset,
            } => t.mapv(|v| amplitude * F::sin(two_pi * v / period + phase) + offset),
            MeanFunction::Keplerian {
                period,
                k,
                ecc,
                w,
                t0,
            } => t.mapv(|v| {
                let nu = true_anomaly(two_pi * (v - t0) / period, ecc);
                k * (ecc * w.cos() + (w + nu).cos())
            }),
        }
    }
}

impl<F: Float> fmt::Display for MeanFunction<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = self.kind();
        let params: Vec<String> = kind
            .param_names()
            .iter()
            .zip(self.params())
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        write!(f, "{kind}({})", params.join(", "))
    }
}

/// Solve Kepler's equation `E - e sin(E) = M` with Newton iterations
pub fn eccentric_anomaly<F: Float>(mean_anomaly: F, ecc: F) -> F {
    let two_pi = F::cast(2. * std::f64::consts::PI);
    let mut m = mean_anomaly % two_pi;
    if m < F::zero() {
        m += two_pi;
    }
    let mut e = if ecc < F::cast(0.8) {
        m
    } else {
        F::cast(std::f64::consts::PI)
    };
    for _ in 0..KEPLER_MAX_ITER {
        let delta = (e - ecc * e.sin() - m) / (F::one() - ecc * e.cos());
        e -= delta;
        if delta.abs() < F::cast(KEPLER_TOL) {
            break;
        }
    }
    e
}

/// True anomaly for the given mean anomaly and eccentricity
pub fn true_anomaly<F: Float>(mean_anomaly: F, ecc: F) -> F {
    let e = eccentric_anomaly(mean_anomaly, ecc);
    let half = F::cast(0.5);
    F::cast(2.)
        * F::atan2(
            (F::one() + ecc).sqrt() * (half * e).sin(),
            (F::one() - ecc).sqrt() * (half * e).cos(),
        )
}

/// Radial velocity semi-amplitude (m/s) caused by a planet.
///
/// `period` in years, `mplanet` the planet minimum mass (M sin i) in Jupiter masses,
/// `mstar` the star mass in solar masses and `ecc` the orbit eccentricity.
pub fn semi_amplitude<F: Float>(period: F, mplanet: F, mstar: F, ecc: F) -> F {
    let third = F::one() / F::cast(3.);
    F::cast(28.435) * period.powf(-third) * mplanet * mstar.powf(F::cast(-2.) * third)
        / (F::one() - ecc * ecc).sqrt()
}
