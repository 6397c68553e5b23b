//! A module for the unit-amplitude correlation shapes shared by node and weight functions.
//!
//! Shapes are evaluated on time lags `r = t1 - t2`. The following shapes are implemented:
//! * constant,
//! * white noise,
//! * squared exponential,
//! * periodic,
//! * quasi-periodic,
//! * rational quadratic,
//! * cosine,
//! * exponential,
//! * matern 3/2,
//! * matern 5/2.

use crate::errors::{GpError, Result};
use linfa::Float;
use ndarray::{Array2, ArrayBase, Data, Ix1};
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A trait for functions of the time lag used to build covariance matrices
pub trait KernelFunction<F: Float>: Clone + fmt::Debug + Sync {
    /// Kernel value for the time lag `r = t1 - t2`
    fn value(&self, r: F) -> F;

    /// Kernel matrix `K[i, j] = value(t1[i] - t2[j])` of shape (len(t1), len(t2))
    fn matrix(
        &self,
        t1: &ArrayBase<impl Data<Elem = F>, Ix1>,
        t2: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Array2<F> {
        Array2::from_shape_fn((t1.len(), t2.len()), |(i, j)| self.value(t1[i] - t2[j]))
    }
}

/// The available correlation shapes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serializable", derive(Serialize, Deserialize))]
pub enum CorrelationKind {
    /// Fully correlated: 1
    Constant,
    /// Uncorrelated: 1 when r == 0, 0 otherwise
    WhiteNoise,
    /// exp(-r² / (2 ell²))
    SquaredExponential,
    /// exp(-2 sin²(π|r|/P) / ell²)
    Periodic,
    /// exp(-2 sin²(π|r|/P) / ell_p² - r² / (2 ell_e²))
    QuasiPeriodic,
    /// (1 + r² / (2 alpha ell²))^(-alpha)
    RationalQuadratic,
    /// cos(2π|r|/P)
    Cosine,
    /// exp(-|r| / ell)
    Exponential,
    /// (1 + √3|r|/ell) exp(-√3|r|/ell)
    Matern32,
    /// (1 + √5|r|/ell + 5r²/(3ell²)) exp(-√5|r|/ell)
    Matern52,
}

impl CorrelationKind {
    /// All the kinds, in declaration order
    pub const ALL: [CorrelationKind; 10] = [
        CorrelationKind::Constant,
        CorrelationKind::WhiteNoise,
        CorrelationKind::SquaredExponential,
        CorrelationKind::Periodic,
        CorrelationKind::QuasiPeriodic,
        CorrelationKind::RationalQuadratic,
        CorrelationKind::Cosine,
        CorrelationKind::Exponential,
        CorrelationKind::Matern32,
        CorrelationKind::Matern52,
    ];

    /// Names of the shape parameters, in the order expected by [Correlation::from_params]
    pub fn param_names(&self) -> &'static [&'static str] {
        match self {
            CorrelationKind::Constant | CorrelationKind::WhiteNoise => &[],
            CorrelationKind::SquaredExponential
            | CorrelationKind::Exponential
            | CorrelationKind::Matern32
            | CorrelationKind::Matern52 => &["ell"],
            CorrelationKind::Periodic => &["ell", "period"],
            CorrelationKind::QuasiPeriodic => &["ell_e", "period", "ell_p"],
            CorrelationKind::RationalQuadratic => &["alpha", "ell"],
            CorrelationKind::Cosine => &["period"],
        }
    }

    /// Number of shape parameters
    pub fn n_params(&self) -> usize {
        self.param_names().len()
    }
}

impl fmt::Display for CorrelationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl FromStr for CorrelationKind {
    type Err = GpError;

    fn from_str(s: &str) -> Result<Self> {
        CorrelationKind::ALL
            .into_iter()
            .find(|kind| kind.to_string() == s)
            .ok_or_else(|| GpError::InvalidValueError(format!("Unknown correlation kind {s:?}")))
    }
}

/// A unit-amplitude correlation shape with its parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Correlation<F: Float> {
    /// See [CorrelationKind::Constant]
    Constant,
    /// See [CorrelationKind::WhiteNoise]
    WhiteNoise,
    /// See [CorrelationKind::SquaredExponential]
    SquaredExponential {
        /// length scale
        ell: F,
    },
    /// See [CorrelationKind::Periodic]
    Periodic {
        /// length scale of the periodic component
        ell: F,
        /// period
        period: F,
    },
    /// See [CorrelationKind::QuasiPeriodic]
    QuasiPeriodic {
        /// evolutionary time scale
        ell_e: F,
        /// period
        period: F,
        /// length scale of the periodic component
        ell_p: F,
    },
    /// See [CorrelationKind::RationalQuadratic]
    RationalQuadratic {
        /// relative weighting of large and small scale variations
        alpha: F,
        /// length scale
        ell: F,
    },
    /// See [CorrelationKind::Cosine]
    Cosine {
        /// period
        period: F,
    },
    /// See [CorrelationKind::Exponential]
    Exponential {
        /// length scale
        ell: F,
    },
    /// See [CorrelationKind::Matern32]
    Matern32 {
        /// length scale
        ell: F,
    },
    /// See [CorrelationKind::Matern52]
    Matern52 {
        /// length scale
        ell: F,
    },
}

impl<F: Float> Correlation<F> {
    /// Build a correlation of the given `kind` from its parameters
    /// given in [CorrelationKind::param_names] order.
    ///
    /// Fails when the number of parameters does not match or when a parameter
    /// is not finite and strictly positive.
    pub fn from_params(kind: CorrelationKind, params: &[F]) -> Result<Self> {
        if params.len() != kind.n_params() {
            return Err(GpError::InvalidValueError(format!(
                "{kind} expects {} parameters, got {}",
                kind.n_params(),
                params.len()
            )));
        }
        let corr = match kind {
            CorrelationKind::Constant => Correlation::Constant,
            CorrelationKind::WhiteNoise => Correlation::WhiteNoise,
            CorrelationKind::SquaredExponential => {
                Correlation::SquaredExponential { ell: params[0] }
            }
            CorrelationKind::Periodic => Correlation::Periodic {
                ell: params[0],
                period: params[1],
            },
            CorrelationKind::QuasiPeriodic => Correlation::QuasiPeriodic {
                ell_e: params[0],
                period: params[1],
                ell_p: params[2],
            },
            CorrelationKind::RationalQuadratic => Correlation::RationalQuadratic {
                alpha: params[0],
                ell: params[1],
            },
            CorrelationKind::Cosine => Correlation::Cosine { period: params[0] },
            CorrelationKind::Exponential => Correlation::Exponential { ell: params[0] },
            CorrelationKind::Matern32 => Correlation::Matern32 { ell: params[0] },
            CorrelationKind::Matern52 => Correlation::Matern52 { ell: params[0] },
        };
        corr.check()?;
        Ok(corr)
    }

    /// Kind of this correlation
    pub fn kind(&self) -> CorrelationKind {
        match self {
            Correlation::Constant => CorrelationKind::Constant,
            Correlation::WhiteNoise => CorrelationKind::WhiteNoise,
            Correlation::SquaredExponential { .. } => CorrelationKind::SquaredExponential,
            Correlation::Periodic { .. } => CorrelationKind::Periodic,
            Correlation::QuasiPeriodic { .. } => CorrelationKind::QuasiPeriodic,
            Correlation::RationalQuadratic { .. } => CorrelationKind::RationalQuadratic,
            Correlation::Cosine { .. } => CorrelationKind::Cosine,
            Correlation::Exponential { .. } => CorrelationKind::Exponential,
            Correlation::Matern32 { .. } => CorrelationKind::Matern32,
            Correlation::Matern52 { .. } => CorrelationKind::Matern52,
        }
    }

    /// Shape parameters in [CorrelationKind::param_names] order
    pub fn params(&self) -> Vec<F> {
        match *self {
            Correlation::Constant | Correlation::WhiteNoise => vec![],
            Correlation::SquaredExponential { ell }
            | Correlation::Exponential { ell }
            | Correlation::Matern32 { ell }
            | Correlation::Matern52 { ell } => vec![ell],
            Correlation::Periodic { ell, period } => vec![ell, period],
            Correlation::QuasiPeriodic {
                ell_e,
                period,
                ell_p,
            } => vec![ell_e, period, ell_p],
            Correlation::RationalQuadratic { alpha, ell } => vec![alpha, ell],
            Correlation::Cosine { period } => vec![period],
        }
    }

    /// Check every parameter is finite and strictly positive
    pub fn check(&self) -> Result<()> {
        let kind = self.kind();
        for (name, value) in kind.param_names().iter().zip(self.params()) {
            if !(value.is_finite() && value > F::zero()) {
                return Err(GpError::InvalidValueError(format!(
                    "{kind} parameter {name} should be finite and strictly positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl<F: Float> KernelFunction<F> for Correlation<F> {
    fn value(&self, r: F) -> F {
        let two = F::cast(2.);
        let pi = F::cast(std::f64::consts::PI);
        let abs_r = r.abs();
        match *self {
            Correlation::Constant => F::one(),
            Correlation::WhiteNoise => {
                if r == F::zero() {
                    F::one()
                } else {
                    F::zero()
                }
            }
            Correlation::SquaredExponential { ell } => F::exp(-r * r / (two * ell * ell)),
            Correlation::Periodic { ell, period } => {
                let s = F::sin(pi * abs_r / period);
                F::exp(-two * s * s / (ell * ell))
            }
            Correlation::QuasiPeriodic {
                ell_e,
                period,
                ell_p,
            } => {
                let s = F::sin(pi * abs_r / period);
                F::exp(-two * s * s / (ell_p * ell_p) - r * r / (two * ell_e * ell_e))
            }
            Correlation::RationalQuadratic { alpha, ell } => {
                (F::one() + r * r / (two * alpha * ell * ell)).powf(-alpha)
            }
            Correlation::Cosine { period } => F::cos(two * pi * abs_r / period),
            Correlation::Exponential { ell } => F::exp(-abs_r / ell),
            Correlation::Matern32 { ell } => {
                let a = F::cast(3.).sqrt() * abs_r / ell;
                (F::one() + a) * F::exp(-a)
            }
            Correlation::Matern52 { ell } => {
                let a = F::cast(5.).sqrt() * abs_r / ell;
                (F::one() + a + a * a / F::cast(3.)) * F::exp(-a)
            }
        }
    }
}

impl<F: Float> fmt::Display for Correlation<F> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use paste::paste;

    fn sample(kind: CorrelationKind) -> Correlation<f64> {
        let params = vec![1.7; kind.n_params()];
        Correlation::from_params(kind, &params).unwrap()
    }

    macro_rules! test_correlation {
        ($kind:ident) => {
            paste! {
                #[test]
                fn [<test_ $kind:snake _unit_at_zero_and_symmetric>]() {
                    let corr = sample(CorrelationKind::$kind);
                    assert_eq!(CorrelationKind::$kind, corr.kind());
                    assert_abs_diff_eq!(1.0, corr.value(0.0), epsilon = 1e-12);
                    for r in [0.3, 1.1, 4.2, 27.5] {
                        assert_abs_diff_eq!(corr.value(r), corr.value(-r), epsilon = 1e-12);
                        assert!(corr.value(r).abs() <= 1.0 + 1e-12);
                    }
                    let t = array![0., 0.5, 2.];
                    let k = corr.matrix(&t, &t);
                    assert_abs_diff_eq!(k, k.t().to_owned(), epsilon = 1e-12);
                }
            }
        };
    }

    test_correlation!(Constant);
    test_correlation!(WhiteNoise);
    test_correlation!(SquaredExponential);
    test_correlation!(Periodic);
    test_correlation!(QuasiPeriodic);
    test_correlation!(RationalQuadratic);
    test_correlation!(Cosine);
    test_correlation!(Exponential);
    test_correlation!(Matern32);
    test_correlation!(Matern52);

    #[test]
    fn test_squared_exponential_value() {
        let corr = Correlation::SquaredExponential { ell: 2.0 };
        assert_abs_diff_eq!((-0.5f64).exp(), corr.value(2.0), epsilon = 1e-12);
    }

    #[test]
    fn test_periodicity() {
        let period = 3.3;
        let periodic = Correlation::Periodic { ell: 0.8, period };
        let cosine = Correlation::Cosine { period };
        for r in [0.1, 0.7, 2.9] {
            let shifted = periodic.value(r + 2. * period);
            assert_abs_diff_eq!(periodic.value(r), shifted, epsilon = 1e-10);
            assert_abs_diff_eq!(cosine.value(r), cosine.value(r + period), epsilon = 1e-10);
        }
        assert_abs_diff_eq!(1.0, periodic.value(period), epsilon = 1e-10);
    }

    #[test]
    fn test_quasi_periodic_is_product() {
        let qp = Correlation::QuasiPeriodic {
            ell_e: 20.,
            period: 23.,
            ell_p: 0.5,
        };
        let se = Correlation::SquaredExponential { ell: 20. };
        let per = Correlation::Periodic {
            ell: 0.5,
            period: 23.,
        };
        for r in [0.5, 7., 31.] {
            assert_abs_diff_eq!(qp.value(r), se.value(r) * per.value(r), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_matern_values() {
        let m32 = Correlation::Matern32 { ell: 1.0 };
        let a = 3f64.sqrt();
        assert_abs_diff_eq!((1. + a) * (-a).exp(), m32.value(1.0), epsilon = 1e-12);
        let m52 = Correlation::Matern52 { ell: 1.0 };
        let b = 5f64.sqrt();
        assert_abs_diff_eq!((1. + b + 5. / 3.) * (-b).exp(), m52.value(1.0), epsilon = 1e-12);
    }

    #[test]
    fn test_white_noise_matrix() {
        let t1 = array![1., 2., 3.];
        let t2 = array![2., 5.];
        let k = Correlation::<f64>::WhiteNoise.matrix(&t1, &t2);
        assert_abs_diff_eq!(k, array![[0., 0.], [1., 0.], [0., 0.]]);
    }

    #[test]
    fn test_from_params_errors() {
        assert!(Correlation::<f64>::from_params(CorrelationKind::Periodic, &[1.]).is_err());
        assert!(Correlation::<f64>::from_params(CorrelationKind::Matern32, &[-1.]).is_err());
        assert!(Correlation::<f64>::from_params(CorrelationKind::Cosine, &[f64::NAN]).is_err());
        let qp = Correlation::from_params(CorrelationKind::QuasiPeriodic, &[20., 23., 0.5]);
        let qp = qp.unwrap();
        assert_eq!(vec![20., 23., 0.5], qp.params());
    }

    #[test]
    fn test_kind_names() {
        for kind in CorrelationKind::ALL {
            assert_eq!(kind, kind.to_string().parse::<CorrelationKind>().unwrap());
        }
        assert!("Gaussian".parse::<CorrelationKind>().is_err());
        assert_eq!(
            "Periodic(ell=1, period=2)",
            Correlation::Periodic { ell: 1., period: 2. }.to_string()
        );
    }
}
