use crate::errors::{DataError, Result};

use log::{debug, info};
use ndarray::{concatenate, Array1, Axis};
use ndarray_stats::QuantileExt;
#[cfg(feature = "serializable")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Number of numeric columns expected in a data file:
/// time, rv, rv error, fwhm, fwhm error, bis, bis error, rhk, rhk error
pub const N_COLUMNS: usize = 9;

/// Default number of header lines skipped in `.rdb` files (names and dashes)
pub const DEFAULT_SKIP: usize = 2;

/// Names of the observed outputs, in the order used by [`Data::get_y`]
pub const OUTPUT_NAMES: [&str; 4] = ["rv", "fwhm", "bis", "rhk"];

/// Units of the velocity-like columns of a data file
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serializable",
    derive(Serialize, Deserialize),
    serde(into = "String"),
    serde(try_from = "String")
)]
pub enum Units {
    /// Values given in m/s, used as is
    #[default]
    MetersPerSecond,
    /// Values given in km/s, converted to m/s at load time
    KilometersPerSecond,
}

impl Units {
    /// Factor converting values in these units to m/s
    pub fn scale(&self) -> f64 {
        match self {
            Units::MetersPerSecond => 1.,
            Units::KilometersPerSecond => 1000.,
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Units::MetersPerSecond => write!(f, "ms"),
            Units::KilometersPerSecond => write!(f, "kms"),
        }
    }
}

impl FromStr for Units {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ms" => Ok(Units::MetersPerSecond),
            "kms" => Ok(Units::KilometersPerSecond),
            _ => Err(DataError::InvalidValueError(format!(
                "Bad units value {s:?}, should be 'ms' or 'kms'"
            ))),
        }
    }
}

impl From<Units> for String {
    fn from(item: Units) -> String {
        item.to_string()
    }
}

impl TryFrom<String> for Units {
    type Error = DataError;
    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Observed time series: radial velocities and activity indicators
/// with their measurement uncertainties.
///
/// All series share the same length and the time ordering of `t`,
/// which is checked at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Data {
    t: Array1<f64>,
    rv: Array1<f64>,
    rverr: Array1<f64>,
    fwhm: Array1<f64>,
    fwhmerr: Array1<f64>,
    bis: Array1<f64>,
    biserr: Array1<f64>,
    rhk: Array1<f64>,
    rhkerr: Array1<f64>,
}

impl Data {
    /// Load a whitespace separated data file (typically `.rdb`).
    ///
    /// The first `skip` lines are header lines, blank lines and lines starting with `#`
    /// are ignored. Each remaining row holds at least [N_COLUMNS] numbers
    /// `t rv rverr fwhm fwhmerr bis biserr rhk rhkerr`, extra columns are ignored.
    /// With [Units::KilometersPerSecond], rv, fwhm, bis and their errors are
    /// converted to m/s.
    pub fn load<P: AsRef<Path>>(path: P, units: Units, skip: usize) -> Result<Data> {
        let path = path.as_ref();
        info!("Load data from {path:?} (units={units}, skip={skip})");
        let content = fs::read_to_string(path)?;
        let data = Self::parse(&content, units, skip)?;
        info!(
            "Loaded {} observations spanning {:.2} days",
            data.n(),
            data.get_timespan()
        );
        Ok(data)
    }

    /// Parse data file content, see [Data::load]
    pub fn parse(content: &str, units: Units, skip: usize) -> Result<Data> {
        let mut columns: [Vec<f64>; N_COLUMNS] = Default::default();
        for (idx, line) in content.lines().enumerate().skip(skip) {
            let row = line.trim();
            if row.is_empty() || row.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = row.split_whitespace().collect();
            if fields.len() < N_COLUMNS {
                return Err(DataError::MissingColumns {
                    line: idx + 1,
                    expected: N_COLUMNS,
                    found: fields.len(),
                });
            }
            for (column, field) in columns.iter_mut().zip(fields.iter()) {
                let value = field.parse::<f64>().map_err(|e| DataError::ParseError {
                    line: idx + 1,
                    msg: format!("{field:?}: {e}"),
                })?;
                column.push(value);
            }
        }
        debug!("Parsed {} rows", columns[0].len());

        let [t, rv, rverr, fwhm, fwhmerr, bis, biserr, rhk, rhkerr] =
            columns.map(Array1::from_vec);
        let scale = units.scale();
        Data::from_series(
            t,
            (rv * scale, rverr * scale),
            (fwhm * scale, fwhmerr * scale),
            (bis * scale, biserr * scale),
            (rhk, rhkerr),
        )
    }

    /// Build data from in-memory series given as `(values, errors)` pairs.
    ///
    /// Fails when series are empty, of different lengths, contain non finite values,
    /// negative errors or when `t` is not strictly increasing.
    pub fn from_series(
        t: Array1<f64>,
        rv: (Array1<f64>, Array1<f64>),
        fwhm: (Array1<f64>, Array1<f64>),
        bis: (Array1<f64>, Array1<f64>),
        rhk: (Array1<f64>, Array1<f64>),
    ) -> Result<Data> {
        let data = Data {
            t,
            rv: rv.0,
            rverr: rv.1,
            fwhm: fwhm.0,
            fwhmerr: fwhm.1,
            bis: bis.0,
            biserr: bis.1,
            rhk: rhk.0,
            rhkerr: rhk.1,
        };
        data.validate()?;
        Ok(data)
    }

    fn validate(&self) -> Result<()> {
        let n = self.t.len();
        if n == 0 {
            return Err(DataError::EmptyData("no observation found".to_string()));
        }
        let named = [
            ("t", &self.t),
            ("rv", &self.rv),
            ("rverr", &self.rverr),
            ("fwhm", &self.fwhm),
            ("fwhmerr", &self.fwhmerr),
            ("bis", &self.bis),
            ("biserr", &self.biserr),
            ("rhk", &self.rhk),
            ("rhkerr", &self.rhkerr),
        ];
        for (name, series) in named {
            if series.len() != n {
                return Err(DataError::InvalidValueError(format!(
                    "{name} has {} values, expected {n} as time",
                    series.len()
                )));
            }
            if series.iter().any(|v| !v.is_finite()) {
                return Err(DataError::InvalidValueError(format!(
                    "{name} contains non finite values"
                )));
            }
        }
        for (name, errors) in named.iter().skip(2).step_by(2) {
            if errors.iter().any(|v| *v < 0.) {
                return Err(DataError::InvalidValueError(format!(
                    "{name} contains negative uncertainties"
                )));
            }
        }
        if let Some(i) = (1..n).find(|&i| self.t[i] <= self.t[i - 1]) {
            return Err(DataError::InvalidValueError(format!(
                "time is not strictly increasing at index {i} ({} <= {})",
                self.t[i],
                self.t[i - 1]
            )));
        }
        Ok(())
    }

    /// Number of observations
    pub fn n(&self) -> usize {
        self.t.len()
    }

    /// Observation times
    pub fn get_t(&self) -> &Array1<f64> {
        &self.t
    }

    /// Earliest observation time
    pub fn get_t_min(&self) -> f64 {
        *self.t.min_skipnan()
    }

    /// Latest observation time
    pub fn get_t_max(&self) -> f64 {
        *self.t.max_skipnan()
    }

    /// Time at the middle of the observation span
    pub fn get_t_middle(&self) -> f64 {
        self.get_t_min() + 0.5 * (self.get_t_max() - self.get_t_min())
    }

    /// Duration covered by the observations
    pub fn get_timespan(&self) -> f64 {
        self.get_t_max() - self.get_t_min()
    }

    /// Radial velocities
    pub fn get_rv(&self) -> &Array1<f64> {
        &self.rv
    }

    /// Smallest radial velocity
    pub fn get_rv_min(&self) -> f64 {
        *self.rv.min_skipnan()
    }

    /// Largest radial velocity
    pub fn get_rv_max(&self) -> f64 {
        *self.rv.max_skipnan()
    }

    /// Peak to peak radial velocity span
    pub fn get_rv_span(&self) -> f64 {
        self.get_rv_max() - self.get_rv_min()
    }

    /// Population variance of the radial velocities
    pub fn get_rv_var(&self) -> f64 {
        self.rv.var(0.)
    }

    /// Population standard deviation of the radial velocities
    pub fn get_rv_std(&self) -> f64 {
        self.get_rv_var().sqrt()
    }

    /// Radial velocity uncertainties
    pub fn get_rverr(&self) -> &Array1<f64> {
        &self.rverr
    }

    /// Largest slope allowed by the data: rv span over the time span between
    /// first and last observations (infinite with a single epoch)
    pub fn topslope(&self) -> f64 {
        let dt = self.t[self.n() - 1] - self.t[0];
        if dt <= 0. {
            return f64::INFINITY;
        }
        (self.get_rv_max() - self.get_rv_min()).abs() / dt
    }

    /// Full width at half maximum of the cross-correlation function
    pub fn get_fwhm(&self) -> &Array1<f64> {
        &self.fwhm
    }

    /// FWHM uncertainties
    pub fn get_fwhmerr(&self) -> &Array1<f64> {
        &self.fwhmerr
    }

    /// Bisector span
    pub fn get_bis(&self) -> &Array1<f64> {
        &self.bis
    }

    /// Bisector span uncertainties
    pub fn get_biserr(&self) -> &Array1<f64> {
        &self.biserr
    }

    /// Activity index log R'hk
    pub fn get_rhk(&self) -> &Array1<f64> {
        &self.rhk
    }

    /// Activity index uncertainties
    pub fn get_rhkerr(&self) -> &Array1<f64> {
        &self.rhkerr
    }

    /// All outputs concatenated as `[rv, fwhm, bis, rhk]`
    pub fn get_y(&self) -> Array1<f64> {
        concatenate![Axis(0), self.rv, self.fwhm, self.bis, self.rhk]
    }

    /// All uncertainties concatenated as `[rverr, fwhmerr, biserr, rhkerr]`
    pub fn get_sig(&self) -> Array1<f64> {
        concatenate![Axis(0), self.rverr, self.fwhmerr, self.biserr, self.rhkerr]
    }

    /// Time tiled once per output, matching [Data::get_y] layout
    pub fn get_tt(&self) -> Array1<f64> {
        concatenate![Axis(0), self.t, self.t, self.t, self.t]
    }

    /// Outputs as `(values, errors)` pairs in [OUTPUT_NAMES] order
    pub fn outputs(&self) -> [(&Array1<f64>, &Array1<f64>); 4] {
        [
            (&self.rv, &self.rverr),
            (&self.fwhm, &self.fwhmerr),
            (&self.bis, &self.biserr),
            (&self.rhk, &self.rhkerr),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    const RDB: &str = "\
jdb\tvrad\tsvrad\tfwhm\tsig_fwhm\tbis_span\tsig_bis_span\trhk\tsig_rhk
---\t----\t-----\t----\t--------\t--------\t------------\t---\t-------
54522.7\t31.236\t0.002\t7.10\t0.004\t-0.030\t0.004\t-4.80\t0.010
54523.6\t31.244\t0.003\t7.11\t0.006\t-0.028\t0.006\t-4.81\t0.012

# a comment
54525.1\t31.228\t0.002\t7.09\t0.004\t-0.033\t0.004\t-4.79\t0.011\textra
";

    fn small_data() -> Data {
        Data::from_series(
            array![1., 2., 4.],
            (array![1., 3., -1.], array![0.1, 0.1, 0.2]),
            (array![10., 11., 12.], array![1., 1., 1.]),
            (array![-1., 0., 1.], array![0.5, 0.5, 0.5]),
            (array![-4.9, -4.8, -4.7], array![0.01, 0.02, 0.03]),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_rdb_kms() {
        let data = Data::parse(RDB, Units::KilometersPerSecond, DEFAULT_SKIP).unwrap();
        assert_eq!(3, data.n());
        assert_abs_diff_eq!(data.get_rv(), &array![31236., 31244., 31228.], epsilon = 1e-9);
        assert_abs_diff_eq!(data.get_rverr(), &array![2., 3., 2.], epsilon = 1e-9);
        assert_abs_diff_eq!(data.get_bis(), &array![-30., -28., -33.], epsilon = 1e-9);
        // activity index is unitless
        assert_abs_diff_eq!(data.get_rhk(), &array![-4.80, -4.81, -4.79]);
        assert_abs_diff_eq!(data.get_rhkerr(), &array![0.010, 0.012, 0.011]);
    }

    #[test]
    fn test_parse_rdb_ms() {
        let data = Data::parse(RDB, Units::MetersPerSecond, DEFAULT_SKIP).unwrap();
        assert_abs_diff_eq!(data.get_fwhm(), &array![7.10, 7.11, 7.09]);
    }

    #[test]
    fn test_parse_missing_columns() {
        let content = "t rv\n-- --\n1.0 2.0 0.1\n";
        match Data::parse(content, Units::default(), 2) {
            Err(DataError::MissingColumns {
                line,
                expected,
                found,
            }) => {
                assert_eq!(3, line);
                assert_eq!(N_COLUMNS, expected);
                assert_eq!(3, found);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_parse_bad_number() {
        let content = "1 2 3 4 5 6 7 8 nan?\n";
        let res = Data::parse(content, Units::default(), 0);
        assert!(matches!(res, Err(DataError::ParseError { line: 1, .. })));
    }

    #[test]
    fn test_parse_empty() {
        let res = Data::parse("a b\n-- --\n", Units::default(), 2);
        assert!(matches!(res, Err(DataError::EmptyData(_))));
    }

    #[test]
    fn test_unsorted_time() {
        let content = "2 0 1 0 1 0 1 0 1\n1 0 1 0 1 0 1 0 1\n";
        let res = Data::parse(content, Units::default(), 0);
        assert!(matches!(res, Err(DataError::InvalidValueError(_))));
        let content = "1 0 1 0 1 0 1 0 1\n1 2 1 0 1 0 1 0 1\n";
        let res = Data::parse(content, Units::default(), 0);
        assert!(matches!(res, Err(DataError::InvalidValueError(_))));
    }

    #[test]
    fn test_single_epoch_topslope() {
        let data = Data::from_series(
            array![1.],
            (array![3.], array![0.1]),
            (array![10.], array![1.]),
            (array![0.], array![0.5]),
            (array![-4.9], array![0.01]),
        )
        .unwrap();
        assert!(data.topslope().is_infinite());
        assert!(data.topslope() > 0.);
    }

    #[test]
    fn test_length_mismatch() {
        let res = Data::from_series(
            array![1., 2.],
            (array![1., 3.], array![0.1]),
            (array![10., 11.], array![1., 1.]),
            (array![-1., 0.], array![0.5, 0.5]),
            (array![-4.9, -4.8], array![0.01, 0.02]),
        );
        assert!(matches!(res, Err(DataError::InvalidValueError(_))));
    }

    #[test]
    fn test_negative_errors() {
        let res = Data::from_series(
            array![1., 2.],
            (array![1., 3.], array![0.1, 0.1]),
            (array![10., 11.], array![1., -1.]),
            (array![-1., 0.], array![0.5, 0.5]),
            (array![-4.9, -4.8], array![0.01, 0.02]),
        );
        assert!(matches!(res, Err(DataError::InvalidValueError(_))));
    }

    #[test]
    fn test_time_getters() {
        let data = small_data();
        assert_abs_diff_eq!(1., data.get_t_min());
        assert_abs_diff_eq!(4., data.get_t_max());
        assert_abs_diff_eq!(2.5, data.get_t_middle());
        assert_abs_diff_eq!(3., data.get_timespan());
    }

    #[test]
    fn test_rv_statistics() {
        let data = small_data();
        assert_abs_diff_eq!(-1., data.get_rv_min());
        assert_abs_diff_eq!(3., data.get_rv_max());
        assert_abs_diff_eq!(4., data.get_rv_span());
        // mean 1, squared deviations 0, 4, 4
        assert_abs_diff_eq!(8. / 3., data.get_rv_var(), epsilon = 1e-12);
        assert_abs_diff_eq!((8f64 / 3.).sqrt(), data.get_rv_std(), epsilon = 1e-12);
        assert_abs_diff_eq!(4. / 3., data.topslope(), epsilon = 1e-12);
    }

    #[test]
    fn test_joint_vectors() {
        let data = small_data();
        assert_abs_diff_eq!(
            data.get_y(),
            array![1., 3., -1., 10., 11., 12., -1., 0., 1., -4.9, -4.8, -4.7]
        );
        assert_abs_diff_eq!(
            data.get_sig(),
            array![0.1, 0.1, 0.2, 1., 1., 1., 0.5, 0.5, 0.5, 0.01, 0.02, 0.03]
        );
        assert_abs_diff_eq!(
            data.get_tt(),
            array![1., 2., 4., 1., 2., 4., 1., 2., 4., 1., 2., 4.]
        );
        let outputs = data.outputs();
        assert_eq!(OUTPUT_NAMES.len(), outputs.len());
        assert_eq!(data.get_bis(), outputs[2].0);
    }

    #[test]
    fn test_units() {
        assert_eq!(Units::KilometersPerSecond, "kms".parse::<Units>().unwrap());
        assert_eq!(Units::MetersPerSecond, "ms".parse::<Units>().unwrap());
        assert!("mph".parse::<Units>().is_err());
        assert_eq!("kms", Units::KilometersPerSecond.to_string());
    }
}
