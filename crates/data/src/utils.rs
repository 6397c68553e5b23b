use crate::errors::{DataError, Result};
use ndarray::{Array1, ArrayBase, Data as NdData, Ix1};

/// Fold a time series with the given `period`.
///
/// The phase of each time is the fractional part of `t / period` in [0, 1).
/// Returns `(phase, y, yerr)` sorted by increasing phase, `yerr` being zeros when not given.
pub fn phase_folding(
    t: &ArrayBase<impl NdData<Elem = f64>, Ix1>,
    y: &ArrayBase<impl NdData<Elem = f64>, Ix1>,
    yerr: Option<&Array1<f64>>,
    period: f64,
) -> Result<(Array1<f64>, Array1<f64>, Array1<f64>)> {
    if !(period.is_finite() && period > 0.) {
        return Err(DataError::InvalidValueError(format!(
            "period should be strictly positive, got {period}"
        )));
    }
    let yerr = yerr.cloned().unwrap_or_else(|| Array1::zeros(y.len()));
    if t.len() != y.len() || y.len() != yerr.len() {
        return Err(DataError::InvalidValueError(format!(
            "series lengths differ: t={}, y={}, yerr={}",
            t.len(),
            y.len(),
            yerr.len()
        )));
    }

    let phase = t.mapv(|v| (v / period).rem_euclid(1.));
    let mut order: Vec<usize> = (0..t.len()).collect();
    order.sort_by(|&a, &b| phase[a].total_cmp(&phase[b]));

    Ok((
        order.iter().map(|&i| phase[i]).collect(),
        order.iter().map(|&i| y[i]).collect(),
        order.iter().map(|&i| yerr[i]).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_phase_folding() {
        let t = array![0.5, 2.25, 3.0, 4.75];
        let y = array![1., 2., 3., 4.];
        let yerr = array![0.1, 0.2, 0.3, 0.4];
        let (phase, fy, fyerr) = phase_folding(&t, &y, Some(&yerr), 2.).unwrap();
        // phases: 0.25, 0.125, 0.5, 0.375
        assert_abs_diff_eq!(phase, array![0.125, 0.25, 0.375, 0.5]);
        assert_abs_diff_eq!(fy, array![2., 1., 4., 3.]);
        assert_abs_diff_eq!(fyerr, array![0.2, 0.1, 0.4, 0.3]);
    }

    #[test]
    fn test_phase_folding_negative_times() {
        let t = array![-0.25, 0.5];
        let y = array![1., 2.];
        let (phase, fy, fyerr) = phase_folding(&t, &y, None, 1.).unwrap();
        assert_abs_diff_eq!(phase, array![0.5, 0.75]);
        assert_abs_diff_eq!(fy, array![2., 1.]);
        assert_abs_diff_eq!(fyerr, array![0., 0.]);
    }

    #[test]
    fn test_phase_folding_errors() {
        let t = array![1., 2.];
        let y = array![1.];
        assert!(phase_folding(&t, &y, None, 1.).is_err());
        assert!(phase_folding(&t, &t, None, 0.).is_err());
    }
}
