use crate::errors::{GpError, Result};
use linfa::Float;
use linfa_linalg::{cholesky::*, triangular::*};
use log::warn;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};

/// Default ratio of the mean diagonal used as first nugget
pub const NUGGET_RATIO: f64 = 1e-5;
/// Default max number of factorization attempts with a growing nugget
pub const MAX_NUGGET_TRIES: usize = 10;

/// Lower Cholesky factor of the given symmetric matrix.
///
/// The plain matrix is factorized first. On failure a nugget equal to
/// `|mean(diag)| * nugget_ratio` is added to the diagonal, then multiplied by 10
/// at each new failure, up to `max_tries` retries.
/// Returns the factor and the nugget actually used.
pub fn cholesky_with_nugget<F: Float>(
    matrix: &ArrayBase<impl Data<Elem = F>, Ix2>,
    nugget_ratio: F,
    max_tries: usize,
) -> Result<(Array2<F>, F)> {
    if let Ok(chol) = matrix.cholesky() {
        return Ok((chol, F::zero()));
    }
    let n = matrix.nrows();
    let mean_diag = matrix.diag().mean().unwrap_or_else(F::zero).abs();
    let mut nugget = mean_diag * nugget_ratio;
    for attempt in 1..=max_tries {
        let jittered = matrix.to_owned() + Array2::<F>::eye(n) * nugget;
        match jittered.cholesky() {
            Ok(chol) => {
                warn!("Covariance factorized after {attempt} attempt(s) with nugget {nugget}");
                return Ok((chol, nugget));
            }
            Err(_) => nugget *= F::cast(10.),
        }
    }
    Err(GpError::NotPositiveDefiniteError(format!(
        "Cholesky factorization failed after {max_tries} nugget retries (last nugget {})",
        nugget / F::cast(10.)
    )))
}

/// Solve `L Lᵀ x = b` for a vector `b` given the lower Cholesky factor `L`
pub fn cho_solve<F: Float>(
    chol: &Array2<F>,
    b: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> Result<Array1<F>> {
    let z = chol.solve_triangular(&b.to_owned().insert_axis(Axis(1)), UPLO::Lower)?;
    let x = chol.t().solve_triangular_into(z, UPLO::Upper)?;
    Ok(x.remove_axis(Axis(1)))
}

/// Log-density of the zero-mean Gaussian with covariance `L Lᵀ` at `r`
pub fn gaussian_log_density<F: Float>(
    chol: &Array2<F>,
    r: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> Result<F> {
    let z = chol.solve_triangular(&r.to_owned().insert_axis(Axis(1)), UPLO::Lower)?;
    let quad = z.mapv(|v| v * v).sum();
    let logdet = chol.diag().mapv(|v| v.ln()).sum();
    let n = F::cast(r.len());
    Ok(-F::cast(0.5) * quad - logdet - F::cast(0.5) * n * F::cast(2. * std::f64::consts::PI).ln())
}
