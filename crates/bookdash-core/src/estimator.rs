//! What-if revenue estimator
//!
//! Fits an ordinary least squares model mapping (units_sold, average_rating)
//! to gross revenue, then predicts a single point estimate for a
//! hypothetical input. The feature set is fixed at units + rating; the
//! model is refit from the full current dataset on every estimate request,
//! which keeps the component stateless and is cheap at the dozens-to-
//! hundreds of rows this pipeline sees.
//!
//! The solver scales to a tall design matrix, so we solve via SVD rather
//! than QR (nalgebra's `QR::solve` is intended for square systems).

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{ConfidenceBand, Estimate, EstimateRequest, SalesRecord};

/// Minimum distinct (units, rating) rows for a determined fit
const MIN_DISTINCT_ROWS: usize = 2;

/// Fitted linear revenue model
#[derive(Debug, Clone)]
pub struct RevenueModel {
    pub intercept: f64,
    pub units_coef: f64,
    pub rating_coef: f64,
    /// Rows the model was fit on
    pub n_rows: usize,
}

impl RevenueModel {
    /// Predict gross revenue for a hypothetical input.
    ///
    /// Negative point estimates are clamped to zero; the confidence band
    /// is a pure function of the target rating thresholds, not of the
    /// regression statistics.
    pub fn predict(&self, request: &EstimateRequest) -> Estimate {
        let raw = self.intercept
            + self.units_coef * request.target_units as f64
            + self.rating_coef * request.target_rating;

        Estimate {
            point_value: raw.max(0.0),
            confidence_band: ConfidenceBand::from_rating(request.target_rating),
        }
    }
}

/// Fit the revenue model on the given records.
///
/// Fails with `Error::InsufficientData` when the fit is underdetermined:
/// fewer than two distinct (units, rating) rows, or a feature column with
/// no variation (degenerate design matrix).
pub fn fit(records: &[SalesRecord]) -> Result<RevenueModel> {
    check_fit_feasible(records)?;

    let n = records.len();
    let mut design = Vec::with_capacity(n * 3);
    let mut target = Vec::with_capacity(n);
    for record in records {
        design.push(1.0);
        design.push(record.units_sold as f64);
        design.push(record.average_rating);
        target.push(record.gross_revenue);
    }

    let x = DMatrix::from_row_slice(n, 3, &design);
    let y = DVector::from_row_slice(&target);

    let beta = solve_least_squares(&x, &y).ok_or_else(|| {
        Error::InsufficientData("design matrix too ill-conditioned to fit".to_string())
    })?;

    let model = RevenueModel {
        intercept: beta[0],
        units_coef: beta[1],
        rating_coef: beta[2],
        n_rows: n,
    };
    debug!(
        rows = n,
        intercept = model.intercept,
        units_coef = model.units_coef,
        rating_coef = model.rating_coef,
        "Fitted revenue model"
    );

    Ok(model)
}

/// Reject underdetermined inputs before touching the solver
fn check_fit_feasible(records: &[SalesRecord]) -> Result<()> {
    let mut distinct: Vec<(u64, u64)> = Vec::new();
    for record in records {
        let key = (record.units_sold, record.average_rating.to_bits());
        if !distinct.contains(&key) {
            distinct.push(key);
        }
        if distinct.len() >= MIN_DISTINCT_ROWS {
            break;
        }
    }
    if distinct.len() < MIN_DISTINCT_ROWS {
        return Err(Error::InsufficientData(format!(
            "need at least {} distinct rows, got {}",
            MIN_DISTINCT_ROWS,
            distinct.len()
        )));
    }

    let units_constant = records
        .windows(2)
        .all(|w| w[0].units_sold == w[1].units_sold);
    if units_constant {
        return Err(Error::InsufficientData(
            "units_sold has no variation across rows".to_string(),
        ));
    }

    let rating_constant = records
        .windows(2)
        .all(|w| (w[0].average_rating - w[1].average_rating).abs() < f64::EPSILON);
    if rating_constant {
        return Err(Error::InsufficientData(
            "average_rating has no variation across rows".to_string(),
        ));
    }

    Ok(())
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if the strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}
