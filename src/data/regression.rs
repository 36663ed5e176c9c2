use thiserror::Error;

use super::filter::Subset;
use super::model::Measure;

#[derive(Debug, Error, PartialEq)]
pub enum RegressionError {
    #[error("not enough observations for a fit: need {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },
    #[error("predictor and response lengths differ ({x} vs {y})")]
    LengthMismatch { x: usize, y: usize },
    #[error("predictors are collinear or constant; the system is singular")]
    Singular,
}

/// Ordinary least squares line `y = intercept + slope · x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub n: usize,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Ordinary least squares with several predictors.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiFit {
    pub intercept: f64,
    /// One coefficient per predictor, in input order.
    pub coefficients: Vec<f64>,
    pub r_squared: f64,
    pub n: usize,
}

impl MultiFit {
    pub fn predict(&self, xs: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(xs)
                .map(|(b, x)| b * x)
                .sum::<f64>()
    }
}

/// `(x, y)` observations of two measures over a subset, skipping records
/// where either is missing.
pub fn pairs(subset: &Subset<'_>, predictor: &Measure, response: &Measure) -> (Vec<f64>, Vec<f64>) {
    subset
        .records()
        .filter_map(|r| Some((predictor.value_of(r)?, response.value_of(r)?)))
        .unzip()
}

/// Predictor rows and responses for a multivariate fit; records missing any
/// of the measures are skipped.
pub fn observations(
    subset: &Subset<'_>,
    predictors: &[Measure],
    response: &Measure,
) -> (Vec<Vec<f64>>, Vec<f64>) {
    subset
        .records()
        .filter_map(|r| {
            let xs = predictors
                .iter()
                .map(|m| m.value_of(r))
                .collect::<Option<Vec<f64>>>()?;
            Some((xs, response.value_of(r)?))
        })
        .unzip()
}

pub fn fit_linear(x: &[f64], y: &[f64]) -> Result<LinearFit, RegressionError> {
    if x.len() != y.len() {
        return Err(RegressionError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    let n = x.len();
    if n < 2 {
        return Err(RegressionError::InsufficientData { needed: 2, got: n });
    }

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;
    let (sxy, sxx) = x.iter().zip(y).fold((0.0, 0.0), |(sxy, sxx), (xi, yi)| {
        let dx = xi - mean_x;
        (sxy + dx * (yi - mean_y), sxx + dx * dx)
    });
    if sxx == 0.0 {
        return Err(RegressionError::Singular);
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let predicted: Vec<f64> = x.iter().map(|xi| intercept + slope * xi).collect();

    Ok(LinearFit {
        slope,
        intercept,
        r_squared: r_squared(y, &predicted),
        n,
    })
}

pub fn fit_multivariate(rows: &[Vec<f64>], y: &[f64]) -> Result<MultiFit, RegressionError> {
    if rows.len() != y.len() {
        return Err(RegressionError::LengthMismatch {
            x: rows.len(),
            y: y.len(),
        });
    }
    let n = rows.len();
    let k = rows.first().map_or(0, Vec::len);
    let needed = (k + 1).max(2);
    if n < needed {
        return Err(RegressionError::InsufficientData { needed, got: n });
    }

    // Normal equations (XᵀX) β = Xᵀy with a leading column of ones.
    let p = k + 1;
    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];
    for (row, &yi) in rows.iter().zip(y) {
        let design: Vec<f64> = std::iter::once(1.0).chain(row.iter().copied()).collect();
        for i in 0..p {
            xty[i] += design[i] * yi;
            for j in 0..p {
                xtx[i][j] += design[i] * design[j];
            }
        }
    }

    let beta = solve(xtx, xty)?;
    let fit = MultiFit {
        intercept: beta[0],
        coefficients: beta[1..].to_vec(),
        r_squared: 0.0,
        n,
    };
    let predicted: Vec<f64> = rows.iter().map(|r| fit.predict(r)).collect();
    Ok(MultiFit {
        r_squared: r_squared(y, &predicted),
        ..fit
    })
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>, RegressionError> {
    let n = b.len();
    let scale = a
        .iter()
        .flatten()
        .fold(0.0_f64, |m, v| m.max(v.abs()))
        .max(1.0);

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() <= scale * 1e-12 {
            return Err(RegressionError::Singular);
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

/// Coefficient of determination. A constant response scores 1 when fitted
/// exactly and 0 otherwise.
fn r_squared(y: &[f64], predicted: &[f64]) -> f64 {
    let mean = y.iter().sum::<f64>() / y.len() as f64;
    let ss_tot: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    let ss_res: f64 = y.iter().zip(predicted).map(|(v, p)| (v - p).powi(2)).sum();
    if ss_tot == 0.0 {
        return if ss_res < 1e-12 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{filter, FilterCriteria};
    use crate::data::model::{Dataset, Record};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn exact_line_is_recovered() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y: Vec<f64> = x.iter().map(|v| 3.0 + 2.0 * v).collect();
        let fit = fit_linear(&x, &y).unwrap();
        assert!(close(fit.slope, 2.0));
        assert!(close(fit.intercept, 3.0));
        assert!(close(fit.r_squared, 1.0));
        assert!(close(fit.predict(10.0), 23.0));
    }

    #[test]
    fn fewer_than_two_points_is_insufficient() {
        assert_eq!(
            fit_linear(&[1.0], &[2.0]),
            Err(RegressionError::InsufficientData { needed: 2, got: 1 })
        );
        assert!(matches!(
            fit_linear(&[], &[]),
            Err(RegressionError::InsufficientData { .. })
        ));
    }

    #[test]
    fn constant_predictor_is_singular() {
        assert_eq!(
            fit_linear(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]),
            Err(RegressionError::Singular)
        );
    }

    #[test]
    fn noisy_line_has_partial_r_squared() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.5, 5.5, 8.5, 9.5];
        let fit = fit_linear(&x, &y).unwrap();
        assert!(fit.r_squared > 0.9 && fit.r_squared < 1.0);
        assert!(close(fit.slope, 1.9));
    }

    #[test]
    fn multivariate_plane_is_recovered() {
        let rows: Vec<Vec<f64>> = vec![
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 1.0],
            vec![2.0, 1.0],
            vec![3.0, 5.0],
        ];
        let y: Vec<f64> = rows.iter().map(|r| 1.0 + 2.0 * r[0] - 0.5 * r[1]).collect();
        let fit = fit_multivariate(&rows, &y).unwrap();
        assert!((fit.intercept - 1.0).abs() < 1e-6);
        assert!((fit.coefficients[0] - 2.0).abs() < 1e-6);
        assert!((fit.coefficients[1] + 0.5).abs() < 1e-6);
        assert!((fit.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn multivariate_needs_more_rows_than_predictors() {
        let rows = vec![vec![1.0, 2.0], vec![2.0, 3.0]];
        assert_eq!(
            fit_multivariate(&rows, &[1.0, 2.0]),
            Err(RegressionError::InsufficientData { needed: 3, got: 2 })
        );
    }

    #[test]
    fn collinear_predictors_are_singular() {
        let rows = vec![
            vec![1.0, 2.0],
            vec![2.0, 4.0],
            vec![3.0, 6.0],
            vec![4.0, 8.0],
        ];
        assert_eq!(
            fit_multivariate(&rows, &[1.0, 2.0, 3.0, 4.0]),
            Err(RegressionError::Singular)
        );
    }

    #[test]
    fn pairs_skip_missing_values() {
        let ds = Dataset::from_records(
            vec![
                Record::new("MinA", 2020)
                    .with_budget(10.0, 8.0)
                    .with_indicator("PIB", 1.0),
                Record::new("MinA", 2021).with_budget(12.0, 9.0),
                Record::new("MinA", 2022)
                    .with_budget(14.0, 13.0)
                    .with_indicator("PIB", 3.0),
            ],
            vec!["PIB".into()],
        );
        let subset = filter(&ds, &FilterCriteria::all(&ds));
        let (x, y) = pairs(&subset, &Measure::Indicator("PIB".into()), &Measure::Executed);
        assert_eq!(x, vec![1.0, 3.0]);
        assert_eq!(y, vec![8.0, 13.0]);

        let (rows, y) = observations(
            &subset,
            &[Measure::Allocated, Measure::Indicator("PIB".into())],
            &Measure::Executed,
        );
        assert_eq!(rows, vec![vec![10.0, 1.0], vec![14.0, 3.0]]);
        assert_eq!(y.len(), 2);
    }
}
