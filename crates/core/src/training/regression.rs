//! Ridge regression on standardized features
//!
//! Solves `(ZᵀZ + λI) w = Zᵀ(y - ȳ)` where `Z` is the standardized design
//! matrix. The intercept is the target mean, so it is never penalized.

use statsampler_domain::{Result, StatSamplerError};

const PIVOT_EPSILON: f64 = 1e-12;

/// Parameters of a fitted ridge model.
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeFit {
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl RidgeFit {
    pub fn predict(&self, row: &[f64]) -> f64 {
        row.iter()
            .zip(&self.means)
            .zip(&self.scales)
            .zip(&self.weights)
            .map(|(((x, mean), scale), weight)| (x - mean) / scale * weight)
            .sum::<f64>()
            + self.intercept
    }
}

/// Fit ridge regression of `targets` on `rows`.
pub fn fit_ridge(rows: &[Vec<f64>], targets: &[f64], lambda: f64) -> Result<RidgeFit> {
    if rows.is_empty() || rows.len() != targets.len() {
        return Err(StatSamplerError::Internal(format!(
            "ridge fit needs one target per row (rows={}, targets={})",
            rows.len(),
            targets.len()
        )));
    }
    if !(lambda > 0.0) {
        return Err(StatSamplerError::Internal(format!("ridge lambda must be positive, got {lambda}")));
    }

    let width = rows[0].len();
    if rows.iter().any(|row| row.len() != width) {
        return Err(StatSamplerError::Internal("ridge fit rows have unequal widths".to_string()));
    }

    let n = rows.len() as f64;
    let means: Vec<f64> =
        (0..width).map(|j| rows.iter().map(|row| row[j]).sum::<f64>() / n).collect();
    let scales: Vec<f64> = (0..width)
        .map(|j| {
            let variance = rows.iter().map(|row| (row[j] - means[j]).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();
            if std > PIVOT_EPSILON { std } else { 1.0 }
        })
        .collect();

    let standardized: Vec<Vec<f64>> = rows
        .iter()
        .map(|row| (0..width).map(|j| (row[j] - means[j]) / scales[j]).collect())
        .collect();
    let intercept = targets.iter().sum::<f64>() / n;

    let mut gram = vec![vec![0.0; width]; width];
    let mut rhs = vec![0.0; width];
    for (row, target) in standardized.iter().zip(targets) {
        let centered = target - intercept;
        for i in 0..width {
            rhs[i] += row[i] * centered;
            for j in 0..width {
                gram[i][j] += row[i] * row[j];
            }
        }
    }
    for (i, diagonal) in gram.iter_mut().enumerate() {
        diagonal[i] += lambda;
    }

    let weights = solve(gram, rhs)?;
    Ok(RidgeFit { means, scales, weights, intercept })
}

/// Gaussian elimination with partial pivoting.
fn solve(mut matrix: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Result<Vec<f64>> {
    let size = rhs.len();

    for col in 0..size {
        let pivot = (col..size)
            .max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))
            .unwrap_or(col);
        if matrix[pivot][col].abs() < PIVOT_EPSILON {
            return Err(StatSamplerError::Internal("ridge system is singular".to_string()));
        }
        matrix.swap(col, pivot);
        rhs.swap(col, pivot);

        for row in col + 1..size {
            let factor = matrix[row][col] / matrix[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..size {
                matrix[row][k] -= factor * matrix[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut solution = vec![0.0; size];
    for row in (0..size).rev() {
        let tail: f64 = (row + 1..size).map(|k| matrix[row][k] * solution[k]).sum();
        solution[row] = (rhs[row] - tail) / matrix[row][row];
    }

    if solution.iter().any(|w| !w.is_finite()) {
        return Err(StatSamplerError::Internal("ridge solution is not finite".to_string()));
    }
    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_linear_relationship_with_small_penalty() {
        let rows: Vec<Vec<f64>> = (1..=5).map(|x| vec![x as f64]).collect();
        let targets: Vec<f64> = (1..=5).map(|x| 2.0 * x as f64 + 1.0).collect();

        let fit = fit_ridge(&rows, &targets, 1e-9).unwrap();
        for (row, target) in rows.iter().zip(&targets) {
            assert!((fit.predict(row) - target).abs() < 1e-6);
        }
    }

    #[test]
    fn constant_feature_gets_unit_scale_and_zero_weight() {
        let rows = vec![vec![7.0, 1.0], vec![7.0, 2.0], vec![7.0, 3.0]];
        let fit = fit_ridge(&rows, &[1.0, 2.0, 3.0], 1.0).unwrap();
        assert_eq!(fit.scales[0], 1.0);
        assert_eq!(fit.weights[0], 0.0);
        assert_eq!(fit.intercept, 2.0);
    }

    #[test]
    fn single_row_predicts_its_own_target() {
        let fit = fit_ridge(&[vec![3.0, 4.0]], &[9.5], 1.0).unwrap();
        assert_eq!(fit.predict(&[100.0, -2.0]), 9.5);
    }

    #[test]
    fn penalty_shrinks_weights() {
        let rows: Vec<Vec<f64>> = (0..4).map(|x| vec![x as f64]).collect();
        let targets = [0.0, 1.0, 2.0, 3.0];
        let loose = fit_ridge(&rows, &targets, 1e-6).unwrap();
        let tight = fit_ridge(&rows, &targets, 100.0).unwrap();
        assert!(tight.weights[0].abs() < loose.weights[0].abs());
    }

    #[test]
    fn rejects_mismatched_input() {
        assert!(fit_ridge(&[], &[], 1.0).is_err());
        assert!(fit_ridge(&[vec![1.0]], &[1.0, 2.0], 1.0).is_err());
        assert!(fit_ridge(&[vec![1.0], vec![1.0, 2.0]], &[1.0, 2.0], 1.0).is_err());
        assert!(fit_ridge(&[vec![1.0]], &[1.0], 0.0).is_err());
    }

    #[test]
    fn solve_handles_row_swaps() {
        let solution = solve(vec![vec![0.0, 1.0], vec![2.0, 0.0]], vec![3.0, 4.0]).unwrap();
        assert_eq!(solution, vec![2.0, 3.0]);
    }
}
