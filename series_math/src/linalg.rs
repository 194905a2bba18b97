//! Dense linear least squares for small regression problems

use crate::{MathError, Result};

const PIVOT_TOLERANCE: f64 = 1e-12;

/// Ordinary least squares fit of `target` on the rows of `design`
///
/// Every row must have the same width. The normal equations are solved
/// directly, which is adequate for the handful of lag regressors an
/// autoregression uses.
pub fn least_squares(design: &[Vec<f64>], target: &[f64]) -> Result<Vec<f64>> {
    if design.is_empty() {
        return Err(MathError::InsufficientData(
            "Least squares needs at least one observation".to_string(),
        ));
    }
    if design.len() != target.len() {
        return Err(MathError::InvalidInput(format!(
            "Design has {} rows but target has {} values",
            design.len(),
            target.len()
        )));
    }

    let width = design[0].len();
    if width == 0 || design.iter().any(|row| row.len() != width) {
        return Err(MathError::InvalidInput(
            "Design rows must share the same non-zero width".to_string(),
        ));
    }
    if design.len() < width {
        return Err(MathError::InsufficientData(format!(
            "{} regressors need at least {} observations, got {}",
            width,
            width,
            design.len()
        )));
    }

    let mut gram = vec![vec![0.0; width]; width];
    let mut moment = vec![0.0; width];
    for (row, &y) in design.iter().zip(target.iter()) {
        for i in 0..width {
            moment[i] += row[i] * y;
            for j in i..width {
                gram[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..width {
        for j in 0..i {
            gram[i][j] = gram[j][i];
        }
    }

    solve(gram, moment)
}

/// Solve the square system `matrix * x = rhs` by Gaussian elimination
pub fn solve(mut matrix: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Result<Vec<f64>> {
    let n = rhs.len();
    if matrix.len() != n || matrix.iter().any(|row| row.len() != n) {
        return Err(MathError::InvalidInput(
            "Matrix must be square and match the right-hand side".to_string(),
        ));
    }

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))
            .unwrap_or(col);

        if matrix[pivot_row][col].abs() < PIVOT_TOLERANCE {
            return Err(MathError::CalculationError(
                "Matrix is singular or nearly singular".to_string(),
            ));
        }

        matrix.swap(col, pivot_row);
        rhs.swap(col, pivot_row);

        for row in col + 1..n {
            let factor = matrix[row][col] / matrix[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                matrix[row][k] -= factor * matrix[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| matrix[row][k] * solution[k]).sum();
        solution[row] = (rhs[row] - tail) / matrix[row][row];
    }

    Ok(solution)
}
