//! Derivative-free minimisation (Nelder-Mead simplex)
//!
//! Used to estimate ARIMA coefficients by conditional sum of squares, where
//! the objective has no convenient closed-form gradient.

use crate::{MathError, Result};

/// Tuning knobs for the simplex search
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations
    pub max_iter: usize,
    /// Stop once the spread of objective values falls below this
    pub tolerance: f64,
    /// Size of the initial simplex along each axis
    pub initial_step: f64,
    pub reflection: f64,
    pub expansion: f64,
    pub contraction: f64,
    pub shrink: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            initial_step: 0.1,
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
        }
    }
}

/// Outcome of a minimisation
#[derive(Debug, Clone)]
pub struct Minimum {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Minimise `objective` starting from `initial`
///
/// `bounds`, when given, holds one inclusive `(low, high)` pair per
/// dimension; every trial point is clamped into the box before evaluation.
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: &NelderMeadConfig,
) -> Result<Minimum>
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return Err(MathError::InvalidInput(
            "Cannot minimise over zero parameters".to_string(),
        ));
    }
    if let Some(b) = bounds {
        if b.len() != n {
            return Err(MathError::InvalidInput(format!(
                "Expected {} bounds, got {}",
                n,
                b.len()
            )));
        }
    }

    let clamp = |point: &mut Vec<f64>| {
        if let Some(b) = bounds {
            for (x, &(low, high)) in point.iter_mut().zip(b.iter()) {
                *x = x.clamp(low, high);
            }
        }
    };
    let evaluate = |point: &[f64]| {
        let value = objective(point);
        if value.is_nan() {
            f64::INFINITY
        } else {
            value
        }
    };

    let mut start = initial.to_vec();
    clamp(&mut start);
    let mut simplex = vec![start.clone()];
    for i in 0..n {
        let mut vertex = start.clone();
        let step = if vertex[i].abs() > 1e-8 {
            config.initial_step * vertex[i].abs()
        } else {
            config.initial_step
        };
        vertex[i] += step;
        clamp(&mut vertex);
        if vertex[i] == start[i] {
            // pinned against the upper bound, step the other way
            vertex[i] -= step;
            clamp(&mut vertex);
        }
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| evaluate(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        let best = order[0];
        let worst = order[n];
        let second_worst = order[n - 1];

        if (values[worst] - values[best]).abs() < config.tolerance {
            converged = true;
            break;
        }

        let centroid: Vec<f64> = (0..n)
            .map(|j| {
                simplex
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != worst)
                    .map(|(_, v)| v[j])
                    .sum::<f64>()
                    / n as f64
            })
            .collect();

        let towards = |from: &[f64], coefficient: f64| -> Vec<f64> {
            let mut point: Vec<f64> = centroid
                .iter()
                .zip(from.iter())
                .map(|(c, x)| c + coefficient * (x - c))
                .collect();
            clamp(&mut point);
            point
        };

        let reflected = towards(&simplex[worst], -config.reflection);
        let reflected_value = evaluate(&reflected);

        if reflected_value < values[best] {
            let expanded = towards(&simplex[worst], -config.reflection * config.expansion);
            let expanded_value = evaluate(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        if reflected_value < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        let (contracted, contracted_value) = if reflected_value < values[worst] {
            let point = towards(&reflected, config.contraction);
            let value = evaluate(&point);
            (point, value)
        } else {
            let point = towards(&simplex[worst], config.contraction);
            let value = evaluate(&point);
            (point, value)
        };

        if contracted_value < values[worst].min(reflected_value) {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        let anchor = simplex[best].clone();
        for i in 0..=n {
            if i == best {
                continue;
            }
            let mut shrunk: Vec<f64> = anchor
                .iter()
                .zip(simplex[i].iter())
                .map(|(a, x)| a + config.shrink * (x - a))
                .collect();
            clamp(&mut shrunk);
            values[i] = evaluate(&shrunk);
            simplex[i] = shrunk;
        }
    }

    let best = (0..=n)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);

    Ok(Minimum {
        point: simplex[best].clone(),
        value: values[best],
        iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_quadratic_bowl() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] + 1.0).powi(2),
            &[0.0, 0.0],
            None,
            &NelderMeadConfig::default(),
        )
        .unwrap();

        assert!(result.converged);
        assert_abs_diff_eq!(result.point[0], 2.0, epsilon = 1e-3);
        assert_abs_diff_eq!(result.point[1], -1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_bounds_are_respected() {
        let bounds = [(-0.5, 0.5)];
        let result = nelder_mead(
            |x| (x[0] - 3.0).powi(2),
            &[0.0],
            Some(&bounds),
            &NelderMeadConfig::default(),
        )
        .unwrap();

        assert_abs_diff_eq!(result.point[0], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_rejects_empty_and_mismatched_input() {
        let config = NelderMeadConfig::default();
        assert!(nelder_mead(|_| 0.0, &[], None, &config).is_err());
        assert!(nelder_mead(|_| 0.0, &[1.0], Some(&[(0.0, 1.0), (0.0, 1.0)]), &config).is_err());
    }
}
