//! Regularized binary logistic regression fit by coordinate descent.
//!
//! Minimizes `C * sum_i s_i * logloss(y_i, sigmoid(w.x_i + b)) + R(w)` where
//! `R` is the L1 or L2 penalty and `s_i` the per-example weight. The
//! intercept is not penalized.
//!
//! Each coordinate step is a Newton step against the bounded curvature
//! `0.25 * sum_i s_i * x_ij^2`, which majorizes the logistic loss, so the
//! objective never increases. L1 uses soft-thresholding on that step.

use tracing::trace;

use crate::config::Penalty;
use crate::error::ModelError;

/// A fitted binary logistic regression model.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LogisticModel {
    coefficients: Vec<f64>,
    intercept: f64,
}

/// Outcome of a single fit: the model plus solver diagnostics.
#[derive(Debug, Clone)]
pub(crate) struct LogisticFit {
    pub(crate) model: LogisticModel,
    pub(crate) epochs: usize,
    pub(crate) converged: bool,
}

/// Solver settings for one fit.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SolverSettings {
    pub(crate) penalty: Penalty,
    pub(crate) inverse_regularization: f64,
    pub(crate) max_iter: usize,
    pub(crate) tol: f64,
}

/// Numerically stable logistic function.
#[inline]
pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Soft-thresholding operator: `sign(x) * max(|x| - threshold, 0)`.
#[inline]
fn soft_threshold(x: f64, threshold: f64) -> f64 {
    if x > threshold {
        x - threshold
    } else if x < -threshold {
        x + threshold
    } else {
        0.0
    }
}

impl LogisticModel {
    /// Build a model directly from coefficients and an intercept.
    #[must_use]
    pub fn from_parts(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    /// Return the coefficient vector (one entry per feature).
    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Return the intercept.
    #[must_use]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Return the number of features the model expects.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    /// Signed distance to the decision boundary, `w.x + b`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn decision_function(&self, sample: &[f64]) -> Result<f64, ModelError> {
        if sample.len() != self.coefficients.len() {
            return Err(ModelError::PredictionFeatureMismatch {
                expected: self.coefficients.len(),
                got: sample.len(),
            });
        }
        Ok(self
            .coefficients
            .iter()
            .zip(sample)
            .fold(self.intercept, |acc, (w, x)| acc + w * x))
    }

    /// Probability of the positive class.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_probability(&self, sample: &[f64]) -> Result<f64, ModelError> {
        Ok(sigmoid(self.decision_function(sample)?))
    }

    /// Binary decision: positive-class probability above 0.5.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<bool, ModelError> {
        Ok(self.predict_probability(sample)? > 0.5)
    }
}

/// Fit a logistic regression model on pre-validated inputs.
///
/// `features` must be rectangular and finite, `labels` and `weights` the
/// same length as `features`, and every weight positive. Both classes must
/// be present.
pub(crate) fn fit<R: AsRef<[f64]>>(
    features: &[R],
    labels: &[bool],
    weights: &[f64],
    settings: SolverSettings,
) -> LogisticFit {
    let n_samples = features.len();
    let n_features = features.first().map_or(0, |row| row.as_ref().len());
    let lambda = 1.0 / settings.inverse_regularization;

    // Column-major view of the non-zero entries, with per-column curvature bounds.
    let mut columns: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n_features];
    for (i, row) in features.iter().enumerate() {
        for (j, &x) in row.as_ref().iter().enumerate() {
            if x != 0.0 {
                columns[j].push((i, x));
            }
        }
    }
    let curvature: Vec<f64> = columns
        .iter()
        .map(|col| 0.25 * col.iter().map(|&(i, x)| weights[i] * x * x).sum::<f64>())
        .collect();
    let intercept_curvature = 0.25 * weights.iter().sum::<f64>();

    // Start from the weighted log-odds so early epochs do not fight the prior.
    let (pos_mass, neg_mass) = labels
        .iter()
        .zip(weights)
        .fold((0.0, 0.0), |(p, n), (&y, &s)| if y { (p + s, n) } else { (p, n + s) });
    let mut intercept = if pos_mass > 0.0 && neg_mass > 0.0 {
        (pos_mass / neg_mass).ln()
    } else {
        0.0
    };
    let mut coefficients = vec![0.0; n_features];
    let mut margins = vec![intercept; n_samples];

    let mut epochs = 0;
    let mut converged = false;

    while epochs < settings.max_iter {
        epochs += 1;
        let mut max_delta = 0.0f64;

        // Intercept step (unpenalized).
        let grad: f64 = (0..n_samples)
            .map(|i| weights[i] * (sigmoid(margins[i]) - f64::from(u8::from(labels[i]))))
            .sum();
        if intercept_curvature > 1e-12 {
            let delta = -grad / intercept_curvature;
            if delta != 0.0 {
                intercept += delta;
                margins.iter_mut().for_each(|m| *m += delta);
                max_delta = max_delta.max(delta.abs());
            }
        }

        for (j, column) in columns.iter().enumerate() {
            if column.is_empty() {
                continue;
            }
            let grad: f64 = column
                .iter()
                .map(|&(i, x)| weights[i] * (sigmoid(margins[i]) - f64::from(u8::from(labels[i]))) * x)
                .sum();
            let current = coefficients[j];
            let delta = match settings.penalty {
                Penalty::L2 => {
                    let hess = curvature[j] + lambda;
                    -(grad + lambda * current) / hess
                }
                Penalty::L1 => {
                    let hess = curvature[j];
                    if hess <= 1e-12 {
                        continue;
                    }
                    soft_threshold(current - grad / hess, lambda / hess) - current
                }
            };
            if delta != 0.0 {
                coefficients[j] += delta;
                for &(i, x) in column {
                    margins[i] += delta * x;
                }
                max_delta = max_delta.max(delta.abs());
            }
        }

        trace!(epoch = epochs, max_delta, "coordinate descent epoch");
        if max_delta < settings.tol {
            converged = true;
            break;
        }
    }

    LogisticFit {
        model: LogisticModel {
            coefficients,
            intercept,
        },
        epochs,
        converged,
    }
}
