use analysis_core::{AnalysisError, AnalysisResult};
use nalgebra::{DMatrix, DVector};

/// A fitted model mapping a feature vector to a continuous target.
pub trait Regressor: Send + Sync {
    fn predict(&self, features: &[f64]) -> f64;

    fn n_features(&self) -> usize;

    /// Model name for logging.
    fn name(&self) -> &str;
}

/// L2-regularized least squares with an unpenalized intercept.
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub alpha: f64,
}

impl RidgeRegression {
    /// Solve `(XᵀX + αI) w = Xᵀy` on centered data, then recover the intercept
    /// from the column and target means.
    pub fn fit(features: &[Vec<f64>], targets: &[f64], alpha: f64) -> AnalysisResult<Self> {
        let n = features.len();
        if n == 0 || n != targets.len() {
            return Err(AnalysisError::InvalidData(format!(
                "{} feature rows for {} targets",
                n,
                targets.len()
            )));
        }
        let p = features[0].len();
        if p == 0 || features.iter().any(|row| row.len() != p) {
            return Err(AnalysisError::InvalidData("Ragged or empty feature rows".to_string()));
        }
        if alpha < 0.0 || !alpha.is_finite() {
            return Err(AnalysisError::InvalidData(format!("Invalid ridge alpha {}", alpha)));
        }

        let x = DMatrix::from_fn(n, p, |i, j| features[i][j]);
        let y = DVector::from_column_slice(targets);

        let x_mean: DVector<f64> = DVector::from_fn(p, |j, _| x.column(j).mean());
        let y_mean = y.mean();

        let mut xc = x.clone();
        for j in 0..p {
            xc.column_mut(j).add_scalar_mut(-x_mean[j]);
        }
        let yc = y.add_scalar(-y_mean);

        let xt = xc.transpose();
        let gram = &xt * &xc + DMatrix::<f64>::identity(p, p) * alpha;
        let rhs = &xt * &yc;

        let weights = match gram.clone().cholesky() {
            Some(chol) => chol.solve(&rhs),
            None => {
                tracing::debug!("Ridge normal equations not positive definite, falling back to LU");
                gram.lu().solve(&rhs).ok_or_else(|| {
                    AnalysisError::CalculationError("Singular ridge normal equations".to_string())
                })?
            }
        };

        if weights.iter().any(|w| !w.is_finite()) {
            return Err(AnalysisError::CalculationError(
                "Non-finite ridge coefficients".to_string(),
            ));
        }

        let intercept = y_mean - x_mean.dot(&weights);

        Ok(Self {
            coefficients: weights.iter().copied().collect(),
            intercept,
            alpha,
        })
    }
}

impl Regressor for RidgeRegression {
    fn predict(&self, features: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn name(&self) -> &str {
        "ridge"
    }
}
