use ml_engine::{ForecastConfig, SplitStrategy};
use serde::{Deserialize, Serialize};

/// Tickers processed per batch request.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub forecast: ForecastConfig,
    pub max_batch_size: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            forecast: ForecastConfig::default(),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

impl AnalysisConfig {
    /// Read overrides from the process environment. Unset or unparsable
    /// values keep their defaults.
    ///
    /// - `FORECAST_HORIZON_DAYS`
    /// - `RIDGE_ALPHA`
    /// - `VALIDATION_FRACTION`
    /// - `SPLIT_SEED`
    /// - `CHRONOLOGICAL_SPLIT` (`true`/`1`)
    /// - `MAX_BATCH_SIZE`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
            let raw = lookup(key)?;
            match raw.trim().parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring unparsable {}={:?}", key, raw);
                    None
                }
            }
        }

        let defaults = Self::default();
        let mut forecast = defaults.forecast;

        if let Some(horizon) = parsed::<usize>(&lookup, "FORECAST_HORIZON_DAYS").filter(|h| *h > 0) {
            forecast.horizon_days = horizon;
        }
        if let Some(alpha) = parsed::<f64>(&lookup, "RIDGE_ALPHA").filter(|a| a.is_finite() && *a >= 0.0) {
            forecast.ridge_alpha = alpha;
        }
        if let Some(fraction) =
            parsed::<f64>(&lookup, "VALIDATION_FRACTION").filter(|f| *f > 0.0 && *f < 1.0)
        {
            forecast.validation_fraction = fraction;
        }

        let chronological = lookup("CHRONOLOGICAL_SPLIT")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        forecast.split = if chronological {
            SplitStrategy::Chronological
        } else {
            SplitStrategy::Shuffled {
                seed: parsed(&lookup, "SPLIT_SEED").unwrap_or(42),
            }
        };

        let max_batch_size = parsed::<usize>(&lookup, "MAX_BATCH_SIZE")
            .filter(|n| *n > 0)
            .unwrap_or(defaults.max_batch_size);

        Self {
            forecast,
            max_batch_size,
        }
    }
}
