use serde::{Deserialize, Serialize};

/// How rows are divided between training and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitStrategy {
    /// Seeded row-wise shuffle. Validation rows may precede training rows in
    /// time, so validation R² can be optimistic for overlapping targets.
    Shuffled { seed: u64 },
    /// Hold out the most recent rows.
    Chronological,
}

impl Default for SplitStrategy {
    fn default() -> Self {
        SplitStrategy::Shuffled { seed: 42 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Forward-return horizon in trading days.
    pub horizon_days: usize,
    /// L2 penalty of the ridge regressor.
    pub ridge_alpha: f64,
    pub validation_fraction: f64,
    pub split: SplitStrategy,
    /// Bars required before any feature is built.
    pub min_bars: usize,
    /// Labeled rows required before training.
    pub min_training_rows: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_days: 30,
            ridge_alpha: 1.0,
            validation_fraction: 0.2,
            split: SplitStrategy::default(),
            min_bars: 60,
            min_training_rows: 30,
        }
    }
}

impl ForecastConfig {
    pub fn with_horizon(horizon_days: usize) -> Self {
        Self {
            horizon_days,
            ..Default::default()
        }
    }
}
