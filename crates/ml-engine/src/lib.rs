//! Ridge-regression forecast of forward returns.
//!
//! Pipeline: feature table -> forward-return targets -> train/validation
//! split -> standardization fit on the training rows -> ridge fit -> predict
//! on the latest bar.

mod config;
mod forecast;
mod regressor;
mod scaler;
mod split;

pub use config::{ForecastConfig, SplitStrategy};
pub use forecast::{forecast, heuristic_confidence, ForecastLabel, ForecastResult, TrainedForecaster};
pub use regressor::{Regressor, RidgeRegression};
pub use scaler::StandardScaler;
pub use split::{train_validation_split, validation_size, SplitIndices};
