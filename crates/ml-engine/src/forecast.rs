//! Forward-return forecast from a ridge regression over price features.

use std::fmt;

use analysis_core::stats::r_squared;
use analysis_core::{closes, AnalysisError, AnalysisResult, Bar, Rating};
use serde::{Deserialize, Serialize};
use technical_analysis::{
    assess, build_features, long_term_indicators, FeatureRow, FeatureTable, LongTermIndicators,
    LongTermRecommendation,
};

use crate::config::ForecastConfig;
use crate::regressor::{Regressor, RidgeRegression};
use crate::scaler::StandardScaler;
use crate::split::{select, train_validation_split};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForecastLabel {
    #[serde(rename = "Strong Bullish")]
    StrongBullish,
    Bullish,
    Neutral,
    Bearish,
    #[serde(rename = "Strong Bearish")]
    StrongBearish,
    Unknown,
    Error,
}

impl ForecastLabel {
    /// Bucket a predicted forward return. Every threshold is strict.
    pub fn from_return(predicted_return: f64) -> Self {
        if predicted_return > 0.05 {
            ForecastLabel::StrongBullish
        } else if predicted_return > 0.02 {
            ForecastLabel::Bullish
        } else if predicted_return > -0.02 {
            ForecastLabel::Neutral
        } else if predicted_return > -0.05 {
            ForecastLabel::Bearish
        } else {
            ForecastLabel::StrongBearish
        }
    }

    pub fn to_label(&self) -> &'static str {
        match self {
            ForecastLabel::StrongBullish => "Strong Bullish",
            ForecastLabel::Bullish => "Bullish",
            ForecastLabel::Neutral => "Neutral",
            ForecastLabel::Bearish => "Bearish",
            ForecastLabel::StrongBearish => "Strong Bearish",
            ForecastLabel::Unknown => "Unknown",
            ForecastLabel::Error => "Error",
        }
    }

    pub fn rating(&self) -> Rating {
        match self {
            ForecastLabel::StrongBullish => Rating::Strong,
            ForecastLabel::Bullish => Rating::Good,
            ForecastLabel::Neutral => Rating::Fair,
            ForecastLabel::Bearish | ForecastLabel::StrongBearish => Rating::Weak,
            ForecastLabel::Unknown | ForecastLabel::Error => Rating::NotRated,
        }
    }
}

impl fmt::Display for ForecastLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_label())
    }
}

/// `clamp(|r| * 2, 0.2, 0.95)`.
///
/// This is a heuristic that grows with the size of the predicted move. It is
/// not a probability and not derived from the model's error distribution, so
/// it must not be read as a statistical confidence level.
pub fn heuristic_confidence(predicted_return: f64) -> f64 {
    (predicted_return.abs() * 2.0).clamp(0.2, 0.95)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub prediction: ForecastLabel,
    /// `prediction` on the shared rating scale.
    pub rating: Rating,
    /// Predicted forward return as a fraction.
    pub predicted_return: Option<f64>,
    /// See [`heuristic_confidence`].
    pub confidence: Option<f64>,
    pub forecast_period: usize,
    pub current_price: Option<f64>,
    pub predicted_price: Option<f64>,
    /// Informational only; never used to reject the model.
    pub validation_r2: Option<f64>,
    pub long_term_data: Option<LongTermIndicators>,
    pub long_term_recommendation: Option<LongTermRecommendation>,
    pub long_term_factors: Vec<String>,
}

impl ForecastResult {
    fn unavailable(prediction: ForecastLabel, forecast_period: usize) -> Self {
        Self {
            prediction,
            rating: prediction.rating(),
            predicted_return: None,
            confidence: None,
            forecast_period,
            current_price: None,
            predicted_price: None,
            validation_r2: None,
            long_term_data: None,
            long_term_recommendation: None,
            long_term_factors: Vec::new(),
        }
    }
}

/// Scaler plus fitted regressor, trained on one ticker's history.
pub struct TrainedForecaster {
    scaler: StandardScaler,
    regressor: Box<dyn Regressor>,
    pub validation_r2: Option<f64>,
    pub training_rows: usize,
}

impl TrainedForecaster {
    /// Attach forward-return targets, split, standardize on the training side
    /// and fit the ridge regressor.
    ///
    /// With the default shuffled split, validation rows interleave with
    /// training rows in time and their horizons overlap, so the reported R²
    /// carries look-ahead and tends to be optimistic. Use
    /// [`SplitStrategy::Chronological`](crate::SplitStrategy) for an
    /// out-of-time check.
    pub fn train(table: &FeatureTable, closes: &[f64], config: &ForecastConfig) -> AnalysisResult<Self> {
        let labeled = table.with_targets(closes, config.horizon_days);
        if labeled.len() < config.min_training_rows {
            return Err(AnalysisError::InsufficientData(format!(
                "{} labeled rows, need {}",
                labeled.len(),
                config.min_training_rows
            )));
        }

        let split = train_validation_split(labeled.len(), config.validation_fraction, config.split);
        let x_train = select(&labeled.features, &split.train);
        let y_train = select(&labeled.targets, &split.train);
        let x_val = select(&labeled.features, &split.validation);
        let y_val = select(&labeled.targets, &split.validation);

        let scaler = StandardScaler::fit(&x_train);
        let regressor = RidgeRegression::fit(&scaler.transform(&x_train), &y_train, config.ridge_alpha)?;

        let val_predictions: Vec<f64> = x_val
            .iter()
            .map(|row| regressor.predict(&scaler.transform_row(row)))
            .collect();
        let validation_r2 = r_squared(&y_val, &val_predictions);

        match validation_r2 {
            Some(r2) => tracing::info!("Model R² score on validation: {:.4}", r2),
            None => tracing::info!("Model R² score on validation: n/a"),
        }

        Ok(Self {
            scaler,
            regressor: Box::new(regressor),
            validation_r2,
            training_rows: split.train.len(),
        })
    }

    pub fn predict(&self, row: &FeatureRow) -> AnalysisResult<f64> {
        if row.values.len() != self.regressor.n_features() {
            return Err(AnalysisError::InvalidData(format!(
                "Feature row has {} values, {} expects {}",
                row.values.len(),
                self.regressor.name(),
                self.regressor.n_features()
            )));
        }
        let predicted = self.regressor.predict(&self.scaler.transform_row(&row.values));
        if !predicted.is_finite() {
            return Err(AnalysisError::CalculationError(format!(
                "Non-finite prediction {}",
                predicted
            )));
        }
        Ok(predicted)
    }
}

/// Forecast the forward return of a chronological bar series and attach the
/// long-term indicator assessment.
///
/// Never fails: short histories and training problems yield
/// [`ForecastLabel::Unknown`], a failed prediction yields
/// [`ForecastLabel::Error`]. Long-term indicators are computed independently
/// and reported in every case the history supports them.
pub fn forecast(symbol: &str, bars: &[Bar], config: &ForecastConfig) -> ForecastResult {
    let horizon = config.horizon_days;

    let mut result = match forecast_return(symbol, bars, config) {
        Ok(Some((predicted_return, validation_r2))) => {
            let current_price = bars.last().map(|b| b.close);
            let prediction = ForecastLabel::from_return(predicted_return);
            ForecastResult {
                prediction,
                rating: prediction.rating(),
                predicted_return: Some(predicted_return),
                confidence: Some(heuristic_confidence(predicted_return)),
                forecast_period: horizon,
                current_price,
                predicted_price: current_price.map(|p| p * (1.0 + predicted_return)),
                validation_r2,
                ..ForecastResult::unavailable(ForecastLabel::Unknown, horizon)
            }
        }
        Ok(None) => ForecastResult::unavailable(ForecastLabel::Unknown, horizon),
        Err(e) => {
            tracing::error!("Error predicting price for {}: {}", symbol, e);
            ForecastResult::unavailable(ForecastLabel::Error, horizon)
        }
    };

    if let Some(indicators) = long_term_indicators(bars) {
        let assessment = assess(&indicators);
        result.long_term_factors = assessment.factors();
        result.long_term_recommendation = Some(assessment.recommendation);
        result.long_term_data = Some(indicators);
    }

    result
}

/// `Ok(None)` when no model could be trained, `Err` when a trained model
/// failed to predict.
fn forecast_return(
    symbol: &str,
    bars: &[Bar],
    config: &ForecastConfig,
) -> AnalysisResult<Option<(f64, Option<f64>)>> {
    if bars.len() < config.min_bars {
        tracing::warn!(
            "Insufficient historical data for prediction of {}: {} bars, need {}",
            symbol,
            bars.len(),
            config.min_bars
        );
        return Ok(None);
    }

    let table = build_features(bars);
    let latest_bar = bars.len().saturating_sub(1);
    let Some(latest) = table.latest().filter(|row| row.index == latest_bar) else {
        tracing::warn!(
            "No complete feature row for the latest bar of {} (index {}), skipping prediction",
            symbol,
            latest_bar
        );
        return Ok(None);
    };

    let trained = match TrainedForecaster::train(&table, &closes(bars), config) {
        Ok(trained) => trained,
        Err(AnalysisError::InsufficientData(msg)) => {
            tracing::warn!("Not enough processed data points for {}: {}", symbol, msg);
            return Ok(None);
        }
        Err(e) => {
            tracing::error!("Error training prediction model for {}: {}", symbol, e);
            return Ok(None);
        }
    };

    let predicted_return = trained.predict(latest)?;

    Ok(Some((predicted_return, trained.validation_r2)))
}
