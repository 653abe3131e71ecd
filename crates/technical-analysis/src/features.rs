use analysis_core::{closes, volumes, Bar};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::indicators::*;

pub const RETURN_WINDOWS: [usize; 4] = [1, 5, 10, 20];
pub const MA_WINDOWS: [usize; 4] = [5, 10, 20, 50];
pub const VOLATILITY_WINDOWS: [usize; 3] = [5, 10, 20];
pub const VOLUME_MA_WINDOWS: [usize; 2] = [5, 10];

/// Longest rolling window; the first `LONGEST_WINDOW - 1` bars never produce a row.
pub const LONGEST_WINDOW: usize = 50;

const PRICE_COLUMNS: [&str; 15] = [
    "return_1d",
    "return_5d",
    "return_10d",
    "return_20d",
    "ma5",
    "ma10",
    "ma20",
    "ma50",
    "volatility_5d",
    "volatility_10d",
    "volatility_20d",
    "close_to_ma5",
    "close_to_ma10",
    "close_to_ma20",
    "close_to_ma50",
];

const VOLUME_COLUMNS: [&str; 3] = ["volume_ma5", "volume_ma10", "volume_change"];

/// Derived features for one bar, built only from data at or before that bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Position of the source bar in the input series.
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub values: Vec<f64>,
}

/// Fixed-width feature table. Warm-up rows are dropped, never imputed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    pub columns: Vec<String>,
    pub rows: Vec<FeatureRow>,
}

/// Feature rows paired with their forward-return targets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledRows {
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

impl LabeledRows {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Most recent surviving row. Its `index` is behind the last bar when that
    /// bar's values are undefined.
    pub fn latest(&self) -> Option<&FeatureRow> {
        self.rows.last()
    }

    /// Attach `close[t + horizon] / close[t] - 1` to each row, dropping rows
    /// whose horizon runs past the end of `closes`.
    pub fn with_targets(&self, closes: &[f64], horizon: usize) -> LabeledRows {
        let mut labeled = LabeledRows::default();
        for row in &self.rows {
            let Some(&future) = row.index.checked_add(horizon).and_then(|t| closes.get(t)) else {
                continue;
            };
            let target = future / closes[row.index] - 1.0;
            if !target.is_finite() {
                continue;
            }
            labeled.features.push(row.values.clone());
            labeled.targets.push(target);
        }
        labeled
    }
}

/// Build the feature table for a chronological bar series.
///
/// Volume features are included only when every bar carries a volume. Any
/// row with an undefined or non-finite value is dropped, so with a clean
/// series the table holds `bars.len() - (LONGEST_WINDOW - 1)` rows and is
/// empty below `LONGEST_WINDOW` bars.
pub fn build_features(bars: &[Bar]) -> FeatureTable {
    let closes = closes(bars);
    let volumes = volumes(bars);

    let mut columns: Vec<String> = PRICE_COLUMNS.iter().map(|c| c.to_string()).collect();
    if volumes.is_some() {
        columns.extend(VOLUME_COLUMNS.iter().map(|c| c.to_string()));
    }

    if bars.len() < LONGEST_WINDOW {
        return FeatureTable { columns, rows: vec![] };
    }

    let close_series = defined(&closes);
    let returns: Vec<Vec<Option<f64>>> = RETURN_WINDOWS.iter().map(|&k| pct_change(&closes, k)).collect();
    let moving_averages: Vec<Vec<Option<f64>>> = MA_WINDOWS
        .iter()
        .map(|&w| rolling_mean(&close_series, w))
        .collect();
    let volatility: Vec<Vec<Option<f64>>> = VOLATILITY_WINDOWS
        .iter()
        .map(|&w| rolling_std(&returns[0], w))
        .collect();

    let volume_features: Option<Vec<Vec<Option<f64>>>> = volumes.as_ref().map(|vols| {
        let series = defined(vols);
        let mut cols: Vec<Vec<Option<f64>>> = VOLUME_MA_WINDOWS
            .iter()
            .map(|&w| rolling_mean(&series, w))
            .collect();
        cols.push(pct_change(vols, 1));
        cols
    });

    let mut rows = Vec::with_capacity(bars.len() + 1 - LONGEST_WINDOW);
    for (i, bar) in bars.iter().enumerate() {
        let mut values = Vec::with_capacity(columns.len());
        values.extend(returns.iter().map(|col| col[i]));
        values.extend(moving_averages.iter().map(|col| col[i]));
        values.extend(volatility.iter().map(|col| col[i]));
        values.extend(moving_averages.iter().map(|col| col[i].map(|ma| closes[i] / ma)));
        if let Some(cols) = &volume_features {
            values.extend(cols.iter().map(|col| col[i]));
        }

        let values: Option<Vec<f64>> = values
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        if let Some(values) = values {
            rows.push(FeatureRow {
                index: i,
                timestamp: bar.timestamp,
                close: bar.close,
                values,
            });
        }
    }

    FeatureTable { columns, rows }
}
