use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar. Volume is optional because some feeds only carry prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

/// Closing prices of a chronological bar series.
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Volumes of a bar series, or `None` unless every bar carries one.
pub fn volumes(bars: &[Bar]) -> Option<Vec<f64>> {
    if bars.is_empty() {
        return None;
    }
    bars.iter().map(|b| b.volume).collect()
}

/// Point-in-time company fundamentals supplied by the data layer.
///
/// Every numeric field is optional. Growth is a decimal fraction (0.08 = 8%),
/// dividend yield and price change are already in percent units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundamentalsSnapshot {
    pub symbol: String,
    pub company_name: Option<String>,
    pub market_cap: Option<f64>,
    pub ebit: Option<f64>,
    pub net_income: Option<f64>,
    pub total_debt: Option<f64>,
    pub cash: Option<f64>,
    pub current_assets: Option<f64>,
    pub current_liabilities: Option<f64>,
    pub net_fixed_assets: Option<f64>,
    pub net_working_capital: Option<f64>,
    pub total_assets: Option<f64>,
    pub total_equity: Option<f64>,
    pub book_value_per_share: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub earnings_growth: Option<f64>,
    /// Year-over-year revenue growth in percent.
    pub revenue_growth: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub current_price: Option<f64>,
    /// One-year price change in percent.
    pub price_change_percent: Option<f64>,
    pub industry: Option<String>,
    pub sector: Option<String>,
}

impl FundamentalsSnapshot {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    /// Net working capital as reported, else current assets minus current liabilities.
    pub fn working_capital(&self) -> Option<f64> {
        self.net_working_capital.or_else(|| match (self.current_assets, self.current_liabilities) {
            (Some(assets), Some(liabilities)) => Some(assets - liabilities),
            _ => None,
        })
    }

    /// Earnings growth in percent. Values below 1 are treated as fractions and scaled.
    pub fn earnings_growth_pct(&self) -> Option<f64> {
        self.earnings_growth.map(growth_to_pct)
    }
}

/// Growth figures arrive either as fractions (0.12) or percents (12.0).
/// Anything below 1 is taken to be a fraction.
pub fn growth_to_pct(growth: f64) -> f64 {
    if growth < 1.0 {
        growth * 100.0
    } else {
        growth
    }
}

/// Four-level quality scale shared by every banded metric and label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    Strong,
    Good,
    Fair,
    Weak,
    #[serde(rename = "Not Rated")]
    NotRated,
}

impl Rating {
    pub fn to_label(&self) -> &'static str {
        match self {
            Rating::Strong => "Strong",
            Rating::Good => "Good",
            Rating::Fair => "Fair",
            Rating::Weak => "Weak",
            Rating::NotRated => "Not Rated",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_label())
    }
}
