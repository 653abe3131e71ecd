//! Trend, crossover and drawdown signals for long-horizon investors.
//!
//! Independent of the regression forecast: everything here is a fixed rule
//! over the closing-price series, and the recommendation is a tally of
//! threshold hits rather than a statistical estimate.

use std::fmt;

use analysis_core::stats::{linear_fit, round_to};
use analysis_core::{closes, Bar};
use serde::{Deserialize, Serialize};

use crate::indicators::*;

/// Minimum bars for any long-term output.
pub const MIN_BARS: usize = 100;
/// Minimum bars for the 200-day average and golden/death-cross flags.
pub const CROSS_MIN_BARS: usize = 200;
/// One trading year, used for the 52-week range.
pub const YEAR_BARS: usize = 252;

const LOOKBACK: usize = 100;
const TRADING_DAYS: f64 = 252.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Upward,
    Downward,
}

/// Long-term indicator snapshot. Ratios and percentages are rounded to two
/// decimals; `None` marks values the series is too short to support.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongTermIndicators {
    pub ma50: f64,
    pub ma100: f64,
    pub ma200: Option<f64>,
    pub recent_golden_cross: Option<bool>,
    pub recent_death_cross: Option<bool>,
    pub percent_change_100d: f64,
    /// Annualized 100-day volatility in percent.
    pub long_term_volatility: Option<f64>,
    pub price_to_ma50: Option<f64>,
    pub price_to_ma200: Option<f64>,
    /// R² of a line fit over the last 100 closes.
    pub trend_strength: Option<f64>,
    pub trend_direction: Option<TrendDirection>,
    pub year_high: f64,
    pub year_low: f64,
    pub pct_from_high: f64,
    pub pct_from_low: f64,
    pub max_drawdown: f64,
    pub current_drawdown: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LongTermRecommendation {
    #[serde(rename = "Strong Long-Term Buy")]
    StrongBuy,
    #[serde(rename = "Long-Term Buy")]
    Buy,
    #[serde(rename = "Long-Term Neutral")]
    Neutral,
    #[serde(rename = "Long-Term Caution")]
    Caution,
    #[serde(rename = "Long-Term Avoid")]
    Avoid,
}

impl LongTermRecommendation {
    pub fn to_label(&self) -> &'static str {
        match self {
            LongTermRecommendation::StrongBuy => "Strong Long-Term Buy",
            LongTermRecommendation::Buy => "Long-Term Buy",
            LongTermRecommendation::Neutral => "Long-Term Neutral",
            LongTermRecommendation::Caution => "Long-Term Caution",
            LongTermRecommendation::Avoid => "Long-Term Avoid",
        }
    }

    /// Decide from factor counts. Strong calls need at least three factors
    /// and more than double the opposing count.
    pub fn from_counts(positive: usize, negative: usize) -> Self {
        if positive >= 3 && positive > negative * 2 {
            LongTermRecommendation::StrongBuy
        } else if positive > negative {
            LongTermRecommendation::Buy
        } else if negative >= 3 && negative > positive * 2 {
            LongTermRecommendation::Avoid
        } else if negative > positive {
            LongTermRecommendation::Caution
        } else {
            LongTermRecommendation::Neutral
        }
    }
}

impl fmt::Display for LongTermRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongTermAssessment {
    pub recommendation: LongTermRecommendation,
    pub positive_factors: Vec<String>,
    pub negative_factors: Vec<String>,
}

impl LongTermAssessment {
    /// Positive factors followed by negative ones.
    pub fn factors(&self) -> Vec<String> {
        self.positive_factors
            .iter()
            .chain(self.negative_factors.iter())
            .cloned()
            .collect()
    }
}

/// Compute long-term indicators, or `None` below [`MIN_BARS`] bars.
pub fn long_term_indicators(bars: &[Bar]) -> Option<LongTermIndicators> {
    if bars.len() < MIN_BARS {
        tracing::debug!("Long-term indicators need {} bars, got {}", MIN_BARS, bars.len());
        return None;
    }

    let closes = closes(bars);
    let n = closes.len();
    let current_price = closes[n - 1];
    let close_series = defined(&closes);

    let ma50_series = rolling_mean(&close_series, 50);
    let ma50 = ma50_series[n - 1]?;
    let ma100 = rolling_mean(&close_series, 100)[n - 1]?;

    let (ma200, recent_golden_cross, recent_death_cross) = if n >= CROSS_MIN_BARS {
        let ma200_series = rolling_mean(&close_series, 200);
        let golden = crossovers_above(&ma50_series, &ma200_series);
        let death = crossovers_below(&ma50_series, &ma200_series);
        (
            ma200_series[n - 1],
            Some(golden[n - LOOKBACK..].iter().any(|&f| f)),
            Some(death[n - LOOKBACK..].iter().any(|&f| f)),
        )
    } else {
        (None, None, None)
    };

    let start_price = closes[n - LOOKBACK];
    let percent_change_100d = round_to((current_price / start_price - 1.0) * 100.0, 2);

    let daily_returns = pct_change(&closes, 1);
    let long_term_volatility = rolling_std(&daily_returns, LOOKBACK)[n - 1]
        .map(|sd| round_to(sd * TRADING_DAYS.sqrt() * 100.0, 2));

    let price_to_ma50 = ratio(current_price, ma50).map(|r| round_to(r, 2));
    let price_to_ma200 = ma200.and_then(|ma| ratio(current_price, ma)).map(|r| round_to(r, 2));

    let x: Vec<f64> = (0..LOOKBACK).map(|i| i as f64).collect();
    let fit = linear_fit(&x, &closes[n - LOOKBACK..]);
    let trend_strength = fit.map(|f| round_to(f.r_squared, 2));
    let trend_direction = fit.map(|f| {
        if f.slope > 0.0 {
            TrendDirection::Upward
        } else {
            TrendDirection::Downward
        }
    });

    let year = &closes[n.saturating_sub(YEAR_BARS)..];
    let year_high = year.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let year_low = year.iter().copied().fold(f64::INFINITY, f64::min);
    let pct_from_high = round_to((year_high - current_price) / year_high * 100.0, 2);
    let pct_from_low = round_to((current_price - year_low) / year_low * 100.0, 2);

    let drawdowns = drawdown_series(&closes);
    let max_drawdown = round_to(drawdowns.iter().copied().fold(0.0, f64::min), 2);
    let current_drawdown = round_to(drawdowns[n - 1], 2);

    Some(LongTermIndicators {
        ma50,
        ma100,
        ma200,
        recent_golden_cross,
        recent_death_cross,
        percent_change_100d,
        long_term_volatility,
        price_to_ma50,
        price_to_ma200,
        trend_strength,
        trend_direction,
        year_high,
        year_low,
        pct_from_high,
        pct_from_low,
        max_drawdown,
        current_drawdown,
    })
}

/// Already-rounded indicator value as reported, e.g. "12.5" or "-25.0".
fn reported(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    let r = numerator / denominator;
    r.is_finite().then_some(r)
}

/// Tally positive and negative long-term factors and derive a recommendation.
/// Indicators that are unavailable contribute nothing.
pub fn assess(indicators: &LongTermIndicators) -> LongTermAssessment {
    let mut positive = Vec::new();
    let mut negative = Vec::new();

    if indicators.recent_golden_cross == Some(true) {
        positive.push("Recent Golden Cross detected (50-day MA crossed above 200-day MA)".to_string());
    }
    if indicators.recent_death_cross == Some(true) {
        negative.push("Recent Death Cross detected (50-day MA crossed below 200-day MA)".to_string());
    }

    for (ratio, label) in [
        (indicators.price_to_ma50, "50-day MA"),
        (indicators.price_to_ma200, "200-day MA"),
    ] {
        match ratio {
            Some(r) if r > 1.05 => positive.push(format!("Price is {:.1}% above {}", (r - 1.0) * 100.0, label)),
            Some(r) if r < 0.95 => negative.push(format!("Price is {:.1}% below {}", (1.0 - r) * 100.0, label)),
            _ => {}
        }
    }

    let change = indicators.percent_change_100d;
    if change > 10.0 {
        positive.push(format!("Strong 100-day performance: +{}%", reported(change)));
    } else if change < -10.0 {
        negative.push(format!("Weak 100-day performance: {}%", reported(change)));
    }

    match indicators.long_term_volatility {
        Some(v) if v < 20.0 => positive.push(format!("Low volatility: {}%", reported(v))),
        Some(v) if v > 40.0 => negative.push(format!("High volatility: {}%", reported(v))),
        _ => {}
    }

    if let (Some(strength), Some(direction)) = (indicators.trend_strength, indicators.trend_direction) {
        if strength > 0.7 {
            match direction {
                TrendDirection::Upward => positive.push(format!("Strong upward trend (R²: {})", reported(strength))),
                TrendDirection::Downward => negative.push(format!("Strong downward trend (R²: {})", reported(strength))),
            }
        }
    }

    if indicators.pct_from_high < 5.0 {
        positive.push(format!("Near 52-week high (within {}%)", reported(indicators.pct_from_high)));
    } else if indicators.pct_from_low < 10.0 {
        negative.push(format!("Near 52-week low (within {}% of bottom)", reported(indicators.pct_from_low)));
    }

    if indicators.current_drawdown > -5.0 {
        positive.push(format!("Minimal current drawdown: {}%", reported(indicators.current_drawdown)));
    } else if indicators.current_drawdown < -20.0 {
        negative.push(format!("Significant current drawdown: {}%", reported(indicators.current_drawdown)));
    }

    LongTermAssessment {
        recommendation: LongTermRecommendation::from_counts(positive.len(), negative.len()),
        positive_factors: positive,
        negative_factors: negative,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn bars_from(closes: &[f64]) -> Vec<Bar> {
        let start = Utc::now() - Duration::days(closes.len() as i64);
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: start + Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: None,
            })
            .collect()
    }

    /// 200 bars falling from 200 then 100 bars rising 2 per bar.
    fn v_shaped() -> Vec<f64> {
        let mut closes: Vec<f64> = (0..200).map(|i| 200.0 - 0.5 * i as f64).collect();
        let bottom = closes[199];
        closes.extend((1..=100).map(|k| bottom + 2.0 * k as f64));
        closes
    }

    fn neutral_indicators() -> LongTermIndicators {
        LongTermIndicators {
            ma50: 100.0,
            ma100: 100.0,
            ma200: Some(100.0),
            recent_golden_cross: Some(false),
            recent_death_cross: Some(false),
            percent_change_100d: 0.0,
            long_term_volatility: Some(30.0),
            price_to_ma50: Some(1.0),
            price_to_ma200: Some(1.0),
            trend_strength: Some(0.1),
            trend_direction: Some(TrendDirection::Upward),
            year_high: 120.0,
            year_low: 80.0,
            pct_from_high: 16.67,
            pct_from_low: 25.0,
            max_drawdown: -20.0,
            current_drawdown: -10.0,
        }
    }

    #[test]
    fn test_requires_minimum_history() {
        let closes: Vec<f64> = (0..99).map(|i| 100.0 + i as f64).collect();
        assert!(long_term_indicators(&bars_from(&closes)).is_none());
    }

    #[test]
    fn test_short_history_omits_cross_signals() {
        let closes: Vec<f64> = (0..150).map(|i| 100.0 + i as f64 * 0.2).collect();
        let ind = long_term_indicators(&bars_from(&closes)).unwrap();
        assert_eq!(ind.ma200, None);
        assert_eq!(ind.recent_golden_cross, None);
        assert_eq!(ind.recent_death_cross, None);
        assert_eq!(ind.price_to_ma200, None);
        assert!(ind.price_to_ma50.is_some());
        // Range falls back to the whole series below one trading year.
        assert_eq!(ind.year_low, 100.0);
    }

    #[test]
    fn test_golden_cross_detected_once() {
        let closes = v_shaped();
        let ma50 = rolling_mean(&defined(&closes), 50);
        let ma200 = rolling_mean(&defined(&closes), 200);
        let crossings = crossovers_above(&ma50, &ma200);
        assert_eq!(crossings[200..].iter().filter(|&&c| c).count(), 1);

        let ind = long_term_indicators(&bars_from(&closes)).unwrap();
        assert_eq!(ind.recent_golden_cross, Some(true));
        assert_eq!(ind.recent_death_cross, Some(false));
    }

    #[test]
    fn test_death_cross_on_inverted_series() {
        let closes: Vec<f64> = v_shaped().iter().map(|c| 400.0 - c).collect();
        let ind = long_term_indicators(&bars_from(&closes)).unwrap();
        assert_eq!(ind.recent_golden_cross, Some(false));
        assert_eq!(ind.recent_death_cross, Some(true));
    }

    #[test]
    fn test_no_cross_in_steady_uptrend() {
        let closes: Vec<f64> = (0..300).map(|i| 50.0 + i as f64 * 0.5).collect();
        let ind = long_term_indicators(&bars_from(&closes)).unwrap();
        assert_eq!(ind.recent_golden_cross, Some(false));
        assert_eq!(ind.recent_death_cross, Some(false));
    }

    #[test]
    fn test_drawdown_and_range() {
        let mut closes: Vec<f64> = (0..120).map(|i| 100.0 + i as f64).collect();
        closes.extend((0..20).map(|i| 219.0 - 5.0 * i as f64));
        let ind = long_term_indicators(&bars_from(&closes)).unwrap();

        assert_eq!(ind.year_high, 219.0);
        let expected_current = round_to((124.0 / 219.0 - 1.0) * 100.0, 2);
        assert!((ind.current_drawdown - expected_current).abs() < 1e-9);
        assert!((ind.max_drawdown - expected_current).abs() < 1e-9);
        assert!((ind.pct_from_high - round_to(95.0 / 219.0 * 100.0, 2)).abs() < 1e-9);
        assert_eq!(ind.trend_direction, Some(TrendDirection::Upward));
    }

    #[test]
    fn test_compounding_uptrend_is_strong_buy() {
        let closes: Vec<f64> = (0..300).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let ind = long_term_indicators(&bars_from(&closes)).unwrap();
        let assessment = assess(&ind);

        assert!(assessment.negative_factors.is_empty());
        assert!(assessment.positive_factors.len() >= 3);
        assert_eq!(assessment.recommendation, LongTermRecommendation::StrongBuy);
    }

    #[test]
    fn test_neutral_when_no_factors() {
        let assessment = assess(&neutral_indicators());
        assert!(assessment.factors().is_empty());
        assert_eq!(assessment.recommendation, LongTermRecommendation::Neutral);
    }

    #[test]
    fn test_missing_indicators_contribute_nothing() {
        let mut ind = neutral_indicators();
        ind.long_term_volatility = None;
        ind.price_to_ma200 = None;
        ind.recent_death_cross = None;
        ind.trend_strength = None;
        let assessment = assess(&ind);
        assert_eq!(assessment.recommendation, LongTermRecommendation::Neutral);
    }

    #[test]
    fn test_caution_and_avoid() {
        let mut ind = neutral_indicators();
        ind.price_to_ma50 = Some(0.9);
        assert_eq!(assess(&ind).recommendation, LongTermRecommendation::Caution);

        ind.recent_death_cross = Some(true);
        ind.current_drawdown = -25.0;
        let assessment = assess(&ind);
        assert_eq!(assessment.negative_factors.len(), 3);
        assert_eq!(assessment.recommendation, LongTermRecommendation::Avoid);
    }

    #[test]
    fn test_factor_strings_show_reported_values() {
        let mut ind = neutral_indicators();
        ind.percent_change_100d = 12.5;
        ind.long_term_volatility = Some(18.25);
        ind.current_drawdown = -25.0;
        let assessment = assess(&ind);

        assert_eq!(
            assessment.positive_factors,
            vec!["Strong 100-day performance: +12.5%", "Low volatility: 18.25%"]
        );
        assert_eq!(assessment.negative_factors, vec!["Significant current drawdown: -25.0%"]);
    }

    #[test]
    fn test_recommendation_counts() {
        assert_eq!(LongTermRecommendation::from_counts(3, 1), LongTermRecommendation::StrongBuy);
        assert_eq!(LongTermRecommendation::from_counts(4, 2), LongTermRecommendation::Buy);
        assert_eq!(LongTermRecommendation::from_counts(2, 0), LongTermRecommendation::Buy);
        assert_eq!(LongTermRecommendation::from_counts(2, 2), LongTermRecommendation::Neutral);
        assert_eq!(LongTermRecommendation::from_counts(1, 3), LongTermRecommendation::Avoid);
        assert_eq!(LongTermRecommendation::from_counts(2, 3), LongTermRecommendation::Caution);
    }
}
