use chrono::{DateTime, Utc};
use fundamental_analysis::{
    categorize, evaluate_checklist, ChecklistEvaluation, LynchAnalysis, ValuationResult, ValuationScorer,
};
use ml_engine::{forecast, ForecastResult};
use serde::{Deserialize, Serialize};

pub mod config;
pub mod screener;

#[cfg(test)]
mod tests;

pub use analysis_core::{Bar, FundamentalsSnapshot};
pub use config::{AnalysisConfig, DEFAULT_MAX_BATCH_SIZE};
pub use screener::{parse_ticker_list, rank_magic_formula, MagicRank, ScreenerResult, StockScreener};

/// Everything the analysis needs for one ticker: a fundamentals snapshot and
/// an optional chronological price history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerInput {
    pub snapshot: FundamentalsSnapshot,
    #[serde(default)]
    pub bars: Vec<Bar>,
}

impl TickerInput {
    pub fn symbol(&self) -> &str {
        &self.snapshot.symbol
    }
}

/// Merged per-ticker output of every analysis component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockReport {
    pub symbol: String,
    pub company_name: Option<String>,
    pub current_price: Option<f64>,
    pub valuation: ValuationResult,
    pub lynch: LynchAnalysis,
    pub checklist: ChecklistEvaluation,
    /// Absent when no price history was supplied.
    pub forecast: Option<ForecastResult>,
    /// Filled in by batch ranking.
    pub magic_rank: Option<MagicRank>,
    pub analyzed_at: DateTime<Utc>,
}

pub struct AnalysisOrchestrator {
    config: AnalysisConfig,
    scorer: ValuationScorer,
}

impl AnalysisOrchestrator {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            scorer: ValuationScorer::new(),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run every component for one ticker. Components fail independently;
    /// a missing history only leaves `forecast` empty.
    pub fn analyze(&self, input: &TickerInput) -> StockReport {
        let snapshot = &input.snapshot;
        tracing::info!("Processing ticker: {}", snapshot.symbol);

        let valuation = self.scorer.score(snapshot);
        let lynch = categorize(snapshot, &valuation);
        let checklist = evaluate_checklist(snapshot, &valuation, lynch.category);
        tracing::debug!(
            "{}: {} ({}), {}",
            snapshot.symbol,
            valuation.buy_decision,
            valuation.ratings.decision,
            lynch.category
        );

        let forecast = if input.bars.is_empty() {
            tracing::debug!("No price history for {}, skipping forecast", snapshot.symbol);
            None
        } else {
            Some(forecast(&snapshot.symbol, &input.bars, &self.config.forecast))
        };

        StockReport {
            symbol: snapshot.symbol.clone(),
            company_name: snapshot.company_name.clone(),
            current_price: snapshot.current_price.or_else(|| input.bars.last().map(|b| b.close)),
            valuation,
            lynch,
            checklist,
            forecast,
            magic_rank: None,
            analyzed_at: Utc::now(),
        }
    }
}

impl Default for AnalysisOrchestrator {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}
