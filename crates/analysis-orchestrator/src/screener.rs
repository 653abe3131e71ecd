use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{AnalysisOrchestrator, StockReport, TickerInput};

/// Magic Formula standing inside one batch. Ranks start at 1 (best).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicRank {
    pub earnings_yield_rank: usize,
    pub return_on_capital_rank: usize,
    /// Sum of the two ranks; lower is better.
    pub combined: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerResult {
    /// Reports sorted by combined Magic Formula rank.
    pub reports: Vec<StockReport>,
    pub total_requested: usize,
    pub total_analyzed: usize,
    pub warning: Option<String>,
    pub timestamp: DateTime<Utc>,
}

pub struct StockScreener<'a> {
    orchestrator: &'a AnalysisOrchestrator,
}

impl<'a> StockScreener<'a> {
    pub fn new(orchestrator: &'a AnalysisOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Analyze a batch in parallel and rank it. Inputs beyond the configured
    /// batch cap are dropped with a warning.
    pub fn screen(&self, inputs: &[TickerInput]) -> ScreenerResult {
        let total_requested = inputs.len();
        let cap = self.orchestrator.config().max_batch_size;

        let (batch, warning) = if inputs.len() > cap {
            let message = format!(
                "Processing only the first {} tickers to avoid timeout. Please process the rest in another batch.",
                cap
            );
            tracing::warn!("{}", message);
            (&inputs[..cap], Some(message))
        } else {
            (inputs, None)
        };

        tracing::info!("Processing batch request for {} tickers", batch.len());

        let mut reports: Vec<StockReport> = batch
            .par_iter()
            .map(|input| self.orchestrator.analyze(input))
            .collect();

        rank_magic_formula(&mut reports);

        tracing::info!("Batch complete: {}/{} tickers analyzed", reports.len(), total_requested);

        ScreenerResult {
            total_analyzed: reports.len(),
            reports,
            total_requested,
            warning,
            timestamp: Utc::now(),
        }
    }
}

/// Rank positions (1 = best) by descending metric. Missing values rank after
/// every real value, negative ones included; ties keep input order.
fn descending_ranks(values: &[Option<f64>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| match (values[a], values[b]) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    let mut ranks = vec![0; values.len()];
    for (position, &index) in order.iter().enumerate() {
        ranks[index] = position + 1;
    }
    ranks
}

/// Assign Magic Formula ranks and stable-sort the batch by combined rank.
pub fn rank_magic_formula(reports: &mut [StockReport]) {
    let ey: Vec<Option<f64>> = reports.iter().map(|r| r.valuation.earnings_yield).collect();
    let roc: Vec<Option<f64>> = reports.iter().map(|r| r.valuation.return_on_capital).collect();
    let ey_ranks = descending_ranks(&ey);
    let roc_ranks = descending_ranks(&roc);

    for (i, report) in reports.iter_mut().enumerate() {
        report.magic_rank = Some(MagicRank {
            earnings_yield_rank: ey_ranks[i],
            return_on_capital_rank: roc_ranks[i],
            combined: ey_ranks[i] + roc_ranks[i],
        });
    }

    reports.sort_by_key(|r| r.magic_rank.map_or(usize::MAX, |rank| rank.combined));
}

/// Split a free-form ticker list on commas and whitespace, upper-cased.
pub fn parse_ticker_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_uppercase)
        .collect()
}
