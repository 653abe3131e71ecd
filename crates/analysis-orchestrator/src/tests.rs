use super::*;
use analysis_core::{Bar, FundamentalsSnapshot};
use chrono::{Duration, TimeZone, Utc};
use fundamental_analysis::{BuyDecision, LynchCategory};
use ml_engine::SplitStrategy;
use std::collections::HashMap;

// Snapshot whose earnings yield and return on capital come out exactly as given.
fn snapshot_with(symbol: &str, earnings_yield: Option<f64>, return_on_capital: f64) -> FundamentalsSnapshot {
    let ebit = 10.0;
    FundamentalsSnapshot {
        symbol: symbol.to_string(),
        market_cap: earnings_yield.map(|ey| ebit * 100.0 / ey),
        ebit: Some(ebit),
        total_debt: Some(0.0),
        cash: Some(0.0),
        total_assets: Some(ebit * 100.0 / return_on_capital),
        current_liabilities: Some(0.0),
        ..Default::default()
    }
}

fn input(snapshot: FundamentalsSnapshot) -> TickerInput {
    TickerInput { snapshot, bars: vec![] }
}

fn bars(n: usize) -> Vec<Bar> {
    let start = Utc.with_ymd_and_hms(2022, 1, 3, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 50.0 + 0.1 * i as f64 + 2.0 * (i as f64 * 0.15).sin();
            Bar {
                timestamp: start + Duration::days(i as i64),
                open: close,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume: None,
            }
        })
        .collect()
}

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_config_defaults() {
    let config = AnalysisConfig::from_lookup(lookup(&[]));
    assert_eq!(config, AnalysisConfig::default());
    assert_eq!(config.max_batch_size, 10);
    assert_eq!(config.forecast.horizon_days, 30);
    assert_eq!(config.forecast.split, SplitStrategy::Shuffled { seed: 42 });
}

#[test]
fn test_config_overrides() {
    let config = AnalysisConfig::from_lookup(lookup(&[
        ("FORECAST_HORIZON_DAYS", "10"),
        ("RIDGE_ALPHA", "0.5"),
        ("VALIDATION_FRACTION", "0.25"),
        ("SPLIT_SEED", "7"),
        ("MAX_BATCH_SIZE", "25"),
    ]));
    assert_eq!(config.forecast.horizon_days, 10);
    assert_eq!(config.forecast.ridge_alpha, 0.5);
    assert_eq!(config.forecast.validation_fraction, 0.25);
    assert_eq!(config.forecast.split, SplitStrategy::Shuffled { seed: 7 });
    assert_eq!(config.max_batch_size, 25);

    let config = AnalysisConfig::from_lookup(lookup(&[("CHRONOLOGICAL_SPLIT", "true")]));
    assert_eq!(config.forecast.split, SplitStrategy::Chronological);
}

#[test]
fn test_config_ignores_bad_values() {
    let config = AnalysisConfig::from_lookup(lookup(&[
        ("FORECAST_HORIZON_DAYS", "soon"),
        ("RIDGE_ALPHA", "-1"),
        ("VALIDATION_FRACTION", "1.5"),
        ("MAX_BATCH_SIZE", "0"),
    ]));
    assert_eq!(config, AnalysisConfig::default());
}

#[test]
fn test_analyze_without_history() {
    let orchestrator = AnalysisOrchestrator::default();
    let mut snapshot = snapshot_with("AAA", Some(13.0), 10.0);
    snapshot.company_name = Some("Triple A Corp".to_string());

    let report = orchestrator.analyze(&input(snapshot));
    assert_eq!(report.symbol, "AAA");
    assert_eq!(report.company_name.as_deref(), Some("Triple A Corp"));
    assert_eq!(report.valuation.buy_decision, BuyDecision::Buy);
    assert!(report.forecast.is_none());
    assert!(report.magic_rank.is_none());
    assert_eq!(report.checklist.checklist_items, report.lynch.recommendations);
}

#[test]
fn test_analyze_with_history_runs_forecast() {
    let orchestrator = AnalysisOrchestrator::default();
    let history = bars(220);
    let last_close = history.last().unwrap().close;
    let report = orchestrator.analyze(&TickerInput {
        snapshot: FundamentalsSnapshot::new("HIST"),
        bars: history,
    });

    let forecast = report.forecast.expect("forecast should run when bars are supplied");
    assert!(forecast.predicted_return.is_some());
    assert!(forecast.long_term_recommendation.is_some());
    assert_eq!(report.current_price, Some(last_close));
    assert_eq!(report.lynch.category, LynchCategory::Unknown);
    assert_eq!(report.valuation.buy_decision, BuyDecision::InsufficientData);
}

#[test]
fn test_magic_formula_ranking() {
    let orchestrator = AnalysisOrchestrator::default();
    let inputs = vec![
        input(snapshot_with("LOW", Some(3.0), 5.0)),
        input(snapshot_with("MISSING", None, 50.0)),
        input(snapshot_with("BEST", Some(15.0), 40.0)),
        input(snapshot_with("MID", Some(8.0), 20.0)),
    ];

    let result = StockScreener::new(&orchestrator).screen(&inputs);
    let order: Vec<&str> = result.reports.iter().map(|r| r.symbol.as_str()).collect();
    // MISSING (4 + 1) ties MID (2 + 3) and keeps its earlier input position.
    assert_eq!(order, vec!["BEST", "MISSING", "MID", "LOW"]);

    let best = result.reports[0].magic_rank.unwrap();
    assert_eq!((best.earnings_yield_rank, best.return_on_capital_rank, best.combined), (1, 2, 3));
    assert_eq!(result.total_analyzed, 4);
    assert!(result.warning.is_none());
}

#[test]
fn test_ranking_ties_keep_input_order() {
    let orchestrator = AnalysisOrchestrator::default();
    let mut reports: Vec<StockReport> = ["B", "A"]
        .iter()
        .map(|s| orchestrator.analyze(&input(snapshot_with(s, Some(5.0), 10.0))))
        .collect();

    rank_magic_formula(&mut reports);
    assert_eq!(reports[0].symbol, "B");
    assert_eq!(reports[0].magic_rank.unwrap().combined, 2);
    assert_eq!(reports[1].magic_rank.unwrap().combined, 4);
}

#[test]
fn test_missing_metrics_rank_after_negative_ones() {
    let orchestrator = AnalysisOrchestrator::default();
    let mut reports: Vec<StockReport> = [("MISSING", 10.0), ("NEG", 20.0)]
        .iter()
        .map(|(s, roc)| orchestrator.analyze(&input(snapshot_with(s, Some(5.0), *roc))))
        .collect();
    reports[0].valuation.earnings_yield = None;
    reports[1].valuation.earnings_yield = Some(-5.0);

    rank_magic_formula(&mut reports);
    assert_eq!(reports[0].symbol, "NEG");
    let neg = reports[0].magic_rank.unwrap();
    let missing = reports[1].magic_rank.unwrap();
    assert_eq!((neg.earnings_yield_rank, neg.combined), (1, 2));
    assert_eq!((missing.earnings_yield_rank, missing.combined), (2, 4));
}

#[test]
fn test_batch_is_capped() {
    let orchestrator = AnalysisOrchestrator::new(AnalysisConfig {
        max_batch_size: 3,
        ..Default::default()
    });
    let inputs: Vec<TickerInput> = (0..5)
        .map(|i| input(snapshot_with(&format!("T{}", i), Some(5.0 + i as f64), 10.0)))
        .collect();

    let result = StockScreener::new(&orchestrator).screen(&inputs);
    assert_eq!(result.total_requested, 5);
    assert_eq!(result.total_analyzed, 3);
    assert!(result.reports.iter().all(|r| ["T0", "T1", "T2"].contains(&r.symbol.as_str())));
    assert!(result.warning.unwrap().contains("first 3 tickers"));
}

#[test]
fn test_parse_ticker_list() {
    assert_eq!(
        parse_ticker_list("aapl, msft\nGOOGL  brk.b,,"),
        vec!["AAPL", "MSFT", "GOOGL", "BRK.B"]
    );
    assert!(parse_ticker_list(" , ").is_empty());
}

#[test]
fn test_report_serializes_labels() {
    let orchestrator = AnalysisOrchestrator::default();
    let report = orchestrator.analyze(&input(snapshot_with("JSON", Some(13.0), 16.0)));
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["valuation"]["buy_decision"], "Strong Buy");
    assert_eq!(json["lynch"]["category"], "Unknown");
    assert!(json["forecast"].is_null());
}
