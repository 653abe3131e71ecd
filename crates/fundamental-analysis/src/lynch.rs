use std::fmt;

use analysis_core::FundamentalsSnapshot;
use serde::{Deserialize, Serialize};

use crate::valuation::ValuationResult;

pub const CYCLICAL_INDUSTRY_KEYWORDS: &[&str] = &[
    "automotive",
    "airline",
    "mining",
    "steel",
    "construction",
    "semiconductor",
    "energy",
    "oil",
    "gas",
    "housing",
    "travel",
];

pub const CYCLICAL_SECTOR_KEYWORDS: &[&str] = &["materials", "energy", "industrials", "consumer discretionary"];

const SLOW_GROWER_CHECKLIST: &[&str] = &[
    "Focus on dividend yield and stability",
    "Ensure the company isn't accumulating excessive debt",
    "Monitor for signs of industry disruption",
];

const STALWART_CHECKLIST: &[&str] = &[
    "Look for reasonable P/E ratios relative to growth rate",
    "Monitor for signs of overexpansion",
    "Watch for declining profit margins",
    "Consider buying during temporary setbacks",
];

const FAST_GROWER_CHECKLIST: &[&str] = &[
    "Look for companies expanding within a sustainable niche market",
    "Be cautious of companies growing too rapidly without solid fundamentals",
    "Prefer a reasonable P/E ratio relative to growth rate (PEG ratio)",
    "Check if the company is still in the early stages of growth",
];

const CYCLICAL_CHECKLIST: &[&str] = &[
    "Invest during industry downturns and sell during upswings",
    "Watch for inventory levels and capacity utilization as indicators",
    "Compare current P/E ratio to historical cycle lows and highs",
    "Monitor economic indicators that affect the industry",
];

const TURNAROUND_CHECKLIST: &[&str] = &[
    "Identify specific catalysts for recovery (new management, product lines)",
    "Ensure the company has sufficient cash flow to sustain operations during recovery",
    "Monitor debt levels and repayment capabilities",
    "Look for signs of improved efficiency or cost-cutting measures",
];

const ASSET_PLAY_CHECKLIST: &[&str] = &[
    "Assess the true value of assets like real estate, patents, or subsidiaries",
    "Consider the impact of debt on asset value",
    "Look for catalysts that might unlock the hidden value",
    "Verify that the market is significantly undervaluing the assets",
];

/// Fallback checklist for stocks that fit no category.
pub const GENERAL_CHECKLIST: &[&str] = &[
    "Assess P/E ratio relative to company's historical P/E and industry peers",
    "Check for lower institutional ownership (may indicate undiscovered potential)",
    "Look for insider buying and company share buybacks as positive signals",
    "Verify consistent and sustainable earnings growth",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LynchCategory {
    #[serde(rename = "Slow Grower")]
    SlowGrower,
    Stalwart,
    #[serde(rename = "Fast Grower")]
    FastGrower,
    Cyclical,
    Turnaround,
    #[serde(rename = "Asset Play")]
    AssetPlay,
    Unknown,
}

impl LynchCategory {
    pub fn to_label(&self) -> &'static str {
        match self {
            LynchCategory::SlowGrower => "Slow Grower",
            LynchCategory::Stalwart => "Stalwart",
            LynchCategory::FastGrower => "Fast Grower",
            LynchCategory::Cyclical => "Cyclical",
            LynchCategory::Turnaround => "Turnaround",
            LynchCategory::AssetPlay => "Asset Play",
            LynchCategory::Unknown => "Unknown",
        }
    }

    /// Static investment checklist for the category.
    pub fn checklist(&self) -> &'static [&'static str] {
        match self {
            LynchCategory::SlowGrower => SLOW_GROWER_CHECKLIST,
            LynchCategory::Stalwart => STALWART_CHECKLIST,
            LynchCategory::FastGrower => FAST_GROWER_CHECKLIST,
            LynchCategory::Cyclical => CYCLICAL_CHECKLIST,
            LynchCategory::Turnaround => TURNAROUND_CHECKLIST,
            LynchCategory::AssetPlay => ASSET_PLAY_CHECKLIST,
            LynchCategory::Unknown => GENERAL_CHECKLIST,
        }
    }
}

impl fmt::Display for LynchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_label())
    }
}

/// What the category rules look at: the raw snapshot plus the scorer's ratios.
pub struct ClassifierInput<'a> {
    pub snapshot: &'a FundamentalsSnapshot,
    pub valuation: &'a ValuationResult,
}

impl ClassifierInput<'_> {
    fn market_cap_above(&self, threshold: f64) -> bool {
        self.snapshot.market_cap.is_some_and(|mc| mc > threshold)
    }

    fn growth_pct(&self) -> Option<f64> {
        self.snapshot.earnings_growth_pct()
    }

    pub fn is_cyclical(&self) -> bool {
        let contains_any = |field: &Option<String>, keywords: &[&str]| {
            field.as_deref().is_some_and(|value| {
                let value = value.to_lowercase();
                keywords.iter().any(|kw| value.contains(kw))
            })
        };
        contains_any(&self.snapshot.industry, CYCLICAL_INDUSTRY_KEYWORDS)
            || contains_any(&self.snapshot.sector, CYCLICAL_SECTOR_KEYWORDS)
    }
}

/// One entry of the ordered category cascade.
pub struct CategoryRule {
    pub category: LynchCategory,
    pub description: &'static str,
    pub matches: fn(&ClassifierInput) -> bool,
    pub key_metrics: fn(&ClassifierInput) -> Vec<String>,
}

/// Evaluated top to bottom; the first matching rule decides the category.
pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: LynchCategory::AssetPlay,
        description: "Companies with valuable assets not reflected in the stock price",
        matches: |input| {
            input.valuation.price_to_book.is_some_and(|pb| pb < 1.0)
                || input.valuation.assets_to_ev.is_some_and(|ratio| ratio > 1.2)
        },
        key_metrics: |input| {
            vec![
                metric("Price-to-Book", input.valuation.price_to_book, ""),
                metric("Assets to Enterprise Value", input.valuation.assets_to_ev, ""),
            ]
        },
    },
    CategoryRule {
        category: LynchCategory::Turnaround,
        description: "Companies recovering from poor performance",
        matches: |input| input.snapshot.price_change_percent.is_some_and(|change| change < -30.0),
        key_metrics: |input| {
            vec![
                metric("1-Year Price Change", input.snapshot.price_change_percent, "%"),
                metric("Debt-to-Equity", input.valuation.debt_to_equity, ""),
            ]
        },
    },
    CategoryRule {
        category: LynchCategory::Cyclical,
        description: "Companies whose performance is tied to economic cycles",
        matches: |input| input.is_cyclical(),
        key_metrics: |input| {
            vec![
                format!("Industry: {}", input.snapshot.industry.as_deref().unwrap_or("N/A")),
                metric("P/E Ratio", input.valuation.pe_ratio, ""),
            ]
        },
    },
    CategoryRule {
        category: LynchCategory::SlowGrower,
        description: "Large, mature companies with modest growth (less than 10% annually)",
        matches: |input| input.market_cap_above(100e9) && input.growth_pct().is_some_and(|g| g < 10.0),
        key_metrics: |input| {
            vec![
                metric("Dividend Yield", input.snapshot.dividend_yield, "%"),
                metric("Growth Rate", input.growth_pct(), "%"),
            ]
        },
    },
    CategoryRule {
        category: LynchCategory::Stalwart,
        description: "Large, established companies with solid financials and moderate growth (10-20% annually)",
        matches: |input| {
            input.market_cap_above(10e9) && input.growth_pct().is_some_and(|g| (10.0..=20.0).contains(&g))
        },
        key_metrics: |input| {
            vec![
                metric("Growth Rate", input.growth_pct(), "%"),
                metric("P/E Ratio", input.valuation.pe_ratio, ""),
            ]
        },
    },
    CategoryRule {
        category: LynchCategory::FastGrower,
        description: "Companies with high growth (more than 20% annually)",
        matches: |input| input.growth_pct().is_some_and(|g| g > 20.0),
        key_metrics: |input| {
            vec![
                metric("Growth Rate", input.growth_pct(), "%"),
                metric("PEG Ratio", input.valuation.peg_ratio, ""),
            ]
        },
    },
    CategoryRule {
        category: LynchCategory::Stalwart,
        description: "Large, established companies with solid financials",
        matches: |input| input.market_cap_above(50e9),
        key_metrics: |input| {
            vec![
                metric("P/E Ratio", input.valuation.pe_ratio, ""),
                metric("Dividend Yield", input.snapshot.dividend_yield, "%"),
            ]
        },
    },
];

const UNKNOWN_DESCRIPTION: &str = "Unable to categorize with available data";

fn metric(name: &str, value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{}: {:.2}{}", name, v, unit),
        None => format!("{}: N/A", name),
    }
}

/// Category, its rule's description and key metrics, and the category checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LynchAnalysis {
    pub category: LynchCategory,
    pub description: String,
    pub key_metrics: Vec<String>,
    pub recommendations: Vec<String>,
}

/// First rule of [`CATEGORY_RULES`] that matches, if any.
pub fn matching_rule(input: &ClassifierInput) -> Option<&'static CategoryRule> {
    CATEGORY_RULES.iter().find(|rule| (rule.matches)(input))
}

pub fn categorize(snapshot: &FundamentalsSnapshot, valuation: &ValuationResult) -> LynchAnalysis {
    let input = ClassifierInput { snapshot, valuation };

    let (category, description, key_metrics) = match matching_rule(&input) {
        Some(rule) => (rule.category, rule.description, (rule.key_metrics)(&input)),
        None => (LynchCategory::Unknown, UNKNOWN_DESCRIPTION, Vec::new()),
    };

    tracing::debug!("Categorized {} as {}", snapshot.symbol, category);

    LynchAnalysis {
        category,
        description: description.to_string(),
        key_metrics,
        recommendations: category.checklist().iter().map(|s| s.to_string()).collect(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChecklistEvaluation {
    pub checklist_items: Vec<String>,
    pub meets_criteria: Vec<String>,
    pub needs_attention: Vec<String>,
    /// Accumulated criteria score, capped at 5.
    pub overall_score: f64,
}

impl ChecklistEvaluation {
    fn meets(&mut self, criterion: impl Into<String>, points: f64) {
        self.meets_criteria.push(criterion.into());
        self.overall_score += points;
    }

    fn attention(&mut self, criterion: impl Into<String>) {
        self.needs_attention.push(criterion.into());
    }
}

pub const MAX_CHECKLIST_SCORE: f64 = 5.0;

const EXPANSION_INDUSTRIES: &[&str] = &["Retail", "Restaurants", "Consumer Services", "Technology"];
const CONFIRMED_CYCLICAL_INDUSTRIES: &[&str] = &[
    "Automotive",
    "Steel",
    "Chemicals",
    "Construction",
    "Manufacturing",
    "Airlines",
    "Hotels",
    "Energy",
];
const HARD_ASSET_SECTORS: &[&str] = &["Real Estate", "Consumer Discretionary", "Energy"];

fn is_one_of(value: &Option<String>, names: &[&str]) -> bool {
    value
        .as_deref()
        .is_some_and(|v| names.iter().any(|name| name.eq_ignore_ascii_case(v)))
}

/// Score a stock against the numeric criteria of its category's checklist.
pub fn evaluate_checklist(
    snapshot: &FundamentalsSnapshot,
    valuation: &ValuationResult,
    category: LynchCategory,
) -> ChecklistEvaluation {
    let mut eval = ChecklistEvaluation {
        checklist_items: category.checklist().iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    };

    let price_change = snapshot.price_change_percent;

    match category {
        LynchCategory::SlowGrower => {
            if snapshot.dividend_yield.is_some_and(|dy| dy > 2.0) {
                eval.meets("Good dividend yield (>2%)", 1.0);
            } else {
                eval.attention("Dividend yield could be higher");
            }

            if valuation.debt_to_equity.is_some_and(|de| de < 0.8) {
                eval.meets("Reasonable debt levels", 1.0);
            } else {
                eval.attention("Monitor debt levels");
            }
        }
        LynchCategory::Stalwart => {
            if let (Some(pe), Some(growth)) = (valuation.pe_ratio, snapshot.earnings_growth_pct()) {
                if pe < growth * 1.5 {
                    eval.meets("Good P/E ratio relative to growth", 1.0);
                } else {
                    eval.attention("P/E ratio may be too high relative to growth");
                }
            }

            if price_change.is_some_and(|c| c < -10.0) {
                eval.meets(
                    "Currently experiencing a temporary setback (potential buying opportunity)",
                    1.0,
                );
            }
        }
        LynchCategory::FastGrower => {
            if let Some(revenue_growth) = snapshot.revenue_growth {
                if revenue_growth > 25.0 {
                    eval.meets("Exceptional revenue growth (>25%)", 1.5);
                } else if revenue_growth > 20.0 {
                    eval.meets("Strong revenue growth (>20%)", 1.0);
                } else if revenue_growth > 15.0 {
                    eval.meets("Good revenue growth (>15%)", 0.5);
                } else {
                    eval.attention("Revenue growth may be insufficient for a Fast Grower");
                }
            }

            if let Some(peg) = valuation.peg_ratio {
                if peg < 0.8 {
                    eval.meets("Excellent PEG ratio (<0.8)", 1.5);
                } else if peg < 1.2 {
                    eval.meets("Attractive PEG ratio (<1.2)", 1.0);
                } else if peg < 1.5 {
                    eval.meets("Acceptable PEG ratio (<1.5)", 0.5);
                } else {
                    eval.attention("PEG ratio may be too high for growth rate");
                }
            }

            if is_one_of(&snapshot.industry, EXPANSION_INDUSTRIES) {
                eval.meets("Industry with strong expansion potential", 0.5);
            }
        }
        LynchCategory::Cyclical => {
            if let Some(pe) = valuation.pe_ratio {
                if pe < 8.0 {
                    eval.meets("Very low P/E ratio (strong buying opportunity)", 1.5);
                } else if pe < 12.0 {
                    eval.meets("Low P/E ratio (potential buying opportunity)", 1.0);
                } else if pe > 25.0 {
                    eval.attention("Very high P/E ratio (consider taking profits)");
                } else if pe > 18.0 {
                    eval.attention("High P/E ratio (approaching peak valuation)");
                }
            }

            if let Some(change) = price_change {
                if change < -30.0 {
                    eval.meets("Significant downturn (strong buying opportunity)", 1.5);
                } else if change < -20.0 {
                    eval.meets("Currently in a downturn (potential buying opportunity)", 1.0);
                } else if change > 50.0 {
                    eval.attention("Significant upturn (consider taking profits)");
                }
            }

            if is_one_of(&snapshot.industry, CONFIRMED_CYCLICAL_INDUSTRIES) {
                let industry = snapshot.industry.as_deref().unwrap_or_default();
                eval.meets(format!("Confirmed cyclical industry: {}", industry), 0.5);
            }
        }
        LynchCategory::Turnaround => {
            if let Some(de) = valuation.debt_to_equity {
                if de < 2.0 {
                    eval.meets("Manageable debt level for recovery", 1.0);
                } else {
                    eval.attention("High debt level may impede recovery");
                }
            }

            if price_change.is_some_and(|c| c > 10.0) {
                eval.meets("Shows signs of recovery in share price", 1.0);
            }
        }
        LynchCategory::AssetPlay => {
            if let Some(pb) = valuation.price_to_book {
                if pb < 1.0 {
                    eval.meets("Trading below book value", 1.0);
                } else if pb < 1.3 {
                    eval.meets("Trading at reasonable price-to-book ratio", 0.5);
                } else {
                    eval.attention("Price to book ratio may be too high for an Asset Play");
                }
            }

            if let Some(ratio) = valuation.assets_to_ev {
                if ratio > 1.2 {
                    eval.meets("Assets worth more than enterprise value", 1.0);
                } else if ratio > 0.8 {
                    eval.meets("Assets represent significant portion of enterprise value", 0.5);
                } else {
                    eval.attention("Enterprise value significantly higher than asset value");
                }
            }

            if is_one_of(&snapshot.sector, HARD_ASSET_SECTORS) {
                eval.meets("Operates in sector likely to have valuable physical assets", 0.5);
            }
        }
        LynchCategory::Unknown => {}
    }

    eval.overall_score = eval.overall_score.min(MAX_CHECKLIST_SCORE);
    eval
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::score;

    fn classify(snapshot: &FundamentalsSnapshot) -> LynchAnalysis {
        categorize(snapshot, &score(snapshot))
    }

    fn base() -> FundamentalsSnapshot {
        FundamentalsSnapshot {
            symbol: "TEST".to_string(),
            current_price: Some(50.0),
            book_value_per_share: Some(20.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_asset_play_wins_over_everything() {
        let mut snapshot = base();
        snapshot.book_value_per_share = Some(62.5); // P/B 0.8
        snapshot.market_cap = Some(500e9);
        snapshot.earnings_growth = Some(0.35);
        snapshot.price_change_percent = Some(-50.0);
        snapshot.industry = Some("Steel".to_string());

        let analysis = classify(&snapshot);
        assert_eq!(analysis.category, LynchCategory::AssetPlay);
        assert_eq!(analysis.key_metrics[0], "Price-to-Book: 0.80");
        assert_eq!(analysis.key_metrics[1], "Assets to Enterprise Value: N/A");
        assert_eq!(analysis.recommendations.len(), 4);
    }

    #[test]
    fn test_asset_play_from_assets_to_ev() {
        let mut snapshot = base();
        snapshot.market_cap = Some(1_000.0);
        snapshot.total_debt = Some(200.0);
        snapshot.cash = Some(200.0);
        snapshot.total_assets = Some(1_300.0);
        assert_eq!(classify(&snapshot).category, LynchCategory::AssetPlay);
    }

    #[test]
    fn test_turnaround() {
        let mut snapshot = base();
        snapshot.price_change_percent = Some(-35.0);
        snapshot.market_cap = Some(1_000.0);
        snapshot.total_debt = Some(0.0);
        snapshot.cash = Some(0.0);
        snapshot.total_assets = Some(1_200.0); // exactly 1.2, not above

        let analysis = classify(&snapshot);
        assert_eq!(analysis.category, LynchCategory::Turnaround);
        assert_eq!(analysis.key_metrics[0], "1-Year Price Change: -35.00%");
    }

    #[test]
    fn test_cyclical_by_industry_and_sector() {
        let mut snapshot = base();
        snapshot.industry = Some("Oil & Gas E&P".to_string());
        assert_eq!(classify(&snapshot).category, LynchCategory::Cyclical);

        let mut snapshot = base();
        snapshot.sector = Some("Basic Materials".to_string());
        let analysis = classify(&snapshot);
        assert_eq!(analysis.category, LynchCategory::Cyclical);
        assert_eq!(analysis.key_metrics[0], "Industry: N/A");
    }

    #[test]
    fn test_non_cyclical_industry_is_not_cyclical() {
        let mut snapshot = base();
        snapshot.industry = Some("Software".to_string());
        snapshot.sector = Some("Technology".to_string());
        assert_eq!(classify(&snapshot).category, LynchCategory::Unknown);
    }

    #[test]
    fn test_slow_grower() {
        let mut snapshot = base();
        snapshot.market_cap = Some(120e9);
        snapshot.earnings_growth = Some(0.08);

        let analysis = classify(&snapshot);
        assert_eq!(analysis.category, LynchCategory::SlowGrower);
        assert_eq!(analysis.key_metrics[1], "Growth Rate: 8.00%");
    }

    #[test]
    fn test_stalwart_by_growth() {
        let mut snapshot = base();
        snapshot.market_cap = Some(20e9);
        snapshot.earnings_growth = Some(0.15);

        let analysis = classify(&snapshot);
        assert_eq!(analysis.category, LynchCategory::Stalwart);
        assert!(analysis.description.contains("moderate growth"));
    }

    #[test]
    fn test_fast_grower() {
        let mut snapshot = base();
        snapshot.market_cap = Some(2e9);
        snapshot.earnings_growth = Some(0.45);
        assert_eq!(classify(&snapshot).category, LynchCategory::FastGrower);
    }

    #[test]
    fn test_large_cap_fallback_is_stalwart() {
        let mut snapshot = base();
        snapshot.market_cap = Some(60e9);

        let analysis = classify(&snapshot);
        assert_eq!(analysis.category, LynchCategory::Stalwart);
        assert_eq!(analysis.description, "Large, established companies with solid financials");
    }

    #[test]
    fn test_unknown_uses_general_checklist() {
        let analysis = classify(&base());
        assert_eq!(analysis.category, LynchCategory::Unknown);
        assert!(analysis.key_metrics.is_empty());
        assert_eq!(analysis.recommendations, GENERAL_CHECKLIST.iter().map(|s| s.to_string()).collect::<Vec<_>>());
    }

    #[test]
    fn test_rules_are_ordered_by_priority() {
        let order: Vec<LynchCategory> = CATEGORY_RULES.iter().map(|r| r.category).collect();
        assert_eq!(
            order,
            vec![
                LynchCategory::AssetPlay,
                LynchCategory::Turnaround,
                LynchCategory::Cyclical,
                LynchCategory::SlowGrower,
                LynchCategory::Stalwart,
                LynchCategory::FastGrower,
                LynchCategory::Stalwart,
            ]
        );
    }

    #[test]
    fn test_evaluate_fast_grower_scores() {
        let mut snapshot = base();
        snapshot.revenue_growth = Some(30.0);
        snapshot.industry = Some("Technology".to_string());
        let mut valuation = score(&snapshot);
        valuation.peg_ratio = Some(0.7);

        let eval = evaluate_checklist(&snapshot, &valuation, LynchCategory::FastGrower);
        assert_eq!(eval.meets_criteria.len(), 3);
        assert!((eval.overall_score - 3.5).abs() < 1e-9);
        assert_eq!(eval.checklist_items.len(), 4);
    }

    #[test]
    fn test_evaluate_cyclical_scores() {
        let mut snapshot = base();
        snapshot.price_change_percent = Some(-40.0);
        snapshot.industry = Some("Steel".to_string());
        let mut valuation = score(&snapshot);
        valuation.pe_ratio = Some(5.0);

        let eval = evaluate_checklist(&snapshot, &valuation, LynchCategory::Cyclical);
        assert!((eval.overall_score - 3.5).abs() < 1e-9);
        assert!(eval.meets_criteria.contains(&"Confirmed cyclical industry: Steel".to_string()));
        assert!(eval.needs_attention.is_empty());
    }

    #[test]
    fn test_evaluate_slow_grower_needs_attention() {
        let snapshot = base();
        let valuation = score(&snapshot);
        let eval = evaluate_checklist(&snapshot, &valuation, LynchCategory::SlowGrower);
        assert_eq!(eval.overall_score, 0.0);
        assert_eq!(eval.needs_attention.len(), 2);
    }

    #[test]
    fn test_evaluate_stalwart_uses_percent_growth() {
        let mut snapshot = base();
        snapshot.earnings_growth = Some(0.15);
        snapshot.price_change_percent = Some(-12.0);
        let mut valuation = score(&snapshot);
        valuation.pe_ratio = Some(18.0); // below 15 * 1.5

        let eval = evaluate_checklist(&snapshot, &valuation, LynchCategory::Stalwart);
        assert_eq!(eval.meets_criteria.len(), 2);
        assert_eq!(eval.overall_score, 2.0);
    }

    #[test]
    fn test_evaluate_asset_play() {
        let mut snapshot = base();
        snapshot.sector = Some("Real Estate".to_string());
        let mut valuation = score(&snapshot);
        valuation.price_to_book = Some(0.9);
        valuation.assets_to_ev = Some(0.5);

        let eval = evaluate_checklist(&snapshot, &valuation, LynchCategory::AssetPlay);
        assert!((eval.overall_score - 1.5).abs() < 1e-9);
        assert_eq!(
            eval.needs_attention,
            vec!["Enterprise value significantly higher than asset value".to_string()]
        );
    }
}
