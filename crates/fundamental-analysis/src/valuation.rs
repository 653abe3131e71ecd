use std::fmt;

use analysis_core::{growth_to_pct, FundamentalsSnapshot};
use serde::{Deserialize, Serialize};

use crate::ratings::*;

/// AAA corporate bond yield assumed by the Graham formula, in percent.
pub const AAA_YIELD: f64 = 4.5;
/// Graham's P/E for a no-growth company.
pub const GRAHAM_BASE_PE: f64 = 8.5;
/// Growth rate cap (percent) applied before the Graham formula.
pub const GRAHAM_GROWTH_CAP: f64 = 15.0;
/// Growth assumed when the snapshot carries none.
pub const DEFAULT_EARNINGS_GROWTH: f64 = 0.05;
/// After-tax share of EBIT used when estimating EPS.
pub const EBIT_TO_EARNINGS: f64 = 0.7;
/// Floor on dividend yield when comparing it to earnings yield.
pub const DIVIDEND_YIELD_FLOOR: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuyDecision {
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    Buy,
    Hold,
    #[serde(rename = "Not Buy")]
    NotBuy,
    #[serde(rename = "Insufficient Data")]
    InsufficientData,
}

impl BuyDecision {
    /// Rule table over earnings yield and return on capital (both percent).
    /// Both above 40 is treated as a likely data trap rather than a bargain.
    pub fn from_metrics(earnings_yield: Option<f64>, return_on_capital: Option<f64>) -> Self {
        let (Some(ey), Some(roc)) = (earnings_yield, return_on_capital) else {
            return BuyDecision::InsufficientData;
        };
        if ey > 40.0 && roc > 40.0 {
            BuyDecision::NotBuy
        } else if ey > 12.0 && roc > 15.0 {
            BuyDecision::StrongBuy
        } else if ey > 4.0 && roc > 8.0 {
            BuyDecision::Buy
        } else if ey > 4.0 || roc > 8.0 {
            BuyDecision::Hold
        } else {
            BuyDecision::NotBuy
        }
    }

    pub fn to_label(&self) -> &'static str {
        match self {
            BuyDecision::StrongBuy => "Strong Buy",
            BuyDecision::Buy => "Buy",
            BuyDecision::Hold => "Hold",
            BuyDecision::NotBuy => "Not Buy",
            BuyDecision::InsufficientData => "Insufficient Data",
        }
    }

    pub fn rating(&self) -> Rating {
        match self {
            BuyDecision::StrongBuy => Rating::Strong,
            BuyDecision::Buy => Rating::Good,
            BuyDecision::Hold => Rating::Fair,
            BuyDecision::NotBuy => Rating::Weak,
            BuyDecision::InsufficientData => Rating::NotRated,
        }
    }
}

impl fmt::Display for BuyDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationRatings {
    pub graham_upside: Rating,
    pub price_to_book: Rating,
    pub current_ratio: Rating,
    pub debt_to_equity: Rating,
    pub decision: Rating,
}

/// Valuation metrics for one snapshot. Percent-valued fields are in percent
/// units; any metric whose inputs are missing is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub enterprise_value: Option<f64>,
    pub earnings_yield: Option<f64>,
    pub invested_capital: Option<f64>,
    pub return_on_capital: Option<f64>,
    pub magic_score: Option<f64>,
    pub traditional_earnings_yield: Option<f64>,
    pub alpha_spreads_score: Option<f64>,
    pub graham_value: Option<f64>,
    pub graham_upside: Option<f64>,
    pub price_to_book: Option<f64>,
    pub current_ratio: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub assets_to_ev: Option<f64>,
    pub buy_decision: BuyDecision,
    pub ratings: ValuationRatings,
}

/// Magic Formula, Graham and balance-sheet ratios over a fundamentals snapshot.
pub struct ValuationScorer;

impl ValuationScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, snapshot: &FundamentalsSnapshot) -> ValuationResult {
        let enterprise_value = self.calculate_enterprise_value(snapshot);
        let earnings_yield = self.calculate_earnings_yield(snapshot.ebit, enterprise_value);
        let invested_capital = self.calculate_invested_capital(snapshot);
        let return_on_capital = self.calculate_return_on_capital(snapshot.ebit, invested_capital);

        let magic_score = match (earnings_yield, return_on_capital) {
            (Some(ey), Some(roc)) => Some(ey / 2.0 + roc / 2.0),
            _ => None,
        };

        let traditional_earnings_yield = match (snapshot.net_income, snapshot.market_cap) {
            (Some(net_income), Some(mc)) if mc > 0.0 => Some(net_income / mc * 100.0),
            _ => None,
        };

        let alpha_spreads_score = self.calculate_alpha_spreads(earnings_yield, snapshot.dividend_yield);

        let graham_value = self.calculate_graham_value(snapshot);
        let graham_upside = match (graham_value, snapshot.current_price) {
            (Some(value), Some(price)) if price > 0.0 => Some((value / price - 1.0) * 100.0),
            _ => None,
        };

        let price_to_book = match (nonzero(snapshot.current_price), snapshot.book_value_per_share) {
            (Some(price), Some(bvps)) if bvps > 0.0 => Some(price / bvps),
            _ => None,
        };

        let current_ratio = match (nonzero(snapshot.current_assets), snapshot.current_liabilities) {
            (Some(assets), Some(liabilities)) if liabilities > 0.0 => Some(assets / liabilities),
            _ => None,
        };

        let debt_to_equity = match (snapshot.total_debt, snapshot.total_equity) {
            (Some(debt), Some(equity)) if equity > 0.0 => Some(debt / equity),
            _ => None,
        };

        let pe_ratio = match (snapshot.current_price, nonzero(snapshot.trailing_eps)) {
            (Some(price), Some(eps)) => Some(price / eps),
            _ => None,
        };

        let peg_ratio = match (pe_ratio, nonzero(snapshot.earnings_growth)) {
            (Some(pe), Some(growth)) => Some(pe / growth_to_pct(growth)),
            _ => None,
        };

        let assets_to_ev = match (snapshot.total_assets, enterprise_value) {
            (Some(assets), Some(ev)) if ev > 0.0 => Some(assets / ev),
            _ => None,
        };

        let buy_decision = BuyDecision::from_metrics(earnings_yield, return_on_capital);

        ValuationResult {
            enterprise_value,
            earnings_yield,
            invested_capital,
            return_on_capital,
            magic_score,
            traditional_earnings_yield,
            alpha_spreads_score,
            graham_value,
            graham_upside,
            price_to_book,
            current_ratio,
            debt_to_equity,
            pe_ratio,
            peg_ratio,
            assets_to_ev,
            buy_decision,
            ratings: ValuationRatings {
                graham_upside: GRAHAM_UPSIDE_BANDS.rate(graham_upside),
                price_to_book: PRICE_TO_BOOK_BANDS.rate(price_to_book),
                current_ratio: CURRENT_RATIO_BANDS.rate(current_ratio),
                debt_to_equity: DEBT_TO_EQUITY_BANDS.rate(debt_to_equity),
                decision: buy_decision.rating(),
            },
        }
    }

    fn calculate_enterprise_value(&self, snapshot: &FundamentalsSnapshot) -> Option<f64> {
        match (snapshot.market_cap, snapshot.total_debt, snapshot.cash) {
            (Some(mc), Some(debt), Some(cash)) => Some(mc + debt - cash),
            _ => None,
        }
    }

    fn calculate_earnings_yield(&self, ebit: Option<f64>, enterprise_value: Option<f64>) -> Option<f64> {
        match (ebit, nonzero(enterprise_value)) {
            (Some(ebit), Some(ev)) => Some(ebit / ev * 100.0),
            _ => None,
        }
    }

    /// Total assets minus current liabilities, else net fixed assets plus
    /// working capital, else whichever of those two is available. Zero
    /// components count as missing in the fallbacks.
    fn calculate_invested_capital(&self, snapshot: &FundamentalsSnapshot) -> Option<f64> {
        if let (Some(assets), Some(liabilities)) = (snapshot.total_assets, snapshot.current_liabilities) {
            let capital = assets - liabilities;
            tracing::debug!(
                "Invested capital for {}: total assets {} - current liabilities {} = {}",
                snapshot.symbol, assets, liabilities, capital
            );
            return Some(capital);
        }

        match (nonzero(snapshot.net_fixed_assets), nonzero(snapshot.working_capital())) {
            (Some(nfa), Some(nwc)) => Some(nfa + nwc),
            (Some(nfa), None) => Some(nfa),
            (None, Some(nwc)) => Some(nwc),
            (None, None) => {
                tracing::debug!("Invested capital unavailable for {}", snapshot.symbol);
                None
            }
        }
    }

    fn calculate_return_on_capital(&self, ebit: Option<f64>, invested_capital: Option<f64>) -> Option<f64> {
        match (ebit, nonzero(invested_capital)) {
            (Some(ebit), Some(capital)) => Some(ebit / capital * 100.0),
            _ => None,
        }
    }

    fn calculate_alpha_spreads(&self, earnings_yield: Option<f64>, dividend_yield: Option<f64>) -> Option<f64> {
        let (Some(ey), Some(dy)) = (earnings_yield, dividend_yield) else {
            return None;
        };
        let ratio = ey / dy.max(DIVIDEND_YIELD_FLOOR);
        if ratio > 3.0 {
            Some((ratio * 10.0).min(100.0))
        } else {
            Some(ratio * 20.0)
        }
    }

    /// Graham intrinsic value `EPS * (8.5 + 2g/100) * 4.4 / Y`, with growth in
    /// percent capped at 15. Uses trailing EPS when present, otherwise an
    /// estimate of after-tax EBIT per share.
    fn calculate_graham_value(&self, snapshot: &FundamentalsSnapshot) -> Option<f64> {
        let price = snapshot.current_price.filter(|p| *p > 0.0)?;

        let eps = match snapshot.trailing_eps {
            Some(eps) => eps,
            None => {
                let ebit = snapshot.ebit?;
                let market_cap = snapshot.market_cap.filter(|mc| *mc > 0.0)?;
                let shares_outstanding = market_cap / price;
                ebit * EBIT_TO_EARNINGS / shares_outstanding
            }
        };

        let growth_pct = growth_to_pct(snapshot.earnings_growth.unwrap_or(DEFAULT_EARNINGS_GROWTH))
            .min(GRAHAM_GROWTH_CAP);

        Some(eps * (GRAHAM_BASE_PE + 2.0 * (growth_pct / 100.0)) * 4.4 / AAA_YIELD)
    }
}

impl Default for ValuationScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Score a snapshot with the default scorer.
pub fn score(snapshot: &FundamentalsSnapshot) -> ValuationResult {
    ValuationScorer::new().score(snapshot)
}

fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}
