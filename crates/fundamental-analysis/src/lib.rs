//! Fundamental valuation of a single company snapshot: Magic Formula and
//! Graham metrics, balance-sheet ratios with rating bands, and Peter Lynch's
//! category cascade with its per-category checklist.

pub mod lynch;
pub mod ratings;
pub mod valuation;

pub use lynch::{categorize, evaluate_checklist, ChecklistEvaluation, LynchAnalysis, LynchCategory};
pub use ratings::{Bands, Rating};
pub use valuation::{score, BuyDecision, ValuationRatings, ValuationResult, ValuationScorer};
