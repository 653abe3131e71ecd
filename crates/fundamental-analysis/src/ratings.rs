pub use analysis_core::Rating;

/// Three cut-offs splitting a metric into Strong / Good / Fair / Weak.
/// Comparisons are strict on both orientations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub cutoffs: [f64; 3],
    pub higher_is_better: bool,
}

impl Bands {
    pub const fn higher_is_better(cutoffs: [f64; 3]) -> Self {
        Self { cutoffs, higher_is_better: true }
    }

    pub const fn lower_is_better(cutoffs: [f64; 3]) -> Self {
        Self { cutoffs, higher_is_better: false }
    }

    pub fn rate(&self, value: Option<f64>) -> Rating {
        let Some(v) = value else {
            return Rating::NotRated;
        };
        let passes = |cutoff: f64| if self.higher_is_better { v > cutoff } else { v < cutoff };
        if passes(self.cutoffs[0]) {
            Rating::Strong
        } else if passes(self.cutoffs[1]) {
            Rating::Good
        } else if passes(self.cutoffs[2]) {
            Rating::Fair
        } else {
            Rating::Weak
        }
    }
}

/// Graham upside in percent: deep value above 50, overvalued at or below 0.
pub const GRAHAM_UPSIDE_BANDS: Bands = Bands::higher_is_better([50.0, 20.0, 0.0]);
pub const PRICE_TO_BOOK_BANDS: Bands = Bands::lower_is_better([1.0, 1.5, 2.5]);
pub const CURRENT_RATIO_BANDS: Bands = Bands::higher_is_better([2.0, 1.5, 1.0]);
pub const DEBT_TO_EQUITY_BANDS: Bands = Bands::lower_is_better([0.3, 0.5, 1.0]);
