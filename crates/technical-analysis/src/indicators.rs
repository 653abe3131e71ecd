use statrs::statistics::Statistics;

/// Rolling mean aligned with the input: entry `i` covers `data[i+1-period..=i]`
/// and is `None` during warm-up or when the window holds an undefined value.
pub fn rolling_mean(data: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling(data, period, |window| window.iter().sum::<f64>() / period as f64)
}

/// Rolling sample standard deviation aligned with the input.
pub fn rolling_std(data: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period < 2 {
        return vec![None; data.len()];
    }
    rolling(data, period, |window| window.std_dev())
}

fn rolling<F>(data: &[Option<f64>], period: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    let mut result = vec![None; data.len()];
    if period == 0 || data.len() < period {
        return result;
    }

    let mut window = Vec::with_capacity(period);
    for i in period - 1..data.len() {
        window.clear();
        window.extend(data[i + 1 - period..=i].iter().map_while(|v| *v));
        if window.len() == period {
            let value = f(&window);
            if value.is_finite() {
                result[i] = Some(value);
            }
        }
    }
    result
}

/// Fractional change over `periods` bars: `data[i] / data[i - periods] - 1`.
/// Undefined during warm-up and where the result is not finite.
pub fn pct_change(data: &[f64], periods: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; data.len()];
    if periods == 0 {
        return result;
    }
    for i in periods..data.len() {
        let change = data[i] / data[i - periods] - 1.0;
        if change.is_finite() {
            result[i] = Some(change);
        }
    }
    result
}

/// Wrap a fully-defined series so it can feed the rolling helpers.
pub fn defined(data: &[f64]) -> Vec<Option<f64>> {
    data.iter().map(|v| Some(*v)).collect()
}

/// Running maximum of the series.
pub fn cumulative_max(data: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    data.iter()
        .map(|&v| {
            peak = peak.max(v);
            peak
        })
        .collect()
}

/// Percent decline from the running peak at every bar (0 at new highs, negative otherwise).
pub fn drawdown_series(data: &[f64]) -> Vec<f64> {
    cumulative_max(data)
        .iter()
        .zip(data.iter())
        .map(|(peak, price)| (price / peak - 1.0) * 100.0)
        .collect()
}

/// Bar indices where `fast` crosses above `slow`: `fast > slow` now and
/// `fast <= slow` on the previous bar, with all four values defined.
pub fn crossovers_above(fast: &[Option<f64>], slow: &[Option<f64>]) -> Vec<bool> {
    crossings(fast, slow, |f, s| f > s, |f, s| f <= s)
}

/// Bar indices where `fast` crosses below `slow`.
pub fn crossovers_below(fast: &[Option<f64>], slow: &[Option<f64>]) -> Vec<bool> {
    crossings(fast, slow, |f, s| f < s, |f, s| f >= s)
}

fn crossings<N, P>(fast: &[Option<f64>], slow: &[Option<f64>], now: N, prev: P) -> Vec<bool>
where
    N: Fn(f64, f64) -> bool,
    P: Fn(f64, f64) -> bool,
{
    let n = fast.len().min(slow.len());
    let mut flags = vec![false; n];
    for i in 1..n {
        if let (Some(f), Some(s), Some(pf), Some(ps)) = (fast[i], slow[i], fast[i - 1], slow[i - 1]) {
            flags[i] = now(f, s) && prev(pf, ps);
        }
    }
    flags
}
