//! Trailing-window reductions over optional values.
//!
//! Output has the same length as the input. Position `i` holds the reduction
//! of `values[i + 1 - period..=i]`, or `None` when the window is incomplete
//! (`i + 1 < period`) or contains a missing or non-finite value.

pub fn rolling_window<F>(values: &[Option<f64>], period: usize, reduce: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    if period == 0 || period > values.len() {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let mut window = Vec::with_capacity(period);

    for i in 0..values.len() {
        if i + 1 < period {
            out.push(None);
            continue;
        }

        window.clear();
        for value in &values[i + 1 - period..=i] {
            match value {
                Some(v) if v.is_finite() => window.push(*v),
                _ => break,
            }
        }

        let reduced = (window.len() == period)
            .then(|| reduce(&window))
            .filter(|v| v.is_finite());
        out.push(reduced);
    }

    out
}

pub fn rolling_min(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling_window(values, period, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

pub fn rolling_max(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling_window(values, period, |w| w.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

pub fn rolling_mean(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling_window(values, period, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Lift a plain slice into the optional form used by the rolling helpers.
pub fn present(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().map(|v| Some(*v)).collect()
}
