//! Small numeric helpers shared by the matrix builders

/// Percentile of a sample, `p` in `(0, 1]`.
///
/// Uses the `p·(n+1)` position with linear interpolation between the two
/// neighbouring order statistics, clamped to the sample range. Returns
/// `None` for an empty sample or an out-of-range `p`.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if !(p > 0.0 && p <= 1.0) || values.is_empty() {
        return None;
    }
    if values.len() == 1 {
        return Some(values[0]);
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len() as f64;
    let pos = p * (n + 1.0);
    if pos < 1.0 {
        return Some(sorted[0]);
    }
    if pos >= n {
        return Some(sorted[sorted.len() - 1]);
    }

    let lower_idx = pos.floor() as usize;
    let dif = pos - pos.floor();
    let lower = sorted[lower_idx - 1];
    let upper = sorted[lower_idx];
    Some(lower + dif * (upper - lower))
}
