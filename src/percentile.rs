//! Rank-based percentile estimation with linear interpolation.
//!
//! For a sample of `N` sorted values, percentile `P` sits at the 1-based
//! rank `R = P / 100 * N + 0.5`. Ranks at or below 1 clamp to the smallest
//! value, ranks at or above `N` clamp to the largest, integral ranks select
//! that element directly and fractional ranks interpolate between the two
//! neighbouring elements.

use crate::error::{Error, Result};

/// Returns the value at percentile `p` of `sizes`.
///
/// `sizes` does not need to be sorted. A private sorted copy is made, so the
/// caller's slice is left untouched. When several percentiles are needed from
/// the same sample, sort once and use [`percentile_of_sorted`] instead.
pub fn percentile_value(sizes: &[u64], p: f64) -> Result<f64> {
    let mut sorted = sizes.to_vec();
    sorted.sort_unstable();
    percentile_of_sorted(&sorted, p)
}

/// Same as [`percentile_value`] but requires `sorted` to be in ascending order.
pub fn percentile_of_sorted(sorted: &[u64], p: f64) -> Result<f64> {
    if !(0.0..100.0).contains(&p) {
        return Err(Error::InvalidPercentile(p));
    }
    let (first, last) = match (sorted.first(), sorted.last()) {
        (Some(first), Some(last)) => (*first as f64, *last as f64),
        _ => return Err(Error::EmptySample),
    };
    debug_assert!(sorted.windows(2).all(|w| w[0] <= w[1]));

    let n = sorted.len() as f64;
    let rank = p / 100.0 * n + 0.5;

    if rank <= 1.0 {
        return Ok(first);
    }
    if rank >= n {
        return Ok(last);
    }
    if rank.fract() == 0.0 {
        return Ok(sorted[rank as usize - 1] as f64);
    }

    // 1 < rank < N, so both neighbours exist.
    let k = rank.floor() as usize;
    let pk = 100.0 / n * (k as f64 - 0.5);
    let lower = sorted[k - 1] as f64;
    let upper = sorted[k] as f64;
    Ok(lower + n * (p - pk) / 100.0 * (upper - lower))
}
