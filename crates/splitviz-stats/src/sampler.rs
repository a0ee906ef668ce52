//! Largest-remainder rounding of proportions to a fixed sample size.
//!
//! # Invariant
//!
//! `allocate(p, n).iter().sum() == n` for every `n` and every `p`,
//! including empty-mass and all-zero vectors.
//!
//! # Algorithm (Hare quota)
//!
//! 1. `raw = pᵢ · n`, base allocation `⌊raw⌋`.
//! 2. Order groups by fractional remainder, descending; ties keep the
//!    original group order.
//! 3. Hand out the shortfall one unit at a time in that order, wrapping
//!    around if the shortfall exceeds the group count (proportions that
//!    sum to less than 1).
//!
//! Negative and NaN proportions count as 0. A vector summing above 1 is
//! rescaled to sum to 1 first.

/// Integer counts per group summing exactly to `n`.
#[must_use]
pub fn allocate(proportions: &[f64], n: u32) -> Vec<u32> {
    let len = proportions.len();
    if len == 0 {
        return Vec::new();
    }

    let clean: Vec<f64> = proportions
        .iter()
        .map(|&p| if p.is_finite() && p > 0.0 { p } else { 0.0 })
        .collect();
    let mass: f64 = clean.iter().sum();
    let scale = if mass > 1.0 { 1.0 / mass } else { 1.0 };

    let target = f64::from(n);
    let mut counts = Vec::with_capacity(len);
    let mut remainders = Vec::with_capacity(len);
    for &p in &clean {
        let raw = p * scale * target;
        let floor = raw.floor();
        counts.push(floor as u32);
        remainders.push(raw - floor);
    }

    let mut order: Vec<usize> = (0..len).collect();
    order.sort_by(|&a, &b| remainders[b].total_cmp(&remainders[a]));

    let assigned: u64 = counts.iter().map(|&c| u64::from(c)).sum();
    let n64 = u64::from(n);
    if assigned < n64 {
        let shortfall = (n64 - assigned) as usize;
        for &i in order.iter().cycle().take(shortfall) {
            counts[i] += 1;
        }
    } else {
        // Float error can push the floors past n; trim from the smallest
        // remainders.
        let mut excess = assigned - n64;
        for &i in order.iter().rev().cycle() {
            if excess == 0 {
                break;
            }
            if counts[i] > 0 {
                counts[i] -= 1;
                excess -= 1;
            }
        }
    }
    counts
}
