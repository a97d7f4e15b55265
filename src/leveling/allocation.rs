//! Largest Remainder (Hamilton) apportionment.
//!
//! Splits an integer total across weighted shares so the parts sum to the total exactly.

/// Normalize raw weights to fractions summing to 1.
///
/// Negative and non-finite weights count as 0. When every weight is 0 the split is even.
pub fn normalize_weights(weights: &[f64]) -> Vec<f64> {
    if weights.is_empty() {
        return Vec::new();
    }
    let cleaned: Vec<f64> = weights
        .iter()
        .map(|w| if w.is_finite() && *w > 0.0 { *w } else { 0.0 })
        .collect();
    let largest = cleaned.iter().copied().fold(0.0, f64::max);
    if largest <= 0.0 {
        let even = 1.0 / cleaned.len() as f64;
        return vec![even; cleaned.len()];
    }
    // Scale to the largest weight first so the sum cannot overflow to infinity.
    let scaled: Vec<f64> = cleaned.iter().map(|w| w / largest).collect();
    let total: f64 = scaled.iter().sum();
    scaled.iter().map(|w| w / total).collect()
}

/// Largest total the apportionment stays exact for; `f64` holds every integer up to 2^53.
pub const MAX_EXACT_TOTAL: u64 = 1 << 53;

/// Apportion `total` across `weights` with the Largest Remainder Method.
///
/// Each part gets the floor of its exact share; leftover units go one each to the
/// largest fractional remainders, ties resolved by position. The result always has
/// `weights.len()` entries summing to `total` (empty input yields an empty vec).
pub fn largest_remainder(total: u64, weights: &[f64]) -> Vec<u64> {
    let shares = normalize_weights(weights);
    if shares.is_empty() {
        return Vec::new();
    }

    let mut parts = Vec::with_capacity(shares.len());
    let mut remainders = Vec::with_capacity(shares.len());
    for share in &shares {
        let exact = total as f64 * share;
        let floor = exact.floor();
        parts.push(floor as u64);
        remainders.push(exact - floor);
    }

    // Floors saturate near u64::MAX, so sum in u128.
    let assigned: u128 = parts.iter().map(|p| u128::from(*p)).sum();
    let total_wide = u128::from(total);
    if assigned > total_wide {
        // Float error pushed a floor over; trim from the smallest remainders.
        let mut order: Vec<usize> = (0..parts.len()).collect();
        order.sort_by(|a, b| remainders[*a].total_cmp(&remainders[*b]));
        let mut excess = assigned - total_wide;
        for index in order.into_iter().cycle() {
            if excess == 0 {
                break;
            }
            if parts[index] > 0 {
                parts[index] -= 1;
                excess -= 1;
            }
        }
        return parts;
    }

    let leftover = (total_wide - assigned) as usize;
    // Stable sort keeps input order among equal remainders.
    let mut order: Vec<usize> = (0..parts.len()).collect();
    order.sort_by(|a, b| remainders[*b].total_cmp(&remainders[*a]));
    for index in order.iter().cycle().take(leftover) {
        parts[*index] += 1;
    }
    parts
}
