//! Shared arithmetic contracts: rounding, safe division, and rank-based quantiles.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to 2 decimal places, midpoint away from zero. All money and percentage
/// fields go through this before they are emitted.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round to 1 decimal place (discount_pct only).
pub fn round1(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Division that never fails: a zero denominator yields zero, including `0 / 0`.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// `numerator / denominator` as a percentage, safe-divided and rounded to 2 decimals.
pub fn pct(numerator: Decimal, denominator: Decimal) -> Decimal {
    round2(safe_div(numerator, denominator) * Decimal::ONE_HUNDRED)
}

/// Nearest-rank percentile. `p` is in `(0, 100]`. Returns `None` on an empty slice.
pub fn percentile(values: &[Decimal], p: f64) -> Option<Decimal> {
    if values.is_empty() || p <= 0.0 || p > 100.0 {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort();
    let n = sorted.len();
    let rank = ((p / 100.0) * n as f64).ceil() as usize;
    Some(sorted[rank.clamp(1, n) - 1])
}

/// Rank-based quantile scores in `1..=bands`, one per input in input order.
///
/// Ties are broken by input position, so callers get deterministic scores by
/// presenting values in a stable order (e.g. sorted by customer id).
pub fn rank_band_scores(values: &[Decimal], bands: u32) -> Vec<u32> {
    let n = values.len();
    if n == 0 || bands == 0 {
        return Vec::new();
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].cmp(&values[b]).then(a.cmp(&b)));

    let mut scores = vec![0u32; n];
    for (rank, &i) in order.iter().enumerate() {
        let band = (rank as u64 * u64::from(bands) / n as u64) as u32 + 1;
        scores[i] = band.min(bands);
    }
    scores
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{pct, percentile, rank_band_scores, round2, safe_div};

    fn dec(value: i64, scale: u32) -> Decimal {
        Decimal::new(value, scale)
    }

    #[test]
    fn safe_div_returns_zero_for_zero_denominator() {
        assert_eq!(safe_div(dec(500, 2), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(safe_div(Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
        assert_eq!(safe_div(dec(-700, 2), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn safe_div_divides_when_denominator_nonzero() {
        assert_eq!(safe_div(dec(1500, 2), dec(300, 2)), Decimal::from(5));
    }

    #[test]
    fn round2_is_midpoint_away_from_zero() {
        assert_eq!(round2(dec(12345, 3)), dec(1235, 2));
        assert_eq!(round2(dec(-12345, 3)), dec(-1235, 2));
    }

    #[test]
    fn pct_handles_zero_denominator() {
        assert_eq!(pct(dec(100, 2), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(pct(Decimal::from(1), Decimal::from(4)), dec(2500, 2));
    }

    #[test]
    fn percentile_nearest_rank() {
        let values: Vec<Decimal> = (1..=100).map(Decimal::from).collect();
        assert_eq!(percentile(&values, 99.0), Some(Decimal::from(99)));
        assert_eq!(percentile(&values, 100.0), Some(Decimal::from(100)));
        assert_eq!(percentile(&values, 0.0), None);
        assert_eq!(percentile(&values, 100.5), None);
        assert_eq!(percentile(&[], 99.0), None);
    }

    #[test]
    fn rank_bands_split_evenly() {
        let values: Vec<Decimal> = (1..=8).map(Decimal::from).collect();
        assert_eq!(rank_band_scores(&values, 4), vec![1, 1, 2, 2, 3, 3, 4, 4]);
    }

    #[test]
    fn rank_bands_break_ties_by_position() {
        let values: Vec<Decimal> = vec![Decimal::ONE; 4];
        assert_eq!(rank_band_scores(&values, 4), vec![1, 2, 3, 4]);
    }

    #[test]
    fn rank_bands_cap_at_band_count() {
        let values: Vec<Decimal> = (1..=5).map(Decimal::from).collect();
        let scores = rank_band_scores(&values, 4);
        assert_eq!(scores.len(), 5);
        assert!(scores.iter().all(|&s| (1..=4).contains(&s)));
    }
}
