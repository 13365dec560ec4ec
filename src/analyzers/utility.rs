use std::collections::HashMap;
use std::hash::Hash;

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Computes the `q`-th quantile (0.0–1.0) of a **sorted** slice with linear
/// interpolation between neighbouring values. Returns `None` for empty input.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    match sorted.len() {
        0 => None,
        1 => Some(sorted[0]),
        len => {
            let rank = q.clamp(0.0, 1.0) * (len as f64 - 1.0);
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as f64;
            Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
        }
    }
}

/// Percentile rank of `score` within `values`: the average of the share of
/// values strictly below and the share at or below, counting a tie as one
/// extra step. Returns `None` for empty input.
pub fn percentile_of_score(values: &[f64], score: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let left = values.iter().filter(|&&v| v < score).count();
    let right = values.iter().filter(|&&v| v <= score).count();
    let tie = usize::from(left < right);
    Some((left + right + tie) as f64 * 50.0 / values.len() as f64)
}

/// Counts occurrences and orders by count descending, ties by first appearance.
pub fn rank_by_count<K, I>(items: I) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut ranked: Vec<(K, usize)> = Vec::new();

    for item in items {
        match index.get(&item) {
            Some(&i) => ranked[i].1 += 1,
            None => {
                index.insert(item.clone(), ranked.len());
                ranked.push((item, 1));
            }
        }
    }

    // stable: equal counts stay in first-seen order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 2.0, 6.0]), 3.0);
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        let sorted = [0.0, 0.0, 1.0, 3.0, 10.0];
        assert_eq!(quantile(&sorted, 0.25), Some(0.0));
        assert_eq!(quantile(&sorted, 0.5), Some(1.0));
        assert_eq!(quantile(&sorted, 0.75), Some(3.0));

        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.25), Some(1.75));
        assert_eq!(quantile(&sorted, 0.5), Some(2.5));
        assert_eq!(quantile(&sorted, 0.75), Some(3.25));
    }

    #[test]
    fn test_quantile_degenerate_inputs() {
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&[7.0], 0.25), Some(7.0));
        assert_eq!(quantile(&[7.0], 0.75), Some(7.0));
    }

    #[test]
    fn test_percentile_of_score() {
        let values = [1.0, 2.0, 3.0, 4.0];
        // (2 + 3 + 1) * 50 / 4
        assert_eq!(percentile_of_score(&values, 3.0), Some(75.0));
        // not present: (2 + 2) * 50 / 4
        assert_eq!(percentile_of_score(&values, 2.5), Some(50.0));
        assert_eq!(percentile_of_score(&values, 10.0), Some(100.0));
        assert_eq!(percentile_of_score(&[], 1.0), None);
    }

    #[test]
    fn test_rank_by_count_ties_keep_first_seen_order() {
        let ranked = rank_by_count(["b", "a", "c", "a", "c", "d"]);
        assert_eq!(ranked, vec![("a", 2), ("c", 2), ("b", 1), ("d", 1)]);
    }
}
