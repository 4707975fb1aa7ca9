use std::collections::BTreeMap;

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Quantile `q` (0.0–1.0) with linear interpolation between closest ranks.
/// Returns `None` for empty input.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Groups `items` by key and collects their values, keys in sorted order.
pub fn group_values<T, K, FK, FV>(items: &[T], key: FK, value: FV) -> BTreeMap<K, Vec<f64>>
where
    K: Ord,
    FK: Fn(&T) -> Option<K>,
    FV: Fn(&T) -> f64,
{
    let mut groups: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for item in items {
        if let Some(k) = key(item) {
            groups.entry(k).or_default().push(value(item));
        }
    }
    groups
}

/// Mean value per group, keys in sorted order.
pub fn group_mean<T, K, FK, FV>(items: &[T], key: FK, value: FV) -> Vec<(K, f64)>
where
    K: Ord,
    FK: Fn(&T) -> Option<K>,
    FV: Fn(&T) -> f64,
{
    group_values(items, key, value)
        .into_iter()
        .map(|(k, v)| (k, mean(&v)))
        .collect()
}

/// Sorts by value, highest first, and keeps the first `n`. Ties keep their order.
pub fn top_n<K>(mut pairs: Vec<(K, f64)>, n: usize) -> Vec<(K, f64)> {
    pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
    pairs.truncate(n);
    pairs
}

/// Sorts by value, lowest first, and keeps the first `n`. Ties keep their order.
pub fn bottom_n<K>(mut pairs: Vec<(K, f64)>, n: usize) -> Vec<(K, f64)> {
    pairs.sort_by(|a, b| a.1.total_cmp(&b.1));
    pairs.truncate(n);
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[1.0, 2.0, 6.0]), 3.0);
    }

    #[test]
    fn test_quantile_interpolates() {
        let values = [10.0, 1.0, 4.0, 7.0];
        assert_eq!(quantile(&values, 0.0), Some(1.0));
        assert_eq!(quantile(&values, 1.0), Some(10.0));
        assert_eq!(quantile(&values, 0.5), Some(5.5));
        assert!((quantile(&values, 0.05).unwrap() - 1.45).abs() < 1e-9);
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_group_mean_skips_missing_keys() {
        let items = [("a", 1.0), ("b", 4.0), ("", 100.0), ("a", 3.0)];
        let means = group_mean(
            &items,
            |(k, _)| (!k.is_empty()).then_some(*k),
            |(_, v)| *v,
        );
        assert_eq!(means, vec![("a", 2.0), ("b", 4.0)]);
    }

    #[test]
    fn test_top_and_bottom_n() {
        let pairs = vec![("a", 2.0), ("b", 5.0), ("c", 1.0), ("d", 3.0)];
        assert_eq!(top_n(pairs.clone(), 2), vec![("b", 5.0), ("d", 3.0)]);
        assert_eq!(bottom_n(pairs, 3), vec![("c", 1.0), ("a", 2.0), ("d", 3.0)]);
    }
}
