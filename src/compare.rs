//! Reference-vs-candidate listing comparison.
//!
//! The reference dataset drives the comparison: every reference listing is
//! looked up by URL in the candidate dataset and its tracked fields are
//! checked for strict equality. Candidate-only listings are not part of the
//! result; see [`extra_in_candidate`].

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::listing::{Dataset, Listing};

/// Outcome of comparing a reference dataset against a candidate.
///
/// `matched + mismatched == total` always holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub total: usize,
    pub matched: usize,
    pub mismatched: usize,
    pub details: Vec<String>,
}

/// A tracked field value, rendered the way it appears in detail lines.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FieldValue {
    Int(Option<i64>),
    Float(Option<f64>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(Some(v)) => write!(f, "{v}"),
            FieldValue::Float(Some(v)) => write!(f, "{v:?}"),
            FieldValue::Int(None) | FieldValue::Float(None) => write!(f, "null"),
        }
    }
}

fn tracked_fields(listing: &Listing) -> [(&'static str, FieldValue); 4] {
    [
        ("floor", FieldValue::Int(listing.floor)),
        ("price", FieldValue::Int(listing.price)),
        ("total_meters", FieldValue::Float(listing.total_meters)),
        ("rooms_count", FieldValue::Int(listing.rooms_count)),
    ]
}

/// Compares every reference listing against the candidate listing with the
/// same URL.
pub fn compare(reference: &Dataset, candidate: &Dataset) -> ComparisonResult {
    let candidates = candidate.index_by_url();
    let mut result = ComparisonResult::default();

    for expected in reference.iter() {
        result.total += 1;

        let Some(found) = candidates.get(expected.url.as_str()) else {
            result.details.push(format!("[not found] {}", expected.url));
            result.mismatched += 1;
            continue;
        };

        let differences: Vec<String> = tracked_fields(expected)
            .into_iter()
            .zip(tracked_fields(found))
            .filter(|((_, want), (_, got))| want != got)
            .map(|((field, want), (_, got))| format!("{field}: reference={want}, found={got}"))
            .collect();

        if differences.is_empty() {
            result.matched += 1;
        } else {
            result.details.push(format!(
                "[mismatch] {}:\n    {}",
                expected.url,
                differences.join("\n    ")
            ));
            result.mismatched += 1;
        }
    }

    result
}

/// URLs present in the candidate but absent from the reference, in candidate
/// order without repeats.
pub fn extra_in_candidate<'a>(reference: &Dataset, candidate: &'a Dataset) -> Vec<&'a str> {
    let known = reference.index_by_url();
    let mut seen = HashSet::new();

    candidate
        .iter()
        .map(|l| l.url.as_str())
        .filter(|url| !known.contains_key(url) && seen.insert(*url))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(url: &str, floor: i64, price: i64, meters: f64, rooms: i64) -> Listing {
        Listing {
            url: url.to_string(),
            floor: Some(floor),
            price: Some(price),
            total_meters: Some(meters),
            rooms_count: Some(rooms),
        }
    }

    fn dataset(listings: Vec<Listing>) -> Dataset {
        Dataset::new(listings)
    }

    #[test]
    fn test_identical_datasets_match() {
        let r = dataset(vec![
            listing("a", 2, 100, 50.0, 1),
            listing("b", 7, 250, 71.4, 3),
        ]);

        let result = compare(&r, &r);

        assert_eq!(result.total, 2);
        assert_eq!(result.matched, 2);
        assert_eq!(result.mismatched, 0);
        assert!(result.details.is_empty());
    }

    #[test]
    fn test_single_field_mismatch() {
        let r = dataset(vec![listing("a", 2, 100, 50.0, 1)]);
        let c = dataset(vec![listing("a", 3, 100, 50.0, 1)]);

        let result = compare(&r, &c);

        assert_eq!((result.total, result.matched, result.mismatched), (1, 0, 1));
        assert_eq!(result.details.len(), 1);
        assert!(result.details[0].contains("floor: reference=2, found=3"));
        assert!(!result.details[0].contains("price"));
        assert!(!result.details[0].contains("total_meters"));
    }

    #[test]
    fn test_missing_listing_reported_as_not_found() {
        let r = dataset(vec![listing("b", 1, 1, 1.0, 1)]);
        let c = dataset(vec![]);

        let result = compare(&r, &c);

        assert_eq!((result.total, result.matched, result.mismatched), (1, 0, 1));
        assert_eq!(result.details, vec!["[not found] b".to_string()]);
    }

    #[test]
    fn test_both_null_fields_are_equal() {
        let r = dataset(vec![Listing {
            url: "a".into(),
            ..Default::default()
        }]);
        let c = r.clone();

        let result = compare(&r, &c);

        assert_eq!(result.matched, 1);
        assert!(result.details.is_empty());
    }

    #[test]
    fn test_null_against_value_is_a_mismatch() {
        let r = dataset(vec![listing("a", 2, 100, 50.0, 1)]);
        let mut found = listing("a", 2, 100, 50.0, 1);
        found.price = None;
        let c = dataset(vec![found]);

        let result = compare(&r, &c);

        assert_eq!(result.mismatched, 1);
        assert!(result.details[0].contains("price: reference=100, found=null"));
    }

    #[test]
    fn test_float_compared_without_tolerance() {
        let r = dataset(vec![listing("a", 2, 100, 50.0, 1)]);
        let c = dataset(vec![listing("a", 2, 100, 50.000001, 1)]);

        let result = compare(&r, &c);

        assert_eq!(result.mismatched, 1);
        assert!(result.details[0].contains("total_meters: reference=50.0, found=50.000001"));
    }

    #[test]
    fn test_multiple_differences_in_one_detail() {
        let r = dataset(vec![listing("a", 2, 100, 50.0, 1)]);
        let c = dataset(vec![listing("a", 3, 120, 50.0, 2)]);

        let result = compare(&r, &c);

        assert_eq!(result.details.len(), 1);
        let detail = &result.details[0];
        assert!(detail.starts_with("[mismatch] a:"));
        assert!(detail.contains("floor: reference=2, found=3"));
        assert!(detail.contains("price: reference=100, found=120"));
        assert!(detail.contains("rooms_count: reference=1, found=2"));
    }

    #[test]
    fn test_details_follow_reference_order() {
        let r = dataset(vec![
            listing("z", 1, 1, 1.0, 1),
            listing("m", 1, 1, 1.0, 1),
            listing("a", 1, 1, 1.0, 1),
        ]);
        let c = dataset(vec![listing("m", 9, 1, 1.0, 1)]);

        let result = compare(&r, &c);

        assert_eq!(result.details.len(), 3);
        assert!(result.details[0].contains(" z"));
        assert!(result.details[1].contains(" m:"));
        assert!(result.details[2].contains(" a"));
    }

    #[test]
    fn test_candidate_duplicates_use_last_occurrence() {
        let r = dataset(vec![listing("a", 2, 100, 50.0, 1)]);
        let c = dataset(vec![
            listing("a", 9, 999, 9.0, 9),
            listing("a", 2, 100, 50.0, 1),
        ]);

        assert_eq!(compare(&r, &c).matched, 1);
    }

    #[test]
    fn test_candidate_only_listings_are_ignored() {
        let r = dataset(vec![listing("a", 2, 100, 50.0, 1)]);
        let c = dataset(vec![
            listing("a", 2, 100, 50.0, 1),
            listing("extra", 1, 1, 1.0, 1),
        ]);

        let result = compare(&r, &c);

        assert_eq!((result.total, result.matched, result.mismatched), (1, 1, 0));
        assert_eq!(extra_in_candidate(&r, &c), vec!["extra"]);
    }

    #[test]
    fn test_counts_always_add_up() {
        let r = dataset(vec![
            listing("a", 1, 1, 1.0, 1),
            listing("b", 1, 1, 1.0, 1),
            listing("c", 1, 1, 1.0, 1),
            listing("d", 1, 1, 1.0, 1),
        ]);
        let c = dataset(vec![listing("a", 1, 1, 1.0, 1), listing("c", 2, 1, 1.0, 1)]);

        let result = compare(&r, &c);

        assert_eq!(result.total, r.len());
        assert_eq!(result.matched + result.mismatched, result.total);
    }
}
