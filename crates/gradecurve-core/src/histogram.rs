//! Keyed weighted histograms and the merge/normalize steps.
//!
//! Buckets are keyed by label (a [`GradeCode`] or a [`GpaValue`]) rather than
//! by position. Merging adds weights key by key with a default of zero, so two
//! inputs that list their buckets in different orders, or that omit empty
//! buckets, still produce correct sums.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::scale::{GpaValue, GradeCode, GradeScale};

/// Tolerance used when checking that a normalized histogram sums to one.
pub const NORMALIZATION_TOLERANCE: f64 = 1e-6;

/// A weighted histogram over ordered bucket keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram<K: Ord> {
    buckets: BTreeMap<K, f64>,
}

/// Histogram over letter-grade codes.
pub type GradeHistogram = Histogram<GradeCode>;

/// Histogram over GPA bucket values.
pub type GpaHistogram = Histogram<GpaValue>;

impl<K: Ord + Clone + fmt::Display> Histogram<K> {
    pub fn new() -> Self {
        Self {
            buckets: BTreeMap::new(),
        }
    }

    /// Build a histogram from `(bucket, weight)` pairs.
    ///
    /// A bucket listed twice, or a weight that is negative or not finite, is
    /// rejected: either would skew every sum the histogram is merged into.
    pub fn from_pairs<I>(pairs: I, context: &str) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = (K, f64)>,
    {
        let mut buckets = BTreeMap::new();
        for (key, weight) in pairs {
            if !weight.is_finite() || weight < 0.0 {
                return Err(EngineError::malformed(
                    context,
                    format!("bucket {key} has invalid weight {weight}"),
                ));
            }
            let label = key.to_string();
            if buckets.insert(key, weight).is_some() {
                return Err(EngineError::malformed(
                    context,
                    format!("bucket {label} appears more than once"),
                ));
            }
        }
        Ok(Self { buckets })
    }

    /// Weight of a bucket; zero when the bucket is absent.
    pub fn get(&self, key: &K) -> f64 {
        self.buckets.get(key).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> {
        self.buckets.iter().map(|(k, w)| (k, *w))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.buckets.values().sum()
    }

    /// Add `weight × other` into this histogram, bucket by bucket.
    pub fn add_weighted(&mut self, other: &Self, weight: f64) {
        for (key, w) in &other.buckets {
            *self.buckets.entry(key.clone()).or_insert(0.0) += w * weight;
        }
    }

    /// Divide every bucket by the total so the weights sum to one.
    ///
    /// A histogram with a zero total is returned unchanged.
    pub fn normalized(&self) -> Self {
        let total = self.total();
        if total <= 0.0 {
            return self.clone();
        }
        Self {
            buckets: self
                .buckets
                .iter()
                .map(|(k, w)| (k.clone(), w / total))
                .collect(),
        }
    }

    pub fn is_normalized(&self) -> bool {
        (self.total() - 1.0).abs() <= NORMALIZATION_TOLERANCE
    }
}

impl<K: Ord + Clone + fmt::Display> Default for Histogram<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl GpaHistogram {
    /// Build a GPA histogram from raw `(gpa, weight)` pairs.
    pub fn from_gpa_pairs(pairs: &[(f64, f64)], context: &str) -> Result<Self, EngineError> {
        let mut raw_by_key: BTreeMap<GpaValue, f64> = BTreeMap::new();
        let mut keyed = Vec::with_capacity(pairs.len());
        for &(gpa, weight) in pairs {
            let value = GpaValue::new(gpa).ok_or_else(|| {
                EngineError::malformed(context, format!("GPA bucket {gpa} outside [0, 4]"))
            })?;
            if let Some(earlier) = raw_by_key.insert(value, gpa) {
                if earlier != gpa {
                    return Err(EngineError::malformed(
                        context,
                        format!("GPA buckets {earlier} and {gpa} both round to {value}"),
                    ));
                }
            }
            keyed.push((value, weight));
        }
        Self::from_pairs(keyed, context)
    }

    /// The histogram as an ascending `(value, weight)` distribution.
    pub fn distribution(&self) -> Vec<(f64, f64)> {
        self.iter().map(|(k, w)| (k.as_f64(), w)).collect()
    }

    /// Σ(bucket value × weight). Meaningful once the histogram is normalized.
    pub fn weighted_mean(&self) -> f64 {
        self.iter().map(|(k, w)| k.as_f64() * w).sum()
    }
}

impl GradeHistogram {
    /// Weights as percentages, rounded to one decimal place.
    pub fn percentages(&self) -> Vec<(GradeCode, f64)> {
        let total = self.total();
        self.iter()
            .map(|(k, w)| {
                let pct = if total > 0.0 { w / total * 100.0 } else { 0.0 };
                (k.clone(), (pct * 10.0).round() / 10.0)
            })
            .collect()
    }
}

/// Fold `next` into an accumulator.
///
/// The first call for a group (`accumulator == None`) starts from a weighted
/// copy of `next`; later calls add `weight × next` key by key.
pub fn merge<K: Ord + Clone + fmt::Display>(
    accumulator: Option<Histogram<K>>,
    next: &Histogram<K>,
    weight: f64,
) -> Result<Histogram<K>, EngineError> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(EngineError::InvalidWeight(weight));
    }
    let mut acc = accumulator.unwrap_or_default();
    acc.add_weighted(next, weight);
    Ok(acc)
}

/// Normalize a histogram so its weights sum to one (no-op on a zero total).
pub fn normalize<K: Ord + Clone + fmt::Display>(histogram: &Histogram<K>) -> Histogram<K> {
    histogram.normalized()
}

/// Map a letter-grade histogram onto quality-point buckets.
///
/// Codes with no quality points are dropped. Letters sharing a value (A+ and
/// A, or E, F and IF) land in the same bucket.
pub fn derive_gpa_histogram(grades: &GradeHistogram, scale: &GradeScale) -> GpaHistogram {
    let mut buckets = BTreeMap::new();
    for (code, weight) in grades.iter() {
        let Some(value) = scale.points_for(code.as_str()).and_then(GpaValue::new) else {
            continue;
        };
        *buckets.entry(value).or_insert(0.0) += weight;
    }
    Histogram { buckets }
}

impl<K: Ord + Serialize> Serialize for Histogram<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.buckets.iter())
    }
}

impl<'de, K> Deserialize<'de> for Histogram<K>
where
    K: Ord + Clone + fmt::Display + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pairs = Vec::<(K, f64)>::deserialize(deserializer)?;
        Self::from_pairs(pairs, "deserialized histogram").map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grades(pairs: &[(&str, f64)]) -> GradeHistogram {
        GradeHistogram::from_pairs(
            pairs.iter().map(|(k, w)| (GradeCode::from(*k), *w)),
            "test",
        )
        .unwrap()
    }

    #[test]
    fn merge_is_keyed_not_positional() {
        let a = grades(&[("A", 10.0), ("B", 5.0)]);
        let b = grades(&[("B", 1.0), ("C", 4.0), ("A", 2.0)]);

        let acc = merge(None, &a, 1.0).unwrap();
        let acc = merge(Some(acc), &b, 1.0).unwrap();

        assert_eq!(acc.get(&"A".into()), 12.0);
        assert_eq!(acc.get(&"B".into()), 6.0);
        assert_eq!(acc.get(&"C".into()), 4.0);
        assert_eq!(acc.len(), 3);
    }

    #[test]
    fn merge_applies_weight() {
        let fractions = grades(&[("A", 0.5), ("B", 0.5)]);
        let acc = merge(None, &fractions, 30.0).unwrap();
        let acc = merge(Some(acc), &fractions, 10.0).unwrap();
        assert_eq!(acc.get(&"A".into()), 20.0);
        assert_eq!(acc.total(), 40.0);
    }

    #[test]
    fn merge_rejects_bad_weight() {
        let h = grades(&[("A", 1.0)]);
        assert_eq!(merge(None, &h, -1.0), Err(EngineError::InvalidWeight(-1.0)));
        assert!(merge(None, &h, f64::NAN).is_err());
    }

    #[test]
    fn duplicate_bucket_is_malformed() {
        let result = GradeHistogram::from_pairs(
            vec![(GradeCode::from("A"), 1.0), (GradeCode::from("a"), 2.0)],
            "CS 18000 section 1",
        );
        let err = result.unwrap_err();
        assert!(err.is_data_error());
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn negative_weight_is_malformed() {
        let result = GradeHistogram::from_pairs(vec![(GradeCode::from("B"), -3.0)], "x");
        assert!(result.is_err());
    }

    #[test]
    fn gpa_bucket_out_of_range_is_malformed() {
        assert!(GpaHistogram::from_gpa_pairs(&[(4.3, 1.0)], "x").is_err());
        assert!(GpaHistogram::from_gpa_pairs(&[(3.3, 1.0), (4.0, 2.0)], "x").is_ok());
    }

    #[test]
    fn gpa_buckets_rounding_together_are_malformed() {
        let err = GpaHistogram::from_gpa_pairs(&[(3.333, 1.0), (3.334, 1.0)], "x").unwrap_err();
        assert!(err.to_string().contains("both round to 3.33"));

        let h = GpaHistogram::from_gpa_pairs(&[(3.667, 2.0)], "x").unwrap();
        assert_eq!(h.distribution(), vec![(3.67, 2.0)]);
    }

    #[test]
    fn deserialize_rejects_duplicate_bucket() {
        let err = serde_json::from_str::<GradeHistogram>(r#"[["A",5.0],["A",1.0]]"#).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn deserialize_rejects_negative_weight() {
        assert!(serde_json::from_str::<GradeHistogram>(r#"[["B",-3.0]]"#).is_err());
        assert!(serde_json::from_str::<GpaHistogram>(r#"[[4.0,1.0],[3.0,-0.5]]"#).is_err());
    }

    #[test]
    fn normalize_sums_to_one() {
        let h = grades(&[("A", 3.0), ("B", 1.0)]).normalized();
        assert!(h.is_normalized());
        assert!((h.get(&"A".into()) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn normalize_zero_total_is_noop() {
        let h = grades(&[("A", 0.0), ("B", 0.0)]);
        assert_eq!(normalize(&h), h);
        let empty = GpaHistogram::new();
        assert!(normalize(&empty).is_empty());
    }

    #[test]
    fn derive_gpa_drops_non_gpa_codes() {
        let h = grades(&[("A+", 1.0), ("A", 2.0), ("W", 5.0), ("F", 1.0), ("IF", 1.0)]);
        let gpa = derive_gpa_histogram(&h, &GradeScale::standard());
        assert_eq!(gpa.len(), 2);
        assert_eq!(gpa.get(&GpaValue::new(4.0).unwrap()), 3.0);
        assert_eq!(gpa.get(&GpaValue::new(0.0).unwrap()), 2.0);
    }

    #[test]
    fn weighted_mean_of_normalized_gpa() {
        let gpa = GpaHistogram::from_gpa_pairs(&[(2.0, 1.0), (4.0, 1.0)], "x")
            .unwrap()
            .normalized();
        assert!((gpa.weighted_mean() - 3.0).abs() < 1e-12);
        assert_eq!(gpa.distribution(), vec![(2.0, 0.5), (4.0, 0.5)]);
    }

    #[test]
    fn percentages_round_to_one_decimal() {
        let h = grades(&[("A", 1.0), ("B", 2.0)]);
        let pct = h.percentages();
        assert_eq!(pct[0], (GradeCode::from("A"), 33.3));
        assert_eq!(pct[1], (GradeCode::from("B"), 66.7));
    }

    #[test]
    fn serializes_as_ordered_pairs() {
        let h = grades(&[("B", 2.0), ("A", 1.0)]);
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, r#"[["A",1.0],["B",2.0]]"#);
        let back: GradeHistogram = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }

    fn letter() -> impl Strategy<Value = &'static str> {
        prop::sample::select(vec!["A", "A-", "B+", "B", "C", "D", "F", "W", "P"])
    }

    fn arb_grades() -> impl Strategy<Value = GradeHistogram> {
        prop::collection::btree_map(letter(), 0.0f64..100.0, 1..8).prop_map(|m| {
            GradeHistogram::from_pairs(m.into_iter().map(|(k, w)| (GradeCode::from(k), w)), "p")
                .unwrap()
        })
    }

    proptest! {
        #[test]
        fn normalized_histograms_sum_to_one(h in arb_grades()) {
            let n = h.normalized();
            if h.total() > 0.0 {
                prop_assert!((n.total() - 1.0).abs() <= NORMALIZATION_TOLERANCE);
            } else {
                prop_assert_eq!(n, h);
            }
        }

        #[test]
        fn merge_is_commutative(h1 in arb_grades(), h2 in arb_grades()) {
            let forward = merge(Some(merge(None, &h1, 1.0).unwrap()), &h2, 1.0).unwrap().normalized();
            let backward = merge(Some(merge(None, &h2, 1.0).unwrap()), &h1, 1.0).unwrap().normalized();
            for (key, w) in forward.iter() {
                prop_assert!((w - backward.get(key)).abs() <= 1e-9);
            }
            prop_assert_eq!(forward.len(), backward.len());
        }
    }
}
