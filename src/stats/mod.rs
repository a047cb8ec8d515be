//! Descriptive statistics and group-by aggregations over table columns.
//!
//! Missing cells are skipped everywhere, matching the `skipna` defaults of
//! the dataframe tooling the input files come from.

pub mod distribution;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::data::model::Value;

/// Quantiles reported next to `describe` for payment amounts.
pub const PERCENTILES: [f64; 7] = [0.1, 0.25, 0.5, 0.75, 0.9, 0.95, 0.99];

// ---------------------------------------------------------------------------
// describe
// ---------------------------------------------------------------------------

/// Summary of a numeric series: the rows of a Pandas `describe()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

impl Describe {
    pub const LABELS: [&'static str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

    /// Summarise present values. An empty input gives `count == 0` and NaN elsewhere.
    pub fn compute(values: &[f64]) -> Self {
        let sorted = sorted(values);
        let count = sorted.len();
        Describe {
            count,
            mean: mean(&sorted),
            std: std_dev(&sorted),
            min: sorted.first().copied().unwrap_or(f64::NAN),
            q25: quantile_sorted(&sorted, 0.25),
            q50: quantile_sorted(&sorted, 0.5),
            q75: quantile_sorted(&sorted, 0.75),
            max: sorted.last().copied().unwrap_or(f64::NAN),
        }
    }

    /// `(label, value)` pairs in display order.
    pub fn rows(&self) -> [(&'static str, f64); 8] {
        let values = [
            self.count as f64,
            self.mean,
            self.std,
            self.min,
            self.q25,
            self.q50,
            self.q75,
            self.max,
        ];
        std::array::from_fn(|i| (Self::LABELS[i], values[i]))
    }
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    v.sort_by(f64::total_cmp);
    v
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Quantile of an ascending slice, linearly interpolated between closest ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Quantiles of unsorted values at each requested level.
pub fn quantiles(values: &[f64], levels: &[f64]) -> Vec<(f64, f64)> {
    let sorted = sorted(values);
    levels
        .iter()
        .map(|&q| (q, quantile_sorted(&sorted, q)))
        .collect()
}

/// Pearson correlation over pairs where both sides are present.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    sxy / (sxx * syy).sqrt()
}

// ---------------------------------------------------------------------------
// Counting and grouping
// ---------------------------------------------------------------------------

/// Frequency of each present value, most frequent first.
/// Equal counts keep the order in which values were first seen.
pub fn value_counts(values: &[Value]) -> Vec<(Value, usize)> {
    let mut index: HashMap<&Value, usize> = HashMap::new();
    let mut counts: Vec<(Value, usize)> = Vec::new();
    for v in values.iter().filter(|v| !v.is_null()) {
        match index.get(v) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(v, counts.len());
                counts.push((v.clone(), 1));
            }
        }
    }
    // `sort_by` is stable, so first-seen order survives among ties.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Frequency of each present value, ordered by value.
pub fn counts_by_key(values: &[Value]) -> Vec<(Value, usize)> {
    let mut counts: BTreeMap<&Value, usize> = BTreeMap::new();
    for v in values.iter().filter(|v| !v.is_null()) {
        *counts.entry(v).or_default() += 1;
    }
    counts.into_iter().map(|(k, c)| (k.clone(), c)).collect()
}

/// Mean of `values` per key, keys ascending. Rows with a missing key are
/// dropped; a group with no present values has a NaN mean.
pub fn group_mean(keys: &[Value], values: &[Option<f64>]) -> Vec<(Value, f64)> {
    let mut groups: BTreeMap<&Value, (f64, usize)> = BTreeMap::new();
    for (k, v) in keys.iter().zip(values) {
        if k.is_null() {
            continue;
        }
        let entry = groups.entry(k).or_insert((0.0, 0));
        if let Some(v) = v {
            entry.0 += v;
            entry.1 += 1;
        }
    }
    groups
        .into_iter()
        .map(|(k, (sum, n))| (k.clone(), if n == 0 { f64::NAN } else { sum / n as f64 }))
        .collect()
}

/// Number of distinct present `members` per key, keys ascending.
pub fn group_nunique(keys: &[Value], members: &[Value]) -> Vec<(Value, usize)> {
    let mut groups: BTreeMap<&Value, BTreeSet<&Value>> = BTreeMap::new();
    for (k, m) in keys.iter().zip(members) {
        if k.is_null() {
            continue;
        }
        let set = groups.entry(k).or_default();
        if !m.is_null() {
            set.insert(m);
        }
    }
    groups.into_iter().map(|(k, s)| (k.clone(), s.len())).collect()
}

/// Per-row group size: every row gets the number of rows sharing its key.
/// Rows with a missing key get `None`.
pub fn broadcast_count(keys: &[Value]) -> Vec<Option<f64>> {
    let mut counts: HashMap<&Value, usize> = HashMap::new();
    for k in keys.iter().filter(|k| !k.is_null()) {
        *counts.entry(k).or_default() += 1;
    }
    keys.iter()
        .map(|k| counts.get(k).map(|&c| c as f64))
        .collect()
}

/// Per-row group sum of `values`; missing values count as zero.
pub fn broadcast_sum(keys: &[Value], values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut sums: HashMap<&Value, f64> = HashMap::new();
    for (k, v) in keys.iter().zip(values) {
        if !k.is_null() {
            *sums.entry(k).or_default() += v.unwrap_or(0.0);
        }
    }
    keys.iter().map(|k| sums.get(k).copied()).collect()
}

/// Row indices of the `n` largest present values, largest first; ties keep row order.
pub fn nlargest(values: &[Option<f64>], n: usize) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..values.len()).filter(|&i| values[i].is_some()).collect();
    idx.sort_by(|&a, &b| {
        let (a, b) = (values[a].unwrap_or(f64::NAN), values[b].unwrap_or(f64::NAN));
        b.total_cmp(&a)
    });
    idx.truncate(n);
    idx
}

#[cfg(test)]
mod tests;
