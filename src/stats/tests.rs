use anyhow::Result;

use super::distribution::{Bins, BoxStats, Histogram};
use super::*;
use crate::data::model::Value;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

#[test]
fn test_describe_matches_sample_statistics() {
    let d = Describe::compute(&[5.0, 1.0, 4.0, 2.0, 3.0]);

    assert_eq!(d.count, 5);
    assert!(close(d.mean, 3.0));
    assert!(close(d.std, 2.5_f64.sqrt()));
    assert!(close(d.min, 1.0));
    assert!(close(d.q25, 2.0));
    assert!(close(d.q50, 3.0));
    assert!(close(d.q75, 4.0));
    assert!(close(d.max, 5.0));
    assert_eq!(d.rows()[4].0, "25%");
}

#[test]
fn test_describe_of_empty_and_single_values() {
    let empty = Describe::compute(&[]);
    assert_eq!(empty.count, 0);
    assert!(empty.mean.is_nan());
    assert!(empty.max.is_nan());

    let single = Describe::compute(&[7.0]);
    assert_eq!(single.count, 1);
    assert!(close(single.mean, 7.0));
    assert!(single.std.is_nan());
    assert!(close(single.q75, 7.0));
}

#[test]
fn test_quantiles_interpolate_linearly() {
    let q = quantiles(&[4.0, 1.0, 3.0, 2.0], &[0.1, 0.5, 0.99]);

    assert!(close(q[0].1, 1.3));
    assert!(close(q[1].1, 2.5));
    assert!(close(q[2].1, 3.97));
}

#[test]
fn test_value_counts_orders_by_count_then_first_seen() {
    let values = [text("b"), text("a"), Value::Null, text("b"), text("a"), text("c")];

    let counts = value_counts(&values);

    assert_eq!(counts, vec![(text("b"), 2), (text("a"), 2), (text("c"), 1)]);
}

#[test]
fn test_counts_by_key_sorts_keys() {
    let values = [Value::Integer(3), Value::Integer(1), Value::Integer(3), Value::Integer(2)];

    let counts = counts_by_key(&values);

    assert_eq!(
        counts,
        vec![(Value::Integer(1), 1), (Value::Integer(2), 1), (Value::Integer(3), 2)]
    );
}

#[test]
fn test_group_mean_drops_missing_keys() {
    let keys = [Value::Integer(2), Value::Integer(1), Value::Integer(1), Value::Null];
    let values = [Some(30.0), Some(10.0), Some(20.0), Some(40.0)];

    let means = group_mean(&keys, &values);

    assert_eq!(means.len(), 2);
    assert_eq!(means[0].0, Value::Integer(1));
    assert!(close(means[0].1, 15.0));
    assert_eq!(means[1].0, Value::Integer(2));
    assert!(close(means[1].1, 30.0));
}

#[test]
fn test_group_mean_of_group_without_values_is_nan() {
    let means = group_mean(&[Value::Integer(1)], &[None]);
    assert!(means[0].1.is_nan());
}

#[test]
fn test_group_nunique_counts_distinct_members() {
    let weeks = [
        Value::Integer(1),
        Value::Integer(0),
        Value::Integer(0),
        Value::Integer(1),
        Value::Integer(1),
    ];
    let users = [text("A"), text("A"), text("A"), text("B"), Value::Null];

    let active = group_nunique(&weeks, &users);

    assert_eq!(active, vec![(Value::Integer(0), 1), (Value::Integer(1), 2)]);
}

#[test]
fn test_broadcast_aggregates_per_row() {
    let users = [text("A"), text("B"), text("A"), Value::Null];
    let amounts = [Some(10.0), Some(5.0), None, Some(1.0)];

    assert_eq!(broadcast_count(&users), vec![Some(2.0), Some(1.0), Some(2.0), None]);
    assert_eq!(
        broadcast_sum(&users, &amounts),
        vec![Some(10.0), Some(5.0), Some(10.0), None]
    );
}

#[test]
fn test_nlargest_keeps_ties_in_row_order() {
    let values = [Some(5.0), None, Some(7.0), Some(5.0), Some(1.0)];

    assert_eq!(nlargest(&values, 2), vec![2, 0]);
    assert_eq!(nlargest(&values, 3), vec![2, 0, 3]);
    assert_eq!(nlargest(&values, 10).len(), 4);
}

#[test]
fn test_pearson_correlation() {
    let x = [Some(1.0), Some(2.0), Some(3.0), None];
    let y = [Some(3.0), Some(5.0), Some(7.0), Some(100.0)];
    assert!(close(pearson(&x, &y), 1.0));

    let inverse = [Some(3.0), Some(2.0), Some(1.0), None];
    assert!(close(pearson(&x, &inverse), -1.0));

    assert!(pearson(&[Some(1.0)], &[Some(2.0)]).is_nan());
}

#[test]
fn test_histogram_with_fixed_bins() {
    let h = Histogram::compute(&[0.0, 1.0, 2.0, 3.0, 4.0], Bins::Count(4));

    assert_eq!(h.edges, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    // The last bucket is closed on the right.
    assert_eq!(h.counts, vec![1, 1, 1, 2]);
    assert!(close(h.bin_width(), 1.0));
    assert_eq!(h.kde.len(), 200);
    assert!(h.kde.iter().all(|[_, y]| *y >= 0.0));
}

#[test]
fn test_histogram_auto_bins() {
    let values: Vec<f64> = (1..=100).map(f64::from).collect();

    let h = Histogram::compute(&values, Bins::Auto);

    assert_eq!(h.counts.len(), 8);
    assert_eq!(h.total(), 100);
}

#[test]
fn test_histogram_edge_cases() {
    let empty = Histogram::compute(&[], Bins::Auto);
    assert!(empty.counts.is_empty());
    assert!(close(empty.bin_width(), 0.0));

    let flat = Histogram::compute(&[3.0, 3.0], Bins::Auto);
    assert_eq!(flat.edges, vec![2.5, 3.5]);
    assert_eq!(flat.counts, vec![2]);
    assert!(flat.kde.is_empty());

    let noisy = Histogram::compute(&[1.0, f64::NAN, f64::INFINITY, 2.0], Bins::Count(2));
    assert_eq!(noisy.total(), 2);
}

#[test]
fn test_box_stats_whiskers_and_outliers() -> Result<()> {
    let b = BoxStats::compute(&[100.0, 1.0, 2.0, 3.0, 4.0])
        .ok_or_else(|| anyhow::anyhow!("no box for present values"))?;

    assert_eq!(b.count, 5);
    assert!(close(b.q1, 2.0));
    assert!(close(b.median, 3.0));
    assert!(close(b.q3, 4.0));
    assert!(close(b.lower_whisker, 1.0));
    assert!(close(b.upper_whisker, 4.0));
    assert_eq!(b.outliers, vec![100.0]);

    assert!(BoxStats::compute(&[]).is_none());
    Ok(())
}

#[test]
fn test_signed_zeros_share_a_group() {
    let values = [Value::Float(0.0), Value::Float(-0.0), Value::Float(1.0)];

    assert_eq!(value_counts(&values), vec![(Value::Float(0.0), 2), (Value::Float(1.0), 1)]);
    assert_eq!(broadcast_count(&values), vec![Some(2.0), Some(2.0), Some(1.0)]);
    assert_eq!(counts_by_key(&values).len(), 2);
}
