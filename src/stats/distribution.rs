use serde::Serialize;

use super::{quantile_sorted, sorted, std_dev};

/// Upper bound on automatically chosen bucket counts; long-tailed payment
/// columns can otherwise ask for hundreds of thousands of buckets.
const MAX_AUTO_BINS: usize = 1_000;

/// Evaluation points of the density overlay.
const KDE_GRID: usize = 200;

/// Whisker reach as a multiple of the inter-quartile range.
const WHISKER_IQR: f64 = 1.5;

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// How to split a histogram's range into buckets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bins {
    /// Narrower of the Freedman–Diaconis and Sturges bucket widths.
    Auto,
    /// Fixed number of equal-width buckets.
    Count(usize),
}

/// Bucketed counts with a Gaussian density curve scaled to the counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// `counts.len() + 1` ascending bucket edges; the last bucket is closed.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
    /// `(x, expected count)` points; empty when the data has no spread.
    pub kde: Vec<[f64; 2]>,
}

impl Histogram {
    pub fn compute(values: &[f64], bins: Bins) -> Self {
        let data: Vec<f64> = sorted(values).into_iter().filter(|v| v.is_finite()).collect();
        let (Some(&first), Some(&last)) = (data.first(), data.last()) else {
            return Histogram {
                edges: Vec::new(),
                counts: Vec::new(),
                kde: Vec::new(),
            };
        };

        let (lo, hi) = if first == last {
            (first - 0.5, last + 0.5)
        } else {
            (first, last)
        };
        let n_bins = match bins {
            Bins::Count(n) => n.max(1),
            Bins::Auto => auto_bin_count(&data),
        };

        let width = (hi - lo) / n_bins as f64;
        let edges: Vec<f64> = (0..=n_bins).map(|i| lo + width * i as f64).collect();
        let mut counts = vec![0usize; n_bins];
        for v in &data {
            let idx = (((v - lo) / (hi - lo)) * n_bins as f64).floor() as usize;
            counts[idx.min(n_bins - 1)] += 1;
        }

        let kde = kde_curve(&data, width);
        Histogram { edges, counts, kde }
    }

    /// Width of each bucket (all buckets are equal).
    pub fn bin_width(&self) -> f64 {
        match self.edges.as_slice() {
            [first, .., last] => (last - first) / self.counts.len() as f64,
            _ => 0.0,
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

fn auto_bin_count(sorted: &[f64]) -> usize {
    let n = sorted.len() as f64;
    let range = sorted[sorted.len() - 1] - sorted[0];
    if range <= 0.0 {
        return 1;
    }
    let sturges = range / (n.log2() + 1.0);
    let iqr = quantile_sorted(sorted, 0.75) - quantile_sorted(sorted, 0.25);
    let fd = 2.0 * iqr * n.powf(-1.0 / 3.0);
    let width = if fd > 0.0 { fd.min(sturges) } else { sturges };
    ((range / width).ceil() as usize).clamp(1, MAX_AUTO_BINS)
}

/// Gaussian KDE with Scott's bandwidth over the data range, scaled so the
/// curve sits on top of a count histogram with buckets `bin_width` wide.
fn kde_curve(sorted: &[f64], bin_width: f64) -> Vec<[f64; 2]> {
    let n = sorted.len();
    let sd = std_dev(sorted);
    if n < 2 || !sd.is_finite() || sd <= 0.0 {
        return Vec::new();
    }
    let bandwidth = sd * (n as f64).powf(-1.0 / 5.0);
    let (lo, hi) = (sorted[0], sorted[n - 1]);
    let step = (hi - lo) / (KDE_GRID - 1) as f64;
    let norm = 1.0 / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    let scale = n as f64 * bin_width;

    (0..KDE_GRID)
        .map(|i| {
            let x = lo + step * i as f64;
            let density: f64 = sorted
                .iter()
                .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                .sum::<f64>()
                * norm;
            [x, density * scale]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Box plot
// ---------------------------------------------------------------------------

/// Five-number summary with 1.5×IQR whiskers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub count: usize,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Smallest value at or above `q1 - 1.5 * IQR`.
    pub lower_whisker: f64,
    /// Largest value at or below `q3 + 1.5 * IQR`.
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn compute(values: &[f64]) -> Option<Self> {
        let data = sorted(values);
        if data.is_empty() {
            return None;
        }
        let q1 = quantile_sorted(&data, 0.25);
        let median = quantile_sorted(&data, 0.5);
        let q3 = quantile_sorted(&data, 0.75);
        let reach = WHISKER_IQR * (q3 - q1);
        let (low_fence, high_fence) = (q1 - reach, q3 + reach);

        let inside = || data.iter().copied().filter(|v| *v >= low_fence && *v <= high_fence);
        let lower_whisker = inside().next().unwrap_or(q1);
        let upper_whisker = inside().last().unwrap_or(q3);
        let outliers = data
            .iter()
            .copied()
            .filter(|v| *v < low_fence || *v > high_fence)
            .collect();

        Some(BoxStats {
            count: data.len(),
            q1,
            median,
            q3,
            lower_whisker,
            upper_whisker,
            outliers,
        })
    }
}
