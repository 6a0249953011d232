//! Descriptive statistics over the numeric fields of a table.

use serde::Serialize;
use statrs::statistics::Statistics;

/// `pandas.describe()`-style summary of one numeric field.
///
/// Every field except `count` is NaN for an empty sample; `std` is NaN
/// below two observations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl Summary {
    pub fn of(values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        Summary {
            count: values.len(),
            mean: values.iter().mean(),
            std: values.iter().std_dev(),
            min: sorted.first().copied().unwrap_or(f64::NAN),
            q1: quantile_sorted(&sorted, 0.25),
            median: quantile_sorted(&sorted, 0.5),
            q3: quantile_sorted(&sorted, 0.75),
            max: sorted.last().copied().unwrap_or(f64::NAN),
        }
    }
}

/// Linear-interpolation quantile (R-7) of an ascending slice; NaN when empty.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let h = (n - 1) as f64 * q.clamp(0.0, 1.0);
            let lo = h.floor() as usize;
            let hi = h.ceil() as usize;
            sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
        }
    }
}

/// Median of an unsorted slice; NaN when empty.
pub fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, 0.5)
}

/// Sample covariance; NaN below two observations.
pub fn covariance(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    if x.len() < 2 {
        return f64::NAN;
    }
    x.iter().covariance(y.iter())
}

/// Pearson correlation coefficient.
///
/// `None` when there are fewer than two pairs or either field has zero
/// variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let vx = x.iter().variance();
    let vy = y.iter().variance();
    if !(vx > 0.0 && vy > 0.0) {
        return None;
    }
    let r = covariance(x, y) / (vx.sqrt() * vy.sqrt());
    Some(r.clamp(-1.0, 1.0))
}

/// Covariance and correlation matrices over two fields, in `[x, y]` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairMatrices {
    pub fields: [&'static str; 2],
    pub covariance: [[f64; 2]; 2],
    /// NaN entries where the correlation is undefined.
    pub correlation: [[f64; 2]; 2],
}

impl PairMatrices {
    pub fn of(fields: [&'static str; 2], x: &[f64], y: &[f64]) -> Self {
        let cxy = covariance(x, y);
        let cov = [[covariance(x, x), cxy], [cxy, covariance(y, y)]];

        let unit = |v: f64| if v > 0.0 { 1.0 } else { f64::NAN };
        let r = pearson(x, y).unwrap_or(f64::NAN);
        let corr = [[unit(cov[0][0]), r], [r, unit(cov[1][1])]];

        PairMatrices {
            fields,
            covariance: cov,
            correlation: corr,
        }
    }
}

/// Equal-width histogram. The last bin is closed on both ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// `counts.len() + 1` ascending bin edges; empty when there is no data.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn of(values: &[f64], bins: usize) -> Self {
        let bins = bins.max(1);
        let (lo, hi) = match min_max(values) {
            Some(r) => r,
            None => {
                return Histogram {
                    edges: Vec::new(),
                    counts: Vec::new(),
                };
            }
        };
        // a single distinct value still gets a visible bin
        let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
        let width = (hi - lo) / bins as f64;

        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
        let mut counts = vec![0usize; bins];
        for &v in values {
            let i = (((v - lo) / width).floor() as usize).min(bins - 1);
            counts[i] += 1;
        }
        Histogram { edges, counts }
    }
}

/// `(min, max)` of a slice; `None` when empty.
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn summary_matches_describe() {
        let s = Summary::of(&[20.0, 30.0]);
        assert_eq!(s.count, 2);
        assert!(close(s.mean, 25.0));
        assert!(close(s.std, 50f64.sqrt()));
        assert!(close(s.q1, 22.5));
        assert!(close(s.median, 25.0));
        assert!(close(s.q3, 27.5));
        assert_eq!((s.min, s.max), (20.0, 30.0));
    }

    #[test]
    fn empty_and_single_summaries() {
        let empty = Summary::of(&[]);
        assert_eq!(empty.count, 0);
        assert!(empty.mean.is_nan() && empty.std.is_nan() && empty.min.is_nan());

        let one = Summary::of(&[4.0]);
        assert_eq!(one.mean, 4.0);
        assert!(one.std.is_nan());
        assert_eq!(one.median, 4.0);
    }

    #[test]
    fn pearson_undefined_cases() {
        assert_eq!(pearson(&[1.0], &[2.0]), None);
        assert_eq!(pearson(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]), None);
        let r = pearson(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 5.0, 4.0, 5.0]).unwrap();
        assert!((r - 6.0 / 60f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn matrices_mark_undefined_correlation() {
        let m = PairMatrices::of(["price", "rating"], &[10.0, 20.0, 30.0], &[3.0, 3.0, 3.0]);
        assert!(close(m.covariance[0][0], 100.0));
        assert!(close(m.covariance[1][1], 0.0));
        assert_eq!(m.correlation[0][0], 1.0);
        assert!(m.correlation[0][1].is_nan());
        assert!(m.correlation[1][1].is_nan());
    }

    #[test]
    fn histogram_counts_every_value() {
        let h = Histogram::of(&[0.0, 1.0, 2.0, 3.0, 4.0, 10.0], 5);
        assert_eq!(h.edges.len(), 6);
        assert_eq!(h.counts, vec![2, 2, 1, 0, 1]);

        let flat = Histogram::of(&[7.0, 7.0], 4);
        assert_eq!(flat.counts.iter().sum::<usize>(), 2);

        assert!(Histogram::of(&[], 20).counts.is_empty());
    }
}
