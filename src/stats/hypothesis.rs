//! Hypothesis tests used by the report.
//!
//! Every test returns `Result<TestResult, Unavailable>`: a sample that cannot
//! support the test is an ordinary outcome, not a failure of the report.

use std::collections::BTreeMap;

use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, StudentsT};
use statrs::statistics::Statistics;
use thiserror::Error;

use super::describe::{median, pearson};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why a test could not be computed for the current sample.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Unavailable {
    #[error("insufficient sample in {group}: need at least {needed}, found {found}")]
    InsufficientSample {
        group: String,
        needed: usize,
        found: usize,
    },
    #[error("need at least {needed} non-empty groups, found {found}")]
    TooFewGroups { needed: usize, found: usize },
    #[error("zero variance in {what}")]
    ZeroVariance { what: String },
    #[error("singular {what}")]
    Singular { what: String },
    #[error("distribution error: {message}")]
    Distribution { message: String },
}

impl Unavailable {
    pub(crate) fn insufficient(group: impl Into<String>, needed: usize, found: usize) -> Self {
        Unavailable::InsufficientSample {
            group: group.into(),
            needed,
            found,
        }
    }

    pub(crate) fn zero_variance(what: impl Into<String>) -> Self {
        Unavailable::ZeroVariance { what: what.into() }
    }

    pub(crate) fn distribution(err: impl std::fmt::Display) -> Self {
        Unavailable::Distribution {
            message: err.to_string(),
        }
    }
}

/// Statistic and p-value of a computed test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    pub statistic: f64,
    pub p_value: f64,
    /// `p_value < alpha`; set by [`TestOutcome::decide`].
    pub reject_null: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degrees_of_freedom: Vec<f64>,
    /// F approximation, for tests whose statistic is not itself an F.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f_value: Option<f64>,
}

impl TestResult {
    pub(crate) fn new(statistic: f64, p_value: f64) -> Self {
        TestResult {
            statistic,
            p_value: p_value.clamp(0.0, 1.0),
            reject_null: false,
            degrees_of_freedom: Vec::new(),
            f_value: None,
        }
    }

    pub(crate) fn with_df(mut self, df: &[f64]) -> Self {
        self.degrees_of_freedom = df.to_vec();
        self
    }

    pub(crate) fn with_f(mut self, f: f64) -> Self {
        self.f_value = Some(f);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TestOutcome {
    Computed(TestResult),
    NotComputable(Unavailable),
}

impl TestOutcome {
    /// Apply the significance threshold to a test result.
    pub fn decide(result: Result<TestResult, Unavailable>, alpha: f64) -> Self {
        match result {
            Ok(mut r) => {
                r.reject_null = r.p_value < alpha;
                TestOutcome::Computed(r)
            }
            Err(reason) => TestOutcome::NotComputable(reason),
        }
    }

    pub fn result(&self) -> Option<&TestResult> {
        match self {
            TestOutcome::Computed(r) => Some(r),
            TestOutcome::NotComputable(_) => None,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, TestOutcome::Computed(_))
    }
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

/// A labelled sample, e.g. the prices of one rating band.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub label: String,
    pub values: Vec<f64>,
}

impl Group {
    pub fn new(label: impl Into<String>, values: Vec<f64>) -> Self {
        Group {
            label: label.into(),
            values,
        }
    }
}

/// Drop empty groups, then require at least two groups of `min_size` each.
fn usable_groups(groups: &[Group], min_size: usize) -> Result<Vec<&Group>, Unavailable> {
    let present: Vec<&Group> = groups.iter().filter(|g| !g.values.is_empty()).collect();
    if present.len() < 2 {
        return Err(Unavailable::TooFewGroups {
            needed: 2,
            found: present.len(),
        });
    }
    if let Some(small) = present.iter().find(|g| g.values.len() < min_size) {
        return Err(Unavailable::insufficient(&small.label, min_size, small.values.len()));
    }
    Ok(present)
}

fn f_sf(f: f64, df1: f64, df2: f64) -> Result<f64, Unavailable> {
    let dist = FisherSnedecor::new(df1, df2).map_err(Unavailable::distribution)?;
    Ok(dist.sf(f))
}

fn t_two_sided(t: f64, df: f64) -> Result<f64, Unavailable> {
    let dist = StudentsT::new(0.0, 1.0, df).map_err(Unavailable::distribution)?;
    Ok(2.0 * dist.sf(t.abs()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// One-way ANOVA F test across groups of at least two observations.
pub fn one_way_anova(groups: &[Group]) -> Result<TestResult, Unavailable> {
    let groups = usable_groups(groups, 2)?;
    let k = groups.len();
    let n: usize = groups.iter().map(|g| g.values.len()).sum();
    let grand = groups.iter().flat_map(|g| g.values.iter()).sum::<f64>() / n as f64;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for g in &groups {
        let m = g.values.iter().mean();
        ss_between += g.values.len() as f64 * (m - grand).powi(2);
        ss_within += g.values.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    }
    if ss_within <= 0.0 {
        return Err(Unavailable::zero_variance("every group"));
    }

    let df1 = (k - 1) as f64;
    let df2 = (n - k) as f64;
    let f = (ss_between / df1) / (ss_within / df2);
    let p = f_sf(f, df1, df2)?;
    Ok(TestResult::new(f, p).with_df(&[df1, df2]))
}

/// Levene's test for equal variances, centred on group medians
/// (Brown-Forsythe variant).
pub fn levene(groups: &[Group]) -> Result<TestResult, Unavailable> {
    let groups = usable_groups(groups, 2)?;
    let deviations: Vec<Group> = groups
        .iter()
        .map(|g| {
            let m = median(&g.values);
            Group::new(g.label.clone(), g.values.iter().map(|v| (v - m).abs()).collect())
        })
        .collect();
    one_way_anova(&deviations)
}

/// Student's two-sample t test with pooled variance.
pub fn t_test_independent(a: &Group, b: &Group) -> Result<TestResult, Unavailable> {
    for g in [a, b] {
        if g.values.len() < 2 {
            return Err(Unavailable::insufficient(&g.label, 2, g.values.len()));
        }
    }
    let (n1, n2) = (a.values.len() as f64, b.values.len() as f64);
    let pooled = ((n1 - 1.0) * a.values.iter().variance() + (n2 - 1.0) * b.values.iter().variance())
        / (n1 + n2 - 2.0);
    if pooled <= 0.0 {
        return Err(Unavailable::zero_variance(format!("{} and {}", a.label, b.label)));
    }

    let diff = a.values.iter().mean() - b.values.iter().mean();
    let t = diff / (pooled * (1.0 / n1 + 1.0 / n2)).sqrt();
    let df = n1 + n2 - 2.0;
    Ok(TestResult::new(t, t_two_sided(t, df)?).with_df(&[df]))
}

/// Pearson correlation with its t-based significance test.
/// The statistic is the correlation coefficient itself.
pub fn pearson_test(x: &[f64], y: &[f64]) -> Result<TestResult, Unavailable> {
    let n = x.len().min(y.len());
    if n < 3 {
        return Err(Unavailable::insufficient("paired sample", 3, n));
    }
    let r = pearson(x, y).ok_or_else(|| Unavailable::zero_variance("price or rating"))?;
    let df = (n - 2) as f64;

    let p = if r.abs() >= 1.0 {
        0.0
    } else {
        let t = r * (df / (1.0 - r * r)).sqrt();
        t_two_sided(t, df)?
    };
    Ok(TestResult::new(r, p).with_df(&[df]))
}

/// Chi-square test of independence on a contingency table of counts.
///
/// Rows and columns that sum to zero are dropped first. With one degree of
/// freedom Yates' continuity correction is applied.
pub fn chi_square_independence(observed: &[Vec<u64>]) -> Result<TestResult, Unavailable> {
    let width = observed.iter().map(Vec::len).fold(0, usize::max);
    let col_sums: Vec<u64> = (0..width)
        .map(|j| observed.iter().map(|row| row.get(j).copied().unwrap_or(0)).sum())
        .collect();
    let keep_cols: Vec<usize> = (0..width).filter(|&j| col_sums[j] > 0).collect();

    let table: Vec<Vec<f64>> = observed
        .iter()
        .filter(|row| row.iter().sum::<u64>() > 0)
        .map(|row| {
            keep_cols
                .iter()
                .map(|&j| row.get(j).copied().unwrap_or(0) as f64)
                .collect()
        })
        .collect();

    let (r, c) = (table.len(), keep_cols.len());
    if r < 2 || c < 2 {
        return Err(Unavailable::TooFewGroups {
            needed: 2,
            found: r.min(c),
        });
    }

    let row_sums: Vec<f64> = table.iter().map(|row| row.iter().sum()).collect();
    let col_sums: Vec<f64> = (0..c).map(|j| table.iter().map(|row| row[j]).sum()).collect();
    let total: f64 = row_sums.iter().sum();
    let dof = ((r - 1) * (c - 1)) as f64;
    let yates = r == 2 && c == 2;

    let mut stat = 0.0;
    for (i, row) in table.iter().enumerate() {
        for (j, &o) in row.iter().enumerate() {
            let e = row_sums[i] * col_sums[j] / total;
            let mut d = (o - e).abs();
            if yates {
                d = (d - 0.5).max(0.0);
            }
            stat += d * d / e;
        }
    }

    let dist = ChiSquared::new(dof).map_err(Unavailable::distribution)?;
    Ok(TestResult::new(stat, dist.sf(stat)).with_df(&[dof]))
}

/// One-way MANOVA for two response variables, reported as Wilks' lambda.
///
/// `groups` holds `(label, rows)` where each row is `[y1, y2]`. With two
/// responses Rao's F transformation is exact:
/// `F = (1 - √Λ)/√Λ · (N - k - 1)/(k - 1)` on `2(k-1), 2(N-k-1)` df.
pub fn manova_wilks(groups: &[(String, Vec<[f64; 2]>)]) -> Result<TestResult, Unavailable> {
    let present: Vec<&(String, Vec<[f64; 2]>)> =
        groups.iter().filter(|(_, rows)| !rows.is_empty()).collect();
    if present.len() < 2 {
        return Err(Unavailable::TooFewGroups {
            needed: 2,
            found: present.len(),
        });
    }
    if let Some((label, rows)) = present.iter().find(|(_, rows)| rows.len() < 2) {
        return Err(Unavailable::insufficient(label, 2, rows.len()));
    }

    let k = present.len();
    let n: usize = present.iter().map(|(_, rows)| rows.len()).sum();
    if n < k + 2 {
        return Err(Unavailable::insufficient("all groups", k + 2, n));
    }

    let mean_of = |rows: &[[f64; 2]]| {
        let len = rows.len() as f64;
        let s = rows.iter().fold([0.0, 0.0], |acc, r| [acc[0] + r[0], acc[1] + r[1]]);
        [s[0] / len, s[1] / len]
    };
    let all: Vec<[f64; 2]> = present.iter().flat_map(|(_, rows)| rows.iter().copied()).collect();
    let grand = mean_of(all.as_slice());

    // within-group (error) and total SSCP matrices
    let mut e = [[0.0f64; 2]; 2];
    let mut t = [[0.0f64; 2]; 2];
    for (_, rows) in &present {
        let m = mean_of(rows.as_slice());
        for r in rows {
            let dw = [r[0] - m[0], r[1] - m[1]];
            let dt = [r[0] - grand[0], r[1] - grand[1]];
            for a in 0..2 {
                for b in 0..2 {
                    e[a][b] += dw[a] * dw[b];
                    t[a][b] += dt[a] * dt[b];
                }
            }
        }
    }

    let det = |m: &[[f64; 2]; 2]| m[0][0] * m[1][1] - m[0][1] * m[1][0];
    let det_e = det(&e);
    let det_t = det(&t);
    if !(det_e > 1e-12 * e[0][0] * e[1][1]) || !(det_t > 0.0) {
        return Err(Unavailable::Singular {
            what: "within-group covariance".into(),
        });
    }

    let lambda = (det_e / det_t).clamp(0.0, 1.0);
    let root = lambda.sqrt();
    let (kf, nf) = (k as f64, n as f64);
    let df1 = 2.0 * (kf - 1.0);
    let df2 = 2.0 * (nf - kf - 1.0);
    let f = (1.0 - root) / root * (nf - kf - 1.0) / (kf - 1.0);
    let p = f_sf(f, df1, df2)?;

    Ok(TestResult::new(lambda, p).with_df(&[df1, df2]).with_f(f))
}

/// Group `values` by `key`, keeping key order.
pub fn group_by<K: Ord, T: Copy>(
    items: impl IntoIterator<Item = (K, T)>,
) -> BTreeMap<K, Vec<T>> {
    let mut out: BTreeMap<K, Vec<T>> = BTreeMap::new();
    for (k, v) in items {
        out.entry(k).or_default().push(v);
    }
    out
}
