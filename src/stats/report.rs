use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::describe::{Histogram, PairMatrices, Summary, min_max, pearson};
use super::hypothesis::{
    Group, TestOutcome, TestResult, Unavailable, chi_square_independence, group_by, levene,
    manova_wilks, one_way_anova, pearson_test, t_test_independent,
};
use super::shapiro::shapiro_wilk;
use super::words::{WordCount, top_words};
use crate::config::AnalysisConfig;
use crate::data::model::{Availability, RATINGS, Table};

// ---------------------------------------------------------------------------
// RatingBand – three equal-width buckets over the observed rating range
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RatingBand {
    Low,
    Medium,
    High,
}

impl RatingBand {
    pub fn label(self) -> &'static str {
        match self {
            RatingBand::Low => "Low",
            RatingBand::Medium => "Medium",
            RatingBand::High => "High",
        }
    }

    /// Band of every value, binned like `pandas.cut(values, bins=3)`.
    ///
    /// Edges are equally spaced over `[min, max]` with right-closed bins;
    /// the lowest edge is nudged down by 0.1% of the range so the minimum
    /// is included. A constant sample is widened by 0.1% on each side.
    pub fn assign(values: &[f64]) -> Vec<RatingBand> {
        let Some((lo, hi)) = min_max(values) else {
            return Vec::new();
        };
        let edges = if hi > lo {
            let mut e = linspace(lo, hi);
            e[0] -= (hi - lo) * 0.001;
            e
        } else {
            let pad = if lo == 0.0 { 0.001 } else { lo.abs() * 0.001 };
            linspace(lo - pad, hi + pad)
        };

        values
            .iter()
            .map(|&v| {
                if v <= edges[1] {
                    RatingBand::Low
                } else if v <= edges[2] {
                    RatingBand::Medium
                } else {
                    RatingBand::High
                }
            })
            .collect()
    }
}

impl fmt::Display for RatingBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn linspace(lo: f64, hi: f64) -> [f64; 4] {
    let step = (hi - lo) / 3.0;
    [lo, lo + step, lo + 2.0 * step, hi]
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// One entry of the hypothesis battery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedTest {
    pub name: &'static str,
    pub description: &'static str,
    pub outcome: TestOutcome,
}

/// Everything derived from one filtered table. Rebuilt from scratch on
/// every change of criteria.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub count: usize,
    pub price: Summary,
    pub rating: Summary,
    /// Pearson price/rating; `None` when undefined.
    pub correlation: Option<f64>,
    pub matrices: PairMatrices,
    /// Count per rating, every rating present even when zero.
    pub rating_distribution: BTreeMap<u8, usize>,
    pub availability_counts: BTreeMap<Availability, usize>,
    pub price_histogram: Histogram,
    pub top_title_words: Vec<WordCount>,
    pub alpha: f64,
    pub tests: Vec<NamedTest>,
}

impl Report {
    pub fn compute(table: &Table, config: &AnalysisConfig) -> Self {
        let prices = table.prices();
        let ratings = table.rating_values();

        let mut rating_distribution: BTreeMap<u8, usize> = RATINGS.map(|r| (r, 0)).collect();
        let mut availability_counts: BTreeMap<Availability, usize> =
            Availability::ALL.iter().map(|&a| (a, 0)).collect();
        for rec in table {
            *rating_distribution.entry(rec.rating).or_default() += 1;
            *availability_counts.entry(rec.availability).or_default() += 1;
        }

        let report = Report {
            count: table.len(),
            price: Summary::of(&prices),
            rating: Summary::of(&ratings),
            correlation: pearson(&prices, &ratings),
            matrices: PairMatrices::of(["price", "rating"], &prices, &ratings),
            rating_distribution,
            availability_counts,
            price_histogram: Histogram::of(&prices, config.histogram_bins),
            top_title_words: top_words(
                table.iter().map(|r| r.title.as_str()),
                config.min_word_len,
                config.top_words,
            ),
            alpha: config.alpha,
            tests: battery(table, &prices, &ratings, config.alpha),
        };
        log::debug!(
            "Report over {} records: {}/{} tests computed",
            report.count,
            report.tests.iter().filter(|t| t.outcome.is_computed()).count(),
            report.tests.len()
        );
        report
    }

    pub fn test(&self, name: &str) -> Option<&NamedTest> {
        self.tests.iter().find(|t| t.name == name)
    }
}

/// The fixed hypothesis battery, in display order.
fn battery(table: &Table, prices: &[f64], ratings: &[f64], alpha: f64) -> Vec<NamedTest> {
    let bands = RatingBand::assign(ratings);

    let price_by_band: Vec<Group> = group_by(bands.iter().copied().zip(prices.iter().copied()))
        .into_iter()
        .map(|(band, values)| Group::new(band.label(), values))
        .collect();

    let by_availability = group_by(table.iter().map(|r| (r.availability, r.price)));
    let availability_group = |a: Availability| {
        Group::new(a.label(), by_availability.get(&a).cloned().unwrap_or_default())
    };

    let price_by_rating: Vec<Group> = group_by(table.iter().map(|r| (r.rating, r.price)))
        .into_iter()
        .map(|(rating, values)| Group::new(format!("rating {rating}"), values))
        .collect();

    let contingency: Vec<Vec<u64>> = RATINGS
        .map(|rating| {
            Availability::ALL
                .iter()
                .map(|&a| {
                    table
                        .iter()
                        .filter(|r| r.rating == rating && r.availability == a)
                        .count() as u64
                })
                .collect()
        })
        .collect();

    let pairs_by_band: Vec<(String, Vec<[f64; 2]>)> = group_by(
        bands
            .iter()
            .copied()
            .zip(prices.iter().zip(ratings).map(|(&p, &r)| [p, r])),
    )
    .into_iter()
    .map(|(band, rows)| (band.label().to_string(), rows))
    .collect();

    let entries: [(&'static str, &'static str, Result<TestResult, Unavailable>); 8] = [
        (
            "shapiro_price",
            "Shapiro-Wilk normality of price",
            shapiro_wilk(prices),
        ),
        (
            "shapiro_rating",
            "Shapiro-Wilk normality of rating",
            shapiro_wilk(ratings),
        ),
        (
            "levene_price_by_rating_band",
            "Levene equal variance of price across rating bands",
            levene(&price_by_band),
        ),
        (
            "pearson_price_rating",
            "Pearson correlation of price and rating",
            pearson_test(prices, ratings),
        ),
        (
            "ttest_price_by_availability",
            "t-test of price, in stock vs out of stock",
            t_test_independent(
                &availability_group(Availability::InStock),
                &availability_group(Availability::OutOfStock),
            ),
        ),
        (
            "anova_price_by_rating",
            "One-way ANOVA of price across ratings",
            one_way_anova(&price_by_rating),
        ),
        (
            "chi2_rating_availability",
            "Chi-square independence of rating and availability",
            chi_square_independence(&contingency),
        ),
        (
            "manova_rating_band",
            "MANOVA of (price, rating) by rating band (Wilks' lambda)",
            manova_wilks(&pairs_by_band),
        ),
    ];

    entries
        .into_iter()
        .map(|(name, description, result)| NamedTest {
            name,
            description,
            outcome: TestOutcome::decide(result, alpha),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{FilterCriteria, apply};
    use crate::data::model::Record;
    use std::collections::BTreeSet;

    fn shelf() -> Table {
        let records = (0..30)
            .map(|i| {
                let rating = (i % 5 + 1) as u8;
                let availability = if i % 3 == 0 {
                    Availability::OutOfStock
                } else {
                    Availability::InStock
                };
                let price = 10.0 + rating as f64 * 5.0 + (i % 7) as f64;
                Record::new(format!("Book {i}"), price, rating, availability)
            })
            .collect();
        Table::from_records(records)
    }

    #[test]
    fn bands_follow_equal_width_cut() {
        use RatingBand::*;
        let bands = RatingBand::assign(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(bands, vec![Low, Low, Medium, High, High]);

        assert_eq!(RatingBand::assign(&[4.0, 4.0]), vec![Medium, Medium]);
        assert_eq!(RatingBand::assign(&[4.0, 5.0]), vec![Low, High]);
        assert!(RatingBand::assign(&[]).is_empty());
    }

    #[test]
    fn filtered_example_report() {
        let table = Table::from_records(vec![
            Record::new("A", 10.0, 2, Availability::InStock),
            Record::new("B", 20.0, 4, Availability::InStock),
            Record::new("C", 30.0, 5, Availability::OutOfStock),
        ]);
        let mut criteria = FilterCriteria::widest(&table);
        criteria.price_min = 15.0;
        criteria.price_max = 30.0;
        criteria.ratings = BTreeSet::from([4, 5]);

        let filtered = apply(&table, &criteria);
        let report = Report::compute(&filtered, &AnalysisConfig::default());
        assert_eq!(report.count, filtered.len());
        assert_eq!(report.count, 2);
        assert!((report.price.mean - 25.0).abs() < 1e-12);
        assert_eq!(report.rating_distribution[&4], 1);
        assert_eq!(report.rating_distribution[&1], 0);
        assert_eq!(report.availability_counts[&Availability::OutOfStock], 1);
    }

    #[test]
    fn empty_table_reports_without_panicking() {
        let report = Report::compute(&Table::default(), &AnalysisConfig::default());
        assert_eq!(report.count, 0);
        assert!(report.price.mean.is_nan());
        assert_eq!(report.correlation, None);
        assert_eq!(report.rating_distribution.len(), 5);
        assert!(report.top_title_words.is_empty());
        assert_eq!(report.tests.len(), 8);
        assert!(report.tests.iter().all(|t| !t.outcome.is_computed()));
    }

    #[test]
    fn full_battery_on_a_varied_shelf() {
        let report = Report::compute(&shelf(), &AnalysisConfig::default());
        let names: Vec<&str> = report.tests.iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            [
                "shapiro_price",
                "shapiro_rating",
                "levene_price_by_rating_band",
                "pearson_price_rating",
                "ttest_price_by_availability",
                "anova_price_by_rating",
                "chi2_rating_availability",
                "manova_rating_band",
            ]
        );
        for t in &report.tests {
            assert!(t.outcome.is_computed(), "{}: {:?}", t.name, t.outcome);
        }

        // price rises with rating
        let anova = report.test("anova_price_by_rating").unwrap().outcome.result().unwrap();
        assert!(anova.reject_null);
        assert!(report.correlation.unwrap() > 0.8);

        // every rating/availability cell holds the same share
        let chi2 = report.test("chi2_rating_availability").unwrap().outcome.result().unwrap();
        assert!(chi2.statistic.abs() < 1e-9);
        assert!(!chi2.reject_null);
    }

    #[test]
    fn single_observation_group_is_not_computable() {
        let table = Table::from_records(vec![
            Record::new("A", 10.0, 2, Availability::InStock),
            Record::new("B", 12.0, 3, Availability::InStock),
            Record::new("C", 30.0, 5, Availability::OutOfStock),
        ]);
        let report = Report::compute(&table, &AnalysisConfig::default());
        let ttest = &report.test("ttest_price_by_availability").unwrap().outcome;
        assert_eq!(
            *ttest,
            TestOutcome::NotComputable(Unavailable::InsufficientSample {
                group: "Out of stock".into(),
                needed: 2,
                found: 1,
            })
        );
        assert!(!report.test("anova_price_by_rating").unwrap().outcome.is_computed());
    }

    #[test]
    fn alpha_comes_from_config() {
        let config = AnalysisConfig {
            alpha: 1e-12,
            ..AnalysisConfig::default()
        };
        let report = Report::compute(&shelf(), &config);
        assert_eq!(report.alpha, 1e-12);
        for r in report.tests.iter().filter_map(|t| t.outcome.result()) {
            assert_eq!(r.reject_null, r.p_value < 1e-12);
        }
    }
}
