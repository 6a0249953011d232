//! Terminal rendering of a [`Report`].

use std::fmt::Write as _;

use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use crate::data::filter::FilterCriteria;
use crate::stats::describe::Summary;
use crate::stats::hypothesis::TestOutcome;
use crate::stats::Report;

/// Widest histogram bar, in characters.
const BAR_WIDTH: usize = 40;

fn new_table<I, T>(header: I) -> Table
where
    I: IntoIterator<Item = T>,
    T: Into<Cell>,
{
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// Four decimals, `n/a` for NaN.
pub fn fmt_num(v: f64) -> String {
    if v.is_nan() {
        "n/a".to_string()
    } else {
        format!("{v:.4}")
    }
}

fn fmt_p(p: f64) -> String {
    if p < 1e-4 {
        format!("{p:.3e}")
    } else {
        format!("{p:.4}")
    }
}

/// One line describing the active criteria.
pub fn criteria_line(c: &FilterCriteria) -> String {
    let ratings: Vec<String> = c.ratings.iter().map(u8::to_string).collect();
    let availability: Vec<&str> = c.availability.iter().map(|a| a.label()).collect();
    let mut line = format!(
        "price {:.2}..={:.2} | ratings [{}] | availability [{}]",
        c.price_min,
        c.price_max,
        ratings.join(","),
        availability.join(", ")
    );
    if let Some(t) = c.title_substring.as_deref().filter(|t| !t.is_empty()) {
        let _ = write!(line, " | title ~ {t:?}");
    }
    if c.top_rated_only {
        line.push_str(" | top rated only");
    }
    line
}

pub fn summary_table(report: &Report) -> Table {
    let mut table = new_table(["", "price", "rating"]);
    let rows: [(&str, fn(&Summary) -> f64); 7] = [
        ("mean", |s| s.mean),
        ("std", |s| s.std),
        ("min", |s| s.min),
        ("25%", |s| s.q1),
        ("50%", |s| s.median),
        ("75%", |s| s.q3),
        ("max", |s| s.max),
    ];
    table.add_row([
        Cell::new("count"),
        Cell::new(report.price.count),
        Cell::new(report.rating.count),
    ]);
    for (name, get) in rows {
        table.add_row([
            Cell::new(name),
            Cell::new(fmt_num(get(&report.price))),
            Cell::new(fmt_num(get(&report.rating))),
        ]);
    }
    table
}

pub fn matrices_table(report: &Report) -> Table {
    let m = &report.matrices;
    let mut table = new_table(["", "cov price", "cov rating", "corr price", "corr rating"]);
    for (i, field) in m.fields.iter().enumerate() {
        table.add_row([
            Cell::new(field),
            Cell::new(fmt_num(m.covariance[i][0])),
            Cell::new(fmt_num(m.covariance[i][1])),
            Cell::new(fmt_num(m.correlation[i][0])),
            Cell::new(fmt_num(m.correlation[i][1])),
        ]);
    }
    table
}

pub fn distribution_table(report: &Report) -> Table {
    let mut table = new_table(["group", "count"]);
    for (rating, count) in &report.rating_distribution {
        table.add_row([Cell::new(format!("rating {rating}")), Cell::new(count)]);
    }
    for (availability, count) in &report.availability_counts {
        table.add_row([Cell::new(availability), Cell::new(count)]);
    }
    table
}

pub fn words_table(report: &Report) -> Table {
    let mut table = new_table(["word", "count"]);
    for w in &report.top_title_words {
        table.add_row([Cell::new(&w.word), Cell::new(w.count)]);
    }
    table
}

/// Price histogram as text bars.
pub fn histogram_text(report: &Report) -> String {
    let h = &report.price_histogram;
    let peak = h.counts.iter().copied().max().unwrap_or(0).max(1);
    let mut out = String::new();
    for (i, &count) in h.counts.iter().enumerate() {
        let bar = "#".repeat(count * BAR_WIDTH / peak);
        let _ = writeln!(
            out,
            "{:>9.2} – {:<9.2} {:>5} {bar}",
            h.edges[i],
            h.edges[i + 1],
            count
        );
    }
    out
}

pub fn tests_table(report: &Report) -> Table {
    let mut table = new_table(["test", "statistic", "p-value", "df", "decision"]);
    for t in &report.tests {
        match &t.outcome {
            TestOutcome::Computed(r) => {
                let df: Vec<String> = r.degrees_of_freedom.iter().map(|d| format!("{d}")).collect();
                let statistic = match r.f_value {
                    Some(f) => format!("{} (F = {})", fmt_num(r.statistic), fmt_num(f)),
                    None => fmt_num(r.statistic),
                };
                let decision = if r.reject_null {
                    format!("reject H0 (α = {})", report.alpha)
                } else {
                    "fail to reject H0".to_string()
                };
                table.add_row([
                    Cell::new(t.name),
                    Cell::new(statistic),
                    Cell::new(fmt_p(r.p_value)),
                    Cell::new(df.join(", ")),
                    Cell::new(decision),
                ]);
            }
            TestOutcome::NotComputable(reason) => {
                table.add_row([
                    Cell::new(t.name),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new("-"),
                    Cell::new(format!("not computable: {reason}")),
                ]);
            }
        }
    }
    table
}

/// The full report as text.
pub fn report_text(report: &Report, criteria: &FilterCriteria) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} records | {}", report.count, criteria_line(criteria));
    let correlation = report.correlation.map_or_else(|| "n/a".to_string(), fmt_num);
    let _ = writeln!(out, "price/rating correlation: {correlation}\n");

    let _ = writeln!(out, "Descriptive statistics\n{}\n", summary_table(report));
    let _ = writeln!(out, "Covariance / correlation\n{}\n", matrices_table(report));
    let _ = writeln!(out, "Distributions\n{}\n", distribution_table(report));
    if !report.price_histogram.counts.is_empty() {
        let _ = writeln!(out, "Price histogram\n{}", histogram_text(report));
    }
    if !report.top_title_words.is_empty() {
        let _ = writeln!(out, "Top title words\n{}\n", words_table(report));
    }
    let _ = write!(out, "Hypothesis tests\n{}", tests_table(report));
    out
}

/// The report as pretty JSON. NaN values become `null`.
pub fn report_json(report: &Report) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::data::model::{Availability, Record, Table as Books};

    fn report() -> (Report, FilterCriteria) {
        let table = Books::from_records(vec![
            Record::new("Sharp Objects", 47.82, 4, Availability::InStock),
            Record::new("Sapiens", 54.23, 5, Availability::InStock),
            Record::new("The Requiem Red", 22.65, 1, Availability::OutOfStock),
        ]);
        let criteria = FilterCriteria::widest(&table);
        (Report::compute(&table, &AnalysisConfig::default()), criteria)
    }

    #[test]
    fn text_report_names_every_test() {
        let (report, criteria) = report();
        let text = report_text(&report, &criteria);
        assert!(text.starts_with("3 records | price 22.65..=54.23"));
        for t in &report.tests {
            assert!(text.contains(t.name), "missing {}", t.name);
        }
        assert!(text.contains("not computable"));
    }

    #[test]
    fn json_report_marks_test_status() {
        let (report, _) = report();
        let json: serde_json::Value = serde_json::from_str(&report_json(&report).unwrap()).unwrap();
        assert_eq!(json["count"], 3);
        assert_eq!(json["tests"][0]["name"], "shapiro_price");
        assert_eq!(json["tests"][0]["outcome"]["status"], "computed");
        assert_eq!(json["tests"][4]["outcome"]["status"], "not_computable");
        assert_eq!(json["tests"][4]["outcome"]["reason"], "insufficient_sample");
    }

    #[test]
    fn empty_report_renders() {
        let empty = Report::compute(&Books::default(), &AnalysisConfig::default());
        let criteria = FilterCriteria::widest(&Books::default());
        let text = report_text(&empty, &criteria);
        assert!(text.contains("n/a"));
        assert!(report_json(&empty).unwrap().contains("\"mean\": null"));
    }

    #[test]
    fn criteria_line_lists_optional_filters() {
        let (_, mut criteria) = report();
        criteria.title_substring = Some("red".into());
        criteria.top_rated_only = true;
        let line = criteria_line(&criteria);
        assert!(line.contains("title ~ \"red\""));
        assert!(line.ends_with("top rated only"));
    }
}
