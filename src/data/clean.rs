use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::model::{Availability, Record, Table, parse_rating};
use crate::stats::describe::median;

/// One row as produced by the scraper: rating as a word, price possibly
/// missing or garbled.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRow {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub price: Option<f64>,
    pub rating: Option<String>,
    pub availability: Option<String>,
}

/// What the cleaning pass did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanSummary {
    pub rows_read: usize,
    pub kept: usize,
    pub imputed_prices: usize,
    pub dropped: usize,
    /// Median used for imputation, `None` when no row had a price.
    pub median_price: Option<f64>,
}

/// Turn scraped rows into a clean table.
///
/// * rating words become integers `1..=5`
/// * a missing price takes the median of the present prices
/// * rows without a title, a valid rating, a known availability or a usable
///   price are dropped
pub fn clean_rows(rows: Vec<RawRow>) -> (Table, CleanSummary) {
    let present: Vec<f64> = rows
        .iter()
        .filter_map(|r| r.price)
        .filter(|p| p.is_finite() && *p >= 0.0)
        .collect();
    let median_price = Some(median(&present)).filter(|m| !m.is_nan());

    let mut summary = CleanSummary {
        rows_read: rows.len(),
        median_price,
        ..Default::default()
    };

    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        let title = row.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
        let rating = row.rating.as_deref().and_then(parse_rating);
        let availability = row
            .availability
            .as_deref()
            .and_then(|a| a.parse::<Availability>().ok());

        let (price, imputed) = match row.price {
            Some(p) if p.is_finite() && p >= 0.0 => (Some(p), false),
            _ => (median_price, true),
        };

        match (title, price, rating, availability) {
            (Some(title), Some(price), Some(rating), Some(availability)) => {
                if imputed {
                    summary.imputed_prices += 1;
                }
                records.push(Record::new(title, price, rating, availability));
            }
            _ => {
                log::debug!("Dropping raw row {i}: {row:?}");
                summary.dropped += 1;
            }
        }
    }

    summary.kept = records.len();
    log::info!(
        "Cleaned {} rows: kept {}, imputed {} prices, dropped {}",
        summary.rows_read,
        summary.kept,
        summary.imputed_prices,
        summary.dropped
    );
    (Table::from_records(records), summary)
}

/// Read a scraped CSV (`title,price,rating,availability`) and clean it.
pub fn clean_file(path: &Path) -> Result<(Table, CleanSummary)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening raw CSV {}", path.display()))?;

    let rows = reader
        .deserialize::<RawRow>()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("raw CSV row {i}")))
        .collect::<Result<Vec<_>>>()?;

    Ok(clean_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::PriceBand;
    use std::io::Write;

    fn raw(title: &str, price: Option<f64>, rating: &str, availability: &str) -> RawRow {
        RawRow {
            title: Some(title.to_string()),
            price,
            rating: Some(rating.to_string()),
            availability: Some(availability.to_string()),
        }
    }

    #[test]
    fn no_prices_at_all_drops_everything() {
        let (table, summary) = clean_rows(vec![raw("A", None, "One", "In stock")]);
        assert!(table.is_empty());
        assert_eq!(summary.median_price, None);
        assert_eq!(summary.dropped, 1);
    }

    #[test]
    fn maps_words_and_imputes_median() {
        let rows = vec![
            raw("A", Some(10.0), "One", "In stock"),
            raw("B", None, "Four", "In stock"),
            raw("C", Some(30.0), "Five", "Out of stock"),
            raw("D", Some(50.0), "Two", "In stock"),
            raw("E", Some(12.0), "Seven", "In stock"),
        ];
        let (table, summary) = clean_rows(rows);

        assert_eq!(summary.rows_read, 5);
        assert_eq!(summary.kept, 4);
        assert_eq!(summary.dropped, 1);
        assert_eq!(summary.imputed_prices, 1);
        // median of 10, 30, 50, 12
        assert_eq!(summary.median_price, Some(21.0));

        let b = &table.records()[1];
        assert_eq!(b.price, 21.0);
        assert_eq!(b.rating, 4);
        assert_eq!(b.price_band(), PriceBand::Affordable);
    }

    #[test]
    fn clean_file_tolerates_garbled_prices() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books_data.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(
            f,
            "title,price,rating,availability\n\
             Sharp Objects,47.82,Four,In stock\n\
             Olio,£23.88,One,In stock\n\
             Soumission,,One,Out of stock\n"
        )
        .unwrap();

        let (table, summary) = clean_file(&path).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(summary.imputed_prices, 2);
        assert!(table.records()[1..].iter().all(|r| r.price == 47.82));
    }
}
