use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::model::{Availability, RATINGS, Record, Table};
use crate::error::DataError;

/// Ratings counted as "top rated".
pub const TOP_RATED_MIN: u8 = 4;

// ---------------------------------------------------------------------------
// Filter criteria: what the user has selected
// ---------------------------------------------------------------------------

/// User-selected constraints narrowing a [`Table`].
///
/// An empty `ratings` or `availability` set means nothing is selected for
/// that column, so nothing passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub price_min: f64,
    pub price_max: f64,
    pub ratings: BTreeSet<u8>,
    pub availability: BTreeSet<Availability>,
    /// Case-insensitive substring; `None` or empty means no constraint.
    pub title_substring: Option<String>,
    /// Keep only ratings of 4 and 5.
    #[serde(default)]
    pub top_rated_only: bool,
}

impl FilterCriteria {
    /// Criteria selecting every record of `table` (i.e., show everything).
    pub fn widest(table: &Table) -> Self {
        let (price_min, price_max) = table.price_range().unwrap_or((0.0, 0.0));
        FilterCriteria {
            price_min,
            price_max,
            ratings: RATINGS.collect(),
            availability: Availability::ALL.into_iter().collect(),
            title_substring: None,
            top_rated_only: false,
        }
    }

    /// Reject bounds and selections that cannot be evaluated.
    pub fn validate(&self) -> Result<(), DataError> {
        if !self.price_min.is_finite() || !self.price_max.is_finite() {
            return Err(DataError::InvalidCriteria(format!(
                "price bounds must be finite, got [{}, {}]",
                self.price_min, self.price_max
            )));
        }
        if self.price_min > self.price_max {
            return Err(DataError::InvalidCriteria(format!(
                "price_min {} exceeds price_max {}",
                self.price_min, self.price_max
            )));
        }
        if let Some(bad) = self.ratings.iter().find(|r| !RATINGS.contains(r)) {
            return Err(DataError::InvalidCriteria(format!(
                "rating {bad} is outside 1..=5"
            )));
        }
        Ok(())
    }

    /// Whether a single record passes every active constraint.
    pub fn matches(&self, rec: &Record) -> bool {
        if rec.price < self.price_min || rec.price > self.price_max {
            return false;
        }
        if !self.ratings.contains(&rec.rating) {
            return false;
        }
        if !self.availability.contains(&rec.availability) {
            return false;
        }
        if self.top_rated_only && rec.rating < TOP_RATED_MIN {
            return false;
        }
        match self.title_substring.as_deref() {
            Some(needle) if !needle.is_empty() => rec
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Return indices of records that pass all constraints, in table order.
pub fn filtered_indices(table: &Table, criteria: &FilterCriteria) -> Vec<usize> {
    table
        .iter()
        .enumerate()
        .filter(|(_, rec)| criteria.matches(rec))
        .map(|(i, _)| i)
        .collect()
}

/// Return the filtered sub-table. Never fails; no match yields an empty table.
pub fn apply(table: &Table, criteria: &FilterCriteria) -> Table {
    let records = table
        .iter()
        .filter(|rec| criteria.matches(rec))
        .cloned()
        .collect();
    Table::from_records(records)
}

// ---------------------------------------------------------------------------
// Selection parsing (CLI flags and interactive commands)
// ---------------------------------------------------------------------------

/// Parse a comma-separated rating list such as `4,5`. Range checks are left
/// to [`FilterCriteria::validate`].
pub fn parse_ratings(s: &str) -> Result<BTreeSet<u8>, String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u8>()
                .map_err(|_| format!("'{part}' is not a rating"))
        })
        .collect()
}

/// Parse `all` or a comma-separated list of `in` / `out` (or the long forms).
pub fn parse_availability(s: &str) -> Result<BTreeSet<Availability>, String> {
    if s.trim().eq_ignore_ascii_case("all") {
        return Ok(Availability::ALL.into_iter().collect());
    }
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse::<Availability>)
        .collect()
}
