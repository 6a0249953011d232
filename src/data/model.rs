use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Availability – stock status of a book
// ---------------------------------------------------------------------------

/// Stock status as shown on the catalogue page.
///
/// `Ord` so it can live in a `BTreeSet` inside the filter criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Availability {
    #[serde(rename = "In stock", alias = "in_stock")]
    InStock,
    #[serde(rename = "Out of stock", alias = "out_of_stock")]
    OutOfStock,
}

impl Availability {
    pub const ALL: [Availability; 2] = [Availability::InStock, Availability::OutOfStock];

    pub fn label(self) -> &'static str {
        match self {
            Availability::InStock => "In stock",
            Availability::OutOfStock => "Out of stock",
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Availability {
    type Err = String;

    /// Accepts the scraped labels as well as snake/compact spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "instock" | "in" => Ok(Availability::InStock),
            "outofstock" | "out" => Ok(Availability::OutOfStock),
            _ => Err(format!("unknown availability '{}'", s.trim())),
        }
    }
}

// ---------------------------------------------------------------------------
// PriceBand – categorical price bucket
// ---------------------------------------------------------------------------

/// Right-closed price buckets: (0,20], (20,40], (40,60], (60,100], (100,∞).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriceBand {
    Cheap,
    Affordable,
    Expensive,
    Premium,
    Luxury,
}

impl PriceBand {
    pub fn for_price(price: f64) -> Self {
        if price <= 20.0 {
            PriceBand::Cheap
        } else if price <= 40.0 {
            PriceBand::Affordable
        } else if price <= 60.0 {
            PriceBand::Expensive
        } else if price <= 100.0 {
            PriceBand::Premium
        } else {
            PriceBand::Luxury
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PriceBand::Cheap => "Cheap",
            PriceBand::Affordable => "Affordable",
            PriceBand::Expensive => "Expensive",
            PriceBand::Premium => "Premium",
            PriceBand::Luxury => "Luxury",
        }
    }
}

impl fmt::Display for PriceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Rating parsing
// ---------------------------------------------------------------------------

/// Valid star ratings.
pub const RATINGS: std::ops::RangeInclusive<u8> = 1..=5;

/// Parse a rating given either as a digit or as the word used in the
/// catalogue's CSS class (`One`..`Five`).
pub fn parse_rating(s: &str) -> Option<u8> {
    let s = s.trim();
    let value = match s.to_ascii_lowercase().as_str() {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        other => {
            // "4" and "4.0" both occur in exported frames
            let v: f64 = other.parse().ok()?;
            if v.fract() != 0.0 {
                return None;
            }
            v as i64
        }
    };
    u8::try_from(value).ok().filter(|r| RATINGS.contains(r))
}

// ---------------------------------------------------------------------------
// Record – one row of the catalogue
// ---------------------------------------------------------------------------

/// A single cleaned book record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub title: String,
    /// Price in pounds, non-negative.
    pub price: f64,
    /// Star rating in `1..=5`.
    pub rating: u8,
    pub availability: Availability,
}

impl Record {
    pub fn new(title: impl Into<String>, price: f64, rating: u8, availability: Availability) -> Self {
        Record {
            title: title.into(),
            price,
            rating,
            availability,
        }
    }

    pub fn price_band(&self) -> PriceBand {
        PriceBand::for_price(self.price)
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded catalogue
// ---------------------------------------------------------------------------

/// An ordered, immutable sequence of records with pre-computed indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    records: Vec<Record>,
    /// Observed `(min, max)` price, `None` when empty.
    price_range: Option<(f64, f64)>,
    /// Distinct ratings present.
    ratings: BTreeSet<u8>,
    /// Distinct availability values present.
    availabilities: BTreeSet<Availability>,
}

impl Table {
    /// Build the table and its indices from loaded records.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut ratings = BTreeSet::new();
        let mut availabilities = BTreeSet::new();
        let mut price_range: Option<(f64, f64)> = None;

        for rec in &records {
            ratings.insert(rec.rating);
            availabilities.insert(rec.availability);
            price_range = Some(match price_range {
                None => (rec.price, rec.price),
                Some((lo, hi)) => (lo.min(rec.price), hi.max(rec.price)),
            });
        }

        Table {
            records,
            price_range,
            ratings,
            availabilities,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn price_range(&self) -> Option<(f64, f64)> {
        self.price_range
    }

    pub fn ratings(&self) -> &BTreeSet<u8> {
        &self.ratings
    }

    pub fn availabilities(&self) -> &BTreeSet<Availability> {
        &self.availabilities
    }

    pub fn prices(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.price).collect()
    }

    pub fn rating_values(&self) -> Vec<f64> {
        self.records.iter().map(|r| f64::from(r.rating)).collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rating_words_and_digits() {
        assert_eq!(parse_rating("Three"), Some(3));
        assert_eq!(parse_rating(" five "), Some(5));
        assert_eq!(parse_rating("4"), Some(4));
        assert_eq!(parse_rating("2.0"), Some(2));
        assert_eq!(parse_rating("0"), None);
        assert_eq!(parse_rating("6"), None);
        assert_eq!(parse_rating("2.5"), None);
        assert_eq!(parse_rating("Zero"), None);
    }

    #[test]
    fn parses_availability_spellings() {
        assert_eq!("In stock".parse::<Availability>(), Ok(Availability::InStock));
        assert_eq!("out_of_stock".parse::<Availability>(), Ok(Availability::OutOfStock));
        assert_eq!("OUT".parse::<Availability>(), Ok(Availability::OutOfStock));
        assert!("backorder".parse::<Availability>().is_err());
    }

    #[test]
    fn price_bands_are_right_closed() {
        assert_eq!(PriceBand::for_price(20.0), PriceBand::Cheap);
        assert_eq!(PriceBand::for_price(20.01), PriceBand::Affordable);
        assert_eq!(PriceBand::for_price(60.0), PriceBand::Expensive);
        assert_eq!(PriceBand::for_price(100.0), PriceBand::Premium);
        assert_eq!(PriceBand::for_price(150.0), PriceBand::Luxury);
    }

    #[test]
    fn table_indexes_ranges_and_sets() {
        let table = Table::from_records(vec![
            Record::new("a", 12.5, 3, Availability::InStock),
            Record::new("b", 48.0, 5, Availability::InStock),
            Record::new("c", 7.25, 3, Availability::OutOfStock),
        ]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.price_range(), Some((7.25, 48.0)));
        assert_eq!(table.ratings().iter().copied().collect::<Vec<_>>(), vec![3, 5]);
        assert_eq!(table.availabilities().len(), 2);

        let empty = Table::from_records(Vec::new());
        assert!(empty.is_empty());
        assert_eq!(empty.price_range(), None);
    }
}
