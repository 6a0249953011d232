use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Availability, Record, Table, parse_rating};
use crate::error::DataError;

/// Column names every input format must provide.
pub const COLUMNS: [&str; 4] = ["title", "price", "rating", "availability"];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the catalogue for a session.
///
/// Any failure, including a file that parses but holds no usable rows, is
/// reported as [`DataError::Unavailable`].
pub fn load_table(path: &Path) -> Result<Table, DataError> {
    if !path.exists() {
        return Err(DataError::unavailable(path, "file does not exist"));
    }
    let table = load_file(path).map_err(|e| DataError::unavailable(path, format!("{e:#}")))?;
    if table.is_empty() {
        return Err(DataError::unavailable(path, "no usable records"));
    }
    log::info!("Loaded {} records from {}", table.len(), path.display());
    Ok(table)
}

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with `title,price,rating,availability`
/// * `.json`    – `[{ "title": ..., "price": ..., ... }, ...]`
/// * `.parquet` – one column per field
///
/// Rows that cannot be read, or that have a missing or unparseable field,
/// are skipped with a warning.
pub fn load_file(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Row assembly shared by all formats
// ---------------------------------------------------------------------------

/// Counts rows that were dropped while loading.
#[derive(Debug, Default)]
struct Skipped(usize);

impl Skipped {
    fn note(&mut self, row: usize, reason: &str) {
        log::debug!("Skipping row {row}: {reason}");
        self.0 += 1;
    }

    fn finish(self, records: Vec<Record>, source: &str) -> Table {
        if self.0 > 0 {
            log::warn!("{source}: skipped {} unusable rows", self.0);
        }
        Table::from_records(records)
    }
}

fn build_record(
    title: Option<&str>,
    price: Option<f64>,
    rating: Option<&str>,
    availability: Option<&str>,
) -> Result<Record, String> {
    let title = title.and_then(non_empty).ok_or("missing title")?;
    let price = price.ok_or("missing price")?;
    if !price.is_finite() || price < 0.0 {
        return Err(format!("invalid price {price}"));
    }
    let rating_text = rating.ok_or("missing rating")?;
    let rating = parse_rating(rating_text).ok_or_else(|| format!("invalid rating '{rating_text}'"))?;
    let availability: Availability = availability.ok_or("missing availability")?.parse()?;
    Ok(Record::new(title, price, rating, availability))
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names; extra columns are ignored.
fn load_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();

    let mut idx = [0usize; 4];
    for (slot, name) in idx.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("CSV missing '{name}' column"))?;
    }
    let [title_idx, price_idx, rating_idx, avail_idx] = idx;

    let mut records = Vec::new();
    let mut skipped = Skipped::default();

    for (row_no, result) in reader.records().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                skipped.note(row_no, &e.to_string());
                continue;
            }
        };
        let field = |i: usize| row.get(i).and_then(non_empty);

        let price = field(price_idx).and_then(|p| p.parse::<f64>().ok());
        match build_record(field(title_idx), price, field(rating_idx), field(avail_idx)) {
            Ok(rec) => records.push(rec),
            Err(reason) => skipped.note(row_no, &reason),
        }
    }

    Ok(skipped.finish(records, "CSV"))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "title": "Sharp Objects", "price": 47.82, "rating": 4, "availability": "In stock" },
///   ...
/// ]
/// ```
///
/// `rating` may be a number or a rating word.
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = Skipped::default();

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let title = obj.get("title").and_then(JsonValue::as_str);
        let price = obj.get("price").and_then(json_to_f64);
        let rating = obj.get("rating").and_then(json_to_text);
        let availability = obj.get("availability").and_then(JsonValue::as_str);

        match build_record(title, price, rating.as_deref(), availability) {
            Ok(rec) => records.push(rec),
            Err(reason) => skipped.note(i, &reason),
        }
    }

    Ok(skipped.finish(records, "JSON"))
}

fn json_to_f64(val: &JsonValue) -> Option<f64> {
    match val {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_to_text(val: &JsonValue) -> Option<String> {
    match val {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with `title`, `price`, `rating` and `availability`
/// columns.
///
/// Column types are normalised with Arrow's cast kernel, so files written by
/// **Pandas** or **Polars** with integer, float or word ratings all load.
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    let mut skipped = Skipped::default();
    let mut row_base = 0usize;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let column = |name: &str, to: &DataType| -> Result<ArrayRef> {
            let i = schema
                .index_of(name)
                .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))?;
            cast(batch.column(i), to).with_context(|| format!("converting '{name}' to {to:?}"))
        };

        let titles = column("title", &DataType::Utf8)?;
        let prices = column("price", &DataType::Float64)?;
        let ratings = column("rating", &DataType::Utf8)?;
        let avail = column("availability", &DataType::Utf8)?;

        let titles = titles.as_string::<i32>();
        let prices = prices.as_primitive::<Float64Type>();
        let ratings = ratings.as_string::<i32>();
        let avail = avail.as_string::<i32>();

        for row in 0..batch.num_rows() {
            let price = (!prices.is_null(row)).then(|| prices.value(row));

            match build_record(
                string_at(titles, row),
                price,
                string_at(ratings, row),
                string_at(avail, row),
            ) {
                Ok(rec) => records.push(rec),
                Err(reason) => skipped.note(row_base + row, &reason),
            }
        }
        row_base += batch.num_rows();
    }

    Ok(skipped.finish(records, "Parquet"))
}

fn string_at(arr: &StringArray, row: usize) -> Option<&str> {
    if arr.is_null(row) {
        return None;
    }
    non_empty(arr.value(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn csv_with_words_and_extra_columns() {
        let (_dir, path) = write_temp(
            "books.csv",
            "title,price,rating,availability,price_category\n\
             A Light in the Attic,51.77,Three,In stock,Expensive\n\
             \"Sapiens: A Brief History, of Humankind\",54.23,5,In stock,Expensive\n\
             Broken Row,,4,In stock,\n\
             Sharp Objects,47.82,4,Out of stock,Expensive\n",
        );
        let table = load_file(&path).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.records()[0].rating, 3);
        assert_eq!(table.records()[1].title, "Sapiens: A Brief History, of Humankind");
        assert_eq!(table.records()[2].availability, Availability::OutOfStock);
    }

    #[test]
    fn csv_missing_column_is_an_error() {
        let (_dir, path) = write_temp("books.csv", "title,price,rating\nA,1.0,3\n");
        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("availability"));
    }

    #[test]
    fn json_records() {
        let (_dir, path) = write_temp(
            "books.json",
            r#"[
                {"title": "Soumission", "price": 50.1, "rating": "One", "availability": "In stock"},
                {"title": "Olio", "price": "23.88", "rating": 1.0, "availability": "out_of_stock"},
                {"title": "No rating", "price": 3.0, "availability": "In stock"}
            ]"#,
        );
        let table = load_file(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[1].price, 23.88);
        assert_eq!(table.records()[1].availability, Availability::OutOfStock);
    }

    #[test]
    fn unsupported_extension() {
        let (_dir, path) = write_temp("books.xlsx", "");
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn ragged_csv_rows_do_not_abort_the_load() {
        let (_dir, path) = write_temp(
            "books.csv",
            "title,price,rating,availability\n\
             A,10,3,In stock\n\
             B,11,4,In stock,extra\n\
             C,12\n\
             D,13,5,Out of stock\n",
        );
        let table = load_file(&path).unwrap();
        let titles: Vec<&str> = table.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["A", "B", "D"]);
    }

    #[test]
    fn json_titles_are_normalised_like_other_formats() {
        let (dir, path) = write_temp(
            "books.json",
            r#"[
                {"title": "  Padded Title ", "price": 12.5, "rating": 3, "availability": "In stock"},
                {"title": "", "price": 9.0, "rating": 2, "availability": "In stock"},
                {"title": "   ", "price": 9.0, "rating": 2, "availability": "In stock"}
            ]"#,
        );
        let table = load_file(&path).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].title, "Padded Title");

        for ext in ["csv", "parquet"] {
            let out = dir.path().join(format!("again.{ext}"));
            crate::data::export::write_file(&out, &table).unwrap();
            let back = load_file(&out).unwrap();
            assert_eq!(back.records(), table.records(), "{ext}");
        }
    }

    #[test]
    fn missing_and_empty_files_are_unavailable() {
        let missing = Path::new("/definitely/not/here/books.csv");
        assert!(matches!(load_table(missing), Err(DataError::Unavailable { .. })));

        let (_dir, path) = write_temp("empty.csv", "title,price,rating,availability\n");
        match load_table(&path) {
            Err(DataError::Unavailable { reason, .. }) => assert!(reason.contains("no usable")),
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }
}
