use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

use super::model::{Availability, PriceBand, Table};

/// One exported row. `price_category` is derived and ignored on re-import.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    title: &'a str,
    price: f64,
    rating: u8,
    availability: Availability,
    price_category: PriceBand,
}

fn export_rows(table: &Table) -> impl Iterator<Item = ExportRow<'_>> {
    table.iter().map(|rec| ExportRow {
        title: &rec.title,
        price: rec.price,
        rating: rec.rating,
        availability: rec.availability,
        price_category: rec.price_band(),
    })
}

/// Write a table to `path` in the format implied by its extension.
///
/// The layout matches what [`super::loader::load_file`] reads back.
pub fn write_file(path: &Path, table: &Table) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
    }

    match ext.as_str() {
        "csv" => write_csv(path, table),
        "json" => write_json(path, table),
        "parquet" | "pq" => write_parquet(path, table),
        other => bail!("Unsupported file extension: .{other}"),
    }?;

    log::info!("Wrote {} records to {}", table.len(), path.display());
    Ok(())
}

/// Render a table as CSV text, e.g. for a download or a pipe.
pub fn to_csv_string(table: &Table) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    write_csv_rows(&mut writer, table)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("flushing CSV")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

fn write_csv(path: &Path, table: &Table) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    write_csv_rows(&mut writer, table)?;
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_csv_rows<W: Write>(writer: &mut csv::Writer<W>, table: &Table) -> Result<()> {
    if table.is_empty() {
        // serialize() only emits headers alongside the first row
        writer
            .write_record(["title", "price", "rating", "availability", "price_category"])
            .context("writing CSV header")?;
    }
    for row in export_rows(table) {
        writer.serialize(row).context("writing CSV row")?;
    }
    Ok(())
}

fn write_json(path: &Path, table: &Table) -> Result<()> {
    let file = File::create(path).context("creating JSON file")?;
    let rows: Vec<ExportRow<'_>> = export_rows(table).collect();
    serde_json::to_writer_pretty(BufWriter::new(file), &rows).context("writing JSON")?;
    Ok(())
}

fn write_parquet(path: &Path, table: &Table) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("title", DataType::Utf8, false),
        Field::new("price", DataType::Float64, false),
        Field::new("rating", DataType::Int64, false),
        Field::new("availability", DataType::Utf8, false),
        Field::new("price_category", DataType::Utf8, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(table.iter().map(|r| r.title.as_str()))),
        Arc::new(Float64Array::from_iter_values(table.iter().map(|r| r.price))),
        Arc::new(Int64Array::from_iter_values(table.iter().map(|r| i64::from(r.rating)))),
        Arc::new(StringArray::from_iter_values(table.iter().map(|r| r.availability.label()))),
        Arc::new(StringArray::from_iter_values(table.iter().map(|r| r.price_band().label()))),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}
