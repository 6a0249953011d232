/// Data layer: core types, cleaning, loading, filtering and export.
///
/// Architecture:
/// ```text
///  scraped .csv ──▶ clean ──┐
///                           ▼
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table   │  Vec<Record>, price range, rating/availability sets
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter  │  apply FilterCriteria → filtered Table ──▶ export
///   └──────────┘
/// ```

pub mod clean;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
