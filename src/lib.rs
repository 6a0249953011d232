//! Book-catalogue analysis: load a cleaned table of books, filter it, and
//! report descriptive statistics plus a battery of hypothesis tests.

pub mod config;
pub mod data;
pub mod error;
pub mod interactive;
pub mod render;
pub mod session;
pub mod stats;

pub use config::AnalysisConfig;
pub use data::filter::FilterCriteria;
pub use data::model::{Availability, PriceBand, Record, Table};
pub use error::DataError;
pub use session::Session;
pub use stats::Report;
