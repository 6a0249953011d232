/// Statistics layer: everything the report shows about a filtered table.
///
/// ```text
///   filtered Table
///        │
///        ▼
///   ┌──────────┐   describe    summaries, matrices, histogram
///   │  Report  │── words       title word frequencies
///   └──────────┘── hypothesis  battery of guarded tests (+ shapiro)
/// ```

pub mod describe;
pub mod hypothesis;
pub mod report;
pub mod shapiro;
pub mod words;

pub use report::{NamedTest, RatingBand, Report};
