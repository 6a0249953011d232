use std::path::Path;

use crate::config::AnalysisConfig;
use crate::data::export;
use crate::data::filter::{FilterCriteria, apply};
use crate::data::loader::load_table;
use crate::data::model::Table;
use crate::error::DataError;
use crate::stats::Report;

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// One analysis session, independent of rendering.
///
/// The table is loaded once; every accepted change of criteria recomputes
/// the filtered table and the report from scratch.
#[derive(Debug, Clone)]
pub struct Session {
    /// Loaded table, never modified.
    table: Table,

    /// Last accepted criteria.
    criteria: FilterCriteria,

    /// Records passing `criteria`, in table order.
    filtered: Table,

    /// Report over `filtered`.
    report: Report,

    config: AnalysisConfig,

    /// Status / error message for the front-end.
    pub status_message: Option<String>,
}

impl Session {
    /// Load `path` and start with criteria that select everything.
    pub fn open(path: &Path, config: AnalysisConfig) -> Result<Self, DataError> {
        let table = load_table(path)?;
        Ok(Self::new(table, config))
    }

    pub fn new(table: Table, config: AnalysisConfig) -> Self {
        let criteria = FilterCriteria::widest(&table);
        let report = Report::compute(&table, &config);
        Self {
            filtered: table.clone(),
            table,
            criteria,
            report,
            config,
            status_message: None,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn filtered(&self) -> &Table {
        &self.filtered
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Replace the criteria and recompute.
    ///
    /// Invalid criteria are rejected; the previous criteria and report stay
    /// in place and the reason lands in `status_message`.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) -> Result<(), DataError> {
        if let Err(e) = criteria.validate() {
            log::warn!("Rejected criteria: {e}");
            self.status_message = Some(e.to_string());
            return Err(e);
        }

        self.filtered = apply(&self.table, &criteria);
        self.report = Report::compute(&self.filtered, &self.config);
        self.criteria = criteria;
        self.status_message = Some(format!(
            "{} of {} records selected",
            self.filtered.len(),
            self.table.len()
        ));
        Ok(())
    }

    /// Apply an edit to a copy of the current criteria.
    pub fn update_criteria(
        &mut self,
        edit: impl FnOnce(&mut FilterCriteria),
    ) -> Result<(), DataError> {
        let mut next = self.criteria.clone();
        edit(&mut next);
        self.set_criteria(next)
    }

    /// Back to the widest criteria.
    pub fn reset(&mut self) {
        let widest = FilterCriteria::widest(&self.table);
        self.filtered = self.table.clone();
        self.report = Report::compute(&self.filtered, &self.config);
        self.criteria = widest;
        self.status_message = None;
    }

    /// Write the filtered table to `path`.
    pub fn export(&mut self, path: &Path) -> anyhow::Result<()> {
        export::write_file(path, &self.filtered)?;
        self.status_message = Some(format!(
            "Exported {} records to {}",
            self.filtered.len(),
            path.display()
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_file;
    use crate::data::model::{Availability, Record};
    use std::collections::BTreeSet;

    fn session() -> Session {
        let table = Table::from_records(vec![
            Record::new("A Light in the Attic", 10.0, 2, Availability::InStock),
            Record::new("Tipping the Velvet", 20.0, 4, Availability::InStock),
            Record::new("Soumission", 30.0, 5, Availability::OutOfStock),
        ]);
        Session::new(table, AnalysisConfig::default())
    }

    #[test]
    fn starts_with_everything_selected() {
        let s = session();
        assert_eq!(s.filtered().len(), 3);
        assert_eq!(s.report().count, 3);
        assert_eq!(s.criteria(), &FilterCriteria::widest(s.table()));
    }

    #[test]
    fn criteria_change_recomputes_report() {
        let mut s = session();
        s.update_criteria(|c| {
            c.price_min = 15.0;
            c.ratings = BTreeSet::from([4, 5]);
        })
        .unwrap();
        assert_eq!(s.report().count, 2);
        assert!((s.report().price.mean - 25.0).abs() < 1e-12);
        assert_eq!(s.status_message.as_deref(), Some("2 of 3 records selected"));

        s.reset();
        assert_eq!(s.report().count, 3);
    }

    #[test]
    fn invalid_criteria_keep_previous_state() {
        let mut s = session();
        s.update_criteria(|c| c.top_rated_only = true).unwrap();
        let before = (s.criteria().clone(), s.report().clone());

        let err = s
            .update_criteria(|c| {
                c.price_min = 50.0;
                c.price_max = 10.0;
            })
            .unwrap_err();
        assert!(matches!(err, DataError::InvalidCriteria(_)));
        assert_eq!(s.criteria(), &before.0);
        assert_eq!(s.report().count, before.1.count);
        assert!(s.status_message.is_some());
    }

    #[test]
    fn export_writes_filtered_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("top.csv");

        let mut s = session();
        s.update_criteria(|c| c.availability = BTreeSet::from([Availability::OutOfStock]))
            .unwrap();
        s.export(&path).unwrap();

        let back = load_file(&path).unwrap();
        assert_eq!(back.records(), s.filtered().records());
    }

    #[test]
    fn open_missing_file_is_unavailable() {
        let err = Session::open(Path::new("/nonexistent/books.csv"), AnalysisConfig::default())
            .unwrap_err();
        assert!(matches!(err, DataError::Unavailable { .. }));
    }
}
