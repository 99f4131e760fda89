use std::collections::HashMap;

use log::debug;

pub use crate::config::*;
use crate::table::Table;

/// A builder for assembling a table without going through a CSV file.
///
/// It is mostly useful for tests and for callers that already hold the data
/// in memory.
///
/// ```
/// use match_stats::builder::TableBuilder;
///
/// let table = TableBuilder::new(&["Program Code", "Sponsoring Institution"])
///     .years(2020, 2021)
///     .row(&[("Program Code", "1234"), ("Sponsoring Institution", "A")])
///     .metrics(2020, 10, 8)
///     .build();
///
/// assert_eq!(table.years(), vec![2020, 2021]);
/// assert_eq!(table.len(), 1);
/// ```
pub struct TableBuilder {
    pub(crate) _headers: Vec<String>,
    pub(crate) _rows: Vec<HashMap<String, String>>,
}

impl TableBuilder {
    pub fn new(identifier_headers: &[&str]) -> TableBuilder {
        TableBuilder {
            _headers: identifier_headers.iter().map(|s| s.to_string()).collect(),
            _rows: Vec::new(),
        }
    }

    /// Appends the `Quota` and `Matched` columns for every year of the range.
    pub fn years(mut self, first: Year, last: Year) -> TableBuilder {
        for year in YearRange::new(first, last).years() {
            for kind in [MetricKind::Quota, MetricKind::Matched] {
                let name = kind.column_name(year);
                if !self._headers.contains(&name) {
                    self._headers.push(name);
                }
            }
        }
        self
    }

    /// Appends an arbitrary column.
    pub fn column(mut self, name: &str) -> TableBuilder {
        self._headers.push(name.to_string());
        self
    }

    /// Starts a new row with the given cells.
    pub fn row(mut self, cells: &[(&str, &str)]) -> TableBuilder {
        self._rows.push(
            cells
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    /// Sets the metrics of one year on the last row added.
    pub fn metrics(mut self, year: Year, quota: u64, matched: u64) -> TableBuilder {
        match self._rows.last_mut() {
            Some(row) => {
                row.insert(MetricKind::Quota.column_name(year), quota.to_string());
                row.insert(MetricKind::Matched.column_name(year), matched.to_string());
            }
            None => {
                debug!("TableBuilder::metrics: no row to attach year {} to", year);
            }
        }
        self
    }

    pub fn build(self) -> Table {
        Table::normalize(&self._headers, self._rows)
    }
}
