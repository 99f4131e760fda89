//! The in-memory relation built from the parsed CSV.

use std::collections::{BTreeMap, HashMap};

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::config::{MetricKind, SeatCount, Year, YearBucket};

lazy_static! {
    static ref YEAR_METRIC_RE: Regex = Regex::new(r"^(\d{4}) (Quota|Matched)$").unwrap();
}

/// The semantic role of a column, inferred from its name.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ColumnRole {
    YearMetric { year: Year, kind: MetricKind },
    ProgramCode,
    Category,
    Institution,
    Specialty,
    /// The `Table` column telling main specialties from subspecialties.
    TableSection,
    Other,
}

/// Classifies a header. The rules are tried in this order and the first one
/// that matches wins:
///
/// 1. `<4-digit year> Quota` or `<4-digit year> Matched` (exact case)
/// 2. contains both `program` and `code`
/// 3. contains `snhaf`, `category` or `institution type`
/// 4. contains `institution` or `sponsor`
/// 5. contains `specialty`
/// 6. is exactly `table`
///
/// Rules 2 to 6 ignore case. Rule 3 comes before rule 4 so that a column such
/// as `Institution Type` is not taken for the institution name.
pub fn classify_column(name: &str) -> ColumnRole {
    let trimmed = name.trim();
    if let Some(caps) = YEAR_METRIC_RE.captures(trimmed) {
        if let Ok(year) = caps[1].parse::<Year>() {
            let kind = if &caps[2] == "Quota" {
                MetricKind::Quota
            } else {
                MetricKind::Matched
            };
            return ColumnRole::YearMetric { year, kind };
        }
    }
    let lower = trimmed.to_lowercase();
    if lower.contains("program") && lower.contains("code") {
        ColumnRole::ProgramCode
    } else if lower.contains("snhaf")
        || lower.contains("category")
        || lower.contains("institution type")
    {
        ColumnRole::Category
    } else if lower.contains("institution") || lower.contains("sponsor") {
        ColumnRole::Institution
    } else if lower.contains("specialty") {
        ColumnRole::Specialty
    } else if lower == "table" {
        ColumnRole::TableSection
    } else {
        ColumnRole::Other
    }
}

/// Reads a metric cell. Anything that is not a non-negative number counts as
/// zero. Thousands separators are accepted and fractional values are rounded.
pub fn parse_count(cell: &str) -> SeatCount {
    let s: String = cell.trim().chars().filter(|c| *c != ',').collect();
    if s.is_empty() {
        return SeatCount::EMPTY;
    }
    if let Ok(x) = s.parse::<u64>() {
        return SeatCount(x);
    }
    match s.parse::<f64>() {
        Ok(x) if x.is_finite() && x > 0.0 => SeatCount(x.round() as u64),
        _ => SeatCount::EMPTY,
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Column {
    pub name: String,
    pub role: ColumnRole,
}

/// A mapping from column name to the raw cell content.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Row {
    cells: HashMap<String, String>,
}

impl Row {
    pub fn new(cells: HashMap<String, String>) -> Row {
        Row { cells }
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Row {
        Row {
            cells: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// The content of a cell, or the empty string when it is missing.
    pub fn get(&self, column: &str) -> &str {
        self.cells.get(column).map(|s| s.as_str()).unwrap_or("")
    }

    pub fn set(&mut self, column: &str, value: String) {
        self.cells.insert(column.to_string(), value);
    }
}

/// The normalized table. Header order is preserved as given.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Row>,
    metrics: BTreeMap<(Year, MetricKind), String>,
}

impl Table {
    pub fn empty() -> Table {
        Table::default()
    }

    /// Builds the table from the output of the CSV loader. Zero headers give
    /// an empty table, whatever the rows contain.
    pub fn normalize(headers: &[String], rows: Vec<HashMap<String, String>>) -> Table {
        if headers.is_empty() {
            debug!("normalize: no headers, returning an empty table");
            return Table::empty();
        }
        let columns: Vec<Column> = headers
            .iter()
            .map(|name| Column {
                name: name.clone(),
                role: classify_column(name),
            })
            .collect();
        let mut metrics: BTreeMap<(Year, MetricKind), String> = BTreeMap::new();
        for c in columns.iter() {
            if let ColumnRole::YearMetric { year, kind } = c.role {
                // A duplicated header keeps its first occurrence.
                metrics.entry((year, kind)).or_insert_with(|| c.name.clone());
            }
        }
        debug!(
            "normalize: {} columns, {} metric columns, {} rows",
            columns.len(),
            metrics.len(),
            rows.len()
        );
        Table {
            columns,
            rows: rows.into_iter().map(Row::new).collect(),
            metrics,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The distinct years that have at least one metric column, ascending.
    pub fn years(&self) -> Vec<Year> {
        let mut years: Vec<Year> = self.metrics.keys().map(|(y, _)| *y).collect();
        years.dedup();
        years
    }

    pub fn metric_column(&self, year: Year, kind: MetricKind) -> Option<&str> {
        self.metrics.get(&(year, kind)).map(|s| s.as_str())
    }

    fn first_with_role(&self, role: ColumnRole) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.role == role)
            .map(|c| c.name.as_str())
    }

    pub fn program_code_column(&self) -> Option<&str> {
        self.first_with_role(ColumnRole::ProgramCode)
    }

    pub fn institution_column(&self) -> Option<&str> {
        self.first_with_role(ColumnRole::Institution)
    }

    pub fn category_column(&self) -> Option<&str> {
        self.first_with_role(ColumnRole::Category)
    }

    pub fn table_section_column(&self) -> Option<&str> {
        self.first_with_role(ColumnRole::TableSection)
    }

    /// All columns whose name mentions a specialty.
    pub fn specialty_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.role == ColumnRole::Specialty)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// The column holding the canonical specialty name: `Specialty Cleaned`
    /// when present, otherwise the first specialty column.
    pub fn specialty_column(&self) -> Option<&str> {
        let cols = self.specialty_columns();
        cols.iter()
            .find(|name| name.trim().eq_ignore_ascii_case("specialty cleaned"))
            .or_else(|| cols.first())
            .copied()
    }

    /// The identifier columns, in header order.
    pub fn identifier_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| {
                matches!(
                    c.role,
                    ColumnRole::ProgramCode | ColumnRole::Institution | ColumnRole::Specialty
                )
            })
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn metric(&self, row: &Row, year: Year, kind: MetricKind) -> SeatCount {
        self.metric_column(year, kind)
            .map(|col| parse_count(row.get(col)))
            .unwrap_or(SeatCount::EMPTY)
    }

    /// Both metrics of a row for one year.
    pub fn bucket(&self, row: &Row, year: Year) -> YearBucket {
        YearBucket {
            quota: self.metric(row, year, MetricKind::Quota),
            matched: self.metric(row, year, MetricKind::Matched),
        }
    }
}
