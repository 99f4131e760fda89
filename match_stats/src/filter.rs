use log::debug;

use crate::config::*;
use crate::table::{Row, Table};

/// Sum of both metrics over the years of the window.
pub fn window_activity(table: &Table, row: &Row, window: &YearRange) -> YearBucket {
    let mut acc = YearBucket::EMPTY;
    for year in window.years() {
        acc += table.bucket(row, year);
    }
    acc
}

/// A row is identified by its program code, or failing that by any non-empty
/// specialty column.
pub fn has_identifier(table: &Table, row: &Row) -> bool {
    let has_code = table
        .program_code_column()
        .map(|col| !row.get(col).trim().is_empty())
        .unwrap_or(false);
    has_code
        || table
            .specialty_columns()
            .iter()
            .any(|col| !row.get(col).trim().is_empty())
}

pub fn matches_specialty(table: &Table, row: &Row, state: &FilterState) -> bool {
    if state.specialties.is_empty() {
        return true;
    }
    match table.specialty_column() {
        Some(col) => state.specialties.contains(row.get(col)),
        None => false,
    }
}

pub fn matches_category(table: &Table, row: &Row, state: &FilterState) -> bool {
    match state.category.cell_value() {
        None => true,
        Some(expected) => table
            .category_column()
            .map(|col| row.get(col) == expected)
            .unwrap_or(false),
    }
}

/// Keeps the rows that satisfy every predicate of the filter state, in table
/// order. Rows without any activity in the window or without an identifier
/// are dropped as noise.
pub fn filter<'a>(table: &'a Table, state: &FilterState) -> Vec<&'a Row> {
    let res: Vec<&Row> = table
        .rows()
        .iter()
        .filter(|row| {
            window_activity(table, row, &state.year_range).is_active()
                && has_identifier(table, row)
                && matches_specialty(table, row, state)
                && matches_category(table, row, state)
        })
        .collect();
    debug!(
        "filter: kept {} of {} rows for years {}-{}, {} specialties, category {:?}",
        res.len(),
        table.len(),
        state.year_range.min(),
        state.year_range.max(),
        state.specialties.len(),
        state.category
    );
    res
}
