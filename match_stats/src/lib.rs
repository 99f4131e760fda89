mod config;
use log::{debug, info};

pub mod aggregate;
pub mod builder;
pub mod export;
pub mod filter;
pub mod manual;
pub mod pagination;
pub mod sort;
pub mod specialty;
pub mod table;

pub use crate::config::*;
pub use crate::table::{classify_column, Column, ColumnRole, Row, Table};

/// How the summary table is built from the source table: the filters, the
/// grouping and the ordering. The dashboard holds one of these and replaces
/// it on every user change.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ViewState {
    pub filters: FilterState,
    pub group_by: GroupBy,
    pub sort: SortState,
}

impl ViewState {
    pub fn initial(bounds: &DatasetBounds) -> ViewState {
        ViewState {
            filters: FilterState::unrestricted(bounds),
            group_by: GroupBy::None,
            sort: SortState::UNSORTED,
        }
    }
}

/// Runs the filter, aggregation and sort passes over the table.
///
/// Every pass is recomputed from scratch; the result only depends on the
/// table and on the view state.
pub fn run_view(table: &Table, view: &ViewState) -> Aggregation {
    info!(
        "run_view: {} rows, years {}-{}, group by {:?}, sort {:?}",
        table.len(),
        view.filters.year_range.min(),
        view.filters.year_range.max(),
        view.group_by,
        view.sort
    );
    let filtered = filter::filter(table, &view.filters);
    debug!("run_view: {} rows after filtering", filtered.len());
    let agg = aggregate::aggregate(
        table,
        &filtered,
        &view.filters.year_range,
        view.group_by,
    );
    Aggregation {
        rows: sort::sort(&agg.rows, &view.sort),
        totals: agg.totals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TableBuilder;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn table() -> Table {
        TableBuilder::new(&[
            "Program Code",
            "Sponsoring Institution",
            "Specialty Cleaned",
            "SNHAF",
        ])
        .years(2020, 2025)
        .row(&[
            ("Program Code", "1"),
            ("Sponsoring Institution", "A"),
            ("Specialty Cleaned", "Surgery"),
            ("SNHAF", "SNHAF"),
        ])
        .metrics(2020, 10, 8)
        .row(&[
            ("Program Code", "2"),
            ("Sponsoring Institution", "B"),
            ("Specialty Cleaned", "Pediatrics"),
            ("SNHAF", "NOT"),
        ])
        .metrics(2020, 4, 1)
        .metrics(2024, 4, 4)
        .row(&[
            ("Program Code", "3"),
            ("Sponsoring Institution", "A"),
            ("Specialty Cleaned", "Pediatrics"),
            ("SNHAF", "SNHAF"),
        ])
        .metrics(2021, 5, 5)
        .build()
    }

    #[test]
    fn grouped_view_sorted_by_rate() {
        init();
        let t = table();
        let mut view = ViewState::initial(&DatasetBounds::DEFAULT_BOUNDS);
        view.group_by = GroupBy::Institution;
        view.sort = SortState {
            key: Some(SortKey::MatchRate),
            direction: SortDirection::Descending,
        };
        let agg = run_view(&t, &view);
        let names: Vec<&str> = agg
            .rows
            .iter()
            .map(|r| r.fields.get("Sponsoring Institution"))
            .collect();
        // A: 13/15, B: 5/8
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(agg.totals.solicited, SeatCount(23));
        assert_eq!(agg.totals.matched, SeatCount(18));
        assert_eq!(agg.totals.not_matched, 5);
    }

    #[test]
    fn filtered_view() {
        init();
        let t = table();
        let mut view = ViewState::initial(&DatasetBounds::DEFAULT_BOUNDS);
        view.filters.year_range = YearRange::new(2020, 2021);
        view.filters.specialties.insert("Pediatrics".to_string());
        let agg = run_view(&t, &view);
        let codes: Vec<&str> = agg.rows.iter().map(|r| r.fields.get("Program Code")).collect();
        assert_eq!(codes, vec!["2", "3"]);
        // Program 2 only counts 2020 in this window.
        assert_eq!(agg.rows[0].solicited, SeatCount(4));
        assert_eq!(agg.rows[0].matched, SeatCount(1));
        assert_eq!(agg.totals.median_match_rate, (25.0 + 100.0) / 2.0);

        view.filters.category = CategoryFilter::CategoryA;
        let agg = run_view(&t, &view);
        assert_eq!(agg.rows.len(), 1);
        assert_eq!(agg.rows[0].fields.get("Program Code"), "3");
    }

    #[test]
    fn empty_result_is_a_valid_state() {
        init();
        let t = table();
        let mut view = ViewState::initial(&DatasetBounds::DEFAULT_BOUNDS);
        view.filters.year_range = YearRange::new(2025, 2025);
        let agg = run_view(&t, &view);
        assert!(agg.rows.is_empty());
        assert_eq!(agg.totals.solicited, SeatCount::EMPTY);
        assert_eq!(agg.totals.match_rate, 0.0);
        assert_eq!(agg.totals.median_match_rate, 0.0);
    }
}
