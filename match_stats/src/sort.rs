use std::cmp::Ordering;

use log::debug;

use crate::config::*;
use crate::table::{classify_column, ColumnRole};

fn compare_by_key(key: &SortKey, a: &AggregatedRow, b: &AggregatedRow) -> Ordering {
    match key {
        SortKey::Solicited => a.solicited.cmp(&b.solicited),
        SortKey::Matched => a.matched.cmp(&b.matched),
        SortKey::NotMatched => a.not_matched.cmp(&b.not_matched),
        SortKey::MatchRate => a.match_rate.total_cmp(&b.match_rate),
        SortKey::Column(name) => match classify_column(name) {
            // Yearly metrics compare on the summed value, not on the cell text.
            ColumnRole::YearMetric { year, kind } => {
                a.bucket(year).get(kind).cmp(&b.bucket(year).get(kind))
            }
            _ => a.fields.get(name).cmp(b.fields.get(name)),
        },
    }
}

/// Returns the rows ordered by the sort state. The sort is stable in both
/// directions: rows with equal keys keep their relative order.
pub fn sort(rows: &[AggregatedRow], state: &SortState) -> Vec<AggregatedRow> {
    let mut res = rows.to_vec();
    if let Some(key) = &state.key {
        debug!("sort: {} rows by {:?} {:?}", res.len(), key, state.direction);
        res.sort_by(|a, b| match state.direction {
            SortDirection::Ascending => compare_by_key(key, a, b),
            SortDirection::Descending => compare_by_key(key, b, a),
        });
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::builder::TableBuilder;
    use crate::table::Row;

    fn rows() -> Vec<AggregatedRow> {
        let t = TableBuilder::new(&["Program Code", "Specialty"])
            .years(2020, 2020)
            .row(&[("Program Code", "c"), ("Specialty", "Urology")])
            .metrics(2020, 10, 9)
            .row(&[("Program Code", "a"), ("Specialty", "Anesthesiology")])
            .metrics(2020, 100, 9)
            .row(&[("Program Code", "b"), ("Specialty", "Urology")])
            .metrics(2020, 3, 3)
            .build();
        let rs: Vec<&Row> = t.rows().iter().collect();
        aggregate(&t, &rs, &YearRange::new(2020, 2020), GroupBy::None).rows
    }

    fn codes(rows: &[AggregatedRow]) -> Vec<&str> {
        rows.iter().map(|r| r.fields.get("Program Code")).collect()
    }

    fn by(key: SortKey, direction: SortDirection) -> SortState {
        SortState {
            key: Some(key),
            direction,
        }
    }

    #[test]
    fn no_key_keeps_order() {
        let r = rows();
        assert_eq!(sort(&r, &SortState::UNSORTED), r);
    }

    #[test]
    fn numeric_not_textual() {
        let r = rows();
        let sorted = sort(&r, &by(SortKey::Solicited, SortDirection::Ascending));
        // "100" < "3" as text, but not as numbers.
        assert_eq!(codes(&sorted), vec!["b", "c", "a"]);
        let sorted = sort(
            &r,
            &by(SortKey::Column("2020 Quota".to_string()), SortDirection::Descending),
        );
        assert_eq!(codes(&sorted), vec!["a", "c", "b"]);
        let sorted = sort(&r, &by(SortKey::MatchRate, SortDirection::Descending));
        assert_eq!(codes(&sorted), vec!["b", "c", "a"]);
    }

    #[test]
    fn stable_for_equal_keys() {
        let r = rows();
        let sorted = sort(&r, &by(SortKey::Matched, SortDirection::Ascending));
        // c and a both matched 9 and keep their input order.
        assert_eq!(codes(&sorted), vec!["b", "c", "a"]);
        let sorted = sort(&r, &by(SortKey::Matched, SortDirection::Descending));
        assert_eq!(codes(&sorted), vec!["c", "a", "b"]);
        let sorted = sort(
            &r,
            &by(SortKey::Column("Specialty".to_string()), SortDirection::Descending),
        );
        assert_eq!(codes(&sorted), vec!["c", "b", "a"]);
    }

    #[test]
    fn does_not_mutate_input() {
        let r = rows();
        let before = r.clone();
        let _ = sort(&r, &by(SortKey::Column("Program Code".to_string()), SortDirection::Ascending));
        assert_eq!(r, before);
    }
}
