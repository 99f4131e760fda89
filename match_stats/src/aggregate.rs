use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};

use crate::config::*;
use crate::table::{Row, Table};

/// Percentage of filled positions. Zero when nothing was offered.
pub fn match_rate(solicited: SeatCount, matched: SeatCount) -> f64 {
    if solicited == SeatCount::EMPTY {
        0.0
    } else {
        (matched.0 as f64) * 100.0 / (solicited.0 as f64)
    }
}

/// The standard median: the middle value for an odd count, the mean of the
/// two middle values for an even count, and zero for no values.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

fn window_sum(buckets: &BTreeMap<Year, YearBucket>, window: &YearRange) -> YearBucket {
    let mut acc = YearBucket::EMPTY;
    for (_, b) in buckets.range(window.min()..=window.max()) {
        acc += *b;
    }
    acc
}

fn derive(
    kind: RecordKind,
    fields: Row,
    buckets: BTreeMap<Year, YearBucket>,
    window: &YearRange,
) -> AggregatedRow {
    let w = window_sum(&buckets, window);
    AggregatedRow {
        kind,
        fields,
        buckets,
        solicited: w.quota,
        matched: w.matched,
        not_matched: w.quota.difference(w.matched),
        match_rate: match_rate(w.quota, w.matched),
    }
}

impl AggregatedRow {
    /// Recomputes the derived fields for another year window. The yearly
    /// buckets already cover every year, so no regrouping is needed.
    pub fn with_window(&self, window: &YearRange) -> AggregatedRow {
        derive(self.kind, self.fields.clone(), self.buckets.clone(), window)
    }
}

fn row_buckets(table: &Table, row: &Row, years: &[Year]) -> BTreeMap<Year, YearBucket> {
    years
        .iter()
        .map(|year| (*year, table.bucket(row, *year)))
        .collect()
}

fn group_by_institution(
    table: &Table,
    rows: &[&Row],
    years: &[Year],
    window: &YearRange,
) -> Vec<AggregatedRow> {
    let inst_col = match table.institution_column() {
        Some(col) => col,
        None => {
            warn!("aggregate: grouping requested but the table has no institution column");
            return vec![];
        }
    };

    // Groups in the order their institution first appears.
    let mut order: Vec<(String, BTreeMap<Year, YearBucket>, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut dropped = 0;
    for row in rows.iter() {
        let name = row.get(inst_col).trim();
        if name.is_empty() {
            dropped += 1;
            continue;
        }
        let idx = *index.entry(name.to_string()).or_insert_with(|| {
            order.push((name.to_string(), BTreeMap::new(), 0));
            order.len() - 1
        });
        let entry = &mut order[idx];
        for (year, b) in row_buckets(table, row, years) {
            *entry.1.entry(year).or_insert(YearBucket::EMPTY) += b;
        }
        entry.2 += 1;
    }
    debug!(
        "group_by_institution: {} groups from {} rows, {} without institution",
        order.len(),
        rows.len(),
        dropped
    );

    order
        .into_iter()
        .map(|(name, buckets, members)| {
            let mut fields = Row::default();
            fields.set(inst_col, name);
            for (year, b) in buckets.iter() {
                for kind in [MetricKind::Quota, MetricKind::Matched] {
                    if let Some(col) = table.metric_column(*year, kind) {
                        fields.set(col, b.get(kind).0.to_string());
                    }
                }
            }
            derive(RecordKind::Group { members }, fields, buckets, window)
        })
        .collect()
}

/// Grand totals, median match rate and per-year column totals.
///
/// The per-year totals cover every year found in the rows' buckets, not only
/// the active window.
pub fn summarize(rows: &[AggregatedRow]) -> Totals {
    let solicited: SeatCount = rows.iter().map(|r| r.solicited).sum();
    let matched: SeatCount = rows.iter().map(|r| r.matched).sum();
    let rates: Vec<f64> = rows.iter().map(|r| r.match_rate).collect();

    let mut per_year: BTreeMap<Year, YearBucket> = BTreeMap::new();
    for r in rows.iter() {
        for (year, b) in r.buckets.iter() {
            *per_year.entry(*year).or_insert(YearBucket::EMPTY) += *b;
        }
    }

    Totals {
        solicited,
        matched,
        not_matched: solicited.difference(matched),
        match_rate: match_rate(solicited, matched),
        median_match_rate: median(&rates),
        per_year,
    }
}

/// Turns the filtered rows into the lines of the summary table.
///
/// Without grouping, every row is passed through. With grouping, rows sharing
/// an institution are summed year by year; rows without an institution are
/// left out. Institution names are trimmed before they are compared, so
/// `"A"` and `"A "` form a single group labelled `"A"`. Case and inner
/// spacing are kept as they are.
pub fn aggregate(
    table: &Table,
    rows: &[&Row],
    window: &YearRange,
    group_by: GroupBy,
) -> Aggregation {
    let years = table.years();
    let agg_rows: Vec<AggregatedRow> = match group_by {
        GroupBy::None => rows
            .iter()
            .map(|row| {
                derive(
                    RecordKind::Source,
                    (*row).clone(),
                    row_buckets(table, row, &years),
                    window,
                )
            })
            .collect(),
        GroupBy::Institution => group_by_institution(table, rows, &years, window),
    };
    let totals = summarize(&agg_rows);
    debug!(
        "aggregate: {} records, solicited {:?}, matched {:?}",
        agg_rows.len(),
        totals.solicited,
        totals.matched
    );
    Aggregation {
        rows: agg_rows,
        totals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TableBuilder;
    use crate::filter::filter;

    const INST: &str = "Sponsoring Institution";

    fn two_entries_same_institution() -> Table {
        TableBuilder::new(&["Program Code", INST])
            .years(2020, 2021)
            .row(&[("Program Code", "1"), (INST, "A")])
            .metrics(2020, 10, 8)
            .row(&[("Program Code", "2"), (INST, "A")])
            .metrics(2021, 5, 5)
            .build()
    }

    #[test]
    fn grouped_scenario() {
        let t = two_entries_same_institution();
        let rows: Vec<&Row> = t.rows().iter().collect();
        let window = YearRange::new(2020, 2021);
        let agg = aggregate(&t, &rows, &window, GroupBy::Institution);
        assert_eq!(agg.rows.len(), 1);
        let a = &agg.rows[0];
        assert_eq!(a.kind, RecordKind::Group { members: 2 });
        assert_eq!(a.fields.get(INST), "A");
        assert_eq!(a.fields.get("2020 Quota"), "10");
        assert_eq!(a.solicited, SeatCount(15));
        assert_eq!(a.matched, SeatCount(13));
        assert_eq!(a.not_matched, 2);
        assert!((a.match_rate - 86.666).abs() < 0.01);
    }

    #[test]
    fn window_rederivation_without_regrouping() {
        let t = two_entries_same_institution();
        let rows: Vec<&Row> = t.rows().iter().collect();
        let agg = aggregate(&t, &rows, &YearRange::new(2020, 2021), GroupBy::Institution);
        let narrowed = agg.rows[0].with_window(&YearRange::new(2021, 2021));
        assert_eq!(narrowed.solicited, SeatCount(5));
        assert_eq!(narrowed.matched, SeatCount(5));
        assert_eq!(narrowed.match_rate, 100.0);
        assert_eq!(narrowed.buckets, agg.rows[0].buckets);
    }

    #[test]
    fn groups_follow_first_occurrence() {
        let t = TableBuilder::new(&[INST])
            .years(2020, 2020)
            .row(&[(INST, "Zeta")])
            .metrics(2020, 1, 1)
            .row(&[(INST, "Alpha")])
            .metrics(2020, 1, 0)
            .row(&[(INST, "")])
            .metrics(2020, 3, 3)
            .row(&[(INST, "Zeta")])
            .metrics(2020, 2, 2)
            .build();
        let rows: Vec<&Row> = t.rows().iter().collect();
        let agg = aggregate(&t, &rows, &YearRange::new(2020, 2020), GroupBy::Institution);
        let names: Vec<&str> = agg.rows.iter().map(|r| r.fields.get(INST)).collect();
        assert_eq!(names, vec!["Zeta", "Alpha"]);
        assert_eq!(agg.rows[0].solicited, SeatCount(3));
    }

    #[test]
    fn ungrouped_conserves_matched() {
        let t = TableBuilder::new(&["Program Code"])
            .years(2020, 2023)
            .row(&[("Program Code", "a")])
            .metrics(2020, 4, 3)
            .metrics(2022, 6, 6)
            .row(&[("Program Code", "b")])
            .metrics(2021, 2, 1)
            .metrics(2023, 9, 2)
            .build();
        let bounds = DatasetBounds::new(2020, 2023);
        for (lo, hi) in [(2020, 2023), (2021, 2022), (2022, 2022), (2020, 2021)] {
            let mut state = FilterState::unrestricted(&bounds);
            state.year_range = YearRange::new(lo, hi);
            let rows = filter(&t, &state);
            let agg = aggregate(&t, &rows, &state.year_range, GroupBy::None);
            let expected: u64 = rows
                .iter()
                .flat_map(|r| state.year_range.years().map(|y| t.bucket(r, y).matched.0))
                .sum();
            let got: u64 = agg.rows.iter().map(|r| r.matched.0).sum();
            assert_eq!(got, expected, "window {}-{}", lo, hi);
            assert_eq!(agg.totals.matched.0, expected);
        }
    }

    #[test]
    fn median_examples() {
        assert_eq!(median(&[10.0, 20.0, 30.0, 40.0]), 25.0);
        assert_eq!(median(&[30.0, 10.0, 20.0]), 20.0);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn zero_solicited_has_zero_rate() {
        assert_eq!(match_rate(SeatCount::EMPTY, SeatCount::EMPTY), 0.0);
        let t = TableBuilder::new(&["Program Code"])
            .years(2020, 2021)
            .row(&[("Program Code", "x")])
            .metrics(2020, 0, 0)
            .metrics(2021, 4, 2)
            .build();
        let rows: Vec<&Row> = t.rows().iter().collect();
        let agg = aggregate(&t, &rows, &YearRange::new(2020, 2020), GroupBy::None);
        assert_eq!(agg.rows[0].match_rate, 0.0);
        assert_eq!(agg.totals.match_rate, 0.0);
        assert!(!agg.totals.median_match_rate.is_nan());
    }

    #[test]
    fn per_year_totals_cover_every_year() {
        let t = two_entries_same_institution();
        let rows: Vec<&Row> = t.rows().iter().collect();
        let agg = aggregate(&t, &rows, &YearRange::new(2021, 2021), GroupBy::None);
        assert_eq!(agg.totals.per_year.len(), 2);
        assert_eq!(
            agg.totals.per_year[&2020],
            YearBucket {
                quota: SeatCount(10),
                matched: SeatCount(8)
            }
        );
        assert_eq!(
            agg.totals.solicited,
            SeatCount(5),
            "the grand totals still follow the window"
        );
        assert_eq!(
            agg.totals.per_year[&2021],
            YearBucket {
                quota: SeatCount(5),
                matched: SeatCount(5)
            }
        );
        assert_eq!(agg.totals.not_matched, 0);
        // One row solicited nothing in 2021.
        assert_eq!(agg.totals.median_match_rate, 50.0);
    }

    #[test]
    fn over_matched_rows_are_negative() {
        let t = TableBuilder::new(&["Program Code"])
            .years(2020, 2020)
            .row(&[("Program Code", "x")])
            .metrics(2020, 0, 3)
            .row(&[("Program Code", "y")])
            .metrics(2020, 5, 2)
            .build();
        let rows: Vec<&Row> = t.rows().iter().collect();
        let agg = aggregate(&t, &rows, &YearRange::new(2020, 2020), GroupBy::None);
        assert_eq!(agg.rows[0].not_matched, -3);
        assert_eq!(agg.rows[1].not_matched, 3);
        let row_sum: i64 = agg.rows.iter().map(|r| r.not_matched).sum();
        assert_eq!(agg.totals.not_matched, 0);
        assert_eq!(agg.totals.not_matched, row_sum);
    }

    #[test]
    fn huge_counts_saturate() {
        let t = TableBuilder::new(&["Program Code"])
            .years(2020, 2020)
            .row(&[("Program Code", "a"), ("2020 Quota", "1e20")])
            .row(&[("Program Code", "b"), ("2020 Quota", "1e20")])
            .build();
        let rows: Vec<&Row> = t.rows().iter().collect();
        let agg = aggregate(&t, &rows, &YearRange::new(2020, 2020), GroupBy::None);
        assert_eq!(agg.rows[0].solicited, SeatCount(u64::MAX));
        assert_eq!(agg.totals.solicited, SeatCount(u64::MAX));
        assert_eq!(agg.totals.per_year[&2020].quota, SeatCount(u64::MAX));
        assert_eq!(agg.totals.not_matched, i64::MAX);
        assert_eq!(SeatCount(u64::MAX) + SeatCount(1), SeatCount(u64::MAX));
    }

    #[test]
    fn institution_names_are_trimmed() {
        let t = TableBuilder::new(&["Program Code", INST])
            .years(2020, 2020)
            .row(&[("Program Code", "1"), (INST, "A")])
            .metrics(2020, 2, 1)
            .row(&[("Program Code", "2"), (INST, "A ")])
            .metrics(2020, 3, 3)
            .row(&[("Program Code", "3"), (INST, "a")])
            .metrics(2020, 1, 1)
            .build();
        let rows: Vec<&Row> = t.rows().iter().collect();
        let agg = aggregate(&t, &rows, &YearRange::new(2020, 2020), GroupBy::Institution);
        let names: Vec<&str> = agg.rows.iter().map(|r| r.fields.get(INST)).collect();
        assert_eq!(names, vec!["A", "a"]);
        assert_eq!(agg.rows[0].kind, RecordKind::Group { members: 2 });
        assert_eq!(agg.rows[0].solicited, SeatCount(5));
    }
}
