use match_stats::export::ReportHeader;
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;

use crate::report::io_render::{label_columns, window_years};
use crate::report::*;

fn round_rate(rate: f64) -> f64 {
    (rate * 100.0).round() / 100.0
}

fn sort_key_name(key: &SortKey) -> String {
    match key {
        SortKey::Column(c) => c.clone(),
        SortKey::Solicited => "solicited".to_string(),
        SortKey::Matched => "matched".to_string(),
        SortKey::NotMatched => "notMatched".to_string(),
        SortKey::MatchRate => "matchRate".to_string(),
    }
}

fn years_js(buckets: impl Fn(Year) -> YearBucket, years: &[Year]) -> JSMap<String, JSValue> {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    for y in years.iter() {
        let b = buckets(*y);
        m.insert(
            y.to_string(),
            json!({"quota": b.quota.0, "matched": b.matched.0}),
        );
    }
    m
}

fn view_config_js(header: &ReportHeader, view: &ViewState) -> JSValue {
    let f = &view.filters;
    let specialties: Vec<&String> = f.specialties.iter().collect();
    json!({
        "title": header.title,
        "years": [f.year_range.min(), f.year_range.max()],
        "specialties": specialties,
        "institutionType": f.category.label(),
        "groupBy": match view.group_by {
            GroupBy::None => "none",
            GroupBy::Institution => "institution",
        },
        "sortKey": view.sort.key.as_ref().map(sort_key_name),
        "sortDirection": match view.sort.direction {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        },
    })
}

fn row_js(row: &AggregatedRow, labels: &[String], years: &[Year]) -> JSValue {
    let mut fields: JSMap<String, JSValue> = JSMap::new();
    for c in labels.iter() {
        fields.insert(c.clone(), json!(row.fields.get(c)));
    }
    let mut js = json!({
        "fields": fields,
        "years": years_js(|y| row.bucket(y), years),
        "solicited": row.solicited.0,
        "matched": row.matched.0,
        "notMatched": row.not_matched,
        "matchRate": round_rate(row.match_rate),
    });
    if let RecordKind::Group { members } = row.kind {
        js["programs"] = json!(members);
    }
    js
}

/// The summary in JSON format: the view that produced it, one entry per line
/// of the table and the totals. The report date is left out so that two runs
/// on the same data produce the same summary.
pub fn build_summary_js(
    header: &ReportHeader,
    view: &ViewState,
    table: &Table,
    agg: &Aggregation,
) -> JSValue {
    let labels = label_columns(table, view.group_by);
    let years = window_years(table, &view.filters.year_range);
    let rows: Vec<JSValue> = agg
        .rows
        .iter()
        .map(|r| row_js(r, &labels, &years))
        .collect();
    let t = &agg.totals;
    json!({
        "config": view_config_js(header, view),
        "rows": rows,
        "totals": {
            "years": years_js(|y| t.per_year.get(&y).copied().unwrap_or(YearBucket::EMPTY), &years),
            "solicited": t.solicited.0,
            "matched": t.matched.0,
            "notMatched": t.not_matched,
            "matchRate": round_rate(t.match_rate),
            "medianMatchRate": round_rate(t.median_match_rate),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use match_stats::builder::TableBuilder;

    fn header() -> ReportHeader {
        ReportHeader {
            title: ReportHeader::DEFAULT_TITLE.to_string(),
            generated_on: Some("2024-03-15".to_string()),
        }
    }

    #[test]
    fn summary_of_a_sorted_view() {
        let table = TableBuilder::new(&["Program Code", "Specialty"])
            .column("SNHAF")
            .years(2020, 2021)
            .row(&[("Program Code", "1"), ("Specialty", "Surgery"), ("SNHAF", "SNHAF")])
            .metrics(2020, 3, 1)
            .row(&[("Program Code", "2"), ("Specialty", "Pediatrics"), ("SNHAF", "NOT")])
            .metrics(2021, 3, 2)
            .build();
        let mut view = ViewState::initial(&DatasetBounds::new(2020, 2021));
        view.sort = SortState {
            key: Some(SortKey::MatchRate),
            direction: SortDirection::Descending,
        };
        let agg = run_view(&table, &view);
        let js = build_summary_js(&header(), &view, &table, &agg);

        assert_eq!(js["config"]["years"], json!([2020, 2021]));
        assert_eq!(js["config"]["sortKey"], "matchRate");
        assert_eq!(js["config"]["sortDirection"], "desc");
        assert!(js["config"].get("date").is_none());
        let rows = js["rows"].as_array().unwrap();
        assert_eq!(rows[0]["fields"]["Program Code"], "2");
        assert_eq!(rows[0]["fields"]["SNHAF"], "NOT");
        assert_eq!(rows[0]["matchRate"], 66.67);
        assert_eq!(rows[0]["years"]["2021"]["quota"], 3);
        assert_eq!(rows[0]["years"]["2020"]["quota"], 0);
        assert!(rows[0].get("programs").is_none());
        assert_eq!(rows[1]["matchRate"], 33.33);
        assert_eq!(js["totals"]["solicited"], 6);
        assert_eq!(js["totals"]["matchRate"], 50.0);
        assert_eq!(js["totals"]["medianMatchRate"], 50.0);
        assert_eq!(js["totals"]["years"]["2020"]["matched"], 1);
    }

    #[test]
    fn empty_view() {
        let table = TableBuilder::new(&["Program Code"]).years(2020, 2020).build();
        let view = ViewState::initial(&DatasetBounds::new(2020, 2020));
        let agg = run_view(&table, &view);
        let js = build_summary_js(&header(), &view, &table, &agg);
        assert_eq!(js["rows"], json!([]));
        assert_eq!(js["totals"]["matchRate"], 0.0);
    }

    #[test]
    fn over_matched_program_is_negative() {
        let table = TableBuilder::new(&["Program Code"])
            .years(2020, 2020)
            .row(&[("Program Code", "1")])
            .metrics(2020, 0, 3)
            .build();
        let view = ViewState::initial(&DatasetBounds::new(2020, 2020));
        let agg = run_view(&table, &view);
        let js = build_summary_js(&header(), &view, &table, &agg);
        assert_eq!(js["rows"][0]["notMatched"], -3);
        assert_eq!(js["totals"]["notMatched"], -3);
    }
}
