// Primitives for reading CSV files.

use std::io::Read;

use crate::report::{io_common::RawTable, *};

pub fn read_csv_table(path: &str) -> BDashResult<RawTable> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    read_records(rdr, path)
}

fn read_records<R: Read>(mut rdr: csv::Reader<R>, path: &str) -> BDashResult<RawTable> {
    let headers: Vec<String> = rdr
        .headers()
        .context(CsvHeaderSnafu { path })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    debug!("read_csv_table: headers: {:?}", headers);

    let mut raw = RawTable {
        headers,
        rows: Vec::new(),
    };
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        if line.iter().all(|c| c.trim().is_empty()) {
            debug!("read_csv_table: skipping blank line {}", lineno);
            continue;
        }
        raw.push_line(line.iter());
    }
    Ok(raw)
}
