// Reading the table from an Excel workbook.

use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::report::{io_common::RawTable, *};

/// Reads the named worksheet, or the first one. The first row holds the
/// headers.
pub fn read_excel_table(path: &str, worksheet: Option<&str>) -> BDashResult<RawTable> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match worksheet {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { path, name })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };

    let mut iter = wrange.rows();
    let header = iter.next().context(EmptyExcelSnafu { path })?;
    debug!("read_excel_table: header: {:?}", header);
    let mut raw = RawTable {
        headers: header
            .iter()
            .map(|c| read_cell(c).trim().to_string())
            .collect(),
        rows: Vec::new(),
    };
    for row in iter {
        let cells: Vec<String> = row.iter().map(read_cell).collect();
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        raw.push_line(cells);
    }
    Ok(raw)
}

/// The text of a cell, as it would appear in a CSV export of the sheet.
fn read_cell(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        DataType::Float(f) => f.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::Empty => String::new(),
        other => {
            debug!("read_cell: ignoring cell {:?}", other);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_as_text() {
        assert_eq!(read_cell(&DataType::String("Surgery".to_string())), "Surgery");
        assert_eq!(read_cell(&DataType::Int(12)), "12");
        assert_eq!(read_cell(&DataType::Float(12.0)), "12");
        assert_eq!(read_cell(&DataType::Float(2.5)), "2.5");
        assert_eq!(read_cell(&DataType::Empty), "");
    }

    #[test]
    fn missing_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("nope.xlsx");
        let res = read_excel_table(p.to_str().unwrap(), None).map_err(|e| *e);
        assert!(matches!(res, Err(DashboardError::OpeningExcel { .. })));
    }
}
