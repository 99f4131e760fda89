use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::report::*;

/// The cells of an input file, before normalization.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

impl RawTable {
    /// Pairs the cells of a line with the headers. Extra cells are dropped and
    /// missing cells are left out of the row.
    pub fn push_line<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row: HashMap<String, String> = self
            .headers
            .iter()
            .cloned()
            .zip(cells.into_iter().map(|c| c.into()))
            .collect();
        self.rows.push(row);
    }
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Paths of the configuration file are relative to its directory.
pub fn resolve_path(root: &Path, file: &str) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}

pub fn guess_provider(path: &str) -> String {
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("xlsx") || ext.eq_ignore_ascii_case("xlsm") => {
            "xlsx".to_string()
        }
        _ => "csv".to_string(),
    }
}

/// Parses `MIN-MAX` (or a single year). The endpoints may come in any order.
pub fn parse_year_range(s: &str) -> Option<YearRange> {
    let parts: Vec<&str> = s
        .split(|c| c == '-' || c == '–' || c == ':')
        .map(|p| p.trim())
        .collect();
    match parts.as_slice() {
        [y] => y.parse::<Year>().ok().map(|y| YearRange::new(y, y)),
        [a, b] => {
            let a = a.parse::<Year>().ok()?;
            let b = b.parse::<Year>().ok()?;
            Some(YearRange::new(a, b))
        }
        _ => None,
    }
}

pub fn write_output(path: &str, content: &str) -> DashResult<()> {
    if path == "stdout" {
        println!("{}", content);
        return Ok(());
    }
    fs::write(path, content).context(WritingOutputSnafu { path })?;
    info!("Wrote the summary to {}", path);
    Ok(())
}
