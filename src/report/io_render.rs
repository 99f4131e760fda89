// Text rendering of the summary table, and the paginated text report.

use std::fs;
use std::path::{Path, PathBuf};

use match_stats::export::{Capture, DocumentWriter, ExportDocument, Rasterizer, Region};
use tabled::builder::Builder;
use tabled::settings::object::Segment;
use tabled::settings::{Modify, Style, Width};

use crate::report::*;

/// Sizes of the text rendering, used to turn lines and characters into
/// pixels for the page planner.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct RenderLayout {
    /// Longer cells are wrapped on several lines.
    pub column_width_chars: usize,
    pub char_width_px: u32,
    pub line_height_px: u32,
}

impl RenderLayout {
    pub const DEFAULT: RenderLayout = RenderLayout {
        column_width_chars: 28,
        char_width_px: 7,
        line_height_px: 16,
    };
}

/// The summary table as formatted cells.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// The total and median lines.
    pub footer: Vec<Vec<String>>,
}

impl TableView {
    /// The rows and the footer lines, as drawn below the header.
    pub fn body(&self) -> impl Iterator<Item = &Vec<String>> {
        self.rows.iter().chain(self.footer.iter())
    }
}

/// The columns shown before the metrics. Grouped views only show the
/// institution.
pub fn label_columns(table: &Table, group_by: GroupBy) -> Vec<String> {
    match group_by {
        GroupBy::Institution => vec![table
            .institution_column()
            .unwrap_or("Institution")
            .to_string()],
        GroupBy::None => table
            .columns()
            .iter()
            .filter(|c| {
                matches!(
                    c.role,
                    ColumnRole::ProgramCode
                        | ColumnRole::Institution
                        | ColumnRole::Specialty
                        | ColumnRole::Category
                )
            })
            .map(|c| c.name.clone())
            .collect(),
    }
}

/// The years of the window that have at least one metric column.
pub fn window_years(table: &Table, window: &YearRange) -> Vec<Year> {
    window
        .years()
        .filter(|y| {
            table.metric_column(*y, MetricKind::Quota).is_some()
                || table.metric_column(*y, MetricKind::Matched).is_some()
        })
        .collect()
}

pub fn format_rate(rate: f64) -> String {
    format!("{:.1}%", rate)
}

pub fn build_table_view(table: &Table, view: &ViewState, agg: &Aggregation) -> TableView {
    let labels = label_columns(table, view.group_by);
    let years = window_years(table, &view.filters.year_range);
    let grouped = view.group_by == GroupBy::Institution;

    let mut headers = labels.clone();
    if grouped {
        headers.push("Programs".to_string());
    }
    for y in years.iter() {
        headers.push(MetricKind::Quota.column_name(*y));
        headers.push(MetricKind::Matched.column_name(*y));
    }
    for h in ["Solicited", "Matched", "Not Matched", "Match Rate"] {
        headers.push(h.to_string());
    }

    let rows: Vec<Vec<String>> = agg
        .rows
        .iter()
        .map(|r| {
            let mut cells: Vec<String> = labels.iter().map(|c| r.fields.get(c).to_string()).collect();
            if grouped {
                let members = match r.kind {
                    RecordKind::Group { members } => members,
                    RecordKind::Source => 1,
                };
                cells.push(members.to_string());
            }
            for y in years.iter() {
                let b = r.bucket(*y);
                cells.push(b.quota.0.to_string());
                cells.push(b.matched.0.to_string());
            }
            cells.push(r.solicited.0.to_string());
            cells.push(r.matched.0.to_string());
            cells.push(r.not_matched.to_string());
            cells.push(format_rate(r.match_rate));
            cells
        })
        .collect();

    let blanks = labels.len() + usize::from(grouped);
    let t = &agg.totals;
    let mut total_line = vec![String::new(); blanks];
    let mut median_line = vec![String::new(); headers.len()];
    if blanks > 0 {
        total_line[0] = "Total".to_string();
        median_line[0] = "Median".to_string();
    }
    for y in years.iter() {
        let b = t.per_year.get(y).copied().unwrap_or(YearBucket::EMPTY);
        total_line.push(b.quota.0.to_string());
        total_line.push(b.matched.0.to_string());
    }
    total_line.push(t.solicited.0.to_string());
    total_line.push(t.matched.0.to_string());
    total_line.push(t.not_matched.to_string());
    total_line.push(format_rate(t.match_rate));
    if let Some(last) = median_line.last_mut() {
        *last = format_rate(t.median_match_rate);
    }

    TableView {
        headers,
        rows,
        footer: vec![total_line, median_line],
    }
}

// ******** Text layout ********

fn build_text_table(view: &TableView, layout: &RenderLayout) -> tabled::Table {
    let mut builder = Builder::default();
    builder.push_record(view.headers.iter().cloned());
    for line in view.body() {
        builder.push_record(line.iter().cloned());
    }
    let mut table = builder.build();
    table.with(Style::ascii()).with(
        Modify::new(Segment::all())
            .with(Width::wrap(layout.column_width_chars.max(1)).keep_words()),
    );
    table
}

fn is_border(line: &str) -> bool {
    line.starts_with('+')
}

/// Cuts the rendered table into the header block (top border, header lines,
/// border) and one block per body line, each closed by the border below it.
fn split_blocks(rendered: &str) -> (Vec<String>, Vec<Vec<String>>) {
    let mut lines = rendered.lines().map(|l| l.to_string());
    let mut header: Vec<String> = Vec::new();
    if let Some(top) = lines.next() {
        header.push(top);
    }
    for line in lines.by_ref() {
        let border = is_border(&line);
        header.push(line);
        if border {
            break;
        }
    }
    let mut blocks: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    for line in lines {
        let border = is_border(&line);
        current.push(line);
        if border {
            blocks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    (header, blocks)
}

/// The table with its cells wrapped to the layout's column width.
pub fn render_text_table(view: &TableView, layout: &RenderLayout) -> String {
    build_text_table(view, layout).to_string()
}

/// The year slider: the selected range, then every year of the dataset with
/// the selected ones in brackets.
pub fn slider_lines(bounds: &DatasetBounds, range: &YearRange) -> Vec<String> {
    let track: Vec<String> = bounds
        .full_range()
        .years()
        .map(|y| {
            if range.contains(y) {
                format!("[{}]", y)
            } else {
                format!(" {} ", y)
            }
        })
        .collect();
    vec![
        format!("Years: {} – {}", range.min(), range.max()),
        track.join(" ").trim_end().to_string(),
    ]
}

// ******** Export ********

/// Draws the regions of the dashboard as text. Sizes follow the layout: one
/// line is `line_height_px` high and one character `char_width_px` wide,
/// both multiplied by the capture scale.
pub struct TextRasterizer {
    filter_panel: Vec<String>,
    slider_panel: Vec<String>,
    table_header: Vec<String>,
    rows: Vec<Vec<String>>,
    table_width_chars: usize,
    layout: RenderLayout,
}

impl TextRasterizer {
    pub fn new(
        view: &TableView,
        filter_lines: Vec<String>,
        slider_lines: Vec<String>,
        layout: RenderLayout,
    ) -> TextRasterizer {
        let (table_header, rows) = split_blocks(&render_text_table(view, &layout));
        let table_width_chars = table_header
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0);
        TextRasterizer {
            filter_panel: filter_lines,
            slider_panel: slider_lines,
            table_header,
            rows,
            table_width_chars,
            layout,
        }
    }

    fn capture_lines(&self, lines: Vec<String>, scale: f32) -> Capture<Vec<String>> {
        // Panels span the width of the table.
        let chars = lines
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0)
            .max(self.table_width_chars);
        let px = |n: usize, unit: u32| (n as f32 * unit as f32 * scale).round() as u32;
        Capture {
            width: px(chars, self.layout.char_width_px),
            height: px(lines.len(), self.layout.line_height_px),
            bitmap: lines,
        }
    }
}

impl Rasterizer for TextRasterizer {
    type Bitmap = Vec<String>;

    fn capture(&mut self, region: Region, scale: f32) -> Result<Capture<Vec<String>>, String> {
        let lines = match region {
            Region::FilterPanel => self.filter_panel.clone(),
            Region::SliderPanel => self.slider_panel.clone(),
            Region::TableHeader => self.table_header.clone(),
            Region::TableRow(idx) => self
                .rows
                .get(idx)
                .cloned()
                .ok_or_else(|| format!("no table row at position {}", idx))?,
        };
        Ok(self.capture_lines(lines, scale))
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Lays out the pages one after the other, separated by form feeds.
pub fn render_document(document: &ExportDocument<Vec<String>>) -> String {
    let mut pages: Vec<String> = Vec::with_capacity(document.pages.len());
    for page in document.pages.iter() {
        let mut lines: Vec<String> = Vec::new();
        if page.with_filters {
            lines.push(document.header.title.clone());
            if let Some(date) = &document.header.generated_on {
                lines.push(format!("Generated on: {}", date));
            }
            lines.push(String::new());
            lines.extend(document.filter_panel.bitmap.iter().cloned());
            lines.extend(document.slider_panel.bitmap.iter().cloned());
            lines.push(String::new());
        }
        lines.extend(document.table_header.bitmap.iter().cloned());
        for row in page.rows.iter() {
            lines.extend(row.bitmap.iter().cloned());
        }
        lines.push(String::new());
        lines.push(page.footer.clone());
        pages.push(lines.join("\n"));
    }
    let mut text = pages.join("\n\x0c\n");
    text.push('\n');
    text
}

pub struct TextDocumentWriter {
    path: PathBuf,
}

impl TextDocumentWriter {
    pub fn new(path: &Path) -> TextDocumentWriter {
        TextDocumentWriter {
            path: path.to_path_buf(),
        }
    }
}

impl DocumentWriter<Vec<String>> for TextDocumentWriter {
    fn write_document(&mut self, document: ExportDocument<Vec<String>>) -> Result<(), String> {
        let text = render_document(&document);
        fs::write(&self.path, text).map_err(|e| format!("{}: {}", self.path.display(), e))
    }
}
