//! Export of the rendered summary table to a paginated document.
//!
//! The export is a strict sequence of steps: capture the filter panel, the
//! year slider, the table header and the table rows, then plan the pages and
//! hand the assembled document to the writer. Each step only reads what the
//! previous steps produced and passes it on. The page capacities depend on
//! the pixel sizes of the earlier captures, so the order cannot change.
//!
//! Rendering itself is left to a [`Rasterizer`], and the output format to a
//! [`DocumentWriter`]. Nothing is written when any step fails.

use std::error::Error;
use std::fmt::Display;

use log::{debug, info};

use crate::config::*;
use crate::pagination;
use crate::specialty::{selection_summary, SpecialtyCatalog};

/// The parts of the screen that end up in the document.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Region {
    FilterPanel,
    SliderPanel,
    TableHeader,
    /// One row of the table body, by position.
    TableRow(usize),
}

/// A rendered region with its size in device pixels.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Capture<B> {
    pub bitmap: B,
    pub width: u32,
    pub height: u32,
}

impl<B> Capture<B> {
    /// Height once drawn at the given width, keeping the aspect ratio.
    pub fn height_at_width(&self, width: u32) -> u32 {
        if self.width == 0 {
            0
        } else {
            ((self.height as u64 * width as u64) / self.width as u64) as u32
        }
    }
}

pub trait Rasterizer {
    type Bitmap;

    /// Renders a region at the given scale factor.
    fn capture(&mut self, region: Region, scale: f32) -> Result<Capture<Self::Bitmap>, String>;

    /// The number of rows in the table body.
    fn row_count(&self) -> usize;
}

pub trait DocumentWriter<B> {
    fn write_document(&mut self, document: ExportDocument<B>) -> Result<(), String>;
}

/// Page size and placement, in millimeters.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct PageGeometry {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    /// Distance from the top of the page to the first bitmap, leaving room
    /// for the title and the date.
    pub content_top_mm: f32,
    pub scale: f32,
}

impl PageGeometry {
    pub const A4_LANDSCAPE: PageGeometry = PageGeometry {
        page_width_mm: 297.0,
        page_height_mm: 210.0,
        margin_mm: 10.0,
        content_top_mm: 35.0,
        scale: 2.0,
    };

    pub fn printable_width_mm(&self) -> f32 {
        (self.page_width_mm - 2.0 * self.margin_mm).max(0.0)
    }

    pub fn content_height_mm(&self) -> f32 {
        (self.page_height_mm - self.content_top_mm - self.margin_mm).max(0.0)
    }

    /// Pixels available for table rows on a page, for a table rendered
    /// `table_width_px` wide.
    pub fn content_height_px(&self, table_width_px: u32) -> u32 {
        let printable = self.printable_width_mm();
        if printable <= 0.0 {
            return 0;
        }
        let px_per_mm = table_width_px as f32 / printable;
        (self.content_height_mm() * px_per_mm).floor() as u32
    }
}

/// Text printed above the bitmaps of the first page.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ReportHeader {
    pub title: String,
    pub generated_on: Option<String>,
}

impl ReportHeader {
    pub const DEFAULT_TITLE: &'static str = "NRMP Summary Report";
}

/// One line per filter, as shown in the filter panel and the year slider.
pub fn describe_filters(state: &FilterState, catalog: &SpecialtyCatalog) -> Vec<String> {
    let specialties = if state.specialties.is_empty() {
        "All specialties".to_string()
    } else {
        selection_summary(&state.specialties, catalog)
            .unwrap_or_else(|| "All specialties".to_string())
    };
    vec![
        format!(
            "Years: {} – {}",
            state.year_range.min(),
            state.year_range.max()
        ),
        format!("Specialties: {}", specialties),
        format!("Institution Type: {}", state.category.label()),
    ]
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ExportPage<B> {
    /// One-based.
    pub number: usize,
    pub span: PageSpan,
    /// Only the first page shows the filter and slider panels.
    pub with_filters: bool,
    pub rows: Vec<Capture<B>>,
    pub footer: String,
}

/// The fully assembled export. The table header is repeated on every page.
#[derive(PartialEq, Debug, Clone)]
pub struct ExportDocument<B> {
    pub header: ReportHeader,
    pub geometry: PageGeometry,
    pub filter_panel: Capture<B>,
    pub slider_panel: Capture<B>,
    pub table_header: Capture<B>,
    pub pages: Vec<ExportPage<B>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ExportStep {
    FilterPanel,
    SliderPanel,
    TableHeader,
    TableBody,
    Emit,
}

impl Display for ExportStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExportStep::FilterPanel => "filter panel",
            ExportStep::SliderPanel => "year slider",
            ExportStep::TableHeader => "table header",
            ExportStep::TableBody => "table body",
            ExportStep::Emit => "document",
        };
        write!(f, "{}", s)
    }
}

/// Errors that abandon an export.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ExportError {
    Rasterization { step: ExportStep, message: String },
    EmptyCapture { step: ExportStep },
    Document { message: String },
}

impl Error for ExportError {}

impl Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Rasterization { step, message } => {
                write!(f, "Could not render the {}: {}", step, message)
            }
            ExportError::EmptyCapture { step } => {
                write!(f, "The {} rendered to an empty image", step)
            }
            ExportError::Document { message } => {
                write!(f, "Could not write the document: {}", message)
            }
        }
    }
}

// **** Pipeline stages ****

struct FiltersCaptured<B> {
    filter_panel: Capture<B>,
}

struct SliderCaptured<B> {
    filter_panel: Capture<B>,
    slider_panel: Capture<B>,
}

struct HeaderCaptured<B> {
    filter_panel: Capture<B>,
    slider_panel: Capture<B>,
    table_header: Capture<B>,
}

struct BodyCaptured<B> {
    filter_panel: Capture<B>,
    slider_panel: Capture<B>,
    table_header: Capture<B>,
    rows: Vec<Capture<B>>,
}

fn capture_step<R: Rasterizer>(
    rasterizer: &mut R,
    region: Region,
    step: ExportStep,
    scale: f32,
) -> Result<Capture<R::Bitmap>, ExportError> {
    let c = rasterizer
        .capture(region, scale)
        .map_err(|message| ExportError::Rasterization { step, message })?;
    debug!("export: captured {} as {}x{} px", step, c.width, c.height);
    Ok(c)
}

fn capture_filters<R: Rasterizer>(
    r: &mut R,
    g: &PageGeometry,
) -> Result<FiltersCaptured<R::Bitmap>, ExportError> {
    let filter_panel = capture_step(r, Region::FilterPanel, ExportStep::FilterPanel, g.scale)?;
    Ok(FiltersCaptured { filter_panel })
}

fn capture_slider<R: Rasterizer>(
    r: &mut R,
    g: &PageGeometry,
    prev: FiltersCaptured<R::Bitmap>,
) -> Result<SliderCaptured<R::Bitmap>, ExportError> {
    let slider_panel = capture_step(r, Region::SliderPanel, ExportStep::SliderPanel, g.scale)?;
    Ok(SliderCaptured {
        filter_panel: prev.filter_panel,
        slider_panel,
    })
}

fn capture_header<R: Rasterizer>(
    r: &mut R,
    g: &PageGeometry,
    prev: SliderCaptured<R::Bitmap>,
) -> Result<HeaderCaptured<R::Bitmap>, ExportError> {
    let table_header = capture_step(r, Region::TableHeader, ExportStep::TableHeader, g.scale)?;
    if table_header.width == 0 {
        return Err(ExportError::EmptyCapture {
            step: ExportStep::TableHeader,
        });
    }
    Ok(HeaderCaptured {
        filter_panel: prev.filter_panel,
        slider_panel: prev.slider_panel,
        table_header,
    })
}

fn capture_body<R: Rasterizer>(
    r: &mut R,
    g: &PageGeometry,
    prev: HeaderCaptured<R::Bitmap>,
) -> Result<BodyCaptured<R::Bitmap>, ExportError> {
    let n = r.row_count();
    let mut rows = Vec::with_capacity(n);
    for idx in 0..n {
        rows.push(capture_step(
            r,
            Region::TableRow(idx),
            ExportStep::TableBody,
            g.scale,
        )?);
    }
    Ok(BodyCaptured {
        filter_panel: prev.filter_panel,
        slider_panel: prev.slider_panel,
        table_header: prev.table_header,
        rows,
    })
}

/// The row capacities of the first and of the later pages, in pixels of the
/// table rendering.
fn page_capacities<B>(
    g: &PageGeometry,
    filter_panel: &Capture<B>,
    slider_panel: &Capture<B>,
    table_header: &Capture<B>,
) -> (u32, u32) {
    let width = table_header.width;
    let later = g
        .content_height_px(width)
        .saturating_sub(table_header.height);
    let first = later
        .saturating_sub(filter_panel.height_at_width(width))
        .saturating_sub(slider_panel.height_at_width(width));
    (first, later)
}

fn assemble_pages<B>(
    g: &PageGeometry,
    header: ReportHeader,
    prev: BodyCaptured<B>,
) -> (ExportDocument<B>, PagePlan) {
    let (first, later) = page_capacities(
        g,
        &prev.filter_panel,
        &prev.slider_panel,
        &prev.table_header,
    );
    let heights: Vec<u32> = prev.rows.iter().map(|c| c.height).collect();
    let plan = pagination::plan(&heights, first, later);

    // An empty table still gets a page with the header and the filters.
    let spans: Vec<PageSpan> = if plan.spans.is_empty() {
        vec![PageSpan {
            start_row: 0,
            row_count: 0,
        }]
    } else {
        plan.spans.clone()
    };
    let total = spans.len();
    let mut rows = prev.rows.into_iter();
    let pages: Vec<ExportPage<B>> = spans
        .into_iter()
        .enumerate()
        .map(|(idx, span)| ExportPage {
            number: idx + 1,
            span,
            with_filters: idx == 0,
            rows: rows.by_ref().take(span.row_count).collect(),
            footer: format!("Page {} of {}", idx + 1, total),
        })
        .collect();
    info!(
        "export: {} rows on {} pages (capacity {} px, then {} px)",
        heights.len(),
        total,
        first,
        later
    );
    let document = ExportDocument {
        header,
        geometry: *g,
        filter_panel: prev.filter_panel,
        slider_panel: prev.slider_panel,
        table_header: prev.table_header,
        pages,
    };
    (document, plan)
}

/// Runs the whole export and returns the page plan that was used.
pub fn export<R, W>(
    rasterizer: &mut R,
    writer: &mut W,
    header: ReportHeader,
    geometry: &PageGeometry,
) -> Result<PagePlan, ExportError>
where
    R: Rasterizer,
    W: DocumentWriter<R::Bitmap>,
{
    let filters = capture_filters(rasterizer, geometry)?;
    let slider = capture_slider(rasterizer, geometry, filters)?;
    let table_header = capture_header(rasterizer, geometry, slider)?;
    let body = capture_body(rasterizer, geometry, table_header)?;
    let (document, plan) = assemble_pages(geometry, header, body);
    writer
        .write_document(document)
        .map_err(|message| ExportError::Document { message })?;
    Ok(plan)
}
