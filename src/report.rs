use chrono::Local;
use log::{debug, info, warn};

use match_stats::export::{describe_filters, export, ReportHeader};
use match_stats::specialty::{self, SpecialtyCatalog};
use match_stats::*;
use snafu::{prelude::*, Snafu};

use std::path::{Path, PathBuf};

use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::report::config_reader::*;
use crate::report::io_common::*;
use crate::report::io_render::*;

mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod io_render;
mod summary;

pub const DEFAULT_FILE_NAME: &str = "nrmp-summary-report";

#[derive(Debug, Snafu)]
pub enum DashboardError {
    #[snafu(display("Error opening the file {path}"))]
    OpeningConfig {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON file {path}"))]
    ParsingConfig {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the summary"))]
    SerializingSummary { source: serde_json::Error },
    #[snafu(display("Error opening the CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading the header line of {path}"))]
    CsvHeader { source: csv::Error, path: String },
    #[snafu(display("Error parsing line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error opening the Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The Excel file {path} has no worksheet or no header row"))]
    EmptyExcel { path: String },
    #[snafu(display("The Excel file {path} has no worksheet named {name}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("Invalid value for {option}: {value}"))]
    InvalidOption { option: String, value: String },
    #[snafu(display("Error exporting the report to {path}"))]
    Export {
        source: match_stats::export::ExportError,
        path: String,
    },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Difference detected between the computed summary and the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DashResult<T> = Result<T, DashboardError>;
pub type BDashResult<T> = Result<T, Box<DashboardError>>;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Provider {
    Csv,
    Xlsx,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SourceSettings {
    pub provider: Provider,
    pub path: PathBuf,
    pub worksheet: Option<String>,
}

/// The settings of one run, once the configuration file and the command line
/// have been merged.
#[derive(PartialEq, Debug, Clone)]
pub struct RunSettings {
    pub source: SourceSettings,
    pub bounds: DatasetBounds,
    pub view: ViewState,
    pub header: ReportHeader,
    pub geometry: match_stats::export::PageGeometry,
    pub layout: RenderLayout,
    pub out: Option<String>,
    pub export: Option<PathBuf>,
    pub reference: Option<String>,
}

fn resolve_source(
    args: &Args,
    config: Option<&DashboardConfig>,
    root: &Path,
) -> DashResult<SourceSettings> {
    let (path, provider_name) = match (&args.input, config) {
        (Some(input), _) => (
            PathBuf::from(input),
            args.input_type.clone().unwrap_or_else(|| guess_provider(input)),
        ),
        (None, Some(c)) => (
            resolve_path(root, &c.data_source.file_path),
            args.input_type
                .clone()
                .unwrap_or_else(|| c.data_source.provider.clone()),
        ),
        (None, None) => {
            whatever!("No input table: pass --input or a --config file with a dataSource")
        }
    };
    let worksheet = args.excel_worksheet_name.clone().or_else(|| {
        config.and_then(|c| c.data_source.excel_worksheet_name.clone())
    });
    Ok(SourceSettings {
        provider: parse_provider(&provider_name)?,
        path,
        worksheet,
    })
}

fn resolve_view(
    args: &Args,
    config: Option<&DashboardConfig>,
    bounds: &DatasetBounds,
) -> DashResult<ViewState> {
    let mut view = ViewState::initial(bounds);

    let requested = match (&args.years, config.and_then(|c| c.filters.year_range)) {
        (Some(s), _) => Some(parse_year_range(s).context(InvalidOptionSnafu {
            option: "--years",
            value: s.as_str(),
        })?),
        (None, Some([a, b])) => Some(YearRange::new(a, b)),
        (None, None) => None,
    };
    if let Some(range) = requested {
        let clamped = range.clamp_to(bounds);
        if clamped != range {
            warn!(
                "The year range {}-{} is outside of the dataset bounds {}-{}, using {}-{}",
                range.min(),
                range.max(),
                bounds.min_year,
                bounds.max_year,
                clamped.min(),
                clamped.max()
            );
        }
        view.filters.year_range = clamped;
    }

    let specialties = args
        .specialty
        .clone()
        .or_else(|| config.and_then(|c| c.filters.specialties.clone()));
    if let Some(names) = specialties {
        view.filters.specialties = names
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    let category = args
        .category
        .clone()
        .or_else(|| config.and_then(|c| c.filters.category.clone()));
    if let Some(s) = category {
        view.filters.category = parse_category(&s)?;
    }

    let group_by = args
        .group_by
        .clone()
        .or_else(|| config.and_then(|c| c.view.group_by.clone()));
    if let Some(s) = group_by {
        view.group_by = parse_group_by(&s)?;
    }

    let sort_key = args
        .sort
        .clone()
        .or_else(|| config.and_then(|c| c.view.sort_key.clone()));
    view.sort.key = sort_key
        .filter(|s| !s.trim().is_empty())
        .map(|s| SortKey::parse(&s));
    view.sort.direction = if args.desc {
        SortDirection::Descending
    } else {
        match config.and_then(|c| c.view.sort_direction.clone()) {
            Some(s) => parse_sort_direction(&s)?,
            None => SortDirection::Ascending,
        }
    };
    Ok(view)
}

/// The configured report date, or today's local date as `YYYY-MM-DD`.
fn report_date(configured: Option<&String>) -> String {
    match configured {
        Some(date) => date.clone(),
        None => Local::now().format("%Y-%m-%d").to_string(),
    }
}

pub fn resolve_settings(
    args: &Args,
    config: Option<&DashboardConfig>,
    root: &Path,
) -> DashResult<RunSettings> {
    let source = resolve_source(args, config, root)?;
    let bounds = config
        .map(|c| c.dataset.bounds())
        .unwrap_or(DatasetBounds::DEFAULT_BOUNDS);
    let view = resolve_view(args, config, &bounds)?;

    let output = config.map(|c| c.output_settings.clone()).unwrap_or_default();
    let header = ReportHeader {
        title: output
            .report_title
            .clone()
            .unwrap_or_else(|| ReportHeader::DEFAULT_TITLE.to_string()),
        generated_on: Some(report_date(output.report_date.as_ref())),
    };

    // An empty --export falls back on the output settings of the configuration.
    let export = args.export.as_ref().map(|p| {
        if p.is_empty() {
            let dir = output
                .output_directory
                .as_ref()
                .map(|d| resolve_path(root, d))
                .unwrap_or_else(|| root.to_path_buf());
            let name = output
                .file_name
                .clone()
                .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
            dir.join(format!("{}.txt", name))
        } else {
            PathBuf::from(p)
        }
    });

    let export_settings = config.map(|c| c.export.clone()).unwrap_or_default();
    Ok(RunSettings {
        source,
        bounds,
        view,
        header,
        geometry: export_settings.geometry(),
        layout: export_settings.layout(),
        out: args.out.clone().filter(|s| !s.is_empty()),
        export,
        reference: args.reference.clone(),
    })
}

fn read_table(source: &SourceSettings) -> DashResult<Table> {
    let path = source.path.to_string_lossy().to_string();
    info!("Reading {} ({:?})", simplify_file_name(&path), source.provider);
    let raw = match source.provider {
        Provider::Csv => io_csv::read_csv_table(&path),
        Provider::Xlsx => io_excel::read_excel_table(&path, source.worksheet.as_deref()),
    }
    .map_err(|e| *e)?;
    let table = Table::normalize(&raw.headers, raw.rows);
    info!(
        "Loaded {} rows, {} columns, years {:?}",
        table.len(),
        table.columns().len(),
        table.years()
    );
    Ok(table)
}

fn print_specialties(catalog: &SpecialtyCatalog) {
    if catalog.main.is_empty() && catalog.subspecialties.is_empty() {
        println!("Specialties ({}):", catalog.all.len());
        for name in catalog.all.iter() {
            println!("  {}", name);
        }
        return;
    }
    println!("Main specialties ({}):", catalog.main.len());
    for name in catalog.main.iter() {
        println!("  {}", name);
    }
    println!("Subspecialties ({}):", catalog.subspecialties.len());
    for name in catalog.subspecialties.iter() {
        println!("  {}", name);
    }
}

fn warn_unknown_specialties(filters: &FilterState, catalog: &SpecialtyCatalog) {
    for name in filters.specialties.iter() {
        if !catalog.all.contains(name) {
            warn!("The specialty {:?} does not appear in the table", name);
        }
    }
}

fn export_report(
    path: &Path,
    settings: &RunSettings,
    view: &TableView,
    catalog: &SpecialtyCatalog,
) -> DashResult<PagePlan> {
    let filters = &settings.view.filters;
    // The year range has its own panel.
    let filter_lines: Vec<String> = describe_filters(filters, catalog)
        .into_iter()
        .skip(1)
        .collect();
    let slider = slider_lines(&settings.bounds, &filters.year_range);
    let mut rasterizer = TextRasterizer::new(view, filter_lines, slider, settings.layout);
    let mut writer = TextDocumentWriter::new(path);
    let plan = export(
        &mut rasterizer,
        &mut writer,
        settings.header.clone(),
        &settings.geometry,
    )
    .context(ExportSnafu {
        path: path.to_string_lossy(),
    })?;
    info!(
        "Wrote {} pages to {}",
        plan.page_count().max(1),
        path.display()
    );
    Ok(plan)
}

fn check_reference(reference_path: &str, pretty_js_summary: &str) -> DashResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(SerializingSummarySnafu)?;
    if pretty_js_summary_ref != pretty_js_summary {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_summary, "\n");
        return ReferenceMismatchSnafu {
            path: reference_path,
        }
        .fail();
    }
    info!("The summary matches the reference {}", reference_path);
    Ok(())
}

/// Computes the summary for the given settings and writes every requested
/// output. Returns the JSON summary.
pub fn run_with_settings(settings: &RunSettings) -> DashResult<JSValue> {
    let table = read_table(&settings.source)?;
    let catalog = specialty::catalog(&table);
    warn_unknown_specialties(&settings.view.filters, &catalog);

    let agg = run_view(&table, &settings.view);
    let view = build_table_view(&table, &settings.view, &agg);
    if agg.rows.is_empty() {
        println!("No programs match the selected filters.");
    }
    println!("{}", render_text_table(&view, &settings.layout));

    let summary_js = summary::build_summary_js(&settings.header, &settings.view, &table, &agg);
    let pretty_js_summary =
        serde_json::to_string_pretty(&summary_js).context(SerializingSummarySnafu)?;
    debug!("summary: {}", pretty_js_summary);

    if let Some(out) = &settings.out {
        write_output(out, &pretty_js_summary)?;
    }

    if let Some(path) = &settings.export {
        export_report(path, settings, &view, &catalog)?;
    }

    if let Some(reference_path) = &settings.reference {
        check_reference(reference_path, &pretty_js_summary)?;
    }

    Ok(summary_js)
}

pub fn run_dashboard(args: &Args) -> DashResult<()> {
    let config = match &args.config {
        Some(p) => Some(read_config(p)?),
        None => None,
    };
    debug!("config: {:?}", config);
    let root: PathBuf = args
        .config
        .as_ref()
        .and_then(|p| Path::new(p).parent())
        .map(|p| p.to_path_buf())
        .unwrap_or_default();
    let settings = resolve_settings(args, config.as_ref(), &root)?;
    info!("settings: {:?}", settings);

    if args.list_specialties {
        let table = read_table(&settings.source)?;
        print_specialties(&specialty::catalog(&table));
        return Ok(());
    }

    run_with_settings(&settings)?;
    Ok(())
}
