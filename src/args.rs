use clap::Parser;

/// This is a dashboard for residency match statistics: it filters the table,
/// summarizes it and exports the result as a paginated report.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the data source, the filters and the report settings.
    /// Paths inside the file are relative to its location.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The table of match statistics. Setting this option overrides the data source of the
    /// --config file.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default: first sheet) When using an Excel file, the name of the worksheet to read.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (MIN-MAX or YEAR) The range of years to summarize, for example 2021-2024.
    #[clap(short, long, value_parser)]
    pub years: Option<String>,

    /// (repeatable) Only keep the programs of this specialty. Can be given several times.
    #[clap(short, long, value_parser)]
    pub specialty: Option<Vec<String>>,

    /// (ALL, SNHAF or NOT) Only keep the institutions of this type.
    #[clap(long, value_parser)]
    pub category: Option<String>,

    /// (none or institution) Sum the programs per sponsoring institution.
    #[clap(short, long, value_parser)]
    pub group_by: Option<String>,

    /// (column name, solicited, matched, notMatched or matchRate) Orders the summary table.
    #[clap(long, value_parser)]
    pub sort: Option<String>,

    /// Sort in descending order.
    #[clap(long, takes_value = false)]
    pub desc: bool,

    /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the given
    /// location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the paginated report will be written to the given location.
    #[clap(short, long, value_parser)]
    pub export: Option<String>,

    /// (file path) A reference file containing a JSON summary. If provided, nrmpdash will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// Prints the specialties found in the table, main specialties and subspecialties apart, and exits.
    #[clap(long, takes_value = false)]
    pub list_specialties: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
