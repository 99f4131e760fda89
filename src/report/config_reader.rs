use crate::report::*;

use std::fs;

use match_stats::export::PageGeometry;
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "reportTitle")]
    pub report_title: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "reportDate")]
    pub report_date: Option<String>,
    #[serde(rename = "fileName")]
    pub file_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetSettings {
    #[serde(rename = "minYear")]
    pub min_year: Option<Year>,
    #[serde(rename = "maxYear")]
    pub max_year: Option<Year>,
}

impl DatasetSettings {
    pub fn bounds(&self) -> DatasetBounds {
        let d = DatasetBounds::DEFAULT_BOUNDS;
        DatasetBounds::new(
            self.min_year.unwrap_or(d.min_year),
            self.max_year.unwrap_or(d.max_year),
        )
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSettings {
    #[serde(rename = "yearRange")]
    pub year_range: Option<[Year; 2]>,
    pub specialties: Option<Vec<String>>,
    pub category: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewSettings {
    #[serde(rename = "groupBy")]
    pub group_by: Option<String>,
    #[serde(rename = "sortKey")]
    pub sort_key: Option<String>,
    #[serde(rename = "sortDirection")]
    pub sort_direction: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportSettings {
    pub scale: Option<f32>,
    #[serde(rename = "pageWidthMm")]
    pub page_width_mm: Option<f32>,
    #[serde(rename = "pageHeightMm")]
    pub page_height_mm: Option<f32>,
    #[serde(rename = "marginMm")]
    pub margin_mm: Option<f32>,
    #[serde(rename = "contentTopMm")]
    pub content_top_mm: Option<f32>,
    #[serde(rename = "columnWidthChars")]
    pub column_width_chars: Option<usize>,
    #[serde(rename = "charWidthPx")]
    pub char_width_px: Option<u32>,
    #[serde(rename = "lineHeightPx")]
    pub line_height_px: Option<u32>,
}

impl ExportSettings {
    pub fn geometry(&self) -> PageGeometry {
        let d = PageGeometry::A4_LANDSCAPE;
        PageGeometry {
            page_width_mm: self.page_width_mm.unwrap_or(d.page_width_mm),
            page_height_mm: self.page_height_mm.unwrap_or(d.page_height_mm),
            margin_mm: self.margin_mm.unwrap_or(d.margin_mm),
            content_top_mm: self.content_top_mm.unwrap_or(d.content_top_mm),
            scale: self.scale.filter(|s| *s > 0.0).unwrap_or(d.scale),
        }
    }

    pub fn layout(&self) -> RenderLayout {
        let d = RenderLayout::DEFAULT;
        RenderLayout {
            column_width_chars: self
                .column_width_chars
                .filter(|w| *w > 0)
                .unwrap_or(d.column_width_chars),
            char_width_px: self.char_width_px.unwrap_or(d.char_width_px),
            line_height_px: self.line_height_px.unwrap_or(d.line_height_px),
        }
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "dataSource")]
    pub data_source: DataSource,
    #[serde(default)]
    pub dataset: DatasetSettings,
    #[serde(default)]
    pub filters: FilterSettings,
    #[serde(default)]
    pub view: ViewSettings,
    #[serde(default)]
    pub export: ExportSettings,
}

pub fn read_config(path: &str) -> DashResult<DashboardConfig> {
    let config_str = fs::read_to_string(path).context(OpeningConfigSnafu { path })?;
    let config: DashboardConfig =
        serde_json::from_str(&config_str).context(ParsingConfigSnafu { path })?;
    Ok(config)
}

pub fn read_summary(path: &str) -> DashResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningConfigSnafu { path })?;
    debug!("read content: {:?}", contents);
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingConfigSnafu { path })?;
    Ok(js)
}

// ******** Option values shared by the file and the command line ********

pub fn parse_provider(s: &str) -> DashResult<Provider> {
    match s.trim().to_lowercase().as_str() {
        "csv" => Ok(Provider::Csv),
        "xlsx" | "excel" => Ok(Provider::Xlsx),
        _ => InvalidOptionSnafu {
            option: "provider",
            value: s,
        }
        .fail(),
    }
}

pub fn parse_category(s: &str) -> DashResult<CategoryFilter> {
    CategoryFilter::parse(s).context(InvalidOptionSnafu {
        option: "category",
        value: s,
    })
}

pub fn parse_group_by(s: &str) -> DashResult<GroupBy> {
    match s.trim().to_lowercase().as_str() {
        "" | "none" => Ok(GroupBy::None),
        "institution" | "sponsor" => Ok(GroupBy::Institution),
        _ => InvalidOptionSnafu {
            option: "groupBy",
            value: s,
        }
        .fail(),
    }
}

pub fn parse_sort_direction(s: &str) -> DashResult<SortDirection> {
    match s.trim().to_lowercase().as_str() {
        "asc" | "ascending" => Ok(SortDirection::Ascending),
        "desc" | "descending" => Ok(SortDirection::Descending),
        _ => InvalidOptionSnafu {
            option: "sortDirection",
            value: s,
        }
        .fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config() {
        let c: DashboardConfig = serde_json::from_str(
            r#"{ "dataSource": { "provider": "csv", "filePath": "t.csv" } }"#,
        )
        .unwrap();
        assert_eq!(c.data_source.file_path, "t.csv");
        assert_eq!(c.dataset.bounds(), DatasetBounds::DEFAULT_BOUNDS);
        assert_eq!(c.export.geometry(), PageGeometry::A4_LANDSCAPE);
        assert_eq!(c.export.layout(), RenderLayout::DEFAULT);
        assert_eq!(c.output_settings, OutputSettings::default());
    }

    #[test]
    fn full_config() {
        let c: DashboardConfig = serde_json::from_str(
            r#"{
                "outputSettings": { "reportTitle": "Surgery", "fileName": "surgery" },
                "dataSource": { "provider": "xlsx", "filePath": "t.xlsx", "excelWorksheetName": "2025" },
                "dataset": { "minYear": 2018 },
                "filters": { "yearRange": [2019, 2021], "specialties": ["Surgery"], "category": "NOT" },
                "view": { "groupBy": "institution", "sortKey": "2019 Quota", "sortDirection": "desc" },
                "export": { "scale": 1.0, "marginMm": 5.0 }
            }"#,
        )
        .unwrap();
        assert_eq!(c.dataset.bounds(), DatasetBounds::new(2018, 2025));
        assert_eq!(c.filters.year_range, Some([2019, 2021]));
        assert_eq!(c.view.sort_key.as_deref(), Some("2019 Quota"));
        let g = c.export.geometry();
        assert_eq!(g.scale, 1.0);
        assert_eq!(g.margin_mm, 5.0);
        assert_eq!(g.page_width_mm, 297.0);
        assert_eq!(c.data_source.excel_worksheet_name.as_deref(), Some("2025"));
    }

    #[test]
    fn missing_data_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("c.json");
        fs::write(&p, r#"{ "filters": {} }"#).unwrap();
        let res = read_config(p.to_str().unwrap());
        assert!(matches!(res, Err(DashboardError::ParsingConfig { .. })));
        let res = read_config(dir.path().join("none.json").to_str().unwrap());
        assert!(matches!(res, Err(DashboardError::OpeningConfig { .. })));
    }

    #[test]
    fn option_values() {
        assert_eq!(parse_provider("CSV").unwrap(), Provider::Csv);
        assert_eq!(parse_provider("xlsx").unwrap(), Provider::Xlsx);
        assert!(parse_provider("ods").is_err());
        assert_eq!(parse_category("snhaf").unwrap(), CategoryFilter::CategoryA);
        assert_eq!(parse_group_by("none").unwrap(), GroupBy::None);
        assert_eq!(parse_group_by("Institution").unwrap(), GroupBy::Institution);
        assert!(parse_group_by("specialty").is_err());
        assert_eq!(
            parse_sort_direction("desc").unwrap(),
            SortDirection::Descending
        );
    }
}
