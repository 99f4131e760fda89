// ********* Input data structures ***********

use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Add, AddAssign, RangeInclusive};

use crate::table::Row;

pub type Year = u16;

/// A count of positions (offered or filled), as read from a metric cell.
#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash, Default)]
pub struct SeatCount(pub u64);

impl SeatCount {
    pub const EMPTY: SeatCount = SeatCount(0);

    /// `self - other` as a signed count. Negative when more positions were
    /// filled than offered.
    pub fn difference(self, other: SeatCount) -> i64 {
        let d = self.0 as i128 - other.0 as i128;
        d.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }
}

// Counts saturate: oversized cells must not overflow the totals.

impl std::iter::Sum for SeatCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(SeatCount::EMPTY, |acc, sc| acc + sc)
    }
}

impl AddAssign for SeatCount {
    fn add_assign(&mut self, rhs: SeatCount) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Add for SeatCount {
    type Output = SeatCount;
    fn add(self: SeatCount, rhs: SeatCount) -> SeatCount {
        SeatCount(self.0.saturating_add(rhs.0))
    }
}

/// The two yearly metrics published for every program.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum MetricKind {
    /// Positions offered (`<year> Quota`).
    Quota,
    /// Positions filled (`<year> Matched`).
    Matched,
}

impl MetricKind {
    pub fn column_name(&self, year: Year) -> String {
        match self {
            MetricKind::Quota => format!("{} Quota", year),
            MetricKind::Matched => format!("{} Matched", year),
        }
    }
}

/// Offered and filled positions for one year.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct YearBucket {
    pub quota: SeatCount,
    pub matched: SeatCount,
}

impl YearBucket {
    pub const EMPTY: YearBucket = YearBucket {
        quota: SeatCount::EMPTY,
        matched: SeatCount::EMPTY,
    };

    pub fn get(&self, kind: MetricKind) -> SeatCount {
        match kind {
            MetricKind::Quota => self.quota,
            MetricKind::Matched => self.matched,
        }
    }

    pub fn is_active(&self) -> bool {
        self.quota > SeatCount::EMPTY || self.matched > SeatCount::EMPTY
    }
}

impl AddAssign for YearBucket {
    fn add_assign(&mut self, rhs: YearBucket) {
        self.quota += rhs.quota;
        self.matched += rhs.matched;
    }
}

// ********* Filter state **********

/// The years covered by the dataset. This is a deployment constant, it is
/// not derived from the data.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct DatasetBounds {
    pub min_year: Year,
    pub max_year: Year,
}

impl DatasetBounds {
    pub const DEFAULT_BOUNDS: DatasetBounds = DatasetBounds {
        min_year: 2020,
        max_year: 2025,
    };

    pub fn new(a: Year, b: Year) -> DatasetBounds {
        DatasetBounds {
            min_year: a.min(b),
            max_year: a.max(b),
        }
    }

    pub fn full_range(&self) -> YearRange {
        YearRange::new(self.min_year, self.max_year)
    }
}

/// A closed interval of years with `min <= max`.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct YearRange {
    min: Year,
    max: Year,
}

impl YearRange {
    /// Builds a range from two endpoints, in any order.
    pub fn new(a: Year, b: Year) -> YearRange {
        YearRange {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn min(&self) -> Year {
        self.min
    }

    pub fn max(&self) -> Year {
        self.max
    }

    pub fn contains(&self, year: Year) -> bool {
        self.min <= year && year <= self.max
    }

    pub fn years(&self) -> RangeInclusive<Year> {
        self.min..=self.max
    }

    /// Restricts the range to the dataset bounds. A range entirely outside the
    /// bounds collapses onto the nearest bound.
    pub fn clamp_to(&self, bounds: &DatasetBounds) -> YearRange {
        YearRange::new(
            self.min.clamp(bounds.min_year, bounds.max_year),
            self.max.clamp(bounds.min_year, bounds.max_year),
        )
    }
}

/// Restriction on the institution category column.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum CategoryFilter {
    All,
    /// Institutions flagged `SNHAF`.
    CategoryA,
    /// Institutions flagged `NOT`.
    CategoryB,
}

impl CategoryFilter {
    pub const CATEGORY_A_VALUE: &'static str = "SNHAF";
    pub const CATEGORY_B_VALUE: &'static str = "NOT";

    /// The exact cell content a row must carry to pass this filter.
    pub fn cell_value(&self) -> Option<&'static str> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::CategoryA => Some(Self::CATEGORY_A_VALUE),
            CategoryFilter::CategoryB => Some(Self::CATEGORY_B_VALUE),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoryFilter::All => "All Institutions",
            CategoryFilter::CategoryA => "SNHAF",
            CategoryFilter::CategoryB => "Non-SNHAF",
        }
    }

    /// Accepts the option values of the category control (`ALL`, `SNHAF`, `NOT`).
    pub fn parse(s: &str) -> Option<CategoryFilter> {
        match s.trim().to_uppercase().as_str() {
            "ALL" => Some(CategoryFilter::All),
            "SNHAF" => Some(CategoryFilter::CategoryA),
            "NOT" | "NON-SNHAF" => Some(CategoryFilter::CategoryB),
            _ => None,
        }
    }
}

/// A snapshot of the filters. It is replaced wholesale on every change.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FilterState {
    pub year_range: YearRange,
    /// An empty set means no restriction.
    pub specialties: BTreeSet<String>,
    pub category: CategoryFilter,
}

impl FilterState {
    /// The initial state: all years, all specialties, all institutions.
    pub fn unrestricted(bounds: &DatasetBounds) -> FilterState {
        FilterState {
            year_range: bounds.full_range(),
            specialties: BTreeSet::new(),
            category: CategoryFilter::All,
        }
    }
}

// ********* View state **********

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum GroupBy {
    None,
    /// One record per sponsoring institution.
    Institution,
}

/// The column used for ordering the aggregated rows.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum SortKey {
    /// A column of the source table, by name.
    Column(String),
    Solicited,
    Matched,
    NotMatched,
    MatchRate,
}

impl SortKey {
    /// Parses the name of a derived field, falling back to a table column.
    pub fn parse(s: &str) -> SortKey {
        match s.trim().to_lowercase().replace(['_', '-', ' '], "").as_str() {
            "solicited" => SortKey::Solicited,
            "matched" => SortKey::Matched,
            "notmatched" | "unmatched" => SortKey::NotMatched,
            "matchrate" => SortKey::MatchRate,
            _ => SortKey::Column(s.trim().to_string()),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// The direction to use after a second click on the same column header.
    pub fn toggled(&self) -> SortDirection {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct SortState {
    /// `None` keeps the order produced by the aggregation.
    pub key: Option<SortKey>,
    pub direction: SortDirection,
}

impl SortState {
    pub const UNSORTED: SortState = SortState {
        key: None,
        direction: SortDirection::Ascending,
    };
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum RecordKind {
    /// A row of the source table, passed through.
    Source,
    /// A synthesized record for one institution, with the number of
    /// contributing rows.
    Group { members: usize },
}

/// One line of the rendered summary table.
#[derive(PartialEq, Debug, Clone)]
pub struct AggregatedRow {
    pub kind: RecordKind,
    /// Identifier cells. For groups only the institution column is filled in,
    /// along with the summed metric cells.
    pub fields: Row,
    /// Metrics for every dataset year, regardless of the active window.
    pub buckets: BTreeMap<Year, YearBucket>,
    pub solicited: SeatCount,
    pub matched: SeatCount,
    /// `solicited - matched`, negative when a program filled more positions
    /// than its quota.
    pub not_matched: i64,
    /// Percentage in `[0, 100]`. Zero when nothing was solicited.
    pub match_rate: f64,
}

impl AggregatedRow {
    pub fn bucket(&self, year: Year) -> YearBucket {
        self.buckets.get(&year).cloned().unwrap_or(YearBucket::EMPTY)
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct Totals {
    pub solicited: SeatCount,
    pub matched: SeatCount,
    pub not_matched: i64,
    pub match_rate: f64,
    pub median_match_rate: f64,
    /// Column totals for every dataset year present in the rows.
    pub per_year: BTreeMap<Year, YearBucket>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Aggregation {
    pub rows: Vec<AggregatedRow>,
    pub totals: Totals,
}

/// A contiguous run of rows printed on the same page.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct PageSpan {
    pub start_row: usize,
    pub row_count: usize,
}

impl PageSpan {
    pub fn rows(&self) -> std::ops::Range<usize> {
        self.start_row..self.start_row + self.row_count
    }
}

/// Assignment of rows to pages, in order. Page `i` is `spans[i]`.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct PagePlan {
    pub spans: Vec<PageSpan>,
}

impl PagePlan {
    pub fn page_count(&self) -> usize {
        self.spans.len()
    }

    pub fn total_rows(&self) -> usize {
        self.spans.iter().map(|s| s.row_count).sum()
    }

    /// The zero-based page holding the given row.
    pub fn page_of(&self, row: usize) -> Option<usize> {
        self.spans.iter().position(|s| s.rows().contains(&row))
    }
}
