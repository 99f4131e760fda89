/*!

This is the long-form manual for `match_stats` and `nrmpdash`.

## Quick start

The dashboard reads a single table of residency match statistics, for example
`NRMP_2020_2025_Main_and_Specialty.csv`, with one row per program:

```text
Program Code,Sponsoring Institution,Specialty Cleaned,Table,SNHAF,2020 Quota,2020 Matched,2021 Quota,2021 Matched
1234,Mercy Hospital,Surgery,Main,SNHAF,10,8,,
1235,Mercy Hospital,Hand Surgery,Specialty,SNHAF,,,5,5
```

Run `nrmpdash` on it:

```bash
nrmpdash -i NRMP_2020_2025_Main_and_Specialty.csv --years 2020-2021 --group-by institution
```

The program prints the summary table, the totals and the median match rate.
Add `--export report.txt` to write the paginated report, and `--out summary.json`
to write the summary in JSON format.

## Columns

The role of each column is inferred from its name. The rules are applied in
order and the first match wins:

| rule | role |
|------|------|
| `<YYYY> Quota`, `<YYYY> Matched` | yearly metric |
| contains `program` and `code` | program code |
| contains `snhaf`, `category` or `institution type` | institution category |
| contains `institution` or `sponsor` | institution name |
| contains `specialty` | specialty name |
| is `table` | main table or specialty table |

Apart from the yearly metrics, the rules ignore case. Metric cells that are
missing or not numeric count as zero.

## Filters

- **Years**: an inclusive range inside the dataset bounds (2020 to 2025 by
  default). A row is kept only if it has some quota or some matches inside
  the range.
- **Specialties**: a set of names of the `Specialty Cleaned` column (or of
  the first specialty column). An empty set keeps every specialty.
- **Institution type**: `ALL`, `SNHAF` or `NOT`, compared exactly with the
  category cell.

Rows without a program code and without any specialty name are ignored.

## Grouping and totals

Without grouping, every filtered row is a line of the summary. With
`--group-by institution`, rows are summed per sponsoring institution, in the
order in which each institution first appears in the file. Institution
names are compared after trimming surrounding spaces.

Each line carries the solicited positions (sum of the quotas in the year
range), the matched positions, the unmatched positions and the match rate in
percent (zero when nothing was solicited). The unmatched positions are
negative when a program filled more positions than it offered. The totals
line sums every line, and its yearly columns cover every year of the data;
the median match rate is the median of the line match rates.

## Sorting

`--sort` accepts `solicited`, `matched`, `notMatched`, `matchRate` or the name
of any column. Derived fields and yearly metrics are compared as numbers, other
columns as text. The sort is stable: lines with equal values keep their order.

## Export

The report is laid out on A4 landscape pages. The first page shows the title,
the date (`reportDate`, or today when it is not configured) and the active
filters; the table header is repeated on every page.
Rows are never split: a page is filled until the next row does not fit, and a
row taller than a whole page gets a page of its own.

## Configuration

All the options can also be given in a JSON file with `--config`:

```json
{
  "outputSettings": { "reportTitle": "NRMP Summary Report", "reportDate": "2024-03-15" },
  "dataSource": { "provider": "csv", "filePath": "NRMP_2020_2025_Main_and_Specialty.csv" },
  "dataset": { "minYear": 2020, "maxYear": 2025 },
  "filters": { "yearRange": [2021, 2024], "specialties": ["Surgery"], "category": "SNHAF" },
  "view": { "groupBy": "institution", "sortKey": "matchRate", "sortDirection": "desc" }
}
```

Paths are relative to the configuration file. Flags given on the command line
take precedence over the file.

The `xlsx` provider reads the first worksheet of an Excel workbook, or the one
named by `excelWorksheetName`.

 */
