use std::path::Path;

use calamine::{open_workbook_auto, Data, DataType, Range, Reader};

use super::model::{CellValue, CompoundTable, MeasurementRow, WeightRow};
use crate::config::RunConfig;
use crate::error::{ReportError, Result};

pub const FILENAME_COLUMN: &str = "Filename";
pub const SAMPLE_ID_COLUMN: &str = "Sample ID";
pub const AREA_RATIO_COLUMN: &str = "Area Ratio";
pub const SAMPLE_WT_COLUMN: &str = "Sample wt";

/// A sheet as a dense row-major grid, row 0 being the first row of the sheet.
pub type Grid = Vec<Vec<CellValue>>;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load every compound sheet of the measurement workbook, in sheet order.
///
/// Sheets named in `cfg.reserved_sheets` are skipped. Cells holding
/// `cfg.not_found_sentinel` are read as null.
pub fn load_measurements(path: &Path, cfg: &RunConfig) -> Result<Vec<CompoundTable>> {
    let mut workbook = open_workbook_auto(path).map_err(|e| spreadsheet_error(path, e))?;

    let mut tables = Vec::new();
    for name in workbook.sheet_names() {
        if cfg.is_reserved_sheet(&name) {
            log::debug!("Skipping reserved sheet '{name}'");
            continue;
        }
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| spreadsheet_error(path, e))?;
        let grid = range_to_grid(&range, Some(&cfg.not_found_sentinel));
        let table = parse_compound_sheet(&name, &grid, cfg.measurement_skip_rows)?;
        log::info!("Read {} rows for compound '{name}'", table.len());
        tables.push(table);
    }
    Ok(tables)
}

/// Load the weight table. Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xls` / `.ods` – first sheet
/// * `.csv` / `.txt` – comma separated
/// * `.tsv` – tab separated
///
/// The first two columns are read as `Filename` and `Sample wt` whatever
/// their header says.
pub fn load_weights(path: &Path) -> Result<Vec<WeightRow>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let grid = match ext.as_str() {
        "csv" | "txt" => read_delimited(path, b',')?,
        "tsv" => read_delimited(path, b'\t')?,
        _ => read_first_sheet(path)?,
    };
    let rows = parse_weight_grid(&path.display().to_string(), &grid)?;
    log::info!("Read {} weight rows from {}", rows.len(), path.display());
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Grid parsing
// ---------------------------------------------------------------------------

/// Turn a compound sheet grid into a [`CompoundTable`].
///
/// The first `skip_rows` rows are instrument preamble, the next row is the
/// header, data follows. Entirely empty rows are dropped.
pub fn parse_compound_sheet(name: &str, grid: &[Vec<CellValue>], skip_rows: usize) -> Result<CompoundTable> {
    let table_name = format!("sheet '{name}'");
    let header_row = grid
        .get(skip_rows)
        .ok_or_else(|| ReportError::missing_column(&table_name, FILENAME_COLUMN))?;
    let columns = header_names(header_row);

    let filename_idx = column_index(&columns, FILENAME_COLUMN, &table_name)?;
    let sample_idx = column_index(&columns, SAMPLE_ID_COLUMN, &table_name)?;
    let ratio_idx = column_index(&columns, AREA_RATIO_COLUMN, &table_name)?;

    let rows = grid[skip_rows + 1..]
        .iter()
        .filter(|row| row.iter().any(|c| !c.is_null()))
        .map(|row| {
            let mut cells = row.clone();
            cells.resize(columns.len(), CellValue::Null);
            MeasurementRow {
                filename: key_at(&cells, filename_idx),
                sample_id: key_at(&cells, sample_idx),
                area_ratio: cells[ratio_idx].as_f64(),
                cells,
            }
        })
        .collect();

    Ok(CompoundTable {
        name: name.to_string(),
        columns,
        rows,
    })
}

/// Turn a weight table grid (header in row 0) into [`WeightRow`]s.
pub fn parse_weight_grid(source: &str, grid: &[Vec<CellValue>]) -> Result<Vec<WeightRow>> {
    let width = grid.first().map(|r| r.len()).unwrap_or(0);
    if width < 1 {
        return Err(ReportError::missing_column(source, FILENAME_COLUMN));
    }
    if width < 2 {
        return Err(ReportError::missing_column(source, SAMPLE_WT_COLUMN));
    }

    Ok(grid[1..]
        .iter()
        .filter_map(|row| {
            let filename = row.first()?.as_key()?;
            let sample_wt = row.get(1).and_then(CellValue::as_f64);
            Some(WeightRow { filename, sample_wt })
        })
        .collect())
}

fn header_names(row: &[CellValue]) -> Vec<String> {
    row.iter()
        .enumerate()
        .map(|(i, c)| c.as_key().unwrap_or_else(|| format!("Unnamed: {i}")))
        .collect()
}

fn column_index(columns: &[String], wanted: &str, table: &str) -> Result<usize> {
    columns
        .iter()
        .position(|c| c == wanted)
        .ok_or_else(|| ReportError::missing_column(table, wanted))
}

fn key_at(cells: &[CellValue], idx: usize) -> String {
    cells[idx].as_key().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Spreadsheet helpers
// ---------------------------------------------------------------------------

fn read_first_sheet(path: &Path) -> Result<Grid> {
    let mut workbook = open_workbook_auto(path).map_err(|e| spreadsheet_error(path, e))?;
    let first = workbook
        .sheet_names()
        .into_iter()
        .next()
        .ok_or_else(|| ReportError::missing_column(path.display().to_string(), FILENAME_COLUMN))?;
    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| spreadsheet_error(path, e))?;
    Ok(range_to_grid(&range, None))
}

/// Expand a calamine range to a grid anchored at A1, so row numbers match
/// the sheet even when leading rows are blank.
pub fn range_to_grid(range: &Range<Data>, sentinel: Option<&str>) -> Grid {
    let Some((end_row, end_col)) = range.end() else {
        return Vec::new();
    };
    (0..=end_row)
        .map(|r| {
            (0..=end_col)
                .map(|c| {
                    range
                        .get_value((r, c))
                        .map(|d| data_to_cell(d, sentinel))
                        .unwrap_or(CellValue::Null)
                })
                .collect()
        })
        .collect()
}

fn data_to_cell(data: &Data, sentinel: Option<&str>) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::String(s) if s.trim().is_empty() => CellValue::Null,
        Data::String(s) if sentinel.is_some_and(|n| s.trim() == n) => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(_) => data.as_f64().map(CellValue::Float).unwrap_or(CellValue::Null),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Date(s.clone()),
    }
}

fn spreadsheet_error(path: &Path, source: calamine::Error) -> ReportError {
    // calamine wraps open failures; surface plain I/O problems as such.
    match source {
        calamine::Error::Io(e) => ReportError::io(path, e),
        source => ReportError::Spreadsheet {
            path: path.to_path_buf(),
            source,
        },
    }
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

fn read_delimited(path: &Path, delimiter: u8) -> Result<Grid> {
    let csv_error = |source: csv::Error| ReportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let file = std::fs::File::open(path).map_err(|e| ReportError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut grid = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        grid.push(record.iter().map(guess_cell_type).collect());
    }
    Ok(grid)
}

fn guess_cell_type(s: &str) -> CellValue {
    let s = s.trim();
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> CellValue {
        CellValue::String(v.to_string())
    }

    fn preamble() -> Grid {
        vec![
            vec![s("Compound: Caffeine")],
            vec![],
            vec![s("Method X")],
        ]
    }

    #[test]
    fn compound_sheet_uses_row_after_preamble_as_header() {
        let mut grid = preamble();
        grid.push(vec![s("Filename"), s("Sample ID"), s("Area"), s("Area Ratio")]);
        grid.push(vec![s("a.raw"), s("Ctrl"), CellValue::Integer(1200), CellValue::Float(0.5)]);
        grid.push(vec![CellValue::Null; 4]);
        grid.push(vec![s("b.raw"), s("Ctrl"), CellValue::Integer(900), CellValue::Null]);

        let table = parse_compound_sheet("Caffeine", &grid, 3).unwrap();
        assert_eq!(table.columns, vec!["Filename", "Sample ID", "Area", "Area Ratio"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].filename, "a.raw");
        assert_eq!(table.rows[0].area_ratio, Some(0.5));
        assert_eq!(table.rows[1].area_ratio, None);
    }

    #[test]
    fn short_rows_are_padded_to_header_width() {
        let mut grid = preamble();
        grid.push(vec![s("Filename"), s("Sample ID"), s("Area Ratio"), s("Notes")]);
        grid.push(vec![s("a.raw"), s("Ctrl"), CellValue::Float(1.0)]);
        let table = parse_compound_sheet("X", &grid, 3).unwrap();
        assert_eq!(table.rows[0].cells.len(), 4);
        assert!(table.rows[0].cells[3].is_null());
    }

    #[test]
    fn missing_area_ratio_is_a_schema_error() {
        let mut grid = preamble();
        grid.push(vec![s("Filename"), s("Sample ID"), s("Area")]);
        let err = parse_compound_sheet("Caffeine", &grid, 3).unwrap_err();
        match err {
            ReportError::Schema { table, column } => {
                assert_eq!(table, "sheet 'Caffeine'");
                assert_eq!(column, "Area Ratio");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn sheet_without_header_row_is_a_schema_error() {
        let err = parse_compound_sheet("Empty", &preamble(), 3).unwrap_err();
        assert!(matches!(err, ReportError::Schema { .. }));
    }

    #[test]
    fn weight_grid_ignores_header_text() {
        let grid = vec![
            vec![s("File"), s("DW (mg)"), s("IS conc")],
            vec![s("a.raw"), CellValue::Float(2.0), CellValue::Integer(100)],
            vec![CellValue::Null, CellValue::Float(3.0)],
            vec![s("b.raw"), s("n/a")],
        ];
        let rows = parse_weight_grid("dw.xlsx", &grid).unwrap();
        assert_eq!(
            rows,
            vec![
                WeightRow { filename: "a.raw".into(), sample_wt: Some(2.0) },
                WeightRow { filename: "b.raw".into(), sample_wt: None },
            ]
        );
    }

    #[test]
    fn single_column_weight_table_is_a_schema_error() {
        let grid = vec![vec![s("Filename")], vec![s("a.raw")]];
        let err = parse_weight_grid("dw.csv", &grid).unwrap_err();
        assert!(matches!(err, ReportError::Schema { ref column, .. } if column == "Sample wt"));
    }

    #[test]
    fn sentinel_and_blank_text_become_null() {
        assert_eq!(data_to_cell(&Data::String("NF".into()), Some("NF")), CellValue::Null);
        assert_eq!(data_to_cell(&Data::String("  ".into()), None), CellValue::Null);
        assert_eq!(data_to_cell(&Data::String("NF".into()), None), s("NF"));
        assert_eq!(data_to_cell(&Data::Float(0.25), Some("NF")), CellValue::Float(0.25));
    }

    #[test]
    fn delimited_fields_are_typed() {
        assert_eq!(guess_cell_type("12"), CellValue::Integer(12));
        assert_eq!(guess_cell_type(" 1.5 "), CellValue::Float(1.5));
        assert_eq!(guess_cell_type(""), CellValue::Null);
        assert_eq!(guess_cell_type("a.raw"), s("a.raw"));
    }
}
