//! Cell coordinates of the Summary sheet and of every chart series drawn
//! from it.
//!
//! Pure integer arithmetic over zero-based `(row, col)` pairs. Nothing here
//! touches a workbook, so the mapping can be checked on its own.

use std::fmt;

use rust_xlsxwriter::utility;

use crate::error::{ReportError, Result};

/// Highest zero-based column index a worksheet accepts.
pub const MAX_COL: u16 = 16_383;
/// Highest zero-based row index a worksheet accepts.
pub const MAX_ROW: u32 = 1_048_575;

/// Inclusive rectangular cell range, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

impl CellRange {
    /// A single-column range.
    pub fn column(col: u16, first_row: u32, last_row: u32) -> Self {
        Self {
            first_row,
            first_col: col,
            last_row,
            last_col: col,
        }
    }

    /// Absolute A1 reference on `sheet`, e.g. `=Summary!$C$4:$C$7`.
    pub fn to_formula(&self, sheet: &str) -> String {
        format!("={sheet}!{self}")
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let range = utility::cell_range_absolute(self.first_row, self.first_col, self.last_row, self.last_col);
        write!(f, "{range}")
    }
}

/// What one chart on the Summary sheet plots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSeriesSpec {
    /// Compound name, used as the chart title.
    pub title: String,
    /// Sample IDs, column 0.
    pub categories: CellRange,
    /// Group means.
    pub values: CellRange,
    /// Group standard deviations, used for both plus and minus error bars.
    pub errors: CellRange,
}

/// Shape of the Summary sheet: `n_compounds` (mean, std) column pairs after
/// the Sample ID column, `n_groups` data rows below `header_offset` header rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryLayout {
    pub n_compounds: usize,
    pub n_groups: usize,
    pub header_offset: u32,
}

impl SummaryLayout {
    pub fn new(n_compounds: usize, n_groups: usize, header_offset: u32) -> Result<Self> {
        if 2 * n_compounds > MAX_COL as usize {
            return Err(ReportError::Config(format!(
                "{n_compounds} compounds do not fit in the {} columns of a worksheet",
                MAX_COL as usize + 1
            )));
        }
        if header_offset as usize + n_groups > MAX_ROW as usize + 1 {
            return Err(ReportError::Config(format!(
                "{n_groups} sample groups do not fit in a worksheet"
            )));
        }
        Ok(Self {
            n_compounds,
            n_groups,
            header_offset,
        })
    }

    /// First data row.
    pub fn first_row(&self) -> u32 {
        self.header_offset
    }

    /// Last data row. Only meaningful when `n_groups > 0`.
    pub fn last_row(&self) -> u32 {
        self.header_offset + self.n_groups as u32 - 1
    }

    /// Column of the mean of compound `i`.
    pub fn mean_col(&self, i: usize) -> u16 {
        (2 * i + 1) as u16
    }

    /// Column of the standard deviation of compound `i`.
    pub fn std_col(&self, i: usize) -> u16 {
        (2 * i + 2) as u16
    }

    /// `(categories, values, errors)` of compound `i`.
    pub fn series_ranges(&self, i: usize) -> (CellRange, CellRange, CellRange) {
        let (first, last) = (self.first_row(), self.last_row());
        (
            CellRange::column(0, first, last),
            CellRange::column(self.mean_col(i), first, last),
            CellRange::column(self.std_col(i), first, last),
        )
    }
}

/// One series spec per compound, in compound order. An empty Summary
/// (no groups) yields no charts.
pub fn map_charts(layout: &SummaryLayout, titles: &[String]) -> Vec<ChartSeriesSpec> {
    if layout.n_groups == 0 {
        return Vec::new();
    }
    titles
        .iter()
        .take(layout.n_compounds)
        .enumerate()
        .map(|(i, title)| {
            let (categories, values, errors) = layout.series_ranges(i);
            ChartSeriesSpec {
                title: title.clone(),
                categories,
                values,
                errors,
            }
        })
        .collect()
}

/// Cell at which chart `i` is inserted: `anchor` shifted down by
/// `stack_rows` per preceding chart. Fails when the chart would land below
/// the last worksheet row.
pub fn chart_anchor(anchor: (u32, u16), stack_rows: u32, i: usize) -> Result<(u32, u16)> {
    u32::try_from(i)
        .ok()
        .and_then(|i| stack_rows.checked_mul(i))
        .and_then(|shift| anchor.0.checked_add(shift))
        .filter(|&row| row <= MAX_ROW)
        .map(|row| (row, anchor.1))
        .ok_or_else(|| {
            ReportError::Config(format!(
                "chart {} stacked {stack_rows} rows apart does not fit in a worksheet",
                i + 1
            ))
        })
}

/// Parse an A1 reference such as `H2` into zero-based `(row, col)`.
pub fn parse_a1(cell: &str) -> Option<(u32, u16)> {
    let cell = cell.trim().trim_start_matches('$');
    let split = cell.find(|c: char| !c.is_ascii_alphabetic())?;
    let (letters, digits) = cell.split_at(split);
    let digits = digits.trim_start_matches('$');
    // XFD is the widest column name.
    if letters.is_empty() || letters.len() > 3 || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let col = utility::column_name_to_number(&letters.to_ascii_uppercase());
    if col > MAX_COL {
        return None;
    }
    let row: u32 = digits.parse().ok()?;
    if row == 0 || row > MAX_ROW + 1 {
        return None;
    }
    Some((row - 1, col))
}
