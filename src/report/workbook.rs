use rust_xlsxwriter::{
    Chart, ChartErrorBars, ChartErrorBarsType, ChartRange, ChartType, Format, FormatAlign,
    Workbook, Worksheet,
};

use super::layout::{self, CellRange, ChartSeriesSpec, SummaryLayout};
use crate::config::RunConfig;
use crate::data::loader::SAMPLE_WT_COLUMN;
use crate::data::model::{CellValue, MergedTable, SummaryTable};
use crate::error::{ReportError, Result};

pub const SUMMARY_SHEET: &str = "Summary";

// ---------------------------------------------------------------------------
// Merged workbook
// ---------------------------------------------------------------------------

/// One sheet per compound (input columns, `Sample wt`, normalized value)
/// followed by the Summary sheet. Returned as xlsx bytes.
pub fn build_merged_workbook(merged: &[MergedTable], summary: &SummaryTable, cfg: &RunConfig) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    for table in merged {
        let sheet = workbook.add_worksheet();
        sheet.set_name(&table.compound)?;
        write_compound_sheet(sheet, table, cfg, &header)?;
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name(SUMMARY_SHEET)?;
    write_summary_sheet(sheet, summary, cfg)?;

    Ok(workbook.save_to_buffer()?)
}

fn write_compound_sheet(sheet: &mut Worksheet, table: &MergedTable, cfg: &RunConfig, header: &Format) -> Result<()> {
    let n_input = table.columns.len() as u16;
    for (col, name) in table.columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, name, header)?;
    }
    sheet.write_string_with_format(0, n_input, SAMPLE_WT_COLUMN, header)?;
    sheet.write_string_with_format(0, n_input + 1, &cfg.normalized_column, header)?;

    for (i, row) in table.rows.iter().enumerate() {
        let r = i as u32 + 1;
        for (col, cell) in row.measurement.cells.iter().enumerate() {
            write_cell(sheet, r, col as u16, cell, &cfg.na_rep)?;
        }
        write_number_or_na(sheet, r, n_input, row.sample_wt, &cfg.na_rep)?;
        write_number_or_na(sheet, r, n_input + 1, row.normalized, &cfg.na_rep)?;
    }
    Ok(())
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, cell: &CellValue, na_rep: &str) -> Result<()> {
    match cell {
        CellValue::String(s) | CellValue::Date(s) => {
            sheet.write_string(row, col, s)?;
        }
        CellValue::Integer(i) => {
            sheet.write_number(row, col, *i as f64)?;
        }
        CellValue::Float(f) => write_number_or_na(sheet, row, col, Some(*f), na_rep)?,
        CellValue::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        CellValue::Null => {
            sheet.write_string(row, col, na_rep)?;
        }
    }
    Ok(())
}

/// Non-finite values cannot be stored in a cell and are written as `na_rep`.
fn write_number_or_na(sheet: &mut Worksheet, row: u32, col: u16, value: Option<f64>, na_rep: &str) -> Result<()> {
    match value.filter(|v| v.is_finite()) {
        Some(v) => sheet.write_number(row, col, v)?,
        None => sheet.write_string(row, col, na_rep)?,
    };
    Ok(())
}

// ---------------------------------------------------------------------------
// Summary sheet
// ---------------------------------------------------------------------------

/// Rows 0..3 hold the compound names, the `mean`/`std` labels and the
/// `Sample ID` label; data starts at `cfg.header_offset`.
fn write_summary_sheet(sheet: &mut Worksheet, summary: &SummaryTable, cfg: &RunConfig) -> Result<SummaryLayout> {
    let layout = SummaryLayout::new(summary.n_compounds(), summary.n_groups(), cfg.header_offset)?;
    let bold = Format::new().set_bold();
    let title = Format::new().set_bold().set_align(FormatAlign::Center);

    for (i, compound) in summary.compounds.iter().enumerate() {
        let (mean_col, std_col) = (layout.mean_col(i), layout.std_col(i));
        sheet.merge_range(0, mean_col, 0, std_col, compound, &title)?;
        sheet.write_string_with_format(1, mean_col, "mean", &bold)?;
        sheet.write_string_with_format(1, std_col, "std", &bold)?;
    }
    sheet.write_string_with_format(2, 0, "Sample ID", &bold)?;

    for (r, sample_id) in summary.sample_ids.iter().enumerate() {
        let row = layout.first_row() + r as u32;
        sheet.write_string_with_format(row, 0, sample_id, &bold)?;
        for i in 0..summary.n_compounds() {
            let (mean, std) = summary.stats(r, i);
            write_number_or_na(sheet, row, layout.mean_col(i), Some(mean), &cfg.na_rep)?;
            write_number_or_na(sheet, row, layout.std_col(i), Some(std), &cfg.na_rep)?;
        }
    }
    Ok(layout)
}

// ---------------------------------------------------------------------------
// Chart workbook
// ---------------------------------------------------------------------------

/// Summary sheet plus one column chart with symmetric error bars per compound.
pub fn build_chart_workbook(summary: &SummaryTable, cfg: &RunConfig) -> Result<Vec<u8>> {
    let anchor = layout::parse_a1(&cfg.chart_anchor)
        .ok_or_else(|| ReportError::Config(format!("chart_anchor '{}' is not an A1 cell", cfg.chart_anchor)))?;

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SUMMARY_SHEET)?;
    let summary_layout = write_summary_sheet(sheet, summary, cfg)?;

    let specs = layout::map_charts(&summary_layout, &summary.compounds);
    for (i, spec) in specs.iter().enumerate() {
        log::debug!(
            "Chart '{}': values {}, errors {}",
            spec.title,
            spec.values.to_formula(SUMMARY_SHEET),
            spec.errors.to_formula(SUMMARY_SHEET)
        );
        let chart = column_chart(spec, &cfg.y_axis_label);
        let (row, col) = layout::chart_anchor(anchor, cfg.chart_stack_rows, i)?;
        sheet.insert_chart(row, col, &chart)?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn column_chart(spec: &ChartSeriesSpec, y_axis_label: &str) -> Chart {
    let mut chart = Chart::new(ChartType::Column);
    let mut error_bars = ChartErrorBars::new();
    error_bars.set_type(ChartErrorBarsType::Custom(
        chart_range(&spec.errors),
        chart_range(&spec.errors),
    ));

    chart
        .add_series()
        .set_categories(&chart_range(&spec.categories))
        .set_values(&chart_range(&spec.values))
        .set_y_error_bars(&error_bars);

    chart.title().set_name(&spec.title);
    chart.legend().set_hidden();
    chart.y_axis().set_name(y_axis_label);
    chart
}

fn chart_range(range: &CellRange) -> ChartRange {
    ChartRange::new_from_range(
        SUMMARY_SHEET,
        range.first_row,
        range.first_col,
        range.last_row,
        range.last_col,
    )
}
