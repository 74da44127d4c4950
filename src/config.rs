use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

/// How the normalized value is derived from Area Ratio and Sample wt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum NormalizationFormula {
    /// `AreaRatio / SampleWt`
    #[default]
    Ratio,
    /// `AreaRatio * InternalStandardConc * 1000 / SampleWt`
    Scaled,
}

/// Fully resolved normalization parameters handed to the merge engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationParams {
    pub formula: NormalizationFormula,
    pub internal_standard_conc: f64,
}

impl NormalizationParams {
    pub fn ratio() -> Self {
        Self {
            formula: NormalizationFormula::Ratio,
            internal_standard_conc: 1.0,
        }
    }

    pub fn scaled(internal_standard_conc: f64) -> Self {
        Self {
            formula: NormalizationFormula::Scaled,
            internal_standard_conc,
        }
    }

    /// Apply the configured formula to one row.
    pub fn normalize(&self, area_ratio: f64, sample_wt: f64) -> f64 {
        match self.formula {
            NormalizationFormula::Ratio => area_ratio / sample_wt,
            NormalizationFormula::Scaled => {
                area_ratio * self.internal_standard_conc * 1000.0 / sample_wt
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Falls back to `scaled` when an internal standard is given, `ratio` otherwise.
    #[serde(default)]
    pub formula: Option<NormalizationFormula>,
    #[serde(default)]
    pub internal_standard_conc: Option<f64>,
    #[serde(default = "RunConfig::default_not_found_sentinel")]
    pub not_found_sentinel: String,
    #[serde(default = "RunConfig::default_reserved_sheets")]
    pub reserved_sheets: Vec<String>,
    #[serde(default = "RunConfig::default_measurement_skip_rows")]
    pub measurement_skip_rows: usize,
    #[serde(default = "RunConfig::default_header_offset")]
    pub header_offset: u32,
    #[serde(default = "RunConfig::default_na_rep")]
    pub na_rep: String,
    #[serde(default = "RunConfig::default_normalized_column")]
    pub normalized_column: String,
    #[serde(default = "RunConfig::default_chart_anchor")]
    pub chart_anchor: String,
    #[serde(default = "RunConfig::default_chart_stack_rows")]
    pub chart_stack_rows: u32,
    #[serde(default = "RunConfig::default_y_axis_label")]
    pub y_axis_label: String,
    #[serde(default = "RunConfig::default_plot_dpi")]
    pub plot_dpi: u32,
    #[serde(default = "RunConfig::default_render_plots")]
    pub render_plots: bool,
    #[serde(default = "RunConfig::default_results_dir_name")]
    pub results_dir_name: String,
    #[serde(default = "RunConfig::default_merged_workbook_name")]
    pub merged_workbook_name: String,
    #[serde(default = "RunConfig::default_chart_workbook_name")]
    pub chart_workbook_name: String,
}

impl RunConfig {
    fn default_not_found_sentinel() -> String {
        "NF".to_string()
    }
    fn default_reserved_sheets() -> Vec<String> {
        vec!["Component".to_string(), "Summary".to_string()]
    }
    fn default_measurement_skip_rows() -> usize {
        3
    }
    fn default_header_offset() -> u32 {
        3
    }
    fn default_na_rep() -> String {
        "NA".to_string()
    }
    fn default_normalized_column() -> String {
        "Normalized value (pg/mg DW)".to_string()
    }
    fn default_chart_anchor() -> String {
        "H2".to_string()
    }
    fn default_chart_stack_rows() -> u32 {
        16
    }
    fn default_y_axis_label() -> String {
        "Normalized (pg/mg)".to_string()
    }
    fn default_plot_dpi() -> u32 {
        400
    }
    fn default_render_plots() -> bool {
        true
    }
    fn default_results_dir_name() -> String {
        "Results".to_string()
    }
    fn default_merged_workbook_name() -> String {
        "Results.xlsx".to_string()
    }
    fn default_chart_workbook_name() -> String {
        "Charts.xlsx".to_string()
    }

    /// Load a JSON configuration file; absent keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
        serde_json::from_str(&text)
            .map_err(|e| ReportError::Config(format!("{}: {e}", path.display())))
    }

    /// Resolve the formula choice and validate the internal standard.
    pub fn normalization(&self) -> Result<NormalizationParams> {
        let formula = self.formula.unwrap_or(match self.internal_standard_conc {
            Some(_) => NormalizationFormula::Scaled,
            None => NormalizationFormula::Ratio,
        });
        match formula {
            NormalizationFormula::Ratio => Ok(NormalizationParams::ratio()),
            NormalizationFormula::Scaled => match self.internal_standard_conc {
                Some(conc) if conc.is_finite() && conc > 0.0 => {
                    Ok(NormalizationParams::scaled(conc))
                }
                Some(conc) => Err(ReportError::Config(format!(
                    "internal standard concentration must be a positive number, got {conc}"
                ))),
                None => Err(ReportError::Config(
                    "the scaled formula needs an internal standard concentration".to_string(),
                )),
            },
        }
    }

    /// Check the values the writers rely on.
    pub fn validate(&self) -> Result<()> {
        if self.header_offset < 3 {
            return Err(ReportError::Config(format!(
                "header_offset must leave room for the 3 summary header rows, got {}",
                self.header_offset
            )));
        }
        if self.plot_dpi == 0 {
            return Err(ReportError::Config("plot_dpi must be positive".to_string()));
        }
        crate::report::layout::parse_a1(&self.chart_anchor).ok_or_else(|| {
            ReportError::Config(format!("chart_anchor '{}' is not an A1 cell", self.chart_anchor))
        })?;
        self.normalization().map(|_| ())
    }

    pub fn is_reserved_sheet(&self, name: &str) -> bool {
        self.reserved_sheets.iter().any(|r| r == name)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            formula: None,
            internal_standard_conc: None,
            not_found_sentinel: Self::default_not_found_sentinel(),
            reserved_sheets: Self::default_reserved_sheets(),
            measurement_skip_rows: Self::default_measurement_skip_rows(),
            header_offset: Self::default_header_offset(),
            na_rep: Self::default_na_rep(),
            normalized_column: Self::default_normalized_column(),
            chart_anchor: Self::default_chart_anchor(),
            chart_stack_rows: Self::default_chart_stack_rows(),
            y_axis_label: Self::default_y_axis_label(),
            plot_dpi: Self::default_plot_dpi(),
            render_plots: Self::default_render_plots(),
            results_dir_name: Self::default_results_dir_name(),
            merged_workbook_name: Self::default_merged_workbook_name(),
            chart_workbook_name: Self::default_chart_workbook_name(),
        }
    }
}
