use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::app::RunInputs;
use crate::config::{NormalizationFormula, RunConfig};
use crate::error::Result;

/// CLI-friendly normalization formula
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliFormula {
    /// Area Ratio / Sample wt
    Ratio,
    /// Area Ratio * IS conc * 1000 / Sample wt
    Scaled,
}

impl From<CliFormula> for NormalizationFormula {
    fn from(f: CliFormula) -> Self {
        match f {
            CliFormula::Ratio => NormalizationFormula::Ratio,
            CliFormula::Scaled => NormalizationFormula::Scaled,
        }
    }
}

/// Dry-weight normalization report for LC-MS compound sheets
#[derive(Parser, Debug, Clone)]
#[command(name = "dryweight-report")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Measurement workbook, one sheet per compound
    #[arg(short, long, value_name = "XLSX")]
    pub measurements: PathBuf,

    /// Weight table (Filename, Sample wt) as a workbook or CSV/TSV
    #[arg(short, long, value_name = "FILE")]
    pub weights: PathBuf,

    /// Internal standard amount (ng); selects the scaled formula unless --formula says otherwise
    #[arg(short = 'i', long = "is-conc", value_name = "NG")]
    pub is_conc: Option<f64>,

    /// Normalization formula
    #[arg(short, long, value_enum)]
    pub formula: Option<CliFormula>,

    /// JSON configuration file; flags given here override it
    #[arg(short, long, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Output directory (default: "Results" beside the measurement workbook)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Cell text that marks a missing measurement
    #[arg(long, value_name = "TEXT")]
    pub na_sentinel: Option<String>,

    /// Sheet to skip; repeat to build the list (replaces the configured list)
    #[arg(long = "exclude-sheet", value_name = "NAME")]
    pub exclude_sheets: Vec<String>,

    /// Skip the per-compound box/swarm images
    #[arg(long, default_value_t = false)]
    pub no_plots: bool,
}

impl Args {
    /// Merge the optional config file with the flags.
    pub fn resolve(&self) -> Result<(RunInputs, RunConfig)> {
        let mut cfg = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };
        if let Some(conc) = self.is_conc {
            cfg.internal_standard_conc = Some(conc);
        }
        if let Some(formula) = self.formula {
            cfg.formula = Some(formula.into());
        }
        if let Some(sentinel) = &self.na_sentinel {
            cfg.not_found_sentinel = sentinel.clone();
        }
        if !self.exclude_sheets.is_empty() {
            cfg.reserved_sheets = self.exclude_sheets.clone();
        }
        if self.no_plots {
            cfg.render_plots = false;
        }

        let mut inputs = RunInputs::new(&self.measurements, &self.weights);
        inputs.output_dir = self.output_dir.clone();
        Ok((inputs, cfg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizationParams;

    #[test]
    fn is_conc_flag_selects_scaled_formula() {
        let args = Args::parse_from(["dryweight-report", "-m", "report.xlsx", "-w", "dw.xlsx", "--is-conc", "100"]);
        let (inputs, cfg) = args.resolve().unwrap();
        assert_eq!(inputs.measurements, PathBuf::from("report.xlsx"));
        assert_eq!(cfg.normalization().unwrap(), NormalizationParams::scaled(100.0));
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "dryweight-report",
            "--measurements",
            "report.xlsx",
            "--weights",
            "dw.csv",
            "--formula",
            "ratio",
            "--na-sentinel",
            "N/F",
            "--exclude-sheet",
            "Component",
            "--exclude-sheet",
            "Notes",
            "--no-plots",
            "-o",
            "out",
        ]);
        let (inputs, cfg) = args.resolve().unwrap();
        assert_eq!(cfg.normalization().unwrap(), NormalizationParams::ratio());
        assert_eq!(cfg.not_found_sentinel, "N/F");
        assert_eq!(cfg.reserved_sheets, vec!["Component", "Notes"]);
        assert!(!cfg.render_plots);
        assert_eq!(inputs.results_dir(&cfg), PathBuf::from("out"));
    }

    #[test]
    fn results_dir_defaults_beside_measurements() {
        let args = Args::parse_from(["dryweight-report", "-m", "/data/run1/report.xlsx", "-w", "dw.xlsx"]);
        let (inputs, cfg) = args.resolve().unwrap();
        assert_eq!(inputs.results_dir(&cfg), PathBuf::from("/data/run1/Results"));
    }
}
