use std::fs;
use std::path::{Path, PathBuf};

use crate::config::RunConfig;
use crate::data::aggregate::aggregate;
use crate::data::loader::{load_measurements, load_weights};
use crate::data::merge::{merge, WeightIndex};
use crate::data::model::SummaryTable;
use crate::data::summary::assemble;
use crate::error::{ReportError, Result};
use crate::report::plot::render_distribution_png;
use crate::report::workbook::{build_chart_workbook, build_merged_workbook};
use crate::report::{ensure_dir, persist, Artifact};

// ---------------------------------------------------------------------------
// Pipeline inputs / outputs
// ---------------------------------------------------------------------------

/// Resolved input locations of one run.
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub measurements: PathBuf,
    pub weights: PathBuf,
    /// Overrides the `Results` directory beside the measurement workbook.
    pub output_dir: Option<PathBuf>,
}

impl RunInputs {
    pub fn new(measurements: impl Into<PathBuf>, weights: impl Into<PathBuf>) -> Self {
        Self {
            measurements: measurements.into(),
            weights: weights.into(),
            output_dir: None,
        }
    }

    /// Directory the artifacts are written to.
    pub fn results_dir(&self, cfg: &RunConfig) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.clone(),
            None => self
                .measurements
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(&cfg.results_dir_name),
        }
    }
}

/// Per-compound diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundReport {
    pub name: String,
    pub input_rows: usize,
    pub merged_rows: usize,
    /// Rows dropped because their Filename had no weight.
    pub unmatched_rows: usize,
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub compounds: Vec<CompoundReport>,
    pub summary: SummaryTable,
    pub results_dir: PathBuf,
    pub artifacts: Vec<PathBuf>,
}

impl RunReport {
    pub fn total_unmatched(&self) -> usize {
        self.compounds.iter().map(|c| c.unmatched_rows).sum()
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the whole pipeline: load, merge, aggregate, assemble, render, write.
///
/// Nothing is written until every compound has been processed; any error
/// before that leaves the results directory untouched.
pub fn run(inputs: &RunInputs, cfg: &RunConfig) -> Result<RunReport> {
    cfg.validate()?;
    let params = cfg.normalization()?;
    for path in [&inputs.measurements, &inputs.weights] {
        fs::metadata(path).map_err(|e| ReportError::io(path, e))?;
    }

    let weights = load_weights(&inputs.weights)?;
    let index = WeightIndex::build(&weights)?;
    let tables = load_measurements(&inputs.measurements, cfg)?;
    log::info!(
        "Normalizing {} compound(s) against {} weights ({:?})",
        tables.len(),
        index.len(),
        params.formula
    );

    let results_dir = inputs.results_dir(cfg);
    let mut merged_tables = Vec::with_capacity(tables.len());
    let mut summaries = Vec::with_capacity(tables.len());
    let mut compounds = Vec::with_capacity(tables.len());
    let mut plots = Vec::new();

    for table in &tables {
        let merged = merge(table, &index, &params);
        compounds.push(CompoundReport {
            name: table.name.clone(),
            input_rows: table.len(),
            merged_rows: merged.len(),
            unmatched_rows: merged.unmatched,
        });

        if cfg.render_plots {
            let png = render_distribution_png(&merged, &table.name, &cfg.normalized_column, cfg.plot_dpi)?;
            plots.push(Artifact::new(results_dir.join(format!("{}.png", table.name)), png));
        }

        summaries.push(aggregate(&merged));
        merged_tables.push(merged);
    }

    let summary = assemble(&summaries)?;

    let mut artifacts = vec![
        Artifact::new(
            results_dir.join(&cfg.merged_workbook_name),
            build_merged_workbook(&merged_tables, &summary, cfg)?,
        ),
        Artifact::new(
            results_dir.join(&cfg.chart_workbook_name),
            build_chart_workbook(&summary, cfg)?,
        ),
    ];
    artifacts.extend(plots);

    ensure_dir(&results_dir)?;
    persist(&artifacts)?;

    let report = RunReport {
        compounds,
        summary,
        results_dir,
        artifacts: artifacts.into_iter().map(|a| a.path).collect(),
    };
    if report.total_unmatched() > 0 {
        log::warn!(
            "{} measurement row(s) in total had no matching weight",
            report.total_unmatched()
        );
    }
    Ok(report)
}
