use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use dryweight_report::app;
use dryweight_report::cli::Args;
use dryweight_report::error::ReportError;

/// Exit code for command-line usage errors.
const USAGE_EXIT: u8 = 6;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(USAGE_EXIT)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            let code = e
                .downcast_ref::<ReportError>()
                .map(ReportError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code as u8)
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let (inputs, cfg) = args.resolve().context("resolving configuration")?;
    let report = app::run(&inputs, &cfg).with_context(|| {
        format!(
            "processing {} with weights {}",
            inputs.measurements.display(),
            inputs.weights.display()
        )
    })?;

    for c in &report.compounds {
        log::info!(
            "{}: {} of {} rows merged ({} without weight)",
            c.name,
            c.merged_rows,
            c.input_rows,
            c.unmatched_rows
        );
    }
    log::info!(
        "Done: {} compound(s), {} sample group(s), {} file(s) in {}",
        report.summary.n_compounds(),
        report.summary.n_groups(),
        report.artifacts.len(),
        report.results_dir.display()
    );
    Ok(())
}
