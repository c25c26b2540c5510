#![warn(clippy::uninlined_format_args)]

mod bootstrap;

use std::{borrow::Cow, process};

use bootstrap::{AppConfig, Cli, init_logging, load_env};
use clap::Parser;
use splitsettle_application::SettlementProcessor;
use splitsettle_infrastructure::{CsvRecordSource, GreedySettlementOptimizer};
use splitsettle_presentation::{ReportPresenter, format_run_error, format_settlement_error};

type CliResult<T> = Result<T, Cow<'static, str>>;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run() -> CliResult<()> {
    load_env();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = AppConfig::from_cli(cli)?;
    tracing::debug!(
        path = %config.csv_path.display(),
        scale = config.context.scale,
        merge_count = config.merges.len(),
        "Configuration resolved"
    );

    let source = CsvRecordSource::new(&config.csv_path, config.csv_options.clone());
    let optimizer = GreedySettlementOptimizer;
    let processor = SettlementProcessor::new(&source, &optimizer, config.context);

    let records = processor
        .load_records()
        .map_err(|err| format_run_error(&err))?;
    let report = processor
        .settle(&records, &config.merges)
        .map_err(|err| format_run_error(&err))?;

    print!(
        "{}",
        ReportPresenter::new(config.context.scale).render(&report)
    );

    match &report.plan {
        Ok(_) => Ok(()),
        Err(err) => Err(format_settlement_error(err).into()),
    }
}
