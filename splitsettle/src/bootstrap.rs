use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use splitsettle_application::MergeRequest;
use splitsettle_domain::{
    CASH_POOL_SENTINEL, RoundingMode, SettlementContext, services::DEFAULT_SCALE,
};
use splitsettle_infrastructure::CsvOptions;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "splitsettle", version)]
#[command(about = "Split shared expenses from a CSV file and plan who pays whom")]
pub struct Cli {
    /// CSV file with Payer, Amount and Involved columns
    #[arg(env = "SPLITSETTLE_CSV", value_name = "CSV_PATH")]
    pub csv_path: PathBuf,

    /// Move SOURCE's whole balance onto TARGET before planning (repeatable)
    #[arg(
        long = "merge",
        env = "SPLITSETTLE_MERGE",
        value_name = "SOURCE=TARGET",
        value_delimiter = ',',
        value_parser = parse_merge
    )]
    pub merges: Vec<MergeRequest>,

    /// Decimal places of the smallest currency unit
    #[arg(long, env = "SPLITSETTLE_SCALE", default_value_t = DEFAULT_SCALE)]
    pub scale: u32,

    #[arg(
        long,
        env = "SPLITSETTLE_ROUNDING",
        value_enum,
        default_value_t = RoundingArg::HalfUp
    )]
    pub rounding: RoundingArg,

    /// Payer name meaning the whole group paid
    #[arg(long, env = "SPLITSETTLE_CASH_SENTINEL", default_value = CASH_POOL_SENTINEL)]
    pub cash_sentinel: String,

    #[arg(long, env = "SPLITSETTLE_INVOLVED_SEPARATOR", default_value = ",")]
    pub involved_separator: String,

    #[arg(short, long, env = "SPLITSETTLE_VERBOSE", help = "Enable debug logging")]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoundingArg {
    HalfUp,
    HalfEven,
}

impl From<RoundingArg> for RoundingMode {
    fn from(arg: RoundingArg) -> Self {
        match arg {
            RoundingArg::HalfUp => RoundingMode::HalfUp,
            RoundingArg::HalfEven => RoundingMode::HalfEven,
        }
    }
}

fn parse_merge(value: &str) -> Result<MergeRequest, String> {
    let Some((source, target)) = value.split_once('=') else {
        return Err(format!("expected SOURCE=TARGET, got '{value}'"));
    };
    let (source, target) = (source.trim(), target.trim());
    if source.is_empty() || target.is_empty() {
        return Err(format!("both names are required in '{value}'"));
    }

    Ok(MergeRequest {
        source: source.to_owned(),
        target: target.to_owned(),
    })
}

/// Everything one run needs, resolved from flags and the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub csv_path: PathBuf,
    pub context: SettlementContext,
    pub csv_options: CsvOptions,
    pub merges: Vec<MergeRequest>,
}

impl AppConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, String> {
        if cli.cash_sentinel.trim().is_empty() {
            return Err("cash sentinel must not be empty".to_owned());
        }
        if cli.involved_separator.is_empty() {
            return Err("involved separator must not be empty".to_owned());
        }

        Ok(Self {
            csv_path: cli.csv_path,
            context: SettlementContext {
                scale: cli.scale,
                rounding_mode: cli.rounding.into(),
            },
            csv_options: CsvOptions {
                cash_sentinel: cli.cash_sentinel.trim().to_owned(),
                involved_separator: cli.involved_separator,
            },
            merges: cli.merges,
        })
    }
}

/// Reads `.env` if present so its values reach the `env` fallbacks of [`Cli`].
pub fn load_env() {
    let _ = dotenvy::dotenv();
}

/// Logs go to stderr; stdout carries only the report.
pub fn init_logging(verbose: bool) {
    let default_directives = if verbose {
        "warn,splitsettle=debug"
    } else {
        "warn,splitsettle=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}
