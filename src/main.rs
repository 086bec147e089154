use clap::{ArgAction, Parser};
use minos::error;
use minos::join::{self, RunConfig};
use minos::schema::MwVersion;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Convert MediaWiki XML dumps into SQL for the page, revision and text
/// tables.
#[derive(Debug, Parser)]
#[command(name = "minos", version, about)]
struct Cli {
    /// Stub dump with page and revision metadata
    #[arg(long, value_name = "PATH")]
    stubs: PathBuf,

    /// Content dump with revision text
    #[arg(long, value_name = "PATH")]
    text: PathBuf,

    /// Output prefix; produces <PREFIX>-page.sql, <PREFIX>-revision.sql and
    /// <PREFIX>-text.sql, compressed per the prefix suffix (.gz, .bz2)
    #[arg(long, value_name = "PREFIX")]
    sql: String,

    /// Target MediaWiki schema version (1.5 through 1.29)
    #[arg(long, value_name = "VER", default_value = "1.29")]
    mwversion: String,

    /// First text.old_id to assign
    #[arg(long, value_name = "N", default_value_t = minos::config::DEFAULT_START_TEXT_ID)]
    startid: u32,

    /// Progress counters to stderr (repeat for debug output)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "minos=warn",
        1 => "minos=info",
        _ => "minos=debug",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // clap renders --help/--version through the same path
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    init_logging(cli.verbose);

    let mw_version: MwVersion = match cli.mwversion.parse() {
        Ok(version) => version,
        Err(err) => {
            eprintln!("minos: {}", err);
            return ExitCode::from(1);
        }
    };

    let config = RunConfig {
        stubs: cli.stubs,
        text: cli.text,
        sql_prefix: cli.sql,
        mw_version,
        start_text_id: cli.startid,
    };

    match join::run(&config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("minos: {:#}", err);
            ExitCode::from(error::exit_code_for(&err) as u8)
        }
    }
}
