//! sparkify-etl: Load song metadata and activity logs into the star schema
//!
//! Usage:
//!   # Default layout: data/song_data, data/log_data -> sparkifydb.sqlite
//!   sparkify-etl
//!
//!   # Explicit paths
//!   sparkify-etl --song-data ./songs --log-data ./logs --database ./out.sqlite
//!
//!   # Settings from a TOML file (file values win over flags)
//!   sparkify-etl --config etl.toml
//!
//!   # Reproduce the -1 placeholder for missing numbers
//!   sparkify-etl --null-policy sentinel

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use sparkify_etl::config::{DEFAULT_DATABASE, DEFAULT_LOG_DATA, DEFAULT_SONG_DATA};
use sparkify_etl::extract::DEFAULT_FILE_PATTERN;
use sparkify_etl::{logging, EtlConfig, FileConfig, FilePattern, NullPolicy};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sparkify-etl")]
#[command(about = "Load song and log NDJSON files into the songplays star schema", long_about = None)]
struct Args {
    /// Root directory of the song metadata files
    #[arg(long, default_value = DEFAULT_SONG_DATA)]
    song_data: PathBuf,

    /// Root directory of the activity log files
    #[arg(long, default_value = DEFAULT_LOG_DATA)]
    log_data: PathBuf,

    /// SQLite database to write into
    #[arg(long, short = 'd', default_value = DEFAULT_DATABASE)]
    database: PathBuf,

    /// Regex matched against file names during discovery
    #[arg(long, default_value = DEFAULT_FILE_PATTERN)]
    file_pattern: String,

    /// How missing values are written
    #[arg(long, value_enum, default_value_t = NullPolicy::Null)]
    null_policy: NullPolicy,

    /// Optional TOML file overriding the flags above
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging();

    let cli = EtlConfig {
        song_data: args.song_data,
        log_data: args.log_data,
        database: args.database,
        file_pattern: FilePattern::new(&args.file_pattern).context("Invalid --file-pattern")?,
        null_policy: args.null_policy,
    };

    let file_config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(FileConfig::load(path).context("Failed to load configuration file")?)
        }
        None => None,
    };
    let config = EtlConfig::resolve(cli, file_config)?;

    let report = sparkify_etl::run(&config).context("ETL run failed")?;

    for table in &report.tables {
        info!(
            table = table.table,
            rows = table.rows,
            inserted = table.inserted,
            "Table loaded"
        );
    }
    info!(
        records = report.records_read,
        resolved = report.songplays_resolved,
        unresolved = report.songplays_unresolved,
        "Songplay resolution"
    );

    Ok(())
}
