//! create-tables: Drop and recreate the destination tables
//!
//! Usage:
//!   create-tables
//!   create-tables --database ./out.sqlite

use anyhow::{Context, Result};
use clap::Parser;
use sparkify_etl::config::DEFAULT_DATABASE;
use sparkify_etl::{logging, Database, NullPolicy, Schema};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "create-tables")]
#[command(about = "Reset the songplays star schema", long_about = None)]
struct Args {
    /// SQLite database to (re)create the tables in
    #[arg(long, short = 'd', default_value = DEFAULT_DATABASE)]
    database: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging();

    let db = Database::open(&args.database, Schema::default(), NullPolicy::default())
        .with_context(|| format!("Failed to open {}", args.database.display()))?;
    db.create_tables().context("Failed to create tables")?;

    for table in db.schema().tables() {
        info!(table = table.name, "Table ready");
    }
    Ok(())
}
