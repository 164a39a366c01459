use std::path::PathBuf;

use clap::Parser;
use ed_datapull::config::{self, DataPullConfig};
use ed_datapull::db::open_database;
use ed_datapull::pipeline::ed_visit::run_full_batch;

#[derive(Parser)]
#[command(name = "ed-datapull")]
#[command(version, about = "Pull ED visit data for pending study subjects")]
struct Cli {
    /// SQLite database holding the study tables
    #[arg(long, env = "ED_DATAPULL_DB", default_value = config::DEFAULT_DATABASE_FILE)]
    database: PathBuf,

    /// Directory with the header file; all outputs are written here
    #[arg(long, env = "ED_DATAPULL_DATA_DIR", default_value = config::PATIENT_DATA_DIR_NAME)]
    data_dir: PathBuf,

    /// Log failing subjects and keep going instead of aborting
    #[arg(long)]
    continue_on_error: bool,

    /// Mark processed subjects as pulled once exports are written
    #[arg(long)]
    mark_complete: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    ed_datapull::init_tracing();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let mut settings = DataPullConfig::new(cli.database, cli.data_dir);
    settings.continue_on_error = cli.continue_on_error;
    settings.mark_complete = cli.mark_complete;

    let conn = open_database(&settings.database_path)?;
    let summary = run_full_batch(&conn, &settings)?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
