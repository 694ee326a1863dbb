//! Interactive lot traceability console.
//!
//! # Startup Sequence
//!
//! 1. Parse command-line arguments
//! 2. Load configuration from `agritrace.yaml` (defaults if absent)
//! 3. Initialize structured logging (tracing)
//! 4. Load and validate the JSON data file into the registry
//! 5. Connect the optional relational mirror
//! 6. Run the menu loop on stdin/stdout until exit or end of input

mod app;
mod error;
mod logging;
mod prompt;

use std::path::PathBuf;

use agritrace_core::LotRegistry;
use agritrace_core::config::AgritraceConfig;
use agritrace_db::connect_mirror;
use agritrace_store::{LotStore, StoreConfig};
use clap::Parser;
use tokio::io::BufReader;
use tracing::{error, info};

use crate::app::App;
use crate::error::CliError;
use crate::prompt::Prompter;

/// Agricultural lot traceability console.
#[derive(Debug, Parser)]
#[command(name = "agritrace")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file.
    #[arg(long, default_value = "agritrace.yaml")]
    config: PathBuf,

    /// JSON data file (overrides `storage.data_path`).
    #[arg(long)]
    data: Option<PathBuf>,
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the terminal
/// fails. Data file problems are reported and the session starts empty.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = AgritraceConfig::load_or_default(&cli.config).map_err(CliError::from)?;
    if let Some(data) = cli.data {
        config.storage.data_path = data;
    }

    let log_target = logging::init(&config.logging);
    info!(
        config = %cli.config.display(),
        data_path = %config.storage.data_path.display(),
        log_target = %log_target,
        "agritrace starting"
    );

    let mut prompter = Prompter::new(BufReader::new(tokio::io::stdin()), std::io::stdout());

    let store = LotStore::new(StoreConfig::from(&config.storage));
    let registry = match load_registry(&store) {
        Ok(registry) => registry,
        Err(e) => {
            error!(error = %e, "Could not load data file, starting with an empty registry");
            prompter.say(&format!(
                "Could not load {}: {e}\nStarting with an empty registry.",
                store.path().display()
            ))?;
            LotRegistry::new()
        }
    };
    prompter.say(&format!("{} lots loaded.", registry.len()))?;

    let mirror = connect_mirror(&config.database).await;

    let mut app = App::new(
        registry,
        store,
        mirror,
        config.export.csv_path.clone(),
        config.reporting.stale_after_days,
    );
    app.run(&mut prompter).await?;

    info!(lots = app.registry().len(), "agritrace exiting");
    Ok(())
}

fn load_registry(store: &LotStore) -> Result<LotRegistry, CliError> {
    let lots = store.load_validated()?;
    Ok(LotRegistry::from_lots(lots)?)
}
