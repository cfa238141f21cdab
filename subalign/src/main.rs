//! subalign - subtitle forced alignment tool

use clap::Parser;
use eyre::{Context, Result};
use subalign::cli::{Cli, RunConfig};
use subalign::run;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<()> {
    let config = RunConfig::try_from(Cli::parse())?;

    let default_level = if config.debug_dir.is_some() {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let (stderr_writer, _stderr_guard) = tracing_appender::non_blocking(std::io::stderr());

    // With --debug, everything also streams into alignment.log.
    let mut _file_guard = None;
    let file_layer = match &config.debug_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .wrap_err_with(|| format!("failed to create debug dir: {:?}", dir.display()))?;
            let file = std::fs::File::create(dir.join("alignment.log"))
                .wrap_err("failed to create alignment.log")?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            _file_guard = Some(guard);
            Some(fmt::layer().with_writer(writer).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(stderr_writer))
        .with(file_layer)
        .init();

    run::execute(config)
}
