use std::process::ExitCode;

use bq_bootstrap::{Bootstrap, Config, LoadSummary};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const LOG_JSON: &str = "BQ_LOG_JSON";

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json = std::env::var(LOG_JSON).is_ok_and(|value| value.trim().eq_ignore_ascii_case("true"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run() -> Result<LoadSummary, bq_bootstrap::Error> {
    let config = Config::from_env()?;
    let client = bq_bootstrap::connect(&config)?;

    Bootstrap::new(client, config).run().await
}

fn main() -> ExitCode {
    init_logging();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            error!(message = "failed to start the runtime", %error);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run()) {
        Ok(summary) => {
            info!(message = "done", rows = summary.rows, job_id = summary.job_id.as_deref());
            ExitCode::SUCCESS
        }
        Err(error) => {
            error!(message = "bootstrap failed", %error);
            ExitCode::FAILURE
        }
    }
}
