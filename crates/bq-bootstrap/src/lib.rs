//! Idempotent BigQuery bootstrap: make sure a dataset (and optionally a table) exists, then
//! load data into it, either with a bulk CSV import or by inserting rows directly.
//!
//! ```no_run
//! # async fn run() -> Result<(), bq_bootstrap::Error> {
//! let config = bq_bootstrap::Config::from_env()?;
//! let client = bq_bootstrap::connect(&config)?;
//!
//! let summary = bq_bootstrap::Bootstrap::new(client, config).run().await?;
//! println!("loaded {} rows", summary.rows);
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate tracing;

mod bootstrap;
pub mod config;
mod error;
pub mod loader;
mod provision;
mod resource;
pub mod sample;
mod schema;
mod warehouse;

#[cfg(test)]
mod test_utils;

pub use bigquery_rs::BigQueryClient;
pub use bootstrap::Bootstrap;
pub use config::{Config, LoaderKind};
pub use error::{ConfigError, Error, LoadError, ProvisionError, SchemaError};
pub use loader::{DataLoader, LoadSummary};
pub use provision::Provisioner;
pub use resource::{DatasetRef, TableRef};
pub use schema::{Record, Schema};
pub use warehouse::Warehouse;

/// Builds a BigQuery client from the configured project and service account key.
pub fn connect(config: &Config) -> Result<BigQueryClient, ConfigError> {
    BigQueryClient::new(&*config.project_id, &config.credentials_path).map_err(|source| {
        ConfigError::Credentials {
            path: config.credentials_path.clone(),
            source,
        }
    })
}
