//! A small async client for the BigQuery REST API (v2), covering dataset and table
//! creation, load jobs (with the data uploaded alongside the job) and streaming inserts.

#[macro_use]
extern crate tracing;

mod auth;
mod client;
pub mod dataset;
mod error;
pub mod job;
pub mod table;
mod util;

pub use auth::Auth;
pub use bigquery_resources_rs as resources;
pub use client::BigQueryClient;
pub use error::{ApiError, Error};

/// Type alias to [`core::result::Result<T, Error>`].
pub type Result<T> = core::result::Result<T, Error>;
