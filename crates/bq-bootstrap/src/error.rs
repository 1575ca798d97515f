use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use bigquery_rs::resources::ErrorProto;
use bigquery_rs::resources::table::{FieldType, UnknownVariant};
use bigquery_rs::resources::table_data::InsertErrors;
use http::StatusCode;

/// Top level error, naming the step that failed. Each step has its own error type, so callers
/// can match on exactly what went wrong.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("provisioning failed: {0}")]
    Provision(#[from] ProvisionError),
    #[error("load failed: {0}")]
    Load(#[from] LoadError),
    #[error("schema mismatch: {0}")]
    Schema(#[from] SchemaError),
}

/// Missing or invalid configuration. Always raised before any remote call.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required variable '{0}'")]
    Missing(&'static str),
    #[error("invalid value for '{var}': {reason}")]
    Invalid { var: &'static str, reason: Box<str> },
    #[error("invalid schema in '{var}': {source}")]
    Schema {
        var: &'static str,
        source: SchemaError,
    },
    #[error("unable to load credentials from '{}': {source}", .path.display())]
    Credentials {
        path: PathBuf,
        source: bigquery_rs::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid(var: &'static str, reason: impl fmt::Display) -> Self {
        Self::Invalid {
            var,
            reason: reason.to_string().into_boxed_str(),
        }
    }
}

/// A create call failed for a reason other than the resource already existing.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("creating dataset '{dataset}' failed: {source}")]
    Dataset {
        dataset: Box<str>,
        source: bigquery_rs::Error,
    },
    #[error("creating table '{table}' failed: {source}")]
    Table {
        table: Box<str>,
        source: bigquery_rs::Error,
    },
    #[error("table '{table}' belongs to dataset '{expected}', not '{found}'")]
    DatasetMismatch {
        table: Box<str>,
        expected: Box<str>,
        found: Box<str>,
    },
}

impl ProvisionError {
    /// The HTTP status BigQuery answered with, if the failure came from the service.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Dataset { source, .. } | Self::Table { source, .. } => source.status(),
            Self::DatasetMismatch { .. } => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("unable to read source '{}': {source}", .path.display())]
    Source {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unable to write sample data to '{}': {source}", .path.display())]
    Sample { path: PathBuf, source: csv::Error },
    #[error("source line {line} is not a JSON object: {source}")]
    Decode {
        line: usize,
        source: serde_json::Error,
    },
    #[error("{step} failed: {source}")]
    Remote {
        step: &'static str,
        source: bigquery_rs::Error,
    },
    #[error("BigQuery did not return a job reference for the load job")]
    MissingJobReference,
    #[error("load job '{job_id}' failed: {}", ErrorList(.errors))]
    JobFailed {
        job_id: Box<str>,
        errors: Vec<ErrorProto>,
    },
    #[error("load job '{job_id}' did not finish within {timeout:?}")]
    JobTimedOut { job_id: Box<str>, timeout: Duration },
    #[error("{} of {total} rows were rejected: {}", .rejected.len(), RejectedRows(.rejected))]
    RowsRejected {
        total: usize,
        rejected: Vec<InsertErrors>,
    },
}

impl LoadError {
    pub(crate) const fn remote(step: &'static str, source: bigquery_rs::Error) -> Self {
        Self::Remote { step, source }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Remote { source, .. } => source.status(),
            _ => None,
        }
    }
}

/// A record (or schema definition) that doesn't line up with the declared schema.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("schema has no fields")]
    Empty,
    #[error("invalid field definition '{0}', expected 'name:TYPE[:MODE]'")]
    InvalidDefinition(Box<str>),
    #[error(transparent)]
    UnknownVariant(#[from] UnknownVariant),
    #[error("field '{0}' is declared more than once")]
    DuplicateField(Box<str>),
    #[error("field '{field}' is not in the schema")]
    UnknownField { field: Box<str> },
    #[error("field '{field}' expects {expected}, found {found}")]
    TypeMismatch {
        field: Box<str>,
        expected: FieldType,
        found: &'static str,
    },
    #[error("required field '{field}' is missing")]
    MissingRequired { field: Box<str> },
    #[error("records must serialize to a JSON object, found {found}")]
    NotAnObject { found: &'static str },
    #[error("record could not be serialized: {0}")]
    Serialize(Box<str>),
    #[error("row {index}: {source}")]
    InvalidRow {
        index: usize,
        source: Box<SchemaError>,
    },
}

impl SchemaError {
    /// The innermost error, unwrapping [`SchemaError::InvalidRow`].
    pub fn root(&self) -> &SchemaError {
        match self {
            Self::InvalidRow { source, .. } => source.root(),
            other => other,
        }
    }
}

struct ErrorList<'a>(&'a [ErrorProto]);

impl fmt::Display for ErrorList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("no error details");
        }

        for (idx, error) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            fmt::Display::fmt(error, f)?;
        }

        Ok(())
    }
}

struct RejectedRows<'a>(&'a [InsertErrors]);

impl fmt::Display for RejectedRows<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, row) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "[row {}: {}]", row.index, ErrorList(&row.errors))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bigquery_rs::ApiError;

    use super::*;

    #[test]
    fn test_display_names_step() {
        let error = Error::from(ProvisionError::Dataset {
            dataset: "bq".into(),
            source: ApiError::new(StatusCode::FORBIDDEN, "Access Denied").into(),
        });

        assert_eq!(
            error.to_string(),
            "provisioning failed: creating dataset 'bq' failed: 403 Access Denied"
        );
    }

    #[test]
    fn test_rejected_rows_are_listed() {
        let error = LoadError::RowsRejected {
            total: 3,
            rejected: vec![
                InsertErrors {
                    index: 0,
                    errors: vec![ErrorProto::new("no such field: age".into()).with_reason("invalid".into())],
                },
                InsertErrors {
                    index: 2,
                    errors: vec![ErrorProto::new("".into()).with_reason("stopped".into())],
                },
            ],
        };

        assert_eq!(
            error.to_string(),
            "2 of 3 rows were rejected: [row 0: no such field: age: invalid], [row 2: : stopped]"
        );
    }
}
