use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::resource::{DatasetRef, TableRef};
use crate::schema::Schema;

pub const PROJECT_ID: &str = "PROJECT_ID";
pub const CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const DATASET: &str = "BQ_DATASET";
pub const TABLE: &str = "BQ_TABLE";
pub const LOCATION: &str = "BQ_LOCATION";
pub const LOADER: &str = "BQ_LOADER";
pub const SOURCE: &str = "BQ_SOURCE";
pub const SCHEMA: &str = "BQ_SCHEMA";
pub const SKIP_HEADER_ROWS: &str = "BQ_SKIP_HEADER_ROWS";
pub const AUTODETECT: &str = "BQ_AUTODETECT";
pub const WRITE_SAMPLE: &str = "BQ_WRITE_SAMPLE";
pub const POLL_INTERVAL_MS: &str = "BQ_POLL_INTERVAL_MS";
pub const JOB_TIMEOUT_SECS: &str = "BQ_JOB_TIMEOUT_SECS";

const DEFAULT_DATASET: &str = "bq";
const DEFAULT_TABLE: &str = "test";
const DEFAULT_LOCATION: &str = "US";
const DEFAULT_SOURCE: &str = "/tmp/bq.csv";
const DEFAULT_SCHEMA: &str = "name:STRING";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Which loader moves the data into the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoaderKind {
    /// Bulk CSV import through a load job.
    #[default]
    Import,
    /// Direct row insertion (streaming inserts) from newline delimited JSON records.
    Insert,
}

impl FromStr for LoaderKind {
    type Err = Box<str>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "import" => Ok(Self::Import),
            "insert" => Ok(Self::Insert),
            other => Err(format!("unknown loader '{other}', expected 'import' or 'insert'").into()),
        }
    }
}

/// Everything a bootstrap run needs, built once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub project_id: Box<str>,
    pub credentials_path: PathBuf,
    pub dataset: DatasetRef,
    pub table: TableRef,
    pub schema: Schema,
    pub loader: LoaderKind,
    pub source: PathBuf,
    pub skip_header_rows: usize,
    pub auto_detect_schema: bool,
    pub write_sample: bool,
    pub poll_interval: Duration,
    pub job_timeout: Option<Duration>,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration from any key/value source. Empty values are treated the same
    /// as missing ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let project_id = get(PROJECT_ID).ok_or(ConfigError::Missing(PROJECT_ID))?;
        let credentials_path = get(CREDENTIALS).ok_or(ConfigError::Missing(CREDENTIALS))?;

        let dataset_name = get(DATASET).unwrap_or_else(|| DEFAULT_DATASET.to_owned());
        validate_id(DATASET, &dataset_name)?;

        let table_name = get(TABLE).unwrap_or_else(|| DEFAULT_TABLE.to_owned());
        validate_id(TABLE, &table_name)?;

        let location = get(LOCATION).unwrap_or_else(|| DEFAULT_LOCATION.to_owned());

        let schema = get(SCHEMA)
            .as_deref()
            .unwrap_or(DEFAULT_SCHEMA)
            .parse::<Schema>()
            .map_err(|source| ConfigError::Schema { var: SCHEMA, source })?;

        let poll_interval = parse::<u64>(&get, POLL_INTERVAL_MS)?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        if poll_interval.is_zero() {
            return Err(ConfigError::invalid(POLL_INTERVAL_MS, "must be greater than 0"));
        }

        let dataset = DatasetRef::new(dataset_name, location);
        let table = dataset.table(table_name);

        Ok(Self {
            project_id: project_id.into_boxed_str(),
            credentials_path: PathBuf::from(credentials_path),
            dataset,
            table,
            schema,
            loader: parse(&get, LOADER)?.unwrap_or_default(),
            source: get(SOURCE).unwrap_or_else(|| DEFAULT_SOURCE.to_owned()).into(),
            skip_header_rows: parse(&get, SKIP_HEADER_ROWS)?.unwrap_or(1),
            auto_detect_schema: parse_bool(&get, AUTODETECT)?.unwrap_or(true),
            write_sample: parse_bool(&get, WRITE_SAMPLE)?.unwrap_or(false),
            poll_interval,
            job_timeout: parse::<u64>(&get, JOB_TIMEOUT_SECS)?.map(Duration::from_secs),
        })
    }
}

fn parse<T>(get: &impl Fn(&str) -> Option<String>, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get(var)
        .map(|value| value.parse::<T>())
        .transpose()
        .map_err(|error| ConfigError::invalid(var, error))
}

fn parse_bool(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<bool>, ConfigError> {
    match get(var) {
        None => Ok(None),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(Some(true)),
            "0" | "false" | "no" => Ok(Some(false)),
            _ => Err(ConfigError::invalid(var, format!("'{value}' is not a boolean"))),
        },
    }
}

/// Dataset and table ids can only contain letters, digits and underscores.
fn validate_id(var: &'static str, id: &str) -> Result<(), ConfigError> {
    match id.chars().find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '_')) {
        Some(ch) => Err(ConfigError::invalid(var, format!("'{id}' contains '{ch}'"))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        move |key: &str| vars.get(key).map(|value| value.to_string())
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[
            (PROJECT_ID, "my-project"),
            (CREDENTIALS, "/etc/creds.json"),
        ]))
        .unwrap();

        assert_eq!(&*config.project_id, "my-project");
        assert_eq!(config.dataset, DatasetRef::new("bq", "US"));
        assert_eq!(config.table, config.dataset.table("test"));
        assert_eq!(config.loader, LoaderKind::Import);
        assert_eq!(config.source, PathBuf::from("/tmp/bq.csv"));
        assert_eq!(config.schema, Schema::parse("name:STRING").unwrap());
        assert_eq!(config.skip_header_rows, 1);
        assert!(config.auto_detect_schema);
        assert!(!config.write_sample);
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.job_timeout, None);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            (PROJECT_ID, "my-project"),
            (CREDENTIALS, "/etc/creds.json"),
            (DATASET, "staging_1"),
            (TABLE, "users"),
            (LOCATION, "EU"),
            (LOADER, "Insert"),
            (SOURCE, "/tmp/users.ndjson"),
            (SCHEMA, "name:STRING:REQUIRED,age:INT64"),
            (AUTODETECT, "false"),
            (POLL_INTERVAL_MS, "250"),
            (JOB_TIMEOUT_SECS, "30"),
        ]))
        .unwrap();

        assert_eq!(config.dataset, DatasetRef::new("staging_1", "EU"));
        assert_eq!(config.table.to_string(), "staging_1.users");
        assert_eq!(config.loader, LoaderKind::Insert);
        assert_eq!(config.schema.fields().len(), 2);
        assert!(!config.auto_detect_schema);
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.job_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_missing_required() {
        let error = Config::from_lookup(lookup(&[(CREDENTIALS, "/etc/creds.json")])).unwrap_err();
        assert!(matches!(error, ConfigError::Missing(PROJECT_ID)));

        // empty counts as missing
        let error =
            Config::from_lookup(lookup(&[(PROJECT_ID, "my-project"), (CREDENTIALS, " ")])).unwrap_err();
        assert!(matches!(error, ConfigError::Missing(CREDENTIALS)));
    }

    #[test]
    fn test_invalid_values() {
        let base = [(PROJECT_ID, "my-project"), (CREDENTIALS, "/etc/creds.json")];

        let with = |extra: (&'static str, &'static str)| {
            let mut vars = base.to_vec();
            vars.push(extra);
            Config::from_lookup(lookup(&vars)).unwrap_err()
        };

        assert!(matches!(with((DATASET, "my-dataset")), ConfigError::Invalid { var: DATASET, .. }));
        assert!(matches!(with((LOADER, "stream")), ConfigError::Invalid { var: LOADER, .. }));
        assert!(matches!(
            with((POLL_INTERVAL_MS, "0")),
            ConfigError::Invalid { var: POLL_INTERVAL_MS, .. }
        ));
        assert!(matches!(with((AUTODETECT, "maybe")), ConfigError::Invalid { var: AUTODETECT, .. }));
        assert!(matches!(with((SCHEMA, "name:VARCHAR")), ConfigError::Schema { var: SCHEMA, .. }));
    }
}
