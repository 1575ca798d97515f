use std::collections::HashMap;

use bigquery_rs::ApiError;
use bigquery_rs::resources::dataset::Dataset;
use bigquery_rs::resources::job::{
    Job, JobConfigurationKind, JobReference, JobState, JobStatistics, JobStatus, LoadStatistics,
    SkipLeadingRows, SourceFormat,
};
use bigquery_rs::resources::table::{FieldMode, FieldType, Table, TableFieldSchema, TableSchema};
use bigquery_rs::resources::table_data::{InsertErrors, TableDataInsertAllResponse};
use bigquery_rs::resources::{DatasetReference, ErrorProto, TableReference};
use bigquery_rs::table::InsertRowOptions;
use bytes::Bytes;
use http::StatusCode;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::resource::{DatasetRef, TableRef};
use crate::schema::{Record, Schema};
use crate::warehouse::Warehouse;

pub(crate) const PROJECT_ID: &str = "my-project";

pub(crate) const SAMPLE_CSV: &str = "name\nfoo\nbar\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Call {
    CreateDataset,
    CreateTable,
    StartLoad,
    GetJob,
    InsertRows,
}

/// In-memory stand in for BigQuery. Records every call, answers creates of existing
/// resources with a 409, and can be scripted to fail.
#[derive(Debug, Default)]
pub(crate) struct FakeWarehouse {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    failures: HashMap<Call, ApiError>,
    datasets: HashMap<Box<str>, Dataset>,
    tables: HashMap<(Box<str>, Box<str>), FakeTable>,
    jobs: HashMap<Box<str>, FakeJob>,
    job_errors: Option<Vec<ErrorProto>>,
    stall_jobs: bool,
    next_job: usize,
}

#[derive(Debug)]
struct FakeTable {
    schema: TableSchema,
    rows: Vec<Map<String, Value>>,
}

#[derive(Debug)]
struct FakeJob {
    finished: Job,
    polls: usize,
}

fn api_error(status: StatusCode, status_name: &str, message: impl Into<Box<str>>) -> bigquery_rs::Error {
    let mut error = ApiError::new(status, message);
    error.status_name = Some(status_name.into());
    error.into()
}

fn table_key(dataset: &str, table: &str) -> (Box<str>, Box<str>) {
    (dataset.into(), table.into())
}

impl FakeWarehouse {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Makes every following call of this kind fail with the given error.
    pub(crate) fn fail(&self, call: Call, status: StatusCode, status_name: &str, message: &str) {
        let mut error = ApiError::new(status, message);
        error.status_name = Some(status_name.into());
        self.state.lock().failures.insert(call, error);
    }

    /// Makes every following load job finish with these errors.
    pub(crate) fn fail_jobs_with(&self, error: ErrorProto) {
        self.state.lock().job_errors = Some(vec![error]);
    }

    /// Load jobs never leave the 'RUNNING' state.
    pub(crate) fn stall_jobs(&self) {
        self.state.lock().stall_jobs = true;
    }

    pub(crate) fn calls(&self, call: Call) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|made| **made == call)
            .count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.state.lock().calls.len()
    }

    pub(crate) fn dataset_count(&self) -> usize {
        self.state.lock().datasets.len()
    }

    pub(crate) fn has_table(&self, table: &TableRef) -> bool {
        self.state
            .lock()
            .tables
            .contains_key(&table_key(&table.dataset, &table.name))
    }

    /// Seeds a dataset without counting it as a call.
    pub(crate) fn insert_dataset(&self, dataset: &DatasetRef) {
        let created = Dataset::new(
            dataset.reference(PROJECT_ID).into_owned(),
            Some(dataset.location.clone()),
        );
        self.state
            .lock()
            .datasets
            .insert(dataset.name.clone(), created);
    }

    /// Seeds a table without counting it as a call.
    pub(crate) fn insert_table(&self, table: &TableRef, schema: &Schema) {
        self.state.lock().tables.insert(
            table_key(&table.dataset, &table.name),
            FakeTable {
                schema: schema.to_table_schema(),
                rows: Vec::new(),
            },
        );
    }

    /// Rows stored in a table, in insertion order.
    pub(crate) fn rows(&self, table: &TableRef) -> Vec<Value> {
        self.state
            .lock()
            .tables
            .get(&table_key(&table.dataset, &table.name))
            .map(|table| table.rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    /// Registers a finished load job that wrote 'rows' rows, returning its reference.
    pub(crate) fn submit_job(&self, rows: u64) -> JobReference {
        let mut state = self.state.lock();
        let job_ref = state.next_job_reference();

        let finished = finished_job(job_ref.clone(), rows, None);
        state.jobs.insert(job_ref.job_id.clone(), FakeJob { finished, polls: 0 });

        job_ref
    }
}

impl State {
    /// Counts the call, then returns the scripted failure for it, if there is one.
    fn record(&mut self, call: Call) -> bigquery_rs::Result<()> {
        self.calls.push(call);

        match self.failures.get(&call) {
            Some(error) => Err(error.clone().into()),
            None => Ok(()),
        }
    }

    fn next_job_reference(&mut self) -> JobReference {
        self.next_job += 1;
        JobReference {
            job_id: format!("fake_job_{}", self.next_job).into_boxed_str(),
            location: Some("US".into()),
            project_id: PROJECT_ID.into(),
        }
    }

    fn require_dataset(&self, dataset: &str) -> bigquery_rs::Result<()> {
        if self.datasets.contains_key(dataset) {
            Ok(())
        } else {
            Err(api_error(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Not found: Dataset {PROJECT_ID}:{dataset}"),
            ))
        }
    }
}

fn finished_job(job_ref: JobReference, rows: u64, errors: Option<Vec<ErrorProto>>) -> Job {
    let mut status = JobStatus::pending();
    status.state = JobState::Done;

    let output_rows = match errors {
        Some(errors) => {
            status.error_result = errors.first().cloned();
            status.errors = errors;
            None
        }
        None => Some(rows),
    };

    Job {
        kind: Some("bigquery#job".into()),
        etag: None,
        id: Some(format!("{PROJECT_ID}:US.{}", job_ref.job_id).into_boxed_str()),
        self_link: None,
        user_email: None,
        configuration: finished_configuration(),
        job_reference: Some(job_ref),
        statistics: Some(JobStatistics {
            load: Some(LoadStatistics {
                output_rows,
                ..LoadStatistics::default()
            }),
            ..JobStatistics::default()
        }),
        status: Some(status),
    }
}

fn finished_configuration() -> bigquery_rs::resources::job::JobConfiguration {
    use bigquery_rs::resources::job::{CsvOptions, JobConfigurationLoad};

    JobConfigurationLoad::new(
        CsvOptions::default(),
        TableReference {
            project_id: PROJECT_ID.into(),
            dataset_id: "bq".into(),
            table_id: "test".into(),
        },
    )
    .into()
}

/// Converts a CSV cell to the JSON value BigQuery would store for the column type.
fn csv_value(field: &TableFieldSchema, cell: &str) -> Result<Value, String> {
    let invalid = || format!("Could not parse '{cell}' as {} for field {}", field.ty, field.name);

    match field.ty {
        FieldType::Integer => cell.parse::<i64>().map(Value::from).map_err(|_| invalid()),
        FieldType::Float => cell.parse::<f64>().map(Value::from).map_err(|_| invalid()),
        FieldType::Bool => cell.parse::<bool>().map(Value::from).map_err(|_| invalid()),
        _ => Ok(Value::from(cell)),
    }
}

impl Warehouse for FakeWarehouse {
    fn project_id(&self) -> &str {
        PROJECT_ID
    }

    async fn create_dataset(&self, dataset: &DatasetRef) -> bigquery_rs::Result<Dataset> {
        let mut state = self.state.lock();
        state.record(Call::CreateDataset)?;

        if state.datasets.contains_key(&dataset.name) {
            return Err(api_error(
                StatusCode::CONFLICT,
                "ALREADY_EXISTS",
                format!("Already Exists: Dataset {PROJECT_ID}:{}", dataset.name),
            ));
        }

        let mut created = Dataset::new(
            DatasetReference {
                project_id: PROJECT_ID.into(),
                dataset_id: dataset.name.clone(),
            },
            Some(dataset.location.clone()),
        );
        created.id = Some(format!("{PROJECT_ID}:{}", dataset.name).into_boxed_str());
        created.creation_time = Some(1731550230831);

        state.datasets.insert(dataset.name.clone(), created.clone());
        Ok(created)
    }

    async fn create_table(
        &self,
        table: &TableRef,
        schema: Option<&TableSchema>,
    ) -> bigquery_rs::Result<Table> {
        let mut state = self.state.lock();
        state.record(Call::CreateTable)?;
        state.require_dataset(&table.dataset)?;

        let key = table_key(&table.dataset, &table.name);
        if state.tables.contains_key(&key) {
            return Err(api_error(
                StatusCode::CONFLICT,
                "ALREADY_EXISTS",
                format!("Already Exists: Table {PROJECT_ID}:{table}"),
            ));
        }

        let schema = schema.cloned().unwrap_or(TableSchema { fields: Vec::new() });

        state.tables.insert(key, FakeTable {
            schema: schema.clone(),
            rows: Vec::new(),
        });

        Ok(Table::new(
            table.reference(PROJECT_ID).into_owned(),
            Some(schema),
        ))
    }

    async fn start_load(
        &self,
        mut job: Job,
        _location: Option<&str>,
        data: Bytes,
    ) -> bigquery_rs::Result<Job> {
        let mut state = self.state.lock();
        state.record(Call::StartLoad)?;

        let invalid = |message: String| api_error(StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", message);

        let JobConfigurationKind::Load(ref load) = job.configuration.kind else {
            unreachable!("JobConfigurationKind has only the Load variant")
        };
        let load = load.clone();
        let SourceFormat::Csv(ref csv_options) = load.source_format;

        let destination = &load.destination_table;
        state.require_dataset(&destination.dataset_id)?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(&data[..]);

        let mut lines = Vec::new();
        for record in reader.records() {
            lines.push(record.map_err(|error| invalid(error.to_string()))?);
        }

        let skip = match csv_options.skip_leading_rows {
            SkipLeadingRows::Skip(rows) => rows.min(lines.len()),
            SkipLeadingRows::Autodetect => 0,
        };
        let (header, body) = lines.split_at(skip);

        let key = table_key(&destination.dataset_id, &destination.table_id);

        let schema = match state.tables.get(&key) {
            Some(table) if !table.schema.fields.is_empty() => table.schema.clone(),
            _ => match load.schema {
                Some(ref schema) => schema.clone(),
                None if csv_options.autodetect => TableSchema {
                    fields: header
                        .first()
                        .map(|names| {
                            names
                                .iter()
                                .map(|name| {
                                    TableFieldSchema::new(name.into(), FieldType::String, FieldMode::Nullable)
                                })
                                .collect()
                        })
                        .unwrap_or_default(),
                },
                None => return Err(invalid("no schema specified for the destination table".to_owned())),
            },
        };

        let job_ref = match job.job_reference.take() {
            Some(job_ref) => job_ref,
            None => state.next_job_reference(),
        };

        let mut rows = Vec::with_capacity(body.len());
        let mut errors = state.job_errors.clone();

        if errors.is_none() {
            for line in body {
                let mut row = Map::new();
                for (field, cell) in schema.fields.iter().zip(line.iter()) {
                    if cell.is_empty() {
                        continue;
                    }

                    match csv_value(field, cell) {
                        Ok(value) => {
                            row.insert(field.name.to_string(), value);
                        }
                        Err(message) => {
                            errors = Some(vec![ErrorProto::new(message.into()).with_reason("invalid".into())]);
                            break;
                        }
                    }
                }
                rows.push(row);
            }
        }

        let finished = if errors.is_some() {
            finished_job(job_ref.clone(), 0, errors)
        } else {
            let written = rows.len() as u64;
            state
                .tables
                .entry(key)
                .or_insert_with(|| FakeTable {
                    schema,
                    rows: Vec::new(),
                })
                .rows
                .extend(rows);

            finished_job(job_ref.clone(), written, None)
        };

        state.jobs.insert(job_ref.job_id.clone(), FakeJob { finished, polls: 0 });

        job.job_reference = Some(job_ref);
        job.status = Some(JobStatus::pending());
        Ok(job)
    }

    async fn get_job(&self, job_ref: &JobReference) -> bigquery_rs::Result<Job> {
        let mut state = self.state.lock();
        state.record(Call::GetJob)?;
        let stall = state.stall_jobs;

        let Some(job) = state.jobs.get_mut(&job_ref.job_id) else {
            return Err(api_error(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Not found: Job {PROJECT_ID}:{}", job_ref.job_id),
            ));
        };

        job.polls += 1;

        let mut current = job.finished.clone();
        if stall || job.polls == 1 {
            let mut status = JobStatus::pending();
            status.state = JobState::Running;
            current.status = Some(status);
            current.statistics = None;
        }

        Ok(current)
    }

    async fn insert_rows(
        &self,
        table: &TableRef,
        rows: &[Record],
        _options: InsertRowOptions,
    ) -> bigquery_rs::Result<TableDataInsertAllResponse> {
        let mut state = self.state.lock();
        state.record(Call::InsertRows)?;

        let Some(stored) = state.tables.get_mut(&table_key(&table.dataset, &table.name)) else {
            return Err(api_error(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Not found: Table {PROJECT_ID}:{table}"),
            ));
        };

        let mut invalid = HashMap::new();
        for (index, row) in rows.iter().enumerate() {
            let unknown = row
                .as_map()
                .keys()
                .find(|key| !stored.schema.fields.iter().any(|field| &*field.name == key.as_str()));

            if let Some(unknown) = unknown {
                let error = ErrorProto {
                    reason: Some("invalid".into()),
                    location: Some(unknown.as_str().into()),
                    debug_info: Some("".into()),
                    message: format!("no such field: {unknown}.").into_boxed_str(),
                };
                invalid.insert(index, error);
            }
        }

        if invalid.is_empty() {
            stored
                .rows
                .extend(rows.iter().map(|row| row.as_map().clone()));
            return Ok(TableDataInsertAllResponse::default());
        }

        // without 'skipInvalidRows', one bad row stops the rest from being inserted
        let insert_errors = (0..rows.len())
            .map(|index| InsertErrors {
                index,
                errors: vec![invalid.remove(&index).unwrap_or_else(|| ErrorProto {
                    reason: Some("stopped".into()),
                    location: Some("".into()),
                    debug_info: Some("".into()),
                    message: "".into(),
                })],
            })
            .collect();

        Ok(TableDataInsertAllResponse { insert_errors })
    }
}
