use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use bigquery_rs::resources::TableReference;
use bigquery_rs::resources::job::{
    CreateDisposition, CsvOptions, Job, JobConfigurationLoad, JobReference, SkipLeadingRows,
};
use bytes::Bytes;

use super::LoadSummary;
use super::wait::JobWait;
use crate::error::LoadError;
use crate::resource::TableRef;
use crate::schema::Schema;
use crate::warehouse::Warehouse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkLoadOptions {
    /// Leading rows (headers) skipped by the import.
    pub skip_header_rows: usize,
    /// Let BigQuery infer the column types (and names, from the header row). When unset,
    /// the table has to exist with a declared schema.
    pub auto_detect_schema: bool,
    pub poll_interval: Duration,
    /// How long to wait for the job to finish. The job keeps running remotely if this elapses.
    pub timeout: Option<Duration>,
}

impl Default for BulkLoadOptions {
    fn default() -> Self {
        Self {
            skip_header_rows: 1,
            auto_detect_schema: true,
            poll_interval: Duration::from_secs(1),
            timeout: None,
        }
    }
}

/// Where the CSV data comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadSource {
    Path(PathBuf),
    Bytes(Bytes),
}

impl LoadSource {
    async fn read(&self) -> Result<Bytes, LoadError> {
        match self {
            Self::Bytes(bytes) => Ok(bytes.clone()),
            Self::Path(path) => match tokio::fs::read(path).await {
                Ok(data) => Ok(Bytes::from(data)),
                Err(source) => Err(LoadError::Source {
                    path: path.clone(),
                    source,
                }),
            },
        }
    }
}

impl fmt::Display for LoadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Bytes(bytes) => write!(f, "<{} bytes in memory>", bytes.len()),
        }
    }
}

impl From<PathBuf> for LoadSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<Bytes> for LoadSource {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

/// Imports a CSV source with a single load job, then waits for the job to finish.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkFileLoader {
    source: LoadSource,
    options: BulkLoadOptions,
    schema: Option<Schema>,
}

impl BulkFileLoader {
    pub fn new(source: impl Into<LoadSource>, options: BulkLoadOptions) -> Self {
        Self {
            source: source.into(),
            options,
            schema: None,
        }
    }

    /// Sends 'schema' along with the job. Only used when schema autodetection is off.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    #[inline]
    pub fn options(&self) -> &BulkLoadOptions {
        &self.options
    }

    #[inline]
    pub fn source(&self) -> &LoadSource {
        &self.source
    }

    pub fn requires_schema(&self) -> bool {
        !self.options.auto_detect_schema
    }

    fn build_job(&self, destination: TableReference) -> Job {
        let csv = CsvOptions {
            skip_leading_rows: SkipLeadingRows::Skip(self.options.skip_header_rows),
            autodetect: self.options.auto_detect_schema,
            ..CsvOptions::default()
        };

        let mut load = JobConfigurationLoad::new(csv, destination);
        load.create_disposition = Some(CreateDisposition::CreateIfNeeded);

        if let Some(ref schema) = self.schema
            && !self.options.auto_detect_schema
        {
            load = load.schema(schema.to_table_schema());
        }

        Job::from(load)
    }

    pub async fn load<W: Warehouse>(
        &self,
        warehouse: &W,
        table: &TableRef,
        location: &str,
    ) -> Result<LoadSummary, LoadError> {
        let data = self.source.read().await?;

        info!(
            message = "starting bulk import",
            source = %self.source,
            table = %table,
            bytes = data.len(),
        );

        let job = self.build_job(table.reference(warehouse.project_id()).into_owned());

        let job = warehouse
            .start_load(job, Some(location), data)
            .await
            .map_err(|error| LoadError::remote("submitting the load job", error))?;

        let job_ref = job
            .job_reference
            .clone()
            .ok_or(LoadError::MissingJobReference)?;

        info!(message = "submitted load job", job_id = %job_ref.job_id);

        let job = if job.status.as_ref().is_some_and(|status| status.state.is_done()) {
            job
        } else {
            self.wait(warehouse, &job_ref).await?
        };

        finish(job, job_ref)
    }

    async fn wait<W: Warehouse>(&self, warehouse: &W, job_ref: &JobReference) -> Result<Job, LoadError> {
        let wait = JobWait::new(warehouse, job_ref.clone(), self.options.poll_interval);

        let result = match self.options.timeout {
            None => wait.await,
            Some(timeout) => match tokio::time::timeout(timeout, wait).await {
                Ok(result) => result,
                Err(_elapsed) => {
                    warn!(
                        message = "timed out waiting for load job, it will keep running",
                        job_id = %job_ref.job_id,
                        ?timeout,
                    );
                    return Err(LoadError::JobTimedOut {
                        job_id: job_ref.job_id.clone(),
                        timeout,
                    });
                }
            },
        };

        result.map_err(|error| LoadError::remote("checking the load job status", error))
    }
}

fn finish(job: Job, job_ref: JobReference) -> Result<LoadSummary, LoadError> {
    let rows = job.output_rows().unwrap_or(0);

    if let Some(status) = job.status
        && status.error_result.is_some()
    {
        let errors = status.into_errors();
        error!(message = "load job failed", job_id = %job_ref.job_id, errors = errors.len());

        return Err(LoadError::JobFailed {
            job_id: job_ref.job_id,
            errors,
        });
    }

    info!(message = "load job finished", job_id = %job_ref.job_id, rows);

    Ok(LoadSummary {
        rows,
        job_id: Some(job_ref.job_id),
    })
}

#[cfg(test)]
mod tests {
    use bigquery_rs::resources::ErrorProto;
    use bigquery_rs::resources::job::{JobConfigurationKind, SourceFormat};
    use serde_json::json;

    use super::*;
    use crate::resource::DatasetRef;
    use crate::test_utils::{Call, FakeWarehouse, SAMPLE_CSV};

    fn options() -> BulkLoadOptions {
        BulkLoadOptions {
            poll_interval: Duration::from_millis(1),
            ..BulkLoadOptions::default()
        }
    }

    fn target(fake: &FakeWarehouse) -> TableRef {
        let dataset = DatasetRef::new("bq", "US");
        fake.insert_dataset(&dataset);
        dataset.table("test")
    }

    #[tokio::test]
    async fn test_three_line_csv_loads_two_rows() {
        let fake = FakeWarehouse::new();
        let table = target(&fake);

        let loader = BulkFileLoader::new(Bytes::from_static(SAMPLE_CSV.as_bytes()), options());
        let summary = loader.load(&fake, &table, "US").await.unwrap();

        assert_eq!(summary.rows, 2);
        assert!(summary.job_id.is_some());
        assert_eq!(fake.calls(Call::StartLoad), 1);
        assert_eq!(fake.calls(Call::GetJob), 2);

        assert_eq!(fake.rows(&table), vec![json!({ "name": "foo" }), json!({ "name": "bar" })]);
    }

    #[tokio::test]
    async fn test_job_configuration() {
        let loader = BulkFileLoader::new(Bytes::new(), options())
            .with_schema(Schema::parse("name:STRING").unwrap());

        let destination = TableReference {
            project_id: "my-project".into(),
            dataset_id: "bq".into(),
            table_id: "test".into(),
        };

        // autodetect on, so the schema isn't sent
        let job = loader.build_job(destination.clone());
        let JobConfigurationKind::Load(load) = job.configuration.kind else {
            unreachable!()
        };
        assert!(load.schema.is_none());
        assert_eq!(load.create_disposition, Some(CreateDisposition::CreateIfNeeded));
        let SourceFormat::Csv(csv) = load.source_format;
        assert_eq!(csv.skip_leading_rows, SkipLeadingRows::Skip(1));
        assert!(csv.autodetect);

        let loader = BulkFileLoader::new(
            Bytes::new(),
            BulkLoadOptions {
                auto_detect_schema: false,
                ..options()
            },
        )
        .with_schema(Schema::parse("name:STRING").unwrap());

        assert!(loader.requires_schema());
        let job = loader.build_job(destination);
        let JobConfigurationKind::Load(load) = job.configuration.kind else {
            unreachable!()
        };
        assert_eq!(load.schema.unwrap().fields.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_source_file() {
        let fake = FakeWarehouse::new();
        let table = target(&fake);

        let path = std::env::temp_dir().join(format!("bq-missing-{}.csv", uuid::Uuid::new_v4()));
        let error = BulkFileLoader::new(path.clone(), options())
            .load(&fake, &table, "US")
            .await
            .unwrap_err();

        assert!(matches!(error, LoadError::Source { path: ref p, .. } if *p == path));
        assert_eq!(fake.calls(Call::StartLoad), 0);
    }

    #[tokio::test]
    async fn test_failed_job() {
        let fake = FakeWarehouse::new();
        let table = target(&fake);
        fake.fail_jobs_with(
            ErrorProto::new("Error while reading data, error message: CSV table encountered too many errors".into())
                .with_reason("invalid".into()),
        );

        let error = BulkFileLoader::new(Bytes::from_static(SAMPLE_CSV.as_bytes()), options())
            .load(&fake, &table, "US")
            .await
            .unwrap_err();

        let LoadError::JobFailed { errors, .. } = error else {
            panic!("expected a failed job, got {error:?}");
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].reason.as_deref(), Some("invalid"));
        assert!(fake.rows(&table).is_empty());
    }

    #[tokio::test]
    async fn test_job_timeout() {
        let fake = FakeWarehouse::new();
        let table = target(&fake);
        fake.stall_jobs();

        let error = BulkFileLoader::new(
            Bytes::from_static(SAMPLE_CSV.as_bytes()),
            BulkLoadOptions {
                timeout: Some(Duration::from_millis(20)),
                ..options()
            },
        )
        .load(&fake, &table, "US")
        .await
        .unwrap_err();

        assert!(matches!(error, LoadError::JobTimedOut { .. }));
        assert!(fake.calls(Call::GetJob) >= 1);
    }

    #[tokio::test]
    async fn test_rejected_submission() {
        let fake = FakeWarehouse::new();
        let table = target(&fake);
        fake.fail(
            Call::StartLoad,
            http::StatusCode::FORBIDDEN,
            "PERMISSION_DENIED",
            "Access Denied: User does not have bigquery.jobs.create permission",
        );

        let error = BulkFileLoader::new(Bytes::from_static(SAMPLE_CSV.as_bytes()), options())
            .load(&fake, &table, "US")
            .await
            .unwrap_err();

        assert!(matches!(error, LoadError::Remote { step: "submitting the load job", .. }));
        assert_eq!(error.status(), Some(http::StatusCode::FORBIDDEN));
        assert_eq!(fake.calls(Call::GetJob), 0);
        assert!(fake.rows(&table).is_empty());
    }

    #[tokio::test]
    async fn test_missing_destination_dataset() {
        let fake = FakeWarehouse::new();
        let table = DatasetRef::new("bq", "US").table("test");

        let error = BulkFileLoader::new(Bytes::from_static(SAMPLE_CSV.as_bytes()), options())
            .load(&fake, &table, "US")
            .await
            .unwrap_err();

        assert!(matches!(error, LoadError::Remote { .. }));
        assert_eq!(error.status(), Some(http::StatusCode::NOT_FOUND));
        assert_eq!(fake.calls(Call::StartLoad), 1);
        assert_eq!(fake.calls(Call::GetJob), 0);
        assert!(!fake.has_table(&table));
    }
}
