use bigquery_rs::BigQueryClient;
use bigquery_rs::resources::dataset::Dataset;
use bigquery_rs::resources::job::{Job, JobReference};
use bigquery_rs::resources::table::{Table, TableSchema};
use bigquery_rs::resources::table_data::TableDataInsertAllResponse;
use bigquery_rs::table::InsertRowOptions;
use bytes::Bytes;

use crate::resource::{DatasetRef, TableRef};
use crate::schema::Record;

/// The remote calls a bootstrap run makes. Implemented by [`BigQueryClient`], and by an
/// in-memory fake in tests.
///
/// Errors are returned as-is, callers decide which ones are fatal (i.e a 409 from a create
/// call isn't).
pub trait Warehouse: Send + Sync {
    fn project_id(&self) -> &str;

    /// `datasets.insert`
    fn create_dataset(
        &self,
        dataset: &DatasetRef,
    ) -> impl Future<Output = bigquery_rs::Result<Dataset>> + Send;

    /// `tables.insert`
    fn create_table(
        &self,
        table: &TableRef,
        schema: Option<&TableSchema>,
    ) -> impl Future<Output = bigquery_rs::Result<Table>> + Send;

    /// `jobs.insert` for a load job, with 'data' uploaded as the job's source.
    fn start_load(
        &self,
        job: Job,
        location: Option<&str>,
        data: Bytes,
    ) -> impl Future<Output = bigquery_rs::Result<Job>> + Send;

    /// `jobs.get`
    fn get_job(&self, job_ref: &JobReference)
    -> impl Future<Output = bigquery_rs::Result<Job>> + Send;

    /// `tabledata.insertAll`
    fn insert_rows(
        &self,
        table: &TableRef,
        rows: &[Record],
        options: InsertRowOptions,
    ) -> impl Future<Output = bigquery_rs::Result<TableDataInsertAllResponse>> + Send;
}

impl Warehouse for BigQueryClient {
    fn project_id(&self) -> &str {
        BigQueryClient::project_id(self)
    }

    async fn create_dataset(&self, dataset: &DatasetRef) -> bigquery_rs::Result<Dataset> {
        self.dataset(&*dataset.name)
            .create(Some(&*dataset.location))
            .await
    }

    async fn create_table(
        &self,
        table: &TableRef,
        schema: Option<&TableSchema>,
    ) -> bigquery_rs::Result<Table> {
        self.dataset(&*table.dataset)
            .create_table(&*table.name, schema)
            .await
    }

    async fn start_load(
        &self,
        job: Job,
        location: Option<&str>,
        data: Bytes,
    ) -> bigquery_rs::Result<Job> {
        self.insert_load_job(job, location, data).await
    }

    async fn get_job(&self, job_ref: &JobReference) -> bigquery_rs::Result<Job> {
        BigQueryClient::get_job(self, job_ref).await
    }

    async fn insert_rows(
        &self,
        table: &TableRef,
        rows: &[Record],
        options: InsertRowOptions,
    ) -> bigquery_rs::Result<TableDataInsertAllResponse> {
        self.dataset(&*table.dataset)
            .into_table(&*table.name)
            .insert_rows(rows, options)
            .await
    }
}

impl<W: Warehouse + ?Sized> Warehouse for &W {
    fn project_id(&self) -> &str {
        (**self).project_id()
    }

    fn create_dataset(
        &self,
        dataset: &DatasetRef,
    ) -> impl Future<Output = bigquery_rs::Result<Dataset>> + Send {
        (**self).create_dataset(dataset)
    }

    fn create_table(
        &self,
        table: &TableRef,
        schema: Option<&TableSchema>,
    ) -> impl Future<Output = bigquery_rs::Result<Table>> + Send {
        (**self).create_table(table, schema)
    }

    fn start_load(
        &self,
        job: Job,
        location: Option<&str>,
        data: Bytes,
    ) -> impl Future<Output = bigquery_rs::Result<Job>> + Send {
        (**self).start_load(job, location, data)
    }

    fn get_job(
        &self,
        job_ref: &JobReference,
    ) -> impl Future<Output = bigquery_rs::Result<Job>> + Send {
        (**self).get_job(job_ref)
    }

    fn insert_rows(
        &self,
        table: &TableRef,
        rows: &[Record],
        options: InsertRowOptions,
    ) -> impl Future<Output = bigquery_rs::Result<TableDataInsertAllResponse>> + Send {
        (**self).insert_rows(table, rows, options)
    }
}
