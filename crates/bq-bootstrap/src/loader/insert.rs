use std::path::Path;

use bigquery_rs::table::InsertRowOptions;

use super::LoadSummary;
use crate::error::{Error, LoadError, SchemaError};
use crate::resource::TableRef;
use crate::schema::{Record, Schema};
use crate::warehouse::Warehouse;

/// Inserts records directly with a single `tabledata.insertAll` call.
///
/// Every record is validated against the schema before anything is sent, so a bad record
/// fails the whole load without touching the table.
#[derive(Debug, Clone, PartialEq)]
pub struct RowInsertLoader {
    schema: Schema,
    records: Vec<Record>,
    options: InsertRowOptions,
}

impl RowInsertLoader {
    pub fn new(schema: Schema, records: impl IntoIterator<Item = Record>) -> Self {
        Self {
            schema,
            records: records.into_iter().collect(),
            options: InsertRowOptions::traced(),
        }
    }

    /// Parses newline delimited JSON, one record (object) per line. Blank lines are skipped.
    pub fn from_ndjson(schema: Schema, data: &[u8]) -> Result<Self, LoadError> {
        let mut records = Vec::new();

        for (idx, line) in data.split(|b| *b == b'\n').enumerate() {
            let line = line.trim_ascii();
            if line.is_empty() {
                continue;
            }

            let record = serde_json::from_slice::<Record>(line)
                .map_err(|source| LoadError::Decode { line: idx + 1, source })?;

            records.push(record);
        }

        Ok(Self::new(schema, records))
    }

    pub async fn from_ndjson_file(schema: Schema, path: &Path) -> Result<Self, LoadError> {
        let data = tokio::fs::read(path).await.map_err(|source| LoadError::Source {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_ndjson(schema, &data)
    }

    pub fn with_options(mut self, options: InsertRowOptions) -> Self {
        self.options = options;
        self
    }

    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[inline]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Validates every record, returning the first failure along with its index.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for (index, record) in self.records.iter().enumerate() {
            self.schema
                .validate(record)
                .map_err(|error| SchemaError::InvalidRow {
                    index,
                    source: Box::new(error),
                })?;
        }

        Ok(())
    }

    pub async fn load<W: Warehouse>(
        &self,
        warehouse: &W,
        table: &TableRef,
    ) -> Result<LoadSummary, Error> {
        self.validate()?;

        // insertAll rejects requests without rows
        if self.records.is_empty() {
            info!(message = "no records to insert", table = %table);
            return Ok(LoadSummary::default());
        }

        info!(message = "inserting rows", table = %table, rows = self.records.len());

        let resp = warehouse
            .insert_rows(table, &self.records, self.options)
            .await
            .map_err(|error| LoadError::remote("inserting rows", error))?;

        if !resp.is_success() {
            error!(
                message = "rows were rejected",
                table = %table,
                rejected = resp.rejected_rows(),
                total = self.records.len(),
            );

            return Err(LoadError::RowsRejected {
                total: self.records.len(),
                rejected: resp.insert_errors,
            }
            .into());
        }

        info!(message = "inserted rows", table = %table, rows = self.records.len());

        Ok(LoadSummary {
            rows: self.records.len() as u64,
            job_id: None,
        })
    }
}
