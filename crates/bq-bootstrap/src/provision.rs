use bigquery_rs::resources::dataset::Dataset;
use bigquery_rs::resources::table::Table;

use crate::error::ProvisionError;
use crate::resource::{DatasetRef, TableRef};
use crate::schema::Schema;
use crate::warehouse::Warehouse;

/// Creates datasets and tables, treating "already exists" as success.
///
/// An already existing resource is detected from the 409 status alone. Anything else
/// (permissions, bad locations, quotas) is returned as a [`ProvisionError`].
#[derive(Debug)]
pub struct Provisioner<'a, W> {
    warehouse: &'a W,
}

impl<'a, W: Warehouse> Provisioner<'a, W> {
    pub const fn new(warehouse: &'a W) -> Self {
        Self { warehouse }
    }

    pub async fn ensure_dataset(&self, dataset: &DatasetRef) -> Result<Dataset, ProvisionError> {
        info!(message = "ensuring dataset exists", dataset = %dataset.name, location = %dataset.location);

        match self.warehouse.create_dataset(dataset).await {
            Ok(created) => {
                info!(message = "created dataset", dataset = %dataset.name);
                Ok(created)
            }
            Err(error) if error.is_conflict() => {
                warn!(message = "dataset already exists, continuing", dataset = %dataset.name);

                let reference = dataset.reference(self.warehouse.project_id());
                Ok(Dataset::new(reference.into_owned(), Some(dataset.location.clone())))
            }
            Err(source) => Err(ProvisionError::Dataset {
                dataset: dataset.name.clone(),
                source,
            }),
        }
    }

    /// Ensures 'table' exists in 'dataset', declared with 'schema'. A table that already
    /// exists is left untouched, even if its schema differs.
    pub async fn ensure_table(
        &self,
        dataset: &Dataset,
        table: &TableRef,
        schema: &Schema,
    ) -> Result<Table, ProvisionError> {
        if *dataset.dataset_reference.dataset_id != *table.dataset {
            return Err(ProvisionError::DatasetMismatch {
                table: table.name.clone(),
                expected: table.dataset.clone(),
                found: dataset.dataset_reference.dataset_id.clone(),
            });
        }

        info!(message = "ensuring table exists", table = %table, fields = schema.fields().len());

        let table_schema = schema.to_table_schema();

        match self.warehouse.create_table(table, Some(&table_schema)).await {
            Ok(created) => {
                info!(message = "created table", table = %table);
                Ok(created)
            }
            Err(error) if error.is_conflict() => {
                warn!(message = "table already exists, continuing", table = %table);

                let reference = table.reference(self.warehouse.project_id());
                Ok(Table::new(reference.into_owned(), Some(table_schema)))
            }
            Err(source) => Err(ProvisionError::Table {
                table: table.to_string().into_boxed_str(),
                source,
            }),
        }
    }
}
