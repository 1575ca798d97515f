use std::sync::Arc;

use bigquery_resources_rs::DatasetReference;
use bigquery_resources_rs::dataset::Dataset;
use bigquery_resources_rs::table::{Table, TableSchema};

use crate::client::InnerClient;
use crate::table::TableClient;

#[derive(Debug, Clone)]
pub struct DatasetClient<D> {
    dataset_name: D,
    client: Arc<InnerClient>,
}

impl<D> DatasetClient<D> {
    #[inline]
    pub(crate) fn from_parts(dataset_name: D, client: Arc<InnerClient>) -> Self {
        Self {
            dataset_name,
            client,
        }
    }

    #[inline]
    pub fn into_table<T>(self, table: T) -> TableClient<D, T> {
        TableClient::from_parts(self.dataset_name, table, self.client)
    }
}

impl<D: AsRef<str>> DatasetClient<D> {
    fn reference(&self) -> DatasetReference<&str> {
        DatasetReference {
            project_id: self.client.project_id(),
            dataset_id: self.dataset_name.as_ref(),
        }
    }

    /// Creates this dataset in 'location'. Fails with a 409 (see [`crate::Error::is_conflict`])
    /// if the dataset already exists.
    pub async fn create(&self, location: Option<&str>) -> crate::Result<Dataset> {
        let url = self.client.make_url(["datasets"]);
        let payload = Dataset::new(self.reference(), location);

        let resp = self.client.post(url, payload).await?;
        crate::client::deserialize_json(resp).await
    }

    /// Creates a table within this dataset. Fails with a 409 if the table already exists.
    pub async fn create_table<T: AsRef<str>>(
        &self,
        table_name: T,
        schema: Option<&TableSchema>,
    ) -> crate::Result<Table> {
        let url = self
            .client
            .make_url(["datasets", self.dataset_name.as_ref(), "tables"]);

        let schema = schema.map(|schema| TableSchema {
            fields: schema
                .fields
                .iter()
                .map(|field| field.map_as_ref::<str>())
                .collect(),
        });

        let payload = Table::new(self.reference().into_table(table_name.as_ref()), schema);

        let resp = self.client.post(url, payload).await?;
        crate::client::deserialize_json(resp).await
    }
}
