use std::sync::Arc;

use bigquery_resources_rs::table_data::TableDataInsertAllResponse;

use crate::client::InnerClient;

mod insert_rows;
pub use insert_rows::InsertRowOptions;

#[derive(Debug, Clone)]
pub struct TableClient<D, T> {
    dataset_name: D,
    table_name: T,
    client: Arc<InnerClient>,
}

impl<D, T> TableClient<D, T> {
    #[inline]
    pub(crate) fn from_parts(dataset_name: D, table_name: T, client: Arc<InnerClient>) -> Self {
        Self {
            dataset_name,
            table_name,
            client,
        }
    }

    /// Streams rows into the table with a single `tabledata.insertAll` call.
    ///
    /// A successful response can still contain per-row errors, check
    /// [`TableDataInsertAllResponse::insert_errors`].
    pub async fn insert_rows<A>(
        &self,
        rows: A,
        options: InsertRowOptions,
    ) -> crate::Result<TableDataInsertAllResponse>
    where
        A: IntoIterator,
        A::Item: serde::Serialize,
        D: AsRef<str>,
        T: AsRef<str>,
    {
        let url = self.client.make_url([
            "datasets",
            self.dataset_name.as_ref(),
            "tables",
            self.table_name.as_ref(),
            "insertAll",
        ]);

        let payload = insert_rows::InsertRows::new(options, rows);

        let resp = self.client.post(url, payload).await?;

        crate::client::deserialize_json(resp).await
    }
}
