//! The two ways data gets into a table: a bulk CSV import through a load job, or direct
//! row insertion. [`DataLoader`] picks between them at runtime.

mod bulk;
mod insert;
mod wait;

pub use bulk::{BulkFileLoader, BulkLoadOptions, LoadSource};
pub use insert::RowInsertLoader;

use crate::error::Error;
use crate::resource::TableRef;
use crate::warehouse::Warehouse;

#[derive(Debug, Clone, PartialEq)]
pub enum DataLoader {
    Bulk(BulkFileLoader),
    Rows(RowInsertLoader),
}

/// What a finished load reports back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Rows written to the table.
    pub rows: u64,
    /// The load job id, for bulk imports.
    pub job_id: Option<Box<str>>,
}

impl DataLoader {
    /// Whether the table has to exist with a declared schema before loading. Row insertion
    /// always needs one, bulk imports only when schema autodetection is off.
    pub fn requires_schema(&self) -> bool {
        match self {
            Self::Bulk(bulk) => bulk.requires_schema(),
            Self::Rows(_) => true,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Bulk(_) => "import",
            Self::Rows(_) => "insert",
        }
    }

    /// Loads into 'table'. 'location' is where the dataset lives, which load jobs have to
    /// run in.
    pub async fn load<W: Warehouse>(
        &self,
        warehouse: &W,
        table: &TableRef,
        location: &str,
    ) -> Result<LoadSummary, Error> {
        match self {
            Self::Bulk(bulk) => bulk
                .load(warehouse, table, location)
                .await
                .map_err(Error::from),
            Self::Rows(rows) => rows.load(warehouse, table).await,
        }
    }
}

impl From<BulkFileLoader> for DataLoader {
    fn from(value: BulkFileLoader) -> Self {
        Self::Bulk(value)
    }
}

impl From<RowInsertLoader> for DataLoader {
    fn from(value: RowInsertLoader) -> Self {
        Self::Rows(value)
    }
}
