use std::fmt;

use bigquery_rs::resources::{DatasetReference, TableReference};

/// A dataset to provision: its id and the location it's created in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetRef {
    pub name: Box<str>,
    pub location: Box<str>,
}

impl DatasetRef {
    pub fn new(name: impl Into<Box<str>>, location: impl Into<Box<str>>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }

    pub fn table(&self, name: impl Into<Box<str>>) -> TableRef {
        TableRef {
            dataset: self.name.clone(),
            name: name.into(),
        }
    }

    pub fn reference<'a>(&'a self, project_id: &'a str) -> DatasetReference<&'a str> {
        DatasetReference {
            project_id,
            dataset_id: &self.name,
        }
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A table inside exactly one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub dataset: Box<str>,
    pub name: Box<str>,
}

impl TableRef {
    pub fn reference<'a>(&'a self, project_id: &'a str) -> TableReference<&'a str> {
        TableReference {
            project_id,
            dataset_id: &self.dataset,
            table_id: &self.name,
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.dataset, self.name)
    }
}
