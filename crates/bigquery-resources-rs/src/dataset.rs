use std::collections::HashMap;

use crate::DatasetReference;
use crate::util;

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset<S = Box<str>> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_link: Option<S>,
    pub dataset_reference: DatasetReference<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<Box<str>, S>>,
    /// The geographic location where the dataset should reside. Immutable once created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<S>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "util::int64::optional"
    )]
    pub creation_time: Option<i64>,
}

impl<S> Dataset<S> {
    /// A dataset with only the parts needed for a `datasets.insert` call.
    pub const fn new(dataset_reference: DatasetReference<S>, location: Option<S>) -> Self {
        Self {
            etag: None,
            id: None,
            self_link: None,
            dataset_reference,
            friendly_name: None,
            description: None,
            labels: None,
            location,
            creation_time: None,
        }
    }
}
