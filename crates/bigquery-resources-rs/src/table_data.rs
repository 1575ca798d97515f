use super::ErrorProto;

#[derive(Debug, PartialEq, Clone, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDataInsertAllResponse<S = Box<str>> {
    /// An array of errors for rows that were not inserted.
    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    pub insert_errors: Vec<InsertErrors<S>>,
}

impl<S> TableDataInsertAllResponse<S> {
    /// Number of distinct rows the service rejected.
    pub fn rejected_rows(&self) -> usize {
        self.insert_errors.len()
    }

    pub fn is_success(&self) -> bool {
        self.insert_errors.is_empty()
    }
}

#[derive(Debug, PartialEq, Clone, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertErrors<S = Box<str>> {
    /// The index of the row that error applies to.
    pub index: usize,
    /// Error information for the row indicated by the index property.
    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorProto<S>>,
}
