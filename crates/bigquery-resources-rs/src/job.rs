use std::collections::HashMap;

use crate::table::TableSchema;
use crate::{ErrorProto, TableReference, util};

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job<S = Box<str>> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_link: Option<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<S>,
    pub configuration: JobConfiguration<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_reference: Option<JobReference<S>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<JobStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus<S>>,
}

impl<S, Config> From<Config> for Job<S>
where
    JobConfiguration<S>: From<Config>,
{
    #[inline]
    fn from(value: Config) -> Self {
        JobConfiguration::from(value).into_job()
    }
}

impl<S> Job<S> {
    /// Rows written by a finished load job, if the job reported them.
    pub fn output_rows(&self) -> Option<u64> {
        self.statistics
            .as_ref()
            .and_then(|stats| stats.load.as_ref())
            .and_then(|load| load.output_rows)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference<S = Box<str>> {
    pub job_id: S,
    /// The geographic location of the job. See details at
    /// https://cloud.google.com/bigquery/docs/locations#specifying_your_location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<S>,
    /// [Required] The ID of the project containing this job.
    pub project_id: S,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus<S = Box<str>> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_result: Option<ErrorProto<S>>,
    // need to specify a default fn vec to avoid S needing Default
    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorProto<S>>,
    pub state: JobState,
}

impl<S> JobStatus<S> {
    pub const fn pending() -> Self {
        Self {
            error_result: None,
            errors: Vec::new(),
            state: JobState::Pending,
        }
    }

    pub fn len(&self) -> usize {
        self.error_result.is_some() as usize + self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every error, with 'errorResult' first. 'errorResult' is usually also repeated
    /// within 'errors', so exact duplicates are dropped.
    pub fn into_errors(mut self) -> Vec<ErrorProto<S>>
    where
        S: PartialEq,
    {
        if let Some(result) = self.error_result {
            self.errors.retain(|error| *error != result);
            self.errors.insert(0, result);
        }

        self.errors
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Pending,
    Running,
    Done,
}

impl JobState {
    #[inline]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatistics {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "util::int64::optional"
    )]
    pub creation_time: Option<i64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "util::int64::optional"
    )]
    pub start_time: Option<i64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "util::int64::optional"
    )]
    pub end_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load: Option<LoadStatistics>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadStatistics {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "util::int64::optional"
    )]
    pub input_files: Option<u64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "util::int64::optional"
    )]
    pub input_file_bytes: Option<u64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "util::int64::optional"
    )]
    pub output_rows: Option<u64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "util::int64::optional"
    )]
    pub output_bytes: Option<u64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "util::int64::optional"
    )]
    pub bad_records: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobConfiguration<S = Box<str>> {
    #[serde(default, skip_serializing_if = "util::is_false")]
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<Box<str>, S>>,
    #[serde(flatten)]
    pub kind: JobConfigurationKind<S>,
}

impl<S> JobConfiguration<S> {
    /// Converts [self] into a [Job], with empty values for the fields in [Job]
    pub fn into_job(self) -> Job<S> {
        Job {
            kind: None,
            etag: None,
            id: None,
            self_link: None,
            user_email: None,
            job_reference: None,
            statistics: None,
            status: None,
            configuration: self,
        }
    }
}

impl<S> From<JobConfigurationLoad<S>> for JobConfiguration<S> {
    fn from(value: JobConfigurationLoad<S>) -> Self {
        Self {
            dry_run: false,
            labels: None,
            kind: JobConfigurationKind::Load(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub enum JobConfigurationKind<S = Box<str>> {
    Load(JobConfigurationLoad<S>),
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobConfigurationLoad<S = Box<str>> {
    /// Left empty for loads that upload their data alongside the job (media uploads).
    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    pub source_uris: Vec<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<TableSchema<S>>,
    pub destination_table: TableReference<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_disposition: Option<CreateDisposition>,
    #[serde(default)]
    pub write_disposition: WriteDisposition,
    #[serde(flatten)]
    pub source_format: SourceFormat<S>,
    #[serde(default, skip_serializing_if = "util::is_false")]
    pub ignore_unknown_values: bool,
}

impl<S> JobConfigurationLoad<S> {
    pub fn new(source_format: impl Into<SourceFormat<S>>, destination_table: TableReference<S>) -> Self {
        Self {
            source_uris: Vec::new(),
            schema: None,
            destination_table,
            create_disposition: None,
            write_disposition: WriteDisposition::default(),
            source_format: source_format.into(),
            ignore_unknown_values: false,
        }
    }

    pub fn schema(mut self, schema: TableSchema<S>) -> Self {
        self.schema = Some(schema);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SkipLeadingRows {
    #[default]
    Autodetect,
    Skip(usize),
}

impl SkipLeadingRows {
    #[inline]
    pub const fn is_autodetect(&self) -> bool {
        matches!(self, Self::Autodetect)
    }
}

impl serde::Serialize for SkipLeadingRows {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Autodetect => serializer.serialize_none(),
            Self::Skip(rows) => serializer.serialize_some(&rows),
        }
    }
}

impl<'de> serde::Deserialize<'de> for SkipLeadingRows {
    #[inline]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Raw<'a> {
            Int(usize),
            #[serde(borrow)]
            Str(std::borrow::Cow<'a, str>),
        }

        // BigQuery echoes this back as a string, even though it's sent as an integer.
        match <Option<Raw<'de>> as serde::Deserialize>::deserialize(deserializer)? {
            Some(Raw::Int(rows)) => Ok(Self::Skip(rows)),
            Some(Raw::Str(rows)) => rows
                .parse()
                .map(Self::Skip)
                .map_err(serde::de::Error::custom),
            None => Ok(Self::Autodetect),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreateDisposition {
    CreateIfNeeded,
    CreateNever,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WriteDisposition {
    #[default]
    WriteAppend,
    WriteTruncate,
    WriteEmpty,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Encoding {
    #[default]
    #[serde(rename = "UTF-8")]
    Utf8,
    #[serde(rename = "ISO-8859-1")]
    Iso8859_1,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "sourceFormat")]
pub enum SourceFormat<S = Box<str>> {
    Csv(CsvOptions<S>),
}

impl<S> Default for SourceFormat<S> {
    fn default() -> Self {
        Self::Csv(CsvOptions::default())
    }
}

impl<S> From<CsvOptions<S>> for SourceFormat<S> {
    fn from(value: CsvOptions<S>) -> Self {
        Self::Csv(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvOptions<S = Box<str>> {
    #[serde(default, skip_serializing_if = "util::is_false")]
    pub allow_jagged_rows: bool,
    #[serde(default, skip_serializing_if = "SkipLeadingRows::is_autodetect")]
    pub skip_leading_rows: SkipLeadingRows,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub null_marker: Option<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_delimiter: Option<S>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<Encoding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<S>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bad_records: Option<usize>,
    #[serde(default, skip_serializing_if = "util::is_false")]
    pub autodetect: bool,
    #[serde(default, skip_serializing_if = "util::is_false")]
    pub allow_quoted_new_lines: bool,
}

impl<S> Default for CsvOptions<S> {
    fn default() -> Self {
        CsvOptions {
            allow_jagged_rows: false,
            skip_leading_rows: SkipLeadingRows::Autodetect,
            autodetect: true,
            null_marker: None,
            field_delimiter: None,
            quote: None,
            encoding: None,
            max_bad_records: None,
            allow_quoted_new_lines: false,
        }
    }
}
