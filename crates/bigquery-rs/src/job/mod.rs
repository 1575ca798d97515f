use bigquery_resources_rs::job::{Job, JobReference};
use bytes::Bytes;
use http::header::{self, HeaderValue};

use crate::BigQueryClient;

/// Prefix for the client generated job ids, so load jobs are easy to find in the console.
const JOB_ID_PREFIX: &str = "bq_load_";

const UPLOAD_CONTENT_TYPE: &str = "application/octet-stream";

impl BigQueryClient {
    /// Inserts a load job, with 'data' uploaded as the job's source. Returns once the job has
    /// been accepted, which is usually before the job finishes (see [`BigQueryClient::get_job`]).
    ///
    /// This uses the resumable upload protocol, but sends the data in a single request:
    /// 1. POST the job metadata with 'uploadType=resumable', receiving a session URI in the
    ///    'Location' header.
    /// 2. PUT the data to the session URI, which responds with the inserted job.
    ///
    /// The job id is generated here (if one isn't given), so the job can still be looked up
    /// if the final response is lost.
    pub async fn insert_load_job(
        &self,
        mut job: Job,
        location: Option<&str>,
        data: Bytes,
    ) -> crate::Result<Job> {
        let job_ref = job.job_reference.get_or_insert_with(|| JobReference {
            job_id: format!("{JOB_ID_PREFIX}{}", uuid::Uuid::new_v4().simple()).into_boxed_str(),
            location: location.map(Box::from),
            project_id: Box::from(self.project_id()),
        });

        debug!(message = "starting load job upload", job_id = %job_ref.job_id, bytes = data.len());

        let mut url = self.inner.upload_url().clone();
        url.query_pairs_mut().append_pair("uploadType", "resumable");

        let builder = self
            .inner
            .request(reqwest::Method::POST, url)
            .await?
            .header("X-Upload-Content-Type", HeaderValue::from_static(UPLOAD_CONTENT_TYPE))
            .header("X-Upload-Content-Length", data.len())
            .json(&job);

        let session = self.inner.send(builder).await?;

        let session_url = session
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| crate::Error::missing_field("Location"))?
            .to_owned();

        let builder = self
            .inner
            .request(reqwest::Method::PUT, session_url)
            .await?
            .header(header::CONTENT_TYPE, HeaderValue::from_static(UPLOAD_CONTENT_TYPE))
            .header(header::CONTENT_LENGTH, data.len())
            .body(data);

        let resp = self.inner.send(builder).await?;
        crate::client::deserialize_json(resp).await
    }
}
