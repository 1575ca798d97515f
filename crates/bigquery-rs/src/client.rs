use std::sync::Arc;

use bigquery_resources_rs::job::{Job, JobReference};
use http::header::HeaderValue;
use reqwest::{IntoUrl, Response, Url};

use crate::auth::Auth;
use crate::dataset::DatasetClient;
use crate::{Error, error};

/// The root URL for this service. The REST and upload endpoints are both relative to this.
pub(crate) const ROOT_URL: &str = "https://bigquery.googleapis.com";

#[derive(Debug, Clone)]
pub struct BigQueryClient {
    pub(crate) inner: Arc<InnerClient>,
}

#[derive(Debug)]
pub(crate) struct InnerClient {
    client: reqwest::Client,
    auth: Auth,
    project_id: Arc<str>,
    /// '{root}/bigquery/v2/projects/{project_id}'
    base_url: Url,
    /// '{root}/upload/bigquery/v2/projects/{project_id}/jobs'
    upload_url: Url,
}

impl BigQueryClient {
    pub fn new_from_parts(project_id: impl Into<Arc<str>>, auth: Auth, client: reqwest::Client) -> Self {
        let root = Url::parse(ROOT_URL).expect("root url is valid");
        Self::new_with_root(project_id.into(), auth, client, root)
    }

    /// Builds a client that sends requests to 'root' instead of the public endpoint, i.e
    /// to point at a local emulator.
    pub fn new_with_root(
        project_id: impl Into<Arc<str>>,
        auth: Auth,
        client: reqwest::Client,
        root: Url,
    ) -> Self {
        let project_id = project_id.into();

        let base_url =
            crate::util::append_to_path(&root, ["bigquery", "v2", "projects", &*project_id]);
        let upload_url = crate::util::append_to_path(&root, [
            "upload",
            "bigquery",
            "v2",
            "projects",
            &*project_id,
            "jobs",
        ]);

        Self {
            inner: Arc::new(InnerClient {
                client,
                auth,
                project_id,
                base_url,
                upload_url,
            }),
        }
    }

    pub fn new_from_auth(project_id: impl Into<Arc<str>>, auth: Auth) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("bigquery-rs/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::new_from_parts(project_id, auth, client))
    }

    /// Builds a client authenticated with the service account key at 'credentials_path'.
    pub fn new(
        project_id: impl Into<Arc<str>>,
        credentials_path: impl AsRef<std::path::Path>,
    ) -> Result<Self, Error> {
        let auth = Auth::from_service_account_file(credentials_path)?;
        Self::new_from_auth(project_id, auth)
    }

    #[inline]
    pub fn project_id(&self) -> &str {
        self.inner.project_id()
    }

    #[inline]
    pub fn dataset<D>(&self, dataset_name: D) -> DatasetClient<D> {
        DatasetClient::from_parts(dataset_name, Arc::clone(&self.inner))
    }

    /// Gets the current state of a job.
    pub async fn get_job(&self, job_ref: &JobReference) -> crate::Result<Job> {
        let mut url = self.inner.make_url(["jobs", &*job_ref.job_id]);

        if let Some(ref location) = job_ref.location {
            url.query_pairs_mut().append_pair("location", location);
        }

        let resp = self.inner.get(url).await?;
        deserialize_json(resp).await
    }
}

impl InnerClient {
    #[inline]
    pub(crate) fn project_id(&self) -> &str {
        &self.project_id
    }

    async fn get_auth_header(&self) -> Result<HeaderValue, Error> {
        self.auth.get_header().await
    }

    #[inline]
    pub(crate) fn upload_url(&self) -> &Url {
        &self.upload_url
    }

    pub(crate) fn make_url<P>(&self, path: P) -> Url
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        crate::util::append_to_path(&self.base_url, path)
    }

    #[inline]
    pub(crate) async fn request(
        &self,
        method: reqwest::Method,
        url: impl IntoUrl,
    ) -> Result<reqwest::RequestBuilder, Error> {
        let header = self.get_auth_header().await?;

        let builder = self
            .client
            .request(method, url)
            .header(http::header::AUTHORIZATION, header);

        Ok(builder)
    }

    /// Sends a request built by [`InnerClient::request`], turning non-2XX responses into errors.
    pub(crate) async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Response, Error> {
        let resp = builder.send().await?;

        if !resp.status().is_success() {
            Err(handle_error(resp).await)
        } else {
            Ok(resp)
        }
    }

    #[inline]
    pub(crate) async fn get(&self, url: impl IntoUrl) -> Result<Response, Error> {
        let builder = self.request(reqwest::Method::GET, url).await?;
        self.send(builder).await
    }

    #[inline]
    pub(crate) async fn post<S>(&self, url: impl IntoUrl, payload: S) -> Result<Response, Error>
    where
        S: serde::Serialize,
    {
        let builder = self
            .request(reqwest::Method::POST, url)
            .await?
            .json(&payload);

        self.send(builder).await
    }
}

pub(crate) async fn handle_error(response: reqwest::Response) -> crate::Error {
    let status = response.status();

    match response.bytes().await {
        Ok(body) => error::ApiError::from_body(status, &body).into(),
        Err(error) => error.into(),
    }
}

pub(crate) async fn deserialize_json<T>(response: reqwest::Response) -> crate::Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(crate::Error::from)
}
