use std::fmt;
use std::path::Path;
use std::sync::Arc;

use gcp_auth::TokenProvider;
use http::header::HeaderValue;

/// Full read/write access to BigQuery, needed to create datasets/tables and run load jobs.
pub const BIGQUERY_SCOPE: &str = "https://www.googleapis.com/auth/bigquery";

/// Supplies bearer tokens for requests. Tokens are cached and refreshed by the
/// underlying [`TokenProvider`].
#[derive(Clone)]
pub struct Auth {
    provider: Arc<dyn TokenProvider>,
    scopes: &'static [&'static str],
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

impl Auth {
    pub fn from_provider(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            scopes: &[BIGQUERY_SCOPE],
        }
    }

    /// Loads a service account key file (the file `GOOGLE_APPLICATION_CREDENTIALS` points at).
    pub fn from_service_account_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let account = gcp_auth::CustomServiceAccount::from_file(path.as_ref())?;
        Ok(Self::from_provider(Arc::new(account)))
    }

    pub(crate) async fn get_header(&self) -> crate::Result<HeaderValue> {
        let token = self.provider.token(self.scopes).await?;

        let mut header = HeaderValue::try_from(format!("Bearer {}", token.as_str()))?;
        header.set_sensitive(true);
        Ok(header)
    }
}
