use std::fmt;

use bigquery_resources_rs::ErrorProto;
use http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] gcp_auth::Error),
    #[error(transparent)]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("response from BigQuery is missing '{field}'")]
    MissingField { field: &'static str },
}

impl Error {
    pub(crate) const fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// The HTTP status of the response that caused this error, if the error came from BigQuery
    /// itself rather than from the transport or from decoding.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api(api) => Some(api.status),
            Self::Reqwest(error) => error.status(),
            _ => None,
        }
    }

    /// Whether BigQuery rejected a create because the resource already exists.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Api(api) if api.is_conflict())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(api) if api.status == StatusCode::NOT_FOUND)
    }
}

/// An error response returned by the API, decoded from the standard Google error envelope:
///
/// `{"error": {"code": 409, "message": "...", "errors": [...], "status": "ALREADY_EXISTS"}}`
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: Box<str>,
    /// The canonical status name ('ALREADY_EXISTS', 'PERMISSION_DENIED', etc), if given.
    pub status_name: Option<Box<str>>,
    pub errors: Vec<ErrorProto>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<Box<str>>) -> Self {
        Self {
            status,
            message: message.into(),
            status_name: None,
            errors: Vec::new(),
        }
    }

    #[inline]
    pub fn is_conflict(&self) -> bool {
        self.status == StatusCode::CONFLICT
    }

    pub(crate) fn from_body(status: StatusCode, body: &[u8]) -> Self {
        #[derive(serde::Deserialize)]
        struct Envelope {
            error: Body,
        }

        #[derive(serde::Deserialize)]
        struct Body {
            #[serde(default)]
            message: Option<Box<str>>,
            #[serde(default)]
            status: Option<Box<str>>,
            #[serde(default)]
            errors: Vec<ErrorProto>,
        }

        match serde_json::from_slice::<Envelope>(body) {
            Ok(Envelope { error }) => Self {
                status,
                message: error
                    .message
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").into()),
                status_name: error.status,
                errors: error.errors,
            },
            Err(error) => {
                // this is usually a plain text/html body from a proxy, so keep it as is.
                debug!(message = "error response wasn't a json error envelope", ?error);
                let text = String::from_utf8_lossy(body);
                let message: Box<str> = match text.trim() {
                    "" => status.canonical_reason().unwrap_or("unknown error").into(),
                    trimmed => trimmed.into(),
                };

                Self::new(status, message)
            }
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{} {}", self.status.as_u16(), self.message)?;

        if let Some(ref name) = self.status_name {
            write!(formatter, " ({name})")?;
        }

        Ok(())
    }
}

impl std::error::Error for ApiError {}
