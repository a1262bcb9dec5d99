//! Error types for action calls.

use std::fmt;

use http::StatusCode;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error occured while performing an action call.
#[derive(Debug, Error)]
pub enum Error {
    /// The action payload could not be serialized.
    #[error("error encoding action payload: {0}")]
    Encode(#[source] serde_json::Error),

    /// The request could not be assembled.
    #[error("invalid request: {0}")]
    Http(#[from] http::Error),

    /// An error occured while sending the request.
    #[error(transparent)]
    Request(hyperdriver::client::Error),

    /// The endpoint answered outside the envelope with a non-success status.
    #[error(transparent)]
    Response(HttpResponseError),

    /// An error occured while receiving or decoding the response body.
    #[error("error reading response body: {0}")]
    ResponseBody(#[source] BoxError),

    /// The control plane rejected the action in-band.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The call did not complete before the configured deadline.
    #[error("action {action} timed out")]
    Timeout {
        /// The action that was in flight.
        action: String,
    },
}

/// A server returned a non-success HTTP response outside the envelope.
///
/// Seen when a gateway or proxy answers instead of the control plane
/// itself; in-band rejections arrive as [`ApiError`] instead.
#[derive(Debug, Clone)]
pub struct HttpResponseError {
    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The message body of the response.
    pub message: String,
}

impl fmt::Display for HttpResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {} response: {}", self.status, self.message)
    }
}

impl std::error::Error for HttpResponseError {}

/// An in-band rejection reported inside the response envelope.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    code: String,
    message: String,
    request_id: Option<String>,
}

impl ApiError {
    /// Create a new API error.
    pub fn new<C, M>(status: StatusCode, code: C, message: M, request_id: Option<String>) -> Self
    where
        C: Into<String>,
        M: Into<String>,
    {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            request_id,
        }
    }

    /// The HTTP status the envelope arrived with.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The machine-readable rejection code, e.g. `ResourceNotFound`.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The human-readable rejection message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The request id assigned by the control plane, when present.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(request_id) = &self.request_id {
            write!(f, " (request {})", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}
