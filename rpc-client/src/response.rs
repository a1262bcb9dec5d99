//! Responses to action calls and envelope handling.

use bytes::Bytes;
use http_body_util::BodyExt as _;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ApiError, Error, HttpResponseError};

/// A response to an action call.
///
/// Wraps the HTTP response together with the parts of the request that
/// produced it, so diagnostics can name the call that failed.
#[derive(Debug)]
pub struct Response {
    request: http::request::Parts,
    response: http::response::Parts,
    body: hyperdriver::Body,
}

impl Response {
    pub(crate) fn new(
        request: http::request::Parts,
        response: http::Response<hyperdriver::Body>,
    ) -> Self {
        let (response, body) = response.into_parts();

        Self {
            request,
            response,
            body,
        }
    }

    /// The status code of the response.
    pub fn status(&self) -> http::StatusCode {
        self.response.status
    }

    /// The headers of the response.
    pub fn headers(&self) -> &http::HeaderMap {
        &self.response.headers
    }

    /// The URI of the request that produced this response.
    pub fn uri(&self) -> &http::Uri {
        &self.request.uri
    }

    /// Collect the response body.
    pub async fn bytes(self) -> Result<Bytes, Error> {
        self.body
            .collect()
            .await
            .map(|collected| collected.to_bytes())
            .map_err(|err| Error::ResponseBody(err.into()))
    }

    /// Collect the response body as text.
    pub async fn text(self) -> Result<String, Error> {
        let bytes = self.bytes().await?;
        String::from_utf8(bytes.to_vec()).map_err(|err| Error::ResponseBody(err.into()))
    }

    /// Deserialize the action result out of the response envelope.
    ///
    /// Control planes of this dialect wrap every result in
    /// `{"Response": ...}` and report rejections in-band as an `Error`
    /// member, usually with HTTP 200. A non-success status means
    /// something other than the control plane answered and surfaces as
    /// [`Error::Response`]; an in-band rejection surfaces as
    /// [`Error::Api`].
    pub async fn deserialize<T>(self) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let status = self.status();

        if !status.is_success() {
            let message = self
                .text()
                .await
                .unwrap_or_else(|_| String::from("(unreadable body)"));
            return Err(Error::Response(HttpResponseError { status, message }));
        }

        let bytes = self.bytes().await?;
        let envelope: Envelope =
            serde_json::from_slice(&bytes).map_err(|err| Error::ResponseBody(err.into()))?;

        if let Some(error) = envelope.response.get("Error") {
            let body: ApiErrorBody = serde_json::from_value(error.clone())
                .map_err(|err| Error::ResponseBody(err.into()))?;
            let request_id = envelope
                .response
                .get("RequestId")
                .and_then(|value| value.as_str())
                .map(str::to_owned);
            return Err(ApiError::new(status, body.code, body.message, request_id).into());
        }

        serde_json::from_value(envelope.response).map_err(|err| Error::ResponseBody(err.into()))
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Response")]
    response: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiErrorBody {
    code: String,
    message: String,
}
