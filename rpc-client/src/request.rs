//! Building and sending action calls.

use std::time::Duration;

use bytes::Bytes;
use http::HeaderValue;
use serde::Serialize;

use crate::response::Response;
use crate::{Authentication, Error, RpcClient, ACTION_HEADER, VERSION_HEADER};

/// Builder for a single action call.
///
/// Created by [`RpcClient::action`]. The payload defaults to an empty
/// JSON document; actions without parameters can be sent as-is.
#[derive(Debug)]
pub struct ActionBuilder<A> {
    client: RpcClient<A>,
    action: String,
    body: Bytes,
    timeout: Option<Duration>,
}

impl<A> ActionBuilder<A> {
    pub(crate) fn new(client: RpcClient<A>, action: &str) -> Self {
        Self {
            client,
            action: action.to_owned(),
            body: Bytes::from_static(b"{}"),
            timeout: None,
        }
    }

    /// Set the JSON payload for the action, replacing any previous payload.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> Result<Self, Error> {
        self.body = serde_json::to_vec(payload).map_err(Error::Encode)?.into();
        Ok(self)
    }

    /// Deadline for the whole round trip.
    ///
    /// Callers that need per-call deadlines set them here; nothing in
    /// this crate sets one by default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Send the action to the configured endpoint.
    pub async fn send(self) -> Result<Response, Error>
    where
        A: Authentication,
    {
        let req = http::Request::builder()
            .method(http::Method::POST)
            .uri(self.client.endpoint())
            .header(
                http::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )
            .header(ACTION_HEADER, self.action.as_str())
            .header(VERSION_HEADER, self.client.version())
            .body(hyperdriver::Body::from(self.body))?;

        tracing::trace!(action = %self.action, "sending action");

        if let Some(timeout) = self.timeout {
            match tokio::time::timeout(timeout, self.client.execute(req)).await {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout {
                    action: self.action,
                }),
            }
        } else {
            self.client.execute(req).await
        }
    }
}
