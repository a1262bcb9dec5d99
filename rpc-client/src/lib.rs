//! A client for action-dispatch JSON control-plane APIs.
//!
//! Control planes of this family expose a single HTTP endpoint and
//! multiplex every operation through an action name carried in a request
//! header, with a JSON payload and a versioned dialect. Responses come
//! back wrapped in a `{"Response": ...}` envelope which reports failures
//! in-band, usually with HTTP 200.
//!
//! [`RpcClient`] is the useful inner object for individual service
//! clients to wrap: it owns the endpoint, a swappable [`Authentication`]
//! mechanism and the underlying HTTP service.

use std::sync::Arc;

use arc_swap::ArcSwap;
use arc_swap::Guard;
use http::Uri;
use hyperdriver::service::SharedService;
use tower::ServiceExt;

mod authentication;
mod credentials;
pub mod error;
mod request;
pub mod response;
pub mod uri;

pub use self::authentication::{
    basic_auth, Authentication, AuthenticationLayer, AuthenticationService, TokenAuth,
};
pub use self::credentials::ApiKey;
pub use self::error::{ApiError, Error, HttpResponseError};
pub use self::request::ActionBuilder;
use self::response::Response;

/// Header carrying the action name of a call.
pub const ACTION_HEADER: &str = "x-api-action";

/// Header carrying the API version date of a call.
pub const VERSION_HEADER: &str = "x-api-version";

/// A client for one control-plane endpoint.
///
/// Cheap to clone; clones share the endpoint, the authentication and the
/// connection pool.
#[derive(Debug, Clone)]
pub struct RpcClient<A> {
    endpoint: Arc<ArcSwap<Uri>>,
    version: Arc<str>,
    inner: hyperdriver::client::SharedClientService<hyperdriver::Body>,
    authentication: Arc<ArcSwap<A>>,
}

impl<A> RpcClient<A>
where
    A: Authentication + Send + Sync + 'static,
{
    /// Create a new client from an endpoint, an API version date and an
    /// authentication method.
    pub fn new(endpoint: Uri, version: &str, authentication: A) -> Self {
        let authentication = Arc::new(ArcSwap::new(Arc::new(authentication)));
        let inner = hyperdriver::Client::build_tcp_http()
            .with_default_tls()
            .layer(AuthenticationLayer::new(authentication.clone()))
            .build_service();

        RpcClient {
            endpoint: Arc::new(ArcSwap::new(Arc::new(endpoint))),
            version: Arc::from(version),
            inner,
            authentication,
        }
    }

    /// Create a new client over an arbitrary inner service.
    ///
    /// Used by tests to substitute a canned transport for the real one.
    pub fn new_with_inner_service<S>(
        endpoint: Uri,
        version: &str,
        authentication: A,
        inner: S,
    ) -> Self
    where
        S: tower::Service<
                hyperdriver::body::Request,
                Response = hyperdriver::body::Response,
                Error = hyperdriver::client::Error,
            > + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        let authentication = Arc::new(ArcSwap::new(Arc::new(authentication)));

        let service = tower::ServiceBuilder::new()
            .layer(SharedService::layer())
            .layer(AuthenticationLayer::new(authentication.clone()))
            .service(inner);

        RpcClient {
            endpoint: Arc::new(ArcSwap::new(Arc::new(endpoint))),
            version: Arc::from(version),
            inner: service,
            authentication,
        }
    }

    /// Point the client at a different endpoint.
    pub fn set_endpoint(&self, endpoint: Uri) {
        self.endpoint.store(Arc::new(endpoint));
    }

    /// Replace the authentication mechanism, e.g. after a token refresh.
    pub fn refresh_auth(&self, authentication: A) {
        self.authentication.store(Arc::new(authentication));
    }

    /// Access the authentication mechanism currently in use.
    pub fn auth(&self) -> Guard<Arc<A>> {
        self.authentication.as_ref().load()
    }
}

impl RpcClient<TokenAuth> {
    /// Create a new client authenticated with an API token.
    pub fn new_token_auth<K: Into<ApiKey>>(endpoint: Uri, version: &str, key: K) -> Self {
        Self::new(endpoint, version, TokenAuth::new(key.into()))
    }
}

impl<A> RpcClient<A>
where
    A: Authentication,
{
    /// Start a call to the named action.
    pub fn action(&self, name: &str) -> ActionBuilder<A> {
        ActionBuilder::new(self.clone(), name)
    }

    pub(crate) fn endpoint(&self) -> Uri {
        (*self.endpoint.load_full()).clone()
    }

    pub(crate) fn version(&self) -> &str {
        &self.version
    }

    /// Send a raw request through the underlying service.
    pub async fn execute(&self, req: hyperdriver::body::Request) -> Result<Response, Error> {
        let parts = request_parts(&req);

        let response = self
            .inner
            .clone()
            .oneshot(req)
            .await
            .map_err(Error::Request)?;
        Ok(Response::new(parts, response))
    }
}

fn request_parts<B>(req: &http::Request<B>) -> http::request::Parts {
    let mut builder = http::Request::builder()
        .uri(req.uri().clone())
        .method(req.method().clone());

    if let Some(headers) = builder.headers_mut() {
        *headers = req.headers().clone();
    }

    let (parts, _) = builder
        .body(())
        .expect("cloned request parts are valid")
        .into_parts();
    parts
}

pub mod mock {
    //! Canned control-plane responses for tests.
    //!
    //! [`MockService`] is a tower service that dispatches on the action
    //! header and serves queued responses in order, so a test can script
    //! a whole pagination walk. Clones share the queue.

    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    use bytes::Bytes;
    use http::response;

    /// One canned response.
    #[derive(Debug, Clone)]
    pub struct MockResponse {
        status: http::StatusCode,
        body: Vec<u8>,
    }

    impl MockResponse {
        /// A response with an explicit status.
        pub fn new(status: http::StatusCode, body: Vec<u8>) -> Self {
            Self { status, body }
        }

        /// A 200 response with the given body.
        pub fn ok(body: Vec<u8>) -> Self {
            Self::new(http::StatusCode::OK, body)
        }
    }

    /// A scriptable stand-in for a control-plane endpoint.
    #[derive(Debug, Default, Clone)]
    pub struct MockService {
        responses: Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>,
    }

    impl MockService {
        /// Create an empty mock.
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a response for an action. Responses queued for the same
        /// action are served in order.
        pub fn enqueue(&self, action: &str, response: MockResponse) {
            self.responses
                .lock()
                .expect("mock state")
                .entry(action.to_owned())
                .or_default()
                .push_back(response);
        }

        /// How many queued responses have not been served yet.
        pub fn remaining(&self) -> usize {
            self.responses
                .lock()
                .expect("mock state")
                .values()
                .map(VecDeque::len)
                .sum()
        }
    }

    impl tower::Service<hyperdriver::body::Request> for MockService {
        type Response = hyperdriver::body::Response;
        type Error = hyperdriver::client::Error;
        type Future = std::future::Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(
            &mut self,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Result<(), Self::Error>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: hyperdriver::body::Request) -> Self::Future {
            let action = req
                .headers()
                .get(crate::ACTION_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default()
                .to_owned();

            let response = self
                .responses
                .lock()
                .expect("mock state")
                .get_mut(&action)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| panic!("no response queued for action: {action}"));

            let response = response::Builder::new()
                .status(response.status)
                .version(http::Version::HTTP_11)
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(hyperdriver::Body::from(Bytes::from(response.body)))
                .expect("mock response is valid");

            std::future::ready(Ok(response))
        }
    }
}
