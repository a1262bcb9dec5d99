//! Authentication for control-plane clients.
//!
//! The `Authentication` trait decorates outgoing requests with whatever
//! credentials the control plane expects. Two implementations are
//! provided: [`TokenAuth`] for bearer-token endpoints and `()` for
//! unauthenticated use (local stubs, tests).

use std::sync::Arc;

use arc_swap::ArcSwap;
use http::HeaderValue;
use tower::layer::Layer;

use crate::credentials::ApiKey;

/// Create a basic authentication header value, with the password being optional.
///
/// # Example
/// ```rust
/// use rpc_client::basic_auth;
///
/// let header = basic_auth("username", Some("password"));
/// assert_eq!(header.to_str().unwrap(), "Basic dXNlcm5hbWU6cGFzc3dvcmQ=");
/// ```
pub fn basic_auth<U, P>(username: U, password: Option<P>) -> HeaderValue
where
    U: std::fmt::Display,
    P: std::fmt::Display,
{
    use base64::prelude::BASE64_STANDARD;
    use base64::write::EncoderWriter;
    use std::io::Write;

    let mut buf = b"Basic ".to_vec();
    {
        let mut encoder = EncoderWriter::new(&mut buf, &BASE64_STANDARD);
        let _ = write!(encoder, "{}:", username);
        if let Some(password) = password {
            let _ = write!(encoder, "{}", password);
        }
    }
    let mut header = HeaderValue::from_bytes(&buf).expect("base64 is always a valid HeaderValue");
    header.set_sensitive(true);
    header
}

/// Trait to represent authenticating with a control plane.
pub trait Authentication: Clone {
    /// Called by the [`RpcClient`](crate::RpcClient) on every outgoing request.
    fn authenticate<B>(&self, req: http::Request<B>) -> http::Request<B>;
}

/// Authentication with an API token sent as a bearer credential.
///
/// The token is stored as an [`ApiKey`] so it stays out of logs.
#[derive(Debug, Clone)]
pub struct TokenAuth(ApiKey);

impl TokenAuth {
    /// Create a new token authentication with a given key.
    pub fn new<K: Into<ApiKey>>(key: K) -> Self {
        TokenAuth(key.into())
    }

    /// Get the header value for the token.
    pub fn header_value(&self) -> HeaderValue {
        self.0
            .bearer()
            .expect("api token is a valid HTTP header value")
    }
}

impl Authentication for TokenAuth {
    fn authenticate<B>(&self, mut req: http::Request<B>) -> http::Request<B> {
        if !req.headers().contains_key(http::header::AUTHORIZATION) {
            let headers = req.headers_mut();
            headers.append(http::header::AUTHORIZATION, self.header_value());
        } else {
            tracing::warn!("{} header already set", http::header::AUTHORIZATION);
        }
        req
    }
}

impl Authentication for () {
    fn authenticate<B>(&self, req: http::Request<B>) -> http::Request<B> {
        req
    }
}

/// A layer to provide a swappable authentication mechanism.
///
/// Lets users refresh credentials without recreating the client.
#[derive(Debug)]
pub struct AuthenticationLayer<A> {
    auth: Arc<ArcSwap<A>>,
}

impl<A> Clone for AuthenticationLayer<A> {
    fn clone(&self) -> Self {
        Self {
            auth: self.auth.clone(),
        }
    }
}

impl<A> AuthenticationLayer<A> {
    pub(crate) fn new(auth: Arc<ArcSwap<A>>) -> Self {
        Self { auth }
    }
}

impl<A, S> Layer<S> for AuthenticationLayer<A> {
    type Service = AuthenticationService<A, S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthenticationService::new(inner, self.auth.clone())
    }
}

/// A service to provide a swappable authentication mechanism.
#[derive(Debug)]
pub struct AuthenticationService<A, S> {
    inner: S,
    auth: Arc<ArcSwap<A>>,
}

impl<A, S: Clone> Clone for AuthenticationService<A, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            auth: self.auth.clone(),
        }
    }
}

impl<A, S> AuthenticationService<A, S> {
    pub(crate) fn new(inner: S, auth: Arc<ArcSwap<A>>) -> Self {
        Self { inner, auth }
    }

    /// Set the authentication object, replacing the one currently in use.
    pub fn set_auth(&self, auth: A) {
        self.auth.store(Arc::new(auth));
    }
}

impl<A, S, BIn, BOut> tower::Service<http::Request<BIn>> for AuthenticationService<A, S>
where
    A: Authentication,
    S: tower::Service<http::Request<BIn>, Response = http::Response<BOut>>,
    S::Future: Send + 'static,
{
    type Response = http::Response<BOut>;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: http::Request<BIn>) -> Self::Future {
        let req = self.auth.load().authenticate(req);
        self.inner.call(req)
    }
}
