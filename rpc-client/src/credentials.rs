//! Credential material for control-plane clients.

use std::{borrow::Cow, env::VarError, fmt, ops::Deref};

use http::{header::InvalidHeaderValue, HeaderValue};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// An API token for a control plane.
///
/// The wrapper keeps the token out of debug reprs, and owned storage is
/// zeroized on drop. Use [`ApiKey::revealed`] to get the underlying value.
#[derive(Clone, Deserialize, Serialize)]
#[serde(from = "String")]
pub struct ApiKey(Cow<'static, str>);

impl ApiKey {
    /// Read the token from an environment variable.
    pub fn from_env(var: &str) -> Result<Self, VarError> {
        let value = std::env::var(var)?;
        Ok(ApiKey(value.into()))
    }

    /// Expose the underlying token material.
    pub fn revealed(&self) -> &str {
        self.0.deref()
    }

    /// Render the token as a sensitive header value.
    pub fn to_header(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut header = HeaderValue::try_from(self.revealed())?;
        header.set_sensitive(true);
        Ok(header)
    }

    /// Render the token as a `Bearer` authorization header value.
    pub fn bearer(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut header = HeaderValue::try_from(format!("Bearer {}", self.revealed()))?;
        header.set_sensitive(true);
        Ok(header)
    }
}

impl Drop for ApiKey {
    fn drop(&mut self) {
        if let Cow::Owned(ref mut s) = self.0 {
            s.zeroize()
        }
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

impl From<Cow<'static, str>> for ApiKey {
    fn from(inner: Cow<'static, str>) -> Self {
        ApiKey(inner)
    }
}

impl From<String> for ApiKey {
    fn from(value: String) -> Self {
        ApiKey(value.into())
    }
}

impl From<&'static str> for ApiKey {
    fn from(value: &'static str) -> Self {
        ApiKey(value.into())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn token_hidden_from_debug() {
        let key = ApiKey::from("hunter2");

        assert!(!format!("{key:?}").contains("hunter2"));
        assert_eq!(&format!("{key:?}"), "ApiKey(****)");
        assert_eq!(key.revealed(), "hunter2");
    }

    #[test]
    fn bearer_header_is_sensitive() {
        let key = ApiKey::from("hunter2");
        let header = key.bearer().unwrap();

        assert!(header.is_sensitive());
        assert_eq!(header.to_str().unwrap(), "Bearer hunter2");
    }
}
