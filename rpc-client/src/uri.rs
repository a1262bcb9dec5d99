//! URI utilities.

/// Serialize and Deserialize a URI to and from a string.
///
/// For use with `#[serde(with = "rpc_client::uri::serde")]` on
/// configuration fields holding an endpoint.
pub mod serde {
    use http::Uri;
    use serde::{Deserialize as _, Deserializer};

    /// Deserialize a URI from a string.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Uri, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }

    /// Serialize a URI as a string.
    pub fn serialize<S>(uri: &Uri, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(uri)
    }
}

#[cfg(test)]
mod test {
    use http::Uri;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Endpoint {
        #[serde(with = "super::serde")]
        uri: Uri,
    }

    #[test]
    fn uri_round_trips_as_string() {
        let endpoint: Endpoint =
            serde_json::from_str(r#"{"uri": "https://control.example.test/api"}"#).unwrap();
        assert_eq!(endpoint.uri.host(), Some("control.example.test"));

        let json = serde_json::to_string(&endpoint).unwrap();
        assert_eq!(json, r#"{"uri":"https://control.example.test/api"}"#);
    }

    #[test]
    fn rejects_unparseable_uri() {
        let result: Result<Endpoint, _> = serde_json::from_str(r#"{"uri": ""}"#);
        assert!(result.is_err());
    }
}
