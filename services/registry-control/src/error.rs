//! Error type for registry operations.

use thiserror::Error;

/// Errors from provisioning and discovery operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The client was built from unusable settings.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A control-plane call failed.
    ///
    /// Carries the transport error verbatim, including in-band API
    /// rejections. A create racing another writer can fail with the
    /// server's already-exists rejection; it arrives here undistinguished
    /// and unretried.
    #[error(transparent)]
    Request(#[from] rpc_client::Error),
}
