//! Provisioning and discovery for container-registry control planes.
//!
//! A registry instance groups repositories into namespaces; repositories
//! hold image tags. Before a push, the namespace and repository must
//! exist; this crate makes sure they do, and enumerates what a registry
//! already holds.
//!
//! [`RegistryClient`] is the entry point. It is an immutable handle (a
//! registry id, a page size and a transport) and every operation is a
//! fresh set of round trips; nothing is cached. Listings are walked to
//! completion through [`paginate::collect`], which tolerates totals that
//! drift while the walk is in flight.
//!
//! The control plane itself is reached through the [`ControlPlane`]
//! trait; production deployments use [`HttpControlPlane`] over
//! [`rpc_client`], tests swap in fakes.
//!
//! ```no_run
//! # async fn demo() -> Result<(), registry_control::RegistryError> {
//! let config = registry_control::RegistryConfiguration::from_env()?;
//! let client = config.client()?;
//!
//! client.ensure_namespace("team").await?;
//! client.ensure_repository("team", "app").await?;
//!
//! for tag in client.list_image_tags(("team", "app")).await? {
//!     println!("{tag}");
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod models;
pub mod paginate;
pub mod transport;

pub use self::client::RegistryClient;
pub use self::config::{RegistryConfiguration, DEFAULT_PAGE_SIZE};
pub use self::error::RegistryError;
pub use self::models::{
    CreateNamespace, CreateRepository, DescribeImages, DescribeNamespaces, DescribeRepositories,
    ImageInfo, Namespace, RegistryId, RepositorySummary, TagScope,
};
pub use self::paginate::Page;
pub use self::transport::{ControlPlane, HttpControlPlane, API_VERSION};
