//! The wire seam between the client and the control plane.

use async_trait::async_trait;
use rpc_client::{Authentication, RpcClient};
use serde::Deserialize;

use crate::models::{
    CreateNamespace, CreateRepository, DescribeImages, DescribeNamespaces, DescribeRepositories,
    ImageInfo, Namespace, RepositorySummary,
};
use crate::paginate::Page;

/// API version date of the control-plane dialect this crate speaks.
pub const API_VERSION: &str = "2019-09-24";

/// The control-plane calls consumed by [`RegistryClient`](crate::RegistryClient).
///
/// One method per remote action, each a single request/response round
/// trip. Errors pass through untouched; retries, caching and rate
/// limiting are nobody's business here. Production deployments use
/// [`HttpControlPlane`]; tests implement this trait with recording fakes.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// List namespaces of a registry, optionally filtered by exact name.
    async fn describe_namespaces(
        &self,
        req: DescribeNamespaces,
    ) -> Result<Page<Namespace>, rpc_client::Error>;

    /// List repositories, optionally filtered by namespace and exact name.
    async fn describe_repositories(
        &self,
        req: DescribeRepositories,
    ) -> Result<Page<RepositorySummary>, rpc_client::Error>;

    /// List images of a repository.
    async fn describe_images(
        &self,
        req: DescribeImages,
    ) -> Result<Page<ImageInfo>, rpc_client::Error>;

    /// Create a namespace.
    async fn create_namespace(&self, req: CreateNamespace) -> Result<(), rpc_client::Error>;

    /// Create a repository.
    async fn create_repository(&self, req: CreateRepository) -> Result<(), rpc_client::Error>;
}

/// The production transport: actions over HTTP via [`rpc_client`].
#[derive(Debug, Clone)]
pub struct HttpControlPlane<A = rpc_client::TokenAuth> {
    rpc: RpcClient<A>,
}

impl<A> HttpControlPlane<A> {
    /// Wrap an RPC client configured for the control-plane endpoint.
    pub fn new(rpc: RpcClient<A>) -> Self {
        Self { rpc }
    }

    /// Access the underlying RPC client.
    pub fn rpc(&self) -> &RpcClient<A> {
        &self.rpc
    }
}

#[async_trait]
impl<A> ControlPlane for HttpControlPlane<A>
where
    A: Authentication + Send + Sync + 'static,
{
    async fn describe_namespaces(
        &self,
        req: DescribeNamespaces,
    ) -> Result<Page<Namespace>, rpc_client::Error> {
        let listing: NamespaceListing = self
            .rpc
            .action("DescribeNamespaces")
            .payload(&req)?
            .send()
            .await?
            .deserialize()
            .await?;

        Ok(Page {
            items: listing.namespace_list,
            total: listing.total_count,
        })
    }

    async fn describe_repositories(
        &self,
        req: DescribeRepositories,
    ) -> Result<Page<RepositorySummary>, rpc_client::Error> {
        let listing: RepositoryListing = self
            .rpc
            .action("DescribeRepositories")
            .payload(&req)?
            .send()
            .await?
            .deserialize()
            .await?;

        Ok(Page {
            items: listing.repository_list,
            total: listing.total_count,
        })
    }

    async fn describe_images(
        &self,
        req: DescribeImages,
    ) -> Result<Page<ImageInfo>, rpc_client::Error> {
        let listing: ImageListing = self
            .rpc
            .action("DescribeImages")
            .payload(&req)?
            .send()
            .await?
            .deserialize()
            .await?;

        Ok(Page {
            items: listing.image_info_list,
            total: listing.total_count,
        })
    }

    async fn create_namespace(&self, req: CreateNamespace) -> Result<(), rpc_client::Error> {
        let _: Created = self
            .rpc
            .action("CreateNamespace")
            .payload(&req)?
            .send()
            .await?
            .deserialize()
            .await?;
        Ok(())
    }

    async fn create_repository(&self, req: CreateRepository) -> Result<(), rpc_client::Error> {
        let _: Created = self
            .rpc
            .action("CreateRepository")
            .payload(&req)?
            .send()
            .await?
            .deserialize()
            .await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NamespaceListing {
    #[serde(default)]
    namespace_list: Vec<Namespace>,
    total_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RepositoryListing {
    #[serde(default)]
    repository_list: Vec<RepositorySummary>,
    total_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ImageListing {
    #[serde(default)]
    image_info_list: Vec<ImageInfo>,
    total_count: u64,
}

/// Create responses carry nothing this crate needs beyond the envelope.
#[derive(Debug, Deserialize)]
struct Created {}
