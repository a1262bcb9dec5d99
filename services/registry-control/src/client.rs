//! The provisioning and discovery client.

use crate::error::RegistryError;
use crate::models::{
    CreateNamespace, CreateRepository, DescribeImages, DescribeNamespaces, DescribeRepositories,
    RegistryId, TagScope,
};
use crate::paginate;
use crate::transport::ControlPlane;

/// A client for one registry instance.
///
/// An immutable handle: the registry id and page size are fixed at
/// construction and shared read-only by every operation. The client is
/// cheap to clone and safe to use from concurrent callers; each call
/// allocates its own walk state. Nothing is cached and nothing is
/// retried; every operation is a fresh set of round trips whose first
/// failure is returned as-is.
#[derive(Debug, Clone)]
pub struct RegistryClient<T> {
    transport: T,
    registry: RegistryId,
    page_size: u64,
}

impl<T> RegistryClient<T> {
    /// Create a client from a transport, a registry id and a page size.
    ///
    /// Fails with [`RegistryError::Configuration`] when `page_size` is
    /// zero. Paged walks rely on every fetch being able to make
    /// progress, so the precondition is checked here, once, rather than
    /// on every call.
    pub fn new(
        transport: T,
        registry: impl Into<RegistryId>,
        page_size: u64,
    ) -> Result<Self, RegistryError> {
        if page_size == 0 {
            return Err(RegistryError::Configuration(
                "page size must be at least 1".into(),
            ));
        }

        Ok(Self {
            transport,
            registry: registry.into(),
            page_size,
        })
    }

    /// The registry instance this client addresses.
    pub fn registry(&self) -> &RegistryId {
        &self.registry
    }

    /// Page size used for listing walks.
    pub fn page_size(&self) -> u64 {
        self.page_size
    }
}

impl<T> RegistryClient<T>
where
    T: ControlPlane,
{
    /// Whether `namespace` exists in the registry.
    ///
    /// Interprets the total of an exact-name listing: exactly one match
    /// means the namespace exists. Zero means absent, and any other
    /// total is treated as absent too; only an exact single match
    /// counts. The boolean is meaningless when an error is returned.
    #[tracing::instrument(skip(self), fields(registry = %self.registry))]
    pub async fn namespace_exists(&self, namespace: &str) -> Result<bool, RegistryError> {
        let page = self
            .transport
            .describe_namespaces(DescribeNamespaces {
                registry_id: self.registry.clone(),
                namespace_name: Some(namespace.to_owned()),
                limit: Some(1),
                offset: None,
            })
            .await?;

        tracing::trace!(total = page.total, "exact-name listing");
        Ok(page.total == 1)
    }

    /// Make sure `namespace` exists, creating it when absent.
    ///
    /// A pre-existing namespace is left untouched; the create endpoint
    /// is never contacted for it, and in particular its visibility is
    /// never altered. Auto-created namespaces are always private,
    /// whatever a caller might have wanted: a registry must not acquire
    /// publicly readable namespaces as a side effect of a push.
    ///
    /// The remote store is eventually consistent, so a create racing
    /// another writer can be rejected as already existing. That
    /// rejection surfaces as the creation error; it is not retried here.
    #[tracing::instrument(skip(self), fields(registry = %self.registry))]
    pub async fn ensure_namespace(&self, namespace: &str) -> Result<(), RegistryError> {
        if self.namespace_exists(namespace).await? {
            tracing::debug!("namespace already present, skipping create");
            return Ok(());
        }

        self.transport
            .create_namespace(CreateNamespace {
                registry_id: self.registry.clone(),
                namespace_name: namespace.to_owned(),
                // Forced. Auto-created namespaces are never public.
                is_public: false,
            })
            .await?;

        tracing::debug!("created private namespace");
        Ok(())
    }

    /// Make sure `repository` exists under `namespace`, creating it when
    /// absent.
    ///
    /// Any positive match count for the exact namespace and repository
    /// pair skips creation. The same race window as
    /// [`ensure_namespace`](Self::ensure_namespace) applies.
    #[tracing::instrument(skip(self), fields(registry = %self.registry))]
    pub async fn ensure_repository(
        &self,
        namespace: &str,
        repository: &str,
    ) -> Result<(), RegistryError> {
        let page = self
            .transport
            .describe_repositories(DescribeRepositories {
                registry_id: self.registry.clone(),
                namespace_name: Some(namespace.to_owned()),
                repository_name: Some(repository.to_owned()),
                limit: Some(1),
                offset: None,
            })
            .await?;

        if page.total > 0 {
            tracing::debug!(total = page.total, "repository already present, skipping create");
            return Ok(());
        }

        self.transport
            .create_repository(CreateRepository {
                registry_id: self.registry.clone(),
                namespace_name: namespace.to_owned(),
                repository_name: repository.to_owned(),
            })
            .await?;

        tracing::debug!("created repository");
        Ok(())
    }

    /// Every namespace name in the registry, in server order.
    #[tracing::instrument(skip(self), fields(registry = %self.registry))]
    pub async fn list_namespaces(&self) -> Result<Vec<String>, RegistryError> {
        let namespaces = paginate::collect(|offset| {
            self.transport.describe_namespaces(DescribeNamespaces {
                registry_id: self.registry.clone(),
                namespace_name: None,
                limit: Some(self.page_size),
                offset: Some(offset),
            })
        })
        .await?;

        tracing::debug!(count = namespaces.len(), "listed namespaces");
        Ok(namespaces.into_iter().map(|ns| ns.name).collect())
    }

    /// Every repository name in `namespace`, in server order.
    ///
    /// A namespace with no repositories yields an empty vec, not an
    /// error.
    #[tracing::instrument(skip(self), fields(registry = %self.registry))]
    pub async fn list_repositories(&self, namespace: &str) -> Result<Vec<String>, RegistryError> {
        let repositories = paginate::collect(|offset| {
            self.transport.describe_repositories(DescribeRepositories {
                registry_id: self.registry.clone(),
                namespace_name: Some(namespace.to_owned()),
                repository_name: None,
                limit: Some(self.page_size),
                offset: Some(offset),
            })
        })
        .await?;

        tracing::debug!(count = repositories.len(), "listed repositories");
        Ok(repositories.into_iter().map(|repo| repo.name).collect())
    }

    /// Every image tag of a repository, in server order.
    ///
    /// Accepts a plain `(namespace, repository)` pair, or
    /// [`TagScope::qualified`] when the repository name already carries
    /// its namespace and the namespace filter must stay unset.
    pub async fn list_image_tags(
        &self,
        scope: impl Into<TagScope>,
    ) -> Result<Vec<String>, RegistryError> {
        self.image_tags(scope.into()).await
    }

    #[tracing::instrument(skip(self), fields(registry = %self.registry))]
    async fn image_tags(&self, scope: TagScope) -> Result<Vec<String>, RegistryError> {
        let (namespace, repository) = scope.into_filters();

        let images = paginate::collect(|offset| {
            self.transport.describe_images(DescribeImages {
                registry_id: self.registry.clone(),
                namespace_name: namespace.clone(),
                repository_name: repository.clone(),
                limit: Some(self.page_size),
                offset: Some(offset),
            })
        })
        .await?;

        tracing::debug!(count = images.len(), "listed image tags");
        Ok(images.into_iter().map(|image| image.image_version).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::models::{ImageInfo, Namespace, RepositorySummary};
    use crate::paginate::Page;
    use crate::transport::HttpControlPlane;

    static_assertions::assert_impl_all!(
        RegistryClient<HttpControlPlane>: Send, Sync, Clone
    );
    static_assertions::assert_impl_all!(RegistryError: Send, Sync);

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        DescribeNamespaces {
            filter: Option<String>,
            limit: Option<u64>,
            offset: Option<u64>,
        },
        DescribeRepositories {
            namespace: Option<String>,
            filter: Option<String>,
            offset: Option<u64>,
        },
        DescribeImages {
            namespace: Option<String>,
            repository: String,
            offset: Option<u64>,
        },
        CreateNamespace {
            name: String,
            is_public: bool,
        },
        CreateRepository {
            namespace: String,
            name: String,
        },
    }

    type Queue<T> = Mutex<VecDeque<Result<Page<T>, rpc_client::Error>>>;

    #[derive(Debug, Default)]
    struct State {
        namespaces: Queue<Namespace>,
        repositories: Queue<RepositorySummary>,
        images: Queue<ImageInfo>,
        calls: Mutex<Vec<Call>>,
    }

    /// A scripted control plane that records every call it receives.
    #[derive(Debug, Clone, Default)]
    struct FakePlane(Arc<State>);

    impl FakePlane {
        fn namespaces(&self, page: Result<Page<Namespace>, rpc_client::Error>) -> &Self {
            self.0.namespaces.lock().unwrap().push_back(page);
            self
        }

        fn repositories(&self, page: Result<Page<RepositorySummary>, rpc_client::Error>) -> &Self {
            self.0.repositories.lock().unwrap().push_back(page);
            self
        }

        fn images(&self, page: Result<Page<ImageInfo>, rpc_client::Error>) -> &Self {
            self.0.images.lock().unwrap().push_back(page);
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.0.calls.lock().unwrap().clone()
        }

        fn creates(&self) -> usize {
            self.calls()
                .iter()
                .filter(|call| {
                    matches!(
                        call,
                        Call::CreateNamespace { .. } | Call::CreateRepository { .. }
                    )
                })
                .count()
        }
    }

    #[async_trait]
    impl ControlPlane for FakePlane {
        async fn describe_namespaces(
            &self,
            req: DescribeNamespaces,
        ) -> Result<Page<Namespace>, rpc_client::Error> {
            self.0.calls.lock().unwrap().push(Call::DescribeNamespaces {
                filter: req.namespace_name,
                limit: req.limit,
                offset: req.offset,
            });
            self.0
                .namespaces
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected DescribeNamespaces call")
        }

        async fn describe_repositories(
            &self,
            req: DescribeRepositories,
        ) -> Result<Page<RepositorySummary>, rpc_client::Error> {
            self.0
                .calls
                .lock()
                .unwrap()
                .push(Call::DescribeRepositories {
                    namespace: req.namespace_name,
                    filter: req.repository_name,
                    offset: req.offset,
                });
            self.0
                .repositories
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected DescribeRepositories call")
        }

        async fn describe_images(
            &self,
            req: DescribeImages,
        ) -> Result<Page<ImageInfo>, rpc_client::Error> {
            self.0.calls.lock().unwrap().push(Call::DescribeImages {
                namespace: req.namespace_name,
                repository: req.repository_name,
                offset: req.offset,
            });
            self.0
                .images
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected DescribeImages call")
        }

        async fn create_namespace(&self, req: CreateNamespace) -> Result<(), rpc_client::Error> {
            self.0.calls.lock().unwrap().push(Call::CreateNamespace {
                name: req.namespace_name,
                is_public: req.is_public,
            });
            Ok(())
        }

        async fn create_repository(&self, req: CreateRepository) -> Result<(), rpc_client::Error> {
            self.0.calls.lock().unwrap().push(Call::CreateRepository {
                namespace: req.namespace_name,
                name: req.repository_name,
            });
            Ok(())
        }
    }

    fn client(plane: &FakePlane, page_size: u64) -> RegistryClient<FakePlane> {
        RegistryClient::new(plane.clone(), "reg-1", page_size).unwrap()
    }

    fn namespace_page(total: u64, names: &[&str]) -> Page<Namespace> {
        Page {
            items: names
                .iter()
                .map(|name| Namespace {
                    name: (*name).to_owned(),
                })
                .collect(),
            total,
        }
    }

    fn repository_page(total: u64, names: &[&str]) -> Page<RepositorySummary> {
        Page {
            items: names
                .iter()
                .map(|name| RepositorySummary {
                    name: (*name).to_owned(),
                })
                .collect(),
            total,
        }
    }

    fn image_page(total: u64, versions: &[&str]) -> Page<ImageInfo> {
        Page {
            items: versions
                .iter()
                .map(|version| ImageInfo {
                    image_version: (*version).to_owned(),
                })
                .collect(),
            total,
        }
    }

    fn api_error() -> rpc_client::Error {
        rpc_client::Error::Api(rpc_client::ApiError::new(
            http::StatusCode::OK,
            "InternalError",
            "something broke",
            None,
        ))
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let result = RegistryClient::new(FakePlane::default(), "reg-1", 0);
        assert!(matches!(result, Err(RegistryError::Configuration(_))));
    }

    #[tokio::test]
    async fn existence_requires_exactly_one_match() {
        let plane = FakePlane::default();
        plane
            .namespaces(Ok(namespace_page(0, &[])))
            .namespaces(Ok(namespace_page(1, &["proj"])))
            .namespaces(Ok(namespace_page(2, &["proj"])));

        let client = client(&plane, 20);

        assert!(!client.namespace_exists("proj").await.unwrap());
        assert!(client.namespace_exists("proj").await.unwrap());
        // More than one match for an exact-name filter is nonsense; it
        // must read as absent, not as an error.
        assert!(!client.namespace_exists("proj").await.unwrap());

        assert_eq!(
            plane.calls()[0],
            Call::DescribeNamespaces {
                filter: Some("proj".into()),
                limit: Some(1),
                offset: None,
            }
        );
    }

    #[tokio::test]
    async fn ensure_namespace_is_idempotent() {
        let plane = FakePlane::default();
        plane
            .namespaces(Ok(namespace_page(0, &[])))
            .namespaces(Ok(namespace_page(1, &["proj"])));

        let client = client(&plane, 20);

        client.ensure_namespace("proj").await.unwrap();
        client.ensure_namespace("proj").await.unwrap();

        assert_eq!(plane.creates(), 1, "second ensure must not create again");
    }

    #[tokio::test]
    async fn auto_created_namespaces_are_private() {
        let plane = FakePlane::default();
        plane.namespaces(Ok(namespace_page(0, &[])));

        let client = client(&plane, 20);
        client.ensure_namespace("proj").await.unwrap();

        assert!(plane.calls().contains(&Call::CreateNamespace {
            name: "proj".into(),
            is_public: false,
        }));
    }

    #[tokio::test]
    async fn ensure_namespace_propagates_probe_failure() {
        let plane = FakePlane::default();
        plane.namespaces(Err(api_error()));

        let client = client(&plane, 20);
        let result = client.ensure_namespace("proj").await;

        assert!(matches!(result, Err(RegistryError::Request(_))));
        assert_eq!(plane.creates(), 0, "a failed probe must not create");
    }

    #[tokio::test]
    async fn ensure_repository_skips_existing() {
        let plane = FakePlane::default();
        plane.repositories(Ok(repository_page(1, &["app"])));

        let client = client(&plane, 20);
        client.ensure_repository("proj", "app").await.unwrap();

        assert_eq!(plane.creates(), 0);
    }

    #[tokio::test]
    async fn ensure_repository_creates_absent() {
        let plane = FakePlane::default();
        plane.repositories(Ok(repository_page(0, &[])));

        let client = client(&plane, 20);
        client.ensure_repository("proj", "app").await.unwrap();

        assert!(plane.calls().contains(&Call::CreateRepository {
            namespace: "proj".into(),
            name: "app".into(),
        }));
    }

    #[tokio::test]
    async fn list_namespaces_walks_all_pages() {
        let plane = FakePlane::default();
        plane
            .namespaces(Ok(namespace_page(3, &["a", "b"])))
            .namespaces(Ok(namespace_page(3, &["c"])));

        let client = client(&plane, 2);
        let names = client.list_namespaces().await.unwrap();

        assert_eq!(names, vec!["a", "b", "c"]);
        let offsets: Vec<_> = plane
            .calls()
            .iter()
            .filter_map(|call| match call {
                Call::DescribeNamespaces { offset, .. } => Some(*offset),
                _ => None,
            })
            .collect();
        assert_eq!(offsets, vec![Some(0), Some(2)]);
    }

    #[tokio::test]
    async fn empty_namespace_lists_no_repositories() {
        let plane = FakePlane::default();
        plane.repositories(Ok(repository_page(0, &[])));

        let client = client(&plane, 20);
        let repos = client.list_repositories("proj").await.unwrap();

        assert!(repos.is_empty());
    }

    #[tokio::test]
    async fn listing_tags_walks_item_offsets() {
        let plane = FakePlane::default();
        plane
            .images(Ok(image_page(3, &["v1", "v2"])))
            .images(Ok(image_page(3, &["v3"])));

        let client = client(&plane, 2);
        let tags = client.list_image_tags(("proj", "app")).await.unwrap();

        assert_eq!(tags, vec!["v1", "v2", "v3"]);
        assert_eq!(
            plane.calls(),
            vec![
                Call::DescribeImages {
                    namespace: Some("proj".into()),
                    repository: "app".into(),
                    offset: Some(0),
                },
                Call::DescribeImages {
                    namespace: Some("proj".into()),
                    repository: "app".into(),
                    offset: Some(2),
                },
            ]
        );
    }

    #[tokio::test]
    async fn qualified_repository_omits_namespace_filter() {
        let plane = FakePlane::default();
        plane.images(Ok(image_page(1, &["v1"])));

        let client = client(&plane, 20);
        let tags = client
            .list_image_tags(TagScope::qualified("proj/app"))
            .await
            .unwrap();

        assert_eq!(tags, vec!["v1"]);
        assert_eq!(
            plane.calls(),
            vec![Call::DescribeImages {
                namespace: None,
                repository: "proj/app".into(),
                offset: Some(0),
            }]
        );
    }

    #[tokio::test]
    async fn listing_failure_discards_partial_pages() {
        let plane = FakePlane::default();
        plane
            .namespaces(Ok(namespace_page(4, &["a", "b"])))
            .namespaces(Err(api_error()));

        let client = client(&plane, 2);
        let result = client.list_namespaces().await;

        assert!(matches!(result, Err(RegistryError::Request(_))));
    }
}
