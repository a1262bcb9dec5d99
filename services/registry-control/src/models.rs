//! Entities and action payloads for the registry control plane.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Identifies one registry instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RegistryId(Arc<str>);

impl RegistryId {
    /// Wrap a registry instance id.
    pub fn new<S>(id: S) -> Self
    where
        S: Into<String>,
    {
        RegistryId(Arc::from(id.into()))
    }
}

impl From<String> for RegistryId {
    fn from(value: String) -> Self {
        RegistryId(value.into())
    }
}

impl From<&str> for RegistryId {
    fn from(value: &str) -> Self {
        RegistryId(value.into())
    }
}

impl From<RegistryId> for String {
    fn from(value: RegistryId) -> Self {
        value.0.deref().to_owned()
    }
}

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One namespace row in a listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Namespace {
    /// The namespace name.
    pub name: String,
}

/// One repository row in a listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RepositorySummary {
    /// The repository name.
    pub name: String,
}

/// One image row in a listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageInfo {
    /// The version tag addressing this image.
    pub image_version: String,
}

/// Payload of the `DescribeNamespaces` action.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeNamespaces {
    /// Registry instance to list.
    pub registry_id: RegistryId,

    /// Exact-name filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace_name: Option<String>,

    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    /// Items to skip. An item count, not a page number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

/// Payload of the `DescribeRepositories` action.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeRepositories {
    /// Registry instance to list.
    pub registry_id: RegistryId,

    /// Namespace filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace_name: Option<String>,

    /// Exact-name filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_name: Option<String>,

    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    /// Items to skip. An item count, not a page number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

/// Payload of the `DescribeImages` action.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeImages {
    /// Registry instance to list.
    pub registry_id: RegistryId,

    /// Namespace filter. Must stay unset when `repository_name` already
    /// carries its namespace; sending both matches nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace_name: Option<String>,

    /// Repository to list images for.
    pub repository_name: String,

    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    /// Items to skip. An item count, not a page number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

/// Payload of the `CreateNamespace` action.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateNamespace {
    /// Registry instance to create in.
    pub registry_id: RegistryId,

    /// Name of the namespace to create.
    pub namespace_name: String,

    /// Whether the namespace is publicly readable.
    pub is_public: bool,
}

/// Payload of the `CreateRepository` action.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateRepository {
    /// Registry instance to create in.
    pub registry_id: RegistryId,

    /// Namespace the repository belongs to.
    pub namespace_name: String,

    /// Name of the repository to create.
    pub repository_name: String,
}

/// Which repository to list image tags for.
///
/// Some providers allow repository names that embed their namespace
/// ("team/app"). For those, the describe call must leave the namespace
/// filter unset: sending both filters silently matches nothing.
/// [`TagScope::qualified`] states that intent explicitly instead of
/// leaving it to a naming convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagScope {
    /// Repository addressed as a (namespace, repository) pair.
    Scoped {
        /// Namespace the repository lives in.
        namespace: String,
        /// Bare repository name.
        repository: String,
    },

    /// Repository name that already carries its namespace.
    Qualified(String),
}

impl TagScope {
    /// Scope a bare repository name to a namespace.
    pub fn scoped<N, R>(namespace: N, repository: R) -> Self
    where
        N: Into<String>,
        R: Into<String>,
    {
        TagScope::Scoped {
            namespace: namespace.into(),
            repository: repository.into(),
        }
    }

    /// Mark a repository name as fully qualified, omitting the namespace
    /// filter from the describe call.
    pub fn qualified<R: Into<String>>(repository: R) -> Self {
        TagScope::Qualified(repository.into())
    }

    pub(crate) fn into_filters(self) -> (Option<String>, String) {
        match self {
            TagScope::Scoped {
                namespace,
                repository,
            } => (Some(namespace), repository),
            TagScope::Qualified(repository) => (None, repository),
        }
    }
}

impl From<(&str, &str)> for TagScope {
    fn from((namespace, repository): (&str, &str)) -> Self {
        TagScope::scoped(namespace, repository)
    }
}

impl From<(String, String)> for TagScope {
    fn from((namespace, repository): (String, String)) -> Self {
        TagScope::Scoped {
            namespace,
            repository,
        }
    }
}
