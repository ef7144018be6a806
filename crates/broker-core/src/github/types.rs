use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BrokerError, BrokerResult};
use crate::types::PackageName;

/// Bearer token sent to the GitHub API.
#[derive(Clone, PartialEq, Eq)]
pub struct GithubToken(String);

impl GithubToken {
    /// Strips surrounding whitespace, such as the trailing newline of a token
    /// read from a file or an env var, then rejects what is left if empty.
    pub fn new(value: impl Into<String>) -> BrokerResult<Self> {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            return Err(BrokerError::configuration("GitHub token must not be empty"));
        }
        Ok(Self(value))
    }

    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for GithubToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GithubToken(***)")
    }
}

/// `{namespace}/{name}` key of a repository inside one integration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RepositorySlug(String);

impl RepositorySlug {
    pub fn new(namespace: &str, name: &str) -> BrokerResult<Self> {
        if namespace.is_empty() || name.is_empty() {
            return Err(BrokerError::configuration(format!(
                "repository namespace and name must be set (got `{namespace}/{name}`)"
            )));
        }
        Ok(Self(format!("{namespace}/{name}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepositorySlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One configured upstream repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryReference {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub package_name: Option<PackageName>,
}

impl RepositoryReference {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            package_name: None,
        }
    }

    pub fn with_package_name(mut self, package_name: impl Into<PackageName>) -> Self {
        self.package_name = Some(package_name.into());
        self
    }

    pub fn slug(&self) -> BrokerResult<RepositorySlug> {
        RepositorySlug::new(&self.namespace, &self.name)
    }

    /// Package name published on the index; falls back to the repository name
    /// when no non-empty override is configured.
    pub fn package_name(&self) -> PackageName {
        self.package_name
            .as_ref()
            .filter(|name| !name.is_empty())
            .cloned()
            .unwrap_or_else(|| PackageName::new(self.name.clone()))
    }
}
