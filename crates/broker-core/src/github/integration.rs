use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use indexmap::IndexMap;

use crate::error::{BrokerError, BrokerResult};
use crate::github::api::{GithubApiConfig, GithubRepositoryApi};
use crate::github::repository::GithubRepository;
use crate::github::types::{GithubToken, RepositoryReference, RepositorySlug};
use crate::integration::Integration;
use crate::types::{IndexEntry, IntegrationId, PackageName, PackageStream, PackageVersion};

/// Settings for one GitHub integration.
#[derive(Clone, Default)]
pub struct GithubIntegrationConfig {
    pub token: Option<String>,
    pub repositories: Vec<RepositoryReference>,
    pub api: GithubApiConfig,
}

/// Index entries of the latest `get_index` call, tagged with the repository
/// that produced them.
#[derive(Debug)]
struct IndexSnapshot {
    entries: Vec<(RepositorySlug, IndexEntry)>,
}

/// GitHub releases of a fixed set of repositories, one package per repository.
pub struct GithubIntegration {
    id: IntegrationId,
    repositories: IndexMap<RepositorySlug, GithubRepository>,
    index: ArcSwapOption<IndexSnapshot>,
}

impl GithubIntegration {
    pub fn new(config: GithubIntegrationConfig) -> BrokerResult<Self> {
        let token = config
            .token
            .ok_or_else(|| BrokerError::configuration("GitHub token is not set"))
            .and_then(GithubToken::new)?;
        let api_config = Arc::new(config.api);
        let client = api_config.build_client()?;
        let id = IntegrationId::new();

        let mut repositories = IndexMap::with_capacity(config.repositories.len());
        for reference in config.repositories {
            let slug = reference.slug()?;
            if repositories.contains_key(&slug) {
                return Err(BrokerError::configuration(format!(
                    "repository {slug} already exists"
                )));
            }
            let api = GithubRepositoryApi::with_client(
                token.clone(),
                reference,
                Arc::clone(&api_config),
                client.clone(),
            );
            repositories.insert(slug, GithubRepository::new(id, api));
        }

        tracing::info!(
            integration = %id,
            repositories = repositories.len(),
            "github integration configured"
        );
        Ok(Self {
            id,
            repositories,
            index: ArcSwapOption::empty(),
        })
    }

    pub fn slugs(&self) -> impl Iterator<Item = &RepositorySlug> {
        self.repositories.keys()
    }

    /// Entries cached by the latest successful `get_index`, if any.
    pub fn cached_index(&self) -> Option<Vec<IndexEntry>> {
        self.index.load().as_ref().map(|snapshot| {
            snapshot
                .entries
                .iter()
                .map(|(_, entry)| entry.clone())
                .collect()
        })
    }
}

#[async_trait]
impl Integration for GithubIntegration {
    fn id(&self) -> IntegrationId {
        self.id
    }

    fn kind(&self) -> &'static str {
        "github"
    }

    async fn get_index(&self) -> BrokerResult<Vec<IndexEntry>> {
        let mut entries = Vec::with_capacity(self.repositories.len());
        for (slug, repository) in &self.repositories {
            let entry = repository.get_index().await?;
            entries.push((slug.clone(), entry));
        }
        let index = entries.iter().map(|(_, entry)| entry.clone()).collect();
        self.index.store(Some(Arc::new(IndexSnapshot { entries })));
        Ok(index)
    }

    async fn get_download_package(
        &self,
        package_name: &PackageName,
        package_version: &PackageVersion,
    ) -> BrokerResult<PackageStream> {
        let snapshot = self.index.load_full().ok_or(BrokerError::IndexNotLoaded)?;
        let (slug, entry) = snapshot
            .entries
            .iter()
            .find(|(_, entry)| &entry.package_name == package_name)
            .ok_or_else(|| BrokerError::PackageNotFound {
                package: package_name.to_string(),
            })?;
        if !entry.contains(package_version) {
            return Err(BrokerError::VersionNotFound {
                package: package_name.to_string(),
                version: package_version.to_string(),
            });
        }
        let repository =
            self.repositories
                .get(slug)
                .ok_or_else(|| BrokerError::PackageNotFound {
                    package: package_name.to_string(),
                })?;
        repository
            .get_download_package(package_name, package_version)
            .await
    }
}
