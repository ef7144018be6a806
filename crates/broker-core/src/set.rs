use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;

use crate::error::{BrokerError, BrokerResult};
use crate::integration::Integration;
use crate::types::{IndexEntry, PackageName, PackageStream, PackageVersion};

/// All configured integrations, queried in configuration order.
#[derive(Clone, Default)]
pub struct IntegrationSet {
    integrations: Vec<Arc<dyn Integration>>,
}

impl IntegrationSet {
    pub fn new(integrations: Vec<Arc<dyn Integration>>) -> Self {
        Self { integrations }
    }

    pub fn push(&mut self, integration: Arc<dyn Integration>) {
        self.integrations.push(integration);
    }

    pub fn integrations(&self) -> &[Arc<dyn Integration>] {
        &self.integrations
    }

    pub fn len(&self) -> usize {
        self.integrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.integrations.is_empty()
    }

    /// Fresh index of every integration, concatenated. The first failing
    /// integration fails the whole call.
    pub async fn index(&self) -> BrokerResult<Vec<IndexEntry>> {
        let mut index = Vec::new();
        for integration in &self.integrations {
            let entries = integration.get_index().await?;
            tracing::debug!(
                integration = %integration.id(),
                kind = integration.kind(),
                entries = entries.len(),
                "integration index refreshed"
            );
            index.extend(entries);
        }
        Ok(index)
    }

    /// Distinct package names, in first-seen order.
    pub async fn list_packages(&self) -> BrokerResult<Vec<PackageName>> {
        let names: IndexSet<PackageName> = self
            .index()
            .await?
            .into_iter()
            .map(|entry| entry.package_name)
            .collect();
        Ok(names.into_iter().collect())
    }

    pub async fn list_versions(
        &self,
        package_name: &PackageName,
    ) -> BrokerResult<Vec<PackageVersion>> {
        let index = self.index().await?;
        find_entry(index, package_name).map(|entry| entry.package_version_list)
    }

    pub async fn download(
        &self,
        package_name: &PackageName,
        package_version: &PackageVersion,
    ) -> BrokerResult<PackageStream> {
        let index = self.index().await?;
        let entry = find_entry(index, package_name)?;
        if !entry.contains(package_version) {
            return Err(BrokerError::VersionNotFound {
                package: package_name.to_string(),
                version: package_version.to_string(),
            });
        }
        let integration = self
            .integrations
            .iter()
            .find(|integration| integration.id() == entry.integration_id)
            .ok_or_else(|| BrokerError::IntegrationNotFound {
                integration: entry.integration_id.to_string(),
            })?;
        integration
            .get_download_package(package_name, package_version)
            .await
    }
}

impl fmt::Debug for IntegrationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.integrations
                    .iter()
                    .map(|integration| format!("{}:{}", integration.kind(), integration.id())),
            )
            .finish()
    }
}

fn find_entry(index: Vec<IndexEntry>, package_name: &PackageName) -> BrokerResult<IndexEntry> {
    index
        .into_iter()
        .find(|entry| &entry.package_name == package_name)
        .ok_or_else(|| BrokerError::PackageNotFound {
            package: package_name.to_string(),
        })
}
