use crate::error::{BrokerError, BrokerResult};
use crate::github::api::GithubRepositoryApi;
use crate::github::objects::{Release, ReleaseAsset};
use crate::github::types::RepositoryReference;
use crate::github::versions::release_versions;
use crate::types::{IndexEntry, IntegrationId, PackageName, PackageStream, PackageVersion};

/// One configured GitHub repository, published as a single package.
#[derive(Clone, Debug)]
pub struct GithubRepository {
    integration_id: IntegrationId,
    api: GithubRepositoryApi,
}

impl GithubRepository {
    pub fn new(integration_id: IntegrationId, api: GithubRepositoryApi) -> Self {
        Self {
            integration_id,
            api,
        }
    }

    pub fn reference(&self) -> &RepositoryReference {
        self.api.reference()
    }

    pub fn package_name(&self) -> PackageName {
        self.reference().package_name()
    }

    pub async fn get_index(&self) -> BrokerResult<IndexEntry> {
        let releases = self.api.retrieve_releases().await?;
        let package_version_list = releases.iter().flat_map(release_versions).collect();
        Ok(IndexEntry {
            integration_id: self.integration_id,
            package_name: self.package_name(),
            package_version_list,
        })
    }

    /// Re-reads the releases and streams the first asset named `package_version`.
    pub async fn get_download_package(
        &self,
        package_name: &PackageName,
        package_version: &PackageVersion,
    ) -> BrokerResult<PackageStream> {
        let releases = self.api.retrieve_releases().await?;
        let asset = find_asset(&releases, package_version).ok_or_else(|| {
            BrokerError::VersionNotFound {
                package: package_name.to_string(),
                version: package_version.to_string(),
            }
        })?;
        tracing::info!(
            package = %package_name,
            version = %package_version,
            asset_url = %asset.url,
            "resolved release asset"
        );
        self.api.download_asset(&asset.url).await
    }
}

fn find_asset<'a>(releases: &'a [Release], version: &PackageVersion) -> Option<&'a ReleaseAsset> {
    releases
        .iter()
        .find_map(|release| release.find_asset(version.as_str()))
}
