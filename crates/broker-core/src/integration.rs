use async_trait::async_trait;

use crate::error::BrokerResult;
use crate::types::{IndexEntry, IntegrationId, PackageName, PackageStream, PackageVersion};

/// A configured package source exposed on the simple index.
///
/// Implementations cache the entries returned by the latest [`get_index`]
/// call; [`get_download_package`] resolves against that cache and fails with a
/// not-found error when no index has been loaded yet.
///
/// [`get_index`]: Integration::get_index
/// [`get_download_package`]: Integration::get_download_package
#[async_trait]
pub trait Integration: Send + Sync {
    fn id(&self) -> IntegrationId;

    /// Kind label used in logs, e.g. `github`.
    fn kind(&self) -> &'static str;

    async fn get_index(&self) -> BrokerResult<Vec<IndexEntry>>;

    async fn get_download_package(
        &self,
        package_name: &PackageName,
        package_version: &PackageVersion,
    ) -> BrokerResult<PackageStream>;
}
