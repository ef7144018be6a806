//! GitHub releases as a package source.
//!
//! Every configured repository becomes one package; its `.tar.gz` and `.whl`
//! release assets become the package versions.

mod api;
mod integration;
mod objects;
mod repository;
mod types;
mod versions;

pub use api::{GITHUB_API_BASE_URL, GithubApiConfig, GithubRepositoryApi};
pub use integration::{GithubIntegration, GithubIntegrationConfig};
pub use objects::{Release, ReleaseAsset};
pub use repository::GithubRepository;
pub use types::{GithubToken, RepositoryReference, RepositorySlug};
pub use versions::{DISTRIBUTION_SUFFIXES, is_distribution, release_versions};
