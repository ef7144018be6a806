use crate::github::objects::Release;
use crate::types::PackageVersion;

/// Filename suffixes pip can install from a simple index.
pub const DISTRIBUTION_SUFFIXES: [&str; 2] = [".tar.gz", ".whl"];

pub fn is_distribution(file_name: &str) -> bool {
    DISTRIBUTION_SUFFIXES
        .iter()
        .any(|suffix| file_name.ends_with(suffix))
}

/// Installable versions of a release: the names of its sdist and wheel assets,
/// in asset order.
pub fn release_versions(release: &Release) -> Vec<PackageVersion> {
    release
        .assets
        .iter()
        .filter(|asset| is_distribution(&asset.name))
        .map(|asset| PackageVersion::new(asset.name.clone()))
        .collect()
}
