use serde::Deserialize;

/// Asset attached to a GitHub release.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    /// API URL; serves the binary when requested with `Accept: application/octet-stream`.
    pub url: String,
    pub name: String,
    /// `sha256:<hex>`; GitHub leaves it null on assets uploaded before digests existed.
    pub digest: Option<String>,
    pub browser_download_url: String,
    pub content_type: String,
}

/// Entry of the GitHub "list releases" response.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub tag_name: String,
    pub name: Option<String>,
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    pub fn find_asset(&self, file_name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| asset.name == file_name)
    }
}
