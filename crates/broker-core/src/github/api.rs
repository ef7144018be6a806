use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt, stream};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use url::Url;

use crate::error::{BrokerError, BrokerResult};
use crate::github::objects::Release;
use crate::github::types::{GithubToken, RepositoryReference};
use crate::types::PackageStream;

pub const GITHUB_API_BASE_URL: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";
const GITHUB_JSON: &str = "application/vnd.github+json";
const OCTET_STREAM: &str = "application/octet-stream";
const RELEASES_PER_PAGE: &str = "100";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Endpoint and transport settings shared by every repository of an integration.
#[derive(Clone, Debug)]
pub struct GithubApiConfig {
    pub base_url: Url,
    /// Bound on the list call, on receiving download headers, and on the gap
    /// between two download chunks.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for GithubApiConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(GITHUB_API_BASE_URL).expect("static GitHub API URL is valid"),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: concat!("simple-broker/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl GithubApiConfig {
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build_client(&self) -> BrokerResult<Client> {
        Client::builder()
            .user_agent(&self.user_agent)
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|err| {
                BrokerError::configuration(format!("failed to build HTTP client: {err}"))
            })
    }
}

/// REST client bound to one repository.
#[derive(Clone, Debug)]
pub struct GithubRepositoryApi {
    token: GithubToken,
    reference: RepositoryReference,
    config: Arc<GithubApiConfig>,
    client: Client,
}

impl GithubRepositoryApi {
    pub fn new(token: GithubToken, reference: RepositoryReference) -> BrokerResult<Self> {
        let config = GithubApiConfig::default();
        let client = config.build_client()?;
        Ok(Self::with_client(token, reference, Arc::new(config), client))
    }

    pub fn with_client(
        token: GithubToken,
        reference: RepositoryReference,
        config: Arc<GithubApiConfig>,
        client: Client,
    ) -> Self {
        Self {
            token,
            reference,
            config,
            client,
        }
    }

    pub fn reference(&self) -> &RepositoryReference {
        &self.reference
    }

    pub fn releases_url(&self) -> BrokerResult<Url> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                BrokerError::configuration(format!(
                    "GitHub API base URL `{}` cannot carry a path",
                    self.config.base_url
                ))
            })?
            .pop_if_empty()
            .extend([
                "repos",
                self.reference.namespace.as_str(),
                self.reference.name.as_str(),
                "releases",
            ]);
        url.query_pairs_mut()
            .append_pair("per_page", RELEASES_PER_PAGE);
        Ok(url)
    }

    /// Lists the repository releases. Anything but `200 OK` is an upstream error.
    pub async fn retrieve_releases(&self) -> BrokerResult<Vec<Release>> {
        let url = self.releases_url()?;
        let response = self
            .client
            .get(url.clone())
            .header(AUTHORIZATION, self.token.bearer())
            .header(ACCEPT, GITHUB_JSON)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|err| BrokerError::transport(url.as_str(), err))?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(
                namespace = %self.reference.namespace,
                repository = %self.reference.name,
                status = status.as_u16(),
                "github list releases failed"
            );
            return Err(BrokerError::UpstreamStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| BrokerError::transport(url.as_str(), err))?;
        let releases: Vec<Release> =
            serde_json::from_slice(&body).map_err(|err| BrokerError::UpstreamPayload {
                url: url.to_string(),
                reason: err.to_string(),
            })?;
        tracing::debug!(
            namespace = %self.reference.namespace,
            repository = %self.reference.name,
            releases = releases.len(),
            "github releases retrieved"
        );
        Ok(releases)
    }

    /// Streams the asset at `url`. The body is not buffered; dropping the
    /// returned stream closes the upstream response.
    pub async fn download_asset(&self, url: &str) -> BrokerResult<PackageStream> {
        let request = self
            .client
            .get(url)
            .header(AUTHORIZATION, self.token.bearer())
            .header(ACCEPT, OCTET_STREAM)
            .send();
        let response = tokio::time::timeout(self.config.timeout, request)
            .await
            .map_err(|_| BrokerError::UpstreamTimeout {
                url: url.to_string(),
            })?
            .map_err(|err| BrokerError::transport(url, err))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url, status = status.as_u16(), "github asset download failed");
            return Err(BrokerError::UpstreamStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        tracing::debug!(url, length = ?response.content_length(), "streaming github asset");
        Ok(chunked_body(
            response.bytes_stream(),
            url.to_string(),
            self.config.timeout,
        ))
    }
}

/// Maps the reqwest body onto broker errors and fails the stream when no chunk
/// arrives within `idle`. The stream ends after the first error.
fn chunked_body<S>(body: S, url: String, idle: Duration) -> PackageStream
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    let body = Box::pin(body);
    Box::pin(stream::unfold(Some((body, url)), move |state| async move {
        let (mut body, url) = state?;
        match tokio::time::timeout(idle, body.next()).await {
            Ok(Some(Ok(chunk))) => Some((Ok(chunk), Some((body, url)))),
            Ok(Some(Err(err))) => Some((Err(BrokerError::transport(url, err)), None)),
            Ok(None) => None,
            Err(_) => Some((Err(BrokerError::UpstreamTimeout { url }), None)),
        }
    }))
}
