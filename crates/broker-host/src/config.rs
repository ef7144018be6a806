use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_yaml_bw as serde_yaml;
use simple_broker_core::github::{
    GithubApiConfig, GithubIntegration, GithubIntegrationConfig, RepositoryReference,
};
use simple_broker_core::{Integration, IntegrationSet, PackageName};
use url::Url;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
const DEFAULT_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Process configuration: listen address plus the integrations to serve.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub integrations: Vec<IntegrationConfig>,
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    integrations: Vec<IntegrationConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrationConfig {
    Github(GithubSection),
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubSection {
    /// Environment variable holding the token; tokens never live in the file.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    pub repositories: Vec<RepositoryReference>,
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

impl BrokerConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        let file: ConfigFile = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config file {:?}", path))?;
        if file.integrations.is_empty() {
            bail!("config file {:?} declares no integrations", path);
        }
        Ok(Self {
            host: file.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: file.port.unwrap_or(DEFAULT_PORT),
            integrations: file.integrations,
            config_path: Some(path.to_path_buf()),
        })
    }

    /// Single GitHub integration described by `GITHUB_NAMESPACE`,
    /// `GITHUB_REPOSITORY_NAME` and optional `GITHUB_PACKAGE_NAME`.
    pub fn from_env() -> Self {
        let namespace = env::var("GITHUB_NAMESPACE").unwrap_or_default();
        let name = env::var("GITHUB_REPOSITORY_NAME").unwrap_or_default();
        let package_name = env::var("GITHUB_PACKAGE_NAME")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PackageName::new);
        let repository = RepositoryReference {
            namespace,
            name,
            package_name,
        };
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            integrations: vec![IntegrationConfig::Github(GithubSection {
                token_env: default_token_env(),
                api_base_url: None,
                timeout_secs: None,
                repositories: vec![repository],
            })],
            config_path: None,
        }
    }

    pub fn with_listen(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    pub fn build_integrations(&self) -> Result<IntegrationSet> {
        self.build_integrations_with(|key| env::var(key).ok())
    }

    /// Same as [`build_integrations`](Self::build_integrations) with a custom
    /// environment lookup for secrets.
    pub fn build_integrations_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<IntegrationSet> {
        let mut set = IntegrationSet::default();
        for (position, integration) in self.integrations.iter().enumerate() {
            let built: Arc<dyn Integration> = match integration {
                IntegrationConfig::Github(section) => Arc::new(
                    GithubIntegration::new(section.integration_config(&lookup)?)
                        .with_context(|| format!("invalid github integration #{position}"))?,
                ),
            };
            set.push(built);
        }
        Ok(set)
    }
}

impl GithubSection {
    fn integration_config(
        &self,
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<GithubIntegrationConfig> {
        let mut api = GithubApiConfig::default();
        if let Some(raw) = &self.api_base_url {
            let base_url = Url::parse(raw)
                .with_context(|| format!("api_base_url `{raw}` is not a valid URL"))?;
            api = api.with_base_url(base_url);
        }
        if let Some(secs) = self.timeout_secs {
            if secs == 0 {
                bail!("timeout_secs must be greater than zero");
            }
            api = api.with_timeout(Duration::from_secs(secs));
        }
        Ok(GithubIntegrationConfig {
            token: lookup(&self.token_env),
            repositories: self.repositories.clone(),
            api,
        })
    }
}
