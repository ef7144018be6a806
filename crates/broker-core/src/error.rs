use thiserror::Error;

/// Errors raised by integrations and the integration set.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    #[error("package index has not been loaded yet")]
    IndexNotLoaded,

    #[error("package '{package}' not found")]
    PackageNotFound { package: String },

    #[error("version '{version}' of package '{package}' not found")]
    VersionNotFound { package: String, version: String },

    #[error("integration '{integration}' not registered")]
    IntegrationNotFound { integration: String },

    #[error("upstream returned HTTP {status} for {url}")]
    UpstreamStatus { status: u16, url: String },

    #[error("upstream payload from {url} is invalid: {reason}")]
    UpstreamPayload { url: String, reason: String },

    #[error("upstream request to {url} failed")]
    UpstreamTransport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("upstream request to {url} timed out")]
    UpstreamTimeout { url: String },
}

/// Coarse classification used at the request boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    Configuration,
    NotFound,
    Upstream,
}

impl BrokerError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Configuration { .. } => ErrorClass::Configuration,
            Self::IndexNotLoaded
            | Self::PackageNotFound { .. }
            | Self::VersionNotFound { .. }
            | Self::IntegrationNotFound { .. } => ErrorClass::NotFound,
            Self::UpstreamStatus { .. }
            | Self::UpstreamPayload { .. }
            | Self::UpstreamTransport { .. }
            | Self::UpstreamTimeout { .. } => ErrorClass::Upstream,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.class() == ErrorClass::NotFound
    }

    /// Status code observed from the upstream, when there was one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::UpstreamStatus { status, .. } => Some(*status),
            Self::UpstreamTransport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub(crate) fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::UpstreamTimeout { url }
        } else {
            Self::UpstreamTransport { url, source }
        }
    }
}

/// Result alias for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;
