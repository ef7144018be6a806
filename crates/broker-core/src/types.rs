use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BrokerError;

/// Name under which a package is listed on the simple index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageName(String);

impl PackageName {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PackageName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PackageName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Downloadable artifact of a package. The value is the upstream asset
/// filename, e.g. `demo-1.0.0-py3-none-any.whl`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageVersion(String);

impl PackageVersion {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PackageVersion {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PackageVersion {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Process-local identity of an integration instance. Minted on construction
/// and never exposed outside the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IntegrationId(Uuid);

impl IntegrationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for IntegrationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IntegrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One package as published by one source repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    pub integration_id: IntegrationId,
    pub package_name: PackageName,
    pub package_version_list: Vec<PackageVersion>,
}

impl IndexEntry {
    pub fn contains(&self, version: &PackageVersion) -> bool {
        self.package_version_list.contains(version)
    }
}

/// Artifact body, yielded chunk by chunk as it arrives from upstream.
pub type PackageStream = Pin<Box<dyn Stream<Item = Result<Bytes, BrokerError>> + Send + 'static>>;
