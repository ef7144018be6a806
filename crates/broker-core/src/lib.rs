//! Core of the PEP 503 simple-index broker.
//!
//! Package sources implement [`Integration`]; an [`IntegrationSet`] merges
//! their indexes and routes downloads back to the source that published the
//! requested file.
#![forbid(unsafe_code)]

pub mod error;
pub mod github;
pub mod integration;
pub mod set;
pub mod types;

pub use error::{BrokerError, BrokerResult, ErrorClass};
pub use integration::Integration;
pub use set::IntegrationSet;
pub use types::{IndexEntry, IntegrationId, PackageName, PackageStream, PackageVersion};
