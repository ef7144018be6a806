#![forbid(unsafe_code)]

pub mod config;
pub mod html;
pub mod http;
pub mod server;
pub mod telemetry;

pub use config::{BrokerConfig, IntegrationConfig};
pub use server::{HostServer, ServerState, router};
