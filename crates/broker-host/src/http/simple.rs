use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{Html, IntoResponse, Response};
use simple_broker_core::{PackageName, PackageVersion};

use crate::html::{HtmlListItem, HtmlListRenderer};
use crate::http::error::ApiError;
use crate::server::ServerState;

const OCTET_STREAM: &str = "application/octet-stream";

pub async fn index(State(state): State<ServerState>) -> Result<Html<String>, ApiError> {
    let packages = state.integrations.list_packages().await?;
    let items = packages
        .iter()
        .map(|package| HtmlListItem::new(package.as_str(), format!("/simple/{package}")));
    Ok(HtmlListRenderer::new(Some("Index")).add_items(items).render())
}

pub async fn package(
    State(state): State<ServerState>,
    Path(package_name): Path<String>,
) -> Result<Html<String>, ApiError> {
    let package_name = PackageName::new(package_name);
    let versions = state.integrations.list_versions(&package_name).await?;
    let items = versions.iter().map(|version| {
        HtmlListItem::new(
            version.as_str(),
            format!("/simple/{package_name}/{version}"),
        )
    });
    Ok(HtmlListRenderer::new(Some(package_name.as_str()))
        .add_items(items)
        .render())
}

pub async fn download(
    State(state): State<ServerState>,
    Path((package_name, package_version)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let package_name = PackageName::new(package_name);
    let package_version = PackageVersion::new(package_version);
    let stream = state
        .integrations
        .download(&package_name, &package_version)
        .await?;
    tracing::info!(package = %package_name, version = %package_version, "streaming package");

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM));
    if let Ok(value) =
        HeaderValue::from_str(&format!("attachment; filename=\"{package_version}\""))
    {
        headers.insert(CONTENT_DISPOSITION, value);
    }
    Ok((headers, Body::from_stream(stream)).into_response())
}
