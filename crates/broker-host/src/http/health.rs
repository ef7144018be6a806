use axum::Json;

/// Liveness probe; does not touch any integration.
pub async fn handler() -> Json<&'static str> {
    Json("OK")
}
