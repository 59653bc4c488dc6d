//! Public page serving

use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use percent_encoding::percent_decode_str;
use tracing::error;

use crate::AppState;

/// Serve the page stored at the request path.
///
/// Mounted as the router fallback, so every path not claimed by the
/// dashboard or the static mounts lands here. GET and POST behave
/// identically; other methods are rejected. Pages are keyed by their
/// decoded paths, so the still-encoded `Uri::path()` is percent-decoded
/// before lookup.
pub async fn serve(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    if !matches!(method, Method::GET | Method::HEAD | Method::POST) {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let path = percent_decode_str(uri.path()).decode_utf8_lossy();

    let ctx = match state.resolver.resolve(&path).await {
        Ok(ctx) => ctx,
        Err(e) if e.is_not_found() => {
            return (StatusCode::NOT_FOUND, "Page not found.").into_response();
        }
        Err(e) => {
            error!("Failed to resolve {}: {}", path, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
        }
    };

    match state.renderer.render_page(&ctx).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to render {} with theme {}: {}", path, ctx.theme, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
