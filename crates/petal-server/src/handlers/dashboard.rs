//! Dashboard view and form commands

use axum::{
    extract::{Form, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use petal_core::ports::{PageStore, SettingStore, ThemeStore};
use petal_core::{CmsError, Result, CMS_NAME};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use super::{to_dashboard, Notice};
use crate::AppState;

/// Render the management view with pages, themes, and the CMS name.
pub async fn show(State(state): State<AppState>, Query(notice): Query<Notice>) -> Response {
    let ctx = match dashboard_context(&state, &notice).await {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Failed to load dashboard: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
        }
    };

    match state.renderer.render_dashboard(&ctx) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to render dashboard: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

async fn dashboard_context(state: &AppState, notice: &Notice) -> Result<Value> {
    let pages = state.store.list_pages().await?;
    let themes = state.store.list_themes().await?;
    let cms_name = state
        .store
        .get_setting(CMS_NAME)
        .await?
        .ok_or_else(|| CmsError::Server(format!("required setting {CMS_NAME} is missing")))?
        .value;

    Ok(json!({
        "cms_name": cms_name,
        "pages": pages,
        "themes": themes,
        "kind": notice.kind,
        "notice": notice.notice,
    }))
}

/// One dashboard form posts every command, discriminated by `form_type`.
#[derive(Debug, Deserialize)]
pub struct DashboardForm {
    form_type: Option<String>,
    path: Option<String>,
    title: Option<String>,
    content: Option<String>,
    cms_name: Option<String>,
}

/// Dispatch a dashboard command. Success or failure, the user lands back
/// on the dashboard; unrecognized commands redirect without a notice.
pub async fn dispatch(State(state): State<AppState>, Form(form): Form<DashboardForm>) -> Redirect {
    let result = match form.form_type.as_deref() {
        Some("add_page") => add_page(&state, &form).await,
        Some("update_cms_name") => update_cms_name(&state, &form).await,
        _ => return Redirect::to("/dashboard"),
    };

    match result {
        Ok(message) => to_dashboard(Notice::success(message)),
        Err(e) => to_dashboard(Notice::error(e.to_string())),
    }
}

async fn add_page(state: &AppState, form: &DashboardForm) -> Result<String> {
    let path = form.path.as_deref().unwrap_or("");
    let title = form.title.as_deref().unwrap_or("");
    let content = form.content.as_deref().unwrap_or("");

    if path.is_empty() || title.is_empty() || content.is_empty() {
        return Err(CmsError::Validation("All fields are required!".to_string()));
    }

    if state.store.get_page_by_path(path).await?.is_some() {
        return Err(CmsError::Conflict(
            "A page with this path already exists!".to_string(),
        ));
    }

    state.store.create_page(path, title, content).await?;
    Ok("Page added successfully!".to_string())
}

async fn update_cms_name(state: &AppState, form: &DashboardForm) -> Result<String> {
    let value = form.cms_name.as_deref().unwrap_or("");
    state.store.update_setting(CMS_NAME, value).await?;
    Ok("CMS name updated successfully!".to_string())
}

/// Hard-delete a page by id.
pub async fn delete_page(State(state): State<AppState>, Path(id): Path<i64>) -> Redirect {
    match state.store.delete_page(id).await {
        Ok(()) => to_dashboard(Notice::success("Page deleted successfully!")),
        Err(e) => to_dashboard(Notice::error(e.to_string())),
    }
}

/// Idempotent bootstrap: create missing tables and seed the `cms_name`
/// setting.
pub async fn init_db(State(state): State<AppState>) -> Redirect {
    let result = async {
        state.store.init_schema().await?;
        state.store.seed_defaults().await
    }
    .await;

    match result {
        Ok(()) => to_dashboard(Notice::success("Database initialized!")),
        Err(e) => to_dashboard(Notice::error(e.to_string())),
    }
}
