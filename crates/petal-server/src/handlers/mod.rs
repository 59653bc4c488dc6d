//! HTTP handlers

pub mod dashboard;
pub mod pages;
pub mod themes;

use axum::response::Redirect;
use serde::{Deserialize, Serialize};

/// Status message carried back to the dashboard in the query string,
/// standing in for server-side flash sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Notice {
    pub kind: Option<String>,
    pub notice: Option<String>,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: Some("success".to_string()),
            notice: Some(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: Some("error".to_string()),
            notice: Some(message.into()),
        }
    }
}

/// Redirect to the dashboard with `notice` in the query string.
pub fn to_dashboard(notice: Notice) -> Redirect {
    match serde_urlencoded::to_string(&notice) {
        Ok(query) => Redirect::to(&format!("/dashboard?{query}")),
        Err(_) => Redirect::to("/dashboard"),
    }
}
