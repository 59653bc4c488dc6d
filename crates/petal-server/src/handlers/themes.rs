//! Theme upload, activation, and deletion

use axum::{
    extract::{Multipart, Path, State},
    response::Redirect,
};
use petal_core::{CmsError, Result};

use super::{to_dashboard, Notice};
use crate::AppState;

/// Multipart field carrying the theme archive.
const UPLOAD_FIELD: &str = "theme_zip";

/// Accept a theme archive and run the import workflow.
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Redirect {
    let upload = match read_upload(&mut multipart).await {
        Ok(upload) => upload,
        Err(e) => return to_dashboard(Notice::error(e.to_string())),
    };

    match state.importer.import(upload.data, &upload.filename).await {
        Ok(name) => to_dashboard(Notice::success(format!(
            "Theme \"{name}\" uploaded successfully!"
        ))),
        Err(e) => to_dashboard(Notice::error(e.to_string())),
    }
}

struct Upload {
    filename: String,
    data: bytes::Bytes,
}

/// Pull the `theme_zip` field out of the multipart body.
async fn read_upload(multipart: &mut Multipart) -> Result<Upload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CmsError::Validation(format!("Malformed upload: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        if filename.is_empty() {
            return Err(CmsError::Validation("No selected file.".to_string()));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| CmsError::Validation(format!("Malformed upload: {e}")))?;
        return Ok(Upload { filename, data });
    }

    Err(CmsError::Validation("No file part".to_string()))
}

/// Make the named theme the active one.
pub async fn activate(State(state): State<AppState>, Path(name): Path<String>) -> Redirect {
    match state.themes.activate(&name).await {
        Ok(()) => to_dashboard(Notice::success(format!("Theme \"{name}\" activated!"))),
        Err(e) => to_dashboard(Notice::error(e.to_string())),
    }
}

/// Delete the named theme along with its directories.
pub async fn delete(State(state): State<AppState>, Path(name): Path<String>) -> Redirect {
    match state.themes.delete(&name).await {
        Ok(()) => to_dashboard(Notice::success(format!(
            "Theme \"{name}\" deleted successfully."
        ))),
        Err(e) => to_dashboard(Notice::error(e.to_string())),
    }
}
