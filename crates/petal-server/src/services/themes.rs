//! Theme activation and deletion

use std::path::Path;
use std::sync::Arc;

use petal_core::ports::ThemeStore;
use petal_core::{CmsError, Result};
use tracing::info;

use crate::storage::SqliteStore;
use crate::ThemeRoots;

pub struct ThemeManager {
    store: Arc<SqliteStore>,
    roots: ThemeRoots,
}

impl ThemeManager {
    pub fn new(store: Arc<SqliteStore>, roots: ThemeRoots) -> Self {
        Self { store, roots }
    }

    /// Make `name` the single active theme.
    pub async fn activate(&self, name: &str) -> Result<()> {
        self.store.activate_theme(name).await?;
        info!("Activated theme: {}", name);
        Ok(())
    }

    /// Delete an inactive theme: its template and asset directories go
    /// first (absence is tolerated), then its record.
    pub async fn delete(&self, name: &str) -> Result<()> {
        let theme = self
            .store
            .get_theme_by_name(name)
            .await?
            .ok_or_else(|| CmsError::ThemeNotFound(name.to_string()))?;

        if theme.active {
            return Err(CmsError::Conflict(
                "Cannot delete an active theme. Please activate another theme first.".to_string(),
            ));
        }

        remove_dir_if_present(&self.roots.template_dir(name)).await?;
        remove_dir_if_present(&self.roots.asset_dir(name)).await?;

        self.store.delete_theme(name).await?;
        info!("Deleted theme: {}", name);
        Ok(())
    }
}

async fn remove_dir_if_present(dir: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
