//! Storage traits for persistence
//!
//! One repository-style interface per entity; the server's SQLite store
//! implements all three. Uniqueness of page paths and theme/setting names
//! is the backing store's responsibility.

use crate::types::{Page, Setting, Theme};
use crate::Result;
use async_trait::async_trait;

/// Page store
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Fails with `Conflict` when a page already exists at `path`.
    async fn create_page(&self, path: &str, title: &str, content: &str) -> Result<Page>;
    async fn get_page_by_path(&self, path: &str) -> Result<Option<Page>>;
    async fn list_pages(&self) -> Result<Vec<Page>>;
    /// Fails with `PageNotFound` when no page has this id.
    async fn delete_page(&self, id: i64) -> Result<()>;
}

/// Theme store
#[async_trait]
pub trait ThemeStore: Send + Sync {
    /// New themes start inactive.
    async fn create_theme(&self, name: &str) -> Result<Theme>;
    async fn get_theme_by_name(&self, name: &str) -> Result<Option<Theme>>;
    async fn get_active_theme(&self) -> Result<Option<Theme>>;
    async fn list_themes(&self) -> Result<Vec<Theme>>;
    /// Clears `active` on every theme and sets it on `name`, atomically.
    /// Fails with `ThemeNotFound` (and changes nothing) when `name` does
    /// not exist.
    async fn activate_theme(&self, name: &str) -> Result<()>;
    /// Fails with `ThemeNotFound` when no theme has this name.
    async fn delete_theme(&self, name: &str) -> Result<()>;
}

/// Setting store
#[async_trait]
pub trait SettingStore: Send + Sync {
    async fn get_setting(&self, name: &str) -> Result<Option<Setting>>;
    /// Overwrites an existing setting's value; fails with
    /// `SettingNotFound` when the row does not exist.
    async fn update_setting(&self, name: &str, value: &str) -> Result<()>;
}
