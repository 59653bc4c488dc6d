//! Page resolution
//!
//! Maps a request path to everything a theme template needs: the page
//! itself, the page list for navigation, the active theme, and the CMS
//! name.

use std::sync::Arc;

use petal_core::ports::{PageStore, SettingStore, ThemeStore};
use petal_core::{CmsError, RenderContext, Result, CMS_NAME};
use tracing::debug;

use crate::storage::SqliteStore;

pub struct PageResolver {
    store: Arc<SqliteStore>,
}

impl PageResolver {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }

    /// Resolve a request path to a render context.
    ///
    /// A missing page is `PageNotFound`. A missing active theme or a
    /// missing `cms_name` setting is a `Server` error, since both are
    /// installation invariants rather than per-request conditions.
    pub async fn resolve(&self, request_path: &str) -> Result<RenderContext> {
        let path = normalize_path(request_path);
        debug!("Resolving page: {}", path);

        let page = self
            .store
            .get_page_by_path(&path)
            .await?
            .ok_or_else(|| CmsError::PageNotFound(path.clone()))?;

        let theme = self
            .store
            .get_active_theme()
            .await?
            .ok_or_else(|| CmsError::Server("no active theme".to_string()))?;

        let pages = self.store.list_pages().await?;

        let cms_name = self
            .store
            .get_setting(CMS_NAME)
            .await?
            .ok_or_else(|| CmsError::Server(format!("required setting {CMS_NAME} is missing")))?
            .value;

        Ok(RenderContext {
            title: page.title,
            content: page.content,
            pages,
            cms_name,
            theme: theme.name,
        })
    }
}

/// Normalize a request path to the canonical page key: the root is "/",
/// and every other path carries exactly one leading slash.
pub(crate) fn normalize_path(raw: &str) -> String {
    let trimmed = raw.trim_start_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_resolver() -> (tempfile::TempDir, Arc<SqliteStore>, PageResolver) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cms.db");
        let store = Arc::new(SqliteStore::open(path.to_str().unwrap()).await.unwrap());
        let resolver = PageResolver::new(store.clone());
        (dir, store, resolver)
    }

    #[tokio::test]
    async fn resolves_a_page_with_theme_and_settings() {
        let (_dir, store, resolver) = seeded_resolver().await;
        store.seed_defaults().await.unwrap();
        store
            .create_page("/faq", "FAQ", "<h1>FAQ</h1>")
            .await
            .unwrap();
        store.create_theme("plain").await.unwrap();
        store.activate_theme("plain").await.unwrap();

        let ctx = resolver.resolve("/faq").await.unwrap();

        assert_eq!(ctx.title, "FAQ");
        assert_eq!(ctx.content, "<h1>FAQ</h1>");
        assert_eq!(ctx.theme, "plain");
        assert_eq!(ctx.cms_name, "My CMS");
        assert_eq!(ctx.pages.len(), 1);
    }

    #[tokio::test]
    async fn empty_and_root_paths_resolve_to_the_home_page() {
        let (_dir, store, resolver) = seeded_resolver().await;
        store.seed_defaults().await.unwrap();
        store.create_page("/", "Home", "hi").await.unwrap();
        store.create_theme("plain").await.unwrap();
        store.activate_theme("plain").await.unwrap();

        assert_eq!(resolver.resolve("/").await.unwrap().title, "Home");
        assert_eq!(resolver.resolve("").await.unwrap().title, "Home");
    }

    #[tokio::test]
    async fn missing_page_is_not_found_even_with_an_active_theme() {
        let (_dir, store, resolver) = seeded_resolver().await;
        store.seed_defaults().await.unwrap();
        store.create_theme("plain").await.unwrap();
        store.activate_theme("plain").await.unwrap();

        let err = resolver.resolve("/nope").await.unwrap_err();
        assert!(matches!(err, CmsError::PageNotFound(_)));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn existing_page_without_an_active_theme_is_a_server_error() {
        let (_dir, store, resolver) = seeded_resolver().await;
        store.seed_defaults().await.unwrap();
        store.create_page("/faq", "FAQ", "f").await.unwrap();
        store.create_theme("plain").await.unwrap();

        let err = resolver.resolve("/faq").await.unwrap_err();
        assert!(matches!(err, CmsError::Server(_)));
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn missing_cms_name_setting_is_a_server_error() {
        let (_dir, store, resolver) = seeded_resolver().await;
        store.create_page("/faq", "FAQ", "f").await.unwrap();
        store.create_theme("plain").await.unwrap();
        store.activate_theme("plain").await.unwrap();

        let err = resolver.resolve("/faq").await.unwrap_err();
        assert!(matches!(err, CmsError::Server(_)));
    }

    #[test]
    fn normalizes_request_paths() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/about"), "/about");
        assert_eq!(normalize_path("about"), "/about");
        assert_eq!(normalize_path("/docs/intro"), "/docs/intro");
    }
}
