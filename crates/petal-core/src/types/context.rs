//! Render context assembled by the page resolver

use serde::Serialize;

use crate::types::Page;

/// Everything a theme template needs to render one page.
///
/// `theme` is the active theme's name and selects which template tree
/// the view layer loads; `pages` is the full page list for the
/// navigation menu.
#[derive(Debug, Clone, Serialize)]
pub struct RenderContext {
    pub title: String,
    pub content: String,
    pub pages: Vec<Page>,
    pub cms_name: String,
    pub theme: String,
}
