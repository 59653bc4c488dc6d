//! HTML rendering
//!
//! Public pages render through the active theme's `base.html`. Theme
//! templates are user-supplied, so they render non-strict and unknown
//! variables come out empty. The dashboard ships as a built-in template
//! and renders strict.

use std::path::PathBuf;

use handlebars::Handlebars;
use petal_core::{CmsError, RenderContext, Result};
use serde_json::Value;

/// Entry template every theme must provide.
const THEME_ENTRY: &str = "base.html";

/// Built-in management view.
const DASHBOARD_TEMPLATE: &str = include_str!("dashboard.hbs");

pub struct Renderer {
    templates_root: PathBuf,
}

impl Renderer {
    pub fn new(templates_root: PathBuf) -> Self {
        Self { templates_root }
    }

    /// Render a resolved page through its theme's entry template.
    pub async fn render_page(&self, ctx: &RenderContext) -> Result<String> {
        let path = self.templates_root.join(&ctx.theme).join(THEME_ENTRY);
        let template = tokio::fs::read_to_string(&path).await?;

        let hb = Handlebars::new();
        hb.render_template(&template, ctx)
            .map_err(|e| CmsError::Template(format!("theme \"{}\": {e}", ctx.theme)))
    }

    /// Render the management dashboard.
    pub fn render_dashboard(&self, ctx: &Value) -> Result<String> {
        let mut hb = Handlebars::new();
        hb.set_strict_mode(true); // fail if a variable is missing
        hb.render_template(DASHBOARD_TEMPLATE, ctx)
            .map_err(|e| CmsError::Template(format!("dashboard: {e}")))
    }
}
