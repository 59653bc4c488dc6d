//! Theme types

use serde::{Deserialize, Serialize};

/// An installed theme.
///
/// At most one theme is active at any time; the active theme's template
/// tree renders every page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub id: i64,
    pub name: String,
    pub active: bool,
}
