//! Page types

use serde::{Deserialize, Serialize};

/// A content unit served at a unique URL path.
///
/// Pages are created through the dashboard and deleted by id; they are
/// never updated in place. The `content` field is raw markup handed to
/// the theme template untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub path: String,
    pub title: String,
    pub content: String,
}
