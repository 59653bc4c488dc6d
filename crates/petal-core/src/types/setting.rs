//! Setting types

use serde::{Deserialize, Serialize};

/// Name of the setting that stores the site title shown by every theme.
pub const CMS_NAME: &str = "cms_name";

/// Value seeded for [`CMS_NAME`] when the database is initialized.
pub const DEFAULT_CMS_NAME: &str = "My CMS";

/// A generic named key-value configuration entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub id: i64,
    pub name: String,
    pub value: String,
}
