//! Error types for Petal

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CmsError>;

#[derive(Error, Debug)]
pub enum CmsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad or missing input: empty form fields, blank upload filenames,
    /// malformed archives.
    #[error("{0}")]
    Validation(String),

    #[error("page not found: {0}")]
    PageNotFound(String),

    #[error("theme not found: {0}")]
    ThemeNotFound(String),

    #[error("setting not found: {0}")]
    SettingNotFound(String),

    /// Uniqueness or invariant violation, e.g. a duplicate page path or
    /// deleting the active theme.
    #[error("{0}")]
    Conflict(String),

    /// Missing required configuration, e.g. no active theme.
    #[error("{0}")]
    Server(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("template error: {0}")]
    Template(String),
}

impl CmsError {
    /// True for the "referenced entity absent" class of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CmsError::PageNotFound(_) | CmsError::ThemeNotFound(_) | CmsError::SettingNotFound(_)
        )
    }
}
