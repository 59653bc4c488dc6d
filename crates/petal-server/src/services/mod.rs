//! Business logic services

pub mod importer;
pub mod resolver;
pub mod themes;

pub use importer::ThemeImporter;
pub use resolver::PageResolver;
pub use themes::ThemeManager;
