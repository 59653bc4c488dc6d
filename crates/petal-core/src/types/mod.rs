//! Domain types

pub mod context;
pub mod page;
pub mod setting;
pub mod theme;

pub use context::RenderContext;
pub use page::Page;
pub use setting::{Setting, CMS_NAME, DEFAULT_CMS_NAME};
pub use theme::Theme;
