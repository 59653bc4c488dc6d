//! Petal Core Library
//!
//! Domain types, error taxonomy, and storage ports for the Petal CMS.
//! This crate is pure data and interfaces; all I/O lives in petal-server.

pub mod error;
pub mod ports;
pub mod types;

pub use error::{CmsError, Result};
pub use types::*;
