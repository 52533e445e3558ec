//! # formidable-core
//!
//! Core types for the formidable form-binding library. This crate has no
//! dependency on the form engine and provides the foundation for it.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`value`] - The dynamically-typed [`Value`] used for field values and objects
//! - [`utils`] - Utility types (`MultiValueDict`)
//! - [`settings`] - Library settings and global configuration
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use error::{FieldError, FormError, FormResult, ParseError};
pub use settings::{Settings, SETTINGS};
pub use utils::MultiValueDict;
pub use value::Value;
