//! # formidable
//!
//! Binds flat, bracket-keyed form data to nested, validated form trees.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. You can depend on `formidable` to get everything, or depend on
//! individual crates for finer-grained control.
//!
//! ```
//! use formidable::prelude::*;
//!
//! let skill = FormSchema::builder("Skill")
//!     .field("name", FieldSpec::scalar(Text::default()))
//!     .build()
//!     .unwrap();
//! let schema = FormSchema::builder("Person")
//!     .field("name", FieldSpec::scalar(Text::default()))
//!     .field("tags", FieldSpec::scalar(List::default()).required(false))
//!     .field("skills", FieldSpec::form_set(skill).min_items(1))
//!     .build()
//!     .unwrap();
//!
//! let data = MultiValueDict::from_urlencoded(
//!     "name=Ada&tags[]=math&tags[]=code&skills[0][name]=engines",
//! );
//! let mut form = Form::new(schema);
//! form.bind(Some(&data), None).unwrap();
//! assert!(form.is_valid());
//! assert_eq!(
//!     form.to_json(),
//!     serde_json::json!({
//!         "name": "Ada",
//!         "tags": ["math", "code"],
//!         "skills": [{"name": "engines"}],
//!     })
//! );
//! ```

/// Values, multidicts, settings, logging, and error types.
pub use formidable_core as core;

/// The key-path parser, fields, forms, form-sets, and object adapter.
#[cfg(feature = "forms")]
pub use formidable_forms as forms;

// Third-party crates whose types appear in the public API.
pub use chrono;
pub use indexmap;
pub use serde_json;
pub use tracing;

/// The types most applications need.
pub mod prelude {
    pub use formidable_core::{
        FieldError, FormError, FormResult, MultiValueDict, ParseError, Settings, Value,
    };

    #[cfg(feature = "forms")]
    pub use formidable_forms::kinds::{
        Boolean, Date, DateTime, Email, File, Float, Integer, List, Slug, Text, Time, Url, Uuid,
    };
    #[cfg(feature = "forms")]
    pub use formidable_forms::{
        Field, FieldSpec, Form, FormSchema, Model, ModelFactory, Object, Saved, ScalarKind,
        DELETED, NEW_INDEX,
    };
}
