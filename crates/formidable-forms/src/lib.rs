//! # formidable-forms
//!
//! Binds flat, bracket-keyed request data (`address[street]`,
//! `skills[0][name]`, `tags[]`) to declared form schemas, validates it with
//! typed fields, nested forms, and form-sets, and reconciles the result with
//! existing objects.
//!
//! ## Modules
//!
//! - [`parser`] - The bracket key-path parser and the [`RequestTree`] it builds
//! - [`fields`] - Field declarations ([`FieldSpec`]) and the [`ScalarKind`] trait
//! - [`kinds`] - Built-in scalar kinds
//! - [`bound_field`] - Per-instance field state and the binder
//! - [`form`] - Form schemas, bound forms, and nested-form fields
//! - [`formset`] - Form-set fields
//! - [`object`] - The object adapter used for fallback values and saving
//! - [`messages`] - Error codes and layered message tables
//! - [`validation`] - Shared validation steps

pub mod bound_field;
pub mod fields;
pub mod form;
pub mod formset;
pub mod kinds;
pub mod messages;
pub mod object;
pub mod parser;
pub mod validation;

pub use bound_field::{BoundField, Field, NameContext, ScalarField};
pub use fields::{FieldKind, FieldSpec, FormSetOptions, Hook, ScalarKind};
pub use form::{Form, FormField, FormMeta, FormSchema, FormSchemaBuilder, Saved, DELETED};
pub use formset::{FormSetField, NEW_INDEX};
pub use messages::MessageTable;
pub use object::{Model, ModelFactory, Object, ObjectManager};
pub use parser::{parse, KeyPathParser, RequestTree};
