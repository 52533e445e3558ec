//! Field declarations.
//!
//! A [`FieldSpec`] is the immutable, declared schema of one field: its
//! [`FieldKind`], whether it is required, its default, validator hooks,
//! the allowed values, and message overrides. Specs are built once with
//! the builder methods below and shared through `Arc`; every bound form
//! gets fresh per-instance field state, so binding never mutates a spec.
//!
//! Scalar kinds implement the [`ScalarKind`] capability trait; see
//! [`kinds`](crate::kinds) for the built-in ones.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use formidable_core::error::{FieldError, FormError, FormResult};
use formidable_core::value::Value;

use crate::form::FormSchema;

/// A validator hook run before or after coercion.
///
/// A hook receives the current value and returns the (possibly changed)
/// value, or a [`FieldError`] that becomes the field's error.
pub type Hook = Arc<dyn Fn(Value) -> Result<Value, FieldError> + Send + Sync>;

/// The coercion and validation contract of a scalar field kind.
///
/// Only `to_value` is required. The binder handles precedence, hooks,
/// `required`, and `one_of`; a kind only converts raw input and checks its
/// own constraints.
pub trait ScalarKind: fmt::Debug + Send + Sync {
    /// Coerces a raw request, object, or default value.
    ///
    /// On failure the field keeps the raw value and takes the error.
    fn to_value(&self, raw: &Value) -> Result<Value, FieldError>;

    /// Checks kind-specific constraints (length, pattern, range...) on a
    /// coerced, non-empty value.
    fn validate_value(&self, _value: &Value) -> Result<(), FieldError> {
        Ok(())
    }

    /// Returns `true` if `value` counts as empty for the `required` check.
    fn is_empty(&self, value: &Value) -> bool {
        value.is_empty()
    }

    /// Whether an empty submitted value falls back to the object's value.
    fn empty_keeps_object(&self) -> bool {
        true
    }

    /// A suffix appended to the field's bracket name (`"[]"` for lists).
    fn name_suffix(&self) -> &'static str {
        ""
    }

    /// The raw value used when nothing is submitted and nothing is declared.
    fn default_value(&self) -> Value {
        Value::Null
    }
}

/// Cardinality limits of a form-set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormSetOptions {
    /// Minimum number of non-deleted items.
    pub min_items: Option<usize>,
    /// Maximum number of non-deleted items.
    pub max_items: Option<usize>,
}

impl FormSetOptions {
    /// Builds options from dynamically-typed values, such as settings read
    /// from a configuration file.
    ///
    /// # Errors
    ///
    /// [`FormError::ImproperlyConfigured`] if a limit is not a non-negative
    /// integer, or if `min_items` is above `max_items`.
    ///
    /// ```
    /// use formidable_core::value::Value;
    /// use formidable_forms::fields::FormSetOptions;
    ///
    /// let options = FormSetOptions::from_values(Some(&Value::Int(1)), None).unwrap();
    /// assert_eq!(options.min_items, Some(1));
    /// assert!(FormSetOptions::from_values(Some(&Value::from("3")), None).is_err());
    /// ```
    pub fn from_values(min_items: Option<&Value>, max_items: Option<&Value>) -> FormResult<Self> {
        let options = Self {
            min_items: item_count("min_items", min_items)?,
            max_items: item_count("max_items", max_items)?,
        };
        if let (Some(min), Some(max)) = (options.min_items, options.max_items) {
            if min > max {
                return Err(FormError::ImproperlyConfigured(format!(
                    "min_items ({min}) is greater than max_items ({max})"
                )));
            }
        }
        Ok(options)
    }
}

fn item_count(name: &str, value: Option<&Value>) -> FormResult<Option<usize>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Int(n)) => usize::try_from(*n).map(Some).map_err(|_| {
            FormError::ImproperlyConfigured(format!("{name} must be non-negative, got {n}"))
        }),
        Some(other) => Err(FormError::ImproperlyConfigured(format!(
            "{name} must be an integer, got {other}"
        ))),
    }
}

/// What a field binds to.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// A single scalar value.
    Scalar(Arc<dyn ScalarKind>),
    /// A nested form.
    Form(Arc<FormSchema>),
    /// An ordered, index-keyed collection of nested forms.
    FormSet {
        /// The schema of each item.
        schema: Arc<FormSchema>,
        /// Cardinality limits.
        options: FormSetOptions,
    },
}

/// The declared schema of one field.
///
/// # Examples
///
/// ```
/// use formidable_forms::fields::FieldSpec;
/// use formidable_forms::kinds::Integer;
///
/// let age = FieldSpec::scalar(Integer { gte: Some(0), ..Integer::default() })
///     .required(false)
///     .default(18)
///     .message("gte", "Age cannot be negative.");
/// assert!(!age.required);
/// ```
#[derive(Clone)]
pub struct FieldSpec {
    /// What the field binds to.
    pub kind: FieldKind,
    /// Whether an empty value is an error. Defaults to `true`.
    pub required: bool,
    /// Used when neither the request nor the object supply a value.
    pub default: Option<Value>,
    /// Hooks run, in order, on the raw value before coercion.
    pub before: Vec<Hook>,
    /// Hooks run, in order, on the coerced value.
    pub after: Vec<Hook>,
    /// If set, the value must be one of these.
    pub one_of: Option<Vec<Value>>,
    /// Per-field message overrides, keyed by error code. For nested forms
    /// and form-sets, these are handed down to the child forms.
    pub messages: HashMap<String, String>,
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("default", &self.default)
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .field("one_of", &self.one_of)
            .field("messages", &self.messages)
            .finish()
    }
}

impl FieldSpec {
    /// Creates a required field of the given kind.
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: true,
            default: None,
            before: Vec::new(),
            after: Vec::new(),
            one_of: None,
            messages: HashMap::new(),
        }
    }

    /// Creates a scalar field.
    pub fn scalar(kind: impl ScalarKind + 'static) -> Self {
        Self::new(FieldKind::Scalar(Arc::new(kind)))
    }

    /// Creates a nested-form field.
    pub fn form(schema: Arc<FormSchema>) -> Self {
        Self::new(FieldKind::Form(schema))
    }

    /// Creates a form-set field with no cardinality limits.
    pub fn form_set(schema: Arc<FormSchema>) -> Self {
        Self::new(FieldKind::FormSet {
            schema,
            options: FormSetOptions::default(),
        })
    }

    /// Sets whether the field is required.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Adds a hook run before coercion.
    #[must_use]
    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: Fn(Value) -> Result<Value, FieldError> + Send + Sync + 'static,
    {
        self.before.push(Arc::new(hook));
        self
    }

    /// Adds a hook run after coercion.
    #[must_use]
    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: Fn(Value) -> Result<Value, FieldError> + Send + Sync + 'static,
    {
        self.after.push(Arc::new(hook));
        self
    }

    /// Restricts the value to the given set.
    #[must_use]
    pub fn one_of<V: Into<Value>>(mut self, allowed: impl IntoIterator<Item = V>) -> Self {
        self.one_of = Some(allowed.into_iter().map(Into::into).collect());
        self
    }

    /// Overrides the message of one error code.
    #[must_use]
    pub fn message(mut self, code: impl Into<String>, msg: impl Into<String>) -> Self {
        self.messages.insert(code.into(), msg.into());
        self
    }

    /// Overrides several messages at once.
    #[must_use]
    pub fn messages(mut self, messages: HashMap<String, String>) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Sets the minimum number of items of a form-set. No effect on other kinds.
    #[must_use]
    pub fn min_items(mut self, min_items: usize) -> Self {
        if let FieldKind::FormSet { options, .. } = &mut self.kind {
            options.min_items = Some(min_items);
        }
        self
    }

    /// Sets the maximum number of items of a form-set. No effect on other kinds.
    #[must_use]
    pub fn max_items(mut self, max_items: usize) -> Self {
        if let FieldKind::FormSet { options, .. } = &mut self.kind {
            options.max_items = Some(max_items);
        }
        self
    }

    /// Replaces the cardinality limits of a form-set. No effect on other kinds.
    #[must_use]
    pub fn form_set_options(mut self, new_options: FormSetOptions) -> Self {
        if let FieldKind::FormSet { options, .. } = &mut self.kind {
            *options = new_options;
        }
        self
    }
}
