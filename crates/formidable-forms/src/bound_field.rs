//! Bound fields: per-instance field state and the binder.
//!
//! A [`Field`] is created from a shared [`FieldSpec`] each time a form is
//! instantiated. It owns the mutable binding state ([`BoundField`]: value,
//! error code, error arguments, bracket name, and resolved message table)
//! and implements `set` / `validate` / `save` for its kind.
//!
//! Parent linkage is explicit: a [`NameContext`] carrying the parent's name
//! format and message tables is passed down when fields are built, so
//! fields never point back at their form.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use formidable_core::error::FieldError;
use formidable_core::value::Value;

use crate::fields::{FieldKind, FieldSpec, ScalarKind};
use crate::form::FormField;
use crate::formset::FormSetField;
use crate::messages::{self, MessageTable};
use crate::parser::RequestTree;
use crate::validation::{check_one_of, is_blank, run_hooks};

/// The state shared by every kind of bound field.
#[derive(Debug, Clone)]
pub struct BoundField {
    field_name: String,
    name: String,
    pub(crate) value: Option<Value>,
    error: Option<String>,
    error_args: Option<IndexMap<String, Value>>,
    messages: MessageTable,
}

impl BoundField {
    pub(crate) const fn new(field_name: String, name: String, messages: MessageTable) -> Self {
        Self {
            field_name,
            name,
            value: None,
            error: None,
            error_args: None,
            messages,
        }
    }

    /// The declared field name (`street`).
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// The full bracket name (`address[street]`), as a client would submit it.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bound value, if the field has been set.
    pub const fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// The error code, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The arguments used to render the error message.
    pub const fn error_args(&self) -> Option<&IndexMap<String, Value>> {
        self.error_args.as_ref()
    }

    /// The rendered error message, if any.
    pub fn error_message(&self) -> Option<String> {
        self.error
            .as_deref()
            .map(|code| self.messages.render(code, self.error_args.as_ref()))
    }

    /// The message table used to render errors.
    pub const fn messages(&self) -> &MessageTable {
        &self.messages
    }

    /// Returns `true` if the field has an error.
    pub const fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Sets the error, e.g. from a form's after-validation hook.
    pub fn set_error(&mut self, error: FieldError) {
        self.error = Some(error.code);
        self.error_args = error.args;
    }

    /// Clears the error and its arguments.
    pub fn clear_error(&mut self) {
        self.error = None;
        self.error_args = None;
    }
}

/// What a form passes down to the fields it builds.
#[derive(Debug, Clone)]
pub struct NameContext {
    name_format: String,
    messages: MessageTable,
    explicit: Arc<HashMap<String, String>>,
}

impl NameContext {
    /// Creates a context.
    ///
    /// `name_format` contains a `{name}` placeholder. `messages` is the
    /// form's table (inherited and `Meta` layers); `explicit` is the table
    /// the form's parent handed down, which beats per-field messages.
    pub fn new(
        name_format: impl Into<String>,
        messages: MessageTable,
        explicit: Arc<HashMap<String, String>>,
    ) -> Self {
        Self {
            name_format: name_format.into(),
            messages,
            explicit,
        }
    }

    /// A root context with the default messages.
    pub fn root() -> Self {
        Self::new("{name}", MessageTable::defaults(), Arc::default())
    }

    /// The full name of a field.
    pub fn name_for(&self, field_name: &str, suffix: &str) -> String {
        format!("{}{suffix}", self.name_format.replace("{name}", field_name))
    }

    /// The table a field with `overrides` renders its errors with.
    pub fn field_messages(&self, overrides: &HashMap<String, String>) -> MessageTable {
        self.messages.layered(overrides).layered(&self.explicit)
    }

    /// The resolved table of the form itself, inherited by nested forms.
    pub fn form_messages(&self) -> MessageTable {
        self.messages.layered(&self.explicit)
    }
}

/// A scalar field: the generic binder over a [`ScalarKind`].
#[derive(Debug, Clone)]
pub struct ScalarField {
    spec: Arc<FieldSpec>,
    kind: Arc<dyn ScalarKind>,
    bound: BoundField,
}

impl ScalarField {
    pub(crate) fn new(
        field_name: &str,
        spec: Arc<FieldSpec>,
        kind: Arc<dyn ScalarKind>,
        ctx: &NameContext,
    ) -> Self {
        let name = ctx.name_for(field_name, kind.name_suffix());
        let bound = BoundField::new(field_name.to_string(), name, ctx.field_messages(&spec.messages));
        Self { spec, kind, bound }
    }

    /// Binds the field.
    ///
    /// `request` is `None` when nothing was submitted. The effective raw
    /// value is, in order of precedence:
    /// - without a request value: the object's value, else the default;
    /// - with an empty request value (null or `""`) and an object value:
    ///   the object's value, unless the kind gives empty submissions a
    ///   meaning of their own;
    /// - otherwise the request value.
    ///
    /// Then the `before` hooks run, the kind coerces the value, and the
    /// `after` hooks run. A hook failure leaves the field without a value;
    /// a coercion failure keeps the raw value.
    pub fn set(&mut self, request: Option<Value>, object: Option<Value>) {
        self.bound.clear_error();
        self.bound.value = None;

        let raw = match (request, object) {
            (None, object) => object
                .or_else(|| self.spec.default.clone())
                .unwrap_or_else(|| self.kind.default_value()),
            (Some(request), Some(object))
                if is_blank(&request) && self.kind.empty_keeps_object() =>
            {
                object
            }
            (Some(request), _) => request,
        };

        let raw = match run_hooks(&self.spec.before, raw) {
            Ok(raw) => raw,
            Err(error) => {
                self.bound.set_error(error);
                return;
            }
        };

        let value = match self.kind.to_value(&raw) {
            Ok(value) => value,
            Err(error) => {
                self.bound.value = Some(raw);
                self.bound.set_error(error);
                return;
            }
        };

        match run_hooks(&self.spec.after, value) {
            Ok(value) => self.bound.value = Some(value),
            Err(error) => self.bound.set_error(error),
        }
    }

    /// Validates the bound value. Returns `true` if the field is valid.
    ///
    /// An error already set while binding is kept. Otherwise an empty value
    /// fails only when required, and a non-empty one is checked against
    /// `one_of` and then against the kind's own constraints.
    pub fn validate(&mut self) -> bool {
        if self.bound.has_error() {
            return false;
        }
        let value = self.bound.value.clone().unwrap_or(Value::Null);
        if self.kind.is_empty(&value) {
            if self.spec.required {
                self.bound.set_error(FieldError::new(messages::REQUIRED));
                return false;
            }
            return true;
        }
        let checked = self
            .spec
            .one_of
            .as_deref()
            .map_or(Ok(()), |allowed| check_one_of(allowed, &value))
            .and_then(|()| self.kind.validate_value(&value));
        match checked {
            Ok(()) => true,
            Err(error) => {
                self.bound.set_error(error);
                false
            }
        }
    }

    /// The value to save: the bound value, or null.
    pub fn save(&self) -> Value {
        self.bound.value.clone().unwrap_or(Value::Null)
    }

    /// The field's kind.
    pub fn kind(&self) -> &dyn ScalarKind {
        self.kind.as_ref()
    }

    /// The field's declaration.
    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    /// The binding state.
    pub const fn bound(&self) -> &BoundField {
        &self.bound
    }

    /// The binding state, mutably.
    pub fn bound_mut(&mut self) -> &mut BoundField {
        &mut self.bound
    }
}

/// A bound field of any kind.
#[derive(Debug)]
pub enum Field {
    /// A scalar value.
    Scalar(ScalarField),
    /// A nested form.
    Form(FormField),
    /// A collection of nested forms.
    FormSet(FormSetField),
}

impl Field {
    /// Builds a standalone field named `field_name`, with default messages.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    ///
    /// use formidable_core::value::Value;
    /// use formidable_forms::bound_field::Field;
    /// use formidable_forms::fields::FieldSpec;
    /// use formidable_forms::kinds::Integer;
    ///
    /// let mut field = Field::new("age", Arc::new(FieldSpec::scalar(Integer::default())));
    /// field.set_value(None, Some(Value::Int(30)));
    /// assert!(field.validate());
    /// assert_eq!(field.value(), Some(&Value::Int(30)));
    /// ```
    pub fn new(field_name: &str, spec: Arc<FieldSpec>) -> Self {
        Self::build(field_name, spec, &NameContext::root())
    }

    /// Builds a field for the form described by `ctx`.
    pub fn build(field_name: &str, spec: Arc<FieldSpec>, ctx: &NameContext) -> Self {
        match spec.kind.clone() {
            FieldKind::Scalar(kind) => Self::Scalar(ScalarField::new(field_name, spec, kind, ctx)),
            FieldKind::Form(schema) => Self::Form(FormField::new(field_name, spec, schema, ctx)),
            FieldKind::FormSet { schema, options } => {
                Self::FormSet(FormSetField::new(field_name, spec, schema, options, ctx))
            }
        }
    }

    /// Binds the field to its part of the request tree and the object's
    /// value for it.
    pub fn set(&mut self, request: &RequestTree, object: Option<Value>) {
        match self {
            Self::Scalar(field) => field.set(request.to_value(), object),
            Self::Form(field) => field.set(request, object),
            Self::FormSet(field) => field.set(request, object),
        }
    }

    /// Binds the field from already-decoded values.
    pub fn set_value(&mut self, request: Option<Value>, object: Option<Value>) {
        match self {
            Self::Scalar(field) => field.set(request, object),
            _ => {
                let tree = request.as_ref().map(RequestTree::from_value).unwrap_or_default();
                self.set(&tree, object);
            }
        }
    }

    /// Validates the field. Returns `true` if it and everything below it
    /// is valid.
    pub fn validate(&mut self) -> bool {
        match self {
            Self::Scalar(field) => field.validate(),
            Self::Form(field) => field.validate(),
            Self::FormSet(field) => field.validate(),
        }
    }

    /// The value this field contributes to the saved data.
    pub fn save(&self) -> Value {
        match self {
            Self::Scalar(field) => field.save(),
            Self::Form(field) => field.save(),
            Self::FormSet(field) => field.save(),
        }
    }

    /// The field's own binding state.
    pub const fn bound(&self) -> &BoundField {
        match self {
            Self::Scalar(field) => field.bound(),
            Self::Form(field) => field.bound(),
            Self::FormSet(field) => field.bound(),
        }
    }

    /// The field's own binding state, mutably.
    pub fn bound_mut(&mut self) -> &mut BoundField {
        match self {
            Self::Scalar(field) => field.bound_mut(),
            Self::Form(field) => field.bound_mut(),
            Self::FormSet(field) => field.bound_mut(),
        }
    }

    /// The declared field name.
    pub fn field_name(&self) -> &str {
        self.bound().field_name()
    }

    /// The full bracket name.
    pub fn name(&self) -> &str {
        self.bound().name()
    }

    /// The bound value of a scalar field.
    pub const fn value(&self) -> Option<&Value> {
        self.bound().value()
    }

    /// The field's own error code.
    pub fn error(&self) -> Option<&str> {
        self.bound().error()
    }

    /// The field's own error arguments.
    pub const fn error_args(&self) -> Option<&IndexMap<String, Value>> {
        self.bound().error_args()
    }

    /// The field's own rendered error message.
    pub fn error_message(&self) -> Option<String> {
        self.bound().error_message()
    }

    /// Sets the field's own error.
    pub fn set_error(&mut self, error: FieldError) {
        self.bound_mut().set_error(error);
    }

    /// Calls `f` for this field and every field below it that has an error.
    pub fn for_each_error<F: FnMut(&BoundField)>(&self, f: &mut F) {
        if self.bound().has_error() {
            f(self.bound());
        }
        match self {
            Self::Scalar(_) => {}
            Self::Form(field) => field.form().for_each_error(f),
            Self::FormSet(field) => {
                for form in field.forms() {
                    form.for_each_error(f);
                }
            }
        }
    }

    /// Returns the scalar field, if this is one.
    pub const fn as_scalar(&self) -> Option<&ScalarField> {
        match self {
            Self::Scalar(field) => Some(field),
            _ => None,
        }
    }

    /// Returns the nested-form field, if this is one.
    pub const fn as_form(&self) -> Option<&FormField> {
        match self {
            Self::Form(field) => Some(field),
            _ => None,
        }
    }

    /// Returns the form-set field, if this is one.
    pub const fn as_form_set(&self) -> Option<&FormSetField> {
        match self {
            Self::FormSet(field) => Some(field),
            _ => None,
        }
    }

    /// Returns the nested-form field mutably, if this is one.
    pub fn as_form_mut(&mut self) -> Option<&mut FormField> {
        match self {
            Self::Form(field) => Some(field),
            _ => None,
        }
    }

    /// Returns the form-set field mutably, if this is one.
    pub fn as_form_set_mut(&mut self) -> Option<&mut FormSetField> {
        match self {
            Self::FormSet(field) => Some(field),
            _ => None,
        }
    }
}
