//! Forms: schemas, bound form instances, and the nested-form field.
//!
//! A [`FormSchema`] is the declared "class" of a form: a name, a
//! [`FormMeta`], and an ordered list of field declarations. It is built once
//! with [`FormSchema::builder`] and shared through `Arc`.
//!
//! A [`Form`] is one binding of a schema: fresh per-instance field state,
//! the [`ObjectManager`] over the bound object, and the cached validity.
//! The lifecycle is `bind` → `is_valid` → `save`.
//!
//! ```
//! use formidable_core::utils::MultiValueDict;
//! use formidable_forms::fields::FieldSpec;
//! use formidable_forms::form::{Form, FormSchema, Saved};
//! use formidable_forms::kinds::{Integer, Text};
//!
//! let schema = FormSchema::builder("Profile")
//!     .field("name", FieldSpec::scalar(Text::default()))
//!     .field("age", FieldSpec::scalar(Integer::default()).required(false))
//!     .build()
//!     .unwrap();
//!
//! let data = MultiValueDict::from_urlencoded("name=Ada&age=36");
//! let mut form = Form::new(schema);
//! form.bind(Some(&data), None).unwrap();
//! assert!(form.is_valid());
//! assert!(matches!(form.save().unwrap(), Saved::Data(_)));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use formidable_core::error::{FormError, FormResult};
use formidable_core::logging::form_span;
use formidable_core::utils::MultiValueDict;
use formidable_core::value::Value;

use crate::bound_field::{BoundField, Field, NameContext};
use crate::fields::FieldSpec;
use crate::messages::MessageTable;
use crate::object::{ModelFactory, Object, ObjectManager};
use crate::parser::{KeyPathParser, RequestTree};

/// The reserved key that marks a (sub-)form for deletion.
pub const DELETED: &str = "_deleted";

/// A form-level hook run after every field validated successfully.
///
/// It may inspect and change the form (for example, set an error on a
/// field for a cross-field constraint). Its return value becomes the
/// form's validity.
pub type ValidationHook = Arc<dyn Fn(&mut Form) -> bool + Send + Sync>;

/// Form-level options.
#[derive(Clone)]
pub struct FormMeta {
    /// Creates new objects on save when no object is bound.
    pub model: Option<Arc<dyn ModelFactory>>,
    /// The primary-key attribute of bound objects. Defaults to `"id"`.
    pub pk: String,
    /// Message overrides for every field of the form.
    pub messages: HashMap<String, String>,
    /// Whether a deletion marker may delete the bound object.
    pub allow_delete: bool,
    /// Cross-field validation.
    pub after_validation: Option<ValidationHook>,
}

impl Default for FormMeta {
    fn default() -> Self {
        Self {
            model: None,
            pk: "id".to_string(),
            messages: HashMap::new(),
            allow_delete: false,
            after_validation: None,
        }
    }
}

impl fmt::Debug for FormMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormMeta")
            .field("model", &self.model)
            .field("pk", &self.pk)
            .field("messages", &self.messages)
            .field("allow_delete", &self.allow_delete)
            .field("after_validation", &self.after_validation.is_some())
            .finish()
    }
}

/// The declared schema of a form.
pub struct FormSchema {
    name: String,
    meta: FormMeta,
    fields: Vec<(String, Arc<FieldSpec>)>,
}

impl fmt::Debug for FormSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormSchema")
            .field("name", &self.name)
            .field("meta", &self.meta)
            .field(
                "fields",
                &self.fields.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl FormSchema {
    /// Starts declaring a form named `name`.
    pub fn builder(name: impl Into<String>) -> FormSchemaBuilder {
        FormSchemaBuilder {
            name: name.into(),
            meta: FormMeta::default(),
            fields: Vec::new(),
        }
    }

    /// The form's name, used in logs and `Debug` output.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The form-level options.
    pub const fn meta(&self) -> &FormMeta {
        &self.meta
    }

    /// The field declarations, in order.
    pub fn fields(&self) -> &[(String, Arc<FieldSpec>)] {
        &self.fields
    }
}

/// Builder for [`FormSchema`].
#[derive(Debug)]
pub struct FormSchemaBuilder {
    name: String,
    meta: FormMeta,
    fields: Vec<(String, Arc<FieldSpec>)>,
}

impl FormSchemaBuilder {
    /// Declares a field. Fields keep their declaration order.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.push((name.into(), Arc::new(spec)));
        self
    }

    /// Sets the factory used to create objects on save.
    #[must_use]
    pub fn model(mut self, model: Arc<dyn ModelFactory>) -> Self {
        self.meta.model = Some(model);
        self
    }

    /// Sets the primary-key attribute.
    #[must_use]
    pub fn pk(mut self, pk: impl Into<String>) -> Self {
        self.meta.pk = pk.into();
        self
    }

    /// Overrides the message of one error code for the whole form.
    #[must_use]
    pub fn message(mut self, code: impl Into<String>, msg: impl Into<String>) -> Self {
        self.meta.messages.insert(code.into(), msg.into());
        self
    }

    /// Overrides several messages for the whole form.
    #[must_use]
    pub fn messages(mut self, messages: HashMap<String, String>) -> Self {
        self.meta.messages.extend(messages);
        self
    }

    /// Allows deletion markers to delete the bound object.
    #[must_use]
    pub fn allow_delete(mut self, allow_delete: bool) -> Self {
        self.meta.allow_delete = allow_delete;
        self
    }

    /// Sets the cross-field validation hook.
    #[must_use]
    pub fn after_validation<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Form) -> bool + Send + Sync + 'static,
    {
        self.meta.after_validation = Some(Arc::new(hook));
        self
    }

    /// Finishes the declaration.
    ///
    /// # Errors
    ///
    /// [`FormError::ImproperlyConfigured`] if the primary key is empty, or
    /// a field name is empty, reserved (starts with `_`), contains
    /// brackets, or is declared twice.
    pub fn build(self) -> FormResult<Arc<FormSchema>> {
        let improper = |msg: String| Err(FormError::ImproperlyConfigured(msg));
        if self.meta.pk.is_empty() {
            return improper(format!("{}: the primary key name cannot be empty", self.name));
        }
        let mut seen = std::collections::HashSet::new();
        for (name, _) in &self.fields {
            if name.is_empty() {
                return improper(format!("{}: field names cannot be empty", self.name));
            }
            if name.starts_with('_') {
                return improper(format!(
                    "{}: field name '{name}' is reserved (starts with '_')",
                    self.name
                ));
            }
            if name.contains(['[', ']']) {
                return improper(format!(
                    "{}: field name '{name}' cannot contain brackets",
                    self.name
                ));
            }
            if !seen.insert(name.as_str()) {
                return improper(format!("{}: field '{name}' is declared twice", self.name));
            }
        }
        Ok(Arc::new(FormSchema {
            name: self.name,
            meta: self.meta,
            fields: self.fields,
        }))
    }
}

/// The outcome of [`Form::save`].
#[derive(Debug)]
pub enum Saved {
    /// The form was marked for deletion.
    Deleted,
    /// The bound object was updated with this data.
    Updated(Value),
    /// A new object was created.
    Created(Object),
    /// No object and no model: the data itself.
    Data(Value),
}

impl Saved {
    /// Returns `true` for the deletion sentinel.
    pub const fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }

    /// Returns the saved data of `Updated` and `Data`.
    pub const fn data(&self) -> Option<&Value> {
        match self {
            Self::Updated(data) | Self::Data(data) => Some(data),
            Self::Deleted | Self::Created(_) => None,
        }
    }
}

/// A bound instance of a [`FormSchema`].
pub struct Form {
    schema: Arc<FormSchema>,
    name_format: String,
    inherited: MessageTable,
    explicit: Arc<HashMap<String, String>>,
    fields: IndexMap<String, Field>,
    object: ObjectManager,
    valid: Option<bool>,
    deleted: bool,
}

impl Form {
    /// Creates an unbound form with the default messages.
    pub fn new(schema: Arc<FormSchema>) -> Self {
        Self::nested(schema, "{name}", MessageTable::defaults(), Arc::default())
    }

    pub(crate) fn nested(
        schema: Arc<FormSchema>,
        name_format: impl Into<String>,
        inherited: MessageTable,
        explicit: Arc<HashMap<String, String>>,
    ) -> Self {
        let mut form = Self {
            schema,
            name_format: name_format.into(),
            inherited,
            explicit,
            fields: IndexMap::new(),
            object: ObjectManager::default(),
            valid: None,
            deleted: false,
        };
        form.build_fields();
        form
    }

    /// Supplies messages that take precedence over the form's own.
    #[must_use]
    pub fn with_messages(mut self, messages: HashMap<String, String>) -> Self {
        self.explicit = Arc::new(messages);
        self.build_fields();
        self
    }

    /// Sets the format of field names; `{name}` is replaced by the field
    /// name, e.g. `"user.{name}"`.
    #[must_use]
    pub fn with_name_format(mut self, name_format: impl Into<String>) -> Self {
        self.name_format = name_format.into();
        self.build_fields();
        self
    }

    fn context(&self) -> NameContext {
        NameContext::new(
            self.name_format.clone(),
            self.inherited.layered(&self.schema.meta.messages),
            Arc::clone(&self.explicit),
        )
    }

    fn build_fields(&mut self) {
        let ctx = self.context();
        self.fields = self
            .schema
            .fields
            .iter()
            .map(|(name, spec)| (name.clone(), Field::build(name, Arc::clone(spec), &ctx)))
            .collect();
    }

    /// Parses flat request data and binds the form to it and to `object`.
    ///
    /// # Errors
    ///
    /// [`FormError::Parse`] if a request key is malformed. Validation
    /// failures are not errors; see [`is_valid`](Self::is_valid).
    pub fn bind(
        &mut self,
        data: Option<&MultiValueDict<String, String>>,
        object: Option<Object>,
    ) -> FormResult<()> {
        let tree = match data {
            Some(data) => KeyPathParser::new().parse(data)?,
            None => RequestTree::Absent,
        };
        self.bind_tree(&tree, object);
        Ok(())
    }

    /// Binds the form to an already-parsed request tree and to `object`.
    ///
    /// A tree carrying the [`DELETED`] marker binds no fields.
    pub fn bind_tree(&mut self, tree: &RequestTree, object: Option<Object>) {
        let span = form_span(&self.schema.name);
        let _guard = span.enter();

        self.object = ObjectManager::new(self.schema.meta.model.clone(), object);
        self.valid = None;
        self.build_fields();

        self.deleted = tree.contains_key(DELETED);
        if self.deleted {
            tracing::debug!("form marked for deletion");
            return;
        }

        for (name, field) in &mut self.fields {
            field.set(tree.get(name), self.object.get(name, None));
        }
        tracing::debug!(fields = self.fields.len(), object = self.object.exists(), "form bound");
    }

    /// Returns whether the form is valid, validating it on first call.
    pub fn is_valid(&mut self) -> bool {
        match self.valid {
            Some(valid) => valid,
            None => self.validate(),
        }
    }

    /// Validates every field and then runs the after-validation hook.
    ///
    /// A form marked for deletion is always valid.
    pub fn validate(&mut self) -> bool {
        if self.deleted {
            self.valid = Some(true);
            return true;
        }

        let mut valid = true;
        for field in self.fields.values_mut() {
            if !field.validate() {
                valid = false;
            }
        }
        if valid {
            if let Some(hook) = self.schema.meta.after_validation.clone() {
                valid = hook(self);
            }
        }

        tracing::debug!(form = %self.schema.name, valid, "form validated");
        self.valid = Some(valid);
        valid
    }

    /// Calls `f` for every field of the form, at any depth, that has an
    /// error.
    pub fn for_each_error<F: FnMut(&BoundField)>(&self, f: &mut F) {
        for field in self.fields.values() {
            field.for_each_error(f);
        }
    }

    /// Error codes by full field name, at any depth.
    pub fn errors(&self) -> IndexMap<String, String> {
        let mut errors = IndexMap::new();
        self.for_each_error(&mut |bound: &BoundField| {
            if let Some(code) = bound.error() {
                errors.insert(bound.name().to_string(), code.to_string());
            }
        });
        errors
    }

    /// Rendered error messages by full field name, at any depth.
    pub fn error_messages(&self) -> IndexMap<String, String> {
        let mut errors = IndexMap::new();
        self.for_each_error(&mut |bound: &BoundField| {
            if let Some(msg) = bound.error_message() {
                errors.insert(bound.name().to_string(), msg);
            }
        });
        errors
    }

    /// Returns the field declared as `name`.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Returns the field declared as `name`, mutably.
    ///
    /// Changing a field after validation does not reset the cached
    /// validity; call [`validate`](Self::validate) again if needed.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.get_mut(name)
    }

    /// The fields, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    /// Returns `true` if the form declares a field named `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Returns `true` if the bound data carried the deletion marker.
    pub const fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// The bound object.
    pub const fn object(&self) -> Option<&Object> {
        self.object.object()
    }

    /// The manager over the bound object.
    pub const fn object_manager(&self) -> &ObjectManager {
        &self.object
    }

    /// Consumes the form and returns the bound object.
    pub fn into_object(self) -> Option<Object> {
        self.object.into_object()
    }

    /// The resolved message table of the form.
    pub fn messages(&self) -> MessageTable {
        self.context().form_messages()
    }

    /// The form's schema.
    pub const fn schema(&self) -> &Arc<FormSchema> {
        &self.schema
    }

    /// The schema's name.
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    fn data_map(&self) -> IndexMap<String, Value> {
        self.fields
            .iter()
            .map(|(name, field)| (name.clone(), field.save()))
            .collect()
    }

    /// The form's data, without touching the object.
    ///
    /// A form marked for deletion returns `{"_deleted": true}`.
    pub fn data(&self) -> Value {
        if self.deleted {
            return Value::map([(DELETED, true)]);
        }
        Value::Map(self.data_map())
    }

    /// Saves the form.
    ///
    /// - Marked for deletion: deletes the object if there is one and
    ///   deletion is allowed, then returns [`Saved::Deleted`].
    /// - With an object: updates it and returns [`Saved::Updated`].
    /// - With a model: creates an object and returns [`Saved::Created`].
    /// - Otherwise returns the data as [`Saved::Data`].
    ///
    /// # Errors
    ///
    /// [`FormError::InvalidForm`] if the form is not valid, or whatever
    /// the object or model reports.
    pub fn save(&mut self) -> FormResult<Saved> {
        let span = form_span(&self.schema.name);
        let _guard = span.enter();

        if self.deleted {
            if self.object.exists() {
                if self.schema.meta.allow_delete {
                    self.object.delete()?;
                } else {
                    tracing::warn!(form = %self.schema.name, "deletion is not allowed for this form");
                }
            }
            return Ok(Saved::Deleted);
        }

        if !self.is_valid() {
            let fields: Vec<_> = self.errors().into_keys().collect();
            return Err(FormError::InvalidForm(format!(
                "{} has errors in: {}",
                self.schema.name,
                fields.join(", ")
            )));
        }

        let data = self.data_map();
        if self.object.exists() {
            self.object.update(data.clone())?;
            Ok(Saved::Updated(Value::Map(data)))
        } else if self.object.can_create() {
            Ok(Saved::Created(self.object.create(data)?))
        } else {
            Ok(Saved::Data(Value::Map(data)))
        }
    }

    /// The form's data as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        self.data().to_json()
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.schema.name)?;
        for (i, (name, field)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={}", field.save())?;
        }
        write!(f, ")")
    }
}

/// A field holding a nested form.
///
/// The child's fields are named `parent[child]`. It binds to the request
/// sub-tree under the field's name and to the object's attribute of the
/// same name, and is valid when the child form is.
#[derive(Debug)]
pub struct FormField {
    bound: BoundField,
    form: Box<Form>,
}

impl FormField {
    pub(crate) fn new(
        field_name: &str,
        spec: Arc<FieldSpec>,
        schema: Arc<FormSchema>,
        ctx: &NameContext,
    ) -> Self {
        let name = ctx.name_for(field_name, "");
        let form = Form::nested(
            schema,
            format!("{name}[{{name}}]"),
            ctx.form_messages(),
            Arc::new(spec.messages.clone()),
        );
        let bound = BoundField::new(field_name.to_string(), name, ctx.field_messages(&spec.messages));
        Self {
            bound,
            form: Box::new(form),
        }
    }

    /// Binds the child form.
    pub fn set(&mut self, request: &RequestTree, object: Option<Value>) {
        self.bound.clear_error();
        self.form.bind_tree(request, object.and_then(Object::from_value));
    }

    /// Validates the child form.
    pub fn validate(&mut self) -> bool {
        self.form.validate()
    }

    /// The child form's data.
    pub fn save(&self) -> Value {
        self.form.data()
    }

    /// The child form.
    pub fn form(&self) -> &Form {
        &self.form
    }

    /// The child form, mutably.
    pub fn form_mut(&mut self) -> &mut Form {
        &mut self.form
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
