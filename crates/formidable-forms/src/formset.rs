//! Form-sets: ordered, index-keyed collections of nested forms.
//!
//! A form-set field binds one child form per index. Indices come from two
//! places:
//!
//! - the request sub-tree, either a sequence (`skills[0][name]`) or a
//!   mapping keyed by arbitrary index strings (`skills[new1][name]`);
//! - the object's attribute, a list of object mappings each indexed by its
//!   primary key. A request item with the same index edits that object.
//!
//! Children are materialised in request order first, then the objects the
//! request did not mention, in their original order. A child carrying the
//! deletion marker is bound but excluded from cardinality and save output.
//!
//! A template form named with [`NEW_INDEX`] is kept alongside, for clients
//! that add rows dynamically. It is never validated or saved.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use formidable_core::error::FieldError;
use formidable_core::value::Value;

use crate::bound_field::{BoundField, NameContext};
use crate::fields::{FieldSpec, FormSetOptions};
use crate::form::{Form, FormSchema};
use crate::messages::{self, MessageTable};
use crate::object::Object;
use crate::parser::RequestTree;

/// The index placeholder used in the names of the template form.
pub const NEW_INDEX: &str = "NEW_INDEX";

/// A field holding a collection of nested forms.
#[derive(Debug)]
pub struct FormSetField {
    schema: Arc<FormSchema>,
    options: FormSetOptions,
    bound: BoundField,
    inherited: MessageTable,
    explicit: Arc<HashMap<String, String>>,
    forms: IndexMap<String, Form>,
    new_form: Form,
}

impl FormSetField {
    pub(crate) fn new(
        field_name: &str,
        spec: Arc<FieldSpec>,
        schema: Arc<FormSchema>,
        options: FormSetOptions,
        ctx: &NameContext,
    ) -> Self {
        let name = ctx.name_for(field_name, "");
        let inherited = ctx.form_messages();
        let explicit = Arc::new(spec.messages.clone());
        let new_form = Form::nested(
            Arc::clone(&schema),
            child_format(&name, NEW_INDEX),
            inherited.clone(),
            Arc::clone(&explicit),
        );
        let bound = BoundField::new(field_name.to_string(), name, ctx.field_messages(&spec.messages));
        Self {
            schema,
            options,
            bound,
            inherited,
            explicit,
            forms: IndexMap::new(),
            new_form,
        }
    }

    fn child(&self, index: &str) -> Form {
        Form::nested(
            Arc::clone(&self.schema),
            child_format(self.bound.name(), index),
            self.inherited.clone(),
            Arc::clone(&self.explicit),
        )
    }

    /// Binds one child form per index found in `request` or `object`.
    ///
    /// `object` is expected to be a list of object mappings; anything else
    /// is ignored.
    pub fn set(&mut self, request: &RequestTree, object: Option<Value>) {
        self.bound.clear_error();
        self.forms.clear();

        let requested = request_items(request);
        let mut objects = object_items(object, &self.schema.meta().pk, &requested);

        for (index, tree) in requested {
            let object = objects.shift_remove(&index).map(Object::Map);
            let mut form = self.child(&index);
            form.bind_tree(tree, object);
            self.forms.insert(index, form);
        }
        for (index, object) in objects {
            let mut form = self.child(&index);
            form.bind_tree(&RequestTree::Absent, Some(Object::Map(object)));
            self.forms.insert(index, form);
        }

        tracing::debug!(
            field = %self.bound.name(),
            forms = self.forms.len(),
            "form-set bound"
        );
    }

    /// Checks the number of non-deleted children, then validates every
    /// child. Returns `true` if the count is within limits and every child
    /// is valid.
    pub fn validate(&mut self) -> bool {
        self.bound.clear_error();
        let count = self.len();

        if let Some(min) = self.options.min_items {
            if count < min {
                self.bound
                    .set_error(FieldError::new(messages::MIN_ITEMS).with_arg(messages::MIN_ITEMS, min));
            }
        }
        if let Some(max) = self.options.max_items {
            if count > max {
                self.bound
                    .set_error(FieldError::new(messages::MAX_ITEMS).with_arg(messages::MAX_ITEMS, max));
            }
        }

        let mut valid = !self.bound.has_error();
        for form in self.forms.values_mut() {
            if !form.validate() {
                valid = false;
            }
        }
        valid
    }

    /// The data of every non-deleted child, in order.
    pub fn save(&self) -> Value {
        Value::List(
            self.forms
                .values()
                .filter(|form| !form.is_deleted())
                .map(Form::data)
                .collect(),
        )
    }

    /// The bound children, including those marked for deletion.
    pub fn forms(&self) -> impl Iterator<Item = &Form> {
        self.forms.values()
    }

    /// The child bound at `index`.
    pub fn form(&self, index: &str) -> Option<&Form> {
        self.forms.get(index)
    }

    /// The child bound at `index`, mutably.
    pub fn form_mut(&mut self, index: &str) -> Option<&mut Form> {
        self.forms.get_mut(index)
    }

    /// The indices of the bound children, in order.
    pub fn indices(&self) -> impl Iterator<Item = &str> {
        self.forms.keys().map(String::as_str)
    }

    /// The template form.
    pub const fn new_form(&self) -> &Form {
        &self.new_form
    }

    /// The number of children not marked for deletion.
    pub fn len(&self) -> usize {
        self.forms.values().filter(|form| !form.is_deleted()).count()
    }

    /// Returns `true` if no child counts towards [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The cardinality limits.
    pub const fn options(&self) -> FormSetOptions {
        self.options
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

fn child_format(name: &str, index: &str) -> String {
    format!("{name}[{index}][{{name}}]")
}

/// The request's items by index, skipping absent slots.
fn request_items(request: &RequestTree) -> Vec<(String, &RequestTree)> {
    match request {
        RequestTree::Map(map) => map
            .iter()
            .filter(|(_, tree)| !tree.is_absent())
            .map(|(index, tree)| (index.clone(), tree))
            .collect(),
        RequestTree::List(items) => items
            .iter()
            .filter(|(_, tree)| !tree.is_absent())
            .map(|(i, tree)| (i.to_string(), tree))
            .collect(),
        RequestTree::Str(_) | RequestTree::Absent => Vec::new(),
    }
}

/// The object's items by index.
///
/// An item is indexed by its primary key. Items without one, and items
/// repeating a primary key already seen, get synthetic indices after the
/// highest numeric index in use.
fn object_items(
    object: Option<Value>,
    pk: &str,
    requested: &[(String, &RequestTree)],
) -> IndexMap<String, IndexMap<String, Value>> {
    let Some(Value::List(items)) = object else {
        return IndexMap::new();
    };
    let maps: Vec<_> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Map(map) => Some(map),
            _ => None,
        })
        .collect();

    let pk_index = |map: &IndexMap<String, Value>| match map.get(pk) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    };

    // u128 so that a pk of u64::MAX still has a successor.
    let mut next = requested
        .iter()
        .map(|(index, _)| index.clone())
        .chain(maps.iter().filter_map(pk_index))
        .filter_map(|index| index.parse::<u64>().ok())
        .max()
        .map_or(0, |max| u128::from(max) + 1);

    let mut out = IndexMap::with_capacity(maps.len());
    for map in maps {
        let index = match pk_index(&map) {
            Some(index) if out.contains_key(&index) => {
                tracing::warn!(pk = %index, "duplicate primary key in form-set objects");
                None
            }
            index => index,
        };
        let index = index.unwrap_or_else(|| {
            let index = next.to_string();
            next += 1;
            index
        });
        out.insert(index, map);
    }
    out
}
