//! Object reconciliation: the uniform adapter over existing objects.
//!
//! A form may be bound to an existing object, either a plain mapping of
//! values or an attribute-bearing [`Model`]. The [`ObjectManager`] reads the
//! current attribute values used as a fallback during binding, and at save
//! time dispatches to create, update, or delete.
//!
//! Persistence is never done here: `create` goes through the injected
//! [`ModelFactory`], and a model's own `delete_instance` decides what
//! deletion means.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use formidable_core::error::{FormError, FormResult};
use formidable_core::value::Value;

/// An attribute-bearing object supplied by the application.
pub trait Model: fmt::Debug + Send {
    /// Returns the current value of the attribute, if it has one.
    fn get_attr(&self, name: &str) -> Option<Value>;

    /// Sets an attribute.
    fn set_attr(&mut self, name: &str, value: Value) -> FormResult<()>;

    /// Deletes the object from wherever it is stored.
    fn delete_instance(&mut self) -> FormResult<()>;
}

/// Creates new [`Model`] instances from saved form data.
pub trait ModelFactory: fmt::Debug + Send + Sync {
    /// Builds and persists a new object from the full form data.
    fn create(&self, data: IndexMap<String, Value>) -> FormResult<Box<dyn Model>>;
}

/// An existing object a form is bound to.
#[derive(Debug)]
pub enum Object {
    /// A plain mapping of attribute names to values.
    Map(IndexMap<String, Value>),
    /// An application model.
    Model(Box<dyn Model>),
}

impl Object {
    /// Wraps a `Value::Map`; any other value is not an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Map(map) => Some(Self::Map(map)),
            _ => None,
        }
    }

    /// Returns the value of an attribute.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self {
            Self::Map(map) => map.get(name).cloned(),
            Self::Model(model) => model.get_attr(name),
        }
    }

    /// Returns the mapping of a map-backed object.
    pub const fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Map(map) => Some(map),
            Self::Model(_) => None,
        }
    }

    /// Returns the model of a model-backed object.
    pub fn as_model(&self) -> Option<&dyn Model> {
        match self {
            Self::Map(_) => None,
            Self::Model(model) => Some(model.as_ref()),
        }
    }
}

impl From<IndexMap<String, Value>> for Object {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self::Map(map)
    }
}

impl From<Box<dyn Model>> for Object {
    fn from(model: Box<dyn Model>) -> Self {
        Self::Model(model)
    }
}

/// The uniform create/read/update/delete surface over an [`Object`].
#[derive(Debug, Default)]
pub struct ObjectManager {
    model: Option<Arc<dyn ModelFactory>>,
    object: Option<Object>,
}

impl ObjectManager {
    /// Creates a manager over an optional object and model factory.
    pub fn new(model: Option<Arc<dyn ModelFactory>>, object: Option<Object>) -> Self {
        Self { model, object }
    }

    /// Returns `true` if an object is present.
    pub const fn exists(&self) -> bool {
        self.object.is_some()
    }

    /// Returns `true` if new objects can be created.
    pub const fn can_create(&self) -> bool {
        self.model.is_some()
    }

    /// Returns the attribute value, or `default` when there is no object or
    /// the object has no such attribute.
    pub fn get(&self, name: &str, default: Option<Value>) -> Option<Value> {
        self.object
            .as_ref()
            .and_then(|object| object.get(name))
            .or(default)
    }

    /// Creates a new object from the full form data.
    ///
    /// # Errors
    ///
    /// [`FormError::ImproperlyConfigured`] if no model factory was declared,
    /// or whatever the factory returns.
    pub fn create(&self, data: IndexMap<String, Value>) -> FormResult<Object> {
        let model = self.model.as_ref().ok_or_else(|| {
            FormError::ImproperlyConfigured("no model to create objects with".to_string())
        })?;
        tracing::debug!(fields = data.len(), "creating object");
        Ok(Object::Model(model.create(data)?))
    }

    /// Updates the object with `data`: mapping keys are merged, model
    /// attributes are set one by one.
    ///
    /// # Errors
    ///
    /// [`FormError::MissingObject`] if there is no object.
    pub fn update(&mut self, data: IndexMap<String, Value>) -> FormResult<()> {
        let object = self
            .object
            .as_mut()
            .ok_or_else(|| FormError::MissingObject("update".to_string()))?;
        tracing::debug!(fields = data.len(), "updating object");
        match object {
            Object::Map(map) => {
                map.extend(data);
                Ok(())
            }
            Object::Model(model) => {
                for (name, value) in data {
                    model.set_attr(&name, value)?;
                }
                Ok(())
            }
        }
    }

    /// Deletes the object: a mapping is cleared, a model deletes itself.
    ///
    /// # Errors
    ///
    /// [`FormError::MissingObject`] if there is no object.
    pub fn delete(&mut self) -> FormResult<()> {
        let object = self
            .object
            .as_mut()
            .ok_or_else(|| FormError::MissingObject("delete".to_string()))?;
        tracing::debug!("deleting object");
        match object {
            Object::Map(map) => {
                map.clear();
                Ok(())
            }
            Object::Model(model) => model.delete_instance(),
        }
    }

    /// Returns the wrapped object.
    pub const fn object(&self) -> Option<&Object> {
        self.object.as_ref()
    }

    /// Consumes the manager and returns the wrapped object.
    pub fn into_object(self) -> Option<Object> {
        self.object
    }
}
