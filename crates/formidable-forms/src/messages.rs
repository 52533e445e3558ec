//! Error codes and the layered message tables used to render them.
//!
//! Fields store a stable error *code*; the human-readable message is looked
//! up lazily in a [`MessageTable`] and formatted with the error's arguments.
//! `{name}` placeholders in a template are replaced by the argument of the
//! same name.
//!
//! Tables are layered, lowest precedence first:
//!
//! 1. [`DEFAULT_MESSAGES`], extended by `Settings::messages`;
//! 2. the table a nested form inherits from its parent form;
//! 3. the form's own `Meta` messages;
//! 4. per-field messages;
//! 5. a table the parent explicitly hands down to a nested form or form-set.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use formidable_core::settings::SETTINGS;
use formidable_core::value::Value;

pub const REQUIRED: &str = "required";
pub const INVALID: &str = "invalid";
pub const ONE_OF: &str = "one_of";
pub const MIN_ITEMS: &str = "min_items";
pub const MAX_ITEMS: &str = "max_items";
pub const MIN_LENGTH: &str = "min_length";
pub const MAX_LENGTH: &str = "max_length";
pub const PATTERN: &str = "pattern";
pub const GT: &str = "gt";
pub const GTE: &str = "gte";
pub const LT: &str = "lt";
pub const LTE: &str = "lte";
pub const MULTIPLE_OF: &str = "multiple_of";
pub const INVALID_EMAIL: &str = "invalid_email";
pub const INVALID_SLUG: &str = "invalid_slug";
pub const INVALID_URL: &str = "invalid_url";

/// The built-in messages, keyed by error code.
pub const DEFAULT_MESSAGES: &[(&str, &str)] = &[
    (REQUIRED, "This field is required."),
    (INVALID, "Invalid value."),
    (ONE_OF, "Must be one of: {one_of}."),
    (MIN_ITEMS, "Must have at least {min_items} items."),
    (MAX_ITEMS, "Must have at most {max_items} items."),
    (MIN_LENGTH, "Must have at least {min_length} characters."),
    (MAX_LENGTH, "Must have at most {max_length} characters."),
    (PATTERN, "Invalid format."),
    (GT, "Must be greater than {gt}."),
    (GTE, "Must be greater than or equal to {gte}."),
    (LT, "Must be less than {lt}."),
    (LTE, "Must be less than or equal to {lte}."),
    (MULTIPLE_OF, "Must be a multiple of {multiple_of}."),
    (INVALID_EMAIL, "Enter a valid email address."),
    (
        INVALID_SLUG,
        "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
    ),
    (INVALID_URL, "Enter a valid URL."),
];

/// An immutable, cheaply clonable message table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageTable {
    inner: Arc<HashMap<String, String>>,
}

impl MessageTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the built-in messages with the global `Settings::messages`
    /// overrides applied.
    pub fn defaults() -> Self {
        let mut table: HashMap<String, String> = DEFAULT_MESSAGES
            .iter()
            .map(|(code, msg)| ((*code).to_string(), (*msg).to_string()))
            .collect();
        table.extend(
            SETTINGS
                .get_or_default()
                .messages
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        Self {
            inner: Arc::new(table),
        }
    }

    /// Returns a new table with `overrides` on top of this one.
    ///
    /// No copy is made when `overrides` is empty.
    #[must_use]
    pub fn layered(&self, overrides: &HashMap<String, String>) -> Self {
        if overrides.is_empty() {
            return self.clone();
        }
        let mut table = (*self.inner).clone();
        table.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self {
            inner: Arc::new(table),
        }
    }

    /// Returns the template for `code`.
    pub fn get(&self, code: &str) -> Option<&str> {
        self.inner.get(code).map(String::as_str)
    }

    /// Returns the number of codes in the table.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Renders the message for `code`, substituting `{arg}` placeholders.
    ///
    /// Unknown codes render as the code itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use formidable_core::value::Value;
    /// use formidable_forms::messages::{MessageTable, MIN_ITEMS};
    ///
    /// let args = [("min_items".to_string(), Value::Int(3))].into_iter().collect();
    /// let msg = MessageTable::defaults().render(MIN_ITEMS, Some(&args));
    /// assert_eq!(msg, "Must have at least 3 items.");
    /// ```
    pub fn render(&self, code: &str, args: Option<&IndexMap<String, Value>>) -> String {
        let template = self.get(code).unwrap_or(code);
        args.map_or_else(
            || template.to_string(),
            |args| {
                args.iter().fold(template.to_string(), |msg, (name, value)| {
                    msg.replace(&format!("{{{name}}}"), &format_arg(value))
                })
            },
        )
    }
}

fn format_arg(value: &Value) -> String {
    match value {
        Value::List(items) => items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
