//! Built-in scalar field kinds.
//!
//! Each kind implements [`ScalarKind`]: it coerces a raw value (a request
//! string, an object attribute, or a declared default) into a typed
//! [`Value`] and checks its own constraints. Empty input coerces to an empty
//! value so that the binder's `required` check can decide what to do.

use std::sync::{Arc, OnceLock};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use formidable_core::error::{FieldError, FormError, FormResult};
use formidable_core::value::Value;

use crate::fields::ScalarKind;
use crate::messages;
use crate::validation::{check_length, Bounds};

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static SLUG_RE: OnceLock<Regex> = OnceLock::new();
static URL_RE: OnceLock<Regex> = OnceLock::new();

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$")
            .expect("email regex is valid")
    })
}

fn slug_re() -> &'static Regex {
    SLUG_RE.get_or_init(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug regex is valid"))
}

fn url_re() -> &'static Regex {
    URL_RE.get_or_init(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("url regex is valid"))
}

fn invalid() -> FieldError {
    FieldError::new(messages::INVALID)
}

/// Reads the raw value as trimmed text; `None` for null and non-scalars.
fn raw_text(raw: &Value) -> Option<String> {
    match raw {
        Value::Null | Value::List(_) | Value::Map(_) => None,
        Value::String(s) => Some(s.trim().to_string()),
        other => Some(other.to_string()),
    }
}

/// Free text.
#[derive(Debug, Clone)]
pub struct Text {
    /// Trim surrounding whitespace. Defaults to `true`.
    pub strip: bool,
    /// Minimum length in characters.
    pub min_length: Option<usize>,
    /// Maximum length in characters.
    pub max_length: Option<usize>,
    /// A pattern the whole value must match.
    pub pattern: Option<Regex>,
}

impl Default for Text {
    fn default() -> Self {
        Self {
            strip: true,
            min_length: None,
            max_length: None,
            pattern: None,
        }
    }
}

impl Text {
    /// Requires the whole value to match `pattern`.
    ///
    /// # Errors
    ///
    /// [`FormError::ImproperlyConfigured`] if the pattern does not compile.
    pub fn with_pattern(mut self, pattern: &str) -> FormResult<Self> {
        let anchored = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
            FormError::ImproperlyConfigured(format!("invalid pattern '{pattern}': {e}"))
        })?;
        self.pattern = Some(anchored);
        Ok(self)
    }
}

impl ScalarKind for Text {
    fn to_value(&self, raw: &Value) -> Result<Value, FieldError> {
        match raw {
            Value::Null => Ok(Value::String(String::new())),
            Value::String(s) if !self.strip => Ok(Value::String(s.clone())),
            Value::List(_) | Value::Map(_) => Err(invalid()),
            other => Ok(Value::String(raw_text(other).unwrap_or_default())),
        }
    }

    fn validate_value(&self, value: &Value) -> Result<(), FieldError> {
        let text = value.as_str().unwrap_or_default();
        check_length(text.chars().count(), self.min_length, self.max_length)?;
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(text) {
                return Err(FieldError::new(messages::PATTERN));
            }
        }
        Ok(())
    }
}

/// 2^63: whole floats in `[-2^63, 2^63)` convert to `i64` exactly.
const I64_EDGE: f64 = 9_223_372_036_854_775_808.0;

/// A whole number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Integer {
    pub gt: Option<i64>,
    pub gte: Option<i64>,
    pub lt: Option<i64>,
    pub lte: Option<i64>,
    pub multiple_of: Option<i64>,
}

impl ScalarKind for Integer {
    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    fn to_value(&self, raw: &Value) -> Result<Value, FieldError> {
        match raw {
            Value::Null => Ok(Value::Null),
            Value::Int(n) => Ok(Value::Int(*n)),
            Value::Float(f) if f.fract() == 0.0 && (-I64_EDGE..I64_EDGE).contains(f) => {
                Ok(Value::Int(*f as i64))
            }
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(Value::Null);
                }
                s.parse::<i64>().map(Value::Int).map_err(|_| invalid())
            }
            _ => Err(invalid()),
        }
    }

    fn validate_value(&self, value: &Value) -> Result<(), FieldError> {
        let Some(n) = value.as_int() else {
            return Ok(());
        };
        Bounds {
            gt: self.gt,
            gte: self.gte,
            lt: self.lt,
            lte: self.lte,
        }
        .check(n)?;
        if let Some(step) = self.multiple_of.filter(|step| *step != 0) {
            // i64::MIN % -1 overflows; every integer is a multiple of -1.
            if n.checked_rem(step).unwrap_or(0) != 0 {
                return Err(FieldError::new(messages::MULTIPLE_OF)
                    .with_arg(messages::MULTIPLE_OF, step));
            }
        }
        Ok(())
    }
}

/// A floating-point number.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Float {
    pub gt: Option<f64>,
    pub gte: Option<f64>,
    pub lt: Option<f64>,
    pub lte: Option<f64>,
}

impl ScalarKind for Float {
    fn to_value(&self, raw: &Value) -> Result<Value, FieldError> {
        match raw {
            Value::Null => Ok(Value::Null),
            Value::Int(_) | Value::Float(_) => raw.as_float().map(Value::Float).ok_or_else(invalid),
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(Value::Null);
                }
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(Value::Float)
                    .ok_or_else(invalid)
            }
            _ => Err(invalid()),
        }
    }

    fn validate_value(&self, value: &Value) -> Result<(), FieldError> {
        let Some(n) = value.as_float() else {
            return Ok(());
        };
        Bounds {
            gt: self.gt,
            gte: self.gte,
            lt: self.lt,
            lte: self.lte,
        }
        .check(n)
    }
}

/// A checkbox.
///
/// A submitted empty string means "checked"; `false`, `0`, `no`, and `off`
/// (in any case) mean unchecked. Because an empty submission carries
/// meaning, it does not fall back to the object's value, and the value is
/// never empty for the `required` check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Boolean;

impl ScalarKind for Boolean {
    fn to_value(&self, raw: &Value) -> Result<Value, FieldError> {
        match raw {
            Value::Null => Ok(Value::Bool(false)),
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::Int(n) => Ok(Value::Bool(*n != 0)),
            Value::String(s) => {
                let s = s.trim().to_lowercase();
                Ok(Value::Bool(!matches!(s.as_str(), "false" | "0" | "no" | "off")))
            }
            _ => Err(invalid()),
        }
    }

    fn is_empty(&self, _value: &Value) -> bool {
        false
    }

    fn empty_keeps_object(&self) -> bool {
        false
    }
}

/// A calendar date, `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Date;

impl ScalarKind for Date {
    fn to_value(&self, raw: &Value) -> Result<Value, FieldError> {
        match raw {
            Value::Null => Ok(Value::Null),
            Value::Date(d) => Ok(Value::Date(*d)),
            Value::DateTime(dt) => Ok(Value::Date(dt.date())),
            Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
            Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

/// A date and time without timezone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateTime;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

impl ScalarKind for DateTime {
    fn to_value(&self, raw: &Value) -> Result<Value, FieldError> {
        match raw {
            Value::Null => Ok(Value::Null),
            Value::DateTime(dt) => Ok(Value::DateTime(*dt)),
            Value::Date(d) => d.and_hms_opt(0, 0, 0).map(Value::DateTime).ok_or_else(invalid),
            Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
            Value::String(s) => {
                let s = s.trim();
                DATETIME_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                    .map(Value::DateTime)
                    .ok_or_else(invalid)
            }
            _ => Err(invalid()),
        }
    }
}

/// A time of day: `HH`, `HH:MM`, or `HH:MM:SS` (with optional fraction).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Time;

fn time_part(part: &str) -> Option<u32> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    let parts: Vec<&str> = s.split(':').collect();
    match parts.as_slice() {
        [h] => NaiveTime::from_hms_opt(time_part(h)?, 0, 0),
        [h, m] => NaiveTime::from_hms_opt(time_part(h)?, time_part(m)?, 0),
        [h, m, sec] if !sec.contains('.') => {
            NaiveTime::from_hms_opt(time_part(h)?, time_part(m)?, time_part(sec)?)
        }
        [_, _, _] => NaiveTime::parse_from_str(s, "%H:%M:%S%.f").ok(),
        _ => None,
    }
}

impl ScalarKind for Time {
    fn to_value(&self, raw: &Value) -> Result<Value, FieldError> {
        match raw {
            Value::Null => Ok(Value::Null),
            Value::Time(t) => Ok(Value::Time(*t)),
            Value::DateTime(dt) => Ok(Value::Time(dt.time())),
            Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
            Value::String(s) => parse_time(s.trim()).map(Value::Time).ok_or_else(invalid),
            _ => Err(invalid()),
        }
    }
}

/// An email address. The domain part is lowercased.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Email {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

impl ScalarKind for Email {
    fn to_value(&self, raw: &Value) -> Result<Value, FieldError> {
        let Some(text) = raw_text(raw) else {
            return match raw {
                Value::Null => Ok(Value::String(String::new())),
                _ => Err(FieldError::new(messages::INVALID_EMAIL)),
            };
        };
        if text.is_empty() {
            return Ok(Value::String(text));
        }
        if !email_re().is_match(&text) {
            return Err(FieldError::new(messages::INVALID_EMAIL));
        }
        let normalized = match text.rsplit_once('@') {
            Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
            None => text,
        };
        Ok(Value::String(normalized))
    }

    fn validate_value(&self, value: &Value) -> Result<(), FieldError> {
        let len = value.as_str().map_or(0, |s| s.chars().count());
        check_length(len, self.min_length, self.max_length)
    }
}

/// A slug: letters, numbers, underscores, and hyphens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slug;

impl ScalarKind for Slug {
    fn to_value(&self, raw: &Value) -> Result<Value, FieldError> {
        Text::default().to_value(raw)
    }

    fn validate_value(&self, value: &Value) -> Result<(), FieldError> {
        match value.as_str() {
            Some(s) if slug_re().is_match(s) => Ok(()),
            _ => Err(FieldError::new(messages::INVALID_SLUG)),
        }
    }
}

/// An `http` or `https` URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Url;

impl ScalarKind for Url {
    fn to_value(&self, raw: &Value) -> Result<Value, FieldError> {
        Text::default().to_value(raw)
    }

    fn validate_value(&self, value: &Value) -> Result<(), FieldError> {
        match value.as_str() {
            Some(s) if url_re().is_match(s) => Ok(()),
            _ => Err(FieldError::new(messages::INVALID_URL)),
        }
    }
}

/// A UUID in any format `uuid` accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Uuid;

impl ScalarKind for Uuid {
    fn to_value(&self, raw: &Value) -> Result<Value, FieldError> {
        match raw {
            Value::Null => Ok(Value::Null),
            Value::Uuid(u) => Ok(Value::Uuid(*u)),
            Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
            Value::String(s) => uuid::Uuid::parse_str(s.trim())
                .map(Value::Uuid)
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

/// A file input. Values pass through untouched; nothing is uploaded.
///
/// An empty submission keeps the stored file, and an empty string is a
/// valid value (no file chosen).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct File;

impl ScalarKind for File {
    fn to_value(&self, raw: &Value) -> Result<Value, FieldError> {
        Ok(raw.clone())
    }

    fn is_empty(&self, value: &Value) -> bool {
        value.is_null()
    }
}

/// A repeated input bound from `name[]` keys.
///
/// Each item is coerced with `item` when set. The field's name carries the
/// `[]` suffix and its default is the empty list.
#[derive(Debug, Clone, Default)]
pub struct List {
    pub item: Option<Arc<dyn ScalarKind>>,
}

impl List {
    /// A list whose items are coerced with `item`.
    pub fn of(item: impl ScalarKind + 'static) -> Self {
        Self {
            item: Some(Arc::new(item)),
        }
    }
}

impl ScalarKind for List {
    fn to_value(&self, raw: &Value) -> Result<Value, FieldError> {
        match raw {
            Value::Null => Ok(Value::List(Vec::new())),
            Value::List(items) => match &self.item {
                Some(kind) => items
                    .iter()
                    .map(|item| kind.to_value(item).map_err(|_| invalid()))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List),
                None => Ok(raw.clone()),
            },
            _ => Err(invalid()),
        }
    }

    fn validate_value(&self, value: &Value) -> Result<(), FieldError> {
        let (Some(kind), Some(items)) = (&self.item, value.as_list()) else {
            return Ok(());
        };
        items
            .iter()
            .filter(|item| !kind.is_empty(item))
            .try_for_each(|item| kind.validate_value(item))
    }

    fn is_empty(&self, value: &Value) -> bool {
        value.is_null()
    }

    fn name_suffix(&self) -> &'static str {
        "[]"
    }

    fn default_value(&self) -> Value {
        Value::List(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Value {
        Value::from(v)
    }

    #[test]
    fn test_text_strips_and_defaults() {
        let text = Text::default();
        assert_eq!(text.to_value(&s("  hi ")).unwrap(), s("hi"));
        assert_eq!(text.to_value(&Value::Null).unwrap(), s(""));
        assert_eq!(text.to_value(&Value::Int(3)).unwrap(), s("3"));
        assert!(text.to_value(&Value::List(vec![])).is_err());

        let raw = Text {
            strip: false,
            ..Text::default()
        };
        assert_eq!(raw.to_value(&s("  hi ")).unwrap(), s("  hi "));
    }

    #[test]
    fn test_text_length_and_pattern() {
        let text = Text {
            min_length: Some(2),
            max_length: Some(4),
            ..Text::default()
        }
        .with_pattern("[a-z]+")
        .unwrap();
        assert!(text.validate_value(&s("abc")).is_ok());
        assert_eq!(text.validate_value(&s("a")).unwrap_err().code, messages::MIN_LENGTH);
        assert_eq!(text.validate_value(&s("abcde")).unwrap_err().code, messages::MAX_LENGTH);
        assert_eq!(text.validate_value(&s("ab1")).unwrap_err().code, messages::PATTERN);
    }

    #[test]
    fn test_text_bad_pattern() {
        assert!(matches!(
            Text::default().with_pattern("("),
            Err(FormError::ImproperlyConfigured(_))
        ));
    }

    #[test]
    fn test_integer() {
        let int = Integer::default();
        assert_eq!(int.to_value(&s("20")).unwrap(), Value::Int(20));
        assert_eq!(int.to_value(&s(" 7 ")).unwrap(), Value::Int(7));
        assert_eq!(int.to_value(&s("")).unwrap(), Value::Null);
        assert_eq!(int.to_value(&Value::Float(4.0)).unwrap(), Value::Int(4));
        assert_eq!(int.to_value(&s("not an int")).unwrap_err().code, messages::INVALID);
        assert!(int.to_value(&Value::Float(4.5)).is_err());
    }

    #[test]
    fn test_integer_rejects_floats_outside_range() {
        let int = Integer::default();
        assert_eq!(int.to_value(&Value::Float(1e20)).unwrap_err().code, messages::INVALID);
        assert_eq!(int.to_value(&Value::Float(-1e20)).unwrap_err().code, messages::INVALID);
        assert!(int.to_value(&Value::Float(f64::INFINITY)).is_err());
        assert!(int.to_value(&Value::Float(f64::NAN)).is_err());
        assert_eq!(
            int.to_value(&Value::Float(-9_223_372_036_854_775_808.0)).unwrap(),
            Value::Int(i64::MIN)
        );
    }

    #[test]
    fn test_integer_multiple_of_negative_step_at_minimum() {
        let int = Integer {
            multiple_of: Some(-1),
            ..Integer::default()
        };
        let value = int.to_value(&s("-9223372036854775808")).unwrap();
        assert_eq!(value, Value::Int(i64::MIN));
        assert!(int.validate_value(&value).is_ok());

        let int = Integer {
            multiple_of: Some(-3),
            ..Integer::default()
        };
        assert!(int.validate_value(&Value::Int(9)).is_ok());
        assert_eq!(int.validate_value(&Value::Int(10)).unwrap_err().code, messages::MULTIPLE_OF);
    }

    #[test]
    fn test_integer_constraints() {
        let int = Integer {
            gte: Some(0),
            lt: Some(100),
            multiple_of: Some(5),
            ..Integer::default()
        };
        assert!(int.validate_value(&Value::Int(15)).is_ok());
        assert_eq!(int.validate_value(&Value::Int(-5)).unwrap_err().code, messages::GTE);
        assert_eq!(int.validate_value(&Value::Int(100)).unwrap_err().code, messages::LT);
        let err = int.validate_value(&Value::Int(7)).unwrap_err();
        assert_eq!(err.code, messages::MULTIPLE_OF);
        assert_eq!(err.args.unwrap()["multiple_of"], Value::Int(5));
    }

    #[test]
    fn test_float() {
        let float = Float {
            lte: Some(1.0),
            ..Float::default()
        };
        assert_eq!(float.to_value(&s("20")).unwrap(), Value::Float(20.0));
        assert_eq!(float.to_value(&s("15.5")).unwrap(), Value::Float(15.5));
        assert_eq!(float.to_value(&Value::Int(0)).unwrap(), Value::Float(0.0));
        assert!(float.to_value(&s("not a float")).is_err());
        assert!(float.to_value(&s("NaN")).is_err());
        assert_eq!(float.validate_value(&Value::Float(1.5)).unwrap_err().code, messages::LTE);
    }

    #[test]
    fn test_boolean() {
        let boolean = Boolean;
        assert_eq!(boolean.to_value(&s("")).unwrap(), Value::Bool(true));
        assert_eq!(boolean.to_value(&s("on")).unwrap(), Value::Bool(true));
        assert_eq!(boolean.to_value(&s("false")).unwrap(), Value::Bool(false));
        assert_eq!(boolean.to_value(&s("OFF")).unwrap(), Value::Bool(false));
        assert_eq!(boolean.to_value(&Value::Null).unwrap(), Value::Bool(false));
        assert!(!boolean.is_empty(&Value::Bool(false)));
        assert!(!boolean.empty_keeps_object());
    }

    #[test]
    fn test_date() {
        let expected = Value::Date(NaiveDate::from_ymd_opt(1990, 5, 15).unwrap());
        assert_eq!(Date.to_value(&s("1990-05-15")).unwrap(), expected);
        assert_eq!(Date.to_value(&s("")).unwrap(), Value::Null);
        assert!(Date.to_value(&s("not a date")).is_err());
    }

    #[test]
    fn test_datetime() {
        let expected = NaiveDate::from_ymd_opt(2025, 6, 5)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(
            DateTime.to_value(&s("2025-06-05T08:30:00")).unwrap(),
            Value::DateTime(expected)
        );
        assert_eq!(
            DateTime.to_value(&s("2025-06-05 08:30")).unwrap(),
            Value::DateTime(expected)
        );
        assert!(DateTime.to_value(&s("not a datetime")).is_err());
    }

    #[test]
    fn test_time_precision() {
        let t = |h, m, sec| Value::Time(NaiveTime::from_hms_opt(h, m, sec).unwrap());
        assert_eq!(Time.to_value(&s("14")).unwrap(), t(14, 0, 0));
        assert_eq!(Time.to_value(&s("14:30")).unwrap(), t(14, 30, 0));
        assert_eq!(Time.to_value(&s("14:30:45")).unwrap(), t(14, 30, 45));
        assert!(Time.to_value(&s("25")).is_err());
        assert!(Time.to_value(&s("not a time")).is_err());
        assert!(Time.to_value(&s("1:2:3:4")).is_err());
    }

    #[test]
    fn test_email() {
        let email = Email::default();
        assert_eq!(
            email.to_value(&s(" Ann@Example.COM ")).unwrap(),
            s("Ann@example.com")
        );
        assert_eq!(email.to_value(&s("")).unwrap(), s(""));
        assert_eq!(
            email.to_value(&s("not-an-email")).unwrap_err().code,
            messages::INVALID_EMAIL
        );
    }

    #[test]
    fn test_slug() {
        assert!(Slug.validate_value(&s("hello-world_2")).is_ok());
        assert_eq!(
            Slug.validate_value(&s("hello world")).unwrap_err().code,
            messages::INVALID_SLUG
        );
        assert_eq!(Slug.to_value(&s(" a-b ")).unwrap(), s("a-b"));
    }

    #[test]
    fn test_url() {
        assert!(Url.validate_value(&s("https://example.com/a?b=c")).is_ok());
        assert_eq!(
            Url.validate_value(&s("ftp://example.com")).unwrap_err().code,
            messages::INVALID_URL
        );
    }

    #[test]
    fn test_uuid() {
        let id = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        assert_eq!(
            Uuid.to_value(&s(id)).unwrap(),
            Value::Uuid(uuid::Uuid::parse_str(id).unwrap())
        );
        assert!(Uuid.to_value(&s("nope")).is_err());
    }

    #[test]
    fn test_file_passes_through() {
        assert_eq!(File.to_value(&s("photo.jpg")).unwrap(), s("photo.jpg"));
        assert!(!File.is_empty(&s("")));
        assert!(File.is_empty(&Value::Null));
    }

    #[test]
    fn test_list() {
        let list = List::of(Integer::default());
        assert_eq!(list.name_suffix(), "[]");
        assert_eq!(list.default_value(), Value::List(vec![]));
        assert_eq!(
            list.to_value(&Value::List(vec![s("1"), s("2")])).unwrap(),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(list.to_value(&s("not a list")).unwrap_err().code, messages::INVALID);
        assert_eq!(
            list.to_value(&Value::List(vec![s("no"), s("nope")])).unwrap_err().code,
            messages::INVALID
        );
        assert!(!list.is_empty(&Value::List(vec![])));
    }

    #[test]
    fn test_list_validates_items() {
        let list = List::of(Integer {
            gt: Some(0),
            ..Integer::default()
        });
        assert!(list.validate_value(&Value::List(vec![Value::Int(1)])).is_ok());
        assert_eq!(
            list.validate_value(&Value::List(vec![Value::Int(0)])).unwrap_err().code,
            messages::GT
        );
    }
}
