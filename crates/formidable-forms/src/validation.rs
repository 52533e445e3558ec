//! Shared validation steps.
//!
//! These helpers are the pieces of the field-validation pipeline used both
//! by the binder and by the built-in scalar kinds:
//! 1. Hook chains, run before and after coercion
//! 2. The `one_of` membership check
//! 3. Length and numeric range checks
//!
//! Every check reports a [`FieldError`] rather than failing the whole form,
//! so errors accumulate across fields.

use formidable_core::error::FieldError;
use formidable_core::value::Value;

use crate::fields::Hook;
use crate::messages;

/// Returns `true` for values that count as "not submitted": null and the
/// empty string.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Runs `hooks` in order, feeding each one the previous result.
///
/// Stops at the first hook that fails and returns its error.
pub fn run_hooks(hooks: &[Hook], value: Value) -> Result<Value, FieldError> {
    hooks.iter().try_fold(value, |value, hook| hook(value))
}

/// Checks that `value` is one of `allowed`.
///
/// For a list value every item must be allowed.
pub fn check_one_of(allowed: &[Value], value: &Value) -> Result<(), FieldError> {
    let ok = match value {
        Value::List(items) => items.iter().all(|item| allowed.contains(item)),
        other => allowed.contains(other),
    };
    if ok {
        Ok(())
    } else {
        Err(FieldError::new(messages::ONE_OF).with_arg(messages::ONE_OF, allowed.to_vec()))
    }
}

/// Checks a length against optional bounds.
pub fn check_length(len: usize, min: Option<usize>, max: Option<usize>) -> Result<(), FieldError> {
    if let Some(min) = min {
        if len < min {
            return Err(FieldError::new(messages::MIN_LENGTH).with_arg(messages::MIN_LENGTH, min));
        }
    }
    if let Some(max) = max {
        if len > max {
            return Err(FieldError::new(messages::MAX_LENGTH).with_arg(messages::MAX_LENGTH, max));
        }
    }
    Ok(())
}

/// Exclusive and inclusive numeric bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds<T> {
    pub gt: Option<T>,
    pub gte: Option<T>,
    pub lt: Option<T>,
    pub lte: Option<T>,
}

impl<T> Bounds<T>
where
    T: PartialOrd + Copy + Into<Value>,
{
    /// Checks `n` against every bound that is set.
    pub fn check(&self, n: T) -> Result<(), FieldError> {
        let failed = |code: &str, bound: T| Err(FieldError::new(code).with_arg(code, bound));
        if let Some(gt) = self.gt {
            if n <= gt {
                return failed(messages::GT, gt);
            }
        }
        if let Some(gte) = self.gte {
            if n < gte {
                return failed(messages::GTE, gte);
            }
        }
        if let Some(lt) = self.lt {
            if n >= lt {
                return failed(messages::LT, lt);
            }
        }
        if let Some(lte) = self.lte {
            if n > lte {
                return failed(messages::LTE, lte);
            }
        }
        Ok(())
    }
}
