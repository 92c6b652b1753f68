//! Named conversion functions and the registry that holds them.
//!
//! Type casts (`:TYPE`) and convert pipelines (`=FUNC|ARG|...`) both
//! resolve through a [`FuncRegistry`]. Every function has the same
//! shape: it takes the current cell value plus string arguments and
//! returns a new value or a [`CastError`]. Readers and writers start
//! from different built-in sets and can be extended at runtime.

use crate::error::CastError;
use crate::values::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use std::collections::HashMap;
use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

/// Signature shared by type-cast and convert functions.
pub type ConvertFn = dyn Fn(Value, &[String]) -> Result<Value, CastError> + Send + Sync;

/// A registered function together with the name it was registered
/// under. Parsed headers hold handles so that the function a column
/// resolved to stays fixed even if the registry changes afterwards.
#[derive(Clone)]
pub struct FuncHandle {
    name: String,
    func: Arc<ConvertFn>,
}

impl FuncHandle {
    /// The name this function was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the function.
    pub fn call(&self, value: Value, args: &[String]) -> Result<Value, CastError> {
        (self.func)(value, args)
    }
}

impl fmt::Debug for FuncHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Name → function map used to resolve type casts and convert specs.
#[derive(Default)]
pub struct FuncRegistry {
    funcs: HashMap<String, Arc<ConvertFn>>,
}

impl FuncRegistry {
    /// Create a registry with no functions at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry preloaded with the read-side built-ins: `default`,
    /// `int`, `float`, `decimal`, `str`, `datetime` and `strptime`.
    pub fn reader_builtins() -> Self {
        let mut registry = Self::empty();
        registry.add_func("default", default_value);
        registry.add_func("int", parse_int);
        registry.add_func("float", parse_float);
        registry.add_func("decimal", parse_decimal);
        registry.add_func("str", to_text);
        registry.add_func("datetime", parse_datetime);
        registry.add_func("strptime", strptime);
        registry
    }

    /// Registry preloaded with the write-side built-ins: `strftime`.
    pub fn writer_builtins() -> Self {
        let mut registry = Self::empty();
        registry.add_func("strftime", strftime);
        registry
    }

    /// Register `func` under `name`, replacing any existing entry.
    pub fn add_func<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(Value, &[String]) -> Result<Value, CastError> + Send + Sync + 'static,
    {
        self.funcs.insert(name.into(), Arc::new(func));
    }

    /// Owned handle for the function registered under `name`.
    pub fn resolve(&self, name: &str) -> Option<FuncHandle> {
        self.funcs.get(name).map(|func| FuncHandle {
            name: name.to_string(),
            func: Arc::clone(func),
        })
    }

    /// Whether `handle` is still this registry's entry for its name.
    /// False for handles resolved elsewhere or displaced by
    /// re-registration.
    pub fn is_current(&self, handle: &FuncHandle) -> bool {
        self.funcs
            .get(&handle.name)
            .is_some_and(|func| Arc::ptr_eq(func, &handle.func))
    }
}

impl fmt::Debug for FuncRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.funcs.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FuncRegistry").field("funcs", &names).finish()
    }
}

/// Split a `FUNC|ARG|...` spec into the function name and its args.
pub fn split_spec(spec: &str) -> (&str, Vec<String>) {
    let mut parts = spec.split('|');
    let name = parts.next().unwrap_or("");
    let args = parts.map(str::to_string).collect();
    (name, args)
}

/// `default|FALLBACK`: substitutes the fallback for an empty string,
/// passes everything else through.
fn default_value(value: Value, args: &[String]) -> Result<Value, CastError> {
    let fallback = args.first().ok_or_else(|| CastError {
        message: "missing default value argument".to_string(),
        value: value.to_string(),
        expected: "default".to_string(),
    })?;
    match value {
        Value::Str(s) if s.is_empty() => Ok(Value::Str(fallback.clone())),
        other => Ok(other),
    }
}

/// `int` or `int|BASE`: parses an integer, base 10 unless given.
fn parse_int(value: Value, args: &[String]) -> Result<Value, CastError> {
    let base = match args.first() {
        Some(arg) => arg.parse::<u32>().map_err(|_| CastError {
            message: format!("invalid base '{arg}'"),
            value: value.to_string(),
            expected: "int".to_string(),
        })?,
        None => 10,
    };
    if !(2..=36).contains(&base) {
        return Err(CastError {
            message: format!("base {base} out of range"),
            value: value.to_string(),
            expected: "int".to_string(),
        });
    }
    let s = match &value {
        Value::Str(s) => s,
        _ => {
            return Err(CastError {
                message: "not a text value".to_string(),
                value: value.to_string(),
                expected: "int".to_string(),
            })
        }
    };
    match i64::from_str_radix(s.trim(), base) {
        Ok(i) => Ok(Value::Int(i)),
        Err(_) => Err(CastError {
            message: "invalid integer".to_string(),
            value: s.clone(),
            expected: "int".to_string(),
        }),
    }
}

/// `float`: parses text or widens a numeric value to a 64-bit float.
fn parse_float(value: Value, _args: &[String]) -> Result<Value, CastError> {
    let s = match &value {
        Value::Str(s) => s,
        Value::Int(i) => return Ok(Value::Float(*i as f64)),
        Value::Float(_) => return Ok(value),
        Value::Decimal(d) => {
            return d.to_f64().map(Value::Float).ok_or_else(|| CastError {
                message: "not representable".to_string(),
                value: value.to_string(),
                expected: "float".to_string(),
            })
        }
        Value::DateTime(_) => {
            return Err(CastError {
                message: "not a numeric value".to_string(),
                value: value.to_string(),
                expected: "float".to_string(),
            })
        }
    };
    match s.trim().parse::<f64>() {
        Ok(f) => Ok(Value::Float(f)),
        Err(_) => Err(CastError {
            message: "invalid float".to_string(),
            value: s.clone(),
            expected: "float".to_string(),
        }),
    }
}

/// `decimal`: parses text (accepting scientific notation) or converts
/// a numeric value to an exact decimal.
fn parse_decimal(value: Value, _args: &[String]) -> Result<Value, CastError> {
    let s = match &value {
        Value::Str(s) => s,
        Value::Int(i) => return Ok(Value::Decimal(Decimal::from(*i))),
        Value::Float(f) => {
            return Decimal::from_f64(*f)
                .map(Value::Decimal)
                .ok_or_else(|| CastError {
                    message: "not representable".to_string(),
                    value: value.to_string(),
                    expected: "decimal".to_string(),
                })
        }
        Value::Decimal(_) => return Ok(value),
        Value::DateTime(_) => {
            return Err(CastError {
                message: "not a numeric value".to_string(),
                value: value.to_string(),
                expected: "decimal".to_string(),
            })
        }
    };
    let trimmed = s.trim();
    if let Ok(d) = trimmed.parse::<Decimal>() {
        return Ok(Value::Decimal(d));
    }
    match Decimal::from_scientific(trimmed) {
        Ok(d) => Ok(Value::Decimal(d)),
        Err(_) => Err(CastError {
            message: "invalid decimal".to_string(),
            value: s.clone(),
            expected: "decimal".to_string(),
        }),
    }
}

/// `str`: stringifies any value; text passes through unchanged.
fn to_text(value: Value, _args: &[String]) -> Result<Value, CastError> {
    match value {
        Value::Str(s) => Ok(Value::Str(s)),
        other => Ok(Value::Str(other.to_string())),
    }
}

/// `datetime`: passes a date/time through unchanged, otherwise parses
/// ISO-8601 text.
fn parse_datetime(value: Value, _args: &[String]) -> Result<Value, CastError> {
    let s = match &value {
        Value::DateTime(_) => return Ok(value),
        Value::Str(s) => s,
        _ => {
            return Err(CastError {
                message: "not a text value".to_string(),
                value: value.to_string(),
                expected: "datetime".to_string(),
            })
        }
    };
    // Try RFC 3339 first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(Value::DateTime(dt.with_timezone(&Utc)));
    }
    // Fallback: no timezone
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Value::DateTime(ndt.and_utc()));
    }
    // Fallback: space instead of T
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(Value::DateTime(ndt.and_utc()));
    }
    // Fallback: date only, taken as midnight
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(Value::DateTime(date.and_time(NaiveTime::MIN).and_utc()));
    }
    Err(CastError {
        message: "invalid datetime format".to_string(),
        value: s.clone(),
        expected: "datetime".to_string(),
    })
}

/// `strptime|FORMAT`: parses a date/time with an explicit format.
/// Date-only formats become midnight; time-only formats land on the
/// epoch date.
fn strptime(value: Value, args: &[String]) -> Result<Value, CastError> {
    let format = args.first().ok_or_else(|| CastError {
        message: "missing format argument".to_string(),
        value: value.to_string(),
        expected: "strptime".to_string(),
    })?;
    let s = match &value {
        Value::Str(s) => s,
        _ => {
            return Err(CastError {
                message: "not a text value".to_string(),
                value: value.to_string(),
                expected: "strptime".to_string(),
            })
        }
    };
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
        return Ok(Value::DateTime(ndt.and_utc()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, format) {
        return Ok(Value::DateTime(date.and_time(NaiveTime::MIN).and_utc()));
    }
    if let Ok(time) = NaiveTime::parse_from_str(s, format) {
        let dt = DateTime::<Utc>::UNIX_EPOCH.date_naive().and_time(time);
        return Ok(Value::DateTime(dt.and_utc()));
    }
    Err(CastError {
        message: format!("does not match format '{format}'"),
        value: s.clone(),
        expected: "datetime".to_string(),
    })
}

/// `strftime|FORMAT`: renders a date/time with an explicit format.
fn strftime(value: Value, args: &[String]) -> Result<Value, CastError> {
    let format = args.first().ok_or_else(|| CastError {
        message: "missing format argument".to_string(),
        value: value.to_string(),
        expected: "strftime".to_string(),
    })?;
    let dt = match &value {
        Value::DateTime(dt) => dt,
        _ => {
            return Err(CastError {
                message: "not a datetime value".to_string(),
                value: value.to_string(),
                expected: "strftime".to_string(),
            })
        }
    };
    // chrono reports a bad format string only when rendering
    let mut out = String::new();
    match write!(out, "{}", dt.format(format)) {
        Ok(()) => Ok(Value::Str(out)),
        Err(_) => Err(CastError {
            message: format!("invalid format '{format}'"),
            value: value.to_string(),
            expected: "strftime".to_string(),
        }),
    }
}
