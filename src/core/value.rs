//! Loggable values and their textual rendering
//!
//! A log call takes a sequence of values rather than a preformatted string.
//! Each value belongs to a small closed set of kinds, and every kind has one
//! deterministic rendering.

use serde_json::Value;
use std::fmt::{self, Write};

/// A single argument to a log call
#[derive(Debug, Clone, PartialEq)]
pub enum LogValue {
    Str(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    /// Structured data, rendered as compact JSON
    Record(Value),
}

impl fmt::Display for LogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogValue::Str(s) => f.write_str(s),
            LogValue::Int(n) => write!(f, "{n}"),
            LogValue::UInt(n) => write!(f, "{n}"),
            LogValue::Float(n) => write!(f, "{n}"),
            LogValue::Bool(b) => write!(f, "{b}"),
            // A bare JSON string would otherwise come out quoted
            LogValue::Record(Value::String(s)) => f.write_str(s),
            LogValue::Record(v) => write!(f, "{v}"),
        }
    }
}

/// Join values into one message, separated by single spaces
pub fn render_values(values: &[LogValue]) -> String {
    let mut message = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            message.push(' ');
        }
        let _ = write!(message, "{value}");
    }
    message
}

impl From<&str> for LogValue {
    fn from(s: &str) -> Self {
        LogValue::Str(s.to_owned())
    }
}

impl From<String> for LogValue {
    fn from(s: String) -> Self {
        LogValue::Str(s)
    }
}

impl From<&String> for LogValue {
    fn from(s: &String) -> Self {
        LogValue::Str(s.clone())
    }
}

impl From<bool> for LogValue {
    fn from(b: bool) -> Self {
        LogValue::Bool(b)
    }
}

impl From<f32> for LogValue {
    fn from(n: f32) -> Self {
        LogValue::Float(n as f64)
    }
}

impl From<f64> for LogValue {
    fn from(n: f64) -> Self {
        LogValue::Float(n)
    }
}

impl From<Value> for LogValue {
    fn from(v: Value) -> Self {
        LogValue::Record(v)
    }
}

impl<T: Into<LogValue>> From<Option<T>> for LogValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(LogValue::Record(Value::Null), Into::into)
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for LogValue {
            fn from(n: $t) -> Self {
                LogValue::Int(n as i64)
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for LogValue {
            fn from(n: $t) -> Self {
                LogValue::UInt(n as u64)
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64, isize);
impl_from_unsigned!(u8, u16, u32, u64, usize);
