//! Tagged values.
//!
//! Filters compare entry fields against `Value`s; xattr maps store them.
//! The set of kinds is fixed: backends may refuse a kind their dialect
//! cannot express, but they never extend it.

use std::collections::BTreeMap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// An ordered map of named values, used for xattrs and map comparisons.
pub type ValueMap = BTreeMap<String, Value>;

bitflags! {
    /// Option flags of a regex value.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct RegexOptions: u32 {
        const CASE_INSENSITIVE = 0x0001;
    }
}

/// A tagged value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// Raw bytes, compared byte-for-byte.
    Binary(Vec<u8>),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    String(String),
    /// A regex pattern with its option flags. Matching is not anchored.
    Regex {
        pattern: String,
        options: RegexOptions,
    },
    /// A sequence of values, used by the `in` operator.
    Sequence(Vec<Value>),
    /// A string-keyed map of values.
    Map(ValueMap),
}

impl Value {
    /// A short name for the kind of this value, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Binary(_) => "binary",
            Value::Int32(_) => "int32",
            Value::UInt32(_) => "uint32",
            Value::Int64(_) => "int64",
            Value::UInt64(_) => "uint64",
            Value::String(_) => "string",
            Value::Regex { .. } => "regex",
            Value::Sequence(_) => "sequence",
            Value::Map(_) => "map",
        }
    }

    /// Check whether this value is one of the four integer kinds.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Value::Int32(_) | Value::UInt32(_) | Value::Int64(_) | Value::UInt64(_)
        )
    }

    /// The numeric value of an integer kind, widened so every kind fits.
    pub fn as_int(&self) -> Option<i128> {
        match *self {
            Value::Int32(n) => Some(n.into()),
            Value::UInt32(n) => Some(n.into()),
            Value::Int64(n) => Some(n.into()),
            Value::UInt64(n) => Some(n.into()),
            _ => None,
        }
    }

    /// The integer value reinterpreted as a 64-bit bit-vector, for the
    /// bitwise comparison operators.
    pub fn as_bits(&self) -> Option<u64> {
        self.as_int().map(|n| n as u64)
    }

    /// Build a regex value.
    pub fn regex(pattern: impl Into<String>, options: RegexOptions) -> Self {
        Value::Regex {
            pattern: pattern.into(),
            options,
        }
    }
}

impl From<&str> for Value {
    fn from(string: &str) -> Self {
        Value::String(string.to_owned())
    }
}

impl From<String> for Value {
    fn from(string: String) -> Self {
        Value::String(string)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::UInt32(n)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::UInt64(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int32(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int64(n)
    }
}
