//! Log records and their values.

use std::fmt;
use std::panic::Location;

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use super::severity::Severity;
use super::stacktrace::{function_at, relative_to_cwd, Stacktrace};

/// Keys the formatters treat specially.
pub const RESERVED_KEYS: [&str; 8] = [
    "message",
    "time",
    "source_location",
    "severity",
    "caller",
    "name",
    "commit",
    "stacktrace",
];

pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Where a log call was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub function: Option<String>,
}

impl SourceLocation {
    /// Build from a `#[track_caller]` location, resolving the enclosing function.
    pub fn from_caller(location: &'static Location<'static>) -> Self {
        Self {
            file: relative_to_cwd(location.file().as_ref()),
            line: location.line(),
            function: function_at(location.file(), location.line()),
        }
    }

    /// Top frame of a fresh stack capture after skipping `skip` caller frames.
    pub fn capture(skip: usize) -> Option<Self> {
        Stacktrace::capture(skip).frames().first().map(|frame| Self {
            file: frame.file.clone(),
            line: frame.line,
            function: Some(frame.function.clone()),
        })
    }
}

/// Drop the module path, keeping `Type::method` or `function`.
fn short_function(function: &str) -> &str {
    let mut segments = function.rsplitn(3, "::");
    let last = segments.next().unwrap_or(function);
    match segments.next() {
        Some(parent) if parent.starts_with(|c: char| c.is_ascii_uppercase()) => {
            let start = function.len() - last.len() - 2 - parent.len();
            &function[start..]
        }
        _ => last,
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.function {
            Some(function) => write!(f, "{} @ {}:{}", short_function(function), self.file, self.line),
            None => write!(f, "{}:{}", self.file, self.line),
        }
    }
}

impl Serialize for SourceLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("SourceLocation", 3)?;
        s.serialize_field("file", &self.file)?;
        s.serialize_field("line", &self.line)?;
        s.serialize_field("function", self.function.as_deref().unwrap_or(""))?;
        s.end()
    }
}

/// A single log value.
#[derive(Debug, Clone)]
pub enum Value {
    Str(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Location(SourceLocation),
    Stacktrace(Stacktrace),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(v) => f.write_str(v),
            Value::Int(v) => write!(f, "{v}"),
            Value::Uint(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Location(v) => write!(f, "{v}"),
            Value::Stacktrace(v) => write!(f, "{v}"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Str(v) => serializer.serialize_str(v),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Uint(v) => serializer.serialize_u64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Location(v) => v.serialize(serializer),
            Value::Stacktrace(v) => v.serialize(serializer),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident as $conv:ty),* $(,)?) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(<$conv>::from(v))
            }
        })*
    };
}

value_from! {
    String => Str as String,
    &str => Str as String,
    i64 => Int as i64,
    i32 => Int as i64,
    u64 => Uint as u64,
    u32 => Uint as u64,
    u16 => Uint as u64,
    f64 => Float as f64,
    f32 => Float as f64,
    bool => Bool as bool,
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Uint(v as u64)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Str(v.clone())
    }
}

impl From<std::net::SocketAddr> for Value {
    fn from(v: std::net::SocketAddr) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<SourceLocation> for Value {
    fn from(v: SourceLocation) -> Self {
        Value::Location(v)
    }
}

impl From<Stacktrace> for Value {
    fn from(v: Stacktrace) -> Self {
        Value::Stacktrace(v)
    }
}

/// One structured log entry: ordered key/value pairs plus a severity.
#[derive(Debug, Clone)]
pub struct Record {
    severity: Severity,
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(severity: Severity) -> Self {
        Self {
            severity,
            fields: Vec::new(),
        }
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.push((key.into(), value.into()));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == key)
    }

    /// Last value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.fields.iter_mut().rev().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn stacktrace(&self) -> Option<&Stacktrace> {
        match self.get("stacktrace") {
            Some(Value::Stacktrace(st)) => Some(st),
            _ => None,
        }
    }

    /// Fields with duplicate keys collapsed; the last value wins and keeps its position.
    pub fn deduplicated(&self) -> impl Iterator<Item = &(String, Value)> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(i, (key, _))| !self.fields[i + 1..].iter().any(|(k, _)| k == key))
            .map(|(_, kv)| kv)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in self.deduplicated() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
