//! Runtime values the engine reads and produces.
//!
//! Raw JSON enters as [`Data`] through `From<serde_json::Value>`; coercion
//! replaces the parts it recognizes with typed variants (`Int` vs `Float`,
//! `DateTime`, [`Model`] instances) and leaves everything else as it was.
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Null,
    Bool(bool),
    Int(i64),
    /// integers above `i64::MAX`
    UInt(u64),
    Float(f64),
    String(String),
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
    List(Vec<Data>),
    Map(IndexMap<String, Data>),
    Model(Model),
}

/// An instance of a registered structured type.
///
/// Fields are keyed by their in-memory name. Keys the schema does not
/// declare are kept alongside the declared ones so they survive a dump.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    type_name: String,
    fields: IndexMap<String, Data>,
}

impl Model {
    /// Wraps data that already went through coercion. Nothing is re-checked.
    pub(crate) fn from_coerced(type_name: impl Into<String>, fields: IndexMap<String, Data>) -> Self {
        Self { type_name: type_name.into(), fields }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &IndexMap<String, Data> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Data> {
        self.fields.get(field)
    }

    pub fn into_fields(self) -> IndexMap<String, Data> {
        self.fields
    }
}

impl Data {
    /// Short name of the runtime kind, used in logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Data::Null => "null",
            Data::Bool(_) => "bool",
            Data::Int(_) | Data::UInt(_) => "int",
            Data::Float(_) => "float",
            Data::String(_) => "string",
            Data::DateTime(_) => "date-time",
            Data::Date(_) => "date",
            Data::List(_) => "list",
            Data::Map(_) => "map",
            Data::Model(_) => "model",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Data::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Data::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&Model> {
        match self {
            Data::Model(m) => Some(m),
            _ => None,
        }
    }

    /// Look up a key on a map or a model instance.
    pub fn get(&self, key: &str) -> Option<&Data> {
        match self {
            Data::Map(m) => m.get(key),
            Data::Model(m) => m.get(key),
            _ => None,
        }
    }

    pub fn scalar(&self) -> Option<Scalar> {
        match self {
            Data::Bool(b) => Some(Scalar::Bool(*b)),
            Data::Int(i) => Some(Scalar::Int(*i)),
            Data::UInt(u) => Some(Scalar::UInt(*u)),
            Data::Float(f) => Some(Scalar::Float(OrderedFloat(*f))),
            Data::String(s) => Some(Scalar::String(s.clone())),
            _ => None,
        }
    }
}

impl From<Value> for Data {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Data::Null,
            Value::Bool(b) => Data::Bool(b),
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => Data::Int(i),
                (None, Some(u)) => Data::UInt(u),
                (None, None) => Data::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Data::String(s),
            Value::Array(xs) => Data::List(xs.into_iter().map(Data::from).collect()),
            Value::Object(map) => Data::Map(map.into_iter().map(|(k, v)| (k, Data::from(v))).collect()),
        }
    }
}

impl From<bool> for Data {
    fn from(b: bool) -> Self { Data::Bool(b) }
}

impl From<i64> for Data {
    fn from(i: i64) -> Self { Data::Int(i) }
}

impl From<f64> for Data {
    fn from(f: f64) -> Self { Data::Float(f) }
}

impl From<&str> for Data {
    fn from(s: &str) -> Self { Data::String(s.to_string()) }
}

impl From<String> for Data {
    fn from(s: String) -> Self { Data::String(s) }
}

impl From<Model> for Data {
    fn from(m: Model) -> Self { Data::Model(m) }
}

impl From<Scalar> for Data {
    fn from(s: Scalar) -> Self {
        match s {
            Scalar::Bool(b) => Data::Bool(b),
            Scalar::Int(i) => Data::Int(i),
            Scalar::UInt(u) => Data::UInt(u),
            Scalar::Float(f) => Data::Float(f.0),
            Scalar::String(s) => Data::String(s),
        }
    }
}

// ------------------------------- Scalars ---------------------------------- //

/// Hashable scalar, compared strictly: `Int(1)` and `Float(1.0)` differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(OrderedFloat<f64>),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    String,
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::Int(_) | Scalar::UInt(_) => ScalarKind::Int,
            Scalar::Float(_) => ScalarKind::Float,
            Scalar::String(_) => ScalarKind::String,
        }
    }

    /// `None` for null, arrays and objects.
    pub fn from_json(value: &Value) -> Option<Self> {
        match Data::from(value.clone()) {
            Data::Null | Data::List(_) | Data::Map(_) => None,
            other => other.scalar(),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self { Scalar::String(s.to_string()) }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self { Scalar::Int(i) }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self { Scalar::Float(OrderedFloat(f)) }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self { Scalar::Bool(b) }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::UInt(u) => write!(f, "{u}"),
            Scalar::Float(x) => write!(f, "{}", x.0),
            Scalar::String(s) => write!(f, "{s:?}"),
        }
    }
}
