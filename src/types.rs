// Type descriptors: how to read and write one slot of data.
use std::fmt;

use crate::conversion::{EnumOf, ListOf, MapOf, UnionOf};
use crate::data::{Data, Scalar};

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Primitive(Primitive),
    Model(String),           // resolved through the registry at conversion time
    List(ListOf),
    Map(MapOf),
    Enum(EnumOf),
    Union(UnionOf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Mixed,
    Null,
    Bool,
    Int,
    Float,
    String,
    Array,                   // any list or map, elements untouched
    DateTime,
    Date,
}

impl Primitive {
    pub fn from_name(name: &str) -> Option<Self> {
        let p = match name {
            "mixed" => Primitive::Mixed,
            "null" => Primitive::Null,
            "bool" | "boolean" => Primitive::Bool,
            "int" | "integer" => Primitive::Int,
            "float" | "number" => Primitive::Float,
            "string" => Primitive::String,
            "array" => Primitive::Array,
            "date-time" | "datetime" | "DateTimeInterface" => Primitive::DateTime,
            "date" => Primitive::Date,
            _ => return None,
        };
        Some(p)
    }

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Mixed => "mixed",
            Primitive::Null => "null",
            Primitive::Bool => "bool",
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::String => "string",
            Primitive::Array => "array",
            Primitive::DateTime => "date-time",
            Primitive::Date => "date",
        }
    }
}

impl Type {
    /// A primitive when `name` is one, otherwise a reference to a model.
    pub fn named(name: &str) -> Self {
        match Primitive::from_name(name) {
            Some(p) => Type::Primitive(p),
            None => Type::Model(name.to_string()),
        }
    }

    pub fn model(name: impl Into<String>) -> Self {
        Type::Model(name.into())
    }

    pub fn list(item: Type) -> Self {
        Type::List(ListOf::new(item))
    }

    pub fn map(item: Type) -> Self {
        Type::Map(MapOf::new(item))
    }

    pub fn enum_of<S: Into<Scalar>>(members: impl IntoIterator<Item = S>) -> Self {
        Type::Enum(EnumOf::new(members))
    }

    pub fn union(variants: impl IntoIterator<Item = Type>) -> Self {
        Type::Union(UnionOf::new(variants))
    }

    pub fn discriminated<K: Into<String>>(
        field: impl Into<String>,
        variants: impl IntoIterator<Item = (K, Type)>,
    ) -> Self {
        Type::Union(UnionOf::discriminated(field, variants))
    }

    pub fn allows_null(&self) -> bool {
        match self {
            Type::Primitive(p) => matches!(p, Primitive::Null | Primitive::Mixed),
            Type::Union(u) => u.variants().iter().any(Type::allows_null),
            _ => false,
        }
    }

    /// Whether the runtime kind of `value` is one this descriptor would
    /// produce. Used to pick a union variant when dumping.
    pub fn accepts_kind(&self, value: &Data) -> bool {
        match (self, value) {
            (Type::Primitive(p), v) => match p {
                Primitive::Mixed => true,
                Primitive::Null => v.is_null(),
                Primitive::Bool => matches!(v, Data::Bool(_)),
                Primitive::Int => matches!(v, Data::Int(_) | Data::UInt(_)),
                Primitive::Float => matches!(v, Data::Float(_) | Data::Int(_) | Data::UInt(_)),
                Primitive::String => matches!(v, Data::String(_)),
                Primitive::Array => matches!(v, Data::List(_) | Data::Map(_)),
                Primitive::DateTime => matches!(v, Data::DateTime(_)),
                Primitive::Date => matches!(v, Data::Date(_)),
            },
            (Type::Model(name), Data::Model(m)) => m.type_name() == name,
            (Type::Model(_), Data::Map(_)) => true,
            (Type::List(_), Data::List(_)) => true,
            (Type::Map(_), Data::Map(_)) => true,
            (Type::Enum(e), v) => v.scalar().is_some_and(|s| e.kind() == Some(s.kind())),
            (Type::Union(u), v) => u.variants().iter().any(|t| t.accepts_kind(v)),
            _ => false,
        }
    }

    /// Every model name this descriptor refers to, in order of appearance.
    pub fn model_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Type::Primitive(_) | Type::Enum(_) => {}
            Type::Model(name) => out.push(name),
            Type::List(l) => l.item().model_refs(out),
            Type::Map(m) => m.item().model_refs(out),
            Type::Union(u) => {
                for t in u.variants() {
                    t.model_refs(out);
                }
            }
        }
    }
}

impl From<Primitive> for Type {
    fn from(p: Primitive) -> Self {
        Type::Primitive(p)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(p) => f.write_str(p.name()),
            Type::Model(name) => f.write_str(name),
            Type::List(l) => write!(f, "list<{}>", l.item()),
            Type::Map(m) => write!(f, "map<{}>", m.item()),
            Type::Enum(e) => {
                f.write_str("enum<")?;
                for (i, s) in e.members().enumerate() {
                    if i > 0 { f.write_str(",")?; }
                    write!(f, "{s}")?;
                }
                f.write_str(">")
            }
            Type::Union(u) => {
                for (i, t) in u.variants().iter().enumerate() {
                    if i > 0 { f.write_str("|")?; }
                    write!(f, "{t}")?;
                }
                Ok(())
            }
        }
    }
}
