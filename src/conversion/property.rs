//! Field declarations and the `PropertyInfo` derived from them.
//!
//! A [`FieldDecl`] is what a generated model states about one of its fields:
//! the declared type plus zero or more [`Attr`] annotations. A field without
//! annotations is not part of the schema.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::conversion::UnionOf;
use crate::error::SchemaError;
use crate::types::{Primitive, Type};

static TYPE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\?)?([A-Za-z_\\][A-Za-z0-9_.\-\\]*)$").expect("static regex")
});

/// A field type as written in the declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclaredType {
    /// `string`, `?CallEvent`
    Named { name: String, nullable: bool },
    /// `string|int|null`
    Union(Vec<DeclaredType>),
    /// `A&B`, never coercible
    Intersection(Vec<DeclaredType>),
    /// an already built descriptor, used as is
    Converter(Type),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    Required,
    Optional,
    Api,
}

/// Metadata attached to a field declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub kind: AttrKind,
    pub rename: Option<String>,
    pub ty: Option<DeclaredType>,
    pub nullable: bool,
    /// Only read for [`AttrKind::Api`]; the other kinds imply it.
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub declared: Option<DeclaredType>,
    pub attrs: Vec<Attr>,
}

/// Normalized metadata of one schema field.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyInfo {
    pub name: String,
    pub wire_name: String,
    pub ty: Type,
    pub nullable: bool,
    pub optional: bool,
}

// ------------------------------ DeclaredType ------------------------------ //

impl DeclaredType {
    /// `name` or `?name`, without validation.
    pub fn named(name: &str) -> Self {
        match name.strip_prefix('?') {
            Some(rest) => DeclaredType::Named { name: rest.to_string(), nullable: true },
            None => DeclaredType::Named { name: name.to_string(), nullable: false },
        }
    }

    /// Parse a type expression: `name`, `?name`, `A|B|null` or `A&B`.
    pub fn parse(expr: &str) -> Result<Self, SchemaError> {
        let expr = expr.trim();
        if expr.contains('&') {
            let parts = expr.split('&').map(parse_named).collect::<Result<Vec<_>, _>>()?;
            return Ok(DeclaredType::Intersection(parts));
        }
        if expr.contains('|') {
            let parts = expr.split('|').map(parse_named).collect::<Result<Vec<_>, _>>()?;
            return Ok(DeclaredType::Union(parts));
        }
        parse_named(expr)
    }

    pub fn allows_null(&self) -> bool {
        match self {
            DeclaredType::Named { name, nullable } => *nullable || name == "null" || name == "mixed",
            DeclaredType::Union(alts) => alts.iter().any(DeclaredType::allows_null),
            DeclaredType::Intersection(_) => false,
            DeclaredType::Converter(ty) => ty.allows_null(),
        }
    }
}

fn parse_named(raw: &str) -> Result<DeclaredType, SchemaError> {
    let raw = raw.trim();
    let caps = TYPE_NAME
        .captures(raw)
        .ok_or_else(|| SchemaError::InvalidTypeName(raw.to_string()))?;
    Ok(DeclaredType::Named {
        name: caps[2].to_string(),
        nullable: caps.get(1).is_some(),
    })
}

impl From<&str> for DeclaredType {
    fn from(name: &str) -> Self {
        DeclaredType::named(name)
    }
}

impl From<Type> for DeclaredType {
    fn from(ty: Type) -> Self {
        DeclaredType::Converter(ty)
    }
}

impl std::fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn join(f: &mut std::fmt::Formatter<'_>, parts: &[DeclaredType], sep: &str) -> std::fmt::Result {
            for (i, p) in parts.iter().enumerate() {
                if i > 0 { f.write_str(sep)?; }
                write!(f, "{p}")?;
            }
            Ok(())
        }
        match self {
            DeclaredType::Named { name, nullable: true } => write!(f, "?{name}"),
            DeclaredType::Named { name, nullable: false } => f.write_str(name),
            DeclaredType::Union(parts) => join(f, parts, "|"),
            DeclaredType::Intersection(parts) => join(f, parts, "&"),
            DeclaredType::Converter(ty) => write!(f, "{ty}"),
        }
    }
}

/// Turn a declared type into a descriptor. Intersections are rejected.
pub fn derive_type(declared: &DeclaredType) -> Result<Type, SchemaError> {
    match declared {
        DeclaredType::Named { name, .. } => Ok(Type::named(name)),
        DeclaredType::Union(alts) => {
            let variants = alts.iter().map(derive_type).collect::<Result<Vec<_>, _>>()?;
            Ok(Type::Union(UnionOf::new(variants)))
        }
        DeclaredType::Intersection(_) => Err(SchemaError::IntersectionType(declared.to_string())),
        DeclaredType::Converter(ty) => Ok(ty.clone()),
    }
}

// ---------------------------------- Attr ---------------------------------- //

impl Attr {
    fn of(kind: AttrKind) -> Self {
        Self { kind, rename: None, ty: None, nullable: false, optional: false }
    }

    pub fn required() -> Self {
        Self::of(AttrKind::Required)
    }

    pub fn optional() -> Self {
        Self::of(AttrKind::Optional)
    }

    pub fn api() -> Self {
        Self::of(AttrKind::Api)
    }

    pub fn rename(mut self, wire_name: impl Into<String>) -> Self {
        self.rename = Some(wire_name.into());
        self
    }

    pub fn with_type(mut self, ty: impl Into<DeclaredType>) -> Self {
        self.ty = Some(ty.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark an `Api` annotation as allowing the field to be absent.
    pub fn allow_absent(mut self) -> Self {
        self.optional = true;
        self
    }

    fn is_optional(&self) -> bool {
        match self.kind {
            AttrKind::Optional => true,
            AttrKind::Required => false,
            AttrKind::Api => self.optional,
        }
    }
}

// -------------------------------- FieldDecl ------------------------------- //

impl FieldDecl {
    pub fn new(name: impl Into<String>, declared: impl Into<DeclaredType>) -> Self {
        Self { name: name.into(), declared: Some(declared.into()), attrs: Vec::new() }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self { name: name.into(), declared: None, attrs: Vec::new() }
    }

    pub fn required(name: impl Into<String>, declared: impl Into<DeclaredType>) -> Self {
        Self::new(name, declared).with_attr(Attr::required())
    }

    pub fn optional(name: impl Into<String>, declared: impl Into<DeclaredType>) -> Self {
        Self::new(name, declared).with_attr(Attr::optional())
    }

    pub fn with_attr(mut self, attr: Attr) -> Self {
        self.attrs.push(attr);
        self
    }
}

// ------------------------------ PropertyInfo ------------------------------ //

impl PropertyInfo {
    /// `Ok(None)` for a field that carries no annotation.
    pub fn from_field(field: &FieldDecl) -> Result<Option<Self>, SchemaError> {
        if field.attrs.is_empty() {
            return Ok(None);
        }
        let wire_name = field
            .attrs
            .iter()
            .find_map(|a| a.rename.clone())
            .unwrap_or_else(|| field.name.clone());
        let declared = field
            .attrs
            .iter()
            .find_map(|a| a.ty.as_ref())
            .or(field.declared.as_ref());
        let ty = match declared {
            Some(d) => derive_type(d)?,
            None => Type::Primitive(Primitive::Mixed),
        };
        let nullable = field.declared.as_ref().is_some_and(DeclaredType::allows_null)
            || field.attrs.iter().any(|a| a.nullable);
        let optional = field.attrs.iter().any(Attr::is_optional);

        Ok(Some(Self { name: field.name.clone(), wire_name, ty, nullable, optional }))
    }
}
