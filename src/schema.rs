//! JSON schema descriptions: the on-disk form of a [`Registry`].
//!
//! ```json
//! {
//!   "root": "CallEvent",
//!   "models": {
//!     "CallEvent": {
//!       "fields": {
//!         "eventType": { "type": "string", "attr": "required", "api_name": "event_type" },
//!         "payload":   { "type": "CallAnswered|CallHangup|null", "attr": "optional" },
//!         "tags":      { "type": "array", "attr": "optional", "as": { "list": "string" } }
//!       }
//!     }
//!   }
//! }
//! ```
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::conversion::{derive_type, Attr, AttrKind, DeclaredType, FieldDecl};
use crate::data::Scalar;
use crate::error::SchemaError;
use crate::path_de;
use crate::registry::Registry;
use crate::types::Type;

// ————————————————————————————————————————————————————————————————————————————
// DOCUMENT
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDoc {
    #[serde(default)]
    root: Option<String>,
    models: IndexMap<String, ModelDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelDoc {
    #[serde(default)]
    fields: IndexMap<String, FieldDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldDoc {
    #[serde(rename = "type", default)]
    ty: Option<TypeDoc>,
    #[serde(default)]
    attr: Option<AttrDoc>,
    #[serde(default)]
    api_name: Option<String>,
    #[serde(rename = "as", default)]
    as_type: Option<TypeDoc>,
    #[serde(default)]
    nullable: bool,
    #[serde(default)]
    optional: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum AttrDoc {
    Required,
    Optional,
    Api,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TypeDoc {
    Expr(String),
    List { list: Box<TypeDoc> },
    Map { map: Box<TypeDoc> },
    Enum {
        #[serde(rename = "enum")]
        members: Vec<Value>,
    },
    Union {
        union: UnionDoc,
        #[serde(default)]
        discriminator: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UnionDoc {
    Variants(Vec<TypeDoc>),
    Keyed(IndexMap<String, TypeDoc>),
}

// ————————————————————————————————————————————————————————————————————————————
// LOWERING
// ————————————————————————————————————————————————————————————————————————————

impl From<AttrDoc> for AttrKind {
    fn from(doc: AttrDoc) -> Self {
        match doc {
            AttrDoc::Required => AttrKind::Required,
            AttrDoc::Optional => AttrKind::Optional,
            AttrDoc::Api => AttrKind::Api,
        }
    }
}

impl TypeDoc {
    /// Expressions stay declared types so intersections are reported when
    /// the model is registered; converter objects lower straight to a [`Type`].
    fn into_declared(self) -> Result<DeclaredType, SchemaError> {
        match self {
            TypeDoc::Expr(expr) => DeclaredType::parse(&expr),
            other => other.into_type().map(DeclaredType::Converter),
        }
    }

    fn into_type(self) -> Result<Type, SchemaError> {
        match self {
            TypeDoc::Expr(expr) => derive_type(&DeclaredType::parse(&expr)?),
            TypeDoc::List { list } => Ok(Type::list(list.into_type()?)),
            TypeDoc::Map { map } => Ok(Type::map(map.into_type()?)),
            TypeDoc::Enum { members } => {
                let members = members
                    .iter()
                    .map(|m| Scalar::from_json(m).ok_or_else(|| SchemaError::InvalidEnumMember(m.to_string())))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Type::enum_of(members))
            }
            TypeDoc::Union { union: UnionDoc::Variants(variants), discriminator } => {
                let variants = variants
                    .into_iter()
                    .map(TypeDoc::into_type)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(match discriminator {
                    // each variant answers to its own type name
                    Some(field) => Type::discriminated(field, variants.into_iter().map(|t| (t.to_string(), t))),
                    None => Type::union(variants),
                })
            }
            TypeDoc::Union { union: UnionDoc::Keyed(keyed), discriminator } => {
                let keyed = keyed
                    .into_iter()
                    .map(|(k, t)| Ok((k, t.into_type()?)))
                    .collect::<Result<Vec<_>, SchemaError>>()?;
                Ok(match discriminator {
                    Some(field) => Type::discriminated(field, keyed),
                    None => Type::union(keyed.into_iter().map(|(_, t)| t)),
                })
            }
        }
    }
}

impl FieldDoc {
    fn into_decl(self, name: String) -> Result<FieldDecl, SchemaError> {
        let mut decl = match self.ty {
            Some(ty) => FieldDecl::new(name, ty.into_declared()?),
            None => FieldDecl::untyped(name),
        };
        let Some(kind) = self.attr else {
            return Ok(decl);
        };
        let mut attr = match AttrKind::from(kind) {
            AttrKind::Required => Attr::required(),
            AttrKind::Optional => Attr::optional(),
            AttrKind::Api => Attr::api(),
        };
        if let Some(wire) = self.api_name {
            attr = attr.rename(wire);
        }
        if let Some(ty) = self.as_type {
            attr = attr.with_type(ty.into_declared()?);
        }
        if self.nullable {
            attr = attr.nullable();
        }
        if self.optional {
            attr = attr.allow_absent();
        }
        decl = decl.with_attr(attr);
        Ok(decl)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// API
// ————————————————————————————————————————————————————————————————————————————

/// A loaded, validated schema description.
#[derive(Debug)]
pub struct Schema {
    /// Default model for documents when the caller names none.
    pub root: Option<String>,
    pub registry: Registry,
}

impl Schema {
    /// The named model, or the root when `name` is `None`.
    pub fn target(&self, name: Option<&str>) -> Option<Type> {
        name.or(self.root.as_deref()).map(Type::named)
    }
}

pub fn load_str(src: &str) -> Result<Schema, SchemaError> {
    let doc: SchemaDoc = path_de::from_str_with_path(src)?;
    lower(doc)
}

pub fn load_path(path: impl AsRef<Path>) -> Result<Schema, SchemaError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| SchemaError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: SchemaDoc = path_de::from_slice_with_path(&bytes)?;
    let schema = lower(doc)?;
    info!(path = %path.display(), models = schema.registry.len(), "loaded schema");
    Ok(schema)
}

fn lower(doc: SchemaDoc) -> Result<Schema, SchemaError> {
    let mut registry = Registry::new();
    for (model, ModelDoc { fields }) in doc.models {
        let mut decls = Vec::with_capacity(fields.len());
        for (field, field_doc) in fields {
            let decl = field_doc.into_decl(field.clone()).map_err(|source| SchemaError::Field {
                model: model.clone(),
                field,
                source: Box::new(source),
            })?;
            decls.push(decl);
        }
        registry.register(model, decls)?;
    }
    registry.validate()?;
    if let Some(root) = &doc.root {
        if registry.get(root).is_none() {
            return Err(SchemaError::UnknownRoot(root.clone()));
        }
    }
    Ok(Schema { root: doc.root, registry })
}
