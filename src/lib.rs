//! Schema-driven coercion of loosely-typed JSON into typed model instances,
//! and the reverse dump back to wire form.
//!
//! ```
//! use json_coerce::{FieldDecl, Registry, Type};
//! use serde_json::json;
//!
//! let mut registry = Registry::new();
//! registry.register("Leg", [FieldDecl::required("id", "string")]).unwrap();
//!
//! let out = registry.conversion().coerce_value(&Type::named("Leg"), json!({"id": "abc"}));
//! assert!(out.state.is_clean());
//! ```
pub mod conversion;
pub mod data;
pub mod error;
pub mod path_de;
pub mod registry;
pub mod schema;
pub mod types;

pub use conversion::{
    Attr, AttrKind, CoerceState, Coerced, Conversion, Converter, DeclaredType, DumpState, FieldDecl,
    PropertyInfo, Strictness,
};
pub use data::{Data, Model, Scalar};
pub use error::{ConversionError, SchemaError};
pub use registry::Registry;
pub use schema::Schema;
pub use types::{Primitive, Type};
