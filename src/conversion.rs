//! Structural coercion and dump engine.
//!
//! Coercion walks a raw value against a [`Type`] and returns the best typed
//! reading it can find, tallying how well the value fit in a
//! [`CoerceState`]. It never fails: mismatches become `no`/`maybe` scores,
//! and deciding whether a score is acceptable is left to the caller (see
//! [`Conversion::coerce_checked`]).
//!
//! Dump is the inverse: typed [`Data`] back to plain JSON, keyed by wire
//! names.
pub mod array_of;
pub mod enum_of;
pub mod model_of;
pub mod primitive;
pub mod property;
pub mod state;
pub mod union_of;

use chrono::SecondsFormat;
use indexmap::IndexMap;
use serde_json::{Map, Number, Value};
use tracing::warn;

pub use array_of::{ListOf, MapOf};
pub use enum_of::EnumOf;
pub use model_of::ModelOf;
pub use property::{derive_type, Attr, AttrKind, DeclaredType, FieldDecl, PropertyInfo};
pub use state::{CoerceState, DumpState};
pub use union_of::UnionOf;

use crate::data::Data;
use crate::error::ConversionError;
use crate::registry::Registry;
use crate::types::Type;

/// The two operations every composite descriptor provides.
pub trait Converter {
    fn coerce(&self, cx: Conversion<'_>, value: Data, state: &mut CoerceState) -> Data;
    fn dump(&self, cx: Conversion<'_>, value: &Data, state: &mut DumpState) -> Value;
}

/// Entry point: dispatches on descriptors, resolving model names through a
/// [`Registry`]. Cheap to copy; holds no state of its own.
#[derive(Clone, Copy, Debug)]
pub struct Conversion<'r> {
    registry: &'r Registry,
}

/// A coerced value together with the scores that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced {
    pub value: Data,
    pub state: CoerceState,
}

/// How [`Conversion::coerce_checked`] turns scores into a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// reject any `no`
    #[default]
    Lenient,
    /// reject any `no` or `maybe`
    Strict,
}

impl Strictness {
    pub fn accepts(self, state: &CoerceState) -> bool {
        match self {
            Strictness::Lenient => state.no == 0,
            Strictness::Strict => state.is_clean(),
        }
    }
}

impl<'r> Conversion<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn coerce(self, ty: &Type, value: Data, state: &mut CoerceState) -> Data {
        match ty {
            Type::Primitive(p) => p.coerce(value, state),
            Type::Model(name) => match self.registry.get(name) {
                Some(model) => model.coerce(self, value, state),
                None => {
                    warn!(model = %name, "coercing against an unregistered model");
                    state.no += 1;
                    value
                }
            },
            Type::List(c) => c.coerce(self, value, state),
            Type::Map(c) => c.coerce(self, value, state),
            Type::Enum(c) => c.coerce(self, value, state),
            Type::Union(c) => c.coerce(self, value, state),
        }
    }

    pub fn dump(self, ty: &Type, value: &Data, state: &mut DumpState) -> Value {
        match ty {
            Type::Primitive(_) => self.dump_unknown(value, state),
            Type::Model(name) => match self.registry.get(name) {
                Some(model) => model.dump(self, value, state),
                None => {
                    warn!(model = %name, "dumping against an unregistered model");
                    self.dump_unknown(value, state)
                }
            },
            Type::List(c) => c.dump(self, value, state),
            Type::Map(c) => c.dump(self, value, state),
            Type::Enum(c) => c.dump(self, value, state),
            Type::Union(c) => c.dump(self, value, state),
        }
    }

    /// Best-effort plain JSON for a value with no declared descriptor.
    pub fn dump_unknown(self, value: &Data, state: &mut DumpState) -> Value {
        match value {
            Data::Null => Value::Null,
            Data::Bool(b) => Value::Bool(*b),
            Data::Int(i) => Value::from(*i),
            Data::UInt(u) => Value::from(*u),
            // non-finite floats have no JSON form
            Data::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Data::String(s) => Value::String(s.clone()),
            Data::DateTime(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
            Data::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            Data::List(xs) => Value::Array(xs.iter().map(|x| self.dump_unknown(x, state)).collect()),
            Data::Map(entries) => {
                let mut out = Map::new();
                for (k, v) in entries {
                    out.insert(k.clone(), self.dump_unknown(v, state));
                }
                Value::Object(out)
            }
            Data::Model(m) => match self.registry.get(m.type_name()) {
                Some(model) => model.dump(self, value, state),
                None => {
                    let mut out = Map::new();
                    for (k, v) in m.fields() {
                        out.insert(k.clone(), self.dump_unknown(v, state));
                    }
                    Value::Object(out)
                }
            },
        }
    }

    // ------------------------------ conveniences ------------------------------ //

    /// Coerce a freshly decoded wire payload.
    pub fn coerce_value(self, ty: &Type, value: Value) -> Coerced {
        let mut state = CoerceState::new();
        let value = self.coerce(ty, Data::from(value), &mut state);
        Coerced { value, state }
    }

    pub fn dump_value(self, ty: &Type, value: &Data) -> (Value, DumpState) {
        let mut state = DumpState::new();
        let out = self.dump(ty, value, &mut state);
        (out, state)
    }

    /// Build a model instance from values keyed by in-memory field names.
    pub fn construct(self, model: &str, fields: IndexMap<String, Data>) -> Coerced {
        let mut state = CoerceState::native();
        let value = self.coerce(&Type::named(model), Data::Map(fields), &mut state);
        Coerced { value, state }
    }

    /// Coerce and reject the result when the scores fall short of `strictness`.
    pub fn coerce_checked(self, ty: &Type, value: Value, strictness: Strictness) -> Result<Data, ConversionError> {
        let Coerced { value, state } = self.coerce_value(ty, value);
        if strictness.accepts(&state) {
            Ok(value)
        } else {
            Err(ConversionError::Rejected {
                target: ty.to_string(),
                yes: state.yes,
                maybe: state.maybe,
                no: state.no,
            })
        }
    }
}
