//! Structured types: a map of declared properties, coerced field by field.
use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::{CoerceState, Conversion, Converter, DumpState, FieldDecl, PropertyInfo};
use crate::data::{Data, Model};
use crate::error::SchemaError;

/// Converter for one registered model. Properties are derived once, when
/// the model is registered, and keyed by in-memory field name.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOf {
    name: String,
    properties: IndexMap<String, PropertyInfo>,
}

impl ModelOf {
    pub fn new(name: impl Into<String>, fields: impl IntoIterator<Item = FieldDecl>) -> Result<Self, SchemaError> {
        let name = name.into();
        let mut properties = IndexMap::new();
        for field in fields {
            let info = PropertyInfo::from_field(&field).map_err(|source| SchemaError::Field {
                model: name.clone(),
                field: field.name.clone(),
                source: Box::new(source),
            })?;
            if let Some(info) = info {
                properties.insert(field.name, info);
            }
        }
        Ok(Self { name, properties })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &IndexMap<String, PropertyInfo> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties.get(name)
    }
}

impl Converter for ModelOf {
    fn coerce(&self, cx: Conversion<'_>, value: Data, state: &mut CoerceState) -> Data {
        let mut input = match value {
            Data::Model(m) if m.type_name() == self.name => {
                state.yes += 1;
                return Data::Model(m);
            }
            Data::Map(map) => map,
            other => {
                state.no += 1;
                return other;
            }
        };
        state.yes += 1;

        let mut acc = IndexMap::with_capacity(input.len());
        for (name, info) in &self.properties {
            let key = if state.translate_names { &info.wire_name } else { name };
            let Some(item) = input.shift_remove(key) else {
                if info.optional {
                    state.yes += 1;
                } else if info.nullable {
                    state.maybe += 1;
                } else {
                    state.no += 1;
                }
                continue;
            };

            if item.is_null() && (info.nullable || info.optional) {
                if info.nullable {
                    state.yes += 1;
                } else {
                    state.maybe += 1;
                }
                acc.insert(name.clone(), Data::Null);
            } else {
                let coerced = cx.coerce(&info.ty, item, state);
                acc.insert(name.clone(), coerced);
            }
        }

        // undeclared keys ride along untouched, never over a declared field
        for (key, item) in input {
            acc.entry(key).or_insert(item);
        }
        Data::Model(Model::from_coerced(self.name.as_str(), acc))
    }

    fn dump(&self, cx: Conversion<'_>, value: &Data, state: &mut DumpState) -> Value {
        let fields = match value {
            Data::Model(m) => m.fields(),
            Data::Map(map) => map,
            other => {
                state.no += 1;
                return cx.dump_unknown(other, state);
            }
        };
        state.yes += 1;

        let mut acc = Map::new();
        for (name, item) in fields {
            match self.properties.get(name) {
                Some(info) if item.is_null() && (info.nullable || info.optional) => {
                    acc.insert(info.wire_name.clone(), Value::Null);
                }
                Some(info) => {
                    acc.insert(info.wire_name.clone(), cx.dump(&info.ty, item, state));
                }
                None => {
                    acc.insert(name.clone(), cx.dump_unknown(item, state));
                }
            }
        }
        // an empty accumulator is still an object: `{}`, never `[]`
        Value::Object(acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::Attr;
    use crate::registry::Registry;
    use crate::types::Type;
    use serde_json::json;

    fn coerce(r: &Registry, model: &str, v: Value) -> (Data, CoerceState) {
        let mut state = CoerceState::new();
        let out = r.conversion().coerce(&Type::named(model), Data::from(v), &mut state);
        (out, state)
    }

    fn scores(s: &CoerceState) -> (u64, u64, u64) {
        (s.yes, s.maybe, s.no)
    }

    #[test]
    fn missing_field_matrix() {
        let mut r = Registry::new();
        r.register("Required", [FieldDecl::required("f", "string")]).unwrap();
        r.register("Optional", [FieldDecl::optional("f", "string")]).unwrap();
        r.register("Nullable", [FieldDecl::required("f", "?string")]).unwrap();
        r.register("Both", [FieldDecl::optional("f", "?string")]).unwrap();

        // one `yes` for being a map, then the field's own contribution
        assert_eq!(scores(&coerce(&r, "Required", json!({})).1), (1, 0, 1));
        assert_eq!(scores(&coerce(&r, "Optional", json!({})).1), (2, 0, 0));
        assert_eq!(scores(&coerce(&r, "Nullable", json!({})).1), (1, 1, 0));
        assert_eq!(scores(&coerce(&r, "Both", json!({})).1), (2, 0, 0));
    }

    #[test]
    fn explicit_null_scoring() {
        let mut r = Registry::new();
        r.register("Nullable", [FieldDecl::required("f", "?string")]).unwrap();
        r.register("Optional", [FieldDecl::optional("f", "string")]).unwrap();
        r.register("Required", [FieldDecl::required("f", "string")]).unwrap();

        let (out, s) = coerce(&r, "Nullable", json!({"f": null}));
        assert_eq!(scores(&s), (2, 0, 0));
        assert_eq!(out.get("f"), Some(&Data::Null));

        let (out, s) = coerce(&r, "Optional", json!({"f": null}));
        assert_eq!(scores(&s), (1, 1, 0));
        assert_eq!(out.get("f"), Some(&Data::Null));

        // neither nullable nor optional: null goes through the string descriptor
        let (_, s) = coerce(&r, "Required", json!({"f": null}));
        assert_eq!(scores(&s), (1, 0, 1));
    }

    #[test]
    fn wire_names_map_to_field_names() {
        let mut r = Registry::new();
        r.register("Call", [
            FieldDecl::new("callControlId", "string").with_attr(Attr::required().rename("call_control_id")),
            FieldDecl::required("state", "string"),
        ]).unwrap();

        let (out, s) = coerce(&r, "Call", json!({"call_control_id": "v3:abc", "state": "parked"}));
        assert!(s.is_clean());
        let m = out.as_model().unwrap();
        assert_eq!(m.get("callControlId"), Some(&Data::from("v3:abc")));
        assert_eq!(m.get("call_control_id"), None);
    }

    #[test]
    fn native_state_reads_field_names() {
        let mut r = Registry::new();
        r.register("Call", [
            FieldDecl::new("callControlId", "string").with_attr(Attr::required().rename("call_control_id")),
        ]).unwrap();

        let mut state = CoerceState::native();
        let out = r.conversion().coerce(&Type::named("Call"), Data::from(json!({"callControlId": "x"})), &mut state);
        assert!(state.is_clean());
        assert_eq!(out.get("callControlId"), Some(&Data::from("x")));
    }

    #[test]
    fn instances_of_the_same_model_pass_through_with_one_yes() {
        let mut r = Registry::new();
        r.register("Leg", [FieldDecl::required("id", "int")]).unwrap();
        let (leg, _) = coerce(&r, "Leg", json!({"id": 1}));

        let mut state = CoerceState::new();
        let again = r.conversion().coerce(&Type::named("Leg"), leg.clone(), &mut state);
        assert_eq!(again, leg);
        assert_eq!(state, CoerceState { yes: 1, ..CoerceState::default() });
    }

    #[test]
    fn non_maps_are_a_mismatch() {
        let mut r = Registry::new();
        r.register("Leg", [FieldDecl::required("id", "int")]).unwrap();
        let (out, s) = coerce(&r, "Leg", json!([{"id": 1}]));
        assert_eq!(out, Data::from(json!([{"id": 1}])));
        assert_eq!(scores(&s), (0, 0, 1));
    }

    #[test]
    fn unknown_keys_survive_a_round_trip() {
        let mut r = Registry::new();
        r.register("Number", [
            FieldDecl::new("phoneNumber", "string").with_attr(Attr::required().rename("phone_number")),
        ]).unwrap();

        let input = json!({"phone_number": "+13125550100", "hd_voice": {"enabled": true}});
        let (coerced, _) = coerce(&r, "Number", input.clone());
        assert_eq!(coerced.get("hd_voice"), Some(&Data::from(json!({"enabled": true}))));

        let mut state = DumpState::new();
        let dumped = r.conversion().dump(&Type::named("Number"), &coerced, &mut state);
        assert_eq!(dumped, input);
    }

    #[test]
    fn stray_keys_never_replace_declared_fields() {
        let mut r = Registry::new();
        r.register("Call", [
            FieldDecl::new("callControlId", "string").with_attr(Attr::required().rename("call_control_id")),
        ]).unwrap();

        let (coerced, s) = coerce(&r, "Call", json!({"call_control_id": "wire", "callControlId": 5}));
        assert!(s.is_clean(), "{s:?}");
        assert_eq!(coerced.get("callControlId"), Some(&Data::from("wire")));

        let mut state = DumpState::new();
        let dumped = r.conversion().dump(&Type::named("Call"), &coerced, &mut state);
        assert_eq!(dumped, json!({"call_control_id": "wire"}));
    }

    #[test]
    fn nested_models_coerce_and_dump_recursively() {
        let mut r = Registry::new();
        r.register("Cost", [
            FieldDecl::required("amount", "float"),
            FieldDecl::required("currency", Type::enum_of(["USD", "EUR"])),
        ]).unwrap();
        r.register("Message", [
            FieldDecl::required("id", "string"),
            FieldDecl::new("sentAt", "date-time").with_attr(Attr::optional().rename("sent_at")),
            FieldDecl::new("cost", "Cost").with_attr(Attr::optional().nullable()),
            FieldDecl::optional("to", Type::list(Type::named("string"))),
        ]).unwrap();

        let input = json!({
            "id": "m1",
            "sent_at": "2024-03-01T10:00:00+00:00",
            "cost": {"amount": 2, "currency": "USD"},
            "to": ["+1", "+2"]
        });
        let (coerced, s) = coerce(&r, "Message", input);
        assert!(s.is_clean(), "{s:?}");
        assert!(matches!(coerced.get("sentAt"), Some(Data::DateTime(_))));
        assert_eq!(coerced.get("cost").and_then(|c| c.get("amount")), Some(&Data::Float(2.0)));

        let mut state = DumpState::new();
        let dumped = r.conversion().dump(&Type::named("Message"), &coerced, &mut state);
        assert_eq!(dumped, json!({
            "id": "m1",
            "sent_at": "2024-03-01T10:00:00+00:00",
            "cost": {"amount": 2.0, "currency": "USD"},
            "to": ["+1", "+2"]
        }));
        assert_eq!((state.yes, state.no), (3, 0));
    }

    #[test]
    fn empty_instance_dumps_as_an_object() {
        let mut r = Registry::new();
        r.register("Filter", [FieldDecl::optional("page", "int"), FieldDecl::optional("size", "int")]).unwrap();
        let (empty, s) = coerce(&r, "Filter", json!({}));
        assert!(s.is_clean());

        let mut state = DumpState::new();
        let dumped = r.conversion().dump(&Type::named("Filter"), &empty, &mut state);
        assert_eq!(dumped, json!({}));
        assert!(dumped.is_object());
        assert_eq!(serde_json::to_string(&dumped).unwrap(), "{}");
    }

    #[test]
    fn dumping_a_scalar_against_a_model_is_a_mismatch() {
        let mut r = Registry::new();
        r.register("Filter", [FieldDecl::optional("page", "int")]).unwrap();
        let mut state = DumpState::new();
        let dumped = r.conversion().dump(&Type::named("Filter"), &Data::Int(3), &mut state);
        assert_eq!(dumped, json!(3));
        assert_eq!((state.yes, state.no), (0, 1));
    }

    #[test]
    fn registering_rejects_intersections_with_field_context() {
        use crate::conversion::DeclaredType;
        let err = ModelOf::new("Weird", [FieldDecl::required("x", DeclaredType::parse("A&B").unwrap())]).unwrap_err();
        assert_eq!(err.to_string(), "field `x` of model `Weird`: intersection type `A&B` has no single coercion strategy");
    }
}
