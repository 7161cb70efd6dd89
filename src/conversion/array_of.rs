//! Homogeneous containers: one element descriptor applied to every entry.
use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::{CoerceState, Conversion, Converter, DumpState};
use crate::data::Data;
use crate::types::Type;

#[derive(Debug, Clone, PartialEq)]
pub struct ListOf {
    item: Box<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapOf {
    item: Box<Type>,
}

#[derive(Clone, Copy)]
enum Shape {
    List,
    Map,
}

impl ListOf {
    pub fn new(item: Type) -> Self {
        Self { item: Box::new(item) }
    }

    pub fn item(&self) -> &Type {
        &self.item
    }
}

impl MapOf {
    pub fn new(item: Type) -> Self {
        Self { item: Box::new(item) }
    }

    pub fn item(&self) -> &Type {
        &self.item
    }
}

impl Converter for ListOf {
    fn coerce(&self, cx: Conversion<'_>, value: Data, state: &mut CoerceState) -> Data {
        coerce_elements(cx, Shape::List, &self.item, value, state)
    }

    fn dump(&self, cx: Conversion<'_>, value: &Data, state: &mut DumpState) -> Value {
        dump_elements(cx, Shape::List, &self.item, value, state)
    }
}

impl Converter for MapOf {
    fn coerce(&self, cx: Conversion<'_>, value: Data, state: &mut CoerceState) -> Data {
        coerce_elements(cx, Shape::Map, &self.item, value, state)
    }

    fn dump(&self, cx: Conversion<'_>, value: &Data, state: &mut DumpState) -> Value {
        dump_elements(cx, Shape::Map, &self.item, value, state)
    }
}

// Every element is scored on its own; a bad element never stops the walk.
fn coerce_elements(cx: Conversion<'_>, shape: Shape, item: &Type, value: Data, state: &mut CoerceState) -> Data {
    match (shape, value) {
        (Shape::List, Data::List(xs)) => {
            state.yes += 1;
            Data::List(xs.into_iter().map(|x| cx.coerce(item, x, state)).collect())
        }
        (Shape::Map, Data::Map(entries)) => {
            state.yes += 1;
            Data::Map(entries.into_iter().map(|(k, v)| (k, cx.coerce(item, v, state))).collect())
        }
        // an empty container of the other kind; some backends cannot tell `[]` from `{}`
        (Shape::List, Data::Map(entries)) if entries.is_empty() => {
            state.maybe += 1;
            Data::List(Vec::new())
        }
        (Shape::Map, Data::List(xs)) if xs.is_empty() => {
            state.maybe += 1;
            Data::Map(IndexMap::new())
        }
        (_, other) => {
            state.no += 1;
            other
        }
    }
}

fn dump_elements(cx: Conversion<'_>, shape: Shape, item: &Type, value: &Data, state: &mut DumpState) -> Value {
    match (shape, value) {
        (Shape::List, Data::List(xs)) => {
            state.yes += 1;
            Value::Array(xs.iter().map(|x| cx.dump(item, x, state)).collect())
        }
        (Shape::Map, Data::Map(entries)) => {
            state.yes += 1;
            let mut out = Map::new();
            for (k, v) in entries {
                out.insert(k.clone(), cx.dump(item, v, state));
            }
            Value::Object(out)
        }
        (_, other) => {
            state.no += 1;
            cx.dump_unknown(other, state)
        }
    }
}
