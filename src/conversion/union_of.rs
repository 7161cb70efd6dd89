//! Polymorphic slots: pick the variant that best explains a value.
//!
//! Resolution order:
//! 1. a model instance whose type is one of the variants,
//! 2. a discriminator field whose string value names a registered variant,
//! 3. scored search, every variant tried against a fresh [`CoerceState`].
//!
//! Steps 1 and 2 are exact; an unknown discriminator value falls through to
//! step 3 rather than failing.
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, trace};

use super::{CoerceState, Conversion, Converter, DumpState};
use crate::data::Data;
use crate::types::Type;

#[derive(Debug, Clone, PartialEq)]
pub struct UnionOf {
    variants: Vec<Type>,
    discriminator: Option<String>,
    keys: IndexMap<String, usize>,   // discriminator value -> variant index
}

impl UnionOf {
    pub fn new(variants: impl IntoIterator<Item = Type>) -> Self {
        Self {
            variants: variants.into_iter().collect(),
            discriminator: None,
            keys: IndexMap::new(),
        }
    }

    pub fn discriminated<K: Into<String>>(
        field: impl Into<String>,
        variants: impl IntoIterator<Item = (K, Type)>,
    ) -> Self {
        let mut out = Self {
            variants: Vec::new(),
            discriminator: Some(field.into()),
            keys: IndexMap::new(),
        };
        for (key, ty) in variants {
            out.keys.insert(key.into(), out.variants.len());
            out.variants.push(ty);
        }
        out
    }

    pub fn variants(&self) -> &[Type] {
        &self.variants
    }

    pub fn discriminator(&self) -> Option<&str> {
        self.discriminator.as_deref()
    }

    /// The variant named by the value itself, if any.
    fn resolve(&self, cx: Conversion<'_>, value: &Data) -> Option<&Type> {
        if let Data::Model(m) = value {
            let by_type = self
                .variants
                .iter()
                .find(|t| matches!(t, Type::Model(name) if name == m.type_name()));
            if by_type.is_some() {
                return by_type;
            }
        }
        let field = self.discriminator.as_deref()?;
        let tag = match value {
            // instances are keyed by field name, the discriminator by wire name
            Data::Model(m) => {
                let name = cx
                    .registry()
                    .get(m.type_name())
                    .and_then(|model| model.properties().iter().find(|(_, p)| p.wire_name == field))
                    .map_or(field, |(name, _)| name.as_str());
                m.get(name)
            }
            other => other.get(field),
        };
        let key = tag?.as_str()?;
        self.keys.get(key).map(|&index| &self.variants[index])
    }
}

impl Converter for UnionOf {
    fn coerce(&self, cx: Conversion<'_>, value: Data, state: &mut CoerceState) -> Data {
        if let Some(target) = self.resolve(cx, &value) {
            trace!(variant = %target, "union resolved exactly");
            return cx.coerce(target, value, state);
        }

        let mut best: Option<(CoerceState, Data)> = None;
        for variant in &self.variants {
            state.branched += 1;
            let mut attempt = state.branch();
            let coerced = cx.coerce(variant, value.clone(), &mut attempt);
            trace!(
                variant = %variant,
                yes = attempt.yes,
                maybe = attempt.maybe,
                no = attempt.no,
                "union candidate"
            );

            if attempt.is_clean() {
                state.yes += attempt.yes;
                return coerced;
            }
            if attempt.maybe == 0 {
                continue;
            }
            // strict comparison: on equal rank the earlier variant stays
            let better = match &best {
                None => true,
                Some((current, _)) => attempt.rank() < current.rank(),
            };
            if better {
                best = Some((attempt, coerced));
            }
        }

        match best {
            Some((attempt, coerced)) => {
                debug!(
                    yes = attempt.yes,
                    maybe = attempt.maybe,
                    no = attempt.no,
                    "union settled on an imperfect variant"
                );
                state.yes += attempt.yes;
                state.maybe += attempt.maybe;
                state.no += attempt.no;
                coerced
            }
            None => {
                debug!(kind = value.kind(), "no union variant matched");
                state.no += 1;
                value
            }
        }
    }

    fn dump(&self, cx: Conversion<'_>, value: &Data, state: &mut DumpState) -> Value {
        if let Some(target) = self.resolve(cx, value) {
            state.can_retry = false;
            return cx.dump(target, value, state);
        }

        let mut first: Option<(DumpState, Value)> = None;
        for variant in self.variants.iter().filter(|t| t.accepts_kind(value)) {
            let mut attempt = DumpState::new();
            let dumped = cx.dump(variant, value, &mut attempt);
            if attempt.no == 0 || !attempt.can_retry {
                state.merge(&attempt);
                return dumped;
            }
            trace!(variant = %variant, no = attempt.no, "retrying union dump with the next variant");
            if first.is_none() {
                first = Some((attempt, dumped));
            }
        }

        match first {
            Some((attempt, dumped)) => {
                state.merge(&attempt);
                dumped
            }
            None => {
                debug!(kind = value.kind(), "no union variant fits the value, dumping as is");
                state.no += 1;
                cx.dump_unknown(value, state)
            }
        }
    }
}
