use indexmap::IndexSet;
use serde_json::Value;

use super::{CoerceState, Conversion, Converter, DumpState};
use crate::data::{Data, Scalar, ScalarKind};

/// A closed set of scalar constants.
///
/// Unknown members of the right scalar kind score `maybe`, never `no`: the
/// server may know values this schema does not.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumOf {
    members: IndexSet<Scalar>,
    kind: Option<ScalarKind>,
}

impl EnumOf {
    pub fn new<S: Into<Scalar>>(members: impl IntoIterator<Item = S>) -> Self {
        let members: IndexSet<Scalar> = members.into_iter().map(Into::into).collect();
        // taken from the last member, like the declaration order suggests
        let kind = members.last().map(Scalar::kind);
        Self { members, kind }
    }

    pub fn members(&self) -> impl Iterator<Item = &Scalar> {
        self.members.iter()
    }

    pub fn kind(&self) -> Option<ScalarKind> {
        self.kind
    }

    pub fn contains(&self, scalar: &Scalar) -> bool {
        self.members.contains(scalar)
    }
}

impl Converter for EnumOf {
    fn coerce(&self, _cx: Conversion<'_>, value: Data, state: &mut CoerceState) -> Data {
        match value.scalar() {
            Some(s) if self.members.contains(&s) => state.yes += 1,
            Some(s) if Some(s.kind()) == self.kind => state.maybe += 1,
            _ => state.no += 1,
        }
        value
    }

    fn dump(&self, cx: Conversion<'_>, value: &Data, state: &mut DumpState) -> Value {
        cx.dump_unknown(value, state)
    }
}
