use std::cmp::Reverse;

/// Scores collected over one coercion call tree.
///
/// `yes` counts exact structural matches, `maybe` plausible ones that needed
/// a guess, `no` outright mismatches. `branched` counts union variants tried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoerceState {
    pub yes: u64,
    pub no: u64,
    pub maybe: u64,
    pub branched: u64,
    /// Look fields up by wire name (`true`) or in-memory name (`false`).
    pub translate_names: bool,
}

impl Default for CoerceState {
    fn default() -> Self {
        Self { yes: 0, no: 0, maybe: 0, branched: 0, translate_names: true }
    }
}

impl CoerceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// For values already keyed by in-memory field names.
    pub fn native() -> Self {
        Self { translate_names: false, ..Self::default() }
    }

    /// Empty state for one speculative union attempt.
    pub(crate) fn branch(&self) -> Self {
        Self { translate_names: self.translate_names, ..Self::default() }
    }

    pub fn is_clean(&self) -> bool {
        self.no == 0 && self.maybe == 0
    }

    /// Ascending order puts the preferred candidate first.
    pub(crate) fn rank(&self) -> (Reverse<u64>, Reverse<u64>, u64) {
        (Reverse(self.yes), Reverse(self.maybe), self.no)
    }
}

/// Bookkeeping for one dump call tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DumpState {
    pub yes: u64,
    pub no: u64,
    /// Cleared once a dump commits to a shape the data itself named (a model
    /// instance's own type, a discriminator value). Alternative dumps over a
    /// different shape are no longer sound after that.
    pub can_retry: bool,
}

impl Default for DumpState {
    fn default() -> Self {
        Self { yes: 0, no: 0, can_retry: true }
    }
}

impl DumpState {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn merge(&mut self, other: &DumpState) {
        self.yes += other.yes;
        self.no += other.no;
        self.can_retry &= other.can_retry;
    }
}
