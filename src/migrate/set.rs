//! Known (available) and applied (executed) migrations.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;

use super::version::Version;

/// A row of the migrated-versions ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedRecord {
    pub version: Version,
    /// `None` when the stored timestamp is missing or unreadable.
    pub executed_at: Option<NaiveDateTime>,
}

impl ExecutedRecord {
    pub fn new(version: Version, executed_at: Option<NaiveDateTime>) -> Self {
        Self {
            version,
            executed_at,
        }
    }
}

/// Snapshot of available and executed versions for one invocation.
///
/// `executed` may hold versions missing from `available` (drift).
#[derive(Debug, Clone, Default)]
pub struct MigrationSet {
    available: BTreeSet<Version>,
    executed: BTreeMap<Version, ExecutedRecord>,
}

impl MigrationSet {
    pub fn new(
        available: impl IntoIterator<Item = Version>,
        executed: impl IntoIterator<Item = ExecutedRecord>,
    ) -> Self {
        Self {
            available: available.into_iter().collect(),
            executed: executed
                .into_iter()
                .map(|r| (r.version.clone(), r))
                .collect(),
        }
    }

    /// Available versions, ascending.
    pub fn available(&self) -> impl DoubleEndedIterator<Item = &Version> + '_ {
        self.available.iter()
    }

    /// Executed versions, ascending.
    pub fn executed(&self) -> impl DoubleEndedIterator<Item = &Version> + '_ {
        self.executed.keys()
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    pub fn executed_count(&self) -> usize {
        self.executed.len()
    }

    pub fn is_available(&self, version: &Version) -> bool {
        self.available.contains(version)
    }

    pub fn is_executed(&self, version: &Version) -> bool {
        self.executed.contains_key(version)
    }

    pub fn record(&self, version: &Version) -> Option<&ExecutedRecord> {
        self.executed.get(version)
    }

    pub fn first(&self) -> Option<&Version> {
        self.available.first()
    }

    pub fn latest(&self) -> Option<&Version> {
        self.available.last()
    }

    /// Highest executed version that is still available, or zero.
    pub fn current(&self) -> Version {
        self.executed
            .keys()
            .rev()
            .find(|v| self.available.contains(*v))
            .cloned()
            .unwrap_or_else(Version::zero)
    }

    /// Greatest available version strictly below `version`.
    pub fn prev_of(&self, version: &Version) -> Option<&Version> {
        use std::ops::Bound::{Excluded, Unbounded};
        self.available.range((Unbounded, Excluded(version))).next_back()
    }

    /// Least available version strictly above `version`.
    pub fn next_of(&self, version: &Version) -> Option<&Version> {
        use std::ops::Bound::{Excluded, Unbounded};
        self.available.range((Excluded(version), Unbounded)).next()
    }

    /// Walk `delta` positions through `[0, available...]` starting at `from`.
    ///
    /// `from` must be zero or an available version.
    pub fn relative(&self, from: &Version, delta: i64) -> Option<Version> {
        let offset = if from.is_zero() {
            0
        } else {
            self.available.iter().position(|v| v == from)? + 1
        };
        let target = i64::try_from(offset).ok()?.checked_add(delta)?;
        match usize::try_from(target).ok()? {
            0 => Some(Version::zero()),
            n => self.available.iter().nth(n - 1).cloned(),
        }
    }

    /// Available versions in `(lower, upper]`, ascending.
    pub fn available_between(&self, lower: &Version, upper: &Version) -> Vec<Version> {
        if lower >= upper {
            return Vec::new();
        }
        use std::ops::Bound::{Excluded, Included};
        self.available
            .range((Excluded(lower), Included(upper)))
            .cloned()
            .collect()
    }
}
