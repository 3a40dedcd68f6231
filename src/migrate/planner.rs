//! Turn a (current, target) pair into ordered apply/revert steps.

use std::fmt;

use serde::Serialize;

use super::set::MigrationSet;
use super::version::Version;

/// Whether a step runs the up or the down script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Apply,
    Revert,
}

impl Direction {
    /// Script suffix used on disk and in rendered SQL.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Apply => "up",
            Direction::Revert => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One migration to run in one direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub version: Version,
    pub direction: Direction,
}

/// Ordered steps: ascending when applying, descending when reverting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    from: Version,
    to: Version,
    steps: Vec<Step>,
}

impl ExecutionPlan {
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The position the plan starts from.
    pub fn from(&self) -> &Version {
        &self.from
    }

    /// The version the plan ends on.
    pub fn to(&self) -> &Version {
        &self.to
    }

    pub fn direction(&self) -> Option<Direction> {
        self.steps.first().map(|s| s.direction)
    }
}

impl IntoIterator for ExecutionPlan {
    type Item = Step;
    type IntoIter = std::vec::IntoIter<Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

/// Compute the steps to go from `current` to `target`.
///
/// Only available versions are ever planned; orphaned history is skipped.
pub fn plan(set: &MigrationSet, current: &Version, target: &Version) -> ExecutionPlan {
    let steps = if target > current {
        set.available_between(current, target)
            .into_iter()
            .map(|version| Step {
                version,
                direction: Direction::Apply,
            })
            .collect()
    } else if target < current {
        set.available_between(target, current)
            .into_iter()
            .rev()
            .map(|version| Step {
                version,
                direction: Direction::Revert,
            })
            .collect()
    } else {
        Vec::new()
    };

    ExecutionPlan {
        from: current.clone(),
        to: target.clone(),
        steps,
    }
}
