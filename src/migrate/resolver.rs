//! Resolve a version token to a concrete version.

use crate::error::{Boundary, ResolveError};

use super::alias::{Alias, Target};
use super::set::MigrationSet;
use super::version::Version;

/// Resolve a raw token such as `latest`, `current-2` or `20200101000000`.
pub fn resolve_token(token: &str, set: &MigrationSet) -> Result<Version, ResolveError> {
    resolve(&Target::parse(token), set)
}

/// Resolve a parsed target against the known and applied migrations.
///
/// Pure: the set is only read.
pub fn resolve(target: &Target, set: &MigrationSet) -> Result<Version, ResolveError> {
    match target {
        Target::Literal(raw) => resolve_literal(raw, set),
        Target::Alias(Alias::Current) => Ok(set.current()),
        Target::Alias(_) if set.available_count() == 0 => Err(ResolveError::EmptySet),
        Target::Alias(Alias::Latest) => set.latest().cloned().ok_or(ResolveError::EmptySet),
        Target::Alias(Alias::First) => set.first().cloned().ok_or(ResolveError::EmptySet),
        Target::Alias(Alias::Prev) => set
            .prev_of(&set.current())
            .cloned()
            .ok_or(ResolveError::BoundaryReached(Boundary::First)),
        Target::Alias(Alias::Next) => set
            .next_of(&set.current())
            .cloned()
            .ok_or(ResolveError::BoundaryReached(Boundary::Latest)),
        Target::Alias(Alias::CurrentDelta(delta)) => set
            .relative(&set.current(), *delta)
            .ok_or(ResolveError::DeltaUnreachable(*delta)),
    }
}

fn resolve_literal(raw: &str, set: &MigrationSet) -> Result<Version, ResolveError> {
    match Version::parse(raw) {
        Ok(v) if v.is_zero() || set.is_available(&v) => Ok(v),
        _ => Err(ResolveError::UnknownVersion(raw.to_string())),
    }
}
