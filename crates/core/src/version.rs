//! Schema-version reconciliation for the stored session collection.

/// Outcome of comparing the stored schema tag with the expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionDecision {
    /// Stored sessions match the current shape and can be trusted.
    Keep,
    /// Stored sessions must be discarded and seeded again.
    Reseed,
}

/// Decide whether stored sessions survive a load.
///
/// An absent tag counts as a mismatch.
#[must_use]
pub fn reconcile_version(stored: Option<&str>, expected: &str) -> VersionDecision {
    match stored {
        Some(tag) if tag == expected => VersionDecision::Keep,
        _ => VersionDecision::Reseed,
    }
}
