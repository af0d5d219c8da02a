use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable identifier for a curriculum session.
///
/// Session ids come from the seed catalog and are the only join key between
/// a working copy and the stored record.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new `SessionId`
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Curriculum week number, used as the natural key for reflections.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekId(u32);

impl WeekId {
    /// Creates a new `WeekId`
    #[must_use]
    pub fn new(week: u32) -> Self {
        Self(week)
    }

    /// Returns the underlying u32 value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Debug for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeekId({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for SessionId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseIdError { kind: "SessionId" });
        }
        Ok(SessionId::new(trimmed))
    }
}

impl FromStr for WeekId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(WeekId::new)
            .map_err(|_| ParseIdError { kind: "WeekId" })
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_parses_trimmed() {
        let id: SessionId = "  w1-fri ".parse().unwrap();
        assert_eq!(id, SessionId::new("w1-fri"));
        assert_eq!(id.to_string(), "w1-fri");
    }

    #[test]
    fn session_id_rejects_blank() {
        assert!("   ".parse::<SessionId>().is_err());
    }

    #[test]
    fn week_id_from_str() {
        let week: WeekId = "3".parse().unwrap();
        assert_eq!(week, WeekId::new(3));
        assert!("three".parse::<WeekId>().is_err());
    }

    #[test]
    fn ids_serialize_as_plain_values() {
        let json = serde_json::to_string(&SessionId::new("w2-sat")).unwrap();
        assert_eq!(json, "\"w2-sat\"");
        let week: WeekId = serde_json::from_str("4").unwrap();
        assert_eq!(week.value(), 4);
    }
}
