use chrono::{DateTime, Utc};

/// Where reflection timestamps come from.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    /// Wall-clock UTC.
    #[default]
    System,
    /// Always reports the same instant.
    Pinned(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Pinned(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match *self {
            Clock::System => Utc::now(),
            Clock::Pinned(at) => at,
        }
    }
}

/// 2023-11-14T22:13:20Z, used by tests that print or compare dates.
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// # Panics
///
/// Never in practice; the constant is a valid timestamp.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_clock_never_moves() {
        let clock = fixed_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().timestamp(), FIXED_TEST_TIMESTAMP);
    }

    #[test]
    fn system_clock_is_the_default() {
        let before = Utc::now();
        let now = Clock::default().now();
        assert!(now >= before);
    }
}
