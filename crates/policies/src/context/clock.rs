//! The frozen per-request clock (`spec.md` §3 invariant 2, §4.B).

use std::cell::OnceCell;

use crate::datatype::XsDateTime;

/// A clock that returns the same instant for every call within one
/// decision request. The first call to [`Clock::now`] either returns the
/// caller-supplied `pdpEnvironment:current-dateTime`/`current-date`/
/// `current-time` attributes (if present) or captures wall-clock time;
/// every subsequent call during the same evaluation returns that frozen
/// value, so `current-dateTime` is never observed to change mid-request.
#[derive(Debug)]
pub struct Clock {
    frozen: OnceCell<XsDateTime>,
    seed: Option<XsDateTime>,
}

impl Clock {
    /// A clock that will capture wall-clock time on first use.
    pub fn wall_clock() -> Self {
        Clock { frozen: OnceCell::new(), seed: None }
    }

    /// A clock pre-seeded with a fixed instant (e.g. from the request's
    /// environment attributes, or for deterministic tests).
    pub fn frozen_at(instant: XsDateTime) -> Self {
        Clock { frozen: OnceCell::new(), seed: Some(instant) }
    }

    pub fn now(&self) -> XsDateTime {
        *self.frozen.get_or_init(|| self.seed.unwrap_or_else(|| XsDateTime::from_utc_now(chrono::Utc::now())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_calls_return_the_same_instant() {
        let clock = Clock::wall_clock();
        let a = clock.now();
        let b = clock.now();
        assert_eq!(a, b);
    }

    #[test]
    fn seeded_clock_ignores_wall_clock_time() {
        let seed = XsDateTime::parse("2020-01-01T00:00:00Z").unwrap();
        let clock = Clock::frozen_at(seed);
        assert_eq!(clock.now(), seed);
    }
}
