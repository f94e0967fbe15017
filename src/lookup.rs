//! Tagged results for lookups that degrade to a default instead of failing.
//!
//! Three inputs are optional in practice: the mitigation start date of a region, the
//! population of a region, and the terminal sample of a previous fit. Each lookup returns a
//! [`Lookup`] which is either the found value or the named reason it could not be found. The
//! caller picks the fallback with [`Lookup::or_fallback`], which always emits a `warn!`
//! diagnostic carrying the reason, so a fallback is never taken silently.
use std::fmt::Display;

use log::warn;

#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Lookup<T, R> {
    Found(T),
    Fallback(R),
}

impl<T, R> Lookup<T, R> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn found(&self) -> Option<&T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Fallback(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&R> {
        match self {
            Lookup::Found(_) => None,
            Lookup::Fallback(reason) => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U, R> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::Fallback(reason) => Lookup::Fallback(reason),
        }
    }
}

impl<T, R: Display> Lookup<T, R> {
    /// Returns the found value, or reports the reason and computes the fallback from it.
    pub fn or_fallback(self, fallback: impl FnOnce(&R) -> T) -> T {
        match self {
            Lookup::Found(value) => value,
            Lookup::Fallback(reason) => {
                warn!("{reason}");
                fallback(&reason)
            }
        }
    }
}

impl<T, R> From<Result<T, R>> for Lookup<T, R> {
    fn from(result: Result<T, R>) -> Self {
        match result {
            Ok(value) => Lookup::Found(value),
            Err(reason) => Lookup::Fallback(reason),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Lookup;

    #[test]
    fn found_value_skips_fallback() {
        let lookup: Lookup<i64, String> = Lookup::Found(3);
        assert_eq!(lookup.or_fallback(|_| panic!("fallback taken")), 3);
    }

    #[test]
    fn fallback_receives_reason() {
        let lookup: Lookup<usize, String> = Lookup::Fallback("no table".to_string());
        assert_eq!(lookup.or_fallback(String::len), 8);
    }

    #[test]
    fn map_keeps_reason() {
        let lookup: Lookup<f64, &str> = Lookup::Fallback("absent");
        let mapped = lookup.map(Some);
        assert!(!mapped.is_found());
        assert_eq!(mapped.reason(), Some(&"absent"));
        assert_eq!(mapped.or_fallback(|_| None), None);
    }

    #[test]
    fn converts_from_result() {
        let lookup: Lookup<u8, &str> = Ok(1).into();
        assert_eq!(lookup.found(), Some(&1));
    }
}
