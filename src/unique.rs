//! Bounded retry for allocating identifiers that must not collide with existing ones.

use crate::Error;

/// Try candidates from `generate` until `exists` reports one as free.
///
/// `generate` receives the zero-based attempt number and must not have side
/// effects beyond producing a candidate. At most `max_attempts` candidates are
/// checked.
///
/// Returns `Ok(None)` when every attempt collided.
///
/// # Errors
///
/// Returns the first error produced by `exists`.
pub fn find_unique<T, G, E>(
    max_attempts: u32,
    mut generate: G,
    mut exists: E,
) -> Result<Option<T>, Error>
where
    G: FnMut(u32) -> T,
    E: FnMut(&T) -> Result<bool, Error>,
{
    for attempt in 0..max_attempts {
        let candidate = generate(attempt);

        if !exists(&candidate)? {
            return Ok(Some(candidate));
        }

        tracing::debug!("candidate {attempt} already taken, retrying");
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::Error;

    use super::find_unique;

    #[test]
    fn returns_first_free_candidate() {
        let taken: HashSet<u32> = [0, 1, 2].into();

        let got = find_unique(10, |attempt| attempt, |c| Ok(taken.contains(c)));

        assert_eq!(got, Ok(Some(3)));
    }

    #[test]
    fn stops_at_attempt_cap() {
        let mut calls = 0;

        let got = find_unique(
            5,
            |attempt| attempt,
            |_| {
                calls += 1;
                Ok(true)
            },
        );

        assert_eq!(got, Ok(None));
        assert_eq!(calls, 5);
    }

    #[test]
    fn zero_attempts_checks_nothing() {
        let got = find_unique(0, |attempt| attempt, |_| panic!("should not be called"));

        assert_eq!(got, Ok(None));
    }

    #[test]
    fn propagates_existence_check_errors() {
        let got = find_unique(3, |attempt| attempt, |_| Err(Error::DatabaseLockError));

        assert_eq!(got, Err(Error::DatabaseLockError));
    }
}
