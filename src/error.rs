//! Crate error type.

use crate::problem::Score;

/// Errors raised by the optimization core.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FapError {
    /// A penalty accumulation or subtraction left the `i64` range.
    ///
    /// Aborts the evaluation in progress and the run that triggered it.
    #[error("integer overflow while accumulating interference penalties")]
    ArithmeticOverflow,

    /// The problem definition is structurally inconsistent.
    ///
    /// Only produced by [`Problem::validate`](crate::problem::Problem::validate).
    #[error("invalid problem definition: {0}")]
    InvalidProblem(String),

    /// A configuration parameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, FapError>;

/// Overflow-checked score addition.
#[inline]
pub(crate) fn add(a: Score, b: Score) -> Result<Score> {
    a.checked_add(b).ok_or(FapError::ArithmeticOverflow)
}

/// Overflow-checked score subtraction.
#[inline]
pub(crate) fn sub(a: Score, b: Score) -> Result<Score> {
    a.checked_sub(b).ok_or(FapError::ArithmeticOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_add() {
        assert_eq!(add(3, 4), Ok(7));
        assert_eq!(add(i64::MAX, 1), Err(FapError::ArithmeticOverflow));
        assert_eq!(add(i64::MIN, -1), Err(FapError::ArithmeticOverflow));
    }

    #[test]
    fn test_checked_sub() {
        assert_eq!(sub(10, 4), Ok(6));
        assert_eq!(sub(i64::MIN, 1), Err(FapError::ArithmeticOverflow));
        assert_eq!(sub(i64::MAX, -1), Err(FapError::ArithmeticOverflow));
    }

    #[test]
    fn test_display() {
        let msg = FapError::InvalidConfig("population_size must be at least 1").to_string();
        assert_eq!(msg, "invalid configuration: population_size must be at least 1");
    }
}
