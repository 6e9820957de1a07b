//! Duration spec parsing for `start --duration`.
//!
//! A spec is a sequence of `<digits><unit>` groups with units `h`, `m` and
//! `s`, each used at most once and in that order: `1h30m`, `45m`, `90s`,
//! `2h5s`. The empty spec is zero seconds.

use thiserror::Error;

/// Errors produced by [`parse_duration`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DurationSpecError {
    /// A character that is neither a digit nor a unit.
    #[error("expected unit to be one of h, m, s, got '{0}'")]
    UnknownUnit(char),

    /// A unit not smaller than the one before it.
    #[error("expected unit smaller than '{previous}', got '{unit}'")]
    UnitOrder { previous: char, unit: char },

    /// A unit without digits in front of it.
    #[error("expected a number before unit '{0}'")]
    MissingValue(char),

    /// Digits at the end without a unit.
    #[error("expected a unit after '{0}'")]
    MissingUnit(String),

    /// The total does not fit in 64 bits.
    #[error("duration is too large")]
    Overflow,
}

const UNITS: [(char, u64); 3] = [('h', 3600), ('m', 60), ('s', 1)];

/// Parses a duration spec into seconds.
///
/// # Errors
///
/// Returns an error describing the first problem found in the input.
pub fn parse_duration(spec: &str) -> Result<u64, DurationSpecError> {
    let mut digits = String::new();
    let mut previous: Option<(char, usize)> = None;
    let mut total: u64 = 0;

    for c in spec.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }

        let Some(rank) = UNITS.iter().position(|&(unit, _)| unit == c) else {
            return Err(DurationSpecError::UnknownUnit(c));
        };
        if let Some((previous, previous_rank)) = previous {
            if rank <= previous_rank {
                return Err(DurationSpecError::UnitOrder { previous, unit: c });
            }
        }
        if digits.is_empty() {
            return Err(DurationSpecError::MissingValue(c));
        }

        let value: u64 = digits.parse().map_err(|_| DurationSpecError::Overflow)?;
        total = value
            .checked_mul(UNITS[rank].1)
            .and_then(|secs| total.checked_add(secs))
            .ok_or(DurationSpecError::Overflow)?;

        digits.clear();
        previous = Some((c, rank));
    }

    if !digits.is_empty() {
        return Err(DurationSpecError::MissingUnit(digits));
    }

    Ok(total)
}
