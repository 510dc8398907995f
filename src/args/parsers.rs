use std::time::Duration;

use super::types::{PositiveU64, PositiveUsize, TargetSpec};
use crate::error::ValidationError;

pub(crate) fn parse_target(s: &str) -> Result<TargetSpec, ValidationError> {
    s.parse()
}

pub(crate) fn parse_positive_u64(s: &str) -> Result<PositiveU64, ValidationError> {
    s.parse()
}

pub(crate) fn parse_positive_usize(s: &str) -> Result<PositiveUsize, ValidationError> {
    s.parse()
}

/// Extra header line, sent verbatim. Must look like `Key: Value` and stay on
/// one line so it cannot terminate the header block early.
pub(crate) fn parse_header_line(s: &str) -> Result<String, ValidationError> {
    if s.contains(['\r', '\n']) {
        return Err(ValidationError::HeaderContainsLineBreak {
            value: s.to_owned(),
        });
    }
    match s.split_once(':') {
        Some((key, _)) if !key.trim().is_empty() => Ok(s.trim().to_owned()),
        Some(_) | None => Err(ValidationError::InvalidHeaderFormat {
            value: s.to_owned(),
        }),
    }
}

pub(crate) fn parse_prefix(s: &str) -> Result<String, ValidationError> {
    if s.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidPrefix {
            value: s.to_owned(),
        });
    }
    Ok(s.to_owned())
}

/// Queries per second; 0 disables rate limiting.
pub(crate) fn parse_rate(s: &str) -> Result<f64, ValidationError> {
    let rate: f64 = s.trim().parse().map_err(|err| ValidationError::InvalidFloat {
        value: s.to_owned(),
        source: err,
    })?;
    if !rate.is_finite() || rate < 0.0 {
        return Err(ValidationError::InvalidRate {
            value: s.to_owned(),
        });
    }
    Ok(rate)
}

pub(crate) fn parse_decay_factor(s: &str) -> Result<f64, ValidationError> {
    let factor: f64 = s.trim().parse().map_err(|err| ValidationError::InvalidFloat {
        value: s.to_owned(),
        source: err,
    })?;
    if !(factor > 0.0 && factor < 1.0) {
        return Err(ValidationError::InvalidDecayFactor {
            value: s.to_owned(),
        });
    }
    Ok(factor)
}

pub(crate) fn parse_duration_arg(s: &str) -> Result<Duration, ValidationError> {
    let value = s.trim();
    if value.is_empty() {
        return Err(ValidationError::DurationEmpty);
    }

    let digits_len = value.chars().take_while(char::is_ascii_digit).count();
    if digits_len == 0 {
        return Err(ValidationError::InvalidDurationFormat {
            value: value.to_owned(),
        });
    }
    let (num_part, unit_part) = value.split_at(digits_len);
    let number: u64 =
        num_part
            .parse()
            .map_err(|err| ValidationError::InvalidDurationNumber {
                value: value.to_owned(),
                source: err,
            })?;

    let unit = if unit_part.is_empty() { "s" } else { unit_part };
    let duration = match unit {
        "ms" => Duration::from_millis(number),
        "s" => Duration::from_secs(number),
        "m" => {
            let secs = number
                .checked_mul(60)
                .ok_or(ValidationError::DurationOverflow)?;
            Duration::from_secs(secs)
        }
        "h" => {
            let secs = number
                .checked_mul(3600)
                .ok_or(ValidationError::DurationOverflow)?;
            Duration::from_secs(secs)
        }
        _ => {
            return Err(ValidationError::InvalidDurationUnit {
                unit: unit.to_owned(),
            });
        }
    };

    if duration.is_zero() {
        return Err(ValidationError::DurationZero);
    }

    Ok(duration)
}
