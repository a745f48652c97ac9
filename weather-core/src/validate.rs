use std::num::IntErrorKind;

use crate::{error::ValidationError, model::DayCount};

/// Parse and bounds-check the client-supplied `days` parameter.
///
/// Parsing happens before any range check, so `"abc"` is reported as
/// invalid rather than out of range. Integers too large for the machine
/// are still reported by their sign.
pub fn validate_days(raw: Option<&str>) -> Result<DayCount, ValidationError> {
    let raw = raw.ok_or(ValidationError::Missing)?;

    let days: i64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| match e.kind() {
        IntErrorKind::PosOverflow => ValidationError::AboveMaximum,
        IntErrorKind::NegOverflow => ValidationError::BelowMinimum,
        _ => ValidationError::NotANumber,
    })?;

    if days > i64::from(DayCount::MAX) {
        return Err(ValidationError::AboveMaximum);
    }
    if days < i64::from(DayCount::MIN) {
        return Err(ValidationError::BelowMinimum);
    }

    u8::try_from(days).ok().and_then(DayCount::new).ok_or(ValidationError::NotANumber)
}
