//! Custom validation functions for configuration.
//!
//! Field-level checks that the `validator` derive cannot express directly.

use validator::ValidationError;

/// Validate that every element of a per-station float list is strictly positive.
pub fn validate_all_positive(values: &[f64]) -> Result<(), ValidationError> {
    if values.iter().any(|v| !v.is_finite() || *v <= 0.0) {
        return Err(ValidationError::new("must_be_positive"));
    }
    Ok(())
}

/// Validate that a duration is strictly positive and finite.
pub fn validate_positive(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new("must_be_positive"))
    }
}

/// Validate an EMA decay rate: must lie in (0, 1].
pub fn validate_decay_rate(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ValidationError::new("decay_rate_out_of_range"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_list_accepts_positive() {
        assert!(validate_all_positive(&[4.0, 5.0, 4.5]).is_ok());
    }

    #[test]
    fn positive_list_rejects_zero() {
        assert!(validate_all_positive(&[4.0, 0.0]).is_err());
    }

    #[test]
    fn decay_rate_bounds() {
        assert!(validate_decay_rate(0.1).is_ok());
        assert!(validate_decay_rate(1.0).is_ok());
        assert!(validate_decay_rate(0.0).is_err());
        assert!(validate_decay_rate(1.5).is_err());
    }
}
