//! Field-level input rules shared by the request types.
//!
//! Lengths are counted in characters, not bytes.

use storefront_core::{DomainError, DomainResult};

pub fn length(field: &str, value: &str, min: usize, max: usize) -> DomainResult<()> {
    let len = value.chars().count();
    if len < min {
        return Err(DomainError::validation(format!(
            "{field} must be at least {min} characters"
        )));
    }
    if len > max {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

pub fn min_length(field: &str, value: &str, min: usize) -> DomainResult<()> {
    length(field, value, min, usize::MAX)
}

/// Shape check only: one `@`, a non-empty local part, a dotted domain and
/// no whitespace.
pub fn email(field: &str, value: &str) -> DomainResult<()> {
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(DomainError::validation(format!("{field} must be a valid email")))
    }
}

pub fn min_value(field: &str, value: f64, min: f64) -> DomainResult<()> {
    if value.is_finite() && value >= min {
        Ok(())
    } else {
        Err(DomainError::validation(format!("{field} must be at least {min}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_counts_characters() {
        assert!(length("name", "éé", 2, 2).is_ok());
        assert_eq!(
            length("name", "a", 2, 5),
            Err(DomainError::validation("name must be at least 2 characters"))
        );
        assert_eq!(
            length("name", "abcdef", 2, 5),
            Err(DomainError::validation("name must be at most 5 characters"))
        );
    }

    #[test]
    fn email_shapes() {
        assert!(email("email", "a@b.io").is_ok());
        for bad in ["", "ab.io", "@b.io", "a@bio", "a@b.io.", "a@@b.io", "a b@c.io"] {
            assert!(email("email", bad).is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn min_value_rejects_nan() {
        assert!(min_value("price", 5.0, 5.0).is_ok());
        assert!(min_value("price", 4.99, 5.0).is_err());
        assert!(min_value("price", f64::NAN, 5.0).is_err());
    }
}
