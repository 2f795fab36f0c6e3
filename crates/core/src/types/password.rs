//! Password strength policy.
//!
//! Shared by the API (authoritative check on register and reset) and the
//! client (early feedback on the forgot-password form).

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Symbols accepted (and one of which is required) in a password.
pub const PASSWORD_SYMBOLS: &str = "@$!%*?&#";

/// User-facing summary of the policy.
pub const PASSWORD_POLICY_MESSAGE: &str = "Password must be at least 8 characters long and include at least one letter, one number, and one symbol";

/// Reasons a password fails the strength policy.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// Shorter than [`MIN_PASSWORD_LENGTH`].
    #[error("password must be at least {min} characters long")]
    TooShort {
        /// Required minimum length.
        min: usize,
    },
    /// No ASCII letter.
    #[error("password must include at least one letter")]
    MissingLetter,
    /// No ASCII digit.
    #[error("password must include at least one number")]
    MissingDigit,
    /// None of [`PASSWORD_SYMBOLS`].
    #[error("password must include at least one symbol ({PASSWORD_SYMBOLS})")]
    MissingSymbol,
    /// A character outside letters, digits and [`PASSWORD_SYMBOLS`].
    #[error("password contains an unsupported character: {0:?}")]
    InvalidCharacter(char),
}

/// Check a candidate password against the strength policy.
///
/// Accepts ASCII letters, digits and [`PASSWORD_SYMBOLS`] only, requires at
/// least one of each class, and at least [`MIN_PASSWORD_LENGTH`] characters.
///
/// ```
/// use lakshmi_core::validate_password;
///
/// assert!(validate_password("abcd12!@").is_ok());
/// assert!(validate_password("abcd1234").is_err());
/// ```
///
/// # Errors
///
/// Returns the first [`PasswordError`] found.
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    if let Some(bad) = password
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !PASSWORD_SYMBOLS.contains(*c))
    {
        return Err(PasswordError::InvalidCharacter(bad));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(PasswordError::MissingLetter);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordError::MissingDigit);
    }
    if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        return Err(PasswordError::MissingSymbol);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_examples() {
        assert_eq!(
            validate_password("abcd1234"),
            Err(PasswordError::MissingSymbol)
        );
        assert_eq!(validate_password("abcd12!@"), Ok(()));
        assert_eq!(
            validate_password("short1!"),
            Err(PasswordError::TooShort { min: 8 })
        );
    }

    #[test]
    fn test_missing_classes() {
        assert_eq!(
            validate_password("12345678!"),
            Err(PasswordError::MissingLetter)
        );
        assert_eq!(
            validate_password("abcdefgh!"),
            Err(PasswordError::MissingDigit)
        );
    }

    #[test]
    fn test_rejects_characters_outside_policy() {
        assert_eq!(
            validate_password("abcd12!@ "),
            Err(PasswordError::InvalidCharacter(' '))
        );
        assert_eq!(
            validate_password("abcd12!^"),
            Err(PasswordError::InvalidCharacter('^'))
        );
    }
}
