use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const OTP_LENGTH: usize = 6;

/// Local checks run before any signup or reset request leaves the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum AccountFormError {
    #[error("All fields are required")]
    MissingFields,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Please enter the 6-digit code.")]
    OtpFormat,
}

/// Body of `POST /signup`. Middle name and affix may be left blank.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: String,
    pub affix: String,
    pub birthday: Option<NaiveDate>,
}

impl SignupForm {
    /// # Errors
    ///
    /// `MissingFields` when a required field is blank, `PasswordMismatch`
    /// when the two passwords differ.
    pub fn validate(&self) -> Result<(), AccountFormError> {
        let required = [
            &self.email,
            &self.password,
            &self.confirm_password,
            &self.first_name,
            &self.last_name,
        ];
        if required.iter().any(|field| field.trim().is_empty()) || self.birthday.is_none() {
            return Err(AccountFormError::MissingFields);
        }
        if self.password != self.confirm_password {
            return Err(AccountFormError::PasswordMismatch);
        }
        Ok(())
    }
}

impl fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupForm")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("birthday", &self.birthday)
            .finish_non_exhaustive()
    }
}

/// New password typed twice on the reset screen.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PasswordReset {
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordReset {
    /// # Errors
    ///
    /// `MissingFields` when either box is empty, `PasswordMismatch` otherwise
    /// when they differ.
    pub fn validate(&self) -> Result<(), AccountFormError> {
        if self.new_password.is_empty() || self.confirm_password.is_empty() {
            return Err(AccountFormError::MissingFields);
        }
        if self.new_password != self.confirm_password {
            return Err(AccountFormError::PasswordMismatch);
        }
        Ok(())
    }
}

/// The six-digit code mailed for email verification and password reset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OtpCode(String);

impl OtpCode {
    /// Whitespace is ignored, so a pasted "123 456" is accepted.
    ///
    /// # Errors
    ///
    /// Returns `AccountFormError::OtpFormat` unless exactly six digits remain.
    pub fn parse(raw: &str) -> Result<Self, AccountFormError> {
        let digits: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if digits.len() != OTP_LENGTH || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(AccountFormError::OtpFormat);
        }
        Ok(Self(digits))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Short-lived token the backend hands out with a code; it authorizes the
/// verify, resend and reset calls for that one code.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationToken(String);

impl VerificationToken {
    /// Returns `None` for blank input.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for VerificationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VerificationToken(<redacted>)")
    }
}
