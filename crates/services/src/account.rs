//! Account creation and password recovery.
//!
//! Both flows mail a six-digit code and hand back a verification token. The
//! code can be re-sent once the cooldown has run out; each resend replaces
//! the token.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use strand_core::model::{OtpCode, PasswordReset, SignupForm, VerificationToken};

use crate::api::AssessmentApi;
use crate::error::AccountError;

/// Wait between two codes for the same verification.
pub const OTP_RESEND_COOLDOWN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationPurpose {
    Signup,
    PasswordReset,
}

/// Countdown shown next to the "Resend Code" button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResendCooldown {
    sent_at: Instant,
    length: Duration,
}

impl ResendCooldown {
    #[must_use]
    pub fn started(length: Duration) -> Self {
        Self {
            sent_at: Instant::now(),
            length,
        }
    }

    pub fn restart(&mut self) {
        self.sent_at = Instant::now();
    }

    /// Whole seconds left, rounded up so the label never shows "0s".
    #[must_use]
    pub fn remaining_secs(&self) -> u64 {
        let left = self.length.saturating_sub(self.sent_at.elapsed());
        left.as_secs() + u64::from(left.subsec_nanos() > 0)
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.remaining_secs() == 0
    }

    #[must_use]
    pub fn label(&self) -> String {
        match self.remaining_secs() {
            0 => "Resend Code".to_string(),
            secs => format!("Resend in {secs}s"),
        }
    }
}

/// A code that has been mailed and not yet entered.
#[derive(Debug, Clone)]
pub struct PendingVerification {
    purpose: VerificationPurpose,
    email: String,
    token: VerificationToken,
    cooldown: ResendCooldown,
}

impl PendingVerification {
    #[must_use]
    pub fn purpose(&self) -> VerificationPurpose {
        self.purpose
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn cooldown(&self) -> ResendCooldown {
        self.cooldown
    }
}

/// Signup, email verification and password reset against the backend.
#[derive(Clone)]
pub struct AccountService {
    api: Arc<dyn AssessmentApi>,
    cooldown: Duration,
}

impl AccountService {
    #[must_use]
    pub fn new(api: Arc<dyn AssessmentApi>) -> Self {
        Self::with_cooldown(api, OTP_RESEND_COOLDOWN)
    }

    #[must_use]
    pub fn with_cooldown(api: Arc<dyn AssessmentApi>, cooldown: Duration) -> Self {
        Self { api, cooldown }
    }

    fn pending(
        &self,
        purpose: VerificationPurpose,
        email: &str,
        token: VerificationToken,
    ) -> PendingVerification {
        PendingVerification {
            purpose,
            email: email.trim().to_string(),
            token,
            cooldown: ResendCooldown::started(self.cooldown),
        }
    }

    /// Validate the form, then ask the backend to mail a verification code.
    ///
    /// # Errors
    ///
    /// `AccountError::Form` without contacting the backend when the form is
    /// incomplete, `AccountError::Api` when the backend refuses.
    pub async fn sign_up(&self, form: &SignupForm) -> Result<PendingVerification, AccountError> {
        form.validate()?;
        let token = self.api.signup(form).await?;
        tracing::info!("signup code sent");
        Ok(self.pending(VerificationPurpose::Signup, &form.email, token))
    }

    /// # Errors
    ///
    /// `AccountError::Form` for a blank address, `AccountError::Api` when the
    /// backend does not know it.
    pub async fn request_reset(&self, email: &str) -> Result<PendingVerification, AccountError> {
        if email.trim().is_empty() {
            return Err(strand_core::model::AccountFormError::MissingFields.into());
        }
        let token = self.api.request_password_reset(email.trim()).await?;
        tracing::info!("password reset code sent");
        Ok(self.pending(VerificationPurpose::PasswordReset, email, token))
    }

    /// Mail a new code and restart the countdown.
    ///
    /// # Errors
    ///
    /// `AccountError::CooldownActive` while the countdown is running.
    pub async fn resend(&self, pending: &mut PendingVerification) -> Result<(), AccountError> {
        let remaining_secs = pending.cooldown.remaining_secs();
        if remaining_secs > 0 {
            return Err(AccountError::CooldownActive { remaining_secs });
        }
        pending.token = match pending.purpose {
            VerificationPurpose::Signup => self.api.resend_signup_otp(&pending.token).await?,
            VerificationPurpose::PasswordReset => {
                self.api.request_password_reset(&pending.email).await?
            }
        };
        pending.cooldown.restart();
        tracing::debug!(purpose = ?pending.purpose, "verification code re-sent");
        Ok(())
    }

    /// Confirm the signup code; the account exists once this returns `Ok`.
    ///
    /// # Errors
    ///
    /// `AccountError::Form` for a malformed code, `AccountError::Api` when it
    /// does not match.
    pub async fn verify_signup(
        &self,
        pending: &PendingVerification,
        otp: &str,
    ) -> Result<(), AccountError> {
        if pending.purpose != VerificationPurpose::Signup {
            return Err(AccountError::WrongPurpose);
        }
        let otp = OtpCode::parse(otp)?;
        self.api.verify_email(&pending.token, &otp).await?;
        tracing::info!("email verified");
        Ok(())
    }

    /// # Errors
    ///
    /// `AccountError::Form` for a malformed code or mismatched passwords,
    /// `AccountError::Api` when the backend refuses the code.
    pub async fn reset_password(
        &self,
        pending: &PendingVerification,
        otp: &str,
        reset: &PasswordReset,
    ) -> Result<(), AccountError> {
        if pending.purpose != VerificationPurpose::PasswordReset {
            return Err(AccountError::WrongPurpose);
        }
        let otp = OtpCode::parse(otp)?;
        reset.validate()?;
        self.api
            .reset_password(&pending.token, &otp, &reset.new_password)
            .await?;
        tracing::info!("password reset");
        Ok(())
    }
}
