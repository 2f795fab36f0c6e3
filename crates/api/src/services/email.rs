//! Password reset code delivery.
//!
//! Uses SMTP via lettre when configured; otherwise codes are written to the
//! log so local development still works.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use lakshmi_core::Email;

use crate::config::SmtpConfig;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Delivers password reset codes to users.
#[async_trait]
pub trait ResetCodeSender: Send + Sync {
    /// Send `code` to `to`, addressed to `name`.
    async fn send_reset_code(&self, to: &Email, name: &str, code: &str)
    -> Result<(), EmailError>;
}

/// SMTP sender for production.
#[derive(Clone)]
pub struct SmtpSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpSender {
    /// Create a new SMTP sender from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay cannot be configured or `SMTP_FROM` is not a mailbox.
    pub fn new(config: &SmtpConfig) -> Result<Self, EmailError> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        let from = config
            .from
            .parse()
            .map_err(|_| EmailError::InvalidAddress(config.from.clone()))?;

        Ok(Self { mailer, from })
    }
}

#[async_trait]
impl ResetCodeSender for SmtpSender {
    async fn send_reset_code(
        &self,
        to: &Email,
        name: &str,
        code: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(to
                .as_str()
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject("Your password reset code")
            .header(ContentType::TEXT_PLAIN)
            .body(reset_code_body(name, code))?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, "Reset code email sent");
        Ok(())
    }
}

/// Fallback sender used when SMTP is not configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSender;

#[async_trait]
impl ResetCodeSender for LogSender {
    async fn send_reset_code(
        &self,
        to: &Email,
        _name: &str,
        code: &str,
    ) -> Result<(), EmailError> {
        tracing::warn!(to = %to, code, "SMTP not configured; reset code written to log");
        Ok(())
    }
}

fn reset_code_body(name: &str, code: &str) -> String {
    format!(
        "Hi {name},\n\n\
         Your password reset code is {code}. It expires in 15 minutes.\n\n\
         If you did not ask to reset your password you can ignore this email.\n"
    )
}

/// Generate a 6-digit verification code.
#[must_use]
pub fn generate_reset_code() -> String {
    use rand::Rng;
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_reset_code_range() {
        for _ in 0..100 {
            let code = generate_reset_code();
            assert_eq!(code.len(), 6);
            let value: u32 = code.parse().expect("valid number");
            assert!((100_000..1_000_000).contains(&value));
        }
    }

    #[test]
    fn test_reset_code_body_mentions_code() {
        let body = reset_code_body("Asha", "123456");
        assert!(body.starts_with("Hi Asha,"));
        assert!(body.contains("123456"));
    }

    #[tokio::test]
    async fn test_log_sender_succeeds() {
        let email = Email::parse("asha@example.com").expect("valid email");
        assert!(LogSender.send_reset_code(&email, "Asha", "123456").await.is_ok());
    }
}
