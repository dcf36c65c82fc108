//! Throttled delivery of account emails.
//!
//! Password-reset and magic-link emails are sent only while the recipient is
//! within the limiter's budget for that kind of email. Recipients never
//! appear in logs, only their `recipient_hash`.

use crate::application::limiter::RateLimiter;
use crate::application::ports::{Mailer, Storage};
use crate::domain::email::{
    magic_link_email, password_reset_email, recipient_hash, AppLinks, EmailKind, MailError,
    OutgoingEmail, SendReceipt,
};
use crate::domain::policy::ThrottleEntry;
use tracing::{error, info, warn};

/// Outcome of a throttled send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The provider accepted the email
    Sent(SendReceipt),
    /// The recipient exceeded the limit; nothing was sent
    Throttled,
}

impl Delivery {
    /// Check if the email was handed to the provider.
    pub fn is_sent(&self) -> bool {
        matches!(self, Delivery::Sent(_))
    }
}

/// Mailer wrapper that consults a rate limiter before every send.
#[derive(Debug, Clone)]
pub struct ThrottledMailer<M, S>
where
    M: Mailer,
    S: Storage<String, ThrottleEntry> + Clone,
{
    mailer: M,
    limiter: RateLimiter<S>,
    links: AppLinks,
}

impl<M, S> ThrottledMailer<M, S>
where
    M: Mailer,
    S: Storage<String, ThrottleEntry> + Clone,
{
    /// Wrap a mailer with a limiter.
    ///
    /// Account links point at the local development URL until
    /// [`with_links`](Self::with_links) is called.
    pub fn new(mailer: M, limiter: RateLimiter<S>) -> Self {
        Self {
            mailer,
            limiter,
            links: AppLinks::default(),
        }
    }

    /// Set where account links point.
    pub fn with_links(mut self, links: AppLinks) -> Self {
        self.links = links;
        self
    }

    /// Send a password reset link for `token` to `to`.
    pub async fn send_password_reset(
        &self,
        to: &str,
        token: &str,
    ) -> Result<Delivery, MailError> {
        let email = password_reset_email(to, &self.links.reset_url(token));
        self.send(EmailKind::PasswordReset, email).await
    }

    /// Send a magic sign-in link for `token` to `to`.
    ///
    /// `protocol` overrides the scheme of domain-derived links (default
    /// `https`).
    pub async fn send_magic_link(
        &self,
        to: &str,
        token: &str,
        protocol: Option<&str>,
    ) -> Result<Delivery, MailError> {
        let email = magic_link_email(to, &self.links.login_url(token, protocol));
        self.send(EmailKind::MagicLink, email).await
    }

    /// Send `email` if its recipient is within budget for `kind`.
    ///
    /// A throttled send is not an error: it returns `Ok(Delivery::Throttled)`
    /// without contacting the provider. Provider failures are returned as-is.
    pub async fn send(
        &self,
        kind: EmailKind,
        email: OutgoingEmail,
    ) -> Result<Delivery, MailError> {
        let to_hash = recipient_hash(&email.to);
        let key = kind.throttle_key(&email.to);

        if !self.limiter.check_and_consume(&key) {
            warn!(kind = kind.as_str(), to_hash = %to_hash, "too many email requests");
            return Ok(Delivery::Throttled);
        }

        let receipt = self.mailer.send(&email).await.map_err(|e| {
            error!(kind = kind.as_str(), to_hash = %to_hash, error = %e, "email send failed");
            e
        })?;
        info!(
            kind = kind.as_str(),
            id = %receipt.id,
            to_hash = %to_hash,
            "email sent"
        );

        Ok(Delivery::Sent(receipt))
    }

    /// Get a reference to the limiter.
    pub fn limiter(&self) -> &RateLimiter<S> {
        &self.limiter
    }

    /// Where account links point.
    pub fn links(&self) -> &AppLinks {
        &self.links
    }

    /// Get a reference to the wrapped mailer.
    pub fn mailer(&self) -> &M {
        &self.mailer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::RecordingMailer;

    fn email(to: &str) -> OutgoingEmail {
        OutgoingEmail::new(to, "Reset your password", "<p>reset</p>", "reset")
    }

    #[tokio::test]
    async fn test_send_within_budget() {
        let mailer = ThrottledMailer::new(RecordingMailer::new(), RateLimiter::new());

        let delivery = mailer
            .send(EmailKind::PasswordReset, email("a@b.co"))
            .await
            .unwrap();

        assert!(delivery.is_sent());
        assert_eq!(mailer.mailer().sent().len(), 1);
    }

    #[tokio::test]
    async fn test_fourth_send_throttled() {
        let mailer = ThrottledMailer::new(RecordingMailer::new(), RateLimiter::new());

        for _ in 0..3 {
            let delivery = mailer
                .send(EmailKind::PasswordReset, email("a@b.co"))
                .await
                .unwrap();
            assert!(delivery.is_sent());
        }

        let delivery = mailer
            .send(EmailKind::PasswordReset, email("a@b.co"))
            .await
            .unwrap();
        assert_eq!(delivery, Delivery::Throttled);
        assert_eq!(mailer.mailer().sent().len(), 3);
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let recording = RecordingMailer::new();
        recording.fail_with("smtp down");
        let mailer = ThrottledMailer::new(recording, RateLimiter::new());

        let err = mailer
            .send(EmailKind::MagicLink, email("a@b.co"))
            .await
            .unwrap_err();
        assert_eq!(err, MailError::Provider("smtp down".to_string()));
    }

    #[tokio::test]
    async fn test_password_reset_renders_link() {
        let public_url = Some("https://lizatoph.com/".to_string());
        let links = AppLinks::new(public_url, Vec::<String>::new());
        let mailer =
            ThrottledMailer::new(RecordingMailer::new(), RateLimiter::new()).with_links(links);

        let delivery = mailer.send_password_reset("a@b.co", "t/1").await.unwrap();
        assert!(delivery.is_sent());

        let sent = mailer.mailer().sent();
        assert_eq!(sent[0].to, "a@b.co");
        assert!(sent[0]
            .text
            .contains("https://lizatoph.com/reset-password/t%2F1"));
        assert_eq!(mailer.limiter().tracked_keys(), 1);
    }

    #[tokio::test]
    async fn test_magic_link_uses_protocol_override() {
        let links = AppLinks::new(None, ["abc.replit.app"]);
        let mailer =
            ThrottledMailer::new(RecordingMailer::new(), RateLimiter::new()).with_links(links);

        mailer
            .send_magic_link("a@b.co", "tok", Some("http"))
            .await
            .unwrap();

        let sent = mailer.mailer().sent();
        assert_eq!(sent[0].subject, "Your login link — Liza & Toph");
        assert!(sent[0]
            .text
            .contains("http://abc.replit.app/api/auth/verify/tok"));
    }
}
