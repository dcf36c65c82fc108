//! Outgoing email types for throttled sends.
//!
//! Also renders the two account emails: password reset and magic-link
//! sign-in. Links are built from [`AppLinks`], with the token
//! percent-encoded as a single URI component.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt;

/// Base URL used when no public host is configured.
pub const LOCAL_BASE_URL: &str = "http://localhost:5000";

/// Suffix of platform-assigned hosts, used only when no custom host exists.
const PLATFORM_HOST_SUFFIX: &str = ".replit.app";

/// Characters escaped in a link token. Everything but `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const TOKEN_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Kind of account email. Each kind is throttled independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmailKind {
    /// Password reset link
    PasswordReset,
    /// Passwordless login link
    MagicLink,
}

impl EmailKind {
    /// Short name used in throttle keys.
    pub fn prefix(&self) -> &'static str {
        match self {
            EmailKind::PasswordReset => "reset",
            EmailKind::MagicLink => "magic",
        }
    }

    /// Name used in log events.
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailKind::PasswordReset => "password_reset",
            EmailKind::MagicLink => "magic_link",
        }
    }

    /// Throttle key for a recipient, e.g. `reset_jane@example.com`.
    pub fn throttle_key(&self, recipient: &str) -> String {
        format!("{}_{}", self.prefix(), recipient)
    }
}

impl fmt::Display for EmailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rendered email ready to hand to a mail provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl OutgoingEmail {
    pub fn new(
        to: impl Into<String>,
        subject: impl Into<String>,
        html: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            html: html.into(),
            text: text.into(),
        }
    }
}

/// Where account links point.
///
/// An explicit public URL wins. Otherwise a custom app domain is preferred
/// over a platform-assigned one, and with no domains at all links point at
/// [`LOCAL_BASE_URL`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppLinks {
    public_app_url: Option<String>,
    domains: Vec<String>,
}

impl AppLinks {
    /// Create links from a public URL and a list of app domains.
    ///
    /// Domains are trimmed and empty ones dropped.
    pub fn new<I, D>(public_app_url: Option<String>, domains: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: AsRef<str>,
    {
        let domains = domains
            .into_iter()
            .map(|d| d.as_ref().trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();
        Self {
            public_app_url,
            domains,
        }
    }

    /// Base URL without a trailing slash.
    ///
    /// `protocol` applies only to domain-derived URLs and defaults to
    /// `https`.
    pub fn base_url(&self, protocol: Option<&str>) -> String {
        let explicit = self.public_app_url.as_deref().map(str::trim).unwrap_or("");
        if !explicit.is_empty() {
            return explicit.trim_end_matches('/').to_string();
        }

        let host = self
            .domains
            .iter()
            .find(|d| !d.contains(PLATFORM_HOST_SUFFIX))
            .or_else(|| self.domains.first());

        match host {
            Some(host) => format!("{}://{}", protocol.unwrap_or("https"), host),
            None => LOCAL_BASE_URL.to_string(),
        }
    }

    /// Link to the password reset page for `token`.
    pub fn reset_url(&self, token: &str) -> String {
        format!("{}/reset-password/{}", self.base_url(None), encode_token(token))
    }

    /// Sign-in link for a magic-link `token`.
    ///
    /// `protocol` is ignored whenever a public URL is set, even one that is
    /// blank after trimming.
    pub fn login_url(&self, token: &str, protocol: Option<&str>) -> String {
        let has_public_url = self.public_app_url.as_deref().is_some_and(|u| !u.is_empty());
        let base = if has_public_url {
            self.base_url(None)
        } else {
            self.base_url(protocol)
        };
        format!("{}/api/auth/verify/{}", base, encode_token(token))
    }
}

fn encode_token(token: &str) -> String {
    utf8_percent_encode(token, TOKEN_ESCAPES).to_string()
}

/// Render the password reset email. The link expires after one hour.
pub fn password_reset_email(to: &str, reset_url: &str) -> OutgoingEmail {
    let html = layout(&format!(
        r#"
    <p>We received a request to reset your password for your Liza & Toph account.</p>
    <p>Click the button below to reset your password:</p>
    <p><a href="{url}" style="{BUTTON_STYLE}">Reset password</a></p>
    <p>Or copy and paste this link into your browser:</p>
    <p style="color:#666;word-break:break-all">{url}</p>
    <p style="color:#999;font-size:14px;margin-top:24px">This link will expire in 1 hour.</p>
    <p style="color:#999;font-size:14px">If you didn't request this, you can safely ignore this email.</p>
  "#,
        url = reset_url,
    ));
    let text = format!(
        "Reset your Liza & Toph password:\n{}\nThis link expires in 1 hour.",
        reset_url
    );
    OutgoingEmail::new(to, "Reset your password — Liza & Toph", html, text)
}

/// Render the magic-link sign-in email. The link is single use and expires
/// after 15 minutes.
pub fn magic_link_email(to: &str, login_url: &str) -> OutgoingEmail {
    let html = layout(&format!(
        r#"
    <p>Tap the button below to sign in:</p>
    <p><a href="{url}" style="{BUTTON_STYLE}">Sign in</a></p>
    <p>Or copy and paste this link into your browser:</p>
    <p style="color:#666;word-break:break-all">{url}</p>
    <p style="color:#999;font-size:14px;margin-top:24px">This link will expire in 15 minutes and can only be used once.</p>
    <p style="color:#999;font-size:14px">If you didn't request this, you can safely ignore this email.</p>
  "#,
        url = login_url,
    ));
    let text = format!(
        "Sign in to Liza & Toph:\n{}\nThis link expires in 15 minutes and can only be used once.",
        login_url
    );
    OutgoingEmail::new(to, "Your login link — Liza & Toph", html, text)
}

const BUTTON_STYLE: &str = "display:inline-block;background:#3D572A;color:#fff;\
text-decoration:none;padding:12px 16px;border-radius:10px;font-weight:600";

fn layout(inner_html: &str) -> String {
    format!(
        r#"
  <div style="font-family: Inter, system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; color:#111; line-height:1.5">
    <div style="max-width:640px;margin:24px auto;padding:24px;border:1px solid #eee;border-radius:16px;background:#fff">
      <div style="text-align:center;margin-bottom:16px;">
        <div style="font-weight:700;font-size:18px;">Liza & Toph</div>
        <div style="color:#666;font-size:14px;">Because childhood isn’t guesswork.</div>
      </div>
      {inner_html}
      <hr style="border:none;border-top:1px solid #eee;margin:24px 0"/>
      <div style="font-size:12px;color:#666">
        You’re receiving this message because someone requested this action in Liza & Toph.
        If this wasn’t you, ignore this email—no changes were made.
      </div>
    </div>
  </div>"#
    )
}

/// Provider acknowledgement for a sent email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// Provider message id
    pub id: String,
}

/// Error returned by a mail provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailError {
    /// The provider rejected or failed to deliver the message
    Provider(String),
}

impl fmt::Display for MailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MailError::Provider(reason) => write!(f, "mail provider error: {}", reason),
        }
    }
}

impl std::error::Error for MailError {}

/// Stable, non-reversible tag for a recipient, safe to put in logs.
///
/// The address is trimmed and lowercased, then folded with a 32-bit
/// `h * 31 + unit` hash over its UTF-16 code units.
pub fn recipient_hash(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    let hash = normalized
        .encode_utf16()
        .fold(0u32, |h, unit| h.wrapping_mul(31).wrapping_add(u32::from(unit)));
    format!("h{:x}", hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_keys() {
        assert_eq!(
            EmailKind::PasswordReset.throttle_key("a@b.co"),
            "reset_a@b.co"
        );
        assert_eq!(EmailKind::MagicLink.throttle_key("a@b.co"), "magic_a@b.co");
    }

    #[test]
    fn test_recipient_hash_known_values() {
        assert_eq!(recipient_hash(""), "h0");
        // 'a' = 97
        assert_eq!(recipient_hash("a"), "h61");
        // 97 * 31 + 98 = 3105
        assert_eq!(recipient_hash("ab"), "hc21");
    }

    #[test]
    fn test_recipient_hash_normalizes() {
        assert_eq!(
            recipient_hash("  Jane@Example.com "),
            recipient_hash("jane@example.com")
        );
        assert_ne!(
            recipient_hash("jane@example.com"),
            recipient_hash("john@example.com")
        );
    }

    #[test]
    fn test_recipient_hash_wraps() {
        let long = "x".repeat(500);
        let tag = recipient_hash(&long);
        assert!(tag.starts_with('h'));
        assert!(tag.len() <= 9);
    }

    fn links(public: Option<&str>, domains: &str) -> AppLinks {
        AppLinks::new(public.map(str::to_string), domains.split(','))
    }

    #[test]
    fn test_base_url_precedence() {
        assert_eq!(links(None, "").base_url(None), "http://localhost:5000");
        assert_eq!(
            links(Some(" https://app.lizatoph.com/// "), "x.replit.app").base_url(None),
            "https://app.lizatoph.com"
        );
        assert_eq!(
            links(None, "abc.replit.app, lizatoph.com").base_url(None),
            "https://lizatoph.com"
        );
        assert_eq!(
            links(None, " abc.replit.app ,").base_url(Some("http")),
            "http://abc.replit.app"
        );
        assert_eq!(links(Some("   "), "").base_url(None), "http://localhost:5000");
    }

    #[test]
    fn test_token_is_uri_component_encoded() {
        let links = AppLinks::default();
        assert_eq!(
            links.reset_url("a+b/c=d e"),
            "http://localhost:5000/reset-password/a%2Bb%2Fc%3Dd%20e"
        );
        assert_eq!(
            links.reset_url("tok-_.!~*'()9"),
            "http://localhost:5000/reset-password/tok-_.!~*'()9"
        );
    }

    #[test]
    fn test_login_url_protocol_override() {
        let hosted = links(None, "lizatoph.com");
        assert_eq!(
            hosted.login_url("t", Some("http")),
            "http://lizatoph.com/api/auth/verify/t"
        );
        assert_eq!(
            hosted.login_url("t", None),
            "https://lizatoph.com/api/auth/verify/t"
        );

        // A set public URL ignores the override, even when blank
        let blank = links(Some(" "), "lizatoph.com");
        assert_eq!(
            blank.login_url("t", Some("http")),
            "https://lizatoph.com/api/auth/verify/t"
        );
    }

    #[test]
    fn test_rendered_emails() {
        let reset = password_reset_email("a@b.co", "https://x.co/reset-password/t");
        assert_eq!(reset.to, "a@b.co");
        assert_eq!(reset.subject, "Reset your password — Liza & Toph");
        assert_eq!(
            reset.text,
            "Reset your Liza & Toph password:\nhttps://x.co/reset-password/t\nThis link expires in 1 hour."
        );
        assert_eq!(reset.html.matches("https://x.co/reset-password/t").count(), 2);
        assert!(reset.html.contains("expire in 1 hour"));

        let magic = magic_link_email("a@b.co", "https://x.co/api/auth/verify/t");
        assert_eq!(magic.subject, "Your login link — Liza & Toph");
        assert!(magic.text.ends_with("expires in 15 minutes and can only be used once."));
        assert!(magic.html.contains("Sign in</a>"));
    }
}
