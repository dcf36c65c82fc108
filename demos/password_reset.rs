//! Password-reset throttling with console output.
//!
//! Sends five reset emails to the same address. The first three reach the
//! (console) mail provider; the rest are throttled and logged with a hashed
//! recipient.
//!
//! Run with `cargo run --example password_reset`. The limit and window can be
//! changed through `THROTTLE_LIMIT` and `THROTTLE_WINDOW_MS`, and the link
//! host through `PUBLIC_APP_URL` or `REPLIT_DOMAINS`.

use nursery_guard::{
    band_for, label_for, LinkConfig, MailError, Mailer, OutgoingEmail, RateLimiter, SendReceipt,
    ThrottleConfig, ThrottledMailer,
};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

/// Mail provider that prints instead of sending.
#[derive(Debug, Default)]
struct ConsoleMailer {
    next_id: AtomicU64,
}

impl Mailer for ConsoleMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<SendReceipt, MailError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        println!("--- email #{id}: {}\n{}\n", email.subject, email.text);
        Ok(SendReceipt {
            id: format!("console-{id}"),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ThrottleConfig::from_env()?;
    let limiter = RateLimiter::builder().with_config(config).build()?;
    let links = LinkConfig::from_env().links();
    let mailer = ThrottledMailer::new(ConsoleMailer::default(), limiter).with_links(links);

    println!("=== Password Reset Throttling ===\n");
    println!(
        "Policy: {} per {:?} window ({:?})\n",
        config.limit, config.window, config.mode
    );

    for attempt in 1..=5 {
        let delivery = mailer
            .send_password_reset("parent@example.com", "demo-token")
            .await?;
        println!("attempt {attempt}: sent = {}", delivery.is_sent());
    }

    let snapshot = mailer.limiter().metrics().snapshot();
    println!(
        "\nallowed: {}, throttled: {}",
        snapshot.actions_allowed, snapshot.actions_throttled
    );

    let band = band_for(40);
    println!(
        "\nA 40-month-old is in band {} ({}), the {} stage",
        band,
        label_for(band.id()),
        band.stage().current
    );

    Ok(())
}
