use nursery_guard::infrastructure::mocks::{MockCaptureLayer, MockClock, RecordingMailer};
use nursery_guard::{
    recipient_hash, Delivery, EmailKind, LinkConfig, OutgoingEmail, RateLimiter, SharedStorage,
    ThrottledMailer,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

fn reset_email(to: &str) -> OutgoingEmail {
    OutgoingEmail::new(to, "Reset your password", "<p>reset</p>", "reset")
}

fn mailer() -> (
    ThrottledMailer<RecordingMailer, SharedStorage>,
    RecordingMailer,
    MockClock,
) {
    let clock = MockClock::new(Instant::now());
    let limiter = RateLimiter::builder()
        .with_clock(Arc::new(clock.clone()))
        .build()
        .unwrap();
    let recording = RecordingMailer::new();
    (
        ThrottledMailer::new(recording.clone(), limiter),
        recording,
        clock,
    )
}

#[tokio::test]
async fn test_three_resets_per_five_minutes() {
    let (mailer, recording, clock) = mailer();

    for _ in 0..3 {
        let delivery = mailer
            .send(EmailKind::PasswordReset, reset_email("jane@example.com"))
            .await
            .unwrap();
        assert!(delivery.is_sent());
    }

    let delivery = mailer
        .send(EmailKind::PasswordReset, reset_email("jane@example.com"))
        .await
        .unwrap();
    assert_eq!(delivery, Delivery::Throttled);
    assert_eq!(recording.sent().len(), 3);

    // Quiet for just over five minutes
    clock.advance(Duration::from_millis(300_001));
    let delivery = mailer
        .send(EmailKind::PasswordReset, reset_email("jane@example.com"))
        .await
        .unwrap();
    assert!(delivery.is_sent());
    assert_eq!(recording.sent().len(), 4);
}

#[tokio::test]
async fn test_kinds_and_recipients_are_independent() {
    let (mailer, recording, _clock) = mailer();

    for _ in 0..3 {
        mailer
            .send(EmailKind::PasswordReset, reset_email("jane@example.com"))
            .await
            .unwrap();
    }

    let magic = mailer
        .send(EmailKind::MagicLink, reset_email("jane@example.com"))
        .await
        .unwrap();
    assert!(magic.is_sent());

    let other = mailer
        .send(EmailKind::PasswordReset, reset_email("john@example.com"))
        .await
        .unwrap();
    assert!(other.is_sent());

    assert_eq!(recording.sent().len(), 5);
    assert_eq!(mailer.limiter().tracked_keys(), 3);
}

#[tokio::test]
async fn test_receipts_come_from_provider() {
    let (mailer, _recording, _clock) = mailer();

    let delivery = mailer
        .send(EmailKind::MagicLink, reset_email("jane@example.com"))
        .await
        .unwrap();

    match delivery {
        Delivery::Sent(receipt) => assert_eq!(receipt.id, "msg-1"),
        Delivery::Throttled => panic!("first send should not be throttled"),
    }
}

#[tokio::test]
async fn test_failed_send_still_counts_against_limit() {
    let (mailer, recording, _clock) = mailer();
    recording.fail_with("provider unavailable");

    for _ in 0..3 {
        assert!(mailer
            .send(EmailKind::PasswordReset, reset_email("jane@example.com"))
            .await
            .is_err());
    }

    let delivery = mailer
        .send(EmailKind::PasswordReset, reset_email("jane@example.com"))
        .await
        .unwrap();
    assert_eq!(delivery, Delivery::Throttled);
}

#[test]
fn test_logs_hash_not_recipient() {
    let capture = MockCaptureLayer::new();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    let (mailer, _recording, _clock) = mailer();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    tracing::subscriber::with_default(subscriber, || {
        runtime.block_on(async {
            for _ in 0..4 {
                mailer
                    .send(EmailKind::PasswordReset, reset_email("Jane@Example.com"))
                    .await
                    .unwrap();
            }
        });
    });

    let expected_hash = recipient_hash("jane@example.com");

    let sent = capture.at_level(Level::INFO);
    assert_eq!(sent.len(), 3);
    assert!(sent
        .iter()
        .all(|event| event.field("to_hash") == Some(expected_hash.as_str())));

    let throttled = capture.at_level(Level::WARN);
    assert_eq!(throttled.len(), 1);
    assert_eq!(throttled[0].message, "too many email requests");
    assert_eq!(throttled[0].field("kind"), Some("password_reset"));
    assert_eq!(throttled[0].field("to_hash"), Some(expected_hash.as_str()));

    for event in capture.get_captured() {
        assert!(!event.message.contains("Example.com"));
        assert!(event.fields.values().all(|v| !v.contains("Example.com")));
    }
}

#[tokio::test]
async fn test_account_emails_link_to_configured_host() {
    let (mailer, recording, _clock) = mailer();
    let config = LinkConfig::from_lookup(|key| match key {
        "REPLIT_DOMAINS" => Some("abc.replit.app,lizatoph.com".to_string()),
        _ => None,
    });
    let mailer = mailer.with_links(config.links());

    for _ in 0..3 {
        let delivery = mailer
            .send_password_reset("jane@example.com", "tok=1")
            .await
            .unwrap();
        assert!(delivery.is_sent());
    }
    let delivery = mailer
        .send_password_reset("jane@example.com", "tok=1")
        .await
        .unwrap();
    assert_eq!(delivery, Delivery::Throttled);

    // Separate budget for magic links
    let delivery = mailer
        .send_magic_link("jane@example.com", "login", Some("http"))
        .await
        .unwrap();
    assert!(delivery.is_sent());

    let sent = recording.sent();
    assert_eq!(sent.len(), 4);
    assert_eq!(sent[0].subject, "Reset your password — Liza & Toph");
    assert!(sent[0]
        .text
        .contains("https://lizatoph.com/reset-password/tok%3D1"));
    assert!(sent[0].text.ends_with("This link expires in 1 hour."));
    assert_eq!(sent[3].subject, "Your login link — Liza & Toph");
    assert!(sent[3]
        .text
        .contains("http://lizatoph.com/api/auth/verify/login"));
}
