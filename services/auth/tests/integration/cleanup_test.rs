use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use sentinel_auth::domain::types::ResetToken;
use sentinel_auth::worker::{CleanupWorker, SweepReport};

use crate::helpers::{MockResetTokenRepo, MockSessionRepo, test_session};

fn fixture() -> (MockSessionRepo, MockResetTokenRepo) {
    let now = Utc::now();
    let sessions = MockSessionRepo::with(vec![
        test_session(1, 1, now - chrono::Duration::days(31)),
        test_session(2, 1, now - chrono::Duration::days(29)),
        test_session(3, 2, now),
    ]);

    let mut expired = ResetToken::issue("old@example.com");
    expired.expires_at = now - chrono::Duration::minutes(1);
    let tokens = MockResetTokenRepo::with(vec![expired, ResetToken::issue("live@example.com")]);
    (sessions, tokens)
}

#[tokio::test]
async fn should_sweep_old_sessions_and_expired_tokens() {
    let (sessions, tokens) = fixture();
    let worker = CleanupWorker {
        sessions: sessions.clone(),
        reset_tokens: tokens.clone(),
        interval: Duration::from_secs(3600),
    };

    let report = worker.sweep().await.unwrap();

    assert_eq!(
        report,
        SweepReport {
            sessions: 1,
            reset_tokens: 1,
        }
    );
    assert_eq!(sessions.active_count(1), 1);
    let remaining = tokens.tokens.lock().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].email, "live@example.com");
}

#[tokio::test]
async fn should_be_idempotent() {
    let (sessions, tokens) = fixture();
    let worker = CleanupWorker {
        sessions,
        reset_tokens: tokens,
        interval: Duration::from_secs(3600),
    };

    worker.sweep().await.unwrap();
    assert_eq!(worker.sweep().await.unwrap(), SweepReport::default());
}

#[tokio::test]
async fn should_sweep_on_start_and_stop_on_shutdown() {
    let (sessions, tokens) = fixture();
    let worker = CleanupWorker {
        sessions: sessions.clone(),
        reset_tokens: tokens,
        interval: Duration::from_secs(3600),
    };
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(worker.run(shutdown_rx));

    tokio::time::timeout(Duration::from_secs(5), async {
        while sessions.active_count(1) != 1 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("first sweep did not run");

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("worker did not stop")
        .unwrap();
}
