use std::sync::atomic::Ordering;

use sentinel_auth::domain::repository::RecoveryCodeRepository;
use sentinel_auth::error::AuthServiceError;
use sentinel_auth::usecase::credential::generate_totp_secret;
use sentinel_auth::usecase::login::{
    LoginInput, LoginOutcome, LoginOutput, LoginUseCase, LogoutAllUseCase, LogoutUseCase,
};
use sentinel_auth_types::token::TokenKind;

use crate::helpers::{
    MockBanRepo, MockRecoveryCodeRepo, MockSessionRepo, MockUserRepo, TEST_PASSWORD, codec,
    current_totp, hash_password, test_hasher, test_user, test_user_with_2fa, wrong_totp,
};

struct Fixture {
    users: MockUserRepo,
    sessions: MockSessionRepo,
    bans: MockBanRepo,
    recovery_codes: MockRecoveryCodeRepo,
}

impl Fixture {
    fn new(users: MockUserRepo) -> Self {
        Self {
            users,
            sessions: MockSessionRepo::empty(),
            bans: MockBanRepo::empty(),
            recovery_codes: MockRecoveryCodeRepo::empty(),
        }
    }

    fn usecase(
        &self,
    ) -> LoginUseCase<MockUserRepo, MockSessionRepo, MockBanRepo, MockRecoveryCodeRepo> {
        LoginUseCase {
            users: self.users.clone(),
            sessions: self.sessions.clone(),
            bans: self.bans.clone(),
            recovery_codes: self.recovery_codes.clone(),
            codec: codec(),
            hasher: test_hasher(),
        }
    }
}

fn credentials(email: &str, password: &str) -> LoginInput {
    LoginInput {
        email: email.to_owned(),
        password: password.to_owned(),
        ..LoginInput::default()
    }
}

fn authenticated(outcome: LoginOutcome) -> LoginOutput {
    match outcome {
        LoginOutcome::Authenticated(output) => output,
        LoginOutcome::TwoFactorChallenge => panic!("expected tokens, got 2FA challenge"),
    }
}

#[tokio::test]
async fn should_issue_tokens_and_record_session() {
    let fixture = Fixture::new(MockUserRepo::new(vec![test_user(1, "alice@example.com")]));

    let mut input = credentials("alice@example.com", TEST_PASSWORD);
    input.user_agent = Some("curl/8.0".to_owned());
    input.ip_address = Some("203.0.113.7".to_owned());
    let output = authenticated(fixture.usecase().execute(input).await.unwrap());

    let access = codec()
        .verify(&output.access_token, TokenKind::Access)
        .unwrap();
    assert_eq!(access.user_id, 1);
    assert_eq!(access.expires_at, output.expires_at);
    let refresh = codec()
        .verify(&output.refresh_token, TokenKind::Refresh)
        .unwrap();
    assert_eq!(refresh.user_id, 1);

    let sessions = fixture.sessions.sessions.lock().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, output.session_id);
    assert_eq!(sessions[0].user_agent.as_deref(), Some("curl/8.0"));
    assert_eq!(sessions[0].ip_address.as_deref(), Some("203.0.113.7"));
}

#[tokio::test]
async fn should_not_distinguish_unknown_email_from_wrong_password() {
    let fixture = Fixture::new(MockUserRepo::new(vec![test_user(1, "alice@example.com")]));

    let unknown = fixture
        .usecase()
        .execute(credentials("nobody@example.com", TEST_PASSWORD))
        .await;
    let wrong = fixture
        .usecase()
        .execute(credentials("alice@example.com", "wrong"))
        .await;

    for result in [unknown, wrong] {
        let err = result.unwrap_err();
        assert!(matches!(err, AuthServiceError::InvalidCredentials), "got {err:?}");
        assert_eq!(err.to_string(), "invalid email or password");
    }
    assert!(fixture.sessions.sessions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_reject_banned_user_even_with_wrong_password() {
    let mut fixture = Fixture::new(MockUserRepo::new(vec![test_user(1, "alice@example.com")]));
    fixture.bans = MockBanRepo::banning(1);

    let result = fixture
        .usecase()
        .execute(credentials("alice@example.com", "wrong"))
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::UserBanned)),
        "expected UserBanned, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_banned_user_with_valid_password_and_totp() {
    let secret = generate_totp_secret();
    let mut fixture = Fixture::new(MockUserRepo::new(vec![test_user_with_2fa(
        1,
        "alice@example.com",
        &secret,
    )]));
    fixture.bans = MockBanRepo::banning(1);

    let mut input = credentials("alice@example.com", TEST_PASSWORD);
    input.totp_code = Some(current_totp(&secret));
    let result = fixture.usecase().execute(input).await;

    assert!(
        matches!(result, Err(AuthServiceError::UserBanned)),
        "expected UserBanned, got {result:?}"
    );
    assert!(fixture.sessions.sessions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_propagate_store_failure() {
    let fixture = Fixture::new(MockUserRepo::new(vec![test_user(1, "alice@example.com")]));
    fixture.users.fail.store(true, Ordering::SeqCst);

    let result = fixture
        .usecase()
        .execute(credentials("alice@example.com", TEST_PASSWORD))
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::StoreUnavailable(_))),
        "expected StoreUnavailable, got {result:?}"
    );
}

// ── Second factor ────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_challenge_when_2fa_code_missing() {
    let secret = generate_totp_secret();
    let fixture = Fixture::new(MockUserRepo::new(vec![test_user_with_2fa(
        1,
        "alice@example.com",
        &secret,
    )]));

    for code in [None, Some(String::new())] {
        let mut input = credentials("alice@example.com", TEST_PASSWORD);
        input.totp_code = code;
        let outcome = fixture.usecase().execute(input).await.unwrap();
        assert!(matches!(outcome, LoginOutcome::TwoFactorChallenge));
    }
    assert!(fixture.sessions.sessions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_not_challenge_before_password_check() {
    let secret = generate_totp_secret();
    let fixture = Fixture::new(MockUserRepo::new(vec![test_user_with_2fa(
        1,
        "alice@example.com",
        &secret,
    )]));

    let result = fixture
        .usecase()
        .execute(credentials("alice@example.com", "wrong"))
        .await;
    assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
}

#[tokio::test]
async fn should_accept_current_totp_code() {
    let secret = generate_totp_secret();
    let fixture = Fixture::new(MockUserRepo::new(vec![test_user_with_2fa(
        1,
        "alice@example.com",
        &secret,
    )]));

    let mut input = credentials("alice@example.com", TEST_PASSWORD);
    input.totp_code = Some(current_totp(&secret));
    let output = authenticated(fixture.usecase().execute(input).await.unwrap());
    assert!(output.user.two_factor_enabled);
}

#[tokio::test]
async fn should_reject_wrong_totp_code() {
    let secret = generate_totp_secret();
    let fixture = Fixture::new(MockUserRepo::new(vec![test_user_with_2fa(
        1,
        "alice@example.com",
        &secret,
    )]));

    let mut input = credentials("alice@example.com", TEST_PASSWORD);
    input.totp_code = Some(wrong_totp(&secret));
    let result = fixture.usecase().execute(input).await;
    assert!(
        matches!(result, Err(AuthServiceError::InvalidTwoFactorCode)),
        "expected InvalidTwoFactorCode, got {result:?}"
    );
}

#[tokio::test]
async fn should_consume_recovery_code_once() {
    let secret = generate_totp_secret();
    let fixture = Fixture::new(MockUserRepo::new(vec![test_user_with_2fa(
        1,
        "alice@example.com",
        &secret,
    )]));
    let hashes = vec![
        hash_password("ABCD2345"),
        hash_password("WXYZ7654"),
    ];
    fixture.recovery_codes.create(1, &hashes).await.unwrap();

    let mut input = credentials("alice@example.com", TEST_PASSWORD);
    input.recovery_code = Some("abcd-2345".to_owned());
    authenticated(fixture.usecase().execute(input.clone()).await.unwrap());
    assert_eq!(fixture.recovery_codes.active_count(1), 1);

    let replay = fixture.usecase().execute(input).await;
    assert!(
        matches!(replay, Err(AuthServiceError::InvalidTwoFactorCode)),
        "expected InvalidTwoFactorCode, got {replay:?}"
    );
}

// ── Logout ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_keep_access_token_valid_after_logout() {
    let fixture = Fixture::new(MockUserRepo::new(vec![test_user(1, "alice@example.com")]));
    let output = authenticated(
        fixture
            .usecase()
            .execute(credentials("alice@example.com", TEST_PASSWORD))
            .await
            .unwrap(),
    );

    LogoutUseCase.execute(1).await.unwrap();

    assert!(codec().verify(&output.access_token, TokenKind::Access).is_ok());
    assert_eq!(fixture.sessions.active_count(1), 1);
}

#[tokio::test]
async fn should_revoke_every_session_on_logout_all() {
    let fixture = Fixture::new(MockUserRepo::new(vec![
        test_user(1, "alice@example.com"),
        test_user(2, "bob@example.com"),
    ]));
    for email in ["alice@example.com", "alice@example.com", "bob@example.com"] {
        fixture
            .usecase()
            .execute(credentials(email, TEST_PASSWORD))
            .await
            .unwrap();
    }

    let revoked = LogoutAllUseCase {
        sessions: fixture.sessions.clone(),
    }
    .execute(1)
    .await
    .unwrap();

    assert_eq!(revoked, 2);
    assert_eq!(fixture.sessions.active_count(1), 0);
    assert_eq!(fixture.sessions.active_count(2), 1);
}
