use std::sync::atomic::Ordering;

use axum::http::HeaderMap;

use sentinel_auth::error::AuthServiceError;
use sentinel_auth::guard::resolve_identity;

use crate::helpers::{MockBanRepo, MockUserRepo, bearer, codec, test_user};

fn users() -> MockUserRepo {
    MockUserRepo::new(vec![
        test_user(1, "alice@example.com"),
        test_user(2, "bob@example.com"),
    ])
}

fn assert_unauthorized(result: Result<impl std::fmt::Debug, AuthServiceError>, reason: &str) {
    match result {
        Err(AuthServiceError::Unauthorized(msg)) => {
            assert!(msg.contains(reason), "expected {reason:?} in {msg:?}")
        }
        other => panic!("expected Unauthorized, got {other:?}"),
    }
}

#[tokio::test]
async fn should_resolve_valid_bearer_token() {
    let (access, _) = codec().issue_access(1).unwrap();

    let identity = resolve_identity(&bearer(&access), users(), MockBanRepo::empty(), &codec())
        .await
        .unwrap();

    assert_eq!(identity.user_id, 1);
    assert_eq!(identity.user.email, "alice@example.com");
}

#[tokio::test]
async fn should_reject_missing_or_malformed_header() {
    let result = resolve_identity(&HeaderMap::new(), users(), MockBanRepo::empty(), &codec()).await;
    assert_unauthorized(result, "missing");

    let mut basic = HeaderMap::new();
    basic.insert(
        axum::http::header::AUTHORIZATION,
        "Basic dXNlcjpwYXNz".parse().unwrap(),
    );
    let result = resolve_identity(&basic, users(), MockBanRepo::empty(), &codec()).await;
    assert!(matches!(result, Err(AuthServiceError::Unauthorized(_))));
}

#[tokio::test]
async fn should_reject_refresh_token_with_reason() {
    let refresh = codec().issue_refresh(1).unwrap();

    let result = resolve_identity(&bearer(&refresh), users(), MockBanRepo::empty(), &codec()).await;
    assert_unauthorized(result, "wrong token type");
}

#[tokio::test]
async fn should_reject_banned_user_with_reason() {
    let (access, _) = codec().issue_access(2).unwrap();

    let result = resolve_identity(&bearer(&access), users(), MockBanRepo::banning(2), &codec()).await;
    assert_unauthorized(result, "banned");
}

#[tokio::test]
async fn should_pass_store_failures_through() {
    let (access, _) = codec().issue_access(1).unwrap();
    let users = users();
    users.fail.store(true, Ordering::SeqCst);

    let result = resolve_identity(&bearer(&access), users, MockBanRepo::empty(), &codec()).await;
    assert!(
        matches!(result, Err(AuthServiceError::StoreUnavailable(_))),
        "expected StoreUnavailable, got {result:?}"
    );
}
