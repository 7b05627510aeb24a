use jsonwebtoken::{EncodingKey, Header, encode, get_current_timestamp};

use sentinel_auth::error::AuthServiceError;
use sentinel_auth::usecase::token::{
    RefreshTokenUseCase, ValidateTokenUseCase, ValidateUserUseCase,
};
use sentinel_auth_types::token::{JwtClaims, TokenKind};

use crate::helpers::{MockBanRepo, MockUserRepo, TEST_JWT_SECRET, codec, test_user};

fn expired_token(user_id: i64, kind: TokenKind) -> String {
    let now = get_current_timestamp();
    let claims = JwtClaims {
        sub: user_id.to_string(),
        iss: kind.as_str().to_owned(),
        iat: now - 7200,
        exp: now - 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

fn refresh_usecase(
    users: MockUserRepo,
    bans: MockBanRepo,
) -> RefreshTokenUseCase<MockUserRepo, MockBanRepo> {
    RefreshTokenUseCase {
        users,
        bans,
        codec: codec(),
    }
}

// ── RefreshToken ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_mint_access_token_from_refresh_token() {
    let users = MockUserRepo::new(vec![test_user(1, "alice@example.com")]);
    let refresh = codec().issue_refresh(1).unwrap();

    let output = refresh_usecase(users, MockBanRepo::empty())
        .execute(&refresh)
        .await
        .unwrap();

    let info = codec()
        .verify(&output.access_token, TokenKind::Access)
        .unwrap();
    assert_eq!(info.user_id, 1);
    assert_eq!(info.expires_at, output.expires_at);
    assert_eq!(output.user.email, "alice@example.com");
    // Not rotated.
    assert!(codec().verify(&refresh, TokenKind::Refresh).is_ok());
}

#[tokio::test]
async fn should_reject_access_token_as_refresh_token() {
    let users = MockUserRepo::new(vec![test_user(1, "alice@example.com")]);
    let (access, _) = codec().issue_access(1).unwrap();

    let result = refresh_usecase(users, MockBanRepo::empty())
        .execute(&access)
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::WrongTokenType)),
        "expected WrongTokenType, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_expired_or_garbage_refresh_token() {
    let users = MockUserRepo::new(vec![test_user(1, "alice@example.com")]);
    let usecase = refresh_usecase(users, MockBanRepo::empty());

    for token in [expired_token(1, TokenKind::Refresh), "not-a-jwt".to_owned()] {
        let result = usecase.execute(&token).await;
        assert!(
            matches!(result, Err(AuthServiceError::InvalidToken)),
            "expected InvalidToken, got {result:?}"
        );
    }
}

#[tokio::test]
async fn should_reject_refresh_for_banned_or_deleted_user() {
    let mut deleted = test_user(2, "bob@example.com");
    deleted.deleted_at = Some(chrono::Utc::now());
    let users = MockUserRepo::new(vec![test_user(1, "alice@example.com"), deleted]);
    let usecase = refresh_usecase(users, MockBanRepo::banning(1));

    let banned = usecase.execute(&codec().issue_refresh(1).unwrap()).await;
    assert!(matches!(banned, Err(AuthServiceError::UserBanned)), "got {banned:?}");

    let gone = usecase.execute(&codec().issue_refresh(2).unwrap()).await;
    assert!(matches!(gone, Err(AuthServiceError::UserNotFound)), "got {gone:?}");
}

// ── ValidateToken ────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_resolve_access_token_to_user() {
    let usecase = ValidateTokenUseCase {
        users: MockUserRepo::new(vec![test_user(1, "alice@example.com")]),
        codec: codec(),
    };
    let (access, _) = codec().issue_access(1).unwrap();

    let user = usecase.execute(&access).await.unwrap();
    assert_eq!(user.id, 1);
}

#[tokio::test]
async fn should_reject_refresh_token_as_access_token() {
    let usecase = ValidateTokenUseCase {
        users: MockUserRepo::new(vec![test_user(1, "alice@example.com")]),
        codec: codec(),
    };

    let result = usecase.execute(&codec().issue_refresh(1).unwrap()).await;
    assert!(matches!(result, Err(AuthServiceError::WrongTokenType)), "got {result:?}");

    let expired = usecase.execute(&expired_token(1, TokenKind::Access)).await;
    assert!(matches!(expired, Err(AuthServiceError::InvalidToken)), "got {expired:?}");
}

#[tokio::test]
async fn should_reject_token_for_unknown_user() {
    let usecase = ValidateTokenUseCase {
        users: MockUserRepo::empty(),
        codec: codec(),
    };
    let (access, _) = codec().issue_access(7).unwrap();

    let result = usecase.execute(&access).await;
    assert!(matches!(result, Err(AuthServiceError::UserNotFound)), "got {result:?}");
}

// ── ValidateUser ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_validate_unbanned_user() {
    let users = MockUserRepo::new(vec![
        test_user(1, "alice@example.com"),
        test_user(2, "bob@example.com"),
    ]);
    let usecase = ValidateUserUseCase {
        users,
        bans: MockBanRepo::banning(2),
    };

    assert_eq!(usecase.execute(1).await.unwrap().id, 1);
    assert!(matches!(
        usecase.execute(2).await,
        Err(AuthServiceError::UserBanned)
    ));
    assert!(matches!(
        usecase.execute(3).await,
        Err(AuthServiceError::UserNotFound)
    ));
}
