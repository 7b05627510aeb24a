use chrono::{Duration, Utc};

use sentinel_auth::domain::types::NewBan;
use sentinel_auth::error::AuthServiceError;
use sentinel_auth::usecase::account::{
    BanUserUseCase, GetProfileUseCase, ListSessionsUseCase, RevokeSessionUseCase,
};

use crate::helpers::{MockBanRepo, MockSessionRepo, MockUserRepo, test_session, test_user};

fn sessions() -> MockSessionRepo {
    let now = Utc::now();
    MockSessionRepo::with(vec![
        test_session(1, 1, now - Duration::hours(2)),
        test_session(2, 1, now),
        test_session(3, 2, now),
    ])
}

#[tokio::test]
async fn should_list_own_sessions_newest_first() {
    let usecase = ListSessionsUseCase {
        sessions: sessions(),
    };

    let listed = usecase.execute(1).await.unwrap();

    let ids: Vec<i64> = listed.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![2, 1]);
}

#[tokio::test]
async fn should_revoke_own_session() {
    let sessions = sessions();
    let usecase = RevokeSessionUseCase {
        sessions: sessions.clone(),
    };

    usecase.execute(1, 1).await.unwrap();

    assert_eq!(sessions.active_count(1), 1);
    let again = usecase.execute(1, 1).await;
    assert!(
        matches!(again, Err(AuthServiceError::SessionNotFound)),
        "expected SessionNotFound, got {again:?}"
    );
}

#[tokio::test]
async fn should_not_revoke_someone_elses_session() {
    let sessions = sessions();
    let usecase = RevokeSessionUseCase {
        sessions: sessions.clone(),
    };

    let result = usecase.execute(1, 3).await;
    assert!(matches!(result, Err(AuthServiceError::SessionNotFound)));
    assert_eq!(sessions.active_count(2), 1);
}

#[tokio::test]
async fn should_return_public_profile() {
    let usecase = GetProfileUseCase {
        users: MockUserRepo::new(vec![test_user(1, "alice@example.com")]),
    };

    let profile = usecase.execute(1).await.unwrap();
    assert_eq!(profile.email, "alice@example.com");

    let json = serde_json::to_value(&profile).unwrap();
    assert!(json.get("password_hash").is_none());
    assert_eq!(json["date_of_birth"], "1990-05-17");

    assert!(matches!(
        usecase.execute(9).await,
        Err(AuthServiceError::UserNotFound)
    ));
}

#[tokio::test]
async fn should_ban_user_and_end_sessions() {
    let sessions = sessions();
    let bans = MockBanRepo::empty();
    let usecase = BanUserUseCase {
        users: MockUserRepo::new(vec![test_user(1, "alice@example.com")]),
        bans: bans.clone(),
        sessions: sessions.clone(),
    };

    let ban = usecase
        .execute(NewBan {
            user_id: 1,
            banned_by: 99,
            reason: "spam".to_owned(),
        })
        .await
        .unwrap();

    assert_eq!(ban.banned_by, 99);
    assert_eq!(bans.bans.lock().unwrap().len(), 1);
    assert_eq!(sessions.active_count(1), 0);
    assert_eq!(sessions.active_count(2), 1);
}

#[tokio::test]
async fn should_not_ban_unknown_user() {
    let bans = MockBanRepo::empty();
    let usecase = BanUserUseCase {
        users: MockUserRepo::empty(),
        bans: bans.clone(),
        sessions: MockSessionRepo::empty(),
    };

    let result = usecase
        .execute(NewBan {
            user_id: 5,
            banned_by: 99,
            reason: "spam".to_owned(),
        })
        .await;
    assert!(matches!(result, Err(AuthServiceError::UserNotFound)));
    assert!(bans.bans.lock().unwrap().is_empty());
}
