use sentinel_auth::domain::repository::UserRepository;
use sentinel_auth::error::AuthServiceError;
use sentinel_auth::usecase::register::{RegisterInput, RegisterUseCase};

use crate::helpers::{MockUserRepo, TEST_PASSWORD, test_hasher, test_user};

fn input(nickname: &str, email: &str) -> RegisterInput {
    RegisterInput {
        nickname: nickname.to_owned(),
        email: email.to_owned(),
        password: TEST_PASSWORD.to_owned(),
        date_of_birth: "1990-05-17".to_owned(),
    }
}

#[tokio::test]
async fn should_register_and_hash_password() {
    let users = MockUserRepo::empty();
    let usecase = RegisterUseCase {
        users: users.clone(),
        hasher: test_hasher(),
    };

    let profile = usecase
        .execute(input("alice", "alice@example.com"))
        .await
        .unwrap();

    assert_eq!(profile.nickname, "alice");
    assert!(!profile.two_factor_enabled);
    let stored = users.get(profile.id).unwrap();
    assert_ne!(stored.password_hash, TEST_PASSWORD);
    assert!(
        test_hasher()
            .verify(TEST_PASSWORD, &stored.password_hash)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn should_reject_taken_email_before_nickname() {
    let usecase = RegisterUseCase {
        users: MockUserRepo::new(vec![test_user(1, "taken@example.com")]),
        hasher: test_hasher(),
    };

    // Both are taken; email wins.
    let result = usecase.execute(input("user1", "taken@example.com")).await;
    assert!(
        matches!(result, Err(AuthServiceError::EmailTaken)),
        "expected EmailTaken, got {result:?}"
    );
}

#[tokio::test]
async fn should_reject_taken_nickname() {
    let usecase = RegisterUseCase {
        users: MockUserRepo::new(vec![test_user(1, "first@example.com")]),
        hasher: test_hasher(),
    };

    let result = usecase.execute(input("user1", "second@example.com")).await;
    assert!(
        matches!(result, Err(AuthServiceError::NicknameTaken)),
        "expected NicknameTaken, got {result:?}"
    );
}

#[tokio::test]
async fn should_reuse_identity_of_deleted_user() {
    let mut deleted = test_user(1, "gone@example.com");
    deleted.deleted_at = Some(chrono::Utc::now());
    let usecase = RegisterUseCase {
        users: MockUserRepo::new(vec![deleted]),
        hasher: test_hasher(),
    };

    let profile = usecase
        .execute(input("user1", "gone@example.com"))
        .await
        .unwrap();
    assert_ne!(profile.id, 1);
}

#[tokio::test]
async fn should_free_identity_after_soft_delete() {
    let users = MockUserRepo::empty();
    let usecase = RegisterUseCase {
        users: users.clone(),
        hasher: test_hasher(),
    };
    let first = usecase
        .execute(input("alice", "alice@example.com"))
        .await
        .unwrap();
    let found = users.find_by_nickname("alice").await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(first.id));

    users.soft_delete(first.id).await.unwrap();

    assert!(users.find_by_nickname("alice").await.unwrap().is_none());
    assert!(users.find_by_email("alice@example.com").await.unwrap().is_none());
    assert!(users.find_by_id(first.id).await.unwrap().is_none());
    let second = usecase
        .execute(input("alice", "alice@example.com"))
        .await
        .unwrap();
    assert_ne!(second.id, first.id);
}

#[tokio::test]
async fn should_reject_bad_date_without_creating_user() {
    let users = MockUserRepo::empty();
    let usecase = RegisterUseCase {
        users: users.clone(),
        hasher: test_hasher(),
    };

    let mut bad = input("bob", "bob@example.com");
    bad.date_of_birth = "17/05/1990".to_owned();
    let result = usecase.execute(bad).await;

    assert!(
        matches!(result, Err(AuthServiceError::InvalidDate)),
        "expected InvalidDate, got {result:?}"
    );
    assert!(users.users.lock().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_admit_one_of_concurrent_registrations() {
    let users = MockUserRepo::empty();

    let attempts = (0..8).map(|i| {
        let users = users.clone();
        tokio::spawn(async move {
            RegisterUseCase {
                users,
                hasher: test_hasher(),
            }
            .execute(input(&format!("racer{i}"), "race@example.com"))
            .await
        })
    });
    let results = futures::future::join_all(attempts).await;

    let mut created = 0;
    for result in results {
        match result.unwrap() {
            Ok(_) => created += 1,
            Err(AuthServiceError::EmailTaken) => {}
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(users.users.lock().unwrap().len(), 1);
}
