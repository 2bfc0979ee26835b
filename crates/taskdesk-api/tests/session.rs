//! Integration tests for the login/logout/bootstrap workflow.

mod common;

use common::*;
use mockito::{Matcher, Server};
use std::sync::{Arc, Mutex};
use taskdesk_api::{
    AuthSession, AuthStore, CredentialStore, LoginCredentials, SessionService, TokenPair,
};
use taskdesk_storage::{FileStorage, StorageKeys};
use tempfile::tempdir;

fn service(server: &mockito::ServerGuard, pair: Option<TokenPair>) -> (SessionService, Arc<AuthStore>) {
    let store = Arc::new(AuthStore::new());
    let client = http_client(server, credentials(pair), store.clone());
    (SessionService::new(client, store.clone()), store)
}

#[tokio::test]
async fn restore_publishes_persisted_tokens() {
    let server = Server::new_async().await;
    let (service, store) = service(&server, Some(TokenPair::new("A1", "R1")));

    assert!(service.restore());

    let session = store.snapshot();
    assert!(session.is_authenticated);
    assert_eq!(session.access_token.as_deref(), Some("A1"));
    assert!(session.user.is_none());
}

#[tokio::test]
async fn restore_with_nothing_persisted_stays_logged_out() {
    let server = Server::new_async().await;
    let (service, store) = service(&server, None);

    assert!(!service.restore());
    assert_eq!(store.snapshot(), AuthSession::default());
}

#[tokio::test]
async fn restore_clears_corrupt_credentials_file() {
    //* Given
    let server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let path = dir.path().join("credentials.json");
    std::fs::write(&path, r#"{"authTokens": "{\"access\": \"A1\","}"#).unwrap();

    let store = Arc::new(AuthStore::new());
    let credentials = Arc::new(CredentialStore::new(Box::new(FileStorage::new(&path))));
    let client = http_client(&server, credentials, store.clone());
    let service = SessionService::new(client, store.clone());

    //* When
    let restored = service.restore();

    //* Then
    assert!(!restored);
    assert!(!store.is_authenticated());
    let on_disk = std::fs::read_to_string(&path).unwrap();
    assert!(!on_disk.contains(StorageKeys::AUTH_TOKENS));
}

#[tokio::test]
async fn restore_removes_unparsable_credentials_file() {
    //* Given
    let server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let path = dir.path().join("credentials.json");
    std::fs::write(&path, "{\"authTokens\": ").unwrap();

    let store = Arc::new(AuthStore::new());
    let credentials = Arc::new(CredentialStore::new(Box::new(FileStorage::new(&path))));
    let client = http_client(&server, credentials.clone(), store.clone());
    let service = SessionService::new(client, store.clone());

    //* When
    let restored = service.restore();

    //* Then
    assert!(!restored);
    assert!(!store.is_authenticated());
    assert!(!path.exists());
    assert_eq!(credentials.load(), None);
}

#[tokio::test]
async fn login_persists_tokens_and_loads_profile() {
    //* Given
    let mut server = Server::new_async().await;
    let login = server
        .mock("POST", "/api/users/login/")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access": "A1", "refresh": "R1"}"#)
        .expect(1)
        .create_async()
        .await;
    let me = server
        .mock("GET", "/api/users/me/")
        .match_header("authorization", "Bearer A1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(PROFILE_JSON)
        .expect(1)
        .create_async()
        .await;

    let (service, store) = service(&server, None);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    store.subscribe(Box::new(move |session| {
        seen_clone
            .lock()
            .unwrap()
            .push((session.is_authenticated, session.user.is_some()));
    }));

    //* When
    let profile = service
        .login(&LoginCredentials::new("ada", "correct horse"))
        .await
        .unwrap();

    //* Then
    login.assert_async().await;
    me.assert_async().await;
    assert_eq!(profile.full_name, "Ada Lovelace");
    assert_eq!(
        service.client().credentials().load(),
        Some(TokenPair::new("A1", "R1"))
    );
    assert_eq!(store.snapshot().user, Some(profile));
    // set-tokens, then set-user
    assert_eq!(*seen.lock().unwrap(), vec![(true, false), (true, true)]);
}

#[tokio::test]
async fn login_rolls_back_when_profile_fetch_fails() {
    //* Given
    let mut server = Server::new_async().await;
    let _login = server
        .mock("POST", "/api/users/login/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access": "A1", "refresh": "R1"}"#)
        .create_async()
        .await;
    let _me = server
        .mock("GET", "/api/users/me/")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let (service, store) = service(&server, None);

    //* When
    let err = service
        .login(&LoginCredentials::new("ada", "correct horse"))
        .await
        .unwrap_err();

    //* Then
    assert_eq!(err.status(), Some(500));
    assert_eq!(service.client().credentials().load(), None);
    assert_eq!(store.snapshot(), AuthSession::default());
}

#[tokio::test]
async fn failed_login_leaves_session_untouched() {
    let mut server = Server::new_async().await;
    let _login = server
        .mock("POST", "/api/users/login/")
        .with_status(401)
        .with_body(r#"{"detail": "No active account found with the given credentials"}"#)
        .create_async()
        .await;

    let (service, store) = service(&server, None);

    let err = service
        .login(&LoginCredentials::new("ada", "wrong"))
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(service.client().credentials().load(), None);
    assert!(!store.is_authenticated());
}

#[tokio::test]
async fn logout_clears_store_and_session() {
    let server = Server::new_async().await;
    let (service, store) = service(&server, Some(TokenPair::new("A1", "R1")));
    service.restore();

    service.logout().unwrap();

    assert_eq!(service.client().credentials().load(), None);
    assert_eq!(store.snapshot(), AuthSession::default());
}

#[tokio::test]
async fn profile_failure_marks_session_unauthenticated() {
    let mut server = Server::new_async().await;
    let _me = server
        .mock("GET", "/api/users/me/")
        .with_status(503)
        .create_async()
        .await;

    let (service, store) = service(&server, Some(TokenPair::new("A1", "R1")));
    service.restore();
    assert!(store.is_authenticated());

    let err = service.refresh_profile().await.unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert!(!store.is_authenticated());
    // Tokens survive; only logout removes them.
    assert_eq!(store.snapshot().access_token.as_deref(), Some("A1"));
}
