//! Session lifecycle: token persistence, startup refresh, local logout,
//! and the two independent balance-affecting flows.

use estate::model::session::KycStatus;
use estate::traits::credentials::CredentialStore;
use estate::traits::gateway::Gateway;
use estate::ApiError;
use estate_client::gateway::mock::{investor_profile, MockGateway};
use estate_client::{EventBus, PlatformEvent, SessionStore, TokenVault};
use std::path::PathBuf;
use std::sync::Arc;

fn vault_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("session.token")
}

fn store_at(dir: &tempfile::TempDir, bus: EventBus) -> SessionStore {
    SessionStore::new(TokenVault::new(vault_path(dir)), bus)
}

#[tokio::test]
async fn token_survives_a_restart_but_the_profile_does_not() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(investor_profile(500.0), "secret");

    let first = store_at(&dir, EventBus::new());
    first
        .login(&gateway, "investor@example.com", "secret")
        .await
        .unwrap();
    assert!(first.profile().is_some());

    // "Page reload": a fresh store over the same vault.
    let second = store_at(&dir, EventBus::new());
    assert!(second.is_authenticated());
    assert!(second.profile().is_none());

    // Startup refresh repopulates the profile from the server.
    let profile = second.refresh(&gateway).await.unwrap();
    assert_eq!(profile.email, "investor@example.com");
    assert!(second.profile().is_some());
}

#[tokio::test]
async fn login_failure_propagates_the_server_message_and_stays_signed_out() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(investor_profile(500.0), "secret");
    let store = store_at(&dir, EventBus::new());

    let err = store
        .login(&gateway, "investor@example.com", "wrong")
        .await
        .unwrap_err();

    assert_eq!(err, ApiError::rejected("Invalid email or password"));
    assert!(!store.is_authenticated());
    assert_eq!(TokenVault::new(vault_path(&dir)).load(), None);
}

#[tokio::test]
async fn logout_takes_effect_locally_without_a_server_call() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(investor_profile(500.0), "secret");
    let store = store_at(&dir, EventBus::new());
    store
        .login(&gateway, "investor@example.com", "secret")
        .await
        .unwrap();
    let calls_before = gateway.calls().len();

    store.logout();

    assert!(!store.is_authenticated());
    assert!(store.profile().is_none());
    assert_eq!(TokenVault::new(vault_path(&dir)).load(), None);
    assert_eq!(gateway.calls().len(), calls_before);
}

#[tokio::test]
async fn an_expired_token_clears_the_session_on_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = Arc::new(MockGateway::new(investor_profile(500.0), "secret"));
    let store = store_at(&dir, EventBus::new());
    store
        .login(gateway.as_ref(), "investor@example.com", "secret")
        .await
        .unwrap();
    gateway.attach_credentials(Arc::new(store.clone()) as Arc<dyn CredentialStore>);

    gateway.expire_session();
    let err = store.refresh(gateway.as_ref()).await.unwrap_err();

    assert_eq!(err, ApiError::Unauthorized);
    assert!(!store.is_authenticated());
    assert_eq!(TokenVault::new(vault_path(&dir)).load(), None);
}

#[tokio::test]
async fn deposit_and_wallet_link_feed_the_same_balance_without_client_math() {
    let dir = tempfile::tempdir().unwrap();
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    let gateway = MockGateway::new(investor_profile(100.0), "secret");
    let store = store_at(&dir, bus);
    store
        .login(&gateway, "investor@example.com", "secret")
        .await
        .unwrap();

    // Deposit: the cached balance becomes the server's figure.
    let receipt = gateway.deposit(250.0).await.unwrap();
    store.apply_deposit(&receipt);
    assert!((store.profile().unwrap().wallet_balance - 350.0).abs() < 1e-9);

    // Wallet link returns a whole profile; the store replaces, it never
    // recomputes.
    let profile = gateway.link_wallet("0xabc", "sig").await.unwrap();
    store.apply_profile(profile);
    let cached = store.profile().unwrap();
    assert_eq!(cached.wallet_address.as_deref(), Some("0xabc"));
    assert!((cached.wallet_balance - 350.0).abs() < 1e-9);

    // Subscribers saw the balance change.
    let mut saw_balance = false;
    while let Ok(event) = rx.try_recv() {
        if let PlatformEvent::BalanceChanged { new_balance } = event {
            assert!((new_balance - 350.0).abs() < 1e-9);
            saw_balance = true;
        }
    }
    assert!(saw_balance);
}

#[tokio::test]
async fn kyc_submission_moves_the_cached_status_to_pending() {
    let dir = tempfile::tempdir().unwrap();
    let mut profile = investor_profile(100.0);
    profile.kyc_status = KycStatus::Unverified;
    let gateway = MockGateway::new(profile, "secret");
    let store = store_at(&dir, EventBus::new());
    store
        .login(&gateway, "investor@example.com", "secret")
        .await
        .unwrap();

    let status = gateway
        .submit_kyc(estate::KycSubmission {
            full_name: "Test Investor".into(),
            date_of_birth: "1990-01-01".into(),
            document_type: estate::DocumentType::Passport,
            document_number: "P123".into(),
            document_file_name: "passport.png".into(),
            document_bytes: vec![1, 2, 3],
        })
        .await
        .unwrap();
    store.apply_kyc_status(status);

    assert_eq!(store.profile().unwrap().kyc_status, KycStatus::Pending);
}
