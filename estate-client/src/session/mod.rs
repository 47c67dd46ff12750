//! Single source of truth for "is a user logged in and who are they".
//!
//! The store owns the token: every other component reads it through
//! [`CredentialStore`] and may at most ask for invalidation (the global
//! 401 side effect). The profile is process-local and refetched on
//! startup; only the token survives restarts, via the [`TokenVault`].

pub mod vault;

use crate::event_bus::{EventBus, PlatformEvent};
use estate::model::receipt::{AuthGrant, DepositReceipt};
use estate::model::session::{KycStatus, Profile};
use estate::traits::credentials::CredentialStore;
use estate::traits::gateway::Gateway;
use log::{info, warn};
use std::sync::{Arc, RwLock};
use vault::TokenVault;

#[derive(Clone)]
pub struct SessionStore {
    profile: Arc<RwLock<Option<Profile>>>,
    token: Arc<RwLock<Option<String>>>,
    vault: Arc<TokenVault>,
    bus: EventBus,
}

impl SessionStore {
    /// Loads any persisted token; the profile stays empty until
    /// [`SessionStore::refresh`] confirms it with the server.
    pub fn new(vault: TokenVault, bus: EventBus) -> Self {
        let token = vault.load();
        if token.is_some() {
            info!("Session: found persisted token, profile pending refresh");
        }
        Self {
            profile: Arc::new(RwLock::new(None)),
            token: Arc::new(RwLock::new(token)),
            vault: Arc::new(vault),
            bus,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().unwrap().is_some()
    }

    pub fn profile(&self) -> Option<Profile> {
        self.profile.read().unwrap().clone()
    }

    pub async fn login(
        &self,
        gateway: &dyn Gateway,
        email: &str,
        password: &str,
    ) -> estate::Result<Profile> {
        let grant = gateway.login(email, password).await?;
        Ok(self.install(grant))
    }

    pub async fn register(
        &self,
        gateway: &dyn Gateway,
        name: &str,
        email: &str,
        password: &str,
    ) -> estate::Result<Profile> {
        let grant = gateway.register(name, email, password).await?;
        Ok(self.install(grant))
    }

    /// Refetches the profile for the persisted token. Any 401 along the
    /// way clears the session through [`CredentialStore::invalidate`].
    pub async fn refresh(&self, gateway: &dyn Gateway) -> estate::Result<Profile> {
        let profile = gateway.current_profile().await?;
        self.apply_profile(profile.clone());
        Ok(profile)
    }

    /// Local-only: drops the token and profile. No server call is needed
    /// for logout to take effect.
    pub fn logout(&self) {
        if self.clear() {
            info!("Session: logged out");
            self.bus.publish(PlatformEvent::SessionClosed);
        }
    }

    /// Replaces the cached profile with a server-confirmed one (login,
    /// refresh, wallet link/unlink all end here).
    pub fn apply_profile(&self, profile: Profile) {
        *self.profile.write().unwrap() = Some(profile.clone());
        self.bus.publish(PlatformEvent::SessionOpened { profile });
    }

    /// Applies a server-confirmed balance. Deposits and wallet flows are
    /// independent mutation sources; both land here and the client does no
    /// arithmetic between them.
    pub fn apply_deposit(&self, receipt: &DepositReceipt) {
        if let Some(profile) = self.profile.write().unwrap().as_mut() {
            profile.wallet_balance = receipt.new_balance;
        }
        self.bus.publish(PlatformEvent::BalanceChanged {
            new_balance: receipt.new_balance,
        });
    }

    pub fn apply_kyc_status(&self, status: KycStatus) {
        if let Some(profile) = self.profile.write().unwrap().as_mut() {
            profile.kyc_status = status;
        }
        self.bus.publish(PlatformEvent::KycStatusChanged { status });
    }

    fn install(&self, grant: AuthGrant) -> Profile {
        *self.token.write().unwrap() = Some(grant.token.clone());
        if let Err(e) = self.vault.store(&grant.token) {
            // The session still works for this process; it just won't
            // survive a restart.
            warn!("Session: could not persist token: {}", e);
        }
        self.apply_profile(grant.profile.clone());
        grant.profile
    }

    /// Returns true if there was anything to clear.
    fn clear(&self) -> bool {
        let had_token = self.token.write().unwrap().take().is_some();
        let had_profile = self.profile.write().unwrap().take().is_some();
        if let Err(e) = self.vault.clear() {
            warn!("Session: could not clear token vault: {}", e);
        }
        had_token || had_profile
    }
}

impl CredentialStore for SessionStore {
    fn bearer_token(&self) -> Option<String> {
        self.token.read().unwrap().clone()
    }

    fn invalidate(&self) {
        if self.clear() {
            warn!("Session: token rejected by server, session cleared");
            self.bus.publish(PlatformEvent::SessionClosed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (SessionStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let vault = TokenVault::new(dir.path().join("session.token"));
        (SessionStore::new(vault, EventBus::new()), dir)
    }

    #[test]
    fn starts_unauthenticated_without_a_vaulted_token() {
        let (store, _dir) = store();
        assert!(!store.is_authenticated());
        assert!(store.profile().is_none());
    }

    #[test]
    fn picks_up_a_persisted_token_but_not_a_profile() {
        let dir = tempfile::tempdir().unwrap();
        let vault = TokenVault::new(dir.path().join("session.token"));
        vault.store("tok-1").unwrap();

        let store = SessionStore::new(
            TokenVault::new(dir.path().join("session.token")),
            EventBus::new(),
        );
        assert!(store.is_authenticated());
        // Profile is always refetched, never cached across restarts.
        assert!(store.profile().is_none());
    }

    #[test]
    fn invalidate_clears_token_and_publishes_session_closed() {
        let dir = tempfile::tempdir().unwrap();
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let vault = TokenVault::new(dir.path().join("session.token"));
        vault.store("tok-1").unwrap();
        let store = SessionStore::new(
            TokenVault::new(dir.path().join("session.token")),
            bus.clone(),
        );

        store.invalidate();

        assert!(!store.is_authenticated());
        assert!(store.bearer_token().is_none());
        // Vault is wiped too: the next start is signed out.
        assert_eq!(
            TokenVault::new(dir.path().join("session.token")).load(),
            None
        );
        assert!(matches!(
            rx.try_recv().unwrap(),
            PlatformEvent::SessionClosed
        ));
    }

    #[test]
    fn invalidating_twice_publishes_once() {
        let dir = tempfile::tempdir().unwrap();
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let vault = TokenVault::new(dir.path().join("session.token"));
        vault.store("tok-1").unwrap();
        let store = SessionStore::new(
            TokenVault::new(dir.path().join("session.token")),
            bus.clone(),
        );

        store.invalidate();
        store.invalidate();

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }
}
