//! In-memory stand-in for the platform API.
//!
//! Keeps real share accounting (availability decrements, balance checks,
//! holdings) so flows can be exercised end to end without a server, and
//! records every call so tests can assert on request counts. Session
//! expiry is simulated with [`MockGateway::expire_session`]; a 401 then
//! flows through the attached [`CredentialStore`] exactly like the real
//! transport.

use async_trait::async_trait;
use chrono::Utc;
use estate::error::{ApiError, Result};
use estate::model::{
    AssetRef, AuthGrant, DepositReceipt, Investment, KycCase, KycDecision, KycStatus,
    KycSubmission, Listing, ListingDraft, MarketPurchaseReceipt, Notification, NotificationKind,
    PortfolioSnapshot, PortfolioSummary, Profile, PurchaseReceipt, SecondaryListing, SellerRef,
    StatementEntry, StatementKind, UserAccount, UserUpdate, WalletChallenge,
};
use estate::traits::credentials::CredentialStore;
use estate::traits::gateway::Gateway;
use std::sync::{Arc, Mutex};

/// A ready-made investor profile for tests.
pub fn investor_profile(balance: f64) -> Profile {
    Profile {
        user_id: "u-1".into(),
        name: "Test Investor".into(),
        email: "investor@example.com".into(),
        role: estate::Role::Investor,
        kyc_status: KycStatus::Verified,
        wallet_balance: balance,
        wallet_address: None,
    }
}

struct MockState {
    profile: Profile,
    password: String,
    assets: Vec<Listing>,
    market: Vec<SecondaryListing>,
    holdings: Vec<Investment>,
    users: Vec<UserAccount>,
    notifications: Vec<Notification>,
    statement: Vec<StatementEntry>,
    pending_kyc: Vec<KycCase>,
    next_id: u64,
    fail_next: Option<ApiError>,
    expired: bool,
}

impl MockState {
    fn next(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn notify(&mut self, kind: NotificationKind, message: String) {
        let id = self.next("n");
        self.notifications.push(Notification {
            id,
            kind,
            message,
            is_read: false,
            created_at: Utc::now(),
        });
    }

    fn record_statement(&mut self, kind: StatementKind, amount: f64, description: String) {
        let id = self.next("tx");
        self.statement.push(StatementEntry {
            id,
            kind,
            amount,
            description,
            created_at: Utc::now(),
        });
    }

    fn shares_held(&self, asset_id: &str) -> u64 {
        let owned: u64 = self
            .holdings
            .iter()
            .filter(|inv| inv.asset.id == asset_id)
            .map(|inv| inv.shares_bought)
            .sum();
        let listed: u64 = self
            .market
            .iter()
            .filter(|l| l.asset.id == asset_id && l.seller.id == self.profile.user_id)
            .map(|l| l.shares_for_sale)
            .sum();
        owned.saturating_sub(listed)
    }
}

pub struct MockGateway {
    state: Mutex<MockState>,
    calls: Mutex<Vec<&'static str>>,
    credentials: Mutex<Option<Arc<dyn CredentialStore>>>,
}

impl MockGateway {
    pub fn new(profile: Profile, password: &str) -> Self {
        Self {
            state: Mutex::new(MockState {
                profile,
                password: password.to_string(),
                assets: Vec::new(),
                market: Vec::new(),
                holdings: Vec::new(),
                users: Vec::new(),
                notifications: Vec::new(),
                statement: Vec::new(),
                pending_kyc: Vec::new(),
                next_id: 0,
                fail_next: None,
                expired: false,
            }),
            calls: Mutex::new(Vec::new()),
            credentials: Mutex::new(None),
        }
    }

    /// Wire the mock to a session so a simulated 401 clears it, the way
    /// the real transport does.
    pub fn attach_credentials(&self, credentials: Arc<dyn CredentialStore>) {
        *self.credentials.lock().unwrap() = Some(credentials);
    }

    pub fn seed_asset(&self, listing: Listing) {
        self.state.lock().unwrap().assets.push(listing);
    }

    pub fn seed_user(&self, user: UserAccount) {
        self.state.lock().unwrap().users.push(user);
    }

    pub fn seed_notification(&self, kind: NotificationKind, message: &str) {
        self.state.lock().unwrap().notify(kind, message.to_string());
    }

    /// The next guarded call fails with `err` instead of executing.
    pub fn fail_next(&self, err: ApiError) {
        self.state.lock().unwrap().fail_next = Some(err);
    }

    /// Every call from now on is a 401 until the next login.
    pub fn expire_session(&self) {
        self.state.lock().unwrap().expired = true;
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == name).count()
    }

    /// Server-side view of one asset, for asserting what a refetch will
    /// observe.
    pub fn asset_snapshot(&self, id: &str) -> Option<Listing> {
        self.state
            .lock()
            .unwrap()
            .assets
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    pub fn market_snapshot(&self) -> Vec<SecondaryListing> {
        self.state.lock().unwrap().market.clone()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }

    fn auth_failure(&self) -> ApiError {
        if let Some(credentials) = self.credentials.lock().unwrap().as_ref() {
            credentials.invalidate();
        }
        ApiError::Unauthorized
    }

    /// Expiry and queued failures, applied to every authenticated call.
    fn guard(&self, state: &mut MockState) -> Result<()> {
        if state.expired {
            return Err(self.auth_failure());
        }
        if let Some(err) = state.fail_next.take() {
            if err == ApiError::Unauthorized {
                return Err(self.auth_failure());
            }
            return Err(err);
        }
        Ok(())
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthGrant> {
        self.record("register");
        let mut state = self.state.lock().unwrap();
        if state.profile.email == email {
            return Err(ApiError::rejected("Email is already registered"));
        }
        state.profile = Profile {
            user_id: state.next("u"),
            name: name.to_string(),
            email: email.to_string(),
            role: estate::Role::Investor,
            kyc_status: KycStatus::Unverified,
            wallet_balance: 0.0,
            wallet_address: None,
        };
        state.password = password.to_string();
        state.expired = false;
        Ok(AuthGrant {
            token: "mock-token".into(),
            profile: state.profile.clone(),
        })
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthGrant> {
        self.record("login");
        let mut state = self.state.lock().unwrap();
        if state.profile.email != email || state.password != password {
            return Err(ApiError::rejected("Invalid email or password"));
        }
        state.expired = false;
        Ok(AuthGrant {
            token: "mock-token".into(),
            profile: state.profile.clone(),
        })
    }

    async fn current_profile(&self) -> Result<Profile> {
        self.record("current_profile");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;
        Ok(state.profile.clone())
    }

    async fn wallet_nonce(&self) -> Result<WalletChallenge> {
        self.record("wallet_nonce");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;
        let nonce = state.next("nonce");
        Ok(WalletChallenge { nonce })
    }

    async fn link_wallet(&self, wallet_address: &str, _signature: &str) -> Result<Profile> {
        self.record("link_wallet");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;
        state.profile.wallet_address = Some(wallet_address.to_string());
        Ok(state.profile.clone())
    }

    async fn unlink_wallet(&self) -> Result<Profile> {
        self.record("unlink_wallet");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;
        state.profile.wallet_address = None;
        Ok(state.profile.clone())
    }

    async fn deposit(&self, amount: f64) -> Result<DepositReceipt> {
        self.record("deposit");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;
        if amount <= 0.0 {
            return Err(ApiError::rejected("Deposit amount must be positive"));
        }
        state.profile.wallet_balance += amount;
        state.record_statement(StatementKind::Deposit, amount, "Wallet top-up".into());
        Ok(DepositReceipt {
            new_balance: state.profile.wallet_balance,
        })
    }

    async fn statement(&self) -> Result<Vec<StatementEntry>> {
        self.record("statement");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;
        Ok(state.statement.clone())
    }

    async fn list_assets(&self, category: Option<&str>) -> Result<Vec<Listing>> {
        self.record("list_assets");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;
        Ok(state
            .assets
            .iter()
            .filter(|a| category.is_none() || Some(a.category.as_str()) == category)
            .cloned()
            .collect())
    }

    async fn asset(&self, id: &str) -> Result<Listing> {
        self.record("asset");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;
        state
            .assets
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| ApiError::rejected("Asset not found"))
    }

    async fn buy_primary(&self, asset_id: &str, shares: u64) -> Result<PurchaseReceipt> {
        self.record("buy_primary");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;

        let price = {
            let asset = state
                .assets
                .iter()
                .find(|a| a.id == asset_id)
                .ok_or_else(|| ApiError::rejected("Asset not found"))?;
            if shares > asset.available_shares {
                return Err(ApiError::rejected("Insufficient shares available"));
            }
            asset.token_price
        };

        let cost = shares as f64 * price;
        if cost > state.profile.wallet_balance {
            return Err(ApiError::rejected("Insufficient funds"));
        }

        let (asset_ref, new_available) = {
            let asset = state
                .assets
                .iter_mut()
                .find(|a| a.id == asset_id)
                .expect("asset checked above");
            asset.available_shares -= shares;
            (
                AssetRef {
                    id: asset.id.clone(),
                    title: asset.title.clone(),
                    token_price: asset.token_price,
                    apr: asset.apr,
                },
                asset.available_shares,
            )
        };

        state.profile.wallet_balance -= cost;
        let investment_id = state.next("inv");
        state.holdings.push(Investment {
            id: investment_id.clone(),
            asset: asset_ref,
            shares_bought: shares,
            total_amount: cost,
        });
        state.record_statement(
            StatementKind::PrimaryPurchase,
            -cost,
            format!("Bought {shares} shares of {asset_id}"),
        );
        state.notify(
            NotificationKind::TransactionSuccess,
            format!("Your purchase of {shares} shares is confirmed"),
        );

        Ok(PurchaseReceipt {
            investment_id,
            new_available_shares: new_available,
        })
    }

    async fn portfolio(&self) -> Result<PortfolioSnapshot> {
        self.record("portfolio");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;
        let summary = PortfolioSummary {
            total_invested: state.holdings.iter().map(|h| h.total_amount).sum(),
            total_shares: state.holdings.iter().map(|h| h.shares_bought).sum(),
        };
        Ok(PortfolioSnapshot {
            summary,
            holdings: state.holdings.clone(),
        })
    }

    async fn list_secondary(
        &self,
        asset_id: &str,
        shares: u64,
        price_per_share: f64,
    ) -> Result<String> {
        self.record("list_secondary");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;

        if shares > state.shares_held(asset_id) {
            return Err(ApiError::rejected("Insufficient holdings"));
        }
        let asset = state
            .assets
            .iter()
            .find(|a| a.id == asset_id)
            .ok_or_else(|| ApiError::rejected("Asset not found"))?;
        let asset_ref = AssetRef {
            id: asset.id.clone(),
            title: asset.title.clone(),
            token_price: asset.token_price,
            apr: asset.apr,
        };
        let seller = SellerRef {
            id: state.profile.user_id.clone(),
            name: state.profile.name.clone(),
        };
        let listing_id = state.next("sl");
        state.market.push(SecondaryListing {
            id: listing_id.clone(),
            seller,
            asset: asset_ref,
            shares_for_sale: shares,
            price_per_share,
        });
        Ok(listing_id)
    }

    async fn market_listings(&self) -> Result<Vec<SecondaryListing>> {
        self.record("market_listings");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;
        Ok(state.market.clone())
    }

    async fn buy_secondary(
        &self,
        listing_id: &str,
        shares: u64,
    ) -> Result<MarketPurchaseReceipt> {
        self.record("buy_secondary");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;

        let (cost, asset_ref) = {
            let listing = state
                .market
                .iter()
                .find(|l| l.id == listing_id)
                .ok_or_else(|| ApiError::rejected("Listing not found"))?;
            if shares > listing.shares_for_sale {
                return Err(ApiError::rejected("Insufficient listed shares"));
            }
            (shares as f64 * listing.price_per_share, listing.asset.clone())
        };
        if cost > state.profile.wallet_balance {
            return Err(ApiError::rejected("Insufficient funds"));
        }

        let remaining = {
            let listing = state
                .market
                .iter_mut()
                .find(|l| l.id == listing_id)
                .expect("listing checked above");
            listing.shares_for_sale -= shares;
            listing.shares_for_sale
        };
        // Fully filled orders disappear server-side.
        state.market.retain(|l| l.shares_for_sale > 0);
        state.profile.wallet_balance -= cost;
        let investment_id = state.next("inv");
        state.holdings.push(Investment {
            id: investment_id,
            asset: asset_ref,
            shares_bought: shares,
            total_amount: cost,
        });
        state.record_statement(
            StatementKind::SecondaryPurchase,
            -cost,
            format!("Bought {shares} shares on the secondary market"),
        );

        Ok(MarketPurchaseReceipt {
            shares_bought: shares,
            total_paid: cost,
            remaining_on_listing: remaining,
        })
    }

    async fn cancel_secondary(&self, listing_id: &str) -> Result<()> {
        self.record("cancel_secondary");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;
        let seller_id = state.profile.user_id.clone();
        let listing = state
            .market
            .iter()
            .find(|l| l.id == listing_id)
            .ok_or_else(|| ApiError::rejected("Listing not found"))?;
        if listing.seller.id != seller_id {
            return Err(ApiError::rejected("Only the seller can cancel a listing"));
        }
        state.market.retain(|l| l.id != listing_id);
        Ok(())
    }

    async fn submit_kyc(&self, submission: KycSubmission) -> Result<KycStatus> {
        self.record("submit_kyc");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;
        if submission.document_bytes.is_empty() {
            return Err(ApiError::rejected("Identity document is required"));
        }
        state.profile.kyc_status = KycStatus::Pending;
        let case = KycCase {
            user_id: state.profile.user_id.clone(),
            name: submission.full_name,
            email: state.profile.email.clone(),
            document_type: submission.document_type,
            submitted_at: Utc::now(),
        };
        state.pending_kyc.push(case);
        Ok(KycStatus::Pending)
    }

    async fn notifications(&self) -> Result<Vec<Notification>> {
        self.record("notifications");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;
        Ok(state.notifications.clone())
    }

    async fn mark_notification_read(&self, id: &str) -> Result<()> {
        self.record("mark_notification_read");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;
        match state.notifications.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.is_read = true;
                Ok(())
            }
            None => Err(ApiError::rejected("Notification not found")),
        }
    }

    async fn create_asset(&self, draft: &ListingDraft) -> Result<Listing> {
        self.record("create_asset");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;
        let id = state.next("a");
        let listing = Listing {
            id,
            title: draft.title.clone(),
            location: draft.location.clone(),
            category: draft.category.clone(),
            valuation: draft.valuation,
            total_shares: draft.total_shares,
            available_shares: draft.total_shares,
            token_price: draft.token_price,
            apr: draft.apr,
            irr: draft.irr,
            listing_type: draft.listing_type,
            occupancy_status: draft.occupancy_status,
        };
        state.assets.push(listing.clone());
        Ok(listing)
    }

    async fn update_asset(&self, id: &str, draft: &ListingDraft) -> Result<Listing> {
        self.record("update_asset");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;
        let asset = state
            .assets
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| ApiError::rejected("Asset not found"))?;
        asset.title = draft.title.clone();
        asset.location = draft.location.clone();
        asset.category = draft.category.clone();
        asset.valuation = draft.valuation;
        asset.total_shares = draft.total_shares;
        asset.available_shares = asset.available_shares.min(draft.total_shares);
        asset.token_price = draft.token_price;
        asset.apr = draft.apr;
        asset.irr = draft.irr;
        asset.listing_type = draft.listing_type;
        asset.occupancy_status = draft.occupancy_status;
        Ok(asset.clone())
    }

    async fn delete_asset(&self, id: &str) -> Result<()> {
        self.record("delete_asset");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;
        let before = state.assets.len();
        state.assets.retain(|a| a.id != id);
        if state.assets.len() == before {
            return Err(ApiError::rejected("Asset not found"));
        }
        Ok(())
    }

    async fn all_investments(&self) -> Result<Vec<Investment>> {
        self.record("all_investments");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;
        Ok(state.holdings.clone())
    }

    async fn pending_kyc(&self) -> Result<Vec<KycCase>> {
        self.record("pending_kyc");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;
        Ok(state.pending_kyc.clone())
    }

    async fn adjudicate_kyc(&self, user_id: &str, decision: &KycDecision) -> Result<()> {
        self.record("adjudicate_kyc");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;
        state.pending_kyc.retain(|c| c.user_id != user_id);
        if state.profile.user_id == user_id {
            state.profile.kyc_status = decision.status;
        }
        if let Some(user) = state.users.iter_mut().find(|u| u.id == user_id) {
            user.kyc_status = decision.status;
        }
        Ok(())
    }

    async fn all_users(&self) -> Result<Vec<UserAccount>> {
        self.record("all_users");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;
        Ok(state.users.clone())
    }

    async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<UserAccount> {
        self.record("update_user");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| ApiError::rejected("User not found"))?;
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(kyc_status) = update.kyc_status {
            user.kyc_status = kyc_status;
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, id: &str) -> Result<()> {
        self.record("delete_user");
        let mut state = self.state.lock().unwrap();
        self.guard(&mut state)?;
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        if state.users.len() == before {
            return Err(ApiError::rejected("User not found"));
        }
        Ok(())
    }
}
