use crate::error::Result;
use crate::model::{
    AuthGrant, DepositReceipt, Investment, KycCase, KycDecision, KycStatus, KycSubmission,
    Listing, ListingDraft, MarketPurchaseReceipt, Notification, PortfolioSnapshot, Profile,
    PurchaseReceipt, SecondaryListing, StatementEntry, UserAccount, UserUpdate, WalletChallenge,
};
use async_trait::async_trait;

/// The platform REST API, one method per operation.
///
/// The server is authoritative for every quantity; implementations return
/// its responses untouched. Client-side guards (quantity clamping, sold-out
/// checks) live above this seam, in the trade orchestrator.
///
/// Implementations must convert transport failures into [`crate::ApiError`]
/// and, on a 401, notify their credential store before returning
/// `Unauthorized` so the session is cleared globally.
#[async_trait]
pub trait Gateway: Send + Sync {
    // --- Auth & identity ---

    async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthGrant>;

    async fn login(&self, email: &str, password: &str) -> Result<AuthGrant>;

    /// Profile of the token holder. Called on startup whenever a persisted
    /// token exists; the profile itself is never persisted.
    async fn current_profile(&self) -> Result<Profile>;

    // --- Wallet & funds ---

    /// Nonce the user signs to prove wallet ownership. Signature
    /// verification happens server-side.
    async fn wallet_nonce(&self) -> Result<WalletChallenge>;

    async fn link_wallet(&self, wallet_address: &str, signature: &str) -> Result<Profile>;

    async fn unlink_wallet(&self) -> Result<Profile>;

    async fn deposit(&self, amount: f64) -> Result<DepositReceipt>;

    async fn statement(&self) -> Result<Vec<StatementEntry>>;

    // --- Primary market ---

    /// Listings, optionally narrowed to a category.
    async fn list_assets(&self, category: Option<&str>) -> Result<Vec<Listing>>;

    async fn asset(&self, id: &str) -> Result<Listing>;

    async fn buy_primary(&self, asset_id: &str, shares: u64) -> Result<PurchaseReceipt>;

    async fn portfolio(&self) -> Result<PortfolioSnapshot>;

    // --- Secondary market ---

    /// Puts owned shares up for sale; returns the new listing id.
    async fn list_secondary(
        &self,
        asset_id: &str,
        shares: u64,
        price_per_share: f64,
    ) -> Result<String>;

    async fn market_listings(&self) -> Result<Vec<SecondaryListing>>;

    async fn buy_secondary(&self, listing_id: &str, shares: u64)
        -> Result<MarketPurchaseReceipt>;

    async fn cancel_secondary(&self, listing_id: &str) -> Result<()>;

    // --- KYC ---

    /// Uploads the identity document and metadata; returns the resulting
    /// status (normally `Pending`).
    async fn submit_kyc(&self, submission: KycSubmission) -> Result<KycStatus>;

    // --- Notifications ---

    async fn notifications(&self) -> Result<Vec<Notification>>;

    async fn mark_notification_read(&self, id: &str) -> Result<()>;

    // --- Administration ---

    async fn create_asset(&self, draft: &ListingDraft) -> Result<Listing>;

    async fn update_asset(&self, id: &str, draft: &ListingDraft) -> Result<Listing>;

    async fn delete_asset(&self, id: &str) -> Result<()>;

    async fn all_investments(&self) -> Result<Vec<Investment>>;

    async fn pending_kyc(&self) -> Result<Vec<KycCase>>;

    async fn adjudicate_kyc(&self, user_id: &str, decision: &KycDecision) -> Result<()>;

    async fn all_users(&self) -> Result<Vec<UserAccount>>;

    async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<UserAccount>;

    async fn delete_user(&self, id: &str) -> Result<()>;
}
