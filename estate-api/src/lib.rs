pub mod error;
pub mod model;
pub mod traits;

pub use error::{ApiError, Result};

pub use model::investment::{AssetRef, Investment, PortfolioSnapshot, PortfolioSummary};
pub use model::kyc::{DocumentType, KycCase, KycDecision, KycSubmission};
pub use model::listing::{Listing, ListingDraft, ListingType, OccupancyStatus};
pub use model::notification::{Notification, NotificationKind};
pub use model::receipt::{
    AuthGrant, DepositReceipt, MarketPurchaseReceipt, PurchaseReceipt, StatementEntry,
    StatementKind, WalletChallenge,
};
pub use model::secondary::{SecondaryListing, SellerRef};
pub use model::session::{KycStatus, Profile, Role};
pub use model::user::{UserAccount, UserUpdate};
pub use traits::credentials::CredentialStore;
pub use traits::gateway::Gateway;

pub mod prelude {
    pub use crate::error::{ApiError, Result};
    pub use crate::model::listing::Listing;
    pub use crate::model::session::{KycStatus, Profile, Role};
    pub use crate::traits::credentials::CredentialStore;
    pub use crate::traits::gateway::Gateway;
}
