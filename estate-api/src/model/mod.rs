pub mod investment;
pub mod kyc;
pub mod listing;
pub mod notification;
pub mod receipt;
pub mod secondary;
pub mod session;
pub mod user;

pub use investment::{AssetRef, Investment, PortfolioSnapshot, PortfolioSummary};
pub use kyc::{DocumentType, KycCase, KycDecision, KycSubmission};
pub use listing::{Listing, ListingDraft, ListingType, OccupancyStatus};
pub use notification::{unread_count, Notification, NotificationKind};
pub use receipt::{
    AuthGrant, DepositReceipt, MarketPurchaseReceipt, PurchaseReceipt, StatementEntry,
    StatementKind, WalletChallenge,
};
pub use secondary::{SecondaryListing, SellerRef};
pub use session::{KycStatus, Profile, Role};
pub use user::{UserAccount, UserUpdate};
