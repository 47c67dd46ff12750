//! Server confirmations for mutating calls.
//!
//! Every quantity in here is server-computed. Views update from these (or
//! from a refetch they trigger), never from client-side arithmetic.

use crate::model::session::Profile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a successful login, registration or wallet verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthGrant {
    pub token: String,
    pub profile: Profile,
}

/// Confirmation of a primary-market purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    pub investment_id: String,
    pub new_available_shares: u64,
}

/// Confirmation of a secondary-market purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPurchaseReceipt {
    pub shares_bought: u64,
    pub total_paid: f64,
    /// Shares still listed after this fill; zero means the order is gone.
    pub remaining_on_listing: u64,
}

/// Confirmation of a wallet top-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositReceipt {
    pub new_balance: f64,
}

/// One-time nonce the user signs to prove wallet ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletChallenge {
    pub nonce: String,
}

/// Kinds of ledger entries in the account statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementKind {
    #[serde(rename = "Primary_Purchase")]
    PrimaryPurchase,
    #[serde(rename = "Secondary_Purchase")]
    SecondaryPurchase,
    #[serde(rename = "Secondary_Sale")]
    SecondarySale,
    #[serde(rename = "Rent_Yield")]
    RentYield,
    Deposit,
}

/// One row of the account statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementEntry {
    pub id: String,
    pub kind: StatementKind,
    pub amount: f64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
