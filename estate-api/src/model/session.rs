//! Session identity models.
//!
//! A [`Profile`] is what the server returns for the authenticated user. The
//! client never decodes or trusts the token contents; the profile is always
//! refetched from the server.

use serde::{Deserialize, Serialize};

/// Account role. Admins see inventory, sales, KYC and user management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Investor,
    Admin,
}

/// Identity verification state, as adjudicated server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KycStatus {
    #[default]
    Unverified,
    Pending,
    Verified,
    Rejected,
}

/// The authenticated user as last confirmed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub kyc_status: KycStatus,
    /// Spendable USD balance. Fed by two independent server-confirmed
    /// sources (deposits and wallet flows); the client never does
    /// arithmetic between them.
    pub wallet_balance: f64,
    pub wallet_address: Option<String>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_verified(&self) -> bool {
        self.kyc_status == KycStatus::Verified
    }

    pub fn has_wallet(&self) -> bool {
        self.wallet_address.is_some()
    }
}
