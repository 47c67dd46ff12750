//! Peer-to-peer secondary market orders.

use crate::model::investment::AssetRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerRef {
    pub id: String,
    pub name: String,
}

/// An active sell order on the secondary market.
///
/// `shares_for_sale > 0` while the order is live; the server removes it on
/// cancellation or a full fill. The client must refetch rather than assume
/// any local mutation persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryListing {
    pub id: String,
    pub seller: SellerRef,
    pub asset: AssetRef,
    pub shares_for_sale: u64,
    pub price_per_share: f64,
}

impl SecondaryListing {
    pub fn total_value(&self) -> f64 {
        self.shares_for_sale as f64 * self.price_per_share
    }

    /// Asking-price margin over the original token price, in percent.
    pub fn margin_pct(&self) -> f64 {
        if self.asset.token_price == 0.0 {
            return 0.0;
        }
        (self.price_per_share - self.asset.token_price) / self.asset.token_price * 100.0
    }

    pub fn is_seller(&self, user_id: &str) -> bool {
        self.seller.id == user_id
    }
}
