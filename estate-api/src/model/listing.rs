//! Primary-market listing models.

use serde::{Deserialize, Serialize};

/// How a property is offered on the primary market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingType {
    Fractional,
    #[serde(rename = "Direct Purchase")]
    DirectPurchase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OccupancyStatus {
    Rented,
    Vacant,
    #[serde(rename = "Under Construction")]
    UnderConstruction,
}

/// A tokenized property on the primary market.
///
/// `available_shares` only ever decreases through a server-confirmed
/// purchase; the client renders it but never mutates it locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub location: String,
    pub category: String,
    pub valuation: f64,
    pub total_shares: u64,
    pub available_shares: u64,
    pub token_price: f64,
    /// Annual percentage rate of rental yield.
    pub apr: f64,
    /// Projected internal rate of return.
    pub irr: f64,
    pub listing_type: ListingType,
    pub occupancy_status: OccupancyStatus,
}

impl Listing {
    /// "Sold out" is derived, never stored: it disables trade initiation
    /// but does not alter any other field.
    pub fn is_sold_out(&self) -> bool {
        self.available_shares == 0
    }

    /// Share-count invariant the server is expected to uphold. Checked on
    /// receipt so a drifting snapshot is caught at the edge.
    pub fn shares_consistent(&self) -> bool {
        self.available_shares <= self.total_shares
    }

    /// Fraction of the offering already subscribed, for display.
    pub fn subscribed_fraction(&self) -> f64 {
        if self.total_shares == 0 {
            return 0.0;
        }
        (self.total_shares - self.available_shares) as f64 / self.total_shares as f64
    }
}

/// Draft sent by an administrator to create or replace a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDraft {
    pub title: String,
    pub location: String,
    pub category: String,
    pub valuation: f64,
    pub total_shares: u64,
    pub token_price: f64,
    pub apr: f64,
    pub irr: f64,
    pub listing_type: ListingType,
    pub occupancy_status: OccupancyStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(available: u64, total: u64) -> Listing {
        Listing {
            id: "a-1".into(),
            title: "Dock House".into(),
            location: "Lisbon".into(),
            category: "Residential".into(),
            valuation: 900_000.0,
            total_shares: total,
            available_shares: available,
            token_price: 100.0,
            apr: 7.5,
            irr: 11.0,
            listing_type: ListingType::Fractional,
            occupancy_status: OccupancyStatus::Rented,
        }
    }

    #[test]
    fn sold_out_is_derived_from_availability() {
        assert!(listing(0, 100).is_sold_out());
        assert!(!listing(1, 100).is_sold_out());
    }

    #[test]
    fn consistency_catches_drifting_snapshots() {
        assert!(listing(100, 100).shares_consistent());
        assert!(!listing(101, 100).shares_consistent());
    }

    #[test]
    fn subscribed_fraction_handles_empty_offering() {
        assert_eq!(listing(0, 0).subscribed_fraction(), 0.0);
        assert!((listing(25, 100).subscribed_fraction() - 0.75).abs() < 1e-9);
    }
}
