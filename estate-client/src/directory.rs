//! Asset directory cache.
//!
//! Holds the most recent listing query keyed by the active category
//! filter. This is deliberately not a write-through cache: a mutation
//! anywhere (a purchase, an admin edit) invalidates by refetch, never by
//! local patch, so the snapshot can only ever show server-confirmed
//! numbers.

use crate::event_bus::PlatformEvent;
use crate::trade::TradeKind;
use estate::model::listing::Listing;
use estate::traits::gateway::Gateway;
use log::warn;

#[derive(Default)]
pub struct AssetDirectory {
    category: Option<String>,
    snapshot: Vec<Listing>,
    detail: Option<Listing>,
}

impl AssetDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Changing the filter drops the snapshot; listings fetched for one
    /// filter are never shown under another.
    pub fn set_category(&mut self, category: Option<String>) {
        if self.category != category {
            self.category = category;
            self.snapshot.clear();
        }
    }

    /// Last-fetched listings for the active filter. Empty until the first
    /// [`AssetDirectory::refresh`].
    pub fn listings(&self) -> &[Listing] {
        &self.snapshot
    }

    pub fn get(&self, id: &str) -> Option<&Listing> {
        self.snapshot.iter().find(|l| l.id == id)
    }

    pub fn detail(&self) -> Option<&Listing> {
        self.detail.as_ref()
    }

    pub async fn refresh(&mut self, gateway: &dyn Gateway) -> estate::Result<&[Listing]> {
        let mut listings = gateway.list_assets(self.category.as_deref()).await?;
        // A listing violating the share invariant never reaches a view.
        listings.retain(|l| {
            if l.shares_consistent() {
                true
            } else {
                warn!(
                    "Directory: dropping listing {} with {}/{} shares",
                    l.id, l.available_shares, l.total_shares
                );
                false
            }
        });
        self.snapshot = listings;
        Ok(&self.snapshot)
    }

    pub async fn refresh_detail(
        &mut self,
        gateway: &dyn Gateway,
        id: &str,
    ) -> estate::Result<&Listing> {
        let listing = gateway.asset(id).await?;
        Ok(self.detail.insert(listing))
    }

    /// Whether an event invalidates this cache. Only primary-market trades
    /// move `available_shares`; secondary fills settle between two
    /// portfolios and leave the directory alone.
    pub fn needs_refresh(&self, event: &PlatformEvent) -> bool {
        matches!(
            event,
            PlatformEvent::TradeCompleted {
                kind: TradeKind::Primary,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate::model::listing::{ListingType, OccupancyStatus};

    fn listing(id: &str) -> Listing {
        Listing {
            id: id.into(),
            title: "T".into(),
            location: "L".into(),
            category: "Residential".into(),
            valuation: 1.0,
            total_shares: 10,
            available_shares: 5,
            token_price: 100.0,
            apr: 6.0,
            irr: 9.0,
            listing_type: ListingType::Fractional,
            occupancy_status: OccupancyStatus::Vacant,
        }
    }

    #[test]
    fn changing_the_filter_drops_the_snapshot() {
        let mut dir = AssetDirectory::new();
        dir.snapshot = vec![listing("a")];
        dir.set_category(Some("Commercial".into()));
        assert!(dir.listings().is_empty());
    }

    #[test]
    fn setting_the_same_filter_keeps_the_snapshot() {
        let mut dir = AssetDirectory::new();
        dir.snapshot = vec![listing("a")];
        dir.set_category(None);
        assert_eq!(dir.listings().len(), 1);
    }

    #[test]
    fn only_primary_trades_invalidate() {
        let dir = AssetDirectory::new();
        let primary = PlatformEvent::TradeCompleted {
            kind: TradeKind::Primary,
            target_id: "a".into(),
        };
        let secondary = PlatformEvent::TradeCompleted {
            kind: TradeKind::SecondaryBuy,
            target_id: "l".into(),
        };
        assert!(dir.needs_refresh(&primary));
        assert!(!dir.needs_refresh(&secondary));
        assert!(!dir.needs_refresh(&PlatformEvent::SessionClosed));
    }
}
