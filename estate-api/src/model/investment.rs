//! Portfolio holdings as confirmed by the server.

use serde::{Deserialize, Serialize};

/// Compact reference to the listing a holding or order points at, as the
/// server joins it into responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRef {
    pub id: String,
    pub title: String,
    pub token_price: f64,
    pub apr: f64,
}

/// One confirmed purchase. Immutable from the client's perspective: the
/// server appends rows on buys; selling happens by creating a secondary
/// listing, never by decrementing this row locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub id: String,
    pub asset: AssetRef,
    pub shares_bought: u64,
    pub total_amount: f64,
}

impl Investment {
    /// Estimated monthly rental yield from the listing APR, display only.
    pub fn estimated_monthly_yield(&self) -> f64 {
        self.total_amount * (self.asset.apr / 100.0) / 12.0
    }
}

/// Server-computed rollup accompanying the holdings list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_invested: f64,
    pub total_shares: u64,
}

/// The whole portfolio response: summary plus holdings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub summary: PortfolioSummary,
    pub holdings: Vec<Investment>,
}

impl PortfolioSnapshot {
    pub fn estimated_monthly_yield(&self) -> f64 {
        self.holdings
            .iter()
            .map(Investment::estimated_monthly_yield)
            .sum()
    }

    /// Shares of one asset across all holdings; the cap when listing
    /// shares for sale.
    pub fn shares_held(&self, asset_id: &str) -> u64 {
        self.holdings
            .iter()
            .filter(|inv| inv.asset.id == asset_id)
            .map(|inv| inv.shares_bought)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holding(asset_id: &str, shares: u64, amount: f64, apr: f64) -> Investment {
        Investment {
            id: format!("inv-{asset_id}-{shares}"),
            asset: AssetRef {
                id: asset_id.into(),
                title: "Test".into(),
                token_price: 100.0,
                apr,
            },
            shares_bought: shares,
            total_amount: amount,
        }
    }

    #[test]
    fn monthly_yield_follows_apr() {
        // 12_000 at 12% APR -> 120 per month.
        let inv = holding("a", 120, 12_000.0, 12.0);
        assert!((inv.estimated_monthly_yield() - 120.0).abs() < 1e-9);
    }

    #[test]
    fn shares_held_sums_across_rows_per_asset() {
        let snapshot = PortfolioSnapshot {
            summary: PortfolioSummary::default(),
            holdings: vec![
                holding("a", 3, 300.0, 6.0),
                holding("b", 10, 1000.0, 6.0),
                holding("a", 2, 200.0, 6.0),
            ],
        };
        assert_eq!(snapshot.shares_held("a"), 5);
        assert_eq!(snapshot.shares_held("b"), 10);
        assert_eq!(snapshot.shares_held("missing"), 0);
    }
}
