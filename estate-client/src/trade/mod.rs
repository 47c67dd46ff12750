//! Trade lifecycle orchestrator.
//!
//! Drives a single trade attempt (primary purchase, list-for-sale, or
//! secondary purchase) from user input to a confirmed or failed terminal
//! state, and publishes the one event dependent views need to stay
//! consistent without a manual reload.
//!
//! The phase machine is `Idle → Validating → Submitting → Succeeded |
//! Failed`, where Idle is "no active trade". Submission is split into
//! `begin_submit` / `execute_ticket` / `complete` so the network await
//! happens outside the orchestrator: responses for a superseded trade are
//! recognized by their instance tag and discarded.

use crate::event_bus::{EventBus, PlatformEvent};
use estate::error::ApiError;
use estate::model::receipt::{MarketPurchaseReceipt, PurchaseReceipt};
use estate::traits::gateway::Gateway;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Which leg of the market a trade touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TradeKind {
    /// Buy shares from the platform's own inventory.
    Primary,
    /// Buy shares from another investor's listing.
    SecondaryBuy,
    /// Put owned shares up for sale.
    SecondarySell,
}

/// What the trade acts on, snapshotted at modal-open time.
///
/// `available` is a client-side guard only: the cap for the stepper and
/// fail-fast validation. The server remains authoritative and can still
/// reject on a race.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeTarget {
    pub id: String,
    /// Available shares (primary), shares for sale (secondary buy), or
    /// shares owned (secondary sell).
    pub available: u64,
    /// Token price, listed price, or asking price respectively.
    pub unit_price: f64,
}

/// Where the active trade is in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum TradePhase {
    /// Input accepted, ready to submit.
    Validating,
    /// Exactly one request is in flight.
    Submitting,
    /// Server confirmed; shown briefly before the modal closes.
    Succeeded(TradeConfirmation),
    /// Server or transport rejected; message is user-facing.
    Failed(String),
}

/// The server's answer to a confirmed trade, kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeConfirmation {
    Purchase {
        investment_id: String,
        new_available_shares: u64,
    },
    Listed {
        listing_id: String,
    },
    MarketPurchase {
        shares_bought: u64,
        total_paid: f64,
    },
}

/// The ephemeral client-side trade. Born when a modal opens, gone when it
/// closes; never persisted and never authoritative for another view.
#[derive(Debug, Clone)]
pub struct PendingTrade {
    instance: Uuid,
    pub kind: TradeKind,
    pub target: TradeTarget,
    pub quantity: u64,
    pub phase: TradePhase,
}

impl PendingTrade {
    /// Display total. The server recomputes the charged amount.
    pub fn total(&self) -> f64 {
        self.quantity as f64 * self.target.unit_price
    }
}

/// Client-detectable problems that block a submission locally.
#[derive(Debug, Error, PartialEq)]
pub enum TradeError {
    #[error("quantity must be a positive whole number")]
    NonPositiveQuantity,

    #[error("only {available} shares available")]
    ExceedsAvailability { available: u64 },

    #[error("nothing is available to trade")]
    SoldOut,

    #[error("no trade is in progress")]
    NoActiveTrade,

    #[error("a submission is already in flight")]
    AlreadySubmitting,

    #[error("trade is not ready to submit")]
    NotReady,
}

/// One-shot permission to perform the network call for a trade. Carries
/// the instance tag so a late response can be matched (or discarded).
#[derive(Debug, Clone)]
pub struct SubmitTicket {
    instance: Uuid,
    pub kind: TradeKind,
    pub target_id: String,
    pub quantity: u64,
    pub unit_price: f64,
}

/// What [`TradeOrchestrator::complete`] did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionDisposition {
    /// The outcome belonged to the active trade and was applied.
    Applied,
    /// The trade was superseded or dismissed first; outcome dropped.
    DiscardedStale,
}

pub struct TradeOrchestrator {
    active: Option<PendingTrade>,
    bus: EventBus,
}

impl TradeOrchestrator {
    pub fn new(bus: EventBus) -> Self {
        Self { active: None, bus }
    }

    pub fn active(&self) -> Option<&PendingTrade> {
        self.active.as_ref()
    }

    /// Opens a trade. Fails fast, leaving the orchestrator Idle, when the
    /// quantity is non-positive, the target has nothing left, or the
    /// quantity exceeds the known availability. Any previous trade is
    /// superseded: its in-flight response, if one exists, will no longer
    /// match and gets discarded.
    pub fn start_trade(
        &mut self,
        kind: TradeKind,
        target: TradeTarget,
        quantity: u64,
    ) -> Result<&PendingTrade, TradeError> {
        if target.available == 0 {
            return Err(TradeError::SoldOut);
        }
        if quantity == 0 {
            return Err(TradeError::NonPositiveQuantity);
        }
        if quantity > target.available {
            return Err(TradeError::ExceedsAvailability {
                available: target.available,
            });
        }

        Ok(self.active.insert(PendingTrade {
            instance: Uuid::new_v4(),
            kind,
            target,
            quantity,
            phase: TradePhase::Validating,
        }))
    }

    /// Direct-entry edit. Out-of-range input clamps to `[1, available]`
    /// instead of rejecting, so the user is never dead-ended. Editing a
    /// failed trade clears the failure and re-arms it.
    pub fn set_quantity(&mut self, quantity: u64) -> Result<u64, TradeError> {
        let trade = self.editable_trade()?;
        trade.quantity = quantity.clamp(1, trade.target.available);
        Ok(trade.quantity)
    }

    pub fn increment(&mut self) -> Result<u64, TradeError> {
        let trade = self.editable_trade()?;
        trade.quantity = trade
            .quantity
            .saturating_add(1)
            .clamp(1, trade.target.available);
        Ok(trade.quantity)
    }

    pub fn decrement(&mut self) -> Result<u64, TradeError> {
        let trade = self.editable_trade()?;
        trade.quantity = trade
            .quantity
            .saturating_sub(1)
            .clamp(1, trade.target.available);
        Ok(trade.quantity)
    }

    /// Arms the network call: Validating → Submitting. While Submitting,
    /// further calls are rejected without side effects, which is what
    /// guarantees at most one in-flight request per trade instance.
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, TradeError> {
        let trade = self.active.as_mut().ok_or(TradeError::NoActiveTrade)?;
        match trade.phase {
            TradePhase::Validating => {}
            TradePhase::Submitting => return Err(TradeError::AlreadySubmitting),
            TradePhase::Succeeded(_) | TradePhase::Failed(_) => return Err(TradeError::NotReady),
        }
        trade.phase = TradePhase::Submitting;
        Ok(SubmitTicket {
            instance: trade.instance,
            kind: trade.kind,
            target_id: trade.target.id.clone(),
            quantity: trade.quantity,
            unit_price: trade.target.unit_price,
        })
    }

    /// Applies the outcome of a submitted request. Outcomes whose ticket
    /// no longer matches the active instance (the modal was closed, or
    /// reopened for a different target) are discarded wholesale.
    pub fn complete(
        &mut self,
        ticket: &SubmitTicket,
        outcome: Result<TradeConfirmation, ApiError>,
    ) -> CompletionDisposition {
        let Some(trade) = self.active.as_mut() else {
            info!("Trade: response for dismissed trade discarded");
            return CompletionDisposition::DiscardedStale;
        };
        if trade.instance != ticket.instance {
            info!("Trade: stale response for superseded trade discarded");
            return CompletionDisposition::DiscardedStale;
        }

        match outcome {
            Ok(confirmation) => {
                info!(
                    "Trade: {:?} on {} confirmed ({} shares)",
                    trade.kind, trade.target.id, trade.quantity
                );
                trade.phase = TradePhase::Succeeded(confirmation);
                self.bus.publish(PlatformEvent::TradeCompleted {
                    kind: trade.kind,
                    target_id: trade.target.id.clone(),
                });
            }
            Err(err) => {
                let message = failure_message(&err);
                warn!(
                    "Trade: {:?} on {} failed: {}",
                    trade.kind, trade.target.id, message
                );
                trade.phase = TradePhase::Failed(message);
            }
        }
        CompletionDisposition::Applied
    }

    /// Closes the modal: destroys the pending trade from any phase. An
    /// in-flight request is not aborted; its response will be discarded.
    pub fn dismiss(&mut self) {
        self.active = None;
    }

    /// Failed/Succeeded editable rules live here: an edit during Failed
    /// re-arms, anything during Submitting is rejected, a Succeeded trade
    /// is closed-out only.
    fn editable_trade(&mut self) -> Result<&mut PendingTrade, TradeError> {
        let trade = self.active.as_mut().ok_or(TradeError::NoActiveTrade)?;
        match trade.phase {
            TradePhase::Submitting => Err(TradeError::AlreadySubmitting),
            TradePhase::Succeeded(_) => Err(TradeError::NotReady),
            TradePhase::Failed(_) => {
                trade.phase = TradePhase::Validating;
                Ok(trade)
            }
            TradePhase::Validating => Ok(trade),
        }
    }
}

/// Performs the single network call a ticket stands for. Exactly one
/// request per ticket, chosen by trade kind.
pub async fn execute_ticket(
    gateway: &dyn Gateway,
    ticket: &SubmitTicket,
) -> Result<TradeConfirmation, ApiError> {
    match ticket.kind {
        TradeKind::Primary => gateway
            .buy_primary(&ticket.target_id, ticket.quantity)
            .await
            .map(
                |PurchaseReceipt {
                     investment_id,
                     new_available_shares,
                 }| TradeConfirmation::Purchase {
                    investment_id,
                    new_available_shares,
                },
            ),
        TradeKind::SecondarySell => gateway
            .list_secondary(&ticket.target_id, ticket.quantity, ticket.unit_price)
            .await
            .map(|listing_id| TradeConfirmation::Listed { listing_id }),
        TradeKind::SecondaryBuy => gateway
            .buy_secondary(&ticket.target_id, ticket.quantity)
            .await
            .map(
                |MarketPurchaseReceipt {
                     shares_bought,
                     total_paid,
                     ..
                 }| TradeConfirmation::MarketPurchase {
                    shares_bought,
                    total_paid,
                },
            ),
    }
}

/// Convenience driver: arm, call, apply. Callers that need to interleave
/// (or race) submissions use the three steps directly.
pub async fn submit_active(
    orchestrator: &mut TradeOrchestrator,
    gateway: &dyn Gateway,
) -> Result<CompletionDisposition, TradeError> {
    let ticket = orchestrator.begin_submit()?;
    let outcome = execute_ticket(gateway, &ticket).await;
    Ok(orchestrator.complete(&ticket, outcome))
}

/// User-facing message for a failed submission. Business rejections are
/// surfaced verbatim; transport problems get a generic retry message; an
/// auth failure names the real problem since the session is gone.
fn failure_message(err: &ApiError) -> String {
    match err {
        ApiError::Unauthorized => "Authentication required. Please sign in again.".to_string(),
        ApiError::Rejected(message) => message.clone(),
        ApiError::Network(_) | ApiError::Decode(_) => {
            "Transaction failed. Please try again.".to_string()
        }
    }
}
