//! # Event Bus
//!
//! Decouples the stores from the views. Instead of a mutation walking every
//! cache and forcing a reload, it publishes one event; each view subscribes
//! and decides for itself whether a refetch is warranted.

use crate::trade::TradeKind;
use estate::model::session::{KycStatus, Profile};
use tokio::sync::broadcast;

/// State changes that cross component boundaries.
#[derive(Debug, Clone)]
pub enum PlatformEvent {
    /// **Session Store**: a profile was established or refetched.
    SessionOpened { profile: Profile },

    /// **Session Store**: logout, or any component observed a 401.
    SessionClosed,

    /// **Session Store**: the server confirmed a new wallet balance
    /// (deposit or wallet flow).
    BalanceChanged { new_balance: f64 },

    /// **Session Store**: the server moved the user's verification state.
    KycStatusChanged { status: KycStatus },

    /// **Trade Orchestrator**: a trade reached its confirmed terminal
    /// state. Views holding data for `target_id` should refetch.
    TradeCompleted { kind: TradeKind, target_id: String },
}

/// A wrapper around a tokio broadcast channel.
///
/// Wrapped in a struct to enforce strong typing on the events and to keep
/// the channel capacity decision in one place.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        // Slow subscribers lag and skip old events, which is acceptable
        // here: every consumer refetches from the server anyway.
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Publishes an event to all subscribers. A send with no active
    /// subscribers (e.g. during startup) is not an error.
    pub fn publish(&self, event: PlatformEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
