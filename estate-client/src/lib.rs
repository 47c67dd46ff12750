pub mod config;
pub mod directory;
pub mod event_bus;
pub mod gateway;
pub mod notify;
pub mod session;
pub mod trade;

pub use config::ClientConfig;
pub use directory::AssetDirectory;
pub use event_bus::{EventBus, PlatformEvent};
pub use gateway::mock::MockGateway;
pub use gateway::RestGateway;
pub use notify::NotificationPoller;
pub use session::vault::TokenVault;
pub use session::SessionStore;
pub use trade::{
    execute_ticket, submit_active, CompletionDisposition, PendingTrade, SubmitTicket,
    TradeConfirmation, TradeError, TradeKind, TradeOrchestrator, TradePhase, TradeTarget,
};
