//! Background notification poller.
//!
//! Independent of the trade core: a fixed-interval refresher that only
//! talks to the server while a session exists. A 401 during a poll clears
//! the session through the gateway like any other call; the loop itself
//! just keeps ticking and goes quiet until the next login.

use crate::session::SessionStore;
use estate::model::notification::{unread_count, Notification};
use estate::traits::gateway::Gateway;
use log::{debug, info, warn};
use std::sync::{Arc, RwLock};
use std::time::Duration;

pub struct NotificationPoller<G: Gateway> {
    gateway: Arc<G>,
    session: SessionStore,
    interval: Duration,
    feed: Arc<RwLock<Vec<Notification>>>,
}

impl<G: Gateway> NotificationPoller<G> {
    pub fn new(gateway: Arc<G>, session: SessionStore, interval: Duration) -> Self {
        Self {
            gateway,
            session,
            interval,
            feed: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Latest snapshot, for rendering the dropdown.
    pub fn feed(&self) -> Vec<Notification> {
        self.feed.read().unwrap().clone()
    }

    pub fn unread(&self) -> usize {
        unread_count(&self.feed.read().unwrap())
    }

    /// One poll. Skips the network entirely while signed out.
    pub async fn poll_once(&self) -> estate::Result<usize> {
        if !self.session.is_authenticated() {
            debug!("Notifications: skipping poll, not authenticated");
            self.feed.write().unwrap().clear();
            return Ok(0);
        }
        let notifications = self.gateway.notifications().await?;
        let unread = unread_count(&notifications);
        *self.feed.write().unwrap() = notifications;
        Ok(unread)
    }

    /// Marks one entry read server-side, then refetches the snapshot
    /// rather than patching it locally.
    pub async fn mark_read(&self, id: &str) -> estate::Result<usize> {
        self.gateway.mark_notification_read(id).await?;
        self.poll_once().await
    }

    /// The polling loop. Consumes the poller and runs forever; spawn it.
    pub async fn run(self) {
        info!(
            "Notifications: polling every {}s while authenticated",
            self.interval.as_secs()
        );
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            match self.poll_once().await {
                Ok(unread) if unread > 0 => {
                    info!("Notifications: {} unread", unread);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Notifications: poll failed: {}", e);
                }
            }
        }
    }
}
