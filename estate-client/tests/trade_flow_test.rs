//! End-to-end trade lifecycle tests against the in-memory gateway:
//! optimistic flow, error rollback, and the cross-view refresh triggers.

use estate::model::listing::{Listing, ListingType, OccupancyStatus};
use estate::traits::credentials::CredentialStore;
use estate::traits::gateway::Gateway;
use estate::ApiError;
use estate_client::gateway::mock::{investor_profile, MockGateway};
use estate_client::{
    execute_ticket, submit_active, AssetDirectory, CompletionDisposition, EventBus,
    PlatformEvent, SessionStore, TokenVault, TradeConfirmation, TradeError, TradeKind,
    TradeOrchestrator, TradePhase, TradeTarget,
};
use std::sync::Arc;

fn listing(id: &str, available: u64, total: u64, token_price: f64) -> Listing {
    Listing {
        id: id.into(),
        title: format!("Asset {id}"),
        location: "Porto".into(),
        category: "Residential".into(),
        valuation: 1_000_000.0,
        total_shares: total,
        available_shares: available,
        token_price,
        apr: 7.0,
        irr: 10.0,
        listing_type: ListingType::Fractional,
        occupancy_status: OccupancyStatus::Rented,
    }
}

struct Harness {
    gateway: Arc<MockGateway>,
    session: SessionStore,
    bus: EventBus,
    _dir: tempfile::TempDir,
}

async fn signed_in_harness(balance: f64) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let bus = EventBus::new();
    let gateway = Arc::new(MockGateway::new(investor_profile(balance), "secret"));
    let session = SessionStore::new(
        TokenVault::new(dir.path().join("session.token")),
        bus.clone(),
    );
    gateway.attach_credentials(Arc::new(session.clone()) as Arc<dyn CredentialStore>);
    session
        .login(gateway.as_ref(), "investor@example.com", "secret")
        .await
        .unwrap();
    Harness {
        gateway,
        session,
        bus,
        _dir: dir,
    }
}

fn trade_target(listing: &Listing) -> TradeTarget {
    TradeTarget {
        id: listing.id.clone(),
        available: listing.available_shares,
        unit_price: listing.token_price,
    }
}

#[tokio::test]
async fn primary_purchase_flows_server_values_back_into_views() {
    let h = signed_in_harness(1_000.0).await;
    h.gateway.seed_asset(listing("a-1", 5, 100, 100.0));
    let mut rx = h.bus.subscribe();

    let mut directory = AssetDirectory::new();
    directory.refresh(h.gateway.as_ref()).await.unwrap();
    let target = trade_target(directory.get("a-1").unwrap());

    let mut orch = TradeOrchestrator::new(h.bus.clone());
    orch.start_trade(TradeKind::Primary, target, 1).unwrap();
    // User types 10 into the stepper: clamped to the 5 available.
    assert_eq!(orch.set_quantity(10).unwrap(), 5);
    assert!((orch.active().unwrap().total() - 500.0).abs() < 1e-9);

    let disposition = submit_active(&mut orch, h.gateway.as_ref()).await.unwrap();
    assert_eq!(disposition, CompletionDisposition::Applied);
    assert_eq!(h.gateway.call_count("buy_primary"), 1);

    // The confirmation carries the server's own availability.
    match &orch.active().unwrap().phase {
        TradePhase::Succeeded(confirmation) => match confirmation {
            TradeConfirmation::Purchase {
                new_available_shares,
                ..
            } => assert_eq!(*new_available_shares, 0),
            other => panic!("unexpected confirmation {other:?}"),
        },
        other => panic!("expected Succeeded, got {other:?}"),
    }

    // The directory refetches on the TradeCompleted event and then shows
    // the server value, never a local decrement.
    let event = loop {
        match rx.try_recv().unwrap() {
            e @ PlatformEvent::TradeCompleted { .. } => break e,
            _ => continue,
        }
    };
    assert!(directory.needs_refresh(&event));
    directory.refresh(h.gateway.as_ref()).await.unwrap();
    assert_eq!(directory.get("a-1").unwrap().available_shares, 0);
    assert!(directory.get("a-1").unwrap().is_sold_out());

    // Portfolio and balance reflect the settled purchase.
    let snapshot = h.gateway.portfolio().await.unwrap();
    assert_eq!(snapshot.summary.total_shares, 5);
    let profile = h.session.refresh(h.gateway.as_ref()).await.unwrap();
    assert!((profile.wallet_balance - 500.0).abs() < 1e-9);
}

#[tokio::test]
async fn insufficient_funds_keeps_the_trade_open_with_the_server_message() {
    let h = signed_in_harness(100.0).await;
    h.gateway.seed_asset(listing("a-1", 5, 100, 100.0));

    let mut orch = TradeOrchestrator::new(h.bus.clone());
    orch.start_trade(
        TradeKind::Primary,
        TradeTarget {
            id: "a-1".into(),
            available: 5,
            unit_price: 100.0,
        },
        5,
    )
    .unwrap();

    submit_active(&mut orch, h.gateway.as_ref()).await.unwrap();

    match &orch.active().unwrap().phase {
        TradePhase::Failed(message) => assert_eq!(message, "Insufficient funds"),
        other => panic!("expected Failed, got {other:?}"),
    }
    // One request went out, and the server state is untouched.
    assert_eq!(h.gateway.call_count("buy_primary"), 1);
    assert_eq!(h.gateway.asset_snapshot("a-1").unwrap().available_shares, 5);
}

#[tokio::test]
async fn confirming_twice_issues_exactly_one_request() {
    let h = signed_in_harness(1_000.0).await;
    h.gateway.seed_asset(listing("a-1", 5, 100, 100.0));

    let mut orch = TradeOrchestrator::new(h.bus.clone());
    orch.start_trade(
        TradeKind::Primary,
        TradeTarget {
            id: "a-1".into(),
            available: 5,
            unit_price: 100.0,
        },
        2,
    )
    .unwrap();

    let ticket = orch.begin_submit().unwrap();
    assert_eq!(
        orch.begin_submit().unwrap_err(),
        TradeError::AlreadySubmitting
    );

    let outcome = execute_ticket(h.gateway.as_ref(), &ticket).await;
    orch.complete(&ticket, outcome);

    assert_eq!(h.gateway.call_count("buy_primary"), 1);
}

#[tokio::test]
async fn late_response_for_a_superseded_trade_is_discarded() {
    let h = signed_in_harness(10_000.0).await;
    h.gateway.seed_asset(listing("a-1", 5, 100, 100.0));
    h.gateway.seed_asset(listing("a-2", 8, 100, 50.0));
    let mut rx = h.bus.subscribe();

    let mut orch = TradeOrchestrator::new(h.bus.clone());
    orch.start_trade(
        TradeKind::Primary,
        TradeTarget {
            id: "a-1".into(),
            available: 5,
            unit_price: 100.0,
        },
        2,
    )
    .unwrap();
    let stale = orch.begin_submit().unwrap();

    // Modal closed and reopened for a different asset before the first
    // response arrives.
    orch.dismiss();
    orch.start_trade(
        TradeKind::Primary,
        TradeTarget {
            id: "a-2".into(),
            available: 8,
            unit_price: 50.0,
        },
        3,
    )
    .unwrap();

    let outcome = execute_ticket(h.gateway.as_ref(), &stale).await;
    assert_eq!(
        orch.complete(&stale, outcome),
        CompletionDisposition::DiscardedStale
    );

    // The active trade is untouched and no completion event was emitted;
    // the server-side effect of the stale request stands (no abort).
    let current = orch.active().unwrap();
    assert_eq!(current.target.id, "a-2");
    assert_eq!(current.phase, TradePhase::Validating);
    assert!(rx.try_recv().is_err());
    assert_eq!(h.gateway.asset_snapshot("a-1").unwrap().available_shares, 3);
}

#[tokio::test]
async fn listing_and_buying_on_the_secondary_market() {
    let h = signed_in_harness(2_000.0).await;
    h.gateway.seed_asset(listing("a-1", 10, 100, 100.0));

    // Own some shares first.
    h.gateway.buy_primary("a-1", 4).await.unwrap();

    // List 3 of them at a premium.
    let mut orch = TradeOrchestrator::new(h.bus.clone());
    let held = h.gateway.portfolio().await.unwrap().shares_held("a-1");
    orch.start_trade(
        TradeKind::SecondarySell,
        TradeTarget {
            id: "a-1".into(),
            available: held,
            unit_price: 120.0,
        },
        3,
    )
    .unwrap();
    submit_active(&mut orch, h.gateway.as_ref()).await.unwrap();

    let market = h.gateway.market_snapshot();
    assert_eq!(market.len(), 1);
    assert_eq!(market[0].shares_for_sale, 3);
    assert!((market[0].price_per_share - 120.0).abs() < 1e-9);
    assert!((market[0].margin_pct() - 20.0).abs() < 1e-9);
    orch.dismiss();

    // Partial fill: buy 2 of the 3.
    let order_id = market[0].id.clone();
    orch.start_trade(
        TradeKind::SecondaryBuy,
        TradeTarget {
            id: order_id.clone(),
            available: 3,
            unit_price: 120.0,
        },
        2,
    )
    .unwrap();
    submit_active(&mut orch, h.gateway.as_ref()).await.unwrap();
    assert!(matches!(
        orch.active().unwrap().phase,
        TradePhase::Succeeded(_)
    ));
    assert_eq!(h.gateway.market_snapshot()[0].shares_for_sale, 1);

    // The remainder can be cancelled by its seller, after which a refetch
    // shows an empty market.
    h.gateway.cancel_secondary(&order_id).await.unwrap();
    assert!(h.gateway.market_listings().await.unwrap().is_empty());
}

#[tokio::test]
async fn overselling_holdings_is_rejected_with_the_server_message() {
    let h = signed_in_harness(1_000.0).await;
    h.gateway.seed_asset(listing("a-1", 10, 100, 100.0));
    h.gateway.buy_primary("a-1", 2).await.unwrap();

    // The client-side guard caps at known holdings; a race can still slip
    // through it, so drive the gateway directly to model that.
    let err = h.gateway.list_secondary("a-1", 5, 110.0).await.unwrap_err();
    assert_eq!(err, ApiError::rejected("Insufficient holdings"));
}

#[tokio::test]
async fn a_401_clears_the_session_and_fails_the_open_trade() {
    let h = signed_in_harness(1_000.0).await;
    h.gateway.seed_asset(listing("a-1", 5, 100, 100.0));

    let mut orch = TradeOrchestrator::new(h.bus.clone());
    orch.start_trade(
        TradeKind::Primary,
        TradeTarget {
            id: "a-1".into(),
            available: 5,
            unit_price: 100.0,
        },
        1,
    )
    .unwrap();
    let ticket = orch.begin_submit().unwrap();

    // Token expires while the request is in flight.
    h.gateway.expire_session();
    let outcome = execute_ticket(h.gateway.as_ref(), &ticket).await;
    orch.complete(&ticket, outcome);

    assert!(!h.session.is_authenticated(), "session must be cleared");
    match &orch.active().unwrap().phase {
        TradePhase::Failed(message) => {
            assert!(message.to_lowercase().contains("authentication"))
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}
