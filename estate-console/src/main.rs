use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use estate::model::kyc::{DocumentType, KycDecision, KycSubmission};
use estate::model::session::Profile;
use estate::traits::credentials::CredentialStore;
use estate::traits::gateway::Gateway;
use estate_client::{
    submit_active, AssetDirectory, ClientConfig, EventBus, NotificationPoller, PlatformEvent,
    RestGateway, SessionStore, TokenVault, TradeKind, TradeOrchestrator, TradePhase, TradeTarget,
};
use log::info;
use std::fs;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "estate-console")]
#[command(about = "Console client for the fractional real-estate platform")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and persist the session token
    Login {
        email: String,
        password: String,
    },
    /// Create an account and sign in
    Register {
        name: String,
        email: String,
        password: String,
    },
    /// Drop the local session (no server call)
    Logout,
    /// Show the profile for the persisted token
    Me,
    /// Browse primary-market listings
    Assets {
        /// Narrow to a category (Residential, Commercial, ...)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show one listing in detail
    Asset { id: String },
    /// Buy shares on the primary market
    Invest {
        asset_id: String,
        shares: u64,
    },
    /// Show holdings and summary
    Portfolio,
    /// Browse secondary-market listings
    Market,
    /// List owned shares for sale
    Sell {
        asset_id: String,
        shares: u64,
        price_per_share: f64,
    },
    /// Buy shares from a secondary-market listing
    Buy {
        listing_id: String,
        shares: u64,
    },
    /// Cancel one of your secondary-market listings
    CancelListing { listing_id: String },
    /// Top up the wallet balance
    Deposit { amount: f64 },
    /// Link a wallet address (signature obtained out of band)
    LinkWallet {
        address: String,
        signature: String,
    },
    /// Unlink the wallet address
    UnlinkWallet,
    /// Submit identity documents for verification
    SubmitKyc {
        full_name: String,
        date_of_birth: String,
        /// passport, national-id or driver-license
        document_type: String,
        document_number: String,
        /// Path to the document image
        file: String,
    },
    /// Show notifications; --watch polls on the configured interval
    Notifications {
        #[arg(long)]
        watch: bool,
    },
    /// Show the account statement
    Statement,
    /// Administration commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// List all user accounts
    Users,
    /// List pending KYC cases
    PendingKyc,
    /// Approve a pending KYC case
    ApproveKyc { user_id: String },
    /// Reject a pending KYC case with a reason
    RejectKyc { user_id: String, reason: String },
    /// List every investment on the platform
    Investments,
    /// Delete a listing
    DeleteAsset { id: String },
}

struct App {
    config: ClientConfig,
    bus: EventBus,
    session: SessionStore,
    gateway: Arc<RestGateway>,
}

fn build_app() -> Result<App> {
    let config = ClientConfig::load()?;
    let bus = EventBus::new();
    let session = SessionStore::new(TokenVault::new(&config.token_path), bus.clone());
    let gateway = Arc::new(RestGateway::new(
        &config,
        Arc::new(session.clone()) as Arc<dyn CredentialStore>,
    )?);
    Ok(App {
        config,
        bus,
        session,
        gateway,
    })
}

/// Commands that act on the account need a confirmed profile first: the
/// token alone is not enough, the profile is always refetched.
async fn require_profile(app: &App) -> Result<Profile> {
    if !app.session.is_authenticated() {
        bail!("Not signed in. Run `estate-console login <email> <password>` first.");
    }
    app.session
        .refresh(app.gateway.as_ref())
        .await
        .context("Could not refresh the session profile")
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let app = build_app()?;

    match cli.command {
        Commands::Login { email, password } => {
            let profile = app
                .session
                .login(app.gateway.as_ref(), &email, &password)
                .await?;
            println!("Signed in as {} ({})", profile.name, profile.email);
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            let profile = app
                .session
                .register(app.gateway.as_ref(), &name, &email, &password)
                .await?;
            println!("Welcome, {}. Your account is ready.", profile.name);
        }
        Commands::Logout => {
            app.session.logout();
            println!("Signed out.");
        }
        Commands::Me => {
            let profile = require_profile(&app).await?;
            print_profile(&profile);
        }
        Commands::Assets { category } => {
            let mut directory = AssetDirectory::new();
            directory.set_category(category);
            directory.refresh(app.gateway.as_ref()).await?;
            for listing in directory.listings() {
                print_listing_row(listing);
            }
            if directory.listings().is_empty() {
                println!("No listings match.");
            }
        }
        Commands::Asset { id } => {
            let listing = app.gateway.asset(&id).await?;
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        Commands::Invest { asset_id, shares } => {
            require_profile(&app).await?;
            let listing = app.gateway.asset(&asset_id).await?;
            let target = TradeTarget {
                id: listing.id.clone(),
                available: listing.available_shares,
                unit_price: listing.token_price,
            };
            run_trade(&app, TradeKind::Primary, target, shares).await?;
        }
        Commands::Portfolio => {
            require_profile(&app).await?;
            let snapshot = app.gateway.portfolio().await?;
            println!(
                "Invested ${:.2} across {} shares; est. monthly yield ${:.2}",
                snapshot.summary.total_invested,
                snapshot.summary.total_shares,
                snapshot.estimated_monthly_yield()
            );
            for holding in &snapshot.holdings {
                println!(
                    "  {} - {} shares of {} (${:.2})",
                    holding.id, holding.shares_bought, holding.asset.title, holding.total_amount
                );
            }
        }
        Commands::Market => {
            let listings = app.gateway.market_listings().await?;
            for listing in &listings {
                println!(
                    "  {} - {} x ${:.2} of {} by {} ({:+.1}% vs original)",
                    listing.id,
                    listing.shares_for_sale,
                    listing.price_per_share,
                    listing.asset.title,
                    listing.seller.name,
                    listing.margin_pct()
                );
            }
            if listings.is_empty() {
                println!("No active listings.");
            }
        }
        Commands::Sell {
            asset_id,
            shares,
            price_per_share,
        } => {
            require_profile(&app).await?;
            let snapshot = app.gateway.portfolio().await?;
            let target = TradeTarget {
                id: asset_id.clone(),
                available: snapshot.shares_held(&asset_id),
                unit_price: price_per_share,
            };
            run_trade(&app, TradeKind::SecondarySell, target, shares).await?;
        }
        Commands::Buy { listing_id, shares } => {
            require_profile(&app).await?;
            let listings = app.gateway.market_listings().await?;
            let listing = listings
                .iter()
                .find(|l| l.id == listing_id)
                .context("Listing not found on the secondary market")?;
            let target = TradeTarget {
                id: listing.id.clone(),
                available: listing.shares_for_sale,
                unit_price: listing.price_per_share,
            };
            run_trade(&app, TradeKind::SecondaryBuy, target, shares).await?;
        }
        Commands::CancelListing { listing_id } => {
            require_profile(&app).await?;
            app.gateway.cancel_secondary(&listing_id).await?;
            println!("Listing {listing_id} cancelled.");
        }
        Commands::Deposit { amount } => {
            require_profile(&app).await?;
            let receipt = app.gateway.deposit(amount).await?;
            app.session.apply_deposit(&receipt);
            println!("New balance: ${:.2}", receipt.new_balance);
        }
        Commands::LinkWallet { address, signature } => {
            require_profile(&app).await?;
            let nonce = app.gateway.wallet_nonce().await?;
            info!("Linking wallet with nonce {}", nonce.nonce);
            let profile = app.gateway.link_wallet(&address, &signature).await?;
            app.session.apply_profile(profile);
            println!("Wallet {address} linked.");
        }
        Commands::UnlinkWallet => {
            require_profile(&app).await?;
            let profile = app.gateway.unlink_wallet().await?;
            app.session.apply_profile(profile);
            println!("Wallet unlinked.");
        }
        Commands::SubmitKyc {
            full_name,
            date_of_birth,
            document_type,
            document_number,
            file,
        } => {
            require_profile(&app).await?;
            let document_bytes =
                fs::read(&file).with_context(|| format!("Could not read document {file}"))?;
            let submission = KycSubmission {
                full_name,
                date_of_birth,
                document_type: parse_document_type(&document_type)?,
                document_number,
                document_file_name: file,
                document_bytes,
            };
            let status = app.gateway.submit_kyc(submission).await?;
            app.session.apply_kyc_status(status);
            println!("KYC submitted; status is now {:?}.", status);
        }
        Commands::Notifications { watch } => {
            require_profile(&app).await?;
            let poller = NotificationPoller::new(
                app.gateway.clone(),
                app.session.clone(),
                app.config.poll_interval(),
            );
            if watch {
                poller.run().await;
            } else {
                let unread = poller.poll_once().await?;
                for notification in poller.feed() {
                    let marker = if notification.is_read { " " } else { "*" };
                    println!(
                        "{marker} [{:?}] {} ({})",
                        notification.kind,
                        notification.message,
                        notification.created_at.format("%b %d %H:%M")
                    );
                }
                println!("{unread} unread.");
            }
        }
        Commands::Statement => {
            require_profile(&app).await?;
            for entry in app.gateway.statement().await? {
                println!(
                    "  {} {:?} ${:+.2} - {}",
                    entry.created_at.format("%Y-%m-%d"),
                    entry.kind,
                    entry.amount,
                    entry.description
                );
            }
        }
        Commands::Admin { command } => run_admin(&app, command).await?,
    }

    Ok(())
}

/// Drives one trade through the orchestrator: validate, submit, then act
/// on the completion event the way the owning view would.
async fn run_trade(app: &App, kind: TradeKind, target: TradeTarget, shares: u64) -> Result<()> {
    let mut rx = app.bus.subscribe();
    let mut orchestrator = TradeOrchestrator::new(app.bus.clone());

    let trade = orchestrator.start_trade(kind, target, shares)?;
    println!(
        "Order: {} shares @ ${:.2} = ${:.2}",
        trade.quantity,
        trade.target.unit_price,
        trade.total()
    );

    submit_active(&mut orchestrator, app.gateway.as_ref()).await?;

    let phase = orchestrator.active().context("trade vanished")?.phase.clone();
    match phase {
        TradePhase::Succeeded(confirmation) => {
            println!("Confirmed: {:?}", confirmation);
            // The acknowledgement lingers briefly, then the modal closes.
            tokio::time::sleep(app.config.success_display()).await;
            orchestrator.dismiss();
        }
        TradePhase::Failed(message) => {
            bail!("Trade failed: {message}");
        }
        other => bail!("Trade ended in unexpected phase {other:?}"),
    }

    // Selective refresh: only the views the event names refetch.
    while let Ok(event) = rx.try_recv() {
        if let PlatformEvent::TradeCompleted { kind, target_id } = event {
            match kind {
                TradeKind::Primary => {
                    let listing = app.gateway.asset(&target_id).await?;
                    println!(
                        "{} now has {} of {} shares available.",
                        listing.title, listing.available_shares, listing.total_shares
                    );
                    let snapshot = app.gateway.portfolio().await?;
                    println!(
                        "Portfolio: ${:.2} across {} shares.",
                        snapshot.summary.total_invested, snapshot.summary.total_shares
                    );
                }
                TradeKind::SecondarySell | TradeKind::SecondaryBuy => {
                    let open = app.gateway.market_listings().await?.len();
                    println!("Secondary market now shows {open} active listings.");
                }
            }
        }
    }
    Ok(())
}

async fn run_admin(app: &App, command: AdminCommands) -> Result<()> {
    let profile = require_profile(app).await?;
    if !profile.is_admin() {
        bail!("This command needs an administrator account.");
    }

    match command {
        AdminCommands::Users => {
            for user in app.gateway.all_users().await? {
                println!(
                    "  {} {} <{}> {:?}/{:?} ${:.2}",
                    user.id, user.name, user.email, user.role, user.kyc_status, user.wallet_balance
                );
            }
        }
        AdminCommands::PendingKyc => {
            for case in app.gateway.pending_kyc().await? {
                println!(
                    "  {} {} <{}> {:?} submitted {}",
                    case.user_id,
                    case.name,
                    case.email,
                    case.document_type,
                    case.submitted_at.format("%Y-%m-%d")
                );
            }
        }
        AdminCommands::ApproveKyc { user_id } => {
            app.gateway
                .adjudicate_kyc(&user_id, &KycDecision::approve())
                .await?;
            println!("KYC approved for {user_id}.");
        }
        AdminCommands::RejectKyc { user_id, reason } => {
            app.gateway
                .adjudicate_kyc(&user_id, &KycDecision::reject(reason))
                .await?;
            println!("KYC rejected for {user_id}.");
        }
        AdminCommands::Investments => {
            for investment in app.gateway.all_investments().await? {
                println!(
                    "  {} - {} shares of {} (${:.2})",
                    investment.id,
                    investment.shares_bought,
                    investment.asset.title,
                    investment.total_amount
                );
            }
        }
        AdminCommands::DeleteAsset { id } => {
            app.gateway.delete_asset(&id).await?;
            println!("Asset {id} deleted.");
        }
    }
    Ok(())
}

fn parse_document_type(raw: &str) -> Result<DocumentType> {
    match raw.to_lowercase().as_str() {
        "passport" => Ok(DocumentType::Passport),
        "national-id" | "national_id" => Ok(DocumentType::NationalId),
        "driver-license" | "driver_license" => Ok(DocumentType::DriverLicense),
        other => bail!("Unknown document type '{other}'. Use passport, national-id or driver-license."),
    }
}

fn print_profile(profile: &Profile) {
    println!("{} <{}>", profile.name, profile.email);
    println!("  role: {:?}", profile.role);
    println!("  KYC: {:?}", profile.kyc_status);
    println!("  balance: ${:.2}", profile.wallet_balance);
    match &profile.wallet_address {
        Some(address) => println!("  wallet: {address}"),
        None => println!("  wallet: not linked"),
    }
}

fn print_listing_row(listing: &estate::Listing) {
    let status = if listing.is_sold_out() {
        "SOLD OUT"
    } else {
        "OPEN"
    };
    println!(
        "  {} [{}] {} - {} | {}/{} shares @ ${:.2} | APR {:.1}%",
        listing.id,
        status,
        listing.title,
        listing.location,
        listing.available_shares,
        listing.total_shares,
        listing.token_price,
        listing.apr
    );
}
