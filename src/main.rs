//! Binary entry point for statuswatch.
//!
//! This binary provides the CLI interface for the presence monitor: the
//! long-running poll daemon plus the subscription management and one-shot
//! status commands.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow prints in the main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};
use statuswatch::config::WatchConfig;
use statuswatch::engine::{compose_status_check, PollScheduler, PresenceFetcher};
use statuswatch::notify::{ChatDelivery, DiscordDelivery, Notification};
use statuswatch::observability;
use statuswatch::roblox::{
    profile_or_unknown, GameTitleClient, PresenceClient, ProfileClient,
};
use statuswatch::services::SubscriptionService;
use statuswatch::storage::{JsonFileCache, SqliteRegistry, SubscriptionRegistry};
use statuswatch::{Error, PresenceStatus};
use std::process::ExitCode;
use std::sync::Arc;

/// Statuswatch - Discord notifier for Roblox account presence changes.
#[derive(Parser)]
#[command(name = "statuswatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Discord bot token.
    #[arg(long, global = true, env = "STATUSWATCH_DISCORD_TOKEN", hide_env_values = true)]
    discord_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the presence poll daemon.
    Run,

    /// Track a Roblox account for a subscriber.
    Add {
        /// Discord user id of the subscriber.
        subscriber_id: u64,

        /// Roblox user id to track.
        roblox_id: u64,
    },

    /// Stop tracking a Roblox account.
    Remove {
        /// Discord user id of the subscriber.
        subscriber_id: u64,

        /// Roblox user id to stop tracking.
        roblox_id: u64,
    },

    /// List a subscriber's tracked accounts.
    List {
        /// Discord user id of the subscriber.
        subscriber_id: u64,
    },

    /// Check a tracked account's current status.
    Status {
        /// Discord user id of the subscriber.
        subscriber_id: u64,

        /// Roblox user id to check.
        roblox_id: u64,
    },

    /// Send an announcement to every subscriber.
    Say {
        /// Discord user id issuing the broadcast; must match the
        /// configured admin when one is set.
        sender_id: u64,

        /// The message to send.
        message: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    observability::init(cli.verbose);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        },
    };

    match dispatch(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

fn load_config(cli: &Cli) -> statuswatch::Result<WatchConfig> {
    let mut config = match &cli.config {
        Some(path) => WatchConfig::load_from_file(std::path::Path::new(path))?,
        None => WatchConfig::load_default(),
    };
    if let Some(token) = &cli.discord_token {
        config.discord.token = Some(token.clone());
    }
    Ok(config)
}

async fn dispatch(command: Commands, config: &WatchConfig) -> statuswatch::Result<()> {
    match command {
        Commands::Run => cmd_run(config).await,
        Commands::Add {
            subscriber_id,
            roblox_id,
        } => cmd_add(config, subscriber_id, roblox_id).await,
        Commands::Remove {
            subscriber_id,
            roblox_id,
        } => cmd_remove(config, subscriber_id, roblox_id),
        Commands::List { subscriber_id } => cmd_list(config, subscriber_id),
        Commands::Status {
            subscriber_id,
            roblox_id,
        } => cmd_status(config, subscriber_id, roblox_id).await,
        Commands::Say { sender_id, message } => cmd_say(config, sender_id, &message).await,
    }
}

fn open_registry(config: &WatchConfig) -> statuswatch::Result<Arc<SqliteRegistry>> {
    Ok(Arc::new(SqliteRegistry::new(&config.db_path)?))
}

fn build_fetcher(config: &WatchConfig) -> statuswatch::Result<PresenceFetcher> {
    let api = Arc::new(PresenceClient::new(&config.roblox, config.request_timeout));
    let cache = Arc::new(JsonFileCache::new(&config.cache_path)?);
    Ok(PresenceFetcher::new(api, cache))
}

fn build_delivery(config: &WatchConfig) -> statuswatch::Result<Arc<DiscordDelivery>> {
    let token = config.discord.token.as_ref().ok_or_else(|| {
        Error::InvalidInput(
            "no Discord token configured (set STATUSWATCH_DISCORD_TOKEN)".to_string(),
        )
    })?;
    Ok(Arc::new(DiscordDelivery::new(
        token.clone(),
        config.discord.api_base.clone(),
        config.request_timeout,
    )))
}

async fn cmd_run(config: &WatchConfig) -> statuswatch::Result<()> {
    let registry = open_registry(config)?;
    let fetcher = build_fetcher(config)?;
    let delivery = build_delivery(config)?;
    let profiles = Arc::new(ProfileClient::new(&config.roblox, config.request_timeout));
    let games = Arc::new(GameTitleClient::new(&config.roblox, config.request_timeout));

    let scheduler = PollScheduler::new(
        registry,
        fetcher,
        profiles,
        games,
        delivery,
        config.poll_interval,
        config.pacing_delay,
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received Ctrl-C, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    tracing::info!(
        interval_secs = config.poll_interval.as_secs(),
        "starting poll scheduler"
    );
    scheduler.run(shutdown_rx).await;
    Ok(())
}

async fn cmd_add(
    config: &WatchConfig,
    subscriber_id: u64,
    roblox_id: u64,
) -> statuswatch::Result<()> {
    let registry = open_registry(config)?;
    let service = SubscriptionService::new(registry);

    let profiles = ProfileClient::new(&config.roblox, config.request_timeout);
    let profile = profile_or_unknown(&profiles, roblox_id).await;

    // Seed the recorded status from reality so the first poll cycle does
    // not fire a spurious transition.
    let fetcher = build_fetcher(config)?;
    let (snapshot, _) = fetcher.fetch(roblox_id).await;
    let initial_status: Option<PresenceStatus> =
        (!snapshot.status.is_unknown()).then_some(snapshot.status);

    let subscription = service.register(
        subscriber_id,
        roblox_id,
        Some(profile.name.clone()),
        initial_status,
    )?;

    let kind = if subscription.is_primary { "Main" } else { "Alt" };
    println!(
        "{} {kind} account added: now tracking {} ({roblox_id})",
        subscription.icon(),
        profile.name
    );
    Ok(())
}

fn cmd_remove(config: &WatchConfig, subscriber_id: u64, roblox_id: u64) -> statuswatch::Result<()> {
    let registry = open_registry(config)?;
    let service = SubscriptionService::new(registry);

    if service.unregister(subscriber_id, roblox_id)? {
        println!("Stopped tracking account {roblox_id}");
    } else {
        println!("Subscriber {subscriber_id} wasn't tracking account {roblox_id}");
    }
    Ok(())
}

fn cmd_list(config: &WatchConfig, subscriber_id: u64) -> statuswatch::Result<()> {
    let registry = open_registry(config)?;
    let service = SubscriptionService::new(registry);

    let subscriptions = service.list(subscriber_id)?;
    if subscriptions.is_empty() {
        println!("No tracked accounts.");
        return Ok(());
    }

    for subscription in subscriptions {
        let name = subscription.display_name.as_deref().unwrap_or("Unknown");
        let status = subscription
            .last_status
            .map_or("Unknown*", PresenceStatus::as_str);
        println!(
            "{} {name}: {status} (ID: {})",
            subscription.icon(),
            subscription.entity_id
        );
    }
    Ok(())
}

async fn cmd_status(
    config: &WatchConfig,
    subscriber_id: u64,
    roblox_id: u64,
) -> statuswatch::Result<()> {
    let registry = open_registry(config)?;
    let subscription = registry.get(subscriber_id, roblox_id)?.ok_or_else(|| {
        Error::InvalidInput(format!(
            "subscriber {subscriber_id} is not tracking account {roblox_id}"
        ))
    })?;

    let fetcher = build_fetcher(config)?;
    let (snapshot, _) = fetcher.fetch(roblox_id).await;

    let profiles = ProfileClient::new(&config.roblox, config.request_timeout);
    let profile = profile_or_unknown(&profiles, roblox_id).await;
    let games = GameTitleClient::new(&config.roblox, config.request_timeout);

    let notification = compose_status_check(&subscription, &snapshot, &profile, &games).await;
    print_notification(&notification);
    Ok(())
}

async fn cmd_say(config: &WatchConfig, sender_id: u64, message: &str) -> statuswatch::Result<()> {
    config.authorize_broadcast(sender_id)?;

    let registry = open_registry(config)?;
    let delivery = build_delivery(config)?;
    let announcement = Notification::announcement(message);

    let (mut success, mut failed) = (0u32, 0u32);
    for subscriber_id in registry.distinct_subscribers()? {
        match delivery.deliver(subscriber_id, &announcement).await {
            Ok(()) => success += 1,
            Err(e) => {
                tracing::warn!(subscriber_id, error = %e, "announcement delivery failed");
                failed += 1;
            },
        }
        tokio::time::sleep(config.pacing_delay).await;
    }

    println!("Success: {success}, Failed: {failed}");
    Ok(())
}

fn print_notification(notification: &Notification) {
    println!("{}", notification.title);
    for field in &notification.fields {
        println!("{}: {}", field.name, field.value);
    }
    if !notification.footer.is_empty() {
        println!("{}", notification.footer);
    }
}
