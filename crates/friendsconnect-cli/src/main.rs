use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use friendsconnect_core::models::{badge_label, FriendRequest, UserId};
use friendsconnect_core::tracing_setup;
use friendsconnect_core::{AggregateBadgeState, CoreConfig, CoreRuntime};

#[derive(Parser)]
#[command(name = "friendsconnect")]
#[command(about = "Headless simulator for the FriendsConnect notification core")]
struct Cli {
    /// Directory holding the persisted JSON state
    #[arg(long, short = 'd')]
    data_dir: Option<PathBuf>,

    /// Path to JSON config file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the polling scheduler and print badge changes
    Simulate {
        /// Number of polling ticks to run
        #[arg(long, default_value_t = 10)]
        ticks: u32,

        /// Seconds between ticks (overrides config)
        #[arg(long)]
        interval_secs: Option<u64>,

        /// Chance per tick of a new notification (overrides config)
        #[arg(long)]
        probability: Option<f64>,

        /// Seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// Simulated fetch latency per tick in milliseconds
        #[arg(long)]
        latency_ms: Option<u64>,
    },

    /// Print badge counts and recent notifications
    Status {
        #[arg(long, default_value_t = 10)]
        recent: usize,
    },

    /// Send a direct message and wait for the reply
    Chat {
        user_id: UserId,
        text: String,
    },

    /// Add an incoming friend request
    Request {
        user_id: UserId,
        name: String,
        #[arg(long, default_value_t = 0)]
        mutual: u32,
    },

    /// Accept a pending friend request
    Accept { user_id: UserId },

    /// Decline a pending friend request
    Decline { user_id: UserId },

    /// Mark every notification and conversation as read
    MarkAllRead,

    /// Remove all notifications
    Clear,
}

fn main() -> Result<()> {
    tracing_setup::init_tracing_with_service("friendsconnect");

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref(), cli.data_dir)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    let local = tokio::task::LocalSet::new();
    local.block_on(&rt, run(cli.command, config))
}

fn load_config(path: Option<&PathBuf>, data_dir: Option<PathBuf>) -> Result<CoreConfig> {
    let mut config = match path {
        Some(path) => CoreConfig::from_json_file(path)?.with_env_overrides(),
        None => CoreConfig::from_env(),
    };
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    Ok(config)
}

async fn run(command: Commands, mut config: CoreConfig) -> Result<()> {
    if let Commands::Simulate {
        interval_secs,
        probability,
        seed,
        latency_ms,
        ..
    } = &command
    {
        if let Some(secs) = interval_secs {
            config.poll_interval_secs = *secs;
        }
        if let Some(p) = probability {
            config.fire_probability = *p;
        }
        if seed.is_some() {
            config.seed = *seed;
        }
        if let Some(ms) = latency_ms {
            config.fetch_latency_ms = *ms;
        }
    }

    let mut runtime = CoreRuntime::new(config)
        .with_context(|| "Failed to open data directory".to_string())?;
    tracing::debug!("Using data dir {}", runtime.config().data_dir.display());

    match command {
        Commands::Simulate { ticks, .. } => simulate(&mut runtime, ticks).await?,
        Commands::Status { recent } => print_status(&runtime, recent),
        Commands::Chat { user_id, text } => {
            let core = runtime.core();
            let id = core.borrow_mut().find_or_create_direct(user_id);
            println!("you: {}", text);
            runtime.send_message(id, text)?.await?;

            let core = core.borrow();
            if let Some(last) = core
                .conversations()
                .get(id)
                .and_then(|c| c.last_message.as_ref())
            {
                println!("user {}: {}", last.sender_id, last.text);
            }
        }
        Commands::Request { user_id, name, mutual } => {
            runtime
                .core()
                .borrow_mut()
                .enqueue_friend_request(FriendRequest::new(user_id, name, mutual))?;
            print_badge(&runtime.core().borrow().badge());
        }
        Commands::Accept { user_id } => {
            let request = runtime.core().borrow_mut().accept_friend_request(user_id)?;
            println!("You are now friends with {}", request.name);
        }
        Commands::Decline { user_id } => {
            let request = runtime.core().borrow_mut().decline_friend_request(user_id)?;
            println!("Declined {}", request.name);
        }
        Commands::MarkAllRead => {
            let core = runtime.core();
            let mut core = core.borrow_mut();
            let notifications = core.mark_all_as_read();
            let messages = core.mark_all_conversations_read();
            println!(
                "Marked {} notifications and {} messages as read",
                notifications, messages
            );
        }
        Commands::Clear => {
            let removed = runtime.core().borrow_mut().clear_all();
            println!("Removed {} notifications", removed);
        }
    }

    Ok(())
}

async fn simulate(runtime: &mut CoreRuntime, ticks: u32) -> Result<()> {
    let mut badge_rx = runtime.core().borrow().subscribe_badge();
    print_badge(&badge_rx.borrow_and_update());

    let config = runtime.config();
    let budget = config.poll_interval() * ticks + config.fetch_latency() + Duration::from_millis(100);
    println!(
        "Polling every {:?} for {} ticks (Ctrl+C to stop)",
        config.poll_interval(),
        ticks
    );

    runtime.start();
    let deadline = tokio::time::sleep(budget);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => {
                println!("Interrupted");
                break;
            }
            changed = badge_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *badge_rx.borrow_and_update();
                print_badge(&state);
            }
        }
    }

    runtime.shutdown();
    let stats = runtime.scheduler().stats();
    println!(
        "Ticks fired: {}, injected: {}, suppressed: {}",
        stats.fired, stats.injected, stats.suppressed
    );
    Ok(())
}

fn print_badge(state: &AggregateBadgeState) {
    let label = |count: usize| badge_label(count).unwrap_or_else(|| "-".to_string());
    println!(
        "notifications: {:>3}  messages: {:>3}  requests: {:>3}",
        label(state.notifications_unread),
        label(state.messages_unread),
        label(state.friend_requests_pending)
    );
}

fn print_status(runtime: &CoreRuntime, recent: usize) {
    let core = runtime.core();
    let core = core.borrow();
    print_badge(&core.badge());

    let records = core.ledger().recent(recent);
    if records.is_empty() {
        println!("No notifications yet");
    }
    for record in records {
        println!(
            "{} {} [{}] {}: {}  ({})",
            if record.read { " " } else { "*" },
            record.kind.icon(),
            record.kind,
            record.title,
            record.message,
            record.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    for request in core.friend_requests().pending() {
        println!(
            "  request from {} ({} mutual friends)",
            request.name, request.mutual_count
        );
    }
}
