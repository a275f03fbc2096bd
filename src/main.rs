//! Armory Watch - WoW Classic character level tracker
//!
//! Polls tracked characters on a schedule and announces level-ups via
//! webhook. Runs continuously as a daemon or as one-shot subcommands for
//! registration and queries.

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use armory_watch::{
    ArmoryProvider, BlizzardProvider, Credentials, DataProvider, EntityStore, Scheduler,
    SweepEngine, Tracker, WebhookSink,
};
use clap::{Parser, Subcommand};
use tokio::sync::watch;

/// WoW Classic character tracker - announces level-ups via webhook
#[derive(Parser, Debug)]
#[command(name = "armory_watch")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the tracked-characters JSON file
    #[arg(short, long, default_value_t = default_data_path())]
    data_file: String,

    /// Data source: "armory" (public page) or "api" (Blizzard OAuth API)
    #[arg(long, default_value = "armory")]
    provider: String,

    /// Blizzard API client id (api provider only)
    #[arg(long, env = "BLIZZARD_CLIENT_ID")]
    client_id: Option<String>,

    /// Blizzard API client secret (api provider only)
    #[arg(long, env = "BLIZZARD_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the polling daemon
    Run {
        /// Sweep interval(s) in minutes; repeat the flag for several timers
        #[arg(long = "interval-mins", default_values_t = vec![60u64])]
        interval_mins: Vec<u64>,

        /// Delay between consecutive character fetches, in milliseconds
        #[arg(long, default_value_t = 1500)]
        pace_ms: u64,

        /// Run a single sweep and exit
        #[arg(long, default_value_t = false)]
        once: bool,
    },
    /// Start tracking a character
    Track {
        name: String,
        server: String,
        /// Webhook URL that receives this character's level-up announcements
        #[arg(long, env = "ARMORY_WEBHOOK_URL")]
        webhook: String,
    },
    /// Track every "name server" pair listed in a file, one per line
    TrackFile {
        path: String,
        #[arg(long, env = "ARMORY_WEBHOOK_URL")]
        webhook: String,
    },
    /// List tracked characters
    List,
    /// Show one tracked character by name
    Show { name: String },
}

/// Returns the default registry path: ~/.local/share/armory_watch/tracked.json
fn default_data_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("armory_watch")
        .join("tracked.json")
        .to_string_lossy()
        .to_string()
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let data_file = PathBuf::from(&cli.data_file);

    log::info!("Starting armory_watch...");
    log::info!("Registry path: {}", data_file.display());

    let store = match EntityStore::load(&data_file) {
        Ok(store) => Arc::new(Mutex::new(store)),
        Err(e) => {
            log::error!("Failed to load tracked characters: {e}");
            std::process::exit(1);
        }
    };

    // Request-level timeout so a hung fetch cannot stall a whole sweep.
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(20))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            log::error!("Failed to build HTTP client: {e}");
            std::process::exit(1);
        }
    };

    let provider: Arc<dyn DataProvider> = match cli.provider.as_str() {
        "armory" => Arc::new(ArmoryProvider::new(client.clone())),
        "api" => {
            let (client_id, client_secret) = match (cli.client_id, cli.client_secret) {
                (Some(id), Some(secret)) => (id, secret),
                _ => {
                    log::error!(
                        "--provider api requires BLIZZARD_CLIENT_ID and BLIZZARD_CLIENT_SECRET"
                    );
                    std::process::exit(1);
                }
            };
            Arc::new(BlizzardProvider::new(
                client.clone(),
                Credentials {
                    client_id,
                    client_secret,
                },
            ))
        }
        other => {
            log::error!("Unknown provider: {other} (expected \"armory\" or \"api\")");
            std::process::exit(1);
        }
    };

    match cli.command {
        Command::Run {
            interval_mins,
            pace_ms,
            once,
        } => {
            let sink = Arc::new(WebhookSink::new(client));
            let engine = Arc::new(SweepEngine::new(
                store,
                provider,
                sink,
                Duration::from_millis(pace_ms),
            ));

            if once {
                engine.run_sweep().await;
                return;
            }

            let intervals = interval_mins
                .iter()
                .map(|m| Duration::from_secs(m * 60))
                .collect();
            run_daemon(engine, intervals).await;
        }
        Command::Track {
            name,
            server,
            webhook,
        } => {
            let tracker = Tracker::new(store, provider);
            match tracker.track(&server, &name, &webhook).await {
                Ok(entity) => {
                    println!(
                        "Tracking {} on {} (level {})",
                        entity.name, entity.server, entity.last_level
                    );
                }
                Err(e) => {
                    eprintln!("Could not track {name} on {server}: {e}");
                    std::process::exit(1);
                }
            }
        }
        Command::TrackFile { path, webhook } => {
            let pairs = match read_pairs(&path) {
                Ok(pairs) => pairs,
                Err(e) => {
                    eprintln!("Could not read {path}: {e}");
                    std::process::exit(1);
                }
            };
            let tracker = Tracker::new(store, provider);
            let tracked = tracker
                .batch_track(&pairs, &webhook, Duration::from_millis(1500))
                .await;
            println!("Tracking {tracked} of {} character(s)", pairs.len());
        }
        Command::List => {
            let tracker = Tracker::new(store, provider);
            let entities = tracker.list_tracked();
            if entities.is_empty() {
                println!("No characters are currently being tracked.");
                return;
            }
            for entity in entities {
                println!(
                    "{} (server: {}) - last level: {} - announcing to: {}",
                    entity.name, entity.server, entity.last_level, entity.notify_target
                );
            }
        }
        Command::Show { name } => {
            let tracker = Tracker::new(store, provider);
            match tracker.get_tracked(&name) {
                Some(entity) => match serde_json::to_string_pretty(&entity) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        eprintln!("Could not render {name}: {e}");
                        std::process::exit(1);
                    }
                },
                None => {
                    eprintln!("{name} is not being tracked.");
                    std::process::exit(1);
                }
            }
        }
    }
}

/// Parses "name server" pairs from a batch file, skipping blank lines and
/// `#` comments.
fn read_pairs(path: &str) -> std::io::Result<Vec<(String, String)>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(name), Some(server)) => Some((name.to_string(), server.to_string())),
                _ => None,
            }
        })
        .collect())
}

/// Daemon mode: interval timers, SIGUSR1 as the manual refresh trigger, and
/// Ctrl-C for cooperative shutdown (the in-flight sweep finishes its current
/// character before stopping).
async fn run_daemon(engine: Arc<SweepEngine>, intervals: Vec<Duration>) {
    log::info!(
        "Running in daemon mode, sweep interval(s): {:?}",
        intervals.iter().map(|i| i.as_secs() / 60).collect::<Vec<_>>()
    );

    let scheduler = Scheduler::new(Arc::clone(&engine), intervals);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let stop_flag = engine.shutdown_handle();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::user_defined1()) {
            Ok(mut usr1) => {
                let handle = scheduler.handle();
                tokio::spawn(async move {
                    while usr1.recv().await.is_some() {
                        log::info!("SIGUSR1 received, requesting immediate sweep");
                        handle.trigger_now();
                    }
                });
            }
            Err(e) => log::warn!("Could not install SIGUSR1 handler: {e}"),
        }
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Shutdown requested, finishing current character...");
            stop_flag.store(true, Ordering::Relaxed);
            let _ = shutdown_tx.send(true);
        }
    });

    scheduler.run(shutdown_rx).await;
    log::info!("armory_watch stopped.");
}
