//! ShardKV - An In-Process Sharded Key-Value Store
//!
//! This is a small driver for the store. It loads an existing snapshot,
//! fills the store from several concurrent writers, and saves the result.

use shardkv::{Store, StoreConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Driver configuration
struct Config {
    /// Number of shards
    shards: usize,
    /// Snapshot file to load from and save to
    snapshot: PathBuf,
    /// Number of keys to write
    keys: u64,
    /// TTL for written keys in milliseconds (None = no expiry)
    ttl_ms: Option<u64>,
    /// Number of concurrent writers
    writers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shards: shardkv::storage::DEFAULT_SHARD_COUNT,
            snapshot: PathBuf::from(shardkv::storage::DEFAULT_SNAPSHOT_PATH),
            keys: 100_000,
            ttl_ms: None,
            writers: 4,
        }
    }
}

/// Parses the value following a flag, exiting with a message on failure.
fn flag_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T {
    match args.get(i + 1) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            eprintln!("Error: invalid value for {}: {}", flag, raw);
            std::process::exit(1);
        }),
        None => {
            eprintln!("Error: {} requires a value", flag);
            std::process::exit(1);
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--shards" | "-s" => {
                    config.shards = flag_value(&args, i, "--shards");
                    i += 2;
                }
                "--snapshot" | "-f" => {
                    config.snapshot = flag_value(&args, i, "--snapshot");
                    i += 2;
                }
                "--keys" | "-n" => {
                    config.keys = flag_value(&args, i, "--keys");
                    i += 2;
                }
                "--ttl-ms" | "-t" => {
                    config.ttl_ms = Some(flag_value(&args, i, "--ttl-ms"));
                    i += 2;
                }
                "--writers" | "-w" => {
                    config.writers = flag_value::<usize>(&args, i, "--writers").max(1);
                    i += 2;
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("ShardKV version {}", shardkv::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        config
    }
}

fn print_help() {
    println!(
        r#"
ShardKV - An In-Process Sharded Key-Value Store

USAGE:
    shardkv [OPTIONS]

OPTIONS:
    -s, --shards <N>        Number of shards (default: 16)
    -f, --snapshot <PATH>   Snapshot file to load and save (default: shardkv.snap)
    -n, --keys <N>          Number of keys to write (default: 100000)
    -t, --ttl-ms <MS>       TTL for written keys in milliseconds (default: none)
    -w, --writers <N>       Concurrent writers (default: 4)
    -v, --version           Print version information
    -h, --help              Print this help message

EXAMPLES:
    shardkv                              # 100k keys into shardkv.snap
    shardkv -n 1000000 -t 60000          # 1M keys that expire after a minute
    shardkv -s 4 -f /tmp/kv.snap -n 0    # Reload a snapshot into 4 shards
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::from_args();

    // Set up logging
    let _subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let store = Arc::new(Store::with_config(
        StoreConfig::default()
            .with_shard_count(config.shards)
            .with_snapshot_path(config.snapshot.clone()),
    ));
    info!("Store initialized with {} shards", store.shard_count());

    if config.snapshot.exists() {
        let loader = Arc::clone(&store);
        match tokio::task::spawn_blocking(move || loader.load_default()).await? {
            Ok(report) if report.is_clean() => {
                info!("Loaded {} keys from {}", report.loaded, config.snapshot.display())
            }
            Ok(report) => warn!(
                "Loaded {} keys from {} with {} corrupt records",
                report.loaded,
                config.snapshot.display(),
                report.warnings
            ),
            Err(e) => error!("Failed to load {}: {}", config.snapshot.display(), e),
        }
    }

    let started = Instant::now();
    tokio::select! {
        result = populate(Arc::clone(&store), &config) => result?,
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received, saving what was written so far...");
        }
    }
    info!(
        "Store holds {} entries ({} ms)",
        store.entry_count(),
        started.elapsed().as_millis()
    );

    let saver = Arc::clone(&store);
    let report = tokio::task::spawn_blocking(move || saver.save_default()).await??;
    info!(
        "Saved {} records to {}",
        report.records,
        config.snapshot.display()
    );

    Ok(())
}

/// Writes `kv_<i>` -> `"val_<i>"` for every key, split across the writers.
async fn populate(store: Arc<Store>, config: &Config) -> anyhow::Result<()> {
    let ttl = config.ttl_ms.map(Duration::from_millis);
    let writers = config.writers as u64;
    let mut tasks = JoinSet::new();

    for writer in 0..writers {
        let store = Arc::clone(&store);
        let keys = config.keys;
        tasks.spawn_blocking(move || -> Result<(), shardkv::CodecError> {
            let mut i = writer;
            while i < keys {
                store.set(format!("kv_{}", i), &format!("val_{}", i), ttl)?;
                i += writers;
            }
            Ok(())
        });
    }

    while let Some(joined) = tasks.join_next().await {
        joined??;
    }
    Ok(())
}
