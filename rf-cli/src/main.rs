//! redis-factory: inspect Redis connection strings and try them out.
//!
//! Parses each URI into a descriptor, optionally applies a JSON overrides
//! file or merges the descriptors left to right, prints the result, and can
//! build the matching client and send PING through it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use rf_client::{create_async_redis_client, create_redis_client, RedisClient};
use rf_common::{
    create_config_from_uri, default_config, merge_configs, ConfigOverrides, ConnectionConfig, Mode,
};

/// Parse, merge and test Redis connection strings.
#[derive(Parser)]
#[command(name = "redis-factory", version, about)]
struct Args {
    /// Connection strings (redis://, rediss://, redis+sentinel://, redis+cluster://).
    #[arg(env = "REDIS_URL")]
    uris: Vec<String>,

    /// JSON file of field overrides applied to every descriptor.
    #[arg(long, value_name = "FILE")]
    overrides: Option<PathBuf>,

    /// Merge all descriptors into one, later ones winning.
    #[arg(long)]
    merge: bool,

    /// Mode of the default descriptor shown when no URI is given.
    #[arg(long, value_parser = parse_mode)]
    mode: Option<Mode>,

    /// Print descriptors as JSON.
    #[arg(long)]
    json: bool,

    /// Build a client for each descriptor and send PING.
    #[arg(long)]
    connect: bool,

    /// Use the async construction path.
    #[arg(long = "async")]
    use_async: bool,
}

fn parse_mode(value: &str) -> Result<Mode, String> {
    value.parse()
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let overrides = match &args.overrides {
        Some(path) => load_overrides(path)?,
        None => ConfigOverrides::default(),
    };

    let mut configs = if args.uris.is_empty() {
        let config = overrides
            .apply(&default_config(args.mode))
            .context("invalid overrides for the default descriptor")?;
        vec![config]
    } else {
        if args.mode.is_some() {
            warn!("--mode only applies when no URI is given");
        }
        // Connection strings may carry credentials, so errors name them by position.
        args.uris
            .iter()
            .enumerate()
            .map(|(idx, uri)| {
                create_config_from_uri(uri, &overrides)
                    .with_context(|| format!("invalid connection string #{}", idx + 1))
            })
            .collect::<Result<Vec<_>>>()?
    };

    if args.merge {
        if let Some((first, rest)) = configs.split_first() {
            let merged = rest
                .iter()
                .fold(first.clone(), |acc, next| merge_configs(&acc, next));
            configs = vec![merged];
        }
    }

    for config in &configs {
        print_config(config, args.json)?;
    }

    if args.connect {
        if args.use_async {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start tokio runtime")?;
            runtime.block_on(ping_all_async(&configs))?;
        } else {
            ping_all(&configs)?;
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_overrides(path: &Path) -> Result<ConfigOverrides> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read overrides from {}", path.display()))?;
    let overrides: ConfigOverrides = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse overrides in {}", path.display()))?;
    if overrides.is_empty() {
        warn!(path = %path.display(), "overrides file sets no fields");
    }
    Ok(overrides)
}

fn print_config(config: &ConnectionConfig, json: bool) -> Result<()> {
    if json {
        let rendered = serde_json::to_string_pretty(config).context("failed to render descriptor")?;
        println!("{rendered}");
    } else {
        println!("{config:#?}");
    }
    Ok(())
}

fn ping_all(configs: &[ConnectionConfig]) -> Result<()> {
    for config in configs {
        let client = create_redis_client(config)
            .with_context(|| format!("failed to build {} client for {}", config.mode(), config.addr()))?;
        let mut conn = client
            .get_connection()
            .with_context(|| format!("failed to connect to {}", config.addr()))?;
        let reply: String = redis::cmd("PING")
            .query(&mut conn)
            .with_context(|| format!("PING failed on {}", config.addr()))?;
        report(&client, config, &reply)?;
    }
    Ok(())
}

async fn ping_all_async(configs: &[ConnectionConfig]) -> Result<()> {
    for config in configs {
        let client = create_async_redis_client(config)
            .await
            .with_context(|| format!("failed to build {} client for {}", config.mode(), config.addr()))?;
        let mut conn = client
            .get_async_connection()
            .await
            .with_context(|| format!("failed to connect to {}", config.addr()))?;
        let reply: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .with_context(|| format!("PING failed on {}", config.addr()))?;
        report(&client, config, &reply)?;
    }
    Ok(())
}

fn report(client: &RedisClient, config: &ConnectionConfig, reply: &str) -> Result<()> {
    if reply != "PONG" {
        bail!("unexpected PING reply from {}: {reply}", config.addr());
    }
    info!(mode = %client.mode(), addr = %config.addr(), "PING ok");
    println!("{} {}: {reply}", client.mode(), config.addr());
    Ok(())
}
