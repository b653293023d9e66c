//! devparts - inspect and change device hardware settings
//!
//! Settings are probed at startup from `devparts.toml`; only the ones the
//! device supports are listed. Every command re-reads the hardware first, so
//! the preference store always reflects what the device is actually doing.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use devparts_config::DevpartsConfig;
use devparts_hal::{
    DefaultLabels, PreferenceStore, PrivilegedExecutor, SettingKey, SettingPoller, SettingRegistry,
    SyncOutcome,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "devparts", author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to /data/misc/devparts or /etc/devparts)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show every supported setting with its current value
    List,
    /// Re-read all settings into the preference store
    Sync,
    /// Print one setting's current value
    Get {
        /// Setting key or alias (preview, rotation, touchscreen, charger)
        key: String,
    },
    /// Change a setting
    Set {
        /// Setting key or alias (preview, rotation, touchscreen, charger)
        key: String,
        /// New value, e.g. `rear`, `90`, `stylus`, `1000ma`
        value: String,
    },
    /// Follow the charger current limit until interrupted
    WatchCharger {
        /// Stop after this many reports
        #[arg(long, value_name = "N")]
        count: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = DevpartsConfig::load_layered(cli.config.as_deref())
        .context("Failed to load configuration")?;

    setup_logging(&config.system.log_level);
    debug!("Configuration: {:?}", config);

    let executor = Arc::new(PrivilegedExecutor::new(&config.system.su_binary));
    let mut store = PreferenceStore::open(&config.system.store_path).with_context(|| {
        format!(
            "Failed to open preference store {}",
            config.system.store_path.display()
        )
    })?;
    let mut registry = SettingRegistry::probe(&config, executor);

    match cli.command {
        Command::List => list(&mut registry, &mut store),
        Command::Sync => sync(&mut registry, &mut store),
        Command::Get { key } => get(&mut registry, &mut store, &key),
        Command::Set { key, value } => set(&mut registry, &mut store, &key, &value),
        Command::WatchCharger { count } => watch_charger(&registry, &config, count),
    }
}

/// Console logging; `RUST_LOG` overrides the configured level
fn setup_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn supported_key(registry: &SettingRegistry, text: &str) -> Result<SettingKey> {
    let Some(key) = SettingKey::parse(text) else {
        bail!("Unknown setting '{}'", text);
    };
    if !registry.contains(key) {
        bail!("{} is not supported on this device", key);
    }
    Ok(key)
}

fn list(registry: &mut SettingRegistry, store: &mut PreferenceStore) -> Result<()> {
    registry.sync_all(store);

    if registry.is_empty() {
        println!("No supported settings on this device");
        return Ok(());
    }

    for setting in registry.iter() {
        let label = setting.label(&DefaultLabels);
        println!("{}", setting.key());
        println!("  {}", label.title);
        if !label.summary.is_empty() {
            println!("  {}", label.summary);
        }
        let choices = setting.codec().choices();
        if !choices.is_empty() {
            println!("  choices: {}", choices.join(", "));
        }
    }
    Ok(())
}

fn sync(registry: &mut SettingRegistry, store: &mut PreferenceStore) -> Result<()> {
    let outcomes = registry.sync_all(store);
    let failed = outcomes.iter().filter(|(_, o)| !o.is_updated()).count();

    for (key, outcome) in &outcomes {
        match outcome {
            SyncOutcome::Updated(value) => println!("{}={}", key, value.preference_value()),
            SyncOutcome::Unchanged(err) => println!("{}: {}", key, err),
        }
    }

    info!(
        "Synced {} of {} settings",
        outcomes.len() - failed,
        outcomes.len()
    );
    Ok(())
}

fn get(registry: &mut SettingRegistry, store: &mut PreferenceStore, key: &str) -> Result<()> {
    let key = supported_key(registry, key)?;

    match registry.sync(key, store) {
        Some(SyncOutcome::Updated(value)) => {
            println!("{}", value.preference_value());
            Ok(())
        }
        Some(SyncOutcome::Unchanged(err)) => Err(err).context(format!("Unable to read {}", key)),
        None => bail!("{} is not supported on this device", key),
    }
}

fn set(
    registry: &mut SettingRegistry,
    store: &mut PreferenceStore,
    key: &str,
    value: &str,
) -> Result<()> {
    let key = supported_key(registry, key)?;

    if registry.apply_str(key, value, store) {
        println!("{}={}", key, value);
        Ok(())
    } else {
        eprintln!("Unable to set {} to {}", key, value);
        std::process::exit(1);
    }
}

fn watch_charger(
    registry: &SettingRegistry,
    config: &DevpartsConfig,
    count: Option<usize>,
) -> Result<()> {
    let setting = registry
        .get(SettingKey::ChargerLimit)
        .cloned()
        .context("Charger control is not supported on this device")?;
    let interval = Duration::from_millis(config.charger.poll_interval_ms);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async move {
        let (tx, mut rx) = mpsc::channel(4);
        let poller = SettingPoller::start(setting, interval, Arc::new(DefaultLabels), tx);
        let mut seen = 0usize;

        loop {
            tokio::select! {
                report = rx.recv() => {
                    let Some(report) = report else { break };
                    match report.selection {
                        Some(selection) => println!("{} [{}]", report.label.title, selection),
                        None => println!("{}", report.label.title),
                    }
                    seen += 1;
                    if count.is_some_and(|n| seen >= n) {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted");
                    break;
                }
            }
        }

        poller.stop().await;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_set() {
        let cli = Cli::parse_from(["devparts", "-c", "/tmp/devparts.toml", "set", "rotation", "90"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/devparts.toml")));
        match cli.command {
            Command::Set { key, value } => {
                assert_eq!(key, "rotation");
                assert_eq!(value, "90");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_watch_charger_count() {
        let cli = Cli::parse_from(["devparts", "watch-charger", "--count", "3"]);
        assert!(matches!(cli.command, Command::WatchCharger { count: Some(3) }));
    }

    #[test]
    fn test_supported_key() {
        let registry = SettingRegistry::new();
        assert!(supported_key(&registry, "brightness").is_err());
        let err = supported_key(&registry, "charger").unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }
}
