//! Tracing setup: console layer plus an optional JSON-lines file layer
//! driven by the `[logging]` config table.

use crate::cli::FILE_GUARD;
use eyre::WrapErr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber.
///
/// Level precedence: RUST_LOG, then the `[logging] level` from the config,
/// then the CLI flag. The JSON file layer is added only when configured.
pub fn init(console_level: &str, logging: &linebot_config::Logging) -> eyre::Result<()> {
    let level = logging.level.as_deref().unwrap_or(console_level);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .wrap_err("invalid log level")?;

    let console = fmt::layer().with_target(false);

    let file_layer = match &logging.file {
        Some(path) => {
            let path = std::path::Path::new(path);
            let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
            let name = path.file_name().unwrap_or_else(|| "linebot.log".as_ref());
            let appender = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            // Keep the guard alive for the process lifetime.
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_writer(writer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| eyre::eyre!("installing tracing subscriber: {e}"))?;
    Ok(())
}
