use std::io::IsTerminal as _;

use anyhow::Context as _;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

const DEFAULT_DIRECTIVE: &str = "info";

fn env_filter() -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(DEFAULT_DIRECTIVE).context("build default log filter"),
    }
}

/// Progress goes to stderr; `RUST_LOG` overrides the level. Colors only when
/// stderr is a terminal, so redirected runs produce plain log files.
pub fn init() -> anyhow::Result<()> {
    let stderr_is_terminal = std::io::stderr().is_terminal();
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(stderr_is_terminal)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter()?)
        .with(fmt_layer)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}
