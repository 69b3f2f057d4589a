// SPDX-License-Identifier: GPL-3.0-or-later
use std::{env, net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};
use axum::serve;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracklister_api::router;
use tracklister_application::AppState;
use tracklister_config::{load as load_config, HttpConfig};

const CONFIG_ENV: &str = "TRACKLISTER_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config_path(env::args().nth(1), env::var(CONFIG_ENV).ok());
    let config = load_config(config_path.as_deref())?;
    init_tracing(&config.telemetry.log_level);

    if let Some(path) = &config_path {
        info!(target: "cli", path = %path.display(), "configuration loaded");
    }

    let state = AppState::from_config(config.clone())?;
    state.on_start();

    let listener = TcpListener::bind(bind_addr(&config.http)?).await?;
    let addr = listener.local_addr()?;
    info!(target: "cli", "listening on {}", addr);

    serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(default_level: &str) {
    let fmt_layer = fmt::layer().with_target(true).with_thread_names(true).with_level(true);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// The first positional argument wins over the environment.
fn config_path(arg: Option<String>, env_value: Option<String>) -> Option<PathBuf> {
    arg.or(env_value)
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

fn bind_addr(http: &HttpConfig) -> Result<SocketAddr> {
    let addr = format!("{}:{}", http.host, http.port);
    addr.parse()
        .with_context(|| format!("invalid listen address {addr}"))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(mut interrupt), Ok(mut terminate)) => {
                tokio::select! {
                    _ = interrupt.recv() => {},
                    _ = terminate.recv() => {},
                }
            }
            (Err(err), _) | (_, Err(err)) => {
                warn!(target: "cli", error = %err, "failed to install signal handlers, falling back to ctrl-c");
                if let Err(err) = tokio::signal::ctrl_c().await {
                    warn!(target: "cli", error = %err, "ctrl-c handler failed");
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target: "cli", error = %err, "ctrl-c handler failed");
        }
    }

    info!(target: "cli", "shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_parses_ipv4() {
        let http = HttpConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
        };
        let addr = bind_addr(&http).unwrap();
        assert_eq!(addr.port(), 8000);
        assert!(addr.is_ipv4());
    }

    #[test]
    fn bind_addr_parses_ipv6() {
        let http = HttpConfig {
            host: "[::1]".to_string(),
            port: 8080,
        };
        let addr = bind_addr(&http).unwrap();
        assert!(addr.is_ipv6());
    }

    #[test]
    fn bind_addr_rejects_hostname() {
        let http = HttpConfig {
            host: "localhost".to_string(),
            port: 8000,
        };
        assert!(bind_addr(&http).is_err());
    }

    #[test]
    fn argument_overrides_environment() {
        assert_eq!(
            config_path(Some("a.toml".into()), Some("b.toml".into())),
            Some(PathBuf::from("a.toml"))
        );
        assert_eq!(
            config_path(None, Some("b.toml".into())),
            Some(PathBuf::from("b.toml"))
        );
        assert_eq!(config_path(None, Some("  ".into())), None);
        assert_eq!(config_path(None, None), None);
    }
}
