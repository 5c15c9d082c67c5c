//! API command-line client
//!
//! One session against the configured backend:
//! 1. Load configuration (`--config` > `CONFIG_PATH` > `api-client.toml`)
//! 2. Log in with `API_LOGIN` / `API_PASSWORD`
//! 3. List users and print them as JSON on stdout
//! 4. Log out

use anyhow::{Context, Result};
use api::{Api, Config, login_from_env};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs on stderr with LOG_LEVEL / RUST_LOG support; stdout carries the output
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    info!("starting api-cli");

    let args: Vec<String> = std::env::args().collect();
    let config_path = Config::resolve_path(config_arg(&args));
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    info!(
        base_url = %config.api.base_url,
        timeout_secs = config.api.timeout_secs,
        headers = config.headers.len(),
        "configuration loaded"
    );

    let (login, password) = login_from_env().context("reading login credentials")?;
    let api = Api::from_config(&config);

    api.login(&login, &password)
        .await
        .with_context(|| format!("login as {login} failed"))?;
    let users = api.get_users().await.context("listing users failed")?;
    info!(count = users.len(), "fetched users");

    println!("{}", render_users(&users)?);

    api.logout();
    Ok(())
}

/// Value following `--config`, if present.
fn config_arg(args: &[String]) -> Option<&str> {
    args.iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn render_users(users: &[Value]) -> Result<String> {
    serde_json::to_string_pretty(users).context("serializing users")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn config_arg_reads_following_value() {
        let argv = args(&["api-cli", "--config", "/etc/api.toml"]);
        assert_eq!(config_arg(&argv), Some("/etc/api.toml"));
    }

    #[test]
    fn config_arg_absent_or_dangling() {
        assert_eq!(config_arg(&args(&["api-cli"])), None);
        assert_eq!(config_arg(&args(&["api-cli", "--config"])), None);
    }

    #[test]
    fn render_users_prints_json_array() {
        let rendered = render_users(&[json!({"id": 1, "login": "user"})]).unwrap();
        let parsed: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, json!([{"id": 1, "login": "user"}]));
    }

    #[test]
    fn render_users_empty_list() {
        assert_eq!(render_users(&[]).unwrap(), "[]");
    }
}
