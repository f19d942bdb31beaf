use std::fmt;
use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder, WindowCloseBehaviour};
use services::config::parse_api_url;
use services::{ApiConfig, AppServices, AuthPolicy, Clock, ConfigError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ui::{App, UiApp, build_app_context};

const DEFAULT_DB_URL: &str = "sqlite://strandify.sqlite3";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    Config(ConfigError),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<ConfigError> for ArgsError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  cargo run -p app -- [--api-url <url>] [--auth-mode bearer|cookie] [--db <sqlite_url>] [--offline]"
    );
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --api-url {}", services::config::DEFAULT_API_URL);
    eprintln!("  --auth-mode bearer");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!();
    eprintln!("--offline runs against a built-in demo backend");
    eprintln!("(student@strandify.test / password) and keeps tokens in memory.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STRAND_API_URL, STRAND_AUTH_MODE, STRAND_PAGE_SIZE,");
    eprintln!("  STRAND_IDLE_TIMEOUT_SECS, STRAND_DB_URL, RUST_LOG");
}

struct Args {
    db_url: String,
    config: ApiConfig,
    offline: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut config = ApiConfig::from_env()?;
        let mut db_url = std::env::var("STRAND_DB_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut offline = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api-url" => {
                    let value = require_value(args, "--api-url")?;
                    config.base_url = parse_api_url(&value)?.to_string();
                }
                "--auth-mode" => {
                    let value = require_value(args, "--auth-mode")?;
                    config.auth = value.parse::<AuthPolicy>()?;
                }
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--offline" => offline = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            config,
            offline,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "app=info,ui=info,services=info,storage=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let clock = Clock::default();
    let services = if parsed.offline {
        tracing::info!("starting in offline mode with the demo backend");
        AppServices::offline(clock, parsed.config)
    } else {
        // Open + migrate SQLite at startup. Keep this in the binary glue so services stay pure.
        prepare_sqlite_file(&parsed.db_url)?;
        tracing::info!(
            api = %parsed.config.base_url,
            auth = parsed.config.auth.as_str(),
            db = %parsed.db_url,
            "starting"
        );
        AppServices::new_sqlite(&parsed.db_url, clock, parsed.config).await?
    };

    let app: Arc<dyn UiApp> = Arc::new(services);
    let context = build_app_context(&app);

    // Close only hides the window; the App's close guard asks first and then
    // closes it for real.
    let desktop_cfg = DesktopConfig::new()
        .with_close_behaviour(WindowCloseBehaviour::WindowHides)
        .with_window(
            WindowBuilder::new()
                .with_title("Strandify")
                .with_always_on_top(false),
        );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        tracing::error!(error = %err, "startup failed");
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|arg| (*arg).to_string());
        Args::parse(&mut iter)
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&[
            "--api-url",
            "https://api.strandify.test",
            "--auth-mode",
            "cookie",
            "--db",
            "sqlite://tmp/tokens.sqlite3",
            "--offline",
        ])
        .unwrap();
        assert_eq!(args.config.base_url, "https://api.strandify.test/");
        assert_eq!(args.config.auth, AuthPolicy::Cookie);
        assert_eq!(args.db_url, "sqlite://tmp/tokens.sqlite3");
        assert!(args.offline);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            parse(&["--api-url", "ftp://example.com"]),
            Err(ArgsError::Config(ConfigError::ApiScheme(_)))
        ));
        assert!(matches!(
            parse(&["--auth-mode", "magic"]),
            Err(ArgsError::Config(ConfigError::AuthMode(_)))
        ));
        assert!(matches!(
            parse(&["--db"]),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
        assert!(matches!(
            parse(&["--verbose"]),
            Err(ArgsError::UnknownArg(_))
        ));
    }

    #[test]
    fn relative_db_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/tokens.sqlite3".into());
        assert!(url.starts_with("sqlite:///"), "{url}");
        assert!(url.ends_with("data/tokens.sqlite3"), "{url}");
    }
}
