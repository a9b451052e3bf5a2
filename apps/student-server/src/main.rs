use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use api_ingress::{ApiIngress, ApiIngressConfig};
use clap::{Parser, Subcommand};
use db::{ConnectOpts, DbHandle};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use students::{config::StudentsConfig, module::MODULE_NAME as STUDENTS, Students};
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const API_INGRESS: &str = "api_ingress";
const SQLITE_MEMORY: &str = "sqlite::memory:";

/// Student Server - create and list student records over HTTP
#[derive(Parser)]
#[command(name = "student-server", version)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Listen port, overriding server.port
    #[arg(short, long)]
    port: Option<u16>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Raise console verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Replace the configured database with in-memory SQLite
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Start the server (default)
    Run,
    /// Check configuration and print it
    Check,
}

impl Cli {
    fn overrides(&self) -> CliArgs {
        CliArgs {
            config: self.config.as_ref().map(|p| p.display().to_string()),
            port: self.port,
            print_config: self.print_config,
            verbose: self.verbose,
            mock: self.mock,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&cli.overrides());

    let logging = config
        .logging
        .clone()
        .unwrap_or_else(runtime::config::default_logging_config);
    runtime::logging::init_logging_from_config(&logging, Path::new(&config.server.home_dir));
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "student-server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(config).await,
        Command::Check => check(&config),
    }
}

/// Rewrite a relative `sqlite://` path against `home`. Windows separators become `/`.
fn sqlite_dsn_under(dsn: &str, home: &Path, mkdir: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case(SQLITE_MEMORY) || dsn.eq_ignore_ascii_case("sqlite://:memory:") {
        return Ok(SQLITE_MEMORY.to_owned());
    }
    let Some(rest) = dsn.strip_prefix("sqlite://") else {
        bail!("SQLite DSN must use the sqlite:// scheme: {dsn}");
    };
    let (file, params) = rest
        .split_once('?')
        .map_or((rest, None), |(f, q)| (f, Some(q)));
    if file.is_empty() {
        bail!("SQLite DSN has no file path");
    }

    let path = runtime::paths::absolutize(Path::new(file), home);
    if mkdir {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
    }

    let path = path.to_string_lossy().replace('\\', "/");
    Ok(match params {
        Some(q) => format!("sqlite://{path}?{q}"),
        None => format!("sqlite://{path}"),
    })
}

fn effective_dsn(db: &DatabaseConfig, home: &Path, mkdir: bool) -> Result<String> {
    let url = db.url.trim();
    if url.is_empty() {
        bail!("database.url is empty");
    }
    match DbHandle::detect(url)? {
        db::DbEngine::Sqlite if url.starts_with("sqlite://") => sqlite_dsn_under(url, home, mkdir),
        _ => Ok(url.to_owned()),
    }
}

fn pool_opts(db: &DatabaseConfig) -> ConnectOpts {
    ConnectOpts {
        max_conns: db.max_conns,
        acquire_timeout: Some(Duration::from_secs(5)),
        sqlite_busy_timeout: db.busy_timeout_ms.map(|ms| Duration::from_millis(ms.into())),
        ..ConnectOpts::default()
    }
}

async fn run(config: AppConfig) -> Result<()> {
    let home = PathBuf::from(&config.server.home_dir);
    let db_cfg = match &config.database {
        Some(db) => db.clone(),
        None => {
            tracing::info!("no database section, falling back to the default SQLite file");
            DatabaseConfig::default()
        }
    };

    let db = DbHandle::connect(&effective_dsn(&db_cfg, &home, true)?, pool_opts(&db_cfg)).await?;
    tracing::info!(engine = ?db.engine(), dsn = %db.redacted_dsn(), "database ready");
    Students::migrate(&db.sea()).await?;

    let students = Students::new(db.sea(), config.module_config::<StudentsConfig>(STUDENTS)?)?;
    let mut ingress = ApiIngress::new(config.module_config::<ApiIngressConfig>(API_INGRESS)?)
        .with_request_timeout(Duration::from_secs(config.server.timeout_sec));
    ingress.register_openapi(students.openapi());

    let addr = ingress.bind_addr(&config.server.host, config.server.port)?;
    let app = ingress.build_router(students.register_rest(axum::Router::new()))?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if let Err(e) = runtime::shutdown::wait_for_shutdown().await {
                tracing::warn!("signal listener failed: {e:#}");
            }
            cancel.cancel();
        }
    });

    let outcome = ApiIngress::serve(app, addr, cancel).await;
    tracing::info!("closing database pool");
    db.close().await?;
    outcome
}

/// Validate everything `run` would need without opening sockets or files.
fn check(config: &AppConfig) -> Result<()> {
    if let Some(db_cfg) = &config.database {
        let dsn = effective_dsn(db_cfg, Path::new(&config.server.home_dir), false)?;
        tracing::info!(dsn = %db::redact_credentials_in_dsn(Some(&dsn)), "database settings ok");
    }
    config
        .module_config::<StudentsConfig>(STUDENTS)?
        .validate()?;
    let ingress = ApiIngress::new(config.module_config::<ApiIngressConfig>(API_INGRESS)?);
    ingress.bind_addr(&config.server.host, config.server.port)?;

    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
