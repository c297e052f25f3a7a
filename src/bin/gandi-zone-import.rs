use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use gandi_zone_import::{
    ApiKey, AppConfig, CredentialError, Environment, GandiClient, ZoneSource, check_credential,
    report,
};
use tracing::{debug, info};

/// Imports RFC1035 zone files into your Gandi.net account, using your API key.
///
/// Zones are named after the file they come from. There is no duplicate
/// check: importing the same file twice creates two zones with the same name.
#[derive(Parser, Debug)]
#[command(author, version, about, rename_all = "kebab-case")]
struct Cli {
    /// Your API key. Will be asked for if not provided.
    #[arg(short, long, value_name = "KEY", env = "GANDI_API_KEY", hide_env_values = true)]
    key: Option<String>,
    /// Use OT&E environment, for testing
    #[arg(long)]
    ote: bool,
    /// XML-RPC endpoint overriding the production / OT&E one
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,
    /// Request timeout in seconds (none by default)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
    /// Zone files you wish to import
    #[arg(value_name = "FILES", required = true)]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let sources = read_sources(&cli.files);
    let config = build_app_config(&cli);

    let key = match &cli.key {
        Some(key) => key.clone(),
        None => prompt_key(config.environment)?,
    };
    let key = ApiKey::new(key).context("invalid API key")?;

    let client = GandiClient::from_config(&config).context("failed to build HTTP client")?;
    info!(endpoint = client.endpoint(), environment = %config.environment, "using endpoint");

    match check_credential(&client, &key).await {
        Ok(()) => {}
        Err(CredentialError::Invalid(fault)) => {
            debug!(code = fault.code, "API key rejected");
            eprintln!("{}", CredentialError::Invalid(fault));
            std::process::exit(1);
        }
        Err(CredentialError::Remote(err)) => {
            return Err(err).context("API key check failed");
        }
    }

    let mut stdout = io::stdout().lock();
    let summary = report::import_and_report(&client, &key, &sources, &mut stdout).await?;
    writeln!(stdout, "{}", summary.line())?;

    Ok(())
}

/// Every file is read up front; one that can't be read is a usage error.
fn read_sources(paths: &[PathBuf]) -> Vec<ZoneSource> {
    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        match ZoneSource::from_path(path) {
            Ok(source) => sources.push(source),
            Err(err) => Cli::command()
                .error(
                    ErrorKind::Io,
                    format!("can't open '{}': {err}", path.display()),
                )
                .exit(),
        }
    }
    sources
}

fn build_app_config(cli: &Cli) -> AppConfig {
    let mut config = AppConfig::new(Environment::from_ote_flag(cli.ote))
        .with_timeout(cli.timeout.map(Duration::from_secs));
    if let Some(endpoint) = &cli.endpoint {
        config = config.with_endpoint(endpoint);
    }
    config
}

fn prompt_key(environment: Environment) -> Result<String> {
    let mut stdout = io::stdout().lock();
    write!(stdout, "Enter API Key ({environment}): ")?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read API key from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "error".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}
