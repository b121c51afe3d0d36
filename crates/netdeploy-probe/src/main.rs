//! netdeploy-probe: reports how this executable was deployed and drives
//! update checks against its deployment mechanism.

mod logging;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{debug, error, warn};
use netdeploy::{
    ACTIVE_BACKEND, CancellationToken, DeployError, DeploymentFacade, EntryPoint, PollOptions,
    embedded_version_info, entry_point, install_entry_point,
};
use netdeploy_platform::{AppPaths, AppPathsError};
use thiserror::Error;

use crate::settings::{ProbeSettings, SettingsError};

const APP_NAME: &str = "netdeploy";

#[derive(Parser)]
#[command(name = "netdeploy-probe", version, about, long_about = None)]
struct Cli {
    /// Update source location; overrides the settings file
    #[arg(long, global = true)]
    location: Option<String>,

    /// Inspect this executable instead of the probe itself
    #[arg(long, global = true)]
    executable: Option<PathBuf>,

    /// Interval between completion checks, in milliseconds
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,

    /// Cancel checks and updates that take longer than this
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show deployment status (default)
    Status,

    /// Report whether a newer version is available
    Check,

    /// Show the full result of a server version check
    Detailed,

    /// Print the version the application would run after updating
    Version,

    /// Download and install the latest version
    Update,

    /// Persist the effective settings
    SaveSettings,
}

#[derive(Debug, Error)]
enum ProbeError {
    #[error(transparent)]
    Paths(#[from] AppPathsError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("Deployment registry was configured before startup")]
    RegistryInstalled,

    #[error("Could not start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// CLI flags override the settings file. A file that cannot be loaded is
/// replaced by the defaults and its error handed back for logging.
fn effective_settings(cli: &Cli, paths: &AppPaths) -> (ProbeSettings, Option<SettingsError>) {
    let (mut settings, load_error) = match ProbeSettings::load(paths) {
        Ok(settings) => (settings, None),
        Err(error) => (ProbeSettings::default(), Some(error)),
    };
    apply_overrides(cli, &mut settings);
    (settings, load_error)
}

fn apply_overrides(cli: &Cli, settings: &mut ProbeSettings) {
    if let Some(location) = &cli.location {
        settings.update_location = Some(location.clone());
    }
    if let Some(interval) = cli.poll_interval_ms {
        settings.poll_interval_ms = interval;
    }
    settings.debug_logging |= cli.debug;
}

fn run(cli: Cli) -> Result<ExitCode, ProbeError> {
    let paths = AppPaths::new(APP_NAME)?;
    let (settings, load_error) = effective_settings(&cli, &paths);
    logging::init_logging(&paths, settings.debug_logging, settings.max_log_size_bytes);
    if let Some(error) = load_error {
        warn!("Ignoring settings file: {error}");
    }
    debug!("Compiled-in deployment backend: {ACTIVE_BACKEND}");

    let command = cli.command.unwrap_or(Command::Status);
    if matches!(command, Command::SaveSettings) {
        settings.save(&paths)?;
        println!("Saved settings to {}", paths.settings_file().display());
        return Ok(ExitCode::SUCCESS);
    }

    let mut registry = EntryPoint::new()
        .with_version_source(Arc::new(embedded_version_info!()?))
        .with_poll_options(PollOptions::new(settings.poll_interval()));
    if let Some(executable) = cli.executable {
        registry = registry.with_executable_path(executable);
    }
    install_entry_point(registry).map_err(|_| ProbeError::RegistryInstalled)?;

    if let Some(location) = &settings.update_location {
        entry_point().setup_with_location(location)?;
    }
    let facade = entry_point().current()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()?;
    let token = CancellationToken::new();
    if let Some(secs) = cli.timeout_secs {
        let timeout = token.clone();
        runtime.spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            debug!("Timeout reached, cancelling");
            timeout.cancel();
        });
    }

    Ok(runtime.block_on(execute(command, &facade, &token)))
}

async fn execute(
    command: Command,
    facade: &DeploymentFacade,
    token: &CancellationToken,
) -> ExitCode {
    match command {
        Command::Status | Command::SaveSettings => {
            print_status(facade);
            ExitCode::SUCCESS
        }
        Command::Check => {
            let available = facade.check_update_available(token).await;
            println!("update available: {available}");
            ExitCode::SUCCESS
        }
        Command::Detailed => {
            let result = facade.check_for_detailed_update(token).await;
            match result.available_version() {
                Some(version) => println!("server version: {version}"),
                None => println!("server version: unknown"),
            }
            println!("cancelled or failed: {}", result.cancelled_or_failed());
            if let Some(error) = result.error() {
                println!("error: {error}");
            }
            if result.cancelled_or_failed() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Command::Version => {
            println!("{}", facade.updated_version(token).await);
            ExitCode::SUCCESS
        }
        Command::Update => {
            if facade.update(token).await {
                println!("update applied; restart to run the new version");
                ExitCode::SUCCESS
            } else {
                println!("update not applied");
                ExitCode::FAILURE
            }
        }
    }
}

fn print_status(facade: &DeploymentFacade) {
    println!("product:          {}", facade.product_name());
    println!("company:          {}", facade.company_name());
    if !facade.comments().is_empty() {
        println!("comments:         {}", facade.comments());
    }
    println!("executable:       {}", facade.executable_path().display());
    println!("backend:          {}", facade.backend_name());
    println!("network deployed: {}", facade.is_network_deployed());
    println!("current version:  {}", facade.current_version());
    println!("first run:        {}", facade.is_first_run());
    println!("data directory:   {}", facade.data_directory().display());
    println!("last check:       {}", facade.last_check_time().to_rfc3339());
    match facade.update_location() {
        Some(location) => println!("update location:  {location}"),
        None => println!("update location:  (none)"),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command, apply_overrides};
    use crate::settings::ProbeSettings;

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "netdeploy-probe",
            "check",
            "--location",
            "https://updates.example/app/",
            "--timeout-secs",
            "5",
        ])
        .expect("arguments should parse");

        assert!(matches!(cli.command, Some(Command::Check)));
        assert_eq!(
            cli.location.as_deref(),
            Some("https://updates.example/app/")
        );
        assert_eq!(cli.timeout_secs, Some(5));
    }

    #[test]
    fn status_is_the_default_command() {
        let cli = Cli::try_parse_from(["netdeploy-probe"]).expect("arguments should parse");
        assert!(cli.command.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn flags_override_file_settings() {
        let cli = Cli::try_parse_from([
            "netdeploy-probe",
            "--location",
            "https://mirror.example/app/",
            "--poll-interval-ms",
            "20",
            "--debug",
        ])
        .expect("arguments should parse");
        let mut settings = ProbeSettings {
            update_location: Some("https://updates.example/app/".to_string()),
            ..ProbeSettings::default()
        };

        apply_overrides(&cli, &mut settings);

        assert_eq!(
            settings.update_location.as_deref(),
            Some("https://mirror.example/app/")
        );
        assert_eq!(settings.poll_interval_ms, 20);
        assert!(settings.debug_logging);
    }
}
