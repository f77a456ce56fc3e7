use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use astrana_setup::config::ClientSettings;
use astrana_setup::gateway::ApiGateway;
use astrana_setup::services::setup::LOGIN_ROUTE;
use astrana_setup::services::{RemoteSetupApi, SetupApi, WizardEntry};
use astrana_setup::setup::SetupWizard;
use astrana_setup::strings::{self, Translations};

#[derive(Parser)]
#[command(name = "astrana-setup", version, about = "Astrana first-run setup wizard")]
struct Cli {
    /// Directory holding config.toml and the token file
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Astrana API base address (overrides config and ASTRANA_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the interactive setup wizard (default)
    Wizard,
    /// Show the installation's setup status
    Status,
    /// Print the license agreement
    License {
        /// Two-letter language code
        #[arg(long, default_value = "en")]
        language: String,
    },
    /// List languages offered by the server
    Languages,
    /// Test the server's default database settings
    TestDb,
    /// Write a default config.toml
    InitConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("astrana_setup=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_dir = cli
        .config_dir
        .unwrap_or_else(ClientSettings::default_config_dir);

    let command = cli.command.unwrap_or(Command::Wizard);
    if let Command::InitConfig = command {
        let path = ClientSettings::init(&config_dir)?;
        println!("  Config written to {}", path.display());
        return Ok(());
    }

    let settings = ClientSettings::load(&config_dir)
        .and_then(|s| s.with_overrides(cli.api_url))
        .with_context(|| format!("loading config from {}", config_dir.display()))?;
    let gateway = ApiGateway::from_config(&settings.config, settings.session())
        .context("building API client")?;
    tracing::debug!(base_url = %gateway.base_url(), "API gateway ready");
    let api = RemoteSetupApi::new(gateway);

    match command {
        Command::Wizard => run_wizard(&api, &settings).await,
        Command::Status => run_status(&api).await,
        Command::License { language } => {
            let text = api.license(&language).await?;
            println!("{text}");
            Ok(())
        }
        Command::Languages => {
            for language in api.languages().await? {
                let option = language.as_option();
                println!("  {:<4} {}", option.value, option.label);
            }
            Ok(())
        }
        Command::TestDb => run_test_db(&api).await,
        Command::InitConfig => Ok(()),
    }
}

async fn run_wizard(api: &RemoteSetupApi, settings: &ClientSettings) -> anyhow::Result<()> {
    let status = api.setup_status().await?;
    if WizardEntry::for_status(&status) == WizardEntry::RedirectToLogin {
        let t = Translations::empty(settings.config.locale.language.clone());
        println!("\n  {} {LOGIN_ROUTE}\n", t.t(strings::ALREADY_SET_UP));
        return Ok(());
    }

    let wizard = SetupWizard::new(api, settings.initial_draft());
    wizard.run().await?;
    Ok(())
}

async fn run_status(api: &RemoteSetupApi) -> anyhow::Result<()> {
    let status = api.setup_status().await?;
    println!("\n  Astrana Setup Status\n");
    println!("  API:         {}", api.gateway().base_url());
    println!("  Status:      {status}");
    match WizardEntry::for_status(&status) {
        WizardEntry::Enter => println!("  Wizard:      available\n"),
        WizardEntry::RedirectToLogin => println!("  Wizard:      closed, sign in at {LOGIN_ROUTE}\n"),
    }
    Ok(())
}

async fn run_test_db(api: &RemoteSetupApi) -> anyhow::Result<()> {
    let settings = api.database_settings().await?;
    let host = settings.database_host.clone();
    let ok = api.test_database(&settings).await?;
    if ok {
        println!("  Database connection to {host} succeeded.");
    } else {
        println!("  Database connection to {host} failed.");
    }
    Ok(())
}
