use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use jobboard_insights::api::ApiClient;
use jobboard_insights::config::{Config, DEFAULT_CONFIG_FILE};
use jobboard_insights::dashboard::{self, DashboardSettings};
use jobboard_insights::models::User;
use jobboard_insights::report::{self, ReportFormat};
use jobboard_insights::session::ViewContext;
use jobboard_insights::snapshot::SnapshotSource;

#[derive(Parser)]
#[command(name = "jobboard-insights")]
#[command(about = "Employer and job seeker dashboards for the job board", long_about = None)]
struct Cli {
    /// Path to the configuration file (defaults to ./jobboard.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default jobboard.toml
    InitConfig,
    /// Postings, categories and received applications for an employer
    Employer(DashboardArgs),
    /// Application activity and history for a job seeker
    Seeker(DashboardArgs),
}

#[derive(Args)]
struct DashboardArgs {
    /// Backend base URL
    #[arg(long, env = "JOBBOARD_API_URL")]
    api_url: Option<String>,

    /// Bearer token for the backend
    #[arg(long, env = "JOBBOARD_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Sign in with this email before fetching
    #[arg(long, requires = "password")]
    email: Option<String>,

    #[arg(long, env = "JOBBOARD_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Read jobs from a JSON or CSV snapshot instead of the backend
    #[arg(long, value_name = "FILE")]
    jobs: Option<PathBuf>,

    /// Read applications from a JSON or CSV snapshot instead of the backend
    #[arg(long, value_name = "FILE")]
    applications: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Markdown)]
    format: Format,

    /// Write the report here instead of stdout
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Markdown,
    Json,
}

impl From<Format> for ReportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Markdown => ReportFormat::Markdown,
            Format::Json => ReportFormat::Json,
        }
    }
}

#[derive(Clone, Copy)]
enum Audience {
    Employer,
    Seeker,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn init_config() -> anyhow::Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);
    if path.exists() {
        bail!("{DEFAULT_CONFIG_FILE} already exists. Remove it first or edit it manually.");
    }
    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {DEFAULT_CONFIG_FILE}"))?;
    println!("Created {DEFAULT_CONFIG_FILE} with default settings.");
    Ok(())
}

fn snapshot_user() -> User {
    User {
        id: "snapshot".to_string(),
        name: "Snapshot".to_string(),
        email: String::new(),
        role: None,
    }
}

fn write_output(out: Option<&Path>, rendered: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Report written to {}.", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

async fn run_dashboard(
    audience: Audience,
    args: DashboardArgs,
    mut config: Config,
) -> anyhow::Result<()> {
    if let Some(api_url) = args.api_url {
        config.api.base_url = api_url;
    }
    if args.token.is_some() {
        config.api.token = args.token;
    }

    let settings = DashboardSettings::from(&config);
    let format = ReportFormat::from(args.format);
    let now = Local::now();

    let rendered = if args.jobs.is_some() || args.applications.is_some() {
        let source = SnapshotSource::from_paths(args.jobs.as_deref(), args.applications.as_deref())?;
        let ctx = ViewContext::new(Some(snapshot_user()));
        match audience {
            Audience::Employer => {
                let dashboard = dashboard::load_employer(&source, &ctx, &now, settings).await;
                report::render_employer(format, &ctx, &dashboard)?
            }
            Audience::Seeker => {
                let dashboard = dashboard::load_seeker(&source, &ctx, &now).await;
                report::render_seeker(format, &ctx, &dashboard)?
            }
        }
    } else {
        let mut client = ApiClient::new(&config.api)?;
        info!("Using backend at {}", config.api.base_url);

        let signed_in = match (args.email.as_deref(), args.password.as_deref()) {
            (Some(email), Some(password)) => {
                let response = client.login(email, password).await?;
                debug!("Login: {}", response.message);
                true
            }
            _ => false,
        };

        let user = client.current_user().await;
        if user.is_none() {
            warn!("Not signed in; the dashboard will be empty");
        }
        let ctx = ViewContext::new(user);

        let rendered = match audience {
            Audience::Employer => {
                let dashboard = dashboard::load_employer(&client, &ctx, &now, settings).await;
                report::render_employer(format, &ctx, &dashboard)
            }
            Audience::Seeker => {
                let dashboard = dashboard::load_seeker(&client, &ctx, &now).await;
                report::render_seeker(format, &ctx, &dashboard)
            }
        };

        // End the session this run opened; a passed-in token is left alone.
        if signed_in {
            match client.logout().await {
                Ok(response) => debug!("Logout: {}", response.message),
                Err(err) => warn!("Logout failed: {:#}", err),
            }
        }
        rendered?
    };

    write_output(args.out.as_deref(), &rendered)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::InitConfig = cli.command {
        return init_config();
    }

    init_logging(cli.verbose);
    let config = Config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::InitConfig => Ok(()),
        Commands::Employer(args) => run_dashboard(Audience::Employer, args, config).await,
        Commands::Seeker(args) => run_dashboard(Audience::Seeker, args, config).await,
    }
}
