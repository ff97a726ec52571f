//! aamonitor CLI
//!
//! Command-line interface for the agent assist fleet monitor.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use aamonitor::prelude::*;
use aamonitor::config::LoggingConfig;
use aamonitor::tui::Dashboard;
use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// aamonitor - liveness dashboard for agent assist applications
#[derive(Parser)]
#[command(name = "aamonitor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "AAMONITOR_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (for commands that support it)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
    Table,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and keep the session for later commands
    Login {
        /// User name (prompted when omitted)
        #[arg(short, long, env = "AAMONITOR_USERNAME")]
        username: Option<String>,

        /// Password (prompted when omitted)
        #[arg(short, long, env = "AAMONITOR_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// End the session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Check the stored token with the backend
    Validate,

    /// List applications
    Apps {
        /// Include disabled and unassigned applications
        #[arg(long)]
        all: bool,
    },

    /// Probe every enabled application once
    Status,

    /// Show one application's info, status or logs
    App {
        /// Application id (`aid`)
        aid: i64,

        /// Detail to fetch: info, status or logs
        #[arg(default_value = "info")]
        resource: AppResource,
    },

    /// Launch the TUI dashboard
    Dashboard {
        /// Refresh rate in milliseconds
        #[arg(long)]
        refresh: Option<u64>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Shared collaborators, built once per invocation
struct Services {
    config: Config,
    session: SessionContext,
    client: ApiClient,
}

impl Services {
    fn new(config: Config) -> anyhow::Result<Self> {
        let session = SessionContext::from_config(&config.session)?;
        let client = ApiClient::new(&config.api)?;
        Ok(Self {
            config,
            session,
            client,
        })
    }

    fn auth(&self) -> AuthStore {
        AuthStore::new(self.client.clone(), self.session.clone())
    }

    fn directory(&self) -> ApplicationDirectory {
        ApplicationDirectory::new(self.client.clone(), self.session.clone())
    }

    fn probe(&self) -> HttpProbe {
        HttpProbe::new(self.client.clone(), self.session.clone())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    // Parse CLI arguments
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        generate_completions(shell);
        return ExitCode::SUCCESS;
    }

    // Load configuration
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // The dashboard owns the terminal, so its logs go to a file
    let to_file = matches!(cli.command, Commands::Dashboard { .. });
    let _guard = match init_logging(&config.logging, cli.verbose, to_file) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error initializing logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match Services::new(config) {
        Ok(ctx) => run(ctx, cli.command, cli.format).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", style("Error:").red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run(ctx: Services, command: Commands, format: OutputFormat) -> anyhow::Result<()> {
    match command {
        Commands::Login { username, password } => run_login(&ctx, username, password).await,
        Commands::Logout => run_logout(&ctx).await,
        Commands::Whoami => run_whoami(&ctx, format),
        Commands::Validate => run_validate(&ctx).await,
        Commands::Apps { all } => run_apps(&ctx, all, format).await,
        Commands::Status => run_status(&ctx, format).await,
        Commands::App { aid, resource } => run_app_detail(&ctx, aid, resource, format).await,
        Commands::Dashboard { refresh } => run_dashboard(ctx, refresh).await,
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    }
}

fn init_logging(config: &LoggingConfig, verbose: bool, to_file: bool) -> anyhow::Result<Option<WorkerGuard>> {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let json = config.format == "json";

    if to_file {
        let Some(dir) = config.log_dir() else {
            return Ok(None);
        };
        std::fs::create_dir_all(&dir).with_context(|| format!("creating log directory {}", dir.display()))?;
        let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "aamonitor.log"));
        let layer = fmt::layer().with_writer(writer).with_ansi(false);
        if json {
            tracing_subscriber::registry().with(filter).with(layer.json()).init();
        } else {
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        return Ok(Some(guard));
    }

    let layer = fmt::layer().with_writer(std::io::stderr);
    if json {
        tracing_subscriber::registry().with(filter).with(layer.json()).init();
    } else {
        tracing_subscriber::registry().with(filter).with(layer).init();
    }
    Ok(None)
}

fn spinner(message: &'static str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.magenta} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    Ok(pb)
}

async fn run_login(ctx: &Services, username: Option<String>, password: Option<String>) -> anyhow::Result<()> {
    let username = match username {
        Some(name) => name,
        None => dialoguer::Input::<String>::new()
            .with_prompt("User name")
            .interact_text()?,
    };
    let password = match password {
        Some(password) => password,
        None => dialoguer::Password::new().with_prompt("Password").interact()?,
    };

    let pb = spinner("Logging In...")?;
    let result = ctx.auth().login(&username, &password).await;
    pb.finish_and_clear();

    match result {
        Ok(outcome) => {
            let kind = outcome.user_type.map(|t| format!(" ({t})")).unwrap_or_default();
            println!("{} Logged in as {}{kind}", style("✓").green(), style(username.trim()).bold());
            Ok(())
        }
        Err(e) if e.reason == AuthFailure::InvalidCredentials => {
            Err(anyhow!("The user name or password you entered is invalid."))
        }
        Err(e) => Err(anyhow!(e).context("An error occurred while logging in.")),
    }
}

async fn run_logout(ctx: &Services) -> anyhow::Result<()> {
    let auth = ctx.auth();
    if !auth.is_authenticated() {
        println!("Not logged in");
        return Ok(());
    }
    auth.logout().await?;
    println!("{} Logged out", style("✓").green());
    Ok(())
}

fn run_whoami(ctx: &Services, format: OutputFormat) -> anyhow::Result<()> {
    let Some(session) = ctx.session.current() else {
        return Err(anyhow!("Not logged in, run `aamonitor login` first"));
    };

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&session.user)?);
        return Ok(());
    }

    let user = &session.user;
    println!("User:      {}", user.user_name.as_deref().unwrap_or("-"));
    println!(
        "User id:   {}",
        user.user_id.map_or_else(|| "-".to_string(), |id| id.to_string())
    );
    println!(
        "User type: {}",
        user.user_type.as_ref().map_or_else(|| "-".to_string(), ToString::to_string)
    );
    if let Some(cid) = &user.cid {
        println!("Company:   {cid}");
    }
    Ok(())
}

async fn run_validate(ctx: &Services) -> anyhow::Result<()> {
    let auth = ctx.auth();
    if !auth.is_authenticated() {
        return Err(anyhow!("Not logged in, run `aamonitor login` first"));
    }
    if auth.validate().await? {
        println!("{} Session is valid", style("✓").green());
        Ok(())
    } else {
        Err(anyhow!("Session is no longer valid, log in again"))
    }
}

async fn fetch_applications(ctx: &Services) -> anyhow::Result<Vec<Application>> {
    let pb = spinner("Retrieving applications...")?;
    let result = ctx.directory().list_applications().await;
    pb.finish_and_clear();

    match result {
        Ok(applications) => Ok(applications),
        Err(e) if e.is_unauthorized() => Err(anyhow!(e).context("Not logged in or session expired")),
        Err(e) => Err(anyhow!(e).context("Retrieving applications failed")),
    }
}

fn endpoint(app: &Application) -> String {
    match (&app.ip, app.rest_port) {
        (Some(ip), Some(port)) => format!("{ip}:{port}"),
        (Some(ip), None) => ip.clone(),
        _ => "-".to_string(),
    }
}

async fn run_apps(ctx: &Services, all: bool, format: OutputFormat) -> anyhow::Result<()> {
    let applications: Vec<Application> = fetch_applications(ctx)
        .await?
        .into_iter()
        .filter(|app| all || app.is_monitored())
        .collect();

    if applications.is_empty() {
        println!("No applications available");
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&applications)?),
        OutputFormat::Table => {
            println!(
                "{:<6} {:<28} {:<22} {:<10} {:<8} {}",
                "AID", "NAME", "ENDPOINT", "VERSION", "ENABLED", "COMPANY"
            );
            for app in &applications {
                println!(
                    "{:<6} {:<28} {:<22} {:<10} {:<8} {}",
                    app.id,
                    app.display_name(),
                    endpoint(app),
                    app.version.as_deref().unwrap_or("-"),
                    if app.enabled { "yes" } else { "no" },
                    app.cname.as_deref().unwrap_or("-"),
                );
            }
        }
        OutputFormat::Text => {
            for app in &applications {
                let marker = if app.enabled { style("●").cyan() } else { style("○").dim() };
                println!("{marker} {} [{}] {}", app.display_name(), app.id, style(endpoint(app)).dim());
            }
        }
    }
    Ok(())
}

async fn run_status(ctx: &Services, format: OutputFormat) -> anyhow::Result<()> {
    let applications = fetch_applications(ctx).await?;

    let pb = spinner("Checking liveness...")?;
    let reports = aamonitor::monitor::probe_all(&ctx.probe(), &applications, ctx.config.monitor.probe_timeout).await;
    pb.finish_and_clear();

    let statuses = StatusAggregator::new();
    for report in &reports {
        statuses.report_status(report.id, report.live);
    }
    let summary = statuses.summary(&applications);
    info!(total = summary.total, active = summary.active, inactive = summary.inactive, "Status check finished");

    if format == OutputFormat::Json {
        let apps: Vec<_> = applications
            .iter()
            .filter(|app| app.is_monitored())
            .map(|app| {
                serde_json::json!({
                    "aid": app.id,
                    "name": app.display_name(),
                    "live": statuses.status_of(app.id).unwrap_or(false),
                })
            })
            .collect();
        let body = serde_json::json!({
            "applications": apps,
            "all": summary.total,
            "active": summary.active,
            "inactive": summary.inactive,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    if applications.is_empty() {
        println!("No Apps found");
    }
    for app in applications.iter().filter(|app| app.is_monitored()) {
        let live = statuses.status_of(app.id).unwrap_or(false);
        let (marker, label) = if live {
            (style("●").green(), style("live").green())
        } else {
            (style("●").red(), style("down").red())
        };
        if format == OutputFormat::Table {
            println!("{marker} {:<6} {:<28} {:<22} {label}", app.id, app.display_name(), endpoint(app));
        } else {
            println!("{marker} {} {label}", app.display_name());
        }
    }
    println!();
    println!(
        "All {}  {} {}  {} {}",
        summary.total,
        style("▲ Active").green(),
        summary.active,
        style("▼ Inactive").red(),
        summary.inactive
    );
    Ok(())
}

async fn run_app_detail(ctx: &Services, aid: i64, resource: AppResource, format: OutputFormat) -> anyhow::Result<()> {
    let applications = fetch_applications(ctx).await?;
    let app = applications
        .iter()
        .find(|app| app.id == ApplicationId(aid))
        .ok_or_else(|| anyhow!("No application with aid {aid}"))?;

    let pb = spinner("Querying application...")?;
    let result = ctx.directory().application_detail(app, resource).await;
    pb.finish_and_clear();

    let detail = match result {
        Ok(detail) => detail,
        Err(e) if e.is_unauthorized() => return Err(anyhow!(e).context("Not logged in or session expired")),
        Err(e) => return Err(anyhow!(e).context(format!("Retrieving {resource} for {} failed", app.display_name()))),
    };

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string(&detail)?);
        return Ok(());
    }
    println!(
        "{} {} [{}] {}",
        style(resource).bold(),
        app.display_name(),
        app.id,
        style(endpoint(app)).dim()
    );
    println!("{}", serde_json::to_string_pretty(&detail)?);
    Ok(())
}

async fn run_dashboard(mut ctx: Services, refresh: Option<u64>) -> anyhow::Result<()> {
    if let Some(refresh) = refresh {
        ctx.config.tui.refresh_rate_ms = refresh;
    }
    info!(refresh_ms = ctx.config.tui.refresh_rate_ms, "Starting TUI dashboard");

    let probe: Arc<dyn LivenessProbe> = Arc::new(ctx.probe());
    let dashboard = Dashboard::new(
        ctx.auth(),
        ctx.directory(),
        probe,
        ctx.config.monitor.clone(),
        ctx.config.tui.clone(),
    );
    dashboard.run().await?;
    Ok(())
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "aamonitor", &mut io::stdout());
}
