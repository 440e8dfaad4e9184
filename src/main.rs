//! ecs-scope - A read-only terminal dashboard for AWS ECS clusters.
//!
//! Shows every cluster of an account with CPU and memory meters, and the
//! services, tasks and container instances of the selected cluster. Data is
//! fetched once and kept until the user asks for a refresh.

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, widgets::Paragraph, Terminal};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use ecs_scope::app::{App, DetailPage};
use ecs_scope::aws::EcsClient;
use ecs_scope::cache::InventoryCache;
use ecs_scope::client::InventoryClient;
use ecs_scope::config::Config;
use ecs_scope::error::{InventoryError, CREDENTIALS_HINT};
use ecs_scope::{logging, ui};

/// Read-only terminal dashboard for AWS ECS clusters.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// AWS region, overrides the config file
    #[arg(long)]
    region: Option<String>,

    /// AWS profile, overrides the config file
    #[arg(long)]
    profile: Option<String>,

    /// Config file to use instead of ~/.ecs-scope/config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log file, overrides the config file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Application entry point.
///
/// Loads configuration, installs logging, then runs the dashboard. The
/// terminal is restored before any error is reported. A failed inventory
/// fetch ends the process with status 1.
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if args.region.is_some() {
        config.aws.region = args.region;
    }
    if args.profile.is_some() {
        config.aws.profile = args.profile;
    }

    let log_path = match args.log_file {
        Some(path) => path,
        None => config.log_file_path()?,
    };
    logging::init(&log_path, &config.logging.level)?;
    info!(version = env!("CARGO_PKG_VERSION"), log = ?log_path, "starting");

    let client = EcsClient::new(config.aws.region.clone(), config.aws.profile.clone()).await;
    info!(
        region = client.region().unwrap_or("default"),
        profile = config.aws.profile.as_deref().unwrap_or("default"),
        "using AWS account"
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run(&mut terminal, client, config).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!(error = %format!("{err:#}"), "exiting on error");
        match err.downcast_ref::<InventoryError>() {
            Some(inventory) => {
                eprintln!("{CREDENTIALS_HINT}");
                eprintln!("{inventory}");
            }
            None => eprintln!("Error: {err:?}"),
        }
        std::process::exit(1);
    }

    info!("exiting");
    Ok(())
}

/// Performs the initial load and hands over to the event loop.
async fn run<B, C>(terminal: &mut Terminal<B>, client: C, config: Config) -> Result<()>
where
    B: ratatui::backend::Backend,
    C: InventoryClient,
{
    terminal.draw(|f| f.render_widget(Paragraph::new("Loading clusters..."), f.area()))?;

    let mut app = App::new(InventoryCache::new(client), config).await?;
    run_app(terminal, &mut app).await
}

/// Runs the main application event loop until the user quits.
///
/// # Event Handling
/// - `1`/`2`/`3` switch the detail page
/// - `Tab` moves focus between the cluster table and the detail page
/// - `↑↓`/`jk` move within the focused table
/// - `r` refreshes the selected cluster
/// - `q`/`Esc` quit
///
/// # Errors
/// Returns drawing and input errors, and any failed inventory fetch.
async fn run_app<B, C>(terminal: &mut Terminal<B>, app: &mut App<C>) -> Result<()>
where
    B: ratatui::backend::Backend,
    C: InventoryClient,
{
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
            KeyCode::Char('1') => app.set_page(DetailPage::Services).await,
            KeyCode::Char('2') => app.set_page(DetailPage::Tasks).await,
            KeyCode::Char('3') => app.set_page(DetailPage::Instances).await,
            KeyCode::Tab => app.toggle_focus(),
            KeyCode::Up | KeyCode::Char('k') => app.previous().await?,
            KeyCode::Down | KeyCode::Char('j') => app.next().await?,
            KeyCode::Char('r') => app.refresh().await?,
            _ => {}
        }
    }
}
