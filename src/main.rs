//! gh-inbox keeps a local snapshot of your GitHub notifications and applies
//! rules to them.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐  fetch()  ┌──────────┐  apply()  ┌──────────┐
//! │ remote/  │ ────────► │ manager  │ ────────► │  rules/  │ ──► actors/
//! │ (HTTP)   │           │ (state)  │           │ (engine) │
//! └──────────┘           └──────────┘           └──────────┘
//!                          ▲      │ save()
//!                 read()   │      ▼
//!                        ┌──────────┐
//!                        │  cache   │
//!                        └──────────┘
//! ```
//!
//! * **`notifications/`**: the data model, collection algebra, and `sync`.
//! * **`cache`**: the expiring on-disk snapshot.
//! * **`remote/`**: HTTP caller, retry policy, paginating client.
//! * **`manager`**: one run: load, refresh if due, apply, save.
//! * **`rules/`**: filters and the rule engine.
//! * **`actors/`**: the side effects rules can trigger.
//! * **`app`**, **`ui`**, **`input`**: the interactive `list` view.
//! * **`main`**: wires everything together: parse args, set up logging,
//!   and run the chosen command.

mod actors;
mod app;
mod cache;
mod config;
mod error;
mod input;
mod manager;
mod notifications;
mod remote;
mod rules;
mod ui;

use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use actors::Registry;
use app::App;
use cache::FileCache;
use config::Config;
use manager::{Manager, RefreshStrategy};
use remote::{Client, HttpCaller, Retry};
use rules::Engine;

// ---------------------------------------------------------------------------
// CLI args
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "gh-inbox", version, about = "Rule-driven GitHub notifications")]
struct Cli {
    /// Path to the YAML config file.
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// GitHub API token.
    #[arg(long, global = true, env = "GH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Refresh from the API even if the cache is fresh.
    #[arg(long, global = true, conflicts_with = "no_refresh")]
    refresh: bool,

    /// Use the cache even if it has expired.
    #[arg(long, global = true)]
    no_refresh: bool,

    /// More logging; repeat for more.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Apply the configured rules (default).
    Sync {
        /// Print what would run without calling any action.
        #[arg(long)]
        noop: bool,
    },
    /// Browse notifications interactively.
    List,
    /// Print the effective config.
    Config {
        /// Print the default config instead.
        #[arg(long)]
        init: bool,
    },
}

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Enters raw mode + alternate screen on construction and restores the
/// terminal on [`Drop`], including during unwinding.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before the panic message is printed.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .init();
}

fn token(cli: &Cli) -> Result<String> {
    if let Some(token) = &cli.token {
        return Ok(token.clone());
    }
    match std::env::var("GITHUB_TOKEN") {
        Ok(token) if !token.is_empty() => Ok(token),
        _ => bail!("no API token: pass --token or set GH_TOKEN / GITHUB_TOKEN"),
    }
}

/// Build the HTTP stack, actors, and manager, then load the working set.
fn connect(cli: &Cli, config: &Config) -> Result<(Manager, Registry)> {
    let caller = HttpCaller::new(&token(cli)?, config.http.timeout())
        .context("building HTTP client")?;
    let retry = Retry {
        backoff: config.http.backoff(),
        ..Retry::default()
    };
    let client = Rc::new(Client::new(Box::new(caller), config.endpoint.clone()).with_retry(retry));
    let actors = actors::registry(client.clone());
    let cache = FileCache::new(&config.cache.path, config.ttl_in_hours());
    tracing::debug!(path = %cache.path().display(), "using cache");

    let mut manager = Manager::new(
        Box::new(cache),
        Box::new(client),
        RefreshStrategy::from_flags(cli.refresh, cli.no_refresh),
    );
    manager.load().context("fetching notifications")?;

    Ok((manager, actors))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path)?;

    match cli.command.clone().unwrap_or(Command::Sync { noop: false }) {
        Command::Config { init: true } => {
            print!("{}", Config::default().to_yaml().context("serializing config")?);
        }
        Command::Config { init: false } => {
            println!("Config sourced from: {}\n", config_path.display());
            print!("{}", config.to_yaml().context("serializing config")?);
        }
        Command::Sync { noop } => {
            let (mut manager, actors) = connect(&cli, &config)?;
            let engine = Engine::new(&config.rules, &actors).dry_run(noop);
            let summary = manager.apply(&engine, &mut io::stdout());
            tracing::info!(
                ran = summary.ran,
                skipped = summary.skipped,
                dry_run = summary.dry_run,
                unresolved = summary.unresolved,
                left = manager.notifications().len(),
                "rules applied"
            );
            if summary.failed > 0 {
                tracing::warn!(
                    failed = summary.failed,
                    of = summary.invocations(),
                    "some actions failed"
                );
            }
            manager.persist();
        }
        Command::List => {
            let (mut manager, actors) = connect(&cli, &config)?;
            let result = run_list(&mut manager, &actors);
            manager.persist();
            result?;
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Interactive list
// ---------------------------------------------------------------------------

fn run_list(manager: &mut Manager, actors: &Registry) -> Result<()> {
    install_panic_hook();

    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(manager.take());

    // Each iteration: render, poll for a key (up to the tick), then run any
    // action the key requested.
    let tick_rate = Duration::from_millis(100);
    let result = (|| -> Result<()> {
        loop {
            guard.terminal.draw(|f| ui::draw(&mut app, f))?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    input::handle_key_event(&mut app, key);
                }
            }

            if let Some(action) = app.take_request() {
                app.run_on_selected(action, actors);
            }

            if app.quit {
                return Ok(());
            }
        }
    })();

    // Hand the collection back even on error so progress is saved.
    manager.replace(app.into_notifications());
    result
}
