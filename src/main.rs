use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::Runtime;
use tracing::info;

use govwatch::api::HttpApi;
use govwatch::app::App;
use govwatch::config::Settings;
use govwatch::data::format::parse_duration;
use govwatch::events;
use govwatch::logging::{self, LogTarget};
use govwatch::ui::{self, Theme};

#[derive(Parser, Debug)]
#[command(name = "govwatch")]
#[command(about = "Terminal dashboard for a bandwidth governor and its host's network interfaces")]
struct Args {
    /// Governor server base URL (overrides the config file)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Path to a TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write logs to this file (the TUI owns the terminal)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Default log level when GOVWATCH_LOG is unset
    #[arg(long)]
    log_level: Option<String>,

    /// UI refresh tick (e.g., "100ms", "1s")
    #[arg(short, long, default_value = "100ms")]
    tick: String,

    /// Force the light or dark theme instead of detecting it
    #[arg(long, value_parser = ["light", "dark"])]
    theme: Option<String>,

    /// Fetch everything once, export it to a JSON file and exit
    #[arg(short = 'x', long)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(endpoint) = args.endpoint {
        settings.endpoint = endpoint;
    }
    if let Some(file) = args.log_file {
        settings.logging.file = Some(file);
    }
    if let Some(level) = args.log_level {
        settings.logging.level = level;
    }
    let tick = parse_duration(&args.tick)
        .with_context(|| format!("invalid --tick '{}'", args.tick))?;

    let target = match (&args.export, &settings.logging.file) {
        (_, Some(path)) => LogTarget::File(path),
        (Some(_), None) => LogTarget::Stderr,
        (None, None) => LogTarget::Discard,
    };
    logging::init(target, &settings.logging.level)?;

    let rt = Runtime::new()?;
    let _guard = rt.enter();

    let api = Arc::new(
        HttpApi::builder()
            .endpoint(settings.endpoint.clone())
            .timeout(settings.request_timeout())
            .build()?,
    );

    let theme = match args.theme.as_deref() {
        Some("light") => Theme::light(),
        Some("dark") => Theme::dark(),
        _ => Theme::auto_detect(),
    };
    let mut app = App::new(api.clone(), api, &settings, theme);

    // Handle export mode (non-interactive)
    if let Some(export_path) = args.export {
        return export_to_file(&rt, &mut app, &export_path);
    }

    println!("Connecting to {}...", settings.endpoint);
    rt.block_on(app.boot());

    run_tui(&rt, &mut app, tick)
}

/// Run the TUI until the user quits
fn run_tui(rt: &Runtime, app: &mut App, tick: Duration) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    let size = terminal.size()?;
    app.resize(size.width, size.height);

    // Run the main loop
    let result = run_app(rt, &mut terminal, app, tick);
    app.destroy();
    info!("shutting down");

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    rt: &Runtime,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    tick: Duration,
) -> Result<()> {
    while app.running {
        // Apply whatever the poll tasks reported since the last frame
        app.pump();

        terminal.draw(|frame| ui::draw(frame, app))?;

        let Some(event) = events::poll_event(tick)? else {
            continue;
        };
        let command = match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                events::handle_key_event(app, key)
            }
            Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
            Event::Resize(width, height) => {
                app.resize(width, height);
                None
            }
            _ => None,
        };
        if let Some(command) = command {
            rt.block_on(app.execute(command));
        }
    }

    Ok(())
}

/// Boot every module once, export the reconciled state and exit
fn export_to_file(rt: &Runtime, app: &mut App, export_path: &Path) -> Result<()> {
    rt.block_on(app.boot());
    app.pump();
    app.export_state(export_path)?;
    app.destroy();

    println!("Exported governor state to: {}", export_path.display());
    Ok(())
}
