//! Terminal UI for parkrelay that ranks zone vacancies and shows sensor occupancy.

mod app;
mod input;
mod settings;
mod ui;

use std::{fs::File, io, path::Path, sync::Arc, time::Duration as StdDuration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use parkrelay_core::service::ParkingService;
use parkrelay_provider_landscape as landscape;
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::input::Action;
use crate::settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::from_env()?;
    init_logging(&settings.log_path)?;

    // HTTP + service setup
    let client = landscape::client(settings.timeout)?;
    let config = landscape::config(&settings.api_key, settings.base_url.as_deref())
        .context("invalid upstream configuration")?;
    if !config.has_api_key() {
        warn!("PARKRELAY_API_KEY is not set, upstream requests will likely be rejected");
    }
    info!(base_url = %config.base_url(), cities = config.cities().len(), "starting parkrelay");

    let service = Arc::new(ParkingService::new(
        landscape::fetcher(client),
        Arc::new(config),
    ));

    // Sensor table is built in the background; readers wait on the store.
    let build = service.spawn_sensor_build();

    // App state
    let app = App::new(service);

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    build.abort();
    res
}

fn init_logging(path: &Path) -> Result<()> {
    // stdout belongs to the terminal UI
    let file = File::create(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Arc::new(file))
        .init();
    Ok(())
}

async fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    loop {
        // Pick up a finished background load, then draw
        app.poll_load().await;
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
        {
            let action = input::handle_key_event(key, &mut app);

            match action {
                Action::Quit => break,
                Action::None => {}
                Action::LoadSelectedCity => match app.selected_city.clone() {
                    Some(city) => app.start_load(&city),
                    None => app.error_message = Some("Select a city first".into()),
                },
            }
        }
    }

    Ok(())
}
