use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use fruit_map::app::App;
use clap::Parser;
use fruit_map::config::{CliArgs, Config};
use fruit_map::model::TreeRecord;
use fruit_map::{data, logging, ui};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tracing::{error, info};

fn main() -> Result<()> {
    let config = Config::try_from(CliArgs::parse())?;
    let _log_guard = logging::init(&config.log_path)?;

    let trees = match &config.trees_path {
        Some(path) => data::load_trees(path)?,
        None => data::sample_trees(),
    };
    info!(trees = trees.len(), selectable = config.selectable, "starting fruit map");

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal, config, trees);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    if let Err(err) = &result {
        error!(%err, "fruit map exited with an error");
    }
    result
}

/// Handle mouse events for panning, zooming and picking
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    // Always track mouse position for hover tooltips
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => app.press(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.release(mouse.column, mouse.row),
        _ => {}
    }
}

fn handle_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Esc => {
            if app.selected_tree.is_some() {
                app.close_detail();
            } else {
                app.quit();
            }
        }

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        KeyCode::Char('g') | KeyCode::Char('G') => app.toggle_grid(),
        KeyCode::Char('f') | KeyCode::Char('F') => app.toggle_season_filter(),
        KeyCode::Char('u') | KeyCode::Char('U') => app.toggle_location(),
        KeyCode::Char('c') | KeyCode::Char('C') => app.recenter(),
        KeyCode::Char('x') | KeyCode::Char('X') => app.clear_selection(),
        KeyCode::Char('r') | KeyCode::Char('R') => app.request_reload(),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, config: Config, trees: Vec<TreeRecord>) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::mount(config, trees.clone(), size.width as usize, size.height as usize);

    // Main loop
    loop {
        app.update(Instant::now());

        // Draw
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(&mut app, key.code),
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width as usize, height as usize),
                _ => {}
            }
        }

        // Manual reload: unmount and mount a fresh view
        if app.reload_requested {
            info!("reloading map");
            let config = app.config.clone();
            app.unmount();
            let size = terminal.size()?;
            app = App::mount(config, trees.clone(), size.width as usize, size.height as usize);
        }

        if app.should_quit {
            break;
        }
    }

    app.unmount();
    Ok(())
}
