//! Application entry point.

use clap::Parser;
use log::{error, info};
use winit::event_loop::{ControlFlow, EventLoop};

use egg_hunt::game::Level;
use egg_hunt::{App, Cli, GameConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Logger initialized");

    let cli = Cli::parse();
    let config = GameConfig::resolve(&cli).map_err(|e| {
        error!("{e}");
        e
    })?;

    let level = match &config.level {
        Some(path) => Level::load(path),
        None => Level::embedded(),
    }
    .map_err(|e| {
        error!("Failed to load level: {e}");
        e
    })?;
    info!("Level '{}' with {} eggs", level.name, level.eggs.len());

    let event_loop = EventLoop::new().map_err(|e| {
        error!("Failed to create event loop: {:?}", e);
        e
    })?;
    event_loop.set_control_flow(ControlFlow::Poll);

    // Start the main app loop
    let mut app = App::new(config, level);
    if let Err(e) = event_loop.run_app(&mut app) {
        error!("Application error: {:?}", e);
        return Err(Box::new(e));
    }

    match app.take_error() {
        Some(e) => Err(Box::new(e)),
        None => Ok(()),
    }
}
