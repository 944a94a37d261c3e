pub mod app;
pub mod renderer;
pub mod scene;
pub mod settings;

pub use app::{App, AppError};

use settings::RenderSettings;
use winit::event_loop::{ControlFlow, EventLoop};

/// Installs the `env_logger` backend at Info level; `RUST_LOG` overrides it.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}

pub fn run() -> Result<(), AppError> {
    init_logging();

    log::info!("Starting batched deferred renderer");

    let settings = RenderSettings::load();
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(settings);
    let result = event_loop.run_app(&mut app);

    if let Err(ref err) = result {
        log::error!("Application error: {}", err);
    }
    result?;

    log::info!("Application shutdown complete");

    app.into_result()
}
