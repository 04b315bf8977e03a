mod backend;
mod config;
mod error;
mod keys;
mod layout;
mod state;
mod window_set;
mod workspace;

use backend::{DisplayBackend, X11Backend};
use config::Config;
use simplelog::{
    ColorChoice, CombinedLogger, Config as LogConfig, LevelFilter, TermLogger, TerminalMode,
    WriteLogger,
};
use state::WindowManager;
use std::fs::File;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            LogConfig::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(
            LevelFilter::Info,
            LogConfig::default(),
            File::create("/tmp/xwm.log")?,
        ),
    ])?;

    let config = Config::load();

    let backend = match X11Backend::connect() {
        Ok(backend) => backend,
        Err(e) => {
            log::error!("{}", e);
            return Err(e.into());
        }
    };

    let mut wm_state = WindowManager::new(&config);
    let grabbed = backend.grab_keys(wm_state.bindings().grabs())?;
    log::info!("XWM STARTED with {} keybinds", grabbed);

    loop {
        let event = backend.next_event()?;
        wm_state.handle_event(&backend, event);
        log::debug!(
            "workspace {} clients {:?} focused {:?} ratio {:.2}",
            wm_state.current_workspace() + 1,
            wm_state.live().clients(),
            wm_state.live().focused_index(),
            wm_state.master_ratio()
        );
    }
}
