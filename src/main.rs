use anyhow::Result;
use console::style;
use log::{info, warn};
use scene_thumbnailer::component::ThumbnailSelector;
use scene_thumbnailer::config::ThumbnailSettings;
use scene_thumbnailer::init;
use scene_thumbnailer::signal::setup_shutdown_signal;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

fn main() -> Result<()> {
    init::init();
    let shutdown_signal = setup_shutdown_signal();

    if let Err(e) = run(shutdown_signal) {
        warn!("Program error: {e:#}");
        eprintln!("{} {:#}", style("錯誤:").red().bold(), e);
        std::process::exit(1);
    }

    info!("Program exited normally");
    Ok(())
}

fn run(shutdown_signal: Arc<AtomicBool>) -> Result<()> {
    let settings = ThumbnailSettings::load_or_default()?;
    ThumbnailSelector::new(settings, shutdown_signal).run()
}
