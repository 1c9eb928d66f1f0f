use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::bounded;
use std::path::PathBuf;
use videowall_core::{Automation, Config, EventLoop, RecordingAutomation, SerialService};

#[cfg(windows)]
mod uia;

/// Listens for button presses from the Arduino panel and drives the video
/// wall player and the Extron matrix switcher program.
#[derive(Parser, Debug)]
#[command(name = "videowall", version, about)]
struct Cli {
    /// Config file (defaults to <config dir>/videowall-io/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port, overriding the config file
    #[arg(short, long)]
    port: Option<String>,

    /// Log the automation calls instead of performing them
    #[arg(long)]
    dry_run: bool,

    /// List serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Write the built-in defaults to the config file and exit
    #[arg(long)]
    write_default_config: bool,
}

fn main() -> Result<()> {
    // RUST_LOG=debug for every ignored byte and automation step
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    if cli.list_ports {
        let ports = SerialService::list_ports();
        if ports.is_empty() {
            println!("no serial ports found");
        }
        for port in ports {
            println!("{port}");
        }
        return Ok(());
    }

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path().context("no config directory on this system, pass --config")?,
    };

    if cli.write_default_config {
        Config::default()
            .save(&config_path)
            .with_context(|| format!("writing {}", config_path.display()))?;
        log::info!("wrote default config to {}", config_path.display());
        return Ok(());
    }

    let mut config = Config::load(&config_path)?;
    if let Some(port) = cli.port {
        config.serial.port_name = port;
    }

    let service = SerialService::open(config.serial.clone())
        .with_context(|| format!("opening serial port {}", config.serial.port_name))?;
    let automation = connect_automation(&config, cli.dry_run)?;
    log::info!("Serial and automation connections successful, running Video Wall I/O");

    let (stop_tx, stop_rx) = bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })
    .context("installing Ctrl-C handler")?;

    let mut event_loop = EventLoop::new(automation, config.bindings.clone());
    let result = event_loop.run(service.events(), &stop_rx);
    service.close();

    let summary = result?;
    log::info!(
        "stopped after {} bytes: {} actions, {} ignored",
        summary.bytes,
        summary.actions,
        summary.ignored
    );
    Ok(())
}

fn connect_automation(config: &Config, dry_run: bool) -> Result<Box<dyn Automation>> {
    if dry_run {
        log::info!("dry run: automation calls are only logged");
        return Ok(Box::new(RecordingAutomation::new()));
    }
    connect_desktop(config)
}

#[cfg(windows)]
fn connect_desktop(config: &Config) -> Result<Box<dyn Automation>> {
    let automation = uia::UiaAutomation::connect(config).context("attaching to the player and switcher")?;
    Ok(Box::new(automation))
}

#[cfg(not(windows))]
fn connect_desktop(_config: &Config) -> Result<Box<dyn Automation>> {
    anyhow::bail!("UI Automation needs Windows; use --dry-run to exercise the panel elsewhere")
}
