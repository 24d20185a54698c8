// Evsync CLI
// Opens evdev nodes, runs per-device sessions and prints the posted events

#![cfg_attr(feature = "cli", allow(dead_code))]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
use evsync_core::config::{default_config_content, Config};
#[cfg(feature = "cli")]
use evsync_core::{DeviceSession, EventLoop, RecordingSink, SessionManager};

/// Default poll timeout when the config does not set one
const DEFAULT_POLL_TIMEOUT_MS: u64 = 100;

/// Evdev input normalization and dispatch
#[derive(Parser, Debug)]
#[command(name = "evsync")]
#[command(version)]
#[command(about = "Evdev input normalization and dispatch", long_about = None)]
struct Args {
    /// TOML configuration file (defaults to ~/.config/evsync/config.toml)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Only open the device with this name, path or node such as event3 (repeatable)
    #[arg(short, long = "device", value_name = "DEVICE")]
    devices: Vec<String>,

    /// Grab opened devices so their events do not reach other readers
    #[arg(short, long)]
    grab: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Validate config and exit
    #[arg(long)]
    check_config: bool,

    /// List available input devices
    #[arg(long)]
    list_devices: bool,

    /// Print a starter configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

/// Main application state
#[cfg(feature = "cli")]
struct Application {
    config: Config,
    args: Args,
    /// Flag to signal event loop to stop
    running: Arc<AtomicBool>,
}

/// Device filter precedence: CLI `--device` > config `[devices].only` > every device
fn resolve_device_filter(cli: &[String], config: &[String]) -> Vec<String> {
    if !cli.is_empty() {
        cli.to_vec()
    } else {
        config.to_vec()
    }
}

#[cfg(feature = "cli")]
impl Application {
    fn new(args: Args) -> Result<Self> {
        let config = match &args.config {
            Some(path) => {
                Config::from_file(path).with_context(|| format!("loading config {}", path.display()))?
            }
            None => Config::load_default().context("loading default config")?,
        };

        Ok(Self {
            config,
            args,
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    fn validate(&self) -> Result<()> {
        match self.config.source_path() {
            Some(path) => println!("Configuration {} is valid", path.display()),
            None => println!("No configuration file found, using defaults"),
        }
        println!(
            "  {} device rule(s), grab = {}, device filter = {:?}",
            self.config.rules.len(),
            self.config.grab,
            self.config.device_filter
        );
        for rule in &self.config.rules {
            println!("  [device.{}] match = {:?}", rule.label, rule.pattern.as_str());
        }
        Ok(())
    }

    fn list_devices() -> Result<()> {
        let devices = EventLoop::list_devices().context("finding input devices")?;
        println!("Found {} input device(s):", devices.len());
        for device in &devices {
            match &device.path {
                Some(path) => println!("  {}: {} ({})", device.index, device.name, path),
                None => println!("  {}: {}", device.index, device.name),
            }
        }
        Ok(())
    }

    fn install_signal_handler(&self) {
        use signal_hook::consts::{SIGINT, SIGTERM};
        use signal_hook::iterator::Signals;

        let running = self.running.clone();
        std::thread::spawn(move || {
            if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM]) {
                if let Some(signal) = signals.forever().next() {
                    log::info!("received signal {}, shutting down", signal);
                    running.store(false, Ordering::SeqCst);
                }
            }
        });
    }

    fn run(&self) -> Result<()> {
        self.install_signal_handler();

        let filter = resolve_device_filter(&self.args.devices, &self.config.device_filter);
        let grab = self.args.grab || self.config.grab;
        if !filter.is_empty() {
            log::info!("device filter active: {:?}", filter);
        }

        let mut event_loop = EventLoop::open(&filter, grab).context("opening input devices")?;
        let mut sessions = SessionManager::new();

        let mut rejected = Vec::new();
        for (index, opened) in event_loop.devices().iter().enumerate() {
            let path = opened.path.to_string_lossy();
            let options = self.config.session_options_for(opened.name(), &path);
            let session = DeviceSession::new(opened.caps.clone(), options);
            match session.kind() {
                Some(kind) => log::info!("{}: {} on {}", opened.name(), kind, path),
                None => log::info!("{}: unclassified device on {}", opened.name(), path),
            }
            if let Err(err) = sessions.attach(opened.rdev, session) {
                log::warn!("{}: {}", opened.name(), err);
                rejected.push(index);
            }
        }
        for index in rejected.into_iter().rev() {
            event_loop.remove(index);
        }

        println!("evsync is running on {} device(s). Press Ctrl+C to exit.", sessions.len());
        let result = self.run_main_loop(&mut event_loop, &mut sessions);
        event_loop.ungrab_all();
        result
    }

    fn run_main_loop(&self, event_loop: &mut EventLoop, sessions: &mut SessionManager) -> Result<()> {
        let timeout = self.config.poll_timeout_ms.unwrap_or(DEFAULT_POLL_TIMEOUT_MS);
        let timeout = i32::try_from(timeout).unwrap_or(i32::MAX);
        let mut sink = RecordingSink::new();

        while self.running.load(Ordering::SeqCst) && sessions.is_active() {
            let ready = event_loop.poll_ready(timeout).context("polling input devices")?;

            let mut dead = Vec::new();
            for index in ready {
                let Some(opened) = event_loop.device_mut(index) else {
                    continue;
                };
                let rdev = opened.rdev;
                let Some(session) = sessions.get_mut(rdev) else {
                    continue;
                };

                let result = opened.read(|event| session.process_event(&event, &mut sink));
                for event in sink.take() {
                    println!("{}: {}", session.name(), event);
                }

                match result {
                    Ok(_) => {}
                    Err(err) if err.is_retryable() => log::debug!("{}: {}", session.name(), err),
                    Err(err) => {
                        log::warn!("{}: {}, releasing device", session.name(), err);
                        dead.push((index, rdev));
                    }
                }
            }

            // Highest index first so earlier indices stay valid
            dead.sort_by(|a, b| b.0.cmp(&a.0));
            for (index, rdev) in dead {
                if let Err(err) = sessions.detach(rdev) {
                    log::warn!("{}", err);
                }
                event_loop.remove(index);
            }
        }

        if !sessions.is_active() {
            log::info!("no devices left, exiting");
        }
        Ok(())
    }
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    if args.print_default_config {
        print!("{}", default_config_content());
        return Ok(());
    }

    // Handle list-devices flag (doesn't require config)
    if args.list_devices {
        return Application::list_devices();
    }

    let app = Application::new(args)?;

    if app.args.check_config {
        return app.validate();
    }

    app.run()
}

// Stub for when the cli feature is not enabled
#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("Error: evsync binary requires the 'cli' feature to be enabled.");
    eprintln!("Please build with: cargo build --release --features cli --bin evsync");
    std::process::exit(1);
}
