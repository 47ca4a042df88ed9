//! hatari-wrapper - start the Hatari emulator from the command line
//!
//! Unpacks the bundled emulator and a TOS image into the work directory,
//! launches one emulator instance, optionally types into it and waits until
//! it is closed.
//!
//! # Usage
//!
//! ```bash
//! hatari-wrapper --resources ./resources
//! hatari-wrapper --machine st --memory 512 --tos tos100 --payload game.zip
//! hatari-wrapper --mode high --no-sound --type "GFABASIC.PRG\n"
//! ```

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hatari_wrapper::{
    InstanceConfig, InstanceId, Key, Launcher, LauncherSettings, MachineType, Memory, ScreenMode,
    Tos, APP_NAME, APP_VERSION,
};

#[derive(Parser)]
#[command(name = "hatari-wrapper")]
#[command(author, version, about = "Unpack, launch and automate the Hatari Atari ST emulator")]
struct Args {
    /// Directory the emulator is unpacked to and run from
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Directory with the bundled emulator archives, TOS images and templates
    #[arg(long)]
    resources: Option<PathBuf>,

    /// JSON settings file
    #[arg(long)]
    settings: Option<PathBuf>,

    // === Machine ===
    /// Machine type: st, megast or ste
    #[arg(long, default_value = "ste")]
    machine: MachineType,

    /// Memory size in KB (512, 1024, 2048, 4096, 8192) or with suffix ("4mb")
    #[arg(long, default_value = "1024")]
    memory: Memory,

    /// Screen mode: low, med or high
    #[arg(long, default_value = "low")]
    mode: ScreenMode,

    /// TOS image (default: EmuTOS matching the system language)
    #[arg(long)]
    tos: Option<Tos>,

    // === Emulator toggles ===
    #[arg(long)]
    fullscreen: bool,

    /// Run as fast as possible instead of at ST speed
    #[arg(long)]
    full_speed: bool,

    #[arg(long)]
    fast_boot: bool,

    #[arg(long)]
    no_sound: bool,

    #[arg(long)]
    no_blitter: bool,

    #[arg(long)]
    no_statusbar: bool,

    // === Startup ===
    /// Memory snapshot to restore
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Program or zip archive to put on drive C:
    #[arg(long)]
    payload: Option<PathBuf>,

    /// Text to type once the emulator window is up ("\n" presses Return)
    #[arg(long = "type")]
    type_text: Option<String>,

    /// Shortcut to press once the window is up, e.g. "altgr+l"
    #[arg(long)]
    shortcut: Option<String>,
}

impl Args {
    fn settings(&self) -> Result<LauncherSettings> {
        let mut settings = match &self.settings {
            Some(path) => LauncherSettings::load(path)?,
            None => LauncherSettings::default(),
        };
        if let Some(dir) = &self.work_dir {
            settings.work_directory = Some(dir.clone());
        }
        if let Some(dir) = &self.resources {
            settings.resources_directory = Some(dir.clone());
        }
        settings.validate();
        Ok(settings)
    }

    fn config(&self, tos: Tos) -> InstanceConfig {
        InstanceConfig::default()
            .with_machine(self.machine)
            .with_memory(self.memory)
            .with_screen_mode(self.mode)
            .with_tos(tos)
            .with_windowed(!self.fullscreen)
            .with_full_speed(self.full_speed)
            .with_fast_boot(self.fast_boot)
            .with_sound(!self.no_sound)
            .with_blitter(!self.no_blitter)
            .with_status_bar(!self.no_statusbar)
    }
}

fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    let args = Args::parse();
    info!("{} v{} starting...", APP_NAME, APP_VERSION);

    let shortcut = args
        .shortcut
        .as_deref()
        .map(Key::parse_combo)
        .transpose()
        .context("Invalid shortcut")?;

    let settings = args.settings()?;
    let tos = args.tos.unwrap_or_else(Tos::for_locale);
    let config = args.config(tos);

    let launcher = Launcher::new(settings);
    info!("Using the {} window system", launcher.window_system().name());
    let executable = launcher.prepare(tos)?;
    info!("Emulator ready at {:?} with {}", executable, tos);

    let id = InstanceId::new("demo");
    let window = launcher.launch(&id, &config, args.snapshot.as_deref(), args.payload.as_deref())?;
    match &window {
        Some(window) => info!("Emulator window {} '{}'", window.id, window.title),
        None => warn!("Emulator window could not be verified, keystrokes are unavailable"),
    }

    if let Some(text) = &args.type_text {
        let text = text.replace("\\n", "\n");
        if let Err(e) = launcher.type_text(&id, &text) {
            warn!("Failed to type text: {}", e);
        }
    }
    if let Some(keys) = &shortcut {
        if let Err(e) = launcher.press_keys_together(&id, keys) {
            warn!("Failed to press shortcut: {}", e);
        }
    }

    info!("Waiting for the emulator to exit");
    while launcher.is_running(&id) {
        thread::sleep(Duration::from_millis(500));
    }

    launcher.stop_all()?;
    info!("{} shutting down", APP_NAME);
    Ok(())
}

/// Initialize the logging system
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hatari_wrapper=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
