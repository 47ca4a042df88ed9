//! hatari-wrapper - unpack, launch and automate the Hatari Atari ST emulator
//!
//! The wrapper ships emulator builds and TOS images, renders an
//! [`InstanceConfig`] into emulator options, starts the emulator and finds
//! the window it opened among all desktop windows, so that keystrokes can
//! be sent to it later.

pub mod core;
pub mod error;
pub mod platform;

pub use crate::core::{
    InstanceConfig, InstanceId, Launcher, LauncherSettings, MachineType, Memory, ScreenMode, Tos,
};
pub use crate::error::{AssetError, LaunchError, LaunchResult};
pub use crate::platform::{Key, KeyMode, OsType, WindowHandle, WindowId, WindowSystem};

/// Application name constant
pub const APP_NAME: &str = "hatari-wrapper";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
