//! Platform-specific window enumeration, focus and keystroke injection

#[cfg(windows)]
pub mod windows;

#[cfg(all(unix, not(target_os = "macos")))]
pub mod x11;

mod keys;

pub use keys::{Key, KeyMode, ParseKeyError};

use std::fmt;
use std::hash::{Hash, Hasher};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Operating system families the wrapper knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OsType {
    Windows,
    MacOs,
    Linux,
    Other,
}

impl OsType {
    /// Detect the operating system this binary runs on
    pub fn current() -> Self {
        Self::from_name(std::env::consts::OS)
    }

    /// Classify an OS name such as `std::env::consts::OS`
    pub fn from_name(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("mac") || name.contains("darwin") {
            Self::MacOs
        } else if name.contains("win") {
            Self::Windows
        } else if name.contains("nux") {
            Self::Linux
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Windows => "Windows",
            Self::MacOs => "MacOS",
            Self::Linux => "Linux",
            Self::Other => "Other",
        };
        f.write_str(name)
    }
}

/// Native window identifier (HWND on Windows, XID on X11)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A top-level desktop window with the title seen when it was enumerated.
///
/// Two handles are equal when they refer to the same native window; titles
/// are not unique and may change.
#[derive(Debug, Clone)]
pub struct WindowHandle {
    pub id: WindowId,
    pub title: String,
}

impl WindowHandle {
    pub fn new(id: WindowId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

impl PartialEq for WindowHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for WindowHandle {}

impl Hash for WindowHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Access to the desktop's window list and to synthetic input
pub trait WindowSystem: Send + Sync {
    /// Short name used in log output
    fn name(&self) -> &'static str;

    /// False when this platform offers no way to list windows
    fn can_enumerate(&self) -> bool {
        true
    }

    /// All currently open top-level windows
    fn list_windows(&self) -> Result<Vec<WindowHandle>>;

    /// Bring a window to the foreground and give it keyboard focus
    fn raise(&self, window: &WindowHandle) -> Result<()>;

    /// Send keys to a window that has already been raised
    fn send_keys(&self, window: &WindowHandle, keys: &[Key], mode: KeyMode) -> Result<()>;
}

/// Fallback for platforms without a window enumeration API
#[derive(Debug, Default, Clone, Copy)]
pub struct NoWindowSystem;

impl WindowSystem for NoWindowSystem {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn can_enumerate(&self) -> bool {
        false
    }

    fn list_windows(&self) -> Result<Vec<WindowHandle>> {
        Ok(Vec::new())
    }

    fn raise(&self, window: &WindowHandle) -> Result<()> {
        anyhow::bail!("Cannot raise window {} on this platform", window.id)
    }

    fn send_keys(&self, window: &WindowHandle, _keys: &[Key], _mode: KeyMode) -> Result<()> {
        anyhow::bail!("Cannot send keys to window {} on this platform", window.id)
    }
}

/// Select the window system for the current platform
pub fn detect_window_system() -> Box<dyn WindowSystem> {
    #[cfg(windows)]
    {
        Box::new(windows::Win32Windows)
    }
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        match x11::X11Windows::connect() {
            Ok(x11) => {
                tracing::info!("Connected to X11 display");
                Box::new(x11)
            }
            Err(e) => {
                tracing::warn!("X11 not available, window matching disabled: {:#}", e);
                Box::new(NoWindowSystem)
            }
        }
    }
    #[cfg(not(any(windows, all(unix, not(target_os = "macos")))))]
    {
        Box::new(NoWindowSystem)
    }
}
