//! Instance configuration - runtime settings for one emulator run

use serde::{Deserialize, Serialize};
use std::fmt;

use super::machine::{MachineType, Memory, ScreenMode, Tos};

/// Caller-chosen label of an emulator instance, e.g. "testing" or "building"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub String);

impl InstanceId {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for InstanceId {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Emulator runtime options for one instance.
///
/// The defaults describe the system most likely used for running and
/// testing games: STE, 1 MB, ST low, TOS 2.06, sound, blitter and status
/// bar enabled, no fast boot, accurate speed, windowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    /// Run in a window instead of fullscreen
    pub windowed: bool,
    /// Run at full host speed instead of accurate emulation speed
    pub full_speed: bool,
    /// Cut the boot memory check short
    pub fast_boot: bool,
    pub use_blitter: bool,
    pub use_sound: bool,
    /// Status bar at the lower window border
    pub use_status_bar: bool,
    pub machine: MachineType,
    pub tos: Tos,
    pub screen_mode: ScreenMode,
    pub memory: Memory,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            windowed: true,
            full_speed: false,
            fast_boot: false,
            use_blitter: true,
            use_sound: true,
            use_status_bar: true,
            machine: MachineType::Ste,
            tos: Tos::Tos206,
            screen_mode: ScreenMode::Low,
            memory: Memory::Mb1,
        }
    }
}

impl InstanceConfig {
    /// Settings for running the compiled program under test
    pub fn testing() -> Self {
        Self::default()
    }

    /// Settings for running development tools (editor, compiler):
    /// 4 MB, monochrome high resolution, silent, as fast as possible
    pub fn building() -> Self {
        Self {
            fast_boot: true,
            full_speed: true,
            use_sound: false,
            screen_mode: ScreenMode::High,
            memory: Memory::Mb4,
            ..Self::default()
        }
    }

    /// Defaults of the given machine: its stock TOS, memory and blitter
    pub fn for_machine(machine: MachineType) -> Self {
        Self {
            machine,
            tos: machine.default_tos(),
            memory: machine.default_memory(),
            use_blitter: machine.has_blitter(),
            ..Self::default()
        }
    }

    pub fn with_machine(mut self, machine: MachineType) -> Self {
        self.machine = machine;
        self
    }

    pub fn with_tos(mut self, tos: Tos) -> Self {
        self.tos = tos;
        self
    }

    pub fn with_screen_mode(mut self, mode: ScreenMode) -> Self {
        self.screen_mode = mode;
        self
    }

    pub fn with_memory(mut self, memory: Memory) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_windowed(mut self, windowed: bool) -> Self {
        self.windowed = windowed;
        self
    }

    pub fn with_full_speed(mut self, full_speed: bool) -> Self {
        self.full_speed = full_speed;
        self
    }

    pub fn with_fast_boot(mut self, fast_boot: bool) -> Self {
        self.fast_boot = fast_boot;
        self
    }

    pub fn with_blitter(mut self, blitter: bool) -> Self {
        self.use_blitter = blitter;
        self
    }

    pub fn with_sound(mut self, sound: bool) -> Self {
        self.use_sound = sound;
        self
    }

    pub fn with_status_bar(mut self, status_bar: bool) -> Self {
        self.use_status_bar = status_bar;
        self
    }

    /// Emulator command line options for these settings.
    ///
    /// Toggles come first, then machine, memory, resolution and monitor,
    /// and the window/fullscreen flag last. Sound is only mentioned when
    /// it is switched off.
    pub fn render_arguments(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(19);

        push_flag(&mut args, "--fast-boot", self.fast_boot);
        push_flag(&mut args, "--fast-forward", self.full_speed);
        push_flag(&mut args, "--statusbar", self.use_status_bar);
        push_flag(&mut args, "--blitter", self.use_blitter);
        if !self.use_sound {
            push_option(&mut args, "--sound", "off");
        }

        push_option(&mut args, "--machine", self.machine.token());
        push_option(&mut args, "--memsize", &self.memory.kilobytes().to_string());
        push_option(&mut args, "--tos-res", self.screen_mode.resolution());
        push_option(&mut args, "--monitor", self.screen_mode.monitor());

        args.push(if self.windowed { "-w" } else { "-f" }.to_string());
        args
    }
}

fn push_option(args: &mut Vec<String>, option: &str, value: &str) {
    args.push(option.to_string());
    args.push(value.to_string());
}

fn push_flag(args: &mut Vec<String>, option: &str, value: bool) {
    push_option(args, option, if value { "true" } else { "false" });
}
