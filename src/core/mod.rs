//! Core module - instance configuration, assets, launching and process tracking

pub mod archive;
pub mod assets;
mod instance;
mod launcher;
mod machine;
pub mod matcher;
mod process;
pub mod settings;

pub use assets::{DirectoryBundle, OsProfile, ResourceBundle};
pub use instance::{InstanceConfig, InstanceId};
pub use launcher::Launcher;
pub use machine::{MachineType, Memory, ScreenMode, Tos};
pub use matcher::{MatchOutcome, WindowMatcher, WindowSnapshot};
pub use process::{EmulatorCommand, ProcessRegistry, RunningInstance, SharedProcessRegistry};
pub use settings::LauncherSettings;
