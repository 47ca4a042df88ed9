//! Launcher - prepares, starts, tracks and drives emulator instances

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::assets::{
    ensure_mount_dir, prepare_emulator, stage_payload, DirectoryBundle, OsProfile, ResourceBundle,
};
use super::instance::{InstanceConfig, InstanceId};
use super::machine::Tos;
use super::matcher::{MatchOutcome, WindowMatcher, WindowSnapshot};
use super::process::{terminate, EmulatorCommand, RunningInstance, SharedProcessRegistry};
use super::settings::LauncherSettings;
use crate::error::{AssetError, LaunchError, LaunchResult};
use crate::platform::{detect_window_system, Key, KeyMode, OsType, WindowHandle, WindowSystem};

/// Starts emulator processes and keeps track of them by instance id.
///
/// Launches and stops are serialized through the process registry's write
/// lock, so a launcher can be shared between threads.
pub struct Launcher {
    settings: LauncherSettings,
    registry: SharedProcessRegistry,
    windows: Box<dyn WindowSystem>,
    bundle: Box<dyn ResourceBundle>,
    os: OsType,
}

impl Launcher {
    /// Launcher for the current platform, reading resources from the
    /// configured resources directory
    pub fn new(settings: LauncherSettings) -> Self {
        let bundle = DirectoryBundle::new(settings.get_resources_directory());
        Self::with_parts(
            settings,
            detect_window_system(),
            Box::new(bundle),
            OsType::current(),
        )
    }

    pub fn with_parts(
        settings: LauncherSettings,
        windows: Box<dyn WindowSystem>,
        bundle: Box<dyn ResourceBundle>,
        os: OsType,
    ) -> Self {
        info!(
            "Launcher on {} using {} windows, work dir {:?}",
            os,
            windows.name(),
            settings.get_work_directory()
        );
        Self {
            settings,
            registry: SharedProcessRegistry::new(),
            windows,
            bundle,
            os,
        }
    }

    /// Share an existing registry instead of the launcher's own
    pub fn with_registry(mut self, registry: SharedProcessRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn settings(&self) -> &LauncherSettings {
        &self.settings
    }

    pub fn registry(&self) -> &SharedProcessRegistry {
        &self.registry
    }

    pub fn window_system(&self) -> &dyn WindowSystem {
        self.windows.as_ref()
    }

    /// Absolute work directory; the emulator runs from it, so every path
    /// handed to it must survive the change of working directory
    pub fn work_directory(&self) -> PathBuf {
        let dir = self.settings.get_work_directory();
        std::path::absolute(&dir).unwrap_or(dir)
    }

    /// Path the emulator executable has on this platform
    pub fn executable(&self) -> Result<PathBuf, AssetError> {
        let profile = OsProfile::for_os(self.os).ok_or(AssetError::UnsupportedPlatform(self.os))?;
        Ok(self.work_directory().join(profile.executable))
    }

    /// Unpack the emulator (if needed) and the TOS image into the work dir
    pub fn prepare(&self, tos: Tos) -> LaunchResult<PathBuf> {
        let executable = prepare_emulator(
            &self.work_directory(),
            tos,
            self.os,
            self.bundle.as_ref(),
        )?;
        Ok(executable)
    }

    /// Command that starts the emulator for `config`, optionally restoring
    /// a memory snapshot. A snapshot file that does not exist is skipped.
    pub fn command_line(
        &self,
        config: &InstanceConfig,
        snapshot: Option<&Path>,
    ) -> LaunchResult<EmulatorCommand> {
        let work = self.work_directory();
        let mount = work.join(&self.settings.mount_dir_name);
        let mut args = vec!["-d".to_string(), mount.to_string_lossy().into_owned()];

        if let Some(snapshot) = snapshot {
            if snapshot.is_file() {
                let snapshot = std::path::absolute(snapshot).unwrap_or_else(|_| snapshot.into());
                args.push("--memstate".to_string());
                args.push(snapshot.to_string_lossy().into_owned());
            } else {
                warn!("Memory snapshot {:?} not found, booting normally", snapshot);
            }
        }

        args.extend(config.render_arguments());

        Ok(EmulatorCommand {
            program: self.executable()?,
            args,
            stdout_log: work.join(&self.settings.stdout_log),
            stderr_log: work.join(&self.settings.stderr_log),
            working_dir: work,
        })
    }

    /// Start an emulator for `id` and wait for its window.
    ///
    /// A live instance under the same id is reused and its window
    /// returned without starting anything; one whose process has exited is
    /// replaced. Returns `None` when the platform cannot list windows.
    pub fn launch(
        &self,
        id: &InstanceId,
        config: &InstanceConfig,
        snapshot: Option<&Path>,
        payload: Option<&Path>,
    ) -> LaunchResult<Option<WindowHandle>> {
        let mut registry = self.registry.write()?;

        if let Some(existing) = registry.get_mut(id) {
            if !existing.has_exited() {
                info!("Instance '{}' already running", id);
                return Ok(existing.window.clone());
            }
            warn!("Instance '{}' has exited, starting a new one", id);
            registry.stop(id);
        }

        let before =
            WindowSnapshot::capture(self.windows.as_ref()).map_err(LaunchError::WindowSystem)?;

        let mount = ensure_mount_dir(
            &self.work_directory(),
            &self.settings.mount_dir_name,
            self.bundle.as_ref(),
        )?;
        let command = self.command_line(config, snapshot)?;

        if let Some(payload) = payload {
            stage_payload(&mount, payload).map_err(|source| LaunchError::Payload {
                path: payload.to_path_buf(),
                source,
            })?;
        }

        let mut child = command.spawn().map_err(LaunchError::Spawn)?;

        let matcher = WindowMatcher::new(self.windows.as_ref(), &self.settings.window_title_prefix)
            .with_timeout(self.settings.match_timeout())
            .with_interval(self.settings.poll_interval())
            .with_grace(self.settings.unverified_grace());

        let window = match matcher.run(&before) {
            MatchOutcome::Found(window) => Some(window),
            MatchOutcome::TimedOut => {
                terminate(&mut child);
                return Err(LaunchError::WindowNotFound {
                    timeout: matcher.timeout(),
                });
            }
            MatchOutcome::Unverified => match child.try_wait() {
                Ok(Some(status)) => return Err(LaunchError::ExitedEarly { status }),
                Ok(None) => None,
                Err(e) => {
                    terminate(&mut child);
                    return Err(LaunchError::Spawn(e));
                }
            },
        };

        registry.insert(RunningInstance::new(id.clone(), config.clone(), child, window.clone()));
        info!("Instance '{}' started", id);
        Ok(window)
    }

    /// Kill the instance; does nothing for an unknown id
    pub fn stop(&self, id: &InstanceId) -> LaunchResult<()> {
        self.registry.stop(id)?;
        Ok(())
    }

    /// Kill every instance this launcher knows about
    pub fn stop_all(&self) -> LaunchResult<()> {
        self.registry.stop_all()?;
        Ok(())
    }

    pub fn is_running(&self, id: &InstanceId) -> bool {
        self.registry.is_running(id)
    }

    pub fn window(&self, id: &InstanceId) -> Option<WindowHandle> {
        self.registry.window(id)
    }

    fn verified_window(&self, id: &InstanceId) -> LaunchResult<WindowHandle> {
        self.registry
            .window(id)
            .ok_or_else(|| LaunchError::NoWindow(id.to_string()))
    }

    /// Bring the instance's window to the foreground
    pub fn raise(&self, id: &InstanceId) -> LaunchResult<()> {
        let window = self.verified_window(id)?;
        self.windows.raise(&window).map_err(LaunchError::WindowSystem)
    }

    /// Press and release each key in turn
    pub fn type_keys(&self, id: &InstanceId, keys: &[Key]) -> LaunchResult<()> {
        self.send(id, keys, KeyMode::Sequence)
    }

    pub fn type_text(&self, id: &InstanceId, text: &str) -> LaunchResult<()> {
        self.type_keys(id, &Key::from_text(text))
    }

    /// Hold all keys down together, then release them (shortcuts).
    /// Modifiers go down first so "l+altgr" acts like "altgr+l".
    pub fn press_keys_together(&self, id: &InstanceId, keys: &[Key]) -> LaunchResult<()> {
        let mut chord = keys.to_vec();
        chord.sort_by_key(|key| !key.is_modifier());
        self.send(id, &chord, KeyMode::Together)
    }

    fn send(&self, id: &InstanceId, keys: &[Key], mode: KeyMode) -> LaunchResult<()> {
        let window = self.verified_window(id)?;
        self.windows.raise(&window).map_err(LaunchError::WindowSystem)?;
        self.windows
            .send_keys(&window, keys, mode)
            .map_err(LaunchError::WindowSystem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::archive::tests::zip_bytes;
    use crate::core::assets::tests::fake_bundle;
    use crate::core::matcher::tests::{window, ScriptedWindows};
    use crate::platform::NoWindowSystem;
    use std::fs;
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    const SLEEPER: &str = "#!/bin/sh\nexec sleep 30\n";

    fn settings(temp: &TempDir) -> LauncherSettings {
        LauncherSettings {
            match_timeout_ms: 400,
            poll_interval_ms: 5,
            unverified_grace_ms: 300,
            ..LauncherSettings::default().with_work_directory(temp.path().join("work"))
        }
    }

    fn launcher(temp: &TempDir, windows: Box<dyn WindowSystem>) -> Launcher {
        let bundle = fake_bundle(&temp.path().join("resources"));
        Launcher::with_parts(settings(temp), windows, Box::new(bundle), OsType::Linux)
    }

    /// Prepare the work dir and replace the emulator with a shell script
    fn install_emulator(launcher: &Launcher, script: &str) {
        let executable = launcher.prepare(Tos::Tos206).unwrap();
        fs::write(executable, script).unwrap();
    }

    /// Wait until the emulator has written `path` up to a final newline
    fn wait_for_log(path: &Path) -> String {
        let started = Instant::now();
        loop {
            let content = fs::read_to_string(path).unwrap_or_default();
            if content.ends_with('\n') || started.elapsed() > Duration::from_secs(5) {
                return content;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    /// `target` expressed relative to the current directory
    #[cfg(unix)]
    fn relative_to_cwd(target: &Path) -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        let mut relative = PathBuf::new();
        for _ in cwd.components().skip(1) {
            relative.push("..");
        }
        relative.join(target.strip_prefix("/").unwrap())
    }

    fn emulator_windows() -> ScriptedWindows {
        ScriptedWindows {
            existing: vec![window(1, "Hatari v2.5.0"), window(2, "Terminal")],
            // Call 0 is the snapshot
            appearing: Some((1, window(3, "Hatari v2.5.0"))),
            ..Default::default()
        }
    }

    #[test]
    fn test_command_line_order() {
        let temp = TempDir::new().unwrap();
        let launcher = launcher(&temp, Box::new(NoWindowSystem));
        let work = temp.path().join("work");
        let snapshot = temp.path().join("state.sav");
        fs::write(&snapshot, "mem").unwrap();

        let config = InstanceConfig::default();
        let command = launcher.command_line(&config, Some(&snapshot)).unwrap();

        let mut expected = vec![
            work.join("hatari").to_string_lossy().into_owned(),
            "-d".to_string(),
            work.join("drivec").to_string_lossy().into_owned(),
            "--memstate".to_string(),
            snapshot.to_string_lossy().into_owned(),
        ];
        expected.extend(config.render_arguments());
        assert_eq!(command.tokens(), expected);
        assert_eq!(command.working_dir, work);
        assert_eq!(command.stdout_log, work.join("output.log"));
        assert_eq!(command.stderr_log, work.join("error.log"));
    }

    #[test]
    fn test_command_line_skips_missing_snapshot() {
        let temp = TempDir::new().unwrap();
        let launcher = launcher(&temp, Box::new(NoWindowSystem));

        let command = launcher
            .command_line(&InstanceConfig::default(), Some(&temp.path().join("missing.sav")))
            .unwrap();

        assert!(!command.args.iter().any(|a| a == "--memstate"));
        assert_eq!(command.args.len(), 2 + 17);
    }

    #[test]
    fn test_unsupported_platform() {
        let temp = TempDir::new().unwrap();
        let bundle = fake_bundle(&temp.path().join("resources"));
        let launcher = Launcher::with_parts(
            settings(&temp),
            Box::new(NoWindowSystem),
            Box::new(bundle),
            OsType::MacOs,
        );

        assert!(matches!(
            launcher.prepare(Tos::Tos206),
            Err(LaunchError::Asset(AssetError::UnsupportedPlatform(OsType::MacOs)))
        ));
        assert!(launcher.command_line(&InstanceConfig::default(), None).is_err());
    }

    #[test]
    fn test_keys_need_verified_window() {
        let temp = TempDir::new().unwrap();
        let launcher = launcher(&temp, Box::new(NoWindowSystem));
        let id = InstanceId::new("testing");

        assert!(matches!(launcher.raise(&id), Err(LaunchError::NoWindow(_))));
        assert!(matches!(
            launcher.type_text(&id, "RUN\n"),
            Err(LaunchError::NoWindow(label)) if label == "testing"
        ));
    }

    #[test]
    fn test_stop_unknown_is_noop() {
        let temp = TempDir::new().unwrap();
        let launcher = launcher(&temp, Box::new(NoWindowSystem));

        launcher.stop(&InstanceId::new("nothing")).unwrap();
        launcher.stop_all().unwrap();

        assert_eq!(launcher.registry().running_count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_launch_twice_reuses_instance() {
        let temp = TempDir::new().unwrap();
        let windows = emulator_windows();
        let launcher = launcher(&temp, Box::new(windows.clone()));
        install_emulator(&launcher, SLEEPER);
        let id = InstanceId::new("testing");
        let config = InstanceConfig::testing();

        let first = launcher.launch(&id, &config, None, None).unwrap();
        let calls = windows.list_calls();
        let pid = launcher.registry().pid(&id);
        let second = launcher.launch(&id, &config, None, None).unwrap();

        assert_eq!(first, Some(window(3, "")));
        assert_eq!(second, first);
        assert_eq!(windows.list_calls(), calls);
        assert_eq!(launcher.registry().pid(&id), pid);
        assert_eq!(launcher.registry().running_count(), 1);

        launcher.stop(&id).unwrap();
        assert!(!launcher.is_running(&id));
        assert!(launcher.window(&id).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_launch_writes_logs_in_work_dir() {
        let temp = TempDir::new().unwrap();
        let launcher = launcher(&temp, Box::new(emulator_windows()));
        install_emulator(&launcher, "#!/bin/sh\necho \"$@\"\necho booting >&2\nexec sleep 30\n");
        let id = InstanceId::new("testing");

        launcher.launch(&id, &InstanceConfig::default(), None, None).unwrap();

        let work = temp.path().join("work");
        let stdout = wait_for_log(&work.join("output.log"));
        assert!(stdout.starts_with("-d "));
        assert!(stdout.trim_end().ends_with("--monitor tv -w"));
        assert_eq!(wait_for_log(&work.join("error.log")), "booting\n");
        // Fresh drive seeded from the template
        assert!(work.join("drivec/GFABASIC/GFABASIC.PRG").is_file());

        launcher.stop_all().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_launch_times_out_without_window() {
        let temp = TempDir::new().unwrap();
        let windows = ScriptedWindows {
            existing: vec![window(1, "Hatari v2.5.0")],
            ..Default::default()
        };
        let launcher = launcher(&temp, Box::new(windows));
        install_emulator(&launcher, SLEEPER);
        let id = InstanceId::new("testing");

        let started = Instant::now();
        let result = launcher.launch(&id, &InstanceConfig::default(), None, None);

        assert!(matches!(result, Err(LaunchError::WindowNotFound { .. })));
        assert!(started.elapsed() >= launcher.settings().match_timeout());
        assert_eq!(launcher.registry().running_count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_launch_without_executable_fails_to_spawn() {
        let temp = TempDir::new().unwrap();
        let launcher = launcher(&temp, Box::new(emulator_windows()));
        let id = InstanceId::new("testing");

        let result = launcher.launch(&id, &InstanceConfig::default(), None, None);

        assert!(matches!(result, Err(LaunchError::Spawn(_))));
        assert_eq!(launcher.registry().running_count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_unverified_launch_registers_without_window() {
        let temp = TempDir::new().unwrap();
        let launcher = launcher(&temp, Box::new(NoWindowSystem));
        install_emulator(&launcher, SLEEPER);
        let id = InstanceId::new("building");

        let started = Instant::now();
        let window = launcher
            .launch(&id, &InstanceConfig::building(), None, None)
            .unwrap();

        assert!(window.is_none());
        assert!(started.elapsed() >= launcher.settings().unverified_grace());
        assert!(launcher.is_running(&id));
        assert!(matches!(
            launcher.press_keys_together(&id, &[Key::AltGr, Key::Char('l')]),
            Err(LaunchError::NoWindow(_))
        ));

        launcher.stop_all().unwrap();
        assert_eq!(launcher.registry().running_count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_unverified_launch_detects_early_exit() {
        let temp = TempDir::new().unwrap();
        let launcher = launcher(&temp, Box::new(NoWindowSystem));
        install_emulator(&launcher, "#!/bin/sh\nexit 3\n");
        let id = InstanceId::new("testing");

        let result = launcher.launch(&id, &InstanceConfig::default(), None, None);

        assert!(matches!(result, Err(LaunchError::ExitedEarly { .. })));
        assert_eq!(launcher.registry().running_count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_exited_instance_is_relaunched() {
        let temp = TempDir::new().unwrap();
        let launcher = launcher(&temp, Box::new(NoWindowSystem));
        install_emulator(&launcher, SLEEPER);
        let id = InstanceId::new("testing");
        let config = InstanceConfig::default();

        launcher.launch(&id, &config, None, None).unwrap();
        let first = launcher.registry().pid(&id).unwrap();
        unsafe {
            libc::kill(first as i32, libc::SIGKILL);
        }
        std::thread::sleep(std::time::Duration::from_millis(100));

        launcher.launch(&id, &config, None, None).unwrap();
        let second = launcher.registry().pid(&id).unwrap();

        assert_ne!(first, second);
        assert!(launcher.is_running(&id));
        launcher.stop_all().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_launch_stages_zip_payload() {
        let temp = TempDir::new().unwrap();
        let launcher = launcher(&temp, Box::new(NoWindowSystem));
        install_emulator(&launcher, SLEEPER);
        let payload = temp.path().join("payload.zip");
        fs::write(
            &payload,
            zip_bytes(&[("game/GAME.PRG", "prg"), ("game/data/LEVEL.DAT", "level")]),
        )
        .unwrap();
        let id = InstanceId::new("build");

        launcher
            .launch(&id, &InstanceConfig::default(), None, Some(&payload))
            .unwrap();

        let mount = temp.path().join("work/drivec");
        assert_eq!(fs::read_to_string(mount.join("game/GAME.PRG")).unwrap(), "prg");
        assert_eq!(fs::read_to_string(mount.join("game/data/LEVEL.DAT")).unwrap(), "level");
        launcher.stop_all().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_payload_fails_before_spawn() {
        let temp = TempDir::new().unwrap();
        let launcher = launcher(&temp, Box::new(NoWindowSystem));
        install_emulator(&launcher, SLEEPER);
        let id = InstanceId::new("build");

        let result = launcher.launch(
            &id,
            &InstanceConfig::default(),
            None,
            Some(&temp.path().join("missing.prg")),
        );

        assert!(matches!(result, Err(LaunchError::Payload { .. })));
        assert!(!temp.path().join("work/output.log").exists());
        assert_eq!(launcher.registry().running_count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_keys_go_to_raised_window() {
        let temp = TempDir::new().unwrap();
        let windows = emulator_windows();
        let launcher = launcher(&temp, Box::new(windows.clone()));
        install_emulator(&launcher, SLEEPER);
        let id = InstanceId::new("testing");
        launcher.launch(&id, &InstanceConfig::default(), None, None).unwrap();

        launcher.type_text(&id, "ok\n").unwrap();
        launcher
            .press_keys_together(&id, &[Key::AltGr, Key::Char('l')])
            .unwrap();

        let sent = windows.sent.lock().unwrap().clone();
        assert_eq!(
            sent,
            vec![
                (vec![Key::Char('o'), Key::Char('k'), Key::Return], KeyMode::Sequence),
                (vec![Key::AltGr, Key::Char('l')], KeyMode::Together),
            ]
        );
        assert_eq!(*windows.raised.lock().unwrap(), vec![crate::platform::WindowId(3); 2]);
        launcher.stop_all().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_chord_presses_modifiers_first() {
        let temp = TempDir::new().unwrap();
        let windows = emulator_windows();
        let launcher = launcher(&temp, Box::new(windows.clone()));
        install_emulator(&launcher, SLEEPER);
        let id = InstanceId::new("testing");
        launcher.launch(&id, &InstanceConfig::default(), None, None).unwrap();

        launcher
            .press_keys_together(&id, &[Key::Char('s'), Key::Control, Key::Shift])
            .unwrap();

        let sent = windows.sent.lock().unwrap().clone();
        assert_eq!(
            sent,
            vec![(vec![Key::Control, Key::Shift, Key::Char('s')], KeyMode::Together)]
        );
        launcher.stop_all().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_relative_work_dir_is_made_absolute() {
        let temp = TempDir::new().unwrap();
        let relative_work = relative_to_cwd(&temp.path().join("work"));
        let snapshot = temp.path().join("state.sav");
        fs::write(&snapshot, "mem").unwrap();
        let relative_snapshot = relative_to_cwd(&snapshot);
        assert!(relative_work.is_relative());

        let bundle = fake_bundle(&temp.path().join("resources"));
        let launcher = Launcher::with_parts(
            LauncherSettings {
                unverified_grace_ms: 100,
                ..LauncherSettings::default().with_work_directory(&relative_work)
            },
            Box::new(NoWindowSystem),
            Box::new(bundle),
            OsType::Linux,
        );
        install_emulator(&launcher, "#!/bin/sh\necho \"$@\"\nexec sleep 30\n");

        let config = InstanceConfig::default();
        let command = launcher.command_line(&config, Some(&relative_snapshot)).unwrap();
        assert!(command.program.is_absolute());
        assert!(command.working_dir.is_absolute());
        assert!(command.stdout_log.is_absolute());
        assert!(Path::new(&command.args[1]).is_absolute());
        assert_eq!(command.args[2], "--memstate");
        assert!(Path::new(&command.args[3]).is_absolute());

        let id = InstanceId::new("testing");
        launcher.launch(&id, &config, Some(&relative_snapshot), None).unwrap();
        assert!(launcher.is_running(&id));

        let stdout = wait_for_log(&temp.path().join("work/output.log"));
        let mut tokens = stdout.split_whitespace();
        assert_eq!(tokens.next(), Some("-d"));
        assert!(Path::new(tokens.next().unwrap()).join("GFABASIC/GFABASIC.PRG").is_file());
        launcher.stop_all().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_concurrent_launches_spawn_once() {
        let temp = TempDir::new().unwrap();
        let launcher = Arc::new(launcher(&temp, Box::new(NoWindowSystem)));
        install_emulator(&launcher, "#!/bin/sh\necho x >> spawns.txt\nexec sleep 30\n");
        let id = InstanceId::new("testing");

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let launcher = Arc::clone(&launcher);
                let id = id.clone();
                std::thread::spawn(move || {
                    launcher.launch(&id, &InstanceConfig::default(), None, None)
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().unwrap().is_none());
        }

        let spawns = wait_for_log(&temp.path().join("work/spawns.txt"));
        assert_eq!(spawns.lines().count(), 1);
        assert_eq!(launcher.registry().running_count(), 1);
        launcher.stop_all().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_launchers_share_registry() {
        let temp = TempDir::new().unwrap();
        let first = launcher(&temp, Box::new(NoWindowSystem));
        install_emulator(&first, SLEEPER);
        let second = Launcher::with_parts(
            settings(&temp),
            Box::new(NoWindowSystem),
            Box::new(fake_bundle(&temp.path().join("resources"))),
            OsType::Linux,
        )
        .with_registry(first.registry().clone());
        assert_eq!(second.window_system().name(), "unsupported");
        let id = InstanceId::new("testing");

        first.launch(&id, &InstanceConfig::default(), None, None).unwrap();

        assert!(second.is_running(&id));
        second.stop_all().unwrap();
        assert!(!first.is_running(&id));
        assert_eq!(first.registry().running_count(), 0);
    }
}
