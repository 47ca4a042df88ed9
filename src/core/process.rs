//! Process management - spawning, tracking and killing emulator processes

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use super::instance::{InstanceConfig, InstanceId};
use crate::error::{LaunchError, LaunchResult};
use crate::platform::WindowHandle;

/// Everything needed to start one emulator process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Receives the emulator's stdout, truncated on every start
    pub stdout_log: PathBuf,
    /// Receives the emulator's stderr, truncated on every start
    pub stderr_log: PathBuf,
}

impl EmulatorCommand {
    /// Program followed by its arguments, as they are passed to the OS
    pub fn tokens(&self) -> Vec<String> {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Start the process detached from our session, stdin closed
    pub fn spawn(&self) -> io::Result<Child> {
        info!("Spawning {}", self.tokens().join(" "));

        let stdout = File::create(&self.stdout_log)?;
        let stderr = File::create(&self.stderr_log)?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).current_dir(&self.working_dir);

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            cmd.creation_flags(0x00000008); // DETACHED_PROCESS
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            unsafe {
                cmd.pre_exec(|| {
                    libc::setsid();
                    Ok(())
                });
            }
        }

        let child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()?;

        info!("Spawned process with PID {}", child.id());
        Ok(child)
    }
}

/// Forcibly kill a child and reap it
pub fn terminate(child: &mut Child) {
    let pid = child.id();
    if let Err(e) = child.kill() {
        // Already exited processes report InvalidInput
        debug!("Kill of PID {} failed: {}", pid, e);
    }
    match child.wait() {
        Ok(status) => debug!("PID {} ended with {}", pid, status),
        Err(e) => error!("Failed to reap PID {}: {}", pid, e),
    }
}

/// A registered emulator process
#[derive(Debug)]
pub struct RunningInstance {
    pub id: InstanceId,
    pub config: InstanceConfig,
    child: Child,
    /// `None` when the platform could not verify the window
    pub window: Option<WindowHandle>,
    pub started_at: DateTime<Utc>,
}

impl RunningInstance {
    pub fn new(
        id: InstanceId,
        config: InstanceConfig,
        child: Child,
        window: Option<WindowHandle>,
    ) -> Self {
        Self {
            id,
            config,
            child,
            window,
            started_at: Utc::now(),
        }
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Whether the process has ended on its own
    pub fn has_exited(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                debug!("Instance '{}' exited with {}", self.id, status);
                true
            }
            Ok(None) => false,
            Err(e) => {
                error!("Error checking process status of '{}': {}", self.id, e);
                true
            }
        }
    }

    pub fn uptime(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }

    fn kill(mut self) {
        info!(
            "Stopping instance '{}' (PID {}) after {}s",
            self.id,
            self.pid(),
            self.uptime().num_seconds()
        );
        terminate(&mut self.child);
    }
}

/// Running emulators by instance id, at most one per id
#[derive(Debug, Default)]
pub struct ProcessRegistry {
    instances: HashMap<InstanceId, RunningInstance>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a started instance, killing any process it replaces
    pub fn insert(&mut self, instance: RunningInstance) {
        if let Some(previous) = self.instances.insert(instance.id.clone(), instance) {
            warn!("Replacing registered instance '{}'", previous.id);
            previous.kill();
        }
    }

    pub fn get(&self, id: &InstanceId) -> Option<&RunningInstance> {
        self.instances.get(id)
    }

    pub fn get_mut(&mut self, id: &InstanceId) -> Option<&mut RunningInstance> {
        self.instances.get_mut(id)
    }

    /// Kill and forget an instance. Returns false if none was registered.
    pub fn stop(&mut self, id: &InstanceId) -> bool {
        match self.instances.remove(id) {
            Some(instance) => {
                instance.kill();
                true
            }
            None => {
                debug!("No instance '{}' to stop", id);
                false
            }
        }
    }

    /// Kill every registered instance; returns how many there were
    pub fn stop_all(&mut self) -> usize {
        let count = self.instances.len();
        for (_, instance) in self.instances.drain() {
            instance.kill();
        }
        if count > 0 {
            info!("Stopped {} instances", count);
        }
        count
    }

    /// Registered and not yet exited
    pub fn is_running(&mut self, id: &InstanceId) -> bool {
        self.instances
            .get_mut(id)
            .map(|instance| !instance.has_exited())
            .unwrap_or(false)
    }

    pub fn window(&self, id: &InstanceId) -> Option<WindowHandle> {
        self.get(id).and_then(|i| i.window.clone())
    }

    pub fn pid(&self, id: &InstanceId) -> Option<u32> {
        self.get(id).map(RunningInstance::pid)
    }

    /// Registered ids in sorted order
    pub fn running_ids(&self) -> Vec<InstanceId> {
        let mut ids: Vec<InstanceId> = self.instances.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn running_count(&self) -> usize {
        self.instances.len()
    }

    /// Forget instances whose process has ended on its own
    pub fn prune_exited(&mut self) -> Vec<InstanceId> {
        let exited: Vec<InstanceId> = self
            .instances
            .iter_mut()
            .filter_map(|(id, instance)| instance.has_exited().then(|| id.clone()))
            .collect();
        for id in &exited {
            info!("Instance '{}' has exited", id);
            self.instances.remove(id);
        }
        exited
    }
}

/// Thread-safe wrapper for ProcessRegistry
#[derive(Debug, Default)]
pub struct SharedProcessRegistry {
    inner: Arc<RwLock<ProcessRegistry>>,
}

impl SharedProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&self) -> LaunchResult<RwLockWriteGuard<'_, ProcessRegistry>> {
        self.inner.write().map_err(|_| LaunchError::LockPoisoned)
    }

    pub fn read(&self) -> LaunchResult<RwLockReadGuard<'_, ProcessRegistry>> {
        self.inner.read().map_err(|_| LaunchError::LockPoisoned)
    }

    pub fn stop(&self, id: &InstanceId) -> LaunchResult<bool> {
        Ok(self.write()?.stop(id))
    }

    pub fn stop_all(&self) -> LaunchResult<usize> {
        Ok(self.write()?.stop_all())
    }

    pub fn is_running(&self, id: &InstanceId) -> bool {
        self.inner
            .write()
            .map(|mut r| r.is_running(id))
            .unwrap_or(false)
    }

    pub fn window(&self, id: &InstanceId) -> Option<WindowHandle> {
        self.read().ok().and_then(|r| r.window(id))
    }

    pub fn pid(&self, id: &InstanceId) -> Option<u32> {
        self.read().ok().and_then(|r| r.pid(id))
    }

    pub fn running_ids(&self) -> Vec<InstanceId> {
        self.read().map(|r| r.running_ids()).unwrap_or_default()
    }

    pub fn running_count(&self) -> usize {
        self.read().map(|r| r.running_count()).unwrap_or(0)
    }

    pub fn prune_exited(&self) -> LaunchResult<Vec<InstanceId>> {
        Ok(self.write()?.prune_exited())
    }
}

impl Clone for SharedProcessRegistry {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
