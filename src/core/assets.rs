//! Bundled assets - emulator archives, TOS images and the GEMDOS drive

use std::fs;
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::archive::{
    copy_directory, copy_file_into, is_executable, is_zip, set_executable, unpack_zip,
    unpack_zip_file,
};
use super::machine::Tos;
use crate::error::AssetError;
use crate::platform::OsType;

/// File name the selected TOS image is extracted to
pub const TOS_FILE: &str = "tos.img";

/// Bundle directory seeding a fresh GEMDOS drive
pub const HARDDISK_TEMPLATE: &str = "gfa_hdd";

/// Where the emulator comes from on a given platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OsProfile {
    /// Archive resource holding the emulator build
    pub archive: &'static str,
    /// Executable inside the archive
    pub executable: &'static str,
}

impl OsProfile {
    /// `None` for platforms without a bundled emulator build
    pub fn for_os(os: OsType) -> Option<OsProfile> {
        match os {
            OsType::Windows => Some(OsProfile {
                archive: "hatari-windows.zip",
                executable: "hatari-win64-release.exe",
            }),
            OsType::Linux => Some(OsProfile {
                archive: "hatari-linux.zip",
                executable: "hatari",
            }),
            OsType::MacOs | OsType::Other => None,
        }
    }
}

/// Source of the files shipped with the wrapper
pub trait ResourceBundle: Send + Sync {
    /// Read a resource file completely
    fn load(&self, name: &str) -> Result<Vec<u8>, AssetError>;

    /// Path of a resource directory, if the bundle has one
    fn directory(&self, name: &str) -> Option<PathBuf>;
}

/// Resources laid out in a plain directory
#[derive(Debug, Clone)]
pub struct DirectoryBundle {
    root: PathBuf,
}

impl DirectoryBundle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceBundle for DirectoryBundle {
    fn load(&self, name: &str) -> Result<Vec<u8>, AssetError> {
        let path = self.root.join(name);
        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => AssetError::MissingResource(name.to_string()),
            _ => AssetError::io(path, e),
        })
    }

    fn directory(&self, name: &str) -> Option<PathBuf> {
        let path = self.root.join(name);
        path.is_dir().then_some(path)
    }
}

/// Make sure the emulator and the requested TOS image are in `work_dir`.
///
/// The emulator archive is only expanded when the executable is missing
/// or not executable. The TOS image is extracted on every call so a
/// previous run never leaves a different version behind. On failure the
/// partially prepared files are removed (the whole directory if this call
/// created it). Returns the path of the emulator executable.
pub fn prepare_emulator(
    work_dir: &Path,
    tos: Tos,
    os: OsType,
    bundle: &dyn ResourceBundle,
) -> Result<PathBuf, AssetError> {
    let profile = OsProfile::for_os(os).ok_or(AssetError::UnsupportedPlatform(os))?;

    let created = !work_dir.exists();
    fs::create_dir_all(work_dir).map_err(|e| AssetError::io(work_dir, e))?;
    let executable = work_dir.join(profile.executable);

    let result = unpack_emulator(work_dir, &executable, &profile, bundle)
        .and_then(|_| unpack_tos(work_dir, tos, bundle));

    if let Err(e) = result {
        warn!("Preparing {:?} failed, cleaning up: {}", work_dir, e);
        cleanup(work_dir, created, &executable);
        return Err(e);
    }

    Ok(executable)
}

fn unpack_emulator(
    work_dir: &Path,
    executable: &Path,
    profile: &OsProfile,
    bundle: &dyn ResourceBundle,
) -> Result<(), AssetError> {
    if is_executable(executable) {
        return Ok(());
    }

    info!("Unpack emulator {} to {:?}", profile.archive, work_dir);
    let archive = bundle.load(profile.archive)?;
    unpack_zip(Cursor::new(archive), work_dir)?;

    if !executable.is_file() {
        return Err(AssetError::MissingResource(format!(
            "{} in {}",
            profile.executable, profile.archive
        )));
    }
    set_executable(executable)?;
    info!("Emulator unpacked to {:?}", work_dir);
    Ok(())
}

fn unpack_tos(work_dir: &Path, tos: Tos, bundle: &dyn ResourceBundle) -> Result<(), AssetError> {
    let image = bundle.load(&tos.resource_name())?;
    let target = work_dir.join(TOS_FILE);
    fs::write(&target, image).map_err(|e| AssetError::io(&target, e))?;
    info!("Extracted TOS {} to {:?}", tos, target);
    Ok(())
}

fn cleanup(work_dir: &Path, created: bool, executable: &Path) {
    let result = if created {
        fs::remove_dir_all(work_dir)
    } else {
        let _ = fs::remove_file(work_dir.join(TOS_FILE));
        match fs::remove_file(executable) {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        }
    };
    if let Err(e) = result {
        warn!("Cleanup of {:?} failed: {}", work_dir, e);
    }
}

/// Return the GEMDOS drive directory, creating it on first use.
///
/// A new drive is seeded with a copy of the bundle's hard disk template.
/// An existing drive is left untouched.
pub fn ensure_mount_dir(
    work_dir: &Path,
    name: &str,
    bundle: &dyn ResourceBundle,
) -> Result<PathBuf, AssetError> {
    let mount = work_dir.join(name);
    if mount.is_dir() {
        return Ok(mount);
    }

    if mount.exists() {
        fs::remove_file(&mount).map_err(|e| AssetError::io(&mount, e))?;
    }
    fs::create_dir_all(&mount).map_err(|e| AssetError::io(&mount, e))?;

    if let Some(template) = bundle.directory(HARDDISK_TEMPLATE) {
        info!("Seeding {:?} from {:?}", mount, template);
        copy_directory(&template, &mount)?;
    }
    Ok(mount)
}

/// Put a program or archive into the GEMDOS drive: zip archives are
/// expanded, anything else is copied under its own name
pub fn stage_payload(mount_dir: &Path, payload: &Path) -> Result<Vec<PathBuf>, AssetError> {
    if !payload.is_file() {
        return Err(AssetError::io(
            payload,
            std::io::Error::new(ErrorKind::NotFound, "payload is not a file"),
        ));
    }

    if is_zip(payload) {
        info!("Unpack {:?} to {:?}", payload, mount_dir);
        unpack_zip_file(payload, mount_dir)
    } else {
        copy_file_into(payload, mount_dir).map(|file| vec![file])
    }
}
