//! File helpers - zip extraction, directory copies, executable bits

use std::fs;
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::error::AssetError;

/// Extract every entry of a zip archive below `dest`.
///
/// Entries whose path would leave `dest` are rejected. Unix permissions
/// stored in the archive are restored. Returns the extracted files.
pub fn unpack_zip<R: Read + Seek>(reader: R, dest: &Path) -> Result<Vec<PathBuf>, AssetError> {
    let mut archive = ZipArchive::new(reader)?;
    let mut extracted = Vec::new();

    fs::create_dir_all(dest).map_err(|e| AssetError::io(dest, e))?;
    info!("Unpack zip archive ({} entries) to {:?}", archive.len(), dest);

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| AssetError::UnsafeEntry(entry.name().to_string()))?;
        let target = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| AssetError::io(&target, e))?;
            continue;
        }

        // Archives created on Windows often omit directory entries
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| AssetError::io(parent, e))?;
        }

        let mut out = fs::File::create(&target).map_err(|e| AssetError::io(&target, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| AssetError::io(&target, e))?;
        debug!("Extracted {:?}", target);

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&target, fs::Permissions::from_mode(mode & 0o7777))
                .map_err(|e| AssetError::io(&target, e))?;
        }

        extracted.push(target);
    }

    Ok(extracted)
}

/// Extract a zip file from disk
pub fn unpack_zip_file(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>, AssetError> {
    let file = fs::File::open(archive).map_err(|e| AssetError::io(archive, e))?;
    unpack_zip(io::BufReader::new(file), dest)
}

/// Recursively copy the contents of `source` into `target`
pub fn copy_directory(source: &Path, target: &Path) -> Result<u64, AssetError> {
    let mut copied = 0;
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source).to_path_buf();
            AssetError::io(path, e.into())
        })?;
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let dest = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).map_err(|e| AssetError::io(&dest, e))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &dest).map_err(|e| AssetError::io(&dest, e))?;
            copied += 1;
        }
    }
    debug!("Copied {} files from {:?} to {:?}", copied, source, target);
    Ok(copied)
}

/// Copy a single file into a directory, keeping its file name
pub fn copy_file_into(source: &Path, dir: &Path) -> Result<PathBuf, AssetError> {
    let name = source.file_name().ok_or_else(|| {
        AssetError::io(
            source,
            io::Error::new(io::ErrorKind::InvalidInput, "no file name"),
        )
    })?;
    let target = dir.join(name);
    fs::copy(source, &target).map_err(|e| AssetError::io(&target, e))?;
    info!("Copied file {:?} to {:?}", source, target);
    Ok(target)
}

/// Whether `path` is a file the current user may execute
pub fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Set the executable bits on a file (no-op where there are none)
pub fn set_executable(path: &Path) -> Result<(), AssetError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let metadata = fs::metadata(path).map_err(|e| AssetError::io(path, e))?;
        let mut permissions = metadata.permissions();
        permissions.set_mode(permissions.mode() | 0o755);
        fs::set_permissions(path, permissions).map_err(|e| AssetError::io(path, e))?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

/// Whether a payload should be expanded rather than copied
pub fn is_zip(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}
