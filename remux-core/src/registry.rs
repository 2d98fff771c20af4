//! Per-destination YAML registry of spaces.
//!
//! # Storage layout
//!
//! ```text
//! <dest>/
//!   .remux/
//!     registry.yaml       (mode 0600, absent until the first space is registered)
//!     registry.lock       (advisory lock target, never removed)
//!   <repo>-<branch>/      (worktrees)
//! ```
//!
//! # Concurrency
//!
//! Several `remux` processes may mutate the same registry. Every
//! read-modify-write goes through [`with_locked`], which holds an exclusive
//! `flock` on `registry.lock` from load until the rename in [`save`] has
//! completed. Port allocation happens inside that section.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::Utc;
use fs2::FileExt;

use crate::error::{io_err, RegistryError};
use crate::types::{PortRange, Registry, SpaceName, SpaceRecord};

const REGISTRY_DIR: &str = ".remux";
const REGISTRY_FILE: &str = "registry.yaml";
const LOCK_FILE: &str = "registry.lock";

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<dest>/.remux/`. Pure, no I/O.
pub fn registry_dir_at(dest: &Path) -> PathBuf {
    dest.join(REGISTRY_DIR)
}

/// `<dest>/.remux/registry.yaml`. Pure, no I/O.
pub fn registry_path_at(dest: &Path) -> PathBuf {
    registry_dir_at(dest).join(REGISTRY_FILE)
}

/// `<dest>/.remux/registry.lock`. Pure, no I/O.
pub fn lock_path_at(dest: &Path) -> PathBuf {
    registry_dir_at(dest).join(LOCK_FILE)
}

/// Default destination directory, `~/at`.
pub fn default_dest() -> Result<PathBuf, RegistryError> {
    dirs::home_dir()
        .map(|home| home.join("at"))
        .ok_or(RegistryError::HomeNotFound)
}

/// Create `<dest>/.remux/` (mode `0700`) if it does not yet exist.
fn ensure_registry_dir(dest: &Path) -> Result<PathBuf, RegistryError> {
    let dir = registry_dir_at(dest);
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        set_dir_permissions(&dir)?;
    }
    Ok(dir)
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load the registry for `dest`.
///
/// A missing file is first use and yields an empty registry. A file that
/// exists but cannot be read or parsed is an error
/// (`RegistryError::Parse` carries the path and serde_yaml's line context).
pub fn load(dest: &Path) -> Result<Registry, RegistryError> {
    let path = registry_path_at(dest);
    if !path.exists() {
        return Ok(Registry::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    if contents.trim().is_empty() {
        return Ok(Registry::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| RegistryError::Parse { path, source: e })
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically replace the registry for `dest`.
///
/// Write flow: serialize → `registry.yaml.tmp` sibling → `chmod 0600` → `rename`.
/// The temp file lives in the same directory as the target so the rename
/// never crosses filesystems.
pub fn save(dest: &Path, registry: &Registry) -> Result<(), RegistryError> {
    ensure_registry_dir(dest)?;
    let path = registry_path_at(dest);
    let tmp_path = path.with_file_name(format!("{REGISTRY_FILE}.tmp"));

    let yaml = serde_yaml::to_string(registry)?;
    std::fs::write(&tmp_path, yaml).map_err(|e| io_err(&tmp_path, e))?;
    set_file_permissions(&tmp_path)?;
    if let Err(e) = std::fs::rename(&tmp_path, &path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(io_err(&path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// 4. Locked read-modify-write
// ---------------------------------------------------------------------------

/// Exclusive hold on a destination's registry. Released on drop.
#[derive(Debug)]
pub struct RegistryLock {
    file: File,
    path: PathBuf,
}

impl RegistryLock {
    /// Block until the exclusive lock for `dest` is held.
    pub fn acquire(dest: &Path) -> Result<Self, RegistryError> {
        ensure_registry_dir(dest)?;
        let path = lock_path_at(dest);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| RegistryError::Lock {
                path: path.clone(),
                source: e,
            })?;
        file.lock_exclusive().map_err(|e| RegistryError::Lock {
            path: path.clone(),
            source: e,
        })?;
        tracing::debug!("locked {}", path.display());
        Ok(Self { file, path })
    }
}

impl Drop for RegistryLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!("failed to unlock {}: {e}", self.path.display());
        }
    }
}

/// Load, mutate and save the registry for `dest` as one critical section.
///
/// The registry is only saved if `f` returns `Ok`. The lock is released on
/// every exit path.
pub fn with_locked<T, F>(dest: &Path, f: F) -> Result<T, RegistryError>
where
    F: FnOnce(&mut Registry) -> Result<T, RegistryError>,
{
    let _lock = RegistryLock::acquire(dest)?;
    let mut registry = load(dest)?;
    let value = f(&mut registry)?;
    save(dest, &registry)?;
    Ok(value)
}

// ---------------------------------------------------------------------------
// 5. Register / unregister
// ---------------------------------------------------------------------------

/// Allocate a port and record the space, under the registry lock.
pub fn register_space(
    dest: &Path,
    name: SpaceName,
    path: PathBuf,
    repo_root: PathBuf,
    range: PortRange,
) -> Result<SpaceRecord, RegistryError> {
    with_locked(dest, |registry| {
        if let Some(stale) = registry.remove(&name) {
            tracing::debug!("replacing stale record {} (port {})", stale.name, stale.port);
        }
        let port = registry.allocate_port(range)?;
        let record = SpaceRecord {
            name,
            path,
            port,
            repo_root,
            created_at: Utc::now(),
        };
        registry.add(record.clone());
        tracing::info!("registered {} on port {}", record.name, record.port);
        Ok(record)
    })
}

/// Remove the record for `name`, under the registry lock.
///
/// Returns the removed record; an unregistered name is not an error. A
/// destination without a registry is left untouched.
pub fn unregister_space(
    dest: &Path,
    name: &SpaceName,
) -> Result<Option<SpaceRecord>, RegistryError> {
    if !registry_path_at(dest).exists() {
        tracing::debug!("no registry under {}", dest.display());
        return Ok(None);
    }
    with_locked(dest, |registry| {
        let removed = registry.remove(name);
        match &removed {
            Some(record) => tracing::info!("unregistered {} (port {})", name, record.port),
            None => tracing::debug!("{name} was not registered"),
        }
        Ok(removed)
    })
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), RegistryError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), RegistryError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), RegistryError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), RegistryError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
