//! Domain types for the space registry.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! Persisted types are serializable via serde + serde_yaml.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Current on-disk registry format version.
pub const REGISTRY_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed space name: `<repo base name>-<branch>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpaceName(pub String);

impl SpaceName {
    /// Derive the space name for `branch` in the repository at `repo_root`.
    ///
    /// Path separators in the branch are flattened to `-` so every space is a
    /// direct child of the destination directory.
    pub fn for_branch(repo_root: &Path, branch: &str) -> Self {
        let repo = repo_root
            .file_name()
            .unwrap_or_else(|| repo_root.as_os_str())
            .to_string_lossy();
        Self(format!("{repo}-{}", branch.replace(['/', '\\'], "-")))
    }

    /// Derive the space name from a worktree path (its final component).
    pub fn from_path(path: &Path) -> Self {
        Self(
            path.file_name()
                .unwrap_or_else(|| path.as_os_str())
                .to_string_lossy()
                .into_owned(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for SpaceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SpaceName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Port range
// ---------------------------------------------------------------------------

/// Inclusive range of candidate ports handed out to spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

impl PortRange {
    pub const DEFAULT_START: u16 = 9000;
    pub const DEFAULT_END: u16 = 9999;

    pub fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    pub fn ports(&self) -> RangeInclusive<u16> {
        self.start..=self.end
    }
}

impl Default for PortRange {
    fn default() -> Self {
        Self::new(Self::DEFAULT_START, Self::DEFAULT_END)
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Persisted structs
// ---------------------------------------------------------------------------

/// A registered space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceRecord {
    pub name: SpaceName,
    /// Absolute path to the worktree on disk.
    pub path: PathBuf,
    pub port: u16,
    /// Absolute path to the repository that owns the worktree.
    pub repo_root: PathBuf,
    pub created_at: DateTime<Utc>,
}

/// All spaces registered under one destination directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub version: u32,
    #[serde(default)]
    pub spaces: BTreeMap<SpaceName, SpaceRecord>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            version: REGISTRY_VERSION,
            spaces: BTreeMap::new(),
        }
    }
}

impl Registry {
    /// Insert or replace the record for `record.name`.
    ///
    /// The port must come from [`Registry::allocate_port`] on this same
    /// instance, inside the same locked section.
    pub fn add(&mut self, record: SpaceRecord) {
        self.spaces.insert(record.name.clone(), record);
    }

    /// Remove the record for `name`. Absent names are a no-op.
    pub fn remove(&mut self, name: &SpaceName) -> Option<SpaceRecord> {
        self.spaces.remove(name)
    }

    pub fn get(&self, name: &SpaceName) -> Option<&SpaceRecord> {
        self.spaces.get(name)
    }

    pub fn find_by_path(&self, path: &Path) -> Option<&SpaceRecord> {
        self.spaces.values().find(|r| r.path == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpaceRecord> {
        self.spaces.values()
    }

    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }

    /// Lowest port in `range` not held by any record.
    pub fn allocate_port(&self, range: PortRange) -> Result<u16, RegistryError> {
        range
            .ports()
            .find(|port| !self.spaces.values().any(|r| r.port == *port))
            .ok_or(RegistryError::PortsExhausted {
                start: range.start,
                end: range.end,
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, port: u16) -> SpaceRecord {
        SpaceRecord {
            name: SpaceName::from(name),
            path: PathBuf::from(format!("/w/{name}")),
            port,
            repo_root: PathBuf::from("/r/proj"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn space_name_from_repo_and_branch() {
        let name = SpaceName::for_branch(Path::new("/r/proj"), "feat");
        assert_eq!(name.to_string(), "proj-feat");
    }

    #[test]
    fn space_name_flattens_nested_branches() {
        let name = SpaceName::for_branch(Path::new("/r/proj"), "feat/login");
        assert_eq!(name.as_str(), "proj-feat-login");
    }

    #[test]
    fn space_name_from_path_uses_last_component() {
        assert_eq!(SpaceName::from_path(Path::new("/w/proj-feat")).as_str(), "proj-feat");
    }

    #[test]
    fn allocate_on_empty_registry_returns_range_start() {
        let reg = Registry::default();
        assert_eq!(reg.allocate_port(PortRange::default()).unwrap(), 9000);
    }

    #[test]
    fn allocate_fills_lowest_gap() {
        let mut reg = Registry::default();
        reg.add(record("a", 9000));
        reg.add(record("c", 9002));
        assert_eq!(reg.allocate_port(PortRange::default()).unwrap(), 9001);
    }

    #[test]
    fn allocate_exhausted_range_errors() {
        let mut reg = Registry::default();
        reg.add(record("a", 7000));
        reg.add(record("b", 7001));
        let err = reg.allocate_port(PortRange::new(7000, 7001)).unwrap_err();
        assert!(matches!(err, RegistryError::PortsExhausted { start: 7000, end: 7001 }));
    }

    #[test]
    fn add_replaces_existing_name() {
        let mut reg = Registry::default();
        reg.add(record("a", 9000));
        reg.add(record("a", 9005));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(&SpaceName::from("a")).unwrap().port, 9005);
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut reg = Registry::default();
        reg.add(record("a", 9000));
        assert!(reg.remove(&SpaceName::from("missing")).is_none());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn registry_serde_roundtrip() {
        let mut reg = Registry::default();
        reg.add(record("proj-feat", 9000));
        let yaml = serde_yaml::to_string(&reg).expect("serialize");
        let back: Registry = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(reg, back);
    }
}
