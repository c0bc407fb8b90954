use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Registry file, one per installation, next to the workspaces directory.
pub const REGISTRY_FILE: &str = "workspaces.yml";
/// Per-workspace data file inside each workspace directory.
pub const WORKSPACE_FILE: &str = "workspace.yml";
/// Directory under the data dir holding one subdirectory per workspace.
pub const WORKSPACES_DIR: &str = "workspaces";

pub fn default_data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "lockboard").context("locating data directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

/// Write-to-temp-then-rename so a crash mid-write never leaves a
/// truncated file behind.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().context("target path has no parent directory")?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("target path has no file name")?;
    let tmp = parent.join(format!(".{file_name}.tmp"));
    fs::write(&tmp, bytes).with_context(|| format!("writing {:?}", tmp))?;
    fs::rename(&tmp, path).with_context(|| format!("replacing {:?}", path))?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub location: PathBuf,
    pub last_edited: DateTime<Utc>,
}

/// Durable name -> location index of all known workspaces. Loading never
/// fails: an unreadable or malformed file degrades to an empty registry,
/// and entries whose directory or data file has vanished are pruned.
#[derive(Debug)]
pub struct Registry {
    path: PathBuf,
    entries: BTreeMap<String, RegistryEntry>,
}

impl Registry {
    pub fn load(path: PathBuf) -> Self {
        let (entries, dirty) = match fs::read(&path) {
            Err(err) if err.kind() == ErrorKind::NotFound => (BTreeMap::new(), false),
            Err(_) => (BTreeMap::new(), true),
            Ok(bytes) => match serde_yaml::from_slice(&bytes) {
                Ok(map) => (map, false),
                Err(_) => (BTreeMap::new(), true),
            },
        };
        let mut registry = Registry { path, entries };
        let pruned = registry.prune();
        if dirty || pruned {
            // Best effort; the next explicit save reports failures.
            let _ = registry.save();
        }
        registry
    }

    /// Drops entries whose location is gone or no longer holds a data
    /// file. Returns whether anything was removed.
    fn prune(&mut self) -> bool {
        let before = self.entries.len();
        self.entries.retain(|_, entry| {
            entry.location.is_dir() && entry.location.join(WORKSPACE_FILE).is_file()
        });
        self.entries.len() < before
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
        }
        let serialized = serde_yaml::to_string(&self.entries).context("serializing registry")?;
        write_atomic(&self.path, serialized.as_bytes())
    }

    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn insert(&mut self, name: &str, entry: RegistryEntry) {
        self.entries.insert(name.to_string(), entry);
    }

    pub fn remove(&mut self, name: &str) -> Option<RegistryEntry> {
        self.entries.remove(name)
    }

    /// Refreshes the cached last-modified time for a workspace.
    pub fn touch(&mut self, name: &str, last_edited: DateTime<Utc>) {
        if let Some(entry) = self.entries.get_mut(name) {
            entry.last_edited = last_edited;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RegistryEntry)> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(location: PathBuf) -> RegistryEntry {
        RegistryEntry {
            location,
            last_edited: Utc::now(),
        }
    }

    fn registry_at(path: PathBuf) -> Registry {
        Registry {
            path,
            entries: BTreeMap::new(),
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let registry = Registry::load(dir.path().join(REGISTRY_FILE));
        assert!(registry.is_empty());
    }

    #[test]
    fn corrupt_file_degrades_to_empty_and_rewrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(REGISTRY_FILE);
        fs::write(&path, b"\x00\xffnot yaml at all").unwrap();
        let registry = Registry::load(path.clone());
        assert!(registry.is_empty());
        let rewritten = fs::read_to_string(&path).unwrap();
        let parsed: BTreeMap<String, RegistryEntry> = serde_yaml::from_str(&rewritten).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn entries_with_missing_locations_are_pruned() {
        let dir = tempdir().unwrap();
        let live = dir.path().join("live");
        fs::create_dir_all(&live).unwrap();
        fs::write(live.join(WORKSPACE_FILE), "name: live\n").unwrap();

        let registry_path = dir.path().join(REGISTRY_FILE);
        let mut registry = registry_at(registry_path.clone());
        registry.insert("live", entry(live));
        registry.insert("gone", entry(dir.path().join("gone")));
        registry.save().unwrap();

        let reloaded = Registry::load(registry_path);
        assert_eq!(reloaded.names(), vec!["live".to_string()]);
    }

    #[test]
    fn entries_without_data_file_are_pruned() {
        let dir = tempdir().unwrap();
        let hollow = dir.path().join("hollow");
        fs::create_dir_all(&hollow).unwrap();

        let registry_path = dir.path().join(REGISTRY_FILE);
        let mut registry = registry_at(registry_path.clone());
        registry.insert("hollow", entry(hollow));
        registry.save().unwrap();

        let reloaded = Registry::load(registry_path);
        assert!(reloaded.is_empty());
    }

    #[test]
    fn round_trips_entries() {
        let dir = tempdir().unwrap();
        let ws = dir.path().join("proj");
        fs::create_dir_all(&ws).unwrap();
        fs::write(ws.join(WORKSPACE_FILE), "name: proj\n").unwrap();

        let registry_path = dir.path().join(REGISTRY_FILE);
        let mut registry = registry_at(registry_path.clone());
        registry.insert("proj", entry(ws.clone()));
        registry.save().unwrap();

        let reloaded = Registry::load(registry_path);
        assert_eq!(reloaded.get("proj").map(|e| e.location.clone()), Some(ws));
    }
}
