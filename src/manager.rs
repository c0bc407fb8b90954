use crate::crypto::{self, CryptoError};
use crate::model::{ModelError, Workspace};
use crate::storage::{self, Registry, RegistryEntry, REGISTRY_FILE, WORKSPACES_DIR, WORKSPACE_FILE};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum ManagerError {
    #[error("workspace name cannot be empty")]
    EmptyName,
    #[error("workspace name '{0}' is not usable as a directory name")]
    InvalidName(String),
    #[error("a workspace named '{0}' is already registered")]
    AlreadyRegistered(String),
    #[error("a file or directory already exists at {}", .0.display())]
    LocationOccupied(PathBuf),
    #[error("workspace '{0}' is not registered")]
    NotFound(String),
    #[error("workspace '{0}' is already open; close it first")]
    AlreadyOpen(String),
    #[error("no workspace is currently open")]
    NothingOpen,
    #[error("workspace '{0}' is encrypted and requires a password")]
    PasswordRequired(String),
    #[error("incorrect password or corrupted data file")]
    BadPassword,
    #[error("workspace '{0}' is open; close it before deleting")]
    DeleteWhileOpen(String),
    #[error("failed to encrypt workspace data")]
    Encrypt,
    #[error("failed to {context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode workspace data")]
    Decode(#[from] serde_yaml::Error),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl From<CryptoError> for ManagerError {
    fn from(err: CryptoError) -> Self {
        match err {
            // Wrong password and corrupted ciphertext must present
            // identically to the caller.
            CryptoError::AuthFailed | CryptoError::Malformed => ManagerError::BadPassword,
            CryptoError::EncryptFailed => ManagerError::Encrypt,
        }
    }
}

fn io_ctx(context: String) -> impl FnOnce(io::Error) -> ManagerError {
    move |source| ManagerError::Io { context, source }
}

/// Orchestrator for the workspace lifecycle and the only component that
/// touches the filesystem for workspace data. Owns the registry and the
/// single "currently open" workspace slot.
pub struct WorkspaceManager {
    workspaces_dir: PathBuf,
    registry: Registry,
    current: Option<Workspace>,
}

impl WorkspaceManager {
    pub fn new(data_dir: &Path) -> Result<Self, ManagerError> {
        let workspaces_dir = data_dir.join(WORKSPACES_DIR);
        fs::create_dir_all(&workspaces_dir)
            .map_err(io_ctx(format!("create {:?}", workspaces_dir)))?;
        let registry = Registry::load(data_dir.join(REGISTRY_FILE));
        Ok(WorkspaceManager {
            workspaces_dir,
            registry,
            current: None,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn current(&self) -> Option<&Workspace> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut Workspace> {
        self.current.as_mut()
    }

    fn validate_name(name: &str) -> Result<String, ManagerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ManagerError::EmptyName);
        }
        // Workspace names double as directory names.
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ManagerError::InvalidName(name.to_string()));
        }
        Ok(name.to_string())
    }

    /// Creates, persists, and registers a fresh workspace with one default
    /// board. The new workspace is not left open; callers open it
    /// explicitly, so there is never a second live in-memory copy.
    pub fn create(&mut self, name: &str) -> Result<(), ManagerError> {
        let name = Self::validate_name(name)?;
        if self.registry.contains(&name) {
            return Err(ManagerError::AlreadyRegistered(name));
        }
        let dir = self.workspaces_dir.join(&name);
        if dir.exists() {
            return Err(ManagerError::LocationOccupied(dir));
        }
        fs::create_dir_all(&dir).map_err(io_ctx(format!("create {:?}", dir)))?;
        let workspace = Workspace::new(&name)?;
        if let Err(err) = Self::write_workspace(&workspace, &dir) {
            let _ = fs::remove_dir_all(&dir);
            return Err(err);
        }
        self.registry.insert(
            &name,
            RegistryEntry {
                location: dir,
                last_edited: workspace.last_edited(),
            },
        );
        self.registry.save()?;
        Ok(())
    }

    fn encode(workspace: &Workspace) -> Result<Vec<u8>, ManagerError> {
        let text = serde_yaml::to_string(workspace)?;
        match workspace.password() {
            Some(password) => Ok(crypto::encrypt(&text, password)?),
            None => Ok(text.into_bytes()),
        }
    }

    fn write_workspace(workspace: &Workspace, dir: &Path) -> Result<(), ManagerError> {
        let bytes = Self::encode(workspace)?;
        storage::write_atomic(&dir.join(WORKSPACE_FILE), &bytes)?;
        Ok(())
    }

    fn parse_plaintext(bytes: &[u8]) -> Result<Workspace, serde_yaml::Error> {
        serde_yaml::from_slice(bytes)
    }

    /// Probes whether a workspace's data file is in the encrypted form.
    /// The check is content-based: bytes that fail to parse as the
    /// plaintext serialization are taken to be encrypted. Unregistered or
    /// unreadable files report `false`; those surface as open errors.
    pub fn is_encrypted(&self, name: &str) -> bool {
        let Some(entry) = self.registry.get(name) else {
            return false;
        };
        match fs::read(entry.location.join(WORKSPACE_FILE)) {
            Ok(bytes) => Self::parse_plaintext(&bytes).is_err(),
            Err(_) => false,
        }
    }

    /// Loads a workspace into the open slot. Encrypted content with no
    /// password supplied yields `PasswordRequired`, so a caller can prompt
    /// and re-invoke; a wrong password (or corrupted file) yields
    /// `BadPassword` and never partial data.
    pub fn open(&mut self, name: &str, password: Option<&str>) -> Result<&mut Workspace, ManagerError> {
        if let Some(open) = &self.current {
            return Err(ManagerError::AlreadyOpen(open.name.clone()));
        }
        let entry = self
            .registry
            .get(name)
            .ok_or_else(|| ManagerError::NotFound(name.to_string()))?;
        let data_path = entry.location.join(WORKSPACE_FILE);
        let bytes = fs::read(&data_path).map_err(io_ctx(format!("read {:?}", data_path)))?;
        let mut workspace = match Self::parse_plaintext(&bytes) {
            Ok(workspace) => workspace,
            Err(_) => {
                let password = password
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| ManagerError::PasswordRequired(name.to_string()))?;
                let text = crypto::decrypt(&bytes, password)?;
                let mut workspace: Workspace = serde_yaml::from_str(&text)?;
                workspace.set_password(Some(password));
                workspace
            }
        };
        workspace.normalize();
        Ok(self.current.get_or_insert(workspace))
    }

    /// Stamps last-modified, serializes the full tree, encrypts when a
    /// password is set, and writes atomically. Also refreshes the
    /// registry's cached timestamp.
    pub fn save(&mut self) -> Result<(), ManagerError> {
        let workspace = self.current.as_mut().ok_or(ManagerError::NothingOpen)?;
        let entry = self
            .registry
            .get(&workspace.name)
            .ok_or_else(|| ManagerError::NotFound(workspace.name.clone()))?;
        let location = entry.location.clone();
        workspace.update_last_edited();
        Self::write_workspace(workspace, &location)?;
        self.registry.touch(&workspace.name, workspace.last_edited());
        self.registry.save()?;
        Ok(())
    }

    /// Releases the open slot without writing. Returns the name of the
    /// workspace that was open.
    pub fn close(&mut self) -> Result<String, ManagerError> {
        match self.current.take() {
            Some(workspace) => Ok(workspace.name),
            None => Err(ManagerError::NothingOpen),
        }
    }

    /// Removes a workspace's entire on-disk subtree and registry entry.
    /// Refused for the currently open workspace.
    pub fn delete(&mut self, name: &str) -> Result<(), ManagerError> {
        if let Some(open) = &self.current {
            if open.name == name {
                return Err(ManagerError::DeleteWhileOpen(name.to_string()));
            }
        }
        let entry = self
            .registry
            .get(name)
            .cloned()
            .ok_or_else(|| ManagerError::NotFound(name.to_string()))?;
        fs::remove_dir_all(&entry.location)
            .map_err(io_ctx(format!("remove {:?}", entry.location)))?;
        self.registry.remove(name);
        self.registry.save()?;
        Ok(())
    }

    /// Renames a workspace: open, rename in memory, save under the old
    /// path, close, move the directory, rewrite the registry key. If the
    /// directory move fails the content under the old path already
    /// carries the new name while the registry still lists the old key;
    /// that narrow window is accepted.
    pub fn rename(&mut self, old: &str, new: &str, password: Option<&str>) -> Result<(), ManagerError> {
        let new = Self::validate_name(new)?;
        if self.registry.contains(&new) {
            return Err(ManagerError::AlreadyRegistered(new));
        }
        let new_dir = self.workspaces_dir.join(&new);
        if new_dir.exists() {
            return Err(ManagerError::LocationOccupied(new_dir));
        }
        self.open(old, password)?;
        let old_location = match self.registry.get(old) {
            Some(entry) => entry.location.clone(),
            None => {
                self.current = None;
                return Err(ManagerError::NotFound(old.to_string()));
            }
        };
        let workspace = self.current.as_mut().ok_or(ManagerError::NothingOpen)?;
        workspace.name = new.clone();
        workspace.update_last_edited();
        let last_edited = workspace.last_edited();
        let written = Self::write_workspace(workspace, &old_location);
        self.current = None;
        written?;
        fs::rename(&old_location, &new_dir)
            .map_err(io_ctx(format!("rename {:?} to {:?}", old_location, new_dir)))?;
        self.registry.remove(old);
        self.registry.insert(
            &new,
            RegistryEntry {
                location: new_dir,
                last_edited,
            },
        );
        self.registry.save()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Card;
    use tempfile::tempdir;

    fn manager(dir: &Path) -> WorkspaceManager {
        WorkspaceManager::new(dir).unwrap()
    }

    #[test]
    fn create_registers_and_leaves_slot_free() {
        let dir = tempdir().unwrap();
        let mut m = manager(dir.path());
        m.create("Proj").unwrap();
        assert!(m.registry().contains("Proj"));
        assert!(m.current().is_none());

        let ws = m.open("Proj", None).unwrap();
        assert_eq!(ws.name, "Proj");
        assert_eq!(ws.boards().len(), 1);
        assert!(ws.selected_board().lists().is_empty());
    }

    #[test]
    fn create_validates_names() {
        let dir = tempdir().unwrap();
        let mut m = manager(dir.path());
        assert!(matches!(m.create("  "), Err(ManagerError::EmptyName)));
        assert!(matches!(m.create("a/b"), Err(ManagerError::InvalidName(_))));
        m.create("Proj").unwrap();
        assert!(matches!(
            m.create("Proj"),
            Err(ManagerError::AlreadyRegistered(_))
        ));
    }

    #[test]
    fn create_refuses_occupied_location() {
        let dir = tempdir().unwrap();
        let mut m = manager(dir.path());
        fs::create_dir_all(dir.path().join(WORKSPACES_DIR).join("Taken")).unwrap();
        assert!(matches!(
            m.create("Taken"),
            Err(ManagerError::LocationOccupied(_))
        ));
    }

    #[test]
    fn mutations_survive_save_and_reopen() {
        let dir = tempdir().unwrap();
        let mut m = manager(dir.path());
        m.create("Proj").unwrap();

        let ws = m.open("Proj", None).unwrap();
        let board = ws.selected_board_mut();
        board.create_list("Todo", "").unwrap();
        board
            .get_list_mut("Todo")
            .unwrap()
            .add_card(Card::new("Buy milk", "", None, 0).unwrap());
        m.save().unwrap();
        m.close().unwrap();

        let ws = m.open("Proj", None).unwrap();
        let list = ws.selected_board().get_list("Todo").unwrap();
        assert_eq!(list.card_count(), 1);
        assert_eq!(list.cards()[0].name, "Buy milk");
    }

    #[test]
    fn exclusivity_keeps_first_workspace_open() {
        let dir = tempdir().unwrap();
        let mut m = manager(dir.path());
        m.create("A").unwrap();
        m.create("B").unwrap();
        m.open("A", None).unwrap();
        match m.open("B", None) {
            Err(ManagerError::AlreadyOpen(name)) => assert_eq!(name, "A"),
            other => panic!("expected AlreadyOpen, got {other:?}"),
        }
        assert_eq!(m.current().map(|ws| ws.name.as_str()), Some("A"));
    }

    #[test]
    fn password_flow_end_to_end() {
        let dir = tempdir().unwrap();
        let mut m = manager(dir.path());
        m.create("Proj").unwrap();

        let ws = m.open("Proj", None).unwrap();
        ws.set_password(Some("s3cr3t"));
        m.save().unwrap();
        m.close().unwrap();

        assert!(m.is_encrypted("Proj"));
        let raw = fs::read(
            dir.path()
                .join(WORKSPACES_DIR)
                .join("Proj")
                .join(WORKSPACE_FILE),
        )
        .unwrap();
        assert!(serde_yaml::from_slice::<Workspace>(&raw).is_err());

        assert!(matches!(
            m.open("Proj", None),
            Err(ManagerError::PasswordRequired(_))
        ));
        assert!(matches!(
            m.open("Proj", Some("wrong")),
            Err(ManagerError::BadPassword)
        ));
        assert!(m.current().is_none());

        let ws = m.open("Proj", Some("s3cr3t")).unwrap();
        assert_eq!(ws.name, "Proj");
        assert!(ws.has_password());
    }

    #[test]
    fn clearing_password_saves_plaintext_again() {
        let dir = tempdir().unwrap();
        let mut m = manager(dir.path());
        m.create("Proj").unwrap();
        let ws = m.open("Proj", None).unwrap();
        ws.set_password(Some("pw"));
        m.save().unwrap();
        m.close().unwrap();
        assert!(m.is_encrypted("Proj"));

        let ws = m.open("Proj", Some("pw")).unwrap();
        ws.set_password(None);
        m.save().unwrap();
        m.close().unwrap();
        assert!(!m.is_encrypted("Proj"));
        m.open("Proj", None).unwrap();
    }

    #[test]
    fn move_card_scenario() {
        let dir = tempdir().unwrap();
        let mut m = manager(dir.path());
        m.create("Proj").unwrap();
        let ws = m.open("Proj", None).unwrap();
        let board = ws.selected_board_mut();
        board.create_list("A", "").unwrap();
        board.create_list("B", "").unwrap();
        let x = Card::new("X", "", None, 0).unwrap();
        board.get_list_mut("A").unwrap().add_card(x.clone());
        let before = board.total_cards();
        board.move_card(&x, "A", "B").unwrap();
        assert!(board.get_list("A").unwrap().find_card("X").is_none());
        assert!(board.get_list("B").unwrap().find_card("X").is_some());
        assert_eq!(board.total_cards(), before);
    }

    #[test]
    fn save_requires_open_workspace() {
        let dir = tempdir().unwrap();
        let mut m = manager(dir.path());
        assert!(matches!(m.save(), Err(ManagerError::NothingOpen)));
        assert!(matches!(m.close(), Err(ManagerError::NothingOpen)));
    }

    #[test]
    fn delete_refuses_open_workspace_then_removes_subtree() {
        let dir = tempdir().unwrap();
        let mut m = manager(dir.path());
        m.create("Proj").unwrap();
        m.open("Proj", None).unwrap();
        assert!(matches!(
            m.delete("Proj"),
            Err(ManagerError::DeleteWhileOpen(_))
        ));
        m.close().unwrap();
        m.delete("Proj").unwrap();
        assert!(!m.registry().contains("Proj"));
        assert!(!dir.path().join(WORKSPACES_DIR).join("Proj").exists());
        assert!(matches!(m.delete("Proj"), Err(ManagerError::NotFound(_))));
    }

    #[test]
    fn rename_moves_directory_and_registry_key() {
        let dir = tempdir().unwrap();
        let mut m = manager(dir.path());
        m.create("Old").unwrap();
        m.rename("Old", "New", None).unwrap();
        assert!(!m.registry().contains("Old"));
        assert!(m.registry().contains("New"));
        assert!(dir.path().join(WORKSPACES_DIR).join("New").exists());
        assert!(!dir.path().join(WORKSPACES_DIR).join("Old").exists());
        let ws = m.open("New", None).unwrap();
        assert_eq!(ws.name, "New");
    }

    #[test]
    fn rename_encrypted_workspace_needs_its_password() {
        let dir = tempdir().unwrap();
        let mut m = manager(dir.path());
        m.create("Old").unwrap();
        let ws = m.open("Old", None).unwrap();
        ws.set_password(Some("pw"));
        m.save().unwrap();
        m.close().unwrap();

        assert!(matches!(
            m.rename("Old", "New", None),
            Err(ManagerError::PasswordRequired(_))
        ));
        m.rename("Old", "New", Some("pw")).unwrap();
        assert!(m.is_encrypted("New"));
        let ws = m.open("New", Some("pw")).unwrap();
        assert_eq!(ws.name, "New");
    }

    #[test]
    fn rename_rejects_collisions() {
        let dir = tempdir().unwrap();
        let mut m = manager(dir.path());
        m.create("A").unwrap();
        m.create("B").unwrap();
        assert!(matches!(
            m.rename("A", "B", None),
            Err(ManagerError::AlreadyRegistered(_))
        ));
        assert!(matches!(
            m.rename("Missing", "C", None),
            Err(ManagerError::NotFound(_))
        ));
    }

    #[test]
    fn corrupt_data_file_is_local_failure_not_registry_reset() {
        let dir = tempdir().unwrap();
        let mut m = manager(dir.path());
        m.create("Good").unwrap();
        m.create("Bad").unwrap();
        fs::write(
            dir.path()
                .join(WORKSPACES_DIR)
                .join("Bad")
                .join(WORKSPACE_FILE),
            // Not valid UTF-8, and far too short to be an encrypted blob.
            [0u8, 159, 146, 150],
        )
        .unwrap();

        // Fails as an open error (probed as encrypted, then rejected).
        assert!(matches!(
            m.open("Bad", Some("anything")),
            Err(ManagerError::BadPassword)
        ));

        // The registry still knows both workspaces.
        let m = manager(dir.path());
        assert!(m.registry().contains("Good"));
        assert!(m.registry().contains("Bad"));
    }

    #[test]
    fn selected_board_index_is_clamped_on_load() {
        let dir = tempdir().unwrap();
        let mut m = manager(dir.path());
        m.create("Proj").unwrap();
        let path = dir
            .path()
            .join(WORKSPACES_DIR)
            .join("Proj")
            .join(WORKSPACE_FILE);
        fs::write(
            &path,
            "name: Proj\nselected_board: 9\nboards:\n  - name: Only\n",
        )
        .unwrap();
        let ws = m.open("Proj", None).unwrap();
        assert_eq!(ws.selected_index(), 0);
        assert_eq!(ws.selected_board().name, "Only");
    }
}
