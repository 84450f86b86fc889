//! Guest credential lookup.
//!
//! Credentials live in a side-loaded JSON document mapping a machine key
//! (id or name) to a list of guest accounts:
//!
//! ```json
//! { "web-01": [ { "username": "ops", "password": "secret", "is_admin": true } ] }
//! ```
//!
//! The document is only read; the core never writes credentials other than
//! creating an empty document when none exists.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vboxmon_shared::errors::{VboxError, VboxResult};

use crate::machine::VirtualMachine;
use crate::runtime::constants::filenames;

/// One guest account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub username: String,
    pub password: String,
    pub is_admin: bool,
}

/// Per-machine guest accounts.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    users: HashMap<String, Vec<UserInfo>>,
    source: Option<PathBuf>,
}

impl CredentialStore {
    /// Store with no accounts.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load from an explicit document.
    pub fn from_file(path: &Path) -> VboxResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VboxError::Credentials(format!("failed to read {}: {}", path.display(), e))
        })?;
        let users: HashMap<String, Vec<UserInfo>> =
            serde_json::from_str(&content).map_err(|e| {
                VboxError::Credentials(format!("invalid document {}: {}", path.display(), e))
            })?;

        tracing::debug!(
            path = %path.display(),
            machines = users.len(),
            "Loaded guest credentials"
        );
        Ok(Self {
            users,
            source: Some(path.to_path_buf()),
        })
    }

    /// Search the default locations.
    ///
    /// Looks for `users.json` in the working directory, then in
    /// `<config dir>/vboxmon/`. If neither exists, the config directory is
    /// created with an empty `{}` document and an empty store is returned.
    pub fn discover() -> VboxResult<Self> {
        let config_dir = dirs::config_dir().map(|dir| dir.join(filenames::CONFIG_DIR));
        let cwd = std::env::current_dir().ok();
        Self::discover_in(cwd.as_deref(), config_dir.as_deref())
    }

    pub(crate) fn discover_in(cwd: Option<&Path>, config_dir: Option<&Path>) -> VboxResult<Self> {
        let candidates = cwd
            .into_iter()
            .chain(config_dir)
            .map(filenames::users_file);

        for candidate in candidates {
            if candidate.exists() {
                return Self::from_file(&candidate);
            }
        }

        if let Some(dir) = config_dir {
            let path = filenames::users_file(dir);
            std::fs::create_dir_all(dir)
                .and_then(|_| std::fs::write(&path, "{}"))
                .map_err(|e| {
                    VboxError::Credentials(format!("failed to create {}: {}", path.display(), e))
                })?;
            tracing::info!(path = %path.display(), "Created empty credential document");
        }

        Ok(Self::empty())
    }

    /// Accounts for a machine, looked up by id, then by name.
    pub fn users_for(&self, machine: &VirtualMachine) -> &[UserInfo] {
        self.users
            .get(machine.id())
            .or_else(|| self.users.get(machine.name()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Accounts stored under an exact key.
    pub fn get(&self, key: &str) -> &[UserInfo] {
        self.users.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Document this store was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}
