//! JSON file credential store.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use bazaar_core::{CredentialPair, CredentialStore};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// On-disk document. Field names are the fixed storage keys.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredentials {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

/// Credential store persisted as a single JSON file.
///
/// Writes go to a temporary sibling and are renamed into place under an
/// exclusive advisory lock, so concurrent processes never observe a torn
/// document. Any read or write failure degrades to "no credentials".
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store backed by the given file. The file need not exist.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the credential document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the current pair was written, if one is stored.
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.read_stored().ok().flatten().and_then(|s| s.saved_at)
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn read_stored(&self) -> io::Result<Option<StoredCredentials>> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let stored = serde_json::from_str(&json)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Some(stored))
    }

    fn with_lock<T>(&self, f: impl FnOnce() -> io::Result<T>) -> io::Result<T> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;

        lock_file.lock_exclusive()?;
        let result = f();
        lock_file.unlock()?;

        result
    }

    fn write_atomic(&self, stored: &StoredCredentials) -> io::Result<()> {
        let json = serde_json::to_string_pretty(stored)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("credentials.json");
        let tmp_path = self
            .path
            .with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()));

        let mut file = File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        // Restrictive permissions before the document becomes visible
        #[cfg(unix)]
        fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> Option<CredentialPair> {
        match self.read_stored() {
            Ok(Some(stored)) => {
                let pair = CredentialPair::from_parts(
                    stored.access_token.as_deref().unwrap_or_default(),
                    stored.refresh_token.as_deref().unwrap_or_default(),
                );
                if pair.is_none() {
                    debug!("Stored credentials incomplete, treating as empty");
                }
                pair
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Credential file unreadable, treating as empty");
                None
            }
        }
    }

    #[instrument(skip(self, pair), fields(path = %self.path.display()))]
    fn save(&self, pair: &CredentialPair) {
        let stored = StoredCredentials {
            access_token: Some(pair.access_token.as_str().to_string()),
            refresh_token: Some(pair.refresh_token.as_str().to_string()),
            saved_at: Some(Utc::now()),
        };

        match self.with_lock(|| self.write_atomic(&stored)) {
            Ok(()) => debug!("Credentials saved"),
            Err(e) => warn!(error = %e, "Failed to persist credentials"),
        }
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn clear(&self) {
        let result = self.with_lock(|| match fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        });

        match result {
            Ok(()) => debug!("Credentials cleared"),
            Err(e) => warn!(error = %e, "Failed to clear credentials"),
        }
    }
}
