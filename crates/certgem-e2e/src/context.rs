//! Browser storage state and the persisted authentication snapshot.
//!
//! The setup flow logs in once and writes the page's cookies and web storage
//! to `auth.json`. Specs that need an authenticated session declare the
//! snapshot as a precondition and restore it instead of logging in again.

use crate::result::{SuiteError, SuiteResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Cookie same-site setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SameSite {
    /// Strict same-site
    Strict,
    /// Lax same-site
    #[default]
    Lax,
    /// No same-site restriction
    None,
}

/// A browser cookie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Domain
    pub domain: String,
    /// Path
    pub path: String,
    /// Expiration timestamp (seconds since epoch)
    pub expires: Option<f64>,
    /// HTTP only flag
    pub http_only: bool,
    /// Secure flag
    pub secure: bool,
    /// Same site setting
    pub same_site: SameSite,
}

impl Cookie {
    /// Create a new cookie
    #[must_use]
    pub fn new(name: &str, value: &str, domain: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            domain: domain.to_string(),
            path: "/".to_string(),
            expires: None,
            http_only: false,
            secure: false,
            same_site: SameSite::Lax,
        }
    }

    /// Set expiration
    #[must_use]
    pub const fn with_expires(mut self, expires: f64) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Set HTTP only
    #[must_use]
    pub const fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }
}

/// Cookies plus local and session storage, keyed by origin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageState {
    /// Cookies
    pub cookies: Vec<Cookie>,
    /// Local storage data
    pub local_storage: HashMap<String, HashMap<String, String>>,
    /// Session storage data
    pub session_storage: HashMap<String, HashMap<String, String>>,
}

impl StorageState {
    /// Create empty storage state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cookie
    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Add local storage item
    #[must_use]
    pub fn with_local_storage(mut self, origin: &str, key: &str, value: &str) -> Self {
        self.local_storage
            .entry(origin.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Add session storage item
    #[must_use]
    pub fn with_session_storage(mut self, origin: &str, key: &str, value: &str) -> Self {
        self.session_storage
            .entry(origin.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Check if storage is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty() && self.local_storage.is_empty() && self.session_storage.is_empty()
    }

    /// Clear all storage
    pub fn clear(&mut self) {
        self.cookies.clear();
        self.local_storage.clear();
        self.session_storage.clear();
    }

    /// Origins that carry any web storage
    #[must_use]
    pub fn origins(&self) -> Vec<&str> {
        let mut origins: Vec<&str> = self
            .local_storage
            .keys()
            .chain(self.session_storage.keys())
            .map(String::as_str)
            .collect();
        origins.sort_unstable();
        origins.dedup();
        origins
    }
}

/// On-disk layout of the snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotFile {
    saved_at: DateTime<Utc>,
    #[serde(flatten)]
    state: StorageState,
}

/// The persisted authentication snapshot.
///
/// Written by the setup flow after a successful login, read by every spec
/// that declares an authenticated precondition. Consumers only ever call
/// [`AuthSnapshot::require`] or [`AuthSnapshot::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    path: PathBuf,
}

impl AuthSnapshot {
    /// Snapshot stored at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the snapshot has been written
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Persist `state`, replacing any previous snapshot.
    ///
    /// The file is written next to its destination and renamed into place so
    /// concurrent readers never observe a partial file.
    pub fn save(&self, state: &StorageState) -> SuiteResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = SnapshotFile {
            saved_at: Utc::now(),
            state: state.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::info!(
            path = %self.path.display(),
            cookies = state.cookies.len(),
            "saved authentication snapshot"
        );
        Ok(())
    }

    /// Load the snapshot and when it was written
    pub fn load(&self) -> SuiteResult<(StorageState, DateTime<Utc>)> {
        let json = std::fs::read_to_string(&self.path)?;
        let file: SnapshotFile = serde_json::from_str(&json)?;
        Ok((file.state, file.saved_at))
    }

    /// Load the snapshot, failing with a precondition error when absent
    pub fn require(&self) -> SuiteResult<StorageState> {
        if !self.exists() {
            return Err(SuiteError::SnapshotMissing {
                path: self.path.display().to_string(),
            });
        }
        let (state, saved_at) = self.load()?;
        tracing::debug!(path = %self.path.display(), %saved_at, "restoring authentication snapshot");
        Ok(state)
    }
}
