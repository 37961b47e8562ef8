use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};

pub type SessionToken = String;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session slot io error at {}: {source}", path.display())]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("session slot is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Io { code: "session_store".into(), message: err.to_string() }
    }
}

/// A persisted bearer-token slot with an absolute expiry.
/// Expiry is the medium's concern: an expired slot reads as absent.
pub trait SessionStore: Send + Sync {
    fn set(&self, token: &str, ttl: Duration) -> Result<(), SessionError>;
    fn get(&self) -> Result<Option<SessionToken>, SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Slot {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl Slot {
    fn new(token: &str, ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(1));
        Self { access_token: token.to_string(), expires_at: Utc::now() + ttl }
    }

    fn is_live(&self) -> bool { self.expires_at > Utc::now() }
}

/// In-process slot; gone when the process exits.
#[derive(Default)]
pub struct MemorySessionStore {
    slot: RwLock<Option<Slot>>,
}

impl MemorySessionStore {
    pub fn new() -> Self { Self::default() }
}

impl SessionStore for MemorySessionStore {
    fn set(&self, token: &str, ttl: Duration) -> Result<(), SessionError> {
        *self.slot.write() = Some(Slot::new(token, ttl));
        Ok(())
    }

    fn get(&self) -> Result<Option<SessionToken>, SessionError> {
        let mut expired = false;
        let out = match self.slot.read().as_ref() {
            Some(s) if s.is_live() => Some(s.access_token.clone()),
            Some(_) => { expired = true; None }
            None => None,
        };
        if expired {
            *self.slot.write() = None;
        }
        Ok(out)
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.slot.write() = None;
        Ok(())
    }
}

/// JSON slot file that survives restarts, playing the part of the browser cookie.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    pub fn path(&self) -> &Path { &self.path }

    fn io_err(&self, source: std::io::Error) -> SessionError {
        SessionError::Io { path: self.path.clone(), source }
    }
}

impl SessionStore for FileSessionStore {
    fn set(&self, token: &str, ttl: Duration) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
            }
        }
        let body = serde_json::to_vec_pretty(&Slot::new(token, ttl))?;
        let mut file = open_private(&self.path).map_err(|e| self.io_err(e))?;
        file.write_all(&body).map_err(|e| self.io_err(e))
    }

    fn get(&self) -> Result<Option<SessionToken>, SessionError> {
        let raw = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_err(e)),
        };
        let slot: Slot = serde_json::from_slice(&raw)?;
        if slot.is_live() {
            Ok(Some(slot.access_token))
        } else {
            debug!(target: "session", "slot at {} expired at {}", self.path.display(), slot.expires_at);
            self.clear()?;
            Ok(None)
        }
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }
}

/// Open the slot for writing, readable by the owner only.
#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
    let file = fs::OpenOptions::new().write(true).create(true).truncate(true).mode(0o600).open(path)?;
    // `mode` only applies on creation; tighten a slot left by an older run.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new().write(true).create(true).truncate(true).open(path)
}

/// Sole owner of the session slot. Created once by the shell and handed to the
/// API client and every auth gate; nothing else reads or writes the token.
#[derive(Clone)]
pub struct SessionProvider {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
}

impl SessionProvider {
    pub fn new(store: Arc<dyn SessionStore>, ttl: Duration) -> Self { Self { store, ttl } }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()), crate::config::DEFAULT_SESSION_TTL)
    }

    pub fn ttl(&self) -> Duration { self.ttl }

    /// Current token. An unreadable slot counts as no session.
    pub fn token(&self) -> Option<SessionToken> {
        match self.store.get() {
            Ok(t) => t,
            Err(e) => {
                warn!(target: "session", "session slot unreadable, treating as signed out: {}", e);
                None
            }
        }
    }

    pub fn is_present(&self) -> bool { self.token().is_some() }

    pub fn establish(&self, token: &str) -> AppResult<()> {
        self.store.set(token, self.ttl)?;
        debug!(target: "session", "session established ttl_secs={}", self.ttl.as_secs());
        Ok(())
    }

    pub fn clear(&self) {
        if let Err(e) = self.store.clear() {
            warn!(target: "session", "failed to clear session slot: {}", e);
        } else {
            debug!(target: "session", "session cleared");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn file_slot_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, b"{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileSessionStore::new(path.clone());
        store.set("tok-1", Duration::from_secs(60)).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o600);
        assert_eq!(store.get().unwrap().as_deref(), Some("tok-1"));
    }

    #[test]
    fn memory_store_roundtrip_and_clear() {
        let s = MemorySessionStore::new();
        assert_eq!(s.get().unwrap(), None);
        s.set("tok-1", Duration::from_secs(60)).unwrap();
        assert_eq!(s.get().unwrap().as_deref(), Some("tok-1"));
        s.clear().unwrap();
        assert_eq!(s.get().unwrap(), None);
    }

    #[test]
    fn expired_slot_reads_absent() {
        let s = MemorySessionStore::new();
        s.set("old", Duration::ZERO).unwrap();
        assert_eq!(s.get().unwrap(), None);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        FileSessionStore::new(&path).set("persisted", Duration::from_secs(3600)).unwrap();

        let reopened = FileSessionStore::new(&path);
        assert_eq!(reopened.get().unwrap().as_deref(), Some("persisted"));
        reopened.clear().unwrap();
        assert!(!path.exists());
        // clearing twice is fine
        reopened.clear().unwrap();
    }

    #[test]
    fn file_store_drops_expired_slot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileSessionStore::new(&path);
        store.set("stale", Duration::ZERO).unwrap();
        assert_eq!(store.get().unwrap(), None);
        assert!(!path.exists());
    }

    #[test]
    fn provider_treats_corrupt_slot_as_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"{not json").unwrap();
        let provider = SessionProvider::new(Arc::new(FileSessionStore::new(&path)), Duration::from_secs(60));
        assert_eq!(provider.token(), None);
        provider.establish("fresh").unwrap();
        assert_eq!(provider.token().as_deref(), Some("fresh"));
    }
}
