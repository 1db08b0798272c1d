//! Signed-in session: the bearer token the gateway attaches to requests.
//!
//! Set on a successful sign-in, cleared on sign-out. Optionally persisted as
//! JSON so the CLI keeps the user signed in across invocations.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use catalog_common::gateway::CredentialProvider;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("session file {path} is corrupt: {source}")]
    Format {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub signed_in_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    session: RwLock<Option<Session>>,
    /// Where the session is persisted; `None` keeps it in memory only.
    path: Option<PathBuf>,
}

/// Default session file: `<cache dir>/catalog-admin/session.json`.
pub fn default_session_path() -> PathBuf {
    let cache = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
    cache.join("catalog-admin").join("session.json")
}

impl SessionStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a persisted store, loading the session saved at `path` if any.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let session = load_session(&path)?;
        if session.is_some() {
            debug!(path = %path.display(), "restored session");
        }
        Ok(Self {
            session: RwLock::new(session),
            path: Some(path),
        })
    }

    pub fn current(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current().is_some()
    }

    /// Store a freshly issued token (and persist it).
    pub fn sign_in(&self, token: impl Into<String>) -> Result<Session, SessionError> {
        let session = Session {
            token: token.into(),
            signed_in_at: Utc::now(),
        };
        if let Some(path) = &self.path {
            save_session(path, &session)?;
        }
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        info!("signed in");
        Ok(session)
    }

    /// Forget the token (and remove the persisted copy).
    pub fn sign_out(&self) -> Result<(), SessionError> {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = None;
        if let Some(path) = &self.path {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(SessionError::Io {
                        path: path.clone(),
                        source,
                    })
                }
            }
        }
        info!("signed out");
        Ok(())
    }
}

impl CredentialProvider for SessionStore {
    fn bearer_token(&self) -> Option<String> {
        self.current().map(|s| s.token)
    }
}

fn load_session(path: &Path) -> Result<Option<Session>, SessionError> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SessionError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&data)
        .map(Some)
        .map_err(|source| SessionError::Format {
            path: path.to_path_buf(),
            source,
        })
}

fn save_session(path: &Path, session: &Session) -> Result<(), SessionError> {
    let io_err = |source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let data = serde_json::to_string_pretty(session).map_err(|source| SessionError::Format {
        path: path.to_path_buf(),
        source,
    })?;

    // The file holds a bearer token: owner read/write only.
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(io_err)?;
    #[cfg(unix)]
    {
        // `mode` only applies when the file is created.
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .map_err(io_err)?;
    }
    file.write_all(data.as_bytes()).map_err(io_err)
}
