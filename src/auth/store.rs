//! Where the cached credential lives between runs.

use std::cell::{Cell, RefCell};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::StoredToken;

/// Load/save access to the cached credential.
pub trait TokenStore {
    fn load(&self) -> Result<Option<StoredToken>>;
    fn save(&self, token: &StoredToken) -> Result<()>;
}

/// JSON file on disk, overwritten on every save.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> Error {
        Error::TokenStore {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<StoredToken>> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no cached token");
                return Ok(None);
            }
            Err(e) => return Err(self.io_error(e)),
        };

        match serde_json::from_slice::<StoredToken>(&raw) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                // Unreadable cache: re-authorize rather than fail every run
                warn!(path = %self.path.display(), error = %e, "ignoring corrupt token cache");
                Ok(None)
            }
        }
    }

    fn save(&self, token: &StoredToken) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let json = serde_json::to_string_pretty(token)
            .map_err(|e| self.io_error(std::io::Error::new(ErrorKind::InvalidData, e)))?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path).map_err(|e| self.io_error(e))?;
        file.write_all(json.as_bytes())
            .map_err(|e| self.io_error(e))?;
        debug!(path = %self.path.display(), "token cache written");
        Ok(())
    }
}

/// In-process store, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RefCell<Option<StoredToken>>,
    saves: Cell<usize>,
}

impl MemoryTokenStore {
    pub fn new(token: Option<StoredToken>) -> Self {
        Self {
            token: RefCell::new(token),
            saves: Cell::new(0),
        }
    }

    pub fn current(&self) -> Option<StoredToken> {
        self.token.borrow().clone()
    }

    /// Number of times `save` was called.
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<StoredToken>> {
        Ok(self.current())
    }

    fn save(&self, token: &StoredToken) -> Result<()> {
        *self.token.borrow_mut() = Some(token.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}
