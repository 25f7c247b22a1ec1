use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::store::{AccessToken, StoreError, TokenStore, ACCESS_KEY};

/// Token persisted as a raw string in a single file.
///
/// The file lives in the local data directory, so a session survives a
/// restart of the program but not a change of user profile or machine.
/// Every read goes to disk.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(ACCESS_KEY)
    }

    fn staging_path(&self) -> PathBuf {
        self.dir.join(format!("{}.tmp", ACCESS_KEY))
    }

    fn unavailable(path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn set(&self, token: &AccessToken) -> Result<(), StoreError> {
        let path = self.path();
        std::fs::create_dir_all(&self.dir).map_err(|e| Self::unavailable(&self.dir, e))?;
        // Stage then rename so the slot never holds a partial token
        let staging = self.staging_path();
        std::fs::write(&staging, token.as_str()).map_err(|e| Self::unavailable(&staging, e))?;
        std::fs::rename(&staging, &path).map_err(|e| Self::unavailable(&path, e))?;
        debug!(path = %path.display(), "Token written");
        Ok(())
    }

    fn get(&self) -> Result<Option<AccessToken>, StoreError> {
        let path = self.path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(AccessToken::new(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::unavailable(&path, e)),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        let path = self.path();
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "Token file removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::unavailable(&path, e)),
        }
    }
}
