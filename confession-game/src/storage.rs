//! Durable blob storage for the live session.
//!
//! The engine treats storage as an opaque key-value store of JSON strings.
//! Two adapters ship with the crate: an in-process map and a directory of
//! JSON files.
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::session::GameSession;

/// Trait for abstracting save/load operations.
/// Platform-specific implementations should provide this.
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the blob stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Replace the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be written durably.
    fn write(&self, key: &str, blob: &str) -> Result<(), Self::Error>;

    /// Delete the blob under `key`. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store refuses the delete.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

/// Serialize a session into its persisted JSON form.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_session(session: &GameSession) -> Result<String, serde_json::Error> {
    serde_json::to_string(session)
}

/// Parse a persisted blob back into a session.
///
/// # Errors
///
/// Returns an error if the blob is not a valid session document.
pub fn decode_session(blob: &str) -> Result<GameSession, serde_json::Error> {
    serde_json::from_str(blob)
}

/// Shared in-memory store. Clones see the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blobs: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Peek at a stored blob without going through the trait.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.blobs.borrow().get(key).cloned()
    }

    /// Seed a raw blob, e.g. to simulate a corrupt save.
    pub fn insert(&self, key: &str, blob: impl Into<String>) {
        self.blobs.borrow_mut().insert(key.to_string(), blob.into());
    }
}

impl GameStorage for MemoryStorage {
    type Error = std::convert::Infallible;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.get(key))
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), Self::Error> {
        self.insert(key, blob);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        self.blobs.borrow_mut().remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory. Writes go to a temp
/// file that is synced and renamed over the target, so a crash mid-write
/// never leaves a torn blob behind.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl GameStorage for FileStorage {
    type Error = io::Error;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), Self::Error> {
        let target = self.path_for(key);
        let tmp = target.with_extension("json.tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(blob.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &target)
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        match fs::remove_file(self.path_for(key)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}
