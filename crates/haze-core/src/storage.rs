//! Named persistent slots holding one string value each.
//!
//! A slot is the device-local equivalent of a browser storage key: it holds
//! a single serialized value that is always replaced as a whole.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::trace;

use crate::error::ErrorCode;
use crate::lock::{DEFAULT_LOCK_TIMEOUT, LockError, WriteLock};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("failed to encode slot content: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StorageError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } | Self::Encode(_) => ErrorCode::StorageWriteFailed,
            Self::Lock(err) => err.code(),
        }
    }
}

/// Transform applied by [`KeyValueSlot::update`] to the current content.
pub type SlotUpdate<'a> = dyn FnMut(Option<String>) -> Result<String, StorageError> + 'a;

/// A single named key/value slot.
pub trait KeyValueSlot {
    /// Current raw content, `None` when the slot was never written.
    fn read(&self) -> Result<Option<String>, StorageError>;

    /// Replace the slot content entirely.
    fn write(&self, value: &str) -> Result<(), StorageError>;

    /// Read, transform, and replace the content with no other writer
    /// getting in between.
    fn update(&self, apply: &mut SlotUpdate<'_>) -> Result<(), StorageError> {
        let next = apply(self.read()?)?;
        self.write(&next)
    }
}

impl<S: KeyValueSlot + ?Sized> KeyValueSlot for &S {
    fn read(&self) -> Result<Option<String>, StorageError> {
        (**self).read()
    }

    fn write(&self, value: &str) -> Result<(), StorageError> {
        (**self).write(value)
    }

    fn update(&self, apply: &mut SlotUpdate<'_>) -> Result<(), StorageError> {
        (**self).update(apply)
    }
}

impl<S: KeyValueSlot + ?Sized> KeyValueSlot for std::rc::Rc<S> {
    fn read(&self) -> Result<Option<String>, StorageError> {
        (**self).read()
    }

    fn write(&self, value: &str) -> Result<(), StorageError> {
        (**self).write(value)
    }

    fn update(&self, apply: &mut SlotUpdate<'_>) -> Result<(), StorageError> {
        (**self).update(apply)
    }
}

/// In-process slot.
#[derive(Debug, Default)]
pub struct MemorySlot {
    value: RefCell<Option<String>>,
}

impl MemorySlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-filled with raw content, corrupt or not.
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            value: RefCell::new(Some(raw.into())),
        }
    }

    /// Raw content currently held.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.value.borrow().clone()
    }
}

impl KeyValueSlot for MemorySlot {
    fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.value.borrow().clone())
    }

    fn write(&self, value: &str) -> Result<(), StorageError> {
        *self.value.borrow_mut() = Some(value.to_string());
        Ok(())
    }
}

/// Slot stored as `<dir>/<key>.json`.
///
/// Writes go to a sibling temp file that is renamed over the slot while an
/// exclusive advisory lock is held, so readers never observe partial content.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
    lock_timeout: Duration,
}

impl FileSlot {
    #[must_use]
    pub fn new(dir: &Path, key: &str) -> Self {
        Self {
            path: dir.join(format!("{key}.json")),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueSlot for FileSlot {
    fn read(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write(&self, value: &str) -> Result<(), StorageError> {
        replace_file(&self.path, value, self.lock_timeout)
    }

    fn update(&self, apply: &mut SlotUpdate<'_>) -> Result<(), StorageError> {
        let lock = WriteLock::for_file(&self.path, self.lock_timeout)?;
        let next = apply(self.read()?)?;
        replace_locked(&self.path, &next)?;
        lock.release();
        Ok(())
    }
}

/// Replace `path` with `content` under the advisory write lock.
pub(crate) fn replace_file(
    path: &Path,
    content: &str,
    lock_timeout: Duration,
) -> Result<(), StorageError> {
    let lock = WriteLock::for_file(path, lock_timeout)?;
    replace_locked(path, content)?;
    lock.release();
    Ok(())
}

/// Temp-file-and-rename replace. The caller holds the write lock.
pub(crate) fn replace_locked(path: &Path, content: &str) -> Result<(), StorageError> {
    let io_err = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp_name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, content).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;
    trace!(path = %path.display(), bytes = content.len(), "replaced file");
    Ok(())
}
