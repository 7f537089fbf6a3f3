//! Shared handler state: the backing file and the write lock.

use std::sync::Arc;

use parking_lot::Mutex;

use dca_core::{RawConfig, YamlConfigFile};

use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    file: YamlConfigFile,
    // Serializes load-modify-save so concurrent edits of different
    // sections cannot drop each other's changes.
    write_lock: Mutex<()>,
}

impl AppState {
    pub fn new(file: YamlConfigFile) -> Self {
        Self {
            inner: Arc::new(Inner {
                file,
                write_lock: Mutex::new(()),
            }),
        }
    }

    pub fn file(&self) -> &YamlConfigFile {
        &self.inner.file
    }

    /// The current document, or the editor defaults when no file exists.
    pub fn current(&self) -> Result<RawConfig, AppError> {
        Ok(self.inner.file.load_or_default()?)
    }

    /// Load, apply `edit`, and save under the write lock. Nothing is
    /// written when `edit` fails.
    pub fn update<F>(&self, edit: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut RawConfig) -> Result<(), AppError>,
    {
        let _guard = self.inner.write_lock.lock();
        let mut config = self.inner.file.load_or_default()?;
        edit(&mut config)?;
        self.inner.file.save(&config)?;
        Ok(())
    }
}
