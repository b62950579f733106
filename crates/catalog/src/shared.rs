//! Thread-safe access to one [`Library`].

use std::sync::{Arc, RwLock};

use crate::error::{LibraryError, LibraryResult};
use crate::library::{Library, LibraryCommand, LibraryEvent};
use crate::statistics::LibraryStatistics;

/// A library shared across threads.
///
/// Every mutation takes the exclusive lock for its whole duration; reads take
/// the shared lock. References never outlive the closure they are handed to.
#[derive(Debug, Clone)]
pub struct SharedLibrary {
    inner: Arc<RwLock<Library>>,
}

impl SharedLibrary {
    pub fn new(library: Library) -> Self {
        Self {
            inner: Arc::new(RwLock::new(library)),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&Library) -> R) -> LibraryResult<R> {
        let guard = self.inner.read().map_err(|_| LibraryError::LockPoisoned)?;
        Ok(f(&guard))
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut Library) -> LibraryResult<R>) -> LibraryResult<R> {
        let mut guard = self.inner.write().map_err(|_| LibraryError::LockPoisoned)?;
        f(&mut guard)
    }

    pub fn dispatch(&self, command: &LibraryCommand) -> LibraryResult<Vec<LibraryEvent>> {
        self.write(|library| library.dispatch(command))
    }

    pub fn statistics(&self) -> LibraryResult<LibraryStatistics> {
        self.read(Library::statistics)
    }
}
