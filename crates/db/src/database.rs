// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use crate::error::StoreError;
use crate::store::Store;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// One user database: a named store directory plus the teardown coordination
/// state. Shared by reference between sessions, timers and workers.
pub struct Database {
    name: String,
    path: PathBuf,
    store: Store,
    closing: AtomicBool,
    in_flight: AtomicUsize,
}

impl Database {
    pub fn open(name: &str, path: &Path) -> Result<Arc<Self>, StoreError> {
        let store = Store::open(path)?;
        Ok(Arc::new(Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            store,
            closing: AtomicBool::new(false),
            in_flight: AtomicUsize::new(0),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Once set, in-flight queries fail with an interrupt at their next
    /// cancellation check, and no new queries are accepted for this database.
    pub fn set_closing(&self) {
        self.closing.store(true, Ordering::SeqCst);
    }

    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// Keeps the owning database's in-flight count while a query referencing it
/// is anywhere in the pipeline. Teardown drains by waiting for this count.
pub struct DrainGuard {
    database: Arc<Database>,
}

impl DrainGuard {
    pub fn new(database: Arc<Database>) -> Self {
        database.in_flight.fetch_add(1, Ordering::SeqCst);
        Self { database }
    }
}

impl Drop for DrainGuard {
    fn drop(&mut self) {
        self.database.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_guard_counts() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = Database::open("t", dir.path()).unwrap();
        assert_eq!(db.in_flight(), 0);
        let g1 = DrainGuard::new(db.clone());
        let g2 = DrainGuard::new(db.clone());
        assert_eq!(db.in_flight(), 2);
        drop(g1);
        assert_eq!(db.in_flight(), 1);
        drop(g2);
        assert_eq!(db.in_flight(), 0);
    }
}
