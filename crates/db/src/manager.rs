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

//! The database registry: user databases by name under one data directory,
//! plus the `core` database holding authentication maps and settings. All
//! registry mutation happens on the event loop; workers only read the
//! closing flag through their database handles.

use crate::codec::MapHandler;
use crate::database::Database;
use crate::error::StoreError;
use crate::keys::{EntryType, encode};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{info, warn};

/// Reserved for the core database; never a user database name.
pub const CORE_DB: &str = "core";

/// How long `delete` waits for in-flight queries to drain.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct DbManager {
    datadir: PathBuf,
    databases: RwLock<HashMap<String, Arc<Database>>>,
    default: RwLock<Option<Arc<Database>>>,
}

impl DbManager {
    pub fn new(datadir: &Path) -> Self {
        Self {
            datadir: datadir.to_path_buf(),
            databases: RwLock::new(HashMap::new()),
            default: RwLock::new(None),
        }
    }

    /// Open every database directory found under the data dir. Returns how
    /// many came up.
    pub fn open_all(&self) -> Result<usize, StoreError> {
        let entries = std::fs::read_dir(&self.datadir)
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let mut opened = 0;
        for entry in entries.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == CORE_DB {
                continue;
            }
            match self.load(&name) {
                Ok(_) => opened += 1,
                Err(e) => warn!("Unable to open database '{name}': {e}"),
            }
        }
        Ok(opened)
    }

    /// Open a database by name, creating its directory on first use.
    pub fn load(&self, name: &str) -> Result<Arc<Database>, StoreError> {
        if let Some(db) = self.find(name) {
            return Ok(db);
        }
        let path = self.datadir.join(name);
        let db = Database::open(name, &path)?;
        self.databases
            .write()
            .unwrap()
            .insert(name.to_string(), db.clone());
        info!("Database '{name}' opened");
        Ok(db)
    }

    /// Create a database that must not already exist.
    pub fn create(&self, name: &str) -> Result<Arc<Database>, StoreError> {
        if name == CORE_DB || self.find(name).is_some() {
            return Err(StoreError::DatabaseExists(name.to_string()));
        }
        self.load(name)
    }

    /// Tear a database down: mark it closing, wait for in-flight queries to
    /// drain, then drop it from the registry and remove its directory.
    /// Blocking; callers off the event loop run it on a blocking thread.
    pub fn delete(&self, name: &str) -> Result<(), StoreError> {
        let db = self
            .find(name)
            .ok_or_else(|| StoreError::NoSuchDatabase(name.to_string()))?;
        db.set_closing();

        let deadline = std::time::Instant::now() + DRAIN_TIMEOUT;
        while db.in_flight() > 0 {
            if std::time::Instant::now() > deadline {
                return Err(StoreError::DatabaseBusy(name.to_string()));
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        self.databases.write().unwrap().remove(name);
        {
            let mut default = self.default.write().unwrap();
            if default.as_ref().is_some_and(|d| d.name() == name) {
                *default = None;
            }
        }
        let path = db.path().to_path_buf();
        drop(db);
        if let Err(e) = std::fs::remove_dir_all(&path) {
            warn!("Unable to remove database directory {path:?}: {e}");
        }
        info!("Database '{name}' deleted");
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<Arc<Database>> {
        self.databases.read().unwrap().get(name).cloned()
    }

    pub fn set_default(&self, name: &str) -> bool {
        match self.find(name) {
            Some(db) => {
                *self.default.write().unwrap() = Some(db);
                true
            }
            None => false,
        }
    }

    pub fn default_db(&self) -> Option<Arc<Database>> {
        self.default.read().unwrap().clone()
    }

    pub fn list(&self) -> Vec<Arc<Database>> {
        let mut dbs: Vec<_> = self.databases.read().unwrap().values().cloned().collect();
        dbs.sort_by(|a, b| a.name().cmp(b.name()));
        dbs
    }

    /// Persist every open database. Part of orderly shutdown.
    pub fn close_all(&self) {
        for db in self.list() {
            if let Err(e) = db.store().persist() {
                warn!("Unable to persist database '{}': {e}", db.name());
            }
        }
    }
}

/// The core database: authentication maps (`userlogin`, `pass`, `created`,
/// `flags`) and the `conf` settings map, stored with the ordinary map codec
/// in select "1".
pub struct CoreDb {
    database: Arc<Database>,
}

impl CoreDb {
    pub fn open(datadir: &Path) -> Result<Self, StoreError> {
        let path = datadir.join(CORE_DB);
        let database = Database::open(CORE_DB, &path)?;
        Ok(Self { database })
    }

    fn dest(map: &str) -> String {
        encode(map, "1", EntryType::Map)
    }

    fn load_map(&self, map: &str) -> Result<MapHandler, StoreError> {
        let Some(bytes) = self.database.store().get(&Self::dest(map))? else {
            return Ok(MapHandler::new());
        };
        MapHandler::from_bytes(&bytes)
            .ok_or_else(|| StoreError::Storage(format!("malformed core map '{map}'")))
    }

    pub fn map_get(&self, map: &str, field: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load_map(map)?.get(field).map(str::to_string))
    }

    pub fn map_set(&self, map: &str, field: &str, value: &str) -> Result<(), StoreError> {
        let mut handler = self.load_map(map)?;
        handler.add(field, value);
        self.database
            .store()
            .put(&Self::dest(map), &handler.to_bytes())
    }

    pub fn map_del(&self, map: &str, field: &str) -> Result<(), StoreError> {
        let mut handler = self.load_map(map)?;
        if handler.remove(field) {
            if handler.count() == 0 {
                self.database.store().delete(&Self::dest(map))?;
            } else {
                self.database
                    .store()
                    .put(&Self::dest(map), &handler.to_bytes())?;
            }
        }
        Ok(())
    }

    pub fn map_fields(&self, map: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.load_map(map)?.fields().map(str::to_string).collect())
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.database
    }

    pub fn persist(&self) -> Result<(), StoreError> {
        self.database.store().persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_find_delete() {
        let dir = tempfile::TempDir::new().unwrap();
        let manager = DbManager::new(dir.path());
        let db = manager.create("mine").unwrap();
        assert_eq!(db.name(), "mine");
        assert!(matches!(
            manager.create("mine"),
            Err(StoreError::DatabaseExists(_))
        ));
        assert!(manager.find("mine").is_some());
        assert!(manager.set_default("mine"));
        assert_eq!(manager.default_db().unwrap().name(), "mine");

        drop(db);
        manager.delete("mine").unwrap();
        assert!(manager.find("mine").is_none());
        assert!(manager.default_db().is_none());
        assert!(!dir.path().join("mine").exists());
    }

    #[test]
    fn delete_unknown_database() {
        let dir = tempfile::TempDir::new().unwrap();
        let manager = DbManager::new(dir.path());
        assert!(matches!(
            manager.delete("ghost"),
            Err(StoreError::NoSuchDatabase(_))
        ));
    }

    #[test]
    fn core_maps() {
        let dir = tempfile::TempDir::new().unwrap();
        let core = CoreDb::open(dir.path()).unwrap();
        assert_eq!(core.map_get("pass", "root").unwrap(), None);
        core.map_set("pass", "root", "hash").unwrap();
        assert_eq!(core.map_get("pass", "root").unwrap().as_deref(), Some("hash"));
        core.map_set("pass", "alice", "hash2").unwrap();
        assert_eq!(core.map_fields("pass").unwrap(), vec!["alice", "root"]);
        core.map_del("pass", "alice").unwrap();
        assert_eq!(core.map_fields("pass").unwrap(), vec!["root"]);
    }
}
