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

//! Instance settings: the `conf` map in the core database, cached in memory
//! and written through on change.

use beryl_db::{CoreDb, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::info;

pub struct Settings {
    core: Arc<CoreDb>,
    cache: RwLock<HashMap<String, String>>,
}

impl Settings {
    const DEFAULTS: &[(&str, &str)] = &[("syntaxhints", "true"), ("autojoin", "false")];

    pub fn new(core: Arc<CoreDb>) -> Result<Self, StoreError> {
        let settings = Self {
            core,
            cache: RwLock::new(HashMap::new()),
        };
        settings.load()?;
        Ok(settings)
    }

    fn load(&self) -> Result<(), StoreError> {
        info!("Loading settings.");
        let mut cache = self.cache.write().unwrap();
        for (key, value) in Self::DEFAULTS {
            cache.insert((*key).to_string(), (*value).to_string());
        }
        for key in self.core.map_fields("conf")? {
            if let Some(value) = self.core.map_get("conf", &key)? {
                cache.insert(key, value);
            }
        }
        Ok(())
    }

    /// Write the defaults through, first run only; operator-set values are
    /// never clobbered on a restart.
    pub fn set_defaults(&self) -> Result<(), StoreError> {
        if !self.core.map_fields("conf")?.is_empty() {
            return Ok(());
        }
        for (key, value) in Self::DEFAULTS {
            self.set(key, value)?;
        }
        Ok(())
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.cache
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self.core.map_set("conf", key, value)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.cache.read().unwrap().get(key).cloned()
    }

    pub fn as_bool(&self, key: &str) -> bool {
        matches!(self.get(key).as_deref(), Some("true") | Some("1"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_persistence() {
        let dir = tempfile::TempDir::new().unwrap();
        let core = Arc::new(CoreDb::open(dir.path()).unwrap());
        let settings = Settings::new(core.clone()).unwrap();
        settings.set_defaults().unwrap();
        assert!(settings.as_bool("syntaxhints"));
        settings.set("syntaxhints", "false").unwrap();
        assert!(!settings.as_bool("syntaxhints"));

        // A fresh instance over the same core database sees the stored value.
        let reloaded = Settings::new(core).unwrap();
        assert!(!reloaded.as_bool("syntaxhints"));
    }
}
