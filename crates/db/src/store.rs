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

//! Physical store: one fjall keyspace per database, with a single `entries`
//! partition as the flat namespace all logical entries are encoded into.
//! Handles are cheap to clone and safe to use from worker threads.

use crate::error::StoreError;
use fjall::{Config, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;

const ENTRIES_PARTITION: &str = "entries";

#[derive(Clone)]
pub struct Store {
    keyspace: fjall::Keyspace,
    entries: PartitionHandle,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let keyspace = Config::new(path).open()?;
        let entries =
            keyspace.open_partition(ENTRIES_PARTITION, PartitionCreateOptions::default())?;
        Ok(Self { keyspace, entries })
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key)?.map(|slice| slice.to_vec()))
    }

    pub fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.contains_key(key)?)
    }

    pub fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        Ok(self.entries.insert(key, value)?)
    }

    pub fn delete(&self, key: &str) -> Result<(), StoreError> {
        Ok(self.entries.remove(key)?)
    }

    /// Iterate every physical row. The iterator reads from a consistent view
    /// of the LSM tree and may be held across long scans; cancellation checks
    /// belong to the caller's loop.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = Result<(Vec<u8>, Vec<u8>), StoreError>> + '_ {
        self.entries
            .iter()
            .map(|kv| kv.map(|(k, v)| (k.to_vec(), v.to_vec())).map_err(StoreError::from))
    }

    /// Bytes on disk for this keyspace.
    pub fn disk_space(&self) -> u64 {
        self.keyspace.disk_space()
    }

    /// Flush the journal to stable storage. Called on orderly shutdown.
    pub fn persist(&self) -> Result<(), StoreError> {
        Ok(self.keyspace.persist(PersistMode::SyncAll)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_ops_and_iteration() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();

        store.put("a", b"1").unwrap();
        store.put("b", b"2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some(b"1".as_slice()));
        assert!(store.contains("b").unwrap());
        assert_eq!(store.get("missing").unwrap(), None);

        store.delete("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        // Double delete is a no-op.
        store.delete("a").unwrap();

        let rows: Vec<_> = store.iter().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, b"b");
    }
}
