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

//! Expire and future timers: in-memory schedules keyed by fire time, swept
//! once per second. An expire firing synthesizes a point delete of its
//! logical entry; a future firing synthesizes a point write of its bound
//! value. A mutex guards each index since workers delete entries during
//! query execution while the event loop sweeps.

use crate::database::Database;
use crate::flusher::Flusher;
use crate::query::QueryCtx;
use crate::query::keys::{DelQuery, SetQuery};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// One scheduled firing. `value` is set for futures, absent for expires.
#[derive(Clone)]
pub struct ScheduleEntry {
    pub schedule: i64,
    pub added: i64,
    pub epoch: bool,
    pub database: Arc<Database>,
    pub select: String,
    pub key: String,
    pub value: Option<String>,
}

#[derive(Default)]
struct ScheduleIndex {
    by_time: Mutex<BTreeMap<i64, Vec<ScheduleEntry>>>,
}

impl ScheduleIndex {
    /// Schedule a firing, replacing any prior entry for the same
    /// (database, select, key). Returns the absolute fire time.
    fn add(
        &self,
        database: Arc<Database>,
        select: &str,
        key: &str,
        schedule: i64,
        epoch: bool,
        now: i64,
        value: Option<String>,
    ) -> i64 {
        let fire_at = if epoch { schedule } else { now + schedule };
        let entry = ScheduleEntry {
            schedule: fire_at,
            added: now,
            epoch,
            database,
            select: select.to_string(),
            key: key.to_string(),
            value,
        };
        let mut by_time = self.by_time.lock().unwrap();
        Self::remove_locked(&mut by_time, entry.database.name(), select, key);
        by_time.entry(fire_at).or_default().push(entry);
        fire_at
    }

    fn remove_locked(
        by_time: &mut BTreeMap<i64, Vec<ScheduleEntry>>,
        database: &str,
        select: &str,
        key: &str,
    ) -> Option<ScheduleEntry> {
        let mut found = None;
        let mut empty_slot = None;
        for (time, entries) in by_time.iter_mut() {
            if let Some(pos) = entries
                .iter()
                .position(|e| e.database.name() == database && e.select == select && e.key == key)
            {
                found = Some(entries.remove(pos));
                if entries.is_empty() {
                    empty_slot = Some(*time);
                }
                break;
            }
        }
        if let Some(time) = empty_slot {
            by_time.remove(&time);
        }
        found
    }

    fn delete(&self, database: &str, select: &str, key: &str) -> bool {
        let mut by_time = self.by_time.lock().unwrap();
        Self::remove_locked(&mut by_time, database, select, key).is_some()
    }

    /// Remove and return one entry, for firing it out of schedule.
    fn take(&self, database: &str, select: &str, key: &str) -> Option<ScheduleEntry> {
        let mut by_time = self.by_time.lock().unwrap();
        Self::remove_locked(&mut by_time, database, select, key)
    }

    fn trigger_time(&self, database: &str, select: &str, key: &str) -> Option<i64> {
        let by_time = self.by_time.lock().unwrap();
        for entries in by_time.values() {
            for e in entries {
                if e.database.name() == database && e.select == select && e.key == key {
                    return Some(e.schedule);
                }
            }
        }
        None
    }

    fn select_reset(&self, database: &str, select: &str) -> usize {
        let mut by_time = self.by_time.lock().unwrap();
        let mut removed = 0;
        by_time.retain(|_, entries| {
            let before = entries.len();
            entries.retain(|e| !(e.database.name() == database && e.select == select));
            removed += before - entries.len();
            !entries.is_empty()
        });
        removed
    }

    fn reset(&self) {
        self.by_time.lock().unwrap().clear();
    }

    fn count(&self, database: &str, select: &str) -> usize {
        let by_time = self.by_time.lock().unwrap();
        by_time
            .values()
            .flatten()
            .filter(|e| e.database.name() == database && e.select == select)
            .count()
    }

    fn count_all(&self) -> usize {
        self.by_time.lock().unwrap().values().map(Vec::len).sum()
    }

    fn entries(&self) -> Vec<ScheduleEntry> {
        self.by_time
            .lock()
            .unwrap()
            .values()
            .flatten()
            .cloned()
            .collect()
    }

    /// Detach every entry due at or before `now`.
    fn take_due(&self, now: i64) -> Vec<ScheduleEntry> {
        let mut by_time = self.by_time.lock().unwrap();
        let later = by_time.split_off(&(now + 1));
        let due = std::mem::replace(&mut *by_time, later);
        due.into_values().flatten().collect()
    }
}

macro_rules! delegate_index {
    () => {
        pub fn delete(&self, database: &str, select: &str, key: &str) -> bool {
            self.index.delete(database, select, key)
        }

        pub fn trigger_time(&self, database: &str, select: &str, key: &str) -> Option<i64> {
            self.index.trigger_time(database, select, key)
        }

        pub fn select_reset(&self, database: &str, select: &str) -> usize {
            self.index.select_reset(database, select)
        }

        pub fn reset(&self) {
            self.index.reset()
        }

        pub fn count(&self, database: &str, select: &str) -> usize {
            self.index.count(database, select)
        }

        pub fn count_all(&self) -> usize {
            self.index.count_all()
        }

        pub fn entries(&self) -> Vec<ScheduleEntry> {
            self.index.entries()
        }
    };
}

/// Pending expirations.
#[derive(Default)]
pub struct ExpireIndex {
    index: ScheduleIndex,
}

impl ExpireIndex {
    /// `epoch` means `schedule` is already an absolute time; otherwise it is
    /// a delta from `now`. Returns the absolute fire time.
    pub fn add(
        &self,
        database: Arc<Database>,
        select: &str,
        key: &str,
        schedule: i64,
        epoch: bool,
        now: i64,
    ) -> i64 {
        self.index.add(database, select, key, schedule, epoch, now, None)
    }

    delegate_index!();

    /// Fire everything due: each entry becomes a point delete of its logical
    /// entry, run through the flusher like any other query.
    pub fn flush(&self, now: i64, flusher: &Flusher) {
        for entry in self.index.take_due(now) {
            if entry.database.is_closing() {
                continue;
            }
            let ctx = QueryCtx::for_timer(entry.database.clone(), &entry.select);
            flusher.submit(DelQuery::for_timer(ctx, entry.key));
        }
    }
}

/// Pending deferred writes.
#[derive(Default)]
pub struct FutureIndex {
    index: ScheduleIndex,
}

impl FutureIndex {
    pub fn add(
        &self,
        database: Arc<Database>,
        select: &str,
        key: &str,
        schedule: i64,
        epoch: bool,
        now: i64,
        value: String,
    ) -> i64 {
        self.index
            .add(database, select, key, schedule, epoch, now, Some(value))
    }

    delegate_index!();

    /// Fire a pending future immediately, out of schedule.
    pub fn execute(&self, database: &str, select: &str, key: &str, flusher: &Flusher) -> bool {
        let Some(entry) = self.index.take(database, select, key) else {
            return false;
        };
        Self::fire(entry, flusher);
        true
    }

    pub fn flush(&self, now: i64, flusher: &Flusher) {
        for entry in self.index.take_due(now) {
            if entry.database.is_closing() {
                continue;
            }
            Self::fire(entry, flusher);
        }
    }

    fn fire(entry: ScheduleEntry, flusher: &Flusher) {
        let value = entry.value.unwrap_or_default();
        let ctx = QueryCtx::for_timer(entry.database, &entry.select);
        flusher.submit(SetQuery::for_timer(ctx, entry.key, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db(name: &str) -> (tempfile::TempDir, Arc<Database>) {
        let dir = tempfile::TempDir::new().unwrap();
        let db = Database::open(name, dir.path()).unwrap();
        (dir, db)
    }

    #[test]
    fn add_replaces_prior_entry() {
        let (_dir, db) = test_db("t");
        let index = ExpireIndex::default();
        let first = index.add(db.clone(), "1", "k", 10, false, 100);
        assert_eq!(first, 110);
        let second = index.add(db.clone(), "1", "k", 50, false, 100);
        assert_eq!(second, 150);
        assert_eq!(index.count_all(), 1);
        assert_eq!(index.trigger_time("t", "1", "k"), Some(150));
    }

    #[test]
    fn epoch_schedules_are_absolute() {
        let (_dir, db) = test_db("t");
        let index = ExpireIndex::default();
        assert_eq!(index.add(db, "1", "k", 500, true, 100), 500);
    }

    #[test]
    fn per_select_isolation() {
        let (_dir, db) = test_db("t");
        let index = ExpireIndex::default();
        index.add(db.clone(), "1", "k", 10, false, 0);
        index.add(db.clone(), "2", "k", 10, false, 0);
        assert_eq!(index.count_all(), 2);
        assert_eq!(index.count("t", "1"), 1);
        assert_eq!(index.select_reset("t", "2"), 1);
        assert_eq!(index.count_all(), 1);
        assert_eq!(index.trigger_time("t", "2", "k"), None);
    }

    #[test]
    fn delete_and_reset() {
        let (_dir, db) = test_db("t");
        let index = ExpireIndex::default();
        index.add(db.clone(), "1", "a", 10, false, 0);
        index.add(db.clone(), "1", "b", 10, false, 0);
        assert!(index.delete("t", "1", "a"));
        assert!(!index.delete("t", "1", "a"));
        index.reset();
        assert_eq!(index.count_all(), 0);
    }

    #[test]
    fn take_due_detaches_only_due_entries() {
        let (_dir, db) = test_db("t");
        let index = ScheduleIndex::default();
        index.add(db.clone(), "1", "soon", 5, false, 0, None);
        index.add(db.clone(), "1", "later", 50, false, 0, None);
        let due = index.take_due(10);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].key, "soon");
        assert_eq!(index.count_all(), 1);
    }
}
