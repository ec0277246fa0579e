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

use super::{put_count, put_field, take_count, take_field};
use std::collections::BTreeMap;

/// A map value: unique string fields, iterated in field order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MapHandler {
    entries: BTreeMap<String, String>,
}

impl MapHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a stored blob. `None` means the blob does not follow the codec
    /// layout; callers treat that as a malformed entry.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let mut view = bytes;
        let count = take_count(&mut view)?;
        let mut entries = BTreeMap::new();
        for _ in 0..count {
            let field = take_field(&mut view)?;
            let value = take_field(&mut view)?;
            entries.insert(field, value);
        }
        if !view.is_empty() {
            return None;
        }
        Some(Self { entries })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        put_count(&mut buf, self.entries.len());
        for (field, value) in &self.entries {
            put_field(&mut buf, field);
            put_field(&mut buf, value);
        }
        buf
    }

    /// Insert or replace. Always succeeds.
    pub fn add(&mut self, field: &str, value: &str) {
        self.entries.insert(field.to_string(), value.to_string());
    }

    /// Idempotent removal; reports whether the field was present.
    pub fn remove(&mut self, field: &str) -> bool {
        self.entries.remove(field).is_some()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries.get(field).map(String::as_str)
    }

    pub fn exists(&self, field: &str) -> bool {
        self.entries.contains_key(field)
    }

    pub fn strlen(&self, field: &str) -> Option<usize> {
        self.entries.get(field).map(String::len)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str)
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(f, v)| (f.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trip() {
        let mut handler = MapHandler::new();
        handler.add("f1", "v1");
        handler.add("f2", "value with spaces");
        handler.add("colons", "a:b:c");
        handler.add("empty", "");
        let decoded = MapHandler::from_bytes(&handler.to_bytes()).unwrap();
        assert_eq!(decoded, handler);
    }

    #[test]
    fn empty_round_trip() {
        let handler = MapHandler::new();
        assert_eq!(MapHandler::from_bytes(&handler.to_bytes()).unwrap(), handler);
    }

    #[test]
    fn add_replaces() {
        let mut handler = MapHandler::new();
        handler.add("f", "old");
        handler.add("f", "new");
        assert_eq!(handler.get("f"), Some("new"));
        assert_eq!(handler.count(), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut handler = MapHandler::new();
        handler.add("f", "v");
        assert!(handler.remove("f"));
        assert!(!handler.remove("f"));
        assert_eq!(handler.count(), 0);
    }

    #[test]
    fn iteration_is_field_ordered() {
        let mut handler = MapHandler::new();
        handler.add("b", "2");
        handler.add("a", "1");
        handler.add("c", "3");
        let fields: Vec<_> = handler.fields().collect();
        assert_eq!(fields, vec!["a", "b", "c"]);
    }

    #[test]
    fn rejects_trailing_garbage() {
        let mut handler = MapHandler::new();
        handler.add("f", "v");
        let mut bytes = handler.to_bytes();
        bytes.push(0);
        assert!(MapHandler::from_bytes(&bytes).is_none());
    }
}
