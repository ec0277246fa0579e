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
use beryl_common::glob_match;

/// A multimap value: fields may repeat, insertion order is preserved.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MultiMapHandler {
    entries: Vec<(String, String)>,
}

impl MultiMapHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let mut view = bytes;
        let count = take_count(&mut view)?;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let field = take_field(&mut view)?;
            let value = take_field(&mut view)?;
            entries.push((field, value));
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

    pub fn add(&mut self, field: &str, value: &str) {
        self.entries.push((field.to_string(), value.to_string()));
    }

    /// Remove every entry with this field; reports how many went away.
    pub fn remove(&mut self, field: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(f, _)| f != field);
        before - self.entries.len()
    }

    /// All fields whose value matches the glob pattern, in insertion order.
    pub fn find(&self, value_pattern: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, v)| glob_match(value_pattern, v))
            .map(|(f, _)| f.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(f, _)| f.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trip_with_duplicates() {
        let mut handler = MultiMapHandler::new();
        handler.add("f", "v1");
        handler.add("f", "v2");
        handler.add("g", "v1");
        let decoded = MultiMapHandler::from_bytes(&handler.to_bytes()).unwrap();
        assert_eq!(decoded, handler);
        assert_eq!(decoded.count(), 3);
    }

    #[test]
    fn remove_takes_all_duplicates() {
        let mut handler = MultiMapHandler::new();
        handler.add("f", "v1");
        handler.add("f", "v2");
        handler.add("g", "v3");
        assert_eq!(handler.remove("f"), 2);
        assert_eq!(handler.count(), 1);
        assert_eq!(handler.remove("f"), 0);
    }

    #[test]
    fn find_matches_values() {
        let mut handler = MultiMapHandler::new();
        handler.add("a", "red");
        handler.add("b", "green");
        handler.add("c", "red");
        assert_eq!(handler.find("red"), vec!["a", "c"]);
        assert_eq!(handler.find("gr*"), vec!["b"]);
        assert!(handler.find("blue").is_empty());
    }
}
