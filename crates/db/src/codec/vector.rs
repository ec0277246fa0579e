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
use beryl_common::{glob_match, is_number};

/// A vector value: an ordered sequence of strings.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VectorHandler {
    elements: Vec<String>,
}

impl VectorHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let mut view = bytes;
        let count = take_count(&mut view)?;
        let mut elements = Vec::with_capacity(count);
        for _ in 0..count {
            elements.push(take_field(&mut view)?);
        }
        if !view.is_empty() {
            return None;
        }
        Some(Self { elements })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        put_count(&mut buf, self.elements.len());
        for element in &self.elements {
            put_field(&mut buf, element);
        }
        buf
    }

    pub fn add(&mut self, value: &str) {
        self.elements.push(value.to_string());
    }

    pub fn pop_front(&mut self) -> Option<String> {
        if self.elements.is_empty() {
            return None;
        }
        Some(self.elements.remove(0))
    }

    pub fn pop_back(&mut self) -> Option<String> {
        self.elements.pop()
    }

    pub fn index(&self, n: usize) -> Option<&str> {
        self.elements.get(n).map(String::as_str)
    }

    pub fn exist(&self, value: &str) -> bool {
        self.elements.iter().any(|e| e == value)
    }

    /// Remove the first element equal to `value`.
    pub fn remove(&mut self, value: &str) -> bool {
        match self.elements.iter().position(|e| e == value) {
            Some(pos) => {
                self.elements.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Truncate to at most `n` elements.
    pub fn resize(&mut self, n: usize) {
        self.elements.truncate(n);
    }

    pub fn sort(&mut self) {
        self.elements.sort();
    }

    pub fn reverse(&mut self) {
        self.elements.reverse();
    }

    /// Elements matching the glob pattern, in order.
    pub fn find(&self, pattern: &str) -> Vec<String> {
        self.elements
            .iter()
            .filter(|e| glob_match(pattern, e))
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.elements.len()
    }

    pub fn repeats(&self, value: &str) -> usize {
        self.elements.iter().filter(|e| *e == value).count()
    }

    /// True when every element parses as a (possibly signed, possibly
    /// fractional) number. Aggregates are only defined in that case.
    pub fn is_numeric(&self) -> bool {
        self.elements.iter().all(|e| is_number(e, true))
    }

    fn numbers(&self) -> impl Iterator<Item = f64> + '_ {
        self.elements.iter().filter_map(|e| e.parse::<f64>().ok())
    }

    /// Simple mean over all elements.
    pub fn sma(&self) -> f64 {
        if self.elements.is_empty() {
            return 0.0;
        }
        self.sum() / self.elements.len() as f64
    }

    pub fn high(&self) -> f64 {
        self.numbers().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn low(&self) -> f64 {
        self.numbers().fold(f64::INFINITY, f64::min)
    }

    pub fn sum(&self) -> f64 {
        self.numbers().sum()
    }

    pub fn front(&self) -> Option<&str> {
        self.elements.first().map(String::as_str)
    }

    pub fn back(&self) -> Option<&str> {
        self.elements.last().map(String::as_str)
    }

    pub fn elements(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn of(values: &[&str]) -> VectorHandler {
        let mut handler = VectorHandler::new();
        for v in values {
            handler.add(v);
        }
        handler
    }

    #[test]
    fn round_trip_preserves_order() {
        let handler = of(&["c", "a", "b", "a", ""]);
        let decoded = VectorHandler::from_bytes(&handler.to_bytes()).unwrap();
        assert_eq!(decoded, handler);
    }

    #[test]
    fn pops() {
        let mut handler = of(&["1", "2", "3"]);
        assert_eq!(handler.pop_front().as_deref(), Some("1"));
        assert_eq!(handler.pop_back().as_deref(), Some("3"));
        assert_eq!(handler.count(), 1);
        let mut empty = VectorHandler::new();
        assert_eq!(empty.pop_front(), None);
        assert_eq!(empty.pop_back(), None);
    }

    #[test]
    fn remove_takes_first_match_only() {
        let mut handler = of(&["a", "b", "a"]);
        assert!(handler.remove("a"));
        assert_eq!(handler.elements().collect::<Vec<_>>(), vec!["b", "a"]);
        assert!(!handler.remove("zz"));
    }

    #[test]
    fn numeric_aggregates() {
        let handler = of(&["1", "2", "3"]);
        assert!(handler.is_numeric());
        assert_eq!(handler.sum(), 6.0);
        assert_eq!(handler.sma(), 2.0);
        assert_eq!(handler.high(), 3.0);
        assert_eq!(handler.low(), 1.0);
    }

    #[test]
    fn non_numeric_detected() {
        assert!(!of(&["1", "abc"]).is_numeric());
        assert!(of(&["-1.5", "2"]).is_numeric());
    }

    #[test]
    fn sort_reverse_resize() {
        let mut handler = of(&["b", "c", "a"]);
        handler.sort();
        assert_eq!(handler.elements().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        handler.reverse();
        assert_eq!(handler.elements().collect::<Vec<_>>(), vec!["c", "b", "a"]);
        handler.resize(2);
        assert_eq!(handler.elements().collect::<Vec<_>>(), vec!["c", "b"]);
        handler.resize(10);
        assert_eq!(handler.count(), 2);
    }

    #[test]
    fn find_and_repeats() {
        let handler = of(&["red", "green", "red", "blue"]);
        assert_eq!(handler.find("re*"), vec!["red", "red"]);
        assert_eq!(handler.repeats("red"), 2);
        assert_eq!(handler.repeats("cyan"), 0);
    }
}
