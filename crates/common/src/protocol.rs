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

//! The line protocol spoken to clients: every reply is one line of the form
//! `<numeric> <payload>`. Numerics are stable; clients dispatch on them and
//! treat the payload as display text.

use std::fmt::{Display, Formatter};
use strum::{Display as StrumDisplay, EnumIter};

/// Canonical payloads used by commands that only acknowledge.
pub const PROCESS_OK: &str = "OK";
pub const PROCESS_NULL: &str = "NULL";
pub const PROCESS_ERROR: &str = "ERROR";
pub const PROCESS_ALREADY: &str = "ALREADY";

/// Reply numerics. The 2xx block is success, 5xx input/usage errors, and the
/// 52x sub-block carries per-query database errors surfaced by the dispatcher.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, StrumDisplay, EnumIter)]
#[repr(u16)]
pub enum Numeric {
    Connected = 100,
    Agent = 101,
    Login = 102,

    Ok = 200,
    QueryOk = 201,
    Item = 211,
    ItemList = 212,
    NewUse = 220,
    CurrentUse = 221,
    Using = 222,
    StartList = 240,
    EndList = 241,
    Monitor = 260,

    ErrInput = 500,
    ErrUse = 501,
    ErrLogin = 502,
    ErrNoInstance = 503,
    NotFound = 520,
    MissArgs = 521,
    UnableWrite = 522,
    EntryExists = 523,
    InvalidRange = 524,
    InvalidFormat = 525,
    Interrupt = 526,
    InvalidCoord = 527,
}

impl Numeric {
    pub fn code(&self) -> u16 {
        *self as u16
    }
}

/// One reply line, not yet terminated. The connection layer appends the
/// newline when writing, so payloads must never contain one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Frame {
    pub numeric: Numeric,
    pub payload: String,
}

impl Frame {
    pub fn new(numeric: Numeric, payload: impl Into<String>) -> Self {
        Self {
            numeric,
            payload: payload.into(),
        }
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.numeric.code(), self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn frame_renders_code_then_payload() {
        let f = Frame::new(Numeric::Ok, "\"bar\"");
        assert_eq!(f.to_string(), "200 \"bar\"");
    }

    #[test]
    fn numerics_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for n in Numeric::iter() {
            assert!(seen.insert(n.code()), "duplicate numeric {n:?}");
        }
    }
}
