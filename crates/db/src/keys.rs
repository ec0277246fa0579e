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

//! Physical key encoding. Every logical entry lives in one flat namespace
//! per database as `<hex(user-key)>:<select>:<type-tag>`. Hex-coding the user
//! key keeps colons in user input from aliasing the field structure, and the
//! type tag keeps scans over one entry type from ever seeing another.

use beryl_common::{hex_decode, hex_encode};

/// Entry type tags. Single-byte constants in the third physical key field.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum EntryType {
    Key,
    Map,
    Vector,
    MultiMap,
    Geo,
    List,
}

impl EntryType {
    pub fn tag(&self) -> &'static str {
        match self {
            EntryType::Key => "1",
            EntryType::Map => "2",
            EntryType::Vector => "3",
            EntryType::MultiMap => "4",
            EntryType::Geo => "5",
            EntryType::List => "6",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "1" => Some(EntryType::Key),
            "2" => Some(EntryType::Map),
            "3" => Some(EntryType::Vector),
            "4" => Some(EntryType::MultiMap),
            "5" => Some(EntryType::Geo),
            "6" => Some(EntryType::List),
            _ => None,
        }
    }
}

/// Encode (user key, select, type) into physical key bytes.
#[must_use]
pub fn encode(key: &str, select: &str, entry_type: EntryType) -> String {
    format!("{}:{}:{}", hex_encode(key.as_bytes()), select, entry_type.tag())
}

/// A physical key split back into its logical parts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodedKey {
    pub key: String,
    pub select: String,
    pub entry_type: EntryType,
}

/// Decode physical key bytes. `None` for keys that do not follow the layout;
/// scans skip those rather than fail.
#[must_use]
pub fn decode(physical: &[u8]) -> Option<DecodedKey> {
    let text = std::str::from_utf8(physical).ok()?;
    let mut fields = text.split(':');
    let hexed = fields.next()?;
    let select = fields.next()?;
    let tag = fields.next()?;
    if fields.next().is_some() {
        return None;
    }
    let key_bytes = hex_decode(hexed)?;
    Some(DecodedKey {
        key: String::from_utf8(key_bytes).ok()?,
        select: select.to_string(),
        entry_type: EntryType::from_tag(tag)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let phys = encode("foo", "1", EntryType::Map);
        let decoded = decode(phys.as_bytes()).unwrap();
        assert_eq!(decoded.key, "foo");
        assert_eq!(decoded.select, "1");
        assert_eq!(decoded.entry_type, EntryType::Map);
    }

    #[test]
    fn colons_in_user_keys_do_not_alias() {
        let tricky = encode("a:1:2", "2", EntryType::Key);
        let decoded = decode(tricky.as_bytes()).unwrap();
        assert_eq!(decoded.key, "a:1:2");
        assert_eq!(decoded.select, "2");
        assert_eq!(decoded.entry_type, EntryType::Key);
    }

    #[test]
    fn injective_across_types_and_selects() {
        let mut seen = std::collections::HashSet::new();
        for ty in [EntryType::Key, EntryType::Map, EntryType::Vector, EntryType::MultiMap] {
            for select in ["1", "2", "100"] {
                for key in ["k", "k2", "k:2"] {
                    assert!(seen.insert(encode(key, select, ty)));
                }
            }
        }
    }

    #[test]
    fn rejects_foreign_rows() {
        assert!(decode(b"not-hex:1:1").is_none());
        assert!(decode(b"6162").is_none());
        assert!(decode(b"6162:1:9").is_none());
        assert!(decode(b"6162:1:1:extra").is_none());
    }
}
