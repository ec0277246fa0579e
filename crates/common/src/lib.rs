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

pub use hex::{hex_decode, hex_encode};
pub use matcher::glob_match;
pub use protocol::{Frame, Numeric, PROCESS_ALREADY, PROCESS_ERROR, PROCESS_NULL, PROCESS_OK};
pub use text::{
    is_number, is_positive_number, is_zero_or_greater, is_zero_or_greater_or_mone, parse_params,
    quote_str,
};

pub mod hex;
pub mod logging;
pub mod matcher;
pub mod protocol;
pub mod text;

/// Selects ("logical namespaces") are integers in this inclusive range, carried
/// as strings on the wire and in physical keys.
pub const SELECT_MIN: u32 = 1;
pub const SELECT_MAX: u32 = 100;

/// The select every session starts in.
pub const DEFAULT_SELECT: &str = "1";

/// Validate a select id as received from a client: an integer "1".."100".
pub fn valid_select(select: &str) -> bool {
    if select.is_empty() || select.len() > 3 || !select.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    // Leading zeros would break physical-key equality with the canonical form.
    if select.starts_with('0') {
        return false;
    }
    let n: u32 = select.parse().unwrap_or(0);
    (SELECT_MIN..=SELECT_MAX).contains(&n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_range() {
        assert!(valid_select("1"));
        assert!(valid_select("100"));
        assert!(!valid_select("0"));
        assert!(!valid_select("101"));
        assert!(!valid_select("01"));
        assert!(!valid_select(""));
        assert!(!valid_select("abc"));
        assert!(!valid_select("-1"));
    }
}
