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

//! Command-line tokenization and the small string predicates the command
//! layer leans on for argument validation.

/// Split a raw command line into parameters. Double quotes group words into a
/// single parameter (the quotes themselves are stripped), and a backslash
/// escapes the next character anywhere. `SET k "two words"` yields three
/// parameters, the last being `two words`.
#[must_use]
pub fn parse_params(input: &str) -> Vec<String> {
    let mut params = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut started = false;

    for c in input.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => {
                escaped = true;
                started = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                // An empty quoted pair still produces a parameter.
                started = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if started {
                    params.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if started {
        params.push(current);
    }
    params
}

/// Wrap a payload in double quotes, escaping quotes, backslashes and control
/// characters so the result stays on one protocol line.
#[must_use]
pub fn quote_str(s: &str) -> String {
    let mut output = String::with_capacity(s.len() + 2);
    output.push('"');
    for c in s.chars() {
        match c {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            c if c.is_control() => output.push_str(&format!("\\x{:02X}", c as u32)),
            c => output.push(c),
        }
    }
    output.push('"');
    output
}

/// Whether `s` parses as a number. With `allow_signed_float` set this accepts
/// an optional leading minus and one decimal point, otherwise digits only.
#[must_use]
pub fn is_number(s: &str, allow_signed_float: bool) -> bool {
    if s.is_empty() {
        return false;
    }
    let body = if allow_signed_float {
        s.strip_prefix('-').unwrap_or(s)
    } else {
        s
    };
    if body.is_empty() {
        return false;
    }
    let mut dots = 0;
    for b in body.bytes() {
        match b {
            b'0'..=b'9' => {}
            b'.' if allow_signed_float => {
                dots += 1;
                if dots > 1 {
                    return false;
                }
            }
            _ => return false,
        }
    }
    // A bare "." is not a number.
    body.bytes().any(|b| b.is_ascii_digit())
}

/// Strictly positive integer.
#[must_use]
pub fn is_positive_number(s: &str) -> bool {
    is_number(s, false) && s.bytes().any(|b| b != b'0')
}

/// Integer ≥ 0.
#[must_use]
pub fn is_zero_or_greater(s: &str) -> bool {
    is_number(s, false)
}

/// Integer ≥ 0, or exactly "-1" (the unbounded-limit sentinel).
#[must_use]
pub fn is_zero_or_greater_or_mone(s: &str) -> bool {
    s == "-1" || is_number(s, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_plain_words() {
        assert_eq!(parse_params("SET foo bar"), vec!["SET", "foo", "bar"]);
        assert_eq!(parse_params("  GET   foo  "), vec!["GET", "foo"]);
        assert!(parse_params("   ").is_empty());
    }

    #[test]
    fn quotes_group_words() {
        assert_eq!(
            parse_params("SET foo \"two words\""),
            vec!["SET", "foo", "two words"]
        );
        assert_eq!(parse_params("SET foo \"\""), vec!["SET", "foo", ""]);
    }

    #[test]
    fn backslash_escapes() {
        assert_eq!(
            parse_params(r#"SET foo "say \"hi\"""#),
            vec!["SET", "foo", "say \"hi\""]
        );
        assert_eq!(parse_params(r"SET a\ b c"), vec!["SET", "a b", "c"]);
    }

    #[test]
    fn quoting_round_trip_shape() {
        assert_eq!(quote_str("bar"), "\"bar\"");
        assert_eq!(quote_str("a\"b"), "\"a\\\"b\"");
        assert_eq!(quote_str("a\nb"), "\"a\\nb\"");
    }

    #[test]
    fn numeric_predicates() {
        assert!(is_number("123", false));
        assert!(!is_number("12a", false));
        assert!(!is_number("-3", false));
        assert!(is_number("-3.5", true));
        assert!(!is_number("3.4.5", true));
        assert!(!is_number(".", true));
        assert!(is_positive_number("10"));
        assert!(!is_positive_number("0"));
        assert!(is_zero_or_greater("0"));
        assert!(!is_zero_or_greater("-1"));
        assert!(is_zero_or_greater_or_mone("-1"));
        assert!(!is_zero_or_greater_or_mone("-2"));
    }
}
