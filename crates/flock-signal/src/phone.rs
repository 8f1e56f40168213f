// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone number normalization to E.164.

use std::sync::LazyLock;

use regex::Regex;

static NON_PHONE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9+]").unwrap());

/// Normalize a phone number to E.164.
///
/// Strips everything but digits and `+`, then maps a leading `0` onto the
/// Dutch country code and prefixes a bare number with `+`.
pub fn normalize_phone_number(raw: &str) -> String {
    let cleaned = NON_PHONE_CHARS.replace_all(raw, "");
    if cleaned.starts_with('+') {
        cleaned.into_owned()
    } else if let Some(rest) = cleaned.strip_prefix('0') {
        format!("+31{rest}")
    } else {
        format!("+{cleaned}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn e164_numbers_pass_through() {
        assert_eq!(normalize_phone_number("+31612345678"), "+31612345678");
    }

    #[test]
    fn leading_zero_becomes_dutch_country_code() {
        assert_eq!(normalize_phone_number("0612345678"), "+31612345678");
    }

    #[test]
    fn bare_international_number_gets_a_plus() {
        assert_eq!(normalize_phone_number("31612345678"), "+31612345678");
    }

    #[test]
    fn formatting_characters_are_stripped() {
        assert_eq!(normalize_phone_number("06 12 34 56 78"), "+31612345678");
        assert_eq!(normalize_phone_number("+31 (0)6-1234 5678"), "+310612345678");
        assert_eq!(normalize_phone_number("tel:0612345678"), "+31612345678");
    }
}
