//! The HTTP route handlers for the JSON API.

pub mod auth;
pub mod expense;
pub mod income;

use crate::models::DatabaseID;

/// Parse a raw path id the same way the id is read from the URL at runtime:
/// leading digits (with an optional sign) are taken as the id, and anything
/// without a leading number becomes an id that matches no row, so lookups
/// fall through to a not-found response.
pub(crate) fn parse_id(raw: &str) -> DatabaseID {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let leading_digits: String = digits.chars().take_while(char::is_ascii_digit).collect();

    match leading_digits.parse::<DatabaseID>() {
        Ok(id) => sign * id,
        Err(_) => -1,
    }
}

#[cfg(test)]
mod parse_id_tests {
    use super::parse_id;

    #[test]
    fn parses_plain_number() {
        assert_eq!(parse_id("42"), 42);
    }

    #[test]
    fn takes_leading_digits_only() {
        assert_eq!(parse_id("12abc"), 12);
    }

    #[test]
    fn non_numeric_input_matches_no_row() {
        assert_eq!(parse_id("abc"), -1);
        assert_eq!(parse_id(""), -1);
    }

    #[test]
    fn keeps_sign() {
        assert_eq!(parse_id("-5"), -5);
        assert_eq!(parse_id("+5"), 5);
    }
}
