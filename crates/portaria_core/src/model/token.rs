//! Pickup token generation and normalization.
//!
//! Tokens are short, human-typeable shared codes handed to the resident.
//! They identify a package at the desk; they are not secrets.

use rand::Rng;

/// Smallest token value; keeps every token at six digits.
pub const TOKEN_MIN: u32 = 100_000;
/// Largest token value.
pub const TOKEN_MAX: u32 = 999_999;

/// Draws a uniform six-digit decimal token.
///
/// No collision check is made against live tokens; collisions are accepted
/// as negligible at single-building volume.
pub fn generate_pickup_token() -> String {
    rand::rng().random_range(TOKEN_MIN..=TOKEN_MAX).to_string()
}

/// Trims caller input. Returns `None` when nothing remains.
pub fn normalize_token(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Masks all but the last two characters for log output.
pub fn redact_token(token: &str) -> String {
    let count = token.chars().count();
    token
        .chars()
        .enumerate()
        .map(|(index, ch)| if index + 2 < count { '*' } else { ch })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{generate_pickup_token, normalize_token, redact_token};

    #[test]
    fn generated_tokens_are_six_ascii_digits() {
        for _ in 0..500 {
            let token = generate_pickup_token();
            assert_eq!(token.len(), 6, "unexpected token `{token}`");
            assert!(token.bytes().all(|b| b.is_ascii_digit()));
            assert_ne!(token.as_bytes()[0], b'0');
        }
    }

    #[test]
    fn normalize_only_trims() {
        assert_eq!(normalize_token("  123456 \n"), Some("123456"));
        assert_eq!(normalize_token(" 12 34 "), Some("12 34"));
        assert_eq!(normalize_token("   "), None);
    }

    #[test]
    fn redact_keeps_last_two_characters() {
        assert_eq!(redact_token("123456"), "****56");
        assert_eq!(redact_token("7"), "7");
    }
}
