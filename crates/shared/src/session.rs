//! Per-session audit token generation.

use chrono::Utc;
use rand::Rng;

/// Prefix shared by every generated session token.
pub const SESSION_TOKEN_PREFIX: &str = "sess_";

const SUFFIX_LEN: usize = 9;
const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates a session token of the form `sess_<unix millis>_<9 base36 chars>`.
///
/// Practically unique within a session; not a security token.
pub fn generate_session_token() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();

    format!(
        "{}{}_{}",
        SESSION_TOKEN_PREFIX,
        Utc::now().timestamp_millis(),
        suffix
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_shape() {
        let token = generate_session_token();
        let parts: Vec<&str> = token.split('_').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "sess");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2].bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn test_tokens_differ() {
        assert_ne!(generate_session_token(), generate_session_token());
    }
}
