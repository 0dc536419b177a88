//! Invite codes for join-by-link flows
//!
//! Codes are a lookup convenience, not a secret. Collisions are left to the
//! store's unique constraint.

use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;

pub const INVITE_CODE_LENGTH: usize = 6;

const INVITE_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn invite_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z0-9]{6}$").expect("invite code pattern is valid"))
}

/// Generate a random 6-character code over `A-Z0-9`
pub fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();

    (0..INVITE_CODE_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..INVITE_CODE_CHARSET.len());
            INVITE_CODE_CHARSET[idx] as char
        })
        .collect()
}

pub fn is_valid_invite_code(code: &str) -> bool {
    invite_code_pattern().is_match(code)
}

/// Canonical form of a code typed or pasted by a person
pub fn normalize_invite_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[test]
    fn test_generated_codes_match_format() {
        for _ in 0..1_000 {
            let code = generate_invite_code();
            assert_eq!(code.len(), INVITE_CODE_LENGTH);
            assert!(is_valid_invite_code(&code), "bad code {}", code);
        }
    }

    #[test]
    fn test_ten_thousand_codes_are_practically_distinct() {
        let codes: HashSet<String> = (0..10_000).map(|_| generate_invite_code()).collect();
        // 36^6 codes: about 0.02 birthday collisions expected at this sample size
        assert!(codes.len() >= 9_997, "too many duplicates: {}", 10_000 - codes.len());
    }

    #[test]
    fn test_character_distribution_is_not_skewed() {
        let samples = 36_000;
        let mut per_position: Vec<HashMap<char, usize>> = vec![HashMap::new(); INVITE_CODE_LENGTH];

        for _ in 0..samples {
            for (position, c) in generate_invite_code().chars().enumerate() {
                *per_position[position].entry(c).or_insert(0) += 1;
            }
        }

        // Expected 1000 per symbol per position; a missing symbol or a
        // 2x outlier means the generator is broken.
        for counts in per_position {
            assert_eq!(counts.len(), 36);
            for count in counts.values() {
                assert!((600..=1400).contains(count), "count {} out of range", count);
            }
        }
    }

    #[test]
    fn test_validation_and_normalization() {
        assert!(is_valid_invite_code("AB12CD"));
        assert!(!is_valid_invite_code("ab12cd"));
        assert!(!is_valid_invite_code("AB12C"));
        assert!(!is_valid_invite_code("AB12CD7"));
        assert!(!is_valid_invite_code("AB-2CD"));
        assert_eq!(normalize_invite_code("  ab12cd \n"), "AB12CD");
    }
}
