// Utility functions for listing-ranking-service

use std::collections::HashSet;

/// Country suffixes the distance service appends to resolved addresses.
const COUNTRY_SUFFIXES: [&str; 2] = [", united states", ", usa"];

/// Normalize a free-text address so that user input and the address echoed back by
/// the distance service compare equal.
///
/// Lowercases, drops a trailing country, strips digits (house and postal numbers),
/// replaces punctuation with spaces and collapses whitespace. Every address segment is
/// kept, so "Toronto, ON" and "Ottawa, ON" stay distinct.
pub fn normalize_address(address: &str) -> String {
    let mut lowered = address.trim().to_lowercase();
    for suffix in COUNTRY_SUFFIXES {
        if let Some(stripped) = lowered.strip_suffix(suffix) {
            lowered = stripped.to_string();
            break;
        }
    }

    let cleaned: String = lowered
        .chars()
        .filter(|c| !c.is_ascii_digit())
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercase word tokens, split on anything that is not a letter, digit or underscore.
pub fn word_tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_address_matches_resolved_form() {
        let typed = normalize_address("Mountain View, CA");
        let resolved = normalize_address("Mountain View, CA 94043, USA");
        assert_eq!(typed, "mountain view ca");
        assert_eq!(typed, resolved);
    }

    #[test]
    fn test_normalize_address_keeps_every_segment() {
        assert_eq!(
            normalize_address("1600 Amphitheatre Pkwy, Mountain View, CA 94043, USA"),
            "amphitheatre pkwy mountain view ca"
        );
        assert_eq!(normalize_address("Toronto, ON, Canada"), "toronto on canada");
        assert_ne!(
            normalize_address("Toronto, ON, Canada"),
            normalize_address("Ottawa, ON, Canada")
        );
    }

    #[test]
    fn test_normalize_address_punctuation_and_case() {
        assert_eq!(normalize_address("  ST. LOUIS,   MO "), "st louis mo");
        assert_eq!(normalize_address("Austin, TX, United States"), "austin tx");
        assert_eq!(normalize_address(""), "");
    }

    #[test]
    fn test_word_tokens() {
        let tokens = word_tokens("Clean-up the BEACH, 2021!");
        assert!(tokens.contains("clean"));
        assert!(tokens.contains("up"));
        assert!(tokens.contains("beach"));
        assert!(tokens.contains("2021"));
        assert_eq!(tokens.len(), 5);
        assert!(word_tokens("  ").is_empty());
    }
}
