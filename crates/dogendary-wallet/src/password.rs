//! Password strength heuristic.
//!
//! Advisory only. The score steers the user toward a better password; it is
//! not a security boundary, and the vault accepts whatever the caller
//! decides to pass.

use serde::{Deserialize, Serialize};

const WEAK_PREFIXES: [&str; 4] = ["123", "abc", "qwerty", "password"];
const MAX_SCORE: i32 = 7;
const MIN_VALID_SCORE: u8 = 4;
pub const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordStrength {
    pub is_valid: bool,
    /// 0 through 7.
    pub score: u8,
    pub feedback: Vec<String>,
}

/// Score a password. Length is counted in characters.
pub fn validate_password_strength(password: &str) -> PasswordStrength {
    let mut feedback = Vec::new();
    let mut score: i32 = 0;
    let len = password.chars().count();

    if len >= MIN_PASSWORD_CHARS {
        score += 1;
    } else {
        feedback.push(format!("Password must be at least {MIN_PASSWORD_CHARS} characters"));
    }
    if len >= 12 {
        score += 1;
    }
    if len >= 16 {
        score += 1;
    }

    let classes: [(fn(&char) -> bool, &str); 4] = [
        (char::is_ascii_lowercase, "Add lowercase letters"),
        (char::is_ascii_uppercase, "Add uppercase letters"),
        (char::is_ascii_digit, "Add numbers"),
        (|c: &char| !c.is_ascii_alphanumeric(), "Add special characters"),
    ];
    for (matches, hint) in classes {
        if password.chars().any(|c| matches(&c)) {
            score += 1;
        } else {
            feedback.push(hint.to_string());
        }
    }

    if has_triple_run(password) {
        score -= 1;
        feedback.push("Avoid repeated characters".to_string());
    }

    let lower = password.to_lowercase();
    if WEAK_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        score -= 2;
        feedback.push("Avoid common patterns".to_string());
    }

    let score = score.clamp(0, MAX_SCORE) as u8;
    PasswordStrength { is_valid: score >= MIN_VALID_SCORE && len >= MIN_PASSWORD_CHARS, score, feedback }
}

/// Three or more identical consecutive characters.
fn has_triple_run(password: &str) -> bool {
    let chars: Vec<char> = password.chars().collect();
    chars.windows(3).any(|w| w[0] == w[1] && w[1] == w[2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_password() {
        let s = validate_password_strength("Str0ng!Pass123");
        assert_eq!(s.score, 6);
        assert!(s.is_valid);
        assert!(s.feedback.is_empty());
    }

    #[test]
    fn maximum_score_is_clamped() {
        let s = validate_password_strength("Str0ng!Pass123-long");
        assert_eq!(s.score, 7);
    }

    #[test]
    fn common_prefix_penalized() {
        let s = validate_password_strength("password");
        assert_eq!(s.score, 0);
        assert!(!s.is_valid);
        assert!(s.feedback.iter().any(|f| f.contains("common patterns")));

        let s = validate_password_strength("QWERTY!Abc12345");
        assert!(s.feedback.iter().any(|f| f.contains("common patterns")));
    }

    #[test]
    fn repeated_run_penalized() {
        let with_run = validate_password_strength("Xaaa!9zzzzkm");
        let without = validate_password_strength("Xabc!9zyxwkm");
        assert_eq!(with_run.score + 1, without.score);
        assert!(with_run.feedback.iter().any(|f| f.contains("repeated")));
    }

    #[test]
    fn short_password_never_valid() {
        let s = validate_password_strength("Aa1!");
        assert_eq!(s.score, 4);
        assert!(!s.is_valid);
        assert!(s.feedback[0].contains("at least 8"));
    }

    #[test]
    fn empty_password() {
        let s = validate_password_strength("");
        assert_eq!(s.score, 0);
        assert!(!s.is_valid);
        assert_eq!(s.feedback.len(), 5);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(validate_password_strength("x")).unwrap();
        assert!(json.get("isValid").is_some());
    }
}
