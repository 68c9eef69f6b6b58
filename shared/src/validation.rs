use regex::Regex;
use std::sync::OnceLock;

use crate::VoiceOption;

fn e164_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+[1-9]\d{1,14}$").expect("valid E.164 pattern"))
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"))
}

fn us_phone_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:[2-9]\d{9}|1[2-9]\d{9})$").expect("valid US phone pattern"))
}

fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Validate an E.164 phone number: `+` then 2-15 digits, no leading zero.
pub fn is_valid_phone(phone: &str) -> bool {
    e164_regex().is_match(phone)
}

/// Validate a US number in any punctuation, with or without the `1` prefix.
pub fn is_valid_us_phone(raw: &str) -> bool {
    us_phone_regex().is_match(&digits_only(raw))
}

/// Best-effort normalization to E.164. Never fails; garbage in yields a
/// string that `is_valid_phone` will reject.
pub fn format_phone_to_e164(raw: &str) -> String {
    let cleaned = digits_only(raw);

    if cleaned.len() == 10 {
        return format!("+1{}", cleaned);
    }
    if cleaned.len() == 11 && cleaned.starts_with('1') {
        return format!("+{}", cleaned);
    }
    if raw.starts_with('+') {
        return format!("+{}", cleaned);
    }

    format!("+1{}", cleaned)
}

/// Format a US number as `(XXX) XXX-XXXX`, leaving anything else untouched.
pub fn format_phone_for_display(raw: &str) -> String {
    let cleaned = digits_only(raw);

    match cleaned.len() {
        10 => format!("({}) {}-{}", &cleaned[..3], &cleaned[3..6], &cleaned[6..]),
        11 if cleaned.starts_with('1') => {
            format!("+1 ({}) {}-{}", &cleaned[1..4], &cleaned[4..7], &cleaned[7..])
        }
        _ => raw.to_string(),
    }
}

/// Validate email format (basic `local@domain.tld` check)
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

pub fn is_valid_voice_id(id: &str, voices: &[VoiceOption]) -> bool {
    voices.iter().any(|voice| voice.id == id)
}
