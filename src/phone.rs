// ☎️ Phone formatting - US numbers as typed, displayed and sent
//
// Stored/entered numbers are 10 digits (optionally with a leading country
// code 1). Display form is "(555) 123-4567"; SMS delivery uses E.164.

/// Keep only ASCII digits
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Ten national digits, dropping a leading country code from 11-digit input.
/// Returns `None` unless exactly 10 digits remain.
pub fn normalize(raw: &str) -> Option<String> {
    let digits = digits_only(raw);
    let national = match digits.len() {
        11 if digits.starts_with('1') => &digits[1..],
        10 => digits.as_str(),
        _ => return None,
    };
    Some(national.to_string())
}

pub fn is_valid(raw: &str) -> bool {
    normalize(raw).is_some()
}

/// "(555) 123-4567", or `None` for anything that is not a full number
pub fn format_display(raw: &str) -> Option<String> {
    normalize(raw).map(|d| format!("({}) {}-{}", &d[..3], &d[3..6], &d[6..]))
}

/// Progressive formatting for a text field, applied on every keystroke.
/// Extra digits beyond ten are dropped.
pub fn format_partial(raw: &str) -> String {
    let digits: String = digits_only(raw).chars().take(10).collect();
    match digits.len() {
        0 => String::new(),
        1..=3 => format!("({}", digits),
        4..=6 => format!("({}) {}", &digits[..3], &digits[3..]),
        _ => format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]),
    }
}

/// "+15551234567" for SMS delivery
pub fn to_e164(raw: &str) -> Option<String> {
    normalize(raw).map(|d| format!("+1{}", d))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("(555) 123-4567").as_deref(), Some("5551234567"));
        assert_eq!(normalize("+1 555 123 4567").as_deref(), Some("5551234567"));
        assert_eq!(normalize("25551234567"), None);
        assert_eq!(normalize("555-1234"), None);
    }

    #[test]
    fn test_format_display() {
        assert_eq!(format_display("5551234567").as_deref(), Some("(555) 123-4567"));
        assert_eq!(format_display("123"), None);
    }

    #[test]
    fn test_format_partial_as_typed() {
        assert_eq!(format_partial(""), "");
        assert_eq!(format_partial("5"), "(5");
        assert_eq!(format_partial("555"), "(555");
        assert_eq!(format_partial("5551"), "(555) 1");
        assert_eq!(format_partial("555123"), "(555) 123");
        assert_eq!(format_partial("5551234"), "(555) 123-4");
        assert_eq!(format_partial("555123456789"), "(555) 123-4567");
        assert_eq!(format_partial("(555) 12a"), "(555) 12");
    }

    #[test]
    fn test_e164() {
        assert_eq!(to_e164("555.123.4567").as_deref(), Some("+15551234567"));
        assert!(!is_valid("not a phone"));
    }
}
