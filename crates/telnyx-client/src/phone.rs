//! NANP phone number normalization, validation and masking.
//!
//! Only the North American Numbering Plan (country calling code `1`) is
//! supported. The canonical form is E.164: `+1` followed by a ten digit
//! national number whose area code does not start with `0` or `1`.

use crate::error::PhoneError;

/// Country calling code for the supported region.
pub const CALLING_CODE: char = '1';

/// Digits in a national (area code + subscriber) number.
const NATIONAL_DIGITS: usize = 10;

/// Normalize free-form input into canonical `+1XXXXXXXXXX` form.
///
/// All non-digit characters are discarded. Ten remaining digits get the
/// calling code prefixed, eleven digits starting with `1` are taken as-is.
/// Area codes are not checked here; use [`is_valid`] or [`normalize_valid`].
///
/// Normalizing an already canonical number returns it unchanged.
pub fn normalize(raw: &str) -> Result<String, PhoneError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.len() {
        NATIONAL_DIGITS => Ok(format!("+{}{}", CALLING_CODE, digits)),
        11 if digits.starts_with(CALLING_CODE) => Ok(format!("+{}", digits)),
        _ => Err(PhoneError::InvalidFormat(raw.to_string())),
    }
}

/// Normalize and then require the result to be a dialable NANP number.
pub fn normalize_valid(raw: &str) -> Result<String, PhoneError> {
    let number = normalize(raw)?;
    if !is_valid(&number) {
        return Err(PhoneError::InvalidAreaCode(number));
    }
    Ok(number)
}

/// Check that `candidate` is exactly `+1[2-9]` followed by nine digits.
pub fn is_valid(candidate: &str) -> bool {
    let Some(national) = candidate.strip_prefix("+1") else {
        return false;
    };

    national.len() == NATIONAL_DIGITS
        && national.bytes().all(|b| b.is_ascii_digit())
        && matches!(national.as_bytes()[0], b'2'..=b'9')
}

/// Redact a canonical number for display, e.g. `+1 (555) ***-4567`.
///
/// Input that is not canonical is returned unchanged.
pub fn mask(candidate: &str) -> String {
    if !is_valid(candidate) {
        return candidate.to_string();
    }

    let area = &candidate[2..5];
    let line = &candidate[8..12];
    format!("+1 ({}) ***-{}", area, line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ten_digits() {
        assert_eq!(normalize("5551234567"), Ok("+15551234567".into()));
        assert_eq!(normalize("555 123 4567"), Ok("+15551234567".into()));
        assert_eq!(normalize("(555) 123-4567"), Ok("+15551234567".into()));
    }

    #[test]
    fn test_normalize_eleven_digits() {
        assert_eq!(normalize("15551234567"), Ok("+15551234567".into()));
        assert_eq!(normalize("1-555-123-4567"), Ok("+15551234567".into()));
    }

    #[test]
    fn test_normalize_is_idempotent_on_canonical() {
        let once = normalize("+1 (415) 555-1234").unwrap();
        let twice = normalize(&once).unwrap();
        assert_eq!(once, "+14155551234");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_rejects_other_lengths() {
        assert!(matches!(normalize(""), Err(PhoneError::InvalidFormat(_))));
        assert!(matches!(normalize("123"), Err(PhoneError::InvalidFormat(_))));
        assert!(matches!(
            normalize("25551234567"),
            Err(PhoneError::InvalidFormat(_))
        ));
        assert!(matches!(
            normalize("555123456789"),
            Err(PhoneError::InvalidFormat(_))
        ));
        assert!(matches!(
            normalize("+44 20 7946 0958"),
            Err(PhoneError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_normalize_does_not_check_area_code() {
        let number = normalize("0551234567").unwrap();
        assert_eq!(number, "+10551234567");
        assert!(!is_valid(&number));
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid("+15551234567"));
        assert!(is_valid("+12001234567"));
        assert!(is_valid("+19991234567"));

        assert!(!is_valid("+10551234567"));
        assert!(!is_valid("+11551234567"));
        assert!(!is_valid("15551234567"));
        assert!(!is_valid("+1555123456"));
        assert!(!is_valid("+155512345678"));
        assert!(!is_valid("+1555123456a"));
        assert!(!is_valid("+25551234567"));
        assert!(!is_valid(""));
    }

    #[test]
    fn test_normalize_valid() {
        assert_eq!(normalize_valid("555.123.4567"), Ok("+15551234567".into()));
        assert!(matches!(
            normalize_valid("155 123 4567"),
            Err(PhoneError::InvalidAreaCode(_))
        ));
        assert!(matches!(
            normalize_valid("12"),
            Err(PhoneError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("+15551234567"), "+1 (555) ***-4567");
        assert_eq!(mask("+14155551234"), "+1 (415) ***-1234");
    }

    #[test]
    fn test_mask_leaves_non_canonical_input_alone() {
        assert_eq!(mask("5551234567"), "5551234567");
        assert_eq!(mask("+10551234567"), "+10551234567");

        let masked = mask("+15551234567");
        assert_eq!(mask(&masked), masked);
    }
}
