//! Canonical boolean-string encoding for stored values.
//!
//! The store holds strings; on/off switches are encoded as `"1"` / `"0"`.

/// The "on" value.
pub const ON: &str = "1";

/// The "off" value.
pub const OFF: &str = "0";

/// Whether a stored value reads as "on".
#[must_use]
pub fn is_on(value: &str) -> bool {
    value == ON
}

/// Flip a flag value. Anything that is not `"1"` inverts to `"1"`.
#[must_use]
pub fn invert(value: &str) -> &'static str {
    if value == ON { OFF } else { ON }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_invert_on_to_off() {
        assert_eq!(invert(ON), OFF);
    }

    #[test]
    fn should_invert_off_to_on() {
        assert_eq!(invert(OFF), ON);
    }

    #[test]
    fn should_invert_unknown_value_to_on() {
        assert_eq!(invert("blue"), ON);
    }

    #[test]
    fn should_detect_on_value() {
        assert!(is_on("1"));
        assert!(!is_on("0"));
        assert!(!is_on(""));
    }
}
