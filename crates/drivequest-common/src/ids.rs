//! Identifier helpers

use uuid::Uuid;

/// Random UUID v4 rendered as a string.
pub fn new_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Short upper-case identifier such as `PAY-1A2B3C4D`.
///
/// The suffix is the first eight hex digits of a fresh UUID v4.
pub fn short_id(prefix: &str) -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, simple[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_shape() {
        let id = short_id("PAY");
        assert!(id.starts_with("PAY-"));
        assert_eq!(id.len(), 12);
        assert!(id[4..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_ids_are_distinct() {
        assert_ne!(short_id("MNT"), short_id("MNT"));
        assert_ne!(new_uuid(), new_uuid());
    }
}
