use base64::Engine as _;
use ring::digest;

use crate::error::Error;

/// One-way masking of a caller API key for collector-side grouping, as
/// `sha512-<base64 digest>?<last 4 chars>`. The suffix keeps keys humanly
/// distinguishable; the digest keeps them non-reversible.
pub fn mask(api_key: &str) -> Result<String, Error> {
    let suffix_at = api_key
        .char_indices()
        .rev()
        .nth(3)
        .map(|(index, _)| index)
        .ok_or(Error::ApiKeyTooShort)?;

    let hash = digest::digest(&digest::SHA512, api_key.as_bytes());
    let encoded = base64::engine::general_purpose::STANDARD.encode(hash.as_ref());
    Ok(format!("sha512-{}?{}", encoded, &api_key[suffix_at..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masking_is_deterministic() {
        assert_eq!(mask("abcdef1234").unwrap(), mask("abcdef1234").unwrap());
    }

    #[test]
    fn mask_carries_scheme_prefix_and_visible_suffix() {
        let masked = mask("abcdef1234").unwrap();
        assert!(masked.starts_with("sha512-"));
        assert!(masked.ends_with("?1234"));
    }

    #[test]
    fn distinct_keys_of_equal_length_do_not_collide() {
        assert_ne!(mask("aaaabbbbcccc").unwrap(), mask("aaaabbbbcccd").unwrap());
    }

    #[test]
    fn short_keys_are_rejected() {
        assert!(matches!(mask("abc"), Err(Error::ApiKeyTooShort)));
        assert!(matches!(mask(""), Err(Error::ApiKeyTooShort)));
        assert!(mask("abcd").is_ok());
    }

    #[test]
    fn suffix_is_counted_in_characters_not_bytes() {
        let masked = mask("key-é±ü4").unwrap();
        assert!(masked.ends_with("?é±ü4"));
    }
}
