use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

pub const DEFAULT_ENDPOINT: &str = "https://api.qrserver.com/v1/create-qr-code/";
pub const DEFAULT_SIZE: u32 = 200;

const TOKEN_PREFIX: &str = "lost-and-found-item-";

// Same set encodeURIComponent leaves untouched.
const COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn item_token(item_id: &str) -> String {
    format!("{}{}", TOKEN_PREFIX, item_id)
}

pub fn item_id_from_token(token: &str) -> Option<&str> {
    token
        .trim()
        .strip_prefix(TOKEN_PREFIX)
        .filter(|id| !id.is_empty())
}

/// URL of a rendered QR image. The endpoint's response is only ever used as an image.
pub fn image_url(endpoint: &str, value: &str, size: u32) -> String {
    format!(
        "{}?size={}x{}&data={}",
        endpoint,
        size,
        size,
        utf8_percent_encode(value, COMPONENT_ENCODE_SET)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let token = item_token("item-42");
        assert_eq!(token, "lost-and-found-item-item-42");
        assert_eq!(item_id_from_token(&token), Some("item-42"));
        assert_eq!(item_id_from_token("  lost-and-found-item-7 "), Some("7"));
    }

    #[test]
    fn test_foreign_tokens_are_rejected() {
        assert_eq!(item_id_from_token("https://example.com"), None);
        assert_eq!(item_id_from_token("lost-and-found-item-"), None);
    }

    #[test]
    fn test_image_url_encodes_value() {
        let url = image_url(DEFAULT_ENDPOINT, "lost-and-found-item-a b&c", DEFAULT_SIZE);
        assert_eq!(
            url,
            "https://api.qrserver.com/v1/create-qr-code/?size=200x200&data=lost-and-found-item-a%20b%26c"
        );
    }
}
