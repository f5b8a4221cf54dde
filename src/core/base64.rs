use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::{DecodeError, Engine};

pub trait DecodeExt {
    fn decode_base64_url(&self) -> Result<Vec<u8>, DecodeError>;
}

impl DecodeExt for &str {
    /// Decodes an unpadded web-safe base64 segment.
    ///
    /// Consent strings use the URL-safe alphabet without padding, but strings
    /// copied out of other tooling sometimes carry the standard alphabet or
    /// trailing `=` characters; both are accepted.
    fn decode_base64_url(&self) -> Result<Vec<u8>, DecodeError> {
        let s = self.trim_end_matches('=');
        if s.contains(['+', '/']) {
            STANDARD_NO_PAD.decode(s)
        } else {
            URL_SAFE_NO_PAD.decode(s)
        }
    }
}
