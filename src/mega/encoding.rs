//! URL-safe base64 as spoken by the MEGA API.
//!
//! Every binary field exchanged with the service (hashes, keys, encrypted
//! attributes) uses the standard alphabet with `+`/`/` replaced by `-`/`_` and
//! without trailing `=`. Decoding accepts both padded and unpadded input.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

pub use base64::DecodeError;

const ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode `data` for use in an API field.
pub fn encode(data: &[u8]) -> String {
    ENGINE.encode(data)
}

/// Decode an API field.
pub fn decode(data: &str) -> Result<Vec<u8>, DecodeError> {
    ENGINE.decode(data)
}
