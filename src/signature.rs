use crate::{DecodingError, Result};

/// The 8 bytes every PNG stream starts with.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

pub fn is_png_signature(data: &[u8]) -> bool {
    data.starts_with(&PNG_SIGNATURE)
}

pub fn check_signature(data: &[u8]) -> Result<()> {
    if is_png_signature(data) {
        Ok(())
    } else {
        log::debug!(
            "Signature mismatch: {:02x?}",
            &data[..data.len().min(PNG_SIGNATURE.len())]
        );
        Err(DecodingError::InvalidSignature)
    }
}
