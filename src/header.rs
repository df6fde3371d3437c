use crate::chunk::ChunkTag;
use crate::report::{Finding, Report};
use crate::{DecodingError, Result};

/// Size of a well-formed IHDR payload.
pub const IHDR_LENGTH: usize = 13;

/// Pixel layouts allowed by the IHDR color type field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorType {
    Grayscale,
    Truecolor,
    Indexed,
    GrayscaleAlpha,
    TruecolorAlpha,
}

impl ColorType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Grayscale),
            2 => Some(Self::Truecolor),
            3 => Some(Self::Indexed),
            4 => Some(Self::GrayscaleAlpha),
            6 => Some(Self::TruecolorAlpha),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Grayscale => 0,
            Self::Truecolor => 2,
            Self::Indexed => 3,
            Self::GrayscaleAlpha => 4,
            Self::TruecolorAlpha => 6,
        }
    }

    /// Samples stored per pixel. Indexed pixels are a single palette index.
    pub fn samples(self) -> u32 {
        match self {
            Self::Grayscale | Self::Indexed => 1,
            Self::GrayscaleAlpha => 2,
            Self::Truecolor => 3,
            Self::TruecolorAlpha => 4,
        }
    }
}

/// Decoded IHDR fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct HeaderInfo {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    #[serde(rename = "compression")]
    pub compression_method: u8,
    #[serde(rename = "filter")]
    pub filter_method: u8,
    #[serde(rename = "interlace")]
    pub interlace_method: u8,
    pub bits_per_pixel: u32,
}

impl HeaderInfo {
    /// Parse an IHDR payload. Bytes past the 13th are ignored.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < IHDR_LENGTH {
            return Err(DecodingError::HeaderTooShort(data.len()));
        }
        let color = ColorType::from_code(data[9])
            .ok_or(DecodingError::UnsupportedColorType(data[9]))?;

        Ok(Self {
            width: u32::from_be_bytes([data[0], data[1], data[2], data[3]]),
            height: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            bit_depth: data[8],
            color_type: data[9],
            compression_method: data[10],
            filter_method: data[11],
            interlace_method: data[12],
            bits_per_pixel: u32::from(data[8]) * color.samples(),
        })
    }

    pub fn color(&self) -> Option<ColorType> {
        ColorType::from_code(self.color_type)
    }

    /// Bytes per scanline of the decompressed image data, including the
    /// leading filter type byte. `None` for sub-byte pixel sizes.
    pub fn stride(&self) -> Option<u64> {
        if self.bits_per_pixel % 8 != 0 {
            return None;
        }
        Some(1 + u64::from(self.width) * u64::from(self.bits_per_pixel / 8))
    }
}

/// Decode the first IHDR chunk into `report.headers`.
///
/// More than one IHDR is reported as a finding, and the first one wins.
pub fn decode_header(report: &mut Report<'_>) -> Result<()> {
    let (count, payload) = match report.chunks.get(ChunkTag::IHDR) {
        Some(records) => (records.len(), report.payload(&records[0])),
        None => return Err(DecodingError::MissingHeader),
    };
    if count != 1 {
        report.push(Finding::AbnormalHeaderCount(count));
    }

    let header = HeaderInfo::from_bytes(payload)?;
    log::debug!(
        "IHDR: {}x{}, depth {}, color type {}",
        header.width,
        header.height,
        header.bit_depth,
        header.color_type
    );
    report.headers = Some(header);
    Ok(())
}
