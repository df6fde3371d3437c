//! Structural inspection of PNG files.
//!
//! Walks the chunks of a PNG byte stream and reports their layout, the IHDR
//! fields and any structural problems, without decoding the image itself.
//!
//! # Example
//!
//! ```
//! use pngscope::{ChunkTag, Options};
//!
//! // A signature and an empty IEND chunk.
//! let data = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x00IEND\xae\x42\x60\x82";
//! let options = Options {
//!     run_structural_checks: true,
//!     ..Options::default()
//! };
//! let report = pngscope::inspect(data, &options).unwrap();
//! assert!(report.chunks.first(ChunkTag::IEND).unwrap().crc_ok());
//! let errors = report.errors.iter().map(|e| e.to_string()).collect::<Vec<_>>();
//! assert_eq!(
//!     vec![
//!         "IHDR - critical chunk does not appear",
//!         "IDAT - critical chunk does not appear",
//!     ],
//!     errors
//! );
//! ```

pub mod checks;
pub mod chunk;
pub mod header;
pub mod idat;
pub mod report;
pub mod signature;

#[cfg(test)]
mod testutil;

pub use chunk::{ChunkRecord, ChunkTable, ChunkTag};
pub use header::{ColorType, HeaderInfo};
pub use report::{ChunkIssue, Finding, Report};

/// Failures that stop an inspection.
#[derive(Debug, thiserror::Error)]
pub enum DecodingError {
    #[error("Invalid file (signature check failed)")]
    InvalidSignature,

    #[error("IHDR chunk missing from PNG")]
    MissingHeader,

    #[error("IHDR chunk too short: {0} bytes")]
    HeaderTooShort(usize),

    #[error("Unsupported color type: {0}")]
    UnsupportedColorType(u8),

    #[error("Corrupt IDAT stream: {0}")]
    Decompress(#[from] flate2::DecompressError),

    #[error("IDAT stream ends early, after {decompressed} decompressed bytes")]
    TruncatedImageData { decompressed: usize },
}

pub type Result<T, E = DecodingError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum InspectError<'a> {
    /// Nothing could be parsed.
    #[error(transparent)]
    Decoding(#[from] DecodingError),

    /// A later step failed; `report` holds what was found before it.
    #[error("{error}")]
    Partial {
        report: Box<Report<'a>>,
        error: DecodingError,
    },
}

/// Which optional steps [`inspect`] runs after scanning the chunks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    pub decode_header: bool,
    pub assemble_image_data: bool,
    pub retain_raw_image_data: bool,
    pub run_structural_checks: bool,
}

impl Options {
    pub fn all() -> Self {
        Self {
            decode_header: true,
            assemble_image_data: true,
            retain_raw_image_data: true,
            run_structural_checks: true,
        }
    }
}

/// Inspect a PNG byte stream.
///
/// The signature is checked and the chunks scanned; then the header is
/// decoded, the image data assembled and the structural checks run, each if
/// requested and in that order. Problems with the file's structure are
/// collected in [`Report::errors`]; only the failures in [`DecodingError`]
/// stop the inspection.
pub fn inspect<'a>(data: &'a [u8], options: &Options) -> Result<Report<'a>, InspectError<'a>> {
    signature::check_signature(data)?;

    let mut report = Report::new(data);
    chunk::scan_chunks(&mut report);
    log::info!(
        "Scanned {} bytes: {} chunk types, {} findings",
        data.len(),
        report.chunks.len(),
        report.errors.len()
    );

    match run_steps(&mut report, options) {
        Ok(()) => Ok(report),
        Err(error) => {
            log::warn!("Inspection stopped: {error}");
            Err(InspectError::Partial {
                report: Box::new(report),
                error,
            })
        }
    }
}

fn run_steps(report: &mut Report<'_>, options: &Options) -> Result<()> {
    if options.decode_header {
        header::decode_header(report)?;
    }
    if options.assemble_image_data {
        idat::assemble_image_data(report, options.retain_raw_image_data)?;
    }
    if options.run_structural_checks {
        checks::run_structural_checks(report);
    }
    Ok(())
}
