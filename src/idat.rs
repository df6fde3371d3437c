use flate2::{Decompress, FlushDecompress, Status};

use crate::chunk::ChunkTag;
use crate::report::{Finding, Report};
use crate::{DecodingError, Result};

const INFLATE_STEP: usize = 32 * 1024;

/// Join every IDAT payload in scan order, decompress the zlib stream and
/// check its length against the header, if one was decoded.
///
/// The decompressed bytes end up in `report.raw_image_data` only when
/// `retain_raw` is set. Does nothing if the file has no IDAT chunk.
pub fn assemble_image_data(report: &mut Report<'_>, retain_raw: bool) -> Result<()> {
    let Some(records) = report.chunks.get(ChunkTag::IDAT) else {
        log::debug!("No IDAT chunk, nothing to assemble");
        return Ok(());
    };

    let total = records.iter().map(|r| r.payload.len()).sum();
    let mut compressed = Vec::with_capacity(total);
    for record in records {
        compressed.extend_from_slice(report.payload(record));
    }

    let data = inflate(&compressed)?;
    log::debug!(
        "{} IDAT chunks, {} compressed bytes, {} decompressed",
        records.len(),
        compressed.len(),
        data.len()
    );

    if let Some(header) = report.headers {
        if let Some(stride) = header.stride() {
            let guessed_height = data.len() as u64 / stride;
            if guessed_height != u64::from(header.height) {
                report.push(Finding::IdatLengthMismatch {
                    expected_height: header.height,
                    guessed_height,
                });
            }
        }
    }

    if retain_raw {
        report.raw_image_data = Some(data);
    }
    Ok(())
}

/// Decompress a complete zlib stream. Input that ends before the stream does
/// is an error; bytes after the end of the stream are ignored.
pub fn inflate(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity(compressed.len().saturating_mul(2).max(INFLATE_STEP));

    loop {
        if out.len() == out.capacity() {
            out.reserve(INFLATE_STEP);
        }
        let before = (inflater.total_in(), inflater.total_out());
        let input = &compressed[inflater.total_in() as usize..];

        match inflater.decompress_vec(input, &mut out, FlushDecompress::None)? {
            Status::StreamEnd => {
                let unused = input.len() - (inflater.total_in() - before.0) as usize;
                if unused > 0 {
                    log::warn!("{unused} bytes after the end of the zlib stream");
                }
                return Ok(out);
            }
            // Room to write and nothing consumed or produced: the input ran
            // out before the stream ended.
            _ if (inflater.total_in(), inflater.total_out()) == before => {
                return Err(DecodingError::TruncatedImageData {
                    decompressed: out.len(),
                });
            }
            _ => {}
        }
    }
}
