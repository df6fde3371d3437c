//! Structural rules checked over an already scanned chunk table.
//!
//! Each pass runs regardless of what the others found.

use crate::chunk::ChunkTag;
use crate::report::{Finding, Report};

/// Critical chunks, in the order they must first appear.
pub const REQUIRED_ORDER: [ChunkTag; 3] = [ChunkTag::IHDR, ChunkTag::IDAT, ChunkTag::IEND];

/// Chunks that may appear at most once.
pub const SINGLE_OCCURRENCE: [ChunkTag; 13] = [
    ChunkTag::IHDR,
    ChunkTag::PLTE,
    ChunkTag::IEND,
    ChunkTag::tRNS,
    ChunkTag::cHRM,
    ChunkTag::gAMA,
    ChunkTag::iCCP,
    ChunkTag::sBIT,
    ChunkTag::sRGB,
    ChunkTag::bKGD,
    ChunkTag::hIST,
    ChunkTag::pHYs,
    ChunkTag::tIME,
];

pub fn run_structural_checks(report: &mut Report<'_>) {
    check_order(report);
    check_cardinality(report);
    check_trailing_data(report);
}

/// Compare the first occurrence of each required chunk against the previous
/// required chunk that was present. A missing chunk leaves the cursor where
/// it was.
pub fn check_order(report: &mut Report<'_>) {
    let mut last_seen = 0;
    for tag in REQUIRED_ORDER {
        let Some(first) = report.chunks.first(tag) else {
            report.push(Finding::MissingChunk(tag));
            continue;
        };
        let start = first.start;
        if start < last_seen {
            report.push(Finding::OutOfOrder(tag));
        }
        last_seen = start;
    }
}

pub fn check_cardinality(report: &mut Report<'_>) {
    for tag in SINGLE_OCCURRENCE {
        let count = report.chunks.count(tag);
        if count > 1 {
            report.push(Finding::AbnormalChunkCount { tag, count });
        }
    }
}

/// Flag anything after the first IEND chunk and keep it in
/// `report.extra_data`.
pub fn check_trailing_data(report: &mut Report<'_>) {
    let Some(end) = report.chunks.first(ChunkTag::IEND).map(|iend| iend.end) else {
        return;
    };
    let total = report.source().len();
    if end < total {
        report.push(Finding::ExtraData {
            offset: end,
            length: total - end,
        });
        report.extra_data = Some(end..total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::scan_chunks;
    use crate::testutil::{chunk, ihdr, png, sample_png};

    fn checked(data: &[u8]) -> Report<'_> {
        let mut report = Report::new(data);
        scan_chunks(&mut report);
        run_structural_checks(&mut report);
        report
    }

    #[test]
    fn test_valid_file_is_clean() {
        let data = sample_png();
        let report = checked(&data);
        assert!(report.errors.is_empty());
        assert!(report.extra_data.is_none());
    }

    #[test]
    fn test_ancillary_chunks_in_between() {
        let data = png(&[
            ihdr(4, 2, 8, 2),
            chunk(b"gAMA", &[0, 0, 0xb1, 0x8f]),
            chunk(b"IDAT", b"x"),
            chunk(b"tEXt", b"a\0b"),
            chunk(b"IDAT", b"y"),
            chunk(b"tEXt", b"c\0d"),
            chunk(b"IEND", &[]),
        ]);
        let report = checked(&data);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_missing_critical_chunks() {
        let data = png(&[ihdr(4, 2, 8, 2)]);
        let report = checked(&data);
        assert_eq!(
            report.errors,
            vec![
                Finding::MissingChunk(ChunkTag::IDAT),
                Finding::MissingChunk(ChunkTag::IEND),
            ]
        );
    }

    #[test]
    fn test_out_of_order() {
        let data = png(&[
            chunk(b"IDAT", b"x"),
            ihdr(4, 2, 8, 2),
            chunk(b"IEND", &[]),
        ]);
        let report = checked(&data);
        assert_eq!(report.errors, vec![Finding::OutOfOrder(ChunkTag::IDAT)]);
        assert_eq!(
            report.errors[0].to_string(),
            "IDAT - chunk appears out of order"
        );
    }

    #[test]
    fn test_missing_chunk_keeps_cursor() {
        // With no IHDR the cursor stays at 0, so nothing after it can be
        // out of order.
        let data = png(&[
            chunk(b"tEXt", b"a\0b"),
            chunk(b"IDAT", b"x"),
            chunk(b"IEND", &[]),
        ]);
        let report = checked(&data);
        assert_eq!(report.errors, vec![Finding::MissingChunk(ChunkTag::IHDR)]);
    }

    #[test]
    fn test_cardinality() {
        let data = png(&[
            ihdr(4, 2, 8, 2),
            ihdr(4, 2, 8, 2),
            chunk(b"tIME", &[7, 0xe6, 1, 1, 0, 0, 0]),
            chunk(b"tIME", &[7, 0xe6, 1, 1, 0, 0, 0]),
            chunk(b"tIME", &[7, 0xe6, 1, 1, 0, 0, 0]),
            chunk(b"IDAT", b"x"),
            chunk(b"IDAT", b"y"),
            chunk(b"tEXt", b"a\0b"),
            chunk(b"tEXt", b"c\0d"),
            chunk(b"IEND", &[]),
        ]);
        let report = checked(&data);
        assert_eq!(
            report.errors,
            vec![
                Finding::AbnormalChunkCount {
                    tag: ChunkTag::IHDR,
                    count: 2
                },
                Finding::AbnormalChunkCount {
                    tag: ChunkTag::tIME,
                    count: 3
                },
            ]
        );
        assert_eq!(
            report.errors[0].to_string(),
            "IHDR - Abnormal number of chunk: 2"
        );
    }

    #[test]
    fn test_extra_data() {
        let mut data = sample_png();
        let end = data.len();
        data.extend_from_slice(b"trailing");
        let report = checked(&data);

        assert_eq!(
            report.errors,
            vec![Finding::ExtraData {
                offset: end,
                length: 8
            }]
        );
        assert_eq!(report.extra_data, Some(end..end + 8));
        assert_eq!(report.extra_bytes(), Some(&b"trailing"[..]));
    }

    #[test]
    fn test_no_iend_means_no_extra_data_check() {
        let mut data = png(&[ihdr(4, 2, 8, 2), chunk(b"IDAT", b"x")]);
        data.extend_from_slice(b"\0\0\0");
        let report = checked(&data);

        assert!(report.extra_data.is_none());
        assert!(!report
            .errors
            .iter()
            .any(|e| matches!(e, Finding::ExtraData { .. })));
    }
}
