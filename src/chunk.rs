use std::fmt;
use std::ops::Range;

use crate::report::{ChunkIssue, Finding, Report};
use crate::signature::PNG_SIGNATURE;

/// Bytes of length, type and CRC around every chunk payload.
pub const CHUNK_OVERHEAD: usize = 12;

/// The raw 4-byte type of a chunk.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ChunkTag(pub [u8; 4]);

#[allow(nonstandard_style)]
impl ChunkTag {
    pub const IHDR: Self = Self(*b"IHDR");
    pub const PLTE: Self = Self(*b"PLTE");
    pub const IDAT: Self = Self(*b"IDAT");
    pub const IEND: Self = Self(*b"IEND");
    pub const tRNS: Self = Self(*b"tRNS");
    pub const cHRM: Self = Self(*b"cHRM");
    pub const gAMA: Self = Self(*b"gAMA");
    pub const iCCP: Self = Self(*b"iCCP");
    pub const sBIT: Self = Self(*b"sBIT");
    pub const sRGB: Self = Self(*b"sRGB");
    pub const bKGD: Self = Self(*b"bKGD");
    pub const hIST: Self = Self(*b"hIST");
    pub const pHYs: Self = Self(*b"pHYs");
    pub const tIME: Self = Self(*b"tIME");
}

/// Letters are printed as-is, anything else as a `\xNN` escape.
impl fmt::Display for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_alphabetic() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkTag({self})")
    }
}

/// One chunk as found in the byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRecord {
    pub tag: ChunkTag,
    /// Offset of the length field.
    pub start: usize,
    /// One past the CRC field, as declared. May lie beyond the buffer for an
    /// incomplete chunk.
    pub end: usize,
    pub declared_length: u32,
    /// Payload position in the source buffer, clamped to the buffer's end.
    pub payload: Range<usize>,
    pub expected_crc: Option<u32>,
    pub actual_crc: Option<u32>,
    pub issues: Vec<ChunkIssue>,
}

impl ChunkRecord {
    pub fn crc_ok(&self) -> bool {
        matches!((self.expected_crc, self.actual_crc), (Some(e), Some(a)) if e == a)
    }

    pub fn is_complete(&self) -> bool {
        !self
            .issues
            .iter()
            .any(|issue| matches!(issue, ChunkIssue::Incomplete { .. }))
    }
}

/// Chunks grouped by tag. Groups keep the order in which their tag was first
/// seen, and records within a group keep scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkTable {
    groups: Vec<(ChunkTag, Vec<ChunkRecord>)>,
}

impl ChunkTable {
    pub(crate) fn push(&mut self, record: ChunkRecord) {
        match self.groups.iter_mut().find(|(tag, _)| *tag == record.tag) {
            Some((_, records)) => records.push(record),
            None => self.groups.push((record.tag, vec![record])),
        }
    }

    pub fn get(&self, tag: ChunkTag) -> Option<&[ChunkRecord]> {
        self.groups
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, records)| records.as_slice())
    }

    pub fn first(&self, tag: ChunkTag) -> Option<&ChunkRecord> {
        self.get(tag).and_then(|records| records.first())
    }

    pub fn count(&self, tag: ChunkTag) -> usize {
        self.get(tag).map_or(0, <[_]>::len)
    }

    pub fn contains(&self, tag: ChunkTag) -> bool {
        self.get(tag).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChunkTag, &[ChunkRecord])> {
        self.groups
            .iter()
            .map(|(tag, records)| (*tag, records.as_slice()))
    }

    /// Every record, in the order it appears in the file.
    pub fn records(&self) -> Vec<&ChunkRecord> {
        let mut all = self
            .groups
            .iter()
            .flat_map(|(_, records)| records)
            .collect::<Vec<_>>();
        all.sort_by_key(|record| record.start);
        all
    }

    /// Number of distinct tags.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// CRC-32 of a chunk's type followed by its payload.
pub fn chunk_crc(tag: &ChunkTag, data: &[u8]) -> u32 {
    let mut crc = crc32fast::Hasher::new();
    crc.update(&tag.0);
    crc.update(data);
    crc.finalize()
}

/// Walk the chunks following the signature and record them in
/// `report.chunks`.
///
/// This never fails: truncation is noted on the chunk and in the report's
/// errors, and stops the scan. Scanning also stops right after the first
/// IEND chunk, whatever follows it.
pub fn scan_chunks(report: &mut Report<'_>) {
    let buf = report.source();
    let mut pos = PNG_SIGNATURE.len();

    while pos < buf.len() {
        let Some(head) = buf.get(pos..pos + 8) else {
            log::warn!(
                "Truncated chunk header at offset {pos}: {} bytes left",
                buf.len() - pos
            );
            report.push(Finding::IncompleteFile);
            break;
        };
        let length = u32::from_be_bytes([head[0], head[1], head[2], head[3]]);
        let tag = ChunkTag([head[4], head[5], head[6], head[7]]);

        let data_start = pos + 8;
        let data_end = data_start.saturating_add(length as usize);
        let end = data_end.saturating_add(4);

        let mut record = ChunkRecord {
            tag,
            start: pos,
            end,
            declared_length: length,
            payload: data_start..data_end.min(buf.len()),
            expected_crc: None,
            actual_crc: None,
            issues: Vec::new(),
        };

        // Either the payload or the CRC runs past the end of the buffer.
        let Some(crc_bytes) = buf.get(data_end..end) else {
            let available = record.payload.len();
            log::warn!("{tag} chunk at offset {pos} declares {length} bytes, {available} present");
            record.issues.push(ChunkIssue::Incomplete { available });
            report.chunks.push(record);
            report.push(Finding::IncompleteFile);
            break;
        };

        let expected = u32::from_be_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
        let actual = chunk_crc(&tag, &buf[record.payload.clone()]);
        if expected != actual {
            log::warn!("{tag} chunk at offset {pos}: CRC 0x{expected:08x}, computed 0x{actual:08x}");
            record.issues.push(ChunkIssue::CrcMismatch);
        }
        record.expected_crc = Some(expected);
        record.actual_crc = Some(actual);

        log::trace!("{tag} chunk, {length} bytes at offset {pos}");
        report.chunks.push(record);
        pos = end;

        if tag == ChunkTag::IEND {
            break;
        }
    }
}
