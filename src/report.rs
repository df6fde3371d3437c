use std::ops::Range;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::chunk::{ChunkRecord, ChunkTable, ChunkTag};
use crate::header::HeaderInfo;

/// A problem confined to a single chunk.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChunkIssue {
    #[error("Incomplete chunk: current_len={available}")]
    Incomplete { available: usize },

    #[error("CRC discrepancy")]
    CrcMismatch,
}

/// A structural finding about the file as a whole.
///
/// Findings are advisory: they are collected while the inspection keeps
/// going, unlike [`DecodingError`](crate::DecodingError) which stops it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Finding {
    #[error("Incomplete file")]
    IncompleteFile,

    #[error("IHDR - abnormal number of chunks: {0}")]
    AbnormalHeaderCount(usize),

    #[error("{0} - critical chunk does not appear")]
    MissingChunk(ChunkTag),

    #[error("{0} - chunk appears out of order")]
    OutOfOrder(ChunkTag),

    #[error("{tag} - Abnormal number of chunk: {count}")]
    AbnormalChunkCount { tag: ChunkTag, count: usize },

    #[error("Extra data appears at the end of file, see object['extradata']")]
    ExtraData { offset: usize, length: usize },

    #[error("IDAT - wrong length, guessed height: {guessed_height}")]
    IdatLengthMismatch {
        expected_height: u32,
        guessed_height: u64,
    },
}

/// Everything learned about one PNG byte stream.
///
/// The report borrows the inspected buffer: chunk payloads and trailing data
/// are kept as index ranges into it and resolved on demand.
#[derive(Debug, Clone)]
pub struct Report<'a> {
    source: &'a [u8],
    pub errors: Vec<Finding>,
    pub chunks: ChunkTable,
    pub headers: Option<HeaderInfo>,
    pub raw_image_data: Option<Vec<u8>>,
    pub extra_data: Option<Range<usize>>,
}

impl<'a> Report<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Self {
            source,
            errors: Vec::new(),
            chunks: ChunkTable::default(),
            headers: None,
            raw_image_data: None,
            extra_data: None,
        }
    }

    /// The buffer this report describes.
    pub fn source(&self) -> &'a [u8] {
        self.source
    }

    /// The payload bytes of a chunk. Incomplete chunks yield what was
    /// actually present in the buffer.
    pub fn payload(&self, record: &ChunkRecord) -> &'a [u8] {
        &self.source[record.payload.clone()]
    }

    /// Bytes found after the first IEND chunk, if the structural checks ran
    /// and found any.
    pub fn extra_bytes(&self) -> Option<&'a [u8]> {
        self.extra_data.clone().map(|range| &self.source[range])
    }

    pub(crate) fn push(&mut self, finding: Finding) {
        log::debug!("{finding}");
        self.errors.push(finding);
    }
}

#[derive(serde::Serialize)]
struct ChunkView {
    start: usize,
    end: usize,
    len: u32,
    errors: Vec<String>,
    data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_crc: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual_crc: Option<u32>,
}

impl ChunkView {
    fn new(record: &ChunkRecord, payload: &[u8]) -> Self {
        Self {
            start: record.start,
            end: record.end,
            len: record.declared_length,
            errors: record.issues.iter().map(ToString::to_string).collect(),
            data: hex::encode(payload),
            expected_crc: record.expected_crc,
            actual_crc: record.actual_crc,
        }
    }
}

struct ChunksView<'r, 'a>(&'r Report<'a>);

impl Serialize for ChunksView<'_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let report = self.0;
        serializer.collect_map(report.chunks.iter().map(|(tag, records)| {
            let views = records
                .iter()
                .map(|record| ChunkView::new(record, report.payload(record)))
                .collect::<Vec<_>>();
            (tag.to_string(), views)
        }))
    }
}

/// Serializes to the JSON layout consumers of the dump expect: `errors`,
/// `chunks`, then `headers`, `raw_idat_data` and `extradata` when present.
/// Byte payloads are hex encoded.
impl Serialize for Report<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let errors = self.errors.iter().map(ToString::to_string).collect::<Vec<_>>();

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("errors", &errors)?;
        map.serialize_entry("chunks", &ChunksView(self))?;
        if let Some(headers) = &self.headers {
            map.serialize_entry("headers", headers)?;
        }
        if let Some(raw) = &self.raw_image_data {
            map.serialize_entry("raw_idat_data", &hex::encode(raw))?;
        }
        if let Some(extra) = self.extra_bytes() {
            map.serialize_entry("extradata", &hex::encode(extra))?;
        }
        map.end()
    }
}
