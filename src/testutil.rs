//! Synthetic PNG streams for the unit tests.

use std::io::Write;

use flate2::{write::ZlibEncoder, Compression};

use crate::chunk::{chunk_crc, ChunkTag};
use crate::signature::PNG_SIGNATURE;

/// A complete chunk with a correct CRC.
pub fn chunk(tag: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 12);
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(tag);
    out.extend_from_slice(data);
    out.extend_from_slice(&chunk_crc(&ChunkTag(*tag), data).to_be_bytes());
    out
}

pub fn ihdr_payload(width: u32, height: u32, bit_depth: u8, color_type: u8) -> [u8; 13] {
    let mut payload = [0; 13];
    payload[0..4].copy_from_slice(&width.to_be_bytes());
    payload[4..8].copy_from_slice(&height.to_be_bytes());
    payload[8] = bit_depth;
    payload[9] = color_type;
    payload
}

pub fn ihdr(width: u32, height: u32, bit_depth: u8, color_type: u8) -> Vec<u8> {
    chunk(b"IHDR", &ihdr_payload(width, height, bit_depth, color_type))
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// The signature followed by `chunks`.
pub fn png(chunks: &[Vec<u8>]) -> Vec<u8> {
    let mut out = PNG_SIGNATURE.to_vec();
    for chunk in chunks {
        out.extend_from_slice(chunk);
    }
    out
}

/// A 4x2 truecolor image. IHDR spans bytes 8..33 and its CRC sits at 29..33.
pub fn sample_png() -> Vec<u8> {
    png(&[
        ihdr(4, 2, 8, 2),
        chunk(b"IDAT", &zlib(&[0; 26])),
        chunk(b"IEND", &[]),
    ])
}
