//! Compression codec for stored payloads.
//!
//! Payloads are deflated with a zlib wrapper before chunking, the same stream
//! format the session blobs were originally written in, so compressed size
//! (not payload size) is what counts against the backend's per-key ceiling.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

/// Compress a payload with zlib at the given level (0-9).
pub(crate) fn compress(data: &[u8], level: u32) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data)?;
    encoder.finish()
}

/// Decompress a zlib stream produced by [`compress`].
pub(crate) fn decompress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_decompress() {
        let data = b"session payload with enough repetition to compress well well well";
        let compressed = compress(data, 6).unwrap();
        let decompressed = decompress(&compressed).unwrap();
        assert_eq!(data.as_slice(), decompressed.as_slice());
    }

    #[test]
    fn test_empty_input_produces_nonempty_stream() {
        // The store relies on this: even an empty payload yields at least
        // one chunk, so manifest presence alone marks existence.
        let compressed = compress(b"", 6).unwrap();
        assert!(!compressed.is_empty());
        assert!(decompress(&compressed).unwrap().is_empty());
    }

    #[test]
    fn test_decompress_rejects_garbage() {
        assert!(decompress(b"not a zlib stream").is_err());
    }
}
