//! Gzip compression for optimized assets.
//!
//! Compressed bytes replace the file under its original name (the web server
//! adds `Content-Encoding`), so a file is only compressed when it shrinks.

use anyhow::{Context, Result};
use flate2::{Compression, write::GzEncoder};
use std::io::Write;

/// Gzip `data` at the best compression level.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(data)
        .context("Unable to gzip content")?;
    encoder.finish().context("Unable to finish gzip stream")
}

/// Gzip `data`, keeping the plain bytes when compression would grow them.
pub fn compress_unless_growing(data: Vec<u8>) -> Result<Vec<u8>> {
    let compressed = compress(&data)?;
    Ok(if compressed.len() < data.len() {
        compressed
    } else {
        data
    })
}
