//! `Content-Encoding` removal.

use crate::http::Header;
use brotli::Decompressor;
use bw_core::EngineError;
use bw_core::EngineResult;
use flate2::read::DeflateDecoder;
use flate2::read::GzDecoder;
use flate2::read::ZlibDecoder;
use std::io::Read;

/// Undoes every listed coding, last applied first.
pub fn decode_body(headers: &[Header], body: Vec<u8>) -> EngineResult<Vec<u8>> {
    let codings: Vec<String> = headers
        .iter()
        .filter(|header| header.name.eq_ignore_ascii_case("content-encoding"))
        .flat_map(|header| header.value.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect();

    codings.iter().rev().try_fold(body, |data, coding| {
        log::trace!("removing {coding} coding from {} bytes", data.len());
        match coding.as_str() {
            "identity" => Ok(data),
            "gzip" | "x-gzip" => read_all(GzDecoder::new(data.as_slice()), coding),
            "deflate" => inflate(&data),
            "br" => read_all(Decompressor::new(data.as_slice(), 4096), coding),
            other => Err(EngineError::new(
                "net.http.content_encoding_unsupported",
                format!("unsupported content encoding `{other}`"),
            )),
        }
    })
}

// Servers disagree on whether `deflate` carries the zlib wrapper.
fn inflate(data: &[u8]) -> EngineResult<Vec<u8>> {
    let mut wrapped = Vec::new();
    if ZlibDecoder::new(data).read_to_end(&mut wrapped).is_ok() {
        return Ok(wrapped);
    }
    read_all(DeflateDecoder::new(data), "deflate")
}

fn read_all(mut reader: impl Read, coding: &str) -> EngineResult<Vec<u8>> {
    let mut decoded = Vec::new();
    reader.read_to_end(&mut decoded).map_err(|error| {
        EngineError::new("net.http.decode_failed", format!("{coding} decode failed: {error}"))
    })?;
    Ok(decoded)
}
