//! HTTP `Range` parsing for the `bytes` unit.
//!
//! Offsets are `u64` end-to-end. Only single-range requests are served; a
//! header that resolves to several ranges is rejected rather than merged or
//! answered with a multipart body.

use crate::error::RangeError;

const BYTES_PREFIX: &str = "bytes=";

/// An inclusive byte range (`start..=end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered; `end` is inclusive.
    pub fn len(self) -> u64 {
        debug_assert!(self.start <= self.end);
        self.end - self.start + 1
    }

    pub fn is_empty(self) -> bool {
        self.start > self.end
    }

    /// Value for the `Content-Range` response header.
    pub fn content_range(self, total_len: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total_len)
    }
}

/// Parses a `Range` header against a resource of `total_len` bytes.
///
/// Empty comma-separated specs are skipped. Each remaining spec must be
/// satisfiable on its own; an open or oversized end is clamped to the last
/// byte.
pub fn parse_range(header: &str, total_len: u64) -> Result<Vec<ByteRange>, RangeError> {
    let specs = header
        .strip_prefix(BYTES_PREFIX)
        .ok_or(RangeError::Malformed)?;

    let mut ranges = Vec::new();
    for spec in specs.split(',') {
        let spec = spec.trim();
        if spec.is_empty() {
            continue;
        }
        ranges.push(resolve_spec(spec, total_len)?);
    }

    if ranges.is_empty() {
        return Err(RangeError::Unsatisfiable);
    }
    Ok(ranges)
}

/// Parses a `Range` header that must describe exactly one range.
pub fn parse_single_range(header: &str, total_len: u64) -> Result<ByteRange, RangeError> {
    match parse_range(header, total_len)?.as_slice() {
        [only] => Ok(*only),
        _ => Err(RangeError::MultipleRanges),
    }
}

fn resolve_spec(spec: &str, total_len: u64) -> Result<ByteRange, RangeError> {
    let (first, last) = spec.split_once('-').ok_or(RangeError::Malformed)?;

    let (start, end) = match (first.is_empty(), last.is_empty()) {
        (true, true) => return Err(RangeError::Malformed),
        // `-suffix`: the last `suffix` bytes.
        (true, false) => {
            let suffix = parse_position(last)?;
            if suffix == 0 {
                return Err(RangeError::Malformed);
            }
            (total_len.saturating_sub(suffix), None)
        }
        // `start-`: through the end of the resource.
        (false, true) => (parse_position(first)?, None),
        // `start-end`
        (false, false) => {
            let start = parse_position(first)?;
            let end = parse_position(last)?;
            if end < start {
                return Err(RangeError::Malformed);
            }
            (start, Some(end))
        }
    };

    if start >= total_len {
        return Err(RangeError::Unsatisfiable);
    }
    let last_byte = total_len - 1;
    let end = end.map_or(last_byte, |end| end.min(last_byte));

    Ok(ByteRange { start, end })
}

fn parse_position(raw: &str) -> Result<u64, RangeError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RangeError::Malformed);
    }
    raw.parse::<u64>().map_err(|_| RangeError::Malformed)
}
