//! Big-endian, order-preserving encoding of scalar and composite keys (§4.1).
//!
//! Everything here is a pure function over borrowed/owned byte buffers - no
//! column family, transaction, or engine type is visible from this module,
//! so it has zero storage-engine dependency and is trivially unit-testable.

use crate::domain::JobKey;
use crate::error::{Result, StoreError};

/// Encodes a `u64` as 8 big-endian bytes, so lexicographic byte order matches
/// numeric order.
pub fn encode_u64(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Decodes a `u64` from the front of `buf`, returning the value and the
/// remaining (unconsumed) slice.
pub fn decode_u64(buf: &[u8]) -> Result<(u64, &[u8])> {
    if buf.len() < 8 {
        return Err(StoreError::CorruptKey(format!(
            "expected 8 bytes for u64, got {}",
            buf.len()
        )));
    }
    let (head, tail) = buf.split_at(8);
    let mut arr = [0u8; 8];
    arr.copy_from_slice(head);
    Ok((u64::from_be_bytes(arr), tail))
}

/// Encodes a `u16` as 2 big-endian bytes - used for the column-family
/// discriminator prefix (§3, §4.3).
pub fn encode_u16(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}

pub fn decode_u16(buf: &[u8]) -> Result<(u16, &[u8])> {
    if buf.len() < 2 {
        return Err(StoreError::CorruptKey(format!(
            "expected 2 bytes for u16, got {}",
            buf.len()
        )));
    }
    let (head, tail) = buf.split_at(2);
    let mut arr = [0u8; 2];
    arr.copy_from_slice(head);
    Ok((u16::from_be_bytes(arr), tail))
}

/// Encodes a byte string as a 2-byte big-endian length prefix followed by
/// the raw bytes. Length-prefixing (rather than a sentinel terminator) keeps
/// the encoding unambiguous for arbitrary binary job types.
pub fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + bytes.len());
    out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
    out.extend_from_slice(bytes);
    out
}

/// Decodes a length-prefixed byte string from the front of `buf`, returning
/// a borrowed slice and the remaining tail.
pub fn decode_bytes(buf: &[u8]) -> Result<(&[u8], &[u8])> {
    let (len, rest) = decode_u16(buf)?;
    let len = len as usize;
    if rest.len() < len {
        return Err(StoreError::CorruptKey(format!(
            "expected {len} bytes of payload, got {}",
            rest.len()
        )));
    }
    Ok(rest.split_at(len))
}

/// Composite key `(type, jobKey)` used by `JOB_ACTIVATABLE`: a length-prefixed
/// type followed by an 8-byte job key, ordered first by type then by key.
pub fn encode_type_key(job_type: &[u8], key: JobKey) -> Vec<u8> {
    let mut out = encode_bytes(job_type);
    out.extend_from_slice(&encode_u64(key));
    out
}

pub fn decode_type_key(buf: &[u8]) -> Result<(&[u8], JobKey)> {
    let (job_type, rest) = decode_bytes(buf)?;
    let (key, rest) = decode_u64(rest)?;
    if !rest.is_empty() {
        return Err(StoreError::CorruptKey(
            "trailing bytes after (type, jobKey) composite key".into(),
        ));
    }
    Ok((job_type, key))
}

/// Composite key `(u64, jobKey)` used by `JOB_DEADLINES` and `JOB_BACKOFF`:
/// two 8-byte big-endian integers concatenated, ordered first by the leading
/// timestamp then by key.
pub fn encode_timestamp_key(timestamp: u64, key: JobKey) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[..8].copy_from_slice(&encode_u64(timestamp));
    out[8..].copy_from_slice(&encode_u64(key));
    out
}

pub fn decode_timestamp_key(buf: &[u8]) -> Result<(u64, JobKey)> {
    let (timestamp, rest) = decode_u64(buf)?;
    let (key, rest) = decode_u64(rest)?;
    if !rest.is_empty() {
        return Err(StoreError::CorruptKey(
            "trailing bytes after (timestamp, jobKey) composite key".into(),
        ));
    }
    Ok((timestamp, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u64_round_trips_and_preserves_order() {
        let a = encode_u64(1);
        let b = encode_u64(2);
        assert!(a < b, "encoding must preserve numeric order lexicographically");
        let (v, rest) = decode_u64(&a).unwrap();
        assert_eq!(v, 1);
        assert!(rest.is_empty());
    }

    #[test]
    fn type_key_orders_by_type_then_key() {
        let a = encode_type_key(b"payment", 5);
        let b = encode_type_key(b"payment", 9);
        let c = encode_type_key(b"shipping", 1);
        assert!(a < b);
        assert!(b < c);
        let (t, k) = decode_type_key(&a).unwrap();
        assert_eq!(t, b"payment");
        assert_eq!(k, 5);
    }

    #[test]
    fn timestamp_key_round_trips() {
        let k = encode_timestamp_key(2000, 42);
        let (ts, key) = decode_timestamp_key(&k).unwrap();
        assert_eq!(ts, 2000);
        assert_eq!(key, 42);
    }

    #[test]
    fn truncated_key_is_corrupt() {
        assert!(decode_u64(&[1, 2, 3]).is_err());
        assert!(decode_type_key(&[0, 5, b'h', b'i']).is_err());
    }
}
