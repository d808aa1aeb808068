//! Splitting of response bodies into queue-sized parts

use sha2::{Digest, Sha256};

use crate::core::models::OutboundPart;

/// SQS caps a message at 256 KiB; the remainder is headroom for message attributes.
pub const MAX_MESSAGE_SIZE: usize = 256_000;

/// Split `body` into consecutive chunks of at most `max_bytes` bytes.
///
/// Chunks never end inside a UTF-8 code point, so every chunk is valid text
/// and concatenating them gives back `body`. An empty body yields no chunks.
///
/// # Panics
///
/// Panics if `max_bytes` is smaller than 4, the width of the widest code point.
#[must_use]
pub fn split_for_queue(body: &str, max_bytes: usize) -> Vec<&str> {
    assert!(max_bytes >= 4, "chunk size must fit any UTF-8 code point");

    let mut chunks = Vec::with_capacity(body.len().div_ceil(max_bytes));
    let mut rest = body;
    while !rest.is_empty() {
        let mut end = rest.len().min(max_bytes);
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (head, tail) = rest.split_at(end);
        chunks.push(head);
        rest = tail;
    }
    chunks
}

/// Lowercase hex SHA-256 of the full serialized body.
#[must_use]
pub fn body_digest(body: &str) -> String {
    hex::encode(Sha256::digest(body.as_bytes()))
}

/// `index` is 0-based.
#[must_use]
pub fn deduplication_id(digest: &str, group_id: &str, index: usize) -> String {
    format!("{digest}-{group_id}-{index}")
}

#[must_use]
pub fn plan_parts(body: &str, group_id: &str) -> Vec<OutboundPart> {
    plan_parts_with_limit(body, group_id, MAX_MESSAGE_SIZE)
}

#[must_use]
pub fn plan_parts_with_limit(body: &str, group_id: &str, max_bytes: usize) -> Vec<OutboundPart> {
    let digest = body_digest(body);
    let chunks = split_for_queue(body, max_bytes);
    let total_parts = chunks.len();

    chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| OutboundPart {
            body: chunk.to_string(),
            group_id: group_id.to_string(),
            deduplication_id: deduplication_id(&digest, group_id, index),
            part_number: index + 1,
            total_parts,
        })
        .collect()
}
