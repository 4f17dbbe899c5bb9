// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::sampler::{SamplerError, SamplerResult};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::time::{SystemTime, UNIX_EPOCH};

/// Size of a sample on the wire: a little-endian u64 of epoch milliseconds.
pub const SAMPLE_LEN: usize = 8;

pub fn encode(sent_ms: u64) -> Bytes {
    let mut buf = BytesMut::with_capacity(SAMPLE_LEN);
    buf.put_u64_le(sent_ms);
    buf.freeze()
}

/// Read the send timestamp from a sample.
///
/// Trailing bytes beyond the first eight are ignored.
pub fn decode(mut payload: &[u8]) -> SamplerResult<u64> {
    if payload.len() < SAMPLE_LEN {
        return Err(SamplerError::Payload {
            dbg: format!(
                "sample too short: expected {} bytes, got {}",
                SAMPLE_LEN,
                payload.len()
            ),
        });
    }
    Ok(payload.get_u64_le())
}

pub fn unix_millis(time: SystemTime) -> u64 {
    // clocks set before 1970 report 0
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub fn now_millis() -> u64 {
    unix_millis(SystemTime::now())
}

// Negative when the publisher's clock runs ahead of ours. Saturates at the
// i64 bounds for timestamps no real clock produces.
pub fn latency_ms(received_ms: u64, sent_ms: u64) -> i64 {
    let diff = received_ms as i128 - sent_ms as i128;
    diff.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}
