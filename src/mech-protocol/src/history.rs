// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! History service log documents.
//!
//! The history services list their records as positional JSON arrays:
//! `[0]` is the timestamp in milliseconds, `[1]` through `[3]` the
//! three string columns (category/location, name, action/value), and
//! `[7]` the globally unique, monotonically increasing record id.

use serde_json::Value;

use mech_core::feed::{FeedLatest, FeedRecord, StreamId};
use mech_core::PeerError;

fn parse(body: &str) -> Result<Value, PeerError> {
    if body.trim().is_empty() {
        return Err(PeerError::Empty);
    }
    serde_json::from_str(body).map_err(|error| PeerError::Syntax(error.to_string()))
}

/// Decode a latest-id probe answer (`.saga.latest`).
pub fn parse_latest(body: &str) -> Result<FeedLatest, PeerError> {
    let doc = parse(body)?;
    let latest = doc
        .pointer("/saga/latest")
        .and_then(Value::as_i64)
        .ok_or(PeerError::Missing(".saga.latest"))?;
    Ok(FeedLatest { latest })
}

fn column(record: &[Value], index: usize) -> Option<String> {
    match record.get(index)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Decode a record fetch answer for one stream. Entries that are not
/// arrays are skipped; an array missing a required column fails the
/// whole document.
pub fn parse_records(body: &str, stream: StreamId) -> Result<Vec<FeedRecord>, PeerError> {
    let doc = parse(body)?;
    let entries = doc
        .pointer(&format!("/saga/{}", stream.records_member()))
        .and_then(Value::as_array)
        .ok_or(PeerError::Missing(".saga records"))?;

    let mut records = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(row) = entry.as_array() else {
            continue;
        };
        let id = row
            .get(7)
            .and_then(Value::as_i64)
            .ok_or(PeerError::Missing("record id"))?;
        let timestamp_ms = row
            .get(0)
            .and_then(Value::as_i64)
            .ok_or(PeerError::Missing("record timestamp"))?;
        let fields = [
            column(row, 1).ok_or(PeerError::Missing("record column 1"))?,
            column(row, 2).ok_or(PeerError::Missing("record column 2"))?,
            column(row, 3).ok_or(PeerError::Missing("record column 3"))?,
        ];
        records.push(FeedRecord {
            id,
            timestamp_ms,
            fields,
        });
    }
    Ok(records)
}
