// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Almanac service night-data documents.

use serde_json::Value;

use mech_core::almanac::AlmanacNight;
use mech_core::PeerError;

/// Decode a `/nextnight` answer. Priority, sunrise and sunset are
/// required; the position block is optional extra information.
pub fn parse_night(body: &str) -> Result<AlmanacNight, PeerError> {
    if body.trim().is_empty() {
        return Err(PeerError::Empty);
    }
    let doc: Value =
        serde_json::from_str(body).map_err(|error| PeerError::Syntax(error.to_string()))?;

    let priority = doc
        .pointer("/almanac/priority")
        .and_then(Value::as_i64)
        .ok_or(PeerError::Missing(".almanac.priority"))?;
    let sunrise = doc
        .pointer("/almanac/sunrise")
        .and_then(Value::as_i64)
        .ok_or(PeerError::Missing(".almanac.sunrise"))?;
    let sunset = doc
        .pointer("/almanac/sunset")
        .and_then(Value::as_i64)
        .ok_or(PeerError::Missing(".almanac.sunset"))?;

    Ok(AlmanacNight {
        priority,
        sunrise,
        sunset,
        timezone: doc
            .pointer("/position/timezone")
            .and_then(Value::as_str)
            .map(str::to_string),
        latitude: doc.pointer("/position/lat").and_then(Value::as_f64),
        longitude: doc.pointer("/position/long").and_then(Value::as_f64),
    })
}
