// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Actuator server status documents.
//!
//! Every control server answer (status scan or actuation response)
//! carries a `control.status` collection mapping each served point
//! name to its current state. A document that fails to parse is
//! rejected whole: no partial state is applied from it.

use serde_json::Value;

use mech_core::control::PointStatus;
use mech_core::PeerError;

fn parse(body: &str) -> Result<Value, PeerError> {
    if body.trim().is_empty() {
        return Err(PeerError::Empty);
    }
    serde_json::from_str(body).map_err(|error| PeerError::Syntax(error.to_string()))
}

/// Decode the `control.status` collection of an actuator document.
pub fn parse_control_status(body: &str) -> Result<Vec<PointStatus>, PeerError> {
    let doc = parse(body)?;
    let points = doc
        .pointer("/control/status")
        .and_then(Value::as_object)
        .ok_or(PeerError::Missing(".control.status"))?;
    if points.is_empty() {
        return Err(PeerError::Empty);
    }
    Ok(points
        .iter()
        .map(|(name, entry)| PointStatus {
            name: name.clone(),
            state: entry
                .pointer("/state")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
        .collect())
}
