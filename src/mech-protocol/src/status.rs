// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The status document this service produces.
//!
//! Serialization is size-capped: a document that would exceed the cap
//! is reported as an error so the caller can degrade to an empty
//! status instead of serving a truncated document.

use std::io;

use chrono::{Local, TimeZone};
use serde::Serialize;
use thiserror::Error;

use mech_core::almanac::AlmanacSnapshot;
use mech_core::control::ControlSnapshot;

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("status document exceeds {0} bytes")]
    Overflow(usize),
    #[error("status serialization failed: {0}")]
    Serialize(String),
}

/// Everything the status document reports, captured once per tick.
#[derive(Debug, Clone, Default)]
pub struct StatusSnapshot {
    pub host: String,
    pub timestamp: i64,
    pub servers: Vec<String>,
    pub controls: Vec<ControlSnapshot>,
    pub almanac: Option<AlmanacSnapshot>,
}

#[derive(Serialize)]
struct StatusDoc<'a> {
    host: &'a str,
    timestamp: i64,
    mech: MechDoc<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    almanac: Option<AlmanacDoc<'a>>,
}

#[derive(Serialize)]
struct MechDoc<'a> {
    servers: &'a [String],
    controls: Vec<(&'a str, char, &'a str, i64)>,
}

#[derive(Serialize)]
struct AlmanacDoc<'a> {
    priority: i64,
    sunset: String,
    sunrise: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<LocationDoc<'a>>,
}

#[derive(Serialize)]
struct LocationDoc<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    timezone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lat: Option<f64>,
    #[serde(rename = "long", skip_serializing_if = "Option::is_none")]
    longitude: Option<f64>,
}

/// Writer that refuses to grow past its cap.
struct BoundedWriter {
    buffer: Vec<u8>,
    cap: usize,
}

impl io::Write for BoundedWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.buffer.len() + data.len() > self.cap {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "status cap"));
        }
        self.buffer.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn wall_clock(timestamp: i64) -> String {
    Local
        .timestamp_opt(timestamp, 0)
        .single()
        .map(|moment| moment.format("%H:%M").to_string())
        .unwrap_or_default()
}

fn almanac_doc(snapshot: &AlmanacSnapshot) -> AlmanacDoc<'_> {
    let location = if snapshot.timezone.is_some() || snapshot.position.is_some() {
        Some(LocationDoc {
            timezone: snapshot.timezone.as_deref(),
            lat: snapshot.position.map(|(lat, _)| lat),
            longitude: snapshot.position.map(|(_, long)| long),
        })
    } else {
        None
    };
    AlmanacDoc {
        priority: snapshot.priority,
        sunset: wall_clock(snapshot.sunset),
        sunrise: wall_clock(snapshot.sunrise),
        location,
    }
}

/// Render the status document, refusing to exceed `cap` bytes.
pub fn render_status(snapshot: &StatusSnapshot, cap: usize) -> Result<String, StatusError> {
    let doc = StatusDoc {
        host: &snapshot.host,
        timestamp: snapshot.timestamp,
        mech: MechDoc {
            servers: &snapshot.servers,
            controls: snapshot
                .controls
                .iter()
                .map(|control| {
                    (
                        control.name.as_str(),
                        control.activation,
                        control.url.as_str(),
                        control.remaining,
                    )
                })
                .collect(),
        },
        almanac: snapshot.almanac.as_ref().map(almanac_doc),
    };

    let mut writer = BoundedWriter {
        buffer: Vec::new(),
        cap,
    };
    match serde_json::to_writer(&mut writer, &doc) {
        Ok(()) => String::from_utf8(writer.buffer)
            .map_err(|error| StatusError::Serialize(error.to_string())),
        Err(error) if error.is_io() => Err(StatusError::Overflow(cap)),
        Err(error) => Err(StatusError::Serialize(error.to_string())),
    }
}
