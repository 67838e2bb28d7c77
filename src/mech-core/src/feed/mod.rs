// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Incremental tailing of the history services' append-only streams.
//!
//! One generic engine, instantiated once for the event stream and once
//! for the sensor stream. The two instances never share cursor state.

mod tailer;

pub use tailer::FeedTailer;

use crate::fact::Fact;

/// Which append-only stream a tailer instance consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamId {
    Events,
    Sensors,
}

impl StreamId {
    pub fn name(self) -> &'static str {
        match self {
            Self::Events => "event",
            Self::Sensors => "sensor",
        }
    }

    /// Path of the lightweight latest-id probe.
    pub fn probe_path(self) -> &'static str {
        match self {
            Self::Events => "/log/latest",
            Self::Sensors => "/log/sensor/latest",
        }
    }

    /// Path of the record fetch (takes a `since` query parameter).
    pub fn records_path(self) -> &'static str {
        match self {
            Self::Events => "/log/events",
            Self::Sensors => "/log/sensor/data",
        }
    }

    /// Member of the `saga` object holding this stream's records.
    pub fn records_member(self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Sensors => "sensor",
        }
    }

    /// Build the fact this stream's records dispatch as.
    pub fn fact(self, record: &FeedRecord) -> Fact {
        let [first, name, last] = record.fields.clone();
        match self {
            Self::Events => Fact::Event {
                category: first,
                name,
                action: last,
            },
            Self::Sensors => Fact::Sensor {
                location: first,
                name,
                value: last,
            },
        }
    }
}

/// Parsed latest-id probe answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedLatest {
    pub latest: i64,
}

/// One record of a history stream. `fields` carries the three
/// positional string columns after the timestamp: category/location,
/// name, and action/value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRecord {
    pub id: i64,
    pub timestamp_ms: i64,
    pub fields: [String; 3],
}
