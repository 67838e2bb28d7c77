// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Facts flowing into the rule dispatcher.

use std::fmt;

use serde::Serialize;

/// A single observation dispatched to the automation rules.
///
/// Facts are ephemeral: they are produced by the feed tailers and the
/// control registry, handed to the rule dispatcher once, and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fact {
    /// An event recorded by a history service (category, name, action).
    Event {
        category: String,
        name: String,
        action: String,
    },
    /// A sensor reading recorded by a history service.
    Sensor {
        location: String,
        name: String,
        value: String,
    },
    /// A control point changed state on its actuator server.
    ControlChange { name: String, state: String },
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event {
                category,
                name,
                action,
            } => write!(f, "EVENT {} {} {}", category, name, action),
            Self::Sensor {
                location,
                name,
                value,
            } => write!(f, "SENSOR {} {} {}", location, name, value),
            Self::ControlChange { name, state } => write!(f, "POINT {} {}", name, state),
        }
    }
}
