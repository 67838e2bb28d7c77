// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::fmt;

/// Activation state of a control point as this service understands it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Activation {
    /// Never observed, or routing changed and fresh state is pending.
    #[default]
    Unknown,
    /// Known and idle.
    Inactive,
    /// An activation request was issued and has not expired.
    Active,
    /// The last exchange with its actuator server failed.
    Error,
}

impl Activation {
    /// Single-character code used in the status document.
    pub fn code(self) -> char {
        match self {
            Self::Unknown => 'u',
            Self::Inactive => 'i',
            Self::Active => 'a',
            Self::Error => 'e',
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One named control point.
///
/// `deadline` is set only while a pulsed activation is outstanding; it
/// is cleared by the sweep on expiry or by an explicit cancel, never
/// left dangling after a transition out of `Active`.
#[derive(Debug, Default)]
pub struct Control {
    pub(crate) routing_url: String,
    pub(crate) state: Option<String>,
    pub(crate) activation: Activation,
    pub(crate) deadline: Option<i64>,
}

impl Control {
    /// Routing URL of the actuator server that owns this point, or an
    /// empty string while unknown.
    pub fn routing_url(&self) -> &str {
        &self.routing_url
    }

    /// Last state reported by the actuator server, if any.
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn deadline(&self) -> Option<i64> {
        self.deadline
    }
}
