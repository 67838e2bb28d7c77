// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Control registry and actuation engine.
//!
//! Tracks every control point ever referenced, its current routing URL
//! (which actuator server owns it), the last remotely observed state,
//! and the pulse deadline of a timed activation. Control points are
//! created lazily and live for the process lifetime; a restart
//! re-learns everything from the actuator servers' status documents.

mod point;
mod registry;

pub use point::{Activation, Control};
pub use registry::{ControlRegistry, ControlSnapshot, PointStatus};
