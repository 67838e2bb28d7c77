// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! JSON documents exchanged with the home-automation peers.
//!
//! The peers are consumed as given: this crate only decodes the
//! documents the control, history and almanac services already serve,
//! and renders the status document this service produces. No new wire
//! protocol is defined.

pub mod actuator;
pub mod almanac;
pub mod history;
pub mod status;

pub use actuator::parse_control_status;
pub use almanac::parse_night;
pub use history::{parse_latest, parse_records};
pub use status::{render_status, StatusError, StatusSnapshot};
