// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize the tracing subscriber for a mech-rs process.
///
/// `log_level` comes from the config file; an absent or invalid value
/// falls back to INFO.
pub fn init_logging(log_level: Option<&str>) {
    let level = log_level
        .and_then(|value| value.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    FmtSubscriber::builder()
        .with_target(false)
        .with_max_level(level)
        .init();
}
