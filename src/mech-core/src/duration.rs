// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Human-readable durations for activation log events.

fn period(high: i64, high_label: &str, low: i64, low_label: &str) -> String {
    let high_s = if high > 1 { "S" } else { "" };
    if low > 0 {
        let low_s = if low > 1 { "S" } else { "" };
        format!(
            "{} {}{}, {} {}{}",
            high, high_label, high_s, low, low_label, low_s
        )
    } else {
        format!("{} {}{}", high, high_label, high_s)
    }
}

/// Render a duration in seconds as its two largest non-zero units,
/// e.g. `90061` becomes `"1 DAY, 1 HOUR"`. Zero or negative durations
/// render as `"NOW"`.
pub fn printable(seconds: i64) -> String {
    if seconds <= 0 {
        return "NOW".to_string();
    }
    if seconds > 86400 {
        period(seconds / 86400, "DAY", (seconds % 86400) / 3600, "HOUR")
    } else if seconds > 3600 {
        period(seconds / 3600, "HOUR", (seconds % 3600) / 60, "MINUTE")
    } else if seconds > 60 {
        period(seconds / 60, "MINUTE", seconds % 60, "SECOND")
    } else {
        period(seconds, "SECOND", 0, "")
    }
}
