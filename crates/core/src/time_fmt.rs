// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Duration parsing and formatting for cycle times and pipeline timeouts.

use std::time::Duration;

/// Parse a duration given as bare seconds (`5`, `0.5`) or with a unit
/// suffix (`500ms`, `2s`, `1m`, `1h`). Returns `None` for anything else;
/// callers warn and fall back to their default.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(secs) = raw.parse::<f64>() {
        return duration_from_secs(secs);
    }
    for (suffix, scale) in [("ms", 0.001), ("s", 1.0), ("m", 60.0), ("h", 3600.0)] {
        if let Some(number) = raw.strip_suffix(suffix) {
            let number = number.trim();
            if let Ok(value) = number.parse::<f64>() {
                return duration_from_secs(value * scale);
            }
            return None;
        }
    }
    None
}

fn duration_from_secs(secs: f64) -> Option<Duration> {
    if secs.is_finite() && secs >= 0.0 {
        Some(Duration::from_secs_f64(secs))
    } else {
        None
    }
}

/// Compact elapsed-time rendering for logs.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs < 1.0 {
        format!("{}ms", elapsed.as_millis())
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let minutes = (secs / 60.0) as u64;
        let rest = secs - (minutes as f64) * 60.0;
        format!("{}m{:.0}s", minutes, rest)
    }
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
