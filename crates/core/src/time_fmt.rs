// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Duration parsing and elapsed-time formatting.

use std::time::Duration;

/// Parse a duration string like `"30s"`, `"5m"`, `"1h30m"`, or `"250ms"`.
///
/// A bare number is seconds. Units may be chained (`"1h30m"`); every
/// component must carry a unit except a single trailing bare number.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(format!("invalid number in duration: {}", s));
        }
        let num: u64 =
            rest[..digits_end].parse().map_err(|_| format!("invalid number in duration: {}", s))?;
        rest = &rest[digits_end..];

        let unit_end = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let unit = rest[..unit_end].trim();
        rest = &rest[unit_end..];

        let part = match unit {
            "ms" | "millis" | "millisecond" | "milliseconds" => Duration::from_millis(num),
            "" | "s" | "sec" | "secs" | "second" | "seconds" => Duration::from_secs(num),
            "m" | "min" | "mins" | "minute" | "minutes" => Duration::from_secs(num * 60),
            "h" | "hr" | "hrs" | "hour" | "hours" => Duration::from_secs(num * 3600),
            "d" | "day" | "days" => Duration::from_secs(num * 86400),
            other => return Err(format!("unknown duration suffix: {}", other)),
        };
        if unit.is_empty() && !rest.is_empty() {
            return Err(format!("missing unit in duration: {}", s));
        }
        total += part;
    }

    Ok(total)
}

/// Format an elapsed duration as a compact human string (`"3s"`, `"2m 5s"`, `"1h 4m"`).
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        let (m, s) = (secs / 60, secs % 60);
        if s == 0 {
            format!("{}m", m)
        } else {
            format!("{}m {}s", m, s)
        }
    } else {
        let (h, m) = (secs / 3600, (secs % 3600) / 60);
        if m == 0 {
            format!("{}h", h)
        } else {
            format!("{}h {}m", h, m)
        }
    }
}

/// Format elapsed milliseconds, e.g. a job duration read back from metadata.
pub fn format_elapsed_ms(ms: u64) -> String {
    format_elapsed(Duration::from_millis(ms))
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
