// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

/// Formats a timestamp as RFC 3339 in UTC with millisecond precision, e.g.
/// `2024-03-01T12:00:00.250Z`.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Converts a timestamp expressed as milliseconds since the Unix epoch.
///
/// Runners commonly report times this way. Returns `None` if the value is out of range.
pub fn timestamp_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}
