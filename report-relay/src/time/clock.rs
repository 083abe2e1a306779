// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{DateTime, Utc};
use std::fmt;

/// A source of wall-clock time for start and end timestamps.
///
/// The reporter reads the clock whenever it opens or closes a remote entity. Tests substitute a
/// fixed or stepping clock to get deterministic timestamps.
pub trait Clock: fmt::Debug + Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// A [`Clock`] backed by the system's realtime clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
