// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time sources and timestamp formatting.

mod clock;
mod format;

pub use clock::*;
pub use format::*;
