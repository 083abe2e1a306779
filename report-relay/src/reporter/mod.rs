// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relay test runner events to a remote reporting service.
//!
//! The main type here is [`Reporter`], which is constructed via a [`ReporterBuilder`]. The
//! submodules hold the pieces it is built from: suite hierarchy resolution, console log
//! buffering, pending upload tracking, status mapping and test-type classification.

mod classify;
mod helpers;
mod hierarchy;
mod imp;
mod log_buffer;
mod snippet;
mod status;
mod uploads;

pub use classify::*;
pub use helpers::{ansi_to_markdown, strip_ansi};
pub use imp::*;
pub use status::*;
