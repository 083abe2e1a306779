// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for relaying test runner lifecycle events to a remote test reporting
//! service.
//!
//! The runner produces notifications such as "run started", "test case ready", "console output
//! observed" and "run ended". The [`Reporter`](reporter::Reporter) maps each of these onto the
//! remote service's session model (run → suite → test → log/attachment), creating suite
//! hierarchies on demand, buffering console output that arrives before its test is known, and
//! joining outstanding artifact uploads before the run is closed.
//!
//! The remote service is abstracted by the [`ReportClient`](client::ReportClient) trait.

pub mod artifact;
pub mod client;
pub mod config;
pub mod coverage;
pub mod errors;
pub mod events;
mod helpers;
pub mod output;
pub mod reporter;
pub mod time;
