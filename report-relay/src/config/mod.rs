// Copyright (c) The report-relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration support for report-relay.
//!
//! Configuration is read once, when a [`Reporter`](crate::reporter::Reporter) is constructed. It
//! is layered: the embedded default config is applied first, then the user's config file (if
//! any) on top of it.

mod imp;

pub use imp::*;
