// SPDX-License-Identifier: Apache-2.0
//! Request-serving loop for the coordinator process: reads boundary
//! `GetDiagnostics` requests as newline-delimited JSON and writes back
//! newline-delimited JSON results.
//!
//! This is a minimal stand-in transport, not the RPC/LSP surface a real
//! deployment would front the coordinator with (out of scope here — see
//! `SPEC_FULL.md` §6) but enough to drive [`rdc_core::Coordinator`] end to
//! end from a process boundary.

pub mod serve;

pub use serve::{serve_stdio, ServeError};
