// SPDX-License-Identifier: Apache-2.0
//! Shared identifiers and logging setup used by both the coordinator core
//! and the service binary that hosts it.

pub mod ids;
pub mod logging;

pub use ids::*;
