// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Execution-facing types
//!
//! The session does not execute plans; these are the types it exchanges with
//! the caller-supplied runtime, plus the memory accounting for pages the
//! session holds between phases.

pub mod error;
pub mod memory_budget;
pub mod result;
pub mod runner;

pub use error::ExecutionError;
pub use memory_budget::MemoryBudget;
pub use result::{Page, PageReleaseProbe, ProfileRecord, QueryResult};
pub use runner::PhaseRunner;
