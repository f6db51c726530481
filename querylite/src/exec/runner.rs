// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Phase runner trait
//!
//! The execution runtime is caller-supplied. The session hands it one
//! finalized physical plan at a time and awaits the result; it never has more
//! than one phase in flight per request.

use crate::exec::error::ExecutionError;
use crate::exec::result::QueryResult;
use crate::plan::physical::PhysicalPlan;
use async_trait::async_trait;

/// Executes one finalized physical plan and materializes its result
///
/// Implementations own any pages they produce until the returned result is
/// handed back; if the returned future is dropped (request cancellation),
/// the implementation must release whatever it already materialized.
#[async_trait]
pub trait PhaseRunner: Send + Sync {
    async fn run(&self, plan: PhysicalPlan) -> Result<QueryResult, ExecutionError>;
}
