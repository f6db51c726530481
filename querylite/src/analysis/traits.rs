// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Compilation collaborator traits
//!
//! The parser, analyzer, and optimizers are external subsystems injected into
//! the session. All of them are synchronous: they transform plans in memory
//! and never touch the network. Each produces a new plan; stage flags are
//! managed by the session, not by implementations.

use crate::analysis::error::{AnalysisError, OptimizationError, ParseError};
use crate::catalog::resolution::{EnrichResolution, IndexResolution};
use crate::plan::logical::LogicalPlan;
use crate::plan::physical::PhysicalPlan;

/// Query parameters passed alongside the query text
pub type QueryParams = Vec<serde_json::Value>;

/// Parses query text into an unresolved logical plan
pub trait Parser: Send + Sync {
    fn parse(&self, query: &str, params: &QueryParams) -> Result<LogicalPlan, ParseError>;
}

/// Resolves names and types in an unresolved plan using the catalog answers
pub trait Analyzer: Send + Sync {
    fn analyze(
        &self,
        plan: LogicalPlan,
        indices: &IndexResolution,
        policies: &EnrichResolution,
    ) -> Result<LogicalPlan, AnalysisError>;
}

/// Rewrites an analyzed logical plan into a cheaper equivalent
pub trait LogicalOptimizer: Send + Sync {
    fn optimize(&self, plan: LogicalPlan) -> Result<LogicalPlan, OptimizationError>;
}

/// Maps an optimized logical plan to a physical operator tree
pub trait Mapper: Send + Sync {
    fn map(&self, plan: &LogicalPlan) -> Result<PhysicalPlan, OptimizationError>;
}

/// Rewrites a physical plan into a cheaper equivalent
pub trait PhysicalOptimizer: Send + Sync {
    fn optimize(&self, plan: PhysicalPlan) -> Result<PhysicalPlan, OptimizationError>;
}
