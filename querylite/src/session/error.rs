// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Session error taxonomy
//!
//! Every failure is fatal and propagated verbatim; the session retries
//! nothing. Failures use the same channel as success and preserve ordering:
//! a phase-N failure is reported before any phase-N+1 work starts.

use crate::analysis::error::{AnalysisError, OptimizationError, ParseError};
use crate::catalog::error::ResolverError;
use crate::exec::error::ExecutionError;
use crate::plan::logical::PlanStateError;
use thiserror::Error;

/// Errors surfaced by query compilation and execution
#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The query shape is recognized but not supported, e.g. multiple source
    /// tables. Raised before index resolution is attempted.
    #[error("Unsupported query: {0}")]
    UnsupportedQuery(String),

    #[error("Catalog resolution failed: {0}")]
    CatalogResolution(#[source] ResolverError),

    #[error("Enrich resolution failed: {0}")]
    EnrichResolution(#[source] ResolverError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Optimization(#[from] OptimizationError),

    /// A plan was handed to a pipeline stage out of order; a programming
    /// error, not a recoverable runtime condition
    #[error(transparent)]
    PlanState(#[from] PlanStateError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// The phase loop did not converge within the configured ceiling
    #[error("Phased execution did not converge after {limit} phases")]
    PhaseLimitExceeded { limit: usize },
}
