// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Errors raised by the injected compilation collaborators

use thiserror::Error;

/// Query text could not be parsed. Surfaced verbatim to the caller.
#[derive(Error, Debug)]
#[error("Parse error: {0}")]
pub struct ParseError(pub String);

/// The analyzer could not resolve the plan against the catalog answers
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Unknown column: {0}")]
    UnresolvedReference(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Verification failed: {0}")]
    Verification(String),
}

/// An optimizer or physical mapper failed; treated as unexpected/internal
#[derive(Error, Debug)]
#[error("Optimization error: {0}")]
pub struct OptimizationError(pub String);
