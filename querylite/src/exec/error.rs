// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Execution error types

use thiserror::Error;

/// Errors raised while running a physical plan phase
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Phase execution failed: {0}")]
    Phase(String),

    #[error("Memory limit exceeded: requested {requested} bytes, limit {limit} bytes")]
    MemoryLimitExceeded { limit: usize, requested: usize },

    #[error("Execution cancelled")]
    Cancelled,
}
