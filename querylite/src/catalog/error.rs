// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog resolver error types

use thiserror::Error;

/// Errors raised by catalog and enrich resolvers
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("Mapping error: {0}")]
    Mapping(String),

    #[error("Unknown cluster: {0}")]
    UnknownCluster(String),

    #[error("Unknown enrich policy: {0}")]
    UnknownPolicy(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, ResolverError>;
