// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! QueryLite - A lightweight federated query session core
//!
//! QueryLite coordinates the end-to-end compilation and execution of a single
//! query against a federated catalog: it takes an already-parsed, unresolved
//! logical plan, asynchronously resolves the data sources and enrichment
//! policies the plan references (across possibly multiple clusters), computes
//! the minimal set of source fields the query needs, and drives one or more
//! rounds of physical execution, folding intermediate results back into the
//! plan between rounds.
//!
//! # Features
//!
//! - **Async resolution protocol**: enrich policies and source indices are
//!   resolved without blocking, with a single corrective re-resolution when
//!   wildcard expansion reveals new clusters
//! - **Field pruning**: pure static analysis computes the minimal field
//!   request sent to the catalog
//! - **Phased execution**: data-dependent sub-plans run first and their
//!   concrete output is folded back into the main plan before it is finalized
//! - **Resource safety**: result pages held across a fold are released exactly
//!   once, on success, failure, and cancellation alike
//!
//! The parser, analyzer, optimizers, and execution runtime are external
//! collaborators injected behind traits; QueryLite ships the coordination
//! core only.

// Public modules - exposed to external users
pub mod analysis;
pub mod catalog;
pub mod exec;
pub mod plan;
pub mod session;

// Re-export the public API - QuerySession is the main entry point
pub use exec::{ExecutionError, Page, PhaseRunner, ProfileRecord, QueryResult};
pub use session::{FieldNameSet, QueryError, QueryRequest, QuerySession, SessionConfig};

/// QueryLite version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// QueryLite crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
