// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query session core
//!
//! Everything between a parsed plan and a final result: field pruning, the
//! async resolution protocol, plan finalization, and phased execution.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod field_names;
pub mod finalizer;
mod phased_executor;

pub use crate::catalog::resolver::FieldNameSet;
pub use config::{QueryRequest, SessionConfig};
pub use coordinator::QuerySession;
pub use error::QueryError;
pub use field_names::field_names;
pub use finalizer::finalize_physical_plan;
