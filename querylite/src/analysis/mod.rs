// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Plan compilation collaborators
//!
//! Pre-analysis runs locally; parsing, analysis, and optimization are
//! injected behind traits and specified only by their signatures here.

pub mod error;
pub mod pre_analyzer;
pub mod traits;

pub use error::{AnalysisError, OptimizationError, ParseError};
pub use pre_analyzer::{pre_analyze, PreAnalysis};
pub use traits::{Analyzer, LogicalOptimizer, Mapper, Parser, PhysicalOptimizer, QueryParams};
