// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query plan representations
//!
//! - [`expression`]: attributes, expressions, and wildcard name matching
//! - [`logical`]: the immutable logical plan tree with one-way stage flags
//! - [`physical`]: the executable operator tree handed to the phase runner

pub mod expression;
pub mod logical;
pub mod physical;

pub use expression::{Attribute, BinaryOperator, DataType, Expression};
pub use logical::{EnrichMode, LogicalNode, LogicalPlan, PlanStateError, TableRef};
pub use physical::{PhysicalNode, PhysicalPlan};
