// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Pre-analysis: pure extraction of external references from an unresolved
//! plan
//!
//! Runs before any network access. Collects the table references and
//! enrich-policy references the resolution protocol needs, in plan order.

use crate::catalog::resolution::PolicyRef;
use crate::plan::logical::{LogicalNode, LogicalPlan, TableRef};
use std::collections::BTreeSet;

/// Everything the plan references outside itself
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreAnalysis {
    /// Source tables, in discovery order
    pub tables: Vec<TableRef>,
    /// Enrich policies by (name, mode)
    pub policies: BTreeSet<PolicyRef>,
}

/// Extract table and enrich-policy references from an unresolved plan.
/// No I/O; deterministic.
pub fn pre_analyze(plan: &LogicalPlan) -> PreAnalysis {
    let mut analysis = PreAnalysis::default();
    plan.for_each_down(&mut |node| match node {
        LogicalNode::Relation { table } => analysis.tables.push(table.clone()),
        LogicalNode::Enrich { policy, mode, .. } => {
            analysis.policies.insert(PolicyRef::new(policy.clone(), *mode));
        }
        _ => {}
    });
    analysis
}
