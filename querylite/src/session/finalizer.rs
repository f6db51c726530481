// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Physical plan finalization
//!
//! The last structural pass before a plan is handed to the runner: pushes the
//! caller-supplied external filter into every source fragment and recomputes
//! row byte-size estimates. Pure and deterministic; runs identically for
//! every phase.

use crate::plan::expression::Expression;
use crate::plan::physical::{PhysicalNode, PhysicalPlan};

/// Fuse `filter` into every fragment and refresh row-size annotations
pub fn finalize_physical_plan(plan: PhysicalPlan, filter: Option<&Expression>) -> PhysicalPlan {
    let plan = match filter {
        Some(external) => plan.transform_up(&mut |node| match node {
            PhysicalNode::Fragment {
                plan,
                filter: embedded,
                output,
                estimated_row_size,
            } => {
                let combined = match embedded {
                    Some(own) => Expression::and(own, external.clone()),
                    None => external.clone(),
                };
                log::debug!("Fold filter {:?} into source fragment", combined);
                PhysicalNode::Fragment {
                    plan,
                    filter: Some(combined),
                    output,
                    estimated_row_size,
                }
            }
            other => other,
        }),
        None => plan,
    };
    plan.estimate_row_size()
}
