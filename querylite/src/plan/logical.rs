// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Logical query plan representation
//!
//! Logical plans represent the structure of a query without considering
//! physical execution details. Nodes are immutable: every pipeline stage
//! builds a new tree, and the `analyzed`/`optimized` stage flags on the plan
//! wrapper are each settable at most once. Passing a plan to a stage it has
//! not been prepared for is a programming error and fails fast.

use crate::plan::expression::{Attribute, Expression};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a plan is handed to a pipeline stage out of order, e.g.
/// optimizing a plan that was never analyzed or re-optimizing an already
/// optimized plan.
#[derive(Error, Debug)]
#[error("Invalid plan state: {0}")]
pub struct PlanStateError(pub String);

/// A cluster-qualified source identifier extracted from the plan before any
/// network access. The raw pattern may be comma-delimited and each entry may
/// carry a `cluster:` prefix, e.g. `remote1:logs-*,logs-*`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct TableRef {
    index: String,
}

impl TableRef {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
        }
    }

    /// The raw index pattern, including any cluster qualifiers
    pub fn index(&self) -> &str {
        &self.index
    }
}

/// Where an enrich lookup executes relative to the data
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnrichMode {
    /// Let the planner decide
    Any,
    /// Perform the lookup on the coordinating node
    Coordinator,
    /// Perform the lookup on the remote cluster holding the data
    Remote,
}

/// Logical plan node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum LogicalNode {
    /// Scan a source table
    Relation { table: TableRef },

    /// Inline rows, either literal (`ROW a = 1`) or produced by folding a
    /// completed phase back into the plan
    LocalRelation {
        schema: Vec<Attribute>,
        rows: Vec<Vec<u8>>,
    },

    /// Filter rows based on a condition
    Filter {
        condition: Expression,
        input: Box<LogicalNode>,
    },

    /// Project computed columns
    Project {
        projections: Vec<Expression>,
        input: Box<LogicalNode>,
    },

    /// Field selection by name or pattern (`KEEP host, c`). Distinct from
    /// `Project` because wildcard selections here participate in precise
    /// pattern matching during field pruning.
    Keep {
        projections: Vec<Expression>,
        input: Box<LogicalNode>,
    },

    /// Define computed fields as aliases (`EVAL x = salary + 1`)
    Eval {
        fields: Vec<Expression>,
        input: Box<LogicalNode>,
    },

    /// Grouped aggregation
    Aggregate {
        group_by: Vec<Expression>,
        aggregates: Vec<Expression>,
        input: Box<LogicalNode>,
    },

    /// Structured-text field extraction (grok/dissect style): reads
    /// `input_field` and introduces `extracted` as new columns
    RegexExtract {
        input_field: Expression,
        extracted: Vec<Attribute>,
        input: Box<LogicalNode>,
    },

    /// Join an external lookup table by a match field. An empty column name
    /// in `match_field` is a placeholder; the true match field comes from
    /// policy resolution.
    Enrich {
        policy: String,
        mode: EnrichMode,
        match_field: Expression,
        with_fields: Vec<Expression>,
        input: Box<LogicalNode>,
    },

    /// A data-dependent placeholder: `first_phase` must be executed to
    /// completion and its concrete output folded in before the enclosing
    /// plan can be finalized
    Phased { first_phase: Box<LogicalNode> },

    /// Limit number of results
    Limit {
        count: usize,
        input: Box<LogicalNode>,
    },
}

impl LogicalNode {
    /// Immediate children of this node
    pub fn children(&self) -> Vec<&LogicalNode> {
        match self {
            LogicalNode::Relation { .. } | LogicalNode::LocalRelation { .. } => vec![],
            LogicalNode::Filter { input, .. }
            | LogicalNode::Project { input, .. }
            | LogicalNode::Keep { input, .. }
            | LogicalNode::Eval { input, .. }
            | LogicalNode::Aggregate { input, .. }
            | LogicalNode::RegexExtract { input, .. }
            | LogicalNode::Enrich { input, .. }
            | LogicalNode::Limit { input, .. } => vec![input],
            LogicalNode::Phased { first_phase } => vec![first_phase],
        }
    }

    /// Expressions held directly by this node (not its children)
    pub fn expressions(&self) -> Vec<&Expression> {
        match self {
            LogicalNode::Relation { .. }
            | LogicalNode::LocalRelation { .. }
            | LogicalNode::Phased { .. }
            | LogicalNode::Limit { .. } => vec![],
            LogicalNode::Filter { condition, .. } => vec![condition],
            LogicalNode::Project { projections, .. } | LogicalNode::Keep { projections, .. } => {
                projections.iter().collect()
            }
            LogicalNode::Eval { fields, .. } => fields.iter().collect(),
            LogicalNode::Aggregate {
                group_by,
                aggregates,
                ..
            } => group_by.iter().chain(aggregates.iter()).collect(),
            LogicalNode::RegexExtract { input_field, .. } => vec![input_field],
            LogicalNode::Enrich {
                match_field,
                with_fields,
                ..
            } => std::iter::once(match_field).chain(with_fields.iter()).collect(),
        }
    }

    /// Attributes referenced directly by this node's own expressions
    pub fn references(&self) -> Vec<Attribute> {
        self.expressions()
            .into_iter()
            .flat_map(Expression::references)
            .collect()
    }

    /// Names of this node's direct references
    pub fn reference_names(&self) -> Vec<String> {
        self.references()
            .into_iter()
            .map(|a| a.name().to_string())
            .collect()
    }

    /// Pre-order (top-down) traversal
    pub fn for_each_down(&self, f: &mut impl FnMut(&LogicalNode)) {
        f(self);
        for child in self.children() {
            child.for_each_down(f);
        }
    }

    /// True if any node in the tree satisfies the predicate
    pub fn any_match(&self, pred: &impl Fn(&LogicalNode) -> bool) -> bool {
        if pred(self) {
            return true;
        }
        self.children().iter().any(|c| c.any_match(pred))
    }

    /// True if any expression anywhere in the tree contains a wildcard-star
    /// selection
    pub fn any_star(&self) -> bool {
        self.any_match(&|n| n.expressions().iter().any(|e| e.contains_star()))
    }

    fn count_phased(&self) -> usize {
        let own = usize::from(matches!(self, LogicalNode::Phased { .. }));
        own + self.children().iter().map(|c| c.count_phased()).sum::<usize>()
    }

    /// Find the first phased placeholder in post-order (innermost first) and
    /// return its sub-plan
    fn find_first_phase(&self) -> Option<&LogicalNode> {
        for child in self.children() {
            if let Some(found) = child.find_first_phase() {
                return Some(found);
            }
        }
        match self {
            LogicalNode::Phased { first_phase } => Some(first_phase),
            _ => None,
        }
    }

    /// Replace the first phased placeholder (same post-order as
    /// `find_first_phase`) with inline rows. Returns the new node and whether
    /// a replacement happened beneath it.
    fn replace_first_phase(
        self,
        schema: &[Attribute],
        rows: &[Vec<u8>],
        replaced: &mut bool,
    ) -> LogicalNode {
        if *replaced {
            return self;
        }
        match self {
            LogicalNode::Phased { first_phase } => {
                // Recurse first: an inner placeholder folds before its parent
                let inner = first_phase.replace_first_phase(schema, rows, replaced);
                if *replaced {
                    LogicalNode::Phased {
                        first_phase: Box::new(inner),
                    }
                } else {
                    *replaced = true;
                    LogicalNode::LocalRelation {
                        schema: schema.to_vec(),
                        rows: rows.to_vec(),
                    }
                }
            }
            LogicalNode::Filter { condition, input } => LogicalNode::Filter {
                condition,
                input: Box::new(input.replace_first_phase(schema, rows, replaced)),
            },
            LogicalNode::Project { projections, input } => LogicalNode::Project {
                projections,
                input: Box::new(input.replace_first_phase(schema, rows, replaced)),
            },
            LogicalNode::Keep { projections, input } => LogicalNode::Keep {
                projections,
                input: Box::new(input.replace_first_phase(schema, rows, replaced)),
            },
            LogicalNode::Eval { fields, input } => LogicalNode::Eval {
                fields,
                input: Box::new(input.replace_first_phase(schema, rows, replaced)),
            },
            LogicalNode::Aggregate {
                group_by,
                aggregates,
                input,
            } => LogicalNode::Aggregate {
                group_by,
                aggregates,
                input: Box::new(input.replace_first_phase(schema, rows, replaced)),
            },
            LogicalNode::RegexExtract {
                input_field,
                extracted,
                input,
            } => LogicalNode::RegexExtract {
                input_field,
                extracted,
                input: Box::new(input.replace_first_phase(schema, rows, replaced)),
            },
            LogicalNode::Enrich {
                policy,
                mode,
                match_field,
                with_fields,
                input,
            } => LogicalNode::Enrich {
                policy,
                mode,
                match_field,
                with_fields,
                input: Box::new(input.replace_first_phase(schema, rows, replaced)),
            },
            LogicalNode::Limit { count, input } => LogicalNode::Limit {
                count,
                input: Box::new(input.replace_first_phase(schema, rows, replaced)),
            },
            leaf @ (LogicalNode::Relation { .. } | LogicalNode::LocalRelation { .. }) => leaf,
        }
    }
}

/// Logical query plan tree with one-way stage flags
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogicalPlan {
    root: LogicalNode,
    analyzed: bool,
    optimized: bool,
}

impl LogicalPlan {
    /// Wrap a freshly built (unresolved) plan tree
    pub fn new(root: LogicalNode) -> Self {
        Self {
            root,
            analyzed: false,
            optimized: false,
        }
    }

    pub fn root(&self) -> &LogicalNode {
        &self.root
    }

    pub fn into_root(self) -> LogicalNode {
        self.root
    }

    /// Build a new plan with a transformed root, preserving stage flags.
    /// Used by optimizer implementations, which rewrite the tree without
    /// changing what stage it is at.
    pub fn with_root(&self, root: LogicalNode) -> Self {
        Self {
            root,
            analyzed: self.analyzed,
            optimized: self.optimized,
        }
    }

    pub fn analyzed(&self) -> bool {
        self.analyzed
    }

    pub fn optimized(&self) -> bool {
        self.optimized
    }

    /// Set the one-way `analyzed` flag. Setting it twice is a programming
    /// error.
    pub fn mark_analyzed(mut self) -> Result<Self, PlanStateError> {
        if self.analyzed {
            return Err(PlanStateError("Plan already analyzed".to_string()));
        }
        self.analyzed = true;
        Ok(self)
    }

    /// Set the one-way `optimized` flag. The plan must be analyzed first,
    /// and setting the flag twice is a programming error.
    pub fn mark_optimized(mut self) -> Result<Self, PlanStateError> {
        if !self.analyzed {
            return Err(PlanStateError("Expected analyzed plan".to_string()));
        }
        if self.optimized {
            return Err(PlanStateError("Plan already optimized".to_string()));
        }
        self.optimized = true;
        Ok(self)
    }

    /// Pre-order traversal over the whole tree
    pub fn for_each_down(&self, f: &mut impl FnMut(&LogicalNode)) {
        self.root.for_each_down(f);
    }

    /// True if any node satisfies the predicate
    pub fn any_match(&self, pred: &impl Fn(&LogicalNode) -> bool) -> bool {
        self.root.any_match(pred)
    }

    /// Number of unresolved data-dependent placeholders remaining
    pub fn phased_count(&self) -> usize {
        self.root.count_phased()
    }

    /// Extract the sub-plan that must run before the rest of this plan can
    /// be finalized, or `None` if the plan is single-phase. The extracted
    /// plan inherits the `analyzed` flag but is not yet optimized.
    pub fn extract_first_phase(&self) -> Option<LogicalPlan> {
        self.root.find_first_phase().map(|sub| LogicalPlan {
            root: sub.clone(),
            analyzed: self.analyzed,
            optimized: false,
        })
    }

    /// Fold a completed phase's concrete output back into this plan,
    /// replacing the placeholder the phase was extracted from. The folded
    /// plan keeps the `analyzed` flag but must be re-optimized.
    pub fn apply_first_phase_result(
        self,
        schema: &[Attribute],
        rows: &[Vec<u8>],
    ) -> Result<LogicalPlan, PlanStateError> {
        let mut replaced = false;
        let root = self.root.replace_first_phase(schema, rows, &mut replaced);
        if !replaced {
            return Err(PlanStateError(
                "No phase placeholder to fold results into".to_string(),
            ));
        }
        Ok(LogicalPlan {
            root,
            analyzed: self.analyzed,
            optimized: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::expression::DataType;

    fn relation(index: &str) -> LogicalNode {
        LogicalNode::Relation {
            table: TableRef::new(index),
        }
    }

    #[test]
    fn test_mark_analyzed_once() {
        let plan = LogicalPlan::new(relation("logs"));
        let plan = plan.mark_analyzed().unwrap();
        assert!(plan.analyzed());
        assert!(plan.mark_analyzed().is_err());
    }

    #[test]
    fn test_optimize_requires_analyzed() {
        let plan = LogicalPlan::new(relation("logs"));
        let err = plan.mark_optimized().unwrap_err();
        assert!(err.to_string().contains("Expected analyzed plan"));
    }

    #[test]
    fn test_reoptimize_fails_fast() {
        let plan = LogicalPlan::new(relation("logs"))
            .mark_analyzed()
            .unwrap()
            .mark_optimized()
            .unwrap();
        assert!(plan.optimized());
        let err = plan.mark_optimized().unwrap_err();
        assert!(err.to_string().contains("already optimized"));
    }

    #[test]
    fn test_extract_first_phase_none_for_single_phase() {
        let plan = LogicalPlan::new(LogicalNode::Limit {
            count: 10,
            input: Box::new(relation("logs")),
        });
        assert!(plan.extract_first_phase().is_none());
        assert_eq!(plan.phased_count(), 0);
    }

    #[test]
    fn test_extract_and_fold_phase() {
        let sub = LogicalNode::Aggregate {
            group_by: vec![Expression::column("host")],
            aggregates: vec![Expression::alias(
                "c",
                Expression::Function {
                    name: "count".to_string(),
                    args: vec![],
                },
            )],
            input: Box::new(relation("logs")),
        };
        let plan = LogicalPlan::new(LogicalNode::Limit {
            count: 10,
            input: Box::new(LogicalNode::Phased {
                first_phase: Box::new(sub.clone()),
            }),
        })
        .mark_analyzed()
        .unwrap();

        let first = plan.extract_first_phase().expect("has a first phase");
        assert!(first.analyzed());
        assert!(!first.optimized());
        assert_eq!(first.root(), &sub);

        let schema = vec![Attribute::resolved("host", DataType::Keyword)];
        let rows = vec![vec![1u8, 2, 3]];
        let folded = plan.apply_first_phase_result(&schema, &rows).unwrap();
        assert_eq!(folded.phased_count(), 0);
        assert!(folded.analyzed());
        assert!(!folded.optimized());
        assert!(folded.any_match(&|n| matches!(n, LogicalNode::LocalRelation { .. })));
    }

    #[test]
    fn test_fold_innermost_phase_first() {
        let inner = LogicalNode::Phased {
            first_phase: Box::new(relation("inner")),
        };
        let outer = LogicalNode::Phased {
            first_phase: Box::new(LogicalNode::Limit {
                count: 1,
                input: Box::new(inner),
            }),
        };
        let plan = LogicalPlan::new(outer).mark_analyzed().unwrap();
        assert_eq!(plan.phased_count(), 2);

        // The extracted phase is the innermost placeholder's sub-plan
        let first = plan.extract_first_phase().unwrap();
        assert_eq!(first.root(), &relation("inner"));

        let folded = plan.apply_first_phase_result(&[], &[]).unwrap();
        assert_eq!(folded.phased_count(), 1);
    }

    #[test]
    fn test_fold_without_placeholder_is_error() {
        let plan = LogicalPlan::new(relation("logs"));
        assert!(plan.apply_first_phase_result(&[], &[]).is_err());
    }
}
