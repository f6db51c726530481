// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Physical query plan representation
//!
//! Physical plans describe the executable operator tree handed to the phase
//! runner. The session core never executes them; it only finalizes them:
//! fusing an external filter into fragment nodes and recomputing row byte-size
//! estimates used downstream for execution memory budgeting.

use crate::plan::expression::{Attribute, Expression};
use crate::plan::logical::LogicalNode;
use serde::{Deserialize, Serialize};

/// Physical plan node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PhysicalNode {
    /// A pushable source-scan sub-plan: wraps the logical fragment shipped to
    /// data nodes, along with an optional pushed-down filter and a row-size
    /// annotation filled in during finalization
    Fragment {
        plan: Box<LogicalNode>,
        filter: Option<Expression>,
        output: Vec<Attribute>,
        estimated_row_size: Option<usize>,
    },

    /// Inline rows already materialized on the coordinating node
    LocalSource {
        schema: Vec<Attribute>,
        rows: Vec<Vec<u8>>,
    },

    /// Boundary between distributed and coordinating execution
    Exchange { input: Box<PhysicalNode> },

    /// Project computed columns
    Project {
        projections: Vec<Expression>,
        input: Box<PhysicalNode>,
    },

    /// Limit number of results
    Limit {
        count: usize,
        input: Box<PhysicalNode>,
    },

    /// Final output operator carrying the result schema
    Output {
        schema: Vec<Attribute>,
        input: Box<PhysicalNode>,
    },
}

impl PhysicalNode {
    /// Post-order (bottom-up) transformation: children are rewritten before
    /// their parent is offered to `f`.
    pub fn transform_up(self, f: &mut impl FnMut(PhysicalNode) -> PhysicalNode) -> PhysicalNode {
        let node = match self {
            leaf @ (PhysicalNode::Fragment { .. } | PhysicalNode::LocalSource { .. }) => leaf,
            PhysicalNode::Exchange { input } => PhysicalNode::Exchange {
                input: Box::new(input.transform_up(f)),
            },
            PhysicalNode::Project { projections, input } => PhysicalNode::Project {
                projections,
                input: Box::new(input.transform_up(f)),
            },
            PhysicalNode::Limit { count, input } => PhysicalNode::Limit {
                count,
                input: Box::new(input.transform_up(f)),
            },
            PhysicalNode::Output { schema, input } => PhysicalNode::Output {
                schema,
                input: Box::new(input.transform_up(f)),
            },
        };
        f(node)
    }

    /// Estimated byte size of one row leaving this node, annotating fragment
    /// nodes along the way
    fn estimate(self) -> (PhysicalNode, usize) {
        match self {
            PhysicalNode::Fragment {
                plan,
                filter,
                output,
                ..
            } => {
                let size = row_width(&output);
                (
                    PhysicalNode::Fragment {
                        plan,
                        filter,
                        output,
                        estimated_row_size: Some(size),
                    },
                    size,
                )
            }
            PhysicalNode::LocalSource { schema, rows } => {
                let size = row_width(&schema);
                (PhysicalNode::LocalSource { schema, rows }, size)
            }
            PhysicalNode::Exchange { input } => {
                let (input, size) = input.estimate();
                (
                    PhysicalNode::Exchange {
                        input: Box::new(input),
                    },
                    size,
                )
            }
            PhysicalNode::Project { projections, input } => {
                let (input, _) = input.estimate();
                // A projection replaces the incoming row shape with its own
                let size = projections
                    .iter()
                    .flat_map(Expression::references)
                    .map(|a| a.estimated_byte_size())
                    .sum();
                (
                    PhysicalNode::Project {
                        projections,
                        input: Box::new(input),
                    },
                    size,
                )
            }
            PhysicalNode::Limit { count, input } => {
                let (input, size) = input.estimate();
                (
                    PhysicalNode::Limit {
                        count,
                        input: Box::new(input),
                    },
                    size,
                )
            }
            PhysicalNode::Output { schema, input } => {
                let (input, _) = input.estimate();
                let size = row_width(&schema);
                (
                    PhysicalNode::Output {
                        schema,
                        input: Box::new(input),
                    },
                    size,
                )
            }
        }
    }
}

fn row_width(attrs: &[Attribute]) -> usize {
    attrs.iter().map(Attribute::estimated_byte_size).sum()
}

/// Physical query plan tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhysicalPlan {
    pub root: PhysicalNode,
    /// Estimated byte size of one result row, filled in by finalization
    pub estimated_row_size: Option<usize>,
}

impl PhysicalPlan {
    pub fn new(root: PhysicalNode) -> Self {
        Self {
            root,
            estimated_row_size: None,
        }
    }

    /// Bottom-up transformation over the operator tree
    pub fn transform_up(self, f: &mut impl FnMut(PhysicalNode) -> PhysicalNode) -> Self {
        Self {
            root: self.root.transform_up(f),
            estimated_row_size: self.estimated_row_size,
        }
    }

    /// Recompute row byte-size estimates bottom-up over the whole tree
    pub fn estimate_row_size(self) -> Self {
        let (root, size) = self.root.estimate();
        Self {
            root,
            estimated_row_size: Some(size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::expression::DataType;
    use crate::plan::logical::TableRef;

    fn fragment(output: Vec<Attribute>) -> PhysicalNode {
        PhysicalNode::Fragment {
            plan: Box::new(LogicalNode::Relation {
                table: TableRef::new("logs"),
            }),
            filter: None,
            output,
            estimated_row_size: None,
        }
    }

    #[test]
    fn test_estimate_row_size_annotates_fragment() {
        let plan = PhysicalPlan::new(PhysicalNode::Exchange {
            input: Box::new(fragment(vec![
                Attribute::resolved("status", DataType::Integer),
                Attribute::resolved("host", DataType::Keyword),
            ])),
        });
        let plan = plan.estimate_row_size();
        assert_eq!(plan.estimated_row_size, Some(54));
        match plan.root {
            PhysicalNode::Exchange { input } => match *input {
                PhysicalNode::Fragment {
                    estimated_row_size, ..
                } => assert_eq!(estimated_row_size, Some(54)),
                other => panic!("unexpected node: {:?}", other),
            },
            other => panic!("unexpected node: {:?}", other),
        }
    }

    #[test]
    fn test_estimate_row_size_projection_replaces_shape() {
        let plan = PhysicalPlan::new(PhysicalNode::Project {
            projections: vec![Expression::Column(Attribute::resolved(
                "status",
                DataType::Integer,
            ))],
            input: Box::new(fragment(vec![
                Attribute::resolved("status", DataType::Integer),
                Attribute::resolved("message", DataType::Text),
            ])),
        });
        let plan = plan.estimate_row_size();
        assert_eq!(plan.estimated_row_size, Some(4));
    }

    #[test]
    fn test_transform_up_visits_bottom_up() {
        let plan = PhysicalPlan::new(PhysicalNode::Limit {
            count: 5,
            input: Box::new(fragment(vec![])),
        });
        let mut seen = Vec::new();
        let _ = plan.transform_up(&mut |node| {
            seen.push(match &node {
                PhysicalNode::Fragment { .. } => "fragment",
                PhysicalNode::Limit { .. } => "limit",
                _ => "other",
            });
            node
        });
        assert_eq!(seen, vec!["fragment", "limit"]);
    }
}
