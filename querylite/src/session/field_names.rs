// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Field pruning
//!
//! Computes the minimal set of source field names a query needs, so index
//! resolution only fetches mappings the plan will actually touch. Pure and
//! deterministic: no I/O, input is the unresolved plan plus the match fields
//! of already-resolved enrich policies.

use crate::catalog::resolver::FieldNameSet;
use crate::plan::expression::{is_simple_pattern, simple_match, Attribute, WILDCARD};
use crate::plan::logical::{LogicalNode, LogicalPlan};
use std::collections::BTreeSet;

/// Compute the field-name request for `plan`.
///
/// `enrich_match_fields` seeds the request with the join fields of resolved
/// enrich policies; `metadata_fields` are recognized source-metadata names
/// that the resolver supplies separately and must not be requested.
pub fn field_names(
    plan: &LogicalPlan,
    enrich_match_fields: &BTreeSet<String>,
    metadata_fields: &[String],
) -> FieldNameSet {
    // No explicit column selection anywhere, e.g. a bare `FROM logs`
    if !plan.any_match(&|node| {
        matches!(
            node,
            LogicalNode::Project { .. } | LogicalNode::Keep { .. } | LogicalNode::Aggregate { .. }
        )
    }) {
        return FieldNameSet::AllFields;
    }

    // An explicit `*` selection asks for everything regardless of the rest
    if plan.root().any_star() {
        return FieldNameSet::AllFields;
    }

    let mut references: BTreeSet<String> = BTreeSet::new();
    // Field-selection references are special whenever a wildcard is used in
    // their name: `... | eval lang = languages + 1 | keep *l` must request
    // both "languages" and "*l"
    let mut keep_refs: BTreeSet<String> = BTreeSet::new();
    let mut metadata_seen: BTreeSet<String> = BTreeSet::new();

    plan.for_each_down(&mut |node| {
        match node {
            LogicalNode::RegexExtract {
                input_field,
                extracted,
                ..
            } => {
                // Drop references to fields the extraction itself produces,
                // but keep the inputs it reads
                for attr in extracted {
                    let name = attr.name();
                    references.retain(|entry| !match_by_name(entry, name, false));
                }
                for attr in input_field.references() {
                    references.insert(attr.name().to_string());
                }
            }
            LogicalNode::Enrich { .. } => {
                // An empty column name is a placeholder; the real match field
                // arrives through policy resolution
                for attr in node.references() {
                    if !attr.name().is_empty() {
                        references.insert(attr.name().to_string());
                    }
                }
            }
            _ => {
                let is_keep = matches!(node, LogicalNode::Keep { .. });
                for attr in node.references() {
                    if let Attribute::Metadata { name } = &attr {
                        metadata_seen.insert(name.clone());
                    }
                    // Name patterns expand into explicit references
                    references.insert(attr.name().to_string());
                    if is_keep {
                        keep_refs.insert(attr.name().to_string());
                    }
                }
            }
        }

        // References that turn out to be aliases defined at this node are not
        // source fields, e.g. `eval x = salary | stats max = max(x)` must not
        // request "x". Exceptions: the node also references the same name
        // (`rename id = id`, `stats id = max(id)`), and recorded
        // field-selection patterns, which win over alias shadowing.
        let own_names: BTreeSet<String> =
            node.reference_names().into_iter().collect();
        for expr in node.expressions() {
            expr.for_each_alias(&mut |alias_name, _child| {
                if own_names.contains(alias_name) {
                    return;
                }
                references
                    .retain(|entry| !match_by_name(entry, alias_name, keep_refs.contains(entry)));
            });
        }
    });

    // Metadata fields are supplied to resolution separately; leaving them in
    // could turn an otherwise-empty request into an all-fields request
    references.retain(|entry| {
        !metadata_seen.contains(entry)
            && !metadata_fields
                .iter()
                .any(|meta| match_by_name(entry, meta, false))
    });

    if references.is_empty() && enrich_match_fields.is_empty() {
        // An empty request is not allowed; ask for the lightest field instead
        return FieldNameSet::IndexMetadataOnly;
    }

    let mut result = references.clone();
    result.extend(subfields(&references));
    result.extend(enrich_match_fields.iter().cloned());
    result.extend(subfields(enrich_match_fields));
    FieldNameSet::Names(result)
}

/// Match a working-set entry against a name: exact for plain entries,
/// wildcard for pattern entries. `skip_if_pattern` exempts pattern entries
/// from matching at all (field-selection patterns win over alias shadowing).
fn match_by_name(entry: &str, other: &str, skip_if_pattern: bool) -> bool {
    let is_pattern = is_simple_pattern(entry);
    if skip_if_pattern && is_pattern {
        return false;
    }
    if is_pattern {
        simple_match(entry, other)
    } else {
        entry == other
    }
}

/// Companion `name.*` entries for every plain name, so sub-fields arrive with
/// their parent
fn subfields(names: &BTreeSet<String>) -> BTreeSet<String> {
    names
        .iter()
        .filter(|name| !name.ends_with(WILDCARD))
        .map(|name| format!("{}.*", name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::expression::{BinaryOperator, Expression};
    use crate::plan::logical::{EnrichMode, TableRef};

    fn relation(index: &str) -> LogicalNode {
        LogicalNode::Relation {
            table: TableRef::new(index),
        }
    }

    fn keep(columns: &[&str], input: LogicalNode) -> LogicalNode {
        LogicalNode::Keep {
            projections: columns.iter().map(|c| Expression::column(*c)).collect(),
            input: Box::new(input),
        }
    }

    fn names(set: &[&str]) -> FieldNameSet {
        FieldNameSet::names(set.iter().copied())
    }

    fn prune(plan: LogicalNode) -> FieldNameSet {
        field_names(
            &LogicalPlan::new(plan),
            &BTreeSet::new(),
            &["_index".to_string(), "_id".to_string()],
        )
    }

    #[test]
    fn test_no_projection_requests_all_fields() {
        // FROM logs | WHERE status == 500
        let plan = LogicalNode::Filter {
            condition: Expression::Binary {
                op: BinaryOperator::Eq,
                left: Box::new(Expression::column("status")),
                right: Box::new(Expression::Literal(serde_json::json!(500))),
            },
            input: Box::new(relation("logs")),
        };
        assert_eq!(prune(plan), FieldNameSet::AllFields);
    }

    #[test]
    fn test_star_selection_requests_all_fields() {
        let plan = LogicalNode::Keep {
            projections: vec![Expression::Star],
            input: Box::new(relation("logs")),
        };
        assert_eq!(prune(plan), FieldNameSet::AllFields);
    }

    #[test]
    fn test_explicit_selection_requests_fields_and_subfields() {
        let plan = keep(&["a", "b"], relation("logs"));
        assert_eq!(prune(plan), names(&["a", "a.*", "b", "b.*"]));
    }

    #[test]
    fn test_extracted_field_not_requested_but_inputs_are() {
        // FROM logs | DISSECT message ... -> x | KEEP x
        let plan = keep(
            &["x"],
            LogicalNode::RegexExtract {
                input_field: Expression::column("message"),
                extracted: vec![Attribute::unresolved("x")],
                input: Box::new(relation("logs")),
            },
        );
        assert_eq!(prune(plan), names(&["message", "message.*"]));
    }

    #[test]
    fn test_computed_alias_not_requested() {
        // FROM logs | STATS c = COUNT(*) BY host | KEEP host, c
        let plan = keep(
            &["host", "c"],
            LogicalNode::Aggregate {
                group_by: vec![Expression::column("host")],
                aggregates: vec![Expression::alias(
                    "c",
                    Expression::Function {
                        name: "count".to_string(),
                        args: vec![],
                    },
                )],
                input: Box::new(relation("logs")),
            },
        );
        assert_eq!(prune(plan), names(&["host", "host.*"]));
    }

    #[test]
    fn test_alias_shadowing_spares_same_name_reference() {
        // FROM logs | EVAL id = id | KEEP id: "id" stays a source field
        let plan = keep(
            &["id"],
            LogicalNode::Eval {
                fields: vec![Expression::alias("id", Expression::column("id"))],
                input: Box::new(relation("logs")),
            },
        );
        assert_eq!(prune(plan), names(&["id", "id.*"]));
    }

    #[test]
    fn test_keep_pattern_survives_alias_shadowing() {
        // FROM logs | EVAL level = languages + 1 | KEEP *l: both "languages"
        // and "*l" are valid fields to request
        let plan = LogicalNode::Keep {
            projections: vec![Expression::Column(Attribute::pattern("*l"))],
            input: Box::new(LogicalNode::Eval {
                fields: vec![Expression::alias(
                    "level",
                    Expression::Binary {
                        op: BinaryOperator::Add,
                        left: Box::new(Expression::column("languages")),
                        right: Box::new(Expression::Literal(serde_json::json!(1))),
                    },
                )],
                input: Box::new(relation("logs")),
            }),
        };
        assert_eq!(prune(plan), names(&["*l", "*l.*", "languages", "languages.*"]));
    }

    #[test]
    fn test_alias_removes_pattern_not_in_keep_set() {
        // A pattern reference outside KEEP does not survive alias shadowing
        let plan = LogicalNode::Project {
            projections: vec![Expression::Column(Attribute::pattern("*l"))],
            input: Box::new(LogicalNode::Eval {
                fields: vec![Expression::alias("level", Expression::column("languages"))],
                input: Box::new(relation("logs")),
            }),
        };
        // "*l" matches the alias "level" and is removed; "languages" stays
        assert_eq!(prune(plan), names(&["languages", "languages.*"]));
    }

    #[test]
    fn test_metadata_fields_removed() {
        let plan = keep(&["_index", "host"], relation("logs"));
        assert_eq!(prune(plan), names(&["host", "host.*"]));
    }

    #[test]
    fn test_metadata_only_selection_uses_sentinel() {
        let plan = keep(&["_index"], relation("logs"));
        assert_eq!(prune(plan), FieldNameSet::IndexMetadataOnly);
    }

    #[test]
    fn test_enrich_match_fields_seed_the_request() {
        let plan = keep(&["host"], relation("logs"));
        let result = field_names(
            &LogicalPlan::new(plan),
            &BTreeSet::from(["ip".to_string()]),
            &[],
        );
        assert_eq!(result, names(&["host", "host.*", "ip", "ip.*"]));
    }

    #[test]
    fn test_enrich_placeholder_match_field_excluded() {
        // ENRICH with no explicit match field carries an empty placeholder
        let plan = keep(
            &["city"],
            LogicalNode::Enrich {
                policy: "geo".to_string(),
                mode: EnrichMode::Any,
                match_field: Expression::Column(Attribute::unresolved("")),
                with_fields: vec![Expression::column("city")],
                input: Box::new(relation("logs")),
            },
        );
        assert_eq!(prune(plan), names(&["city", "city.*"]));
    }

    #[test]
    fn test_no_subfield_companion_for_wildcards() {
        let plan = LogicalNode::Keep {
            projections: vec![
                Expression::Column(Attribute::pattern("host.*")),
                Expression::column("status"),
            ],
            input: Box::new(relation("logs")),
        };
        assert_eq!(prune(plan), names(&["host.*", "status", "status.*"]));
    }
}
