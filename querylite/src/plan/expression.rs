// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Expressions and attributes
//!
//! Attributes identify columns at the various stages of resolution; expressions
//! combine them into projections, filters, and computed fields. Both are
//! immutable values: plan transformations build new expressions rather than
//! mutating existing ones.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Data type carried by a resolved attribute
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum DataType {
    Boolean,
    Integer,
    Long,
    Double,
    Keyword,
    Text,
    Date,
}

impl DataType {
    /// Estimated byte width of a single value of this type, used for
    /// row-size estimation during plan finalization.
    pub fn estimated_byte_size(&self) -> usize {
        match self {
            DataType::Boolean => 1,
            DataType::Integer => 4,
            DataType::Long | DataType::Double | DataType::Date => 8,
            // Variable-width types get a fixed planning estimate
            DataType::Keyword | DataType::Text => 50,
        }
    }
}

/// A column reference at some stage of resolution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Attribute {
    /// Reference by name, not yet resolved against a source mapping
    Unresolved { name: String },
    /// Reference by wildcard pattern, e.g. `host.*` or `*l`
    Pattern { pattern: String },
    /// Resolved reference carrying its data type
    Resolved { name: String, data_type: DataType },
    /// Reference to a source metadata field, e.g. `_index`
    Metadata { name: String },
    /// Reference introduced by an alias definition rather than a source field
    FromAlias { name: String },
}

impl Attribute {
    /// Convenience constructor for an unresolved by-name reference
    pub fn unresolved(name: impl Into<String>) -> Self {
        Attribute::Unresolved { name: name.into() }
    }

    /// Convenience constructor for an unresolved name-pattern reference
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Attribute::Pattern {
            pattern: pattern.into(),
        }
    }

    /// Convenience constructor for a resolved reference
    pub fn resolved(name: impl Into<String>, data_type: DataType) -> Self {
        Attribute::Resolved {
            name: name.into(),
            data_type,
        }
    }

    /// Name (or pattern) this attribute refers to
    pub fn name(&self) -> &str {
        match self {
            Attribute::Unresolved { name } => name,
            Attribute::Pattern { pattern } => pattern,
            Attribute::Resolved { name, .. } => name,
            Attribute::Metadata { name } => name,
            Attribute::FromAlias { name } => name,
        }
    }

    /// Estimated byte width of one value of this attribute
    pub fn estimated_byte_size(&self) -> usize {
        match self {
            Attribute::Resolved { data_type, .. } => data_type.estimated_byte_size(),
            // Unresolved widths are unknown at planning time
            _ => 8,
        }
    }
}

/// Binary operators usable in filter and computed-field expressions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BinaryOperator {
    And,
    Or,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
}

/// Expression tree over attributes and literals
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Expression {
    /// A column reference
    Column(Attribute),
    /// Explicit wildcard-star selection, e.g. `KEEP *`
    Star,
    /// Literal value
    Literal(serde_json::Value),
    /// Named expression; defines `name` as an alias for `child`
    Alias {
        name: String,
        child: Box<Expression>,
    },
    /// Function call, e.g. `COUNT(*)` or `MAX(salary)`
    Function {
        name: String,
        args: Vec<Expression>,
    },
    /// Binary operation
    Binary {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

impl Expression {
    /// Column reference shorthand
    pub fn column(name: impl Into<String>) -> Self {
        Expression::Column(Attribute::unresolved(name))
    }

    /// Alias shorthand
    pub fn alias(name: impl Into<String>, child: Expression) -> Self {
        Expression::Alias {
            name: name.into(),
            child: Box::new(child),
        }
    }

    /// Conjunction of two expressions
    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::Binary {
            op: BinaryOperator::And,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Collect every attribute referenced anywhere in this expression
    pub fn references(&self) -> Vec<Attribute> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references(&self, refs: &mut Vec<Attribute>) {
        match self {
            Expression::Column(attr) => refs.push(attr.clone()),
            Expression::Star | Expression::Literal(_) => {}
            Expression::Alias { child, .. } => child.collect_references(refs),
            Expression::Function { args, .. } => {
                for arg in args {
                    arg.collect_references(refs);
                }
            }
            Expression::Binary { left, right, .. } => {
                left.collect_references(refs);
                right.collect_references(refs);
            }
        }
    }

    /// True if this expression contains a wildcard-star selection
    pub fn contains_star(&self) -> bool {
        match self {
            Expression::Star => true,
            Expression::Column(_) | Expression::Literal(_) => false,
            Expression::Alias { child, .. } => child.contains_star(),
            Expression::Function { args, .. } => args.iter().any(Expression::contains_star),
            Expression::Binary { left, right, .. } => {
                left.contains_star() || right.contains_star()
            }
        }
    }

    /// Visit each alias definition in this expression, outermost first
    pub fn for_each_alias(&self, f: &mut impl FnMut(&str, &Expression)) {
        match self {
            Expression::Alias { name, child } => {
                f(name, child);
                child.for_each_alias(f);
            }
            Expression::Column(_) | Expression::Star | Expression::Literal(_) => {}
            Expression::Function { args, .. } => {
                for arg in args {
                    arg.for_each_alias(f);
                }
            }
            Expression::Binary { left, right, .. } => {
                left.for_each_alias(f);
                right.for_each_alias(f);
            }
        }
    }
}

/// Wildcard character used in simple name patterns
pub const WILDCARD: &str = "*";

/// True if `name` is a simple wildcard pattern rather than a plain name
pub fn is_simple_pattern(name: &str) -> bool {
    name.contains('*')
}

/// Match `value` against a simple `*`-wildcard pattern.
///
/// Patterns are anchored: `ho*` matches `host` but not `remote_host`.
pub fn simple_match(pattern: &str, value: &str) -> bool {
    if !is_simple_pattern(pattern) {
        return pattern == value;
    }
    match compile_simple_pattern(pattern) {
        Some(re) => re.is_match(value),
        None => false,
    }
}

fn compile_simple_pattern(pattern: &str) -> Option<Regex> {
    // Tiny cache for the degenerate match-all pattern, which dominates
    static MATCH_ALL: OnceCell<Regex> = OnceCell::new();
    if pattern == WILDCARD {
        return MATCH_ALL.get_or_try_init(|| Regex::new("^.*$")).ok().cloned();
    }
    let escaped = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{}$", escaped)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_match_exact() {
        assert!(simple_match("host", "host"));
        assert!(!simple_match("host", "hostname"));
    }

    #[test]
    fn test_simple_match_wildcard() {
        assert!(simple_match("ho*", "host"));
        assert!(simple_match("*l", "level"));
        assert!(simple_match("a*c", "abc"));
        assert!(!simple_match("ho*", "remote_host"));
        assert!(simple_match("*", "anything"));
    }

    #[test]
    fn test_simple_match_escapes_regex_metacharacters() {
        assert!(simple_match("host.name", "host.name"));
        assert!(!simple_match("host.name", "hostXname"));
    }

    #[test]
    fn test_expression_references() {
        let expr = Expression::alias(
            "c",
            Expression::Function {
                name: "count".to_string(),
                args: vec![Expression::column("status")],
            },
        );
        let refs = expr.references();
        assert_eq!(refs, vec![Attribute::unresolved("status")]);
    }

    #[test]
    fn test_contains_star() {
        let expr = Expression::Function {
            name: "count".to_string(),
            args: vec![Expression::Star],
        };
        assert!(expr.contains_star());
        assert!(!Expression::column("a").contains_star());
    }

    #[test]
    fn test_for_each_alias() {
        let expr = Expression::alias("x", Expression::column("salary"));
        let mut seen = Vec::new();
        expr.for_each_alias(&mut |name, _| seen.push(name.to_string()));
        assert_eq!(seen, vec!["x"]);
    }

    #[test]
    fn test_attributes_are_ordered() {
        // Resolved attributes carry a data type, so ordered collections of
        // attributes depend on types ordering too
        let set: std::collections::BTreeSet<Attribute> = [
            Attribute::resolved("status", DataType::Integer),
            Attribute::resolved("host", DataType::Keyword),
            Attribute::unresolved("host"),
            Attribute::resolved("host", DataType::Keyword),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 3);
        assert!(DataType::Boolean < DataType::Date);
    }
}
