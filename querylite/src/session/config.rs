// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Session configuration and the per-query request

use crate::analysis::traits::QueryParams;
use crate::plan::expression::Expression;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Metadata fields recognized by default. These are filtered out of pruned
/// field requests; the resolver supplies them separately.
static DEFAULT_METADATA_FIELDS: Lazy<Vec<String>> = Lazy::new(|| {
    ["_index", "_id", "_version", "_ignored", "_source"]
        .iter()
        .map(|s| s.to_string())
        .collect()
});

/// Session-wide configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Upper bound on bytes of result pages held across folds
    pub memory_limit: usize,
    /// Defensive ceiling on execution rounds per query. Each fold is expected
    /// to strictly reduce the number of data-dependent placeholders, but that
    /// property is established by the external optimizer, not verified here.
    pub max_phases: usize,
    /// Field names treated as source metadata during field pruning
    pub metadata_fields: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            memory_limit: 1024 * 1024 * 1024,
            max_phases: 16,
            metadata_fields: DEFAULT_METADATA_FIELDS.clone(),
        }
    }
}

/// A single query as submitted by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Query text, handed to the injected parser
    pub query: String,
    /// Positional parameters for the parser
    pub params: QueryParams,
    /// External filter to push into every source fragment
    pub filter: Option<Expression>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            params: QueryParams::default(),
            filter: None,
        }
    }

    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_filter(mut self, filter: Expression) -> Self {
        self.filter = Some(filter);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.max_phases, 16);
        assert!(config.metadata_fields.contains(&"_index".to_string()));
    }
}
