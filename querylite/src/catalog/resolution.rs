// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Resolution results delivered by the catalog and enrich resolvers

use crate::plan::expression::DataType;
use crate::plan::logical::EnrichMode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Merged field mapping across every concrete index a pattern expanded to
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldMapping {
    fields: BTreeMap<String, DataType>,
}

impl FieldMapping {
    pub fn new(fields: BTreeMap<String, DataType>) -> Self {
        Self { fields }
    }

    pub fn field_type(&self, name: &str) -> Option<DataType> {
        self.fields.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Outcome of resolving a single table reference against the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum IndexResolution {
    /// The reference could not be resolved; the reason is surfaced to the
    /// analyzer, which decides whether the plan can proceed without a source
    Invalid { reason: String },
    /// The reference expanded to a concrete set of indices with a merged
    /// field mapping
    Valid {
        concrete_indices: BTreeSet<String>,
        mapping: FieldMapping,
    },
}

impl IndexResolution {
    pub fn invalid(reason: impl Into<String>) -> Self {
        IndexResolution::Invalid {
            reason: reason.into(),
        }
    }

    pub fn valid(concrete_indices: BTreeSet<String>, mapping: FieldMapping) -> Self {
        IndexResolution::Valid {
            concrete_indices,
            mapping,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, IndexResolution::Valid { .. })
    }

    /// Concrete index names, empty for an invalid resolution
    pub fn concrete_indices(&self) -> Vec<String> {
        match self {
            IndexResolution::Invalid { .. } => Vec::new(),
            IndexResolution::Valid {
                concrete_indices, ..
            } => concrete_indices.iter().cloned().collect(),
        }
    }
}

/// Reference to an enrich policy extracted from the plan before resolution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PolicyRef {
    pub name: String,
    pub mode: EnrichMode,
}

impl PolicyRef {
    pub fn new(name: impl Into<String>, mode: EnrichMode) -> Self {
        Self {
            name: name.into(),
            mode,
        }
    }
}

/// A fully resolved enrich policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedPolicy {
    /// Field the lookup joins on
    pub match_field: String,
    /// Index backing the lookup table
    pub target_index: String,
    /// Per-cluster availability of the policy
    pub cluster_availability: BTreeMap<String, bool>,
}

/// Resolved enrich policies for one request, keyed by (name, mode)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnrichResolution {
    policies: BTreeMap<PolicyRef, ResolvedPolicy>,
}

impl EnrichResolution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, policy: PolicyRef, resolved: ResolvedPolicy) {
        self.policies.insert(policy, resolved);
    }

    pub fn get(&self, name: &str, mode: EnrichMode) -> Option<&ResolvedPolicy> {
        self.policies.get(&PolicyRef::new(name, mode))
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Match fields across every resolved policy; these seed field pruning
    pub fn match_fields(&self) -> BTreeSet<String> {
        self.policies
            .values()
            .map(|p| p.match_field.clone())
            .collect()
    }
}
