// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Resolver trait definitions
//!
//! The session core never talks to cluster transports directly; it resolves
//! sources and enrich policies through these traits. Both resolver calls are
//! asynchronous handoffs: the session awaits them one at a time and no thread
//! blocks while a resolution is in flight.

use crate::catalog::error::ResolverResult;
use crate::catalog::resolution::{EnrichResolution, IndexResolution, PolicyRef};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Name of the cluster the session itself runs on
pub const LOCAL_CLUSTER: &str = "";

/// The field-name request sent to the catalog when resolving a source.
///
/// Normal pruning yields an explicit name set; the two sentinels stand in
/// when pruning produces no constraint (`AllFields`) or an empty set
/// (`IndexMetadataOnly`, the lightest possible request).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum FieldNameSet {
    /// Request every field, e.g. for `FROM logs` with no projection
    AllFields,
    /// Request only the index-name metadata field
    IndexMetadataOnly,
    /// Request an explicit set of names and `*`-patterns
    Names(BTreeSet<String>),
}

impl FieldNameSet {
    /// Build an explicit name set from anything iterable
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldNameSet::Names(names.into_iter().map(Into::into).collect())
    }
}

/// Resolves a table reference against the data catalog
#[async_trait]
pub trait CatalogResolver: Send + Sync {
    /// Expand `pattern` to concrete indices and merge their field mappings,
    /// restricted to the requested field names
    async fn resolve(
        &self,
        pattern: &str,
        field_names: &FieldNameSet,
    ) -> ResolverResult<IndexResolution>;
}

/// Resolves enrich policies across clusters
#[async_trait]
pub trait EnrichResolver: Send + Sync {
    /// Resolve `policies` against every cluster in `clusters`
    async fn resolve_policies(
        &self,
        clusters: &BTreeSet<String>,
        policies: &BTreeSet<PolicyRef>,
    ) -> ResolverResult<EnrichResolution>;

    /// Group index patterns by the cluster that owns them. Synchronous: the
    /// grouping is derived from connection configuration, not the network.
    fn group_by_cluster(&self, patterns: &[String]) -> BTreeMap<String, Vec<String>>;
}

/// Split a possibly comma-delimited list of index patterns
pub fn split_patterns(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a cluster-qualified pattern into `(cluster, pattern)`. Patterns
/// without a qualifier belong to the local cluster.
pub fn split_cluster_qualified(pattern: &str) -> (&str, &str) {
    match pattern.split_once(':') {
        Some((cluster, index)) => (cluster, index),
        None => (LOCAL_CLUSTER, pattern),
    }
}

/// Default grouping of patterns by originating cluster, usable by resolver
/// implementations that qualify remote patterns with `cluster:`
pub fn group_patterns_by_cluster(patterns: &[String]) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for pattern in patterns {
        let (cluster, index) = split_cluster_qualified(pattern);
        grouped
            .entry(cluster.to_string())
            .or_default()
            .push(index.to_string());
    }
    grouped
}
