// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog and enrich-policy resolution
//!
//! Types describing what the plan references (policies, field-name requests)
//! and what the resolvers answered (index resolutions, resolved policies),
//! plus the async traits the session resolves through.

pub mod error;
pub mod resolution;
pub mod resolver;

pub use error::{ResolverError, ResolverResult};
pub use resolution::{
    EnrichResolution, FieldMapping, IndexResolution, PolicyRef, ResolvedPolicy,
};
pub use resolver::{
    group_patterns_by_cluster, split_cluster_qualified, split_patterns, CatalogResolver,
    EnrichResolver, FieldNameSet, LOCAL_CLUSTER,
};
