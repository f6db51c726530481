// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query session - orchestrates compilation and execution of one query
//!
//! The session wires the injected collaborators together: it parses, resolves
//! sources and enrich policies (asynchronously, across possibly multiple
//! clusters), analyzes, optimizes, and drives phased execution. Exactly one
//! resolver or runner call is outstanding at any time; the protocol is
//! strictly sequential even when individual resolvers fan out internally.

use crate::analysis::pre_analyzer::{pre_analyze, PreAnalysis};
use crate::analysis::traits::{Analyzer, LogicalOptimizer, Mapper, Parser, PhysicalOptimizer};
use crate::catalog::resolution::{EnrichResolution, IndexResolution};
use crate::catalog::resolver::{split_patterns, CatalogResolver, EnrichResolver};
use crate::exec::result::QueryResult;
use crate::exec::runner::PhaseRunner;
use crate::plan::expression::Expression;
use crate::plan::logical::{LogicalPlan, PlanStateError};
use crate::plan::physical::PhysicalPlan;
use crate::session::config::{QueryRequest, SessionConfig};
use crate::session::error::QueryError;
use crate::session::field_names::field_names;
use crate::session::finalizer::finalize_physical_plan;
use crate::session::phased_executor::PhasedExecutor;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Coordinates the full lifecycle of queries for one session
pub struct QuerySession {
    session_id: String,
    config: SessionConfig,
    parser: Arc<dyn Parser>,
    catalog_resolver: Arc<dyn CatalogResolver>,
    enrich_resolver: Arc<dyn EnrichResolver>,
    analyzer: Arc<dyn Analyzer>,
    logical_optimizer: Arc<dyn LogicalOptimizer>,
    mapper: Arc<dyn Mapper>,
    physical_optimizer: Arc<dyn PhysicalOptimizer>,
}

impl QuerySession {
    /// Create a session with a generated id
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: SessionConfig,
        parser: Arc<dyn Parser>,
        catalog_resolver: Arc<dyn CatalogResolver>,
        enrich_resolver: Arc<dyn EnrichResolver>,
        analyzer: Arc<dyn Analyzer>,
        logical_optimizer: Arc<dyn LogicalOptimizer>,
        mapper: Arc<dyn Mapper>,
        physical_optimizer: Arc<dyn PhysicalOptimizer>,
    ) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            config,
            parser,
            catalog_resolver,
            enrich_resolver,
            analyzer,
            logical_optimizer,
            mapper,
            physical_optimizer,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Execute a query request end to end.
    ///
    /// Parses the query text, resolves and analyzes the plan, optimizes it,
    /// and drives one or more execution phases through `runner`. Dropping the
    /// returned future aborts the request: any outstanding resolver or runner
    /// call is cancelled and pages accumulated so far are released; partial
    /// results are not returned.
    pub async fn execute(
        &self,
        request: &QueryRequest,
        runner: &dyn PhaseRunner,
    ) -> Result<QueryResult, QueryError> {
        log::debug!("session {} query:\n{}", self.session_id, request.query);
        let parsed = self.parser.parse(&request.query, &request.params)?;
        let analyzed = self.analyzed_plan(parsed).await?;
        let optimized = self.optimized_plan(analyzed)?;
        self.execute_optimized_plan(request, runner, optimized).await
    }

    /// Execute an already-optimized plan. Most callers should use
    /// [`QuerySession::execute`]; this is public for testing the phase loop
    /// in isolation.
    pub async fn execute_optimized_plan(
        &self,
        request: &QueryRequest,
        runner: &dyn PhaseRunner,
        optimized: LogicalPlan,
    ) -> Result<QueryResult, QueryError> {
        PhasedExecutor::new(self, runner, request.filter.as_ref())
            .run(optimized)
            .await
    }

    /// Resolve and analyze a parsed plan. A no-op for plans that are already
    /// analyzed.
    pub async fn analyzed_plan(&self, parsed: LogicalPlan) -> Result<LogicalPlan, QueryError> {
        if parsed.analyzed() {
            return Ok(parsed);
        }
        let (indices, policies) = self.pre_analyze(&parsed).await?;
        let plan = self.analyzer.analyze(parsed, &indices, &policies)?;
        let plan = plan.mark_analyzed()?;
        log::debug!("session {} analyzed plan:\n{:?}", self.session_id, plan);
        Ok(plan)
    }

    /// The resolution protocol: enrich policies first (their match fields
    /// shape the field request), then the single source, then one corrective
    /// re-resolution if index expansion revealed clusters unknown up front.
    async fn pre_analyze(
        &self,
        parsed: &LogicalPlan,
    ) -> Result<(IndexResolution, EnrichResolution), QueryError> {
        let analysis = pre_analyze(parsed);

        let patterns: Vec<String> = analysis
            .tables
            .iter()
            .flat_map(|t| split_patterns(t.index()))
            .collect();
        let target_clusters: BTreeSet<String> = self
            .enrich_resolver
            .group_by_cluster(&patterns)
            .into_keys()
            .collect();

        let enrich = self
            .enrich_resolver
            .resolve_policies(&target_clusters, &analysis.policies)
            .await
            .map_err(QueryError::EnrichResolution)?;

        // The match fields must be known before the field request is built
        let match_fields = enrich.match_fields();
        let index_resolution = self
            .pre_analyze_indices(parsed, &analysis, &match_fields)
            .await?;

        if index_resolution.is_valid() {
            let new_clusters: BTreeSet<String> = self
                .enrich_resolver
                .group_by_cluster(&index_resolution.concrete_indices())
                .into_keys()
                .collect();
            // Wildcard or alias expansion can reveal clusters that were
            // unknown when the policies were first resolved; resolve them
            // again against the full set. This correction runs once, not to a
            // verified fixed point.
            if !new_clusters.is_subset(&target_clusters) {
                log::debug!(
                    "session {} re-resolving enrich policies for clusters {:?}",
                    self.session_id,
                    new_clusters
                );
                let enrich = self
                    .enrich_resolver
                    .resolve_policies(&new_clusters, &analysis.policies)
                    .await
                    .map_err(QueryError::EnrichResolution)?;
                return Ok((index_resolution, enrich));
            }
        }

        Ok((index_resolution, enrich))
    }

    async fn pre_analyze_indices(
        &self,
        parsed: &LogicalPlan,
        analysis: &PreAnalysis,
        enrich_match_fields: &BTreeSet<String>,
    ) -> Result<IndexResolution, QueryError> {
        match analysis.tables.len() {
            0 => {
                // Constant-only queries, e.g. `ROW a = 1`: nothing to resolve
                // and no catalog call is issued
                Ok(IndexResolution::invalid("[none specified]"))
            }
            1 => {
                let table = &analysis.tables[0];
                let requested =
                    field_names(parsed, enrich_match_fields, &self.config.metadata_fields);
                self.catalog_resolver
                    .resolve(table.index(), &requested)
                    .await
                    .map_err(QueryError::CatalogResolution)
            }
            _ => Err(QueryError::UnsupportedQuery(
                "Queries with multiple indices are not supported".to_string(),
            )),
        }
    }

    /// Optimize an analyzed plan. Re-optimizing an already-optimized plan is
    /// a programming error and fails fast.
    pub fn optimized_plan(&self, plan: LogicalPlan) -> Result<LogicalPlan, QueryError> {
        if !plan.analyzed() {
            return Err(PlanStateError("Expected analyzed plan".to_string()).into());
        }
        if plan.optimized() {
            return Err(PlanStateError("Plan already optimized".to_string()).into());
        }
        let plan = self.logical_optimizer.optimize(plan)?;
        let plan = plan.mark_optimized()?;
        log::debug!("session {} optimized plan:\n{:?}", self.session_id, plan);
        Ok(plan)
    }

    /// Map an optimized logical plan to a physical plan
    pub fn physical_plan(&self, plan: &LogicalPlan) -> Result<PhysicalPlan, QueryError> {
        if !plan.optimized() {
            return Err(PlanStateError("Expected optimized plan".to_string()).into());
        }
        let physical = self.mapper.map(plan)?;
        log::debug!("session {} physical plan:\n{:?}", self.session_id, physical);
        Ok(physical)
    }

    /// Map, optimize, and finalize a physical plan for execution
    pub fn finalized_physical_plan(
        &self,
        plan: &LogicalPlan,
        filter: Option<&Expression>,
    ) -> Result<PhysicalPlan, QueryError> {
        let physical = self.physical_optimizer.optimize(self.physical_plan(plan)?)?;
        Ok(finalize_physical_plan(physical, filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::error::{AnalysisError, OptimizationError, ParseError};
    use crate::analysis::traits::QueryParams;
    use crate::catalog::error::ResolverResult;
    use crate::catalog::resolution::PolicyRef;
    use crate::catalog::resolver::{group_patterns_by_cluster, FieldNameSet};
    use crate::plan::logical::{LogicalNode, TableRef};
    use crate::plan::physical::PhysicalNode;
    use async_trait::async_trait;
    use std::collections::BTreeMap;

    struct NoopParser;

    impl Parser for NoopParser {
        fn parse(&self, _query: &str, _params: &QueryParams) -> Result<LogicalPlan, ParseError> {
            Ok(LogicalPlan::new(LogicalNode::LocalRelation {
                schema: vec![],
                rows: vec![],
            }))
        }
    }

    struct PanickingCatalog;

    #[async_trait]
    impl CatalogResolver for PanickingCatalog {
        async fn resolve(
            &self,
            pattern: &str,
            _field_names: &FieldNameSet,
        ) -> ResolverResult<IndexResolution> {
            panic!("unexpected catalog resolution of {:?}", pattern);
        }
    }

    struct EmptyEnrich;

    #[async_trait]
    impl EnrichResolver for EmptyEnrich {
        async fn resolve_policies(
            &self,
            _clusters: &BTreeSet<String>,
            _policies: &BTreeSet<PolicyRef>,
        ) -> ResolverResult<EnrichResolution> {
            Ok(EnrichResolution::new())
        }

        fn group_by_cluster(&self, patterns: &[String]) -> BTreeMap<String, Vec<String>> {
            group_patterns_by_cluster(patterns)
        }
    }

    struct NoopAnalyzer;

    impl Analyzer for NoopAnalyzer {
        fn analyze(
            &self,
            plan: LogicalPlan,
            _indices: &IndexResolution,
            _policies: &EnrichResolution,
        ) -> Result<LogicalPlan, AnalysisError> {
            Ok(plan)
        }
    }

    struct NoopOptimizer;

    impl LogicalOptimizer for NoopOptimizer {
        fn optimize(&self, plan: LogicalPlan) -> Result<LogicalPlan, OptimizationError> {
            Ok(plan)
        }
    }

    struct NoopMapper;

    impl Mapper for NoopMapper {
        fn map(&self, _plan: &LogicalPlan) -> Result<PhysicalPlan, OptimizationError> {
            Ok(PhysicalPlan::new(PhysicalNode::LocalSource {
                schema: vec![],
                rows: vec![],
            }))
        }
    }

    struct NoopPhysicalOptimizer;

    impl PhysicalOptimizer for NoopPhysicalOptimizer {
        fn optimize(&self, plan: PhysicalPlan) -> Result<PhysicalPlan, OptimizationError> {
            Ok(plan)
        }
    }

    fn test_session() -> QuerySession {
        QuerySession::new(
            SessionConfig::default(),
            Arc::new(NoopParser),
            Arc::new(PanickingCatalog),
            Arc::new(EmptyEnrich),
            Arc::new(NoopAnalyzer),
            Arc::new(NoopOptimizer),
            Arc::new(NoopMapper),
            Arc::new(NoopPhysicalOptimizer),
        )
    }

    #[tokio::test]
    async fn test_multiple_tables_rejected_without_catalog_call() {
        let session = test_session();
        let parsed = LogicalPlan::new(LogicalNode::Relation {
            table: TableRef::new("logs"),
        });
        let analysis = PreAnalysis {
            tables: vec![TableRef::new("logs"), TableRef::new("metrics")],
            policies: BTreeSet::new(),
        };

        let err = session
            .pre_analyze_indices(&parsed, &analysis, &BTreeSet::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::UnsupportedQuery(msg) if msg == "Queries with multiple indices are not supported"
        ));
    }

    #[tokio::test]
    async fn test_no_tables_resolve_to_invalid_without_catalog_call() {
        let session = test_session();
        let parsed = LogicalPlan::new(LogicalNode::LocalRelation {
            schema: vec![],
            rows: vec![],
        });

        let resolution = session
            .pre_analyze_indices(&parsed, &PreAnalysis::default(), &BTreeSet::new())
            .await
            .unwrap();
        assert_eq!(resolution, IndexResolution::invalid("[none specified]"));
    }

    #[test]
    fn test_sessions_get_distinct_ids() {
        let a = test_session();
        let b = test_session();
        assert_ne!(a.session_id(), b.session_id());
        assert!(!a.session_id().is_empty());
    }
}
