// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Phased execution
//!
//! Drives one or more rounds of physical execution. A plan may decompose into
//! a first phase: a sub-plan whose concrete output is required before the
//! remainder can be planned. Each round runs one phase, folds its output back
//! into the main plan, re-optimizes, and looks for the next phase; the last
//! round's result is the query result.
//!
//! The loop is an explicit state machine rather than chained callbacks so
//! that cancellation and page release stay local and auditable: pages of an
//! intermediate phase are wrapped in a guard that releases them exactly once,
//! whether folding succeeds, fails, or the future is dropped.

use crate::exec::error::ExecutionError;
use crate::exec::memory_budget::MemoryBudget;
use crate::exec::result::{Page, ProfileRecord, QueryResult};
use crate::exec::runner::PhaseRunner;
use crate::plan::expression::{Attribute, Expression};
use crate::plan::logical::LogicalPlan;
use crate::session::coordinator::QuerySession;
use crate::session::error::QueryError;

/// Phase loop states. Success walks `Planning -> PhaseRunning -> Folding`
/// back to `Planning` until no phase remains, then runs the folded plan as
/// the terminal phase; any error exits the loop immediately.
enum PhaseState {
    Planning {
        main: LogicalPlan,
    },
    PhaseRunning {
        main: LogicalPlan,
        first: LogicalPlan,
    },
    Folding {
        main: LogicalPlan,
        result: QueryResult,
    },
    Terminal {
        main: LogicalPlan,
    },
}

/// Executes the phase loop for one request
pub(crate) struct PhasedExecutor<'a> {
    session: &'a QuerySession,
    runner: &'a dyn PhaseRunner,
    filter: Option<&'a Expression>,
    budget: MemoryBudget,
    /// Profile records of completed phases, phase order preserved. Owned by
    /// the loop; never shared.
    profiles: Vec<ProfileRecord>,
}

impl<'a> PhasedExecutor<'a> {
    pub(crate) fn new(
        session: &'a QuerySession,
        runner: &'a dyn PhaseRunner,
        filter: Option<&'a Expression>,
    ) -> Self {
        Self {
            session,
            runner,
            filter,
            budget: MemoryBudget::new(session.config().memory_limit),
            profiles: Vec::new(),
        }
    }

    /// Run `main` (an optimized plan) to completion
    pub(crate) async fn run(mut self, main: LogicalPlan) -> Result<QueryResult, QueryError> {
        let max_phases = self.session.config().max_phases;
        let mut phases_run = 0usize;
        let mut state = PhaseState::Planning { main };

        loop {
            state = match state {
                PhaseState::Planning { main } => match main.extract_first_phase() {
                    None => PhaseState::Terminal { main },
                    Some(first) => {
                        phases_run += 1;
                        if phases_run > max_phases {
                            return Err(QueryError::PhaseLimitExceeded { limit: max_phases });
                        }
                        PhaseState::PhaseRunning { main, first }
                    }
                },

                PhaseState::PhaseRunning { main, first } => {
                    let first = self.session.optimized_plan(first)?;
                    let physical = self.session.finalized_physical_plan(&first, self.filter)?;
                    log::debug!(
                        "running phase {} of session {}",
                        phases_run,
                        self.session.session_id()
                    );
                    let result = self.runner.run(physical).await?;
                    PhaseState::Folding { main, result }
                }

                PhaseState::Folding { main, result } => {
                    self.profiles.extend(result.profiles);
                    let guard = PageGuard::new(result.pages, &self.budget)?;
                    let folded = self.fold(main, &result.schema, guard.pages());
                    // Single release point for this phase's pages, reached on
                    // the success and failure path alike
                    drop(guard);
                    PhaseState::Planning { main: folded? }
                }

                PhaseState::Terminal { main } => {
                    let physical = self.session.finalized_physical_plan(&main, self.filter)?;
                    log::debug!("running terminal phase of session {}", self.session.session_id());
                    let result = self.runner.run(physical).await?;
                    let mut profiles = self.profiles;
                    profiles.extend(result.profiles);
                    // Terminal pages pass to the caller unreleased
                    return Ok(QueryResult::new(result.schema, result.pages, profiles));
                }
            };
        }
    }

    /// Substitute the phase output into the main plan and re-optimize
    fn fold(
        &self,
        main: LogicalPlan,
        schema: &[Attribute],
        pages: &[Page],
    ) -> Result<LogicalPlan, QueryError> {
        let rows: Vec<Vec<u8>> = pages.iter().map(|p| p.data().to_vec()).collect();
        let folded = main.apply_first_phase_result(schema, &rows)?;
        self.session.optimized_plan(folded)
    }
}

/// Owns an intermediate phase's pages and the memory accounted for them;
/// releases both exactly once, at the latest on drop
struct PageGuard<'a> {
    pages: Vec<Page>,
    budget: &'a MemoryBudget,
    allocated: usize,
    released: bool,
}

impl<'a> PageGuard<'a> {
    fn new(mut pages: Vec<Page>, budget: &'a MemoryBudget) -> Result<Self, ExecutionError> {
        let total = pages.iter().map(Page::byte_size).sum();
        if let Err(err) = budget.allocate(total) {
            for page in &mut pages {
                page.release();
            }
            return Err(err);
        }
        Ok(Self {
            pages,
            budget,
            allocated: total,
            released: false,
        })
    }

    fn pages(&self) -> &[Page] {
        &self.pages
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        for page in &mut self.pages {
            page.release();
        }
        self.budget.release(self.allocated);
    }
}

impl Drop for PageGuard<'_> {
    fn drop(&mut self) {
        self.release();
    }
}
