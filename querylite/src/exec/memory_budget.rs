// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Memory budget for result pages held by the session
//!
//! Pages returned by intermediate phases stay in memory until they are folded
//! back into the plan. The budget bounds how much a single request may hold
//! and fails the phase instead of letting the process grow without limit.

use crate::exec::error::ExecutionError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Tracks memory held by one request's accumulated result pages
#[derive(Clone)]
pub struct MemoryBudget {
    /// Maximum allowed memory in bytes
    limit: usize,

    /// Currently allocated memory (atomic for thread safety)
    allocated: Arc<AtomicUsize>,

    /// Peak allocated memory (for statistics)
    peak: Arc<AtomicUsize>,
}

impl std::fmt::Debug for MemoryBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBudget")
            .field("limit", &self.limit)
            .field("allocated", &self.allocated.load(Ordering::SeqCst))
            .field("peak", &self.peak.load(Ordering::SeqCst))
            .finish()
    }
}

impl MemoryBudget {
    /// Create a new memory budget with the given limit in bytes
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            allocated: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Budget with no effective limit
    pub fn unlimited() -> Self {
        Self::new(usize::MAX)
    }

    /// Allocate memory from the budget
    ///
    /// # Returns
    /// * `Ok(())` if allocation succeeded
    /// * `Err(ExecutionError::MemoryLimitExceeded)` if the budget is exceeded;
    ///   the allocation is rolled back
    pub fn allocate(&self, bytes: usize) -> Result<(), ExecutionError> {
        let current = self.allocated.fetch_add(bytes, Ordering::SeqCst);
        let new_total = current + bytes;

        self.peak.fetch_max(new_total, Ordering::SeqCst);

        if new_total > self.limit {
            self.allocated.fetch_sub(bytes, Ordering::SeqCst);
            return Err(ExecutionError::MemoryLimitExceeded {
                limit: self.limit,
                requested: new_total,
            });
        }

        Ok(())
    }

    /// Release memory back to the budget. The caller tracks how much was
    /// allocated; over-releasing saturates at zero.
    pub fn release(&self, bytes: usize) {
        let mut current = self.allocated.load(Ordering::SeqCst);
        loop {
            let next = current.saturating_sub(bytes);
            match self.allocated.compare_exchange(
                current,
                next,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }

    /// Currently allocated memory in bytes
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::SeqCst)
    }

    /// Peak allocated memory in bytes
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Memory limit in bytes
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Remaining memory in bytes
    pub fn available(&self) -> usize {
        self.limit.saturating_sub(self.allocated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_budget_basic() {
        let budget = MemoryBudget::new(1000);

        assert!(budget.allocate(100).is_ok());
        assert_eq!(budget.allocated(), 100);

        assert!(budget.allocate(200).is_ok());
        assert_eq!(budget.allocated(), 300);

        budget.release(100);
        assert_eq!(budget.allocated(), 200);
    }

    #[test]
    fn test_memory_budget_limit_exceeded() {
        let budget = MemoryBudget::new(1000);

        assert!(budget.allocate(900).is_ok());

        let result = budget.allocate(200);
        assert!(matches!(
            result,
            Err(ExecutionError::MemoryLimitExceeded { .. })
        ));

        // Failed allocation is rolled back
        assert_eq!(budget.allocated(), 900);
    }

    #[test]
    fn test_memory_budget_peak_tracking() {
        let budget = MemoryBudget::new(1000);

        budget.allocate(100).unwrap();
        assert_eq!(budget.peak(), 100);

        budget.allocate(200).unwrap();
        assert_eq!(budget.peak(), 300);

        budget.release(150);
        assert_eq!(budget.allocated(), 150);
        assert_eq!(budget.peak(), 300); // Peak doesn't decrease
    }

    #[test]
    fn test_memory_budget_over_release_saturates() {
        let budget = MemoryBudget::new(1000);
        budget.allocate(100).unwrap();
        budget.release(500);
        assert_eq!(budget.allocated(), 0);
    }

    #[test]
    fn test_memory_budget_unlimited() {
        let budget = MemoryBudget::unlimited();
        assert!(budget.allocate(1_000_000_000).is_ok());
        assert!(budget.allocate(1_000_000_000).is_ok());
    }

    #[test]
    fn test_available_memory() {
        let budget = MemoryBudget::new(1000);
        assert_eq!(budget.available(), 1000);
        budget.allocate(300).unwrap();
        assert_eq!(budget.available(), 700);
    }
}
